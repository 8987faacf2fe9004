use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use super::{Transform, TransformRef};
use crate::builtins::transforms;
use crate::error::ConfigurationError;

/// Named transforms available to rule chains.
#[derive(Clone, Default)]
pub struct TransformRegistry {
    transforms: IndexMap<String, Arc<dyn Transform>>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with every built-in transform.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for transform in transforms::all() {
            registry.register_arc(transform);
        }
        registry
    }

    /// Later registrations replace earlier ones with the same name.
    pub fn register<T: Transform + 'static>(&mut self, transform: T) -> &mut Self {
        self.register_arc(Arc::new(transform))
    }

    pub fn register_arc(&mut self, transform: Arc<dyn Transform>) -> &mut Self {
        self.transforms
            .insert(transform.name().to_string(), transform);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Transform>> {
        self.transforms.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.transforms.keys().map(String::as_str)
    }

    /// Look up `name` and validate `options` on behalf of `rule`.
    pub fn resolve(
        &self,
        rule: &str,
        name: &str,
        options: &Value,
    ) -> Result<TransformRef, ConfigurationError> {
        let transform = self
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownTransform {
                rule: rule.to_string(),
                transform: name.to_string(),
            })?;

        transform
            .validate_options(options)
            .map_err(|reason| ConfigurationError::InvalidTransformOptions {
                rule: rule.to_string(),
                transform: name.to_string(),
                reason,
            })?;

        Ok(TransformRef::new(Arc::clone(transform), options.clone()))
    }
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.transforms.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builtins_are_registered() {
        let registry = TransformRegistry::with_builtins();
        let names: Vec<_> = registry.names().collect();
        for expected in ["raw", "script", "css", "extract", "markup", "inline", "json", "csv", "xml"] {
            assert!(names.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn unknown_transform_is_configuration_error() {
        let registry = TransformRegistry::with_builtins();
        let err = registry.resolve("scripts", "babel", &json!({})).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownTransform { .. }));
    }

    #[test]
    fn invalid_options_are_configuration_error() {
        let registry = TransformRegistry::with_builtins();
        let err = registry
            .resolve("data", "csv", &json!({ "delimiter": ";;" }))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::InvalidTransformOptions { .. }
        ));
    }
}
