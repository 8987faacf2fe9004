//! Plugin registration in firing order.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tote_config::{HookName, PluginOptions};
use tracing::debug;

use super::{HookContext, HookUsage, Plugin};
use crate::builtins::plugins;
use crate::error::ConfigurationError;

/// A plugin together with the hooks it will be called for.
#[derive(Clone)]
pub struct PluginRegistration {
    pub plugin: Arc<dyn Plugin>,
    pub hooks: HookUsage,
}

impl std::fmt::Debug for PluginRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistration")
            .field("plugin", &self.plugin.name())
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// Plugins in declaration order; declaration order is firing order.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    registrations: Vec<PluginRegistration>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register with the hooks the plugin declares.
    pub fn add(&mut self, plugin: Arc<dyn Plugin>) {
        let hooks = plugin.register_hook_usage();
        self.add_with_hooks(plugin, hooks);
    }

    /// Register with an explicit hook set, overriding the plugin's own.
    pub fn add_with_hooks(&mut self, plugin: Arc<dyn Plugin>, hooks: HookUsage) {
        self.registrations.push(PluginRegistration { plugin, hooks });
    }

    /// Registrations interested in `hook`, in firing order.
    pub fn interested(&self, hook: HookName) -> impl Iterator<Item = &PluginRegistration> {
        self.registrations
            .iter()
            .filter(move |reg| reg.hooks.contains(hook))
    }

    pub fn registrations(&self) -> &[PluginRegistration] {
        &self.registrations
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

/// Builds a plugin from its configured options.
pub type PluginFactory =
    Arc<dyn Fn(&Value, &HookContext) -> Result<Arc<dyn Plugin>, String> + Send + Sync>;

/// Named plugin factories used to resolve configuration.
#[derive(Clone, Default)]
pub struct PluginCatalog {
    factories: IndexMap<String, PluginFactory>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with `clean`, `html`, `copy` and `manifest`.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        catalog.register("clean", |options, ctx| {
            Ok(Arc::new(plugins::CleanPlugin::from_options(options, ctx)?) as Arc<dyn Plugin>)
        });
        catalog.register("html", |options, ctx| {
            Ok(Arc::new(plugins::HtmlPlugin::from_options(options, ctx)?) as Arc<dyn Plugin>)
        });
        catalog.register("copy", |options, ctx| {
            Ok(Arc::new(plugins::CopyPlugin::from_options(options, ctx)?) as Arc<dyn Plugin>)
        });
        catalog.register("manifest", |options, _ctx| {
            Ok(Arc::new(plugins::ManifestPlugin::from_options(options)?) as Arc<dyn Plugin>)
        });
        catalog
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&Value, &HookContext) -> Result<Arc<dyn Plugin>, String> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Instantiate every enabled plugin in declaration order.
    pub fn instantiate(
        &self,
        options: &[PluginOptions],
        ctx: &HookContext,
    ) -> Result<PluginRegistry, ConfigurationError> {
        let mut registry = PluginRegistry::new();
        for opts in options.iter().filter(|opts| opts.enabled) {
            let factory =
                self.factories
                    .get(&opts.name)
                    .ok_or_else(|| ConfigurationError::UnknownPlugin {
                        name: opts.name.clone(),
                    })?;
            let plugin = factory(&opts.options, ctx).map_err(|reason| {
                ConfigurationError::InvalidPluginOptions {
                    plugin: opts.name.clone(),
                    reason,
                }
            })?;

            match &opts.hooks {
                Some(hooks) => {
                    registry.add_with_hooks(plugin, hooks.iter().copied().collect())
                }
                None => registry.add(plugin),
            }
            debug!(plugin = %opts.name, "registered plugin");
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::path::PathBuf;

    use serde_json::json;
    use tote_config::BuildMode;

    use super::*;

    struct Named(&'static str, HookUsage);

    impl Plugin for Named {
        fn name(&self) -> Cow<'static, str> {
            Cow::Borrowed(self.0)
        }

        fn register_hook_usage(&self) -> HookUsage {
            self.1
        }
    }

    fn ctx() -> HookContext {
        HookContext {
            mode: BuildMode::Development,
            root: PathBuf::from("/project"),
            context: PathBuf::from("/project/src"),
            output_dir: PathBuf::from("/project/dist"),
            public_path: "/".into(),
            entries: vec!["main".into()],
        }
    }

    #[test]
    fn interested_filters_by_hook_in_order() {
        let mut registry = PluginRegistry::new();
        registry.add(Arc::new(Named("x", HookUsage::all())));
        registry.add(Arc::new(Named("y", HookUsage::empty().with(HookName::OnDone))));
        registry.add(Arc::new(Named("z", HookUsage::empty().with(HookName::OnStart))));

        let start: Vec<_> = registry
            .interested(HookName::OnStart)
            .map(|r| r.plugin.name())
            .collect();
        assert_eq!(start, vec!["x", "z"]);
        let done: Vec<_> = registry
            .interested(HookName::OnDone)
            .map(|r| r.plugin.name())
            .collect();
        assert_eq!(done, vec!["x", "y"]);
    }

    #[test]
    fn catalog_rejects_unknown_plugin() {
        let err = PluginCatalog::with_builtins()
            .instantiate(&[PluginOptions::new("analyzer")], &ctx())
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownPlugin { name } if name == "analyzer"));
    }

    #[test]
    fn catalog_skips_disabled_and_applies_hook_override() {
        let mut catalog = PluginCatalog::new();
        catalog.register("recorder", |_, _| {
            Ok(Arc::new(Named("recorder", HookUsage::all())) as Arc<dyn Plugin>)
        });

        let mut disabled = PluginOptions::new("recorder");
        disabled.enabled = false;
        let mut narrowed = PluginOptions::new("recorder");
        narrowed.hooks = Some(vec![HookName::OnAssetEmit]);

        let registry = catalog.instantiate(&[disabled, narrowed], &ctx()).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.registrations()[0].hooks,
            HookUsage::empty().with(HookName::OnAssetEmit)
        );
    }

    #[test]
    fn catalog_reports_invalid_options() {
        let options = PluginOptions::new("manifest").with_options(json!({ "filename": 3 }));
        let err = PluginCatalog::with_builtins()
            .instantiate(&[options], &ctx())
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidPluginOptions { .. }));
    }
}
