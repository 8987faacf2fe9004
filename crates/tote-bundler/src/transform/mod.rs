//! Transform capability and chain execution.

mod executor;
mod registry;

pub use executor::{ChainExecutor, TransformContext};
pub use registry::TransformRegistry;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tote_config::BuildMode;

use crate::content::Content;

/// Everything a transform sees for one invocation.
pub struct TransformInput<'a> {
    pub content: Content,
    pub options: &'a Value,
    /// Normalized source path relative to the context directory.
    pub path: &'a str,
    pub public_path: &'a str,
    pub mode: BuildMode,
}

/// A pure content transformation.
///
/// Implementations must be deterministic: the same input and options always
/// produce the same output. Failures abort the build; they are never retried.
pub trait Transform: Send + Sync {
    fn name(&self) -> &str;

    /// Checked once when the rule set is built.
    fn validate_options(&self, _options: &Value) -> Result<(), String> {
        Ok(())
    }

    fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<Content>;
}

/// A transform resolved against the registry together with its options.
#[derive(Clone)]
pub struct TransformRef {
    pub name: String,
    pub options: Value,
    transform: Arc<dyn Transform>,
}

impl TransformRef {
    pub fn new(transform: Arc<dyn Transform>, options: Value) -> Self {
        Self {
            name: transform.name().to_string(),
            options,
            transform,
        }
    }

    pub fn transform(&self) -> &dyn Transform {
        self.transform.as_ref()
    }
}

impl fmt::Debug for TransformRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRef")
            .field("name", &self.name)
            .field("options", &self.options)
            .finish()
    }
}

/// Read an optional string option.
pub(crate) fn string_option<'a>(options: &'a Value, key: &str) -> Result<Option<&'a str>, String> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(format!("`{key}` must be a string, got {other}")),
    }
}

/// Read an optional boolean option.
pub(crate) fn bool_option(options: &Value, key: &str) -> Result<Option<bool>, String> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(format!("`{key}` must be a boolean, got {other}")),
    }
}

/// Reject keys outside `allowed`.
pub(crate) fn known_keys(options: &Value, allowed: &[&str]) -> Result<(), String> {
    match options {
        Value::Null => Ok(()),
        Value::Object(map) => match map.keys().find(|k| !allowed.contains(&k.as_str())) {
            Some(key) => Err(format!("unknown option `{key}`")),
            None => Ok(()),
        },
        other => Err(format!("options must be an object, got {other}")),
    }
}
