use serde_json::Value;

use crate::content::Content;
use crate::transform::{Transform, TransformInput, known_keys};

/// Static copy.
pub struct RawTransform;

impl Transform for RawTransform {
    fn name(&self) -> &str {
        "raw"
    }

    fn validate_options(&self, options: &Value) -> Result<(), String> {
        known_keys(options, &[])
    }

    fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<Content> {
        Ok(input.content)
    }
}
