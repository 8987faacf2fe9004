use serde_json::Value;

use crate::content::Content;
use crate::transform::{Transform, TransformInput, bool_option, known_keys};

/// Validates JSON and re-serializes it, compact unless `pretty` is set.
pub struct JsonTransform;

impl Transform for JsonTransform {
    fn name(&self) -> &str {
        "json"
    }

    fn validate_options(&self, options: &Value) -> Result<(), String> {
        known_keys(options, &["pretty"])?;
        bool_option(options, "pretty").map(|_| ())
    }

    fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<Content> {
        let pretty = bool_option(input.options, "pretty")
            .map_err(anyhow::Error::msg)?
            .unwrap_or(false);
        let source = input.content.to_text()?;
        let value: Value = serde_json::from_str(&source)?;
        let text = if pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(Content::Text(text))
    }
}
