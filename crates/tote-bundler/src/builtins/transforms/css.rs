use lightningcss::{
    printer::PrinterOptions,
    stylesheet::{ParserOptions, StyleSheet},
};
use serde_json::Value;

use crate::content::Content;
use crate::transform::{Transform, TransformInput, known_keys};

/// Parses and re-prints a stylesheet through lightningcss.
pub struct CssTransform;

impl Transform for CssTransform {
    fn name(&self) -> &str {
        "css"
    }

    fn validate_options(&self, options: &Value) -> Result<(), String> {
        known_keys(options, &[])
    }

    fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<Content> {
        let source = input.content.to_text()?;
        let stylesheet = StyleSheet::parse(
            &source,
            ParserOptions {
                filename: input.path.to_string(),
                ..Default::default()
            },
        )
        .map_err(|e| anyhow::anyhow!("Failed to parse CSS from {}: {}", input.path, e))?;

        let result = stylesheet
            .to_css(PrinterOptions::default())
            .map_err(|e| anyhow::anyhow!("Failed to print CSS from {}: {}", input.path, e))?;

        Ok(Content::Text(result.code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tote_config::BuildMode;

    fn run(source: &str) -> anyhow::Result<Content> {
        CssTransform.apply(TransformInput {
            content: Content::from(source),
            options: &Value::Null,
            path: "main.css",
            public_path: "/",
            mode: BuildMode::Development,
        })
    }

    #[test]
    fn normalizes_stylesheet() {
        let out = run("body{color:red}").unwrap();
        let text = out.as_text().unwrap();
        assert!(text.contains("body"));
        assert!(text.contains("color: red"));
    }

    #[test]
    fn rejects_non_text_input() {
        let err = CssTransform
            .apply(TransformInput {
                content: Content::Binary(vec![0xff, 0xfe]),
                options: &Value::Null,
                path: "broken.css",
                public_path: "/",
                mode: BuildMode::Development,
            })
            .unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }
}
