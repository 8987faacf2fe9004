//! Stylesheet preprocessors.
//!
//! Sass and SCSS compile in memory through grass. The compiler sees an empty
//! filesystem, so `@import` and `@use` of other files fail; list partials as
//! entry sources instead. LESS has no in-process compiler and is rejected.

use grass::{InputSyntax, NullFs, Options, OutputStyle};
use serde_json::Value;

use crate::content::Content;
use crate::rules::path;
use crate::transform::{Transform, TransformInput, known_keys};

/// Compiles `.scss` and indented `.sass` sources to CSS.
pub struct SassTransform;

impl Transform for SassTransform {
    fn name(&self) -> &str {
        "sass"
    }

    fn validate_options(&self, options: &Value) -> Result<(), String> {
        known_keys(options, &[])
    }

    fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<Content> {
        let source = input.content.to_text()?;
        let syntax = match path::extension(input.path) {
            Some(ext) if ext.eq_ignore_ascii_case("sass") => InputSyntax::Sass,
            _ => InputSyntax::Scss,
        };
        let options = Options::default()
            .fs(&NullFs)
            .input_syntax(syntax)
            .style(OutputStyle::Expanded);

        let css = grass::from_string(source.into_owned(), &options)
            .map_err(|e| anyhow::anyhow!("Failed to compile {}: {}", input.path, e))?;
        Ok(Content::Text(css))
    }
}

/// Placeholder for `.less` sources.
pub struct LessTransform;

impl Transform for LessTransform {
    fn name(&self) -> &str {
        "less"
    }

    fn validate_options(&self, options: &Value) -> Result<(), String> {
        known_keys(options, &[])
    }

    fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<Content> {
        anyhow::bail!(
            "LESS is not supported: compile {} to CSS, or replace the `less` rule with one \
             using a custom transform",
            input.path
        )
    }
}
