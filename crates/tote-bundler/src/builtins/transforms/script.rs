//! Script validation and TypeScript type stripping.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::{Parser, ParserReturn};
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{TransformOptions as OxcTransformOptions, Transformer};
use serde_json::Value;

use crate::content::Content;
use crate::transform::{Transform, TransformInput, known_keys};

/// Validates JavaScript syntax; strips types from TypeScript sources.
///
/// JavaScript passes through byte-for-byte once it parses. TypeScript is
/// re-printed as plain JavaScript so later passes only ever see JS.
pub struct ScriptTransform;

impl Transform for ScriptTransform {
    fn name(&self) -> &str {
        "script"
    }

    fn validate_options(&self, options: &Value) -> Result<(), String> {
        known_keys(options, &[])
    }

    fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<Content> {
        let source = input.content.to_text()?;
        let source_type = SourceType::from_path(input.path).unwrap_or(SourceType::mjs());

        if source_type.is_typescript() {
            return strip_types(&source, input.path, source_type).map(Content::Text);
        }

        check_syntax(&source, source_type)?;
        Ok(Content::Text(source.into_owned()))
    }
}

/// Accepts either module or classic script syntax.
fn check_syntax(source: &str, source_type: SourceType) -> anyhow::Result<()> {
    let allocator = Allocator::default();
    let module = Parser::new(&allocator, source, source_type).parse();
    if parsed_cleanly(&module) {
        return Ok(());
    }

    let allocator = Allocator::default();
    let script = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if parsed_cleanly(&script) {
        return Ok(());
    }

    Err(parse_failure(&module))
}

fn strip_types(source: &str, path: &str, source_type: SourceType) -> anyhow::Result<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !parsed_cleanly(&ret) {
        return Err(parse_failure(&ret));
    }

    let mut program = ret.program;
    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();
    let transformed = Transformer::new(&allocator, Path::new(path), &OxcTransformOptions::default())
        .build_with_scoping(scoping, &mut program);
    if let Some(first) = transformed.errors.first() {
        anyhow::bail!("{first}");
    }

    Ok(Codegen::new().build(&program).code)
}

pub(crate) fn parsed_cleanly(ret: &ParserReturn<'_>) -> bool {
    !ret.panicked && ret.errors.is_empty()
}

pub(crate) fn parse_failure(ret: &ParserReturn<'_>) -> anyhow::Error {
    match ret.errors.first() {
        Some(first) if ret.errors.len() > 1 => {
            anyhow::anyhow!("{first} (and {} more)", ret.errors.len() - 1)
        }
        Some(first) => anyhow::anyhow!("{first}"),
        None => anyhow::anyhow!("parser gave up"),
    }
}
