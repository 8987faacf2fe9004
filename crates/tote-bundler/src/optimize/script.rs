use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_minifier::{Minifier, MinifierOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::builtins::transforms::script::{parse_failure, parsed_cleanly};

/// Compress, mangle and print `source` with comments removed.
///
/// Top-level bindings keep their names so concatenated chunks still link.
pub fn minify_script(source: &str) -> anyhow::Result<String> {
    match minify_as(source, SourceType::mjs()) {
        Ok(code) => Ok(code),
        Err(module_err) => minify_as(source, SourceType::cjs()).map_err(|_| module_err),
    }
}

fn minify_as(source: &str, source_type: SourceType) -> anyhow::Result<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !parsed_cleanly(&ret) {
        return Err(parse_failure(&ret));
    }

    let mut program = ret.program;
    let minified = Minifier::new(MinifierOptions::default()).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions::minify())
        .with_scoping(minified.scoping)
        .build(&program)
        .code;
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shrinks_and_drops_comments() {
        let source = "// greeting\nfunction greet(name) {\n    const message = 'hello ' + name;\n    return message;\n}\n";
        let out = minify_script(source).unwrap();
        assert!(out.len() < source.len());
        assert!(!out.contains("greeting"));
        assert!(out.contains("greet"));
    }

    #[test]
    fn falls_back_to_classic_scripts() {
        assert!(minify_script("with (window) { console.log(location); }").is_ok());
    }

    #[test]
    fn reports_syntax_errors() {
        assert!(minify_script("function (").is_err());
    }
}
