//! Mode-gated output optimization.
//!
//! Development builds skip this stage entirely. In production every enabled
//! pass runs in a fixed order, and no pass may grow a chunk: when a rewrite
//! comes out larger than its input the input is kept.

mod comments;
mod script;
mod style;

pub use comments::{strip_markup_comments, strip_style_comments};
pub use script::minify_script;
pub use style::minify_style;

use std::fmt;

use tote_config::{AssetKind, BuildMode, OptimizationOptions};
use tracing::{debug, trace};

use crate::chunk::{Chunk, ModuleTable, split};
use crate::content::Content;
use crate::error::OptimizationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptimizationPass {
    SplitChunks,
    MinifyStyles,
    MinifyScripts,
    StripComments,
}

impl OptimizationPass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SplitChunks => "split-chunks",
            Self::MinifyStyles => "minify-styles",
            Self::MinifyScripts => "minify-scripts",
            Self::StripComments => "strip-comments",
        }
    }

    /// Whether the pass rewrites chunks of `kind`.
    fn applies_to(self, kind: AssetKind) -> bool {
        match self {
            Self::SplitChunks => false,
            Self::MinifyStyles => kind == AssetKind::Style,
            Self::MinifyScripts => kind == AssetKind::Script,
            Self::StripComments => matches!(kind, AssetKind::Style | AssetKind::Markup),
        }
    }
}

impl fmt::Display for OptimizationPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs the production passes over grouped chunks.
#[derive(Debug, Clone)]
pub struct OptimizationStage {
    passes: Vec<OptimizationPass>,
}

impl OptimizationStage {
    pub fn new(mode: BuildMode, options: &OptimizationOptions) -> Self {
        let mut passes = Vec::new();
        if mode.is_production() {
            if options.split_chunks {
                passes.push(OptimizationPass::SplitChunks);
            }
            if options.minimize {
                passes.push(OptimizationPass::MinifyStyles);
                passes.push(OptimizationPass::MinifyScripts);
            }
            if options.strip_comments {
                passes.push(OptimizationPass::StripComments);
            }
        }
        Self { passes }
    }

    pub fn passes(&self) -> &[OptimizationPass] {
        &self.passes
    }

    pub fn is_noop(&self) -> bool {
        self.passes.is_empty()
    }

    /// Apply every pass in order. `table` holds the transformed modules the
    /// chunks were built from.
    pub fn run(
        &self,
        chunks: Vec<Chunk>,
        table: &ModuleTable,
    ) -> Result<Vec<Chunk>, OptimizationError> {
        let mut chunks = chunks;
        for pass in &self.passes {
            debug!(%pass, chunks = chunks.len(), "running optimization pass");
            chunks = match pass {
                OptimizationPass::SplitChunks => {
                    split::split_chunks(chunks, table).map_err(|source| OptimizationError {
                        pass: *pass,
                        chunk: "*".to_string(),
                        source,
                    })?
                }
                _ => chunks
                    .into_iter()
                    .map(|chunk| rewrite(*pass, chunk))
                    .collect::<Result<_, _>>()?,
            };
        }
        Ok(chunks)
    }
}

fn rewrite(pass: OptimizationPass, mut chunk: Chunk) -> Result<Chunk, OptimizationError> {
    if !pass.applies_to(chunk.kind) {
        return Ok(chunk);
    }
    let fail = |source| OptimizationError {
        pass,
        chunk: chunk.label(),
        source,
    };

    let source = chunk.content.to_text().map_err(fail)?;
    let rewritten = match pass {
        OptimizationPass::MinifyStyles => minify_style(&source, &chunk.label()),
        OptimizationPass::MinifyScripts => minify_script(&source),
        OptimizationPass::StripComments if chunk.kind == AssetKind::Style => {
            Ok(strip_style_comments(&source))
        }
        OptimizationPass::StripComments => Ok(strip_markup_comments(&source)),
        OptimizationPass::SplitChunks => Ok(source.to_string()),
    }
    .map_err(fail)?;

    let grew = rewritten.len() > source.len();
    drop(source);
    if grew {
        trace!(%pass, chunk = %chunk.label(), "pass would grow chunk; keeping input");
        return Ok(chunk);
    }
    chunk.content = Content::Text(rewritten);
    Ok(chunk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkOrigin;

    fn chunk(name: &str, kind: AssetKind, text: &str) -> Chunk {
        Chunk {
            name: name.into(),
            kind,
            origin: ChunkOrigin::Entry(name.into()),
            modules: vec![format!("{name}.{}", kind.default_extension())],
            content: Content::from(text),
            extension: kind.default_extension().into(),
        }
    }

    #[test]
    fn development_is_a_noop() {
        let stage = OptimizationStage::new(BuildMode::Development, &OptimizationOptions::default());
        assert!(stage.is_noop());
        let input = vec![chunk("main", AssetKind::Style, "/* c */ a { color: red; }")];
        let out = stage.run(input, &ModuleTable::new()).unwrap();
        assert_eq!(out[0].content.as_text(), Some("/* c */ a { color: red; }"));
    }

    #[test]
    fn production_passes_follow_options() {
        let all = OptimizationStage::new(BuildMode::Production, &OptimizationOptions::default());
        assert_eq!(
            all.passes(),
            &[
                OptimizationPass::SplitChunks,
                OptimizationPass::MinifyStyles,
                OptimizationPass::MinifyScripts,
                OptimizationPass::StripComments,
            ]
        );

        let options = OptimizationOptions {
            minimize: false,
            ..Default::default()
        };
        let partial = OptimizationStage::new(BuildMode::Production, &options);
        assert!(!partial.passes().contains(&OptimizationPass::MinifyScripts));
    }

    #[test]
    fn production_never_grows_chunks() {
        let stage = OptimizationStage::new(BuildMode::Production, &OptimizationOptions::default());
        let inputs = vec![
            chunk("main", AssetKind::Script, "var a = 1;\n// trailing\n"),
            chunk("main", AssetKind::Style, "/*! keep? */\nbody {\n  color: red;\n}\n"),
            chunk("index", AssetKind::Markup, "<p>hi</p>\n<!-- note -->\n"),
            chunk("tiny", AssetKind::Script, "a"),
        ];
        let sizes: Vec<_> = inputs.iter().map(|c| c.content.len()).collect();
        let out = stage.run(inputs, &ModuleTable::new()).unwrap();
        for (chunk, before) in out.iter().zip(sizes) {
            assert!(chunk.content.len() <= before, "{} grew", chunk.label());
        }
        assert!(!out[2].content.as_text().unwrap().contains("note"));
    }

    #[test]
    fn failing_pass_names_the_chunk() {
        let stage = OptimizationStage::new(BuildMode::Production, &OptimizationOptions::default());
        let err = stage
            .run(
                vec![chunk("main", AssetKind::Script, "function (")],
                &ModuleTable::new(),
            )
            .unwrap_err();
        assert_eq!(err.pass, OptimizationPass::MinifyScripts);
        assert_eq!(err.chunk, "main.js");
    }
}
