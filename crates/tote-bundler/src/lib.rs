#![cfg_attr(docsrs, feature(doc_cfg))]

//! # tote-bundler
//!
//! The tote pipeline core: rule matching, transform chains, chunk grouping,
//! mode-gated optimization, content-hashed naming and lifecycle plugins.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use tote_bundler::{FsDiscovery, Pipeline};
//! use tote_config::ToteConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let root = Path::new(".");
//! let pipeline = Pipeline::from_config(&ToteConfig::default_project(), root)?;
//! let sources = pipeline.load_sources(&FsDiscovery::default())?;
//! let output = pipeline.build(&sources)?;
//! output.write_to(pipeline.output_dir(), true)?;
//! # Ok(()) }
//! ```
//!
//! The core performs no I/O of its own: sources arrive as a [`SourceSet`]
//! snapshot and results leave as a [`BuildOutput`]. Discovery, plugins and
//! [`BuildOutput::write_to`] are the only places that touch the disk.

pub mod builtins;
pub mod chunk;
pub mod content;
pub mod discovery;
pub mod error;
pub mod manifest;
pub mod naming;
pub mod optimize;
pub mod output;
pub mod pipeline;
pub mod plugins;
pub mod rules;
pub mod transform;

pub use content::{Asset, Content};
pub use discovery::{Discover, FsDiscovery, SourceFile, SourceSet};
pub use error::{ConfigurationError, OptimizationError, PluginError, TransformError};
pub use manifest::{ManifestBuilder, OutputManifest};
pub use naming::{NamingResolver, ResolvedName};
pub use optimize::{OptimizationPass, OptimizationStage};
pub use output::{BuildOutput, DerivedFile, DerivedFiles, EmittedAsset};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use plugins::{
    HookContext, HookUsage, LifecycleState, Plugin, PluginCatalog, PluginEnv, PluginRegistration,
    PluginRegistry,
};
pub use rules::{Matcher, Rule, RuleSet};
pub use transform::{Transform, TransformInput, TransformRef, TransformRegistry};

pub use tote_config::{AssetKind, BuildMode, HookName};

// Logging utilities (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub use logging::{LogLevel, init_logging, init_logging_from_env};

/// Error types for tote-bundler operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Optimization(#[from] OptimizationError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// The lifecycle was driven out of order.
    #[error("invalid lifecycle transition from {from} to {to}")]
    Lifecycle {
        from: LifecycleState,
        to: LifecycleState,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid output path (e.g., directory traversal attempt).
    #[error("Invalid output path: {0}")]
    InvalidOutputPath(String),

    /// File write operation failed.
    #[error("Write failure: {0}")]
    WriteFailure(String),

    /// Output file already exists and overwrite is disabled.
    #[error("Output exists: {0}")]
    OutputExists(String),
}

/// Result type alias for tote-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<tote_config::ConfigError> for Error {
    fn from(err: tote_config::ConfigError) -> Self {
        Error::Configuration(ConfigurationError::Config(err))
    }
}

impl Error {
    /// The error message followed by every cause, joined with `: `.
    pub fn report(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.ends_with(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        message
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Configuration(ConfigurationError::UnmatchedSource { .. }) => {
                "tote::config::unmatched_source"
            }
            Error::Configuration(ConfigurationError::DuplicateOutputPath { .. }) => {
                "tote::config::duplicate_output"
            }
            Error::Configuration(ConfigurationError::MalformedRule { .. }) => {
                "tote::config::malformed_rule"
            }
            Error::Configuration(
                ConfigurationError::UnknownTransform { .. }
                | ConfigurationError::InvalidTransformOptions { .. },
            ) => "tote::config::transform",
            Error::Configuration(
                ConfigurationError::UnknownPlugin { .. }
                | ConfigurationError::InvalidPluginOptions { .. },
            ) => "tote::config::plugin",
            Error::Configuration(
                ConfigurationError::UnknownEntrySource { .. }
                | ConfigurationError::InvalidEntryName { .. },
            ) => "tote::config::entry",
            Error::Configuration(_) => "tote::config",
            Error::Transform(_) => "tote::transform",
            Error::Optimization(_) => "tote::optimization",
            Error::Plugin(_) => "tote::plugin",
            Error::Lifecycle { .. } => "tote::lifecycle",
            Error::Io(_) => "tote::io",
            Error::InvalidOutputPath(_) => "tote::output::invalid_path",
            Error::WriteFailure(_) => "tote::output::write_failure",
            Error::OutputExists(_) => "tote::output::exists",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        let help: String = match self {
            Error::Configuration(ConfigurationError::UnmatchedSource { path }) => format!(
                "Add a rule whose `test` matches `{path}`, or end the rule list with a catch-all (`test = \"any\"`)."
            ),
            Error::Configuration(ConfigurationError::DuplicateOutputPath { .. }) => {
                "Two output units resolve to the same file. Rename one of the sources or entries, or move one under a different directory.".to_string()
            }
            Error::Configuration(ConfigurationError::MalformedRule { .. }) => {
                "Regex tests must not match the empty string and extension lists must not be empty.".to_string()
            }
            Error::Configuration(ConfigurationError::UnknownTransform { .. }) => {
                "Built-in transforms: raw, script, css, extract, markup, inline, json, csv, xml.".to_string()
            }
            Error::Configuration(ConfigurationError::UnknownPlugin { .. }) => {
                "Built-in plugins: clean, html, copy, manifest.".to_string()
            }
            Error::Configuration(ConfigurationError::UnknownEntrySource { .. }) => {
                "Entry sources are relative to `context` and must be matched by a rule.".to_string()
            }
            Error::Configuration(ConfigurationError::Config(err)) => return err
                .hint()
                .map(|hint| Box::new(hint.to_string()) as Box<dyn std::fmt::Display>),
            Error::Transform(err) => format!("Fix `{}` or adjust the chain of the rule that matched it.", err.path),
            Error::Optimization(_) => {
                "Disable the pass under [optimization] to inspect the unoptimized output.".to_string()
            }
            Error::Plugin(err) => format!("Check the options of plugin `{}`.", err.plugin),
            Error::InvalidOutputPath(path) => format!(
                "The output path '{path}' is invalid. Ensure it stays within the output directory."
            ),
            Error::WriteFailure(_) => "Check disk space and permissions.".to_string(),
            Error::OutputExists(_) => {
                "Enable overwriting or remove the existing output first.".to_string()
            }
            _ => return None,
        };
        Some(Box::new(help))
    }
}
