//! Error types for each pipeline stage.
//!
//! Every stage fails fast: the first fault aborts the build and is surfaced
//! through [`crate::Error`].

use thiserror::Error;
use tote_config::{ConfigError, HookName};

use crate::optimize::OptimizationPass;

/// Problems detectable from configuration and the source snapshot alone.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("no rule matches source `{path}`")]
    UnmatchedSource { path: String },

    #[error("output path `{path}` is produced by both `{first}` and `{second}`")]
    DuplicateOutputPath {
        path: String,
        first: String,
        second: String,
    },

    #[error("rule `{rule}` is malformed: {reason}")]
    MalformedRule { rule: String, reason: String },

    #[error("rule `{rule}` references unknown transform `{transform}`")]
    UnknownTransform { rule: String, transform: String },

    #[error("invalid options for transform `{transform}` in rule `{rule}`: {reason}")]
    InvalidTransformOptions {
        rule: String,
        transform: String,
        reason: String,
    },

    #[error("unknown plugin `{name}`")]
    UnknownPlugin { name: String },

    #[error("invalid options for plugin `{plugin}`: {reason}")]
    InvalidPluginOptions { plugin: String, reason: String },

    #[error("entry `{entry}` references unknown source `{source_path}`")]
    UnknownEntrySource { entry: String, source_path: String },

    #[error("invalid entry name `{entry}`")]
    InvalidEntryName { entry: String },

    #[error("hash length {0} is out of range (8 to 64)")]
    InvalidHashLength(usize),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A transform in a chain rejected its input.
#[derive(Debug, Error)]
#[error("transform `{transform}` failed on `{path}`")]
pub struct TransformError {
    pub path: String,
    pub transform: String,
    #[source]
    pub source: anyhow::Error,
}

/// An optimization pass failed on a chunk.
#[derive(Debug, Error)]
#[error("{pass} failed on chunk `{chunk}`")]
pub struct OptimizationError {
    pub pass: OptimizationPass,
    pub chunk: String,
    #[source]
    pub source: anyhow::Error,
}

/// A plugin hook returned an error.
#[derive(Debug, Error)]
#[error("plugin `{plugin}` failed in {hook}")]
pub struct PluginError {
    pub plugin: String,
    pub hook: HookName,
    #[source]
    pub source: anyhow::Error,
}
