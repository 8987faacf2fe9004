//! Configuration for the tote asset pipeline.
//!
//! The types here are plain serde data: they describe rule sets, plugins,
//! optimization switches and the dev server, but carry no behavior of their
//! own. `tote-bundler` turns a [`ToteConfig`] into an immutable pipeline.

pub mod config;
pub mod dev;
pub mod discovery;
pub mod error;
pub mod loading;
pub mod mode;
pub mod optimization;
pub mod plugin;
pub mod rules;
pub mod settings;
pub mod validation;

pub use config::*;
pub use dev::DevOptions;
pub use error::*;
pub use loading::{ConfigOverrides, load};
pub use mode::BuildMode;
pub use optimization::OptimizationOptions;
pub use plugin::{HookName, PluginOptions};
pub use rules::{AssetKind, EntrySources, RuleOptions, TestPattern, TransformOptions};
pub use settings::GlobalSettings;

pub use discovery::{ConfigDiscovery, discover};
pub use validation::{ConfigValidator, FsValidator, SchemaValidator, validate_fs, validate_schema};
