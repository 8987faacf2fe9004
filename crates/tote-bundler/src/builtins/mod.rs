//! Built-in transforms and plugins.

pub mod plugins;
pub mod transforms;
