//! Command implementations for the tote CLI.
//!
//! - [`build`] - run the pipeline once and write the output directory
//! - [`dev`] - development server with live reload
//! - [`check`] - configuration and rule coverage validation
//!
//! Each command lives in its own module and exposes an async `execute`.

pub mod build;
pub mod check;
pub mod dev;

pub use build::execute as build_execute;
pub use check::execute as check_execute;
pub use dev::execute as dev_execute;

use tote_config::ToteConfig;

/// Turn off every plugin named `name`.
pub(crate) fn disable_plugin(config: &mut ToteConfig, name: &str) -> usize {
    let mut disabled = 0;
    for plugin in config.plugins.iter_mut().filter(|p| p.name == name) {
        if plugin.enabled {
            plugin.enabled = false;
            disabled += 1;
        }
    }
    disabled
}
