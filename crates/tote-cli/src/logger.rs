//! Tracing subscriber setup for the CLI.
//!
//! The level is chosen in this order:
//! 1. `--verbose`: debug for the tote crates
//! 2. `--quiet`: errors only
//! 3. `RUST_LOG`
//! 4. `settings.log_level` from the loaded configuration
//! 5. info for the tote crates

use std::sync::OnceLock;

use tote_bundler::LogLevel;
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

const VERBOSE: &str = "tote=debug,tote_bundler=debug,tote_config=debug,tote_cli=debug";
const QUIET: &str = "error";
const DEFAULT: &str = "tote=info,tote_bundler=info,tote_config=info,tote_cli=info";

/// Set when neither a flag nor `RUST_LOG` fixed the filter.
static CONFIGURABLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Filter directives for the given flags, ignoring the environment.
pub fn directives(verbose: bool, quiet: bool) -> Option<&'static str> {
    if verbose {
        Some(VERBOSE)
    } else if quiet {
        Some(QUIET)
    } else {
        None
    }
}

/// Directives for a configured level applied to the tote crates.
pub fn level_directives(level: LogLevel) -> String {
    ["tote", "tote_bundler", "tote_config", "tote_cli"]
        .iter()
        .map(|target| format!("{target}={}", level.as_str()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let (filter, configurable) = match directives(verbose, quiet) {
        Some(directives) => (EnvFilter::new(directives), false),
        None => match EnvFilter::try_from_default_env() {
            Ok(filter) => (filter, false),
            Err(_) => (EnvFilter::new(DEFAULT), true),
        },
    };

    let (filter, handle) = reload::Layer::new(filter);
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && crate::ui::should_use_color())
        .with_writer(std::io::stderr)
        .compact();

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_ok();
    if installed && configurable {
        let _ = CONFIGURABLE.set(handle);
    }
}

/// Apply `settings.log_level` unless flags or `RUST_LOG` already decided.
pub fn apply_config_level(level: &str) {
    let Some(handle) = CONFIGURABLE.get() else {
        return;
    };
    match level.parse::<LogLevel>() {
        Ok(level) => {
            let _ = handle.reload(EnvFilter::new(level_directives(level)));
        }
        Err(e) => tracing::warn!("ignoring settings.log_level: {e}"),
    }
}
