//! Tote CLI - the command-line front end of the tote asset pipeline.
//!
//! - [`cli`] - clap definitions for `tote build`, `tote dev` and `tote check`
//! - [`commands`] - one module per command, each exposing `execute`
//! - [`config`] - turns flags and the project directory into a [`tote_config::ToteConfig`]
//! - [`dev`] - the in-memory development server with live reload
//! - [`error`] - CLI errors and their miette rendering
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - terminal status lines and build summaries
//!
//! ```rust,no_run
//! use tote_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod dev;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, Result};
