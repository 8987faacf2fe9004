//! CLI errors and their miette rendering.
//!
//! Pipeline errors keep their own [`miette::Diagnostic`] implementation so
//! codes and help text survive to the terminal; everything else is wrapped
//! with a hint where one helps.

use std::path::PathBuf;

use miette::Report;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Loading or validating configuration failed.
    #[error("Configuration error: {0}")]
    Config(#[from] tote_config::ConfigError),

    /// The pipeline failed.
    #[error(transparent)]
    Build(#[from] tote_bundler::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The development server could not start or stopped unexpectedly.
    #[error("Server error: {0}")]
    Server(String),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `tote check` found sources no rule matches.
    #[error("{count} source(s) match no rule")]
    UnmatchedSources { count: usize },
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Convert a CLI error into a report for `main`.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Build(err) => Report::new(err),
        CliError::Config(err) => match err.hint() {
            Some(hint) => miette::miette!(
                code = "tote::config",
                help = hint.to_string(),
                "Configuration error: {err}"
            ),
            None => miette::miette!(code = "tote::config", "Configuration error: {err}"),
        },
        CliError::UnmatchedSources { count } => miette::miette!(
            code = "tote::check::unmatched",
            help = "Add a rule for these files or end the rule list with a catch-all (`test = \"any\"`).",
            "{count} source(s) match no rule"
        ),
        CliError::Server(message) => miette::miette!(
            code = "tote::dev::server",
            help = "Pick another port with --port or stop the process holding it.",
            "Server error: {message}"
        ),
        other => miette::miette!("{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tote_bundler::ConfigurationError;

    #[test]
    fn pipeline_errors_keep_their_diagnostic_code() {
        let err = CliError::from(tote_bundler::Error::from(
            ConfigurationError::UnmatchedSource {
                path: "LICENSE".into(),
            },
        ));
        let report = cli_error_to_miette(err);
        assert_eq!(
            report.code().map(|c| c.to_string()).as_deref(),
            Some("tote::config::unmatched_source")
        );
    }

    #[test]
    fn unmatched_sources_carry_help() {
        let report = cli_error_to_miette(CliError::UnmatchedSources { count: 2 });
        assert_eq!(report.to_string(), "2 source(s) match no rule");
        assert!(report.help().is_some());
    }
}
