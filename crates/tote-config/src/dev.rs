//! Development server configuration types.

use serde::{Deserialize, Serialize};

pub const DEFAULT_DEV_PORT: u16 = 2020;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevOptions {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Open the browser once the server is listening.
    #[serde(default = "default_true")]
    pub open: bool,

    /// Push reload events to connected pages after each rebuild.
    #[serde(default = "default_true")]
    pub hot: bool,

    /// Serve the entry document for extensionless GETs that match no file.
    #[serde(default = "default_true")]
    pub history_api_fallback: bool,

    /// Gzip responses for clients that accept it.
    #[serde(default = "default_true")]
    pub compress: bool,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Path fragments whose changes never trigger a rebuild.
    #[serde(default = "default_watch_ignore")]
    pub watch_ignore: Vec<String>,
}

impl Default for DevOptions {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            open: true,
            hot: true,
            history_api_fallback: true,
            compress: true,
            debounce_ms: default_debounce_ms(),
            watch_ignore: default_watch_ignore(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    DEFAULT_DEV_PORT
}

fn default_true() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_watch_ignore() -> Vec<String> {
    vec![
        "node_modules".into(),
        ".git".into(),
        ".DS_Store".into(),
        "*~".into(),
    ]
}
