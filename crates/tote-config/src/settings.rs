//! Global configuration settings shared across profiles.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSettings {
    #[serde(default)]
    pub log_level: Option<String>,

    /// Run transform chains on a worker pool.
    #[serde(default)]
    pub parallel: bool,

    /// Path fragments skipped during source discovery.
    #[serde(default)]
    pub exclude: Vec<String>,
}
