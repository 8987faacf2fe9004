//! Development server.
//!
//! - Builds in memory; nothing is written to the output directory
//! - Serves the last successful build and pushes reload events over SSE
//! - Rebuilds on debounced file changes, reloading `tote.toml` when it changes
//! - Shows an error overlay while the last build failed

pub mod builder;
pub mod error_overlay;
pub mod server;
pub mod state;
pub mod watcher;

pub use builder::DevBuilder;
pub use server::DevServer;
pub use state::{BuildStatus, DevServerState, SharedState};
pub use watcher::{FileChange, FileWatcher};

use serde::{Deserialize, Serialize};

/// Events pushed to connected browsers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DevEvent {
    BuildStarted,

    /// `changed` lists output files that are new or whose bytes differ from
    /// the previous successful build.
    BuildCompleted {
        duration_ms: u64,
        changed: Vec<String>,
    },

    BuildFailed { error: String },
}
