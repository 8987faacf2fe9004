//! Shared state for the development server.
//!
//! Holds the last successful [`BuildOutput`], the build status and the
//! connected SSE clients behind parking_lot locks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tote_bundler::{BuildOutput, Content};

use crate::dev::DevEvent;

/// Build status tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    NotStarted,
    InProgress { started_at: Instant },
    Success { duration_ms: u64 },
    Failed { error: String },
}

impl BuildStatus {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, BuildStatus::InProgress { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BuildStatus::Success { .. })
    }

    /// Error message if the last build failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            BuildStatus::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// How request paths map onto build output.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// URL prefix assets are published under; stripped before lookup when it
    /// is a path.
    pub public_path: String,
    /// Entry document served for `/` and, with `history_api_fallback`, for
    /// unknown extensionless paths.
    pub index: String,
    pub history_api_fallback: bool,
    /// Inject the reload client into HTML responses.
    pub hot: bool,
    pub compress: bool,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            public_path: "/".to_string(),
            index: "index.html".to_string(),
            history_api_fallback: true,
            hot: true,
            compress: true,
        }
    }
}

/// A file resolved from the current build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedFile {
    /// Output path relative to the output directory.
    pub path: String,
    pub content: Content,
}

/// Connected SSE clients.
pub type ClientRegistry = Arc<RwLock<HashMap<usize, mpsc::Sender<String>>>>;

/// Shared development server state.
pub struct DevServerState {
    status: RwLock<BuildStatus>,
    output: RwLock<Option<Arc<BuildOutput>>>,
    options: ServeOptions,
    clients: ClientRegistry,
    next_client_id: RwLock<usize>,
}

impl DevServerState {
    pub fn new(options: ServeOptions) -> Self {
        Self {
            status: RwLock::new(BuildStatus::NotStarted),
            output: RwLock::new(None),
            options,
            clients: Arc::new(RwLock::new(HashMap::new())),
            next_client_id: RwLock::new(0),
        }
    }

    pub fn options(&self) -> &ServeOptions {
        &self.options
    }

    pub fn start_build(&self) {
        *self.status.write() = BuildStatus::InProgress {
            started_at: Instant::now(),
        };
    }

    /// Publish a successful build and return the files that changed since
    /// the previous one. The first build reports every file.
    pub fn complete_build(&self, duration_ms: u64, output: BuildOutput) -> Vec<String> {
        let mut current = self.output.write();
        let changed = match current.as_deref() {
            Some(previous) => output.changed_since(previous),
            None => output.files().map(|(name, _)| name.to_string()).collect(),
        };
        *current = Some(Arc::new(output));
        drop(current);

        *self.status.write() = BuildStatus::Success { duration_ms };
        changed
    }

    /// Record a failed build. The previous output stays in place.
    pub fn fail_build(&self, error: String) {
        *self.status.write() = BuildStatus::Failed { error };
    }

    pub fn status(&self) -> BuildStatus {
        self.status.read().clone()
    }

    pub fn output(&self) -> Option<Arc<BuildOutput>> {
        self.output.read().clone()
    }

    /// Map a request path onto the current build.
    ///
    /// `/` and the bare public path resolve to the entry document. Unknown
    /// paths without an extension fall back to it when history fallback is
    /// enabled.
    pub fn resolve(&self, request_path: &str) -> Option<ServedFile> {
        let output = self.output()?;
        let relative = self.strip_public_path(request_path);
        let relative = if relative.is_empty() {
            self.options.index.as_str()
        } else {
            relative
        };

        if let Some(content) = output.get(relative) {
            return Some(ServedFile {
                path: relative.to_string(),
                content: content.clone(),
            });
        }

        let last_segment = relative.rsplit('/').next().unwrap_or(relative);
        if self.options.history_api_fallback && !last_segment.contains('.') {
            let index = self.options.index.as_str();
            return output.get(index).map(|content| ServedFile {
                path: index.to_string(),
                content: content.clone(),
            });
        }
        None
    }

    fn strip_public_path<'a>(&self, request_path: &'a str) -> &'a str {
        let path = request_path.trim_start_matches('/');
        if !self.options.public_path.starts_with('/') {
            return path;
        }
        let prefix = self.options.public_path.trim_matches('/');
        if prefix.is_empty() {
            return path;
        }
        match path.strip_prefix(prefix) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
            _ => path,
        }
    }

    /// Register a new SSE client.
    pub fn register_client(&self) -> (usize, mpsc::Receiver<String>) {
        let id = {
            let mut next_id = self.next_client_id.write();
            let id = *next_id;
            *next_id += 1;
            id
        };

        let (tx, rx) = mpsc::channel(100);
        self.clients.write().insert(id, tx);
        (id, rx)
    }

    pub fn unregister_client(&self, id: usize) {
        self.clients.write().remove(&id);
    }

    /// Send `event` to every connected client, dropping the ones that hung up.
    pub async fn broadcast(&self, event: &DevEvent) {
        let json = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
        let clients = self.clients.read().clone();

        let mut failed_ids = Vec::new();
        for (id, tx) in clients {
            if tx.send(json.clone()).await.is_err() {
                failed_ids.push(id);
            }
        }
        for id in failed_ids {
            self.unregister_client(id);
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }
}

impl Default for DevServerState {
    fn default() -> Self {
        Self::new(ServeOptions::default())
    }
}

/// Shared state handle.
pub type SharedState = Arc<DevServerState>;
