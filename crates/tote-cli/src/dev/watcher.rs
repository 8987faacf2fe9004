//! File system watcher for development mode.
//!
//! Watches the project root recursively and forwards changes that are not
//! ignored. Debouncing happens on the receiving side, where bursts are
//! coalesced into one rebuild.

use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::{CliError, Result};

/// File change event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Modified(PathBuf),
    Created(PathBuf),
    Removed(PathBuf),
}

impl FileChange {
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }
}

/// Which paths never trigger a rebuild.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    root: PathBuf,
    output_dir: PathBuf,
    /// `*suffix` matches file names ending in `suffix`; anything else matches
    /// a path segment or a relative path prefix.
    patterns: Vec<String>,
}

impl IgnoreRules {
    pub fn new(root: PathBuf, output_dir: PathBuf, patterns: Vec<String>) -> Self {
        Self {
            root,
            output_dir,
            patterns,
        }
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return true;
        };
        if path.starts_with(&self.output_dir) {
            return true;
        }

        let hidden = relative.components().any(|component| {
            component
                .as_os_str()
                .to_str()
                .is_some_and(|name| name.starts_with('.') && name != "." && name != "..")
        });
        if hidden {
            return true;
        }

        let relative = relative.to_string_lossy().replace('\\', "/");
        let file_name = relative.rsplit('/').next().unwrap_or(&relative);
        self.patterns.iter().any(|pattern| {
            if let Some(suffix) = pattern.strip_prefix('*') {
                file_name.ends_with(suffix)
            } else {
                let pattern = pattern.trim_matches('/');
                !pattern.is_empty()
                    && (relative.split('/').any(|segment| segment == pattern)
                        || relative == pattern
                        || relative.starts_with(&format!("{pattern}/")))
            }
        })
    }
}

/// Recursive watcher over the project root.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    /// Start watching. Changes arrive on the returned receiver.
    pub fn new(ignore: IgnoreRules) -> Result<(Self, mpsc::Receiver<FileChange>)> {
        let root = ignore.root.clone();
        if !root.is_dir() {
            return Err(CliError::FileNotFound(root));
        }

        let (tx, rx) = mpsc::channel(256);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else {
                return;
            };
            for path in event.paths {
                if ignore.is_ignored(&path) {
                    continue;
                }
                let change = match event.kind {
                    EventKind::Create(_) => FileChange::Created(path),
                    EventKind::Modify(_) => FileChange::Modified(path),
                    EventKind::Remove(_) => FileChange::Removed(path),
                    _ => continue,
                };
                let _ = tx.blocking_send(change);
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(patterns: &[&str]) -> IgnoreRules {
        IgnoreRules::new(
            PathBuf::from("/project"),
            PathBuf::from("/project/dist"),
            patterns.iter().map(|p| p.to_string()).collect(),
        )
    }

    #[test]
    fn ignores_segments_and_prefixes() {
        let rules = rules(&["node_modules", "src/drafts"]);
        assert!(rules.is_ignored(Path::new("/project/node_modules/pkg/index.js")));
        assert!(rules.is_ignored(Path::new("/project/src/node_modules/x.js")));
        assert!(rules.is_ignored(Path::new("/project/src/drafts/post.md")));
        assert!(!rules.is_ignored(Path::new("/project/src/index.js")));
    }

    #[test]
    fn star_patterns_match_file_name_suffix() {
        let rules = rules(&["*~", "*.log"]);
        assert!(rules.is_ignored(Path::new("/project/src/index.js~")));
        assert!(rules.is_ignored(Path::new("/project/debug.log")));
        assert!(!rules.is_ignored(Path::new("/project/src/index.js")));
    }

    #[test]
    fn ignores_hidden_output_and_outside_paths() {
        let rules = rules(&[]);
        assert!(rules.is_ignored(Path::new("/project/.git/config")));
        assert!(rules.is_ignored(Path::new("/project/src/.hidden/file.js")));
        assert!(rules.is_ignored(Path::new("/project/dist/main.js")));
        assert!(rules.is_ignored(Path::new("/other/file.js")));
        assert!(!rules.is_ignored(Path::new("/project/tote.toml")));
    }

    #[test]
    fn change_path() {
        let path = PathBuf::from("/project/src/index.js");
        assert_eq!(FileChange::Removed(path.clone()).path(), path.as_path());
    }
}
