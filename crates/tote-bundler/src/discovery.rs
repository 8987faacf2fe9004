//! Source discovery and the immutable source snapshot a build runs over.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::content::Content;
use crate::rules::path;

/// Lists source files below a directory.
pub trait Discover: Send + Sync {
    /// Absolute paths of every candidate source under `root`, in a stable
    /// order.
    fn list_sources(&self, root: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Walks the file system, sorted by file name, skipping hidden entries.
#[derive(Debug, Clone, Default)]
pub struct FsDiscovery {
    /// Relative path fragments to skip: a bare segment name (`node_modules`)
    /// or a path prefix (`vendor/legacy`).
    exclude: Vec<String>,
}

impl FsDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude(mut self, fragments: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude.extend(fragments.into_iter().map(Into::into));
        self
    }

    fn is_excluded(&self, relative: &str) -> bool {
        is_excluded(&self.exclude, relative)
    }
}

/// Whether `relative` hits one of `fragments`.
pub(crate) fn is_excluded(fragments: &[String], relative: &str) -> bool {
    fragments.iter().any(|fragment| {
        let fragment = fragment.trim_matches('/');
        if fragment.is_empty() {
            return false;
        }
        if fragment.contains('/') {
            relative == fragment || relative.starts_with(&format!("{fragment}/"))
        } else {
            relative.split('/').any(|segment| segment == fragment)
        }
    })
}

impl Discover for FsDiscovery {
    fn list_sources(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
            });

        for entry in walker {
            let entry = entry.map_err(io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = relative_path(root, entry.path());
            if self.is_excluded(&relative) {
                continue;
            }
            files.push(entry.into_path());
        }
        Ok(files)
    }
}

fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    path::normalize(&relative.to_string_lossy())
}

/// One source: normalized path relative to the context directory, plus its
/// bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub content: Content,
}

impl SourceFile {
    pub fn new(path: impl AsRef<str>, content: impl Into<Content>) -> Self {
        Self {
            path: path::normalize(path.as_ref()),
            content: content.into(),
        }
    }
}

/// Immutable snapshot of every source a build sees, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    root: PathBuf,
    files: Vec<SourceFile>,
}

impl SourceSet {
    /// Read every source `discovery` lists under `root` for which `keep`
    /// returns true. `keep` receives the absolute path and the normalized
    /// relative path.
    pub fn load(
        root: &Path,
        discovery: &dyn Discover,
        keep: impl Fn(&Path, &str) -> bool,
    ) -> io::Result<Self> {
        let mut files = Vec::new();
        for absolute in discovery.list_sources(root)? {
            let relative = relative_path(root, &absolute);
            if relative.is_empty() || !keep(&absolute, &relative) {
                continue;
            }
            let bytes = std::fs::read(&absolute)?;
            files.push(SourceFile {
                path: relative,
                content: Content::from_bytes(bytes),
            });
        }
        debug!(root = %root.display(), files = files.len(), "sources loaded");
        Ok(Self {
            root: root.to_path_buf(),
            files,
        })
    }

    /// Build a snapshot from in-memory files; the first occurrence of a path
    /// wins.
    pub fn from_files(root: impl Into<PathBuf>, files: impl IntoIterator<Item = SourceFile>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let files = files
            .into_iter()
            .filter(|file| seen.insert(file.path.clone()))
            .collect();
        Self {
            root: root.into(),
            files,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn get(&self, path: &str) -> Option<&SourceFile> {
        self.files.iter().find(|file| file.path == path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
