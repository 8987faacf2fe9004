//! Finalized build output.

pub mod writer;

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;
use tote_config::AssetKind;

use crate::chunk::ChunkOrigin;
use crate::content::Content;
use crate::error::ConfigurationError;
use crate::manifest::OutputManifest;
use crate::rules::path;
use crate::Result;

/// A named, finalized output unit.
#[derive(Debug, Clone, Serialize)]
pub struct EmittedAsset {
    /// Output path relative to the output directory.
    pub file_name: String,
    /// `file_name` joined onto the public path.
    pub url: String,
    /// Chunk name before naming (`main`, `shared~a~b`, `img/logo`).
    pub chunk: String,
    pub kind: AssetKind,
    pub origin: ChunkOrigin,
    /// Source paths whose content this asset carries, in concatenation order.
    pub modules: Vec<String>,
    /// Truncated content hash; `None` when the name is not hashed.
    pub hash: Option<String>,
    #[serde(skip)]
    pub content: Content,
}

impl EmittedAsset {
    /// Entry this asset belongs to, if it was produced for exactly one.
    pub fn entry(&self) -> Option<&str> {
        match &self.origin {
            ChunkOrigin::Entry(name) => Some(name),
            _ => None,
        }
    }
}

/// A file produced by a plugin after the manifest is sealed.
#[derive(Debug, Clone)]
pub struct DerivedFile {
    pub path: String,
    pub content: Content,
    /// Plugin that produced the file.
    pub plugin: String,
}

/// Collects derived files and rejects any path already taken.
#[derive(Debug, Clone, Default)]
pub struct DerivedFiles {
    /// Emitted file → chunk that produced it.
    taken: HashMap<String, String>,
    files: IndexMap<String, DerivedFile>,
    producer: String,
}

impl DerivedFiles {
    /// Reserve every file of `manifest` so plugins cannot overwrite it.
    pub fn reserving(manifest: &OutputManifest) -> Self {
        Self {
            taken: manifest
                .emitted_files()
                .map(|(file, chunk)| (file.to_string(), chunk.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub(crate) fn set_producer(&mut self, plugin: &str) {
        self.producer = plugin.to_string();
    }

    /// Add a file. Fails with [`ConfigurationError::DuplicateOutputPath`] if
    /// an emitted asset or another derived file already claims the path.
    pub fn insert(
        &mut self,
        file_path: impl AsRef<str>,
        content: impl Into<Content>,
    ) -> std::result::Result<(), ConfigurationError> {
        let file_path = path::normalize(file_path.as_ref());
        let first = self
            .taken
            .get(&file_path)
            .cloned()
            .or_else(|| self.files.get(&file_path).map(|f| f.plugin.clone()));
        if let Some(first) = first {
            return Err(ConfigurationError::DuplicateOutputPath {
                path: file_path,
                first,
                second: self.producer.clone(),
            });
        }
        self.files.insert(
            file_path.clone(),
            DerivedFile {
                path: file_path,
                content: content.into(),
                plugin: self.producer.clone(),
            },
        );
        Ok(())
    }

    pub fn get(&self, file_path: &str) -> Option<&DerivedFile> {
        self.files.get(file_path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn into_files(self) -> Vec<DerivedFile> {
        self.files.into_values().collect()
    }
}

/// Everything one build produced.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub manifest: OutputManifest,
    /// Emitted assets in emit order.
    pub assets: Vec<EmittedAsset>,
    /// Plugin-derived files in production order.
    pub derived: Vec<DerivedFile>,
}

impl BuildOutput {
    /// Every output file, assets first.
    pub fn files(&self) -> impl Iterator<Item = (&str, &Content)> {
        self.assets
            .iter()
            .map(|a| (a.file_name.as_str(), &a.content))
            .chain(self.derived.iter().map(|d| (d.path.as_str(), &d.content)))
    }

    pub fn get(&self, file_path: &str) -> Option<&Content> {
        let file_path = file_path.trim_start_matches('/');
        self.files()
            .find(|(name, _)| *name == file_path)
            .map(|(_, content)| content)
    }

    pub fn asset(&self, file_name: &str) -> Option<&EmittedAsset> {
        self.assets.iter().find(|a| a.file_name == file_name)
    }

    pub fn len(&self) -> usize {
        self.assets.len() + self.derived.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Files that are new or whose bytes differ from `previous`.
    pub fn changed_since(&self, previous: &BuildOutput) -> Vec<String> {
        let before: HashMap<&str, blake3::Hash> = previous
            .files()
            .map(|(name, content)| (name, blake3::hash(content.as_bytes())))
            .collect();
        self.files()
            .filter(|(name, content)| {
                before.get(name) != Some(&blake3::hash(content.as_bytes()))
            })
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Write every file below `dir` atomically.
    pub fn write_to(&self, dir: impl AsRef<Path>, overwrite: bool) -> Result<usize> {
        writer::write_files(
            dir.as_ref(),
            self.files().map(|(name, content)| (name, content.as_bytes())),
            overwrite,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tote_config::BuildMode;

    fn asset(file_name: &str, content: &str) -> EmittedAsset {
        EmittedAsset {
            file_name: file_name.into(),
            url: format!("/{file_name}"),
            chunk: "main".into(),
            kind: AssetKind::Script,
            origin: ChunkOrigin::Entry("main".into()),
            modules: vec!["index.js".into()],
            hash: None,
            content: Content::from(content),
        }
    }

    fn output(assets: Vec<EmittedAsset>) -> BuildOutput {
        BuildOutput {
            manifest: OutputManifest::new(BuildMode::Development, "/"),
            assets,
            derived: Vec::new(),
        }
    }

    #[test]
    fn derived_files_reject_duplicates() {
        let mut derived = DerivedFiles::default();
        derived.set_producer("html");
        derived.insert("./index.html", "<html>").unwrap();
        derived.set_producer("copy");
        let err = derived.insert("index.html", "x").unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::DuplicateOutputPath { ref first, ref second, .. }
                if first == "html" && second == "copy"
        ));
        assert_eq!(derived.len(), 1);
    }

    #[test]
    fn changed_since_reports_new_and_modified_files() {
        let before = output(vec![asset("main.js", "a"), asset("other.js", "b")]);
        let after = output(vec![
            asset("main.js", "a"),
            asset("other.js", "changed"),
            asset("new.js", "c"),
        ]);
        assert_eq!(after.changed_since(&before), vec!["other.js", "new.js"]);
    }

    #[test]
    fn get_ignores_leading_slash() {
        let out = output(vec![asset("main.js", "a")]);
        assert!(out.get("/main.js").is_some());
        assert!(out.get("missing.js").is_none());
    }
}
