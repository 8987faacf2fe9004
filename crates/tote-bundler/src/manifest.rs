//! The output manifest: what a build emitted and where each source went.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tote_config::{AssetKind, BuildMode};

use crate::error::ConfigurationError;
use crate::output::EmittedAsset;

/// One emitted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFile {
    /// Chunk label the file was produced from.
    pub chunk: String,
    pub kind: AssetKind,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub size: usize,
}

/// Sealed description of a build's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputManifest {
    pub mode: BuildMode,
    pub public_path: String,
    /// Entry → files it needs, in emit order (shared chunks first).
    #[serde(default)]
    pub entries: IndexMap<String, Vec<String>>,
    /// Emitted file → details, in emit order.
    #[serde(default)]
    pub files: IndexMap<String, ManifestFile>,
    /// Source path → data URL for inlined sources.
    #[serde(default)]
    pub inlined: IndexMap<String, String>,
    /// Source path → file that carries it.
    #[serde(default)]
    pub sources: IndexMap<String, String>,
}

impl OutputManifest {
    pub fn new(mode: BuildMode, public_path: impl Into<String>) -> Self {
        Self {
            mode,
            public_path: public_path.into(),
            entries: IndexMap::new(),
            files: IndexMap::new(),
            inlined: IndexMap::new(),
            sources: IndexMap::new(),
        }
    }

    /// `(file, chunk label)` for every emitted file.
    pub fn emitted_files(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files
            .iter()
            .map(|(file, info)| (file.as_str(), info.chunk.as_str()))
    }

    /// Files of `kind` needed by `entry`, in emit order.
    pub fn entry_files(&self, entry: &str, kind: AssetKind) -> Vec<(&str, &ManifestFile)> {
        self.entries
            .get(entry)
            .into_iter()
            .flatten()
            .filter_map(|file| self.files.get_key_value(file))
            .filter(|(_, info)| info.kind == kind)
            .map(|(file, info)| (file.as_str(), info))
            .collect()
    }

    /// Output location of a source: its file URL or inlined data URL.
    pub fn url_for_source(&self, source: &str) -> Option<&str> {
        if let Some(data) = self.inlined.get(source) {
            return Some(data);
        }
        let file = self.sources.get(source)?;
        self.files.get(file).map(|info| info.url.as_str())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Accumulates emitted assets and rejects output-path collisions.
#[derive(Debug)]
pub struct ManifestBuilder {
    manifest: OutputManifest,
}

impl ManifestBuilder {
    /// Starts with an empty file list for every entry.
    pub fn new<I, S>(mode: BuildMode, public_path: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut manifest = OutputManifest::new(mode, public_path);
        manifest.entries = entries
            .into_iter()
            .map(|entry| (entry.into(), Vec::new()))
            .collect();
        Self { manifest }
    }

    pub fn add(&mut self, asset: &EmittedAsset) -> Result<(), ConfigurationError> {
        if let Some(existing) = self.manifest.files.get(&asset.file_name) {
            return Err(ConfigurationError::DuplicateOutputPath {
                path: asset.file_name.clone(),
                first: existing.chunk.clone(),
                second: asset.chunk.clone(),
            });
        }

        let owners: Vec<&String> = match &asset.origin {
            crate::chunk::ChunkOrigin::Entry(entry) => vec![entry],
            crate::chunk::ChunkOrigin::Shared(entries) => entries.iter().collect(),
            crate::chunk::ChunkOrigin::Standalone => Vec::new(),
        };
        for owner in owners {
            if let Some(files) = self.manifest.entries.get_mut(owner) {
                files.push(asset.file_name.clone());
            }
        }
        for module in &asset.modules {
            self.manifest
                .sources
                .insert(module.clone(), asset.file_name.clone());
        }
        self.manifest.files.insert(
            asset.file_name.clone(),
            ManifestFile {
                chunk: asset.chunk.clone(),
                kind: asset.kind,
                url: asset.url.clone(),
                hash: asset.hash.clone(),
                size: asset.content.len(),
            },
        );
        Ok(())
    }

    pub fn inline(&mut self, source: impl Into<String>, data_url: impl Into<String>) {
        self.manifest.inlined.insert(source.into(), data_url.into());
    }

    pub fn finish(self) -> OutputManifest {
        self.manifest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkOrigin;
    use crate::content::Content;

    fn asset(file_name: &str, chunk: &str, kind: AssetKind, origin: ChunkOrigin, modules: &[&str]) -> EmittedAsset {
        EmittedAsset {
            file_name: file_name.into(),
            url: format!("/{file_name}"),
            chunk: chunk.into(),
            kind,
            origin,
            modules: modules.iter().map(|m| m.to_string()).collect(),
            hash: None,
            content: Content::from("x"),
        }
    }

    #[test]
    fn collects_entries_sources_and_inlined() {
        let mut builder = ManifestBuilder::new(BuildMode::Development, "/", ["a", "b"]);
        builder
            .add(&asset(
                "shared~a~b.js",
                "shared~a~b.js",
                AssetKind::Script,
                ChunkOrigin::Shared(vec!["a".into(), "b".into()]),
                &["common.js"],
            ))
            .unwrap();
        builder
            .add(&asset("a.js", "a.js", AssetKind::Script, ChunkOrigin::Entry("a".into()), &["a.js"]))
            .unwrap();
        builder
            .add(&asset("a.css", "a.css", AssetKind::Style, ChunkOrigin::Entry("a".into()), &["a.css"]))
            .unwrap();
        builder.inline("font.woff", "data:font/woff;base64,AA==");
        let manifest = builder.finish();

        assert_eq!(manifest.entries["a"], vec!["shared~a~b.js", "a.js", "a.css"]);
        assert_eq!(manifest.entries["b"], vec!["shared~a~b.js"]);
        let scripts: Vec<_> = manifest
            .entry_files("a", AssetKind::Script)
            .into_iter()
            .map(|(file, _)| file)
            .collect();
        assert_eq!(scripts, vec!["shared~a~b.js", "a.js"]);
        assert_eq!(manifest.url_for_source("common.js"), Some("/shared~a~b.js"));
        assert_eq!(
            manifest.url_for_source("font.woff"),
            Some("data:font/woff;base64,AA==")
        );
    }

    #[test]
    fn duplicate_file_names_are_rejected() {
        let mut builder = ManifestBuilder::new(BuildMode::Development, "/", Vec::<String>::new());
        builder
            .add(&asset("logo.png", "img/logo.png", AssetKind::Resource, ChunkOrigin::Standalone, &[]))
            .unwrap();
        let err = builder
            .add(&asset("logo.png", "logo.png", AssetKind::Resource, ChunkOrigin::Standalone, &[]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::DuplicateOutputPath { ref first, ref second, .. }
                if first == "img/logo.png" && second == "logo.png"
        ));
    }

    #[test]
    fn json_round_trip_preserves_order() {
        let mut builder = ManifestBuilder::new(BuildMode::Production, "/", ["z", "a"]);
        builder
            .add(&asset("z.js", "z.js", AssetKind::Script, ChunkOrigin::Entry("z".into()), &["z.js"]))
            .unwrap();
        let manifest = builder.finish();
        let json = manifest.to_json().unwrap();
        assert!(json.find("\"z\"").unwrap() < json.find("\"a\"").unwrap());
        assert_eq!(OutputManifest::from_json(&json).unwrap(), manifest);
    }
}
