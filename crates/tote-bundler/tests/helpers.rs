//! Shared test utilities for tote-bundler integration tests.

#![allow(dead_code)]

use std::borrow::Cow;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tempfile::TempDir;
use tote_bundler::{
    AssetKind, EmittedAsset, HookContext, Matcher, OutputManifest, Plugin, Rule, SourceFile,
    SourceSet, TransformRegistry, output::DerivedFiles,
};

/// A temp project with `files` written below `src/`.
pub fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    for (path, content) in files {
        let target = dir.path().join("src").join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).expect("create source dir");
        }
        fs::write(target, content).expect("write source");
    }
    dir
}

/// In-memory sources rooted at `/project/src`.
pub fn sources(files: &[(&str, &str)]) -> SourceSet {
    SourceSet::from_files(
        "/project/src",
        files
            .iter()
            .map(|(path, content)| SourceFile::new(path, *content)),
    )
}

/// A rule passing sources with `ext` through the `raw` transform.
pub fn raw_rule(name: &str, ext: &str, kind: AssetKind) -> Rule {
    let registry = TransformRegistry::with_builtins();
    Rule::new(
        name,
        Matcher::extensions([ext]).expect("extension matcher"),
        kind,
    )
    .chain(vec![
        registry
            .resolve(name, "raw", &Value::Null)
            .expect("raw transform"),
    ])
}

pub fn read(dir: &Path, path: &str) -> String {
    fs::read_to_string(dir.join(path)).unwrap_or_else(|e| panic!("reading {path}: {e}"))
}

/// Records every hook it sees into a shared log.
pub struct Recorder {
    pub name: &'static str,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self {
            name,
            log: Arc::clone(log),
        })
    }
}

impl Plugin for Recorder {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(self.name)
    }

    fn on_start(&self, _ctx: &HookContext) -> anyhow::Result<()> {
        self.log.lock().push(format!("{}:start", self.name));
        Ok(())
    }

    fn on_asset_emit(&self, _ctx: &HookContext, asset: &EmittedAsset) -> anyhow::Result<()> {
        self.log
            .lock()
            .push(format!("{}:emit:{}", self.name, asset.file_name));
        Ok(())
    }

    fn on_done(
        &self,
        _ctx: &HookContext,
        _manifest: &OutputManifest,
        _derived: &mut DerivedFiles,
    ) -> anyhow::Result<()> {
        self.log.lock().push(format!("{}:done", self.name));
        Ok(())
    }
}
