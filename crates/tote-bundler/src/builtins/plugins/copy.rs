use std::borrow::Cow;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;
use tote_config::HookName;
use tracing::warn;
use walkdir::WalkDir;

use super::parse_options;
use crate::content::Content;
use crate::manifest::OutputManifest;
use crate::output::DerivedFiles;
use crate::plugins::{HookContext, HookUsage, Plugin};
use crate::rules::path;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CopyPattern {
    /// File or directory, relative to the project root.
    pub from: String,
    /// Output path. Empty or ending in `/` names a directory.
    #[serde(default)]
    pub to: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CopyOptions {
    pub patterns: Vec<CopyPattern>,
    pub no_error_on_missing: bool,
}

/// Copies files verbatim into the output, bypassing the pipeline.
#[derive(Debug, Clone)]
pub struct CopyPlugin {
    options: CopyOptions,
    root: PathBuf,
}

impl CopyPlugin {
    pub fn new(options: CopyOptions, root: impl Into<PathBuf>) -> Self {
        Self {
            options,
            root: root.into(),
        }
    }

    pub fn from_options(options: &Value, ctx: &HookContext) -> Result<Self, String> {
        let options: CopyOptions = parse_options(options)?;
        if let Some(pattern) = options.patterns.iter().find(|p| p.from.trim().is_empty()) {
            return Err(format!("pattern to `{}` has an empty `from`", pattern.to));
        }
        Ok(Self::new(options, &ctx.root))
    }

    fn source(&self, pattern: &CopyPattern) -> PathBuf {
        self.root.join(&pattern.from)
    }
}

/// Output path for `file_name` copied under `to`.
fn target(to: &str, file_name: &str) -> String {
    if to.is_empty() || to.ends_with('/') {
        path::normalize(&format!("{to}{file_name}"))
    } else {
        path::normalize(to)
    }
}

fn copy_dir(dir: &Path, to: &str, derived: &mut DerivedFiles) -> anyhow::Result<()> {
    let prefix = if to.is_empty() || to.ends_with('/') {
        to.to_string()
    } else {
        format!("{to}/")
    };
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(dir)?.to_string_lossy().replace('\\', "/");
        let bytes = std::fs::read(entry.path())
            .with_context(|| format!("reading {}", entry.path().display()))?;
        derived.insert(
            path::normalize(&format!("{prefix}{relative}")),
            Content::from_bytes(bytes),
        )?;
    }
    Ok(())
}

impl Plugin for CopyPlugin {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("copy")
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::empty().with(HookName::OnDone)
    }

    fn reserved_sources(&self) -> Vec<PathBuf> {
        self.options
            .patterns
            .iter()
            .map(|pattern| self.source(pattern))
            .collect()
    }

    fn on_done(
        &self,
        _ctx: &HookContext,
        _manifest: &OutputManifest,
        derived: &mut DerivedFiles,
    ) -> anyhow::Result<()> {
        for pattern in &self.options.patterns {
            let source = self.source(pattern);
            if source.is_dir() {
                copy_dir(&source, &pattern.to, derived)?;
            } else if source.is_file() {
                let bytes = std::fs::read(&source)
                    .with_context(|| format!("reading {}", source.display()))?;
                let file_name = path::file_name(&pattern.from.replace('\\', "/")).to_string();
                derived.insert(target(&pattern.to, &file_name), Content::from_bytes(bytes))?;
            } else if self.options.no_error_on_missing {
                warn!(from = %pattern.from, "copy source missing; skipped");
            } else {
                anyhow::bail!("copy source `{}` does not exist", pattern.from);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tote_config::BuildMode;

    fn ctx(root: &Path) -> HookContext {
        HookContext {
            mode: BuildMode::Development,
            root: root.to_path_buf(),
            context: root.join("src"),
            output_dir: root.join("dist"),
            public_path: "/".into(),
            entries: Vec::new(),
        }
    }

    fn manifest() -> OutputManifest {
        OutputManifest::new(BuildMode::Development, "/")
    }

    #[test]
    fn target_handles_directory_destinations() {
        assert_eq!(target("", "favicon.ico"), "favicon.ico");
        assert_eq!(target("static/", "a.txt"), "static/a.txt");
        assert_eq!(target("robots.txt", "robots.dev.txt"), "robots.txt");
    }

    #[test]
    fn copies_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/public/img")).unwrap();
        fs::write(dir.path().join("src/favicon.ico"), [0xffu8, 0, 1]).unwrap();
        fs::write(dir.path().join("src/public/img/a.svg"), "<svg/>").unwrap();

        let options = serde_json::json!({
            "patterns": [
                { "from": "src/favicon.ico" },
                { "from": "src/public", "to": "static" }
            ]
        });
        let plugin = CopyPlugin::from_options(&options, &ctx(dir.path())).unwrap();
        assert_eq!(
            plugin.reserved_sources(),
            vec![dir.path().join("src/favicon.ico"), dir.path().join("src/public")]
        );

        let mut derived = DerivedFiles::default();
        plugin.on_done(&ctx(dir.path()), &manifest(), &mut derived).unwrap();
        assert_eq!(
            derived.get("favicon.ico").unwrap().content,
            Content::Binary(vec![0xff, 0, 1])
        );
        assert!(derived.get("static/img/a.svg").is_some());
    }

    #[test]
    fn missing_source_respects_flag() {
        let dir = tempfile::tempdir().unwrap();
        let strict = CopyPlugin::from_options(
            &serde_json::json!({ "patterns": [{ "from": "nope.txt" }] }),
            &ctx(dir.path()),
        )
        .unwrap();
        let mut derived = DerivedFiles::default();
        assert!(strict.on_done(&ctx(dir.path()), &manifest(), &mut derived).is_err());

        let lenient = CopyPlugin::from_options(
            &serde_json::json!({ "patterns": [{ "from": "nope.txt" }], "no_error_on_missing": true }),
            &ctx(dir.path()),
        )
        .unwrap();
        assert!(lenient.on_done(&ctx(dir.path()), &manifest(), &mut derived).is_ok());
    }
}
