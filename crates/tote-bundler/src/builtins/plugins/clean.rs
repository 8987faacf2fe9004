use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use path_clean::PathClean;
use serde::Deserialize;
use serde_json::Value;
use tote_config::HookName;
use tracing::{debug, info};

use super::parse_options;
use crate::plugins::{HookContext, HookUsage, Plugin};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CleanOptions {
    /// Top-level names in the output directory to leave in place.
    pub keep: Vec<String>,
}

/// Empties the output directory before a build starts.
#[derive(Debug, Clone, Default)]
pub struct CleanPlugin {
    options: CleanOptions,
}

impl CleanPlugin {
    pub fn new(options: CleanOptions) -> Self {
        Self { options }
    }

    pub fn from_options(options: &Value, _ctx: &HookContext) -> Result<Self, String> {
        parse_options(options).map(Self::new)
    }
}

/// Lexical and resolved forms of `path`, so `..` segments and symlinks both
/// count in containment checks.
fn forms(path: &Path) -> [PathBuf; 2] {
    let lexical = path.clean();
    let resolved = fs::canonicalize(path).unwrap_or_else(|_| lexical.clone());
    [lexical, resolved]
}

fn contains(out: &[PathBuf; 2], path: &Path) -> bool {
    let inner = forms(path);
    out.iter().any(|o| inner.iter().any(|p| p.starts_with(o)))
}

/// An output directory that would take sources or the whole disk with it.
fn refuse_reason(ctx: &HookContext) -> Option<&'static str> {
    let out = forms(&ctx.output_dir);
    if out.iter().any(|o| o.parent().is_none()) {
        Some("it is a filesystem root")
    } else if contains(&out, &ctx.root) {
        Some("it contains the project root")
    } else if contains(&out, &ctx.context) {
        Some("it contains the source directory")
    } else {
        None
    }
}

impl Plugin for CleanPlugin {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("clean")
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::empty().with(HookName::OnStart)
    }

    fn on_start(&self, ctx: &HookContext) -> anyhow::Result<()> {
        if let Some(reason) = refuse_reason(ctx) {
            anyhow::bail!(
                "refusing to clean `{}`: {reason}",
                ctx.output_dir.display()
            );
        }
        if !ctx.output_dir.is_dir() {
            return Ok(());
        }

        let mut removed = 0usize;
        for entry in fs::read_dir(&ctx.output_dir)
            .with_context(|| format!("reading {}", ctx.output_dir.display()))?
        {
            let entry = entry?;
            let name = entry.file_name();
            if self.options.keep.iter().any(|keep| name == keep.as_str()) {
                continue;
            }
            remove(&entry.path())?;
            removed += 1;
        }
        debug!(dir = %ctx.output_dir.display(), removed, "output cleaned");
        if removed > 0 {
            info!("cleaned {}", ctx.output_dir.display());
        }
        Ok(())
    }
}

fn remove(path: &Path) -> anyhow::Result<()> {
    let file_type = fs::symlink_metadata(path)?.file_type();
    if file_type.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
    .with_context(|| format!("removing {}", path.display()))
}
