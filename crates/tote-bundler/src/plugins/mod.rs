//! Lifecycle plugins.
//!
//! Plugins observe a build at three points: once at start, once per
//! finalized asset and once after the manifest is sealed. Every hook has a
//! no-op default; [`HookUsage`] tells the registry which hooks a plugin
//! actually cares about so uninterested plugins are never called.

mod lifecycle;
mod registry;

pub use lifecycle::{Lifecycle, LifecycleState};
pub use registry::{PluginCatalog, PluginFactory, PluginRegistration, PluginRegistry};

use std::borrow::Cow;
use std::path::PathBuf;

use tote_config::{BuildMode, HookName};

use crate::manifest::OutputManifest;
use crate::output::{DerivedFiles, EmittedAsset};

/// Build-wide values visible to plugins.
#[derive(Debug, Clone)]
pub struct HookContext {
    pub mode: BuildMode,
    /// Project root; config-relative paths resolve against it.
    pub root: PathBuf,
    /// Source directory.
    pub context: PathBuf,
    pub output_dir: PathBuf,
    pub public_path: String,
    /// Entry names in declaration order.
    pub entries: Vec<String>,
}

/// Construction-time environment for plugins built from configuration.
pub type PluginEnv = HookContext;

/// Set of hooks a plugin is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HookUsage(u8);

impl HookUsage {
    const fn bit(hook: HookName) -> u8 {
        match hook {
            HookName::OnStart => 1,
            HookName::OnAssetEmit => 1 << 1,
            HookName::OnDone => 1 << 2,
        }
    }

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(0b111)
    }

    pub const fn with(self, hook: HookName) -> Self {
        Self(self.0 | Self::bit(hook))
    }

    pub const fn contains(self, hook: HookName) -> bool {
        self.0 & Self::bit(hook) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn hooks(self) -> impl Iterator<Item = HookName> {
        HookName::ALL.into_iter().filter(move |hook| self.contains(*hook))
    }
}

impl FromIterator<HookName> for HookUsage {
    fn from_iter<I: IntoIterator<Item = HookName>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

/// A pipeline-wide plugin.
pub trait Plugin: Send + Sync {
    fn name(&self) -> Cow<'static, str>;

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::all()
    }

    /// Absolute paths (files or directories) this plugin reads itself and
    /// that must not be discovered as sources.
    fn reserved_sources(&self) -> Vec<PathBuf> {
        Vec::new()
    }

    fn on_start(&self, _ctx: &HookContext) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_asset_emit(&self, _ctx: &HookContext, _asset: &EmittedAsset) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_done(
        &self,
        _ctx: &HookContext,
        _manifest: &OutputManifest,
        _derived: &mut DerivedFiles,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}
