//! Ordered hook firing for a single build.

use std::fmt;

use tote_config::HookName;
use tracing::{debug, trace};

use super::{HookContext, PluginRegistry};
use crate::error::{ConfigurationError, PluginError};
use crate::manifest::OutputManifest;
use crate::output::{DerivedFiles, EmittedAsset};
use crate::{Error, Result};

/// Where a build is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Started,
    Emitting,
    Done,
    Failed,
}

impl LifecycleState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Started) | (Self::Started, Self::Emitting) | (Self::Emitting, Self::Done)
        ) || (next == Self::Failed && !self.is_terminal())
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Started => "started",
            Self::Emitting => "emitting",
            Self::Done => "done",
            Self::Failed => "failed",
        })
    }
}

/// Drives plugins through `Idle → Started → Emitting → Done`.
///
/// Each hook fires for every interested plugin in registration order. The
/// first plugin error moves the lifecycle to `Failed` and later plugins for
/// that hook are not called.
pub struct Lifecycle<'a> {
    registry: &'a PluginRegistry,
    ctx: &'a HookContext,
    state: LifecycleState,
}

impl<'a> Lifecycle<'a> {
    pub fn new(registry: &'a PluginRegistry, ctx: &'a HookContext) -> Self {
        Self {
            registry,
            ctx,
            state: LifecycleState::Idle,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Fire `OnStart`.
    pub fn start(&mut self) -> Result<()> {
        self.transition(LifecycleState::Started)?;
        self.fire(HookName::OnStart, |reg, ctx| reg.plugin.on_start(ctx))
    }

    /// Enter the emitting phase; assets may now be announced.
    pub fn begin_emit(&mut self) -> Result<()> {
        self.transition(LifecycleState::Emitting)
    }

    /// Fire `OnAssetEmit` for one finalized asset.
    pub fn emit(&mut self, asset: &EmittedAsset) -> Result<()> {
        if self.state != LifecycleState::Emitting {
            let from = self.state;
            self.state = LifecycleState::Failed;
            return Err(Error::Lifecycle {
                from,
                to: LifecycleState::Emitting,
            });
        }
        trace!(file = %asset.file_name, "asset emitted");
        self.fire(HookName::OnAssetEmit, |reg, ctx| {
            reg.plugin.on_asset_emit(ctx, asset)
        })
    }

    /// Fire `OnDone` and collect the derived files plugins produced.
    ///
    /// `derived` arrives pre-seeded with the manifest's files so plugins
    /// cannot overwrite an emitted asset.
    pub fn finish(
        &mut self,
        manifest: &OutputManifest,
        mut derived: DerivedFiles,
    ) -> Result<DerivedFiles> {
        self.transition(LifecycleState::Done)?;
        let registry = self.registry;
        for reg in registry.interested(HookName::OnDone) {
            let name = reg.plugin.name();
            derived.set_producer(&name);
            if let Err(source) = reg.plugin.on_done(self.ctx, manifest, &mut derived) {
                self.state = LifecycleState::Failed;
                return Err(plugin_failure(&name, HookName::OnDone, source));
            }
        }
        debug!(derived = derived.len(), "lifecycle done");
        Ok(derived)
    }

    /// Mark the build as failed. A no-op once terminal.
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            debug!(from = %self.state, "lifecycle failed");
            self.state = LifecycleState::Failed;
        }
    }

    fn transition(&mut self, next: LifecycleState) -> Result<()> {
        if !self.state.can_become(next) {
            let from = self.state;
            if !from.is_terminal() {
                self.state = LifecycleState::Failed;
            }
            return Err(Error::Lifecycle { from, to: next });
        }
        self.state = next;
        Ok(())
    }

    fn fire<F>(&mut self, hook: HookName, mut call: F) -> Result<()>
    where
        F: FnMut(&super::PluginRegistration, &HookContext) -> anyhow::Result<()>,
    {
        let (registry, ctx) = (self.registry, self.ctx);
        for reg in registry.interested(hook) {
            if let Err(source) = call(reg, ctx) {
                self.state = LifecycleState::Failed;
                return Err(plugin_failure(&reg.plugin.name(), hook, source));
            }
        }
        Ok(())
    }
}

/// Configuration faults raised inside a hook keep their identity.
fn plugin_failure(plugin: &str, hook: HookName, source: anyhow::Error) -> Error {
    match source.downcast::<ConfigurationError>() {
        Ok(config) => Error::Configuration(config),
        Err(source) => Error::Plugin(PluginError {
            plugin: plugin.to_string(),
            hook,
            source,
        }),
    }
}
