use std::borrow::Cow;

use serde::Deserialize;
use serde_json::Value;
use tote_config::HookName;

use super::parse_options;
use crate::manifest::OutputManifest;
use crate::output::DerivedFiles;
use crate::plugins::{HookContext, HookUsage, Plugin};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestOptions {
    pub filename: String,
}

impl Default for ManifestOptions {
    fn default() -> Self {
        Self {
            filename: "manifest.json".to_string(),
        }
    }
}

/// Writes the sealed manifest as JSON.
#[derive(Debug, Clone, Default)]
pub struct ManifestPlugin {
    options: ManifestOptions,
}

impl ManifestPlugin {
    pub fn new(options: ManifestOptions) -> Self {
        Self { options }
    }

    pub fn from_options(options: &Value) -> Result<Self, String> {
        let options: ManifestOptions = parse_options(options)?;
        if options.filename.trim().is_empty() {
            return Err("`filename` must not be empty".to_string());
        }
        Ok(Self::new(options))
    }
}

impl Plugin for ManifestPlugin {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("manifest")
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::empty().with(HookName::OnDone)
    }

    fn on_done(
        &self,
        _ctx: &HookContext,
        manifest: &OutputManifest,
        derived: &mut DerivedFiles,
    ) -> anyhow::Result<()> {
        derived.insert(&self.options.filename, manifest.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filename_defaults_and_overrides() {
        assert_eq!(
            ManifestPlugin::from_options(&json!({})).unwrap().options.filename,
            "manifest.json"
        );
        assert_eq!(
            ManifestPlugin::from_options(&json!({ "filename": "assets.json" }))
                .unwrap()
                .options
                .filename,
            "assets.json"
        );
        assert!(ManifestPlugin::from_options(&json!({ "file": "x" })).is_err());
    }
}
