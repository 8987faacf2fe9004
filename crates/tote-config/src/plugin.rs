use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rules::empty_object;

/// Lifecycle points a plugin can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookName {
    OnStart,
    OnAssetEmit,
    OnDone,
}

impl HookName {
    pub const ALL: [HookName; 3] = [Self::OnStart, Self::OnAssetEmit, Self::OnDone];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OnStart => "on_start",
            Self::OnAssetEmit => "on_asset_emit",
            Self::OnDone => "on_done",
        }
    }
}

impl std::fmt::Display for HookName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginOptions {
    pub name: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Narrows the hooks the plugin declares interest in.
    #[serde(default)]
    pub hooks: Option<Vec<HookName>>,

    #[serde(default = "empty_object")]
    pub options: Value,
}

impl PluginOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            hooks: None,
            options: empty_object(),
        }
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }
}

fn default_enabled() -> bool {
    true
}
