//! High-level configuration structure for tote.
//!
//! This module provides the main `ToteConfig` struct, the default project
//! layout and profile merging. For file discovery, see the `discovery`
//! module; for layered loading, see `loading`.

use std::collections::HashMap;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::dev::DevOptions;
use crate::error::{ConfigError, Result as ConfigResult};
use crate::mode::BuildMode;
use crate::optimization::OptimizationOptions;
use crate::plugin::PluginOptions;
use crate::rules::{AssetKind, EntrySources, RuleOptions, TestPattern, TransformOptions};
use crate::settings::GlobalSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToteConfig {
    #[serde(default)]
    pub mode: BuildMode,

    /// Source root; entry and rule paths are relative to it.
    #[serde(default = "default_context")]
    pub context: PathBuf,

    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    #[serde(default = "default_public_path")]
    pub public_path: String,

    #[serde(default)]
    pub entries: IndexMap<String, EntrySources>,

    #[serde(default)]
    pub rules: Vec<RuleOptions>,

    #[serde(default)]
    pub plugins: Vec<PluginOptions>,

    #[serde(default)]
    pub optimization: OptimizationOptions,

    #[serde(default)]
    pub dev: DevOptions,

    #[serde(default)]
    pub settings: GlobalSettings,

    #[serde(default)]
    pub profiles: HashMap<String, ProfileConfig>,
}

/// Per-mode overrides, deep merged over the base configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default)]
    pub public_path: Option<String>,

    #[serde(default)]
    pub output_root: Option<PathBuf>,

    #[serde(default)]
    pub optimization: Value,

    #[serde(default)]
    pub dev: Value,

    #[serde(default)]
    pub settings: Value,

    /// Replaces the plugin list outright when present.
    #[serde(default)]
    pub plugins: Option<Vec<PluginOptions>>,
}

impl Default for ToteConfig {
    /// The default rule set and plugins with no entries declared.
    fn default() -> Self {
        Self {
            mode: BuildMode::default(),
            context: default_context(),
            output_root: default_output_root(),
            public_path: default_public_path(),
            entries: IndexMap::new(),
            rules: default_rules(),
            plugins: default_plugins(),
            optimization: OptimizationOptions::default(),
            dev: DevOptions::default(),
            settings: GlobalSettings::default(),
            profiles: HashMap::new(),
        }
    }
}

impl ToteConfig {
    /// Configuration with no rules, plugins or entries.
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            plugins: Vec::new(),
            ..Self::default()
        }
    }

    /// A complete project: two entries (`main`, `analytics`), scripts,
    /// TypeScript, styles, images, inline fonts, data files and the
    /// `clean`, `html`, `copy` and `manifest` plugins.
    pub fn default_project() -> Self {
        let mut entries = IndexMap::new();
        entries.insert("main".to_string(), EntrySources::from("index.js"));
        entries.insert("analytics".to_string(), EntrySources::from("analytics.ts"));
        Self {
            entries,
            ..Self::default()
        }
    }

    /// Create from serde_json::Value (for programmatic config)
    ///
    /// # Example
    ///
    /// ```
    /// use tote_config::ToteConfig;
    /// use serde_json::json;
    ///
    /// let value = json!({
    ///     "entries": { "main": "index.js" },
    ///     "public_path": "/static/"
    /// });
    ///
    /// let config = ToteConfig::from_value(value).unwrap();
    /// assert_eq!(config.public_path, "/static/");
    /// assert!(config.entries.contains_key("main"));
    /// ```
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }

    /// Convert to serde_json::Value
    pub fn to_value(&self) -> ConfigResult<Value> {
        serde_json::to_value(self).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }

    /// Apply the profile named after `mode`, if one is declared.
    pub fn materialize_profile(mut self, mode: BuildMode) -> ConfigResult<Self> {
        self.mode = mode;
        let Some(profile) = self.profiles.get(mode.as_str()).cloned() else {
            return Ok(self);
        };

        if let Some(public_path) = profile.public_path {
            self.public_path = public_path;
        }
        if let Some(output_root) = profile.output_root {
            self.output_root = output_root;
        }
        if let Some(plugins) = profile.plugins {
            self.plugins = plugins;
        }

        self.optimization = merge_section(&self.optimization, &profile.optimization)?;
        self.dev = merge_section(&self.dev, &profile.dev)?;
        self.settings = merge_section(&self.settings, &profile.settings)?;

        Ok(self)
    }

    /// Source paths of every entry, in declaration order.
    pub fn entry_sources(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(name, sources)| sources.paths().into_iter().map(move |p| (name.as_str(), p)))
    }
}

fn merge_section<T>(base: &T, update: &Value) -> ConfigResult<T>
where
    T: Serialize + serde::de::DeserializeOwned + Clone,
{
    if update.is_null() {
        return Ok(base.clone());
    }
    let mut merged =
        serde_json::to_value(base).map_err(|err| ConfigError::InvalidProfileOverride {
            message: err.to_string(),
        })?;
    merge_values(&mut merged, update);
    serde_json::from_value(merged).map_err(|err| ConfigError::InvalidProfileOverride {
        message: err.to_string(),
    })
}

pub(crate) fn merge_values(target: &mut Value, update: &Value) {
    match (target, update) {
        (Value::Object(target_map), Value::Object(update_map)) => {
            for (key, value) in update_map {
                merge_values(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target_slot, _) => {
            *target_slot = update.clone();
        }
    }
}

fn default_context() -> PathBuf {
    PathBuf::from("src")
}

fn default_output_root() -> PathBuf {
    PathBuf::from("dist")
}

fn default_public_path() -> String {
    "/".into()
}

fn default_rules() -> Vec<RuleOptions> {
    let not_vendored = || TestPattern::Regex("(node_modules|bower_components)/".into());
    let exts = |list: &[&str]| TestPattern::Extensions(list.iter().map(|s| s.to_string()).collect());

    vec![
        RuleOptions::new("scripts", exts(&["js", "mjs"]), AssetKind::Script)
            .exclude(not_vendored())
            .chain([TransformOptions::new("script")]),
        RuleOptions::new("typescript", exts(&["ts"]), AssetKind::Script)
            .exclude(not_vendored())
            .chain([TransformOptions::new("script")]),
        RuleOptions::new("vendor-scripts", exts(&["js", "mjs"]), AssetKind::Script)
            .chain([TransformOptions::new("raw")]),
        RuleOptions::new("styles", exts(&["css"]), AssetKind::Style).chain([
            TransformOptions::new("extract").with_options(json!({ "public_path": "./" })),
            TransformOptions::new("css"),
        ]),
        RuleOptions::new("sass", exts(&["sass", "scss"]), AssetKind::Style).chain([
            TransformOptions::new("extract").with_options(json!({ "public_path": "./" })),
            TransformOptions::new("css"),
            TransformOptions::new("sass"),
        ]),
        RuleOptions::new("less", exts(&["less"]), AssetKind::Style).chain([
            TransformOptions::new("extract").with_options(json!({ "public_path": "./" })),
            TransformOptions::new("css"),
            TransformOptions::new("less"),
        ]),
        RuleOptions::new("images", exts(&["ico", "gif", "png", "jpg", "jpeg"]), AssetKind::Resource)
            .chain([TransformOptions::new("raw")]),
        RuleOptions::new(
            "fonts",
            exts(&["woff", "woff2", "eot", "ttf", "otf", "svg"]),
            AssetKind::Inline,
        )
        .chain([TransformOptions::new("inline")]),
        RuleOptions::new("xml", exts(&["xml"]), AssetKind::Resource)
            .chain([TransformOptions::new("xml")]),
        RuleOptions::new("csv", exts(&["csv"]), AssetKind::Resource)
            .chain([TransformOptions::new("csv")]),
        RuleOptions::new("json", exts(&["json"]), AssetKind::Resource)
            .chain([TransformOptions::new("json")]),
        RuleOptions::new("static", TestPattern::Any, AssetKind::Resource)
            .chain([TransformOptions::new("raw")]),
    ]
}

fn default_plugins() -> Vec<PluginOptions> {
    vec![
        PluginOptions::new("clean"),
        PluginOptions::new("html").with_options(json!({ "template": "index.html" })),
        PluginOptions::new("copy")
            .with_options(json!({
                "patterns": [{ "from": "src/favicon.ico", "to": "" }],
                "no_error_on_missing": true
            })),
        PluginOptions::new("manifest"),
    ]
}
