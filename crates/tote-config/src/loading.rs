//! Layered configuration loading.
//!
//! Priority, lowest first: built-in defaults, the config file (`tote.toml` or
//! the `tote` field of `package.json`), `NODE_ENV`, `TOTE_*` environment
//! variables, then CLI overrides. The profile for the resulting mode is
//! applied last.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::config::ToteConfig;
use crate::discovery::{ConfigDiscovery, read_config_value};
use crate::error::{ConfigError, Result};
use crate::mode::BuildMode;

/// Values supplied on the command line. `None` leaves lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub mode: Option<BuildMode>,
    pub output_root: Option<PathBuf>,
    pub public_path: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub open: Option<bool>,
}

impl ConfigOverrides {
    fn to_value(&self) -> Value {
        let mut top = Map::new();
        if let Some(mode) = self.mode {
            top.insert("mode".into(), json!(mode));
        }
        if let Some(output_root) = &self.output_root {
            top.insert("output_root".into(), json!(output_root));
        }
        if let Some(public_path) = &self.public_path {
            top.insert("public_path".into(), json!(public_path));
        }

        let mut dev = Map::new();
        if let Some(host) = &self.host {
            dev.insert("host".into(), json!(host));
        }
        if let Some(port) = self.port {
            dev.insert("port".into(), json!(port));
        }
        if let Some(open) = self.open {
            dev.insert("open".into(), json!(open));
        }
        if !dev.is_empty() {
            top.insert("dev".into(), Value::Object(dev));
        }

        Value::Object(top)
    }
}

/// Load configuration for the project rooted at `root`.
///
/// `config_path` replaces discovery when given; a missing discovered file
/// is not an error and leaves the defaults in place.
pub fn load(
    root: &Path,
    config_path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<ToteConfig> {
    let mut figment = Figment::new().merge(Serialized::defaults(ToteConfig::default().to_value()?));

    let file = match config_path {
        Some(path) => Some(root.join(path)),
        None => ConfigDiscovery::new(root).find(),
    };
    let mut file_entries = None;
    if let Some(path) = &file {
        debug!(path = %path.display(), "loading config file");
        let value = read_config_value(path)?;
        file_entries = value.get("entries").cloned();
        figment = figment.merge(Serialized::defaults(value));
    }

    if let Some(mode) = node_env_mode() {
        figment = figment.merge(Serialized::defaults(json!({ "mode": mode })));
    }

    figment = figment
        .merge(Env::prefixed("TOTE_").split("__"))
        .merge(Serialized::defaults(overrides.to_value()));

    // Extracting through JSON keeps serde's enum and untagged handling intact.
    let value: Value = figment.extract().map_err(|e| ConfigError::InvalidValue {
        field: "configuration".to_string(),
        hint: Some(format!("{e}. Check tote.toml syntax and field types")),
    })?;
    let mut config = ToteConfig::from_value(value)?;

    // Figment dictionaries are sorted; entry order is significant.
    if let Some(entries) = file_entries {
        config.entries = serde_json::from_value(entries).map_err(|e| ConfigError::InvalidValue {
            field: "entries".to_string(),
            hint: Some(e.to_string()),
        })?;
    }

    let mode = config.mode;
    config.materialize_profile(mode)
}

fn node_env_mode() -> Option<BuildMode> {
    let value = std::env::var("NODE_ENV").ok()?;
    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_serialize_only_present_fields() {
        let overrides = ConfigOverrides {
            port: Some(8080),
            public_path: Some("/app/".into()),
            ..Default::default()
        };
        assert_eq!(
            overrides.to_value(),
            json!({ "public_path": "/app/", "dev": { "port": 8080 } })
        );
        assert_eq!(ConfigOverrides::default().to_value(), json!({}));
    }
}
