//! Plugins registered by [`PluginCatalog::with_builtins`].
//!
//! [`PluginCatalog::with_builtins`]: crate::plugins::PluginCatalog::with_builtins

mod clean;
mod copy;
mod html;
mod manifest;

pub use clean::{CleanOptions, CleanPlugin};
pub use copy::{CopyOptions, CopyPattern, CopyPlugin};
pub use html::{HtmlOptions, HtmlPlugin};
pub use manifest::{ManifestOptions, ManifestPlugin};

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Deserialize plugin options; `null` means all defaults.
pub(crate) fn parse_options<T: DeserializeOwned + Default>(options: &Value) -> Result<T, String> {
    if options.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(options.clone()).map_err(|e| e.to_string())
}
