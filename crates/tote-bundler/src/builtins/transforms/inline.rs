use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::Value;

use crate::content::Content;
use crate::rules::path;
use crate::transform::{Transform, TransformInput, known_keys, string_option};

/// Encodes content as a `data:` URL.
pub struct InlineTransform;

impl Transform for InlineTransform {
    fn name(&self) -> &str {
        "inline"
    }

    fn validate_options(&self, options: &Value) -> Result<(), String> {
        known_keys(options, &["mime"])?;
        string_option(options, "mime").map(|_| ())
    }

    fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<Content> {
        let mime = string_option(input.options, "mime")
            .map_err(anyhow::Error::msg)?
            .unwrap_or_else(|| mime_type(input.path));
        Ok(Content::Text(data_url(mime, input.content.as_bytes())))
    }
}

pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// MIME type by extension, `application/octet-stream` when unknown.
pub fn mime_type(source: &str) -> &'static str {
    let ext = path::extension(source).map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("js" | "mjs") => "text/javascript",
        Some("css") => "text/css",
        Some("html" | "htm") => "text/html",
        Some("json" | "map") => "application/json",
        Some("xml") => "application/xml",
        Some("csv") => "text/csv",
        Some("txt") => "text/plain",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        Some("eot") => "application/vnd.ms-fontobject",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}
