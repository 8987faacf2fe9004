//! Output file naming.
//!
//! Development names are `[name].[ext]`; production names are
//! `[name].[contenthash].[ext]` where the hash is a truncated BLAKE3 digest
//! of the chunk's final bytes. Naming is a pure function of name, extension
//! and content.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;
use tote_config::BuildMode;
use tote_config::optimization::{MAX_HASH_LENGTH, MIN_HASH_LENGTH};

use crate::builtins::transforms::extract::split_suffix;
use crate::builtins::transforms::rewrite_urls;
use crate::chunk::Chunk;
use crate::error::ConfigurationError;

pub const DEVELOPMENT_TEMPLATE: &str = "[name].[ext]";
pub const PRODUCTION_TEMPLATE: &str = "[name].[contenthash].[ext]";

/// A chunk's final identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedName {
    pub file_name: String,
    pub url: String,
    pub hash: Option<String>,
}

/// Applies the mode's output template.
#[derive(Debug, Clone)]
pub struct NamingResolver {
    mode: BuildMode,
    hash_length: usize,
    public_path: String,
}

impl NamingResolver {
    pub fn new(
        mode: BuildMode,
        hash_length: usize,
        public_path: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        if !(MIN_HASH_LENGTH..=MAX_HASH_LENGTH).contains(&hash_length) {
            return Err(ConfigurationError::InvalidHashLength(hash_length));
        }
        Ok(Self {
            mode,
            hash_length,
            public_path: public_path.into(),
        })
    }

    pub fn template(&self) -> &'static str {
        if self.mode.is_production() {
            PRODUCTION_TEMPLATE
        } else {
            DEVELOPMENT_TEMPLATE
        }
    }

    pub fn resolve(&self, chunk: &Chunk) -> ResolvedName {
        self.resolve_parts(&chunk.name, &chunk.extension, chunk.content.as_bytes())
    }

    pub fn resolve_parts(&self, name: &str, extension: &str, content: &[u8]) -> ResolvedName {
        let hash = self
            .mode
            .is_production()
            .then(|| content_hash(content, self.hash_length));
        let file_name = render_template(self.template(), name, hash.as_deref(), extension);
        ResolvedName {
            url: public_url(&self.public_path, &file_name),
            file_name,
            hash,
        }
    }
}

/// Hex BLAKE3 digest of `bytes`, truncated to `length` characters.
pub fn content_hash(bytes: &[u8], length: usize) -> String {
    let hex = blake3::hash(bytes).to_hex();
    hex[..length.min(hex.len())].to_string()
}

/// Fill `[name]`, `[contenthash]` and `[ext]`. An empty extension drops its
/// separating dot, as does a missing hash.
pub fn render_template(template: &str, name: &str, hash: Option<&str>, extension: &str) -> String {
    let mut template = template.to_string();
    if extension.is_empty() {
        template = template.replace(".[ext]", "");
    }
    if hash.is_none() {
        template = template.replace(".[contenthash]", "");
    }
    template
        .replace("[name]", name)
        .replace("[contenthash]", hash.unwrap_or_default())
        .replace("[ext]", extension)
}

/// Join an output file name onto the public path.
pub fn public_url(public_path: &str, file: &str) -> String {
    if public_path.is_empty() {
        file.to_string()
    } else if public_path.ends_with('/') {
        format!("{public_path}{file}")
    } else {
        format!("{public_path}/{file}")
    }
}

/// Point stylesheet `url()` references at final output names.
///
/// A reference matches a source when it ends with the source path at a
/// path boundary; the matched tail is swapped for the output file name.
/// Inlined sources are replaced by their data URL outright.
pub fn link_style_references(
    css: &str,
    files: &HashMap<String, String>,
    inlined: &IndexMap<String, String>,
) -> String {
    rewrite_urls(css, |reference| {
        let (target, suffix) = split_suffix(reference);
        let boundaries = std::iter::once(0).chain(
            target
                .match_indices('/')
                .map(|(idx, _)| idx + 1)
                .filter(|idx| *idx < target.len()),
        );
        for start in boundaries {
            let tail = &target[start..];
            if let Some(data) = inlined.get(tail) {
                return Some(data.clone());
            }
            if let Some(file) = files.get(tail) {
                return Some(format!("{}{file}{suffix}", &target[..start]));
            }
        }
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkOrigin;
    use crate::content::Content;
    use tote_config::AssetKind;

    fn chunk(name: &str, ext: &str, content: &str) -> Chunk {
        Chunk {
            name: name.into(),
            kind: AssetKind::Script,
            origin: ChunkOrigin::Entry(name.into()),
            modules: Vec::new(),
            content: Content::from(content),
            extension: ext.into(),
        }
    }

    #[test]
    fn development_names_are_plain() {
        let resolver = NamingResolver::new(BuildMode::Development, 20, "/").unwrap();
        let name = resolver.resolve(&chunk("main", "js", "a"));
        assert_eq!(name.file_name, "main.js");
        assert_eq!(name.url, "/main.js");
        assert_eq!(name.hash, None);
    }

    #[test]
    fn production_names_carry_truncated_hash() {
        let resolver = NamingResolver::new(BuildMode::Production, 8, "").unwrap();
        let name = resolver.resolve(&chunk("main", "js", "a"));
        let hash = content_hash(b"a", 8);
        assert_eq!(hash.len(), 8);
        assert_eq!(name.file_name, format!("main.{hash}.js"));
        assert_eq!(name.url, name.file_name);
    }

    #[test]
    fn naming_is_deterministic_and_byte_sensitive() {
        let resolver = NamingResolver::new(BuildMode::Production, 20, "/").unwrap();
        let first = resolver.resolve(&chunk("main", "js", "console.log(1)"));
        let again = resolver.resolve(&chunk("main", "js", "console.log(1)"));
        let changed = resolver.resolve(&chunk("main", "js", "console.log(2)"));
        assert_eq!(first, again);
        assert_ne!(first.file_name, changed.file_name);
    }

    #[test]
    fn hash_length_is_bounded() {
        assert!(matches!(
            NamingResolver::new(BuildMode::Production, 4, "/"),
            Err(ConfigurationError::InvalidHashLength(4))
        ));
        assert!(NamingResolver::new(BuildMode::Production, 64, "/").is_ok());
    }

    #[test]
    fn empty_extension_drops_dot() {
        assert_eq!(render_template(PRODUCTION_TEMPLATE, "LICENSE", Some("abcd1234"), ""), "LICENSE.abcd1234");
        assert_eq!(render_template(DEVELOPMENT_TEMPLATE, "LICENSE", None, ""), "LICENSE");
    }

    #[test]
    fn public_url_joins_once() {
        assert_eq!(public_url("/", "a.js"), "/a.js");
        assert_eq!(public_url("/static", "a.js"), "/static/a.js");
        assert_eq!(public_url("https://cdn.example/", "a.js"), "https://cdn.example/a.js");
        assert_eq!(public_url("", "a.js"), "a.js");
    }

    #[test]
    fn links_resources_and_inlined_fonts() {
        let files: HashMap<_, _> = [("img/logo.png".to_string(), "img/logo.0123abcd.png".to_string())].into();
        let inlined: IndexMap<_, _> =
            [("fonts/a.woff".to_string(), "data:font/woff;base64,AA==".to_string())].into();
        let css = "a{background:url(\"./img/logo.png?v=1\")}@font-face{src:url('/fonts/a.woff')}b{background:url(other.png)}";
        assert_eq!(
            link_style_references(css, &files, &inlined),
            "a{background:url(\"./img/logo.0123abcd.png?v=1\")}@font-face{src:url('data:font/woff;base64,AA==')}b{background:url(other.png)}"
        );
    }
}
