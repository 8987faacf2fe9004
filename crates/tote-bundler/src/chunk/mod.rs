//! Grouping transformed assets into output chunks.
//!
//! An entry's script, style and markup sources are concatenated into one
//! chunk per kind, named after the entry. Every other source, and every
//! resource an entry lists, becomes a standalone chunk named after its
//! path. Inline assets never become chunks; they are folded into the
//! manifest as data URLs.

pub mod split;

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;
use tote_config::AssetKind;

use crate::content::{Asset, Content};
use crate::error::ConfigurationError;
use crate::rules::path;

/// Transformed assets keyed by source path, in discovery order.
pub type ModuleTable = IndexMap<String, Asset>;

/// Kinds that are concatenated per entry, in emit order.
pub const CONCATENATED_KINDS: [AssetKind; 3] =
    [AssetKind::Script, AssetKind::Style, AssetKind::Markup];

/// Why a chunk exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "entries")]
pub enum ChunkOrigin {
    /// Sources of a single entry.
    Entry(String),
    /// Sources split out of several entries, in declaration order.
    Shared(Vec<String>),
    /// A single source not concatenated into any entry.
    Standalone,
}

/// A pre-naming output unit.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Base name before the output template is applied.
    pub name: String,
    pub kind: AssetKind,
    pub origin: ChunkOrigin,
    /// Source paths in concatenation order.
    pub modules: Vec<String>,
    pub content: Content,
    /// Output extension without the dot; may be empty.
    pub extension: String,
}

impl ChunkOrigin {
    /// Whether chunks of this origin load as part of `entry`.
    pub fn includes(&self, entry: &str) -> bool {
        match self {
            ChunkOrigin::Entry(name) => name == entry,
            ChunkOrigin::Shared(entries) => entries.iter().any(|e| e == entry),
            ChunkOrigin::Standalone => false,
        }
    }
}

impl Chunk {
    /// Label used in diagnostics: the chunk name plus its extension.
    pub fn label(&self) -> String {
        if self.extension.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.name, self.extension)
        }
    }

    pub fn is_entry(&self) -> bool {
        matches!(self.origin, ChunkOrigin::Entry(_))
    }
}

/// Join the text of `modules` with newlines.
pub fn concat(modules: &[String], table: &ModuleTable) -> anyhow::Result<Content> {
    let mut out = String::new();
    for (idx, module) in modules.iter().enumerate() {
        let asset = table
            .get(module)
            .ok_or_else(|| anyhow::anyhow!("module `{module}` is not in the build"))?;
        if idx > 0 {
            out.push('\n');
        }
        out.push_str(&asset.content.to_text()?);
    }
    Ok(Content::Text(out))
}

/// Group `table` into chunks.
///
/// `entries` maps entry names to normalized source paths in declaration
/// order. Sources present in `inlined` are skipped.
pub fn group(
    entries: &IndexMap<String, Vec<String>>,
    table: &ModuleTable,
    inlined: &IndexMap<String, String>,
) -> Result<Vec<Chunk>, ConfigurationError> {
    let mut chunks = Vec::new();
    let mut claimed: HashSet<&str> = HashSet::new();

    for (entry, sources) in entries {
        let mut by_kind: IndexMap<AssetKind, Vec<String>> = CONCATENATED_KINDS
            .iter()
            .map(|kind| (*kind, Vec::new()))
            .collect();

        for source in sources {
            if inlined.contains_key(source) {
                continue;
            }
            let (key, asset) = table.get_key_value(source.as_str()).ok_or_else(|| {
                ConfigurationError::UnknownEntrySource {
                    entry: entry.clone(),
                    source_path: source.clone(),
                }
            })?;
            // Resources stay standalone even when an entry lists them.
            if let Some(modules) = by_kind.get_mut(&asset.kind) {
                if !modules.contains(source) {
                    modules.push(source.clone());
                }
                claimed.insert(key.as_str());
            }
        }

        for (kind, modules) in by_kind {
            if modules.is_empty() {
                continue;
            }
            let content = concat(&modules, table).map_err(|e| {
                ConfigurationError::MalformedRule {
                    rule: format!("entry `{entry}`"),
                    reason: format!("{kind} sources must be text: {e}"),
                }
            })?;
            chunks.push(Chunk {
                name: entry.clone(),
                kind,
                origin: ChunkOrigin::Entry(entry.clone()),
                modules,
                content,
                extension: kind.default_extension().to_string(),
            });
        }
    }

    for (source, asset) in table {
        if claimed.contains(source.as_str()) || inlined.contains_key(source) {
            continue;
        }
        chunks.push(standalone(asset));
    }

    Ok(chunks)
}

fn standalone(asset: &Asset) -> Chunk {
    let extension = match asset.kind {
        AssetKind::Resource | AssetKind::Inline => asset.source_extension().unwrap_or_default(),
        kind => kind.default_extension(),
    };
    Chunk {
        name: path::without_extension(&asset.source_path).to_string(),
        kind: asset.kind,
        origin: ChunkOrigin::Standalone,
        modules: vec![asset.source_path.clone()],
        content: asset.content.clone(),
        extension: extension.to_string(),
    }
}

/// Order chunks for emission: for each entry in declaration order, the
/// shared chunks it depends on, then its own chunks; standalone chunks last
/// in discovery order.
pub fn emit_order(chunks: Vec<Chunk>, entries: &IndexMap<String, Vec<String>>) -> Vec<Chunk> {
    let origins: Vec<&ChunkOrigin> = chunks.iter().map(|chunk| &chunk.origin).collect();
    let order = emit_positions(&origins, entries.keys().map(String::as_str));
    let mut slots: Vec<Option<Chunk>> = chunks.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|idx| slots.get_mut(idx).and_then(Option::take))
        .collect()
}

/// Indices of `origins` in the order [`emit_order`] places them.
pub(crate) fn emit_positions<'a>(
    origins: &[&ChunkOrigin],
    entries: impl IntoIterator<Item = &'a str>,
) -> Vec<usize> {
    let mut placed = vec![false; origins.len()];
    let mut order = Vec::with_capacity(origins.len());
    let mut place = |idx: usize, order: &mut Vec<usize>| {
        if !placed[idx] {
            placed[idx] = true;
            order.push(idx);
        }
    };

    for entry in entries {
        for (idx, origin) in origins.iter().enumerate() {
            if matches!(origin, ChunkOrigin::Shared(_)) && origin.includes(entry) {
                place(idx, &mut order);
            }
        }
        for (idx, origin) in origins.iter().enumerate() {
            if matches!(origin, ChunkOrigin::Entry(_)) && origin.includes(entry) {
                place(idx, &mut order);
            }
        }
    }
    for (idx, origin) in origins.iter().enumerate() {
        if matches!(origin, ChunkOrigin::Shared(_)) {
            place(idx, &mut order);
        }
    }
    for idx in 0..origins.len() {
        place(idx, &mut order);
    }
    order
}
