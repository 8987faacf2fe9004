//! Production chunk splitting.
//!
//! Script and style modules referenced by two or more entries move into a
//! `shared~<entries>` chunk; modules under `node_modules/` move into a
//! `vendors~<entries>` chunk. Entry chunks left empty are dropped.
//!
//! Split chunks load ahead of the entry that owns them, so a module only
//! moves when it sits in the leading run of movable modules of every entry
//! listing it. If the resulting emit order would still load any entry's
//! modules out of declaration order, the kind is left unsplit.

use std::collections::HashSet;

use indexmap::IndexMap;
use tote_config::AssetKind;
use tracing::debug;

use super::{Chunk, ChunkOrigin, ModuleTable, concat, emit_positions};

const SPLIT_KINDS: [AssetKind; 2] = [AssetKind::Script, AssetKind::Style];

/// (prefix, owning entries) → moved modules
type Groups = IndexMap<(&'static str, Vec<String>), Vec<String>>;

pub fn is_vendor(module: &str) -> bool {
    module.starts_with("node_modules/") || module.contains("/node_modules/")
}

/// Split shared and vendor modules out of entry chunks.
pub fn split_chunks(chunks: Vec<Chunk>, table: &ModuleTable) -> anyhow::Result<Vec<Chunk>> {
    let mut chunks = chunks;
    for kind in SPLIT_KINDS {
        chunks = split_kind(chunks, kind, table)?;
    }
    Ok(chunks)
}

fn split_kind(chunks: Vec<Chunk>, kind: AssetKind, table: &ModuleTable) -> anyhow::Result<Vec<Chunk>> {
    // entry → its modules of this kind, in declaration order
    let declared: IndexMap<String, Vec<String>> = chunks
        .iter()
        .filter(|chunk| chunk.kind == kind)
        .filter_map(|chunk| match &chunk.origin {
            ChunkOrigin::Entry(entry) => Some((entry.clone(), chunk.modules.clone())),
            _ => None,
        })
        .collect();

    // module → entries that reference it, in declaration order
    let mut owners: IndexMap<String, Vec<String>> = IndexMap::new();
    for (entry, modules) in &declared {
        for module in modules {
            owners.entry(module.clone()).or_default().push(entry.clone());
        }
    }

    let movable = hoistable(&declared, &owners);
    let mut groups: Groups = IndexMap::new();
    for (module, entries) in &owners {
        if !movable.contains(module.as_str()) {
            continue;
        }
        let prefix = if is_vendor(module) { "vendors" } else { "shared" };
        groups
            .entry((prefix, entries.clone()))
            .or_default()
            .push(module.clone());
    }
    if groups.is_empty() {
        return Ok(chunks);
    }
    if !preserves_load_order(&declared, &movable, &groups) {
        debug!(%kind, "splitting would reorder entry modules; entries left intact");
        return Ok(chunks);
    }

    let mut out = Vec::with_capacity(chunks.len() + groups.len());
    for mut chunk in chunks {
        let affected = chunk.kind == kind
            && chunk.is_entry()
            && chunk.modules.iter().any(|m| movable.contains(m.as_str()));
        if !affected {
            out.push(chunk);
            continue;
        }
        chunk.modules.retain(|m| !movable.contains(m.as_str()));
        if chunk.modules.is_empty() {
            continue;
        }
        chunk.content = concat(&chunk.modules, table)?;
        out.push(chunk);
    }

    for ((prefix, entries), modules) in groups {
        let content = concat(&modules, table)?;
        out.push(Chunk {
            name: format!("{prefix}~{}", entries.join("~")),
            kind,
            origin: ChunkOrigin::Shared(entries),
            modules,
            content,
            extension: kind.default_extension().to_string(),
        });
    }
    Ok(out)
}

/// Shared or vendor modules that lead every entry listing them.
fn hoistable<'a>(
    declared: &'a IndexMap<String, Vec<String>>,
    owners: &'a IndexMap<String, Vec<String>>,
) -> HashSet<&'a str> {
    let mut movable: HashSet<&str> = owners
        .iter()
        .filter(|(module, entries)| is_vendor(module) || entries.len() >= 2)
        .map(|(module, _)| module.as_str())
        .collect();

    // Dropping a module can end another entry's leading run early.
    loop {
        let mut blocked: Vec<&str> = Vec::new();
        for modules in declared.values() {
            let lead = modules
                .iter()
                .take_while(|m| movable.contains(m.as_str()))
                .count();
            blocked.extend(
                modules[lead..]
                    .iter()
                    .map(String::as_str)
                    .filter(|m| movable.contains(m)),
            );
        }
        if blocked.is_empty() {
            return movable;
        }
        for module in blocked {
            movable.remove(module);
        }
    }
}

/// Whether every entry still loads its modules in declaration order once
/// `groups` are emitted ahead of it.
fn preserves_load_order(
    declared: &IndexMap<String, Vec<String>>,
    movable: &HashSet<&str>,
    groups: &Groups,
) -> bool {
    let mut units: Vec<(ChunkOrigin, Vec<&str>)> = Vec::new();
    for (entry, modules) in declared {
        let kept: Vec<&str> = modules
            .iter()
            .map(String::as_str)
            .filter(|m| !movable.contains(m))
            .collect();
        if !kept.is_empty() {
            units.push((ChunkOrigin::Entry(entry.clone()), kept));
        }
    }
    for ((_, entries), modules) in groups {
        units.push((
            ChunkOrigin::Shared(entries.clone()),
            modules.iter().map(String::as_str).collect(),
        ));
    }

    let origins: Vec<&ChunkOrigin> = units.iter().map(|(origin, _)| origin).collect();
    let order = emit_positions(&origins, declared.keys().map(String::as_str));

    declared.iter().all(|(entry, modules)| {
        let loaded = order
            .iter()
            .map(|&idx| &units[idx])
            .filter(|(origin, _)| origin.includes(entry))
            .flat_map(|(_, modules)| modules.iter().copied());
        loaded.eq(modules.iter().map(String::as_str))
    })
}
