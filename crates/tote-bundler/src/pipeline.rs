//! The build pipeline: transform, group, optimize, name, emit.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use rayon::prelude::*;
use tote_config::validation::is_valid_entry_name;
use tote_config::{BuildMode, OptimizationOptions, ToteConfig, validate_schema};
use tracing::{debug, info, info_span, warn};

use crate::builtins::transforms::{data_url, mime_type};
use crate::chunk::{self, Chunk, ChunkOrigin, ModuleTable};
use crate::content::{Asset, Content};
use crate::discovery::{self, Discover, SourceFile, SourceSet};
use crate::error::ConfigurationError;
use crate::manifest::ManifestBuilder;
use crate::naming::{NamingResolver, link_style_references};
use crate::optimize::OptimizationStage;
use crate::output::{BuildOutput, DerivedFiles, EmittedAsset};
use crate::plugins::{
    HookContext, HookUsage, Lifecycle, Plugin, PluginCatalog, PluginRegistry,
};
use crate::rules::{Rule, RuleSet, path};
use crate::transform::{ChainExecutor, TransformContext, TransformRegistry};
use crate::{AssetKind, Result};

/// A configured, reusable build pipeline.
///
/// Construction validates everything that can be checked without sources.
/// [`Pipeline::build`] is then a pure function of the [`SourceSet`] apart
/// from what plugins do in their hooks.
#[derive(Debug)]
pub struct Pipeline {
    ctx: HookContext,
    /// Entry → normalized source paths, in declaration order.
    entries: IndexMap<String, Vec<String>>,
    rules: RuleSet,
    plugins: PluginRegistry,
    optimization: OptimizationOptions,
    naming: NamingResolver,
    parallel: bool,
    exclude: Vec<String>,
}

impl Pipeline {
    pub fn builder(mode: BuildMode) -> PipelineBuilder {
        PipelineBuilder::new(mode)
    }

    /// Build from configuration with the built-in transforms and plugins.
    pub fn from_config(config: &ToteConfig, root: impl AsRef<Path>) -> Result<Self> {
        Self::from_config_with(
            config,
            root,
            &TransformRegistry::with_builtins(),
            &PluginCatalog::with_builtins(),
        )
    }

    /// Build from configuration resolving names against custom registries.
    pub fn from_config_with(
        config: &ToteConfig,
        root: impl AsRef<Path>,
        transforms: &TransformRegistry,
        catalog: &PluginCatalog,
    ) -> Result<Self> {
        validate_schema(config)?;
        let root = root.as_ref();

        let mut builder = PipelineBuilder::new(config.mode)
            .root(root)
            .context(root.join(&config.context))
            .output_dir(root.join(&config.output_root))
            .public_path(&config.public_path)
            .optimization(config.optimization.clone())
            .parallel(config.settings.parallel)
            .exclude(config.settings.exclude.iter().cloned());
        for (name, sources) in &config.entries {
            builder = builder.entry(name, sources.paths());
        }
        builder.rules = Some(RuleSet::from_options(&config.rules, transforms)?);

        let ctx = builder.hook_context();
        let registry = catalog.instantiate(&config.plugins, &ctx)?;
        builder.registry = registry;
        builder.build()
    }

    pub fn mode(&self) -> BuildMode {
        self.ctx.mode
    }

    pub fn context_dir(&self) -> &Path {
        &self.ctx.context
    }

    pub fn output_dir(&self) -> &Path {
        &self.ctx.output_dir
    }

    pub fn hook_context(&self) -> &HookContext {
        &self.ctx
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Sources a build would see: everything `discovery` lists under the
    /// context directory, minus excluded fragments and plugin-reserved paths.
    pub fn load_sources(&self, discovery: &dyn Discover) -> io::Result<SourceSet> {
        let reserved: Vec<PathBuf> = self
            .plugins
            .registrations()
            .iter()
            .flat_map(|reg| reg.plugin.reserved_sources())
            .collect();
        let output_dir = self.ctx.output_dir.clone();

        SourceSet::load(&self.ctx.context, discovery, |absolute, relative| {
            !discovery::is_excluded(&self.exclude, relative)
                && !absolute.starts_with(&output_dir)
                && !reserved.iter().any(|r| absolute.starts_with(r))
        })
    }

    /// Run one build over `sources`.
    pub fn build(&self, sources: &SourceSet) -> Result<BuildOutput> {
        let span = info_span!("build", mode = %self.ctx.mode, sources = sources.len());
        let _guard = span.enter();

        let mut lifecycle = Lifecycle::new(&self.plugins, &self.ctx);
        let result = self.run(&mut lifecycle, sources);
        match &result {
            Ok(output) => info!(
                assets = output.assets.len(),
                derived = output.derived.len(),
                "build finished"
            ),
            Err(err) => {
                lifecycle.fail();
                warn!(error = %err, "build failed");
            }
        }
        result
    }

    fn run(&self, lifecycle: &mut Lifecycle<'_>, sources: &SourceSet) -> Result<BuildOutput> {
        lifecycle.start()?;
        let assets = self.transform_all(sources.files())?;
        lifecycle.begin_emit()?;

        let (table, inlined) = fold_inline(assets);
        let chunks = chunk::group(&self.entries, &table, &inlined)?;
        let chunks = OptimizationStage::new(self.ctx.mode, &self.optimization).run(chunks, &table)?;
        let chunks = chunk::emit_order(chunks, &self.entries);
        let emitted = self.finalize(chunks, &inlined);

        let mut manifest = ManifestBuilder::new(
            self.ctx.mode,
            &self.ctx.public_path,
            self.entries.keys().cloned(),
        );
        for asset in &emitted {
            manifest.add(asset)?;
        }
        for (source, data) in &inlined {
            manifest.inline(source, data);
        }
        let manifest = manifest.finish();

        for asset in &emitted {
            lifecycle.emit(asset)?;
        }
        let derived = lifecycle.finish(&manifest, DerivedFiles::reserving(&manifest))?;

        Ok(BuildOutput {
            manifest,
            assets: emitted,
            derived: derived.into_files(),
        })
    }

    /// Match and transform every source. Sequential runs stop at the first
    /// failure; parallel runs finish in-flight work and report the first
    /// failure in discovery order.
    fn transform_all(&self, files: &[SourceFile]) -> Result<Vec<Asset>> {
        let executor = ChainExecutor::new(TransformContext {
            public_path: self.ctx.public_path.clone(),
            mode: self.ctx.mode,
        });
        let transform_one = |file: &SourceFile| -> Result<Asset> {
            let rule = self.rules.match_source(&file.path)?;
            debug!(source = %file.path, rule = %rule.name, "matched");
            let asset = Asset::new(file.path.clone(), rule.kind, file.content.clone());
            Ok(executor.apply(asset, &rule.chain)?)
        };

        if self.parallel {
            let results: Vec<Result<Asset>> = files.par_iter().map(transform_one).collect();
            results.into_iter().collect()
        } else {
            files.iter().map(transform_one).collect()
        }
    }

    /// Name every chunk. Non-style chunks are named first so stylesheet
    /// references can be linked to final resource names before styles are
    /// hashed.
    fn finalize(&self, chunks: Vec<Chunk>, inlined: &IndexMap<String, String>) -> Vec<EmittedAsset> {
        let mut names: Vec<_> = chunks
            .iter()
            .map(|chunk| (chunk.kind != AssetKind::Style).then(|| self.naming.resolve(chunk)))
            .collect();

        let files: HashMap<String, String> = chunks
            .iter()
            .zip(&names)
            .filter(|(chunk, _)| chunk.origin == ChunkOrigin::Standalone)
            .filter_map(|(chunk, name)| {
                let name = name.as_ref()?;
                Some((chunk.modules.first()?.clone(), name.file_name.clone()))
            })
            .collect();

        let mut chunks = chunks;
        for (chunk, name) in chunks.iter_mut().zip(names.iter_mut()) {
            if chunk.kind != AssetKind::Style {
                continue;
            }
            if let Some(css) = chunk.content.as_text() {
                chunk.content = Content::Text(link_style_references(css, &files, inlined));
            }
            *name = Some(self.naming.resolve(chunk));
        }

        chunks
            .into_iter()
            .zip(names)
            .map(|(chunk, name)| {
                let name = name.unwrap_or_else(|| self.naming.resolve(&chunk));
                debug!(chunk = %chunk.label(), file = %name.file_name, "named");
                EmittedAsset {
                    file_name: name.file_name,
                    url: name.url,
                    chunk: chunk.label(),
                    kind: chunk.kind,
                    origin: chunk.origin,
                    modules: chunk.modules,
                    hash: name.hash,
                    content: chunk.content,
                }
            })
            .collect()
    }
}

/// Split inline assets off as data URLs.
fn fold_inline(assets: Vec<Asset>) -> (ModuleTable, IndexMap<String, String>) {
    let mut table = ModuleTable::new();
    let mut inlined = IndexMap::new();
    for asset in assets {
        if asset.kind != AssetKind::Inline {
            table.insert(asset.source_path.clone(), asset);
            continue;
        }
        let data = match &asset.content {
            Content::Text(text) if text.starts_with("data:") => text.clone(),
            content => data_url(mime_type(&asset.source_path), content.as_bytes()),
        };
        inlined.insert(asset.source_path, data);
    }
    (table, inlined)
}

/// Programmatic pipeline construction.
pub struct PipelineBuilder {
    mode: BuildMode,
    root: PathBuf,
    context: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    public_path: String,
    entries: IndexMap<String, Vec<String>>,
    rules: Option<RuleSet>,
    pending_rules: Vec<Rule>,
    registry: PluginRegistry,
    optimization: OptimizationOptions,
    parallel: bool,
    exclude: Vec<String>,
}

impl PipelineBuilder {
    pub fn new(mode: BuildMode) -> Self {
        Self {
            mode,
            root: PathBuf::from("."),
            context: None,
            output_dir: None,
            public_path: "/".to_string(),
            entries: IndexMap::new(),
            rules: None,
            pending_rules: Vec::new(),
            registry: PluginRegistry::new(),
            optimization: OptimizationOptions::default(),
            parallel: false,
            exclude: Vec::new(),
        }
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Source directory; defaults to `<root>/src`.
    pub fn context(mut self, context: impl Into<PathBuf>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Output directory; defaults to `<root>/dist`.
    pub fn output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    pub fn public_path(mut self, public_path: impl Into<String>) -> Self {
        self.public_path = public_path.into();
        self
    }

    pub fn entry<I, S>(mut self, name: impl Into<String>, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sources = sources
            .into_iter()
            .map(|s| path::normalize(s.as_ref()))
            .collect();
        self.entries.insert(name.into(), sources);
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.pending_rules.push(rule);
        self
    }

    pub fn plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.registry.add(plugin);
        self
    }

    pub fn plugin_with_hooks(mut self, plugin: Arc<dyn Plugin>, hooks: HookUsage) -> Self {
        self.registry.add_with_hooks(plugin, hooks);
        self
    }

    pub fn optimization(mut self, optimization: OptimizationOptions) -> Self {
        self.optimization = optimization;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn exclude(mut self, fragments: impl IntoIterator<Item = String>) -> Self {
        self.exclude.extend(fragments);
        self
    }

    fn hook_context(&self) -> HookContext {
        HookContext {
            mode: self.mode,
            root: self.root.clone(),
            context: self
                .context
                .clone()
                .unwrap_or_else(|| self.root.join("src")),
            output_dir: self
                .output_dir
                .clone()
                .unwrap_or_else(|| self.root.join("dist")),
            public_path: self.public_path.clone(),
            entries: self.entries.keys().cloned().collect(),
        }
    }

    pub fn build(self) -> Result<Pipeline> {
        for name in self.entries.keys() {
            if !is_valid_entry_name(name) {
                return Err(ConfigurationError::InvalidEntryName {
                    entry: name.clone(),
                }
                .into());
            }
        }

        let ctx = self.hook_context();
        let naming = NamingResolver::new(
            self.mode,
            self.optimization.hash_length,
            self.public_path.clone(),
        )?;
        let rules = match self.rules {
            Some(rules) if self.pending_rules.is_empty() => rules,
            Some(rules) => {
                let mut all = rules.rules().to_vec();
                all.extend(self.pending_rules);
                RuleSet::new(all)?
            }
            None => RuleSet::new(self.pending_rules)?,
        };
        if !rules.has_catch_all() {
            debug!("no catch-all rule; unmatched sources will fail the build");
        }

        Ok(Pipeline {
            ctx,
            entries: self.entries,
            rules,
            plugins: self.registry,
            optimization: self.optimization,
            naming,
            parallel: self.parallel,
            exclude: self.exclude,
        })
    }
}
