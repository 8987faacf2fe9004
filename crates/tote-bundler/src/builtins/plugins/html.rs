//! Entry document generation.
//!
//! The template is rendered with minijinja. Unless it places `{{ styles }}`
//! or `{{ scripts }}` itself, the tags are injected before `</head>`.

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::Context;
use indexmap::IndexSet;
use minijinja::{Environment, Value as TemplateValue, context};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tote_config::{AssetKind, HookName};
use tracing::debug;

use super::parse_options;
use crate::builtins::transforms::collapse_whitespace;
use crate::manifest::OutputManifest;
use crate::output::DerivedFiles;
use crate::plugins::{HookContext, HookUsage, Plugin};

const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{ title }}</title>
</head>
<body>
</body>
</html>
"#;

static PLACES_STYLES: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{\{-?\s*styles\b").ok());
static PLACES_SCRIPTS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{\{-?\s*scripts\b").ok());

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HtmlOptions {
    /// Template path relative to the source directory.
    pub template: String,
    /// Output path of the rendered document.
    pub filename: String,
    pub title: String,
    /// Entries whose chunks are referenced; all entries when unset.
    pub chunks: Option<Vec<String>>,
    /// Collapse whitespace; defaults to on in production.
    pub minify: Option<bool>,
    pub inject: bool,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            template: "index.html".to_string(),
            filename: "index.html".to_string(),
            title: "tote".to_string(),
            chunks: None,
            minify: None,
            inject: true,
        }
    }
}

/// Renders the entry document referencing every emitted script and
/// stylesheet of the selected entries.
#[derive(Debug, Clone)]
pub struct HtmlPlugin {
    options: HtmlOptions,
    template_path: PathBuf,
}

impl HtmlPlugin {
    pub fn new(options: HtmlOptions, ctx: &HookContext) -> Self {
        let template_path = ctx.context.join(&options.template);
        Self {
            options,
            template_path,
        }
    }

    pub fn from_options(options: &Value, ctx: &HookContext) -> Result<Self, String> {
        let options: HtmlOptions = parse_options(options)?;
        if options.filename.trim().is_empty() {
            return Err("`filename` must not be empty".to_string());
        }
        if let Some(unknown) = options
            .chunks
            .iter()
            .flatten()
            .find(|chunk| !ctx.entries.contains(chunk))
        {
            return Err(format!("`chunks` names unknown entry `{unknown}`"));
        }
        Ok(Self::new(options, ctx))
    }

    fn template(&self) -> anyhow::Result<Cow<'static, str>> {
        if !self.template_path.is_file() {
            debug!(path = %self.template_path.display(), "template missing; using default");
            return Ok(Cow::Borrowed(DEFAULT_TEMPLATE));
        }
        std::fs::read_to_string(&self.template_path)
            .map(Cow::Owned)
            .with_context(|| format!("reading {}", self.template_path.display()))
    }

    /// Urls of `kind` for the selected entries, deduplicated, in emit order.
    fn urls<'m>(
        &self,
        ctx: &HookContext,
        manifest: &'m OutputManifest,
        kind: AssetKind,
    ) -> IndexSet<&'m str> {
        let entries = self.options.chunks.as_ref().unwrap_or(&ctx.entries);
        entries
            .iter()
            .flat_map(|entry| manifest.entry_files(entry, kind))
            .map(|(_, file)| file.url.as_str())
            .collect()
    }

    pub fn render(&self, ctx: &HookContext, manifest: &OutputManifest) -> anyhow::Result<String> {
        let template = self.template()?;
        let styles: String = self
            .urls(ctx, manifest, AssetKind::Style)
            .into_iter()
            .map(|url| format!("<link href=\"{url}\" rel=\"stylesheet\">"))
            .collect();
        let scripts: String = self
            .urls(ctx, manifest, AssetKind::Script)
            .into_iter()
            .map(|url| format!("<script defer src=\"{url}\"></script>"))
            .collect();

        let env = Environment::new();
        let mut html = env
            .render_str(
                &template,
                context! {
                    title => &self.options.title,
                    styles => TemplateValue::from_safe_string(styles.clone()),
                    scripts => TemplateValue::from_safe_string(scripts.clone()),
                    mode => ctx.mode.as_str(),
                    public_path => &ctx.public_path,
                },
            )
            .with_context(|| format!("rendering {}", self.options.template))?;

        if self.options.inject {
            let mut tags = String::new();
            if !places(&PLACES_STYLES, &template) {
                tags.push_str(&styles);
            }
            if !places(&PLACES_SCRIPTS, &template) {
                tags.push_str(&scripts);
            }
            inject(&mut html, &tags);
        }

        if self.options.minify.unwrap_or(ctx.mode.is_production()) {
            html = collapse_whitespace(&html);
        }
        Ok(html)
    }
}

fn places(pattern: &LazyLock<Option<Regex>>, template: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(template))
}

/// Insert `tags` before `</head>`, else before `<body`, else at the end.
fn inject(html: &mut String, tags: &str) {
    if tags.is_empty() {
        return;
    }
    let lower = html.to_ascii_lowercase();
    let at = lower
        .find("</head>")
        .or_else(|| lower.find("<body"))
        .unwrap_or(html.len());
    html.insert_str(at, tags);
}

impl Plugin for HtmlPlugin {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("html")
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::empty().with(HookName::OnDone)
    }

    fn reserved_sources(&self) -> Vec<PathBuf> {
        vec![self.template_path.clone()]
    }

    fn on_done(
        &self,
        ctx: &HookContext,
        manifest: &OutputManifest,
        derived: &mut DerivedFiles,
    ) -> anyhow::Result<()> {
        let html = self.render(ctx, manifest)?;
        derived.insert(&self.options.filename, html)?;
        Ok(())
    }
}
