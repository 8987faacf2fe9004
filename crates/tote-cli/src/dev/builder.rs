//! In-memory builds for the development server.
//!
//! The builder owns the current pipeline. Builds run on the blocking pool
//! and never touch the output directory; the `clean` plugin is disabled for
//! the same reason. A change to the config file rebuilds the pipeline
//! before the next build.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tote_bundler::{BuildOutput, FsDiscovery, Pipeline};
use tote_config::ConfigOverrides;
use tracing::{debug, info};

use crate::cli::ProjectArgs;
use crate::commands::disable_plugin;
use crate::config::{Project, load_project};
use crate::dev::state::ServeOptions;
use crate::dev::watcher::{FileChange, IgnoreRules};
use crate::error::{CliError, Result};

/// Development builder wrapping an immutable [`Pipeline`].
pub struct DevBuilder {
    args: ProjectArgs,
    overrides: ConfigOverrides,
    project: Project,
    pipeline: Arc<Pipeline>,
}

impl DevBuilder {
    /// Load the project and construct its pipeline.
    pub fn new(args: ProjectArgs, overrides: ConfigOverrides) -> Result<Self> {
        let (project, pipeline) = Self::load(&args, &overrides)?;
        Ok(Self {
            args,
            overrides,
            project,
            pipeline: Arc::new(pipeline),
        })
    }

    fn load(args: &ProjectArgs, overrides: &ConfigOverrides) -> Result<(Project, Pipeline)> {
        let mut project = load_project(args, overrides.clone())?;
        disable_plugin(&mut project.config, "clean");
        let pipeline = Pipeline::from_config(&project.config, &project.root)?;
        Ok((project, pipeline))
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// How the server maps requests onto this project's output.
    pub fn serve_options(&self) -> ServeOptions {
        let config = &self.project.config;
        let index = config
            .plugins
            .iter()
            .find(|p| p.enabled && p.name == "html")
            .and_then(|p| p.options.get("filename"))
            .and_then(|v| v.as_str())
            .unwrap_or("index.html")
            .to_string();

        ServeOptions {
            public_path: config.public_path.clone(),
            index,
            history_api_fallback: config.dev.history_api_fallback,
            hot: config.dev.hot,
            compress: config.dev.compress,
        }
    }

    /// Paths the watcher skips: the output directory, hidden paths and
    /// `dev.watch_ignore`.
    pub fn ignore_rules(&self) -> IgnoreRules {
        IgnoreRules::new(
            self.project.root.clone(),
            self.pipeline.output_dir().to_path_buf(),
            self.project.config.dev.watch_ignore.clone(),
        )
    }

    /// Whether any change touches the loaded config file.
    pub fn touches_config(&self, changes: &[FileChange]) -> bool {
        let Some(config_file) = &self.project.config_file else {
            return changes.iter().any(|c| is_config_name(&self.project.root, c.path()));
        };
        changes.iter().any(|c| c.path() == config_file)
    }

    /// Reload configuration and rebuild the pipeline. On failure the
    /// previous pipeline stays in use.
    pub fn reload(&mut self) -> Result<()> {
        let (project, pipeline) = Self::load(&self.args, &self.overrides)?;
        info!(mode = %project.config.mode, "configuration reloaded");
        self.project = project;
        self.pipeline = Arc::new(pipeline);
        Ok(())
    }

    /// Snapshot the sources and build in memory. Returns the duration in
    /// milliseconds with the output.
    pub async fn build(&self) -> Result<(u64, BuildOutput)> {
        let pipeline = Arc::clone(&self.pipeline);
        tokio::task::spawn_blocking(move || -> Result<(u64, BuildOutput)> {
            let start = Instant::now();
            let sources = pipeline.load_sources(&FsDiscovery::new())?;
            let output = pipeline.build(&sources)?;
            let duration_ms = start.elapsed().as_millis() as u64;
            debug!(sources = sources.len(), files = output.len(), duration_ms, "dev build");
            Ok((duration_ms, output))
        })
        .await
        .map_err(|e| CliError::Server(format!("build task failed: {e}")))?
    }
}

/// A config file that appears where discovery would look for one.
fn is_config_name(root: &Path, path: &Path) -> bool {
    path.parent() == Some(root)
        && path
            .file_name()
            .is_some_and(|name| name == tote_config::discovery::CONFIG_FILE_NAME || name == "package.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn project(toml: Option<&str>) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/index.js"), "console.log(1);\n").unwrap();
        if let Some(toml) = toml {
            fs::write(dir.path().join("tote.toml"), toml).unwrap();
        }
        dir
    }

    fn args(dir: &tempfile::TempDir) -> ProjectArgs {
        ProjectArgs {
            cwd: Some(dir.path().to_path_buf()),
            ..Default::default()
        }
    }

    const CONFIG: &str = r#"
[entries]
main = "index.js"

[[plugins]]
name = "clean"

[[plugins]]
name = "html"
options = { filename = "app.html" }
"#;

    #[test]
    fn clean_is_disabled_and_index_follows_html_filename() {
        let dir = project(Some(CONFIG));
        let builder = DevBuilder::new(args(&dir), ConfigOverrides::default()).unwrap();

        let names: Vec<_> = builder
            .pipeline()
            .plugins()
            .registrations()
            .iter()
            .map(|reg| reg.plugin.name().to_string())
            .collect();
        assert_eq!(names, ["html"]);
        assert_eq!(builder.serve_options().index, "app.html");
    }

    #[test]
    fn config_changes_are_detected() {
        let dir = project(Some(CONFIG));
        let builder = DevBuilder::new(args(&dir), ConfigOverrides::default()).unwrap();
        let root = dir.path().to_path_buf();

        assert!(builder.touches_config(&[FileChange::Modified(root.join("tote.toml"))]));
        assert!(!builder.touches_config(&[FileChange::Modified(root.join("src/index.js"))]));
    }

    #[test]
    fn config_creation_is_detected_without_a_file() {
        let dir = project(None);
        let builder = DevBuilder::new(args(&dir), ConfigOverrides::default()).unwrap();
        let root = dir.path().to_path_buf();

        assert!(builder.touches_config(&[FileChange::Created(root.join("tote.toml"))]));
        assert!(!builder.touches_config(&[FileChange::Created(root.join("src/tote.toml"))]));
    }

    #[tokio::test]
    async fn builds_in_memory_without_writing() {
        let dir = project(Some("plugins = []\n\n[entries]\nmain = \"index.js\"\n"));
        let builder = DevBuilder::new(args(&dir), ConfigOverrides::default()).unwrap();

        let (_, output) = builder.build().await.unwrap();
        assert_eq!(
            output.get("main.js").and_then(|c| c.as_text()),
            Some("console.log(1);\n")
        );
        assert!(!dir.path().join("dist").exists());
    }

    #[tokio::test]
    async fn reload_picks_up_new_entries() {
        let dir = project(Some("plugins = []\n\n[entries]\nmain = \"index.js\"\n"));
        let mut builder = DevBuilder::new(args(&dir), ConfigOverrides::default()).unwrap();

        fs::write(dir.path().join("src/other.js"), "other();\n").unwrap();
        fs::write(
            dir.path().join("tote.toml"),
            "plugins = []\n\n[entries]\nmain = \"index.js\"\nother = \"other.js\"\n",
        )
        .unwrap();
        builder.reload().unwrap();

        let (_, output) = builder.build().await.unwrap();
        assert!(output.get("other.js").is_some());
    }
}
