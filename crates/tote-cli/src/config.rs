//! Project resolution: turns command-line flags into a loaded [`ToteConfig`].

use std::path::{Path, PathBuf};

use tote_config::{ConfigOverrides, ToteConfig};

use crate::cli::ProjectArgs;
use crate::error::{CliError, Result};

/// A loaded project: its root directory and effective configuration.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: ToteConfig,
    /// The config file that was read, if any.
    pub config_file: Option<PathBuf>,
}

/// Resolve `--cwd` against the process working directory.
pub fn resolve_root(cwd: Option<&Path>) -> Result<PathBuf> {
    let current = std::env::current_dir()?;
    let root = match cwd {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => current.join(path),
        None => current,
    };
    if !root.is_dir() {
        return Err(CliError::FileNotFound(root));
    }
    Ok(root)
}

/// Load the project described by `args`, layering `overrides` on top of
/// the config file and environment.
pub fn load_project(args: &ProjectArgs, mut overrides: ConfigOverrides) -> Result<Project> {
    let root = resolve_root(args.cwd.as_deref())?;

    if let Some(path) = &args.config {
        let file = root.join(path);
        if !file.is_file() {
            return Err(CliError::FileNotFound(file));
        }
    }

    if overrides.mode.is_none() {
        overrides.mode = args.mode.map(Into::into);
    }

    let config = tote_config::load(&root, args.config.as_deref(), &overrides)?;
    if let Some(level) = &config.settings.log_level {
        crate::logger::apply_config_level(level);
    }
    let config_file = match &args.config {
        Some(path) => Some(root.join(path)),
        None => tote_config::ConfigDiscovery::new(&root).find(),
    };

    tracing::debug!(
        root = %root.display(),
        mode = %config.mode,
        config_file = ?config_file,
        "project loaded"
    );

    Ok(Project {
        root,
        config,
        config_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ModeArg;
    use tote_config::BuildMode;

    #[test]
    fn missing_cwd_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = resolve_root(Some(&missing)).unwrap_err();
        assert!(matches!(err, CliError::FileNotFound(path) if path == missing));
    }

    #[test]
    fn mode_flag_reaches_the_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("tote.toml"),
            "mode = \"development\"\n\n[entries]\nmain = \"index.js\"\n",
        )
        .unwrap();

        let args = ProjectArgs {
            cwd: Some(dir.path().to_path_buf()),
            config: None,
            mode: Some(ModeArg::Production),
        };
        let project = load_project(&args, ConfigOverrides::default()).unwrap();
        assert_eq!(project.config.mode, BuildMode::Production);
        assert_eq!(project.config_file, Some(dir.path().join("tote.toml")));
        assert!(project.config.entries.contains_key("main"));
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let args = ProjectArgs {
            cwd: Some(dir.path().to_path_buf()),
            config: Some("custom.toml".into()),
            mode: None,
        };
        let err = load_project(&args, ConfigOverrides::default()).unwrap_err();
        assert!(matches!(err, CliError::FileNotFound(_)));
    }
}
