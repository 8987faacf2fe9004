use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::cli::enums::ModeArg;

/// Available tote subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the project into the output directory
    ///
    /// Runs every source under the context directory through its rule's
    /// transform chain, then writes emitted assets and plugin-derived files.
    Build(BuildArgs),

    /// Start the development server
    ///
    /// Builds in memory, serves the result and rebuilds whenever a source
    /// changes. Connected pages reload after each successful rebuild.
    Dev(DevArgs),

    /// Validate configuration and rule coverage
    ///
    /// Loads `tote.toml`, checks entries and reports every source no rule
    /// matches, without running any transform.
    Check(CheckArgs),
}

/// Options shared by every command that loads a project
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Project root; defaults to the current directory
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Configuration file, relative to the project root
    ///
    /// Replaces discovery of `tote.toml` and the `tote` field of
    /// `package.json`.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Build mode; overrides `TOTE_MODE`, `NODE_ENV` and the config file
    #[arg(short, long, value_enum, value_name = "MODE")]
    pub mode: Option<ModeArg>,
}

/// Arguments for the build command
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Output directory, relative to the project root
    #[arg(short = 'd', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Public URL prefix for emitted assets
    #[arg(long, value_name = "URL")]
    pub public_path: Option<String>,

    /// Keep existing files in the output directory
    ///
    /// Disables the `clean` plugin for this build.
    #[arg(long)]
    pub no_clean: bool,
}

/// Arguments for the dev command
#[derive(Args, Debug, Clone, Default)]
pub struct DevArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Interface to bind
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Do not open a browser once the server is listening
    #[arg(long)]
    pub no_open: bool,
}

/// Arguments for the check command
#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}
