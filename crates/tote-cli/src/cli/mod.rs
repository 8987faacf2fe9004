//! Command-line interface definition.
//!
//! - `tote build` - run the pipeline once and write the output directory
//! - `tote dev` - serve builds from memory and rebuild on change
//! - `tote check` - validate configuration and rule coverage without building

mod commands;
pub mod enums;

use clap::Parser;

pub use commands::{BuildArgs, CheckArgs, Command, DevArgs, ProjectArgs};
pub use enums::ModeArg;

/// Tote - an asset build pipeline
#[derive(Parser, Debug)]
#[command(
    name = "tote",
    version,
    about = "An asset build pipeline",
    long_about = "Tote runs every source file through the first matching rule's transform chain,\n\
                  groups the results per entry, optimizes and content-hashes them in production\n\
                  and hands the finished output to lifecycle plugins."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}
