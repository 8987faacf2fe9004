//! Build command implementation.
//!
//! `tote build` runs the pipeline once over the sources under the context
//! directory and writes every emitted asset and derived file to the output
//! directory.

use std::time::Instant;

use tote_bundler::{FsDiscovery, Pipeline};
use tote_config::ConfigOverrides;

use crate::cli::BuildArgs;
use crate::commands::disable_plugin;
use crate::config::load_project;
use crate::error::Result;
use crate::ui;

/// Execute the build command.
///
/// 1. Load configuration (CLI > env > file > defaults)
/// 2. Build the immutable pipeline
/// 3. Snapshot the sources and run one build
/// 4. Write the output and print a summary
///
/// Nothing is written when any stage fails.
pub async fn execute(args: BuildArgs) -> Result<()> {
    let start = Instant::now();

    let overrides = ConfigOverrides {
        output_root: args.out_dir.clone(),
        public_path: args.public_path.clone(),
        ..Default::default()
    };
    let mut project = load_project(&args.project, overrides)?;
    if args.no_clean && disable_plugin(&mut project.config, "clean") > 0 {
        tracing::debug!("clean plugin disabled by --no-clean");
    }

    let pipeline = Pipeline::from_config(&project.config, &project.root)?;
    ui::info(&format!(
        "Building in {} mode into {}",
        pipeline.mode(),
        pipeline.output_dir().display()
    ));

    let sources = pipeline.load_sources(&FsDiscovery::new())?;
    let output = pipeline.build(&sources)?;
    let written = output.write_to(pipeline.output_dir(), true)?;

    ui::print_build_summary(&output);
    ui::success(&format!(
        "Wrote {written} file(s) from {} source(s) in {}",
        sources.len(),
        ui::format_duration(start.elapsed())
    ));

    Ok(())
}
