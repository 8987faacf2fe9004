//! Development server command implementation.
//!
//! - Initial in-memory build
//! - File watching with debounced, coalesced rebuilds
//! - HTTP server with SSE live reload
//! - Graceful shutdown on Ctrl+C

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::sync::mpsc;
use tote_config::ConfigOverrides;

use crate::cli::DevArgs;
use crate::dev::{DevBuilder, DevEvent, DevServer, DevServerState, FileChange, FileWatcher};
use crate::error::{CliError, Result};
use crate::ui;

/// Execute the dev command.
///
/// 1. Load configuration and build the pipeline
/// 2. Bind the server and run the initial build
/// 3. Watch the project root
/// 4. Rebuild on change and broadcast the result until Ctrl+C
///
/// A failing build keeps the server up: pages show the error overlay until
/// the next successful build.
pub async fn execute(args: DevArgs) -> Result<()> {
    ui::info("Starting development server...");

    let overrides = ConfigOverrides {
        host: args.host.clone(),
        port: args.port,
        open: args.no_open.then_some(false),
        ..Default::default()
    };
    let mut builder = DevBuilder::new(args.project.clone(), overrides)?;
    let dev = builder.project().config.dev.clone();

    let state = Arc::new(DevServerState::new(builder.serve_options()));
    let server = DevServer::bind(&dev.host, dev.port, Arc::clone(&state)).await?;
    let url = server.url()?;

    rebuild(&builder, &state).await;

    let (watcher, mut changes) = FileWatcher::new(builder.ignore_rules())?;
    ui::info(&format!("Watching {}", watcher.root().display()));

    let mut server_handle = tokio::spawn(server.run());
    ui::success(&format!("Development server running at {url}"));
    if dev.open {
        open_browser(&url);
    }
    ui::info("Press Ctrl+C to stop");

    let debounce = Duration::from_millis(dev.debounce_ms);
    loop {
        tokio::select! {
            Some(first) = changes.recv() => {
                let batch = collect_batch(first, &mut changes, debounce).await;
                if builder.touches_config(&batch) {
                    match builder.reload() {
                        Ok(()) => ui::info("Configuration changed; pipeline reloaded"),
                        Err(e) => {
                            report_failure(&state, describe(&e)).await;
                            continue;
                        }
                    }
                }
                rebuild(&builder, &state).await;
            }

            _ = signal::ctrl_c() => {
                ui::info("Shutting down development server...");
                break;
            }

            result = &mut server_handle => {
                return match result {
                    Ok(Ok(())) => Err(CliError::Server("server stopped unexpectedly".into())),
                    Ok(Err(e)) => Err(e),
                    Err(e) => Err(CliError::Server(e.to_string())),
                };
            }
        }
    }

    server_handle.abort();
    drop(watcher);
    ui::success("Development server stopped");
    Ok(())
}

/// Gather every change that arrives within `window` of the previous one.
async fn collect_batch(
    first: FileChange,
    changes: &mut mpsc::Receiver<FileChange>,
    window: Duration,
) -> Vec<FileChange> {
    let mut batch = vec![first];
    while let Ok(Some(next)) = tokio::time::timeout(window, changes.recv()).await {
        if !batch.contains(&next) {
            batch.push(next);
        }
    }
    for change in &batch {
        tracing::debug!(path = %change.path().display(), "changed");
    }
    batch
}

async fn rebuild(builder: &DevBuilder, state: &DevServerState) {
    state.start_build();
    state.broadcast(&DevEvent::BuildStarted).await;

    match builder.build().await {
        Ok((duration_ms, output)) => {
            let changed = state.complete_build(duration_ms, output);
            ui::success(&format!(
                "Built in {} ({} file(s) changed)",
                ui::format_duration(Duration::from_millis(duration_ms)),
                changed.len()
            ));
            state
                .broadcast(&DevEvent::BuildCompleted {
                    duration_ms,
                    changed,
                })
                .await;
        }
        Err(e) => report_failure(state, describe(&e)).await,
    }
}

async fn report_failure(state: &DevServerState, error: String) {
    ui::error(&format!("Build failed: {error}"));
    state.fail_build(error.clone());
    state.broadcast(&DevEvent::BuildFailed { error }).await;
}

/// Full cause chain for pipeline errors.
fn describe(err: &CliError) -> String {
    match err {
        CliError::Build(err) => err.report(),
        other => other.to_string(),
    }
}

/// Open `url` with the platform's default handler.
fn open_browser(url: &str) {
    use std::process::Command;

    let result = if cfg!(target_os = "macos") {
        Command::new("open").arg(url).spawn()
    } else if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", "start", url]).spawn()
    } else {
        Command::new("xdg-open").arg(url).spawn()
    };

    if let Err(e) = result {
        ui::warning(&format!("Failed to open browser: {e}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn batches_coalesce_duplicates() {
        let (tx, mut rx) = mpsc::channel(8);
        let a = FileChange::Modified(PathBuf::from("/p/src/a.js"));
        let b = FileChange::Modified(PathBuf::from("/p/src/b.js"));
        tx.send(a.clone()).await.unwrap();
        tx.send(b.clone()).await.unwrap();
        tx.send(a.clone()).await.unwrap();
        drop(tx);

        let first = rx.recv().await.unwrap();
        let batch = collect_batch(first, &mut rx, Duration::from_millis(20)).await;
        assert_eq!(batch, [a, b]);
    }

    #[test]
    fn pipeline_errors_are_described_with_causes() {
        let err = CliError::from(tote_bundler::Error::Transform(tote_bundler::TransformError {
            path: "index.js".into(),
            transform: "script".into(),
            source: std::io::Error::other("Unexpected token").into(),
        }));
        assert_eq!(
            describe(&err),
            "transform `script` failed on `index.js`: Unexpected token"
        );
    }
}
