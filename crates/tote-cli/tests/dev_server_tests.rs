//! Dev server responses over a real in-memory build.

use std::fs;

use axum::body::to_bytes;
use axum::http::{StatusCode, header};
use axum::response::Response;
use tempfile::TempDir;
use tote_cli::cli::ProjectArgs;
use tote_cli::dev::server::{RELOAD_SCRIPT_PATH, respond};
use tote_cli::dev::state::ServeOptions;
use tote_cli::dev::{BuildStatus, DevBuilder, DevServer, DevServerState};
use tote_config::ConfigOverrides;

const CONFIG: &str = r#"
public_path = "/static/"

[entries]
main = "index.js"

[[plugins]]
name = "html"
"#;

const TEMPLATE: &str = "<!DOCTYPE html>\n<html>\n<head><title>{{ title }}</title></head>\n<body>\n</body>\n</html>\n";

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("tote.toml"), CONFIG).unwrap();
    fs::write(dir.path().join("src/index.js"), "console.log('dev');\n").unwrap();
    fs::write(dir.path().join("src/index.html"), TEMPLATE).unwrap();
    dir
}

fn builder(dir: &TempDir) -> DevBuilder {
    let args = ProjectArgs {
        cwd: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    DevBuilder::new(args, ConfigOverrides::default()).unwrap()
}

async fn body(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn content_type(response: &Response) -> &str {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn serves_the_build_from_memory() {
    let dir = project();
    let builder = builder(&dir);
    let state = DevServerState::new(builder.serve_options());

    let (duration_ms, output) = builder.build().await.unwrap();
    let changed = state.complete_build(duration_ms, output);
    assert_eq!(changed, ["main.js", "index.html"]);

    let response = respond(&state, "/static/main.js");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "text/javascript; charset=utf-8");
    assert_eq!(body(response).await, "console.log('dev');\n");

    let page = body(respond(&state, "/")).await;
    assert!(page.contains(r#"src="/static/main.js""#));
    let script = page.find(RELOAD_SCRIPT_PATH).unwrap();
    assert!(script < page.find("</body>").unwrap());

    assert!(!dir.path().join("dist").exists());
}

#[tokio::test]
async fn history_fallback_and_missing_files() {
    let dir = project();
    let builder = builder(&dir);
    let state = DevServerState::new(builder.serve_options());
    let (duration_ms, output) = builder.build().await.unwrap();
    state.complete_build(duration_ms, output);

    let response = respond(&state, "/static/account/settings");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(content_type(&response).starts_with("text/html"));

    let response = respond(&state, "/static/missing.png");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn failed_build_shows_overlay_for_pages_only() {
    let dir = project();
    let builder = builder(&dir);
    let state = DevServerState::new(builder.serve_options());
    let (duration_ms, output) = builder.build().await.unwrap();
    state.complete_build(duration_ms, output);

    fs::write(dir.path().join("src/index.js"), "function (\n").unwrap();
    let err = builder.build().await.unwrap_err();
    state.fail_build(err.to_string());
    assert!(matches!(state.status(), BuildStatus::Failed { .. }));

    let page = respond(&state, "/");
    assert_eq!(page.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let page = body(page).await;
    assert!(page.contains("Build Error"));
    assert!(page.contains("index.js"));

    let script = respond(&state, "/static/main.js");
    assert_eq!(script.status(), StatusCode::OK);
    assert_eq!(body(script).await, "console.log('dev');\n");
}

#[tokio::test]
async fn binds_an_ephemeral_port() {
    let state = std::sync::Arc::new(DevServerState::default());
    let server = DevServer::bind("127.0.0.1", 0, state).await.unwrap();
    let url = server.url().unwrap();
    assert!(url.starts_with("http://127.0.0.1:"));
    assert_ne!(server.local_addr().unwrap().port(), 0);
}

async fn fetch_headers(compress: bool) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let dir = project();
    let source: String = (0..50).map(|i| format!("console.log('line {i}');\n")).collect();
    fs::write(dir.path().join("src/index.js"), source).unwrap();
    let builder = builder(&dir);
    let state = std::sync::Arc::new(DevServerState::new(ServeOptions {
        compress,
        ..builder.serve_options()
    }));
    let (duration_ms, output) = builder.build().await.unwrap();
    state.complete_build(duration_ms, output);

    let server = DevServer::bind("127.0.0.1", 0, state).await.unwrap();
    let addr = server.local_addr().unwrap();
    let handle = tokio::spawn(server.run());

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(
            b"GET /static/main.js HTTP/1.1\r\nHost: localhost\r\nAccept-Encoding: gzip\r\nConnection: close\r\n\r\n",
        )
        .await
        .unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    handle.abort();

    let end = raw.windows(4).position(|w| w == b"\r\n\r\n").unwrap();
    String::from_utf8_lossy(&raw[..end]).to_ascii_lowercase()
}

#[tokio::test]
async fn gzips_responses_when_compression_is_on() {
    let headers = fetch_headers(true).await;
    assert!(headers.starts_with("http/1.1 200"), "{headers}");
    assert!(headers.contains("content-encoding: gzip"), "{headers}");
}

#[tokio::test]
async fn sends_identity_responses_when_compression_is_off() {
    let headers = fetch_headers(false).await;
    assert!(headers.starts_with("http/1.1 200"), "{headers}");
    assert!(!headers.contains("content-encoding"), "{headers}");
}
