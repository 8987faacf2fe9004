//! Development server with live reload over Server-Sent Events.
//!
//! Every non-internal request is answered from the last successful build in
//! memory. HTML responses get the reload client injected when `dev.hot` is on.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{StatusCode, Uri, header},
    response::{
        IntoResponse, Response, Sse,
        sse::{Event, KeepAlive},
    },
    routing::get,
};
use tokio::net::TcpListener;
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};
use tote_bundler::builtins::transforms::mime_type;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tracing::debug;

use crate::dev::{DevServerState, SharedState, error_overlay};
use crate::error::{CliError, Result};

pub const EVENTS_PATH: &str = "/__tote/events";
pub const RELOAD_SCRIPT_PATH: &str = "/__tote/reload.js";

const RELOAD_SCRIPT: &str = include_str!("../../assets/dev/reload-client.js");

/// A bound development server.
pub struct DevServer {
    listener: TcpListener,
    state: SharedState,
}

impl DevServer {
    /// Bind `host:port`. Port 0 picks a free port.
    pub async fn bind(host: &str, port: u16, state: SharedState) -> Result<Self> {
        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|e| CliError::Server(format!("failed to bind to {host}:{port}: {e}")))?;
        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// URL browsers should open.
    pub fn url(&self) -> Result<String> {
        Ok(format!("http://{}", self.local_addr()?))
    }

    /// Serve until the task is dropped or the listener fails.
    pub async fn run(self) -> Result<()> {
        axum::serve(self.listener, router(self.state))
            .await
            .map_err(|e| CliError::Server(e.to_string()))
    }
}

/// Routes: the event stream, the reload client, and the build output for
/// everything else. With `compress` on, responses are gzipped for clients
/// that accept it; the event stream is never compressed.
pub fn router(state: SharedState) -> Router {
    let router = Router::new()
        .route(EVENTS_PATH, get(handle_events))
        .route(RELOAD_SCRIPT_PATH, get(handle_reload_script))
        .fallback(handle_request)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    let router = if state.options().compress {
        router.layer(CompressionLayer::new())
    } else {
        router
    };
    router.with_state(state)
}

async fn handle_events(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (id, rx) = state.register_client();
    debug!(client = id, "client connected");

    let stream = ReceiverStream::new(rx).map(|data| Ok(Event::default().data(data)));
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

async fn handle_reload_script() -> Response {
    file_response(StatusCode::OK, "text/javascript; charset=utf-8", RELOAD_SCRIPT)
}

async fn handle_request(State(state): State<SharedState>, uri: Uri) -> Response {
    respond(&state, uri.path())
}

/// Answer a request for `path` from the current build.
///
/// While the last build failed, page requests get the error overlay and
/// asset requests keep receiving the last good output.
pub fn respond(state: &DevServerState, path: &str) -> Response {
    let status = state.status();
    if let Some(error) = status.error().filter(|_| is_page_request(path)) {
        return file_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "text/html; charset=utf-8",
            error_overlay::render(error),
        );
    }

    let Some(file) = state.resolve(path) else {
        return file_response(
            StatusCode::NOT_FOUND,
            "text/plain; charset=utf-8",
            format!("Not found: {path}"),
        );
    };

    let content_type = content_type(&file.path);
    let bytes = file.content.into_bytes();
    if state.options().hot && content_type.starts_with("text/html") {
        let html = inject_reload_script(&String::from_utf8_lossy(&bytes));
        return file_response(StatusCode::OK, &content_type, html);
    }
    file_response(StatusCode::OK, &content_type, bytes)
}

fn file_response(status: StatusCode, content_type: &str, body: impl Into<Body>) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        body.into(),
    )
        .into_response()
}

fn is_page_request(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or(path);
    !last.contains('.') || last.ends_with(".html")
}

fn content_type(path: &str) -> String {
    let mime = mime_type(path);
    if mime.starts_with("text/") || mime == "application/json" || mime == "application/xml" {
        format!("{mime}; charset=utf-8")
    } else {
        mime.to_string()
    }
}

/// Insert the reload client before the last `</body>`, or append it.
pub fn inject_reload_script(html: &str) -> String {
    let tag = format!(r#"<script src="{RELOAD_SCRIPT_PATH}"></script>"#);
    match html.rfind("</body>") {
        Some(pos) => {
            let mut out = String::with_capacity(html.len() + tag.len() + 1);
            out.push_str(&html[..pos]);
            out.push_str(&tag);
            out.push('\n');
            out.push_str(&html[pos..]);
            out
        }
        None => format!("{html}\n{tag}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injects_before_closing_body() {
        let html = inject_reload_script("<html><body><h1>hi</h1></body></html>");
        let script = html.find(RELOAD_SCRIPT_PATH).unwrap();
        assert!(script < html.find("</body>").unwrap());
    }

    #[test]
    fn appends_without_body() {
        let html = inject_reload_script("<h1>hi</h1>");
        assert!(html.ends_with(r#"<script src="/__tote/reload.js"></script>"#));
    }

    #[test]
    fn text_types_carry_charset() {
        assert_eq!(content_type("main.js"), "text/javascript; charset=utf-8");
        assert_eq!(content_type("logo.png"), "image/png");
        assert_eq!(content_type("manifest.json"), "application/json; charset=utf-8");
    }

    #[test]
    fn page_requests() {
        assert!(is_page_request("/"));
        assert!(is_page_request("/settings/profile"));
        assert!(is_page_request("/index.html"));
        assert!(!is_page_request("/main.js"));
    }
}
