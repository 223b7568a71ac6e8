//! The dev server: proxy routes in front, static assets behind.
//!
//! Every request is first checked against the installed route table; a
//! match is forwarded to the emulator, everything else is served from the
//! static assets directory.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use axum::Router;
use http::{header, StatusCode};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::config::DevConfig;
use crate::error::CliError;
use crate::proxy::{ProxyClient, RouteTable};
use crate::ui;

/// Shared state for request handling.
#[derive(Debug)]
pub struct AppState {
    /// Installed proxy routes
    pub routes: RouteTable,
    /// Client forwarding to the emulator
    pub proxy: ProxyClient,
    /// Static assets root
    pub static_dir: PathBuf,
}

/// The dev server itself.
#[derive(Debug)]
pub struct DevServer {
    config: DevConfig,
    state: Arc<AppState>,
}

impl DevServer {
    /// Create a dev server over an already-populated route table.
    pub fn new(config: DevConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Serve on the configuration's pre-bound listener until the task is
    /// aborted.
    pub async fn start(self) -> Result<(), CliError> {
        let router = build_router(self.state);
        let url = self.config.server_url();

        self.config.listener.set_nonblocking(true)?;
        let listener = TcpListener::from_std(self.config.listener)?;

        ui::success(&format!("Dev server running at {url}"));

        axum::serve(listener, router)
            .await
            .map_err(|e| CliError::Server(e.to_string()))
    }
}

/// Build the axum router. Routing is done by hand in the fallback handler
/// because installed routes mount as prefixes, which is not how axum's own
/// router matches.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(handle_request)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn handle_request(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let path = request.uri().path().to_owned();
    let method = request.method().clone();

    if let Some(route) = state.routes.match_route(&path, &method) {
        tracing::debug!(
            "{method} {path} -> emulator via {}",
            route.descriptor.route_path
        );
        return state.proxy.forward(request).await;
    }

    serve_static(&state.static_dir, &path).await
}

/// Serve a file from the static assets directory, or 404.
async fn serve_static(static_dir: &Path, request_path: &str) -> Response {
    let trimmed = request_path.trim_start_matches('/');
    let relative = if trimmed.is_empty() { "index.html" } else { trimmed };

    // Refuse anything that would escape the assets root.
    let candidate = Path::new(relative);
    if candidate
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }

    let file_path = static_dir.join(candidate);
    match tokio::fs::read(&file_path).await {
        Ok(contents) => {
            let content_type = content_type_for(&file_path);
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(contents))
                .unwrap()
        }
        Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js" | "mjs") => "application/javascript",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain; charset=utf-8",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn serves_index_html_for_root() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();

        let response = serve_static(dir.path(), "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn missing_file_is_404() {
        let dir = TempDir::new().unwrap();
        let response = serve_static(dir.path(), "/missing.css").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rejects_parent_traversal() {
        let dir = TempDir::new().unwrap();
        let secrets = dir.path().join("secret.txt");
        fs::write(&secrets, "s3cr3t").unwrap();
        let assets = dir.path().join("static");
        fs::create_dir(&assets).unwrap();

        let response = serve_static(&assets, "/../secret.txt").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn content_types_cover_common_assets() {
        assert_eq!(content_type_for(Path::new("a.js")), "application/javascript");
        assert_eq!(content_type_for(Path::new("a.css")), "text/css");
        assert_eq!(content_type_for(Path::new("a.bin")), "application/octet-stream");
    }
}
