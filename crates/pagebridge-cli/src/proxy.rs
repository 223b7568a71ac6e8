//! Proxy installation: the installed-route table and request forwarding.
//!
//! Routes are installed by appending; nothing is ever removed during a
//! dev-server session. For each incoming request the table picks the
//! matching route (if any), and the proxy client forwards the request to
//! the emulator's bound address, preserving the original path, query
//! string, method, headers, and body.

use axum::body::Body;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use http::{header, Method, StatusCode};
use pagebridge_core::{RouteDescriptor, RoutePattern};

/// A route descriptor bound to its parsed pattern.
#[derive(Debug, Clone)]
pub struct InstalledRoute {
    /// The synthesized route
    pub descriptor: RouteDescriptor,
    pattern: RoutePattern,
}

/// The host server's table of installed proxy routes.
///
/// Appended to during bootstrap, read-only while serving.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<InstalledRoute>,
}

impl RouteTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a synthesized route at the end of the table.
    pub fn install(&mut self, descriptor: RouteDescriptor) {
        let pattern = RoutePattern::parse(&descriptor.route_path);
        self.routes.push(InstalledRoute { descriptor, pattern });
    }

    /// Number of installed routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no routes are installed.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterate over installed routes in installation order.
    pub fn iter(&self) -> impl Iterator<Item = &InstalledRoute> {
        self.routes.iter()
    }

    /// Pick the installed route for a request, or `None` when the request
    /// should fall through to the static-file fallback.
    ///
    /// A route is a candidate when its pattern matches the path and it
    /// allows the method. Overlapping candidates are tie-broken
    /// deterministically: most literal matched segments wins, ties go to
    /// installation order.
    pub fn match_route(&self, path: &str, method: &Method) -> Option<&InstalledRoute> {
        let mut best: Option<(usize, &InstalledRoute)> = None;
        for route in &self.routes {
            if !route.descriptor.allows(method) {
                continue;
            }
            if let Some(score) = route.pattern.match_score(path) {
                match best {
                    Some((best_score, _)) if best_score >= score => {}
                    _ => best = Some((score, route)),
                }
            }
        }
        best.map(|(_, route)| route)
    }
}

/// Forwards requests to the emulator's bound address.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: reqwest::Client,
    target: String,
}

impl ProxyClient {
    /// Create a client forwarding to `target` (e.g. `http://127.0.0.1:45833`).
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            target: target.into(),
        }
    }

    /// Forward a request and stream the emulator's response back.
    ///
    /// A network failure reaching the emulator surfaces to the requester
    /// as `502 Bad Gateway`; it is never fatal to the dev server.
    pub async fn forward(&self, request: Request) -> Response {
        let path = request.uri().path().to_owned();
        match self.try_forward(request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!("proxy error for {path}: {err:#}");
                (
                    StatusCode::BAD_GATEWAY,
                    format!("Failed to reach the functions emulator: {err}"),
                )
                    .into_response()
            }
        }
    }

    async fn try_forward(&self, request: Request) -> Result<Response, anyhow::Error> {
        let path_and_query = request
            .uri()
            .path_and_query()
            .map_or_else(|| request.uri().path().to_owned(), |pq| pq.as_str().to_owned());
        let url = format!("{}{}", self.target, path_and_query);

        let (parts, body) = request.into_parts();

        // The emulator expects its own authority; everything else is
        // forwarded untouched.
        let mut headers = parts.headers;
        headers.remove(header::HOST);

        // Bodies stream through in both directions; nothing is buffered.
        let upstream = self
            .client
            .request(parts.method, url)
            .headers(headers)
            .body(reqwest::Body::wrap_stream(body.into_data_stream()))
            .send()
            .await?;

        let mut builder = Response::builder().status(upstream.status());
        for (name, value) in upstream.headers() {
            builder = builder.header(name, value);
        }
        let response = builder.body(Body::from_stream(upstream.bytes_stream()))?;
        Ok(response)
    }
}
