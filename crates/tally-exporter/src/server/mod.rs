//! Scrape server: a static route table served through axum.
//!
//! Every request, matched or not, goes through [`ScrapeServer::handle`], which
//! stamps the `Server` header, logs the outcome, and records an
//! `HttpServerRequests` entry in the ingestion queue. Requests that match no
//! route are recorded under [`UNMATCHED_PATH`]; the log keeps the real path.

pub mod ops;
pub mod routes;

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderValue, Method, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::Router;
use futures_util::FutureExt;
use tokio::net::TcpListener;

use tally_core::duration::{as_millis_f64, format_duration};
use tally_core::MetricPayload;

use crate::export::Exporter;
use crate::queue::IngestionQueue;

pub use ops::{MetricsRoute, METRICS_PATH};
pub use routes::{RouteHandler, RouteRequest, RouteTable};

/// `path` recorded for requests that matched no route.
pub const UNMATCHED_PATH: &str = "unmatched";

const NOT_FOUND_TEMPLATE: &str = include_str!("../../assets/not_found.html");

/// Default identification string for the `Server` header.
pub fn default_server_name() -> String {
    format!(
        "tally-exporter/{}; rust; axum/0.7",
        env!("CARGO_PKG_VERSION")
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            c => out.push(c),
        }
    }
    out
}

/// Substitute `{{NAME}}` placeholders in one left-to-right pass. Substituted
/// text is never rescanned; unknown placeholders are kept verbatim.
fn fill_template(template: &str, mut value: impl FnMut(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = &after[..end];
                match value(name) {
                    Some(v) => out.push_str(&v),
                    None => {
                        out.push_str("{{");
                        out.push_str(name);
                        out.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

pub struct ScrapeServer {
    routes: RouteTable,
    queue: Arc<IngestionQueue>,
    server_name: String,
}

impl ScrapeServer {
    /// Server with `GET /metrics` pre-registered.
    pub fn new(exporter: Arc<Exporter>, queue: Arc<IngestionQueue>, server_name: String) -> Self {
        let routes = RouteTable::new();
        routes.register(Method::GET, METRICS_PATH, Arc::new(MetricsRoute::new(exporter)));
        Self {
            routes,
            queue,
            server_name,
        }
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Install or replace a handler.
    pub fn register_route(&self, method: Method, path: impl Into<String>, handler: Arc<dyn RouteHandler>) {
        self.routes.register(method, path, handler);
    }

    /// Serve one request.
    pub async fn handle(&self, method: Method, path: &str, remote: Option<SocketAddr>) -> Response {
        let started = Instant::now();
        let req = RouteRequest {
            method: method.clone(),
            path: path.to_string(),
            remote,
        };

        let (mut response, matched) = match self.routes.lookup(&method, path) {
            Some(handler) => match AssertUnwindSafe(handler.handle(&req)).catch_unwind().await {
                Ok(response) => (response, true),
                Err(_) => {
                    tracing::error!(%method, path, "route handler panicked");
                    let response =
                        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response();
                    (response, true)
                }
            },
            None => (self.not_found(path), false),
        };

        if let Ok(v) = HeaderValue::from_str(&self.server_name) {
            response.headers_mut().insert(header::SERVER, v);
        }

        let status = response.status();
        let elapsed = started.elapsed();
        let remote_address = remote
            .map(|a| a.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        if status.is_success() || status.is_redirection() {
            tracing::info!(
                %method,
                path,
                remote = %remote_address,
                status = status.as_u16(),
                duration = %format_duration(elapsed),
                "metrics http request"
            );
        } else {
            tracing::warn!(
                %method,
                path,
                remote = %remote_address,
                status = status.as_u16(),
                duration = %format_duration(elapsed),
                "metrics http request"
            );
        }

        // Arbitrary 404 paths share one series.
        let recorded_path = if matched { path } else { UNMATCHED_PATH };
        self.queue.record(MetricPayload::HttpServerRequests {
            method: method.to_string(),
            path: recorded_path.to_string(),
            remote_address,
            status_code: status.as_u16(),
            duration_ms: as_millis_f64(elapsed),
        });

        response
    }

    fn not_found(&self, path: &str) -> Response {
        let started = Instant::now();
        let server = escape_html(&self.server_name);
        let path = escape_html(path);
        let page = fill_template(NOT_FOUND_TEMPLATE, |name| match name {
            "SERVER" => Some(server.clone()),
            "PATH" => Some(path.clone()),
            "RENDER_TIME" => Some(format_duration(started.elapsed())),
            _ => None,
        });
        (StatusCode::NOT_FOUND, Html(page)).into_response()
    }

    /// axum router that feeds every request through [`handle`](Self::handle).
    pub fn router(self: Arc<Self>) -> Router {
        Router::new().fallback(dispatch).with_state(self)
    }

    /// Accept connections until `shutdown` resolves. In-flight requests are
    /// allowed to finish.
    pub async fn serve<F>(self: Arc<Self>, listener: TcpListener, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
    }
}

async fn dispatch(
    State(server): State<Arc<ScrapeServer>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    method: Method,
    uri: Uri,
) -> Response {
    let remote = connect.map(|ConnectInfo(addr)| addr);
    server.handle(method, uri.path(), remote).await
}
