//! Exact-match route table for the scrape server.
//!
//! Handlers are keyed by `(method, path)`; registering the same key again
//! replaces the previous handler.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::Method;
use axum::response::Response;
use dashmap::DashMap;

/// What a route handler gets to see of the request.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub method: Method,
    pub path: String,
    pub remote: Option<SocketAddr>,
}

/// A handler installed under one `(method, path)` key.
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn handle(&self, req: &RouteRequest) -> Response;
}

/// Static route table keyed by exact `(method, path)`.
#[derive(Default)]
pub struct RouteTable {
    routes: DashMap<(Method, String), Arc<dyn RouteHandler>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self {
            routes: DashMap::new(),
        }
    }

    /// Install or replace the handler for `(method, path)`.
    pub fn register(&self, method: Method, path: impl Into<String>, handler: Arc<dyn RouteHandler>) {
        let path = path.into();
        tracing::debug!(%method, %path, "registered route");
        if self.routes.insert((method, path), handler).is_some() {
            tracing::debug!("replaced existing route handler");
        }
    }

    pub fn lookup(&self, method: &Method, path: &str) -> Option<Arc<dyn RouteHandler>> {
        self.routes
            .get(&(method.clone(), path.to_string()))
            .map(|e| Arc::clone(e.value()))
    }

    pub fn registered(&self) -> Vec<(Method, String)> {
        self.routes.iter().map(|e| e.key().clone()).collect()
    }
}
