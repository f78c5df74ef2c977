//! Built-in scrape endpoint.
//!
//! - `GET /metrics` : Prometheus text format, `500` if the export fails

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::export::{MetricsSource, EXPOSITION_CONTENT_TYPE};

use super::routes::{RouteHandler, RouteRequest};

pub const METRICS_PATH: &str = "/metrics";

pub struct MetricsRoute {
    source: Arc<dyn MetricsSource>,
}

impl MetricsRoute {
    pub fn new(source: Arc<dyn MetricsSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl RouteHandler for MetricsRoute {
    async fn handle(&self, _req: &RouteRequest) -> Response {
        match self.source.collect() {
            Ok(report) => {
                if report.degraded() {
                    tracing::warn!(
                        missing = ?report.missing,
                        fold_errors = report.fold_errors,
                        "serving partially degraded metrics"
                    );
                }
                (
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
                    report.body,
                )
                    .into_response()
            }
            Err(e) => {
                tracing::error!(error = %e, class = e.class().as_str(), "error collecting metrics");
                (StatusCode::INTERNAL_SERVER_ERROR, "Error collecting metrics").into_response()
            }
        }
    }
}
