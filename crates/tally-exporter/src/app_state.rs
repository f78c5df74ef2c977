//! Composition root for the exporter.
//!
//! Owns the registry, ingestion queue, exporter, and scrape server as explicit
//! instances. Producers get the queue from here (`AppState::queue`) instead of
//! reaching for a global.

use std::sync::Arc;

use tally_core::error::Result;
use tally_core::MetricKind;

use crate::config::ExporterConfig;
use crate::export::Exporter;
use crate::queue::IngestionQueue;
use crate::registry::MetricRegistry;
use crate::server::ScrapeServer;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ExporterConfig,
    registry: Arc<MetricRegistry>,
    queue: Arc<IngestionQueue>,
    exporter: Arc<Exporter>,
    server: Arc<ScrapeServer>,
}

impl AppState {
    /// Build state with the built-in metric definitions.
    pub fn new(cfg: ExporterConfig) -> Result<Self> {
        Self::with_registry(cfg, MetricRegistry::with_defaults())
    }

    /// Build state around a caller-provided registry.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn with_registry(cfg: ExporterConfig, registry: MetricRegistry) -> Result<Self> {
        cfg.validate()?;

        // Kinds without a registration still ingest; their scrapes degrade.
        for kind in MetricKind::ALL {
            if !registry.has(kind) {
                tracing::warn!(kind = %kind, "metric kind has no registration; it will not be exported");
            }
        }

        let registry = Arc::new(registry);
        let queue = Arc::new(IngestionQueue::new());
        let exporter = Arc::new(
            Exporter::new(Arc::clone(&registry), Arc::clone(&queue))
                .with_process_metrics(cfg.export.process_metrics),
        );
        let server = Arc::new(ScrapeServer::new(
            Arc::clone(&exporter),
            Arc::clone(&queue),
            cfg.server_name(),
        ));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry,
                queue,
                exporter,
                server,
            }),
        })
    }

    pub fn cfg(&self) -> &ExporterConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> Arc<MetricRegistry> {
        Arc::clone(&self.inner.registry)
    }

    pub fn queue(&self) -> Arc<IngestionQueue> {
        Arc::clone(&self.inner.queue)
    }

    pub fn exporter(&self) -> Arc<Exporter> {
        Arc::clone(&self.inner.exporter)
    }

    pub fn server(&self) -> Arc<ScrapeServer> {
        Arc::clone(&self.inner.server)
    }
}
