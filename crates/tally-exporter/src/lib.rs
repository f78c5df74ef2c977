//! tally exporter library entry.
//!
//! This crate wires the metric registry, ingestion queue, sweeper, exporter,
//! and scrape server into a pull-based Prometheus endpoint. It is consumed by
//! the binary (`main.rs`), by host applications that submit metrics, and by
//! integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod app_state;
pub mod config;
pub mod export;
pub mod instrument;
pub mod queue;
pub mod registry;
pub mod server;

pub use app_state::AppState;
pub use export::{ExportReport, Exporter, MetricsSource};
pub use queue::{IngestionQueue, MetricEntry};
pub use registry::{MetricRegistration, MetricRegistry};
pub use server::ScrapeServer;
