//! Scrape-time export: drain the queue, fold it through the registry, render.
//!
//! Each call to [`Exporter::export`] starts from freshly reset families, so
//! concurrent scrapes never share accumulators. The drain is atomic with
//! respect to producers and the sweep: an entry is folded by exactly one
//! scrape.

pub mod family;
pub mod process;

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tally_core::duration::{as_millis_f64, format_duration};
use tally_core::{MetricKind, Result, TallyError};

use crate::queue::{IngestionQueue, MetricMap};
use crate::registry::MetricRegistry;

pub use family::{Family, MetricType};
pub use process::{ProcessCollector, ProcessSample};

/// Content type of the exposition text.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Outcome of one scrape.
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Exposition text. Empty when the text was written elsewhere
    /// ([`Exporter::export_into`]).
    pub body: String,
    /// Entries drained and folded by this scrape.
    pub queue_length: usize,
    /// Wall-clock time of the fold.
    pub generation_time: Duration,
    /// Kinds that had entries but no registration.
    pub missing: Vec<MetricKind>,
    /// Entries that failed to fold.
    pub fold_errors: usize,
}

impl ExportReport {
    /// True when some queued data could not be exported.
    pub fn degraded(&self) -> bool {
        !self.missing.is_empty() || self.fold_errors > 0
    }
}

/// Produces one scrape's worth of exposition text.
pub trait MetricsSource: Send + Sync {
    fn collect(&self) -> Result<ExportReport>;
}

pub struct Exporter {
    registry: Arc<MetricRegistry>,
    queue: Arc<IngestionQueue>,
    process: Option<ProcessCollector>,
}

impl Exporter {
    /// Exporter with process metrics enabled.
    pub fn new(registry: Arc<MetricRegistry>, queue: Arc<IngestionQueue>) -> Self {
        Self {
            registry,
            queue,
            process: ProcessCollector::new(),
        }
    }

    /// Turn the `tally_process_*` families on or off.
    pub fn with_process_metrics(mut self, enabled: bool) -> Self {
        self.process = if enabled { ProcessCollector::new() } else { None };
        self
    }

    /// Run one scrape into a fresh `String` (`report.body`).
    pub fn export(&self) -> Result<ExportReport> {
        let mut body = String::new();
        let mut report = self.export_into(&mut body)?;
        report.body = body;
        Ok(report)
    }

    /// Run one scrape, writing the text to `out`. Missing registrations and
    /// bad entries degrade the result but never fail it. If writing fails, the
    /// drained entries go back to the queue for the next scrape and `out` may
    /// hold a partial page.
    pub fn export_into<W: fmt::Write>(&self, out: &mut W) -> Result<ExportReport> {
        let started = Instant::now();

        let mut families: BTreeMap<MetricKind, Family> = self
            .registry
            .get_all()
            .into_iter()
            .map(|r| (r.kind, Family::new(r)))
            .collect();

        let drained = self.queue.drain();
        let mut queue_length = 0;
        let mut missing = Vec::new();
        let mut fold_errors = 0;

        for (kind, entries) in &drained {
            queue_length += entries.len();
            tracing::trace!(kind = %kind, entries = entries.len(), "processing metric entries");

            let Some(family) = families.get_mut(kind) else {
                let err = TallyError::UnregisteredKind(*kind);
                tracing::error!(
                    kind = %kind,
                    entries = entries.len(),
                    class = err.class().as_str(),
                    "{err}; skipping"
                );
                missing.push(*kind);
                continue;
            };

            let reduce = family.registration().reduce;
            for entry in entries {
                let outcome = catch_unwind(AssertUnwindSafe(|| reduce(&mut *family, entry.payload())));
                let err = match outcome {
                    Ok(Ok(())) => continue,
                    Ok(Err(e)) => e,
                    Err(_) => TallyError::fold(*kind, "reduce panicked"),
                };
                fold_errors += 1;
                tracing::error!(
                    id = entry.id(),
                    kind = %kind,
                    class = err.class().as_str(),
                    error = %err,
                    "failed to fold metric entry"
                );
            }
        }

        let generation_time = started.elapsed();
        record_derived(&mut families, &drained, queue_length, generation_time);

        let rendered = families
            .values()
            .try_for_each(|f| f.render(&mut *out))
            .and_then(|()| match self.process.as_ref().and_then(ProcessCollector::sample) {
                Some(sample) => sample.render(&mut *out),
                None => Ok(()),
            });
        if let Err(e) = rendered {
            let err = TallyError::from(e);
            tracing::error!(class = err.class().as_str(), error = %err, "restoring drained metric entries");
            self.queue.restore(drained);
            return Err(err);
        }

        tracing::debug!(
            queue_length,
            generation_time = %format_duration(generation_time),
            missing = missing.len(),
            fold_errors,
            "metrics generated"
        );

        Ok(ExportReport {
            body: String::new(),
            queue_length,
            generation_time,
            missing,
            fold_errors,
        })
    }
}

impl MetricsSource for Exporter {
    fn collect(&self) -> Result<ExportReport> {
        self.export()
    }
}

/// Scrape-level measurements that are not queue entries themselves.
fn record_derived(
    families: &mut BTreeMap<MetricKind, Family>,
    drained: &MetricMap,
    queue_length: usize,
    generation_time: Duration,
) {
    let mut results = Vec::new();
    if let Some(f) = families.get_mut(&MetricKind::MetricsQueueLength) {
        results.push(f.set(&[], queue_length as f64));
    }
    if let Some(f) = families.get_mut(&MetricKind::MetricsQueueLengthByMetric) {
        for (kind, entries) in drained {
            results.push(f.set(&[kind.as_str()], entries.len() as f64));
        }
    }
    if let Some(f) = families.get_mut(&MetricKind::MetricsGenerationTime) {
        results.push(f.set(&[], as_millis_f64(generation_time)));
    }
    for err in results.into_iter().filter_map(|r| r.err()) {
        tracing::warn!(error = %err, "failed to record derived scrape metric");
    }
}
