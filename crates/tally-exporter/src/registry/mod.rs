//! Metric registry: kind -> export configuration.

pub mod definitions;

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use tally_core::{MetricKind, MetricPayload, Result};

pub use crate::export::family::{Family, MetricType};

/// Folds one submitted payload into the exported accumulator.
pub type ReduceFn = fn(&mut Family, &MetricPayload) -> Result<()>;

/// How one metric kind is exported.
#[derive(Clone)]
pub struct MetricRegistration {
    pub kind: MetricKind,
    pub name: String,
    pub help: String,
    pub metric_type: MetricType,
    /// Label names, in exposition order.
    pub labels: Vec<String>,
    /// Histogram bucket upper bounds (exported units). Ignored for other types.
    pub buckets: Option<Vec<f64>>,
    pub reduce: ReduceFn,
}

impl MetricRegistration {
    pub fn new(
        kind: MetricKind,
        name: impl Into<String>,
        help: impl Into<String>,
        metric_type: MetricType,
        reduce: ReduceFn,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            help: help.into(),
            metric_type,
            labels: Vec::new(),
            buckets: None,
            reduce,
        }
    }

    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        self.labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn with_buckets(mut self, buckets: Vec<f64>) -> Self {
        self.buckets = Some(buckets);
        self
    }
}

impl fmt::Debug for MetricRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricRegistration")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("metric_type", &self.metric_type)
            .field("labels", &self.labels)
            .field("buckets", &self.buckets)
            .finish_non_exhaustive()
    }
}

/// Registry of export configurations. One active registration per kind.
#[derive(Default)]
pub struct MetricRegistry {
    registrations: DashMap<MetricKind, Arc<MetricRegistration>>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self {
            registrations: DashMap::new(),
        }
    }

    /// Registry holding the built-in definition for every kind.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        for registration in definitions::all() {
            registry.register(registration);
        }
        registry
    }

    /// Store or overwrite the registration for its kind. Never fails:
    /// overwriting logs a warning, and unsorted histogram buckets are sorted.
    pub fn register(&self, mut registration: MetricRegistration) {
        if let Some(buckets) = registration.buckets.as_mut() {
            let before = buckets.len();
            buckets.retain(|b| b.is_finite());
            buckets.sort_by(f64::total_cmp);
            buckets.dedup();
            if buckets.len() != before {
                tracing::warn!(
                    kind = %registration.kind,
                    "dropped non-finite or duplicate histogram buckets"
                );
            }
        }

        let kind = registration.kind;
        let name = registration.name.clone();
        if let Some(previous) = self.registrations.insert(kind, Arc::new(registration)) {
            tracing::warn!(
                kind = %kind,
                previous = %previous.name,
                name = %name,
                "metric kind registered twice; replacing previous registration"
            );
        } else {
            tracing::debug!(kind = %kind, name = %name, "registered metric");
        }
    }

    pub fn has(&self, kind: MetricKind) -> bool {
        self.registrations.contains_key(&kind)
    }

    /// `None` when the kind has no registration.
    pub fn get(&self, kind: MetricKind) -> Option<Arc<MetricRegistration>> {
        self.registrations.get(&kind).map(|r| Arc::clone(r.value()))
    }

    /// Snapshot of every registration, ordered by kind.
    pub fn get_all(&self) -> Vec<Arc<MetricRegistration>> {
        let mut all: Vec<_> = self
            .registrations
            .iter()
            .map(|r| Arc::clone(r.value()))
            .collect();
        all.sort_by_key(|r| r.kind);
        all
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}
