//! Ingestion queue: per-kind, insertion-ordered, timestamped entries.
//!
//! Producers call [`IngestionQueue::submit`] from any thread. The map sits
//! behind a single mutex; ids are assigned inside the same critical section
//! as the append, so id order always equals insertion order, across kinds.
//! Entries leave the queue only through the age-based sweep or the
//! exporter's drain.

pub mod sweeper;

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::{Duration, SystemTime};

use tally_core::{MetricKind, MetricPayload};

pub use sweeper::{SweepConfig, Sweeper, SweeperHandle};

/// One submitted measurement. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricEntry {
    id: u64,
    kind: MetricKind,
    timestamp: SystemTime,
    payload: MetricPayload,
}

impl MetricEntry {
    pub fn id(&self) -> u64 {
        self.id
    }
    pub fn kind(&self) -> MetricKind {
        self.kind
    }
    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }
    pub fn payload(&self) -> &MetricPayload {
        &self.payload
    }

    /// Age relative to `now`. Entries stamped in the future count as age zero.
    pub fn age_at(&self, now: SystemTime) -> Duration {
        now.duration_since(self.timestamp).unwrap_or(Duration::ZERO)
    }
}

/// Kind -> entries in insertion order. Never holds an empty sequence.
pub type MetricMap = BTreeMap<MetricKind, Vec<MetricEntry>>;

#[derive(Default)]
struct QueueInner {
    metrics: MetricMap,
    next_id: u64,
}

impl QueueInner {
    fn push(&mut self, kind: MetricKind, payload: MetricPayload) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.metrics.entry(kind).or_default().push(MetricEntry {
            id,
            kind,
            timestamp: SystemTime::now(),
            payload,
        });
        id
    }
}

/// Thread-safe ingestion queue. Construct once and share via `Arc`.
#[derive(Default)]
pub struct IngestionQueue {
    inner: Mutex<QueueInner>,
}

impl IngestionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock must not disable ingestion for everyone else.
    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue one entry. Always succeeds, whether or not `kind` is registered.
    pub fn submit(&self, kind: MetricKind, payload: MetricPayload) {
        if payload.kind() != kind {
            tracing::debug!(
                kind = %kind,
                payload_kind = %payload.kind(),
                "payload variant does not match submitted kind"
            );
        }
        let logged = tracing::enabled!(tracing::Level::TRACE).then(|| payload.to_log_string());
        let id = self.lock().push(kind, payload);
        if let Some(data) = logged {
            tracing::trace!(id, kind = %kind, %data, "metric submitted");
        }
    }

    /// Enqueue under the payload's own kind.
    pub fn record(&self, payload: MetricPayload) {
        self.submit(payload.kind(), payload);
    }

    /// Like [`record`](Self::record) but gives up instead of waiting for the
    /// lock. For contexts that may already hold it, such as a panic hook.
    pub fn try_record(&self, payload: MetricPayload) -> bool {
        let mut inner = match self.inner.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(e)) => e.into_inner(),
            Err(TryLockError::WouldBlock) => return false,
        };
        inner.push(payload.kind(), payload);
        true
    }

    /// Entries currently queued for `kind`, oldest first.
    pub fn get(&self, kind: MetricKind) -> Option<Vec<MetricEntry>> {
        self.lock().metrics.get(&kind).cloned()
    }

    pub fn has(&self, kind: MetricKind) -> bool {
        self.lock().metrics.contains_key(&kind)
    }

    /// Total entries across all kinds.
    pub fn len(&self) -> usize {
        self.lock().metrics.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().metrics.is_empty()
    }

    /// Read-only copy of the whole map.
    pub fn snapshot(&self) -> MetricMap {
        self.lock().metrics.clone()
    }

    /// Take every queued entry, leaving the queue empty. Exporter only.
    pub(crate) fn drain(&self) -> MetricMap {
        std::mem::take(&mut self.lock().metrics)
    }

    /// Put drained entries back ahead of anything submitted since the drain.
    pub(crate) fn restore(&self, drained: MetricMap) {
        let mut inner = self.lock();
        for (kind, mut entries) in drained {
            if entries.is_empty() {
                continue;
            }
            if let Some(newer) = inner.metrics.remove(&kind) {
                entries.extend(newer);
            }
            inner.metrics.insert(kind, entries);
        }
    }

    /// Remove entries whose age is at least `retention`.
    pub fn sweep(&self, retention: Duration) -> usize {
        self.sweep_at(SystemTime::now(), retention)
    }

    /// [`sweep`](Self::sweep) against an explicit clock reading. Returns the
    /// number of entries removed; kinds left empty are dropped from the map.
    pub fn sweep_at(&self, now: SystemTime, retention: Duration) -> usize {
        let mut inner = self.lock();
        let mut removed = 0;
        inner.metrics.retain(|kind, entries| {
            let before = entries.len();
            entries.retain(|e| e.age_at(now) < retention);
            let dropped = before - entries.len();
            removed += dropped;
            if dropped > 0 {
                tracing::trace!(kind = %kind, dropped, "cleared expired metric entries");
            }
            if entries.is_empty() {
                tracing::debug!(kind = %kind, "deleted metric with no recent entries");
                false
            } else {
                true
            }
        });
        removed
    }
}
