#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tally_core::{MetricKind, MetricPayload};
use tally_exporter::IngestionQueue;

fn feature(name: &str) -> MetricPayload {
    MetricPayload::FeatureUsed {
        feature: name.into(),
    }
}

#[test]
fn submit_stores_entries_in_order_with_increasing_ids() {
    let q = IngestionQueue::new();
    q.submit(MetricKind::FeatureUsed, feature("test"));
    q.submit(MetricKind::FeatureUsed, feature("test2"));

    assert!(q.has(MetricKind::FeatureUsed));
    let entries = q.get(MetricKind::FeatureUsed).unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].id() < entries[1].id());
    assert_eq!(entries[0].kind(), MetricKind::FeatureUsed);
    assert_eq!(entries[1].payload(), &feature("test2"));
}

#[test]
fn ids_increase_across_kinds() {
    let q = IngestionQueue::new();
    q.record(feature("a"));
    q.record(MetricPayload::EventReceived { event: "ready".into() });
    q.record(feature("b"));

    let f = q.get(MetricKind::FeatureUsed).unwrap();
    let e = q.get(MetricKind::EventReceived).unwrap();
    assert!(f[0].id() < e[0].id());
    assert!(e[0].id() < f[1].id());
    assert_eq!(q.len(), 3);
}

#[test]
fn submit_accepts_mismatched_payload() {
    // Registration is checked at export time, never at submission.
    let q = IngestionQueue::new();
    q.submit(MetricKind::PlatformLatency, feature("x"));
    assert_eq!(q.get(MetricKind::PlatformLatency).unwrap().len(), 1);
}

#[test]
fn sweep_removes_entries_at_or_past_retention() {
    let q = IngestionQueue::new();
    q.record(feature("a"));
    q.record(MetricPayload::EventReceived { event: "ready".into() });

    let retention = Duration::from_secs(3600);
    let now = SystemTime::now();

    // Nothing is old enough yet.
    assert_eq!(q.sweep_at(now, retention), 0);
    assert_eq!(q.len(), 2);

    // Two hours later everything has expired and the kinds are gone.
    let removed = q.sweep_at(now + Duration::from_secs(2 * 3600), retention);
    assert_eq!(removed, 2);
    assert!(!q.has(MetricKind::FeatureUsed));
    assert!(!q.has(MetricKind::EventReceived));
    assert!(q.is_empty());
    assert!(q.snapshot().is_empty());
}

#[test]
fn concurrent_submitters_keep_per_kind_order() {
    let q = Arc::new(IngestionQueue::new());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let q = Arc::clone(&q);
            std::thread::spawn(move || {
                for i in 0..250 {
                    q.record(feature(&format!("{t}-{i}")));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let entries = q.get(MetricKind::FeatureUsed).unwrap();
    assert_eq!(entries.len(), 2000);
    assert!(entries.windows(2).all(|w| w[0].id() < w[1].id()));
}

#[test]
fn retention_boundary_is_inclusive() {
    let window = Duration::from_secs(3600);
    let q = IngestionQueue::new();
    q.record(feature("edge"));
    let stamped = q.get(MetricKind::FeatureUsed).unwrap()[0].timestamp();

    assert_eq!(q.sweep_at(stamped + window - Duration::from_nanos(1), window), 0);
    assert!(q.has(MetricKind::FeatureUsed));

    assert_eq!(q.sweep_at(stamped + window, window), 1);
    assert!(!q.has(MetricKind::FeatureUsed));
}
