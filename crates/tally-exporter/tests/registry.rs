#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use tally_core::{MetricKind, MetricPayload, Result};
use tally_exporter::registry::{definitions, Family, MetricType};
use tally_exporter::{MetricRegistration, MetricRegistry};

fn noop(_: &mut Family, _: &MetricPayload) -> Result<()> {
    Ok(())
}

fn gauge(name: &str) -> MetricRegistration {
    MetricRegistration::new(MetricKind::FeatureUsed, name, "Test metric", MetricType::Gauge, noop)
}

#[test]
fn register_and_lookup() {
    let registry = MetricRegistry::new();
    assert!(!registry.has(MetricKind::FeatureUsed));

    registry.register(gauge("test_metric"));

    assert!(registry.has(MetricKind::FeatureUsed));
    assert_eq!(registry.get(MetricKind::FeatureUsed).unwrap().name, "test_metric");
}

#[test]
fn reregistering_replaces_previous() {
    let registry = MetricRegistry::new();
    registry.register(gauge("first"));
    registry.register(gauge("second"));

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get(MetricKind::FeatureUsed).unwrap().name, "second");
}

#[test]
fn unknown_kind_is_none() {
    let registry = MetricRegistry::new();
    assert!(registry.get(MetricKind::DatabaseOperation).is_none());
    assert!(registry.is_empty());
}

#[test]
fn get_all_is_ordered_snapshot() {
    let registry = MetricRegistry::new();
    registry.register(
        MetricRegistration::new(MetricKind::DatabaseOperation, "m2", "Metric 2", MetricType::Counter, noop),
    );
    registry.register(
        MetricRegistration::new(MetricKind::InteractionsReceived, "m1", "Metric 1", MetricType::Gauge, noop),
    );

    let all = registry.get_all();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].name, "m1");
    assert_eq!(all[1].name, "m2");

    // Later registrations do not change an existing snapshot.
    registry.register(gauge("m3"));
    assert_eq!(all.len(), 2);
}

#[test]
fn histogram_buckets_are_normalized() {
    let registry = MetricRegistry::new();
    registry.register(
        MetricRegistration::new(MetricKind::DatabaseOperation, "h", "H", MetricType::Histogram, noop)
            .with_buckets(vec![1.0, 0.1, f64::NAN, 0.1, 0.5]),
    );
    let reg = registry.get(MetricKind::DatabaseOperation).unwrap();
    assert_eq!(reg.buckets.as_deref(), Some(&[0.1, 0.5, 1.0][..]));
}

#[test]
fn defaults_cover_every_kind() {
    let registry = MetricRegistry::with_defaults();
    assert_eq!(registry.len(), MetricKind::ALL.len());
    for kind in MetricKind::ALL {
        let reg = registry.get(kind).unwrap();
        assert_eq!(reg.kind, kind);
        assert!(reg.name.starts_with("tally_"));
    }

    let db = definitions::registration_for(MetricKind::DatabaseOperation);
    assert_eq!(db.metric_type, MetricType::Histogram);
    assert_eq!(db.labels, vec!["model", "operation"]);
}

#[test]
fn default_reduce_rejects_foreign_payload() {
    let reg = std::sync::Arc::new(definitions::registration_for(MetricKind::FeatureUsed));
    let mut family = Family::new(reg.clone());

    let err = (reg.reduce)(
        &mut family,
        &MetricPayload::EventReceived { event: "ready".into() },
    )
    .expect_err("mismatched payload must not fold");
    assert_eq!(err.class().as_str(), "FOLD");
    assert_eq!(family.series_len(), 0);
}

fn sample(kind: MetricKind) -> MetricPayload {
    let s = || "x".to_string();
    match kind {
        MetricKind::InteractionsReceived => MetricPayload::InteractionsReceived { event: s() },
        MetricKind::InteractionReceived => MetricPayload::InteractionReceived {
            interaction_type: s(),
        },
        MetricKind::CommandExecuted => MetricPayload::CommandExecuted {
            event: s(),
            command_name: s(),
            duration_ms: 1.0,
        },
        MetricKind::EventExecuted => MetricPayload::EventExecuted {
            event: s(),
            event_file: s(),
            duration_ms: 1.0,
        },
        MetricKind::RawEventReceived => MetricPayload::RawEventReceived {
            event: s(),
            count: None,
        },
        MetricKind::EventReceived => MetricPayload::EventReceived { event: s() },
        MetricKind::MetricsQueueLength => MetricPayload::MetricsQueueLength { length: 1 },
        MetricKind::MetricsQueueLengthByMetric => MetricPayload::MetricsQueueLengthByMetric {
            metric: MetricKind::FeatureUsed,
            length: 1,
        },
        MetricKind::MetricsGenerationTime => {
            MetricPayload::MetricsGenerationTime { duration_ms: 1.0 }
        }
        MetricKind::PlatformLatency => MetricPayload::PlatformLatency { latency_ms: 1.0 },
        MetricKind::ApplicationError => MetricPayload::ApplicationError {
            name: s(),
            message: s(),
            location: None,
        },
        MetricKind::FeatureUsed => MetricPayload::FeatureUsed { feature: s() },
        MetricKind::HttpServerRequests => MetricPayload::HttpServerRequests {
            method: s(),
            path: s(),
            remote_address: s(),
            status_code: 200,
            duration_ms: 1.0,
        },
        MetricKind::DatabaseOperation => MetricPayload::DatabaseOperation {
            model: s(),
            operation: s(),
            duration_ms: 1.0,
        },
    }
}

#[test]
fn payload_labels_match_registered_label_names() {
    for kind in MetricKind::ALL {
        let payload = sample(kind);
        assert_eq!(payload.kind(), kind);
        let names: Vec<&str> = payload.labels().iter().map(|(k, _)| *k).collect();
        let registration = definitions::registration_for(kind);
        assert_eq!(names, registration.labels, "label mismatch for {kind}");
    }
}
