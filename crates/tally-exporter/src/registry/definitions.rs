//! Built-in export definitions, one per [`MetricKind`].
//!
//! Adding a kind to the taxonomy fails to compile until it has an arm in
//! [`registration_for`], so every kind always has export handling.

use tally_core::{MetricKind, MetricPayload, Result, TallyError};

use super::{Family, MetricRegistration, MetricType};

/// Buckets for database call durations, in seconds.
pub const DATABASE_BUCKETS: [f64; 9] = [0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0];

/// Every built-in registration, in kind order.
pub fn all() -> Vec<MetricRegistration> {
    MetricKind::ALL.iter().map(|k| registration_for(*k)).collect()
}

/// The built-in registration for one kind.
pub fn registration_for(kind: MetricKind) -> MetricRegistration {
    use MetricType::{Counter, Gauge, Histogram};

    match kind {
        MetricKind::InteractionsReceived => MetricRegistration::new(
            kind,
            "tally_interactions_received_total",
            "Number of interactions received",
            Counter,
            reduce_interactions_received,
        )
        .with_labels(&["event"]),
        MetricKind::InteractionReceived => MetricRegistration::new(
            kind,
            "tally_interaction_received_total",
            "Number of interactions received by type",
            Counter,
            reduce_interaction_received,
        )
        .with_labels(&["interaction_type"]),
        MetricKind::CommandExecuted => MetricRegistration::new(
            kind,
            "tally_command_executed_duration_ms",
            "Duration of the last command execution in ms",
            Gauge,
            reduce_command_executed,
        )
        .with_labels(&["event", "command_name"]),
        MetricKind::EventExecuted => MetricRegistration::new(
            kind,
            "tally_event_executed_duration_ms",
            "Duration of the last event handler execution in ms",
            Gauge,
            reduce_event_executed,
        )
        .with_labels(&["event", "event_file"]),
        MetricKind::RawEventReceived => MetricRegistration::new(
            kind,
            "tally_raw_event_received_total",
            "Number of raw gateway events received",
            Counter,
            reduce_raw_event_received,
        )
        .with_labels(&["event"]),
        MetricKind::EventReceived => MetricRegistration::new(
            kind,
            "tally_event_received_total",
            "Events received",
            Counter,
            reduce_event_received,
        )
        .with_labels(&["event"]),
        MetricKind::MetricsQueueLength => MetricRegistration::new(
            kind,
            "tally_metrics_queue_length",
            "Entries folded by the last scrape",
            Gauge,
            reduce_queue_length,
        ),
        MetricKind::MetricsQueueLengthByMetric => MetricRegistration::new(
            kind,
            "tally_metrics_queue_length_by_metric",
            "Entries folded by the last scrape, per metric kind",
            Gauge,
            reduce_queue_length_by_metric,
        )
        .with_labels(&["metric"]),
        MetricKind::MetricsGenerationTime => MetricRegistration::new(
            kind,
            "tally_metrics_generation_time_ms",
            "Time taken to fold the queue in ms",
            Gauge,
            reduce_generation_time,
        ),
        MetricKind::PlatformLatency => MetricRegistration::new(
            kind,
            "tally_platform_latency_ms",
            "Chat platform gateway latency in ms",
            Gauge,
            reduce_platform_latency,
        ),
        MetricKind::ApplicationError => MetricRegistration::new(
            kind,
            "tally_application_errors_total",
            "Number of application errors",
            Counter,
            reduce_application_error,
        )
        .with_labels(&["name"]),
        MetricKind::FeatureUsed => MetricRegistration::new(
            kind,
            "tally_feature_used_total",
            "Features used",
            Counter,
            reduce_feature_used,
        )
        .with_labels(&["feature"]),
        MetricKind::HttpServerRequests => MetricRegistration::new(
            kind,
            "tally_metrics_http_server_requests_total",
            "Requests served by the metrics HTTP server",
            Counter,
            reduce_http_server_requests,
        )
        .with_labels(&["method", "path", "status_code"]),
        MetricKind::DatabaseOperation => MetricRegistration::new(
            kind,
            "tally_database_operation_duration_seconds",
            "Database operation duration in seconds",
            Histogram,
            reduce_database_operation,
        )
        .with_labels(&["model", "operation"])
        .with_buckets(DATABASE_BUCKETS.to_vec()),
    }
}

fn mismatch(expected: MetricKind, got: &MetricPayload) -> TallyError {
    TallyError::fold(
        expected,
        format!("payload of kind {} submitted under {}", got.kind(), expected),
    )
}

fn reduce_interactions_received(f: &mut Family, p: &MetricPayload) -> Result<()> {
    match p {
        MetricPayload::InteractionsReceived { event } => f.inc(&[event.as_str()]),
        other => Err(mismatch(MetricKind::InteractionsReceived, other)),
    }
}

fn reduce_interaction_received(f: &mut Family, p: &MetricPayload) -> Result<()> {
    match p {
        MetricPayload::InteractionReceived { interaction_type } => f.inc(&[interaction_type.as_str()]),
        other => Err(mismatch(MetricKind::InteractionReceived, other)),
    }
}

fn reduce_command_executed(f: &mut Family, p: &MetricPayload) -> Result<()> {
    match p {
        MetricPayload::CommandExecuted {
            event,
            command_name,
            duration_ms,
        } => f.set(&[event.as_str(), command_name.as_str()], *duration_ms),
        other => Err(mismatch(MetricKind::CommandExecuted, other)),
    }
}

fn reduce_event_executed(f: &mut Family, p: &MetricPayload) -> Result<()> {
    match p {
        MetricPayload::EventExecuted {
            event,
            event_file,
            duration_ms,
        } => f.set(&[event.as_str(), event_file.as_str()], *duration_ms),
        other => Err(mismatch(MetricKind::EventExecuted, other)),
    }
}

fn reduce_raw_event_received(f: &mut Family, p: &MetricPayload) -> Result<()> {
    match p {
        MetricPayload::RawEventReceived { event, count } => {
            f.inc_by(&[event.as_str()], count.unwrap_or(1) as f64)
        }
        other => Err(mismatch(MetricKind::RawEventReceived, other)),
    }
}

fn reduce_event_received(f: &mut Family, p: &MetricPayload) -> Result<()> {
    match p {
        MetricPayload::EventReceived { event } => f.inc(&[event.as_str()]),
        other => Err(mismatch(MetricKind::EventReceived, other)),
    }
}

fn reduce_queue_length(f: &mut Family, p: &MetricPayload) -> Result<()> {
    match p {
        MetricPayload::MetricsQueueLength { length } => f.set(&[], *length as f64),
        other => Err(mismatch(MetricKind::MetricsQueueLength, other)),
    }
}

fn reduce_queue_length_by_metric(f: &mut Family, p: &MetricPayload) -> Result<()> {
    match p {
        MetricPayload::MetricsQueueLengthByMetric { metric, length } => {
            f.set(&[metric.as_str()], *length as f64)
        }
        other => Err(mismatch(MetricKind::MetricsQueueLengthByMetric, other)),
    }
}

fn reduce_generation_time(f: &mut Family, p: &MetricPayload) -> Result<()> {
    match p {
        MetricPayload::MetricsGenerationTime { duration_ms } => f.set(&[], *duration_ms),
        other => Err(mismatch(MetricKind::MetricsGenerationTime, other)),
    }
}

fn reduce_platform_latency(f: &mut Family, p: &MetricPayload) -> Result<()> {
    match p {
        MetricPayload::PlatformLatency { latency_ms } => f.set(&[], *latency_ms),
        other => Err(mismatch(MetricKind::PlatformLatency, other)),
    }
}

fn reduce_application_error(f: &mut Family, p: &MetricPayload) -> Result<()> {
    match p {
        MetricPayload::ApplicationError { name, .. } => f.inc(&[name.as_str()]),
        other => Err(mismatch(MetricKind::ApplicationError, other)),
    }
}

fn reduce_feature_used(f: &mut Family, p: &MetricPayload) -> Result<()> {
    match p {
        MetricPayload::FeatureUsed { feature } => f.inc(&[feature.as_str()]),
        other => Err(mismatch(MetricKind::FeatureUsed, other)),
    }
}

fn reduce_http_server_requests(f: &mut Family, p: &MetricPayload) -> Result<()> {
    match p {
        MetricPayload::HttpServerRequests {
            method,
            path,
            status_code,
            ..
        } => {
            let status = status_code.to_string();
            f.inc(&[method.as_str(), path.as_str(), status.as_str()])
        }
        other => Err(mismatch(MetricKind::HttpServerRequests, other)),
    }
}

/// Durations arrive in milliseconds; the exposition unit is seconds.
fn reduce_database_operation(f: &mut Family, p: &MetricPayload) -> Result<()> {
    match p {
        MetricPayload::DatabaseOperation {
            model,
            operation,
            duration_ms,
        } => f.observe(&[model.as_str(), operation.as_str()], duration_ms / 1000.0),
        other => Err(mismatch(MetricKind::DatabaseOperation, other)),
    }
}
