//! Kind-specific payloads.
//!
//! Each [`MetricKind`] owns exactly one variant here, so a payload always knows
//! which kind it belongs to and the exporter can match exhaustively instead of
//! casting loosely-typed maps.

use std::borrow::Cow;

use serde::Serialize;

use crate::kind::MetricKind;

/// Labels plus an optional numeric measurement, shaped per kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricPayload {
    InteractionsReceived {
        event: String,
    },
    InteractionReceived {
        interaction_type: String,
    },
    CommandExecuted {
        event: String,
        command_name: String,
        duration_ms: f64,
    },
    EventExecuted {
        event: String,
        event_file: String,
        duration_ms: f64,
    },
    /// `count` lets batched gateway dispatches report several events at once.
    RawEventReceived {
        event: String,
        count: Option<u64>,
    },
    EventReceived {
        event: String,
    },
    MetricsQueueLength {
        length: u64,
    },
    MetricsQueueLengthByMetric {
        metric: MetricKind,
        length: u64,
    },
    MetricsGenerationTime {
        duration_ms: f64,
    },
    PlatformLatency {
        latency_ms: f64,
    },
    ApplicationError {
        name: String,
        message: String,
        location: Option<String>,
    },
    FeatureUsed {
        feature: String,
    },
    HttpServerRequests {
        method: String,
        path: String,
        remote_address: String,
        status_code: u16,
        duration_ms: f64,
    },
    DatabaseOperation {
        model: String,
        operation: String,
        duration_ms: f64,
    },
}

impl MetricPayload {
    /// The kind this payload variant belongs to.
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricPayload::InteractionsReceived { .. } => MetricKind::InteractionsReceived,
            MetricPayload::InteractionReceived { .. } => MetricKind::InteractionReceived,
            MetricPayload::CommandExecuted { .. } => MetricKind::CommandExecuted,
            MetricPayload::EventExecuted { .. } => MetricKind::EventExecuted,
            MetricPayload::RawEventReceived { .. } => MetricKind::RawEventReceived,
            MetricPayload::EventReceived { .. } => MetricKind::EventReceived,
            MetricPayload::MetricsQueueLength { .. } => MetricKind::MetricsQueueLength,
            MetricPayload::MetricsQueueLengthByMetric { .. } => {
                MetricKind::MetricsQueueLengthByMetric
            }
            MetricPayload::MetricsGenerationTime { .. } => MetricKind::MetricsGenerationTime,
            MetricPayload::PlatformLatency { .. } => MetricKind::PlatformLatency,
            MetricPayload::ApplicationError { .. } => MetricKind::ApplicationError,
            MetricPayload::FeatureUsed { .. } => MetricKind::FeatureUsed,
            MetricPayload::HttpServerRequests { .. } => MetricKind::HttpServerRequests,
            MetricPayload::DatabaseOperation { .. } => MetricKind::DatabaseOperation,
        }
    }

    /// Exported label pairs, in exposition order. Fields that are only logged
    /// (`remote_address`, error `message`/`location`) are not labels.
    pub fn labels(&self) -> Vec<(&'static str, Cow<'_, str>)> {
        match self {
            MetricPayload::InteractionsReceived { event }
            | MetricPayload::RawEventReceived { event, .. }
            | MetricPayload::EventReceived { event } => vec![("event", Cow::from(event.as_str()))],
            MetricPayload::InteractionReceived { interaction_type } => {
                vec![("interaction_type", Cow::from(interaction_type.as_str()))]
            }
            MetricPayload::CommandExecuted {
                event,
                command_name,
                ..
            } => vec![
                ("event", Cow::from(event.as_str())),
                ("command_name", Cow::from(command_name.as_str())),
            ],
            MetricPayload::EventExecuted {
                event, event_file, ..
            } => vec![
                ("event", Cow::from(event.as_str())),
                ("event_file", Cow::from(event_file.as_str())),
            ],
            MetricPayload::MetricsQueueLengthByMetric { metric, .. } => {
                vec![("metric", Cow::from(metric.as_str()))]
            }
            MetricPayload::ApplicationError { name, .. } => vec![("name", Cow::from(name.as_str()))],
            MetricPayload::FeatureUsed { feature } => vec![("feature", Cow::from(feature.as_str()))],
            MetricPayload::HttpServerRequests {
                method,
                path,
                status_code,
                ..
            } => vec![
                ("method", Cow::from(method.as_str())),
                ("path", Cow::from(path.as_str())),
                ("status_code", Cow::from(status_code.to_string())),
            ],
            MetricPayload::DatabaseOperation {
                model, operation, ..
            } => vec![
                ("model", Cow::from(model.as_str())),
                ("operation", Cow::from(operation.as_str())),
            ],
            MetricPayload::MetricsQueueLength { .. }
            | MetricPayload::MetricsGenerationTime { .. }
            | MetricPayload::PlatformLatency { .. } => Vec::new(),
        }
    }

    /// Numeric measurement carried by the payload, if any.
    pub fn measurement(&self) -> Option<f64> {
        match self {
            MetricPayload::CommandExecuted { duration_ms, .. }
            | MetricPayload::EventExecuted { duration_ms, .. }
            | MetricPayload::MetricsGenerationTime { duration_ms }
            | MetricPayload::HttpServerRequests { duration_ms, .. }
            | MetricPayload::DatabaseOperation { duration_ms, .. } => Some(*duration_ms),
            MetricPayload::PlatformLatency { latency_ms } => Some(*latency_ms),
            MetricPayload::MetricsQueueLength { length }
            | MetricPayload::MetricsQueueLengthByMetric { length, .. } => Some(*length as f64),
            MetricPayload::RawEventReceived { count, .. } => count.map(|c| c as f64),
            MetricPayload::InteractionsReceived { .. }
            | MetricPayload::InteractionReceived { .. }
            | MetricPayload::EventReceived { .. }
            | MetricPayload::ApplicationError { .. }
            | MetricPayload::FeatureUsed { .. } => None,
        }
    }

    /// JSON rendering for verbose logs. Never fails.
    pub fn to_log_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self.kind()))
    }
}
