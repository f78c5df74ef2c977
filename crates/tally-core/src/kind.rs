//! Closed set of metric kinds.

use std::fmt;

use serde::Serialize;

/// One measured phenomenon. The set is fixed at compile time; every kind has a
/// matching [`MetricPayload`](crate::payload::MetricPayload) variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    InteractionsReceived,
    InteractionReceived,
    CommandExecuted,
    EventExecuted,
    RawEventReceived,
    EventReceived,
    MetricsQueueLength,
    MetricsQueueLengthByMetric,
    MetricsGenerationTime,
    PlatformLatency,
    ApplicationError,
    FeatureUsed,
    HttpServerRequests,
    DatabaseOperation,
}

impl MetricKind {
    /// Every kind, in declaration order.
    pub const ALL: [MetricKind; 14] = [
        MetricKind::InteractionsReceived,
        MetricKind::InteractionReceived,
        MetricKind::CommandExecuted,
        MetricKind::EventExecuted,
        MetricKind::RawEventReceived,
        MetricKind::EventReceived,
        MetricKind::MetricsQueueLength,
        MetricKind::MetricsQueueLengthByMetric,
        MetricKind::MetricsGenerationTime,
        MetricKind::PlatformLatency,
        MetricKind::ApplicationError,
        MetricKind::FeatureUsed,
        MetricKind::HttpServerRequests,
        MetricKind::DatabaseOperation,
    ];

    /// Stable identifier, also used as the `metric` label value.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::InteractionsReceived => "interactions_received",
            MetricKind::InteractionReceived => "interaction_received",
            MetricKind::CommandExecuted => "command_executed",
            MetricKind::EventExecuted => "event_executed",
            MetricKind::RawEventReceived => "raw_event_received",
            MetricKind::EventReceived => "event_received",
            MetricKind::MetricsQueueLength => "metrics_queue_length",
            MetricKind::MetricsQueueLengthByMetric => "metrics_queue_length_by_metric",
            MetricKind::MetricsGenerationTime => "metrics_generation_time",
            MetricKind::PlatformLatency => "platform_latency",
            MetricKind::ApplicationError => "application_error",
            MetricKind::FeatureUsed => "feature_used",
            MetricKind::HttpServerRequests => "http_server_requests",
            MetricKind::DatabaseOperation => "database_operation",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
