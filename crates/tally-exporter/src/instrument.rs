//! Producer-side helpers: database call timing and panic reporting.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tally_core::duration::{as_millis_f64, format_duration};
use tally_core::MetricPayload;

use crate::queue::IngestionQueue;

tokio::task_local! {
    // Set while an instrumented database call is being polled.
    static INSTRUMENTING: bool;
}

/// True inside the future of an outer [`database_call`].
pub fn is_instrumenting() -> bool {
    INSTRUMENTING.try_with(|v| *v).unwrap_or(false)
}

/// Await `fut`, timing it, and record a `DatabaseOperation` entry.
///
/// Calls nested inside an instrumented call (a logging or metrics path that
/// queries the database itself) run uninstrumented, so one logical operation
/// is recorded once. The flag is scoped to the future, not the thread, so
/// concurrent calls on the same worker do not see each other's marker.
pub async fn database_call<F, T>(queue: &IngestionQueue, model: &str, operation: &str, fut: F) -> T
where
    F: Future<Output = T>,
{
    if is_instrumenting() {
        return fut.await;
    }

    INSTRUMENTING
        .scope(true, async {
            let started = Instant::now();
            let out = fut.await;
            let elapsed = started.elapsed();

            queue.record(MetricPayload::DatabaseOperation {
                model: model.to_string(),
                operation: operation.to_string(),
                duration_ms: as_millis_f64(elapsed),
            });
            tracing::trace!(
                model,
                operation,
                duration = %format_duration(elapsed),
                "executed database operation"
            );
            out
        })
        .await
}

/// Record every panic as an `ApplicationError` entry, then defer to the
/// previously installed hook.
pub fn install_panic_hook(queue: Arc<IngestionQueue>) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));

        // The panicking thread may hold the queue lock; never wait on it here.
        if !queue.try_record(MetricPayload::ApplicationError {
            name: "panic".to_string(),
            message,
            location,
        }) {
            tracing::warn!("ingestion queue busy; panic not recorded");
        }
        previous(info);
    }));
}
