#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

// The panic hook is process-wide, so this file holds a single test.

use std::sync::Arc;

use tally_core::{MetricKind, MetricPayload};
use tally_exporter::instrument::install_panic_hook;
use tally_exporter::IngestionQueue;

#[test]
fn panics_are_recorded_as_application_errors() {
    let q = Arc::new(IngestionQueue::new());
    install_panic_hook(Arc::clone(&q));

    let caught = std::panic::catch_unwind(|| panic!("boom"));
    assert!(caught.is_err());

    let formatted = std::panic::catch_unwind(|| panic!("bad value {}", 7));
    assert!(formatted.is_err());

    let entries = q.get(MetricKind::ApplicationError).unwrap();
    assert_eq!(entries.len(), 2);

    let messages: Vec<&str> = entries
        .iter()
        .map(|e| match e.payload() {
            MetricPayload::ApplicationError {
                name,
                message,
                location,
            } => {
                assert_eq!(name, "panic");
                assert!(location.as_deref().unwrap().contains("panic_hook.rs"));
                message.as_str()
            }
            other => panic!("unexpected payload: {other:?}"),
        })
        .collect();
    assert_eq!(messages, vec!["boom", "bad value 7"]);
}
