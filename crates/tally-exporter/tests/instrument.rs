#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use tally_core::{MetricKind, MetricPayload};
use tally_exporter::instrument::{database_call, is_instrumenting};
use tally_exporter::IngestionQueue;

fn operations(q: &IngestionQueue) -> Vec<(String, String)> {
    q.get(MetricKind::DatabaseOperation)
        .unwrap_or_default()
        .iter()
        .map(|e| match e.payload() {
            MetricPayload::DatabaseOperation {
                model, operation, ..
            } => (model.clone(), operation.clone()),
            other => panic!("unexpected payload: {other:?}"),
        })
        .collect()
}

#[tokio::test]
async fn records_one_entry_and_returns_the_result() {
    let q = IngestionQueue::new();
    let rows = database_call(&q, "User", "findMany", async { vec![1, 2, 3] }).await;

    assert_eq!(rows, vec![1, 2, 3]);
    assert_eq!(operations(&q), vec![("User".into(), "findMany".into())]);
}

#[tokio::test]
async fn flag_is_set_only_inside_the_call() {
    let q = IngestionQueue::new();
    assert!(!is_instrumenting());
    let inside = database_call(&q, "Guild", "upsert", async { is_instrumenting() }).await;
    assert!(inside);
    assert!(!is_instrumenting());
}

#[tokio::test]
async fn nested_calls_record_once() {
    let q = IngestionQueue::new();
    database_call(&q, "User", "update", async {
        // A logging path that writes to the database while the outer call runs.
        database_call(&q, "Log", "create", async {}).await;
    })
    .await;

    assert_eq!(operations(&q), vec![("User".into(), "update".into())]);
}

#[tokio::test(start_paused = true)]
async fn concurrent_calls_each_record() {
    let q = IngestionQueue::new();
    tokio::join!(
        database_call(&q, "User", "findFirst", async {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }),
        database_call(&q, "Guild", "findFirst", async {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }),
    );

    let mut seen = operations(&q);
    seen.sort();
    assert_eq!(
        seen,
        vec![
            ("Guild".into(), "findFirst".into()),
            ("User".into(), "findFirst".into()),
        ]
    );
}

#[tokio::test]
async fn failed_operation_is_still_recorded() {
    let q = IngestionQueue::new();
    let out: Result<(), &str> = database_call(&q, "User", "delete", async { Err("not found") }).await;
    assert!(out.is_err());
    assert_eq!(q.len(), 1);
}
