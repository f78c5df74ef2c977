//! Periodic age-based sweep of the ingestion queue.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::IngestionQueue;

/// Sweep cadence and age threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepConfig {
    pub interval: Duration,
    pub retention: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10 * 60),
            retention: Duration::from_secs(60 * 60),
        }
    }
}

/// Spawns the recurring sweep task.
pub struct Sweeper;

impl Sweeper {
    /// Start sweeping `queue` every `cfg.interval`. The first pass runs one
    /// full interval after spawning. Must be called inside a tokio runtime.
    pub fn spawn(queue: Arc<IngestionQueue>, cfg: SweepConfig) -> SweeperHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let passes = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&passes);

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cfg.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        run_pass(&queue, cfg.retention);
                        counter.fetch_add(1, Ordering::Relaxed);
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("metrics sweeper stopped");
        });

        tracing::info!(
            interval_secs = cfg.interval.as_secs(),
            retention_secs = cfg.retention.as_secs(),
            "metrics sweeper started"
        );

        SweeperHandle {
            stop_tx,
            join,
            passes,
        }
    }
}

// A panicking pass is logged and the next tick still fires.
fn run_pass(queue: &IngestionQueue, retention: Duration) {
    match catch_unwind(AssertUnwindSafe(|| queue.sweep(retention))) {
        Ok(0) => {}
        Ok(removed) => tracing::debug!(removed, "swept expired metric entries"),
        Err(_) => tracing::error!("metrics sweep panicked; retrying next period"),
    }
}

/// Owned lifecycle of a running sweeper.
pub struct SweeperHandle {
    stop_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
    passes: Arc<AtomicU64>,
}

impl SweeperHandle {
    /// Completed sweep passes so far.
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }

    /// Stop the timer and wait for the task to exit.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.join.await {
            tracing::warn!(error = %e, "metrics sweeper task did not exit cleanly");
        }
    }
}
