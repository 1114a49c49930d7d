//! Periodic checkpointing of completed work.

use std::sync::Arc;
use std::time::Duration;

use storage::CheckpointStore;
use telemetry::EnrichmentMetrics;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::state::EnrichedState;

/// Lifecycle of a run as seen by the progress monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    /// Queue is empty and every worker has exited; the finalizer writes the output.
    Drained,
    /// Cancelled by a shutdown signal; the monitor persists what it has and stops.
    Interrupted,
}

/// Snapshots the enriched state to the checkpoint store on a fixed interval.
pub struct ProgressMonitor {
    store: Arc<CheckpointStore>,
    state: Arc<EnrichedState>,
    metrics: Arc<EnrichmentMetrics>,
    interval: Duration,
    total: usize,
    last_saved: usize,
}

impl ProgressMonitor {
    pub fn new(
        store: Arc<CheckpointStore>,
        state: Arc<EnrichedState>,
        metrics: Arc<EnrichmentMetrics>,
        interval: Duration,
        total: usize,
    ) -> Self {
        // Restored entries are already on disk.
        let last_saved = state.len();
        Self {
            store,
            state,
            metrics,
            interval,
            total,
            last_saved,
        }
    }

    pub fn spawn(self, rx: watch::Receiver<RunState>) -> JoinHandle<()> {
        tokio::spawn(self.run(rx))
    }

    async fn run(mut self, mut rx: watch::Receiver<RunState>) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        info!(
            interval_ms = self.interval.as_millis() as u64,
            total = self.total,
            "Progress monitor started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.checkpoint().await;
                }
                changed = rx.changed() => {
                    if changed.is_err() {
                        debug!("Run state sender dropped, stopping monitor");
                        break;
                    }
                    let state = *rx.borrow_and_update();
                    match state {
                        RunState::Running => continue,
                        RunState::Drained => {
                            debug!("Run drained, stopping monitor");
                            break;
                        }
                        RunState::Interrupted => {
                            warn!("Run interrupted, saving final checkpoint");
                            self.checkpoint().await;
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Saves the enriched state if it grew since the last successful save.
    pub async fn checkpoint(&mut self) -> bool {
        if self.state.len() <= self.last_saved {
            return false;
        }
        let snapshot = self.state.snapshot();
        let done = snapshot.len();

        let store = self.store.clone();
        let saved = tokio::task::spawn_blocking(move || store.save(&snapshot))
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "Checkpoint task failed");
                false
            });

        if saved {
            self.last_saved = done;
            self.metrics.checkpoints_saved.inc();
            let metrics = self.metrics.snapshot();
            info!(
                done,
                total = self.total,
                retries = metrics.rate_limited_retries,
                failures = metrics.terminal_failures,
                "Progress checkpoint saved"
            );
        } else {
            self.metrics.checkpoint_errors.inc();
        }
        saved
    }

    pub fn last_saved(&self) -> usize {
        self.last_saved
    }
}
