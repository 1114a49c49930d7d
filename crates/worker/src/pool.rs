//! Fixed-size pool of fetch workers draining the shared queue.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use engine_core::IdentityResolver;
use telemetry::EnrichmentMetrics;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::queue::WorkQueue;
use crate::retry::RetryController;
use crate::state::EnrichedState;

/// Worker pool.
///
/// Each worker pops records until the queue is empty, then exits. Workers
/// share nothing but the queue, the enriched state and the metrics.
pub struct WorkerPool {
    queue: Arc<WorkQueue>,
    state: Arc<EnrichedState>,
    controller: Arc<RetryController>,
    resolver: IdentityResolver,
    metrics: Arc<EnrichmentMetrics>,
    num_workers: usize,
    progress_log_every: usize,
    /// Items queued for this run.
    total: usize,
    /// Items finished by this run, restored entries excluded.
    completed: AtomicUsize,
}

impl WorkerPool {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: Arc<WorkQueue>,
        state: Arc<EnrichedState>,
        controller: Arc<RetryController>,
        resolver: IdentityResolver,
        metrics: Arc<EnrichmentMetrics>,
        num_workers: usize,
        progress_log_every: usize,
        total: usize,
    ) -> Self {
        Self {
            queue,
            state,
            controller,
            resolver,
            metrics,
            num_workers,
            progress_log_every,
            total,
            completed: AtomicUsize::new(0),
        }
    }

    /// Starts all workers.
    pub fn spawn(self: Arc<Self>) -> PoolHandle {
        if self.queue.is_empty() {
            debug!("Nothing to enrich");
        }
        info!(
            workers = self.num_workers,
            queued = self.queue.len(),
            "Starting enrichment workers"
        );
        self.metrics.queue_depth.set(self.queue.len() as u64);

        let handles = (0..self.num_workers)
            .map(|worker_id| {
                let pool = self.clone();
                self.metrics.active_workers.inc();
                tokio::spawn(async move { pool.run_worker(worker_id).await })
            })
            .collect();

        PoolHandle { handles }
    }

    async fn run_worker(&self, worker_id: usize) {
        let _active = ActiveWorker(&self.metrics);
        debug!(worker_id, "Worker started");

        while let Some(record) = self.queue.try_pop() {
            self.metrics.queue_depth.set(self.queue.len() as u64);

            let Some(identity) = self.resolver.resolve(&record) else {
                self.metrics.items_without_identity.inc();
                warn!(
                    worker_id,
                    fields = ?self.resolver.fields(),
                    "Record has no identity, leaving it to the finalizer"
                );
                continue;
            };

            let outcome = self.controller.fetch(worker_id, &identity, &record).await;
            if outcome.is_enriched() {
                self.metrics.items_enriched.inc();
            } else {
                self.metrics.items_placeholder.inc();
            }

            let mut result = outcome.into_record();
            self.resolver.restore_identity(&record, &mut result);
            self.state.insert(identity, result);

            let done = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
            if self.progress_log_every > 0 && done % self.progress_log_every == 0 {
                info!(done, total = self.total, "Enrichment progress");
            }
        }

        debug!(worker_id, "Queue drained, worker exiting");
    }
}

/// Keeps the active-worker gauge accurate even if a worker panics.
struct ActiveWorker<'a>(&'a EnrichmentMetrics);

impl Drop for ActiveWorker<'_> {
    fn drop(&mut self) {
        self.0.active_workers.dec();
    }
}

/// Join handles of a running pool.
pub struct PoolHandle {
    handles: Vec<JoinHandle<()>>,
}

impl PoolHandle {
    /// Waits for every worker to exit, returning how many panicked.
    ///
    /// Cancel safe: workers already awaited are not awaited again.
    pub async fn join(&mut self) -> usize {
        let mut panicked = 0;
        while let Some(handle) = self.handles.last_mut() {
            let result = handle.await;
            self.handles.pop();
            if let Err(e) = result {
                if e.is_panic() {
                    panicked += 1;
                    error!(error = %e, "Enrichment worker panicked");
                }
            }
        }
        panicked
    }

    /// Cancels workers that are still running.
    pub fn abort(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
