//! Run orchestration: load, resume, enrich, checkpoint, finalize.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use engine_core::{Error, IdentityResolver, ItemFetcher, Record, Result};
use serde::Serialize;
use storage::{load_input, write_records_atomic, CheckpointMap, CheckpointStore, StorageConfig};
use telemetry::{EnrichmentMetrics, MetricsSnapshot};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::WorkerConfig;
use crate::finalizer::{count_placeholders, finalize};
use crate::monitor::{ProgressMonitor, RunState};
use crate::pool::WorkerPool;
use crate::queue::WorkQueue;
use crate::retry::RetryController;
use crate::state::EnrichedState;

/// Outcome of one engine run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Records in the input file
    pub total_inputs: usize,
    /// Distinct identities restored from the checkpoint
    pub already_done: usize,
    /// Records handed to the worker pool
    pub enqueued: usize,
    /// Input records sharing an identity with an earlier record
    pub duplicates: usize,
    /// Items fetched successfully in this run
    pub enriched: u64,
    /// Items whose fetch ended in a placeholder in this run
    pub failed: u64,
    /// Output records filled in by the finalizer for lack of a result
    pub placeholders: usize,
    pub interrupted: bool,
    pub output_written: bool,
    pub metrics: MetricsSnapshot,
}

/// Split of the input into work still to do and work already done.
#[derive(Debug, Default)]
struct WorkPlan {
    queue: Vec<Record>,
    already_done: usize,
    duplicates: usize,
    distinct: usize,
}

impl WorkPlan {
    /// Queues each identity once, skipping identities restored from the
    /// checkpoint. Records without identity are queued so the pool can
    /// report them.
    fn build(inputs: &[Record], restored: &CheckpointMap, resolver: &IdentityResolver) -> Self {
        let mut plan = Self::default();
        let mut seen = HashSet::new();

        for input in inputs {
            let Some(key) = resolver.resolve(input) else {
                plan.queue.push(input.clone());
                continue;
            };
            if restored.contains_key(&key) {
                if seen.insert(key) {
                    plan.already_done += 1;
                }
                continue;
            }
            if seen.insert(key) {
                plan.queue.push(input.clone());
            } else {
                plan.duplicates += 1;
            }
        }

        plan.distinct = seen.len();
        plan
    }
}

/// The enrichment engine.
pub struct Engine {
    worker: WorkerConfig,
    storage: StorageConfig,
    fetcher: Arc<dyn ItemFetcher>,
    resolver: IdentityResolver,
}

impl Engine {
    pub fn new(
        worker: WorkerConfig,
        storage: StorageConfig,
        fetcher: Arc<dyn ItemFetcher>,
    ) -> Result<Self> {
        worker.validate()?;
        let resolver = worker.identity_resolver();
        Ok(Self {
            worker,
            storage,
            fetcher,
            resolver,
        })
    }

    /// Runs until the queue drains.
    pub async fn run(&self) -> Result<RunSummary> {
        self.run_until(std::future::pending()).await
    }

    /// Runs until the queue drains or `shutdown` resolves.
    ///
    /// On shutdown the in-flight fetches are not awaited: the current state is
    /// checkpointed once more and the summary is returned with
    /// `interrupted = true`. The next run resumes from that checkpoint.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<RunSummary>
    where
        F: Future<Output = ()>,
    {
        let inputs = load_input(&self.storage.input_path)?;
        let store = Arc::new(CheckpointStore::new(
            self.storage.output_path.clone(),
            self.resolver.clone(),
        ));
        let restored = store.load();

        let plan = WorkPlan::build(&inputs, &restored, &self.resolver);
        let enqueued = plan.queue.len();
        info!(
            total = inputs.len(),
            already_done = plan.already_done,
            enqueued,
            duplicates = plan.duplicates,
            "Planned enrichment run"
        );

        let metrics = Arc::new(EnrichmentMetrics::new());
        let state = Arc::new(EnrichedState::from_checkpoint(restored));
        if !state.is_empty() {
            info!(restored = state.len(), "Resuming from checkpoint");
        }
        let controller = Arc::new(RetryController::new(
            self.fetcher.clone(),
            self.worker.backoff_policy(),
            metrics.clone(),
        ));

        let (tx, rx) = watch::channel(RunState::Running);
        let monitor = ProgressMonitor::new(
            store,
            state.clone(),
            metrics.clone(),
            self.worker.checkpoint_interval(),
            plan.distinct,
        )
        .spawn(rx);

        let pool = Arc::new(WorkerPool::new(
            Arc::new(WorkQueue::new(plan.queue)),
            state.clone(),
            controller,
            self.resolver.clone(),
            metrics.clone(),
            self.worker.num_workers,
            self.worker.progress_log_every,
            enqueued,
        ));
        let mut workers = pool.spawn();

        let interrupted = tokio::select! {
            panicked = workers.join() => {
                if panicked > 0 {
                    warn!(panicked, "Some workers panicked, their items will get placeholders");
                }
                false
            }
            _ = shutdown => true,
        };

        let mut summary = RunSummary {
            total_inputs: inputs.len(),
            already_done: plan.already_done,
            enqueued,
            duplicates: plan.duplicates,
            enriched: 0,
            failed: 0,
            placeholders: 0,
            interrupted,
            output_written: false,
            metrics: metrics.snapshot(),
        };

        if interrupted {
            warn!(
                in_flight = workers.len(),
                done = state.len(),
                "Shutdown requested, saving progress before exit"
            );
            let _ = tx.send(RunState::Interrupted);
            if let Err(e) = monitor.await {
                error!(error = %e, "Progress monitor failed during shutdown");
            }
            workers.abort();
            summary.enriched = metrics.items_enriched.get();
            summary.failed = metrics.items_placeholder.get();
            summary.metrics = metrics.snapshot();
            return Ok(summary);
        }

        let _ = tx.send(RunState::Drained);
        if let Err(e) = monitor.await {
            error!(error = %e, "Progress monitor failed");
        }

        let (output, placeholders) = state.read(|entries| {
            (
                finalize(&inputs, entries, &self.resolver),
                count_placeholders(&inputs, entries, &self.resolver),
            )
        });
        self.write_output(output).await?;

        summary.enriched = metrics.items_enriched.get();
        summary.failed = metrics.items_placeholder.get();
        summary.placeholders = placeholders;
        summary.output_written = true;
        summary.metrics = metrics.snapshot();

        info!(
            total = summary.total_inputs,
            done = metrics.items_done(),
            enriched = summary.enriched,
            failed = summary.failed,
            placeholders,
            path = %self.storage.output_path.display(),
            "Enrichment complete"
        );
        Ok(summary)
    }

    async fn write_output(&self, output: Vec<Record>) -> Result<()> {
        let path = self.storage.output_path.clone();
        tokio::task::spawn_blocking(move || write_records_atomic(&path, &output))
            .await
            .map_err(|e| Error::internal(format!("output writer task failed: {e}")))?
            .map_err(|e| {
                error!(
                    path = %self.storage.output_path.display(),
                    error = %e,
                    "Failed to write final output"
                );
                Error::output_write(self.storage.output_path.clone(), e.to_string())
            })
    }
}
