//! Retry and backoff around a single item fetch.
//!
//! Rate limiting and transient unavailability are retried without an attempt
//! cap, sleeping `min(max, backoff)` and doubling `backoff` each time. The
//! backoff state belongs to one item, so a congested item never slows down
//! the other workers. Every other failure ends the item with a placeholder.

use std::sync::Arc;
use std::time::{Duration, Instant};

use engine_core::{placeholder_for, FailureClass, ItemFetcher, Record};
use telemetry::EnrichmentMetrics;
use tracing::{debug, warn};

/// Backoff bounds for rate-limited fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub max: Duration,
}

impl BackoffPolicy {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { initial, max }
    }

    /// Fresh backoff state for one item.
    pub fn start(&self) -> Backoff {
        Backoff {
            current: self.initial,
            max: self.max,
            retries: 0,
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(60),
        }
    }
}

/// Per-item exponential backoff.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    max: Duration,
    retries: u32,
}

impl Backoff {
    /// Delay before the next retry; the Nth call returns `min(max, initial * 2^(N-1))`.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current.min(self.max);
        self.current = self.current.checked_mul(2).unwrap_or(self.max).min(self.max);
        self.retries += 1;
        delay
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }
}

/// Why an item ended without fetched data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderReason {
    MissingPrecondition,
    Terminal,
}

/// Final result of fetching one item.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Enriched(Record),
    Placeholder {
        record: Record,
        reason: PlaceholderReason,
    },
}

impl FetchOutcome {
    pub fn into_record(self) -> Record {
        match self {
            Self::Enriched(record) | Self::Placeholder { record, .. } => record,
        }
    }

    pub fn is_enriched(&self) -> bool {
        matches!(self, Self::Enriched(_))
    }
}

/// Wraps an [`ItemFetcher`] with failure classification and backoff.
pub struct RetryController {
    fetcher: Arc<dyn ItemFetcher>,
    policy: BackoffPolicy,
    metrics: Arc<EnrichmentMetrics>,
}

impl RetryController {
    pub fn new(
        fetcher: Arc<dyn ItemFetcher>,
        policy: BackoffPolicy,
        metrics: Arc<EnrichmentMetrics>,
    ) -> Self {
        Self {
            fetcher,
            policy,
            metrics,
        }
    }

    /// Fetches `record` until it succeeds or fails for a non-transient reason.
    pub async fn fetch(&self, worker_id: usize, identity: &str, record: &Record) -> FetchOutcome {
        let mut backoff = self.policy.start();

        loop {
            self.metrics.fetch_attempts.inc();
            let started = Instant::now();
            let result = self.fetcher.fetch(record).await;
            self.metrics
                .fetch_latency_ms
                .observe(started.elapsed().as_millis() as u64);

            let err = match result {
                Ok(payload) => {
                    debug!(worker_id, identity, retries = backoff.retries(), "Fetched product");
                    return FetchOutcome::Enriched(payload.merge_into(record));
                }
                Err(err) => err,
            };

            match err.class() {
                FailureClass::Retryable => {
                    let delay = backoff.next_delay();
                    self.metrics.rate_limited_retries.inc();
                    warn!(
                        worker_id,
                        identity,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Rate limited, sleeping and retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                FailureClass::MissingPrecondition => {
                    self.metrics.missing_precondition.inc();
                    warn!(worker_id, identity, error = %err, "Cannot fetch product");
                    return FetchOutcome::Placeholder {
                        record: placeholder_for(record),
                        reason: PlaceholderReason::MissingPrecondition,
                    };
                }
                FailureClass::Terminal => {
                    self.metrics.terminal_failures.inc();
                    warn!(
                        worker_id,
                        identity,
                        fetcher = self.fetcher.name(),
                        error = %err,
                        "Error fetching product"
                    );
                    return FetchOutcome::Placeholder {
                        record: placeholder_for(record),
                        reason: PlaceholderReason::Terminal,
                    };
                }
            }
        }
    }
}
