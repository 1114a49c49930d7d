//! Enrichment run metrics.
//!
//! One [`EnrichmentMetrics`] instance is shared by the workers and the
//! progress monitor of a single run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrements and returns the new value.
    pub fn dec(&self) -> u64 {
        self.0.fetch_sub(1, Ordering::Relaxed).saturating_sub(1)
    }
}

/// Histogram for fetch latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s, 30s, 60s, +inf
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [
        50,
        100,
        250,
        500,
        1000,
        2500,
        5000,
        10000,
        30000,
        60000,
        u64::MAX,
    ];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let bucket = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len() - 1);
        self.buckets[bucket].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Upper bound and count of every bucket, `u64::MAX` last.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for one enrichment run.
#[derive(Debug, Default)]
pub struct EnrichmentMetrics {
    // Item outcomes
    pub items_enriched: Counter,
    pub items_placeholder: Counter,
    pub items_without_identity: Counter,

    // Fetch attempts
    pub fetch_attempts: Counter,
    pub rate_limited_retries: Counter,
    pub terminal_failures: Counter,
    pub missing_precondition: Counter,

    // Checkpoints
    pub checkpoints_saved: Counter,
    pub checkpoint_errors: Counter,

    pub fetch_latency_ms: Histogram,

    // Gauges
    pub queue_depth: Gauge,
    pub active_workers: Gauge,
}

impl EnrichmentMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items that reached a final outcome in this run.
    pub fn items_done(&self) -> u64 {
        self.items_enriched.get() + self.items_placeholder.get()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub items_enriched: u64,
    pub items_placeholder: u64,
    pub items_without_identity: u64,
    pub fetch_attempts: u64,
    pub rate_limited_retries: u64,
    pub terminal_failures: u64,
    pub missing_precondition: u64,
    pub checkpoints_saved: u64,
    pub checkpoint_errors: u64,
    pub fetch_latency_mean_ms: f64,
    pub fetch_latency_buckets: Vec<(u64, u64)>,
    pub queue_depth: u64,
    pub active_workers: u64,
}

impl EnrichmentMetrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            items_enriched: self.items_enriched.get(),
            items_placeholder: self.items_placeholder.get(),
            items_without_identity: self.items_without_identity.get(),
            fetch_attempts: self.fetch_attempts.get(),
            rate_limited_retries: self.rate_limited_retries.get(),
            terminal_failures: self.terminal_failures.get(),
            missing_precondition: self.missing_precondition.get(),
            checkpoints_saved: self.checkpoints_saved.get(),
            checkpoint_errors: self.checkpoint_errors.get(),
            fetch_latency_mean_ms: self.fetch_latency_ms.mean(),
            fetch_latency_buckets: self.fetch_latency_ms.buckets(),
            queue_depth: self.queue_depth.get(),
            active_workers: self.active_workers.get(),
        }
    }
}
