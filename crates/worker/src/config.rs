//! Worker pool configuration.

use std::time::Duration;

use engine_core::{Error, IdentityResolver, Result, DEFAULT_IDENTITY_FIELDS};
use serde::{Deserialize, Serialize};

use crate::retry::BackoffPolicy;

/// Enrichment worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of concurrent fetch workers
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,
    /// Progress checkpoint interval in milliseconds
    #[serde(default = "default_checkpoint_interval_ms")]
    pub checkpoint_interval_ms: u64,
    /// First backoff delay after a rate-limited fetch, in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Upper bound for a single backoff delay, in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Log a progress line every N completed items
    #[serde(default = "default_progress_log_every")]
    pub progress_log_every: usize,
    /// Identity candidate fields, most canonical first
    #[serde(default = "default_identity_fields")]
    pub identity_fields: Vec<String>,
}

fn default_num_workers() -> usize {
    8
}

fn default_checkpoint_interval_ms() -> u64 {
    5_000
}

fn default_initial_backoff_ms() -> u64 {
    1_000
}

fn default_max_backoff_ms() -> u64 {
    60_000
}

fn default_progress_log_every() -> usize {
    100
}

fn default_identity_fields() -> Vec<String> {
    DEFAULT_IDENTITY_FIELDS.iter().map(|s| s.to_string()).collect()
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            num_workers: default_num_workers(),
            checkpoint_interval_ms: default_checkpoint_interval_ms(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            progress_log_every: default_progress_log_every(),
            identity_fields: default_identity_fields(),
        }
    }
}

impl WorkerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(Error::configuration("num_workers must be at least 1"));
        }
        if self.checkpoint_interval_ms == 0 {
            return Err(Error::configuration("checkpoint_interval_ms must be positive"));
        }
        if self.identity_fields.is_empty() {
            return Err(Error::configuration("identity_fields must not be empty"));
        }
        Ok(())
    }

    pub fn checkpoint_interval(&self) -> Duration {
        Duration::from_millis(self.checkpoint_interval_ms)
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
        )
    }

    pub fn identity_resolver(&self) -> IdentityResolver {
        IdentityResolver::new(self.identity_fields.iter().cloned())
    }
}
