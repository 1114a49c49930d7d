//! Concurrent enrichment engine.
//!
//! A fixed pool of workers drains an in-memory queue of records, fetching
//! supplementary data through an [`engine_core::ItemFetcher`]:
//! - Retry (per-item exponential backoff on rate limiting)
//! - Pool (workers, shared queue, shared enriched state)
//! - Monitor (periodic checkpoint of completed work)
//! - Finalizer (input-ordered output with placeholders)
//! - Engine (resume from checkpoint, run, finalize)

pub mod config;
pub mod engine;
pub mod finalizer;
pub mod monitor;
pub mod pool;
pub mod queue;
pub mod retry;
pub mod state;

pub use config::WorkerConfig;
pub use engine::{Engine, RunSummary};
pub use finalizer::{count_placeholders, finalize};
pub use monitor::{ProgressMonitor, RunState};
pub use pool::{PoolHandle, WorkerPool};
pub use queue::WorkQueue;
pub use retry::*;
pub use state::EnrichedState;
