//! Enriched state shared by the workers, the monitor, and the finalizer.

use std::sync::atomic::{AtomicUsize, Ordering};

use engine_core::Record;
use parking_lot::Mutex;
use storage::CheckpointMap;

/// Identity key to enrichment result, accumulated across the run.
///
/// Starts from the restored checkpoint and only grows. All mutation happens
/// under one lock; `len` is mirrored in an atomic so the monitor can poll it
/// without contending with workers.
#[derive(Debug, Default)]
pub struct EnrichedState {
    entries: Mutex<CheckpointMap>,
    len: AtomicUsize,
}

impl EnrichedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_checkpoint(entries: CheckpointMap) -> Self {
        let len = entries.len();
        Self {
            entries: Mutex::new(entries),
            len: AtomicUsize::new(len),
        }
    }

    /// Inserts or overwrites the result for `key`, returning the new size.
    pub fn insert(&self, key: String, result: Record) -> usize {
        let mut entries = self.entries.lock();
        entries.insert(key, result);
        let len = entries.len();
        self.len.store(len, Ordering::Release);
        len
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies all results, ordered by key.
    pub fn snapshot(&self) -> Vec<Record> {
        self.entries.lock().values().cloned().collect()
    }

    /// Runs `f` against the entries while holding the lock.
    pub fn read<T>(&self, f: impl FnOnce(&CheckpointMap) -> T) -> T {
        f(&self.entries.lock())
    }
}
