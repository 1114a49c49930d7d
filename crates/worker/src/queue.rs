//! Shared work queue.

use std::collections::VecDeque;

use engine_core::Record;
use parking_lot::Mutex;

/// In-memory queue of records still to be enriched.
///
/// Every record is handed out exactly once; there is no re-queueing.
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: Mutex<VecDeque<Record>>,
}

impl WorkQueue {
    pub fn new(items: impl IntoIterator<Item = Record>) -> Self {
        Self {
            items: Mutex::new(items.into_iter().collect()),
        }
    }

    /// Takes the next record without waiting.
    pub fn try_pop(&self) -> Option<Record> {
        self.items.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}
