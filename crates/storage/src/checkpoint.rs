//! Checkpoint store backed by the output file.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine_core::{IdentityResolver, Record};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::atomic::write_records_atomic;

/// Completed enrichment results keyed by identity.
pub type CheckpointMap = BTreeMap<String, Record>;

/// Durable mapping from identity key to enrichment result.
///
/// Loading never fails: a missing or unreadable checkpoint only costs
/// re-fetching. Saving never fails loudly either; the previous file is kept.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
    resolver: IdentityResolver,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>, resolver: IdentityResolver) -> Self {
        Self {
            path: path.into(),
            resolver,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Restores previously completed results.
    ///
    /// Returns an empty map when the file is missing, malformed, or not a
    /// JSON array. Entries without an identity are skipped; on duplicate
    /// identities the later entry wins.
    pub fn load(&self) -> CheckpointMap {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No checkpoint found, starting fresh");
                return CheckpointMap::new();
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to read checkpoint");
                return CheckpointMap::new();
            }
        };

        let items = match serde_json::from_str::<Value>(&content) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                error!(path = %self.path.display(), "Checkpoint is not a list, ignoring it");
                return CheckpointMap::new();
            }
            Err(e) => {
                error!(
                    path = %self.path.display(),
                    error = %e,
                    "Checkpoint is malformed, ignoring it"
                );
                return CheckpointMap::new();
            }
        };

        let mut restored = CheckpointMap::new();
        let mut skipped = 0usize;
        for item in items {
            let Value::Object(record) = item else {
                skipped += 1;
                continue;
            };
            match self.resolver.resolve(&record) {
                Some(key) => {
                    restored.insert(key, record);
                }
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(skipped, "Ignored checkpoint entries without identity");
        }
        info!(
            path = %self.path.display(),
            restored = restored.len(),
            "Loaded checkpoint"
        );
        restored
    }

    /// Persists `records` atomically, returning whether the write succeeded.
    pub fn save<'a, I>(&self, records: I) -> bool
    where
        I: IntoIterator<Item = &'a Record>,
    {
        match write_records_atomic(&self.path, records) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Checkpoint saved");
                true
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to save checkpoint");
                false
            }
        }
    }
}
