//! Assembles the final output in input order.

use engine_core::{placeholder_for, IdentityResolver, Record};
use storage::CheckpointMap;

/// Builds one output record per input record, in input order.
///
/// Inputs with an enrichment result get it; everything else (no identity,
/// or never processed) gets a placeholder built from the input itself.
pub fn finalize(
    inputs: &[Record],
    entries: &CheckpointMap,
    resolver: &IdentityResolver,
) -> Vec<Record> {
    inputs
        .iter()
        .map(|input| {
            resolver
                .resolve(input)
                .and_then(|key| entries.get(&key))
                .cloned()
                .unwrap_or_else(|| placeholder_for(input))
        })
        .collect()
}

/// Counts how many of `inputs` were finalized with a placeholder.
pub fn count_placeholders(
    inputs: &[Record],
    entries: &CheckpointMap,
    resolver: &IdentityResolver,
) -> usize {
    inputs
        .iter()
        .filter(|input| {
            resolver
                .resolve(input)
                .map_or(true, |key| !entries.contains_key(&key))
        })
        .count()
}
