//! Diff computation for journal entries.
//!
//! Open records are compared on their top-level keys only; the concept
//! graph is compared on its node-id set.

use iqraa_core::memory::{ConceptGraph, Record};
use iqraa_core::KeyDiff;
use serde_json::Value;
use std::collections::BTreeSet;

/// Added, updated and removed top-level keys between two records.
///
/// A key is updated when present in both with structurally different values.
/// Key lists come out sorted.
pub fn key_diff(before: &Record, after: &Record) -> KeyDiff {
    let mut diff = KeyDiff::default();

    for (key, value) in after {
        match before.get(key) {
            None => diff.added_keys.push(key.clone()),
            Some(previous) if previous != value => diff.updated_keys.push(key.clone()),
            Some(_) => {}
        }
    }

    diff.removed_keys = before
        .keys()
        .filter(|key| !after.contains_key(*key))
        .cloned()
        .collect();

    diff
}

/// [`key_diff`] over arbitrary values; non-objects count as empty records.
pub fn value_key_diff(before: &Value, after: &Value) -> KeyDiff {
    let empty = Record::new();
    key_diff(
        before.as_object().unwrap_or(&empty),
        after.as_object().unwrap_or(&empty),
    )
}

/// Node ids present in exactly one of the two graphs, sorted.
///
/// Payload changes on nodes present in both graphs are not reported.
pub fn changed_concepts(before: &ConceptGraph, after: &ConceptGraph) -> Vec<String> {
    let old: BTreeSet<&String> = before.nodes.keys().collect();
    let new: BTreeSet<&String> = after.nodes.keys().collect();
    old.symmetric_difference(&new)
        .map(|id| (*id).clone())
        .collect()
}
