//! Field-level comparison of repeated observations of one identifier.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One field whose value differs between two snapshots of the same item.
///
/// A field missing on one side is a difference; the missing side is `None`
/// (serialized as `null`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    /// Top-level field name.
    pub field: String,
    /// Value in the first-seen snapshot.
    pub value1: Option<Value>,
    /// Value in the later snapshot.
    pub value2: Option<Value>,
}

/// Compares two snapshots over the union of their top-level keys.
///
/// Fields are reported in key order. Non-object snapshots are compared as a
/// whole under the empty field name.
#[must_use]
pub fn diff_snapshots(first: &Value, later: &Value) -> Vec<FieldDiff> {
    let (Some(left), Some(right)) = (first.as_object(), later.as_object()) else {
        if first == later {
            return Vec::new();
        }
        return vec![FieldDiff {
            field: String::new(),
            value1: Some(first.clone()),
            value2: Some(later.clone()),
        }];
    };

    let keys: BTreeSet<&String> = left.keys().chain(right.keys()).collect();
    keys.into_iter()
        .filter_map(|key| {
            let value1 = left.get(key);
            let value2 = right.get(key);
            (value1 != value2).then(|| FieldDiff {
                field: key.clone(),
                value1: value1.cloned(),
                value2: value2.cloned(),
            })
        })
        .collect()
}

/// One observation of an identifier: where it came from and what it said.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    /// Partition (query fragment) that returned the record.
    pub partition: String,
    /// Full raw record.
    pub snapshot: Value,
}

/// Classification of an identifier's observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateClass {
    /// Observed exactly once.
    Unique,
    /// Observed repeatedly, every snapshot identical to the first.
    Consistent,
    /// Observed repeatedly with at least one field disagreement.
    Divergent,
}

/// Read-only view over every occurrence of one identifier.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateObservation<'a> {
    /// The identifier.
    pub id: &'a str,
    /// Occurrences in observation order; the first is the reference snapshot.
    pub occurrences: &'a [Occurrence],
}

impl DuplicateObservation<'_> {
    /// Diffs of every later occurrence against the first, merged by field.
    ///
    /// Each field appears once, paired with the first later value that
    /// disagreed with the reference snapshot.
    #[must_use]
    pub fn diffs(&self) -> Vec<FieldDiff> {
        let Some((first, later)) = self.occurrences.split_first() else {
            return Vec::new();
        };
        let mut merged: Vec<FieldDiff> = Vec::new();
        for occurrence in later {
            for diff in diff_snapshots(&first.snapshot, &occurrence.snapshot) {
                if !merged.iter().any(|existing| existing.field == diff.field) {
                    merged.push(diff);
                }
            }
        }
        merged.sort_by(|a, b| a.field.cmp(&b.field));
        merged
    }

    /// Classifies the observation.
    #[must_use]
    pub fn class(&self) -> DuplicateClass {
        if self.occurrences.len() <= 1 {
            DuplicateClass::Unique
        } else if self.diffs().is_empty() {
            DuplicateClass::Consistent
        } else {
            DuplicateClass::Divergent
        }
    }

    /// Partitions of every occurrence, in order (may repeat).
    #[must_use]
    pub fn partitions(&self) -> Vec<String> {
        self.occurrences
            .iter()
            .map(|occurrence| occurrence.partition.clone())
            .collect()
    }
}
