use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{Candidate, ConflictEntry, FieldValue};

/// Accumulated unresolved conflicts, double-indexed: field name first, QSO
/// identity second. Append-only during the merge pass, read-only after.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ProblemReport {
    by_field: BTreeMap<String, FieldConflicts>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldConflicts {
    /// Number of QSOs with an unresolved conflict on this field.
    pub count: usize,
    pub qsos: BTreeMap<String, QsoConflict>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QsoConflict {
    /// The value kept in the merged output.
    pub selected: FieldValue,
    /// All competing (source, value) pairs, in group order.
    pub candidates: Vec<Candidate>,
}

impl ProblemReport {
    pub fn push(&mut self, entry: ConflictEntry) {
        let field = self.by_field.entry(entry.field).or_default();
        field.qsos.insert(
            entry.qso_id,
            QsoConflict {
                selected: entry.selected,
                candidates: entry.candidates,
            },
        );
        field.count = field.qsos.len();
    }

    /// True when no conflicts occurred anywhere in the run; drives the
    /// CLI exit status.
    pub fn is_empty(&self) -> bool {
        self.by_field.is_empty()
    }

    /// Total conflict entries across all fields.
    pub fn len(&self) -> usize {
        self.by_field.values().map(|f| f.count).sum()
    }

    /// Field names with at least one unresolved conflict.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.by_field.keys().map(String::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&FieldConflicts> {
        self.by_field.get(field)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
