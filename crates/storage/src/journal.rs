//! Journal for tracking changes within a transaction.

use glaze_core::RecordId;
use std::collections::{BTreeMap, BTreeSet};

/// A single journal entry representing a change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JournalEntry {
    Insert { entity: String, id: RecordId },
    Update { entity: String, id: RecordId },
    Delete { entity: String, id: RecordId },
}

impl JournalEntry {
    pub fn entity(&self) -> &str {
        match self {
            JournalEntry::Insert { entity, .. }
            | JournalEntry::Update { entity, .. }
            | JournalEntry::Delete { entity, .. } => entity,
        }
    }

    pub fn id(&self) -> RecordId {
        match self {
            JournalEntry::Insert { id, .. }
            | JournalEntry::Update { id, .. }
            | JournalEntry::Delete { id, .. } => *id,
        }
    }
}

/// Net effect of a transaction on one entity.
#[derive(Clone, Debug, Default)]
pub struct TableDiff {
    added: BTreeSet<RecordId>,
    modified: BTreeSet<RecordId>,
    deleted: BTreeSet<RecordId>,
}

impl TableDiff {
    /// Records an addition.
    pub fn add(&mut self, id: RecordId) {
        // Re-adding a deleted record is a modification.
        if self.deleted.remove(&id) {
            self.modified.insert(id);
        } else {
            self.added.insert(id);
        }
    }

    /// Records a modification.
    pub fn modify(&mut self, id: RecordId) {
        if !self.added.contains(&id) {
            self.modified.insert(id);
        }
    }

    /// Records a deletion.
    pub fn delete(&mut self, id: RecordId) {
        // Added then deleted cancels out.
        if self.added.remove(&id) {
            return;
        }
        self.modified.remove(&id);
        self.deleted.insert(id);
    }

    pub fn added(&self) -> &BTreeSet<RecordId> {
        &self.added
    }

    pub fn modified(&self) -> &BTreeSet<RecordId> {
        &self.modified
    }

    pub fn deleted(&self) -> &BTreeSet<RecordId> {
        &self.deleted
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}

/// Ordered log plus per-entity net diffs.
#[derive(Debug, Default)]
pub struct Journal {
    diffs: BTreeMap<String, TableDiff>,
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_insert(&mut self, entity: &str, id: RecordId) {
        self.diff_mut(entity).add(id);
        self.entries.push(JournalEntry::Insert {
            entity: entity.into(),
            id,
        });
    }

    pub fn record_update(&mut self, entity: &str, id: RecordId) {
        self.diff_mut(entity).modify(id);
        self.entries.push(JournalEntry::Update {
            entity: entity.into(),
            id,
        });
    }

    pub fn record_delete(&mut self, entity: &str, id: RecordId) {
        self.diff_mut(entity).delete(id);
        self.entries.push(JournalEntry::Delete {
            entity: entity.into(),
            id,
        });
    }

    fn diff_mut(&mut self, entity: &str) -> &mut TableDiff {
        self.diffs.entry(entity.to_string()).or_default()
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn diff(&self, entity: &str) -> Option<&TableDiff> {
        self.diffs.get(entity)
    }

    /// Entities with a non-empty net diff.
    pub fn changed_entities(&self) -> BTreeSet<String> {
        self.diffs
            .iter()
            .filter(|(_, d)| !d.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Returns true if the journal has recorded nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if the recorded operations have a net effect.
    pub fn has_net_changes(&self) -> bool {
        self.diffs.values().any(|d| !d.is_empty())
    }

    /// Net counts of (inserted, updated, deleted) records.
    pub fn totals(&self) -> (usize, usize, usize) {
        self.diffs.values().fold((0, 0, 0), |(a, m, d), diff| {
            (
                a + diff.added.len(),
                m + diff.modified.len(),
                d + diff.deleted.len(),
            )
        })
    }

    pub fn clear(&mut self) {
        self.diffs.clear();
        self.entries.clear();
    }
}
