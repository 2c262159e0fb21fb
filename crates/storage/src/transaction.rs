//! Write transactions over a store.

use crate::engine::Engine;
use crate::journal::Journal;
use crate::lock::WriterGuard;
use crate::snapshot::{Snapshot, Stored, Tables};
use crate::store::Store;
use glaze_core::schema::Model;
use glaze_core::{ContextId, Error, Record, RecordId, Result};
use glaze_query::Query;
use hashbrown::HashSet;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Net result of a successful commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitSummary {
    pub seq: u64,
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub entities: BTreeSet<String>,
}

/// A write transaction holding the store's writer gate.
///
/// Changes are staged on a private copy of the committed tables and become
/// visible to readers only on `commit`. The transaction stays usable after a
/// commit; dropping it discards anything staged since.
pub struct Transaction<'s, E: Engine> {
    store: &'s Store<E>,
    _guard: WriterGuard<'s>,
    context: ContextId,
    base: Arc<Snapshot<E::Native>>,
    working: Tables<E::Native>,
    journal: Journal,
    /// Ids removed by this transaction, committed or not.
    removed: HashSet<RecordId>,
    pending_removed: Vec<RecordId>,
}

impl<'s, E: Engine> Transaction<'s, E> {
    pub(crate) fn new(
        store: &'s Store<E>,
        guard: WriterGuard<'s>,
        context: ContextId,
        base: Arc<Snapshot<E::Native>>,
    ) -> Self {
        Self {
            store,
            _guard: guard,
            context,
            working: base.tables().clone(),
            base,
            journal: Journal::new(),
            removed: HashSet::new(),
            pending_removed: Vec::new(),
        }
    }

    /// Context id stamped on every record this transaction hands out.
    #[inline]
    pub fn id(&self) -> ContextId {
        self.context
    }

    #[inline]
    pub fn model(&self) -> &Model {
        self.store.model()
    }

    /// Creates an unsaved record of `entity` owned by this transaction.
    ///
    /// The record is not staged until passed to `insert`.
    pub fn new_record(&self, entity: &str) -> Result<Record> {
        let schema = self.store.model().require(entity)?;
        Ok(Record::new(Arc::clone(schema), self.store.allocate_id()).bind(self.context))
    }

    /// Evaluates a query against this transaction's staged state.
    pub fn fetch(&self, query: &Query) -> Result<Vec<Record>> {
        let schema = self.store.model().require(query.entity())?;
        query.validate(schema)?;
        let records = match self.working.get(query.entity()) {
            Some(table) => table
                .iter()
                .map(|(id, s)| self.store.engine().decode(schema, *id, s.version, &s.native))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        Ok(query
            .execute(records)
            .into_iter()
            .map(|r| r.bind(self.context))
            .collect())
    }

    fn check_owned(&self, record: &Record) -> Result<()> {
        if record.context() != self.context {
            return Err(Error::stale_record(
                record.entity(),
                record.id(),
                "record belongs to a different context",
            ));
        }
        if self.removed.contains(&record.id()) {
            return Err(Error::stale_record(
                record.entity(),
                record.id(),
                "record was removed",
            ));
        }
        let schema = self.store.model().require(record.entity())?;
        if !Arc::ptr_eq(schema, record.schema()) && **schema != **record.schema() {
            return Err(Error::schema(format!(
                "record schema for `{}` differs from the model",
                record.entity()
            )));
        }
        Ok(())
    }

    /// Stages an insert, or an update if the record is already stored.
    pub fn insert(&mut self, record: &Record) -> Result<()> {
        self.check_owned(record)?;
        let native = self.store.engine().encode(record)?;
        let entity = record.entity();
        let id = record.id();
        let version = self
            .base
            .table(entity)
            .and_then(|t| t.get(&id))
            .map(|s| s.version + 1)
            .unwrap_or(1);

        let table = Arc::make_mut(self.working.entry(entity.to_string()).or_default());
        if table.insert(id, Stored { version, native }).is_some() {
            self.journal.record_update(entity, id);
        } else {
            self.journal.record_insert(entity, id);
        }
        Ok(())
    }

    fn check_removable(&self, record: &Record) -> Result<()> {
        self.check_owned(record)?;
        let present = self
            .working
            .get(record.entity())
            .is_some_and(|t| t.contains_key(&record.id()));
        if !present {
            return Err(Error::stale_record(
                record.entity(),
                record.id(),
                "record is not stored",
            ));
        }
        Ok(())
    }

    fn stage_removal(&mut self, record: &Record) {
        let entity = record.entity();
        let id = record.id();
        if let Some(table) = self.working.get_mut(entity) {
            Arc::make_mut(table).remove(&id);
        }
        self.journal.record_delete(entity, id);
        self.removed.insert(id);
        self.pending_removed.push(id);
    }

    /// Stages the removal of a stored record.
    pub fn remove(&mut self, record: &Record) -> Result<()> {
        self.check_removable(record)?;
        self.stage_removal(record);
        Ok(())
    }

    /// Stages the removal of every record, or of none if any is stale.
    pub fn remove_all<'r>(&mut self, records: impl IntoIterator<Item = &'r Record>) -> Result<()> {
        let records: Vec<&Record> = records.into_iter().collect();
        let mut batch = HashSet::with_capacity(records.len());
        for record in &records {
            self.check_removable(record)?;
            if !batch.insert(record.id()) {
                return Err(Error::stale_record(
                    record.entity(),
                    record.id(),
                    "record appears twice in the batch",
                ));
            }
        }
        for record in records {
            self.stage_removal(record);
        }
        Ok(())
    }

    /// Returns true if staged operations would change committed state.
    pub fn has_changes(&self) -> bool {
        self.journal.has_net_changes()
    }

    /// Number of operations staged since the last commit.
    pub fn pending(&self) -> usize {
        self.journal.entries().len()
    }

    /// Validates and publishes staged changes.
    ///
    /// Returns None when nothing changed. On failure the staged changes are
    /// discarded and committed state is untouched.
    pub fn commit(&mut self) -> Result<Option<CommitSummary>> {
        if !self.journal.has_net_changes() {
            self.journal.clear();
            self.pending_removed.clear();
            return Ok(None);
        }

        let changed = self.journal.changed_entities();
        let published = self
            .check_constraints(&changed)
            .and_then(|()| self.store.publish(self.working.clone(), changed.clone()));
        let seq = match published {
            Ok(seq) => seq,
            Err(e) => {
                debug!(context = self.context, error = %e, "commit failed, discarding staged changes");
                self.rollback();
                return Err(e);
            }
        };

        let (inserted, updated, deleted) = self.journal.totals();
        self.base = self.store.snapshot();
        self.journal.clear();
        self.pending_removed.clear();
        debug!(seq, inserted, updated, deleted, "committed");
        Ok(Some(CommitSummary {
            seq,
            inserted,
            updated,
            deleted,
            entities: changed,
        }))
    }

    fn check_constraints(&self, changed: &BTreeSet<String>) -> Result<()> {
        for entity in changed {
            let schema = self.store.model().require(entity)?;
            if let Some(table) = self.working.get(entity) {
                self.store.engine().check_table(schema, table)?;
            }
        }
        Ok(())
    }

    /// Discards everything staged since the last commit.
    pub fn rollback(&mut self) {
        self.working = self.base.tables().clone();
        self.journal.clear();
        for id in self.pending_removed.drain(..) {
            self.removed.remove(&id);
        }
    }
}
