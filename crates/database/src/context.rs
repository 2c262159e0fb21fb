//! Operation contexts: the scoped write handle passed to `Storage::operation`.

use glaze_core::{map_records, ContextId, Entity, Record, Result};
use glaze_query::Request;
use glaze_storage::{Engine, Transaction};
use tracing::debug;

/// Staged mutations over one storage, owned by a single `operation` call.
///
/// Nothing staged is visible to readers until `save`. Records handed out
/// by a context are bound to it and rejected by any other context.
pub struct OperationContext<'s, E: Engine> {
    tx: Transaction<'s, E>,
}

impl<'s, E: Engine> OperationContext<'s, E> {
    pub(crate) fn new(tx: Transaction<'s, E>) -> Self {
        Self { tx }
    }

    #[inline]
    pub fn id(&self) -> ContextId {
        self.tx.id()
    }

    /// Allocates an empty record of `T`'s entity. It is not staged.
    pub fn new_record<T: Entity>(&self) -> Result<Record> {
        self.tx.new_record(T::NAME)
    }

    /// Allocates a record, lets `init` fill it in, and stages its insert.
    pub fn create<T, F>(&mut self, init: F) -> Result<Record>
    where
        T: Entity,
        F: FnOnce(&mut Record) -> Result<()>,
    {
        let mut record = self.new_record::<T>()?;
        init(&mut record)?;
        self.tx.insert(&record)?;
        Ok(record)
    }

    /// Evaluates `request` against this context's working state, staged
    /// mutations included.
    pub fn fetch<T: Entity>(&self, request: &Request<T>) -> Result<Vec<Record>> {
        self.tx.fetch(request.query())
    }

    /// Like `fetch`, mapped to entities.
    pub fn fetch_entities<T: Entity>(&self, request: &Request<T>) -> Result<Vec<T>> {
        map_records(&self.fetch(request)?)
    }

    /// Stages an insert, or an update when the record is already stored.
    pub fn insert(&mut self, record: &Record) -> Result<()> {
        self.tx.insert(record)
    }

    pub fn remove(&mut self, record: &Record) -> Result<()> {
        self.tx.remove(record)
    }

    /// Stages the removal of every record.
    ///
    /// If any record is stale, nothing from this call is staged.
    pub fn remove_all<'r>(&mut self, records: impl IntoIterator<Item = &'r Record>) -> Result<()> {
        self.tx.remove_all(records)
    }

    /// Commits everything staged so far.
    ///
    /// On failure nothing is published and the working state returns to the
    /// last commit. The context stays usable either way.
    pub fn save(&mut self) -> Result<()> {
        self.tx.commit()?;
        Ok(())
    }

    /// Returns true if unsaved mutations would change committed state.
    pub fn has_changes(&self) -> bool {
        self.tx.has_changes()
    }

    /// Ends the context, discarding anything unsaved.
    pub(crate) fn finish(mut self) {
        let pending = self.tx.pending();
        if pending > 0 {
            debug!(context = self.tx.id(), pending, "discarding unsaved mutations");
            self.tx.rollback();
        }
    }
}
