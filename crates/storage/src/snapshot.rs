//! Immutable committed state and the read interface observers use.

use crate::engine::Engine;
use glaze_core::schema::Model;
use glaze_core::{Record, RecordId, Result};
use glaze_query::Query;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A stored record body with its commit version.
#[derive(Clone, Debug, PartialEq)]
pub struct Stored<N> {
    pub version: u64,
    pub native: N,
}

/// All records of one entity, keyed by id.
pub type Table<N> = BTreeMap<RecordId, Stored<N>>;

/// Every table of a store, shared copy-on-write between snapshots.
pub type Tables<N> = BTreeMap<String, Arc<Table<N>>>;

/// One committed state of a store.
///
/// `seq` increases by one per commit; an empty store starts at zero.
#[derive(Debug)]
pub struct Snapshot<N> {
    seq: u64,
    tables: Tables<N>,
}

impl<N> Snapshot<N> {
    pub fn new(seq: u64, tables: Tables<N>) -> Self {
        Self { seq, tables }
    }

    /// Creates an empty snapshot with a table for every entity in the model.
    pub fn empty(model: &Model) -> Self {
        let tables = model
            .entities()
            .iter()
            .map(|e| (e.name().to_string(), Arc::new(Table::new())))
            .collect();
        Self { seq: 0, tables }
    }

    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    #[inline]
    pub fn tables(&self) -> &Tables<N> {
        &self.tables
    }

    pub fn table(&self, entity: &str) -> Option<&Table<N>> {
        self.tables.get(entity).map(|t| t.as_ref())
    }

    /// Returns the number of records stored for `entity`.
    pub fn len(&self, entity: &str) -> usize {
        self.table(entity).map(|t| t.len()).unwrap_or(0)
    }

    /// Returns the largest record id in any table.
    pub fn max_id(&self) -> RecordId {
        self.tables
            .values()
            .filter_map(|t| t.keys().next_back().copied())
            .max()
            .unwrap_or(0)
    }
}

/// Engine-independent read access to one committed snapshot.
pub trait SnapshotRead: Send + Sync {
    /// Commit sequence number of this snapshot.
    fn seq(&self) -> u64;

    /// Evaluates a query, returning detached records.
    fn read(&self, query: &Query) -> Result<Vec<Record>>;

    /// Returns the number of records of `entity`.
    fn count(&self, entity: &str) -> usize;
}

/// A snapshot bound to the engine and model that can decode it.
pub struct SnapshotView<E: Engine> {
    engine: Arc<E>,
    model: Arc<Model>,
    snapshot: Arc<Snapshot<E::Native>>,
}

impl<E: Engine> SnapshotView<E> {
    pub fn new(engine: Arc<E>, model: Arc<Model>, snapshot: Arc<Snapshot<E::Native>>) -> Self {
        Self {
            engine,
            model,
            snapshot,
        }
    }
}

impl<E: Engine> SnapshotRead for SnapshotView<E> {
    fn seq(&self) -> u64 {
        self.snapshot.seq()
    }

    fn read(&self, query: &Query) -> Result<Vec<Record>> {
        let schema = self.model.require(query.entity())?;
        query.validate(schema)?;
        let Some(table) = self.snapshot.table(query.entity()) else {
            return Ok(Vec::new());
        };
        let records = table
            .iter()
            .map(|(id, stored)| self.engine.decode(schema, *id, stored.version, &stored.native))
            .collect::<Result<Vec<_>>>()?;
        Ok(query.execute(records))
    }

    fn count(&self, entity: &str) -> usize {
        self.snapshot.len(entity)
    }
}

impl<E: Engine> fmt::Debug for SnapshotView<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotView")
            .field("engine", &self.engine.kind())
            .field("seq", &self.snapshot.seq())
            .finish()
    }
}
