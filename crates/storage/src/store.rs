//! A store: committed snapshots of one engine plus its writer gate.

use crate::engine::{Engine, EngineKind};
use crate::lock::WriterGate;
use crate::migration::{self, MigrationAction, MigrationPolicy};
use crate::persist::{self, Envelope};
use crate::snapshot::{Snapshot, SnapshotRead, SnapshotView};
use crate::transaction::Transaction;
use glaze_core::schema::Model;
use glaze_core::{ContextId, EngineError, Record, RecordId, Result};
use glaze_query::Query;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where committed data lives.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    #[default]
    InMemory,
    File(PathBuf),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::InMemory => f.write_str("memory"),
            Location::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Options fixed when a store is opened.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreConfig {
    pub location: Location,
    pub schema_version: u64,
    pub migration_policy: MigrationPolicy,
}

/// Published after every successful commit.
pub struct Commit {
    pub seq: u64,
    /// Entities whose records changed.
    pub changed: BTreeSet<String>,
    pub snapshot: Arc<dyn SnapshotRead>,
}

impl fmt::Debug for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commit")
            .field("seq", &self.seq)
            .field("changed", &self.changed)
            .finish()
    }
}

/// Callback invoked with each commit, in commit order.
pub type CommitHook = Box<dyn Fn(Commit) + Send + Sync>;

/// Committed state of one engine.
///
/// Readers get immutable snapshots and never block writers for longer than
/// a pointer swap. Writers are serialized by the gate.
pub struct Store<E: Engine> {
    engine: Arc<E>,
    model: Arc<Model>,
    config: StoreConfig,
    committed: RwLock<Arc<Snapshot<E::Native>>>,
    gate: WriterGate,
    next_id: AtomicU64,
    next_context: AtomicU64,
    closed: AtomicBool,
    hook: RwLock<Option<CommitHook>>,
}

impl<E: Engine> Store<E> {
    /// Opens a store, restoring persisted data if the location has any.
    pub fn open(engine: E, model: Arc<Model>, config: StoreConfig) -> Result<Self> {
        let (snapshot, next_id, rewrite) = match &config.location {
            Location::InMemory => (Snapshot::empty(&model), 1, false),
            Location::File(path) => Self::restore(&engine, &model, &config, path)?,
        };
        info!(
            engine = %engine.kind(),
            location = %config.location,
            schema_version = config.schema_version,
            records = snapshot.tables().values().map(|t| t.len()).sum::<usize>(),
            "store opened"
        );

        let store = Self {
            engine: Arc::new(engine),
            model,
            config,
            committed: RwLock::new(Arc::new(snapshot)),
            gate: WriterGate::new(),
            next_id: AtomicU64::new(next_id),
            next_context: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            hook: RwLock::new(None),
        };
        if rewrite {
            store.persist(&store.snapshot())?;
        }
        Ok(store)
    }

    fn restore(
        engine: &E,
        model: &Model,
        config: &StoreConfig,
        path: &Path,
    ) -> Result<(Snapshot<E::Native>, RecordId, bool)> {
        let Some(bytes) = persist::read_if_exists(path)? else {
            return Ok((Snapshot::empty(model), 1, false));
        };
        let envelope = Envelope::from_bytes(&bytes)?;
        if envelope.format != engine.kind().format() {
            return Err(EngineError::corrupt(format!(
                "{} holds `{}` data, expected `{}`",
                path.display(),
                envelope.format,
                engine.kind().format()
            ))
            .into());
        }

        let action = migration::plan(
            envelope.schema_version,
            config.schema_version,
            config.migration_policy,
        )?;
        let (snapshot, rewrite) = match action {
            MigrationAction::Load => {
                let tables = engine.load(model, envelope.data, false)?;
                (Snapshot::new(envelope.seq, tables), false)
            }
            MigrationAction::Migrate => {
                info!(
                    from = envelope.schema_version,
                    to = config.schema_version,
                    "migrating store"
                );
                let tables = engine.load(model, envelope.data, true)?;
                (Snapshot::new(envelope.seq, tables), true)
            }
            MigrationAction::Reset => {
                warn!(
                    path = %path.display(),
                    stored = envelope.schema_version,
                    expected = config.schema_version,
                    "schema version changed, discarding stored data"
                );
                persist::remove_if_exists(path)?;
                (Snapshot::empty(model), false)
            }
        };
        let next_id = envelope.next_id.max(snapshot.max_id() + 1);
        Ok((snapshot, next_id, rewrite))
    }

    /// Installs the callback that receives commits.
    pub fn set_commit_hook(&self, hook: impl Fn(Commit) + Send + Sync + 'static) {
        *self.hook.write() = Some(Box::new(hook));
    }

    #[inline]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    #[inline]
    pub fn kind(&self) -> EngineKind {
        self.engine.kind()
    }

    #[inline]
    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    #[inline]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn check_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(EngineError::Closed.into());
        }
        Ok(())
    }

    /// Returns the latest committed snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot<E::Native>> {
        Arc::clone(&self.committed.read())
    }

    /// Returns the latest committed snapshot behind the read interface.
    pub fn view(&self) -> Arc<dyn SnapshotRead> {
        self.view_of(self.snapshot())
    }

    fn view_of(&self, snapshot: Arc<Snapshot<E::Native>>) -> Arc<dyn SnapshotRead> {
        Arc::new(SnapshotView::new(
            Arc::clone(&self.engine),
            Arc::clone(&self.model),
            snapshot,
        ))
    }

    /// Evaluates a query against committed state.
    pub fn read(&self, query: &Query) -> Result<Vec<Record>> {
        self.check_open()?;
        self.view().read(query)
    }

    /// Starts a write transaction, blocking while another thread writes.
    pub fn begin(&self) -> Result<Transaction<'_, E>> {
        self.check_open()?;
        let guard = self.gate.acquire()?;
        // The store may have been removed while we waited.
        self.check_open()?;
        let context: ContextId = self.next_context.fetch_add(1, Ordering::Relaxed);
        Ok(Transaction::new(self, guard, context, self.snapshot()))
    }

    /// Hands out a fresh record id.
    pub(crate) fn allocate_id(&self) -> RecordId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Makes `tables` the committed state and notifies the hook.
    ///
    /// Callers hold the writer gate. Nothing becomes visible if persisting fails.
    pub(crate) fn publish(
        &self,
        tables: crate::snapshot::Tables<E::Native>,
        changed: BTreeSet<String>,
    ) -> Result<u64> {
        let seq = self.committed.read().seq() + 1;
        let snapshot = Arc::new(Snapshot::new(seq, tables));
        self.persist(&snapshot)?;

        // Swap and notify under one lock so readers never see a snapshot
        // whose commit has not been queued.
        let mut committed = self.committed.write();
        *committed = Arc::clone(&snapshot);
        if let Some(hook) = self.hook.read().as_ref() {
            hook(Commit {
                seq,
                changed,
                snapshot: self.view_of(snapshot),
            });
        }
        drop(committed);
        Ok(seq)
    }

    fn persist(&self, snapshot: &Snapshot<E::Native>) -> Result<()> {
        let Location::File(path) = &self.config.location else {
            return Ok(());
        };
        let envelope = Envelope {
            format: self.engine.kind().format().to_string(),
            schema_version: self.config.schema_version,
            seq: snapshot.seq(),
            next_id: self.next_id.load(Ordering::Relaxed),
            data: self.engine.dump(&self.model, snapshot.tables())?,
        };
        persist::write_atomic(path, &envelope.to_bytes()?)?;
        debug!(seq = snapshot.seq(), path = %path.display(), "store persisted");
        Ok(())
    }

    /// Deletes the store's data. Later reads and writes fail with `Closed`.
    ///
    /// Waits for a running write transaction to finish.
    pub fn remove(&self) -> Result<()> {
        let _guard = self.gate.acquire()?;
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if let Location::File(path) = &self.config.location {
            persist::remove_if_exists(path)?;
        }
        let seq = self.committed.read().seq() + 1;
        *self.committed.write() = Arc::new(Snapshot::new(seq, Default::default()));
        info!(location = %self.config.location, "store removed");
        Ok(())
    }

    /// Human-readable summary of the engine and location.
    pub fn description(&self) -> String {
        format!(
            "{} store at {} (schema version {})",
            self.engine.kind(),
            self.config.location,
            self.config.schema_version
        )
    }
}

impl<E: Engine> fmt::Debug for Store<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("engine", &self.engine.kind())
            .field("location", &self.config.location)
            .field("seq", &self.committed.read().seq())
            .field("closed", &self.is_closed())
            .finish()
    }
}
