//! A list-backed view model kept in sync with an observable query.

use crate::observable::ObservableQuery;
use glaze_core::{Entity, Error};
use glaze_reactive::{ChangeSet, DisposeBag, DisposedBy};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Rows for a list UI.
///
/// The view model holds its subscriptions in its own bag, and the
/// subscriptions hold the view model weakly, so dropping the last `Arc`
/// ends observation.
pub struct ListViewModel<T: Entity> {
    entities: Mutex<Vec<T>>,
    error: Mutex<Option<Arc<Error>>>,
    revision: AtomicU64,
    bag: DisposeBag,
}

impl<T: Entity> ListViewModel<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entities: Mutex::new(Vec::new()),
            error: Mutex::new(None),
            revision: AtomicU64::new(0),
            bag: DisposeBag::new(),
        })
    }

    /// Binds `this` to `query`. The initial rows are in place on return.
    pub fn observe(this: &Arc<Self>, query: &ObservableQuery<T>) {
        query
            .subscribe_weak(this, |vm: &Self, changes| vm.apply(changes))
            .disposed_by(&this.bag);
    }

    fn apply(&self, changes: ChangeSet<T>) {
        match changes {
            ChangeSet::Error(error) => *self.error.lock() = Some(error),
            changes => changes.apply(&mut self.entities.lock()),
        }
        self.revision.fetch_add(1, Ordering::AcqRel);
    }

    pub fn row_count(&self) -> usize {
        self.entities.lock().len()
    }

    pub fn row(&self, index: usize) -> Option<T> {
        self.entities.lock().get(index).cloned()
    }

    pub fn entities(&self) -> Vec<T> {
        self.entities.lock().clone()
    }

    /// The error that ended observation, if any.
    pub fn last_error(&self) -> Option<Arc<Error>> {
        self.error.lock().clone()
    }

    /// Number of change sets applied so far.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Number of live bindings.
    pub fn bindings(&self) -> usize {
        self.bag.len()
    }
}
