//! Observable queries: live, ordered change sets for one request.
//!
//! Subscribing registers an observer, then reads the committed snapshot and
//! delivers `Initial` on the calling thread. Registration happens first so
//! no commit can slip between the snapshot and the first update; commits at
//! or below the snapshot's sequence number are skipped by the observer.
//!
//! Each observer serializes its own deliveries with a lock that disposal
//! never takes, so a handler may dispose its own subscription.

use crate::dispatch::Registry;
use glaze_core::{map_records, Entity, Error, Record, RecordKey, Result};
use glaze_query::{Query, Request};
use glaze_reactive::{diff, ChangeSet, Changes, Subscription};
use glaze_storage::{Commit, SnapshotRead};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use tracing::{debug, warn};

/// Whether an observer wants further deliveries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Stop,
}

/// Receives commits from the dispatcher.
pub(crate) trait Observer: Send + Sync {
    fn on_commit(&self, commit: &Commit) -> Flow;
    fn on_terminate(&self, error: &Arc<Error>);
}

/// What an observable needs from the storage it reads.
pub(crate) trait Source: Send + Sync {
    /// Latest committed snapshot, or `Closed` once the store is removed.
    fn view(&self) -> Result<Arc<dyn SnapshotRead>>;
    fn registry(&self) -> &Registry;
}

type Sink<T> = Box<dyn FnMut(ChangeSet<T>) -> Flow + Send>;

struct DeliveryState<T> {
    /// Sequence number of the last evaluated snapshot.
    seq: u64,
    keys: Vec<RecordKey>,
    sink: Sink<T>,
}

struct QueryObserver<T> {
    query: Query,
    active: AtomicBool,
    state: Mutex<DeliveryState<T>>,
}

impl<T: Entity> QueryObserver<T> {
    fn new(query: Query, sink: Sink<T>) -> Self {
        Self {
            query,
            active: AtomicBool::new(true),
            state: Mutex::new(DeliveryState {
                seq: 0,
                keys: Vec::new(),
                sink,
            }),
        }
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    fn deliver(&self, state: &mut DeliveryState<T>, changes: ChangeSet<T>) -> Flow {
        if !self.active.load(Ordering::Acquire) {
            return Flow::Stop;
        }
        let terminal = changes.is_error();
        let flow = (state.sink)(changes);
        if terminal || flow == Flow::Stop {
            self.deactivate();
            return Flow::Stop;
        }
        Flow::Continue
    }

    fn fail(&self, state: &mut DeliveryState<T>, error: Arc<Error>) -> Flow {
        warn!(entity = %self.query.entity(), error = %error, "observer terminated");
        self.deliver(state, ChangeSet::Error(error))
    }

    fn deliver_initial(&self, state: &mut DeliveryState<T>, view: &dyn SnapshotRead) -> Flow {
        state.seq = view.seq();
        let records = match view.read(&self.query) {
            Ok(records) => records,
            Err(e) => return self.fail(state, Arc::new(e)),
        };
        match map_records::<T>(&records) {
            Ok(items) => {
                state.keys = records.iter().map(Record::key).collect();
                self.deliver(state, ChangeSet::Initial(items))
            }
            Err(e) => self.fail(state, Arc::new(e)),
        }
    }
}

impl<T: Entity> Observer for QueryObserver<T> {
    fn on_commit(&self, commit: &Commit) -> Flow {
        if !self.active.load(Ordering::Acquire) {
            return Flow::Stop;
        }
        let mut state = self.state.lock();
        if commit.seq <= state.seq {
            return Flow::Continue;
        }
        state.seq = commit.seq;

        let records = match commit.snapshot.read(&self.query) {
            Ok(records) => records,
            Err(e) => return self.fail(&mut state, Arc::new(e)),
        };
        let keys: Vec<RecordKey> = records.iter().map(Record::key).collect();
        let changes = diff(&state.keys, &keys);
        if changes.is_empty() {
            return Flow::Continue;
        }
        // Only inserted and modified records are mapped.
        match ChangeSet::from_diff(&changes, |i| T::from_record(&records[i])) {
            Ok(update) => {
                state.keys = keys;
                self.deliver(&mut state, update)
            }
            Err(e) => self.fail(&mut state, Arc::new(e)),
        }
    }

    fn on_terminate(&self, error: &Arc<Error>) {
        let mut state = self.state.lock();
        if self.active.load(Ordering::Acquire) {
            self.fail(&mut state, Arc::clone(error));
        }
    }
}

/// A cold, reusable query over one storage.
///
/// Nothing is registered until a subscribe call; every subscription gets
/// its own `Initial` and its own sequence of updates.
pub struct ObservableQuery<T: Entity> {
    source: Arc<dyn Source>,
    request: Request<T>,
}

impl<T: Entity> ObservableQuery<T> {
    pub(crate) fn new(source: Arc<dyn Source>, request: Request<T>) -> Self {
        Self { source, request }
    }

    #[inline]
    pub fn request(&self) -> &Request<T> {
        &self.request
    }

    /// Subscribes with a handler receiving every change set.
    ///
    /// `Initial` is delivered before this returns. Later change sets arrive
    /// on the storage's notification thread.
    pub fn subscribe<F>(&self, mut handler: F) -> Subscription
    where
        F: FnMut(ChangeSet<T>) + Send + 'static,
    {
        self.attach(Box::new(move |changes| {
            handler(changes);
            Flow::Continue
        }))
    }

    /// Subscribes on behalf of `owner`, holding it only weakly.
    ///
    /// Once the owner is dropped, delivery stops and the subscription
    /// disposes itself.
    pub fn subscribe_weak<O, F>(&self, owner: &Arc<O>, mut handler: F) -> Subscription
    where
        O: Send + Sync + 'static,
        F: FnMut(&O, ChangeSet<T>) + Send + 'static,
    {
        let owner = Arc::downgrade(owner);
        self.attach(Box::new(move |changes| match owner.upgrade() {
            Some(owner) => {
                handler(&owner, changes);
                Flow::Continue
            }
            None => Flow::Stop,
        }))
    }

    /// Returns a blocking iterator over this query's change sets.
    pub fn changes(&self) -> Changes<T> {
        let (sender, receiver) = mpsc::channel();
        let subscription = self.subscribe(move |changes| {
            // The iterator may already be gone; nothing to deliver to then.
            let _ = sender.send(changes);
        });
        Changes::new(receiver, subscription)
    }

    fn attach(&self, sink: Sink<T>) -> Subscription {
        let observer = Arc::new(QueryObserver::<T>::new(self.request.query().clone(), sink));
        let mut state = observer.state.lock();

        let erased: Arc<dyn Observer> = observer.clone();
        let entity = self.request.query().entity();
        let id = self.source.registry().lock().register(entity, &erased);
        debug!(query = id, entity = %entity, "subscribed");

        let subscription = {
            let registry = Arc::downgrade(self.source.registry());
            let observer = Arc::clone(&observer);
            Subscription::new(move || {
                observer.deactivate();
                if let Some(registry) = registry.upgrade() {
                    registry.lock().unregister(id);
                }
                debug!(query = id, "unsubscribed");
            })
        };

        let flow = match self.source.view() {
            Ok(view) => observer.deliver_initial(&mut state, view.as_ref()),
            Err(e) => observer.fail(&mut state, Arc::new(e)),
        };
        drop(state);
        if flow == Flow::Stop {
            subscription.dispose();
        }
        subscription
    }
}

impl<T: Entity> Clone for ObservableQuery<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            request: self.request.clone(),
        }
    }
}

impl<T: Entity> fmt::Debug for ObservableQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableQuery")
            .field("request", &self.request)
            .finish()
    }
}
