//! Disposable subscription handles.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a subscription.
pub type SubscriptionId = u64;

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

type DisposeAction = Box<dyn FnOnce() + Send>;

/// A live subscription. Dropping it unsubscribes.
///
/// `dispose` may be called from any thread, including from inside the
/// subscription's own handler. It runs the teardown at most once.
pub struct Subscription {
    id: SubscriptionId,
    on_dispose: Mutex<Option<DisposeAction>>,
}

impl Subscription {
    /// Creates a subscription that runs `on_dispose` when disposed.
    pub fn new(on_dispose: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id: NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed),
            on_dispose: Mutex::new(Some(Box::new(on_dispose))),
        }
    }

    /// Creates a subscription that is already disposed.
    pub fn disposed() -> Self {
        Self {
            id: NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed),
            on_dispose: Mutex::new(None),
        }
    }

    #[inline]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn is_disposed(&self) -> bool {
        self.on_dispose.lock().is_none()
    }

    /// Unsubscribes. Later calls do nothing.
    pub fn dispose(&self) {
        // Take before running so the action never executes under our lock.
        let action = self.on_dispose.lock().take();
        if let Some(action) = action {
            tracing::debug!(subscription = self.id, "subscription disposed");
            action();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Holds subscriptions and disposes all of them when dropped.
#[derive(Default)]
pub struct DisposeBag {
    subscriptions: Mutex<Vec<Subscription>>,
}

impl DisposeBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscription to the bag.
    pub fn insert(&self, subscription: Subscription) {
        self.subscriptions.lock().push(subscription);
    }

    /// Number of subscriptions held.
    pub fn len(&self) -> usize {
        self.subscriptions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.lock().is_empty()
    }

    /// Disposes and releases every held subscription.
    pub fn dispose(&self) {
        let drained: Vec<Subscription> = std::mem::take(&mut *self.subscriptions.lock());
        drop(drained);
    }
}

impl Drop for DisposeBag {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for DisposeBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisposeBag").field("len", &self.len()).finish()
    }
}

/// Extension for storing a subscription in a bag inline.
pub trait DisposedBy {
    fn disposed_by(self, bag: &DisposeBag);
}

impl DisposedBy for Subscription {
    fn disposed_by(self, bag: &DisposeBag) {
        bag.insert(self);
    }
}
