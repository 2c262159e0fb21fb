//! Blocking iterator over the change sets of one subscription.

use crate::change_set::ChangeSet;
use crate::subscription::Subscription;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

/// Yields `Initial` followed by every update, in delivery order.
///
/// The sequence ends after a terminal `Error`, or once the producing side is
/// gone. Dropping the iterator unsubscribes.
pub struct Changes<T> {
    receiver: Receiver<ChangeSet<T>>,
    subscription: Subscription,
    finished: bool,
}

impl<T> Changes<T> {
    pub fn new(receiver: Receiver<ChangeSet<T>>, subscription: Subscription) -> Self {
        Self {
            receiver,
            subscription,
            finished: false,
        }
    }

    fn observe(&mut self, item: ChangeSet<T>) -> ChangeSet<T> {
        if item.is_error() {
            self.finished = true;
        }
        item
    }

    /// Waits up to `timeout` for the next change set.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Result<ChangeSet<T>, RecvTimeoutError> {
        if self.finished {
            return Err(RecvTimeoutError::Disconnected);
        }
        let item = self.receiver.recv_timeout(timeout)?;
        Ok(self.observe(item))
    }

    /// Returns a change set if one is already waiting.
    pub fn try_next(&mut self) -> Option<ChangeSet<T>> {
        if self.finished {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(item) => Some(self.observe(item)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.finished = true;
                None
            }
        }
    }

    /// The subscription feeding this iterator.
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

impl<T> Iterator for Changes<T> {
    type Item = ChangeSet<T>;

    fn next(&mut self) -> Option<ChangeSet<T>> {
        if self.finished {
            return None;
        }
        match self.receiver.recv() {
            Ok(item) => Some(self.observe(item)),
            Err(_) => {
                self.finished = true;
                None
            }
        }
    }
}
