//! The notification thread fanning commits out to observers.

use crate::observable::{Flow, Observer};
use glaze_core::{Error, Result};
use glaze_reactive::QueryRegistry;
use glaze_storage::Commit;
use parking_lot::Mutex;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread;
use tracing::trace;

/// Observers of one storage.
pub(crate) type Registry = Arc<Mutex<QueryRegistry<dyn Observer>>>;

/// Messages on a storage's notification channel.
pub(crate) enum Notification {
    Commit(Commit),
    /// The store is gone; every observer receives this error and is dropped.
    Terminate(Arc<Error>),
}

/// Starts the dispatcher. It exits once every sender is dropped or after
/// delivering a termination.
pub(crate) fn spawn(name: String, receiver: Receiver<Notification>, registry: Registry) -> Result<()> {
    thread::Builder::new()
        .name(name)
        .spawn(move || run(receiver, registry))
        .map_err(|e| Error::invalid_operation(format!("cannot start notification thread: {}", e)))?;
    Ok(())
}

fn run(receiver: Receiver<Notification>, registry: Registry) {
    for notification in receiver {
        match notification {
            Notification::Commit(commit) => {
                // Collect under the lock, deliver without it.
                let observers = registry.lock().observers_of(&commit.changed);
                let finished: Vec<_> = observers
                    .into_iter()
                    .filter(|(_, observer)| observer.on_commit(&commit) == Flow::Stop)
                    .map(|(id, _)| id)
                    .collect();
                let mut registry = registry.lock();
                for id in finished {
                    registry.unregister(id);
                }
                registry.cleanup();
            }
            Notification::Terminate(error) => {
                let observers = {
                    let mut registry = registry.lock();
                    let observers = registry.observers();
                    registry.clear();
                    observers
                };
                for (_, observer) in observers {
                    observer.on_terminate(&error);
                }
                break;
            }
        }
    }
    trace!("notification dispatcher exiting");
}
