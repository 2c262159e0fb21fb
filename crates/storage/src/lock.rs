//! Single-writer gate for a store.

use glaze_core::{Error, Result};
use parking_lot::{Mutex, MutexGuard};
use std::thread::{self, ThreadId};

/// Serializes write transactions on one store.
///
/// Acquiring blocks while another thread holds the gate. A thread that
/// already holds it gets `InvalidOperation` instead of deadlocking.
#[derive(Debug, Default)]
pub struct WriterGate {
    lock: Mutex<()>,
    owner: Mutex<Option<ThreadId>>,
}

/// Proof that the gate is held. Releases on drop.
pub struct WriterGuard<'a> {
    gate: &'a WriterGate,
    _held: MutexGuard<'a, ()>,
}

impl WriterGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> Result<WriterGuard<'_>> {
        let me = thread::current().id();
        if *self.owner.lock() == Some(me) {
            return Err(Error::invalid_operation(
                "an operation is already running on this thread",
            ));
        }
        let held = self.lock.lock();
        *self.owner.lock() = Some(me);
        Ok(WriterGuard {
            gate: self,
            _held: held,
        })
    }

    /// Returns true if some thread holds the gate.
    pub fn is_held(&self) -> bool {
        self.owner.lock().is_some()
    }

    /// Returns true if the calling thread holds the gate.
    pub fn held_by_current(&self) -> bool {
        *self.owner.lock() == Some(thread::current().id())
    }
}

impl Drop for WriterGuard<'_> {
    fn drop(&mut self) {
        *self.gate.owner.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_nested_acquire_fails() {
        let gate = WriterGate::new();
        let guard = gate.acquire().unwrap();
        assert!(gate.held_by_current());
        assert!(matches!(gate.acquire(), Err(Error::InvalidOperation { .. })));
        drop(guard);
        assert!(!gate.is_held());
        assert!(gate.acquire().is_ok());
    }

    #[test]
    fn test_other_thread_waits() {
        let gate = Arc::new(WriterGate::new());
        let guard = gate.acquire().unwrap();

        let (tx, rx) = mpsc::channel();
        let other = Arc::clone(&gate);
        let handle = std::thread::spawn(move || {
            let _guard = other.acquire().unwrap();
            tx.send(()).unwrap();
        });

        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        drop(guard);
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        handle.join().unwrap();
    }
}
