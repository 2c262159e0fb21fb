//! Glaze Reactive - Change propagation primitives for Glaze observables.
//!
//! This crate holds the engine-independent half of observation: what is
//! delivered, how it is computed, and how delivery is stopped.
//!
//! # Core Concepts
//!
//! - `ChangeSet`: `Initial`, positional `Update`, or terminal `Error`
//! - `diff`: computes an `IndexDiff` between two ordered results by record key
//! - `Subscription` / `DisposeBag`: dispose-on-drop handles
//! - `QueryRegistry`: weak registry routing commits to dependent observers
//! - `Changes`: blocking iterator over one subscription's change sets
//!
//! # Example
//!
//! ```rust
//! use glaze_core::RecordKey;
//! use glaze_reactive::{diff, ChangeSet};
//!
//! let key = |id| RecordKey { id, version: 1 };
//! let old = vec![key(1), key(2)];
//! let new = vec![key(2), key(3)];
//!
//! let d = diff(&old, &new);
//! let update = ChangeSet::from_diff(&d, |i| Ok(new[i].id)).unwrap();
//!
//! let mut list = vec![1, 2];
//! update.apply(&mut list);
//! assert_eq!(list, vec![2, 3]);
//! ```

pub mod change_set;
pub mod changes;
pub mod diff;
pub mod notify;
pub mod subscription;

pub use change_set::ChangeSet;
pub use changes::Changes;
pub use diff::{diff, IndexDiff};
pub use notify::{QueryId, QueryRegistry};
pub use subscription::{DisposeBag, DisposedBy, Subscription, SubscriptionId};
