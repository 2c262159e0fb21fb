//! Glaze Storage - Storage engines and transactional stores for Glaze.
//!
//! This crate provides:
//!
//! - `Engine`: the contract between records and an engine's native form
//! - `RelationalEngine`: strict positional rows with unique constraints
//! - `DocumentEngine`: keyed JSON documents, validated when read
//! - `Store`: committed snapshots, file persistence and migration
//! - `Transaction`: a single-writer staging area with commit and rollback
//!
//! # Example
//!
//! ```rust
//! use glaze_core::schema::{EntitySchema, Model};
//! use glaze_core::DataType;
//! use glaze_query::Query;
//! use glaze_storage::{RelationalEngine, Store, StoreConfig};
//! use std::sync::Arc;
//!
//! let model = Model::new(vec![EntitySchema::builder("Person")
//!     .field("name", DataType::String)
//!     .build()
//!     .unwrap()])
//! .unwrap();
//! let store = Store::open(RelationalEngine::new(), Arc::new(model), StoreConfig::default()).unwrap();
//!
//! let mut tx = store.begin().unwrap();
//! let alice = tx.new_record("Person").unwrap().with("name", "Alice").unwrap();
//! tx.insert(&alice).unwrap();
//! tx.commit().unwrap();
//! drop(tx);
//!
//! assert_eq!(store.read(&Query::new("Person")).unwrap().len(), 1);
//! ```

pub mod constraint;
pub mod document;
pub mod engine;
pub mod journal;
pub mod lock;
pub mod migration;
pub mod persist;
pub mod relational;
pub mod snapshot;
pub mod store;
pub mod transaction;

pub use constraint::ConstraintChecker;
pub use document::{Document, DocumentEngine};
pub use engine::{Engine, EngineKind};
pub use journal::{Journal, JournalEntry, TableDiff};
pub use lock::{WriterGate, WriterGuard};
pub use migration::MigrationPolicy;
pub use relational::{RelationalEngine, Row};
pub use snapshot::{Snapshot, SnapshotRead, SnapshotView, Stored, Table, Tables};
pub use store::{Commit, CommitHook, Location, Store, StoreConfig};
pub use transaction::{CommitSummary, Transaction};
