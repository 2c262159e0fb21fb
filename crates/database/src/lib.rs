//! Glaze Database - Uniform storage with observable queries.
//!
//! This crate ties the lower layers together behind one facade:
//!
//! - `Storage`: opens a relational or document store for an object model
//! - `OperationContext`: scoped write access, committed with `save`
//! - `ObservableQuery`: live `ChangeSet`s for a `Request`
//! - `ListViewModel`: a list kept in sync with an observable query
//!
//! # Example
//!
//! ```rust
//! use glaze_database::schema::{EntitySchema, Model};
//! use glaze_database::{
//!     ChangeSet, DataType, Entity, Record, RelationalStorage, Request, Result, StorageConfig,
//! };
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Person {
//!     name: String,
//! }
//!
//! impl Entity for Person {
//!     const NAME: &'static str = "Person";
//!
//!     fn from_record(record: &Record) -> Result<Self> {
//!         Ok(Person { name: record.require_str("name")?.to_string() })
//!     }
//! }
//!
//! let model = Model::new(vec![EntitySchema::builder("Person")
//!     .field("name", DataType::String)
//!     .build()?])?;
//! let storage = RelationalStorage::relational(StorageConfig::in_memory(), model)?;
//!
//! let people = storage.observable(Request::<Person>::new().sorted("name", true))?;
//! let mut changes = people.changes();
//! assert!(matches!(changes.next(), Some(ChangeSet::Initial(list)) if list.is_empty()));
//!
//! storage.operation(|ctx| {
//!     ctx.create::<Person, _>(|r| r.set("name", "Alice"))?;
//!     ctx.save()
//! })?;
//!
//! match changes.next() {
//!     Some(ChangeSet::Update { insertions, .. }) => {
//!         assert_eq!(insertions, vec![(0, Person { name: "Alice".into() })]);
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! # Ok::<(), glaze_database::Error>(())
//! ```

mod config;
mod context;
mod dispatch;
mod observable;
mod storage;
mod view_model;

pub use config::{ModelSource, StorageConfig};
pub use context::OperationContext;
pub use observable::ObservableQuery;
pub use storage::{DocumentStorage, RelationalStorage, Storage};
pub use view_model::ListViewModel;

pub use glaze_core::schema;
pub use glaze_core::{
    map_records, DataType, EngineError, Entity, Error, Record, RecordId, Result, Value,
};
pub use glaze_query::{Condition, Predicate, Request, SortDescriptor};
pub use glaze_reactive::{ChangeSet, Changes, DisposeBag, DisposedBy, Subscription};
pub use glaze_storage::{
    DocumentEngine, Engine, EngineKind, Location, MigrationPolicy, RelationalEngine,
};
