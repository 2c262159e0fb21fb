//! Glaze Core - Core types, records and object models for Glaze storages.
//!
//! This crate provides the foundational types shared by every Glaze engine:
//!
//! - `DataType`: Supported field types (Boolean, Int64, Float64, String, DateTime, Bytes)
//! - `Value`: Runtime values stored in a record field
//! - `Record`: The uniform handle over one stored object, whatever the engine
//! - `Entity`: Immutable value types mapped out of records
//! - `schema`: Entity schemas, models and the `ObjectModel` loader
//! - `Error`: Error taxonomy shared by every layer
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use glaze_core::schema::EntitySchema;
//! use glaze_core::{DataType, Record, Value};
//!
//! let schema = Arc::new(
//!     EntitySchema::builder("Person")
//!         .field("name", DataType::String)
//!         .optional_field("date", DataType::DateTime)
//!         .build()
//!         .unwrap(),
//! );
//!
//! let mut record = Record::new(schema, 1);
//! record.set("name", "Alice").unwrap();
//!
//! assert_eq!(record.id(), 1);
//! assert_eq!(record.get("name"), Some(&Value::String("Alice".into())));
//! assert_eq!(record.require_str("name").unwrap(), "Alice");
//! ```

mod entity;
mod error;
mod record;
pub mod schema;
mod types;
mod value;

pub use entity::{map_records, Entity};
pub use error::{EngineError, Error, Result};
pub use record::{ContextId, Record, RecordId, RecordKey, DETACHED_CONTEXT};
pub use types::DataType;
pub use value::Value;
