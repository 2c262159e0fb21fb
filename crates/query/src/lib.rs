//! Glaze Query - Engine-independent requests for Glaze storages.
//!
//! A `Request<T>` describes which records of entity `T` a caller wants:
//! a predicate, a sort key and optional pagination. Requests are immutable;
//! every builder method returns a new value. Engines evaluate the untyped
//! `Query` inside a request against their own records.
//!
//! # Example
//!
//! ```rust
//! use glaze_core::{Entity, Record, Result};
//! use glaze_query::{Condition, Request};
//!
//! #[derive(Clone)]
//! struct Person;
//!
//! impl Entity for Person {
//!     const NAME: &'static str = "Person";
//!     fn from_record(_: &Record) -> Result<Self> {
//!         Ok(Person)
//!     }
//! }
//!
//! let base = Request::<Person>::new();
//! let adults = base
//!     .filtered("age", Condition::ge(18))
//!     .sorted("date", true)
//!     .limited(20);
//!
//! assert!(base.query().predicate().is_none());
//! assert_eq!(adults.query().limit(), Some(20));
//! ```

pub mod executor;
mod predicate;
mod request;

pub use predicate::{Condition, Predicate};
pub use request::{Query, Request, SortDescriptor};
