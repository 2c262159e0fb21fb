//! Entity mapping.
//!
//! An `Entity` is an immutable value snapshot of one record's fields. Mapping
//! is a pure function: it performs no I/O and keeps no reference to the record.

use crate::error::{Error, Result};
use crate::record::Record;

/// A plain value type that can be mapped out of a record.
///
/// # Example
///
/// ```rust
/// use glaze_core::{Entity, Record, Result};
///
/// #[derive(Clone, Debug)]
/// struct Person {
///     name: String,
///     date: i64,
/// }
///
/// impl Entity for Person {
///     const NAME: &'static str = "Person";
///
///     fn from_record(record: &Record) -> Result<Self> {
///         Ok(Self {
///             name: record.require_str("name")?.to_string(),
///             date: record.require_datetime("date")?,
///         })
///     }
/// }
/// ```
pub trait Entity: Clone + Send + Sync + 'static {
    /// Name of the entity in the object model.
    const NAME: &'static str;

    /// Copies the record's fields into a new value.
    fn from_record(record: &Record) -> Result<Self>;
}

/// Maps a slice of records, failing on the first record that cannot be mapped.
pub fn map_records<T: Entity>(records: &[Record]) -> Result<Vec<T>> {
    records
        .iter()
        .map(|record| {
            if record.entity() != T::NAME {
                return Err(Error::mapping(
                    T::NAME,
                    "*",
                    format!("record belongs to entity `{}`", record.entity()),
                ));
            }
            T::from_record(record)
        })
        .collect()
}
