//! Record structure for Glaze.
//!
//! A `Record` is the uniform handle an engine hands out for one stored object.
//! Engines keep their own native representation and decode into records on
//! read; records are never kept beyond the transaction or observation tick
//! that produced them.

use crate::error::{Error, Result};
use crate::schema::EntitySchema;
use crate::types::DataType;
use crate::value::Value;
use std::sync::Arc;

/// Unique identifier for a record within one store.
pub type RecordId = u64;

/// Identifier of the operation context that produced a record.
pub type ContextId = u64;

/// Context id carried by records read outside of any operation.
pub const DETACHED_CONTEXT: ContextId = 0;

/// Identity plus version, used to detect changes between observation ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub id: RecordId,
    pub version: u64,
}

/// A stored object of one entity type.
#[derive(Clone, Debug)]
pub struct Record {
    schema: Arc<EntitySchema>,
    id: RecordId,
    /// Zero until first commit, then incremented on each committed update.
    version: u64,
    /// Values indexed by field position in the schema.
    values: Vec<Value>,
    context: ContextId,
}

impl Record {
    /// Creates an uncommitted record with every field set to Null.
    pub fn new(schema: Arc<EntitySchema>, id: RecordId) -> Self {
        let values = vec![Value::Null; schema.fields().len()];
        Self {
            schema,
            id,
            version: 0,
            values,
            context: DETACHED_CONTEXT,
        }
    }

    /// Rebuilds a record from decoded engine data.
    ///
    /// Fails with a mapping error if the value count does not match the schema.
    pub fn from_parts(
        schema: Arc<EntitySchema>,
        id: RecordId,
        version: u64,
        values: Vec<Value>,
    ) -> Result<Self> {
        if values.len() != schema.fields().len() {
            return Err(Error::mapping(
                schema.name(),
                "*",
                format!(
                    "expected {} values, found {}",
                    schema.fields().len(),
                    values.len()
                ),
            ));
        }
        Ok(Self {
            schema,
            id,
            version,
            values,
            context: DETACHED_CONTEXT,
        })
    }

    /// Binds this record to an operation context.
    pub fn bind(mut self, context: ContextId) -> Self {
        self.context = context;
        self
    }

    #[inline]
    pub fn id(&self) -> RecordId {
        self.id
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub fn key(&self) -> RecordKey {
        RecordKey {
            id: self.id,
            version: self.version,
        }
    }

    #[inline]
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Returns the entity name.
    #[inline]
    pub fn entity(&self) -> &str {
        self.schema.name()
    }

    #[inline]
    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns true once the record has been committed at least once.
    #[inline]
    pub fn is_persisted(&self) -> bool {
        self.version > 0
    }

    /// Gets a value by field name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.schema.field_index(field).and_then(|i| self.values.get(i))
    }

    /// Gets a value by field position.
    #[inline]
    pub fn get_at(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Sets a field value.
    ///
    /// Fails if the field is not declared or the value has the wrong type.
    /// Nullability is enforced by the engine when the record is staged.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let index = self
            .schema
            .field_index(field)
            .ok_or_else(|| Error::invalid_field(self.schema.name(), field))?;
        let expected = self.schema.fields()[index].data_type();
        if let Some(got) = value.data_type() {
            if got != expected {
                return Err(Error::type_mismatch(field, expected, got));
            }
        }
        self.values[index] = value;
        Ok(())
    }

    /// Builder-style `set`.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Result<Self> {
        self.set(field, value)?;
        Ok(self)
    }

    /// Returns the value of a field that must be present and non-null.
    pub fn require_value(&self, field: &str) -> Result<&Value> {
        match self.get(field) {
            None => Err(Error::mapping(self.entity(), field, "field is not declared")),
            Some(Value::Null) => Err(Error::mapping(self.entity(), field, "required field is null")),
            Some(v) => Ok(v),
        }
    }

    fn typed<'a, T>(
        &'a self,
        field: &str,
        expected: DataType,
        extract: impl Fn(&'a Value) -> Option<T>,
    ) -> Result<Option<T>> {
        let value = self
            .get(field)
            .ok_or_else(|| Error::mapping(self.entity(), field, "field is not declared"))?;
        if value.is_null() {
            return Ok(None);
        }
        extract(value).map(Some).ok_or_else(|| {
            Error::mapping(
                self.entity(),
                field,
                format!("expected {}, found {:?}", expected.name(), value.data_type()),
            )
        })
    }

    fn required<T>(&self, field: &str, found: Option<T>) -> Result<T> {
        found.ok_or_else(|| Error::mapping(self.entity(), field, "required field is null"))
    }

    pub fn optional_str(&self, field: &str) -> Result<Option<&str>> {
        self.typed(field, DataType::String, Value::as_str)
    }

    pub fn optional_i64(&self, field: &str) -> Result<Option<i64>> {
        self.typed(field, DataType::Int64, Value::as_i64)
    }

    pub fn optional_f64(&self, field: &str) -> Result<Option<f64>> {
        self.typed(field, DataType::Float64, Value::as_f64)
    }

    pub fn optional_bool(&self, field: &str) -> Result<Option<bool>> {
        self.typed(field, DataType::Boolean, Value::as_bool)
    }

    pub fn optional_datetime(&self, field: &str) -> Result<Option<i64>> {
        self.typed(field, DataType::DateTime, Value::as_datetime)
    }

    pub fn optional_bytes(&self, field: &str) -> Result<Option<&[u8]>> {
        self.typed(field, DataType::Bytes, Value::as_bytes)
    }

    pub fn require_str(&self, field: &str) -> Result<&str> {
        let found = self.optional_str(field)?;
        self.required(field, found)
    }

    pub fn require_i64(&self, field: &str) -> Result<i64> {
        let found = self.optional_i64(field)?;
        self.required(field, found)
    }

    pub fn require_f64(&self, field: &str) -> Result<f64> {
        let found = self.optional_f64(field)?;
        self.required(field, found)
    }

    pub fn require_bool(&self, field: &str) -> Result<bool> {
        let found = self.optional_bool(field)?;
        self.required(field, found)
    }

    pub fn require_datetime(&self, field: &str) -> Result<i64> {
        let found = self.optional_datetime(field)?;
        self.required(field, found)
    }

    pub fn require_bytes(&self, field: &str) -> Result<&[u8]> {
        let found = self.optional_bytes(field)?;
        self.required(field, found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Arc<EntitySchema> {
        Arc::new(
            EntitySchema::builder("Person")
                .field("name", DataType::String)
                .optional_field("date", DataType::DateTime)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_new_record_is_null_and_unpersisted() {
        let record = Record::new(person(), 3);
        assert_eq!(record.id(), 3);
        assert_eq!(record.version(), 0);
        assert!(!record.is_persisted());
        assert_eq!(record.get("name"), Some(&Value::Null));
        assert_eq!(record.context(), DETACHED_CONTEXT);
    }

    #[test]
    fn test_set_checks_field_and_type() {
        let mut record = Record::new(person(), 1);
        record.set("name", "Alice").unwrap();
        assert_eq!(record.require_str("name").unwrap(), "Alice");

        assert!(matches!(
            record.set("nickname", "Al"),
            Err(Error::InvalidField { .. })
        ));
        assert!(matches!(
            record.set("date", "yesterday"),
            Err(Error::TypeMismatch { .. })
        ));
        record.set("date", Value::Null).unwrap();
    }

    #[test]
    fn test_require_on_null_is_mapping_error() {
        let record = Record::new(person(), 1);
        assert!(matches!(record.require_str("name"), Err(Error::Mapping { .. })));
        assert_eq!(record.optional_datetime("date").unwrap(), None);
    }

    #[test]
    fn test_require_wrong_type_is_mapping_error() {
        let record = Record::new(person(), 1).with("name", "Bob").unwrap();
        let err = record.require_i64("name").unwrap_err();
        assert!(err.to_string().contains("expected int64"));
    }

    #[test]
    fn test_from_parts_checks_arity() {
        let err = Record::from_parts(person(), 1, 1, vec![Value::Null]).unwrap_err();
        assert!(matches!(err, Error::Mapping { .. }));

        let record =
            Record::from_parts(person(), 1, 4, vec!["Ann".into(), Value::DateTime(9)]).unwrap();
        assert_eq!(record.key(), RecordKey { id: 1, version: 4 });
    }

    #[test]
    fn test_bind_sets_context() {
        let record = Record::new(person(), 1).bind(12);
        assert_eq!(record.context(), 12);
    }
}
