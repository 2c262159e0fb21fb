//! Constraint checking shared by the engines.

use glaze_core::schema::EntitySchema;
use glaze_core::{EngineError, Error, RecordId, Result, Value};
use hashbrown::HashMap;

/// Validates record values against their entity schema.
pub struct ConstraintChecker;

impl ConstraintChecker {
    /// Checks field types and required fields for one record.
    pub fn check_record(schema: &EntitySchema, values: &[Value]) -> Result<()> {
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
        for (field, value) in schema.fields().iter().zip(values) {
            if !value.fits(field.data_type()) {
                // `fits` only rejects non-null values.
                let got = value.data_type().unwrap_or(field.data_type());
                return Err(Error::type_mismatch(field.name(), field.data_type(), got));
            }
            Self::check_not_null(schema, field.name(), field.is_optional(), value)?;
            Self::check_finite(schema, field.name(), value)?;
        }
        Ok(())
    }

    /// Rejects NaN and infinities, which neither persisted form can hold.
    pub fn check_finite(schema: &EntitySchema, field: &str, value: &Value) -> Result<()> {
        match value {
            Value::Float64(f) if !f.is_finite() => Err(EngineError::constraint(
                schema.name(),
                field,
                format!("{} is not a finite number", f),
            )
            .into()),
            _ => Ok(()),
        }
    }

    /// Checks the not-null constraint for one field.
    pub fn check_not_null(
        schema: &EntitySchema,
        field: &str,
        optional: bool,
        value: &Value,
    ) -> Result<()> {
        if !optional && value.is_null() {
            return Err(EngineError::constraint(schema.name(), field, "value is required").into());
        }
        Ok(())
    }

    /// Checks unique fields across a set of records.
    ///
    /// Null values never collide.
    pub fn check_unique<'a, I>(schema: &EntitySchema, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = (RecordId, &'a [Value])> + Clone,
    {
        for (index, field) in schema.fields().iter().enumerate() {
            if !field.is_unique() {
                continue;
            }
            let mut seen: HashMap<&Value, RecordId> = HashMap::new();
            for (id, values) in rows.clone() {
                let Some(value) = values.get(index) else {
                    continue;
                };
                if value.is_null() {
                    continue;
                }
                if let Some(other) = seen.insert(value, id) {
                    return Err(EngineError::constraint(
                        schema.name(),
                        field.name(),
                        format!(
                            "duplicate value {:?} in records {} and {}",
                            value, other, id
                        ),
                    )
                    .into());
                }
            }
        }
        Ok(())
    }
}
