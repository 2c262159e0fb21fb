//! Entity schema definition.

use super::check_naming_rules;
use super::field::FieldDef;
use crate::error::{Error, Result};
use crate::types::DataType;
use serde::{Deserialize, Serialize};

/// The declared shape of one entity type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    name: String,
    fields: Vec<FieldDef>,
}

impl EntitySchema {
    /// Starts building a schema for the named entity.
    pub fn builder(name: impl Into<String>) -> EntitySchemaBuilder {
        EntitySchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Returns the entity name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the fields in declaration order.
    #[inline]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Gets a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Gets a field position by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    /// Returns true if the entity declares the field.
    #[inline]
    pub fn has_field(&self, name: &str) -> bool {
        self.field_index(name).is_some()
    }

    /// Fails with `InvalidField` unless the entity declares the field.
    pub fn check_field(&self, name: &str) -> Result<&FieldDef> {
        self.field(name)
            .ok_or_else(|| Error::invalid_field(&self.name, name))
    }

    /// Checks naming rules and field uniqueness.
    ///
    /// Schemas read from model files go through this before use.
    pub fn validate(&self) -> Result<()> {
        check_naming_rules(&self.name)?;
        for (i, field) in self.fields.iter().enumerate() {
            check_naming_rules(field.name())?;
            if self.fields[..i].iter().any(|f| f.name() == field.name()) {
                return Err(Error::schema(format!(
                    "duplicate field `{}` in entity `{}`",
                    field.name(),
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Builder for entity schemas.
pub struct EntitySchemaBuilder {
    name: String,
    fields: Vec<FieldDef>,
}

impl EntitySchemaBuilder {
    /// Adds a required field.
    pub fn field(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.fields.push(FieldDef::new(name, data_type));
        self
    }

    /// Adds a field that may hold Null.
    pub fn optional_field(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.fields.push(FieldDef::new(name, data_type).optional(true));
        self
    }

    /// Adds a required field whose values must be unique.
    pub fn unique_field(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.fields.push(FieldDef::new(name, data_type).unique(true));
        self
    }

    /// Adds a fully specified field.
    pub fn field_def(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Builds and validates the schema.
    pub fn build(self) -> Result<EntitySchema> {
        let schema = EntitySchema {
            name: self.name,
            fields: self.fields,
        };
        schema.validate()?;
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_lookup() {
        let schema = EntitySchema::builder("Person")
            .field("name", DataType::String)
            .optional_field("date", DataType::DateTime)
            .unique_field("email", DataType::String)
            .build()
            .unwrap();

        assert_eq!(schema.name(), "Person");
        assert_eq!(schema.fields().len(), 3);
        assert_eq!(schema.field_index("date"), Some(1));
        assert!(schema.field("email").unwrap().is_unique());
        assert!(!schema.has_field("nickname"));
    }

    #[test]
    fn test_check_field() {
        let schema = EntitySchema::builder("Person")
            .field("name", DataType::String)
            .build()
            .unwrap();
        assert!(schema.check_field("name").is_ok());
        assert!(matches!(
            schema.check_field("age"),
            Err(Error::InvalidField { .. })
        ));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let result = EntitySchema::builder("Person")
            .field("name", DataType::String)
            .field("name", DataType::Int64)
            .build();
        assert!(matches!(result, Err(Error::Schema { .. })));
    }

    #[test]
    fn test_invalid_names_rejected() {
        assert!(EntitySchema::builder("").build().is_err());
        assert!(EntitySchema::builder("Person")
            .field("first name", DataType::String)
            .build()
            .is_err());
    }
}
