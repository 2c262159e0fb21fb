//! Schema module for Glaze.
//!
//! This module contains the schema definitions: fields, entity schemas, the
//! resolved `Model`, and the `ObjectModel` strategies that load one.

mod entity;
mod field;
mod model;
mod object_model;

pub use entity::{EntitySchema, EntitySchemaBuilder};
pub use field::FieldDef;
pub use model::{Model, MODEL_FILE_SUFFIX};
pub use object_model::ObjectModel;

use crate::error::{Error, Result};

/// Validates that a name follows the identifier rules used for entities and fields.
pub(crate) fn check_naming_rules(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let first = chars
        .next()
        .ok_or_else(|| Error::schema("name cannot be empty"))?;
    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(Error::schema(format!(
            "name must start with letter or underscore: {}",
            name
        )));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::schema(format!("name contains invalid characters: {}", name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naming_rules() {
        assert!(check_naming_rules("Person").is_ok());
        assert!(check_naming_rules("_private2").is_ok());
        assert!(check_naming_rules("").is_err());
        assert!(check_naming_rules("2fast").is_err());
        assert!(check_naming_rules("first-name").is_err());
    }
}
