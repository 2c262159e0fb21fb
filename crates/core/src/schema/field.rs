//! Field definition for Glaze entity schemas.

use crate::types::DataType;
use serde::{Deserialize, Serialize};

/// A field declared by an entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    name: String,
    #[serde(rename = "type")]
    data_type: DataType,
    /// Whether this field may hold Null.
    #[serde(default)]
    optional: bool,
    /// Whether values of this field must be unique across the entity.
    #[serde(default)]
    unique: bool,
}

impl FieldDef {
    /// Creates a required, non-unique field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            optional: false,
            unique: false,
        }
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    #[inline]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    #[inline]
    pub fn is_unique(&self) -> bool {
        self.unique
    }
}
