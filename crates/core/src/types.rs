//! Data type definitions for Glaze entities.
//!
//! This module defines the field types an entity schema may declare.

use serde::{Deserialize, Serialize};

/// Supported field types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Boolean type (true/false)
    Boolean,
    /// 64-bit signed integer
    Int64,
    /// 64-bit floating point number
    Float64,
    /// UTF-8 string
    String,
    /// Date and time stored as Unix timestamp (milliseconds)
    DateTime,
    /// Binary data
    Bytes,
}

impl DataType {
    /// Returns the lowercase name used in model files.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Int64 => "int64",
            DataType::Float64 => "float64",
            DataType::String => "string",
            DataType::DateTime => "datetime",
            DataType::Bytes => "bytes",
        }
    }

    /// Returns whether values of this type can be ordered meaningfully.
    pub fn is_sortable(&self) -> bool {
        !matches!(self, DataType::Bytes)
    }
}
