//! Error types for Glaze.

use crate::types::DataType;
use crate::record::RecordId;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Glaze operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by every Glaze layer.
#[derive(Debug, Error)]
pub enum Error {
    /// A request names a field the entity does not declare.
    #[error("invalid field `{field}` on entity `{entity}`")]
    InvalidField { entity: String, field: String },

    /// Unknown entity type or malformed object model.
    #[error("schema error: {message}")]
    Schema { message: String },

    /// A record was used outside the context that produced it, or after removal.
    #[error("stale record {entity}#{id}: {reason}")]
    StaleRecord {
        entity: String,
        id: RecordId,
        reason: String,
    },

    /// Stored data cannot be mapped onto the entity.
    #[error("cannot map field `{field}` of `{entity}`: {message}")]
    Mapping {
        entity: String,
        field: String,
        message: String,
    },

    /// A value does not match the declared field type.
    #[error("type mismatch on `{field}`: expected {expected:?}, got {got:?}")]
    TypeMismatch {
        field: String,
        expected: DataType,
        got: DataType,
    },

    /// The call is not allowed in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation { message: String },

    /// Failure reported by the underlying engine.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Engine-level failures: I/O, corruption, constraints, version mismatches.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("i/o failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt store: {0}")]
    Corrupt(String),

    #[error("constraint violation on {entity}.{field}: {message}")]
    Constraint {
        entity: String,
        field: String,
        message: String,
    },

    #[error("stored schema version {stored} does not match expected {expected}")]
    SchemaMismatch { stored: u64, expected: u64 },

    #[error("store has been removed")]
    Closed,
}

impl Error {
    /// Creates an invalid field error.
    pub fn invalid_field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Error::InvalidField {
            entity: entity.into(),
            field: field.into(),
        }
    }

    /// Creates a schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        Error::Schema {
            message: message.into(),
        }
    }

    /// Creates a schema error for an entity missing from the model.
    pub fn unknown_entity(name: &str) -> Self {
        Error::schema(format!("unknown entity type `{}`", name))
    }

    /// Creates a stale record error.
    pub fn stale_record(entity: impl Into<String>, id: RecordId, reason: impl Into<String>) -> Self {
        Error::StaleRecord {
            entity: entity.into(),
            id,
            reason: reason.into(),
        }
    }

    /// Creates a mapping error.
    pub fn mapping(
        entity: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Mapping {
            entity: entity.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(field: impl Into<String>, expected: DataType, got: DataType) -> Self {
        Error::TypeMismatch {
            field: field.into(),
            expected,
            got,
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true for errors raised by the engine rather than by misuse.
    pub fn is_engine(&self) -> bool {
        matches!(self, Error::Engine(_))
    }
}

impl EngineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        EngineError::Corrupt(message.into())
    }

    pub fn constraint(
        entity: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        EngineError::Constraint {
            entity: entity.into(),
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_field("Person", "nickname");
        assert_eq!(err.to_string(), "invalid field `nickname` on entity `Person`");

        let err = Error::unknown_entity("Ghost");
        assert!(err.to_string().contains("Ghost"));

        let err = Error::stale_record("Person", 7, "already removed");
        assert!(err.to_string().contains("Person#7"));
    }

    #[test]
    fn test_engine_error_conversion() {
        let err: Error = EngineError::SchemaMismatch {
            stored: 1,
            expected: 2,
        }
        .into();
        assert!(err.is_engine());
        assert!(err.to_string().contains("schema version 1"));
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = EngineError::io("/tmp/store.json", io);
        assert!(err.source().is_some());
        assert!(err.to_string().contains("/tmp/store.json"));
    }
}
