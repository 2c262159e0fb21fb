//! Storage configuration and model sources.

use glaze_core::schema::{Model, ObjectModel};
use glaze_core::{Error, Result};
use glaze_storage::{Location, MigrationPolicy, StoreConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Options for opening a storage.
///
/// ```rust
/// use glaze_database::{Location, MigrationPolicy, StorageConfig};
///
/// let config = StorageConfig::from_json(
///     r#"{"location": {"file": "data/notes.json"}, "schema_version": 2, "migration_policy": "lightweight"}"#,
/// )
/// .unwrap();
/// assert_eq!(config.location, Location::File("data/notes.json".into()));
/// assert_eq!(config.migration_policy, MigrationPolicy::Lightweight);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub location: Location,
    pub schema_version: u64,
    pub migration_policy: MigrationPolicy,
    /// Directory that object models are resolved against.
    pub bundle: PathBuf,
}

impl StorageConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::File(path.into()),
            ..Self::default()
        }
    }

    pub fn with_schema_version(mut self, version: u64) -> Self {
        self.schema_version = version;
        self
    }

    pub fn with_migration_policy(mut self, policy: MigrationPolicy) -> Self {
        self.migration_policy = policy;
        self
    }

    pub fn with_bundle(mut self, bundle: impl Into<PathBuf>) -> Self {
        self.bundle = bundle.into();
        self
    }

    /// Parses a configuration. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            Error::invalid_operation(format!("malformed storage configuration: {}", e))
        })
    }

    pub(crate) fn store_config(&self) -> StoreConfig {
        StoreConfig {
            location: self.location.clone(),
            schema_version: self.schema_version,
            migration_policy: self.migration_policy,
        }
    }
}

/// Where a storage's model comes from: an object model to resolve, or a
/// model built in code.
#[derive(Clone, Debug)]
pub enum ModelSource {
    Object(ObjectModel),
    Model(Model),
}

impl ModelSource {
    pub(crate) fn resolve(self, bundle: &Path) -> Result<Model> {
        match self {
            ModelSource::Object(object) => object.load(bundle),
            ModelSource::Model(model) => Ok(model),
        }
    }
}

impl From<ObjectModel> for ModelSource {
    fn from(object: ObjectModel) -> Self {
        ModelSource::Object(object)
    }
}

impl From<Model> for ModelSource {
    fn from(model: Model) -> Self {
        ModelSource::Model(model)
    }
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSource::Object(object) => fmt::Display::fmt(object, f),
            ModelSource::Model(model) => {
                write!(f, "model with {} entities", model.entities().len())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StorageConfig::from_json("{}").unwrap();
        assert_eq!(config, StorageConfig::in_memory());
        assert_eq!(config.migration_policy, MigrationPolicy::Fail);
    }

    #[test]
    fn test_builders() {
        let config = StorageConfig::file("/tmp/x.json")
            .with_schema_version(4)
            .with_migration_policy(MigrationPolicy::Reset)
            .with_bundle("/models");
        let store = config.store_config();
        assert_eq!(store.location, Location::File("/tmp/x.json".into()));
        assert_eq!(store.schema_version, 4);
        assert_eq!(store.migration_policy, MigrationPolicy::Reset);
        assert_eq!(config.bundle, PathBuf::from("/models"));
    }

    #[test]
    fn test_malformed() {
        let err = StorageConfig::from_json(r#"{"schema_version": "two"}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidOperation { .. }));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = StorageConfig::in_memory().with_schema_version(2);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(StorageConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_model_source_display() {
        let source = ModelSource::from(ObjectModel::Named("Notes".into()));
        assert!(source.to_string().contains("Notes"));
        let source = ModelSource::from(Model::default());
        assert_eq!(source.to_string(), "model with 0 entities");
    }
}
