//! Resolved object model: the set of entity schemas a storage knows about.

use super::entity::EntitySchema;
use crate::error::{EngineError, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// File suffix recognised for model files.
pub const MODEL_FILE_SUFFIX: &str = ".model.json";

/// On-disk layout of a model file.
#[derive(Serialize, Deserialize)]
struct ModelFile {
    entities: Vec<EntitySchema>,
}

/// A validated set of entity schemas.
#[derive(Clone, Debug, Default)]
pub struct Model {
    entities: Vec<Arc<EntitySchema>>,
}

impl Model {
    /// Creates a model, rejecting invalid schemas and duplicate entity names.
    pub fn new(entities: Vec<EntitySchema>) -> Result<Self> {
        let mut model = Model::default();
        for schema in entities {
            schema.validate()?;
            if model.entity(schema.name()).is_some() {
                return Err(Error::schema(format!(
                    "duplicate entity `{}` in model",
                    schema.name()
                )));
            }
            model.entities.push(Arc::new(schema));
        }
        Ok(model)
    }

    /// Parses a model from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ModelFile = serde_json::from_str(json)
            .map_err(|e| Error::schema(format!("malformed model: {}", e)))?;
        Self::new(file.entities)
    }

    /// Reads and parses a model file.
    pub fn load_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
        Self::from_json(&json)
            .map_err(|e| Error::schema(format!("{}: {}", path.display(), e)))
    }

    /// Serializes the model back to JSON.
    pub fn to_json(&self) -> String {
        let file = ModelFile {
            entities: self.entities.iter().map(|e| (**e).clone()).collect(),
        };
        // A ModelFile holds only strings, enums and bools.
        serde_json::to_string_pretty(&file).unwrap_or_default()
    }

    /// Merges several models into one.
    ///
    /// An entity declared more than once must be declared identically.
    pub fn merge(models: impl IntoIterator<Item = Model>) -> Result<Self> {
        let mut merged = Model::default();
        for model in models {
            for schema in model.entities {
                match merged.entity(schema.name()) {
                    Some(existing) if **existing == *schema => {}
                    Some(_) => {
                        return Err(Error::schema(format!(
                            "conflicting definitions of entity `{}`",
                            schema.name()
                        )))
                    }
                    None => merged.entities.push(schema),
                }
            }
        }
        Ok(merged)
    }

    /// Returns all entity schemas in declaration order.
    #[inline]
    pub fn entities(&self) -> &[Arc<EntitySchema>] {
        &self.entities
    }

    /// Gets an entity schema by name.
    pub fn entity(&self, name: &str) -> Option<&Arc<EntitySchema>> {
        self.entities.iter().find(|e| e.name() == name)
    }

    /// Gets an entity schema by name, failing with a schema error.
    pub fn require(&self, name: &str) -> Result<&Arc<EntitySchema>> {
        self.entity(name).ok_or_else(|| Error::unknown_entity(name))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
