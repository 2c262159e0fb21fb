//! Object model loading strategies.

use super::model::{Model, MODEL_FILE_SUFFIX};
use crate::error::{EngineError, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a storage's object model comes from.
///
/// - `Named`: the model `<bundle>/<name>.model.json`
/// - `Merged`: every model file in the given bundle directories, or in the
///   storage's bundle when `None`
/// - `Url`: the model file at the given path
///
/// It is resolved once, when the storage is constructed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectModel {
    Named(String),
    Merged(Option<Vec<PathBuf>>),
    Url(PathBuf),
}

impl ObjectModel {
    /// Resolves the model, using `bundle` as the default directory.
    pub fn load(&self, bundle: &Path) -> Result<Model> {
        match self {
            ObjectModel::Named(name) => {
                Model::load_file(&bundle.join(format!("{}{}", name, MODEL_FILE_SUFFIX)))
            }
            ObjectModel::Merged(bundles) => {
                let dirs = match bundles {
                    Some(dirs) => dirs.clone(),
                    None => vec![bundle.to_path_buf()],
                };
                let mut models = Vec::new();
                for dir in &dirs {
                    for path in model_files(dir)? {
                        models.push(Model::load_file(&path)?);
                    }
                }
                if models.is_empty() {
                    return Err(Error::schema(format!(
                        "no model files found in {:?}",
                        dirs
                    )));
                }
                Model::merge(models)
            }
            ObjectModel::Url(path) => Model::load_file(path),
        }
    }
}

/// Lists model files in a directory, sorted by file name.
fn model_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| EngineError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| EngineError::io(dir, e))?.path();
        let is_model = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with(MODEL_FILE_SUFFIX))
            .unwrap_or(false);
        if is_model {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

impl fmt::Display for ObjectModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectModel::Named(name) => write!(f, "object model named: {} in the bundle", name),
            ObjectModel::Merged(_) => write!(f, "merged object models in the provided bundles"),
            ObjectModel::Url(path) => write!(f, "object model at: {}", path.display()),
        }
    }
}
