//! The contract every storage engine implements.

use crate::snapshot::{Table, Tables};
use glaze_core::schema::{EntitySchema, Model};
use glaze_core::{Record, RecordId, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifies an engine implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Relational,
    Document,
}

impl EngineKind {
    /// Format tag written into persisted files.
    pub fn format(&self) -> &'static str {
        match self {
            EngineKind::Relational => "glaze-relational/1",
            EngineKind::Document => "glaze-document/1",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Relational => f.write_str("relational"),
            EngineKind::Document => f.write_str("document"),
        }
    }
}

/// A storage engine: how records are represented, constrained and persisted.
///
/// Records cross this boundary in both directions; the engine's native form
/// never leaves the storage crate.
pub trait Engine: Send + Sync + 'static {
    /// Engine-native representation of one record body.
    type Native: Clone + fmt::Debug + Send + Sync + 'static;

    fn kind(&self) -> EngineKind;

    /// Converts a staged record to native form.
    ///
    /// Per-record checks (field types, required fields) happen here.
    fn encode(&self, record: &Record) -> Result<Self::Native>;

    /// Converts a stored body back into a detached record.
    fn decode(
        &self,
        schema: &Arc<EntitySchema>,
        id: RecordId,
        version: u64,
        native: &Self::Native,
    ) -> Result<Record>;

    /// Checks constraints spanning several records of one table before commit.
    fn check_table(&self, schema: &EntitySchema, table: &Table<Self::Native>) -> Result<()>;

    /// Serializes committed tables.
    fn dump(&self, model: &Model, tables: &Tables<Self::Native>) -> Result<serde_json::Value>;

    /// Restores tables written by `dump`.
    ///
    /// With `migrate` set, data written under an older schema is adapted to
    /// `model`; otherwise any disagreement is reported as corruption.
    fn load(
        &self,
        model: &Model,
        data: serde_json::Value,
        migrate: bool,
    ) -> Result<Tables<Self::Native>>;
}
