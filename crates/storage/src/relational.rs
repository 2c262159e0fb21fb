//! Relational engine: positional rows in per-entity tables.

use crate::constraint::ConstraintChecker;
use crate::engine::{Engine, EngineKind};
use crate::snapshot::{Stored, Table, Tables};
use glaze_core::schema::{EntitySchema, Model};
use glaze_core::{EngineError, Record, RecordId, Result, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A record body laid out in schema field order.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Persisted layout of one table.
#[derive(Serialize, Deserialize)]
struct TableDump {
    columns: Vec<String>,
    rows: Vec<(RecordId, u64, Vec<Value>)>,
}

/// Strict engine: every write is checked against the schema, and unique
/// fields are enforced at commit.
#[derive(Clone, Copy, Debug, Default)]
pub struct RelationalEngine;

impl RelationalEngine {
    pub fn new() -> Self {
        Self
    }

    /// Maps a stored row onto the current schema.
    ///
    /// `positions[i]` is the stored column of schema field `i`, if any.
    fn remap(
        schema: &EntitySchema,
        positions: &[Option<usize>],
        stored: Vec<Value>,
    ) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(positions.len());
        for (field, position) in schema.fields().iter().zip(positions) {
            let value = match position.and_then(|p| stored.get(p)) {
                Some(value) if value.fits(field.data_type()) => value.clone(),
                Some(value) => {
                    return Err(EngineError::corrupt(format!(
                        "column {}.{} holds {:?}, expected {}",
                        schema.name(),
                        field.name(),
                        value,
                        field.data_type().name()
                    ))
                    .into())
                }
                None if field.is_optional() => Value::Null,
                None => Value::default_for_type(field.data_type()),
            };
            values.push(value);
        }
        Ok(values)
    }
}

impl Engine for RelationalEngine {
    type Native = Row;

    fn kind(&self) -> EngineKind {
        EngineKind::Relational
    }

    fn encode(&self, record: &Record) -> Result<Row> {
        ConstraintChecker::check_record(record.schema(), record.values())?;
        Ok(Row::new(record.values().to_vec()))
    }

    fn decode(
        &self,
        schema: &Arc<EntitySchema>,
        id: RecordId,
        version: u64,
        row: &Row,
    ) -> Result<Record> {
        Record::from_parts(schema.clone(), id, version, row.values.clone())
    }

    fn check_table(&self, schema: &EntitySchema, table: &Table<Row>) -> Result<()> {
        if !schema.fields().iter().any(|f| f.is_unique()) {
            return Ok(());
        }
        let rows = table.iter().map(|(id, s)| (*id, s.native.values()));
        ConstraintChecker::check_unique(schema, rows)
    }

    fn dump(&self, model: &Model, tables: &Tables<Row>) -> Result<serde_json::Value> {
        let mut out = BTreeMap::new();
        for schema in model.entities() {
            let columns = schema.fields().iter().map(|f| f.name().to_string()).collect();
            let mut rows = Vec::new();
            for (id, s) in tables.get(schema.name()).into_iter().flat_map(|t| t.iter()) {
                // serde_json would write non-finite floats as null.
                for (field, value) in schema.fields().iter().zip(s.native.values()) {
                    ConstraintChecker::check_finite(schema, field.name(), value)?;
                }
                rows.push((*id, s.version, s.native.values.clone()));
            }
            out.insert(schema.name().to_string(), TableDump { columns, rows });
        }
        serde_json::to_value(out)
            .map_err(|e| EngineError::corrupt(format!("cannot serialize tables: {}", e)).into())
    }

    fn load(&self, model: &Model, data: serde_json::Value, migrate: bool) -> Result<Tables<Row>> {
        let dumps: BTreeMap<String, TableDump> = serde_json::from_value(data)
            .map_err(|e| EngineError::corrupt(format!("malformed tables: {}", e)))?;

        let mut tables = Tables::new();
        for (name, dump) in dumps {
            let Some(schema) = model.entity(&name) else {
                if migrate {
                    tracing::debug!(entity = %name, "dropping table absent from model");
                    continue;
                }
                return Err(EngineError::corrupt(format!("unknown table `{}`", name)).into());
            };

            let positions: Vec<Option<usize>> = schema
                .fields()
                .iter()
                .map(|f| dump.columns.iter().position(|c| c == f.name()))
                .collect();
            let exact = dump.columns.len() == positions.len()
                && positions.iter().enumerate().all(|(i, p)| *p == Some(i));
            if !exact && !migrate {
                return Err(EngineError::corrupt(format!(
                    "columns of `{}` do not match the model",
                    name
                ))
                .into());
            }

            let mut table = Table::new();
            for (id, version, values) in dump.rows {
                let values = Self::remap(schema, &positions, values)?;
                table.insert(id, Stored { version, native: Row::new(values) });
            }
            tables.insert(name, Arc::new(table));
        }

        for schema in model.entities() {
            tables
                .entry(schema.name().to_string())
                .or_insert_with(|| Arc::new(Table::new()));
        }
        Ok(tables)
    }
}
