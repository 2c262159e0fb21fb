//! Document engine: keyed JSON documents validated on read.

use crate::constraint::ConstraintChecker;
use crate::engine::{Engine, EngineKind};
use crate::snapshot::{Stored, Table, Tables};
use glaze_core::schema::{EntitySchema, FieldDef, Model};
use glaze_core::{DataType, EngineError, Error, Record, RecordId, Result, Value};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A record body as a JSON object. Null fields are omitted.
pub type Document = Map<String, serde_json::Value>;

#[derive(Serialize, Deserialize)]
struct DocumentDump {
    id: RecordId,
    version: u64,
    body: Document,
}

/// Schema-light engine.
///
/// Writes are checked for required fields, but stored documents are kept
/// as-is across schema changes; a document that no longer fits the entity
/// fails with a mapping error when it is read.
#[derive(Clone, Copy, Debug, Default)]
pub struct DocumentEngine;

impl DocumentEngine {
    pub fn new() -> Self {
        Self
    }
}

fn to_json(entity: &str, field: &str, value: &Value) -> Result<Option<serde_json::Value>> {
    let json = match value {
        Value::Null => return Ok(None),
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Int64(i) | Value::DateTime(i) => serde_json::Value::from(*i),
        Value::Float64(f) => match Number::from_f64(*f) {
            Some(n) => serde_json::Value::Number(n),
            None => {
                return Err(EngineError::constraint(
                    entity,
                    field,
                    format!("{} has no JSON form", f),
                )
                .into())
            }
        },
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Bytes(b) => serde_json::Value::Array(b.iter().map(|x| (*x).into()).collect()),
    };
    Ok(Some(json))
}

fn from_json(schema: &EntitySchema, field: &FieldDef, json: &serde_json::Value) -> Result<Value> {
    let mismatch = || {
        Error::mapping(
            schema.name(),
            field.name(),
            format!("expected {}, found {}", field.data_type().name(), json),
        )
    };
    let value = match field.data_type() {
        DataType::Boolean => Value::Boolean(json.as_bool().ok_or_else(mismatch)?),
        DataType::Int64 => Value::Int64(json.as_i64().ok_or_else(mismatch)?),
        DataType::DateTime => Value::DateTime(json.as_i64().ok_or_else(mismatch)?),
        DataType::Float64 => Value::Float64(json.as_f64().ok_or_else(mismatch)?),
        DataType::String => Value::String(json.as_str().ok_or_else(mismatch)?.to_string()),
        DataType::Bytes => {
            let items = json.as_array().ok_or_else(mismatch)?;
            let bytes = items
                .iter()
                .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect::<Option<Vec<u8>>>()
                .ok_or_else(mismatch)?;
            Value::Bytes(bytes)
        }
    };
    Ok(value)
}

impl Engine for DocumentEngine {
    type Native = Document;

    fn kind(&self) -> EngineKind {
        EngineKind::Document
    }

    fn encode(&self, record: &Record) -> Result<Document> {
        let schema = record.schema();
        ConstraintChecker::check_record(schema, record.values())?;
        let mut doc = Document::new();
        for (field, value) in schema.fields().iter().zip(record.values()) {
            if let Some(json) = to_json(schema.name(), field.name(), value)? {
                doc.insert(field.name().to_string(), json);
            }
        }
        Ok(doc)
    }

    fn decode(
        &self,
        schema: &Arc<EntitySchema>,
        id: RecordId,
        version: u64,
        doc: &Document,
    ) -> Result<Record> {
        let mut values = Vec::with_capacity(schema.fields().len());
        for field in schema.fields() {
            let value = match doc.get(field.name()) {
                None | Some(serde_json::Value::Null) if field.is_optional() => Value::Null,
                None | Some(serde_json::Value::Null) => {
                    return Err(Error::mapping(
                        schema.name(),
                        field.name(),
                        "required field is missing",
                    ))
                }
                Some(json) => from_json(schema, field, json)?,
            };
            values.push(value);
        }
        Record::from_parts(schema.clone(), id, version, values)
    }

    fn check_table(&self, _schema: &EntitySchema, _table: &Table<Document>) -> Result<()> {
        Ok(())
    }

    fn dump(&self, _model: &Model, tables: &Tables<Document>) -> Result<serde_json::Value> {
        let collections: BTreeMap<&str, Vec<DocumentDump>> = tables
            .iter()
            .map(|(name, table)| {
                let docs = table
                    .iter()
                    .map(|(id, s)| DocumentDump {
                        id: *id,
                        version: s.version,
                        body: s.native.clone(),
                    })
                    .collect();
                (name.as_str(), docs)
            })
            .collect();
        serde_json::to_value(collections)
            .map_err(|e| EngineError::corrupt(format!("cannot serialize collections: {}", e)).into())
    }

    fn load(
        &self,
        model: &Model,
        data: serde_json::Value,
        migrate: bool,
    ) -> Result<Tables<Document>> {
        let collections: BTreeMap<String, Vec<DocumentDump>> = serde_json::from_value(data)
            .map_err(|e| EngineError::corrupt(format!("malformed collections: {}", e)))?;

        let mut tables = Tables::new();
        for (name, docs) in collections {
            if model.entity(&name).is_none() {
                if migrate {
                    tracing::debug!(entity = %name, "dropping collection absent from model");
                    continue;
                }
                return Err(EngineError::corrupt(format!("unknown collection `{}`", name)).into());
            }
            let table = docs
                .into_iter()
                .map(|d| {
                    (
                        d.id,
                        Stored {
                            version: d.version,
                            native: d.body,
                        },
                    )
                })
                .collect();
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
