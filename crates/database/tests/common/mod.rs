#![allow(dead_code)]

use glaze_database::schema::{EntitySchema, Model};
use glaze_database::{ChangeSet, Changes, DataType, Entity, Record, Result, Value};
use std::time::{Duration, Instant};

pub const WAIT: Duration = Duration::from_secs(5);
pub const QUIET: Duration = Duration::from_millis(200);

#[derive(Clone, Debug, PartialEq)]
pub struct Person {
    pub name: String,
    pub age: Option<i64>,
}

impl Person {
    pub fn new(name: &str, age: Option<i64>) -> Self {
        Self {
            name: name.to_string(),
            age,
        }
    }
}

impl Entity for Person {
    const NAME: &'static str = "Person";

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            name: record.require_str("name")?.to_string(),
            age: record.optional_i64("age")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub title: String,
}

impl Entity for Note {
    const NAME: &'static str = "Note";

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            title: record.require_str("title")?.to_string(),
        })
    }
}

pub fn person_schema() -> EntitySchema {
    EntitySchema::builder("Person")
        .unique_field("name", DataType::String)
        .optional_field("age", DataType::Int64)
        .build()
        .unwrap()
}

pub fn note_schema() -> EntitySchema {
    EntitySchema::builder("Note")
        .field("title", DataType::String)
        .build()
        .unwrap()
}

pub fn model() -> Model {
    Model::new(vec![person_schema(), note_schema()]).unwrap()
}

/// Fills in a person record.
pub fn person(name: &str, age: Option<i64>) -> impl FnOnce(&mut Record) -> Result<()> + '_ {
    move |r: &mut Record| {
        r.set("name", name)?;
        if let Some(age) = age {
            r.set("age", age)?;
        }
        Ok(())
    }
}

pub fn next<T>(changes: &mut Changes<T>) -> ChangeSet<T> {
    changes
        .recv_timeout(WAIT)
        .expect("timed out waiting for a change set")
}

pub fn assert_quiet<T: std::fmt::Debug>(changes: &mut Changes<T>) {
    if let Ok(extra) = changes.recv_timeout(QUIET) {
        panic!("unexpected change set: {:?}", extra);
    }
}

/// Polls `condition` until it holds or the wait expires.
pub fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// A timestamped measurement.
#[derive(Clone, Debug, PartialEq)]
pub struct Reading {
    pub score: f64,
    pub at: i64,
}

impl Entity for Reading {
    const NAME: &'static str = "Reading";

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            score: record.require_f64("score")?,
            at: record.require_datetime("at")?,
        })
    }
}

pub fn reading_model() -> Model {
    Model::new(vec![EntitySchema::builder("Reading")
        .field("score", DataType::Float64)
        .field("at", DataType::DateTime)
        .build()
        .unwrap()])
    .unwrap()
}

/// Fills in a reading record.
pub fn reading(score: f64, at: i64) -> impl FnOnce(&mut Record) -> Result<()> {
    move |r: &mut Record| {
        r.set("score", score)?;
        r.set("at", Value::DateTime(at))
    }
}
