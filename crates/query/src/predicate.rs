//! Predicate definitions for request filtering.

use glaze_core::{DataType, Error, Record, Result, Value};
use std::slice;

/// A test applied to one field value.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Eq(Value),
    Ne(Value),
    Lt(Value),
    Le(Value),
    Gt(Value),
    Ge(Value),
    In(Vec<Value>),
    /// Substring match on string fields.
    Contains(String),
    /// Prefix match on string fields.
    BeginsWith(String),
    IsNull,
    NotNull,
}

impl Condition {
    pub fn eq(value: impl Into<Value>) -> Self {
        Condition::Eq(value.into())
    }

    pub fn ne(value: impl Into<Value>) -> Self {
        Condition::Ne(value.into())
    }

    pub fn lt(value: impl Into<Value>) -> Self {
        Condition::Lt(value.into())
    }

    pub fn le(value: impl Into<Value>) -> Self {
        Condition::Le(value.into())
    }

    pub fn gt(value: impl Into<Value>) -> Self {
        Condition::Gt(value.into())
    }

    pub fn ge(value: impl Into<Value>) -> Self {
        Condition::Ge(value.into())
    }

    pub fn one_of<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Condition::In(values.into_iter().map(Into::into).collect())
    }

    pub fn contains(needle: impl Into<String>) -> Self {
        Condition::Contains(needle.into())
    }

    pub fn begins_with(prefix: impl Into<String>) -> Self {
        Condition::BeginsWith(prefix.into())
    }

    /// Checks that the condition's operands fit a field of type `field_type`.
    ///
    /// Values compare by type first, so an operand of another type would
    /// silently match nothing or everything.
    pub fn check_type(&self, field: &str, field_type: DataType) -> Result<()> {
        let operands: &[Value] = match self {
            Condition::Eq(v)
            | Condition::Ne(v)
            | Condition::Lt(v)
            | Condition::Le(v)
            | Condition::Gt(v)
            | Condition::Ge(v) => slice::from_ref(v),
            Condition::In(values) => values,
            Condition::Contains(_) | Condition::BeginsWith(_) => {
                if field_type != DataType::String {
                    return Err(Error::type_mismatch(field, field_type, DataType::String));
                }
                &[]
            }
            Condition::IsNull | Condition::NotNull => &[],
        };
        for value in operands {
            if let Some(got) = value.data_type() {
                if got != field_type {
                    return Err(Error::type_mismatch(field, field_type, got));
                }
            }
        }
        Ok(())
    }

    /// Evaluates the condition against a field value.
    ///
    /// Ordering comparisons never match a Null field.
    pub fn eval(&self, value: &Value) -> bool {
        match self {
            Condition::Eq(v) => value == v,
            Condition::Ne(v) => value != v,
            Condition::Lt(v) => !value.is_null() && value < v,
            Condition::Le(v) => !value.is_null() && value <= v,
            Condition::Gt(v) => !value.is_null() && value > v,
            Condition::Ge(v) => !value.is_null() && value >= v,
            Condition::In(values) => values.contains(value),
            Condition::Contains(needle) => value
                .as_str()
                .map(|s| s.contains(needle.as_str()))
                .unwrap_or(false),
            Condition::BeginsWith(prefix) => value
                .as_str()
                .map(|s| s.starts_with(prefix.as_str()))
                .unwrap_or(false),
            Condition::IsNull => value.is_null(),
            Condition::NotNull => !value.is_null(),
        }
    }
}

/// A boolean expression over record fields.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Field { field: String, condition: Condition },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    /// Creates a single-field predicate.
    pub fn field(field: impl Into<String>, condition: Condition) -> Self {
        Predicate::Field {
            field: field.into(),
            condition,
        }
    }

    /// Conjunction, flattening nested ANDs.
    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::And(mut left), Predicate::And(right)) => {
                left.extend(right);
                Predicate::And(left)
            }
            (Predicate::And(mut left), right) => {
                left.push(right);
                Predicate::And(left)
            }
            (left, Predicate::And(mut right)) => {
                right.insert(0, left);
                Predicate::And(right)
            }
            (left, right) => Predicate::And(vec![left, right]),
        }
    }

    /// Disjunction, flattening nested ORs.
    pub fn or(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::Or(mut left), Predicate::Or(right)) => {
                left.extend(right);
                Predicate::Or(left)
            }
            (Predicate::Or(mut left), right) => {
                left.push(right);
                Predicate::Or(left)
            }
            (left, right) => Predicate::Or(vec![left, right]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Evaluates the predicate against a record.
    ///
    /// A field the record does not have never matches.
    pub fn eval(&self, record: &Record) -> bool {
        match self {
            Predicate::Field { field, condition } => record
                .get(field)
                .map(|value| condition.eval(value))
                .unwrap_or(false),
            Predicate::And(preds) => preds.iter().all(|p| p.eval(record)),
            Predicate::Or(preds) => preds.iter().any(|p| p.eval(record)),
            Predicate::Not(pred) => !pred.eval(record),
        }
    }

    /// Visits every field condition in this predicate.
    pub fn try_for_each_condition<F>(&self, f: &mut F) -> Result<()>
    where
        F: FnMut(&str, &Condition) -> Result<()>,
    {
        match self {
            Predicate::Field { field, condition } => f(field, condition),
            Predicate::And(preds) | Predicate::Or(preds) => {
                preds.iter().try_for_each(|p| p.try_for_each_condition(f))
            }
            Predicate::Not(pred) => pred.try_for_each_condition(f),
        }
    }

    /// Returns every field name referenced by this predicate.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Field { field, .. } => {
                if !out.contains(&field.as_str()) {
                    out.push(field);
                }
            }
            Predicate::And(preds) | Predicate::Or(preds) => {
                for p in preds {
                    p.collect_fields(out);
                }
            }
            Predicate::Not(pred) => pred.collect_fields(out),
        }
    }
}
