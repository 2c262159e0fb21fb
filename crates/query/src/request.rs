//! Typed requests and their untyped query form.

use crate::executor;
use crate::predicate::{Condition, Predicate};
use glaze_core::schema::EntitySchema;
use glaze_core::{Entity, Error, Record, Result};
use std::fmt;
use std::marker::PhantomData;

/// Sort key and direction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortDescriptor {
    pub field: String,
    pub ascending: bool,
}

/// Engine-facing description of a request over one entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    entity: String,
    predicate: Option<Predicate>,
    sort: Option<SortDescriptor>,
    offset: usize,
    limit: Option<usize>,
}

impl Query {
    /// Creates a query selecting every record of `entity`.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            predicate: None,
            sort: None,
            offset: 0,
            limit: None,
        }
    }

    #[inline]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    #[inline]
    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    #[inline]
    pub fn sort(&self) -> Option<&SortDescriptor> {
        self.sort.as_ref()
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Returns every field the query references.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields = self
            .predicate
            .as_ref()
            .map(Predicate::fields)
            .unwrap_or_default();
        if let Some(sort) = &self.sort {
            if !fields.contains(&sort.field.as_str()) {
                fields.push(&sort.field);
            }
        }
        fields
    }

    /// Checks the query against the entity schema it will run on.
    ///
    /// Fails with `Schema` on an entity mismatch, `InvalidField` on the
    /// first field the entity does not declare, and `TypeMismatch` on a
    /// condition operand of another type than its field.
    pub fn validate(&self, schema: &EntitySchema) -> Result<()> {
        if schema.name() != self.entity {
            return Err(Error::schema(format!(
                "query targets `{}` but schema is `{}`",
                self.entity,
                schema.name()
            )));
        }
        for field in self.fields() {
            schema.check_field(field)?;
        }
        match &self.predicate {
            Some(predicate) => predicate.try_for_each_condition(&mut |field, condition| {
                condition.check_type(field, schema.check_field(field)?.data_type())
            }),
            None => Ok(()),
        }
    }

    /// Returns true if the record passes the predicate.
    pub fn matches(&self, record: &Record) -> bool {
        self.predicate
            .as_ref()
            .map(|p| p.eval(record))
            .unwrap_or(true)
    }

    /// Runs filter, sort, offset and limit over the given records.
    pub fn execute(&self, records: impl IntoIterator<Item = Record>) -> Vec<Record> {
        let filtered = executor::filter(records, self.predicate.as_ref());
        let sorted = executor::sort(filtered, self.sort.as_ref());
        executor::paginate(sorted, self.offset, self.limit)
    }

    fn and_predicate(&mut self, predicate: Predicate) {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
    }
}

/// An immutable request for records of entity `T`.
pub struct Request<T: Entity> {
    query: Query,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Request<T> {
    /// Creates a request matching every record of `T`.
    pub fn new() -> Self {
        Self {
            query: Query::new(T::NAME),
            _entity: PhantomData,
        }
    }

    /// Returns a new request that also requires `field` to satisfy `condition`.
    pub fn filtered(&self, field: impl Into<String>, condition: Condition) -> Self {
        self.filtered_with(Predicate::field(field, condition))
    }

    /// Returns a new request ANDed with an arbitrary predicate.
    pub fn filtered_with(&self, predicate: Predicate) -> Self {
        let mut query = self.query.clone();
        query.and_predicate(predicate);
        Self::from_query(query)
    }

    /// Returns a new request sorted by `field`. Replaces any previous sort.
    pub fn sorted(&self, field: impl Into<String>, ascending: bool) -> Self {
        let mut query = self.query.clone();
        query.sort = Some(SortDescriptor {
            field: field.into(),
            ascending,
        });
        Self::from_query(query)
    }

    /// Returns a new request skipping the first `count` results.
    pub fn offset(&self, count: usize) -> Self {
        let mut query = self.query.clone();
        query.offset = count;
        Self::from_query(query)
    }

    /// Returns a new request returning at most `count` results.
    pub fn limited(&self, count: usize) -> Self {
        let mut query = self.query.clone();
        query.limit = Some(count);
        Self::from_query(query)
    }

    #[inline]
    pub fn query(&self) -> &Query {
        &self.query
    }

    fn from_query(query: Query) -> Self {
        Self {
            query,
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Default for Request<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Clone for Request<T> {
    fn clone(&self) -> Self {
        Self::from_query(self.query.clone())
    }
}

impl<T: Entity> fmt::Debug for Request<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("entity", &T::NAME)
            .field("query", &self.query)
            .finish()
    }
}
