//! Sort stage.

use crate::request::SortDescriptor;
use glaze_core::{Record, Value};
use std::cmp::Ordering;

/// Compares two records by the sort key, breaking ties by record id.
///
/// Without a sort key records compare by id, which is insertion order.
pub fn compare_records(a: &Record, b: &Record, sort: Option<&SortDescriptor>) -> Ordering {
    if let Some(sort) = sort {
        let av = a.get(&sort.field).unwrap_or(&Value::Null);
        let bv = b.get(&sort.field).unwrap_or(&Value::Null);
        let cmp = av.cmp(bv);
        if cmp != Ordering::Equal {
            return if sort.ascending { cmp } else { cmp.reverse() };
        }
    }
    a.id().cmp(&b.id())
}

/// Sorts records by the descriptor.
pub fn sort(mut records: Vec<Record>, sort: Option<&SortDescriptor>) -> Vec<Record> {
    records.sort_by(|a, b| compare_records(a, b, sort));
    records
}
