//! Pagination stage.

use glaze_core::Record;

/// Applies OFFSET then LIMIT.
pub fn paginate(mut records: Vec<Record>, offset: usize, limit: Option<usize>) -> Vec<Record> {
    let len = records.len();
    let start = offset.min(len);
    let end = match limit {
        Some(limit) => start.saturating_add(limit).min(len),
        None => len,
    };

    // Truncate tail first, then drop the head
    records.truncate(end);
    if start > 0 {
        records.drain(..start);
    }
    records
}
