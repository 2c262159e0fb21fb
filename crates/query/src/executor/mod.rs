//! Request execution over decoded records.
//!
//! Execution runs filter, then sort, then pagination. Each stage is a plain
//! function over owned records so engines can feed any iterator in.

mod filter;
mod limit;
mod sort;

pub use filter::filter;
pub use limit::paginate;
pub use sort::{compare_records, sort};
