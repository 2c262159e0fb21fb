//! Change sets delivered to observers of a query.
//!
//! The first delivery is always `Initial` with the full result. Each later
//! `Update` turns the previous result into the next one when applied in
//! order: deletions (old indices, applied from highest to lowest), then
//! insertions (new indices, ascending), then modifications (new indices).

use crate::diff::IndexDiff;
use glaze_core::{Error, Result};
use std::sync::Arc;

/// One notification from an observable query.
#[derive(Clone, Debug)]
pub enum ChangeSet<T> {
    /// The full result at subscription time.
    Initial(Vec<T>),
    /// Positional changes since the previous delivery.
    Update {
        deletions: Vec<usize>,
        insertions: Vec<(usize, T)>,
        modifications: Vec<(usize, T)>,
    },
    /// Terminal failure. Nothing is delivered after it.
    Error(Arc<Error>),
}

impl<T> ChangeSet<T> {
    /// Builds an update from an index diff, resolving new-list items via `item`.
    pub fn from_diff(diff: &IndexDiff, mut item: impl FnMut(usize) -> Result<T>) -> Result<Self> {
        let insertions = diff
            .insertions
            .iter()
            .map(|&i| item(i).map(|t| (i, t)))
            .collect::<Result<Vec<_>>>()?;
        let modifications = diff
            .modifications
            .iter()
            .map(|&i| item(i).map(|t| (i, t)))
            .collect::<Result<Vec<_>>>()?;
        Ok(ChangeSet::Update {
            deletions: diff.deletions.clone(),
            insertions,
            modifications,
        })
    }

    #[inline]
    pub fn is_initial(&self) -> bool {
        matches!(self, ChangeSet::Initial(_))
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, ChangeSet::Error(_))
    }

    pub fn error(&self) -> Option<&Arc<Error>> {
        match self {
            ChangeSet::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Returns true for an update that changes nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            ChangeSet::Update {
                deletions,
                insertions,
                modifications,
            } => deletions.is_empty() && insertions.is_empty() && modifications.is_empty(),
            _ => false,
        }
    }

    /// Converts every carried item.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> ChangeSet<U> {
        match self {
            ChangeSet::Initial(items) => ChangeSet::Initial(items.into_iter().map(f).collect()),
            ChangeSet::Update {
                deletions,
                insertions,
                modifications,
            } => ChangeSet::Update {
                deletions,
                insertions: insertions.into_iter().map(|(i, t)| (i, f(t))).collect(),
                modifications: modifications.into_iter().map(|(i, t)| (i, f(t))).collect(),
            },
            ChangeSet::Error(e) => ChangeSet::Error(e),
        }
    }
}

impl<T: Clone> ChangeSet<T> {
    /// Applies this change set to a list holding the previous result.
    ///
    /// `Error` leaves the list untouched.
    pub fn apply(&self, list: &mut Vec<T>) {
        match self {
            ChangeSet::Initial(items) => *list = items.clone(),
            ChangeSet::Update {
                deletions,
                insertions,
                modifications,
            } => {
                let mut deletions = deletions.clone();
                deletions.sort_unstable_by(|a, b| b.cmp(a));
                for i in deletions {
                    if i < list.len() {
                        list.remove(i);
                    }
                }
                let mut insertions: Vec<_> = insertions.iter().collect();
                insertions.sort_by_key(|(i, _)| *i);
                for (i, item) in insertions {
                    let at = (*i).min(list.len());
                    list.insert(at, item.clone());
                }
                for (i, item) in modifications {
                    if let Some(slot) = list.get_mut(*i) {
                        *slot = item.clone();
                    }
                }
            }
            ChangeSet::Error(_) => {}
        }
    }
}
