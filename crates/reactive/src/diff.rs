//! Positional diff between two ordered results.

use glaze_core::{RecordId, RecordKey};
use hashbrown::HashMap;

/// Index-level changes turning `old` into `new`.
///
/// `deletions` index the old list, `insertions` and `modifications` the new
/// one. All three are ascending.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexDiff {
    pub deletions: Vec<usize>,
    pub insertions: Vec<usize>,
    pub modifications: Vec<usize>,
}

impl IndexDiff {
    pub fn is_empty(&self) -> bool {
        self.deletions.is_empty() && self.insertions.is_empty() && self.modifications.is_empty()
    }

    pub fn len(&self) -> usize {
        self.deletions.len() + self.insertions.len() + self.modifications.len()
    }
}

/// Computes the diff between two results identified by record keys.
///
/// Records present in both lists stay in place when they belong to the
/// longest run whose relative order is unchanged; the rest are reported as
/// a deletion plus an insertion. A kept record whose version changed is a
/// modification.
pub fn diff(old: &[RecordKey], new: &[RecordKey]) -> IndexDiff {
    let old_pos: HashMap<RecordId, usize> =
        old.iter().enumerate().map(|(i, k)| (k.id, i)).collect();

    // (new index, old index) for records in both lists, in new order.
    let common: Vec<(usize, usize)> = new
        .iter()
        .enumerate()
        .filter_map(|(n, k)| old_pos.get(&k.id).map(|&o| (n, o)))
        .collect();
    let old_order: Vec<usize> = common.iter().map(|&(_, o)| o).collect();
    let kept_flags = longest_increasing(&old_order);

    let mut kept_old = vec![false; old.len()];
    let mut kept_new = vec![false; new.len()];
    let mut modifications = Vec::new();
    for (&(n, o), kept) in common.iter().zip(kept_flags) {
        if kept {
            kept_old[o] = true;
            kept_new[n] = true;
            if old[o].version != new[n].version {
                modifications.push(n);
            }
        }
    }

    IndexDiff {
        deletions: (0..old.len()).filter(|&i| !kept_old[i]).collect(),
        insertions: (0..new.len()).filter(|&i| !kept_new[i]).collect(),
        modifications,
    }
}

/// Marks the members of one longest strictly increasing subsequence.
fn longest_increasing(seq: &[usize]) -> Vec<bool> {
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; seq.len()];
    for (i, &value) in seq.iter().enumerate() {
        let pos = tails.partition_point(|&t| seq[t] < value);
        prev[i] = pos.checked_sub(1).map(|p| tails[p]);
        if pos == tails.len() {
            tails.push(i);
        } else {
            tails[pos] = i;
        }
    }

    let mut members = vec![false; seq.len()];
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        members[i] = true;
        cursor = prev[i];
    }
    members
}
