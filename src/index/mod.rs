//! [`Index`]: an ordered or unordered mapping from key to row position,
//! supporting grouping and cogrouping.

mod cogroup;

pub use cogroup::{cogroup, CogroupRun, CogroupState, Cogrouper};

use std::collections::HashMap;
use std::hash::Hash;

/// `keys[i]` is the key at logical position `i`; `indices[i]` is the
/// underlying row into the associated [`Column`](crate::column::Column).
/// When `ordered`, `keys` is non-decreasing under key order and `cogroup`
/// expects this.
#[derive(Debug, Clone)]
pub struct Index<K> {
    keys: Vec<K>,
    indices: Vec<usize>,
    ordered: bool,
    lookup: Option<HashMap<K, usize>>,
}

impl<K: Clone + Eq + Hash> Index<K> {
    /// Builds an unordered index with identity row addressing
    /// (`indices[i] == i`). A lookup map is built once, up front, so
    /// `get` is O(1) for unordered indices.
    pub fn from_unordered(keys: Vec<K>) -> Index<K> {
        let indices = (0..keys.len()).collect();
        let lookup = keys
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, k)| (k, i))
            .collect();
        Index {
            keys,
            indices,
            ordered: false,
            lookup: Some(lookup),
        }
    }
}

impl<K: Clone + Ord> Index<K> {
    /// Builds an ordered index with identity row addressing, trusting the
    /// caller that `keys` is already non-decreasing.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `keys` is not sorted. A caller claiming
    /// `ordered` falsely is a contract violation, not recoverable data.
    pub fn ordered(keys: Vec<K>) -> Index<K> {
        debug_assert!(
            keys.windows(2).all(|w| w[0] <= w[1]),
            "Index::ordered requires non-decreasing keys"
        );
        let indices = (0..keys.len()).collect();
        Index {
            keys,
            indices,
            ordered: true,
            lookup: None,
        }
    }

    /// A stable sort by key: equal keys keep their relative insertion
    /// order.
    pub fn sorted(&self) -> Index<K> {
        let mut perm: Vec<usize> = (0..self.keys.len()).collect();
        perm.sort_by(|&a, &b| self.keys[a].cmp(&self.keys[b]));
        let keys = perm.iter().map(|&i| self.keys[i].clone()).collect();
        let indices = perm.iter().map(|&i| self.indices[i]).collect();
        Index {
            keys,
            indices,
            ordered: true,
            lookup: None,
        }
    }

    /// Logical position of the first occurrence of `k`, if present.
    /// Binary search for ordered indices; the precomputed lookup map for
    /// unordered ones.
    pub fn get(&self, k: &K) -> Option<usize>
    where
        K: Eq + Hash,
    {
        if self.ordered {
            let pos = self.keys.partition_point(|x| x < k);
            (pos < self.keys.len() && &self.keys[pos] == k).then_some(pos)
        } else {
            self.lookup.as_ref().and_then(|m| m.get(k)).copied()
        }
    }

    /// Walks contiguous runs of equal keys, returning
    /// `(key, start, end)` logical-position ranges.
    ///
    /// # Panics
    ///
    /// Panics if the index is not ordered. Grouping an unordered index is
    /// a contract violation; sort it first.
    pub fn group_runs(&self) -> Vec<(K, usize, usize)> {
        assert!(self.ordered, "group_runs requires an ordered index");
        let mut runs = Vec::new();
        let mut start = 0;
        while start < self.keys.len() {
            let mut end = start + 1;
            while end < self.keys.len() && self.keys[end] == self.keys[start] {
                end += 1;
            }
            runs.push((self.keys[start].clone(), start, end));
            start = end;
        }
        runs
    }
}

impl<K: Clone> Index<K> {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn ordered_flag(&self) -> bool {
        self.ordered
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn row_indices(&self) -> &[usize] {
        &self.indices
    }

    /// The underlying row for logical position `i`.
    pub fn index_at(&self, i: usize) -> usize {
        self.indices[i]
    }

    /// Iterates `(key, row)` pairs in logical position order.
    pub fn foreach(&self, mut f: impl FnMut(&K, usize)) {
        for i in 0..self.keys.len() {
            f(&self.keys[i], self.indices[i]);
        }
    }

    /// Selects logical positions `positions` into a new index, preserving
    /// whatever key/row pairing they referenced.
    ///
    /// # Panics
    ///
    /// Panics if any entry of `positions` is out of range.
    pub fn take(&self, positions: &[usize]) -> Index<K> {
        let keys = positions.iter().map(|&p| self.keys[p].clone()).collect();
        let indices = positions.iter().map(|&p| self.indices[p]).collect();
        Index {
            keys,
            indices,
            ordered: false,
            lookup: None,
        }
    }

    /// Resets row addressing to identity (`0..len`), keeping keys and the
    /// `ordered` flag. Used after compacting the backing column, to
    /// reclaim the indirection a reindex view held onto.
    pub fn reset_indices(&self) -> Index<K> {
        Index {
            keys: self.keys.clone(),
            indices: (0..self.keys.len()).collect(),
            ordered: self.ordered,
            lookup: None,
        }
    }

    /// Builds an index directly from parts, for callers (joins, merges)
    /// that already have `(keys, indices)` in hand.
    pub(crate) fn from_parts(keys: Vec<K>, indices: Vec<usize>, ordered: bool) -> Index<K> {
        Index {
            keys,
            indices,
            ordered,
            lookup: None,
        }
    }
}
