//! [`ColumnBuilder`]: the only way to produce a [`Dense`](super::Dense)
//! column. Owned by one caller, not thread-safe, immutable once frozen by
//! [`ColumnBuilder::result`], the same builder-then-freeze lifecycle used
//! for Arrow array builders.

use crate::{cell::Cell, column::Column, mask::Mask};

/// Accepts `Value`/`NA`/`NM` appends and produces a dense [`Column`] whose
/// row `i` is exactly the `i`-th append.
pub struct ColumnBuilder<A> {
    values: Vec<A>,
    na_mask: Mask,
    nm_mask: Mask,
}

impl<A: Default> ColumnBuilder<A> {
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            na_mask: Mask::new(),
            nm_mask: Mask::new(),
        }
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            values: Vec::with_capacity(n),
            na_mask: Mask::new(),
            nm_mask: Mask::new(),
        }
    }

    /// Reserves capacity for `n` more appends.
    pub fn size_hint(&mut self, n: usize) {
        self.values.reserve(n);
    }

    pub fn add_value(&mut self, v: A) {
        self.values.push(v);
    }

    pub fn add_na(&mut self) {
        let row = self.values.len();
        self.values.push(A::default());
        self.na_mask.insert(row);
    }

    pub fn add_nm(&mut self) {
        let row = self.values.len();
        self.values.push(A::default());
        self.nm_mask.insert(row);
    }

    pub fn add_non_value(&mut self, nv: super::NonValue) {
        match nv {
            super::NonValue::NA => self.add_na(),
            super::NonValue::NM => self.add_nm(),
        }
    }

    pub fn add(&mut self, cell: Cell<A>) {
        match cell {
            Cell::Value(v) => self.add_value(v),
            Cell::NA => self.add_na(),
            Cell::NM => self.add_nm(),
        }
    }

    pub fn result(self) -> Column<A> {
        Column::from_dense(self.values, self.na_mask, self.nm_mask)
    }
}

impl<A: Default> Default for ColumnBuilder<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> ColumnBuilder<A> {
    /// Decomposes into raw parts, for merging builders that were filled
    /// independently (e.g. one per disjoint row-range chunk).
    pub(crate) fn into_parts(self) -> (Vec<A>, Mask, Mask) {
        (self.values, self.na_mask, self.nm_mask)
    }
}

/// Builds a dense column from row-range chunks processed independently
/// (in parallel) and concatenated, in order, on the calling thread: the
/// "partition into independent builders, then concatenate" shape.
#[cfg(feature = "parallel")]
pub fn build_parallel<A: Send + Default>(chunks: Vec<Vec<Cell<A>>>) -> Column<A> {
    use rayon::prelude::*;

    let parts: Vec<(Vec<A>, Mask, Mask)> = chunks
        .into_par_iter()
        .map(|chunk| {
            let mut builder = ColumnBuilder::with_capacity(chunk.len());
            for cell in chunk {
                builder.add(cell);
            }
            builder.into_parts()
        })
        .collect();

    let mut values = Vec::new();
    let mut na_mask = Mask::new();
    let mut nm_mask = Mask::new();
    for (part_values, part_na, part_nm) in parts {
        let offset = values.len();
        na_mask = &na_mask | &part_na.shifted(offset);
        nm_mask = &nm_mask | &part_nm.shifted(offset);
        values.extend(part_values);
    }
    Column::from_dense(values, na_mask, nm_mask)
}

#[cfg(all(test, feature = "parallel"))]
mod parallel_tests {
    use super::*;

    #[test]
    fn build_parallel_matches_sequential_concatenation() {
        let chunks = vec![
            vec![Cell::Value(1), Cell::NA],
            vec![Cell::NM, Cell::Value(4)],
        ];
        let column = build_parallel(chunks);
        assert_eq!(column.get(0), Cell::Value(1));
        assert_eq!(column.get(1), Cell::NA);
        assert_eq!(column.get(2), Cell::NM);
        assert_eq!(column.get(3), Cell::Value(4));
    }
}
