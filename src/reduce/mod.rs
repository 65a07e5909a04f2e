//! The reduction contract: a pure fold over a column window bounded by an
//! indices slice, plus the concrete reducer library.

mod reducers;

pub use reducers::{
    Count, Exists, First, FirstN, ForAll, Last, LastN, Max, Mean, Median, Min, MonoidReducer,
    Outliers, Quantile, SemigroupReducer, Unique,
};

use crate::column::Column;

/// A pure function `(column, indices, start, end) -> Cell<B>`.
///
/// Implementors must not touch rows outside `[start, end)`, must use
/// [`Column::is_value_at`]/[`Column::value_at`]/[`Column::non_value_at`]
/// rather than assuming a storage shape, and must surface `NM` per the
/// behavior documented on each concrete reducer (most reducers: any `NM`
/// anywhere in the window absorbs to `NM`; a few, documented individually,
/// treat presence/absence alone and skip `NM` rows instead).
pub trait Reducer<A, B> {
    fn reduce(&self, column: &Column<A>, indices: &[usize], start: usize, end: usize) -> crate::Cell<B>;
}

/// A read-only view over the `[start, end)` slice of `indices` a reducer
/// is bounded to, translating logical window positions to column rows.
pub struct Window<'a, A> {
    column: &'a Column<A>,
    rows: &'a [usize],
}

impl<'a, A: Clone> Window<'a, A> {
    pub fn new(column: &'a Column<A>, indices: &'a [usize], start: usize, end: usize) -> Self {
        Window {
            column,
            rows: &indices[start..end],
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The underlying column row for logical window position `i`.
    fn row(&self, i: usize) -> usize {
        self.rows[i]
    }

    pub fn is_value_at(&self, i: usize) -> bool {
        self.column.is_value_at(self.row(i))
    }

    pub fn cell_at(&self, i: usize) -> crate::Cell<A> {
        self.column.get(self.row(i))
    }

    /// Iterates present values only, in window order.
    pub fn values(&self) -> impl Iterator<Item = A> + '_ {
        (0..self.rows.len()).filter_map(move |i| self.cell_at(i).into_option())
    }

    /// True if any row in the window is `NM`.
    pub fn any_nm(&self) -> bool {
        (0..self.rows.len()).any(|i| self.cell_at(i).is_nm())
    }
}
