//! [`Frame`]: a column-oriented table sharing one row [`Index`] across
//! named, opaquely-typed columns.
//!
//! A column is erased behind [`UntypedColumn`], a small trait-object
//! wrapper, not a closed enum of concrete types, so any column of any
//! `'static` `Clone` value type can live in a frame. Casting to a typed
//! [`Series`] is total: a mismatched cast yields a column of all `NM`
//! rather than an error, matching "missing data as values, not errors."

use std::any::Any;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use crate::column::{Column, ColumnBuilder, SKIP};
use crate::index::{cogroup, CogroupState, Index};
use crate::join::{JoinKind, Joiner};
use crate::merge::{MergeKind, Merger};
use crate::series::Series;

trait ErasedColumn {
    fn as_any(&self) -> &dyn Any;
    fn reindexed(&self, indices: Rc<[usize]>) -> Rc<dyn ErasedColumn>;
}

impl<A: Clone + 'static> ErasedColumn for Column<A> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn reindexed(&self, indices: Rc<[usize]>) -> Rc<dyn ErasedColumn> {
        Rc::new(self.reindex(indices))
    }
}

/// A named column whose value type is erased at the frame boundary. Casts
/// to a concrete type via [`UntypedColumn::cast`]; a type mismatch is
/// reported as an all-`NM` column of the requested length, not a panic or
/// `Result`.
#[derive(Clone)]
pub struct UntypedColumn(Rc<dyn ErasedColumn>);

impl UntypedColumn {
    pub fn new<A: Clone + 'static>(column: Column<A>) -> Self {
        UntypedColumn(Rc::new(column))
    }

    /// Downcasts to `Column<A>`, or an all-`NM` column of length `len` if
    /// the stored type doesn't match.
    pub fn cast<A: Clone + Default + 'static>(&self, len: usize) -> Column<A> {
        self.0
            .as_any()
            .downcast_ref::<Column<A>>()
            .cloned()
            .unwrap_or_else(|| all_nm_column(len))
    }

    fn reindexed(&self, indices: Rc<[usize]>) -> UntypedColumn {
        UntypedColumn(self.0.reindexed(indices))
    }
}

fn all_nm_column<A: Default>(len: usize) -> Column<A> {
    let mut builder = ColumnBuilder::with_capacity(len);
    for _ in 0..len {
        builder.add_nm();
    }
    builder.result()
}

fn ensure_ordered<K: Ord + Clone>(idx: &Index<K>) -> Index<K> {
    if idx.ordered_flag() {
        idx.clone()
    } else {
        idx.sorted()
    }
}

/// A column-oriented table: one row [`Index`] shared by every named
/// column.
#[derive(Clone)]
pub struct Frame<K> {
    index: Index<K>,
    columns: HashMap<String, UntypedColumn>,
}

impl<K: Clone> Frame<K> {
    pub fn new(index: Index<K>) -> Self {
        Frame {
            index,
            columns: HashMap::new(),
        }
    }

    pub fn index(&self) -> &Index<K> {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Casts column `name` to a [`Series`] sharing the frame's index. A
    /// missing column or a type mismatch both yield an all-`NM` series,
    /// never an error.
    pub fn col<A: Clone + Default + 'static>(&self, name: &str) -> Series<K, A> {
        let len = self.index.len();
        let column = self
            .columns
            .get(name)
            .map(|untyped| untyped.cast::<A>(len))
            .unwrap_or_else(|| all_nm_column(len));
        Series::new(self.index.clone(), column)
    }
}

impl<K: Ord + Clone + Eq + Hash> Frame<K> {
    /// Inserts or replaces column `name`, reindexing `series` onto the
    /// frame's row index by key lookup (a key the frame has but `series`
    /// doesn't becomes [`SKIP`], hence `NA`).
    pub fn with_column<A: Clone + Default + 'static>(
        &mut self,
        name: impl Into<String>,
        series: Series<K, A>,
    ) {
        let n = self.index.len();
        let keys = self.index.keys();
        let mut new_indices = Vec::with_capacity(n);
        for key in keys {
            let row = series
                .index()
                .get(key)
                .map(|pos| series.index().index_at(pos))
                .unwrap_or(SKIP);
            new_indices.push(row);
        }
        let reindexed = series.column().reindex(new_indices);
        self.columns.insert(name.into(), UntypedColumn::new(reindexed));
    }

    /// Lifts [`Joiner`] to every column: cogroups the two frames' row
    /// indices, then reindexes every column of `self` onto the matched
    /// left rows and every column of `other` onto the matched right rows.
    /// A name present on both sides keeps `self`'s column under its own
    /// name and `other`'s under `"{name}_right"`.
    pub fn join(&self, other: &Frame<K>, kind: JoinKind) -> Frame<K> {
        let left = ensure_ordered(&self.index);
        let right = ensure_ordered(&other.index);
        let state = cogroup(&left, &right, &Joiner::new(kind));
        self.combine(other, state)
    }

    /// As [`Frame::join`], but aligns matched rows positionally via
    /// [`Merger`] rather than by Cartesian product.
    pub fn merge(&self, other: &Frame<K>, kind: MergeKind) -> Frame<K> {
        let left = ensure_ordered(&self.index);
        let right = ensure_ordered(&other.index);
        let state = cogroup(&left, &right, &Merger::new(kind));
        self.combine(other, state)
    }

    fn combine(&self, other: &Frame<K>, state: CogroupState<K>) -> Frame<K> {
        let n = state.len();
        let lefts: Rc<[usize]> = state.lefts.into();
        let rights: Rc<[usize]> = state.rights.into();

        let mut columns = HashMap::with_capacity(self.columns.len() + other.columns.len());
        for (name, column) in &self.columns {
            columns.insert(name.clone(), column.reindexed(Rc::clone(&lefts)));
        }
        for (name, column) in &other.columns {
            let key = if columns.contains_key(name) {
                format!("{name}_right")
            } else {
                name.clone()
            };
            columns.insert(key, column.reindexed(Rc::clone(&rights)));
        }

        let out_indices = (0..n).collect();
        Frame {
            index: Index::from_parts(state.keys, out_indices, true),
            columns,
        }
    }
}
