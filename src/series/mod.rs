//! [`Series`]: an [`Index`] paired with a [`Column`], plus the algebra
//! operators built on top of the cogroup machinery.
//!
//! Every binary operation here is "cogroup indices, then build a column
//! cell-by-cell from the aligned pairs," the same shape as `Joiner`/
//! `Merger` themselves, just with a different per-pair rule. `zip_map`,
//! `merge`, and `or_else` all align pair-wise by position within a key
//! (via [`Merger`]), not Cartesian. A `Series` models one column per key,
//! not a relational table, so positional alignment of same-key runs is the
//! only sensible reading of `i`-th row of `this` meeting `i`-th of `that`.

mod algebra;
mod rolling;

pub use rolling::{AbsDiff, Metric, UnboundedMetric};

use std::hash::Hash;

use tracing::instrument;

use crate::cell::{Cell, Semigroup};
use crate::column::{Column, ColumnBuilder, NonValue};
use crate::error::{Error, Result};
use crate::index::{cogroup, Index};
use crate::merge::{MergeKind, Merger};
use crate::reduce::Reducer;

/// An `(Index<K>, Column<V>)` pair: row `i` is `(index.keys()[i],
/// column[index.index_at(i)])`.
#[derive(Clone, Debug)]
pub struct Series<K, V> {
    index: Index<K>,
    column: Column<V>,
}

impl<K: Clone, V: Clone> Series<K, V> {
    pub fn new(index: Index<K>, column: Column<V>) -> Self {
        Series { index, column }
    }

    pub fn index(&self) -> &Index<K> {
        &self.index
    }

    pub fn column(&self) -> &Column<V> {
        &self.column
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The cell at logical position `i`.
    pub fn get(&self, i: usize) -> Cell<V> {
        self.column.get(self.index.index_at(i))
    }
}

impl<K: Clone + Ord + Eq + Hash, V: Clone + Default> Series<K, V> {
    /// Builds a series from two independently-supplied vectors (a keys
    /// vector and a parallel cells vector), rather than appending them in
    /// lockstep through a [`SeriesBuilder`]. Fails if they disagree in
    /// length, since nothing else can catch that mistake at this boundary.
    pub fn from_parts(keys: Vec<K>, cells: Vec<Cell<V>>, ordered: bool) -> Result<Series<K, V>> {
        if keys.len() != cells.len() {
            return Err(Error::MismatchedLengths {
                left: keys.len(),
                right: cells.len(),
            });
        }
        let mut builder = ColumnBuilder::with_capacity(cells.len());
        for cell in cells {
            builder.add(cell);
        }
        let index = if ordered {
            Index::ordered(keys)
        } else {
            Index::from_unordered(keys)
        };
        Ok(Series::new(index, builder.result()))
    }
}

/// Accepts `append`/`append_value`/`append_non_value` one row at a time and
/// freezes into a [`Series`] with `result()`. Keys and cells always move
/// in lockstep, so (unlike [`Series::from_parts`]) there's no length to
/// mismatch here.
pub struct SeriesBuilder<K, V> {
    keys: Vec<K>,
    column: ColumnBuilder<V>,
    ordered: bool,
}

impl<K: Clone + Ord + Eq + Hash, V: Clone + Default> SeriesBuilder<K, V> {
    /// An ordered builder: `result()` requires (and in debug builds checks)
    /// non-decreasing keys in append order.
    pub fn ordered() -> Self {
        SeriesBuilder {
            keys: Vec::new(),
            column: ColumnBuilder::new(),
            ordered: true,
        }
    }

    /// An unordered builder: `result()` builds a lookup map over whatever
    /// key order was appended.
    pub fn unordered() -> Self {
        SeriesBuilder {
            keys: Vec::new(),
            column: ColumnBuilder::new(),
            ordered: false,
        }
    }

    pub fn size_hint(&mut self, n: usize) {
        self.keys.reserve(n);
        self.column.size_hint(n);
    }

    pub fn append(&mut self, key: K, cell: Cell<V>) {
        self.keys.push(key);
        self.column.add(cell);
    }

    pub fn append_value(&mut self, key: K, value: V) {
        self.append(key, Cell::Value(value));
    }

    pub fn append_non_value(&mut self, key: K, nv: NonValue) {
        self.keys.push(key);
        self.column.add_non_value(nv);
    }

    pub fn result(self) -> Series<K, V> {
        let index = if self.ordered {
            Index::ordered(self.keys)
        } else {
            Index::from_unordered(self.keys)
        };
        Series::new(index, self.column.result())
    }
}

/// Ensures `idx` is ordered by key, sorting a copy if it isn't. `cogroup`
/// and `group_runs` both require this.
fn ensure_ordered<K: Ord + Clone>(idx: &Index<K>) -> Index<K> {
    if idx.ordered_flag() {
        idx.clone()
    } else {
        idx.sorted()
    }
}

impl<K: Ord + Clone + Eq + Hash, V: Clone> Series<K, V> {
    /// Inner-joins `self` and `other` on key, pairing same-key rows
    /// positionally (via [`Merger`]'s [`MergeKind::Inner`]), and combines
    /// each pair with `f`: `Value(f(a,b))` if both present, `NM` if either
    /// side is `NM`, else `NA`.
    #[instrument(skip(self, other, f))]
    pub fn zip_map<W: Clone, B: Default + Clone>(
        &self,
        other: &Series<K, W>,
        f: impl Fn(V, W) -> B,
    ) -> Series<K, B> {
        let left = ensure_ordered(&self.index);
        let right = ensure_ordered(&other.index);
        let state = cogroup(&left, &right, &Merger::new(MergeKind::Inner));

        let mut builder = ColumnBuilder::with_capacity(state.len());
        for i in 0..state.len() {
            let l = self.column.get(state.lefts[i]);
            let r = other.column.get(state.rights[i]);
            let cell = match (l, r) {
                (Cell::Value(a), Cell::Value(b)) => Cell::Value(f(a, b)),
                (Cell::NM, _) | (_, Cell::NM) => Cell::NM,
                _ => Cell::NA,
            };
            builder.add(cell);
        }
        let column = builder.result();
        let out_indices = (0..state.len()).collect();
        Series::new(Index::from_parts(state.keys, out_indices, true), column)
    }

    /// As [`Series::zip_map`], but `f` returns a `Cell<B>` directly instead
    /// of a bare `B`, for operations (like division) that can themselves
    /// produce `NM` from two present values. `NM` propagation from either
    /// input side still happens before `f` is even called.
    #[instrument(skip(self, other, f))]
    pub fn zip_map_cell<W: Clone, B: Default + Clone>(
        &self,
        other: &Series<K, W>,
        f: impl Fn(V, W) -> Cell<B>,
    ) -> Series<K, B> {
        let left = ensure_ordered(&self.index);
        let right = ensure_ordered(&other.index);
        let state = cogroup(&left, &right, &Merger::new(MergeKind::Inner));

        let mut builder = ColumnBuilder::with_capacity(state.len());
        for i in 0..state.len() {
            let l = self.column.get(state.lefts[i]);
            let r = other.column.get(state.rights[i]);
            let cell = match (l, r) {
                (Cell::Value(a), Cell::Value(b)) => f(a, b),
                (Cell::NM, _) | (_, Cell::NM) => Cell::NM,
                _ => Cell::NA,
            };
            builder.add(cell);
        }
        let column = builder.result();
        let out_indices = (0..state.len()).collect();
        Series::new(Index::from_parts(state.keys, out_indices, true), column)
    }

    /// Outer-merges `self` and `other` on key under `V`'s [`Semigroup`]:
    /// both present combines via `V::combine`, one present takes that
    /// value, neither present yields `NM` if either side was `NM` else
    /// `NA`. This is exactly [`Cell::combine_with`].
    #[instrument(skip(self, other))]
    pub fn merge(&self, other: &Series<K, V>) -> Series<K, V>
    where
        V: Semigroup + Default,
    {
        let left = ensure_ordered(&self.index);
        let right = ensure_ordered(&other.index);
        let state = cogroup(&left, &right, &Merger::new(MergeKind::Outer));

        let mut builder = ColumnBuilder::with_capacity(state.len());
        for i in 0..state.len() {
            let l = self.column.get(state.lefts[i]);
            let r = other.column.get(state.rights[i]);
            builder.add(l.combine_with(r, |a, b| a.combine(&b)));
        }
        let column = builder.result();
        let out_indices = (0..state.len()).collect();
        Series::new(Index::from_parts(state.keys, out_indices, true), column)
    }

    /// Outer-aligns `self` and `other` on key; the first present cell wins
    /// (`self` takes precedence), and `NM` absorbs only when neither side
    /// is present.
    #[instrument(skip(self, other))]
    pub fn or_else(&self, other: &Series<K, V>) -> Series<K, V>
    where
        V: Default,
    {
        let left = ensure_ordered(&self.index);
        let right = ensure_ordered(&other.index);
        let state = cogroup(&left, &right, &Merger::new(MergeKind::Outer));

        let mut builder = ColumnBuilder::with_capacity(state.len());
        for i in 0..state.len() {
            let l = self.column.get(state.lefts[i]);
            let r = other.column.get(state.rights[i]);
            let cell = if l.is_value() {
                l
            } else if r.is_value() {
                r
            } else if l.is_nm() || r.is_nm() {
                Cell::NM
            } else {
                Cell::NA
            };
            builder.add(cell);
        }
        let column = builder.result();
        let out_indices = (0..state.len()).collect();
        Series::new(Index::from_parts(state.keys, out_indices, true), column)
    }

    /// Concatenates logical rows with no realignment. The result is
    /// `ordered` only if both inputs are ordered and `other`'s keys do not
    /// precede `self`'s last key.
    pub fn concat(&self, other: &Series<K, V>) -> Series<K, V>
    where
        V: Default,
    {
        let mut builder = ColumnBuilder::with_capacity(self.len() + other.len());
        for i in 0..self.len() {
            builder.add(self.get(i));
        }
        for i in 0..other.len() {
            builder.add(other.get(i));
        }
        let column = builder.result();

        let mut keys = self.index.keys().to_vec();
        keys.extend_from_slice(other.index.keys());
        let ordered = self.index.ordered_flag()
            && other.index.ordered_flag()
            && match (self.index.keys().last(), other.index.keys().first()) {
                (Some(a), Some(b)) => a <= b,
                _ => true,
            };
        let out_indices = (0..keys.len()).collect();
        Series::new(Index::from_parts(keys, out_indices, ordered), column)
    }

    /// Folds the whole series through `reducer` in logical position order.
    pub fn reduce<B>(&self, reducer: &impl Reducer<V, B>) -> Cell<B> {
        let indices: Vec<usize> = (0..self.index.len()).map(|i| self.index.index_at(i)).collect();
        reducer.reduce(&self.column, &indices, 0, indices.len())
    }

    /// Groups contiguous equal keys (sorting first if `self` isn't already
    /// ordered) and reduces each run independently.
    #[instrument(skip(self, reducer))]
    pub fn reduce_by_key<B: Default + Clone>(&self, reducer: &impl Reducer<V, B>) -> Series<K, B> {
        let sorted = ensure_ordered(&self.index);
        let indices: Vec<usize> = (0..sorted.len()).map(|i| sorted.index_at(i)).collect();
        let runs = sorted.group_runs();

        let mut keys = Vec::with_capacity(runs.len());
        let mut builder = ColumnBuilder::with_capacity(runs.len());
        for (key, start, end) in runs {
            keys.push(key);
            builder.add(reducer.reduce(&self.column, &indices, start, end));
        }
        let column = builder.result();
        let out_indices = (0..keys.len()).collect();
        Series::new(Index::from_parts(keys, out_indices, true), column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reduce::Mean;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn series_from(keys: Vec<i64>, cells: Vec<Cell<f64>>) -> Series<i64, f64> {
        let mut b = ColumnBuilder::with_capacity(cells.len());
        for c in cells {
            b.add(c);
        }
        Series::new(Index::ordered(keys), b.result())
    }

    fn series_from_strings(keys: Vec<i64>, cells: Vec<Cell<String>>) -> Series<i64, String> {
        let mut b = ColumnBuilder::with_capacity(cells.len());
        for c in cells {
            b.add(c);
        }
        Series::new(Index::ordered(keys), b.result())
    }

    #[test]
    fn s2_inner_zip_map() {
        let a = series_from(vec![1, 2, 3], vec![Cell::Value(10.0), Cell::Value(20.0), Cell::NA]);
        let b = series_from(vec![2, 3, 4], vec![Cell::Value(5.0), Cell::Value(5.0), Cell::Value(5.0)]);
        let result = a.zip_map(&b, |x, y| x + y);
        assert_eq!(result.index().keys(), &[2, 3]);
        assert_eq!(result.get(0), Cell::Value(25.0));
        assert_eq!(result.get(1), Cell::NA);
    }

    #[test]
    fn s1_merge_combines_present_pairs_and_nm_absorbs() {
        let a = series_from_strings(vec![1, 2, 3], vec![Cell::Value("x".into()), Cell::NA, Cell::NM]);
        let b = series_from_strings(
            vec![2, 3, 4],
            vec![Cell::Value("y".into()), Cell::Value("z".into()), Cell::Value("w".into())],
        );
        let result = a.merge(&b);
        assert_eq!(result.index().keys(), &[1, 2, 3, 4]);
        assert_eq!(result.get(0), Cell::Value("x".to_string()));
        assert_eq!(result.get(1), Cell::Value("y".to_string()));
        assert_eq!(result.get(2), Cell::NM);
        assert_eq!(result.get(3), Cell::Value("w".to_string()));
    }

    #[test]
    fn or_else_is_idempotent() {
        let a = series_from(vec![1, 2, 3], vec![Cell::Value(1.0), Cell::NA, Cell::NM]);
        let result = a.or_else(&a);
        for i in 0..a.len() {
            assert_eq!(result.get(i), a.get(i));
        }
    }

    #[test]
    fn s4_reduce_by_key_mean() {
        let series = series_from(
            vec![1, 1, 2, 2, 3],
            vec![
                Cell::Value(2.0),
                Cell::Value(4.0),
                Cell::Value(10.0),
                Cell::NM,
                Cell::Value(7.0),
            ],
        );
        let result = series.reduce_by_key(&Mean);
        assert_eq!(result.index().keys(), &[1, 2, 3]);
        assert_eq!(result.get(0), Cell::Value(3.0));
        assert_eq!(result.get(1), Cell::NM);
        assert_eq!(result.get(2), Cell::Value(7.0));
    }

    #[test]
    fn reduce_by_key_single_key_matches_wrapped_reduce() {
        let series = series_from(vec![9, 9, 9], vec![Cell::Value(1.0), Cell::Value(2.0), Cell::Value(3.0)]);
        let whole = series.reduce(&Mean);
        let by_key = series.reduce_by_key(&Mean);
        assert_eq!(by_key.len(), 1);
        assert_eq!(by_key.get(0), whole);
    }

    #[test]
    fn concat_preserves_row_order_without_realignment() {
        let a = series_from(vec![1, 2], vec![Cell::Value(1.0), Cell::Value(2.0)]);
        let b = series_from(vec![3, 4], vec![Cell::Value(3.0), Cell::Value(4.0)]);
        let joined = a.concat(&b);
        assert_eq!(joined.index().keys(), &[1, 2, 3, 4]);
        assert!(joined.index().ordered_flag());
        for i in 0..4 {
            assert_eq!(joined.get(i), Cell::Value((i + 1) as f64));
        }
    }

    #[test]
    fn series_builder_appends_in_lockstep() {
        let mut builder = SeriesBuilder::ordered();
        builder.append_value(1, 10.0);
        builder.append_non_value(2, crate::column::NonValue::NA);
        builder.append(3, Cell::NM);
        let series = builder.result();
        assert_eq!(series.get(0), Cell::Value(10.0));
        assert_eq!(series.get(1), Cell::NA);
        assert_eq!(series.get(2), Cell::NM);
    }

    #[test]
    fn from_parts_rejects_mismatched_lengths() {
        let result: Result<Series<i64, f64>> =
            Series::from_parts(vec![1, 2, 3], vec![Cell::Value(1.0), Cell::Value(2.0)], true);
        assert_eq!(
            result.unwrap_err(),
            Error::MismatchedLengths { left: 3, right: 2 }
        );
    }

    #[test]
    fn from_parts_builds_a_matching_series() {
        let series: Series<i64, f64> =
            Series::from_parts(vec![1, 2], vec![Cell::Value(1.0), Cell::NA], true).unwrap();
        assert_eq!(series.get(0), Cell::Value(1.0));
        assert_eq!(series.get(1), Cell::NA);
    }

    fn sorted_keys_with_duplicates() -> impl Strategy<Value = Vec<i64>> {
        prop::collection::vec(0i64..8, 0..12).prop_map(|mut ks| {
            ks.sort_unstable();
            ks
        })
    }

    fn keyed_series_data() -> impl Strategy<Value = (Vec<i64>, Vec<f64>)> {
        sorted_keys_with_duplicates().prop_flat_map(|keys| {
            let len = keys.len();
            prop::collection::vec(-100.0..100.0f64, len).prop_map(move |vals| (keys.clone(), vals))
        })
    }

    proptest! {
        /// `zip_map` under `Merger::Inner` keeps exactly `min(l, r)` rows per
        /// matched key, where `l`/`r` are each side's run length for that key.
        #[test]
        fn zip_map_inner_multiplicity_is_the_min_of_both_run_lengths(
            (left_keys, left_values) in keyed_series_data(),
            (right_keys, right_values) in keyed_series_data(),
        ) {
            let left = series_from(left_keys.clone(), left_values.into_iter().map(Cell::Value).collect());
            let right = series_from(right_keys.clone(), right_values.into_iter().map(Cell::Value).collect());
            let result = left.zip_map(&right, |a, b| a + b);

            let mut left_counts: BTreeMap<i64, usize> = BTreeMap::new();
            for k in &left_keys { *left_counts.entry(*k).or_default() += 1; }
            let mut right_counts: BTreeMap<i64, usize> = BTreeMap::new();
            for k in &right_keys { *right_counts.entry(*k).or_default() += 1; }

            let mut result_counts: BTreeMap<i64, usize> = BTreeMap::new();
            for k in result.index().keys() { *result_counts.entry(*k).or_default() += 1; }

            for (key, &lc) in &left_counts {
                if let Some(&rc) = right_counts.get(key) {
                    prop_assert_eq!(result_counts.get(key).copied().unwrap_or(0), lc.min(rc));
                }
            }
            for key in result_counts.keys() {
                prop_assert!(left_counts.contains_key(key) && right_counts.contains_key(key));
            }
        }

        /// Outer merge under a commutative semigroup (`i64` addition) is
        /// itself commutative, cell by cell.
        #[test]
        fn merge_is_commutative_under_a_commutative_semigroup(
            left_keys in sorted_keys_with_duplicates(),
            right_keys in sorted_keys_with_duplicates(),
        ) {
            let left_vals: Vec<Cell<i64>> = left_keys.iter().map(|&k| Cell::Value(k)).collect();
            let right_vals: Vec<Cell<i64>> = right_keys.iter().map(|&k| Cell::Value(k * 10)).collect();
            let mut lb = ColumnBuilder::with_capacity(left_vals.len());
            for c in left_vals { lb.add(c); }
            let mut rb = ColumnBuilder::with_capacity(right_vals.len());
            for c in right_vals { rb.add(c); }
            let left = Series::new(Index::ordered(left_keys), lb.result());
            let right = Series::new(Index::ordered(right_keys), rb.result());

            let forward = left.merge(&right);
            let backward = right.merge(&left);
            prop_assert_eq!(forward.index().keys(), backward.index().keys());
            for i in 0..forward.len() {
                prop_assert_eq!(forward.get(i), backward.get(i));
            }
        }

        /// `or_else` is idempotent against itself for any series.
        #[test]
        fn or_else_idempotent_for_arbitrary_series(keys in sorted_keys_with_duplicates()) {
            let cells: Vec<Cell<f64>> = keys.iter().map(|&k| {
                match k % 3 {
                    0 => Cell::NA,
                    1 => Cell::NM,
                    _ => Cell::Value(k as f64),
                }
            }).collect();
            let series = series_from(keys, cells);
            let result = series.or_else(&series);
            prop_assert_eq!(result.len(), series.len());
            for i in 0..series.len() {
                prop_assert_eq!(result.get(i), series.get(i));
            }
        }

        /// Reducing a series with one distinct key through `reduce_by_key`
        /// matches the same series reduced as a whole.
        #[test]
        fn reduce_by_key_single_key_matches_reduce_for_arbitrary_values(
            key in 0i64..8,
            values in prop::collection::vec(-50.0..50.0f64, 1..10),
        ) {
            let keys = vec![key; values.len()];
            let cells = values.into_iter().map(Cell::Value).collect();
            let series = series_from(keys, cells);
            let whole = series.reduce(&Mean);
            let by_key = series.reduce_by_key(&Mean);
            prop_assert_eq!(by_key.len(), 1);
            prop_assert_eq!(by_key.get(0), whole);
        }
    }
}
