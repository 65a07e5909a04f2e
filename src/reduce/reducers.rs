//! The concrete reducer library.
//!
//! `Count`, `Exists`, and `ForAll` skip `NM` rows and never themselves
//! return `NM`; they're defined on presence/absence alone. `Unique` and
//! every other reducer here treat any `NM` in the window as absorbing.

use std::collections::HashSet;
use std::hash::Hash;

use crate::cell::{Cell, Monoid, Semigroup};
use crate::column::Column;
use crate::error::{Error, Result};
use crate::reduce::{Reducer, Window};

/// Counts present values, ignoring both `NA` and `NM`.
pub struct Count;

impl<A: Clone> Reducer<A, i64> for Count {
    fn reduce(&self, column: &Column<A>, indices: &[usize], start: usize, end: usize) -> Cell<i64> {
        let window = Window::new(column, indices, start, end);
        Cell::Value(window.values().count() as i64)
    }
}

/// The first present value in the window. Any `NM` anywhere in the window
/// absorbs to `NM`, even if a value was found before it.
pub struct First;

impl<A: Clone> Reducer<A, A> for First {
    fn reduce(&self, column: &Column<A>, indices: &[usize], start: usize, end: usize) -> Cell<A> {
        let window = Window::new(column, indices, start, end);
        if window.any_nm() {
            return Cell::NM;
        }
        let result = window.values().next().map_or(Cell::NA, Cell::Value);
        result
    }
}

/// The last present value in the window, with the same `NM`-absorption
/// rule as [`First`].
pub struct Last;

impl<A: Clone> Reducer<A, A> for Last {
    fn reduce(&self, column: &Column<A>, indices: &[usize], start: usize, end: usize) -> Cell<A> {
        let window = Window::new(column, indices, start, end);
        if window.any_nm() {
            return Cell::NM;
        }
        window.values().last().map_or(Cell::NA, Cell::Value)
    }
}

/// The first `n` present values, or `NA` if fewer than `n` are present.
pub struct FirstN {
    pub n: usize,
}

impl<A: Clone> Reducer<A, Vec<A>> for FirstN {
    fn reduce(&self, column: &Column<A>, indices: &[usize], start: usize, end: usize) -> Cell<Vec<A>> {
        let window = Window::new(column, indices, start, end);
        if window.any_nm() {
            return Cell::NM;
        }
        let values: Vec<A> = window.values().collect();
        if values.len() >= self.n {
            Cell::Value(values[..self.n].to_vec())
        } else {
            Cell::NA
        }
    }
}

/// The last `n` present values, as [`FirstN`] over the reversed window.
pub struct LastN {
    pub n: usize,
}

impl<A: Clone> Reducer<A, Vec<A>> for LastN {
    fn reduce(&self, column: &Column<A>, indices: &[usize], start: usize, end: usize) -> Cell<Vec<A>> {
        let window = Window::new(column, indices, start, end);
        if window.any_nm() {
            return Cell::NM;
        }
        let values: Vec<A> = window.values().collect();
        if values.len() >= self.n {
            Cell::Value(values[values.len() - self.n..].to_vec())
        } else {
            Cell::NA
        }
    }
}

/// The maximum present value by `Ord`.
pub struct Max;

impl<A: Clone + Ord> Reducer<A, A> for Max {
    fn reduce(&self, column: &Column<A>, indices: &[usize], start: usize, end: usize) -> Cell<A> {
        let window = Window::new(column, indices, start, end);
        if window.any_nm() {
            return Cell::NM;
        }
        window.values().max().map_or(Cell::NA, Cell::Value)
    }
}

/// The minimum present value by `Ord`.
pub struct Min;

impl<A: Clone + Ord> Reducer<A, A> for Min {
    fn reduce(&self, column: &Column<A>, indices: &[usize], start: usize, end: usize) -> Cell<A> {
        let window = Window::new(column, indices, start, end);
        if window.any_nm() {
            return Cell::NM;
        }
        window.values().min().map_or(Cell::NA, Cell::Value)
    }
}

/// Folds the whole window (including `NA` rows, which act as the
/// identity) through [`Cell::combine_with`], starting from
/// `Value(M::identity())`. An empty window therefore naturally yields
/// `Value(identity)`, and any `NM` absorbs through the same fold.
pub struct MonoidReducer<M> {
    _marker: std::marker::PhantomData<M>,
}

impl<M> MonoidReducer<M> {
    pub fn new() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<M> Default for MonoidReducer<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Monoid + Clone> Reducer<M, M> for MonoidReducer<M> {
    fn reduce(&self, column: &Column<M>, indices: &[usize], start: usize, end: usize) -> Cell<M> {
        let window = Window::new(column, indices, start, end);
        (0..window.len()).fold(Cell::Value(M::identity()), |acc, i| {
            acc.combine_with(window.cell_at(i), |a, b| a.combine(&b))
        })
    }
}

/// As [`MonoidReducer`], but with no identity to start from: an empty
/// window (or a window of only `NA`s) yields `NA` rather than a synthetic
/// identity value.
pub struct SemigroupReducer<S> {
    _marker: std::marker::PhantomData<S>,
}

impl<S> SemigroupReducer<S> {
    pub fn new() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<S> Default for SemigroupReducer<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Semigroup + Clone> Reducer<S, S> for SemigroupReducer<S> {
    fn reduce(&self, column: &Column<S>, indices: &[usize], start: usize, end: usize) -> Cell<S> {
        let window = Window::new(column, indices, start, end);
        (0..window.len()).fold(Cell::NA, |acc, i| {
            acc.combine_with(window.cell_at(i), |a, b| a.combine(&b))
        })
    }
}

/// The arithmetic mean of present values, computed via `f64`.
pub struct Mean;

impl<A: Copy + Into<f64>> Reducer<A, f64> for Mean {
    fn reduce(&self, column: &Column<A>, indices: &[usize], start: usize, end: usize) -> Cell<f64> {
        let window = Window::new(column, indices, start, end);
        if window.any_nm() {
            return Cell::NM;
        }
        let mut sum = 0.0;
        let mut count = 0usize;
        for v in window.values() {
            sum += v.into();
            count += 1;
        }
        if count == 0 {
            Cell::NA
        } else {
            Cell::Value(sum / count as f64)
        }
    }
}

/// The median of present values, via quickselect on a stable copy (the
/// window's own data is never reordered).
pub struct Median;

impl<A: Copy + Into<f64>> Reducer<A, f64> for Median {
    fn reduce(&self, column: &Column<A>, indices: &[usize], start: usize, end: usize) -> Cell<f64> {
        let window = Window::new(column, indices, start, end);
        if window.any_nm() {
            return Cell::NM;
        }
        let mut values: Vec<f64> = window.values().map(Into::into).collect();
        if values.is_empty() {
            return Cell::NA;
        }
        Cell::Value(median_of(&mut values))
    }
}

fn median_of(values: &mut [f64]) -> f64 {
    let n = values.len();
    let mid = n / 2;
    let (_, &mut upper, _) = values.select_nth_unstable_by(mid, |a, b| a.partial_cmp(b).unwrap());
    if n % 2 == 1 {
        return upper;
    }
    let (_, &mut lower, _) = values[..mid].select_nth_unstable_by(mid - 1, |a, b| a.partial_cmp(b).unwrap());
    (lower + upper) / 2.0
}

/// Linear-interpolation quantiles on a stable copy of present values, one
/// per requested probability.
pub struct Quantile {
    ps: Vec<f64>,
}

impl Quantile {
    pub fn new(ps: Vec<f64>) -> Result<Self> {
        if ps.is_empty() {
            return Err(Error::EmptyQuantiles);
        }
        for &p in &ps {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::InvalidQuantile(p));
            }
        }
        Ok(Self { ps })
    }
}

fn interpolated_quantile(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] + (sorted[upper] - sorted[lower]) * frac
    }
}

impl<A: Copy + Into<f64>> Reducer<A, Vec<f64>> for Quantile {
    fn reduce(&self, column: &Column<A>, indices: &[usize], start: usize, end: usize) -> Cell<Vec<f64>> {
        let window = Window::new(column, indices, start, end);
        if window.any_nm() {
            return Cell::NM;
        }
        let mut values: Vec<f64> = window.values().map(Into::into).collect();
        if values.is_empty() {
            return Cell::NA;
        }
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        Cell::Value(self.ps.iter().map(|&p| interpolated_quantile(&values, p)).collect())
    }
}

/// Tukey's-fences outliers: values outside `[Q1 - k*IQR, Q3 + k*IQR]`.
pub struct Outliers {
    pub k: f64,
}

impl<A: Copy + Into<f64>> Reducer<A, Vec<f64>> for Outliers {
    fn reduce(&self, column: &Column<A>, indices: &[usize], start: usize, end: usize) -> Cell<Vec<f64>> {
        let window = Window::new(column, indices, start, end);
        if window.any_nm() {
            return Cell::NM;
        }
        let mut values: Vec<f64> = window.values().map(Into::into).collect();
        if values.is_empty() {
            return Cell::NA;
        }
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let q1 = interpolated_quantile(&values, 0.25);
        let q3 = interpolated_quantile(&values, 0.75);
        let iqr = q3 - q1;
        let lower = q1 - self.k * iqr;
        let upper = q3 + self.k * iqr;
        Cell::Value(
            values
                .into_iter()
                .filter(|&v| v < lower || v > upper)
                .collect(),
        )
    }
}

/// The set of distinct present values. Unlike `Count`/`Exists`/`ForAll`,
/// any `NM` in the window is a hard stop: `Unique` yields `NM`.
pub struct Unique;

impl<A: Clone + Eq + Hash> Reducer<A, HashSet<A>> for Unique {
    fn reduce(&self, column: &Column<A>, indices: &[usize], start: usize, end: usize) -> Cell<HashSet<A>> {
        let window = Window::new(column, indices, start, end);
        if window.any_nm() {
            return Cell::NM;
        }
        Cell::Value(window.values().collect())
    }
}

/// `true` if any present value satisfies `p`. Skips `NM` rows rather than
/// absorbing to `NM`.
pub struct Exists<F> {
    pub predicate: F,
}

impl<A: Clone, F: Fn(&A) -> bool> Reducer<A, bool> for Exists<F> {
    fn reduce(&self, column: &Column<A>, indices: &[usize], start: usize, end: usize) -> Cell<bool> {
        let window = Window::new(column, indices, start, end);
        let result = Cell::Value(window.values().any(|v| (self.predicate)(&v)));
        result
    }
}

/// `true` if every present value satisfies `p` (vacuously true for an
/// empty or all-absent window). Skips `NM` rows.
pub struct ForAll<F> {
    pub predicate: F,
}

impl<A: Clone, F: Fn(&A) -> bool> Reducer<A, bool> for ForAll<F> {
    fn reduce(&self, column: &Column<A>, indices: &[usize], start: usize, end: usize) -> Cell<bool> {
        let window = Window::new(column, indices, start, end);
        let result = Cell::Value(window.values().all(|v| (self.predicate)(&v)));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnBuilder;

    fn col(cells: &[Cell<i64>]) -> Column<i64> {
        let mut b = ColumnBuilder::with_capacity(cells.len());
        for c in cells {
            b.add(c.clone());
        }
        b.result()
    }

    #[test]
    fn count_ignores_nm() {
        let c = col(&[Cell::Value(1), Cell::NM, Cell::NA, Cell::Value(2)]);
        let indices: Vec<usize> = (0..4).collect();
        assert_eq!(Count.reduce(&c, &indices, 0, 4), Cell::Value(2));
    }

    #[test]
    fn count_of_empty_window_is_zero() {
        let c = col(&[]);
        assert_eq!(Count.reduce(&c, &[], 0, 0), Cell::Value(0));
    }

    #[test]
    fn first_absorbs_nm_anywhere_in_window() {
        let c = col(&[Cell::Value(1), Cell::NM]);
        let indices: Vec<usize> = (0..2).collect();
        assert_eq!(First.reduce(&c, &indices, 0, 2), Cell::NM);
    }

    #[test]
    fn first_n_requires_enough_present_values() {
        let c = col(&[Cell::Value(1), Cell::NA, Cell::Value(2)]);
        let indices: Vec<usize> = (0..3).collect();
        assert_eq!(
            FirstN { n: 2 }.reduce(&c, &indices, 0, 3),
            Cell::Value(vec![1, 2])
        );
        assert_eq!(FirstN { n: 3 }.reduce(&c, &indices, 0, 3), Cell::NA);
    }

    #[test]
    fn exists_and_forall_skip_nm_not_absorb() {
        let c = col(&[Cell::Value(2), Cell::NM, Cell::Value(4)]);
        let indices: Vec<usize> = (0..3).collect();
        assert_eq!(
            Exists { predicate: |v: &i64| *v % 2 == 0 }.reduce(&c, &indices, 0, 3),
            Cell::Value(true)
        );
        assert_eq!(
            ForAll { predicate: |v: &i64| *v % 2 == 0 }.reduce(&c, &indices, 0, 3),
            Cell::Value(true)
        );
    }

    #[test]
    fn for_all_empty_window_is_vacuously_true() {
        let c = col(&[]);
        assert_eq!(
            ForAll { predicate: |_: &i64| false }.reduce(&c, &[], 0, 0),
            Cell::Value(true)
        );
    }

    #[test]
    fn unique_absorbs_nm() {
        let c = col(&[Cell::Value(1), Cell::NM]);
        let indices: Vec<usize> = (0..2).collect();
        assert_eq!(Unique.reduce(&c, &indices, 0, 2), Cell::NM);
    }

    #[test]
    fn unique_collects_distinct_values() {
        let c = col(&[Cell::Value(1), Cell::Value(1), Cell::Value(2), Cell::NA]);
        let indices: Vec<usize> = (0..4).collect();
        let result = Unique.reduce(&c, &indices, 0, 4);
        assert_eq!(result, Cell::Value(HashSet::from([1, 2])));
    }

    #[test]
    fn s4_reduce_by_key_mean_propagates_nm() {
        let mut b = ColumnBuilder::with_capacity(5);
        for cell in [
            Cell::Value(2.0),
            Cell::Value(4.0),
            Cell::Value(10.0),
            Cell::NM,
            Cell::Value(7.0),
        ] {
            b.add(cell);
        }
        let c: Column<f64> = b.result();
        let indices: Vec<usize> = (0..5).collect();
        assert_eq!(Mean.reduce(&c, &indices, 0, 2), Cell::Value(3.0));
        assert_eq!(Mean.reduce(&c, &indices, 2, 4), Cell::NM);
        assert_eq!(Mean.reduce(&c, &indices, 4, 5), Cell::Value(7.0));
    }

    #[test]
    fn monoid_reducer_empty_window_is_identity() {
        let c: Column<i64> = col(&[]);
        assert_eq!(MonoidReducer::<i64>::new().reduce(&c, &[], 0, 0), Cell::Value(0));
    }

    #[test]
    fn semigroup_reducer_empty_window_is_na() {
        let c: Column<i64> = col(&[]);
        assert_eq!(SemigroupReducer::<i64>::new().reduce(&c, &[], 0, 0), Cell::NA);
    }

    #[test]
    fn quantile_rejects_out_of_range_probabilities() {
        assert!(Quantile::new(vec![1.5]).is_err());
        assert!(Quantile::new(vec![]).is_err());
        assert!(Quantile::new(vec![0.5]).is_ok());
    }

    #[test]
    fn median_of_even_count_averages_middle_two() {
        let c = col(&[Cell::Value(1), Cell::Value(2), Cell::Value(3), Cell::Value(4)]);
        let indices: Vec<usize> = (0..4).collect();
        assert_eq!(Median.reduce(&c, &indices, 0, 4), Cell::Value(2.5));
    }
}
