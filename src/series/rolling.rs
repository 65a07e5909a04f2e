//! Roll-forward with tolerance: redirect `NA` rows to the last valid
//! position within `delta` of it, under a caller-chosen [`Metric`].

use crate::cell::Cell;
use crate::column::ColumnBuilder;
use crate::index::Index;

use super::Series;

/// Distance between two keys, used to bound how far roll-forward may
/// reach back. An explicit strategy object rather than an implicit
/// type-class instance, per the crate's "no ambient context" design.
pub trait Metric<K> {
    fn distance(&self, a: &K, b: &K) -> f64;
}

/// Any two keys are zero apart, so roll-forward always redirects, regardless
/// of `delta`. The unbounded form of the operation.
pub struct UnboundedMetric;

impl<K> Metric<K> for UnboundedMetric {
    fn distance(&self, _a: &K, _b: &K) -> f64 {
        0.0
    }
}

/// Absolute difference, for keys that are themselves numeric.
pub struct AbsDiff;

impl Metric<i64> for AbsDiff {
    fn distance(&self, a: &i64, b: &i64) -> f64 {
        (a - b).abs() as f64
    }
}

impl Metric<f64> for AbsDiff {
    fn distance(&self, a: &f64, b: &f64) -> f64 {
        (a - b).abs()
    }
}

impl<K: Clone, V: Clone> Series<K, V> {
    /// Walks the series in logical position order, tracking the last
    /// position whose own cell was `Value`/`NM`. An `NA` row is redirected
    /// to that position's underlying cell when `metric.distance(key_at(i),
    /// key_at(last_valid)) <= delta`; otherwise it's left as `NA`.
    pub fn roll_forward<M: Metric<K>>(&self, metric: &M, delta: f64) -> Series<K, V>
    where
        V: Default,
    {
        let n = self.index.len();
        let keys = self.index.keys();
        let mut last_valid: Option<usize> = None;
        let mut builder = ColumnBuilder::with_capacity(n);

        for i in 0..n {
            let row = self.index.index_at(i);
            let cell = self.column.get(row);
            match cell {
                Cell::Value(_) | Cell::NM => {
                    last_valid = Some(i);
                    builder.add(cell);
                }
                Cell::NA => {
                    let redirect = last_valid.filter(|&lv| {
                        metric.distance(&keys[i], &keys[lv]) <= delta
                    });
                    match redirect {
                        Some(lv) => builder.add(self.column.get(self.index.index_at(lv))),
                        None => builder.add(Cell::NA),
                    }
                }
            }
        }

        let column = builder.result();
        let out_indices = (0..n).collect();
        Series::new(
            Index::from_parts(keys.to_vec(), out_indices, self.index.ordered_flag()),
            column,
        )
    }
}
