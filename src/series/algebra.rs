//! `+`/`-`/`*`/`/` for numeric series, lifted cell-wise through
//! [`NumericCell`] via `zip_map`/`zip_map_cell`. Arithmetic is just
//! `zipMap` with a specific combining function, not a separate code path.

use std::ops::{Add, Div, Mul, Sub};

use crate::column::NumericCell;

use super::Series;

impl<K: Ord + Clone + std::hash::Hash, V: NumericCell + Default> Add for &Series<K, V> {
    type Output = Series<K, V>;

    fn add(self, other: &Series<K, V>) -> Series<K, V> {
        self.zip_map(other, |a, b| V::cell_add(&a, &b))
    }
}

impl<K: Ord + Clone + std::hash::Hash, V: NumericCell + Default> Sub for &Series<K, V> {
    type Output = Series<K, V>;

    fn sub(self, other: &Series<K, V>) -> Series<K, V> {
        self.zip_map(other, |a, b| V::cell_sub(&a, &b))
    }
}

impl<K: Ord + Clone + std::hash::Hash, V: NumericCell + Default> Mul for &Series<K, V> {
    type Output = Series<K, V>;

    fn mul(self, other: &Series<K, V>) -> Series<K, V> {
        self.zip_map(other, |a, b| V::cell_mul(&a, &b))
    }
}

impl<K: Ord + Clone + std::hash::Hash, V: NumericCell + Default> Div for &Series<K, V> {
    type Output = Series<K, V>;

    fn div(self, other: &Series<K, V>) -> Series<K, V> {
        self.zip_map_cell(other, |a, b| V::cell_div(&a, &b))
    }
}
