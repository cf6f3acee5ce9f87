//! Arena-with-index storage for degree-general terms.
//!
//! Keys and biases live in two parallel vectors. An inverse hash index maps
//! each key to its slot, so lookup is O(1) on average and removal is O(1)
//! amortized: the removed slot is filled by the last element and the index
//! entry of that element is patched. Enumeration order is therefore
//! arbitrary and changes on removal.
//!
//! Invariants:
//! - every stored key is sorted and free of repeated variables
//! - no key is stored twice and no stored bias is exactly `0.0`
//! - `each_variable_num[v]` counts the stored keys containing `v`
//! - `degree` is the longest key ever inserted; removal never lowers it

use tracing::debug;

use crate::algebra::{check_range, inverse_scale};
use crate::error::{QuboError, Result};
use crate::variable::{FxHashMap, FxHashSet, Label};

/// Sparse term store keyed by sorted variable tuples.
#[derive(Debug, Clone)]
pub struct PolynomialStore<V: Label> {
    keys: Vec<Vec<V>>,
    values: Vec<f64>,
    index: FxHashMap<Vec<V>, usize>,
    each_variable_num: FxHashMap<V, usize>,
    degree: usize,
}

impl<V: Label> Default for PolynomialStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Label> PolynomialStore<V> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            index: FxHashMap::default(),
            each_variable_num: FxHashMap::default(),
            degree: 0,
        }
    }

    /// Create an empty store with room for `capacity` terms.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut store = Self::new();
        store.keys.reserve(capacity);
        store.values.reserve(capacity);
        store.index.reserve(capacity);
        store
    }

    /// Sort a key, rejecting repeated variables.
    pub fn sort_key(key: &[V]) -> Result<Vec<V>> {
        let mut sorted = key.to_vec();
        sorted.sort();
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            return Err(QuboError::self_loop(key));
        }
        Ok(sorted)
    }

    /// Bias of `key`, or `0.0` if absent.
    pub fn get(&self, key: &[V]) -> Result<f64> {
        let sorted = Self::sort_key(key)?;
        Ok(self.get_sorted(&sorted))
    }

    /// Bias of an already sorted key.
    #[inline]
    pub fn get_sorted(&self, key: &[V]) -> f64 {
        self.index.get(key).map_or(0.0, |&i| self.values[i])
    }

    /// True if `key` is stored.
    pub fn contains(&self, key: &[V]) -> Result<bool> {
        let sorted = Self::sort_key(key)?;
        Ok(self.index.contains_key(sorted.as_slice()))
    }

    /// Add `value` to the bias of `key`, inserting it if new.
    ///
    /// A term whose bias reaches exactly zero is removed.
    pub fn add(&mut self, key: &[V], value: f64) -> Result<()> {
        let sorted = Self::sort_key(key)?;
        self.add_sorted(sorted, value);
        Ok(())
    }

    pub(crate) fn add_sorted(&mut self, key: Vec<V>, value: f64) {
        match self.index.get(&key).copied() {
            Some(i) => {
                let updated = self.values[i] + value;
                if updated == 0.0 {
                    self.remove_at(i);
                } else {
                    self.values[i] = updated;
                }
            }
            None if value != 0.0 => self.insert_new(key, value),
            None => {}
        }
    }

    /// Overwrite the bias of `key`; zero removes it.
    pub fn set(&mut self, key: &[V], value: f64) -> Result<()> {
        let sorted = Self::sort_key(key)?;
        self.set_sorted(sorted, value);
        Ok(())
    }

    pub(crate) fn set_sorted(&mut self, key: Vec<V>, value: f64) {
        match self.index.get(&key).copied() {
            Some(i) if value == 0.0 => self.remove_at(i),
            Some(i) => self.values[i] = value,
            None if value != 0.0 => self.insert_new(key, value),
            None => {}
        }
    }

    fn insert_new(&mut self, key: Vec<V>, value: f64) {
        for v in &key {
            *self.each_variable_num.entry(v.clone()).or_insert(0) += 1;
        }
        self.degree = self.degree.max(key.len());
        self.index.insert(key.clone(), self.keys.len());
        self.keys.push(key);
        self.values.push(value);
    }

    /// Remove `key`; returns false if it was absent.
    pub fn remove(&mut self, key: &[V]) -> Result<bool> {
        let sorted = Self::sort_key(key)?;
        Ok(self.remove_sorted(&sorted))
    }

    pub(crate) fn remove_sorted(&mut self, key: &[V]) -> bool {
        match self.index.get(key).copied() {
            Some(i) => {
                self.remove_at(i);
                true
            }
            None => false,
        }
    }

    fn remove_at(&mut self, i: usize) {
        for v in &self.keys[i] {
            if let Some(count) = self.each_variable_num.get_mut(v) {
                *count -= 1;
                if *count == 0 {
                    self.each_variable_num.remove(v);
                }
            }
        }

        let removed = self.keys.swap_remove(i);
        self.values.swap_remove(i);
        self.index.remove(&removed);

        // The former last element now sits at `i`.
        if i < self.keys.len() {
            if let Some(slot) = self.index.get_mut(&self.keys[i]) {
                *slot = i;
            }
        }
    }

    /// Remove every term containing `v`; returns how many were removed.
    pub fn remove_variable(&mut self, v: &V) -> usize {
        let doomed: Vec<usize> = self
            .keys
            .iter()
            .enumerate()
            .filter(|(_, key)| key.binary_search(v).is_ok())
            .map(|(i, _)| i)
            .collect();

        // Highest slot first: a swapped-in element has already been visited.
        for &i in doomed.iter().rev() {
            self.remove_at(i);
        }
        doomed.len()
    }

    fn ignored_set(ignored: &[Vec<V>]) -> Result<FxHashSet<Vec<V>>> {
        ignored.iter().map(|k| Self::sort_key(k)).collect()
    }

    #[inline]
    fn skipped(key: &[V], ignored: &FxHashSet<Vec<V>>, ignore_offset: bool) -> bool {
        (ignore_offset && key.is_empty()) || ignored.contains(key)
    }

    /// Multiply every bias not in `ignored` by `factor`.
    ///
    /// The offset (empty key) is skipped when `ignore_offset` is set.
    pub fn scale(&mut self, factor: f64, ignored: &[Vec<V>], ignore_offset: bool) -> Result<()> {
        let ignored = Self::ignored_set(ignored)?;
        self.scale_sorted(factor, &ignored, ignore_offset);
        Ok(())
    }

    pub(crate) fn scale_sorted(
        &mut self,
        factor: f64,
        ignored: &FxHashSet<Vec<V>>,
        ignore_offset: bool,
    ) {
        for i in (0..self.keys.len()).rev() {
            if Self::skipped(&self.keys[i], ignored, ignore_offset) {
                continue;
            }
            let scaled = self.values[i] * factor;
            if scaled == 0.0 {
                self.remove_at(i);
            } else {
                self.values[i] = scaled;
            }
        }
    }

    /// Rescale so the non-ignored biases fit `range`.
    ///
    /// The offset takes part unless `ignore_offset` is set. Returns the
    /// divisor applied, or `None` when nothing was scaled: no eligible
    /// terms, or a divisor that is not positive and finite.
    pub fn normalize(
        &mut self,
        range: (f64, f64),
        ignored: &[Vec<V>],
        ignore_offset: bool,
    ) -> Result<Option<f64>> {
        let ignored = Self::ignored_set(ignored)?;
        self.normalize_sorted(range, &ignored, ignore_offset)
    }

    pub(crate) fn normalize_sorted(
        &mut self,
        range: (f64, f64),
        ignored: &FxHashSet<Vec<V>>,
        ignore_offset: bool,
    ) -> Result<Option<f64>> {
        check_range(range)?;

        let extremes = self
            .keys
            .iter()
            .zip(&self.values)
            .filter(|(key, _)| !Self::skipped(key, ignored, ignore_offset))
            .fold(None, |acc: Option<(f64, f64)>, (_, &b)| match acc {
                None => Some((b, b)),
                Some((lo, hi)) => Some((lo.min(b), hi.max(b))),
            });

        let Some(extremes) = extremes else {
            debug!("no eligible terms, skipping normalization");
            return Ok(None);
        };

        let inv_scale = inverse_scale(extremes, range);
        if inv_scale <= 0.0 || !inv_scale.is_finite() {
            debug!(inv_scale, "degenerate scale, skipping normalization");
            return Ok(None);
        }

        self.scale_sorted(1.0 / inv_scale, ignored, ignore_offset);
        Ok(Some(inv_scale))
    }

    /// Number of stored terms, offset included.
    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True if no term is stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Longest key ever inserted.
    #[inline]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Number of variables appearing in at least one stored key.
    #[inline]
    pub fn num_variables(&self) -> usize {
        self.each_variable_num.len()
    }

    /// True if `v` appears in a stored key.
    #[inline]
    pub fn has_variable(&self, v: &V) -> bool {
        self.each_variable_num.contains_key(v)
    }

    /// Number of stored keys containing `v`.
    pub fn participation(&self, v: &V) -> usize {
        self.each_variable_num.get(v).copied().unwrap_or(0)
    }

    /// Variables in ascending order.
    pub fn variables(&self) -> Vec<V> {
        let mut vars: Vec<V> = self.each_variable_num.keys().cloned().collect();
        vars.sort();
        vars
    }

    /// Iterate over the variables in no particular order.
    pub fn variables_unordered(&self) -> impl Iterator<Item = &V> {
        self.each_variable_num.keys()
    }

    /// Stored keys, in slot order.
    pub fn keys(&self) -> &[Vec<V>] {
        &self.keys
    }

    /// Stored biases, parallel to [`keys`](Self::keys).
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterate `(key, bias)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&[V], f64)> + '_ {
        self.keys
            .iter()
            .zip(&self.values)
            .map(|(k, &b)| (k.as_slice(), b))
    }

    /// Bias of the empty key.
    #[inline]
    pub fn offset(&self) -> f64 {
        self.get_sorted(&[])
    }

    /// Raise the degree watermark to at least `degree`.
    pub(crate) fn raise_degree(&mut self, degree: usize) {
        self.degree = self.degree.max(degree);
    }

    /// Drop every term and reset the degree watermark.
    pub fn clear(&mut self) {
        self.keys.clear();
        self.values.clear();
        self.index.clear();
        self.each_variable_num.clear();
        self.degree = 0;
    }

    /// Check the index and counters against the parallel arrays.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        assert_eq!(self.keys.len(), self.values.len());
        assert_eq!(self.keys.len(), self.index.len());
        let mut counts: FxHashMap<V, usize> = FxHashMap::default();
        for (i, key) in self.keys.iter().enumerate() {
            assert_eq!(self.index[key], i);
            assert!(key.windows(2).all(|w| w[0] < w[1]));
            assert_ne!(self.values[i], 0.0);
            for v in key {
                *counts.entry(v.clone()).or_insert(0) += 1;
            }
        }
        assert_eq!(counts, self.each_variable_num);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn store(terms: &[(&[i64], f64)]) -> PolynomialStore<i64> {
        let mut s = PolynomialStore::new();
        for (k, b) in terms {
            s.add(k, *b).unwrap();
        }
        s
    }

    #[test]
    fn test_accumulates_regardless_of_order() {
        let s = store(&[(&[2, 1], 1.5), (&[1, 2], 2.0)]);
        assert_eq!(s.len(), 1);
        assert_eq!(s.get(&[1, 2]).unwrap(), 3.5);
        assert_eq!(s.get(&[2, 1]).unwrap(), 3.5);
        assert_eq!(s.get(&[1, 3]).unwrap(), 0.0);
        s.assert_consistent();
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut s = PolynomialStore::<i64>::new();
        assert!(matches!(s.add(&[3, 3], 1.0), Err(QuboError::SelfLoop { .. })));
        assert!(s.get(&[1, 2, 1]).is_err());
        assert!(s.is_empty());
    }

    #[test]
    fn test_zero_accumulation_removes_term() {
        let mut s = store(&[(&[1, 2], 12.0), (&[1], 1.0)]);
        s.add(&[1, 2], -12.0).unwrap();
        assert_eq!(s.len(), 1);
        assert_eq!(s.participation(&2), 0);
        assert!(!s.has_variable(&2));
        s.add(&[5], 0.0).unwrap();
        assert!(!s.has_variable(&5));
        s.assert_consistent();
    }

    #[test]
    fn test_swap_remove_patches_index() {
        let mut s = store(&[(&[1], 1.0), (&[2], 2.0), (&[3], 3.0), (&[1, 2, 3], 4.0)]);
        assert!(s.remove(&[1]).unwrap());
        s.assert_consistent();
        assert_eq!(s.get(&[3, 2, 1]).unwrap(), 4.0);
        assert_eq!(s.get(&[2]).unwrap(), 2.0);

        assert!(!s.remove(&[9]).unwrap());
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn test_remove_variable() {
        let mut s = store(&[(&[1], 1.0), (&[1, 2], 2.0), (&[2, 3], 3.0), (&[1, 2, 3], 4.0), (&[], 0.5)]);
        assert_eq!(s.participation(&1), 3);
        assert_eq!(s.remove_variable(&1), 3);
        s.assert_consistent();
        assert_eq!(s.variables(), vec![2, 3]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.offset(), 0.5);
        assert_eq!(s.remove_variable(&7), 0);
    }

    #[test]
    fn test_degree_watermark_is_monotonic() {
        let mut s = store(&[(&[1, 2, 3, 4], 1.0), (&[1], 1.0)]);
        assert_eq!(s.degree(), 4);
        s.remove(&[1, 2, 3, 4]).unwrap();
        assert_eq!(s.degree(), 4);
        s.clear();
        assert_eq!(s.degree(), 0);
    }

    #[test]
    fn test_scale_respects_ignored() {
        let mut s = store(&[(&[1, 2], 24.0), (&[2, 3, 4], 468.0), (&[1], 2.0), (&[], 100.0)]);
        s.scale(0.5, &[vec![2, 1], vec![4, 3, 2]], true).unwrap();
        assert_eq!(s.get(&[1, 2]).unwrap(), 24.0);
        assert_eq!(s.get(&[2, 3, 4]).unwrap(), 468.0);
        assert_eq!(s.get(&[1]).unwrap(), 1.0);
        assert_eq!(s.offset(), 100.0);

        s.scale(0.5, &[vec![]], false).unwrap();
        assert_eq!(s.offset(), 100.0);
        assert_eq!(s.get(&[1]).unwrap(), 0.5);
    }

    #[test]
    fn test_scale_by_zero_empties_store() {
        let mut s = store(&[(&[1, 2], 1.0), (&[3], 2.0), (&[], 1.0)]);
        s.scale(0.0, &[], false).unwrap();
        assert!(s.is_empty());
        assert_eq!(s.num_variables(), 0);
        s.assert_consistent();
    }

    #[test]
    fn test_normalize() {
        let mut s = store(&[(&[1], -2.0), (&[2], 1.5), (&[1, 2], -1.0), (&[], 1.0)]);
        let inv = s.normalize((-1.0, 1.0), &[], false).unwrap();
        assert_eq!(inv, Some(2.0));
        assert_relative_eq!(s.get(&[1]).unwrap(), -1.0);
        assert_relative_eq!(s.get(&[2]).unwrap(), 0.75);
        assert_relative_eq!(s.get(&[1, 2]).unwrap(), -0.5);
        assert_relative_eq!(s.offset(), 0.5);
    }

    #[test]
    fn test_normalize_skips_when_everything_ignored() {
        let mut s = store(&[(&[1], 4.0), (&[1, 2], 2.0)]);
        let inv = s
            .normalize((-1.0, 1.0), &[vec![1], vec![1, 2]], false)
            .unwrap();
        assert_eq!(inv, None);
        assert_eq!(s.get(&[1]).unwrap(), 4.0);

        assert!(s.normalize((0.0, 0.0), &[], false).is_err());
        assert!(s.normalize((1.0, -1.0), &[], false).is_err());
    }

    #[test]
    fn test_normalize_counts_offset_unless_ignored() {
        let mut s = store(&[(&[], 10.0), (&[1], 1.0)]);
        assert_eq!(s.clone().normalize((-1.0, 1.0), &[], true).unwrap(), Some(1.0));

        assert_eq!(s.normalize((-1.0, 1.0), &[], false).unwrap(), Some(10.0));
        assert_relative_eq!(s.offset(), 1.0);
        assert_relative_eq!(s.get(&[1]).unwrap(), 0.1);
    }

    #[test]
    fn test_normalize_never_flips_signs() {
        let mut s = store(&[(&[1], -4.0), (&[2], -2.0)]);
        assert_eq!(s.normalize((0.0, 1.0), &[], false).unwrap(), None);
        assert_eq!(s.get(&[1]).unwrap(), -4.0);
        assert_eq!(s.get(&[2]).unwrap(), -2.0);
    }

    #[test]
    fn test_raise_degree_keeps_the_larger_watermark() {
        let mut s = store(&[(&[1], 1.0)]);
        s.raise_degree(4);
        assert_eq!(s.degree(), 4);
        s.raise_degree(2);
        assert_eq!(s.degree(), 4);
    }
}
