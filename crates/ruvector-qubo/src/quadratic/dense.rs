//! Dense backend: one packed upper-triangular matrix.
//!
//! For `n` variables the matrix is `(n+1)×(n+1)`. Cell `[i, j]` with
//! `i < j < n` holds the coupler between labels `i` and `j`, column `n`
//! holds linear biases, and cell `[n, n]` is the constant `1`. With
//! `s = [sample…, 1]` the biased part of the energy is `sᵀ M s - 1`.
//!
//! Labels are kept sorted, so inserting or removing a variable rebuilds
//! the matrix in O(n²). Prefer this backend for small, densely coupled
//! models.

use ndarray::{Array1, Array2};
use tracing::trace;

use crate::error::Result;
use crate::quadratic::storage::QuadraticStorage;
use crate::sample::{value_of, Sample};
use crate::variable::{FxHashMap, Label};

/// Packed matrix storage with a sorted label table.
#[derive(Debug, Clone)]
pub struct DenseStorage<V: Label> {
    labels: Vec<V>,
    index: FxHashMap<V, usize>,
    matrix: Array2<f64>,
}

impl<V: Label> Default for DenseStorage<V> {
    fn default() -> Self {
        Self {
            labels: Vec::new(),
            index: FxHashMap::default(),
            matrix: Array2::from_elem((1, 1), 1.0),
        }
    }
}

impl<V: Label> DenseStorage<V> {
    /// Column holding linear biases.
    #[inline]
    fn last(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    fn pair(&self, u: &V, v: &V) -> Option<(usize, usize)> {
        let i = *self.index.get(u)?;
        let j = *self.index.get(v)?;
        Some((i.min(j), i.max(j)))
    }

    /// Re-lay the matrix for a new sorted label set, keeping surviving cells.
    fn rebuild(&mut self, labels: Vec<V>) {
        let old_n = self.labels.len();
        let n = labels.len();

        let remap: Vec<Option<usize>> = self
            .labels
            .iter()
            .map(|v| labels.binary_search(v).ok())
            .chain(std::iter::once(Some(n)))
            .collect();

        let mut matrix = Array2::zeros((n + 1, n + 1));
        matrix[[n, n]] = 1.0;
        for i in 0..old_n {
            let Some(ni) = remap[i] else { continue };
            for j in (i + 1)..=old_n {
                if let Some(nj) = remap[j] {
                    matrix[[ni, nj]] = self.matrix[[i, j]];
                }
            }
        }

        trace!(old = old_n, new = n, "rebuilt dense interaction matrix");
        self.index = labels
            .iter()
            .enumerate()
            .map(|(i, v)| (v.clone(), i))
            .collect();
        self.labels = labels;
        self.matrix = matrix;
    }

    /// Dense index of `v`, inserting it at its sorted position if new.
    fn insert_label(&mut self, v: &V) -> usize {
        if let Some(&i) = self.index.get(v) {
            return i;
        }
        let mut labels = self.labels.clone();
        let pos = labels.binary_search(v).unwrap_or_else(|p| p);
        labels.insert(pos, v.clone());
        self.rebuild(labels);
        pos
    }

    /// Labels in matrix order.
    pub fn labels(&self) -> &[V] {
        &self.labels
    }

    /// The packed matrix itself.
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }
}

impl<V: Label> QuadraticStorage<V> for DenseStorage<V> {
    const SCHEMA_VERSION: &'static str = "3.0.0-dense";
    const NAME: &'static str = "dense";

    fn num_variables(&self) -> usize {
        self.labels.len()
    }

    fn num_interactions(&self) -> usize {
        let n = self.last();
        (0..n)
            .map(|i| ((i + 1)..n).filter(|&j| self.matrix[[i, j]] != 0.0).count())
            .sum()
    }

    fn contains(&self, v: &V) -> bool {
        self.index.contains_key(v)
    }

    fn variables(&self) -> Vec<V> {
        self.labels.clone()
    }

    fn linear(&self, v: &V) -> Option<f64> {
        self.index.get(v).map(|&i| self.matrix[[i, self.last()]])
    }

    fn quadratic(&self, u: &V, v: &V) -> Option<f64> {
        let (i, j) = self.pair(u, v)?;
        let bias = self.matrix[[i, j]];
        (i != j && bias != 0.0).then_some(bias)
    }

    fn add_linear(&mut self, v: &V, bias: f64) {
        let i = self.insert_label(v);
        let n = self.last();
        self.matrix[[i, n]] += bias;
    }

    fn set_linear(&mut self, v: &V, bias: f64) {
        let i = self.insert_label(v);
        let n = self.last();
        self.matrix[[i, n]] = bias;
    }

    fn set_quadratic(&mut self, u: &V, v: &V, bias: f64) {
        debug_assert!(u != v);
        self.insert_label(u);
        self.insert_label(v);
        if let Some((i, j)) = self.pair(u, v) {
            self.matrix[[i, j]] = bias;
        }
    }

    fn remove_quadratic(&mut self, u: &V, v: &V) -> bool {
        match self.pair(u, v) {
            Some((i, j)) if i != j && self.matrix[[i, j]] != 0.0 => {
                self.matrix[[i, j]] = 0.0;
                true
            }
            _ => false,
        }
    }

    fn remove_variable(&mut self, v: &V) -> bool {
        if !self.index.contains_key(v) {
            return false;
        }
        let labels: Vec<V> = self.labels.iter().filter(|u| *u != v).cloned().collect();
        self.rebuild(labels);
        true
    }

    fn adjacency(&self, v: &V) -> Vec<(V, f64)> {
        let Some(&i) = self.index.get(v) else {
            return Vec::new();
        };
        (0..self.last())
            .filter(|&j| j != i)
            .filter_map(|j| {
                let bias = self.matrix[[i.min(j), i.max(j)]];
                (bias != 0.0).then(|| (self.labels[j].clone(), bias))
            })
            .collect()
    }

    fn iter_linear(&self) -> Box<dyn Iterator<Item = (&V, f64)> + '_> {
        let n = self.last();
        Box::new(
            self.labels
                .iter()
                .enumerate()
                .map(move |(i, v)| (v, self.matrix[[i, n]])),
        )
    }

    fn iter_quadratic(&self) -> Box<dyn Iterator<Item = (&V, &V, f64)> + '_> {
        let n = self.last();
        Box::new((0..n).flat_map(move |i| {
            ((i + 1)..n).filter_map(move |j| {
                let bias = self.matrix[[i, j]];
                (bias != 0.0).then(|| (&self.labels[i], &self.labels[j], bias))
            })
        }))
    }

    fn reserve_variables(&mut self, labels: &[V]) {
        let mut merged = self.labels.clone();
        merged.extend(labels.iter().filter(|v| !self.index.contains_key(*v)).cloned());
        merged.sort();
        merged.dedup();
        if merged.len() != self.labels.len() {
            self.rebuild(merged);
        }
    }

    fn interaction_matrix(&self) -> Array2<f64> {
        self.matrix.clone()
    }

    fn energy(&self, sample: &Sample<V>) -> Result<f64> {
        let n = self.last();
        let mut s = Array1::<f64>::ones(n + 1);
        for (i, v) in self.labels.iter().enumerate() {
            s[i] = value_of(sample, v)?;
        }
        Ok(s.dot(&self.matrix.dot(&s)) - 1.0)
    }
}
