//! Sparse backend: dense variable slots with per-slot neighbour maps.
//!
//! Variables get slots in insertion order. Each slot owns its linear bias
//! and a map from neighbour slot to coupler bias, mirrored on both ends.
//! Removing a variable moves the last slot into the hole and re-keys that
//! slot's neighbours, so removal costs O(degree) rather than O(n).

use crate::quadratic::storage::QuadraticStorage;
use crate::variable::{FxHashMap, Label};

/// Slot-indexed adjacency storage.
#[derive(Debug, Clone)]
pub struct SparseStorage<V: Label> {
    labels: Vec<V>,
    index: FxHashMap<V, usize>,
    linear: Vec<f64>,
    adj: Vec<FxHashMap<usize, f64>>,
    num_interactions: usize,
}

impl<V: Label> Default for SparseStorage<V> {
    fn default() -> Self {
        Self {
            labels: Vec::new(),
            index: FxHashMap::default(),
            linear: Vec::new(),
            adj: Vec::new(),
            num_interactions: 0,
        }
    }
}

impl<V: Label> SparseStorage<V> {
    fn slot(&mut self, v: &V) -> usize {
        if let Some(&i) = self.index.get(v) {
            return i;
        }
        let i = self.labels.len();
        self.labels.push(v.clone());
        self.index.insert(v.clone(), i);
        self.linear.push(0.0);
        self.adj.push(FxHashMap::default());
        i
    }

    fn slots(&self, u: &V, v: &V) -> Option<(usize, usize)> {
        Some((*self.index.get(u)?, *self.index.get(v)?))
    }

    fn unlink(&mut self, i: usize, j: usize) -> bool {
        if self.adj[i].remove(&j).is_some() {
            self.adj[j].remove(&i);
            self.num_interactions -= 1;
            true
        } else {
            false
        }
    }
}

impl<V: Label> QuadraticStorage<V> for SparseStorage<V> {
    const SCHEMA_VERSION: &'static str = "3.0.0";
    const NAME: &'static str = "sparse";

    fn num_variables(&self) -> usize {
        self.labels.len()
    }

    fn num_interactions(&self) -> usize {
        self.num_interactions
    }

    fn contains(&self, v: &V) -> bool {
        self.index.contains_key(v)
    }

    fn variables(&self) -> Vec<V> {
        let mut labels = self.labels.clone();
        labels.sort();
        labels
    }

    fn linear(&self, v: &V) -> Option<f64> {
        self.index.get(v).map(|&i| self.linear[i])
    }

    fn quadratic(&self, u: &V, v: &V) -> Option<f64> {
        let (i, j) = self.slots(u, v)?;
        self.adj[i].get(&j).copied()
    }

    fn add_linear(&mut self, v: &V, bias: f64) {
        let i = self.slot(v);
        self.linear[i] += bias;
    }

    fn set_linear(&mut self, v: &V, bias: f64) {
        let i = self.slot(v);
        self.linear[i] = bias;
    }

    fn set_quadratic(&mut self, u: &V, v: &V, bias: f64) {
        debug_assert!(u != v);
        let i = self.slot(u);
        let j = self.slot(v);
        if bias == 0.0 {
            self.unlink(i, j);
            return;
        }
        if self.adj[i].insert(j, bias).is_none() {
            self.num_interactions += 1;
        }
        self.adj[j].insert(i, bias);
    }

    fn remove_quadratic(&mut self, u: &V, v: &V) -> bool {
        match self.slots(u, v) {
            Some((i, j)) => self.unlink(i, j),
            None => false,
        }
    }

    fn remove_variable(&mut self, v: &V) -> bool {
        let Some(i) = self.index.remove(v) else {
            return false;
        };

        let neighbours: Vec<usize> = self.adj[i].keys().copied().collect();
        for j in neighbours {
            self.unlink(i, j);
        }

        let last = self.labels.len() - 1;
        self.labels.swap_remove(i);
        self.linear.swap_remove(i);
        self.adj.swap_remove(i);

        // Slot `last` moved into `i`: patch its label index and its neighbours.
        if i != last {
            self.index.insert(self.labels[i].clone(), i);
            let neighbours: Vec<usize> = self.adj[i].keys().copied().collect();
            for k in neighbours {
                if let Some(bias) = self.adj[k].remove(&last) {
                    self.adj[k].insert(i, bias);
                }
            }
        }
        true
    }

    fn adjacency(&self, v: &V) -> Vec<(V, f64)> {
        match self.index.get(v) {
            Some(&i) => self.adj[i]
                .iter()
                .map(|(&j, &bias)| (self.labels[j].clone(), bias))
                .collect(),
            None => Vec::new(),
        }
    }

    fn iter_linear(&self) -> Box<dyn Iterator<Item = (&V, f64)> + '_> {
        Box::new(self.labels.iter().zip(self.linear.iter().copied()))
    }

    fn iter_quadratic(&self) -> Box<dyn Iterator<Item = (&V, &V, f64)> + '_> {
        Box::new(self.adj.iter().enumerate().flat_map(move |(i, row)| {
            row.iter()
                .filter(move |&(&j, _)| i < j)
                .map(move |(&j, &bias)| (&self.labels[i], &self.labels[j], bias))
        }))
    }

    fn reserve_variables(&mut self, labels: &[V]) {
        self.labels.reserve(labels.len());
        for v in labels {
            self.slot(v);
        }
    }
}
