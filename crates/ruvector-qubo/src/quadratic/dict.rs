//! Dict backend: label-keyed hash maps for linear, quadratic and adjacency.

use crate::quadratic::storage::{ordered, QuadraticStorage};
use crate::variable::{FxHashMap, FxHashSet, Label};

/// Label-keyed map storage.
///
/// Coupler keys are stored ordered `(min, max)`; the adjacency sets mirror
/// them for neighbour queries.
#[derive(Debug, Clone)]
pub struct DictStorage<V: Label> {
    linear: FxHashMap<V, f64>,
    quadratic: FxHashMap<(V, V), f64>,
    adj: FxHashMap<V, FxHashSet<V>>,
}

impl<V: Label> Default for DictStorage<V> {
    fn default() -> Self {
        Self {
            linear: FxHashMap::default(),
            quadratic: FxHashMap::default(),
            adj: FxHashMap::default(),
        }
    }
}

impl<V: Label> DictStorage<V> {
    fn ensure(&mut self, v: &V) {
        if !self.linear.contains_key(v) {
            self.linear.insert(v.clone(), 0.0);
            self.adj.insert(v.clone(), FxHashSet::default());
        }
    }
}

impl<V: Label> QuadraticStorage<V> for DictStorage<V> {
    const SCHEMA_VERSION: &'static str = "3.0.0";
    const NAME: &'static str = "dict";

    fn num_variables(&self) -> usize {
        self.linear.len()
    }

    fn num_interactions(&self) -> usize {
        self.quadratic.len()
    }

    fn contains(&self, v: &V) -> bool {
        self.linear.contains_key(v)
    }

    fn variables(&self) -> Vec<V> {
        let mut labels: Vec<V> = self.linear.keys().cloned().collect();
        labels.sort();
        labels
    }

    fn linear(&self, v: &V) -> Option<f64> {
        self.linear.get(v).copied()
    }

    fn quadratic(&self, u: &V, v: &V) -> Option<f64> {
        self.quadratic.get(&ordered(u, v)).copied()
    }

    fn add_linear(&mut self, v: &V, bias: f64) {
        self.ensure(v);
        if let Some(b) = self.linear.get_mut(v) {
            *b += bias;
        }
    }

    fn set_linear(&mut self, v: &V, bias: f64) {
        self.ensure(v);
        self.linear.insert(v.clone(), bias);
    }

    fn set_quadratic(&mut self, u: &V, v: &V, bias: f64) {
        debug_assert!(u != v);
        self.ensure(u);
        self.ensure(v);
        if bias == 0.0 {
            self.remove_quadratic(u, v);
            return;
        }
        self.quadratic.insert(ordered(u, v), bias);
        if let Some(n) = self.adj.get_mut(u) {
            n.insert(v.clone());
        }
        if let Some(n) = self.adj.get_mut(v) {
            n.insert(u.clone());
        }
    }

    fn remove_quadratic(&mut self, u: &V, v: &V) -> bool {
        if self.quadratic.remove(&ordered(u, v)).is_none() {
            return false;
        }
        if let Some(n) = self.adj.get_mut(u) {
            n.remove(v);
        }
        if let Some(n) = self.adj.get_mut(v) {
            n.remove(u);
        }
        true
    }

    fn remove_variable(&mut self, v: &V) -> bool {
        if self.linear.remove(v).is_none() {
            return false;
        }
        for u in self.adj.remove(v).unwrap_or_default() {
            self.quadratic.remove(&ordered(&u, v));
            if let Some(n) = self.adj.get_mut(&u) {
                n.remove(v);
            }
        }
        true
    }

    fn adjacency(&self, v: &V) -> Vec<(V, f64)> {
        self.adj
            .get(v)
            .map(|neighbours| {
                neighbours
                    .iter()
                    .filter_map(|u| self.quadratic(u, v).map(|b| (u.clone(), b)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn iter_linear(&self) -> Box<dyn Iterator<Item = (&V, f64)> + '_> {
        Box::new(self.linear.iter().map(|(v, &b)| (v, b)))
    }

    fn iter_quadratic(&self) -> Box<dyn Iterator<Item = (&V, &V, f64)> + '_> {
        Box::new(self.quadratic.iter().map(|((u, v), &b)| (u, v, b)))
    }
}
