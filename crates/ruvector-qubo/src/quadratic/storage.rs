//! The capability interface shared by every quadratic backend.

use std::fmt;

use ndarray::Array2;

use crate::error::Result;
use crate::sample::{value_of, Sample};
use crate::variable::Label;

/// Pair key with the smaller label first.
#[inline]
pub fn ordered<V: Label>(u: &V, v: &V) -> (V, V) {
    if u <= v {
        (u.clone(), v.clone())
    } else {
        (v.clone(), u.clone())
    }
}

/// Storage for linear and pairwise biases.
///
/// A variable exists once it has been given a linear bias (possibly zero)
/// or appears in a coupler. A coupler exists only while its bias is
/// non-zero; setting or accumulating it to `0.0` removes it, while its
/// endpoints remain.
///
/// Backends never see self-loops: the model rejects `(v, v)` before any
/// call reaches them.
pub trait QuadraticStorage<V: Label>: Clone + fmt::Debug + Default + Send + Sync {
    /// Schema tag written into serialized records.
    const SCHEMA_VERSION: &'static str;

    /// Short backend name for diagnostics.
    const NAME: &'static str;

    /// Number of variables.
    fn num_variables(&self) -> usize;

    /// Number of non-zero couplers.
    fn num_interactions(&self) -> usize;

    /// True if `v` is a variable.
    fn contains(&self, v: &V) -> bool;

    /// Variables in ascending order.
    fn variables(&self) -> Vec<V>;

    /// Linear bias of `v`, `None` if absent.
    fn linear(&self, v: &V) -> Option<f64>;

    /// Coupler bias between `u` and `v` in either order, `None` if absent.
    fn quadratic(&self, u: &V, v: &V) -> Option<f64>;

    /// Add to the linear bias of `v`, inserting it with zero bias first if new.
    fn add_linear(&mut self, v: &V, bias: f64);

    /// Overwrite the linear bias of `v`, inserting it if new.
    fn set_linear(&mut self, v: &V, bias: f64);

    /// Overwrite the coupler bias, inserting missing endpoints.
    fn set_quadratic(&mut self, u: &V, v: &V, bias: f64);

    /// Add to the coupler bias, inserting missing endpoints.
    fn add_quadratic(&mut self, u: &V, v: &V, bias: f64) {
        let current = self.quadratic(u, v).unwrap_or(0.0);
        self.set_quadratic(u, v, current + bias);
    }

    /// Remove a coupler; returns false if it was absent.
    fn remove_quadratic(&mut self, u: &V, v: &V) -> bool;

    /// Remove `v` with all its couplers; returns false if it was absent.
    fn remove_variable(&mut self, v: &V) -> bool;

    /// Neighbours of `v` with their coupler biases.
    fn adjacency(&self, v: &V) -> Vec<(V, f64)>;

    /// Iterate `(variable, linear bias)` in no particular order.
    fn iter_linear(&self) -> Box<dyn Iterator<Item = (&V, f64)> + '_>;

    /// Iterate each coupler once as `(u, v, bias)` in no particular order.
    fn iter_quadratic(&self) -> Box<dyn Iterator<Item = (&V, &V, f64)> + '_>;

    /// Insert several variables with zero bias.
    fn reserve_variables(&mut self, labels: &[V]) {
        for v in labels {
            self.add_linear(v, 0.0);
        }
    }

    /// Drop every variable and coupler.
    fn clear(&mut self) {
        *self = Self::default();
    }

    /// Packed `(n+1)×(n+1)` upper-triangular matrix in ascending label order.
    ///
    /// Couplers sit above the diagonal, linear biases in the last column
    /// and the bottom-right cell holds the constant `1`.
    fn interaction_matrix(&self) -> Array2<f64> {
        let labels = self.variables();
        let n = labels.len();
        let position = |v: &V| labels.binary_search(v).unwrap_or(n);

        let mut matrix = Array2::zeros((n + 1, n + 1));
        matrix[[n, n]] = 1.0;
        for (v, bias) in self.iter_linear() {
            matrix[[position(v), n]] = bias;
        }
        for (u, v, bias) in self.iter_quadratic() {
            let (i, j) = (position(u), position(v));
            matrix[[i.min(j), i.max(j)]] = bias;
        }
        matrix
    }

    /// Energy of the stored biases, without the offset.
    ///
    /// The sample must cover every variable.
    fn energy(&self, sample: &Sample<V>) -> Result<f64> {
        let mut energy = 0.0;
        for (v, bias) in self.iter_linear() {
            energy += bias * value_of(sample, v)?;
        }
        for (u, v, bias) in self.iter_quadratic() {
            energy += bias * value_of(sample, u)? * value_of(sample, v)?;
        }
        Ok(energy)
    }
}
