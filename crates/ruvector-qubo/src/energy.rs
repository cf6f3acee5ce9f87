//! Energy evaluation: the `EnergyModel` trait and batch dispatch.

use tracing::trace;

use crate::config::ModelConfig;
use crate::error::Result;
use crate::sample::{value_of, Sample};
use crate::variable::Label;

/// Trait implemented by any model that can return a scalar energy.
pub trait EnergyModel<V: Label> {
    /// Compute the energy of one sample, offset included.
    ///
    /// Fails if the sample lacks a model variable.
    fn energy(&self, sample: &Sample<V>) -> Result<f64>;

    /// Configuration governing batch evaluation.
    fn config(&self) -> &ModelConfig;

    /// Compute the energy of each sample, in input order.
    fn energies(&self, samples: &[Sample<V>]) -> Result<Vec<f64>>
    where
        Self: Sync,
    {
        batch_energies(samples, self.config().parallel_energy_threshold, |s| {
            self.energy(s)
        })
    }
}

/// Evaluate `energy` over `samples`, on rayon once the batch reaches `threshold`.
pub fn batch_energies<S, F>(samples: &[S], threshold: usize, energy: F) -> Result<Vec<f64>>
where
    S: Sync,
    F: Fn(&S) -> Result<f64> + Sync,
{
    #[cfg(feature = "parallel")]
    {
        if samples.len() >= threshold {
            use rayon::prelude::*;
            trace!(samples = samples.len(), "evaluating energies in parallel");
            return samples.par_iter().map(&energy).collect();
        }
    }

    trace!(samples = samples.len(), threshold, "evaluating energies sequentially");
    samples.iter().map(energy).collect()
}

/// Product of the sample values over `key`, stopping at the first zero.
///
/// A zero factor only occurs for binary samples, where it lets high-degree
/// terms skip the rest of their variables.
#[inline]
pub fn term_product<V: Label>(key: &[V], sample: &Sample<V>) -> Result<f64> {
    let mut product = 1.0;
    for v in key {
        product *= value_of(sample, v)?;
        if product == 0.0 {
            break;
        }
    }
    Ok(product)
}
