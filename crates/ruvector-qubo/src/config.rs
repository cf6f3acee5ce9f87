//! Configuration shared by quadratic and polynomial models

use serde::{Deserialize, Serialize};

use crate::error::{QuboError, Result};

/// Hard upper bound on conversion arity: subsets are enumerated with a `u64` mask.
pub const ARITY_CEILING: usize = 63;

/// Tunables carried by every model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Largest term arity accepted by vartype conversion
    pub max_conversion_arity: usize,
    /// Batch size at which `energies` switches to parallel evaluation
    pub parallel_energy_threshold: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            max_conversion_arity: 32,
            parallel_energy_threshold: 64,
        }
    }
}

impl ModelConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the conversion arity limit
    pub fn with_max_conversion_arity(mut self, arity: usize) -> Self {
        self.max_conversion_arity = arity;
        self
    }

    /// Set the parallel batch threshold
    pub fn with_parallel_energy_threshold(mut self, threshold: usize) -> Self {
        self.parallel_energy_threshold = threshold;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_conversion_arity == 0 || self.max_conversion_arity > ARITY_CEILING {
            return Err(QuboError::invalid_config(
                "max_conversion_arity",
                self.max_conversion_arity,
                format!("1..={}", ARITY_CEILING),
            ));
        }
        if self.parallel_energy_threshold == 0 {
            return Err(QuboError::invalid_config(
                "parallel_energy_threshold",
                self.parallel_energy_threshold,
                "> 0",
            ));
        }
        Ok(())
    }
}
