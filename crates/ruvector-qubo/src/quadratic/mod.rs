//! Degree-2 models (Ising / QUBO) over interchangeable storage backends.
//!
//! | backend | add variable | remove variable | best for |
//! |---------|--------------|-----------------|----------|
//! | [`DenseStorage`] | O(n²) | O(n²) | small, densely coupled models |
//! | [`SparseStorage`] | O(1) | O(degree) | large sparse models |
//! | [`DictStorage`] | O(1) | O(degree) | frequent structural edits |

pub mod dense;
pub mod dict;
pub mod model;
pub mod sparse;
pub mod storage;

pub use dense::DenseStorage;
pub use dict::DictStorage;
pub use model::{
    BinaryQuadraticModel, DenseBqm, DictBqm, IgnoredTerms, NormalizeOptions, SparseBqm,
};
pub use sparse::SparseStorage;
pub use storage::QuadraticStorage;
