//! # ruvector-qubo
//!
//! Binary quadratic and polynomial models for Ising / QUBO / HUBO
//! optimisation problems.
//!
//! A model is an energy function over variables that take spin
//! (`{-1, +1}`) or binary (`{0, 1}`) values. Quadratic models store linear
//! biases and pairwise couplers behind a choice of storage backend;
//! polynomial models store terms of any degree. Both can be rewritten
//! between encodings without changing the energy of any assignment.
//!
//! ## Core abstractions
//!
//! | Module | What it provides |
//! |--------|-----------------|
//! | [`vartype`] | `Vartype` – spin / binary encodings and value conversion |
//! | [`variable`] | `Variable` labels, the `Label` bound, Fx hash aliases |
//! | [`quadratic`] | `BinaryQuadraticModel` over `Dense` / `Sparse` / `Dict` storage |
//! | [`polynomial`] | `BinaryPolynomialModel` and its indexed `PolynomialStore` |
//! | [`algebra`] | Spin ↔ binary change of basis for pairs and arbitrary terms |
//! | [`energy`] | `EnergyModel` trait with batch (rayon) evaluation |
//! | [`sample`] | `Sample` maps and lookup helpers |
//! | [`serialization`] | Versioned `BqmRecord` / `BpmRecord` and JSON helpers |
//! | [`config`] | `ModelConfig` – conversion and parallelism limits |
//! | [`error`] | `QuboError` and the crate `Result` |
//!
//! ## Quick start
//!
//! ```
//! use ruvector_qubo::{sample_from, DictBqm, EnergyModel, Vartype};
//!
//! let mut bqm: DictBqm<i64> = DictBqm::new(
//!     vec![(1, 1.0), (2, 1.0)],
//!     vec![((1, 2), 1.0)],
//!     0.5,
//!     Vartype::Spin,
//! )?;
//!
//! let e = bqm.energy(&sample_from(vec![(1, 1), (2, 1)]))?;
//! assert_eq!(e, 3.5);
//!
//! bqm.change_vartype(Vartype::Binary)?;
//! let e = bqm.energy(&sample_from(vec![(1, 1), (2, 1)]))?;
//! assert_eq!(e, 3.5);
//! # Ok::<(), ruvector_qubo::QuboError>(())
//! ```

pub mod algebra;
pub mod config;
pub mod energy;
pub mod error;
pub mod polynomial;
pub mod quadratic;
pub mod sample;
pub mod serialization;
pub mod variable;
pub mod vartype;

// Re-export the most commonly used items at the crate root.
pub use config::ModelConfig;
pub use energy::EnergyModel;
pub use error::{QuboError, Result};
pub use polynomial::{BinaryPolynomialModel, PolynomialStore};
pub use quadratic::{
    BinaryQuadraticModel, DenseBqm, DenseStorage, DictBqm, DictStorage, IgnoredTerms,
    NormalizeOptions, QuadraticStorage, SparseBqm, SparseStorage,
};
pub use sample::{convert_sample, sample_from, Sample};
pub use serialization::{BpmRecord, BqmRecord};
pub use variable::{Label, Variable};
pub use vartype::Vartype;
