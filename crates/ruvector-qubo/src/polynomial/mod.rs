//! Degree-general models (HUBO / higher-order Ising).

pub mod model;
pub mod store;

pub use model::BinaryPolynomialModel;
pub use store::PolynomialStore;
