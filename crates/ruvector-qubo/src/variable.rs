//! Variable labels and the hash maps keyed by them.
//!
//! Models are generic over any [`Label`]. For heterogeneous labels (mixing
//! integers, names and tuples in one model) use [`Variable`].
//!
//! All maps use Fx hashing, so hashing of labels and of term keys
//! (`Vec<V>`) is deterministic across runs and platforms.

use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

pub use rustc_hash::{FxHashMap, FxHashSet};

/// Bound satisfied by every type usable as a variable label.
///
/// Labels are totally ordered (terms are stored as sorted label tuples) and
/// hashable (stores index terms by value).
pub trait Label: Clone + Eq + Ord + Hash + fmt::Debug + Send + Sync {}

impl<T> Label for T where T: Clone + Eq + Ord + Hash + fmt::Debug + Send + Sync {}

/// Heterogeneous variable identifier.
///
/// Ordering compares the variant first (integers before strings before
/// tuples), then the payload.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Variable {
    /// Integer label
    Int(i64),
    /// String label
    Str(String),
    /// Fixed-size tuple of labels
    Tuple(Vec<Variable>),
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Int(i) => write!(f, "{}", i),
            Variable::Str(s) => f.write_str(s),
            Variable::Tuple(items) => {
                f.write_str("(")?;
                for (k, item) in items.iter().enumerate() {
                    if k > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<i64> for Variable {
    fn from(i: i64) -> Self {
        Variable::Int(i)
    }
}

impl From<i32> for Variable {
    fn from(i: i32) -> Self {
        Variable::Int(i64::from(i))
    }
}

impl From<&str> for Variable {
    fn from(s: &str) -> Self {
        Variable::Str(s.to_string())
    }
}

impl From<String> for Variable {
    fn from(s: String) -> Self {
        Variable::Str(s)
    }
}

impl From<Vec<Variable>> for Variable {
    fn from(items: Vec<Variable>) -> Self {
        Variable::Tuple(items)
    }
}

impl<A: Into<Variable>, B: Into<Variable>> From<(A, B)> for Variable {
    fn from((a, b): (A, B)) -> Self {
        Variable::Tuple(vec![a.into(), b.into()])
    }
}

impl<A: Into<Variable>, B: Into<Variable>, C: Into<Variable>> From<(A, B, C)> for Variable {
    fn from((a, b, c): (A, B, C)) -> Self {
        Variable::Tuple(vec![a.into(), b.into(), c.into()])
    }
}
