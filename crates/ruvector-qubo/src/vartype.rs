//! Variable encodings: spin `{-1, +1}` and binary `{0, 1}`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QuboError, Result};

/// Domain of every variable in a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Vartype {
    /// Ising encoding, values in `{-1, +1}`.
    Spin,
    /// QUBO encoding, values in `{0, 1}`.
    Binary,
}

impl Vartype {
    /// Canonical upper-case tag used in serialized records.
    pub fn as_str(self) -> &'static str {
        match self {
            Vartype::Spin => "SPIN",
            Vartype::Binary => "BINARY",
        }
    }

    /// The two admissible values, low first.
    pub fn values(self) -> [i32; 2] {
        match self {
            Vartype::Spin => [-1, 1],
            Vartype::Binary => [0, 1],
        }
    }

    /// The opposite encoding.
    pub fn other(self) -> Self {
        match self {
            Vartype::Spin => Vartype::Binary,
            Vartype::Binary => Vartype::Spin,
        }
    }

    /// True if `value` lies in this encoding's domain.
    #[inline]
    pub fn contains(self, value: i32) -> bool {
        self.values().contains(&value)
    }

    /// Reject values outside the domain.
    pub fn check(self, value: i32) -> Result<()> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(QuboError::InvalidValue {
                value,
                vartype: self.as_str().to_string(),
            })
        }
    }

    /// Map a value from this encoding into `target` via `s = 2x - 1`.
    ///
    /// The value is assumed to be valid for `self`.
    #[inline]
    pub fn convert_value(self, value: i32, target: Vartype) -> i32 {
        match (self, target) {
            (Vartype::Spin, Vartype::Binary) => (value + 1) / 2,
            (Vartype::Binary, Vartype::Spin) => 2 * value - 1,
            _ => value,
        }
    }
}

impl fmt::Display for Vartype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vartype {
    type Err = QuboError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SPIN" => Ok(Vartype::Spin),
            "BINARY" => Ok(Vartype::Binary),
            other => Err(QuboError::UnknownVartype(other.to_string())),
        }
    }
}
