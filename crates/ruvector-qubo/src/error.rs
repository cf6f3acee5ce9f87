//! Error types for model construction, conversion and evaluation
//!
//! Every error is a deterministic function of the caller's input. Nothing is
//! retried internally and no operation leaves a model partially mutated.

use std::fmt::Debug;

use thiserror::Error;

/// Result type alias for model operations
pub type Result<T> = std::result::Result<T, QuboError>;

/// Main error type for model operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuboError {
    // ═══════════════════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════════════════
    /// A key names the same variable more than once
    #[error("No self-loops allowed: {key} is not an allowed interaction")]
    SelfLoop {
        /// Debug rendering of the offending key
        key: String,
    },

    /// A label appears twice where labels must be unique
    #[error("Duplicate variable label: {0}")]
    DuplicateVariable(String),

    /// Parallel inputs disagree in length
    #[error("Length mismatch in {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Which input was inconsistent
        what: &'static str,
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Term arity exceeds the subset-enumeration ceiling
    #[error("Interaction too large: arity {arity} exceeds conversion limit {max}")]
    InteractionTooLarge {
        /// Arity of the offending term
        arity: usize,
        /// Configured ceiling
        max: usize,
    },

    /// Matrix input is not square
    #[error("Matrix must be square, got {rows}x{cols}")]
    NonSquareMatrix {
        /// Row count
        rows: usize,
        /// Column count
        cols: usize,
    },

    /// An integer index does not address a known variable
    #[error("Index {index} out of range for {len} variables")]
    IndexOutOfRange {
        /// Offending index
        index: usize,
        /// Number of addressable variables
        len: usize,
    },

    /// A variable value outside the vartype's domain
    #[error("Value {value} is not a valid {vartype} value")]
    InvalidValue {
        /// Offending value
        value: i32,
        /// Vartype whose domain was violated
        vartype: String,
    },

    /// Normalization range cannot produce a finite scale
    #[error("Invalid bias range: ({lower}, {upper})")]
    InvalidRange {
        /// Lower bound
        lower: f64,
        /// Upper bound
        upper: f64,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {name} = {value} (expected {constraint})")]
    InvalidConfig {
        /// Parameter name
        name: String,
        /// Actual value
        value: String,
        /// Expected constraint description
        constraint: String,
    },

    /// Vartype string is neither SPIN nor BINARY
    #[error("Unknown vartype: {0:?}")]
    UnknownVartype(String),

    // ═══════════════════════════════════════════════════════════════════════
    // Schema Errors
    // ═══════════════════════════════════════════════════════════════════════
    /// Record describes a different model kind
    #[error("Wrong model type: expected {expected}, found {found}")]
    WrongModelType {
        /// Expected type tag
        expected: String,
        /// Type tag found in the record
        found: String,
    },

    /// Record schema version is not supported
    #[error("Unsupported schema version: expected {expected}, found {found}")]
    UnsupportedVersion {
        /// Supported version
        expected: String,
        /// Version found in the record
        found: String,
    },

    /// Record is internally inconsistent
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// Encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ═══════════════════════════════════════════════════════════════════════
    // Precondition Errors
    // ═══════════════════════════════════════════════════════════════════════
    /// Sample lacks a value for a model variable
    #[error("Sample is missing variable {0}")]
    MissingSampleVariable(String),

    /// Positional sample has the wrong length
    #[error("Sample length mismatch: expected {expected}, got {actual}")]
    SampleLengthMismatch {
        /// Number of model variables
        expected: usize,
        /// Number of values supplied
        actual: usize,
    },

    /// Variable is not part of the model
    #[error("Variable {0} not found in model")]
    VariableNotFound(String),
}

impl QuboError {
    /// Build a [`QuboError::SelfLoop`] from any debuggable key
    pub fn self_loop<K: Debug + ?Sized>(key: &K) -> Self {
        QuboError::SelfLoop {
            key: format!("{:?}", key),
        }
    }

    /// Build a [`QuboError::MissingSampleVariable`] for a label
    pub fn missing_sample<V: Debug>(v: &V) -> Self {
        QuboError::MissingSampleVariable(format!("{:?}", v))
    }

    /// Build a [`QuboError::VariableNotFound`] for a label
    pub fn not_found<V: Debug>(v: &V) -> Self {
        QuboError::VariableNotFound(format!("{:?}", v))
    }

    /// Build a [`QuboError::InvalidConfig`]
    pub fn invalid_config(
        name: impl Into<String>,
        value: impl ToString,
        constraint: impl Into<String>,
    ) -> Self {
        QuboError::InvalidConfig {
            name: name.into(),
            value: value.to_string(),
            constraint: constraint.into(),
        }
    }

    /// Check if error rejects the shape or content of caller input
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            QuboError::SelfLoop { .. }
                | QuboError::DuplicateVariable(_)
                | QuboError::LengthMismatch { .. }
                | QuboError::InteractionTooLarge { .. }
                | QuboError::NonSquareMatrix { .. }
                | QuboError::IndexOutOfRange { .. }
                | QuboError::InvalidValue { .. }
                | QuboError::InvalidRange { .. }
                | QuboError::InvalidConfig { .. }
                | QuboError::UnknownVartype(_)
        )
    }

    /// Check if error comes from decoding a serialized record
    ///
    /// An unknown vartype string counts as both a validation and a schema
    /// error, since it can arrive from either path.
    pub fn is_schema(&self) -> bool {
        matches!(
            self,
            QuboError::WrongModelType { .. }
                | QuboError::UnsupportedVersion { .. }
                | QuboError::MalformedRecord(_)
                | QuboError::Serialization(_)
                | QuboError::UnknownVartype(_)
        )
    }

    /// Check if error is a violated precondition on an otherwise valid model
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            QuboError::MissingSampleVariable(_)
                | QuboError::SampleLengthMismatch { .. }
                | QuboError::VariableNotFound(_)
        )
    }
}

impl From<serde_json::Error> for QuboError {
    fn from(err: serde_json::Error) -> Self {
        QuboError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QuboError::self_loop(&[3, 3]);
        assert_eq!(
            err.to_string(),
            "No self-loops allowed: [3, 3] is not an allowed interaction"
        );

        let err = QuboError::InteractionTooLarge { arity: 40, max: 32 };
        assert!(err.to_string().contains("40"));
        assert!(err.to_string().contains("32"));
    }

    #[test]
    fn test_classification() {
        assert!(QuboError::self_loop(&["a", "a"]).is_validation());
        assert!(!QuboError::self_loop(&["a", "a"]).is_schema());

        assert!(QuboError::UnsupportedVersion {
            expected: "3.0.0".to_string(),
            found: "2.0.0".to_string()
        }
        .is_schema());

        assert!(QuboError::missing_sample(&7).is_precondition());
        assert!(!QuboError::missing_sample(&7).is_validation());

        let err = QuboError::UnknownVartype("QUBIT".to_string());
        assert!(err.is_validation() && err.is_schema());
    }

    #[test]
    fn test_from_serde_json() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: QuboError = parse.unwrap_err().into();
        assert!(matches!(err, QuboError::Serialization(_)));
        assert!(err.is_schema());
    }
}
