//! Versioned, self-describing records for both model kinds.
//!
//! Records are plain serde structs, so any serde format works; JSON
//! helpers are provided on the models. Decoding validates the whole record
//! before building the model, and builds it through the normal insertion
//! path so repeated keys accumulate exactly as they would on `add_*`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{QuboError, Result};
use crate::polynomial::model::BinaryPolynomialModel;
use crate::quadratic::model::BinaryQuadraticModel;
use crate::quadratic::storage::QuadraticStorage;
use crate::variable::{FxHashMap, FxHashSet, Label};
use crate::vartype::Vartype;

/// `type` tag of quadratic records.
pub const MODEL_TYPE_BQM: &str = "BinaryQuadraticModel";

/// `type` tag of polynomial records.
pub const MODEL_TYPE_BPM: &str = "BinaryPolynomialModel";

/// Schema version of polynomial records.
pub const BPM_SCHEMA: &str = "3.0.0";

/// The only bias encoding written.
pub const BIAS_TYPE: &str = "float64";

const MAX_UINT16_VARIABLES: usize = 1 << 16;

/// Narrowest index type able to address `num_variables` variables.
pub fn index_type_for(num_variables: usize) -> &'static str {
    if num_variables <= MAX_UINT16_VARIABLES {
        "uint16"
    } else {
        "uint32"
    }
}

/// Version block of a quadratic record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BqmVersion {
    /// Backend-specific schema tag
    pub bqm_schema: String,
}

/// Serialized form of a [`BinaryQuadraticModel`].
///
/// Couplers are parallel `quadratic_head` / `quadratic_tail` /
/// `quadratic_biases` arrays of positions into `variable_labels`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BqmRecord<V> {
    #[serde(rename = "type")]
    pub model_type: String,
    pub version: BqmVersion,
    pub use_bytes: bool,
    pub index_type: String,
    pub bias_type: String,
    pub num_variables: usize,
    pub num_interactions: usize,
    pub variable_labels: Vec<V>,
    pub variable_type: String,
    pub offset: f64,
    pub linear_biases: Vec<f64>,
    pub quadratic_head: Vec<usize>,
    pub quadratic_tail: Vec<usize>,
    pub quadratic_biases: Vec<f64>,
}

/// Version block of a polynomial record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpmVersion {
    /// Schema tag
    pub bpm_schema: String,
}

/// Serialized form of a [`BinaryPolynomialModel`].
///
/// The offset travels in `offset`; `poly_key_list` never holds the empty key
/// on output, but one found on input is accumulated into the offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BpmRecord<V> {
    #[serde(rename = "type")]
    pub model_type: String,
    pub version: BpmVersion,
    pub variable_type: String,
    pub offset: f64,
    pub poly_key_list: Vec<Vec<V>>,
    pub poly_value_list: Vec<f64>,
}

fn check_type(expected: &str, found: &str) -> Result<()> {
    if expected != found {
        return Err(QuboError::WrongModelType {
            expected: expected.to_string(),
            found: found.to_string(),
        });
    }
    Ok(())
}

fn check_version(expected: &str, found: &str) -> Result<()> {
    if expected != found {
        return Err(QuboError::UnsupportedVersion {
            expected: expected.to_string(),
            found: found.to_string(),
        });
    }
    Ok(())
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(QuboError::LengthMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Quadratic models
// ---------------------------------------------------------------------------

impl<V: Label> BqmRecord<V> {
    /// Validate everything except labels' contents; returns the vartype.
    fn validate<S: QuadraticStorage<V>>(&self) -> Result<Vartype> {
        check_type(MODEL_TYPE_BQM, &self.model_type)?;
        check_version(S::SCHEMA_VERSION, &self.version.bqm_schema)?;
        let vartype: Vartype = self.variable_type.parse()?;

        if self.use_bytes {
            return Err(QuboError::MalformedRecord(
                "byte-encoded payloads are not supported".to_string(),
            ));
        }
        if !matches!(self.bias_type.as_str(), "float32" | "float64") {
            return Err(QuboError::MalformedRecord(format!(
                "unsupported bias_type {:?}",
                self.bias_type
            )));
        }
        if !matches!(self.index_type.as_str(), "uint16" | "uint32") {
            return Err(QuboError::MalformedRecord(format!(
                "unsupported index_type {:?}",
                self.index_type
            )));
        }

        let n = self.variable_labels.len();
        check_len("num_variables", self.num_variables, n)?;
        check_len("linear_biases", n, self.linear_biases.len())?;
        let m = self.quadratic_biases.len();
        check_len("num_interactions", self.num_interactions, m)?;
        check_len("quadratic_head", m, self.quadratic_head.len())?;
        check_len("quadratic_tail", m, self.quadratic_tail.len())?;

        let mut seen = FxHashSet::default();
        if let Some(dup) = self.variable_labels.iter().find(|v| !seen.insert(*v)) {
            return Err(QuboError::DuplicateVariable(format!("{:?}", dup)));
        }
        for (&head, &tail) in self.quadratic_head.iter().zip(&self.quadratic_tail) {
            if let Some(&index) = [head, tail].iter().find(|&&i| i >= n) {
                return Err(QuboError::IndexOutOfRange { index, len: n });
            }
            if head == tail {
                return Err(QuboError::self_loop(&(
                    &self.variable_labels[head],
                    &self.variable_labels[tail],
                )));
            }
        }
        Ok(vartype)
    }
}

impl<V: Label, S: QuadraticStorage<V>> BinaryQuadraticModel<V, S> {
    /// Encode into a record with labels in ascending order.
    pub fn to_serializable(&self) -> BqmRecord<V> {
        let labels = self.variables();
        let linear_biases = labels
            .iter()
            .map(|v| self.linear(v).unwrap_or(0.0))
            .collect();

        let couplers = {
            let position: FxHashMap<&V, usize> =
                labels.iter().enumerate().map(|(i, v)| (v, i)).collect();
            let mut couplers: Vec<(usize, usize, f64)> = self
                .storage()
                .iter_quadratic()
                .map(|(u, v, bias)| {
                    let (i, j) = (position[u], position[v]);
                    (i.min(j), i.max(j), bias)
                })
                .collect();
            couplers.sort_by_key(|&(i, j, _)| (i, j));
            couplers
        };

        BqmRecord {
            model_type: MODEL_TYPE_BQM.to_string(),
            version: BqmVersion {
                bqm_schema: S::SCHEMA_VERSION.to_string(),
            },
            use_bytes: false,
            index_type: index_type_for(labels.len()).to_string(),
            bias_type: BIAS_TYPE.to_string(),
            num_variables: labels.len(),
            num_interactions: couplers.len(),
            variable_type: self.vartype().to_string(),
            offset: self.offset(),
            linear_biases,
            quadratic_head: couplers.iter().map(|c| c.0).collect(),
            quadratic_tail: couplers.iter().map(|c| c.1).collect(),
            quadratic_biases: couplers.iter().map(|c| c.2).collect(),
            variable_labels: labels,
        }
    }

    /// Rebuild a model from a record written for this backend.
    ///
    /// Fails with a schema or validation error, without building anything,
    /// if the record is of the wrong kind or internally inconsistent.
    pub fn from_serializable(record: &BqmRecord<V>) -> Result<Self> {
        let vartype = record.validate::<S>()?;
        debug!(
            model_type = %record.model_type,
            schema = %record.version.bqm_schema,
            variables = record.num_variables,
            interactions = record.num_interactions,
            "decoding quadratic model record"
        );

        let labels = &record.variable_labels;
        let linear = labels
            .iter()
            .cloned()
            .zip(record.linear_biases.iter().copied());
        let quadratic = record
            .quadratic_head
            .iter()
            .zip(&record.quadratic_tail)
            .zip(&record.quadratic_biases)
            .map(|((&i, &j), &bias)| ((labels[i].clone(), labels[j].clone()), bias));
        Self::new(linear, quadratic, record.offset, vartype)
    }

    /// Encode as a JSON record.
    pub fn to_json(&self) -> Result<String>
    where
        V: Serialize,
    {
        Ok(serde_json::to_string(&self.to_serializable())?)
    }

    /// Decode from a JSON record.
    pub fn from_json(json: &str) -> Result<Self>
    where
        V: DeserializeOwned,
    {
        let record: BqmRecord<V> = serde_json::from_str(json)?;
        Self::from_serializable(&record)
    }
}

// ---------------------------------------------------------------------------
// Polynomial models
// ---------------------------------------------------------------------------

impl<V: Label> BinaryPolynomialModel<V> {
    /// Encode into a record; keys are listed by degree, then lexicographically.
    pub fn to_serializable(&self) -> BpmRecord<V> {
        let mut terms: Vec<(&[V], f64)> = self
            .store()
            .iter()
            .filter(|(key, _)| !key.is_empty())
            .collect();
        terms.sort_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| a.0.cmp(b.0)));

        BpmRecord {
            model_type: MODEL_TYPE_BPM.to_string(),
            version: BpmVersion {
                bpm_schema: BPM_SCHEMA.to_string(),
            },
            variable_type: self.vartype().to_string(),
            offset: self.offset(),
            poly_key_list: terms.iter().map(|(key, _)| key.to_vec()).collect(),
            poly_value_list: terms.iter().map(|(_, bias)| *bias).collect(),
        }
    }

    /// Rebuild a model from a record.
    pub fn from_serializable(record: &BpmRecord<V>) -> Result<Self> {
        check_type(MODEL_TYPE_BPM, &record.model_type)?;
        check_version(BPM_SCHEMA, &record.version.bpm_schema)?;
        let vartype: Vartype = record.variable_type.parse()?;
        debug!(
            model_type = %record.model_type,
            terms = record.poly_key_list.len(),
            "decoding polynomial model record"
        );

        let mut model =
            Self::from_keys_values(&record.poly_key_list, &record.poly_value_list, vartype)?;
        model.add_offset(record.offset);
        Ok(model)
    }

    /// Encode as a JSON record.
    pub fn to_json(&self) -> Result<String>
    where
        V: Serialize,
    {
        Ok(serde_json::to_string(&self.to_serializable())?)
    }

    /// Decode from a JSON record.
    pub fn from_json(json: &str) -> Result<Self>
    where
        V: DeserializeOwned,
    {
        let record: BpmRecord<V> = serde_json::from_str(json)?;
        Self::from_serializable(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quadratic::model::{DenseBqm, DictBqm, SparseBqm};
    use crate::variable::Variable;

    type DictStorage = crate::quadratic::DictStorage<String>;
    type DenseStorage = crate::quadratic::DenseStorage<String>;

    fn bqm<S: QuadraticStorage<String>>() -> BinaryQuadraticModel<String, S> {
        let s = |v: &str| v.to_string();
        BinaryQuadraticModel::new(
            vec![(s("a"), 1.0), (s("b"), -0.5), (s("e"), 0.0)],
            vec![((s("b"), s("a")), 2.0), ((s("a"), s("c")), -3.0)],
            0.25,
            Vartype::Binary,
        )
        .unwrap()
    }

    #[test]
    fn test_bqm_record_layout() {
        let record = bqm::<DictStorage>().to_serializable();
        assert_eq!(record.model_type, "BinaryQuadraticModel");
        assert_eq!(record.version.bqm_schema, "3.0.0");
        assert_eq!(record.index_type, "uint16");
        assert_eq!(record.bias_type, "float64");
        assert!(!record.use_bytes);
        assert_eq!(record.variable_labels, vec!["a", "b", "c", "e"]);
        assert_eq!(record.linear_biases, vec![1.0, -0.5, 0.0, 0.0]);
        assert_eq!(record.quadratic_head, vec![0, 0]);
        assert_eq!(record.quadratic_tail, vec![1, 2]);
        assert_eq!(record.quadratic_biases, vec![2.0, -3.0]);
        assert_eq!(record.variable_type, "BINARY");
        assert_eq!(record.offset, 0.25);

        let dense = bqm::<DenseStorage>().to_serializable();
        assert_eq!(dense.version.bqm_schema, "3.0.0-dense");
    }

    #[test]
    fn test_bqm_json_round_trip_per_backend() {
        let dict: DictBqm<String> = bqm();
        let json = dict.to_json().unwrap();
        assert_eq!(DictBqm::<String>::from_json(&json).unwrap(), dict);

        let sparse: SparseBqm<String> = bqm();
        let json = sparse.to_json().unwrap();
        assert_eq!(SparseBqm::<String>::from_json(&json).unwrap(), sparse);

        let dense: DenseBqm<String> = bqm();
        let json = dense.to_json().unwrap();
        assert_eq!(DenseBqm::<String>::from_json(&json).unwrap(), dense);
    }

    #[test]
    fn test_backend_schema_mismatch() {
        let record = bqm::<DenseStorage>().to_serializable();
        let err = SparseBqm::<String>::from_serializable(&record).unwrap_err();
        assert!(matches!(err, QuboError::UnsupportedVersion { .. }));
        assert!(err.is_schema());
    }

    #[test]
    fn test_bqm_decode_rejects_bad_records() {
        let good = bqm::<DictStorage>().to_serializable();

        let mut record = good.clone();
        record.model_type = MODEL_TYPE_BPM.to_string();
        assert!(matches!(
            DictBqm::from_serializable(&record),
            Err(QuboError::WrongModelType { .. })
        ));

        let mut record = good.clone();
        record.variable_type = "ISING".to_string();
        assert!(matches!(
            DictBqm::from_serializable(&record),
            Err(QuboError::UnknownVartype(_))
        ));

        let mut record = good.clone();
        record.quadratic_tail[1] = 9;
        assert!(matches!(
            DictBqm::from_serializable(&record),
            Err(QuboError::IndexOutOfRange { index: 9, len: 4 })
        ));

        let mut record = good.clone();
        record.quadratic_tail[0] = 0;
        assert!(matches!(
            DictBqm::from_serializable(&record),
            Err(QuboError::SelfLoop { .. })
        ));

        let mut record = good;
        record.linear_biases.pop();
        assert!(DictBqm::from_serializable(&record)
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_bqm_duplicate_couplers_accumulate() {
        let mut record = bqm::<DictStorage>().to_serializable();
        record.quadratic_head.push(1);
        record.quadratic_tail.push(0);
        record.quadratic_biases.push(0.5);
        record.num_interactions += 1;
        let model = DictBqm::from_serializable(&record).unwrap();
        assert_eq!(model.quadratic(&"a".to_string(), &"b".to_string()), Some(2.5));
        assert_eq!(model.num_interactions(), 2);
    }

    #[test]
    fn test_index_type_threshold() {
        assert_eq!(index_type_for(0), "uint16");
        assert_eq!(index_type_for(65536), "uint16");
        assert_eq!(index_type_for(65537), "uint32");
    }

    #[test]
    fn test_bpm_record_round_trip() {
        let model = BinaryPolynomialModel::from_hising(vec![
            (vec![Variable::from("x"), Variable::from(1)], 1.5),
            (vec![Variable::from(1)], -2.0),
            (vec![Variable::from((0, "q")), Variable::from(1), Variable::from("x")], 0.5),
            (vec![], 3.0),
        ]);
        let record = model.to_serializable();
        assert_eq!(record.version.bpm_schema, "3.0.0");
        assert_eq!(record.variable_type, "SPIN");
        assert_eq!(record.offset, 3.0);
        assert_eq!(record.poly_key_list.len(), 3);
        assert!(record.poly_key_list.iter().all(|k| !k.is_empty()));
        assert_eq!(record.poly_key_list[0], vec![Variable::from(1)]);

        let json = model.to_json().unwrap();
        assert_eq!(BinaryPolynomialModel::<Variable>::from_json(&json).unwrap(), model);
    }

    #[test]
    fn test_bpm_decode_formats_keys() {
        let record = BpmRecord {
            model_type: MODEL_TYPE_BPM.to_string(),
            version: BpmVersion {
                bpm_schema: BPM_SCHEMA.to_string(),
            },
            variable_type: "BINARY".to_string(),
            offset: 1.0,
            poly_key_list: vec![vec![2, 1, 2], vec![1, 2], vec![]],
            poly_value_list: vec![1.0, 2.0, 0.5],
        };
        let model = BinaryPolynomialModel::from_serializable(&record).unwrap();
        assert_eq!(model.bias(&[1, 2]), 3.0);
        assert_eq!(model.offset(), 1.5);

        let mut bad = record.clone();
        bad.poly_value_list.pop();
        assert!(matches!(
            BinaryPolynomialModel::from_serializable(&bad),
            Err(QuboError::LengthMismatch { .. })
        ));

        let mut bad = record;
        bad.version.bpm_schema = "2.0.0".to_string();
        assert!(BinaryPolynomialModel::<i64>::from_serializable(&bad)
            .unwrap_err()
            .is_schema());
    }

    #[test]
    fn test_malformed_json_is_schema_error() {
        let err = DictBqm::<i64>::from_json("{\"type\": 3}").unwrap_err();
        assert!(matches!(err, QuboError::Serialization(_)));
        assert!(err.is_schema());
    }
}
