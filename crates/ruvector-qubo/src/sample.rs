//! Samples: one value per variable, in either encoding.

use crate::error::{QuboError, Result};
use crate::variable::{FxHashMap, Label};
use crate::vartype::Vartype;

/// Assignment of a value to each variable.
///
/// Values are `{-1, +1}` for spin models and `{0, 1}` for binary models.
/// Energy evaluation does not check the domain; it multiplies whatever it is
/// given.
pub type Sample<V> = FxHashMap<V, i32>;

/// Build a sample from `(label, value)` pairs.
pub fn sample_from<V, I>(pairs: I) -> Sample<V>
where
    V: Label,
    I: IntoIterator<Item = (V, i32)>,
{
    pairs.into_iter().collect()
}

/// Build a sample pairing `labels` with positional `values`.
pub fn sample_from_slices<V: Label>(labels: &[V], values: &[i32]) -> Result<Sample<V>> {
    if labels.len() != values.len() {
        return Err(QuboError::SampleLengthMismatch {
            expected: labels.len(),
            actual: values.len(),
        });
    }
    Ok(labels.iter().cloned().zip(values.iter().copied()).collect())
}

/// Value assigned to `v`, as a float ready for multiplication.
#[inline]
pub fn value_of<V: Label>(sample: &Sample<V>, v: &V) -> Result<f64> {
    sample
        .get(v)
        .map(|&x| f64::from(x))
        .ok_or_else(|| QuboError::missing_sample(v))
}

/// Fail on the first variable of `variables` missing from `sample`.
pub fn require_variables<'a, V, I>(sample: &Sample<V>, variables: I) -> Result<()>
where
    V: Label + 'a,
    I: IntoIterator<Item = &'a V>,
{
    for v in variables {
        if !sample.contains_key(v) {
            return Err(QuboError::missing_sample(v));
        }
    }
    Ok(())
}

/// Re-encode every value of a sample from `from` into `to`.
pub fn convert_sample<V: Label>(sample: &Sample<V>, from: Vartype, to: Vartype) -> Sample<V> {
    sample
        .iter()
        .map(|(v, &x)| (v.clone(), from.convert_value(x, to)))
        .collect()
}
