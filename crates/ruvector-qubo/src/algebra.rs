//! Energy-preserving change of basis between spin and binary encodings.
//!
//! Every identity here follows from substituting `s = 2x - 1` (or
//! `x = (s + 1) / 2`) into a multilinear polynomial and collecting terms.
//!
//! ## Pairwise form
//!
//! | term | spin → binary | binary → spin |
//! |------|---------------|---------------|
//! | `h·v` | `2h` on `v`, `-h` on offset | `h/2` on `v`, `h/2` on offset |
//! | `J·uv` | `4J` on `uv`, `-2J` on `u` and `v`, `J` on offset | `J/4` on each of `uv`, `u`, `v`, offset |
//!
//! ## Degree-general form
//!
//! A term of arity `k` with bias `b` contributes to every subset `S` of its
//! variables:
//!
//! - binary → spin: `b / 2^k`
//! - spin → binary: `b · 2^|S| · (-1)^(k - |S|)`
//!
//! Subsets are enumerated with a `u64` mask, so `k` is checked against a
//! configurable limit no larger than [`ARITY_CEILING`].

use crate::config::ARITY_CEILING;
use crate::error::{QuboError, Result};
use crate::variable::{FxHashMap, Label};
use crate::vartype::Vartype;

/// Linear, quadratic and constant parts of a degree-2 model.
///
/// Quadratic keys are unordered pairs; callers store each pair once.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadraticParts<V: Label> {
    /// Bias per variable
    pub linear: FxHashMap<V, f64>,
    /// Bias per coupled pair
    pub quadratic: FxHashMap<(V, V), f64>,
    /// Constant term
    pub offset: f64,
}

impl<V: Label> Default for QuadraticParts<V> {
    fn default() -> Self {
        Self {
            linear: FxHashMap::default(),
            quadratic: FxHashMap::default(),
            offset: 0.0,
        }
    }
}

/// Fail if a term of `arity` cannot be enumerated under `max_arity`.
pub fn check_arity(arity: usize, max_arity: usize) -> Result<()> {
    let max = max_arity.min(ARITY_CEILING);
    if arity > max {
        return Err(QuboError::InteractionTooLarge { arity, max });
    }
    Ok(())
}

/// Closed-form spin → binary conversion.
pub fn spin_to_binary<V: Label>(parts: &QuadraticParts<V>) -> QuadraticParts<V> {
    let mut linear: FxHashMap<V, f64> = parts.linear.keys().map(|v| (v.clone(), 0.0)).collect();
    let mut quadratic = FxHashMap::default();
    quadratic.reserve(parts.quadratic.len());
    let mut offset = parts.offset;

    for (v, &h) in &parts.linear {
        *linear.entry(v.clone()).or_insert(0.0) += 2.0 * h;
        offset -= h;
    }

    for ((u, v), &j) in &parts.quadratic {
        *quadratic.entry((u.clone(), v.clone())).or_insert(0.0) += 4.0 * j;
        *linear.entry(u.clone()).or_insert(0.0) -= 2.0 * j;
        *linear.entry(v.clone()).or_insert(0.0) -= 2.0 * j;
        offset += j;
    }

    QuadraticParts {
        linear,
        quadratic,
        offset,
    }
}

/// Closed-form binary → spin conversion.
pub fn binary_to_spin<V: Label>(parts: &QuadraticParts<V>) -> QuadraticParts<V> {
    let mut linear: FxHashMap<V, f64> = parts.linear.keys().map(|v| (v.clone(), 0.0)).collect();
    let mut quadratic = FxHashMap::default();
    quadratic.reserve(parts.quadratic.len());
    let mut offset = parts.offset;

    for (v, &h) in &parts.linear {
        *linear.entry(v.clone()).or_insert(0.0) += 0.5 * h;
        offset += 0.5 * h;
    }

    for ((u, v), &j) in &parts.quadratic {
        let quarter = 0.25 * j;
        *quadratic.entry((u.clone(), v.clone())).or_insert(0.0) += quarter;
        *linear.entry(u.clone()).or_insert(0.0) += quarter;
        *linear.entry(v.clone()).or_insert(0.0) += quarter;
        offset += quarter;
    }

    QuadraticParts {
        linear,
        quadratic,
        offset,
    }
}

/// Convert degree-2 parts from `from` to `to`; identical encodings clone.
pub fn convert_quadratic<V: Label>(
    parts: &QuadraticParts<V>,
    from: Vartype,
    to: Vartype,
) -> QuadraticParts<V> {
    match (from, to) {
        (Vartype::Spin, Vartype::Binary) => spin_to_binary(parts),
        (Vartype::Binary, Vartype::Spin) => binary_to_spin(parts),
        _ => parts.clone(),
    }
}

/// Expand one term into its contributions under the target encoding.
///
/// `key` must be sorted and duplicate-free; every emitted subset is then
/// sorted as well. Contributions for a given subset are emitted once per
/// call, and callers accumulate them across terms.
pub fn convert_term<V, F>(
    key: &[V],
    bias: f64,
    from: Vartype,
    to: Vartype,
    max_arity: usize,
    mut emit: F,
) -> Result<()>
where
    V: Label,
    F: FnMut(Vec<V>, f64),
{
    if from == to {
        emit(key.to_vec(), bias);
        return Ok(());
    }

    let k = key.len();
    check_arity(k, max_arity)?;

    let uniform = bias / 2f64.powi(k as i32);
    for mask in 0..(1u64 << k) {
        let subset: Vec<V> = key
            .iter()
            .enumerate()
            .filter(|(i, _)| (mask >> i) & 1 == 1)
            .map(|(_, v)| v.clone())
            .collect();

        let contribution = match from {
            Vartype::Binary => uniform,
            Vartype::Spin => {
                let size = mask.count_ones() as i32;
                let sign = if (k as i32 - size) % 2 == 0 { 1.0 } else { -1.0 };
                bias * 2f64.powi(size) * sign
            }
        };
        emit(subset, contribution);
    }
    Ok(())
}

/// Convert a whole polynomial, summing contributions that land on the same key.
///
/// Every term's arity is checked before any contribution is computed. Keys
/// whose contributions cancel to exactly zero are dropped.
pub fn convert_polynomial<'a, V, I>(
    terms: I,
    from: Vartype,
    to: Vartype,
    max_arity: usize,
) -> Result<FxHashMap<Vec<V>, f64>>
where
    V: Label + 'a,
    I: IntoIterator<Item = (&'a [V], f64)>,
{
    let terms: Vec<(&[V], f64)> = terms.into_iter().collect();
    if from != to {
        for (key, _) in &terms {
            check_arity(key.len(), max_arity)?;
        }
    }

    let mut out: FxHashMap<Vec<V>, f64> = FxHashMap::default();
    for (key, bias) in terms {
        convert_term(key, bias, from, to, max_arity, |subset, b| {
            *out.entry(subset).or_insert(0.0) += b;
        })?;
    }
    out.retain(|_, b| *b != 0.0);
    Ok(out)
}

/// Reject a normalization range that is non-finite, empty or inverted.
pub fn check_range(range: (f64, f64)) -> Result<()> {
    let (lower, upper) = range;
    if !lower.is_finite() || !upper.is_finite() || lower >= upper {
        return Err(QuboError::InvalidRange { lower, upper });
    }
    Ok(())
}

/// Divisor that maps observed `(min, max)` biases into `range`.
///
/// Each extreme is divided by its bound and the larger quotient wins, so
/// neither bound is overshot. A zero bound imposes no constraint. A
/// non-positive result means no positive factor fits the biases into
/// `range`; callers leave the model untouched in that case.
pub fn inverse_scale(extremes: (f64, f64), range: (f64, f64)) -> f64 {
    let candidates = [(extremes.0, range.0), (extremes.1, range.1)];
    candidates
        .iter()
        .filter(|(_, bound)| *bound != 0.0)
        .map(|(extreme, bound)| extreme / bound)
        .fold(f64::NEG_INFINITY, f64::max)
}
