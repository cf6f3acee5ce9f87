//! `BinaryPolynomialModel`: HUBO / higher-order Ising models of any degree.

use tracing::debug;

use crate::algebra::{convert_polynomial, convert_term};
use crate::config::ModelConfig;
use crate::energy::{term_product, EnergyModel};
use crate::error::{QuboError, Result};
use crate::polynomial::store::PolynomialStore;
use crate::sample::{require_variables, sample_from_slices, Sample};
use crate::variable::{FxHashMap, FxHashSet, Label};
use crate::vartype::Vartype;

/// Energy function `offset + Σ b_K · Π_{v∈K} v` over spin or binary variables.
///
/// Keys passed in are normalized before use: they are sorted, and repeated
/// variables collapse according to the vartype (`s·s = 1` for spins, so
/// pairs cancel; `x·x = x` for binaries, so repeats merge). The offset is
/// the bias of the empty key.
#[derive(Debug, Clone)]
pub struct BinaryPolynomialModel<V: Label> {
    store: PolynomialStore<V>,
    vartype: Vartype,
    config: ModelConfig,
}

impl<V: Label> BinaryPolynomialModel<V> {
    /// Create a model with no terms.
    pub fn empty(vartype: Vartype) -> Self {
        Self {
            store: PolynomialStore::new(),
            vartype,
            config: ModelConfig::default(),
        }
    }

    /// Build a model from `(key, bias)` pairs, accumulating repeated keys.
    pub fn from_polynomial<I, K>(polynomial: I, vartype: Vartype) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<[V]>,
    {
        let mut model = Self::empty(vartype);
        model.add_interactions_from(polynomial);
        model
    }

    /// Build a model from parallel key and bias lists.
    pub fn from_keys_values(keys: &[Vec<V>], values: &[f64], vartype: Vartype) -> Result<Self> {
        if keys.len() != values.len() {
            return Err(QuboError::LengthMismatch {
                what: "keys and values",
                expected: keys.len(),
                actual: values.len(),
            });
        }
        Ok(Self::from_polynomial(
            keys.iter().zip(values.iter().copied()),
            vartype,
        ))
    }

    /// Build a model whose keys index into `variables`.
    pub fn from_indexed(
        variables: &[V],
        keys: &[Vec<usize>],
        values: &[f64],
        vartype: Vartype,
    ) -> Result<Self> {
        if keys.len() != values.len() {
            return Err(QuboError::LengthMismatch {
                what: "keys and values",
                expected: keys.len(),
                actual: values.len(),
            });
        }

        let labelled = keys
            .iter()
            .map(|key| {
                key.iter()
                    .map(|&i| {
                        variables.get(i).cloned().ok_or(QuboError::IndexOutOfRange {
                            index: i,
                            len: variables.len(),
                        })
                    })
                    .collect::<Result<Vec<V>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::from_polynomial(
            labelled.into_iter().zip(values.iter().copied()),
            vartype,
        ))
    }

    /// Build a binary-valued model.
    pub fn from_hubo<I, K>(polynomial: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<[V]>,
    {
        Self::from_polynomial(polynomial, Vartype::Binary)
    }

    /// Build a spin-valued model.
    pub fn from_hising<I, K>(polynomial: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<[V]>,
    {
        Self::from_polynomial(polynomial, Vartype::Spin)
    }

    /// Replace the configuration after validating it.
    pub fn with_config(mut self, config: ModelConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Sort `key` and collapse repeated variables under `vartype`.
    pub fn format_key(key: &[V], vartype: Vartype) -> Vec<V> {
        let mut sorted = key.to_vec();
        sorted.sort();
        match vartype {
            Vartype::Binary => {
                sorted.dedup();
                sorted
            }
            Vartype::Spin => {
                let mut out = Vec::with_capacity(sorted.len());
                let mut i = 0;
                while i < sorted.len() {
                    let mut j = i + 1;
                    while j < sorted.len() && sorted[j] == sorted[i] {
                        j += 1;
                    }
                    if (j - i) % 2 == 1 {
                        out.push(sorted[i].clone());
                    }
                    i = j;
                }
                out
            }
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Variable encoding.
    pub fn vartype(&self) -> Vartype {
        self.vartype
    }

    /// Underlying term store.
    pub fn store(&self) -> &PolynomialStore<V> {
        &self.store
    }

    /// Constant term.
    pub fn offset(&self) -> f64 {
        self.store.offset()
    }

    /// Bias of `key` after normalization, `0.0` if absent.
    pub fn bias(&self, key: &[V]) -> f64 {
        self.store
            .get_sorted(&Self::format_key(key, self.vartype))
    }

    /// All terms, offset included under the empty key.
    pub fn polynomial(&self) -> FxHashMap<Vec<V>, f64> {
        self.store.iter().map(|(k, b)| (k.to_vec(), b)).collect()
    }

    /// Stored keys in slot order.
    pub fn key_list(&self) -> &[Vec<V>] {
        self.store.keys()
    }

    /// Stored biases, parallel to [`key_list`](Self::key_list).
    pub fn value_list(&self) -> &[f64] {
        self.store.values()
    }

    /// Variables in ascending order.
    pub fn variables(&self) -> Vec<V> {
        self.store.variables()
    }

    /// Position of each variable in ascending order.
    pub fn variables_to_integers(&self) -> FxHashMap<V, usize> {
        self.store
            .variables()
            .into_iter()
            .enumerate()
            .map(|(i, v)| (v, i))
            .collect()
    }

    /// Longest key ever inserted.
    pub fn degree(&self) -> usize {
        self.store.degree()
    }

    /// Number of stored terms, offset included.
    pub fn num_interactions(&self) -> usize {
        self.store.len()
    }

    /// Number of variables in at least one term.
    pub fn num_variables(&self) -> usize {
        self.store.num_variables()
    }

    /// True if `v` appears in some term.
    pub fn has_variable(&self, v: &V) -> bool {
        self.store.has_variable(v)
    }

    /// True if the model has no terms.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Remove every term, including the offset.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Add `bias` to `key`.
    pub fn add_interaction(&mut self, key: &[V], bias: f64) {
        self.store
            .add_sorted(Self::format_key(key, self.vartype), bias);
    }

    /// Add a bias expressed in `vartype`, converting it to the model's encoding.
    pub fn add_interaction_as(&mut self, key: &[V], bias: f64, vartype: Vartype) -> Result<()> {
        let key = Self::format_key(key, vartype);
        let mut contributions = Vec::new();
        convert_term(
            &key,
            bias,
            vartype,
            self.vartype,
            self.config.max_conversion_arity,
            |k, b| contributions.push((k, b)),
        )?;
        for (k, b) in contributions {
            self.store.add_sorted(k, b);
        }
        Ok(())
    }

    /// Add many `(key, bias)` pairs.
    pub fn add_interactions_from<I, K>(&mut self, polynomial: I)
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<[V]>,
    {
        for (key, bias) in polynomial {
            self.add_interaction(key.as_ref(), bias);
        }
    }

    /// Add many pairs expressed in `vartype`; nothing is added if any key is too large.
    pub fn add_interactions_from_as<I, K>(&mut self, polynomial: I, vartype: Vartype) -> Result<()>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<[V]>,
    {
        let formatted: Vec<(Vec<V>, f64)> = polynomial
            .into_iter()
            .map(|(k, b)| (Self::format_key(k.as_ref(), vartype), b))
            .collect();
        let converted = convert_polynomial(
            formatted.iter().map(|(k, b)| (k.as_slice(), *b)),
            vartype,
            self.vartype,
            self.config.max_conversion_arity,
        )?;
        for (k, b) in converted {
            self.store.add_sorted(k, b);
        }
        Ok(())
    }

    /// Add to the constant term.
    pub fn add_offset(&mut self, offset: f64) {
        self.store.add_sorted(Vec::new(), offset);
    }

    /// Set the constant term to zero.
    pub fn remove_offset(&mut self) {
        self.store.remove_sorted(&[]);
    }

    /// Remove `key`; absent keys are a no-op returning false.
    pub fn remove_interaction(&mut self, key: &[V]) -> bool {
        self.store
            .remove_sorted(&Self::format_key(key, self.vartype))
    }

    /// Remove several keys; returns how many were present.
    pub fn remove_interactions_from<K: AsRef<[V]>>(&mut self, keys: &[K]) -> usize {
        keys.iter()
            .filter(|k| self.remove_interaction(k.as_ref()))
            .count()
    }

    /// Remove every term containing `v`.
    pub fn remove_variable(&mut self, v: &V) -> usize {
        self.store.remove_variable(v)
    }

    /// Remove every term containing any of `variables`.
    pub fn remove_variables_from(&mut self, variables: &[V]) -> usize {
        variables.iter().map(|v| self.store.remove_variable(v)).sum()
    }

    fn ignored_keys(&self, ignored: &[Vec<V>]) -> FxHashSet<Vec<V>> {
        ignored
            .iter()
            .map(|k| Self::format_key(k, self.vartype))
            .collect()
    }

    /// Multiply biases by `factor`, skipping `ignored` keys and optionally the offset.
    pub fn scale(&mut self, factor: f64, ignored: &[Vec<V>], ignore_offset: bool) {
        let ignored = self.ignored_keys(ignored);
        self.store.scale_sorted(factor, &ignored, ignore_offset);
    }

    /// Rescale so the non-ignored biases fit `range`; returns the divisor applied.
    pub fn normalize(
        &mut self,
        range: (f64, f64),
        ignored: &[Vec<V>],
        ignore_offset: bool,
    ) -> Result<Option<f64>> {
        let ignored = self.ignored_keys(ignored);
        self.store.normalize_sorted(range, &ignored, ignore_offset)
    }

    fn terms_containing(&self, v: &V) -> Vec<(Vec<V>, f64)> {
        self.store
            .iter()
            .filter(|(k, _)| k.binary_search(v).is_ok())
            .map(|(k, b)| (k.to_vec(), b))
            .collect()
    }

    /// Substitute `value` for `v` and fold every term containing it into the remainder.
    pub fn fix_variable(&mut self, v: &V, value: i32) -> Result<()> {
        self.vartype.check(value)?;
        if !self.store.has_variable(v) {
            return Err(QuboError::not_found(v));
        }

        let fixed = f64::from(value);
        for (key, bias) in self.terms_containing(v) {
            self.store.remove_sorted(&key);
            let reduced: Vec<V> = key.into_iter().filter(|u| u != v).collect();
            self.store.add_sorted(reduced, bias * fixed);
        }
        Ok(())
    }

    /// Fix several variables; all are validated before any is applied.
    pub fn fix_variables(&mut self, fixed: &[(V, i32)]) -> Result<()> {
        for (v, value) in fixed {
            self.vartype.check(*value)?;
            if !self.store.has_variable(v) {
                return Err(QuboError::not_found(v));
            }
        }
        for (v, value) in fixed {
            // An earlier fix may have cancelled every term of `v`.
            if self.store.has_variable(v) {
                self.fix_variable(v, *value)?;
            }
        }
        Ok(())
    }

    /// Replace `v` by its complement (`-s` or `1 - x`).
    pub fn flip_variable(&mut self, v: &V) -> Result<()> {
        if !self.store.has_variable(v) {
            return Err(QuboError::not_found(v));
        }

        for (key, bias) in self.terms_containing(v) {
            if self.vartype == Vartype::Binary {
                let reduced: Vec<V> = key.iter().filter(|u| *u != v).cloned().collect();
                self.store.add_sorted(reduced, bias);
            }
            self.store.set_sorted(key, -bias);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Conversion
    // ------------------------------------------------------------------

    /// Rewrite every term into `target`'s encoding.
    ///
    /// Fails without modifying the model if any term exceeds the
    /// configured conversion arity.
    pub fn change_vartype(&mut self, target: Vartype) -> Result<()> {
        if target == self.vartype {
            return Ok(());
        }

        let converted = convert_polynomial(
            self.store.iter(),
            self.vartype,
            target,
            self.config.max_conversion_arity,
        )?;
        debug!(
            from = %self.vartype,
            to = %target,
            terms_before = self.store.len(),
            terms_after = converted.len(),
            "changing polynomial vartype"
        );

        let mut store = PolynomialStore::with_capacity(converted.len());
        for (key, bias) in converted {
            store.add_sorted(key, bias);
        }
        store.raise_degree(self.store.degree());
        self.store = store;
        self.vartype = target;
        Ok(())
    }

    /// Copy of the model in `target`'s encoding.
    pub fn to_vartype(&self, target: Vartype) -> Result<Self> {
        let mut model = self.clone();
        model.change_vartype(target)?;
        Ok(model)
    }

    fn polynomial_as(&self, target: Vartype) -> Result<FxHashMap<Vec<V>, f64>> {
        if target == self.vartype {
            return Ok(self.polynomial());
        }
        convert_polynomial(
            self.store.iter(),
            self.vartype,
            target,
            self.config.max_conversion_arity,
        )
    }

    /// Terms in the binary encoding.
    pub fn to_hubo(&self) -> Result<FxHashMap<Vec<V>, f64>> {
        self.polynomial_as(Vartype::Binary)
    }

    /// Terms in the spin encoding.
    pub fn to_hising(&self) -> Result<FxHashMap<Vec<V>, f64>> {
        self.polynomial_as(Vartype::Spin)
    }

    /// Energy of a sample given in ascending variable order.
    pub fn energy_indexed(&self, values: &[i32]) -> Result<f64> {
        let sample = sample_from_slices(&self.variables(), values)?;
        self.energy(&sample)
    }
}

impl<V: Label> EnergyModel<V> for BinaryPolynomialModel<V> {
    fn energy(&self, sample: &Sample<V>) -> Result<f64> {
        require_variables(sample, self.store.variables_unordered())?;
        let mut energy = 0.0;
        for (key, bias) in self.store.iter() {
            energy += bias * term_product(key, sample)?;
        }
        Ok(energy)
    }

    fn config(&self) -> &ModelConfig {
        &self.config
    }
}

impl<V: Label> PartialEq for BinaryPolynomialModel<V> {
    fn eq(&self, other: &Self) -> bool {
        self.vartype == other.vartype && self.polynomial() == other.polynomial()
    }
}
