//! `BinaryQuadraticModel`: Ising / QUBO models over a pluggable backend.

use std::marker::PhantomData;

use ndarray::{Array2, ArrayView2};
use tracing::debug;

use crate::algebra::{
    check_arity, check_range, convert_quadratic, convert_term, inverse_scale, QuadraticParts,
};
use crate::config::ModelConfig;
use crate::energy::EnergyModel;
use crate::error::{QuboError, Result};
use crate::quadratic::dense::DenseStorage;
use crate::quadratic::dict::DictStorage;
use crate::quadratic::sparse::SparseStorage;
use crate::quadratic::storage::{ordered, QuadraticStorage};
use crate::sample::{require_variables, Sample};
use crate::variable::{FxHashMap, FxHashSet, Label};
use crate::vartype::Vartype;

/// Quadratic model backed by the packed-matrix store.
pub type DenseBqm<V> = BinaryQuadraticModel<V, DenseStorage<V>>;

/// Quadratic model backed by the slot/adjacency store.
pub type SparseBqm<V> = BinaryQuadraticModel<V, SparseStorage<V>>;

/// Quadratic model backed by label-keyed hash maps.
pub type DictBqm<V> = BinaryQuadraticModel<V, DictStorage<V>>;

/// Terms left untouched by [`BinaryQuadraticModel::scale_with`] and `normalize`.
#[derive(Debug, Clone)]
pub struct IgnoredTerms<V> {
    /// Variables whose linear bias is kept
    pub variables: Vec<V>,
    /// Couplers whose bias is kept, in either order
    pub interactions: Vec<(V, V)>,
    /// Keep the offset
    pub offset: bool,
}

impl<V> Default for IgnoredTerms<V> {
    fn default() -> Self {
        Self {
            variables: Vec::new(),
            interactions: Vec::new(),
            offset: false,
        }
    }
}

impl<V> IgnoredTerms<V> {
    /// Ignore nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep these linear biases
    pub fn with_variables(mut self, variables: Vec<V>) -> Self {
        self.variables = variables;
        self
    }

    /// Keep these couplers
    pub fn with_interactions(mut self, interactions: Vec<(V, V)>) -> Self {
        self.interactions = interactions;
        self
    }

    /// Keep the offset
    pub fn with_offset(mut self, ignore: bool) -> Self {
        self.offset = ignore;
        self
    }
}

/// Parameters for [`BinaryQuadraticModel::normalize`].
#[derive(Debug, Clone)]
pub struct NormalizeOptions<V> {
    /// Target range for linear biases, and for couplers unless overridden
    pub bias_range: (f64, f64),
    /// Separate target range for couplers
    pub quadratic_range: Option<(f64, f64)>,
    /// Terms excluded from both the extremes and the rescaling
    pub ignored: IgnoredTerms<V>,
}

impl<V> Default for NormalizeOptions<V> {
    fn default() -> Self {
        Self {
            bias_range: (-1.0, 1.0),
            quadratic_range: None,
            ignored: IgnoredTerms::default(),
        }
    }
}

impl<V> NormalizeOptions<V> {
    /// Default options: both ranges `(-1, 1)`, nothing ignored
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the linear (and default quadratic) range
    pub fn with_bias_range(mut self, range: (f64, f64)) -> Self {
        self.bias_range = range;
        self
    }

    /// Use a separate range for couplers
    pub fn with_quadratic_range(mut self, range: (f64, f64)) -> Self {
        self.quadratic_range = Some(range);
        self
    }

    /// Exclude terms
    pub fn with_ignored(mut self, ignored: IgnoredTerms<V>) -> Self {
        self.ignored = ignored;
        self
    }
}

fn extremes<I: Iterator<Item = f64>>(biases: I) -> Option<(f64, f64)> {
    biases.fold(None, |acc, b| match acc {
        None => Some((b, b)),
        Some((lo, hi)) => Some((lo.min(b), hi.max(b))),
    })
}

/// Energy function `offset + Σ h_v·v + Σ J_uv·u·v` over spin or binary variables.
///
/// The backend `S` decides the storage layout; every operation behaves the
/// same on all of them. Self-loops `(v, v)` are rejected.
#[derive(Debug, Clone)]
pub struct BinaryQuadraticModel<V: Label, S: QuadraticStorage<V> = DictStorage<V>> {
    storage: S,
    offset: f64,
    vartype: Vartype,
    config: ModelConfig,
    _label: PhantomData<fn() -> V>,
}

impl<V: Label, S: QuadraticStorage<V>> BinaryQuadraticModel<V, S> {
    /// Create a model with no variables.
    pub fn empty(vartype: Vartype) -> Self {
        Self {
            storage: S::default(),
            offset: 0.0,
            vartype,
            config: ModelConfig::default(),
            _label: PhantomData,
        }
    }

    /// Build a model from linear biases, couplers and an offset.
    ///
    /// Repeated entries accumulate. A coupler `(v, v)` is rejected before
    /// anything is stored.
    pub fn new<L, Q>(linear: L, quadratic: Q, offset: f64, vartype: Vartype) -> Result<Self>
    where
        L: IntoIterator<Item = (V, f64)>,
        Q: IntoIterator<Item = ((V, V), f64)>,
    {
        let linear: Vec<(V, f64)> = linear.into_iter().collect();
        let quadratic: Vec<((V, V), f64)> = quadratic.into_iter().collect();
        if let Some(((u, v), _)) = quadratic.iter().find(|((u, v), _)| u == v) {
            return Err(QuboError::self_loop(&(u, v)));
        }

        let mut labels: Vec<V> = linear
            .iter()
            .map(|(v, _)| v.clone())
            .chain(quadratic.iter().flat_map(|((u, v), _)| [u.clone(), v.clone()]))
            .collect();
        labels.sort();
        labels.dedup();

        let mut model = Self::empty(vartype);
        model.storage.reserve_variables(&labels);
        for (v, bias) in &linear {
            model.storage.add_linear(v, *bias);
        }
        for ((u, v), bias) in &quadratic {
            model.storage.add_quadratic(u, v, *bias);
        }
        model.offset = offset;
        Ok(model)
    }

    /// Build a spin model from fields `h` and couplings `j`.
    pub fn from_ising<L, Q>(h: L, j: Q, offset: f64) -> Result<Self>
    where
        L: IntoIterator<Item = (V, f64)>,
        Q: IntoIterator<Item = ((V, V), f64)>,
    {
        Self::new(h, j, offset, Vartype::Spin)
    }

    /// Build a binary model from a QUBO map; diagonal entries are linear biases.
    pub fn from_qubo<Q>(q: Q, offset: f64) -> Self
    where
        Q: IntoIterator<Item = ((V, V), f64)>,
    {
        let mut model = Self::empty(Vartype::Binary);
        for ((u, v), bias) in q {
            if u == v {
                model.storage.add_linear(&u, bias);
            } else {
                model.storage.add_quadratic(&u, &v, bias);
            }
        }
        model.offset = offset;
        model
    }

    /// Build a model from a square matrix and one label per variable.
    ///
    /// An `n×n` matrix carries linear biases on its diagonal. An
    /// `(n+1)×(n+1)` matrix carries them in its last row and column (both
    /// are summed) and its diagonal is ignored. Entries `(i, j)` and
    /// `(j, i)` are summed into a single coupler.
    pub fn from_dense_matrix(
        matrix: ArrayView2<'_, f64>,
        labels: &[V],
        offset: f64,
        vartype: Vartype,
    ) -> Result<Self> {
        let (rows, cols) = matrix.dim();
        let n = Self::matrix_labels(rows, cols, labels)?;

        let mut model = Self::empty(vartype);
        let mut sorted = labels.to_vec();
        sorted.sort();
        model.storage.reserve_variables(&sorted);

        for i in 0..n {
            let linear = if rows > n {
                matrix[[i, n]] + matrix[[n, i]]
            } else {
                matrix[[i, i]]
            };
            model.storage.add_linear(&labels[i], linear);
            for j in (i + 1)..n {
                let bias = matrix[[i, j]] + matrix[[j, i]];
                if bias != 0.0 {
                    model.storage.add_quadratic(&labels[i], &labels[j], bias);
                }
            }
        }
        model.offset = offset;
        Ok(model)
    }

    /// Build a model from `(row, col, value)` entries of a `dim×dim` matrix.
    ///
    /// Same conventions as [`from_dense_matrix`](Self::from_dense_matrix);
    /// explicit zeros are ignored.
    pub fn from_sparse_matrix(
        dim: usize,
        entries: &[(usize, usize, f64)],
        labels: &[V],
        offset: f64,
        vartype: Vartype,
    ) -> Result<Self> {
        let n = Self::matrix_labels(dim, dim, labels)?;
        let padded = dim > n;
        if let Some(&(r, c, _)) = entries.iter().find(|(r, c, _)| *r >= dim || *c >= dim) {
            return Err(QuboError::IndexOutOfRange {
                index: r.max(c),
                len: dim,
            });
        }

        let mut model = Self::empty(vartype);
        let mut sorted = labels.to_vec();
        sorted.sort();
        model.storage.reserve_variables(&sorted);

        for &(r, c, value) in entries {
            if value == 0.0 {
                continue;
            }
            match (r < n, c < n) {
                (true, true) if r == c => {
                    if !padded {
                        model.storage.add_linear(&labels[r], value);
                    }
                }
                (true, true) => model.storage.add_quadratic(&labels[r], &labels[c], value),
                (true, false) => model.storage.add_linear(&labels[r], value),
                (false, true) => model.storage.add_linear(&labels[c], value),
                (false, false) => {}
            }
        }
        model.offset = offset;
        Ok(model)
    }

    fn matrix_labels(rows: usize, cols: usize, labels: &[V]) -> Result<usize> {
        if rows != cols {
            return Err(QuboError::NonSquareMatrix { rows, cols });
        }
        let n = labels.len();
        if rows != n && rows != n + 1 {
            return Err(QuboError::LengthMismatch {
                what: "matrix dimension and labels",
                expected: rows,
                actual: n,
            });
        }
        let mut seen = FxHashSet::default();
        if let Some(dup) = labels.iter().find(|v| !seen.insert(*v)) {
            return Err(QuboError::DuplicateVariable(format!("{:?}", dup)));
        }
        Ok(n)
    }

    /// Replace the configuration after validating it.
    pub fn with_config(mut self, config: ModelConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Copy the model into another backend.
    pub fn to_backend<T: QuadraticStorage<V>>(&self) -> BinaryQuadraticModel<V, T> {
        let mut model = BinaryQuadraticModel::<V, T>::empty(self.vartype);
        model.config = self.config;
        model.load(&QuadraticParts {
            linear: self.linear_map(),
            quadratic: self.quadratic_map(),
            offset: self.offset,
        });
        model
    }

    fn load(&mut self, parts: &QuadraticParts<V>) {
        self.storage.clear();
        let mut labels: Vec<V> = parts.linear.keys().cloned().collect();
        labels.sort();
        self.storage.reserve_variables(&labels);
        for (v, &bias) in &parts.linear {
            self.storage.set_linear(v, bias);
        }
        for ((u, v), &bias) in &parts.quadratic {
            self.storage.set_quadratic(u, v, bias);
        }
        self.offset = parts.offset;
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Variable encoding.
    pub fn vartype(&self) -> Vartype {
        self.vartype
    }

    /// Constant term.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// The storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Number of variables.
    pub fn num_variables(&self) -> usize {
        self.storage.num_variables()
    }

    /// Number of couplers.
    pub fn num_interactions(&self) -> usize {
        self.storage.num_interactions()
    }

    /// True if the model has no variables.
    pub fn is_empty(&self) -> bool {
        self.storage.num_variables() == 0
    }

    /// Variables in ascending order.
    pub fn variables(&self) -> Vec<V> {
        self.storage.variables()
    }

    /// True if `v` is a variable.
    pub fn contains(&self, v: &V) -> bool {
        self.storage.contains(v)
    }

    /// Linear bias of `v`.
    pub fn linear(&self, v: &V) -> Option<f64> {
        self.storage.linear(v)
    }

    /// Coupler bias between `u` and `v`, in either order.
    pub fn quadratic(&self, u: &V, v: &V) -> Option<f64> {
        self.storage.quadratic(u, v)
    }

    /// Every variable with its linear bias.
    pub fn linear_map(&self) -> FxHashMap<V, f64> {
        self.storage
            .iter_linear()
            .map(|(v, b)| (v.clone(), b))
            .collect()
    }

    /// Every coupler, keyed `(smaller, larger)`.
    pub fn quadratic_map(&self) -> FxHashMap<(V, V), f64> {
        self.storage
            .iter_quadratic()
            .map(|(u, v, b)| (ordered(u, v), b))
            .collect()
    }

    /// Neighbours of `v` with coupler biases.
    pub fn adjacency(&self, v: &V) -> Vec<(V, f64)> {
        self.storage.adjacency(v)
    }

    /// Packed upper-triangular matrix in ascending label order.
    pub fn interaction_matrix(&self) -> Array2<f64> {
        self.storage.interaction_matrix()
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    fn apply_term(&mut self, key: &[V], bias: f64) -> Result<()> {
        match key {
            [] => self.offset += bias,
            [v] => self.storage.add_linear(v, bias),
            [u, v] => self.storage.add_quadratic(u, v, bias),
            _ => return check_arity(key.len(), 2),
        }
        Ok(())
    }

    /// Add `bias` to the linear bias of `v`, creating it if new.
    pub fn add_variable(&mut self, v: &V, bias: f64) {
        self.storage.add_linear(v, bias);
    }

    /// Add a linear bias expressed in `vartype`.
    pub fn add_variable_as(&mut self, v: &V, bias: f64, vartype: Vartype) -> Result<()> {
        self.storage.add_linear(v, 0.0);
        self.add_converted(std::slice::from_ref(v), bias, vartype)
    }

    /// Add several linear biases.
    pub fn add_variables_from<I: IntoIterator<Item = (V, f64)>>(&mut self, linear: I) {
        for (v, bias) in linear {
            self.storage.add_linear(&v, bias);
        }
    }

    /// Add `bias` to the coupler `(u, v)`.
    pub fn add_interaction(&mut self, u: &V, v: &V, bias: f64) -> Result<()> {
        if u == v {
            return Err(QuboError::self_loop(&(u, v)));
        }
        self.storage.add_quadratic(u, v, bias);
        Ok(())
    }

    /// Add a coupler bias expressed in `vartype`.
    pub fn add_interaction_as(&mut self, u: &V, v: &V, bias: f64, vartype: Vartype) -> Result<()> {
        if u == v {
            return Err(QuboError::self_loop(&(u, v)));
        }
        let (a, b) = ordered(u, v);
        self.storage.add_quadratic(&a, &b, 0.0);
        self.add_converted(&[a, b], bias, vartype)
    }

    fn add_converted(&mut self, key: &[V], bias: f64, vartype: Vartype) -> Result<()> {
        let mut contributions = Vec::with_capacity(4);
        convert_term(
            key,
            bias,
            vartype,
            self.vartype,
            self.config.max_conversion_arity,
            |k, b| contributions.push((k, b)),
        )?;
        for (k, b) in contributions {
            self.apply_term(&k, b)?;
        }
        Ok(())
    }

    /// Add several couplers; nothing is added if any is a self-loop.
    pub fn add_interactions_from<I>(&mut self, quadratic: I) -> Result<()>
    where
        I: IntoIterator<Item = ((V, V), f64)>,
    {
        let quadratic: Vec<((V, V), f64)> = quadratic.into_iter().collect();
        if let Some(((u, v), _)) = quadratic.iter().find(|((u, v), _)| u == v) {
            return Err(QuboError::self_loop(&(u, v)));
        }
        for ((u, v), bias) in &quadratic {
            self.storage.add_quadratic(u, v, *bias);
        }
        Ok(())
    }

    /// Add to the constant term.
    pub fn add_offset(&mut self, offset: f64) {
        self.offset += offset;
    }

    /// Set the constant term to zero.
    pub fn remove_offset(&mut self) {
        self.offset = 0.0;
    }

    /// Remove `v` and its couplers; false if absent.
    pub fn remove_variable(&mut self, v: &V) -> bool {
        self.storage.remove_variable(v)
    }

    /// Remove several variables; returns how many were present.
    pub fn remove_variables_from(&mut self, variables: &[V]) -> usize {
        variables
            .iter()
            .filter(|v| self.storage.remove_variable(v))
            .count()
    }

    /// Remove the coupler `(u, v)`; false if absent.
    ///
    /// An endpoint left with no couplers and a zero linear bias is removed too.
    pub fn remove_interaction(&mut self, u: &V, v: &V) -> bool {
        if !self.storage.remove_quadratic(u, v) {
            return false;
        }
        for w in [u, v] {
            if self.storage.linear(w) == Some(0.0) && self.storage.adjacency(w).is_empty() {
                self.storage.remove_variable(w);
            }
        }
        true
    }

    /// Remove several couplers; returns how many were present.
    pub fn remove_interactions_from(&mut self, interactions: &[(V, V)]) -> usize {
        interactions
            .iter()
            .filter(|(u, v)| self.remove_interaction(u, v))
            .count()
    }

    /// Remove every variable and reset the offset.
    pub fn clear(&mut self) {
        self.storage.clear();
        self.offset = 0.0;
    }

    /// Multiply every bias and the offset by `factor`.
    pub fn scale(&mut self, factor: f64) {
        self.scale_with(factor, &IgnoredTerms::default());
    }

    /// Multiply biases by `factor`, leaving `ignored` terms unchanged.
    pub fn scale_with(&mut self, factor: f64, ignored: &IgnoredTerms<V>) {
        let variables: FxHashSet<&V> = ignored.variables.iter().collect();
        let pairs: FxHashSet<(V, V)> = ignored
            .interactions
            .iter()
            .map(|(u, v)| ordered(u, v))
            .collect();

        let linear: Vec<(V, f64)> = self
            .storage
            .iter_linear()
            .filter(|(v, _)| !variables.contains(v))
            .map(|(v, b)| (v.clone(), b * factor))
            .collect();
        let quadratic: Vec<((V, V), f64)> = self
            .storage
            .iter_quadratic()
            .map(|(u, v, b)| (ordered(u, v), b))
            .filter(|(pair, _)| !pairs.contains(pair))
            .map(|(pair, b)| (pair, b * factor))
            .collect();

        for (v, bias) in &linear {
            self.storage.set_linear(v, *bias);
        }
        for ((u, v), bias) in &quadratic {
            self.storage.set_quadratic(u, v, *bias);
        }
        if !ignored.offset {
            self.offset *= factor;
        }
    }

    /// Rescale so the non-ignored biases fit the requested ranges.
    ///
    /// Returns the divisor applied, or `None` when there was nothing to
    /// scale or the divisor is not positive and finite. In the latter case
    /// no positive factor maps the biases into range, and the model is left
    /// untouched rather than having its energy negated.
    pub fn normalize(&mut self, options: &NormalizeOptions<V>) -> Result<Option<f64>> {
        let linear_range = options.bias_range;
        let quadratic_range = options.quadratic_range.unwrap_or(linear_range);
        check_range(linear_range)?;
        check_range(quadratic_range)?;

        let variables: FxHashSet<&V> = options.ignored.variables.iter().collect();
        let pairs: FxHashSet<(V, V)> = options
            .ignored
            .interactions
            .iter()
            .map(|(u, v)| ordered(u, v))
            .collect();

        let linear = extremes(
            self.storage
                .iter_linear()
                .filter(|(v, _)| !variables.contains(v))
                .map(|(_, b)| b),
        );
        let quadratic = extremes(
            self.storage
                .iter_quadratic()
                .filter(|(u, v, _)| !pairs.contains(&ordered(*u, *v)))
                .map(|(_, _, b)| b),
        );

        let inv_scale = [
            linear.map(|e| inverse_scale(e, linear_range)),
            quadratic.map(|e| inverse_scale(e, quadratic_range)),
        ]
        .into_iter()
        .flatten()
        .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))));

        match inv_scale {
            Some(s) if s > 0.0 && s.is_finite() => {
                self.scale_with(1.0 / s, &options.ignored);
                Ok(Some(s))
            }
            other => {
                debug!(inv_scale = ?other, "skipping normalization");
                Ok(None)
            }
        }
    }

    /// Substitute `value` for `v`, folding its couplers into neighbours and its bias into the offset.
    pub fn fix_variable(&mut self, v: &V, value: i32) -> Result<()> {
        self.vartype.check(value)?;
        let bias = self.storage.linear(v).ok_or_else(|| QuboError::not_found(v))?;

        let fixed = f64::from(value);
        for (u, j) in self.storage.adjacency(v) {
            self.storage.add_linear(&u, fixed * j);
        }
        self.offset += fixed * bias;
        self.storage.remove_variable(v);
        Ok(())
    }

    /// Fix several variables; all are validated before any is applied.
    pub fn fix_variables(&mut self, fixed: &[(V, i32)]) -> Result<()> {
        for (v, value) in fixed {
            self.vartype.check(*value)?;
            if !self.storage.contains(v) {
                return Err(QuboError::not_found(v));
            }
        }
        for (v, value) in fixed {
            if self.storage.contains(v) {
                self.fix_variable(v, *value)?;
            }
        }
        Ok(())
    }

    /// Replace `v` by its complement (`-s` or `1 - x`).
    pub fn flip_variable(&mut self, v: &V) -> Result<()> {
        let bias = self.storage.linear(v).ok_or_else(|| QuboError::not_found(v))?;
        let neighbours = self.storage.adjacency(v);

        self.storage.set_linear(v, -bias);
        if self.vartype == Vartype::Binary {
            self.offset += bias;
        }
        for (u, j) in neighbours {
            if self.vartype == Vartype::Binary {
                self.storage.add_linear(&u, j);
            }
            self.storage.set_quadratic(v, &u, -j);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Conversion
    // ------------------------------------------------------------------

    fn parts(&self) -> QuadraticParts<V> {
        QuadraticParts {
            linear: self.linear_map(),
            quadratic: self.quadratic_map(),
            offset: self.offset,
        }
    }

    fn parts_as(&self, target: Vartype) -> Result<QuadraticParts<V>> {
        let arity = match (self.num_interactions(), self.num_variables()) {
            (0, 0) => 0,
            (0, _) => 1,
            _ => 2,
        };
        if target != self.vartype {
            check_arity(arity, self.config.max_conversion_arity)?;
        }
        Ok(convert_quadratic(&self.parts(), self.vartype, target))
    }

    /// Rewrite every bias into `target`'s encoding.
    pub fn change_vartype(&mut self, target: Vartype) -> Result<()> {
        if target == self.vartype {
            return Ok(());
        }
        let converted = self.parts_as(target)?;
        debug!(
            backend = S::NAME,
            from = %self.vartype,
            to = %target,
            variables = self.num_variables(),
            interactions = self.num_interactions(),
            "changing quadratic vartype"
        );
        self.load(&converted);
        self.vartype = target;
        Ok(())
    }

    /// Copy of the model in `target`'s encoding.
    pub fn to_vartype(&self, target: Vartype) -> Result<Self> {
        let mut model = self.clone();
        model.change_vartype(target)?;
        Ok(model)
    }

    /// Binary form as a QUBO map (linear biases on the diagonal) and offset.
    pub fn to_qubo(&self) -> Result<(FxHashMap<(V, V), f64>, f64)> {
        let parts = self.parts_as(Vartype::Binary)?;
        let mut qubo: FxHashMap<(V, V), f64> = parts.quadratic;
        for (v, bias) in parts.linear {
            qubo.insert((v.clone(), v), bias);
        }
        Ok((qubo, parts.offset))
    }

    /// Spin form as fields, couplings and offset.
    #[allow(clippy::type_complexity)]
    pub fn to_ising(&self) -> Result<(FxHashMap<V, f64>, FxHashMap<(V, V), f64>, f64)> {
        let parts = self.parts_as(Vartype::Spin)?;
        Ok((parts.linear, parts.quadratic, parts.offset))
    }
}

impl<V: Label, S: QuadraticStorage<V>> EnergyModel<V> for BinaryQuadraticModel<V, S> {
    fn energy(&self, sample: &Sample<V>) -> Result<f64> {
        require_variables(sample, self.storage.iter_linear().map(|(v, _)| v))?;
        Ok(self.storage.energy(sample)? + self.offset)
    }

    fn config(&self) -> &ModelConfig {
        &self.config
    }
}

impl<V: Label, S: QuadraticStorage<V>> PartialEq for BinaryQuadraticModel<V, S> {
    fn eq(&self, other: &Self) -> bool {
        self.vartype == other.vartype
            && self.offset == other.offset
            && self.linear_map() == other.linear_map()
            && self.quadratic_map() == other.quadratic_map()
    }
}
