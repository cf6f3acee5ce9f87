//! Behavioural tests for `BinaryQuadraticModel` across all storage backends.

use ndarray::Array2;
use ruvector_qubo::{
    convert_sample, sample_from, BinaryQuadraticModel, DenseBqm, DenseStorage, DictBqm,
    DictStorage, EnergyModel, IgnoredTerms, ModelConfig, NormalizeOptions, QuadraticStorage,
    QuboError, Sample, SparseBqm, SparseStorage, Vartype,
};

const EPSILON: f64 = 1e-9;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// Route the crate's `tracing` events to the test harness output.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("ruvector_qubo=debug")
        .with_test_writer()
        .try_init();
}

/// Every assignment of `labels` under `vartype`.
fn assignments(labels: &[i64], vartype: Vartype) -> Vec<Sample<i64>> {
    let [low, high] = vartype.values();
    (0..1u32 << labels.len())
        .map(|mask| {
            labels
                .iter()
                .enumerate()
                .map(|(i, &v)| (v, if (mask >> i) & 1 == 1 { high } else { low }))
                .collect()
        })
        .collect()
}

fn frustrated_triangle<S: QuadraticStorage<i64>>() -> BinaryQuadraticModel<i64, S> {
    BinaryQuadraticModel::new(
        vec![(0, 0.5), (1, -1.25), (2, 2.0), (3, 0.0)],
        vec![((0, 1), 1.0), ((1, 2), -0.75), ((2, 0), 1.5), ((3, 1), 0.25)],
        -0.5,
        Vartype::Spin,
    )
    .unwrap()
}

fn energies_of<S: QuadraticStorage<i64>>(
    model: &BinaryQuadraticModel<i64, S>,
    samples: &[Sample<i64>],
) -> Vec<f64> {
    samples.iter().map(|s| model.energy(s).unwrap()).collect()
}

// ── Construction ─────────────────────────────────────────────────────────────

#[test]
fn repeated_entries_accumulate_on_construction() {
    let bqm: SparseBqm<i64> = BinaryQuadraticModel::new(
        vec![(0, 1.0), (0, 2.0)],
        vec![((0, 1), 1.0), ((1, 0), 0.5)],
        0.0,
        Vartype::Binary,
    )
    .unwrap();
    assert_eq!(bqm.linear(&0), Some(3.0));
    assert_eq!(bqm.linear(&1), Some(0.0));
    assert_eq!(bqm.quadratic(&1, &0), Some(1.5));
    assert_eq!(bqm.num_interactions(), 1);
}

#[test]
fn diagonal_matrix_form_matches_padded_form() {
    let mut m = Array2::<f64>::zeros((4, 4));
    for (i, d) in [21.0, 26.0, 31.0, 36.0].iter().enumerate() {
        m[[i, i]] = *d;
    }
    // Off-diagonal numbering of the padded 5x5 form with column 4 dropped.
    for i in 0..4 {
        for j in 0..4 {
            if i != j {
                m[[i, j]] = (4 * i + j + usize::from(j < i)) as f64;
            }
        }
    }
    let labels = ["a", "b", "d", "e"];
    let bqm = DenseBqm::from_dense_matrix(m.view(), &labels, 0.0, Vartype::Spin).unwrap();

    assert_eq!(bqm.linear(&"a"), Some(21.0));
    assert_eq!(bqm.linear(&"e"), Some(36.0));
    assert_eq!(bqm.quadratic(&"a", &"b"), Some(6.0));
    assert_eq!(bqm.quadratic(&"a", &"d"), Some(11.0));
    assert_eq!(bqm.quadratic(&"a", &"e"), Some(16.0));
    assert_eq!(bqm.quadratic(&"b", &"d"), Some(16.0));
    assert_eq!(bqm.quadratic(&"b", &"e"), Some(21.0));
    assert_eq!(bqm.quadratic(&"d", &"e"), Some(26.0));
}

#[test]
fn matrix_labels_need_not_be_sorted() {
    let m = ndarray::array![[1.0, 2.0], [0.0, 3.0]];
    let bqm = DictBqm::from_dense_matrix(m.view(), &["z", "a"], 0.0, Vartype::Binary).unwrap();
    assert_eq!(bqm.linear(&"z"), Some(1.0));
    assert_eq!(bqm.linear(&"a"), Some(3.0));
    assert_eq!(bqm.quadratic(&"a", &"z"), Some(2.0));
    assert_eq!(bqm.variables(), vec!["a", "z"]);
}

#[test]
fn invalid_config_is_rejected() {
    let bqm = DictBqm::<i64>::empty(Vartype::Spin);
    let err = bqm
        .with_config(ModelConfig::new().with_max_conversion_arity(0))
        .unwrap_err();
    assert!(matches!(err, QuboError::InvalidConfig { .. }));
}

// ── Backends ─────────────────────────────────────────────────────────────────

#[test]
fn backends_agree_after_the_same_edits() {
    fn edit<S: QuadraticStorage<i64>>() -> BinaryQuadraticModel<i64, S> {
        let mut bqm = frustrated_triangle::<S>();
        bqm.add_interaction(&4, &0, 2.0).unwrap();
        bqm.add_interaction(&1, &0, -1.0).unwrap();
        bqm.add_variable(&5, 1.5);
        bqm.remove_variable(&2);
        bqm.flip_variable(&1).unwrap();
        bqm.add_offset(0.25);
        bqm
    }

    let dict = edit::<DictStorage<i64>>();
    let sparse = edit::<SparseStorage<i64>>();
    let dense = edit::<DenseStorage<i64>>();

    assert_eq!(dict.linear_map(), sparse.linear_map());
    assert_eq!(dict.linear_map(), dense.linear_map());
    assert_eq!(dict.quadratic_map(), sparse.quadratic_map());
    assert_eq!(dict.quadratic_map(), dense.quadratic_map());
    assert_eq!(dict.interaction_matrix(), sparse.interaction_matrix());
    assert_eq!(dict.interaction_matrix(), dense.interaction_matrix());

    // (0, 1) cancelled to zero: gone, endpoints stay.
    assert_eq!(dict.quadratic(&0, &1), None);
    assert!(dict.contains(&0) && dict.contains(&1));
    assert_eq!(dense.num_interactions(), 2);

    let samples = assignments(&dict.variables(), Vartype::Spin);
    assert_eq!(energies_of(&dict, &samples), energies_of(&dense, &samples));
    assert_eq!(energies_of(&dict, &samples), energies_of(&sparse, &samples));
}

#[test]
fn to_backend_copies_config_and_terms() {
    let config = ModelConfig::new().with_parallel_energy_threshold(2);
    let dict = frustrated_triangle::<DictStorage<i64>>()
        .with_config(config)
        .unwrap();
    let dense: DenseBqm<i64> = dict.to_backend();
    assert_eq!(dense.config(), &config);
    assert_eq!(dense.to_backend::<DictStorage<i64>>(), dict);
}

// ── Vartype conversion ───────────────────────────────────────────────────────

#[test]
fn change_vartype_preserves_energy_on_every_assignment() {
    init_tracing();

    fn check<S: QuadraticStorage<i64>>() {
        let spin = frustrated_triangle::<S>();
        let binary = spin.to_vartype(Vartype::Binary).unwrap();
        assert_eq!(binary.vartype(), Vartype::Binary);

        for sample in assignments(&spin.variables(), Vartype::Spin) {
            let as_binary = convert_sample(&sample, Vartype::Spin, Vartype::Binary);
            let e_spin = spin.energy(&sample).unwrap();
            let e_binary = binary.energy(&as_binary).unwrap();
            assert!(approx_eq(e_spin, e_binary), "{e_spin} vs {e_binary}");
        }

        let back = binary.to_vartype(Vartype::Spin).unwrap();
        for v in spin.variables() {
            assert!(approx_eq(spin.linear(&v).unwrap(), back.linear(&v).unwrap()));
        }
        assert!(approx_eq(spin.offset(), back.offset()));
    }

    check::<DictStorage<i64>>();
    check::<SparseStorage<i64>>();
    check::<DenseStorage<i64>>();
}

#[test]
fn change_vartype_to_same_encoding_is_identity() {
    let mut bqm = frustrated_triangle::<SparseStorage<i64>>();
    let before = bqm.clone();
    bqm.change_vartype(Vartype::Spin).unwrap();
    assert_eq!(bqm, before);
}

#[test]
fn quadratic_conversion_fails_under_arity_one() {
    let config = ModelConfig::new().with_max_conversion_arity(1);
    let mut bqm = frustrated_triangle::<DictStorage<i64>>()
        .with_config(config)
        .unwrap();
    let before = bqm.clone();
    let err = bqm.change_vartype(Vartype::Binary).unwrap_err();
    assert!(matches!(err, QuboError::InteractionTooLarge { arity: 2, max: 1 }));
    assert_eq!(bqm, before);
}

// ── Fix / flip ───────────────────────────────────────────────────────────────

#[test]
fn fixing_a_variable_matches_restricted_energy() {
    for value in [-1, 1] {
        let full = frustrated_triangle::<DenseStorage<i64>>();
        let mut fixed = full.clone();
        fixed.fix_variable(&1, value).unwrap();

        for mut sample in assignments(&fixed.variables(), Vartype::Spin) {
            let e_fixed = fixed.energy(&sample).unwrap();
            sample.insert(1, value);
            let e_full = full.energy(&sample).unwrap();
            assert!(approx_eq(e_fixed, e_full), "{e_fixed} vs {e_full}");
        }
    }
}

#[test]
fn fix_variables_validates_before_applying() {
    let mut bqm = frustrated_triangle::<SparseStorage<i64>>();
    let before = bqm.clone();
    assert!(bqm.fix_variables(&[(0, 1), (9, 1)]).is_err());
    assert!(bqm.fix_variables(&[(0, 1), (1, 0)]).is_err());
    assert_eq!(bqm, before);

    bqm.fix_variables(&[(0, 1), (1, -1)]).unwrap();
    assert_eq!(bqm.variables(), vec![2, 3]);
}

#[test]
fn flipping_twice_restores_binary_model() {
    let mut bqm = frustrated_triangle::<DictStorage<i64>>()
        .to_vartype(Vartype::Binary)
        .unwrap();
    let before = bqm.clone();
    bqm.flip_variable(&2).unwrap();
    assert_ne!(bqm, before);

    for sample in assignments(&bqm.variables(), Vartype::Binary) {
        let mut flipped = sample.clone();
        flipped.insert(2, 1 - sample[&2]);
        let a = bqm.energy(&flipped).unwrap();
        let b = before.energy(&sample).unwrap();
        assert!(approx_eq(a, b), "{a} vs {b}");
    }

    bqm.flip_variable(&2).unwrap();
    for v in before.variables() {
        assert!(approx_eq(bqm.linear(&v).unwrap(), before.linear(&v).unwrap()));
    }
    assert!(approx_eq(bqm.offset(), before.offset()));
}

// ── Removal ──────────────────────────────────────────────────────────────────

#[test]
fn bulk_removal_counts_present_items() {
    let mut bqm = frustrated_triangle::<SparseStorage<i64>>();
    assert_eq!(bqm.remove_interactions_from(&[(1, 0), (7, 8), (0, 2)]), 2);
    // 0 keeps its linear bias and 3 still couples to 1.
    assert_eq!(bqm.variables(), vec![0, 1, 2, 3]);

    assert_eq!(bqm.remove_variables_from(&[3, 3, 42]), 1);
    assert_eq!(bqm.num_variables(), 3);
    assert_eq!(bqm.num_interactions(), 1);

    bqm.clear();
    assert!(bqm.is_empty());
    assert_eq!(bqm.offset(), 0.0);
}

#[test]
fn remove_offset_leaves_biases() {
    let mut bqm = frustrated_triangle::<DenseStorage<i64>>();
    bqm.remove_offset();
    assert_eq!(bqm.offset(), 0.0);
    assert_eq!(bqm.linear(&2), Some(2.0));
}

// ── Scaling ──────────────────────────────────────────────────────────────────

#[test]
fn normalize_with_everything_ignored_is_a_noop() {
    let mut bqm: DictBqm<i64> =
        BinaryQuadraticModel::new(vec![(0, 4.0)], vec![((0, 1), 8.0)], 2.0, Vartype::Spin)
            .unwrap();
    let before = bqm.clone();
    let options = NormalizeOptions::new().with_ignored(
        IgnoredTerms::new()
            .with_variables(vec![0, 1])
            .with_interactions(vec![(1, 0)]),
    );
    assert_eq!(bqm.normalize(&options).unwrap(), None);
    assert_eq!(bqm, before);
}

#[test]
fn normalize_brings_biases_into_range() {
    let mut bqm = frustrated_triangle::<SparseStorage<i64>>();
    let inv = bqm.normalize(&NormalizeOptions::new()).unwrap().unwrap();
    assert!(approx_eq(inv, 2.0));
    for (_, bias) in bqm.linear_map() {
        assert!((-1.0..=1.0).contains(&bias));
    }
    for (_, bias) in bqm.quadratic_map() {
        assert!((-1.0..=1.0).contains(&bias));
    }
    assert!(approx_eq(bqm.offset(), -0.25));
}

#[test]
fn invalid_range_leaves_model_untouched() {
    let mut bqm = frustrated_triangle::<DenseStorage<i64>>();
    let before = bqm.clone();
    for range in [(f64::NAN, 1.0), (1.0, -1.0), (1.0, 1.0)] {
        let options = NormalizeOptions::new().with_bias_range(range);
        assert!(matches!(
            bqm.normalize(&options),
            Err(QuboError::InvalidRange { .. })
        ));
        let options = NormalizeOptions::new().with_quadratic_range(range);
        assert!(matches!(
            bqm.normalize(&options),
            Err(QuboError::InvalidRange { .. })
        ));
    }
    assert_eq!(bqm, before);
}

#[test]
fn normalize_refuses_to_negate_the_energy() {
    let mut bqm: SparseBqm<i64> = BinaryQuadraticModel::new(
        vec![(0, -4.0), (1, -2.0)],
        vec![((0, 1), -1.0)],
        0.0,
        Vartype::Binary,
    )
    .unwrap();
    let before = bqm.clone();
    let options = NormalizeOptions::new().with_bias_range((0.0, 1.0));
    assert_eq!(bqm.normalize(&options).unwrap(), None);
    assert_eq!(bqm, before);
}

#[test]
fn padded_matrix_ignores_its_diagonal() {
    let m = ndarray::array![
        [9.0, 1.0, 2.0],
        [0.5, 9.0, 3.0],
        [0.0, 0.25, 9.0],
    ];
    let bqm = DictBqm::from_dense_matrix(m.view(), &["x", "y"], 0.0, Vartype::Binary).unwrap();
    assert_eq!(bqm.linear(&"x"), Some(2.0));
    assert_eq!(bqm.linear(&"y"), Some(3.25));
    assert_eq!(bqm.quadratic(&"x", &"y"), Some(1.5));
}

// ── Energies ─────────────────────────────────────────────────────────────────

#[test]
fn batch_energies_follow_input_order_in_both_modes() {
    init_tracing();
    let model = frustrated_triangle::<DictStorage<i64>>();
    let samples = assignments(&model.variables(), Vartype::Spin);
    let expected = energies_of(&model, &samples);

    let sequential = model
        .clone()
        .with_config(ModelConfig::new().with_parallel_energy_threshold(usize::MAX))
        .unwrap();
    let parallel = model
        .with_config(ModelConfig::new().with_parallel_energy_threshold(1))
        .unwrap();
    assert_eq!(sequential.energies(&samples).unwrap(), expected);
    assert_eq!(parallel.energies(&samples).unwrap(), expected);
}

#[test]
fn energy_reports_missing_variable() {
    let model = frustrated_triangle::<SparseStorage<i64>>();
    let err = model
        .energy(&sample_from(vec![(0, 1), (1, 1), (2, 1)]))
        .unwrap_err();
    assert!(matches!(err, QuboError::MissingSampleVariable(ref v) if v == "3"));
}
