use bayesglm::formula::parse_formula;
use bayesglm::linalg::{cholesky_lower, lower_mul};
use bayesglm::{Family, FitConfig, ModelInput, bayesglm};
use ndarray::{Array1, Array2, Axis};
use proptest::prelude::*;

fn sorted(mut v: Vec<f64>) -> Vec<f64> {
    v.sort_by(f64::total_cmp);
    v
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Pooling reorders draws but never drops or duplicates one.
    #[test]
    fn prop_pooling_preserves_draws(
        seed in any::<u64>(),
        chains in 1_usize..4,
        iterations in 8_usize..40,
    ) {
        let x = Array2::from_shape_fn((25, 2), |(i, j)| {
            if j == 0 { 1.0 } else { (i as f64 * 0.37).sin() }
        });
        let y: Array1<f64> = x.column(1).mapv(|v| 0.3 + 1.5 * v + 0.2 * (v * 17.0).cos());
        let config = FitConfig::new(iterations, seed).with_chains(chains);
        let fit = bayesglm(ModelInput::matrix(x, y), Family::Gaussian, &config).unwrap();

        let pooled = fit.extract(true).pooled().unwrap();
        let raw = fit.extract(false).raw().unwrap();
        prop_assert_eq!(pooled.len(), chains * config.sampling_iterations());
        prop_assert_eq!(raw.dim(), (chains, config.sampling_iterations(), 3));

        let beta = &pooled["beta"];
        for k in 0..2 {
            prop_assert_eq!(
                sorted(beta.index_axis(Axis(1), k).iter().copied().collect()),
                sorted(raw.index_axis(Axis(2), k).iter().copied().collect())
            );
        }
        prop_assert_eq!(
            sorted(pooled["sigma"].iter().copied().collect()),
            sorted(raw.index_axis(Axis(2), 2).iter().copied().collect())
        );
    }

    /// Binary responses are always accepted by the Bernoulli family.
    #[test]
    fn prop_binary_response_binds(bits in prop::collection::vec(any::<bool>(), 1..50)) {
        let y = Array1::from_iter(bits.iter().map(|&b| if b { 1.0 } else { 0.0 }));
        let x = Array2::ones((y.len(), 1));
        prop_assert!(Family::Bernoulli.bind(x.view(), y.view()).is_ok());
    }

    /// Term order survives parsing, and the intercept flag follows "0 +".
    #[test]
    fn prop_formula_terms_in_order(
        names in prop::collection::btree_set("[a-z][a-z0-9_]{0,6}", 1..6),
        no_intercept in any::<bool>(),
    ) {
        let names: Vec<String> = names.into_iter().filter(|n| n != "y").collect();
        prop_assume!(!names.is_empty());
        let rhs = names.join(" + ");
        let formula = if no_intercept { format!("y ~ 0 + {rhs}") } else { format!("y ~ {rhs}") };
        let parsed = parse_formula(&formula).unwrap();
        prop_assert_eq!(parsed.terms, names);
        prop_assert_eq!(parsed.has_intercept, !no_intercept);
    }

    /// The Cholesky factor reproduces `A z` through `L (Lᵀ z)`.
    #[test]
    fn prop_cholesky_reconstructs(values in prop::collection::vec(-2.0_f64..2.0, 9)) {
        let b = Array2::from_shape_vec((3, 3), values).unwrap();
        let a = b.t().dot(&b) + Array2::<f64>::eye(3);
        let l = cholesky_lower(&a).unwrap();
        let rebuilt = l.dot(&l.t());
        for (x, y) in rebuilt.iter().zip(a.iter()) {
            prop_assert!((x - y).abs() < 1e-9);
        }
        let z = [0.5, -1.0, 2.0];
        let lz = lower_mul(&l, &z);
        let expected = l.dot(&Array1::from(z.to_vec()));
        for (x, y) in lz.iter().zip(expected.iter()) {
            prop_assert!((x - y).abs() < 1e-12);
        }
    }
}
