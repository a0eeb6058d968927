//! Tests for least squares fitting

use approx::assert_abs_diff_eq;
use ndarray::array;
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

use crate::{
    base::ModelError,
    lm::{LeastSquaresSolver, LinearConfig, LinearRegression, RankDeficiencyPolicy, lm},
};
use catlm_core::{Coding, Column, ConfigError, Dataset, DesignMatrixBuilder, Formula};

// ==================== Test Fixtures ====================

/// Two groups of three: mean A = 5, mean B = 9
fn two_group_data() -> Dataset {
    Dataset::builder()
        .numeric("y", vec![4.0, 5.0, 6.0, 7.0, 9.0, 11.0])
        .unwrap()
        .categorical("group", &["A", "A", "A", "B", "B", "B"])
        .unwrap()
        .build()
}

/// Slopes differing between two levels of `h`, three levels of `g`
fn noisy_data() -> Dataset {
    let n = 36;
    let mut rng = StdRng::seed_from_u64(7);
    let noise = Normal::new(0.0, 0.5).unwrap();
    let groups = ["a", "b", "c"];
    let shift = [0.0, 1.0, -0.5];

    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    let mut g = Vec::with_capacity(n);
    let mut h = Vec::with_capacity(n);
    for i in 0..n {
        let xi = 0.25 * i as f64;
        let hv = if i % 2 == 1 { 1.0 } else { 0.0 };
        let gi = (i / 2) % 3;
        x.push(xi);
        g.push(groups[gi]);
        h.push(if hv > 0.0 { "v" } else { "u" });
        y.push(1.0 + 0.8 * xi + 1.5 * hv + 0.3 * xi * hv + shift[gi] + noise.sample(&mut rng));
    }

    Dataset::builder()
        .numeric("y", y)
        .unwrap()
        .numeric("x", x)
        .unwrap()
        .categorical("g", &g)
        .unwrap()
        .categorical("h", &h)
        .unwrap()
        .build()
}

// ==================== Basic Fits ====================

#[test]
fn test_two_group_means_and_pooled_t() {
    let data = two_group_data();
    let fit = lm("y ~ group", &data).unwrap();

    let intercept = fit.coefficient("(Intercept)").unwrap();
    let slope = fit.coefficient("groupB").unwrap();
    assert!(intercept.is_intercept);
    assert_abs_diff_eq!(intercept.estimate.unwrap(), 5.0, epsilon = 1e-10);
    assert_abs_diff_eq!(slope.estimate.unwrap(), 4.0, epsilon = 1e-10);

    // Pooled two-sample t: s_a² = 1, s_b² = 4
    let pooled: f64 = (2.0 * 1.0 + 2.0 * 4.0) / 4.0;
    let t = 4.0 / (pooled * (1.0 / 3.0 + 1.0 / 3.0)).sqrt();
    assert_abs_diff_eq!(slope.t_stat.unwrap().abs(), t, epsilon = 1e-8);
    assert_eq!(fit.df_residual(), 4);
    assert_abs_diff_eq!(fit.sigma2().unwrap(), pooled, epsilon = 1e-10);

    // Overall F of a one-term model is t²
    assert_abs_diff_eq!(fit.statistics().f_statistic.unwrap(), t * t, epsilon = 1e-6);
    assert_abs_diff_eq!(
        fit.statistics().f_p_value.unwrap(),
        slope.p_value.unwrap(),
        epsilon = 1e-8
    );
}

#[test]
fn test_redundant_indicator_is_inestimable() {
    let data = two_group_data();
    let fit = LinearRegression::parse("y ~ group")
        .unwrap()
        .coding("group", Coding::Indicator)
        .fit(&data)
        .unwrap();

    assert_eq!(fit.column_names(), vec!["(Intercept)", "groupA", "groupB"]);
    assert_eq!(fit.rank(), 2);
    assert_eq!(fit.ncols(), 3);
    assert_eq!(fit.inestimable(), vec!["groupB"]);
    assert_eq!(fit.coefficient("groupB").unwrap().estimate, None);
    assert_eq!(fit.coefficient("groupB").unwrap().std_error, None);
    assert_eq!(fit.coefficients().iter().filter(|c| c.is_estimable()).count(), 2);

    // Still fitted: the group means
    assert_abs_diff_eq!(
        fit.fitted_values().clone(),
        array![5.0, 5.0, 5.0, 9.0, 9.0, 9.0],
        epsilon = 1e-10
    );
    assert_abs_diff_eq!(fit.coefficient("groupA").unwrap().estimate.unwrap(), -4.0, epsilon = 1e-10);
    assert_eq!(fit.df_residual(), 4);
    assert!(fit.covariance(2, 2).unwrap().is_none());
    assert!(fit.covariance(0, 1).unwrap().is_some());
}

#[test]
fn test_rank_deficiency_policy_fail() {
    let data = two_group_data();
    let config = LinearConfig {
        rank_deficiency: RankDeficiencyPolicy::Fail,
        ..LinearConfig::default()
    };
    let result = LinearRegression::parse("y ~ group")
        .unwrap()
        .coding("group", Coding::Indicator)
        .config(config)
        .fit(&data);

    match result {
        Err(ModelError::RankDeficient { rank, ncols, aliased }) => {
            assert_eq!((rank, ncols), (2, 3));
            assert_eq!(aliased, vec!["groupB".to_string()]);
        }
        other => panic!("expected rank deficiency, got {other:?}"),
    }
}

// ==================== Invariances ====================

#[test]
fn test_reference_level_does_not_change_fit() {
    let data = noisy_data();
    let formula = Formula::new("y").main("x").main("g");

    let by_a = LinearRegression::new(formula.clone()).fit(&data).unwrap();
    let by_c = LinearRegression::new(formula).reference("g", "c").fit(&data).unwrap();

    assert_eq!(by_c.column_names(), vec!["(Intercept)", "x", "ga", "gb"]);
    assert_abs_diff_eq!(by_a.fitted_values().clone(), by_c.fitted_values().clone(), epsilon = 1e-9);
    assert_abs_diff_eq!(by_a.rss(), by_c.rss(), epsilon = 1e-9);
    assert_abs_diff_eq!(
        by_a.coefficient("x").unwrap().estimate.unwrap(),
        by_c.coefficient("x").unwrap().estimate.unwrap(),
        epsilon = 1e-10
    );

    // gc under reference a equals -ga under reference c
    assert_abs_diff_eq!(
        by_a.coefficient("gc").unwrap().estimate.unwrap(),
        -by_c.coefficient("ga").unwrap().estimate.unwrap(),
        epsilon = 1e-9
    );
}

#[test]
fn test_no_intercept_all_levels_matches_intercept_fit() {
    let data = noisy_data();
    let with = lm("y ~ g + x", &data).unwrap();
    let without = lm("y ~ 0 + g + x", &data).unwrap();

    assert_eq!(without.column_names(), vec!["ga", "gb", "gc", "x"]);
    assert_eq!(with.rank(), without.rank());
    assert_abs_diff_eq!(with.fitted_values().clone(), without.fitted_values().clone(), epsilon = 1e-9);
    assert_abs_diff_eq!(with.rss(), without.rss(), epsilon = 1e-9);

    // Level coefficients are the per-level intercepts
    let intercept = with.coefficient("(Intercept)").unwrap().estimate.unwrap();
    let gb = with.coefficient("gb").unwrap().estimate.unwrap();
    assert_abs_diff_eq!(without.coefficient("ga").unwrap().estimate.unwrap(), intercept, epsilon = 1e-9);
    assert_abs_diff_eq!(
        without.coefficient("gb").unwrap().estimate.unwrap(),
        intercept + gb,
        epsilon = 1e-9
    );
}

#[test]
fn test_centering_invariants() {
    let data = noisy_data();
    let (centered, record) = data.center("x").unwrap();

    let raw = lm("y ~ x * h", &data).unwrap();
    let cen = lm("y ~ x * h", &centered).unwrap();
    let est = |fit: &crate::lm::FittedModel, name: &str| fit.coefficient(name).unwrap().estimate.unwrap();

    assert_abs_diff_eq!(raw.fitted_values().clone(), cen.fitted_values().clone(), epsilon = 1e-9);
    assert_abs_diff_eq!(raw.rss(), cen.rss(), epsilon = 1e-9);
    assert_abs_diff_eq!(est(&raw, "x"), est(&cen, "x"), epsilon = 1e-9);
    assert_abs_diff_eq!(est(&raw, "x:hv"), est(&cen, "x:hv"), epsilon = 1e-9);
    assert_abs_diff_eq!(
        est(&cen, "(Intercept)"),
        est(&raw, "(Intercept)") + record.mean * est(&raw, "x"),
        epsilon = 1e-9
    );
}

// ==================== Inference ====================

#[test]
fn test_confidence_intervals() {
    let data = noisy_data();
    let fit = lm("y ~ x + h", &data).unwrap();

    let x = fit.coefficient("x").unwrap();
    let (lo, hi) = (x.ci_lower.unwrap(), x.ci_upper.unwrap());
    assert!(lo < x.estimate.unwrap() && x.estimate.unwrap() < hi);
    assert!(x.p_value.unwrap() < 1e-6);

    let narrow = fit.confint(0.95).unwrap();
    let wide = fit.confint(0.99).unwrap();
    let (nlo, nhi) = narrow[1].1.unwrap();
    let (wlo, whi) = wide[1].1.unwrap();
    assert_eq!(narrow[1].0, "x");
    assert_abs_diff_eq!(nlo, lo, epsilon = 1e-12);
    assert_abs_diff_eq!(nhi, hi, epsilon = 1e-12);
    assert!(wlo < nlo && nhi < whi);
    assert!(matches!(fit.confint(1.0), Err(ModelError::InvalidConfig { .. })));
}

#[test]
fn test_model_statistics() {
    let data = noisy_data();
    let fit = lm("y ~ x + g", &data).unwrap();
    let stats = fit.statistics();

    let n = fit.n_obs() as f64;
    let r2 = 1.0 - fit.rss() / fit.tss();
    assert_abs_diff_eq!(stats.r_squared.unwrap(), r2, epsilon = 1e-12);
    assert_abs_diff_eq!(
        stats.adj_r_squared.unwrap(),
        1.0 - (1.0 - r2) * (n - 1.0) / (n - 4.0),
        epsilon = 1e-12
    );
    assert_eq!(stats.df_model, 3);
    assert_eq!(stats.df_residual, 32);

    let ll = stats.log_likelihood.unwrap();
    assert_abs_diff_eq!(stats.aic.unwrap(), -2.0 * ll + 10.0, epsilon = 1e-9);
    assert_abs_diff_eq!(stats.bic.unwrap(), -2.0 * ll + 5.0 * n.ln(), epsilon = 1e-9);
}

#[test]
fn test_saturated_fit_has_no_inference() {
    let data = Dataset::builder()
        .numeric("y", vec![1.0, 4.0, 2.0])
        .unwrap()
        .categorical("g", &["a", "b", "c"])
        .unwrap()
        .build();
    let fit = lm("y ~ g", &data).unwrap();

    assert_eq!(fit.df_residual(), 0);
    assert_abs_diff_eq!(fit.coefficient("gb").unwrap().estimate.unwrap(), 3.0, epsilon = 1e-10);
    assert!(fit.coefficients().iter().all(|c| c.std_error.is_none() && c.p_value.is_none()));
    assert!(matches!(fit.sigma2(), Err(ModelError::Distributional { .. })));
    assert!(matches!(fit.confint(0.95), Err(ModelError::Distributional { .. })));
    assert!(fit.statistics().f_statistic.is_none());
}

// ==================== Failures ====================

#[test]
fn test_invalid_inputs() {
    let data = two_group_data();

    assert!(matches!(
        lm("y ~ nope", &data),
        Err(ModelError::Config(ConfigError::UnknownVariable { ref name, .. })) if name == "nope"
    ));
    assert!(matches!(lm("y ~ group +", &data), Err(ModelError::Config(ConfigError::Syntax { .. }))));

    let formula = Formula::new("y").main("group");
    let design = DesignMatrixBuilder::new(&data, &formula).build().unwrap();
    let solver = LeastSquaresSolver::default();
    assert!(matches!(
        solver.fit(&design, &array![1.0, 2.0]),
        Err(ModelError::DimensionMismatch { .. })
    ));
    assert!(matches!(
        solver.fit(&design, &array![1.0, 2.0, f64::NAN, 4.0, 5.0, 6.0]),
        Err(ModelError::NumericalError { .. })
    ));

    let data = Dataset::builder()
        .numeric("y", vec![1.0, 2.0, 3.0, 4.0])
        .unwrap()
        .numeric("x", vec![1.0, f64::INFINITY, 3.0, 4.0])
        .unwrap()
        .build();
    match lm("y ~ x", &data) {
        Err(ModelError::NumericalError { message, operation }) => {
            assert_eq!(operation, "design");
            assert!(message.contains("'x'") && message.contains("row 1"));
        }
        other => panic!("expected a numerical error, got {other:?}"),
    }
}

#[test]
fn test_ill_conditioned_design_is_rejected() {
    // z is x plus a perturbation of order 1e-5
    let x = vec![1.0, 2.0, 3.0, 4.0, 5.0, 7.0];
    let z: Vec<f64> = x
        .iter()
        .enumerate()
        .map(|(i, v)| v + if i % 2 == 0 { 1e-5 } else { -1e-5 })
        .collect();
    let data = Dataset::builder()
        .numeric("y", vec![1.0, 3.0, 2.0, 5.0, 4.0, 6.0])
        .unwrap()
        .numeric("x", x)
        .unwrap()
        .numeric("z", z)
        .unwrap()
        .build();
    let config = LinearConfig {
        max_condition: 1e4,
        ..LinearConfig::default()
    };

    let result = LinearRegression::parse("y ~ x + z").unwrap().config(config).fit(&data);
    assert!(matches!(result, Err(ModelError::NumericalError { .. })));
    assert!(lm("y ~ x + z", &data).is_ok());
}

#[test]
fn test_predictor_units_do_not_affect_conditioning() {
    let data = noisy_data();
    let base = lm("y ~ x + g", &data).unwrap();

    for scale in [1e11, 1e-11] {
        let x = data.numeric("x").unwrap().mapv(|v| v * scale);
        let scaled = data.replace_column("x", Column::numeric(x)).unwrap();
        let fit = lm("y ~ x + g", &scaled).unwrap();

        assert_eq!(fit.rank(), base.rank());
        assert_abs_diff_eq!(fit.fitted_values().clone(), base.fitted_values().clone(), epsilon = 1e-8);
        assert_abs_diff_eq!(fit.rss(), base.rss(), epsilon = 1e-8);
        assert_abs_diff_eq!(
            fit.coefficient("x").unwrap().estimate.unwrap() * scale,
            base.coefficient("x").unwrap().estimate.unwrap(),
            epsilon = 1e-8
        );
    }
}
