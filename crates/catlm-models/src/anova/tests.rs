//! Tests for sequential and drop-one analysis of variance

use approx::assert_abs_diff_eq;
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

use crate::anova::{AnovaDecomposer, TermSignificanceTester, compare_nested};
use crate::base::ModelError;
use crate::lm::{FittedModel, LinearConfig, LinearRegression, lm};
use catlm_core::{Dataset, Formula, Term};

fn noisy_data(seed: u64) -> Dataset {
    let n = 40;
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).unwrap();
    let shift = [0.0, 0.7, -0.4, 1.1];

    let mut x = Vec::with_capacity(n);
    let mut z = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    let mut g = Vec::with_capacity(n);
    let mut h = Vec::with_capacity(n);
    for i in 0..n {
        let xi = (i as f64 * 0.37).sin() * 3.0;
        // Correlated with x
        let zi = 0.8 * xi + noise.sample(&mut rng) * 0.5;
        let gi = i % 4;
        let hv = if (i / 4) % 2 == 1 { 1.0 } else { 0.0 };
        x.push(xi);
        z.push(zi);
        g.push(["p", "q", "r", "s"][gi]);
        h.push(if hv > 0.0 { "on" } else { "off" });
        y.push(2.0 + 0.5 * xi + 0.4 * zi + shift[gi] + 0.9 * hv + noise.sample(&mut rng));
    }

    Dataset::builder()
        .numeric("y", y)
        .unwrap()
        .numeric("x", x)
        .unwrap()
        .numeric("z", z)
        .unwrap()
        .categorical("g", &g)
        .unwrap()
        .categorical("h", &h)
        .unwrap()
        .build()
}

fn permutations(k: usize) -> Vec<Vec<usize>> {
    if k == 0 {
        return vec![Vec::new()];
    }
    let mut out = Vec::new();
    for perm in permutations(k - 1) {
        for pos in 0..=perm.len() {
            let mut next = perm.clone();
            next.insert(pos, k - 1);
            out.push(next);
        }
    }
    out
}

fn fit(formula: &Formula, data: &Dataset) -> FittedModel {
    LinearRegression::new(formula.clone()).fit(data).unwrap()
}

// ==================== Sequential ====================

#[test]
fn test_sum_of_squares_identity_for_every_order() {
    let data = noisy_data(11);
    let formula = Formula::new("y").main("x").main("g").main("h").interaction(&["x", "h"]);
    let decomposer = AnovaDecomposer::default();

    let orders = permutations(formula.effects().len());
    assert_eq!(orders.len(), 24);
    for order in orders {
        let reordered = formula.with_effect_order(&order).unwrap();
        let full = fit(&reordered, &data);
        let table = decomposer.decompose(&data, &full).unwrap();

        assert_eq!(table.rows.len(), 4);
        assert_abs_diff_eq!(table.total_sum_sq, full.tss(), epsilon = 1e-9);
        assert_abs_diff_eq!(
            table.term_sum_sq() + table.residual.sum_sq,
            table.total_sum_sq,
            epsilon = 1e-8
        );
        assert_eq!(
            table.rows.iter().map(|r| r.df).sum::<usize>() + 1,
            full.rank()
        );
    }
}

#[test]
fn test_correlated_terms_ordering() {
    let data = noisy_data(3);
    let xz = fit(&Formula::new("y").main("x").main("z"), &data);
    let zx = fit(&Formula::new("y").main("z").main("x"), &data);

    let decomposer = AnovaDecomposer::new(LinearConfig::default());
    let a = decomposer.decompose(&data, &xz).unwrap();
    let b = decomposer.decompose(&data, &zx).unwrap();

    let x = Term::main("x");
    assert!((a.row(&x).unwrap().sum_sq - b.row(&x).unwrap().sum_sq).abs() > 1e-3);
    assert_abs_diff_eq!(xz.rss(), zx.rss(), epsilon = 1e-9);
    assert_eq!(xz.rank(), zx.rank());
    assert_abs_diff_eq!(xz.r_squared().unwrap(), zx.r_squared().unwrap(), epsilon = 1e-12);
}

#[test]
fn test_last_term_f_matches_coefficient_t() {
    let data = noisy_data(5);
    let full = lm("y ~ g + x + z", &data).unwrap();
    let table = AnovaDecomposer::default().decompose(&data, &full).unwrap();

    let z = full.coefficient("z").unwrap();
    let row = table.row(&Term::main("z")).unwrap();
    assert_eq!(row.df, 1);
    assert_abs_diff_eq!(row.f_statistic.unwrap(), z.t_stat.unwrap().powi(2), epsilon = 1e-8);
    assert_abs_diff_eq!(row.p_value.unwrap(), z.p_value.unwrap(), epsilon = 1e-8);

    let covers_zero = z.ci_lower.unwrap() <= 0.0 && 0.0 <= z.ci_upper.unwrap();
    assert_eq!(covers_zero, row.p_value.unwrap() > 0.05);
}

#[test]
fn test_interaction_ci_agrees_with_sequential_p() {
    for seed in 0..6 {
        let data = noisy_data(seed);
        let full = lm("y ~ x * h", &data).unwrap();
        let table = AnovaDecomposer::default().decompose(&data, &full).unwrap();

        let coef = full.coefficient("x:hon").unwrap();
        let row = table.row(&Term::interaction(&["h", "x"])).unwrap();
        let covers_zero = coef.ci_lower.unwrap() <= 0.0 && 0.0 <= coef.ci_upper.unwrap();
        if covers_zero {
            assert!(row.p_value.unwrap() > 0.05);
        } else {
            assert!(row.p_value.unwrap() <= 0.05);
        }
    }
}

#[test]
fn test_no_intercept_decomposes_uncentered_total() {
    let data = noisy_data(8);
    let full = lm("y ~ 0 + g + x", &data).unwrap();
    let table = AnovaDecomposer::default().decompose(&data, &full).unwrap();

    let y = data.numeric("y").unwrap();
    assert_abs_diff_eq!(table.total_sum_sq, y.dot(y), epsilon = 1e-8);
    assert_eq!(table.rows[0].df, 4);
    assert_abs_diff_eq!(
        table.term_sum_sq() + table.residual.sum_sq,
        y.dot(y),
        epsilon = 1e-8
    );
}

#[test]
fn test_parallel_and_sequential_agree() {
    let data = noisy_data(2);
    let full = lm("y ~ x * g + h", &data).unwrap();
    let serial = LinearConfig {
        parallel: false,
        ..LinearConfig::default()
    };

    assert_eq!(
        AnovaDecomposer::new(serial.clone()).decompose(&data, &full).unwrap(),
        AnovaDecomposer::default().decompose(&data, &full).unwrap()
    );
    assert_eq!(
        TermSignificanceTester::new(serial).test(&data, &full).unwrap(),
        TermSignificanceTester::default().test(&data, &full).unwrap()
    );
}

// ==================== Drop-one ====================

#[test]
fn test_drop_one_is_order_independent() {
    let data = noisy_data(13);
    let tester = TermSignificanceTester::default();
    let a = tester.test(&data, &lm("y ~ x + g + h", &data).unwrap()).unwrap();
    let b = tester.test(&data, &lm("y ~ h + x + g", &data).unwrap()).unwrap();

    for row in &a.rows {
        let other = b.row(&row.term).unwrap();
        assert_eq!(row.df, other.df);
        assert_abs_diff_eq!(row.sum_sq, other.sum_sq, epsilon = 1e-9);
        assert_abs_diff_eq!(row.f_statistic.unwrap(), other.f_statistic.unwrap(), epsilon = 1e-8);
        assert_abs_diff_eq!(row.aic, other.aic, epsilon = 1e-9);
    }
    assert_eq!(a.rows[1].term, Term::main("g"));
    assert_eq!(a.rows[1].df, 3);
}

#[test]
fn test_drop_one_matches_last_sequential_term() {
    let data = noisy_data(21);
    let full = lm("y ~ x + z + g", &data).unwrap();
    let sequential = AnovaDecomposer::default().decompose(&data, &full).unwrap();
    let drop1 = TermSignificanceTester::default().test(&data, &full).unwrap();

    let g = Term::main("g");
    let (s, d) = (sequential.row(&g).unwrap(), drop1.row(&g).unwrap());
    assert_eq!(s.df, d.df);
    assert_abs_diff_eq!(s.sum_sq, d.sum_sq, epsilon = 1e-9);
    assert_abs_diff_eq!(s.p_value.unwrap(), d.p_value.unwrap(), epsilon = 1e-10);
    assert_abs_diff_eq!(d.rss, full.rss() + d.sum_sq, epsilon = 1e-9);

    let n = full.n_obs() as f64;
    assert_abs_diff_eq!(drop1.aic, n * (full.rss() / n).ln() + 2.0 * full.rank() as f64, epsilon = 1e-9);
}

#[test]
fn test_marginal_term_removes_no_rank() {
    let data = noisy_data(4);
    let full = lm("y ~ g * h", &data).unwrap();
    let table = TermSignificanceTester::default().test(&data, &full).unwrap();

    let g = table.row(&Term::main("g")).unwrap();
    assert_eq!(g.df, 0);
    assert!(g.f_statistic.is_none());
    assert!(g.p_value.is_none());

    let gh = table.row(&Term::interaction(&["g", "h"])).unwrap();
    assert_eq!(gh.df, 3);
    assert!(gh.f_statistic.is_some());
}

// ==================== Comparisons ====================

#[test]
fn test_compare_nested() {
    let data = noisy_data(9);
    let null = lm("y ~ 1", &data).unwrap();
    let full = lm("y ~ x + g", &data).unwrap();

    let comparison = compare_nested(&null, &full).unwrap();
    assert_eq!(comparison.df, 4);
    assert_abs_diff_eq!(
        comparison.f_statistic.unwrap(),
        full.statistics().f_statistic.unwrap(),
        epsilon = 1e-8
    );
    assert_abs_diff_eq!(comparison.rss_reduced, full.tss(), epsilon = 1e-9);

    assert!(matches!(compare_nested(&full, &null), Err(ModelError::NotNested { .. })));
}

#[test]
fn test_saturated_model_has_no_significance() {
    let data = Dataset::builder()
        .numeric("y", vec![1.0, 4.0, 2.0, 3.0])
        .unwrap()
        .categorical("g", &["a", "b", "c", "d"])
        .unwrap()
        .build();
    let full = lm("y ~ g", &data).unwrap();

    assert!(matches!(
        AnovaDecomposer::default().decompose(&data, &full),
        Err(ModelError::Distributional { .. })
    ));
    assert!(matches!(
        TermSignificanceTester::default().test(&data, &full),
        Err(ModelError::Distributional { .. })
    ));
}
