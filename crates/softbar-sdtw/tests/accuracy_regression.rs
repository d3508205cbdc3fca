//! Accuracy regression tests for softbar-sdtw.
//!
//! These tests check the analytic gradient against finite differences, the
//! algebraic properties of the batch objective, and a few hand-checked
//! reference scenarios.

use proptest::prelude::*;
use softbar_sdtw::{
    MultiSeries, MultiSeriesView, SdtwCentroidConfig, SeriesBatch, SoftDtwBarycenter, TimeSeries,
    TimeSeriesView, Workspace, soft_dtw,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ts(values: Vec<f64>) -> TimeSeries {
    TimeSeries::new(values).expect("valid test series")
}

/// Central finite-difference gradient of the univariate batch objective.
fn numeric_gradient(centroid: &[f64], series: &[TimeSeries], weights: &[f64], gamma: f64) -> Vec<f64> {
    let sdtw = SoftDtwBarycenter::new(gamma).unwrap();
    let h = 1e-5;
    (0..centroid.len())
        .map(|i| {
            let mut plus = centroid.to_vec();
            let mut minus = centroid.to_vec();
            plus[i] += h;
            minus[i] -= h;
            let fp = sdtw.loss(&ts(plus), series, Some(weights)).unwrap().objective;
            let fm = sdtw.loss(&ts(minus), series, Some(weights)).unwrap().objective;
            (fp - fm) / (2.0 * h)
        })
        .collect()
}

fn assert_close(analytic: &[f64], numeric: &[f64], context: &str) {
    assert_eq!(analytic.len(), numeric.len(), "{context}: length");
    for (k, (a, n)) in analytic.iter().zip(numeric).enumerate() {
        let tol = 1e-4 * a.abs().max(1.0);
        assert!(
            (a - n).abs() <= tol,
            "{context}: coordinate {k}: analytic {a:.10} vs numeric {n:.10}"
        );
    }
}

// ---------------------------------------------------------------------------
// a) gradient_matches_finite_differences
// ---------------------------------------------------------------------------

#[test]
fn gradient_matches_finite_differences_univariate() {
    let centroid = vec![0.3, -1.2, 2.0, 0.7];
    let series = vec![
        ts(vec![0.0, -1.0, 1.5]),
        ts(vec![1.0, 0.5, 2.5, 0.0, -0.5]),
        ts(vec![0.2]),
    ];
    let weights = [0.5, 1.5, 0.25];

    for gamma in [0.1, 1.0, 5.0] {
        let loss = SoftDtwBarycenter::new(gamma)
            .unwrap()
            .loss(&ts(centroid.clone()), &series, Some(&weights[..]))
            .unwrap();
        let numeric = numeric_gradient(&centroid, &series, &weights, gamma);
        assert_close(loss.gradient.as_slice(), &numeric, &format!("gamma={gamma}"));
    }
}

#[test]
fn gradient_matches_finite_differences_multivariate() {
    let gamma = 0.7;
    let centroid = vec![0.0, 1.0, 1.0, -0.5, 2.0, 0.0];
    let series = vec![
        MultiSeries::new(vec![0.5, 0.5, 1.5, 0.0], 2).unwrap(),
        MultiSeries::new(vec![-1.0, 1.0, 0.0, 0.0, 2.0, 1.0, 2.5, -0.5], 2).unwrap(),
    ];
    let weights = [1.0, 0.4];
    let sdtw = SoftDtwBarycenter::new(gamma).unwrap();
    let objective = |c: &[f64]| {
        let c = MultiSeries::new(c.to_vec(), 2).unwrap();
        sdtw.loss(&c, &series, Some(&weights[..])).unwrap().objective
    };

    let analytic = sdtw
        .loss(&MultiSeries::new(centroid.clone(), 2).unwrap(), &series, Some(&weights[..]))
        .unwrap();
    let h = 1e-5;
    let numeric: Vec<f64> = (0..centroid.len())
        .map(|k| {
            let mut plus = centroid.clone();
            let mut minus = centroid.clone();
            plus[k] += h;
            minus[k] -= h;
            (objective(&plus) - objective(&minus)) / (2.0 * h)
        })
        .collect();
    assert_close(analytic.gradient.as_slice(), &numeric, "multivariate");
    assert_eq!(analytic.gradient.row(2).len(), 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn gradient_matches_finite_differences_random(
        gamma in 0.1f64..2.0,
        centroid in prop::collection::vec(-2.0f64..2.0, 1..6),
        a in prop::collection::vec(-2.0f64..2.0, 1..6),
        b in prop::collection::vec(-2.0f64..2.0, 1..6),
        w in 0.1f64..2.0,
    ) {
        let series = vec![ts(a), ts(b)];
        let weights = [w, 1.0];
        let loss = SoftDtwBarycenter::new(gamma)
            .unwrap()
            .loss(&ts(centroid.clone()), &series, Some(&weights[..]))
            .unwrap();
        let numeric = numeric_gradient(&centroid, &series, &weights, gamma);
        for (a, n) in loss.gradient.as_slice().iter().zip(&numeric) {
            prop_assert!((a - n).abs() <= 1e-4 * a.abs().max(1.0), "analytic {} vs numeric {}", a, n);
        }
    }
}

// ---------------------------------------------------------------------------
// b) weighted_additivity
// ---------------------------------------------------------------------------

#[test]
fn batch_equals_weighted_sum_of_single_series() {
    let centroid = ts(vec![1.0, 0.0, 2.0]);
    let s1 = ts(vec![0.0, 1.0, 1.0, 3.0]);
    let s2 = ts(vec![2.0, 2.0]);
    let (w1, w2) = (0.3, 1.7);
    let sdtw = SoftDtwBarycenter::new(0.5).unwrap();

    let both = sdtw
        .loss(&centroid, &[s1.clone(), s2.clone()], Some(&[w1, w2][..]))
        .unwrap();
    let r1 = sdtw.loss(&centroid, &[s1], None).unwrap();
    let r2 = sdtw.loss(&centroid, &[s2], None).unwrap();

    assert!((both.objective - (w1 * r1.objective + w2 * r2.objective)).abs() < 1e-12);
    for i in 0..3 {
        let expected = w1 * r1.gradient.as_slice()[i] + w2 * r2.gradient.as_slice()[i];
        assert!((both.gradient.as_slice()[i] - expected).abs() < 1e-12);
    }
}

// ---------------------------------------------------------------------------
// c) workspace_reuse
// ---------------------------------------------------------------------------

#[test]
fn reused_workspace_is_bit_identical() {
    let centroid = ts(vec![0.5, 1.5, -0.5]);
    let series = [ts(vec![0.0, 1.0, 2.0, 1.0, 0.0]), ts(vec![1.0, -1.0])];
    let sdtw = SoftDtwBarycenter::new(0.8).unwrap();
    let mut ws = Workspace::new(3, 5);

    let first = sdtw.loss_with(&centroid, &series, None, &mut ws).unwrap();
    let second = sdtw.loss_with(&centroid, &series, None, &mut ws).unwrap();

    assert_eq!(first.objective.to_bits(), second.objective.to_bits());
    let bits = |g: &[f64]| g.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(first.gradient.as_slice()), bits(second.gradient.as_slice()));
}

#[test]
fn long_then_short_matches_fresh_workspace() {
    let centroid = ts(vec![1.0, 2.0, 0.0, 1.0]);
    let long = ts(vec![3.0, 2.0, 1.0, 0.0, -1.0, -2.0, 0.0, 1.0]);
    let short = ts(vec![1.0, 0.5]);
    let sdtw = SoftDtwBarycenter::new(0.3).unwrap();

    let mut shared = Workspace::new(4, 8);
    let _ = sdtw.loss_with(&centroid, &[long], None, &mut shared).unwrap();
    let reused = sdtw.loss_with(&centroid, &[short.clone()], None, &mut shared).unwrap();

    let mut fresh = Workspace::new(4, 2);
    let expected = sdtw.loss_with(&centroid, &[short], None, &mut fresh).unwrap();
    assert_eq!(reused, expected);
}

// ---------------------------------------------------------------------------
// d) shape_equivalence
// ---------------------------------------------------------------------------

#[test]
fn vector_mode_with_dim_one_equals_scalar_mode() {
    let c = [1.0, -0.5, 2.0, 0.0];
    let a = [0.0, 1.0, 2.0];
    let b = [2.0, 2.0, 0.0, -1.0, 1.0];
    let sdtw = SoftDtwBarycenter::new(0.6).unwrap();

    let uni_series = [TimeSeriesView::new(&a).unwrap(), TimeSeriesView::new(&b).unwrap()];
    let multi_series = [
        MultiSeriesView::new(&a, 1).unwrap(),
        MultiSeriesView::new(&b, 1).unwrap(),
    ];
    let uni = sdtw
        .evaluate(
            SeriesBatch::Univariate {
                centroid: TimeSeriesView::new(&c).unwrap(),
                series: &uni_series,
            },
            None,
        )
        .unwrap();
    let multi = sdtw
        .evaluate(
            SeriesBatch::Multivariate {
                centroid: MultiSeriesView::new(&c, 1).unwrap(),
                series: &multi_series,
            },
            None,
        )
        .unwrap();

    assert!((uni.objective - multi.objective).abs() < 1e-12);
    for (u, m) in uni.gradient.as_slice().iter().zip(multi.gradient.as_slice()) {
        assert!((u - m).abs() < 1e-12);
    }
}

// ---------------------------------------------------------------------------
// e) reference_scenarios
// ---------------------------------------------------------------------------

/// Identical centroid and series with small gamma: objective and gradient vanish.
#[test]
fn scenario_identical_series() {
    let centroid = ts(vec![1.0, 2.0, 3.0]);
    let loss = SoftDtwBarycenter::new(0.01)
        .unwrap()
        .loss(&centroid, &[ts(vec![1.0, 2.0, 3.0])], Some(&[1.0][..]))
        .unwrap();
    assert!(loss.objective.abs() < 1e-6, "objective = {}", loss.objective);
    for &g in loss.gradient.as_slice() {
        assert!(g.abs() < 1e-6, "gradient = {g}");
    }
}

/// Constant offset: gradient is negative and tends to the hard-alignment
/// value `-10` per point from below as gamma shrinks.
#[test]
fn scenario_constant_offset() {
    let centroid = ts(vec![0.0, 0.0]);
    let series = [ts(vec![5.0, 5.0])];
    let gradient_at = |gamma: f64| {
        SoftDtwBarycenter::new(gamma)
            .unwrap()
            .loss(&centroid, &series, Some(&[1.0][..]))
            .unwrap()
            .gradient
            .into_inner()
    };

    let g10 = gradient_at(10.0);
    let g1 = gradient_at(1.0);
    let g_small = gradient_at(0.01);

    for g in [&g10, &g1, &g_small] {
        assert!(g.iter().all(|&v| v < 0.0), "gradient not negative: {g:?}");
    }
    // Two three-cell paths have weight e^-2.5 / (1 + 2 e^-2.5) at gamma = 10.
    let p = (-2.5f64).exp() / (1.0 + 2.0 * (-2.5f64).exp());
    assert!((g10[0] - (-10.0 * (1.0 + p))).abs() < 1e-9, "g10 = {g10:?}");
    assert!(g10[0].abs() > g1[0].abs());
    assert!(g1[0] <= -10.0 + 1e-9);
    for &v in &g_small {
        assert!((v + 10.0).abs() < 1e-6, "g(0.01) = {v}");
    }
}

/// Mirrored series around a flat centroid.
#[test]
fn scenario_mirrored_pair() {
    let centroid = ts(vec![2.0, 2.0, 2.0]);
    let up = ts(vec![1.0, 2.0, 3.0]);
    let down = ts(vec![3.0, 2.0, 1.0]);
    let sdtw = SoftDtwBarycenter::new(1.0).unwrap();

    let both = sdtw
        .loss(&centroid, &[up.clone(), down.clone()], Some(&[0.5, 0.5][..]))
        .unwrap();
    let r_up = sdtw.loss(&centroid, &[up], None).unwrap();
    let r_down = sdtw.loss(&centroid, &[down], None).unwrap();

    let expected = 0.5 * r_up.objective + 0.5 * r_down.objective;
    assert!((both.objective - expected).abs() < 1e-12);
    for i in 0..3 {
        let g = 0.5 * r_up.gradient.as_slice()[i] + 0.5 * r_down.gradient.as_slice()[i];
        assert!((both.gradient.as_slice()[i] - g).abs() < 1e-12);
    }
    // Reflecting values around 2 swaps the two series and fixes the centroid,
    // so the pulls cancel.
    for &g in both.gradient.as_slice() {
        assert!(g.abs() < 1e-12, "gradient = {g}");
    }
}

// ---------------------------------------------------------------------------
// f) centroid_refinement
// ---------------------------------------------------------------------------

#[test]
fn refinement_lowers_objective_against_random_start() {
    let series = [
        ts(vec![0.0, 1.0, 2.0, 1.0, 0.0]),
        ts(vec![0.0, 0.0, 1.0, 2.0, 1.0, 0.0]),
        ts(vec![0.0, 2.0, 1.0, 0.0]),
    ];
    let views: Vec<_> = series.iter().map(TimeSeries::as_view).collect();
    let config = SdtwCentroidConfig::new(1.0).with_max_iter(50);
    let result = config.average(&views, None).unwrap();

    let start = series
        .iter()
        .map(|c| SoftDtwBarycenter::new(1.0).unwrap().loss(c, &series, None).unwrap().objective)
        .fold(f64::NEG_INFINITY, f64::max);
    // Random init starts from one of the series, so it can only improve on the worst of them.
    assert!(result.objective <= start + 1e-9);
    assert!(result.iterations >= 1);

    let direct: f64 = series
        .iter()
        .map(|s| soft_dtw(&result.centroid, s, 1.0).unwrap())
        .sum();
    assert!((direct - result.objective).abs() < 1e-9);
}
