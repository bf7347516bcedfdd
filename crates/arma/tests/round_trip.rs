//! Parameter-recovery integration tests for kairos-arma.

use approx::assert_abs_diff_eq;
use kairos_arma::{
    ArmaError, ArmaEstimator, ArmaSpec, FitOptions, GradientMode, ModelConfig, Solver,
};
use kairos_sim::ArmaSim;

fn opts() -> FitOptions {
    FitOptions::new().with_max_iter(500)
}

fn fit(p: usize, q: usize, use_intercept: bool, data: &[f64]) -> ArmaEstimator {
    let mut est = ArmaEstimator::new(ArmaSpec::new(p, q, use_intercept).unwrap());
    est.fit(data, &opts()).unwrap();
    est
}

#[test]
fn ar1_known_answer() {
    let data = ArmaSim::ar(vec![0.5], 0.0, 1.0, 42).unwrap().sample_n(1000);
    let est = fit(1, 0, true, &data);

    let phi = est.ar().unwrap()[0];
    let sigma = est.sigma().unwrap();
    assert!((phi - 0.5).abs() < 0.1, "phi = {phi}");
    assert!((sigma - 1.0).abs() < 0.2, "sigma = {sigma}");
    assert_eq!(est.latent(), None);
}

#[test]
fn ma1_recovery() {
    let data = ArmaSim::ma(vec![0.6], 0.0, 1.0, 7).unwrap().sample_n(2000);
    let est = fit(0, 1, false, &data);

    let theta = est.ma().unwrap()[0];
    assert!((theta - 0.6).abs() < 0.1, "theta = {theta}");
    assert!((est.sigma().unwrap() - 1.0).abs() < 0.1);
}

#[test]
fn arma11_recovery() {
    let data = ArmaSim::new(vec![0.5], vec![0.3], 0.0, 1.0, 11)
        .unwrap()
        .sample_n(3000);
    let est = fit(1, 1, true, &data);

    let phi = est.ar().unwrap()[0];
    let theta = est.ma().unwrap()[0];
    assert!((phi - 0.5).abs() < 0.15, "phi = {phi}");
    assert!((theta - 0.3).abs() < 0.15, "theta = {theta}");
    assert!(est.intercept().unwrap().abs() < 0.2);
}

#[test]
fn intercept_recovery() {
    let data = ArmaSim::ar(vec![0.5], 2.0, 1.0, 5).unwrap().sample_n(2000);
    let est = fit(1, 0, true, &data);

    let c = est.intercept().unwrap();
    assert!((c - 2.0).abs() < 0.3, "intercept = {c}");
    assert!((est.ar().unwrap()[0] - 0.5).abs() < 0.1);
}

#[test]
fn fixed_intercept_reports_zero() {
    let data = ArmaSim::ar(vec![0.4], 0.0, 1.0, 3).unwrap().sample_n(500);
    let a = fit(1, 1, false, &data);
    let b = fit(1, 1, false, &data);
    assert_eq!(a.intercept(), Some(0.0));
    assert_eq!(a.ar(), b.ar());
    assert_eq!(a.ma(), b.ma());
}

#[test]
fn ma3_latent_zero_prefix() {
    let data = ArmaSim::ma(vec![0.4, -0.2, 0.1], 0.0, 1.0, 21)
        .unwrap()
        .sample_n(800);
    let est = fit(0, 3, true, &data);

    let full = est.full_latent().unwrap();
    assert_eq!(full.len(), data.len() + 3);
    assert_eq!(&full[..3], &[0.0, 0.0, 0.0]);
    assert_eq!(est.latent().unwrap().len(), data.len());
}

#[test]
fn in_sample_predictions_reproduce_latent() {
    let data = ArmaSim::new(vec![0.6, -0.2], vec![0.3], 1.0, 1.0, 8)
        .unwrap()
        .sample_n(400);
    let (p, q) = (2, 1);
    let est = fit(p, q, true, &data);
    let full = est.full_latent().unwrap();

    for t in [p, p + 1, 50, 200, data.len() - 1] {
        let pred = est.predict(&data[..t], Some(&full[..q + t - p])).unwrap();
        assert_abs_diff_eq!(data[t] - pred, full[q + t - p], epsilon = 1e-9);
    }
}

#[test]
fn finite_difference_reaches_same_optimum() {
    let data = ArmaSim::new(vec![0.5], vec![0.2], 0.5, 1.0, 17)
        .unwrap()
        .sample_n(1500);
    let spec = ArmaSpec::new(1, 1, true).unwrap();

    let mut analytic = ArmaEstimator::new(spec);
    analytic.fit(&data, &opts()).unwrap();
    let mut numeric = ArmaEstimator::new(spec);
    numeric
        .fit(&data, &opts().with_gradient(GradientMode::FiniteDifference))
        .unwrap();

    assert_abs_diff_eq!(analytic.ar().unwrap()[0], numeric.ar().unwrap()[0], epsilon = 1e-3);
    assert_abs_diff_eq!(analytic.ma().unwrap()[0], numeric.ma().unwrap()[0], epsilon = 1e-3);
    assert_abs_diff_eq!(analytic.sigma().unwrap(), numeric.sigma().unwrap(), epsilon = 1e-3);
}

#[test]
fn nelder_mead_agrees_with_lbfgs() {
    let data = ArmaSim::ar(vec![0.5], 0.0, 1.0, 42).unwrap().sample_n(1000);
    let spec = ArmaSpec::new(1, 0, true).unwrap();

    let lbfgs = fit(1, 0, true, &data);
    let mut simplex = ArmaEstimator::new(spec);
    simplex
        .fit(
            &data,
            &FitOptions::new()
                .with_solver(Solver::NelderMead)
                .with_max_iter(5000)
                .with_tol_grad(1e-12),
        )
        .unwrap();

    assert_abs_diff_eq!(lbfgs.ar().unwrap()[0], simplex.ar().unwrap()[0], epsilon = 1e-2);
    assert_abs_diff_eq!(lbfgs.sigma().unwrap(), simplex.sigma().unwrap(), epsilon = 1e-2);
}

#[test]
fn warm_start_refit_stays_at_optimum() {
    let data = ArmaSim::ar(vec![0.3], 0.0, 1.0, 99).unwrap().sample_n(600);
    let mut est = ArmaEstimator::new(ArmaSpec::new(1, 1, true).unwrap());
    let first = est.fit(&data, &opts()).unwrap();
    let phi = est.ar().unwrap()[0];

    let second = est.fit(&data, &opts()).unwrap();
    assert_abs_diff_eq!(est.ar().unwrap()[0], phi, epsilon = 1e-4);
    assert_abs_diff_eq!(second.loss, first.loss, epsilon = 1e-8);
}

#[test]
fn constant_series_is_non_finite_likelihood() {
    // Zero residuals drive the noise scale towards zero until the loss breaks.
    let data = [2.0; 20];
    for gradient in [GradientMode::Analytic, GradientMode::FiniteDifference] {
        let mut est = ArmaEstimator::new(ArmaSpec::new(1, 0, true).unwrap());
        let err = est
            .fit(&data, &FitOptions::new().with_gradient(gradient))
            .unwrap_err();
        assert!(
            matches!(err, ArmaError::NonFiniteLikelihood { .. }),
            "{gradient:?}: {err}"
        );
        assert!(!est.is_fitted());
    }
}

#[test]
fn report_log_likelihood_and_aic() {
    let data = ArmaSim::ar(vec![0.5], 0.0, 1.0, 1).unwrap().sample_n(300);
    let mut est = ArmaEstimator::new(ArmaSpec::new(2, 0, true).unwrap());
    let report = est.fit(&data, &opts()).unwrap();

    assert_eq!(report.n_active, 298);
    assert!(report.loss.is_finite());
    assert_abs_diff_eq!(report.log_likelihood, -report.loss * 298.0, epsilon = 1e-9);
    // k = log_sigma + 2 AR + intercept
    assert_abs_diff_eq!(report.aic, 8.0 - 2.0 * report.log_likelihood, epsilon = 1e-9);
}

#[test]
fn model_config_builds_and_fits() {
    let cfg: ModelConfig = toml::from_str(
        r#"
        [model]
        p = 1
        q = 0

        [fit]
        max_iter = 300
        "#,
    )
    .unwrap();
    let data = ArmaSim::ar(vec![0.5], 0.0, 1.0, 42).unwrap().sample_n(1000);

    let mut est = cfg.build().unwrap();
    assert!(est.spec().use_intercept());
    est.fit(&data, &cfg.fit).unwrap();
    assert!((est.ar().unwrap()[0] - 0.5).abs() < 0.1);
}
