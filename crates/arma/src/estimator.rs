//! The ARMA estimator: validation, initial values, the optimizer call and
//! the committed fit.

use tracing::{debug, info, instrument, warn};

use crate::codec::{ArmaParams, Intercept, ParameterCodec};
use crate::error::ArmaError;
use crate::fit::FittedArma;
use crate::objective::ConditionalObjective;
use crate::optimizer::{ArgminMinimizer, Minimizer};
use crate::options::FitOptions;
use crate::spec::ArmaSpec;

/// Summary of a successful fit.
#[derive(Clone, Debug, PartialEq)]
pub struct FitReport {
    /// Mean negative log-likelihood per active latent error at the optimum.
    pub loss: f64,
    /// Conditional log-likelihood, `-loss * n_active`.
    pub log_likelihood: f64,
    /// Akaike Information Criterion, `2k - 2 * log_likelihood`.
    pub aic: f64,
    /// Optimizer iterations.
    pub iterations: u64,
    /// Number of active latent errors, `n - p`.
    pub n_active: usize,
}

impl FitReport {
    fn new(spec: &ArmaSpec, loss: f64, n_active: usize, iterations: u64) -> Self {
        let log_likelihood = -loss * n_active as f64;
        let k = spec.n_params() as f64;
        Self {
            loss,
            log_likelihood,
            aic: 2.0 * k - 2.0 * log_likelihood,
            iterations,
            n_active,
        }
    }
}

/// Conditional maximum-likelihood estimator for an ARMA(p,q) model.
///
/// The orders and intercept handling are fixed at construction. Each
/// successful [`fit`](Self::fit) replaces the stored parameters and latent
/// sequence; a failed fit leaves them untouched. A refit starts from the
/// previously fitted parameters.
///
/// # Example
///
/// ```
/// use kairos_arma::{ArmaEstimator, ArmaSpec, FitOptions};
///
/// let y: Vec<f64> = (0..200).map(|t| ((t * 37 % 101) as f64 / 50.0) - 1.0).collect();
/// let mut est = ArmaEstimator::new(ArmaSpec::new(1, 0, true)?);
/// let report = est.fit(&y, &FitOptions::default())?;
/// assert_eq!(report.n_active, 199);
/// let next = est.predict(&y, None)?;
/// assert!(next.is_finite());
/// # Ok::<(), kairos_arma::ArmaError>(())
/// ```
#[derive(Clone, Debug)]
pub struct ArmaEstimator {
    spec: ArmaSpec,
    codec: ParameterCodec,
    fitted: Option<FittedArma>,
    report: Option<FitReport>,
}

impl ArmaEstimator {
    /// Creates an unfitted estimator for `spec`.
    pub fn new(spec: ArmaSpec) -> Self {
        Self {
            spec,
            codec: ParameterCodec::new(&spec),
            fitted: None,
            report: None,
        }
    }

    /// Returns the model specification.
    pub fn spec(&self) -> ArmaSpec {
        self.spec
    }

    /// Returns the packed-vector layout.
    pub fn codec(&self) -> &ParameterCodec {
        &self.codec
    }

    /// Whether a fit has succeeded on this instance.
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Fits the model with the `argmin` backend.
    ///
    /// See [`fit_with`](Self::fit_with).
    pub fn fit(&mut self, observations: &[f64], options: &FitOptions) -> Result<FitReport, ArmaError> {
        self.fit_with(observations, options, &ArgminMinimizer)
    }

    /// Fits the model by minimising the conditional negative log-likelihood
    /// with `minimizer`.
    ///
    /// Cold start: `phi = theta = 0`, intercept at the sample mean (if free),
    /// `log_sigma = ln(std(observations))`. Warm start: the last fitted
    /// parameters.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`ArmaError::InvalidOptions`] | `options` fails validation |
    /// | [`ArmaError::EmptyData`] | `observations` is empty |
    /// | [`ArmaError::NonFiniteData`] | `observations` holds NaN or infinity |
    /// | [`ArmaError::InsufficientData`] | fewer than `max(p, q) + 1` observations |
    /// | [`ArmaError::NonFiniteLikelihood`] | the objective is not finite during the search |
    /// | [`ArmaError::NonConvergence`] | the minimizer did not report convergence |
    #[instrument(
        name = "arma_fit",
        skip_all,
        fields(p = self.spec.p(), q = self.spec.q(), n = observations.len())
    )]
    pub fn fit_with(
        &mut self,
        observations: &[f64],
        options: &FitOptions,
        minimizer: &dyn Minimizer,
    ) -> Result<FitReport, ArmaError> {
        options.validate()?;
        self.validate_data(observations)?;

        let objective = ConditionalObjective::new(observations, &self.spec, options.verbose)?;
        let initial = match &self.fitted {
            Some(prev) => {
                debug!("warm start from previous fit");
                self.codec.pack(prev.params())?
            }
            None => {
                debug!("cold start");
                self.codec.pack(&self.cold_start(observations))?
            }
        };
        debug!(initial = ?initial, "initial point");

        let minimum = minimizer.minimize(&objective, initial, options)?;
        if !minimum.converged {
            warn!(
                iterations = minimum.iterations,
                diagnostic = %minimum.diagnostic,
                "optimizer did not converge"
            );
            return Err(ArmaError::NonConvergence {
                reason: minimum.diagnostic,
                iterations: minimum.iterations,
            });
        }

        let params = self.codec.unpack(&minimum.params)?;
        let eval = objective.evaluate(&minimum.params)?;
        let report = FitReport::new(&self.spec, eval.loss, objective.n_active(), minimum.iterations);
        info!(
            loss = report.loss,
            iterations = report.iterations,
            evaluations = objective.evaluations(),
            "fit converged"
        );

        self.fitted = Some(FittedArma::new(self.spec, params, eval.latent));
        self.report = Some(report.clone());
        Ok(report)
    }

    fn validate_data(&self, observations: &[f64]) -> Result<(), ArmaError> {
        if observations.is_empty() {
            return Err(ArmaError::EmptyData);
        }
        if observations.iter().any(|v| !v.is_finite()) {
            return Err(ArmaError::NonFiniteData);
        }
        let min = self.spec.min_observations();
        if observations.len() < min {
            return Err(ArmaError::InsufficientData {
                n: observations.len(),
                min,
            });
        }
        Ok(())
    }

    fn cold_start(&self, observations: &[f64]) -> ArmaParams {
        let intercept = if self.spec.use_intercept() {
            Intercept::Free(kairos_stats::mean(observations))
        } else {
            Intercept::Fixed(0.0)
        };
        let sd = kairos_stats::pop_sd(observations);
        // A constant series has no scale to start from.
        let log_sigma = if sd > 0.0 { sd.ln() } else { 0.0 };
        ArmaParams {
            log_sigma,
            phi: vec![0.0; self.spec.p()],
            theta: vec![0.0; self.spec.q()],
            intercept,
        }
    }

    /// Returns the fitted snapshot, if any.
    pub fn fitted(&self) -> Option<&FittedArma> {
        self.fitted.as_ref()
    }

    /// Returns the report of the last successful fit.
    pub fn report(&self) -> Option<&FitReport> {
        self.report.as_ref()
    }

    /// Returns the fitted AR coefficients.
    pub fn ar(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(FittedArma::ar)
    }

    /// Returns the fitted MA coefficients.
    pub fn ma(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(FittedArma::ma)
    }

    /// Returns the fitted intercept; 0.0 when it is not estimated.
    pub fn intercept(&self) -> Option<f64> {
        self.fitted.as_ref().map(FittedArma::intercept)
    }

    /// Returns the fitted noise scale `exp(log_sigma)`.
    pub fn sigma(&self) -> Option<f64> {
        self.fitted.as_ref().map(FittedArma::sigma)
    }

    /// Returns the active latent errors; `None` before a fit or when `q == 0`.
    pub fn latent(&self) -> Option<&[f64]> {
        self.fitted.as_ref().and_then(FittedArma::latent)
    }

    /// Returns the full latent sequence, `q` leading zeros included.
    pub fn full_latent(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(FittedArma::full_latent)
    }

    /// Returns the one-step residuals of the last fit.
    pub fn residuals(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(FittedArma::residuals)
    }

    /// One-step-ahead forecast; see [`FittedArma::predict`].
    ///
    /// # Errors
    ///
    /// [`ArmaError::NotFitted`] before any successful fit, otherwise as
    /// [`FittedArma::predict`].
    pub fn predict(
        &self,
        observations: &[f64],
        latent_override: Option<&[f64]>,
    ) -> Result<f64, ArmaError> {
        self.require_fitted()?.predict(observations, latent_override)
    }

    /// Multi-step rollout; see [`FittedArma::forecast`].
    pub fn forecast(&self, observations: &[f64], steps: usize) -> Result<Vec<f64>, ArmaError> {
        self.require_fitted()?.forecast(observations, steps)
    }

    fn require_fitted(&self) -> Result<&FittedArma, ArmaError> {
        self.fitted.as_ref().ok_or(ArmaError::NotFitted)
    }
}
