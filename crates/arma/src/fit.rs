//! Fitted ARMA model: one-step prediction, rollout and simulation.

use ndarray::Array2;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::codec::ArmaParams;
use crate::error::ArmaError;
use crate::spec::ArmaSpec;

/// Snapshot of a converged fit, owned by
/// [`ArmaEstimator`](crate::ArmaEstimator) and borrowed through
/// [`ArmaEstimator::fitted()`](crate::ArmaEstimator::fitted).
///
/// Holds the converged parameters and the full latent sequence (with its
/// `q` leading zeros) evaluated at the optimum.
///
/// ```mermaid
/// graph LR
///     B["FittedArma"] --> C[".predict(&obs, None)"]
///     B --> D[".forecast(&obs, steps)"]
///     B --> E[".simulate(n, n_sim, &mut rng)"]
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FittedArma {
    spec: ArmaSpec,
    params: ArmaParams,
    latent: Vec<f64>,
}

impl FittedArma {
    pub(crate) fn new(spec: ArmaSpec, params: ArmaParams, latent: Vec<f64>) -> Self {
        Self {
            spec,
            params,
            latent,
        }
    }

    /// Returns the [`ArmaSpec`] that produced this fit.
    pub fn spec(&self) -> ArmaSpec {
        self.spec
    }

    /// Returns the named parameters.
    pub fn params(&self) -> &ArmaParams {
        &self.params
    }

    /// Returns the AR coefficients (`phi`); `phi[0]` is lag 1.
    pub fn ar(&self) -> &[f64] {
        &self.params.phi
    }

    /// Returns the MA coefficients (`theta`); `theta[0]` is lag 1.
    pub fn ma(&self) -> &[f64] {
        &self.params.theta
    }

    /// Returns the intercept, 0.0 when it is not estimated.
    pub fn intercept(&self) -> f64 {
        self.params.intercept.value()
    }

    /// Returns the noise scale `exp(log_sigma)`.
    pub fn sigma(&self) -> f64 {
        self.params.sigma()
    }

    /// Returns the active latent errors, or `None` for a pure AR model.
    pub fn latent(&self) -> Option<&[f64]> {
        (self.spec.q() > 0).then(|| self.residuals())
    }

    /// Returns the full latent sequence including the `q` leading zeros.
    pub fn full_latent(&self) -> &[f64] {
        &self.latent
    }

    /// Returns the one-step residuals aligned with observations `p..n`.
    pub fn residuals(&self) -> &[f64] {
        &self.latent[self.spec.q()..]
    }

    /// One-step-ahead forecast:
    ///
    /// ```text
    /// intercept + sum_i phi[i-1] * obs[len-i] + sum_i theta[i-1] * latent[len-i]
    /// ```
    ///
    /// `latent_override` replaces the stored latent sequence, e.g. when the
    /// caller tracks shocks beyond the fitted sample.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`ArmaError::InsufficientHistory`] | fewer than `p` observations or fewer than `q` latent values |
    pub fn predict(
        &self,
        observations: &[f64],
        latent_override: Option<&[f64]>,
    ) -> Result<f64, ArmaError> {
        let latent = latent_override.unwrap_or(&self.latent);
        self.one_step(observations, latent)
    }

    /// Multi-step rollout from the end of `observations`.
    ///
    /// Future shocks are set to zero and each forecast is appended to the
    /// observation history before the next step.
    pub fn forecast(&self, observations: &[f64], steps: usize) -> Result<Vec<f64>, ArmaError> {
        let mut history = observations.to_vec();
        let mut shocks = self.latent.clone();
        let mut out = Vec::with_capacity(steps);
        for _ in 0..steps {
            let next = self.one_step(&history, &shocks)?;
            history.push(next);
            shocks.push(0.0);
            out.push(next);
        }
        Ok(out)
    }

    fn one_step(&self, observations: &[f64], latent: &[f64]) -> Result<f64, ArmaError> {
        let (p, q) = (self.spec.p(), self.spec.q());
        if observations.len() < p {
            return Err(ArmaError::InsufficientHistory {
                what: "observation",
                needed: p,
                got: observations.len(),
            });
        }
        if latent.len() < q {
            return Err(ArmaError::InsufficientHistory {
                what: "latent",
                needed: q,
                got: latent.len(),
            });
        }

        let mut value = self.intercept();
        for (phi, y) in self.params.phi.iter().zip(observations.iter().rev()) {
            value += phi * y;
        }
        for (theta, e) in self.params.theta.iter().zip(latent.iter().rev()) {
            value += theta * e;
        }
        Ok(value)
    }

    /// Generates synthetic realisations from this fitted ARMA model.
    ///
    /// Draws `n_sim` independent sample paths, each of length `n`, by
    /// driving the fitted recursion (intercept included) with Gaussian
    /// noise of scale [`FittedArma::sigma()`], after a burn-in of 100 steps.
    ///
    /// Returns an [`Array2<f64>`] with shape `(n, n_sim)`; each column is
    /// one realisation.
    pub fn simulate<R: Rng>(&self, n: usize, n_sim: usize, rng: &mut R) -> Array2<f64> {
        const BURN_IN: usize = 100;

        if n == 0 || n_sim == 0 {
            return Array2::zeros((n, n_sim));
        }
        let Ok(normal) = Normal::new(0.0, self.sigma()) else {
            return Array2::zeros((n, n_sim));
        };

        let phi = &self.params.phi;
        let theta = &self.params.theta;
        let c = self.intercept();
        let n_tot = BURN_IN + n;
        let mut output = Array2::zeros((n, n_sim));

        for sim in 0..n_sim {
            let eps: Vec<f64> = (0..n_tot).map(|_| normal.sample(rng)).collect();
            let mut y = vec![0.0; n_tot];

            for t in 0..n_tot {
                let mut val = c + eps[t];
                for (i, a) in phi.iter().enumerate().take(t) {
                    val += a * y[t - 1 - i];
                }
                for (j, b) in theta.iter().enumerate().take(t) {
                    val += b * eps[t - 1 - j];
                }
                y[t] = val;
            }

            for (i, &val) in y[BURN_IN..].iter().enumerate() {
                output[[i, sim]] = val;
            }
        }

        output
    }
}
