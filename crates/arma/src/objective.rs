//! Conditional negative log-likelihood of an ARMA(p,q) model.
//!
//! For a packed parameter vector the objective
//!
//! 1. unpacks `(log_sigma, phi, theta, intercept)`,
//! 2. subtracts the mean `intercept + phi · lags(y)` from `y[p..]`,
//! 3. reconstructs the latent errors from the residuals,
//! 4. scores the active latent errors with [`gaussian_nll`].
//!
//! The analytic gradient propagates latent sensitivities through the same
//! recursion: for any mean parameter `x`,
//! `de[t]/dx = direct[t] - sum_i theta[i-1] * de[t-i]/dx`, zero before the data.

use std::cell::{Cell, RefCell};

use ndarray::{Array2, ArrayView1};
use tracing::{info, trace};

use crate::codec::{ParameterCodec, ParamsView};
use crate::delay::delay_stack;
use crate::error::ArmaError;
use crate::latent::reconstruct_into;
use crate::likelihood::gaussian_nll;
use crate::optimizer::Objective;
use crate::spec::ArmaSpec;

/// Loss and full latent sequence at one parameter point.
#[derive(Clone, Debug)]
pub(crate) struct Evaluation {
    pub(crate) loss: f64,
    /// Length `q + (n - p)`, first `q` entries zero.
    pub(crate) latent: Vec<f64>,
}

pub(crate) struct ConditionalObjective<'a> {
    /// Observations `y[p..]`.
    target: &'a [f64],
    /// `p × (n - p)` AR regressors; row `k` is lag `k + 1`.
    regressors: Array2<f64>,
    codec: ParameterCodec,
    q: usize,
    verbose: bool,
    evaluations: Cell<u64>,
    /// Point and latent sequence of the last evaluation, consumed by the
    /// gradient at the same point.
    last: RefCell<Option<(Vec<f64>, Vec<f64>)>>,
}

impl<'a> ConditionalObjective<'a> {
    /// Caller guarantees `observations.len() > spec.p()`.
    pub(crate) fn new(
        observations: &'a [f64],
        spec: &ArmaSpec,
        verbose: bool,
    ) -> Result<Self, ArmaError> {
        let p = spec.p();
        Ok(Self {
            target: &observations[p..],
            regressors: delay_stack(observations, p)?,
            codec: ParameterCodec::new(spec),
            q: spec.q(),
            verbose,
            evaluations: Cell::new(0),
            last: RefCell::new(None),
        })
    }

    /// Number of objective evaluations so far.
    pub(crate) fn evaluations(&self) -> u64 {
        self.evaluations.get()
    }

    /// Number of active latent errors, `n - p`.
    pub(crate) fn n_active(&self) -> usize {
        self.target.len()
    }

    pub(crate) fn evaluate(&self, params: &[f64]) -> Result<Evaluation, ArmaError> {
        let view = self.codec.view(params)?;
        let latent = self.latent(&view);
        let loss = gaussian_nll(&latent[self.q..], view.log_sigma.exp());
        self.last.replace(Some((params.to_vec(), latent.clone())));
        let loss = loss?;

        let k = self.evaluations.get() + 1;
        self.evaluations.set(k);
        if self.verbose {
            info!(evaluation = k, loss, "objective evaluated");
        } else {
            trace!(evaluation = k, loss, "objective evaluated");
        }
        Ok(Evaluation { loss, latent })
    }

    /// `y[p..] - intercept - phi · lags`.
    fn residuals(&self, view: &ParamsView<'_>) -> Vec<f64> {
        let mut resid: Vec<f64> = self.target.iter().map(|y| y - view.intercept).collect();
        if !view.phi.is_empty() {
            let ar = ArrayView1::from(view.phi).dot(&self.regressors);
            for (r, a) in resid.iter_mut().zip(ar.iter()) {
                *r -= a;
            }
        }
        resid
    }

    fn latent(&self, view: &ParamsView<'_>) -> Vec<f64> {
        let resid = self.residuals(view);
        let mut latent = vec![0.0; self.q + resid.len()];
        reconstruct_into(&resid, view.theta, &mut latent);
        latent
    }

    fn analytic_gradient(&self, params: &[f64]) -> Result<Vec<f64>, ArmaError> {
        let view = self.codec.view(params)?;
        let latent = match self.last.take() {
            Some((at, latent)) if at == params => latent,
            _ => self.latent(&view),
        };
        let q = self.q;
        let m = self.n_active();
        let active = &latent[q..];
        let inv_var = (-2.0 * view.log_sigma).exp();
        let scale = inv_var / m as f64;

        let mut grad = vec![0.0; self.codec.len()];
        let sum_sq: f64 = active.iter().map(|e| e * e).sum();
        grad[0] = 1.0 - sum_sq * scale;

        let mut direct = vec![0.0; m];
        let mut sens = vec![0.0; q + m];
        let project = |direct: &[f64], sens: &mut [f64]| -> f64 {
            reconstruct_into(direct, view.theta, sens);
            let dot: f64 = active.iter().zip(&sens[q..]).map(|(e, s)| e * s).sum();
            dot * scale
        };

        for (k, idx) in self.codec.phi_range().enumerate() {
            for (d, x) in direct.iter_mut().zip(self.regressors.row(k)) {
                *d = -x;
            }
            grad[idx] = project(&direct, &mut sens);
        }
        for (k, idx) in self.codec.theta_range().enumerate() {
            for (j, d) in direct.iter_mut().enumerate() {
                *d = -latent[q + j - (k + 1)];
            }
            grad[idx] = project(&direct, &mut sens);
        }
        if let Some(idx) = self.codec.intercept_index() {
            direct.fill(-1.0);
            grad[idx] = project(&direct, &mut sens);
        }

        if let Some(&bad) = grad.iter().find(|g| !g.is_finite()) {
            return Err(ArmaError::NonFiniteLikelihood { value: bad });
        }
        Ok(grad)
    }
}

impl Objective for ConditionalObjective<'_> {
    fn cost(&self, params: &[f64]) -> Result<f64, ArmaError> {
        self.evaluate(params).map(|e| e.loss)
    }

    fn gradient(&self, params: &[f64]) -> Option<Result<Vec<f64>, ArmaError>> {
        Some(self.analytic_gradient(params))
    }
}
