//! Fit options and whole-model configuration.

use serde::Deserialize;

use crate::error::ArmaError;
use crate::estimator::ArmaEstimator;
use crate::spec::ArmaSpec;

/// Optimizer backend used by [`ArgminMinimizer`](crate::ArgminMinimizer).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Solver {
    /// L-BFGS with More-Thuente line search.
    #[default]
    Lbfgs,
    /// Gradient-free Nelder-Mead simplex.
    NelderMead,
}

/// How the objective gradient is obtained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientMode {
    /// Exact gradient from the latent sensitivity recursion.
    #[default]
    Analytic,
    /// Central finite differences, with a forward-difference retry.
    FiniteDifference,
}

/// Options for a single fit call.
///
/// # Example
///
/// ```
/// use kairos_arma::{FitOptions, Solver};
///
/// let opts = FitOptions::new().with_max_iter(50).with_solver(Solver::NelderMead);
/// assert!(opts.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FitOptions {
    /// Iteration cap handed to the optimizer.
    #[serde(default = "default_max_iter")]
    pub max_iter: u64,
    /// Gradient-norm tolerance (L-BFGS) or simplex spread tolerance (Nelder-Mead).
    #[serde(default = "default_tol_grad")]
    pub tol_grad: f64,
    /// Cost-change tolerance (L-BFGS).
    #[serde(default = "default_tol_cost")]
    pub tol_cost: f64,
    /// L-BFGS history size.
    #[serde(default = "default_lbfgs_memory")]
    pub lbfgs_memory: usize,
    /// Optimizer backend.
    #[serde(default)]
    pub solver: Solver,
    /// Gradient source.
    #[serde(default)]
    pub gradient: GradientMode,
    /// Log every objective evaluation at info level.
    #[serde(default)]
    pub verbose: bool,
}

fn default_max_iter() -> u64 {
    100
}
fn default_tol_grad() -> f64 {
    1e-6
}
fn default_tol_cost() -> f64 {
    1e-12
}
fn default_lbfgs_memory() -> usize {
    7
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iter: default_max_iter(),
            tol_grad: default_tol_grad(),
            tol_cost: default_tol_cost(),
            lbfgs_memory: default_lbfgs_memory(),
            solver: Solver::default(),
            gradient: GradientMode::default(),
            verbose: false,
        }
    }
}

impl FitOptions {
    /// Creates options with defaults.
    ///
    /// Defaults: `max_iter = 100`, `tol_grad = 1e-6`, `tol_cost = 1e-12`,
    /// `lbfgs_memory = 7`, L-BFGS with analytic gradients, not verbose.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the iteration cap.
    pub fn with_max_iter(mut self, max_iter: u64) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the gradient tolerance.
    pub fn with_tol_grad(mut self, tol: f64) -> Self {
        self.tol_grad = tol;
        self
    }

    /// Sets the cost-change tolerance.
    pub fn with_tol_cost(mut self, tol: f64) -> Self {
        self.tol_cost = tol;
        self
    }

    /// Sets the L-BFGS history size.
    pub fn with_lbfgs_memory(mut self, memory: usize) -> Self {
        self.lbfgs_memory = memory;
        self
    }

    /// Sets the optimizer backend.
    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    /// Sets the gradient source.
    pub fn with_gradient(mut self, gradient: GradientMode) -> Self {
        self.gradient = gradient;
        self
    }

    /// Enables per-evaluation logging.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Validates all fields.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`ArmaError::InvalidOptions`] | zero `max_iter` or `lbfgs_memory`, or a tolerance that is not finite and `> 0` |
    pub fn validate(&self) -> Result<(), ArmaError> {
        if self.max_iter == 0 {
            return Err(invalid("max_iter must be > 0"));
        }
        if self.lbfgs_memory == 0 {
            return Err(invalid("lbfgs_memory must be > 0"));
        }
        if !self.tol_grad.is_finite() || self.tol_grad <= 0.0 {
            return Err(invalid(format!(
                "tol_grad must be finite and > 0, got {}",
                self.tol_grad
            )));
        }
        if !self.tol_cost.is_finite() || self.tol_cost <= 0.0 {
            return Err(invalid(format!(
                "tol_cost must be finite and > 0, got {}",
                self.tol_cost
            )));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> ArmaError {
    ArmaError::InvalidOptions {
        reason: reason.into(),
    }
}

/// Whole-model configuration, typically read from TOML:
///
/// ```toml
/// [model]
/// p = 2
/// q = 1
/// use_intercept = true
///
/// [fit]
/// max_iter = 200
/// solver = "nelder_mead"
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Orders and intercept handling.
    pub model: ArmaSpec,
    /// Options for every fit of the built estimator.
    #[serde(default)]
    pub fit: FitOptions,
}

impl ModelConfig {
    /// Validates the fit options and builds an unfitted estimator.
    pub fn build(&self) -> Result<ArmaEstimator, ArmaError> {
        self.fit.validate()?;
        Ok(ArmaEstimator::new(self.model))
    }
}
