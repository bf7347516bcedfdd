//! Optimizer collaborator: the objective/minimizer contract and its
//! `argmin` implementation.
//!
//! The estimator only sees [`Objective`] and [`Minimizer`]; [`ArgminMinimizer`]
//! is the default backend and test code may swap in stubs.

use std::cell::RefCell;

use argmin::core::{
    CostFunction, Error, Executor, Gradient, IterState, State, TerminationReason,
};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::neldermead::NelderMead;
use argmin::solver::quasinewton::LBFGS;
use finitediff::FiniteDiff;
use tracing::debug;

use crate::error::ArmaError;
use crate::options::{FitOptions, GradientMode, Solver};

type LineSearch = MoreThuenteLineSearch<Vec<f64>, Vec<f64>, f64>;
type Lbfgs = LBFGS<LineSearch, Vec<f64>, Vec<f64>, f64>;
type LbfgsState = IterState<Vec<f64>, Vec<f64>, (), (), (), f64>;
type SimplexState = IterState<Vec<f64>, (), (), (), (), f64>;

/// A scalar function of a packed parameter vector, to be minimised.
pub trait Objective {
    /// Evaluates the objective.
    fn cost(&self, params: &[f64]) -> Result<f64, ArmaError>;

    /// Analytic gradient, if the objective provides one. `None` makes
    /// gradient-based backends fall back to finite differences.
    fn gradient(&self, _params: &[f64]) -> Option<Result<Vec<f64>, ArmaError>> {
        None
    }
}

/// Result of a minimisation run.
#[derive(Clone, Debug, PartialEq)]
pub struct Minimum {
    /// Best parameter vector found.
    pub params: Vec<f64>,
    /// Objective value at `params`.
    pub cost: f64,
    /// Whether the backend reported convergence.
    pub converged: bool,
    /// Iterations performed.
    pub iterations: u64,
    /// Backend termination diagnostic.
    pub diagnostic: String,
}

/// A generic multivariate minimiser.
pub trait Minimizer {
    /// Minimises `objective` starting from `initial`.
    ///
    /// Non-convergence is reported through [`Minimum::converged`]; `Err` is
    /// reserved for failures that produced no usable result.
    fn minimize(
        &self,
        objective: &dyn Objective,
        initial: Vec<f64>,
        options: &FitOptions,
    ) -> Result<Minimum, ArmaError>;
}

/// `argmin`-backed minimiser: L-BFGS or Nelder-Mead per [`FitOptions::solver`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ArgminMinimizer;

impl Minimizer for ArgminMinimizer {
    fn minimize(
        &self,
        objective: &dyn Objective,
        initial: Vec<f64>,
        options: &FitOptions,
    ) -> Result<Minimum, ArmaError> {
        let failure = RefCell::new(None);
        let problem = ArgminProblem {
            objective,
            gradient: options.gradient,
            failure: &failure,
        };
        debug!(
            solver = ?options.solver,
            dim = initial.len(),
            max_iter = options.max_iter,
            "starting optimizer"
        );
        let result = match options.solver {
            Solver::Lbfgs => run_lbfgs(problem, initial, options),
            Solver::NelderMead => run_nelder_mead(problem, initial, options),
        };

        // Line searches swallow objective errors and exit normally.
        match (result, failure.take()) {
            (Ok(min), Some(err)) if !min.converged => Err(err),
            (Err(_), Some(err)) => Err(err),
            (result, _) => result,
        }
    }
}

fn run_lbfgs(
    problem: ArgminProblem<'_>,
    initial: Vec<f64>,
    options: &FitOptions,
) -> Result<Minimum, ArmaError> {
    let linesearch: LineSearch = MoreThuenteLineSearch::new();
    let solver: Lbfgs = LBFGS::new(linesearch, options.lbfgs_memory)
        .with_tolerance_grad(options.tol_grad)
        .map_err(backend_error)?
        .with_tolerance_cost(options.tol_cost)
        .map_err(backend_error)?;

    let result = Executor::new(problem, solver)
        .configure(|state: LbfgsState| state.param(initial).max_iters(options.max_iter))
        .run()
        .map_err(backend_error)?;

    let state = result.state();
    finish(
        "L-BFGS",
        state.get_best_param(),
        state.get_best_cost(),
        state.get_iter(),
        state.get_termination_reason(),
    )
}

fn run_nelder_mead(
    problem: ArgminProblem<'_>,
    initial: Vec<f64>,
    options: &FitOptions,
) -> Result<Minimum, ArmaError> {
    let solver: NelderMead<Vec<f64>, f64> = NelderMead::new(initial_simplex(&initial))
        .with_sd_tolerance(options.tol_grad)
        .map_err(backend_error)?;

    let result = Executor::new(problem, solver)
        .configure(|state: SimplexState| state.max_iters(options.max_iter))
        .run()
        .map_err(backend_error)?;

    let state = result.state();
    finish(
        "Nelder-Mead",
        state.get_best_param(),
        state.get_best_cost(),
        state.get_iter(),
        state.get_termination_reason(),
    )
}

fn finish(
    solver: &str,
    best_param: Option<&Vec<f64>>,
    best_cost: f64,
    iterations: u64,
    reason: Option<&TerminationReason>,
) -> Result<Minimum, ArmaError> {
    let params = best_param.cloned().ok_or_else(|| ArmaError::NonConvergence {
        reason: format!("{solver} produced no parameters"),
        iterations,
    })?;
    let converged = matches!(
        reason,
        Some(TerminationReason::SolverConverged) | Some(TerminationReason::TargetCostReached)
    );
    let diagnostic = match reason {
        Some(r) => format!("{solver}: {r:?}"),
        None => format!("{solver}: not terminated"),
    };
    Ok(Minimum {
        params,
        cost: best_cost,
        converged,
        iterations,
        diagnostic,
    })
}

/// Simplex of `n + 1` vertices: the initial point plus one perturbed copy
/// per coordinate.
fn initial_simplex(initial: &[f64]) -> Vec<Vec<f64>> {
    let mut simplex = Vec::with_capacity(initial.len() + 1);
    simplex.push(initial.to_vec());
    for i in 0..initial.len() {
        let mut vertex = initial.to_vec();
        vertex[i] += if vertex[i].abs() > 1e-8 {
            0.05 * vertex[i]
        } else {
            0.1
        };
        simplex.push(vertex);
    }
    simplex
}

/// Recovers an [`ArmaError`] raised inside the objective; anything else the
/// backend reports becomes a convergence failure.
fn backend_error(err: Error) -> ArmaError {
    match err.downcast::<ArmaError>() {
        Ok(e) => e,
        Err(other) => ArmaError::NonConvergence {
            reason: other.to_string(),
            iterations: 0,
        },
    }
}

/// Bridges an [`Objective`] to `argmin`'s `CostFunction` and `Gradient`.
///
/// The first objective error is parked in `failure` so it survives backends
/// that catch it and terminate normally.
struct ArgminProblem<'a> {
    objective: &'a dyn Objective,
    gradient: GradientMode,
    failure: &'a RefCell<Option<ArmaError>>,
}

impl CostFunction for ArgminProblem<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.park(self.objective.cost(params))?)
    }
}

impl Gradient for ArgminProblem<'_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, params: &Self::Param) -> Result<Self::Gradient, Error> {
        if self.gradient == GradientMode::Analytic {
            if let Some(grad) = self.objective.gradient(params) {
                return Ok(self.park(grad)?);
            }
        }
        Ok(self.park(self.finite_difference(params))?)
    }
}

impl ArgminProblem<'_> {
    fn park<T>(&self, result: Result<T, ArmaError>) -> Result<T, ArmaError> {
        if let Err(err) = &result {
            let mut slot = self.failure.borrow_mut();
            if slot.is_none() {
                *slot = Some(err.clone());
            }
        }
        result
    }

    /// Central differences first; forward differences if the central pass
    /// hit an objective error or produced a non-finite entry.
    ///
    /// The difference closures must return `f64`, so the first objective
    /// error is parked in `failure` and the closure yields NaN.
    fn finite_difference(&self, params: &Vec<f64>) -> Result<Vec<f64>, ArmaError> {
        let failure: RefCell<Option<ArmaError>> = RefCell::new(None);
        let cost = |x: &Vec<f64>| -> f64 {
            match self.objective.cost(x) {
                Ok(v) => v,
                Err(e) => {
                    let mut slot = failure.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    f64::NAN
                }
            }
        };

        let central = params.central_diff(&cost);
        if failure.borrow().is_none() && central.iter().all(|g| g.is_finite()) {
            return Ok(central);
        }

        failure.replace(None);
        let forward = params.forward_diff(&cost);
        if let Some(err) = failure.take() {
            return Err(err);
        }
        if let Some(&bad) = forward.iter().find(|g| !g.is_finite()) {
            return Err(ArmaError::NonFiniteLikelihood { value: bad });
        }
        Ok(forward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Convex quadratic `sum_i (x_i - c_i)^2` with optional analytic gradient.
    struct Bowl {
        centre: Vec<f64>,
        analytic: bool,
    }

    impl Objective for Bowl {
        fn cost(&self, params: &[f64]) -> Result<f64, ArmaError> {
            Ok(params
                .iter()
                .zip(&self.centre)
                .map(|(x, c)| (x - c) * (x - c))
                .sum())
        }

        fn gradient(&self, params: &[f64]) -> Option<Result<Vec<f64>, ArmaError>> {
            self.analytic.then(|| {
                Ok(params
                    .iter()
                    .zip(&self.centre)
                    .map(|(x, c)| 2.0 * (x - c))
                    .collect())
            })
        }
    }

    struct AlwaysNan;

    impl Objective for AlwaysNan {
        fn cost(&self, _params: &[f64]) -> Result<f64, ArmaError> {
            Err(ArmaError::NonFiniteLikelihood { value: f64::NAN })
        }
    }

    /// `f(x) = x`, defined only for `x > -5`; a descent from 0 walks off the edge.
    struct Cliff;

    impl Objective for Cliff {
        fn cost(&self, params: &[f64]) -> Result<f64, ArmaError> {
            if params[0] > -5.0 {
                Ok(params[0])
            } else {
                Err(ArmaError::NonFiniteLikelihood {
                    value: f64::NEG_INFINITY,
                })
            }
        }

        fn gradient(&self, params: &[f64]) -> Option<Result<Vec<f64>, ArmaError>> {
            Some(self.cost(params).map(|_| vec![1.0]))
        }
    }

    fn assert_at_centre(min: &Minimum, centre: &[f64], tol: f64) {
        for (x, c) in min.params.iter().zip(centre) {
            assert!((x - c).abs() < tol, "{:?} vs {:?}", min.params, centre);
        }
    }

    #[test]
    fn lbfgs_analytic_converges() {
        let bowl = Bowl {
            centre: vec![1.0, -2.0, 0.5],
            analytic: true,
        };
        let min = ArgminMinimizer
            .minimize(&bowl, vec![0.0; 3], &FitOptions::new())
            .unwrap();
        assert!(min.converged, "{}", min.diagnostic);
        assert_at_centre(&min, &bowl.centre, 1e-5);
    }

    #[test]
    fn lbfgs_finite_difference_converges() {
        let bowl = Bowl {
            centre: vec![0.3, 0.7],
            analytic: false,
        };
        let min = ArgminMinimizer
            .minimize(&bowl, vec![0.0; 2], &FitOptions::new())
            .unwrap();
        assert!(min.converged, "{}", min.diagnostic);
        assert_at_centre(&min, &bowl.centre, 1e-4);
    }

    #[test]
    fn forced_finite_difference_ignores_analytic() {
        let bowl = Bowl {
            centre: vec![-1.0],
            analytic: true,
        };
        let opts = FitOptions::new().with_gradient(GradientMode::FiniteDifference);
        let min = ArgminMinimizer.minimize(&bowl, vec![2.0], &opts).unwrap();
        assert_at_centre(&min, &bowl.centre, 1e-4);
    }

    #[test]
    fn nelder_mead_converges() {
        let bowl = Bowl {
            centre: vec![1.0, 2.0],
            analytic: false,
        };
        let opts = FitOptions::new()
            .with_solver(Solver::NelderMead)
            .with_max_iter(2000)
            .with_tol_grad(1e-10);
        let min = ArgminMinimizer.minimize(&bowl, vec![0.0; 2], &opts).unwrap();
        assert!(min.converged, "{}", min.diagnostic);
        assert_at_centre(&min, &bowl.centre, 1e-3);
    }

    #[test]
    fn iteration_cap_is_not_convergence() {
        let bowl = Bowl {
            centre: vec![1.0, 2.0, 3.0],
            analytic: false,
        };
        let opts = FitOptions::new()
            .with_solver(Solver::NelderMead)
            .with_max_iter(2)
            .with_tol_grad(1e-14);
        let min = ArgminMinimizer.minimize(&bowl, vec![0.0; 3], &opts).unwrap();
        assert!(!min.converged);
        assert!(min.diagnostic.contains("MaxItersReached"), "{}", min.diagnostic);
    }

    #[test]
    fn objective_error_is_recovered() {
        let err = ArgminMinimizer
            .minimize(&AlwaysNan, vec![0.0], &FitOptions::new())
            .unwrap_err();
        assert!(matches!(err, ArmaError::NonFiniteLikelihood { .. }), "{err}");
    }

    #[test]
    fn objective_error_mid_search_is_recovered() {
        for gradient in [GradientMode::Analytic, GradientMode::FiniteDifference] {
            let opts = FitOptions::new().with_gradient(gradient);
            let err = ArgminMinimizer
                .minimize(&Cliff, vec![0.0], &opts)
                .unwrap_err();
            assert!(
                matches!(err, ArmaError::NonFiniteLikelihood { .. }),
                "{gradient:?}: {err}"
            );
        }
    }

    #[test]
    fn simplex_shape() {
        let s = initial_simplex(&[0.0, 2.0]);
        assert_eq!(s.len(), 3);
        assert_eq!(s[0], vec![0.0, 2.0]);
        assert_eq!(s[1], vec![0.1, 2.0]);
        assert_eq!(s[2], vec![0.0, 2.1]);
    }
}
