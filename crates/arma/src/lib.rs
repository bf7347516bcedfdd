//! # kairos-arma
//!
//! ARMA(p,q) estimation by conditional maximum likelihood, with one-step
//! forecasting from the fitted model.
//!
//! ## Workflow
//!
//! ```mermaid
//! graph LR
//!     A["ArmaSpec::new(p, q, use_intercept)?"] --> B["ArmaEstimator::new(spec)"]
//!     B -->|".fit(&data, &opts)?"| C["FitReport"]
//!     B --> D[".predict(&obs, None)?"]
//!     B --> E[".fitted() — FittedArma"]
//!     E --> F[".forecast(&obs, steps)?"]
//!     E --> G[".simulate(n, n_sim, &mut rng)"]
//! ```
//!
//! ## The objective
//!
//! For observations `y[0..n]` the mean function is
//! `mu[t] = c + sum_i phi[i-1] * y[t-i]` for `t >= p`. The residuals
//! `r = y[p..] - mu` are turned into latent errors by the MA recursion
//! (see [`reconstruct_latent`]), with `q` zeros standing in for the shocks
//! before the data starts. The loss is the mean Gaussian negative
//! log-density of the active latent errors (see [`gaussian_nll`]).
//!
//! The optimizer works on one flat vector
//! `[log_sigma, phi.., theta.., intercept?]` (see [`ParameterCodec`]).
//!
//! ## Mathematical Glossary
//!
//! | Symbol | Accessor | Meaning |
//! |--------|----------|---------|
//! | phi | [`ArmaEstimator::ar()`] | AR coefficients: weights on past observations |
//! | theta | [`ArmaEstimator::ma()`] | MA coefficients: weights on past latent errors |
//! | c | [`ArmaEstimator::intercept()`] | Intercept of the mean function |
//! | sigma | [`ArmaEstimator::sigma()`] | Noise scale, `exp(log_sigma)` |
//! | e | [`ArmaEstimator::latent()`] | Reconstructed latent errors |

mod codec;
mod delay;
mod error;
mod estimator;
mod fit;
mod latent;
mod likelihood;
mod optimizer;
mod options;
mod spec;

pub(crate) mod objective;

pub use codec::{ArmaParams, Intercept, ParameterCodec};
pub use delay::delay_stack;
pub use error::ArmaError;
pub use estimator::{ArmaEstimator, FitReport};
pub use fit::FittedArma;
pub use latent::reconstruct_latent;
pub use likelihood::gaussian_nll;
pub use optimizer::{ArgminMinimizer, Minimizer, Minimum, Objective};
pub use options::{FitOptions, GradientMode, ModelConfig, Solver};
pub use spec::ArmaSpec;
