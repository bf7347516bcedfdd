//! # kairos-sim
//!
//! Seeded ARMA sample-path simulator.
//!
//! Each call to [`ArmaSim::sample()`] draws one Gaussian shock, evaluates the
//! linear recursion
//!
//! ```text
//! y[t] = c + sum_i ar[i] * y[t-1-i] + sum_j ma[j] * e[t-1-j] + e[t]
//! ```
//!
//! and appends `y[t]` to an internal, growing history. The history starts
//! with `max(p, q)` zeros so the first draws have a defined lag structure.
//!
//! ```
//! use kairos_sim::ArmaSim;
//!
//! let mut sim = ArmaSim::ar(vec![0.3, -0.2], 0.0, 1.0, 42).unwrap();
//! let data = sim.sample_n(1000);
//! assert_eq!(data.len(), 1000);
//! ```

mod error;
mod sim;

pub use error::SimError;
pub use sim::ArmaSim;
