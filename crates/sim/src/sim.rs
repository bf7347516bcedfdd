//! Growing-history ARMA simulator.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::error::SimError;

/// A seeded ARMA(p,q) simulator with an internal, growing history.
///
/// `ar[0]` multiplies the most recent value, `ma[0]` the most recent shock.
#[derive(Clone, Debug)]
pub struct ArmaSim {
    ar: Vec<f64>,
    ma: Vec<f64>,
    intercept: f64,
    noise: Normal<f64>,
    rng: StdRng,
    /// Values, starting with `seed_len` zeros.
    history: Vec<f64>,
    /// Shocks aligned with `history`.
    shocks: Vec<f64>,
    seed_len: usize,
}

impl ArmaSim {
    /// Creates an ARMA simulator.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`SimError::InvalidSigma`] | `sigma` is not finite or `<= 0` |
    /// | [`SimError::NonFiniteParameter`] | any coefficient or `intercept` is NaN/infinite |
    pub fn new(
        ar: Vec<f64>,
        ma: Vec<f64>,
        intercept: f64,
        sigma: f64,
        seed: u64,
    ) -> Result<Self, SimError> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(SimError::InvalidSigma { sigma });
        }
        if !intercept.is_finite() || ar.iter().chain(ma.iter()).any(|x| !x.is_finite()) {
            return Err(SimError::NonFiniteParameter);
        }
        let noise = Normal::new(0.0, sigma).map_err(|_| SimError::InvalidSigma { sigma })?;
        let seed_len = ar.len().max(ma.len());

        Ok(Self {
            ar,
            ma,
            intercept,
            noise,
            rng: StdRng::seed_from_u64(seed),
            history: vec![0.0; seed_len],
            shocks: vec![0.0; seed_len],
            seed_len,
        })
    }

    /// Creates a pure autoregressive simulator.
    pub fn ar(ar: Vec<f64>, intercept: f64, sigma: f64, seed: u64) -> Result<Self, SimError> {
        Self::new(ar, Vec::new(), intercept, sigma, seed)
    }

    /// Creates a pure moving-average simulator.
    pub fn ma(ma: Vec<f64>, intercept: f64, sigma: f64, seed: u64) -> Result<Self, SimError> {
        Self::new(Vec::new(), ma, intercept, sigma, seed)
    }

    /// Draws one new value, appends it to the history and returns it.
    pub fn sample(&mut self) -> f64 {
        let t = self.history.len();
        let shock = self.noise.sample(&mut self.rng);

        let mut value = self.intercept + shock;
        for (i, a) in self.ar.iter().enumerate() {
            value += a * self.history[t - 1 - i];
        }
        for (j, m) in self.ma.iter().enumerate() {
            value += m * self.shocks[t - 1 - j];
        }

        self.history.push(value);
        self.shocks.push(shock);
        value
    }

    /// Draws `n` new values and returns them in order.
    pub fn sample_n(&mut self, n: usize) -> Vec<f64> {
        self.history.reserve(n);
        self.shocks.reserve(n);
        for _ in 0..n {
            self.sample();
        }
        self.history[self.history.len() - n..].to_vec()
    }

    /// All values drawn so far (the zero seed is not included).
    pub fn history(&self) -> &[f64] {
        &self.history[self.seed_len..]
    }

    /// All shocks drawn so far, aligned with [`ArmaSim::history()`].
    pub fn shocks(&self) -> &[f64] {
        &self.shocks[self.seed_len..]
    }
}
