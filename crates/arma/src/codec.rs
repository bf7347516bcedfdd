//! Packing of named ARMA parameters into the optimizer's flat vector.
//!
//! Layout, fixed at model construction:
//!
//! ```text
//! [ log_sigma | phi[0..p] | theta[0..q] | intercept? ]
//! ```
//!
//! The intercept slot exists only when the `ArmaSpec` has a free intercept.

use std::ops::Range;

use crate::error::ArmaError;
use crate::spec::ArmaSpec;

/// Intercept of the mean function.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Intercept {
    /// Held at a constant; not part of the packed vector.
    Fixed(f64),
    /// Estimated; occupies the last slot of the packed vector.
    Free(f64),
}

impl Intercept {
    /// The intercept value, whichever variant holds it.
    pub fn value(&self) -> f64 {
        match *self {
            Intercept::Fixed(v) | Intercept::Free(v) => v,
        }
    }

    /// Whether the intercept is estimated.
    pub fn is_free(&self) -> bool {
        matches!(self, Intercept::Free(_))
    }
}

/// Named ARMA parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct ArmaParams {
    /// Natural log of the noise scale.
    pub log_sigma: f64,
    /// AR coefficients; `phi[0]` multiplies lag 1.
    pub phi: Vec<f64>,
    /// MA coefficients; `theta[0]` multiplies the lag-1 latent error.
    pub theta: Vec<f64>,
    /// Intercept of the mean function.
    pub intercept: Intercept,
}

impl ArmaParams {
    /// Noise scale `exp(log_sigma)`.
    pub fn sigma(&self) -> f64 {
        self.log_sigma.exp()
    }
}

/// Borrowed view of a packed vector; no allocation per objective call.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ParamsView<'a> {
    pub(crate) log_sigma: f64,
    pub(crate) phi: &'a [f64],
    pub(crate) theta: &'a [f64],
    pub(crate) intercept: f64,
}

/// Bidirectional map between [`ArmaParams`] and the flat optimizer vector.
///
/// The split schedule `(1, p, q, [1])` is computed once from the `ArmaSpec` and
/// reused for every call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParameterCodec {
    p: usize,
    q: usize,
    free_intercept: bool,
}

impl ParameterCodec {
    /// Builds the layout for `spec`.
    pub fn new(spec: &ArmaSpec) -> Self {
        Self {
            p: spec.p(),
            q: spec.q(),
            free_intercept: spec.use_intercept(),
        }
    }

    /// Length of the packed vector.
    pub fn len(&self) -> usize {
        1 + self.p + self.q + usize::from(self.free_intercept)
    }

    /// Always false; the noise scale is always present.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Slots holding `phi`.
    pub fn phi_range(&self) -> Range<usize> {
        1..1 + self.p
    }

    /// Slots holding `theta`.
    pub fn theta_range(&self) -> Range<usize> {
        1 + self.p..1 + self.p + self.q
    }

    /// Slot holding the intercept, if it is free.
    pub fn intercept_index(&self) -> Option<usize> {
        self.free_intercept.then_some(1 + self.p + self.q)
    }

    /// Concatenates `params` into a flat vector.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`ArmaError::ParameterLength`] | `phi`/`theta` lengths or the intercept variant disagree with the layout |
    pub fn pack(&self, params: &ArmaParams) -> Result<Vec<f64>, ArmaError> {
        let got = 1 + params.phi.len() + params.theta.len() + usize::from(params.intercept.is_free());
        if params.phi.len() != self.p
            || params.theta.len() != self.q
            || params.intercept.is_free() != self.free_intercept
        {
            return Err(ArmaError::ParameterLength {
                expected: self.len(),
                got,
            });
        }

        let mut packed = Vec::with_capacity(self.len());
        packed.push(params.log_sigma);
        packed.extend_from_slice(&params.phi);
        packed.extend_from_slice(&params.theta);
        if let Intercept::Free(c) = params.intercept {
            packed.push(c);
        }
        Ok(packed)
    }

    /// Splits a flat vector back into named parameters. A layout without a
    /// free intercept yields `Intercept::Fixed(0.0)`.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`ArmaError::ParameterLength`] | `packed.len() != self.len()` |
    pub fn unpack(&self, packed: &[f64]) -> Result<ArmaParams, ArmaError> {
        let view = self.view(packed)?;
        Ok(ArmaParams {
            log_sigma: view.log_sigma,
            phi: view.phi.to_vec(),
            theta: view.theta.to_vec(),
            intercept: match self.intercept_index() {
                Some(_) => Intercept::Free(view.intercept),
                None => Intercept::Fixed(0.0),
            },
        })
    }

    pub(crate) fn view<'a>(&self, packed: &'a [f64]) -> Result<ParamsView<'a>, ArmaError> {
        if packed.len() != self.len() {
            return Err(ArmaError::ParameterLength {
                expected: self.len(),
                got: packed.len(),
            });
        }
        Ok(ParamsView {
            log_sigma: packed[0],
            phi: &packed[self.phi_range()],
            theta: &packed[self.theta_range()],
            intercept: self.intercept_index().map_or(0.0, |i| packed[i]),
        })
    }
}
