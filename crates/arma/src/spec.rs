//! ARMA model specification (orders and intercept handling).

use serde::Deserialize;

use crate::error::ArmaError;

/// An ARMA(p,q) model specification.
///
/// Orders and intercept handling are fixed at construction and never change
/// afterwards; an [`ArmaEstimator`](crate::ArmaEstimator) built from a spec
/// keeps it for its whole lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawSpec")]
pub struct ArmaSpec {
    p: usize,
    q: usize,
    use_intercept: bool,
}

impl ArmaSpec {
    /// Creates a new ARMA(p,q) specification.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`ArmaError::InvalidOrder`] | `p + q == 0` |
    ///
    /// # Example
    ///
    /// ```
    /// use kairos_arma::ArmaSpec;
    ///
    /// let spec = ArmaSpec::new(2, 1, true).unwrap();
    /// assert_eq!(spec.p(), 2);
    /// assert_eq!(spec.q(), 1);
    /// assert!(ArmaSpec::new(0, 0, true).is_err());
    /// ```
    pub fn new(p: usize, q: usize, use_intercept: bool) -> Result<Self, ArmaError> {
        if p + q == 0 {
            return Err(ArmaError::InvalidOrder { p, q });
        }
        Ok(Self {
            p,
            q,
            use_intercept,
        })
    }

    /// Returns the AR order (`p`).
    pub fn p(&self) -> usize {
        self.p
    }

    /// Returns the MA order (`q`).
    pub fn q(&self) -> usize {
        self.q
    }

    /// Whether the intercept is a free parameter.
    pub fn use_intercept(&self) -> bool {
        self.use_intercept
    }

    /// Number of free parameters: noise scale, AR, MA and the optional intercept.
    pub fn n_params(&self) -> usize {
        1 + self.p + self.q + usize::from(self.use_intercept)
    }

    /// Minimum number of observations accepted by a fit.
    pub fn min_observations(&self) -> usize {
        self.p.max(self.q) + 1
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSpec {
    p: usize,
    q: usize,
    #[serde(default = "default_true")]
    use_intercept: bool,
}

fn default_true() -> bool {
    true
}

impl TryFrom<RawSpec> for ArmaSpec {
    type Error = ArmaError;

    fn try_from(raw: RawSpec) -> Result<Self, Self::Error> {
        ArmaSpec::new(raw.p, raw.q, raw.use_intercept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_round_trip() {
        let spec = ArmaSpec::new(2, 1, false).unwrap();
        assert_eq!(spec.p(), 2);
        assert_eq!(spec.q(), 1);
        assert!(!spec.use_intercept());
    }

    #[test]
    fn spec_zero_order_rejected() {
        let err = ArmaSpec::new(0, 0, true).unwrap_err();
        assert!(matches!(err, ArmaError::InvalidOrder { p: 0, q: 0 }));
    }

    #[test]
    fn spec_pure_orders_accepted() {
        assert!(ArmaSpec::new(1, 0, true).is_ok());
        assert!(ArmaSpec::new(0, 1, true).is_ok());
    }

    #[test]
    fn spec_n_params() {
        assert_eq!(ArmaSpec::new(2, 1, true).unwrap().n_params(), 5);
        assert_eq!(ArmaSpec::new(2, 1, false).unwrap().n_params(), 4);
        assert_eq!(ArmaSpec::new(0, 3, false).unwrap().n_params(), 4);
    }

    #[test]
    fn spec_min_observations() {
        assert_eq!(ArmaSpec::new(3, 1, true).unwrap().min_observations(), 4);
        assert_eq!(ArmaSpec::new(1, 5, true).unwrap().min_observations(), 6);
    }

    #[test]
    fn spec_is_copy() {
        let a = ArmaSpec::new(1, 1, true).unwrap();
        let b = a;
        assert_eq!(a, b);
    }

    #[test]
    fn spec_deserialize_validates() {
        let spec: ArmaSpec = toml::from_str("p = 1\nq = 2").unwrap();
        assert_eq!((spec.p(), spec.q()), (1, 2));
        assert!(spec.use_intercept());

        assert!(toml::from_str::<ArmaSpec>("p = 0\nq = 0").is_err());
        assert!(toml::from_str::<ArmaSpec>("p = 1\nq = 0\nbogus = 1").is_err());
    }
}
