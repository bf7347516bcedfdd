//! Error types for the kairos-arma crate.

/// Error type for all fallible operations in the kairos-arma crate.
///
/// This enum covers order validation, data validation, numerical issues
/// and optimization failures that may occur while fitting an ARMA model
/// or forecasting from it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ArmaError {
    /// Returned when both orders are zero.
    #[error("invalid model order: p={p}, q={q} (p + q must be > 0)")]
    InvalidOrder {
        /// AR order.
        p: usize,
        /// MA order.
        q: usize,
    },

    /// Returned when the input data is empty.
    #[error("input data is empty")]
    EmptyData,

    /// Returned when the input data has fewer observations than required.
    #[error("insufficient data: got {n} observations, need at least {min}")]
    InsufficientData {
        /// Number of observations provided.
        n: usize,
        /// Minimum number of observations required.
        min: usize,
    },

    /// Returned when the input data contains non-finite values (NaN or infinity).
    #[error("input data contains non-finite values")]
    NonFiniteData,

    /// Returned when a delay stack is requested with a lag the sequence cannot hold.
    #[error("invalid lag {lag} for a sequence of length {len}")]
    InvalidLag {
        /// Requested number of lags.
        lag: usize,
        /// Length of the sequence.
        len: usize,
    },

    /// Returned when a packed parameter vector has the wrong length.
    #[error("parameter vector has length {got}, expected {expected}")]
    ParameterLength {
        /// Length implied by the model layout.
        expected: usize,
        /// Length provided.
        got: usize,
    },

    /// Returned when fit options are out of range.
    #[error("invalid fit options: {reason}")]
    InvalidOptions {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when the optimizer stops without converging.
    #[error("optimisation failed to converge after {iterations} iterations: {reason}")]
    NonConvergence {
        /// Diagnostic reported by the optimizer.
        reason: String,
        /// Iterations performed.
        iterations: u64,
    },

    /// Returned when the negative log-likelihood evaluates to NaN or infinity.
    #[error("likelihood is not finite: {value}")]
    NonFiniteLikelihood {
        /// The offending objective value.
        value: f64,
    },

    /// Returned when a forecast is requested before any successful fit.
    #[error("model has not been fitted")]
    NotFitted,

    /// Returned when a forecast is given too little history.
    #[error("insufficient {what} history: got {got}, need at least {needed}")]
    InsufficientHistory {
        /// Which history was short ("observation" or "latent").
        what: &'static str,
        /// Minimum number of values required.
        needed: usize,
        /// Number of values provided.
        got: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_invalid_order() {
        let err = ArmaError::InvalidOrder { p: 0, q: 0 };
        assert_eq!(
            err.to_string(),
            "invalid model order: p=0, q=0 (p + q must be > 0)"
        );
    }

    #[test]
    fn error_empty_data() {
        let err = ArmaError::EmptyData;
        assert_eq!(err.to_string(), "input data is empty");
    }

    #[test]
    fn error_insufficient_data() {
        let err = ArmaError::InsufficientData { n: 5, min: 10 };
        assert_eq!(
            err.to_string(),
            "insufficient data: got 5 observations, need at least 10"
        );
    }

    #[test]
    fn error_non_finite_data() {
        let err = ArmaError::NonFiniteData;
        assert_eq!(err.to_string(), "input data contains non-finite values");
    }

    #[test]
    fn error_invalid_lag() {
        let err = ArmaError::InvalidLag { lag: 4, len: 3 };
        assert_eq!(err.to_string(), "invalid lag 4 for a sequence of length 3");
    }

    #[test]
    fn error_parameter_length() {
        let err = ArmaError::ParameterLength {
            expected: 4,
            got: 3,
        };
        assert_eq!(
            err.to_string(),
            "parameter vector has length 3, expected 4"
        );
    }

    #[test]
    fn error_invalid_options() {
        let err = ArmaError::InvalidOptions {
            reason: "max_iter must be > 0".to_string(),
        };
        assert_eq!(err.to_string(), "invalid fit options: max_iter must be > 0");
    }

    #[test]
    fn error_non_convergence() {
        let err = ArmaError::NonConvergence {
            reason: "MaxItersReached".to_string(),
            iterations: 20,
        };
        assert_eq!(
            err.to_string(),
            "optimisation failed to converge after 20 iterations: MaxItersReached"
        );
    }

    #[test]
    fn error_non_finite_likelihood() {
        let err = ArmaError::NonFiniteLikelihood { value: f64::NAN };
        assert_eq!(err.to_string(), "likelihood is not finite: NaN");
    }

    #[test]
    fn error_not_fitted() {
        assert_eq!(ArmaError::NotFitted.to_string(), "model has not been fitted");
    }

    #[test]
    fn error_insufficient_history() {
        let err = ArmaError::InsufficientHistory {
            what: "observation",
            needed: 2,
            got: 1,
        };
        assert_eq!(
            err.to_string(),
            "insufficient observation history: got 1, need at least 2"
        );
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<ArmaError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + 'static>() {}
        assert_impl::<ArmaError>();
    }
}
