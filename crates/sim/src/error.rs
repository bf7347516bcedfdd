//! Error types for the kairos-sim crate.

/// Error type for simulator construction.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SimError {
    /// Returned when the noise scale is not finite and strictly positive.
    #[error("invalid noise scale: {sigma} (must be finite and > 0)")]
    InvalidSigma {
        /// The rejected noise scale.
        sigma: f64,
    },

    /// Returned when a coefficient or the intercept is NaN or infinite.
    #[error("simulator parameters contain non-finite values")]
    NonFiniteParameter,
}
