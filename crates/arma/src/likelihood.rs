//! Gaussian negative log-likelihood of the active latent errors.

use std::f64::consts::PI;

use crate::error::ArmaError;

/// Mean negative log-density of zero-mean Gaussian errors with scale `sigma`:
///
/// ```text
/// loss = mean( 0.5 * ln(2 pi sigma^2) + e^2 / (2 sigma^2) )
/// ```
///
/// `active` must exclude the synthetic zero prefix of the latent sequence.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`ArmaError::NonFiniteLikelihood`] | the loss is NaN or infinite (including empty `active` and `sigma` of zero) |
pub fn gaussian_nll(active: &[f64], sigma: f64) -> Result<f64, ArmaError> {
    let n = active.len() as f64;
    let var = sigma * sigma;
    let sum_sq: f64 = active.iter().map(|e| e * e).sum();
    let loss = 0.5 * (2.0 * PI * var).ln() + sum_sq / (2.0 * var * n);
    if !loss.is_finite() {
        return Err(ArmaError::NonFiniteLikelihood { value: loss });
    }
    Ok(loss)
}
