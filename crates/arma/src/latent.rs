//! Moving-average latent error reconstruction.
//!
//! Given residuals `r` (observations minus intercept and AR contribution) and
//! MA coefficients `theta` of length `q`, the latent sequence has length
//! `q + r.len()`:
//!
//! ```text
//! latent[0..q]  = 0
//! latent[q + i] = r[i] - sum_{j=1..q} theta[j-1] * latent[q + i - j]
//! ```
//!
//! The recurrence is strictly sequential, so it runs as a single forward pass
//! over one pre-sized buffer.

/// Reconstructs the latent error sequence, allocating the output buffer.
///
/// With `theta` empty the result equals `residuals`.
///
/// # Example
///
/// ```
/// use kairos_arma::reconstruct_latent;
///
/// let latent = reconstruct_latent(&[1.0, 2.0, 3.0], &[0.5]);
/// assert_eq!(latent, vec![0.0, 1.0, 1.5, 2.25]);
/// ```
pub fn reconstruct_latent(residuals: &[f64], theta: &[f64]) -> Vec<f64> {
    let mut latent = vec![0.0; theta.len() + residuals.len()];
    reconstruct_into(residuals, theta, &mut latent);
    latent
}

/// Runs the recurrence in place over `latent`, which must have length
/// `theta.len() + residuals.len()`. The leading `theta.len()` entries are
/// overwritten with zeros.
pub(crate) fn reconstruct_into(residuals: &[f64], theta: &[f64], latent: &mut [f64]) {
    let q = theta.len();
    debug_assert_eq!(latent.len(), q + residuals.len());

    latent[..q].fill(0.0);
    for (i, &r) in residuals.iter().enumerate() {
        let t = q + i;
        let mut e = r;
        for j in 1..=q {
            e -= theta[j - 1] * latent[t - j];
        }
        latent[t] = e;
    }
}
