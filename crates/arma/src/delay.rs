//! Lagged-copy matrices for AR and MA regressors.

use ndarray::Array2;

use crate::error::ArmaError;

/// Stacks `k` lagged copies of `a` into a `k × (a.len() - k)` matrix.
///
/// Row `i` holds `a[k-1-i .. a.len()-1-i]`, i.e. the lag-`(i+1)` shift, so
/// column `j` holds lags `1..=k` of `a[k+j]` with the most recent lag on top.
/// A zero-lag request yields an empty `0 × a.len()` matrix.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`ArmaError::InvalidLag`] | `k >= a.len()` |
///
/// # Example
///
/// ```
/// use kairos_arma::delay_stack;
///
/// let x = delay_stack(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
/// assert_eq!(x.shape(), &[2, 2]);
/// assert_eq!(x.row(0).to_vec(), vec![2.0, 3.0]);
/// assert_eq!(x.row(1).to_vec(), vec![1.0, 2.0]);
/// ```
pub fn delay_stack(a: &[f64], k: usize) -> Result<Array2<f64>, ArmaError> {
    let m = a.len();
    if k > 0 && k >= m {
        return Err(ArmaError::InvalidLag { lag: k, len: m });
    }
    let width = m - k;
    Ok(Array2::from_shape_fn((k, width), |(i, j)| a[k - 1 - i + j]))
}
