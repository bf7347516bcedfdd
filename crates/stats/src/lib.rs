//! Summary statistics shared by the kairos crates.
//!
//! Moments use the population (`N`) denominator; the ARMA estimator seeds
//! its noise scale from [`pop_sd`].

/// Arithmetic mean of a slice. Returns 0.0 if empty.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let sum: f64 = data.iter().sum();
    sum / data.len() as f64
}

/// Population variance with N denominator (matching NumPy's `var()`).
/// Returns 0.0 if empty.
pub fn pop_variance(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    sum_sq_dev(data) / data.len() as f64
}

/// Population standard deviation with N denominator (matching NumPy's `std()`).
/// Returns 0.0 if empty.
pub fn pop_sd(data: &[f64]) -> f64 {
    pop_variance(data).sqrt()
}

/// Sample autocorrelation at `lag`, normalised by the lag-0 autocovariance.
///
/// Returns `None` if `lag >= data.len()` or the series is constant.
pub fn autocorrelation(data: &[f64], lag: usize) -> Option<f64> {
    let n = data.len();
    if lag >= n {
        return None;
    }
    let m = mean(data);
    let denom = sum_sq_dev(data);
    if denom < 1e-300 {
        return None;
    }
    let num: f64 = data[lag..]
        .iter()
        .zip(data.iter())
        .map(|(a, b)| (a - m) * (b - m))
        .sum();
    Some(num / denom)
}

fn sum_sq_dev(data: &[f64]) -> f64 {
    let m = mean(data);
    data.iter().map(|&x| (x - m) * (x - m)).sum()
}
