//! Statistical utility functions.
//!
//! The robust noise estimate defined here is the significance denominator
//! used by every detector in the crate.

use crate::error::{AnalysisError, Result};

/// Scale factor turning a median absolute deviation into a Gaussian sigma.
pub const MAD_TO_SIGMA: f64 = 1.4826;

/// Relative floor applied to every noise estimate.
pub const NOISE_EPSILON: f64 = 1e-12;

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Calculate the variance of a slice (sample variance with n-1 denominator).
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    sum_sq / (values.len() - 1) as f64
}

/// Calculate the standard deviation of a slice.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Calculate the median of a slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    median_of_sorted(&sorted)
}

/// Median of an already sorted slice.
pub(crate) fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n.is_multiple_of(2) {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Percentile with linear interpolation between closest ranks.
///
/// # Arguments
/// * `values` - Input values (any order)
/// * `q` - Percentile in [0, 100]
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let pos = (q.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;

    if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

/// Median absolute deviation around the median.
pub fn mad(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let center = median(values);
    let mut deviations: Vec<f64> = values.iter().map(|x| (x - center).abs()).collect();
    deviations.sort_by(|a, b| a.total_cmp(b));
    median_of_sorted(&deviations)
}

/// Outlier-resistant noise estimate (scaled MAD).
///
/// Returns a Gaussian-equivalent sigma. When more than half of the values
/// are identical the MAD collapses to zero; the population standard
/// deviation is used instead, and the result is floored at
/// `NOISE_EPSILON * max(1, |median|)` so it is always strictly positive.
///
/// # Errors
/// * `InsufficientData` for an empty slice
/// * `NumericalDegeneracy` if the input holds non-finite values
pub fn robust_noise(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(AnalysisError::InsufficientData { needed: 1, got: 0 });
    }
    if let Some(index) = values.iter().position(|x| !x.is_finite()) {
        return Err(AnalysisError::NumericalDegeneracy(format!(
            "cannot estimate noise: non-finite value at index {index}"
        )));
    }

    let center = median(values);
    let floor = NOISE_EPSILON * center.abs().max(1.0);

    let mut sigma = MAD_TO_SIGMA * mad(values);
    if sigma <= floor {
        let n = values.len() as f64;
        let m = mean(values);
        sigma = (values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / n).sqrt();
    }

    if !sigma.is_finite() {
        return Err(AnalysisError::NumericalDegeneracy(format!(
            "noise estimate is not finite ({sigma})"
        )));
    }

    Ok(sigma.max(floor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_calculates_correctly() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0, epsilon = 1e-10);
        assert_relative_eq!(mean(&[10.0]), 10.0, epsilon = 1e-10);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn variance_calculates_correctly() {
        // Sample variance of [1, 2, 3, 4, 5] = 2.5
        assert_relative_eq!(variance(&[1.0, 2.0, 3.0, 4.0, 5.0]), 2.5, epsilon = 1e-10);
        assert!(variance(&[1.0]).is_nan());
        assert!(variance(&[]).is_nan());
    }

    #[test]
    fn std_dev_calculates_correctly() {
        assert_relative_eq!(
            std_dev(&[1.0, 2.0, 3.0, 4.0, 5.0]),
            2.5_f64.sqrt(),
            epsilon = 1e-10
        );
    }

    #[test]
    fn median_calculates_correctly() {
        assert_relative_eq!(median(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0, epsilon = 1e-10);
        assert_relative_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5, epsilon = 1e-10);
        assert_relative_eq!(median(&[5.0, 1.0, 3.0, 2.0, 4.0]), 3.0, epsilon = 1e-10);
        assert!(median(&[]).is_nan());
    }

    #[test]
    fn percentile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(percentile(&values, 0.0), 1.0, epsilon = 1e-10);
        assert_relative_eq!(percentile(&values, 50.0), 3.0, epsilon = 1e-10);
        assert_relative_eq!(percentile(&values, 100.0), 5.0, epsilon = 1e-10);
        assert_relative_eq!(percentile(&values, 90.0), 4.6, epsilon = 1e-10);
    }

    #[test]
    fn mad_ignores_single_outlier() {
        let values = [1.0, 2.0, 3.0, 4.0, 1000.0];
        assert_relative_eq!(mad(&values), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn robust_noise_matches_gaussian_scale() {
        // MAD of [-2..2] is 1, scaled by 1.4826
        let values = [-2.0, -1.0, 0.0, 1.0, 2.0];
        assert_relative_eq!(robust_noise(&values).unwrap(), 1.4826, epsilon = 1e-10);
    }

    #[test]
    fn robust_noise_is_positive_for_constant_input() {
        let values = vec![1.0; 100];
        let sigma = robust_noise(&values).unwrap();
        assert!(sigma > 0.0);
        assert!(sigma.is_finite());
    }

    #[test]
    fn robust_noise_falls_back_when_mad_collapses() {
        let mut values = vec![1.0; 100];
        values[10] = 2.0;
        let sigma = robust_noise(&values).unwrap();
        assert!(sigma > 0.05 && sigma < 0.2);
    }

    #[test]
    fn robust_noise_rejects_bad_input() {
        assert!(matches!(
            robust_noise(&[]),
            Err(AnalysisError::InsufficientData { .. })
        ));
        assert!(matches!(
            robust_noise(&[1.0, f64::NAN]),
            Err(AnalysisError::NumericalDegeneracy(_))
        ));
    }
}
