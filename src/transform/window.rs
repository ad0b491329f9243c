//! Rolling window functions and baseline removal.
//!
//! Windows are centered and truncated at the edges, so every output has the
//! same length as its input and no element is NaN.

use crate::core::TimeSeries;
use crate::error::{AnalysisError, Result};
use crate::utils::stats::{median_of_sorted, robust_noise};

/// Index range `[start, end)` of a centered window around `i`.
fn centered_bounds(i: usize, window: usize, n: usize) -> (usize, usize) {
    let half = window / 2;
    let start = i.saturating_sub(half);
    let end = (i + window - half).min(n);
    (start, end)
}

/// Compute a centered rolling mean.
pub fn rolling_mean(series: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(series, window, |s| s.iter().sum::<f64>() / s.len() as f64)
}

/// Compute a centered rolling median.
///
/// Keeps the window sorted between steps, inserting and removing one value
/// at a time with binary search.
pub fn rolling_median(series: &[f64], window: usize) -> Vec<f64> {
    let n = series.len();
    if n == 0 || window == 0 {
        return vec![f64::NAN; n];
    }

    let half = window / 2;
    let (_, first_end) = centered_bounds(0, window, n);
    let mut sorted: Vec<f64> = series[..first_end].to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut result = Vec::with_capacity(n);
    for i in 0..n {
        result.push(median_of_sorted(&sorted));
        if i + 1 == n {
            break;
        }
        if i >= half {
            let outgoing = series[i - half];
            if let Ok(pos) = sorted.binary_search_by(|x| x.total_cmp(&outgoing)) {
                sorted.remove(pos);
            }
        }
        let incoming = i + window - half;
        if incoming < n {
            let value = series[incoming];
            let pos = sorted.partition_point(|x| x.total_cmp(&value).is_lt());
            sorted.insert(pos, value);
        }
    }

    result
}

/// Centered rolling robust noise (scaled MAD per window).
pub fn rolling_robust_noise(series: &[f64], window: usize) -> Result<Vec<f64>> {
    if window == 0 {
        return Err(AnalysisError::InvalidConfiguration(
            "rolling window must be at least 1".into(),
        ));
    }
    let n = series.len();
    (0..n)
        .map(|i| {
            let (start, end) = centered_bounds(i, window, n);
            robust_noise(&series[start..end])
        })
        .collect()
}

/// Generic centered rolling window application.
fn rolling_apply<F>(series: &[f64], window: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let n = series.len();
    if n == 0 || window == 0 {
        return vec![f64::NAN; n];
    }

    (0..n)
        .map(|i| {
            let (start, end) = centered_bounds(i, window, n);
            f(&series[start..end])
        })
        .collect()
}

/// Remove slow baseline drift by subtracting a centered rolling median.
///
/// Returns residuals of the same length as the input.
///
/// # Errors
/// * `InvalidConfiguration` if `window` is zero
/// * `InsufficientData` if `window >= values.len()`
pub fn detrend(values: &[f64], window: usize) -> Result<Vec<f64>> {
    if window == 0 {
        return Err(AnalysisError::InvalidConfiguration(
            "detrend window must be at least 1".into(),
        ));
    }
    if window >= values.len() {
        return Err(AnalysisError::InsufficientData {
            needed: window + 1,
            got: values.len(),
        });
    }

    let baseline = rolling_median(values, window);
    Ok(values
        .iter()
        .zip(&baseline)
        .map(|(v, b)| v - b)
        .collect())
}

/// [`detrend`] applied to a series, keeping its timestamps.
pub fn detrend_series(series: &TimeSeries, window: usize) -> Result<TimeSeries> {
    let residuals = detrend(series.values(), window)?;
    series.with_values(residuals)
}

/// Convert a window length in time units into an odd number of samples.
pub fn window_in_samples(span: f64, cadence: f64) -> usize {
    if !(span > 0.0 && cadence > 0.0) {
        return 1;
    }
    let points = (span / cadence).round().max(1.0) as usize;
    if points.is_multiple_of(2) {
        points + 1
    } else {
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::stats::median;
    use approx::assert_relative_eq;

    fn naive_rolling_median(series: &[f64], window: usize) -> Vec<f64> {
        rolling_apply(series, window, median)
    }

    #[test]
    fn rolling_mean_centered() {
        let series = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = rolling_mean(&series, 3);

        // Edges are truncated: [1,2] and [4,5]
        assert_relative_eq!(result[0], 1.5, epsilon = 1e-10);
        assert_relative_eq!(result[1], 2.0, epsilon = 1e-10);
        assert_relative_eq!(result[2], 3.0, epsilon = 1e-10);
        assert_relative_eq!(result[4], 4.5, epsilon = 1e-10);
    }

    #[test]
    fn rolling_median_basic() {
        let series = vec![1.0, 5.0, 2.0, 8.0, 3.0];
        let result = rolling_median(&series, 3);

        assert_relative_eq!(result[1], 2.0, epsilon = 1e-10); // median(1,5,2)
        assert_relative_eq!(result[2], 5.0, epsilon = 1e-10); // median(5,2,8)
        assert_relative_eq!(result[3], 3.0, epsilon = 1e-10); // median(2,8,3)
    }

    #[test]
    fn rolling_median_matches_naive() {
        let series: Vec<f64> = (0..200)
            .map(|i| ((i * 37 % 101) as f64).sin() * 3.0 + (i % 7) as f64)
            .collect();
        for window in [1, 2, 3, 8, 15, 51, 250] {
            let fast = rolling_median(&series, window);
            let slow = naive_rolling_median(&series, window);
            for (a, b) in fast.iter().zip(&slow) {
                assert_relative_eq!(a, b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn rolling_median_handles_duplicates() {
        let series = vec![2.0, 2.0, 2.0, 1.0, 2.0, 2.0, 3.0, 3.0];
        assert_eq!(rolling_median(&series, 4), naive_rolling_median(&series, 4));
    }

    #[test]
    fn rolling_median_empty() {
        assert!(rolling_median(&[], 3).is_empty());
    }

    #[test]
    fn rolling_robust_noise_is_positive() {
        let series = vec![1.0; 20];
        let noise = rolling_robust_noise(&series, 5).unwrap();
        assert_eq!(noise.len(), 20);
        assert!(noise.iter().all(|&s| s > 0.0));
    }

    #[test]
    fn detrend_removes_linear_drift() {
        let values: Vec<f64> = (0..100).map(|i| 0.01 * i as f64).collect();
        let residuals = detrend(&values, 11).unwrap();

        assert_eq!(residuals.len(), 100);
        for r in &residuals[10..90] {
            assert_relative_eq!(*r, 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn detrend_rejects_large_window() {
        let values = vec![1.0; 10];
        assert!(matches!(
            detrend(&values, 10),
            Err(AnalysisError::InsufficientData { needed: 11, got: 10 })
        ));
        assert!(matches!(
            detrend(&values, 0),
            Err(AnalysisError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn window_in_samples_is_odd() {
        assert_eq!(window_in_samples(1.0, 0.1), 11);
        assert_eq!(window_in_samples(1.0, 0.25), 5);
        assert_eq!(window_in_samples(0.0, 0.1), 1);
        assert!(!window_in_samples(1.0, 0.006).is_multiple_of(2));
    }
}
