//! Sigma clipping of outlying samples.
//!
//! Scores are robust z-scores `(x - median) / robust_noise`, so a handful of
//! flares cannot inflate the scale they are measured against.

use crate::core::TimeSeries;
use crate::error::{AnalysisError, Result};
use crate::utils::stats::{median, robust_noise};

/// Which side of the distribution is clipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipDirection {
    /// Only values above the median (flares, cosmic rays in flux data).
    Upper,
    /// Values on either side.
    Both,
}

/// Result of outlier detection.
#[derive(Debug, Clone)]
pub struct OutlierResult {
    /// Indices of detected outliers.
    pub outlier_indices: Vec<usize>,
    /// Signed robust z-score of each point.
    pub scores: Vec<f64>,
    /// Threshold used for detection.
    pub threshold: f64,
    /// Median of the input.
    pub center: f64,
}

impl OutlierResult {
    /// Get the number of outliers detected.
    pub fn outlier_count(&self) -> usize {
        self.outlier_indices.len()
    }

    /// Check if a specific index is an outlier.
    pub fn is_outlier(&self, index: usize) -> bool {
        self.outlier_indices.binary_search(&index).is_ok()
    }

    /// Get outlier percentage.
    pub fn outlier_percentage(&self) -> f64 {
        if self.scores.is_empty() {
            0.0
        } else {
            100.0 * self.outlier_indices.len() as f64 / self.scores.len() as f64
        }
    }
}

/// Flag points further than `sigma` robust standard deviations from the median.
pub fn detect_outliers(series: &[f64], sigma: f64, direction: ClipDirection) -> Result<OutlierResult> {
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(AnalysisError::InvalidConfiguration(format!(
            "clip sigma must be positive, got {sigma}"
        )));
    }
    let noise = robust_noise(series)?;
    let center = median(series);

    let scores: Vec<f64> = series.iter().map(|x| (x - center) / noise).collect();
    let outlier_indices = scores
        .iter()
        .enumerate()
        .filter(|(_, &z)| match direction {
            ClipDirection::Upper => z > sigma,
            ClipDirection::Both => z.abs() > sigma,
        })
        .map(|(i, _)| i)
        .collect();

    Ok(OutlierResult {
        outlier_indices,
        scores,
        threshold: sigma,
        center,
    })
}

/// Drop outlying samples from a series, keeping their timestamps aligned.
pub fn sigma_clip(series: &TimeSeries, sigma: f64, direction: ClipDirection) -> Result<TimeSeries> {
    let result = detect_outliers(series.values(), sigma, direction)?;
    if result.outlier_count() == 0 {
        return Ok(series.clone());
    }

    let (time, values): (Vec<f64>, Vec<f64>) = series
        .time()
        .iter()
        .zip(series.values())
        .enumerate()
        .filter(|(i, _)| !result.is_outlier(*i))
        .map(|(_, (&t, &v))| (t, v))
        .unzip();

    TimeSeries::new(time, values)
}

/// Replace outlying samples with the median, preserving length.
pub fn replace_outliers(series: &[f64], sigma: f64, direction: ClipDirection) -> Result<Vec<f64>> {
    let result = detect_outliers(series, sigma, direction)?;
    let mut cleaned = series.to_vec();
    for &i in &result.outlier_indices {
        cleaned[i] = result.center;
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noisy_flat(n: usize) -> Vec<f64> {
        (0..n).map(|i| 1.0 + 0.001 * ((i * 7 % 11) as f64 - 5.0)).collect()
    }

    #[test]
    fn upper_clip_ignores_dips() {
        let mut values = noisy_flat(100);
        values[10] = 1.5;
        values[20] = 0.5;

        let result = detect_outliers(&values, 5.0, ClipDirection::Upper).unwrap();
        assert_eq!(result.outlier_indices, vec![10]);
        assert!(result.is_outlier(10));
        assert!(!result.is_outlier(20));

        let both = detect_outliers(&values, 5.0, ClipDirection::Both).unwrap();
        assert_eq!(both.outlier_indices, vec![10, 20]);
        assert!((both.outlier_percentage() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn sigma_clip_keeps_alignment() {
        let mut values = noisy_flat(50);
        values[5] = 2.0;
        let time: Vec<f64> = (0..50).map(|i| i as f64 * 0.1).collect();
        let series = TimeSeries::new(time, values).unwrap();

        let clipped = sigma_clip(&series, 5.0, ClipDirection::Upper).unwrap();
        assert_eq!(clipped.len(), 49);
        assert!(!clipped.time().iter().any(|&t| (t - 0.5).abs() < 1e-12));
    }

    #[test]
    fn replace_outliers_uses_median() {
        let mut values = noisy_flat(50);
        values[3] = -10.0;
        let cleaned = replace_outliers(&values, 5.0, ClipDirection::Both).unwrap();
        assert_eq!(cleaned.len(), 50);
        assert!((cleaned[3] - median(&values)).abs() < 1e-12);
    }

    #[test]
    fn rejects_non_positive_sigma() {
        assert!(matches!(
            detect_outliers(&[1.0, 2.0], 0.0, ClipDirection::Both),
            Err(AnalysisError::InvalidConfiguration(_))
        ));
    }
}
