//! Normalization of flux and signal arrays.

use crate::error::{AnalysisError, Result};
use crate::utils::stats::{mean, median, NOISE_EPSILON};

/// Result of a scaling transform, containing parameters for inverse transform.
#[derive(Debug, Clone)]
pub struct ScaleResult {
    /// Transformed data
    pub data: Vec<f64>,
    /// Center value used (mean or median)
    pub center: f64,
    /// Scale value used (std dev or median)
    pub scale: f64,
}

impl ScaleResult {
    /// Inverse transform to recover original scale.
    pub fn inverse(&self) -> Vec<f64> {
        self.data
            .iter()
            .map(|&x| x * self.scale + self.center)
            .collect()
    }
}

/// Standardize data to zero mean and unit variance.
///
/// A constant series is centered but left unscaled.
pub fn standardize(series: &[f64]) -> ScaleResult {
    if series.is_empty() {
        return ScaleResult {
            data: Vec::new(),
            center: 0.0,
            scale: 1.0,
        };
    }

    let m = mean(series);
    let std = if series.len() > 1 {
        (series.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (series.len() - 1) as f64).sqrt()
    } else {
        0.0
    };

    let scale = if std < 1e-10 { 1.0 } else { std };
    let data = series.iter().map(|&x| (x - m) / scale).collect();

    ScaleResult {
        data,
        center: m,
        scale,
    }
}

/// Divide a flux array by its median so the out-of-transit level sits at 1.0.
///
/// # Errors
/// * `InsufficientData` for an empty slice
/// * `NumericalDegeneracy` if the median is zero or not finite
pub fn normalize_by_median(series: &[f64]) -> Result<ScaleResult> {
    if series.is_empty() {
        return Err(AnalysisError::InsufficientData { needed: 1, got: 0 });
    }
    let level = median(series);
    if !level.is_finite() || level.abs() < NOISE_EPSILON {
        return Err(AnalysisError::NumericalDegeneracy(format!(
            "cannot normalize by median {level}"
        )));
    }

    Ok(ScaleResult {
        data: series.iter().map(|&x| x / level).collect(),
        center: 0.0,
        scale: level,
    })
}

/// Subtract the mean.
pub fn center(series: &[f64]) -> Vec<f64> {
    if series.is_empty() {
        return Vec::new();
    }
    let m = mean(series);
    series.iter().map(|&x| x - m).collect()
}
