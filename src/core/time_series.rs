//! TimeSeries data structure for representing sampled measurements.

use crate::error::{AnalysisError, Result};
use crate::utils::stats::median;

/// An ordered sequence of `(timestamp, value)` pairs.
///
/// Timestamps are strictly increasing and every value is finite; both are
/// checked on construction. The series is never mutated after that:
/// transformations return new series.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    time: Vec<f64>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Create a validated series from owned time and value vectors.
    pub fn new(time: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        if time.len() != values.len() {
            return Err(AnalysisError::DimensionMismatch {
                expected: time.len(),
                got: values.len(),
            });
        }

        if let Some(index) = time.iter().position(|t| !t.is_finite()) {
            return Err(AnalysisError::NonFiniteValue { index });
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(AnalysisError::NonFiniteValue { index });
        }

        for i in 1..time.len() {
            if time[i] <= time[i - 1] {
                return Err(AnalysisError::NonMonotonicTime { index: i });
            }
        }

        Ok(Self { time, values })
    }

    /// Create a validated series by copying borrowed slices.
    pub fn from_slices(time: &[f64], values: &[f64]) -> Result<Self> {
        Self::new(time.to_vec(), values.to_vec())
    }

    /// Build a series sampled at `0, 1/sample_rate, 2/sample_rate, ...`.
    pub fn from_sample_rate(values: &[f64], sample_rate: f64) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "sample_rate must be positive, got {sample_rate}"
            )));
        }
        let time = (0..values.len()).map(|i| i as f64 / sample_rate).collect();
        Self::new(time, values.to_vec())
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Timestamps.
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Fail with `InsufficientData` unless the series holds at least `needed` points.
    pub fn require_len(&self, needed: usize) -> Result<()> {
        if self.len() < needed {
            return Err(AnalysisError::InsufficientData {
                needed,
                got: self.len(),
            });
        }
        Ok(())
    }

    /// Time span between the first and last sample (0 for fewer than two points).
    pub fn baseline(&self) -> f64 {
        match (self.time.first(), self.time.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    /// Differences between consecutive timestamps.
    pub fn cadences(&self) -> Vec<f64> {
        self.time.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Median sampling interval (NaN for fewer than two points).
    pub fn median_cadence(&self) -> f64 {
        median(&self.cadences())
    }

    /// Largest sampling interval (0 for fewer than two points).
    pub fn max_gap(&self) -> f64 {
        self.cadences().into_iter().fold(0.0, f64::max)
    }

    /// Check that no gap exceeds `max_gap_cadences` times the median cadence.
    ///
    /// Returns the median cadence on success.
    pub fn check_sampling(&self, max_gap_cadences: f64) -> Result<f64> {
        self.require_len(2)?;
        let cadence = self.median_cadence();
        let max_gap = self.max_gap();
        if max_gap > max_gap_cadences * cadence {
            return Err(AnalysisError::IrregularSampling {
                max_gap,
                median_cadence: cadence,
                allowed_factor: max_gap_cadences,
            });
        }
        Ok(cadence)
    }

    /// Linearly interpolate onto a uniform grid starting at the first timestamp.
    ///
    /// The grid never extends past the last timestamp.
    pub fn resample_uniform(&self, cadence: f64) -> Result<TimeSeries> {
        if !(cadence.is_finite() && cadence > 0.0) {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "resampling cadence must be positive, got {cadence}"
            )));
        }
        self.require_len(2)?;

        let start = self.time[0];
        // Tolerate rounding so a grid that already matches the cadence keeps its last point.
        let n_out = (self.baseline() / cadence + 1e-9).floor() as usize + 1;
        let mut time = Vec::with_capacity(n_out);
        let mut values = Vec::with_capacity(n_out);

        let mut j = 0;
        for k in 0..n_out {
            let t = start + k as f64 * cadence;
            while j + 2 < self.len() && self.time[j + 1] < t {
                j += 1;
            }
            let (t0, t1) = (self.time[j], self.time[j + 1]);
            let (v0, v1) = (self.values[j], self.values[j + 1]);
            let frac = ((t - t0) / (t1 - t0)).clamp(0.0, 1.0);
            time.push(t);
            values.push(v0 + frac * (v1 - v0));
        }

        Ok(TimeSeries { time, values })
    }

    /// A new series with the same timestamps and replacement values.
    pub fn with_values(&self, values: Vec<f64>) -> Result<TimeSeries> {
        TimeSeries::new(self.time.clone(), values)
    }
}
