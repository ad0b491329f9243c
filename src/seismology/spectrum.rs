//! Oscillation power spectra of light curves.

use serde::{Deserialize, Serialize};

use crate::core::TimeSeries;
use crate::detection::fft::power_spectrum;
use crate::detection::outlier::{replace_outliers, ClipDirection};
use crate::error::{AnalysisError, Result};
use crate::transform::{detrend, rolling_mean, standardize};
use crate::utils::stats::median;

/// Seconds per day; timestamps are in days, frequencies in μHz.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// One-sided power spectrum on a uniform frequency grid (μHz).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerSpectrum {
    /// Frequencies in μHz, ascending.
    pub frequencies: Vec<f64>,
    /// Power at each frequency.
    pub power: Vec<f64>,
}

impl PowerSpectrum {
    /// Pair frequencies with powers, checking shape and ordering.
    pub fn new(frequencies: Vec<f64>, power: Vec<f64>) -> Result<Self> {
        if frequencies.len() != power.len() {
            return Err(AnalysisError::DimensionMismatch {
                expected: frequencies.len(),
                got: power.len(),
            });
        }
        if let Some(index) = power.iter().position(|p| !p.is_finite()) {
            return Err(AnalysisError::NonFiniteValue { index });
        }
        if let Some(index) = frequencies.windows(2).position(|w| w[1] <= w[0]) {
            return Err(AnalysisError::NonMonotonicTime { index: index + 1 });
        }
        Ok(Self { frequencies, power })
    }

    pub fn len(&self) -> usize {
        self.power.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }

    /// Frequency spacing (μHz); 0 for fewer than two bins.
    pub fn resolution(&self) -> f64 {
        match self.frequencies.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }

    /// Median power (NaN when empty).
    pub fn median_power(&self) -> f64 {
        median(&self.power)
    }

    /// Index and value of the highest power, first on ties.
    pub fn max_power(&self) -> Option<(usize, f64)> {
        self.power
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best, (i, p)| match best {
                Some((_, bp)) if bp >= p => best,
                _ => Some((i, p)),
            })
    }

    /// The bins with `min <= frequency <= max`.
    pub fn band(&self, min: f64, max: f64) -> PowerSpectrum {
        let (frequencies, power) = self
            .frequencies
            .iter()
            .zip(&self.power)
            .filter(|(&f, _)| f >= min && f <= max)
            .map(|(&f, &p)| (f, p))
            .unzip();
        PowerSpectrum { frequencies, power }
    }

    /// Boxcar-smoothed copy over `bins` samples (centered, edges truncated).
    pub fn smoothed(&self, bins: usize) -> PowerSpectrum {
        if bins <= 1 {
            return self.clone();
        }
        PowerSpectrum {
            frequencies: self.frequencies.clone(),
            power: rolling_mean(&self.power, bins),
        }
    }
}

/// Nyquist frequency (μHz) for a cadence in days.
pub fn nyquist_uhz(cadence_days: f64) -> f64 {
    0.5 / (cadence_days * SECONDS_PER_DAY) * 1e6
}

/// Clean a light curve for spectral analysis.
///
/// Resamples onto the median cadence, replaces 5 sigma outliers by the
/// median, removes a rolling-median trend spanning `detrend_fraction` of the
/// series (at most 1000 samples; skipped below 11) and standardizes.
/// Returns the cleaned values with their cadence in days.
///
/// # Errors
/// * `IrregularSampling` if a gap exceeds `max_gap_cadences` median cadences
pub fn prepare_light_curve(
    series: &TimeSeries,
    max_gap_cadences: f64,
    detrend_fraction: f64,
) -> Result<(Vec<f64>, f64)> {
    let cadence = series.check_sampling(max_gap_cadences)?;
    let uniform = series.resample_uniform(cadence)?;
    let cleaned = replace_outliers(uniform.values(), 5.0, ClipDirection::Both)?;

    let window = ((cleaned.len() as f64 * detrend_fraction) as usize).min(1000) | 1;
    let flattened = if window > 10 && window < cleaned.len() {
        detrend(&cleaned, window)?
    } else {
        cleaned
    };

    Ok((standardize(&flattened).data, cadence))
}

/// Power spectrum of uniformly sampled, standardized values.
///
/// Power is `|X_k|^2 / n`, so white noise of unit variance has unit mean
/// power. The zero-frequency bin is dropped.
pub fn compute_power_spectrum(values: &[f64], cadence_days: f64) -> Result<PowerSpectrum> {
    if values.len() < 4 {
        return Err(AnalysisError::InsufficientData { needed: 4, got: values.len() });
    }
    if cadence_days.is_nan() || cadence_days <= 0.0 {
        return Err(AnalysisError::InvalidConfiguration(format!(
            "cadence must be positive, got {cadence_days}"
        )));
    }

    let n = values.len();
    let df = 1e6 / (n as f64 * cadence_days * SECONDS_PER_DAY);
    let power: Vec<f64> = power_spectrum(values).into_iter().skip(1).collect();
    let frequencies = (1..=power.len()).map(|k| k as f64 * df).collect();

    Ok(PowerSpectrum { frequencies, power })
}
