//! End-to-end asteroseismic analysis of a light curve.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::modes::{
    envelope_fwhm, identify_modes, large_separation, power_weighted_centroid, quality_metrics,
    rotational_splitting, significant_peaks, DeltaNuSource, OscillationMode, QualityMetrics,
    Rotation,
};
use super::scaling::StellarParameters;
use super::spectrum::{compute_power_spectrum, prepare_light_curve, PowerSpectrum};
use crate::core::TimeSeries;
use crate::error::{AnalysisError, Result};

/// Configuration for [`AsteroseismologyAnalyzer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeismologyConfig {
    /// Largest allowed gap, in median cadences, before the series is
    /// rejected rather than interpolated.
    pub max_gap_cadences: f64,
    /// Lower edge of the oscillation search band (μHz).
    pub min_frequency: f64,
    /// Upper edge of the search band (μHz), further capped at Nyquist.
    pub max_frequency: f64,
    /// Peaks must exceed this multiple of the median power.
    pub peak_threshold: f64,
    /// Upper bound on reported modes.
    pub max_modes: usize,
    /// Detrending window as a fraction of the series length.
    pub detrend_fraction: f64,
    /// Search window for the large separation, as multiples of the
    /// scaling-relation prior.
    pub delta_nu_window: (f64, f64),
    /// Boxcar width (bins) applied to the spectrum of a light curve.
    pub smoothing_bins: usize,
    /// Minimum number of samples.
    pub min_points: usize,
}

impl Default for SeismologyConfig {
    fn default() -> Self {
        Self {
            max_gap_cadences: 5.0,
            min_frequency: 5.0,
            max_frequency: 5000.0,
            peak_threshold: 10.0,
            max_modes: 20,
            detrend_fraction: 0.1,
            delta_nu_window: (0.6, 1.6),
            smoothing_bins: 5,
            min_points: 64,
        }
    }
}

impl SeismologyConfig {
    pub fn with_frequency_range(mut self, min: f64, max: f64) -> Self {
        self.min_frequency = min;
        self.max_frequency = max;
        self
    }

    pub fn with_peak_threshold(mut self, threshold: f64) -> Self {
        self.peak_threshold = threshold;
        self
    }

    pub fn with_max_modes(mut self, max_modes: usize) -> Self {
        self.max_modes = max_modes;
        self
    }

    pub fn with_max_gap_cadences(mut self, factor: f64) -> Self {
        self.max_gap_cadences = factor;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(AnalysisError::InvalidConfiguration(msg));

        if self.max_gap_cadences.is_nan() || self.max_gap_cadences < 1.0 {
            return invalid(format!("max_gap_cadences must be >= 1, got {}", self.max_gap_cadences));
        }
        if self.min_frequency.is_nan()
            || self.min_frequency < 0.0
            || self.max_frequency.is_nan()
            || self.max_frequency <= self.min_frequency
        {
            return invalid(format!(
                "frequency range must satisfy 0 <= min < max, got [{}, {}]",
                self.min_frequency, self.max_frequency
            ));
        }
        if self.peak_threshold.is_nan() || self.peak_threshold <= 0.0 {
            return invalid(format!("peak_threshold must be positive, got {}", self.peak_threshold));
        }
        if self.max_modes == 0 {
            return invalid("max_modes must be >= 1".into());
        }
        if self.detrend_fraction.is_nan() || self.detrend_fraction < 0.0 || self.detrend_fraction >= 1.0 {
            return invalid(format!("detrend_fraction must lie in [0, 1), got {}", self.detrend_fraction));
        }
        let (lo, hi) = self.delta_nu_window;
        if lo.is_nan() || lo <= 0.0 || hi.is_nan() || hi <= lo {
            return invalid(format!("delta_nu_window must satisfy 0 < lo < hi, got ({lo}, {hi})"));
        }
        if self.min_points < 16 {
            return invalid(format!("min_points must be >= 16, got {}", self.min_points));
        }
        Ok(())
    }
}

/// Result of an asteroseismic analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeismicAnalysis {
    /// Spectrum of the search band.
    pub power_spectrum: PowerSpectrum,
    pub stellar_parameters: StellarParameters,
    /// Identified modes, by frequency.
    pub detected_modes: Vec<OscillationMode>,
    pub delta_nu_source: DeltaNuSource,
    /// Width of the oscillation envelope (μHz).
    pub envelope_fwhm: f64,
    pub rotation: Option<Rotation>,
    pub quality: QualityMetrics,
}

impl SeismicAnalysis {
    pub fn nu_max(&self) -> f64 {
        self.stellar_parameters.nu_max
    }

    pub fn delta_nu(&self) -> f64 {
        self.stellar_parameters.delta_nu
    }
}

/// Solar-like oscillation analyzer.
///
/// Timestamps are in days; frequencies are reported in μHz.
#[derive(Debug, Clone, Default)]
pub struct AsteroseismologyAnalyzer {
    config: SeismologyConfig,
}

impl AsteroseismologyAnalyzer {
    pub fn new(config: SeismologyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SeismologyConfig {
        &self.config
    }

    /// Analyze a light curve.
    ///
    /// # Errors
    /// * `InsufficientData` below `min_points` samples
    /// * `IrregularSampling` if a gap is too large to interpolate across
    pub fn analyze(&self, series: &TimeSeries) -> Result<SeismicAnalysis> {
        self.config.validate()?;
        series.require_len(self.config.min_points)?;
        info!("seismic analysis: {} samples", series.len());

        let (values, cadence) = prepare_light_curve(
            series,
            self.config.max_gap_cadences,
            self.config.detrend_fraction,
        )?;
        let spectrum =
            compute_power_spectrum(&values, cadence)?.smoothed(self.config.smoothing_bins);
        debug!(
            "seismic analysis: {} frequency bins at {:.4} μHz",
            spectrum.len(),
            spectrum.resolution()
        );

        self.analyze_spectrum(&spectrum)
    }

    /// Analyze a precomputed power spectrum (μHz).
    pub fn analyze_spectrum(&self, spectrum: &PowerSpectrum) -> Result<SeismicAnalysis> {
        let cfg = &self.config;
        let band = spectrum.band(cfg.min_frequency, cfg.max_frequency);
        if band.len() < 3 {
            return Err(AnalysisError::InsufficientData { needed: 3, got: band.len() });
        }

        let peaks = significant_peaks(&band, cfg.peak_threshold);
        debug!("seismic analysis: {} significant peaks", peaks.len());

        let nu_max = match power_weighted_centroid(&band, &peaks) {
            Some(nu_max) => nu_max,
            None => {
                debug!("no significant peaks, using the highest bin for nu_max");
                band.max_power()
                    .map(|(i, _)| band.frequencies[i])
                    .ok_or_else(|| AnalysisError::NumericalDegeneracy("empty spectrum".into()))?
            }
        };

        let (delta_nu, delta_nu_source) = large_separation(&band, &peaks, nu_max, cfg.delta_nu_window);
        let detected_modes = identify_modes(&band, &peaks, nu_max, delta_nu, cfg.max_modes);
        let stellar_parameters = StellarParameters::from_seismic(nu_max, delta_nu)?;
        let envelope_fwhm = envelope_fwhm(&band, &peaks, nu_max);
        let rotation = rotational_splitting(&detected_modes);
        let quality = quality_metrics(&band, &detected_modes);

        info!(
            "seismic analysis: nu_max {:.2} μHz, delta_nu {:.3} μHz ({:?}), {} modes",
            nu_max,
            delta_nu,
            delta_nu_source,
            detected_modes.len()
        );

        Ok(SeismicAnalysis {
            power_spectrum: band,
            stellar_parameters,
            detected_modes,
            delta_nu_source,
            envelope_fwhm,
            rotation,
            quality,
        })
    }
}

/// Analyze a light curve with the default configuration.
pub fn analyze_stellar_vibrations(time: &[f64], flux: &[f64]) -> Result<SeismicAnalysis> {
    let series = TimeSeries::from_slices(time, flux)?;
    AsteroseismologyAnalyzer::default().analyze(&series)
}
