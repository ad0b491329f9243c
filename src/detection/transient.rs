//! Transient event detection.
//!
//! Flags statistically significant excursions from a rolling baseline in a
//! magnitude or flux series and groups them into events.
//!
//! Residuals are taken against a centered rolling median of
//! `baseline_window` samples and scaled by a rolling robust noise estimate
//! over the same window. Samples at or above the region level
//! `min(extension_sigma, sigma_threshold)` form candidate regions (gaps of up
//! to `gap_tolerance` samples are bridged); a region becomes an event when at
//! least `min_points` of its samples reach `sigma_threshold`, or when it
//! holds a single such sample that also reaches
//! `spike_factor * sigma_threshold`.
//!
//! `sigma_threshold` is the detector's sensitivity setting. While it stays at
//! or above `extension_sigma` the regions do not depend on it, so lowering it
//! never removes an event. Below `extension_sigma` the regions grow with the
//! threshold and neighbouring events may merge.
//!
//! Excursions lasting longer than about half the baseline window are
//! absorbed by the baseline and are not reported.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::core::TimeSeries;
use crate::error::{AnalysisError, Result};
use crate::transform::{rolling_median, rolling_robust_noise};

/// Units of the measured values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueScale {
    /// Astronomical magnitudes: smaller is brighter.
    Magnitude,
    /// Linear flux: larger is brighter.
    Flux,
}

/// Which excursions count as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Brightening,
    Dimming,
    Either,
}

/// Coarse event type from amplitude (magnitudes) and duration (days).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransientKind {
    StellarFlare,
    Nova,
    Supernova,
    DwarfNova,
    VariableStar,
    MinorTransient,
}

impl TransientKind {
    /// Classify an event by amplitude in magnitudes and duration in days.
    pub fn classify(amplitude_mag: f64, duration_days: f64) -> Self {
        if amplitude_mag > 5.0 {
            if duration_days < 1.0 {
                TransientKind::StellarFlare
            } else if duration_days < 100.0 {
                TransientKind::Nova
            } else {
                TransientKind::Supernova
            }
        } else if amplitude_mag > 2.0 {
            if duration_days < 10.0 {
                TransientKind::DwarfNova
            } else {
                TransientKind::VariableStar
            }
        } else {
            TransientKind::MinorTransient
        }
    }

    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            TransientKind::StellarFlare => "stellar flare",
            TransientKind::Nova => "nova",
            TransientKind::Supernova => "supernova",
            TransientKind::DwarfNova => "dwarf nova",
            TransientKind::VariableStar => "variable star",
            TransientKind::MinorTransient => "minor transient",
        }
    }
}

/// Configuration for [`TransientDetector`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransientConfig {
    /// Rolling baseline window (samples).
    pub baseline_window: usize,
    /// Significance a sample needs to count toward an event; the
    /// detection sensitivity (lower finds more).
    pub sigma_threshold: f64,
    /// Significance that extends an event region, capped at `sigma_threshold`.
    pub extension_sigma: f64,
    /// Largest run of quiet samples bridged inside one event.
    pub gap_tolerance: usize,
    /// Significant samples an event needs unless it is a strong spike.
    pub min_points: usize,
    /// A lone sample is kept if it reaches `spike_factor * sigma_threshold`.
    pub spike_factor: f64,
    /// Units of the values.
    pub scale: ValueScale,
    /// Which sign of excursion is searched.
    pub direction: Direction,
}

impl Default for TransientConfig {
    fn default() -> Self {
        Self {
            baseline_window: 51,
            sigma_threshold: 3.0,
            extension_sigma: 2.0,
            gap_tolerance: 1,
            min_points: 2,
            spike_factor: 2.0,
            scale: ValueScale::Magnitude,
            direction: Direction::Brightening,
        }
    }
}

impl TransientConfig {
    /// Set the baseline window.
    pub fn with_baseline_window(mut self, window: usize) -> Self {
        self.baseline_window = window;
        self
    }

    /// Set the detection threshold.
    pub fn with_sigma_threshold(mut self, sigma: f64) -> Self {
        self.sigma_threshold = sigma;
        self
    }

    /// Set the significance that extends an event region.
    pub fn with_extension_sigma(mut self, sigma: f64) -> Self {
        self.extension_sigma = sigma;
        self
    }

    /// Samples at or above this significance join a candidate region.
    pub fn region_level(&self) -> f64 {
        self.extension_sigma.min(self.sigma_threshold)
    }

    /// Set the gap tolerance.
    pub fn with_gap_tolerance(mut self, gap: usize) -> Self {
        self.gap_tolerance = gap;
        self
    }

    /// Set units and search direction.
    pub fn with_scale(mut self, scale: ValueScale, direction: Direction) -> Self {
        self.scale = scale;
        self.direction = direction;
        self
    }

    /// Check every parameter.
    pub fn validate(&self) -> Result<()> {
        if self.baseline_window < 3 {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "baseline_window must be >= 3, got {}",
                self.baseline_window
            )));
        }
        for (name, value) in [
            ("sigma_threshold", self.sigma_threshold),
            ("extension_sigma", self.extension_sigma),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(AnalysisError::InvalidConfiguration(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.spike_factor.is_nan() || self.spike_factor < 1.0 {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "spike_factor must be >= 1, got {}",
                self.spike_factor
            )));
        }
        if self.min_points == 0 {
            return Err(AnalysisError::InvalidConfiguration(
                "min_points must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

/// One detected excursion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransientEvent {
    /// Time of peak significance.
    pub timestamp: f64,
    /// Absolute deviation from the baseline at the peak (input units).
    pub amplitude: f64,
    /// Time from first to last sample of the event; one cadence for a single sample.
    pub duration_estimate: f64,
    /// Peak deviation in units of the local robust noise.
    pub significance_sigma: f64,
    /// First sample time.
    pub start_time: f64,
    /// Last sample time.
    pub end_time: f64,
    /// Start to peak.
    pub rise_time: f64,
    /// Peak to end.
    pub decay_time: f64,
    /// Measured value at the peak.
    pub peak_value: f64,
    /// Samples in the event region.
    pub n_points: usize,
    /// Amplitude/duration class.
    pub kind: TransientKind,
}

/// Rolling-baseline transient detector.
#[derive(Debug, Clone, Default)]
pub struct TransientDetector {
    config: TransientConfig,
}

impl TransientDetector {
    /// Create a detector, validating the configuration.
    pub fn new(config: TransientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The detector's configuration.
    pub fn config(&self) -> &TransientConfig {
        &self.config
    }

    /// Per-sample signed significance (positive in the searched direction)
    /// together with the rolling baseline.
    pub fn significance(&self, series: &TimeSeries) -> Result<(Vec<f64>, Vec<f64>)> {
        let cfg = &self.config;
        if cfg.baseline_window >= series.len() {
            return Err(AnalysisError::InsufficientData {
                needed: cfg.baseline_window + 1,
                got: series.len(),
            });
        }

        let values = series.values();
        let baseline = rolling_median(values, cfg.baseline_window);
        let residuals: Vec<f64> = values.iter().zip(&baseline).map(|(v, b)| v - b).collect();
        let noise = rolling_robust_noise(&residuals, cfg.baseline_window)?;

        let brighter_is_positive = match cfg.scale {
            ValueScale::Magnitude => -1.0,
            ValueScale::Flux => 1.0,
        };
        let significance = residuals
            .iter()
            .zip(&noise)
            .map(|(r, s)| {
                let z = brighter_is_positive * r / s;
                match cfg.direction {
                    Direction::Brightening => z,
                    Direction::Dimming => -z,
                    Direction::Either => z.abs(),
                }
            })
            .collect();

        Ok((significance, baseline))
    }

    /// Detect events, sorted by time.
    pub fn detect(&self, series: &TimeSeries) -> Result<Vec<TransientEvent>> {
        let cfg = &self.config;
        info!("transient search: {} samples", series.len());

        let (significance, baseline) = self.significance(series)?;
        let regions = group_regions(&significance, cfg.region_level(), cfg.gap_tolerance);
        debug!("transient search: {} candidate regions", regions.len());

        let cadence = series.median_cadence();
        let mut events = Vec::new();
        for (start, end) in regions {
            let window = &significance[start..=end];
            let n_strong = window.iter().filter(|&&s| s >= cfg.sigma_threshold).count();
            let (offset, peak) = window
                .iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |(bi, bv), (i, &v)| {
                    if v > bv {
                        (i, v)
                    } else {
                        (bi, bv)
                    }
                });

            let isolated_spike = n_strong >= 1 && peak >= cfg.spike_factor * cfg.sigma_threshold;
            if n_strong < cfg.min_points && !isolated_spike {
                continue;
            }

            events.push(self.build_event(series, &baseline, start, end, start + offset, peak, cadence));
        }

        info!("transient search: {} events", events.len());
        Ok(events)
    }

    fn build_event(
        &self,
        series: &TimeSeries,
        baseline: &[f64],
        start: usize,
        end: usize,
        peak_index: usize,
        significance: f64,
        cadence: f64,
    ) -> TransientEvent {
        let time = series.time();
        let values = series.values();
        let peak_value = values[peak_index];
        let amplitude = (peak_value - baseline[peak_index]).abs();

        let start_time = time[start];
        let end_time = time[end];
        let duration = if end > start { end_time - start_time } else { cadence };

        let amplitude_mag = match self.config.scale {
            ValueScale::Magnitude => amplitude,
            ValueScale::Flux => flux_ratio_to_magnitudes(peak_value, baseline[peak_index]),
        };

        TransientEvent {
            timestamp: time[peak_index],
            amplitude,
            duration_estimate: duration,
            significance_sigma: significance,
            start_time,
            end_time,
            rise_time: time[peak_index] - start_time,
            decay_time: end_time - time[peak_index],
            peak_value,
            n_points: end - start + 1,
            kind: TransientKind::classify(amplitude_mag, duration),
        }
    }
}

/// `2.5 |log10(value / baseline)|`, or 0 when either is non-positive.
fn flux_ratio_to_magnitudes(value: f64, baseline: f64) -> f64 {
    if value > 0.0 && baseline > 0.0 {
        2.5 * (value / baseline).log10().abs()
    } else {
        0.0
    }
}

/// Inclusive index ranges of samples at or above `level`, bridging gaps of
/// up to `gap_tolerance` samples.
fn group_regions(significance: &[f64], level: f64, gap_tolerance: usize) -> Vec<(usize, usize)> {
    let mut regions: Vec<(usize, usize)> = Vec::new();
    for (i, _) in significance.iter().enumerate().filter(|(_, &s)| s >= level) {
        match regions.last_mut() {
            Some((_, end)) if i - *end <= gap_tolerance + 1 => *end = i,
            _ => regions.push((i, i)),
        }
    }
    regions
}

/// Convenience wrapper: brightening events in a magnitude series.
pub fn detect_transient_events(
    time: &[f64],
    magnitude: &[f64],
    baseline_window: usize,
    sigma_threshold: f64,
) -> Result<Vec<TransientEvent>> {
    let config = TransientConfig::default()
        .with_baseline_window(baseline_window)
        .with_sigma_threshold(sigma_threshold);
    let series = TimeSeries::from_slices(time, magnitude)?;
    TransientDetector::new(config)?.detect(&series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::synthetic::standard_normal;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    // Bounded pseudo-noise: no sample exceeds about one robust sigma.
    fn quiet_magnitudes(n: usize, phase: f64) -> (Vec<f64>, Vec<f64>) {
        let time = (0..n).map(|i| i as f64 * 0.1).collect();
        let mags = (0..n).map(|i| 15.0 + 0.01 * (2.3 * i as f64 + phase).sin()).collect();
        (time, mags)
    }

    #[test]
    fn classify_follows_amplitude_and_duration() {
        assert_eq!(TransientKind::classify(6.0, 0.5), TransientKind::StellarFlare);
        assert_eq!(TransientKind::classify(6.0, 20.0), TransientKind::Nova);
        assert_eq!(TransientKind::classify(6.0, 200.0), TransientKind::Supernova);
        assert_eq!(TransientKind::classify(3.0, 5.0), TransientKind::DwarfNova);
        assert_eq!(TransientKind::classify(3.0, 50.0), TransientKind::VariableStar);
        assert_eq!(TransientKind::classify(0.5, 1.0), TransientKind::MinorTransient);
    }

    #[test]
    fn finds_brightening_event() {
        let (time, mut mags) = quiet_magnitudes(500, 0.1);
        for (k, m) in mags[200..206].iter_mut().enumerate() {
            *m -= 0.3 - 0.04 * k as f64;
        }

        let events = detect_transient_events(&time, &mags, 51, 5.0).unwrap();
        assert_eq!(events.len(), 1);
        let event = events[0];
        assert_relative_eq!(event.timestamp, 20.0, epsilon = 1e-9);
        assert!(event.start_time <= 20.0 && event.end_time >= 20.4);
        assert!(event.significance_sigma > 10.0);
        assert!((event.amplitude - 0.3).abs() < 0.05);
        assert_eq!(event.kind, TransientKind::MinorTransient);
        assert_relative_eq!(event.rise_time + event.decay_time, event.duration_estimate, epsilon = 1e-9);
    }

    #[test]
    fn dimming_is_ignored_when_searching_for_brightening() {
        let (time, mut mags) = quiet_magnitudes(400, 0.2);
        for m in &mut mags[100..104] {
            *m += 0.5;
        }
        let series = TimeSeries::new(time, mags).unwrap();

        let bright = TransientDetector::default().detect(&series).unwrap();
        assert!(bright.is_empty());

        let config = TransientConfig::default().with_scale(ValueScale::Magnitude, Direction::Dimming);
        let dim = TransientDetector::new(config).unwrap().detect(&series).unwrap();
        assert_eq!(dim.len(), 1);
    }

    #[test]
    fn single_spike_needs_the_stricter_threshold() {
        let (time, mut mags) = quiet_magnitudes(400, 0.3);
        mags[150] -= 0.05; // about 5 sigma
        mags[300] -= 0.5; // about 50 sigma
        let series = TimeSeries::new(time, mags).unwrap();

        let config = TransientConfig::default().with_sigma_threshold(4.0);
        let events = TransientDetector::new(config).unwrap().detect(&series).unwrap();
        assert_eq!(events.len(), 1);
        assert_relative_eq!(events[0].timestamp, 30.0, epsilon = 1e-9);
        assert_eq!(events[0].n_points, 1);
        assert_relative_eq!(events[0].duration_estimate, 0.1, epsilon = 1e-9);
    }

    #[test]
    fn flux_events_use_magnitude_classification() {
        let time: Vec<f64> = (0..300).map(|i| i as f64 * 0.01).collect();
        let mut rng = StdRng::seed_from_u64(4);
        let mut flux: Vec<f64> = (0..300).map(|_| 1000.0 + standard_normal(&mut rng)).collect();
        for f in &mut flux[100..110] {
            *f = 1000.0 * 200.0;
        }
        let series = TimeSeries::new(time, flux).unwrap();

        let config = TransientConfig::default().with_scale(ValueScale::Flux, Direction::Brightening);
        let events = TransientDetector::new(config).unwrap().detect(&series).unwrap();
        assert_eq!(events.len(), 1);
        // 2.5 log10(200) = 5.75 mag in under a day
        assert_eq!(events[0].kind, TransientKind::StellarFlare);
    }

    #[test]
    fn events_are_sorted_by_time() {
        let (time, mut mags) = quiet_magnitudes(600, 0.5);
        for start in [450, 100, 300] {
            for m in &mut mags[start..start + 4] {
                *m -= 0.4;
            }
        }
        let events = detect_transient_events(&time, &mags, 51, 3.0).unwrap();
        assert_eq!(events.len(), 3);
        for pair in events.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
    }

    // Three-level pattern: every 51-sample window holds 17 of each level, so
    // the baseline is exactly 15 and the robust noise is 1.4826 * 0.01.
    fn stepped_magnitudes(n: usize) -> (Vec<f64>, Vec<f64>) {
        let time = (0..n).map(|i| i as f64 * 0.1).collect();
        let mags = (0..n).map(|i| 15.0 + [-0.01, 0.0, 0.01][i % 3]).collect();
        (time, mags)
    }

    #[test]
    fn threshold_below_extension_level_still_groups_samples() {
        let (time, mut mags) = stepped_magnitudes(400);
        // Four adjacent samples at about 1.7 sigma.
        for m in &mut mags[201..205] {
            *m = 15.0 - 0.025;
        }
        let series = TimeSeries::new(time, mags).unwrap();

        let config = TransientConfig::default().with_sigma_threshold(1.5);
        assert_relative_eq!(config.region_level(), 1.5);
        let events = TransientDetector::new(config).unwrap().detect(&series).unwrap();
        assert_eq!(events.len(), 1);
        let event = events[0];
        assert_eq!(event.n_points, 4);
        assert_relative_eq!(event.start_time, 20.1, epsilon = 1e-9);
        assert_relative_eq!(event.end_time, 20.4, epsilon = 1e-9);
        assert!(event.significance_sigma >= 1.5 && event.significance_sigma < 2.0);

        assert!(TransientDetector::default().detect(&series).unwrap().is_empty());
    }

    #[test]
    fn gaps_are_bridged() {
        let sig = [0.0, 3.0, 0.0, 3.0, 0.0, 0.0, 3.0];
        assert_eq!(group_regions(&sig, 2.0, 1), vec![(1, 3), (6, 6)]);
        assert_eq!(group_regions(&sig, 2.0, 0), vec![(1, 1), (3, 3), (6, 6)]);
        assert_eq!(group_regions(&sig, 2.0, 2), vec![(1, 6)]);
    }

    #[test]
    fn window_longer_than_series_is_an_error() {
        let time: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let mags = vec![15.0; 20];
        assert!(matches!(
            detect_transient_events(&time, &mags, 51, 3.0),
            Err(AnalysisError::InsufficientData { .. })
        ));
        assert!(matches!(
            detect_transient_events(&time, &mags, 1, 3.0),
            Err(AnalysisError::InvalidConfiguration(_))
        ));
    }
}
