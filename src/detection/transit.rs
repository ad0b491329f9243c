//! Transit search in stellar light curves.
//!
//! The pipeline:
//! 1. Clip upward outliers (flares) and normalize the flux to a median of 1.
//! 2. Optionally remove slow variability with a rolling median.
//! 3. Compute a box periodogram over a log-spaced period grid that only
//!    contains periods repeating at least twice in the baseline.
//! 4. Refine each of the strongest periodogram peaks on a fine grid. A
//!    peak whose odd and even events disagree (one half dipped, the other
//!    flat) is a half-period alias and is replaced by a fit at twice the
//!    period.
//! 5. Measure depth, duration and signal-to-noise from the folded curve.
//! 6. Walk the candidates in SNR order. Harmonics of accepted candidates are
//!    dropped; the others are re-measured with the accepted transits masked
//!    and dropped if their depth does not survive. Then the SNR threshold is
//!    applied.
//!
//! The radius estimate assumes a Sun-like host star: `Rp = sqrt(depth) * R_sun`.
//! It ignores limb darkening, grazing geometry and dilution, so treat it as
//! an order-of-magnitude indication rather than a measurement.

use std::collections::BTreeSet;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::outlier::{sigma_clip, ClipDirection};
use super::peaks::find_peaks;
use super::periodogram::{period_grid, periodogram_with, BoxFit, BoxSearch, PeriodogramResult};
use crate::core::TimeSeries;
use crate::error::{AnalysisError, Result};
use crate::transform::{normalize_by_median, rolling_median, window_in_samples};
use crate::utils::stats::{mean, median, robust_noise};

/// Solar radius in Earth radii.
pub const SOLAR_RADIUS_EARTH: f64 = 109.1;

/// Fine-grid points per refinement.
const REFINE_POINTS: usize = 21;

/// Significance, in standard errors, used by the odd/even alias test.
const ALIAS_SIGMA: f64 = 3.0;

/// Fraction of its depth a candidate must keep once stronger candidates'
/// transits are masked.
const MASKED_DEPTH_RATIO: f64 = 0.5;

/// Configuration for [`TransitDetector`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitConfig {
    /// Detection sensitivity; the SNR threshold is `reference_snr / sensitivity`.
    pub sensitivity: f64,
    /// SNR threshold at unit sensitivity.
    pub reference_snr: f64,
    /// Shortest trial period (days).
    pub min_period: f64,
    /// Longest trial period (days); `None` means half the baseline.
    pub max_period: Option<f64>,
    /// Shortest trial transit duration (days).
    pub min_duration: f64,
    /// Longest trial transit duration (days).
    pub max_duration: f64,
    /// Number of trial durations between the two bounds.
    pub n_durations: usize,
    /// Period grid oversampling factor.
    pub oversampling: f64,
    /// Upper bound on the period grid size.
    pub max_grid_points: usize,
    /// Periodogram peaks refined and characterized.
    pub top_peaks: usize,
    /// Rolling-median detrend window (days); `None` disables detrending.
    pub detrend_window: Option<f64>,
    /// Upward outliers beyond this many robust sigmas are removed.
    pub clip_sigma: f64,
    /// Minimum in-transit samples for a candidate.
    pub min_points_in_transit: usize,
    /// Relative tolerance for calling two periods harmonics.
    pub harmonic_tolerance: f64,
    /// Minimum number of samples in the light curve.
    pub min_points: usize,
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            sensitivity: 3.0,
            reference_snr: 21.0,
            min_period: 0.5,
            max_period: None,
            min_duration: 0.04,
            max_duration: 0.5,
            n_durations: 6,
            oversampling: 3.0,
            max_grid_points: 50_000,
            top_peaks: 5,
            detrend_window: Some(1.0),
            clip_sigma: 5.0,
            min_points_in_transit: 3,
            harmonic_tolerance: 0.02,
            min_points: 20,
        }
    }
}

impl TransitConfig {
    /// Set the detection sensitivity.
    pub fn with_sensitivity(mut self, sensitivity: f64) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Set the trial period range.
    pub fn with_period_range(mut self, min_period: f64, max_period: Option<f64>) -> Self {
        self.min_period = min_period;
        self.max_period = max_period;
        self
    }

    /// Set the trial durations.
    pub fn with_durations(mut self, min_duration: f64, max_duration: f64, n: usize) -> Self {
        self.min_duration = min_duration;
        self.max_duration = max_duration;
        self.n_durations = n;
        self
    }

    /// Set the period grid oversampling factor.
    pub fn with_oversampling(mut self, oversampling: f64) -> Self {
        self.oversampling = oversampling;
        self
    }

    /// Set or disable the detrend window.
    pub fn with_detrend_window(mut self, window: Option<f64>) -> Self {
        self.detrend_window = window;
        self
    }

    /// Set the number of periodogram peaks examined.
    pub fn with_top_peaks(mut self, top_peaks: usize) -> Self {
        self.top_peaks = top_peaks;
        self
    }

    /// SNR a candidate must reach to be reported.
    pub fn snr_threshold(&self) -> f64 {
        self.reference_snr / self.sensitivity
    }

    /// Check every parameter, naming the first one out of range.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(AnalysisError::InvalidConfiguration(msg));

        if !(self.sensitivity > 0.0 && self.sensitivity.is_finite()) {
            return invalid(format!("sensitivity must be positive, got {}", self.sensitivity));
        }
        if !(self.reference_snr > 0.0 && self.reference_snr.is_finite()) {
            return invalid(format!(
                "reference_snr must be positive, got {}",
                self.reference_snr
            ));
        }
        if !(self.min_period > 0.0 && self.min_period.is_finite()) {
            return invalid(format!("min_period must be positive, got {}", self.min_period));
        }
        if let Some(max) = self.max_period {
            if max.is_nan() || self.min_period >= max {
                return invalid(format!(
                    "min_period ({}) >= max_period ({max})",
                    self.min_period
                ));
            }
        }
        if !(self.min_duration > 0.0 && self.max_duration >= self.min_duration) {
            return invalid(format!(
                "durations must satisfy 0 < min_duration ({}) <= max_duration ({})",
                self.min_duration, self.max_duration
            ));
        }
        if self.n_durations == 0 || self.top_peaks == 0 || self.min_points_in_transit == 0 {
            return invalid("n_durations, top_peaks and min_points_in_transit must be >= 1".into());
        }
        if self.oversampling.is_nan() || self.oversampling <= 0.0 || self.max_grid_points < 2 {
            return invalid(format!(
                "oversampling ({}) must be positive and max_grid_points ({}) >= 2",
                self.oversampling, self.max_grid_points
            ));
        }
        if let Some(window) = self.detrend_window {
            if window.is_nan() || window <= 0.0 {
                return invalid(format!("detrend_window must be positive, got {window}"));
            }
        }
        if self.clip_sigma.is_nan() || self.clip_sigma <= 0.0 {
            return invalid(format!("clip_sigma must be positive, got {}", self.clip_sigma));
        }
        if !(0.0..0.5).contains(&self.harmonic_tolerance) {
            return invalid(format!(
                "harmonic_tolerance must be in [0, 0.5), got {}",
                self.harmonic_tolerance
            ));
        }
        if self.min_points < 2 {
            return invalid(format!("min_points must be >= 2, got {}", self.min_points));
        }
        Ok(())
    }
}

/// A periodic transit-like signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitCandidate {
    /// Orbital period (days).
    pub period_days: f64,
    /// Time of a mid-transit (same units as the input timestamps).
    pub epoch: f64,
    /// Fractional flux deficit in transit.
    pub depth_fraction: f64,
    /// Transit duration (hours).
    pub duration_hours: f64,
    /// `depth / (noise / sqrt(n_in_transit))`.
    pub signal_to_noise: f64,
    /// Planet radius assuming a solar-radius host (Earth radii).
    pub estimated_radius_earth: f64,
    /// Box periodogram power at the refined period.
    pub power: f64,
    /// Number of individual transits that contain data.
    pub n_transits: usize,
}

impl TransitCandidate {
    /// Duration in days.
    pub fn duration_days(&self) -> f64 {
        self.duration_hours / 24.0
    }

    /// Whether `period` is within `tolerance` of an integer multiple or
    /// fraction of this candidate's period (including the period itself).
    pub fn is_harmonic_of(&self, period: f64, tolerance: f64) -> bool {
        let ratio = if period >= self.period_days {
            period / self.period_days
        } else {
            self.period_days / period
        };
        let rounded = ratio.round();
        rounded >= 1.0 && (ratio / rounded - 1.0).abs() < tolerance
    }
}

/// Full output of a transit search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitSearch {
    /// Candidates above the SNR threshold, best first.
    pub candidates: Vec<TransitCandidate>,
    /// The coarse periodogram (empty if no period fits the baseline).
    pub periodogram: PeriodogramResult,
    /// SNR threshold that was applied.
    pub snr_threshold: f64,
}

/// Box-periodogram transit detector.
#[derive(Debug, Clone)]
pub struct TransitDetector {
    config: TransitConfig,
    search: BoxSearch,
}

impl Default for TransitDetector {
    fn default() -> Self {
        Self {
            config: TransitConfig::default(),
            search: BoxSearch::default(),
        }
    }
}

impl TransitDetector {
    /// Create a detector, validating the configuration.
    pub fn new(config: TransitConfig) -> Result<Self> {
        config.validate()?;
        let search = BoxSearch::geometric(
            config.min_duration,
            config.max_duration,
            config.n_durations,
            config.min_points_in_transit,
        )?;
        Ok(Self { config, search })
    }

    /// The detector's configuration.
    pub fn config(&self) -> &TransitConfig {
        &self.config
    }

    /// Detect transiting planets, best SNR first.
    pub fn detect(&self, series: &TimeSeries) -> Result<Vec<TransitCandidate>> {
        Ok(self.search(series)?.candidates)
    }

    /// Run the full search, keeping the periodogram for inspection.
    pub fn search(&self, series: &TimeSeries) -> Result<TransitSearch> {
        let cfg = &self.config;
        series.require_len(cfg.min_points)?;
        info!(
            "transit search: {} points over {:.3} days",
            series.len(),
            series.baseline()
        );

        let prepared = self.prepare(series)?;
        let grid = period_grid(
            cfg.min_period,
            cfg.max_period.unwrap_or(f64::INFINITY),
            prepared.baseline(),
            cfg.min_duration,
            cfg.oversampling,
            cfg.max_grid_points,
        )?;

        let periodogram = periodogram_with(&prepared, &grid, &self.search)?;
        if periodogram.is_empty() {
            info!("transit search: baseline too short for two transits, no candidates");
            return Ok(TransitSearch {
                candidates: Vec::new(),
                periodogram,
                snr_threshold: cfg.snr_threshold(),
            });
        }

        // Zero padding lets a maximum at either end of the grid count as a peak.
        let mut padded = Vec::with_capacity(grid.len() + 2);
        padded.push(0.0);
        padded.extend(periodogram.fits.iter().map(|f| f.power));
        padded.push(0.0);
        let peaks: Vec<usize> = find_peaks(&padded, 0.0, cfg.top_peaks)
            .into_iter()
            .map(|i| i - 1)
            .filter(|&i| periodogram.fits[i].valid && periodogram.fits[i].power > 0.0)
            .collect();
        debug!("transit search: {} periodogram peaks to refine", peaks.len());

        let mut candidates = Vec::new();
        for &index in &peaks {
            let Some((fit, epoch)) = self.refine(&prepared, &grid, index)? else {
                continue;
            };
            let (fit, epoch) = self.resolve_half_period(&prepared, fit, epoch)?;
            if let Some(candidate) = self.characterize(&prepared, &fit, epoch)? {
                candidates.push((candidate, fit));
            }
        }

        candidates.sort_by(|(a, _), (b, _)| {
            b.signal_to_noise
                .total_cmp(&a.signal_to_noise)
                .then(a.period_days.total_cmp(&b.period_days))
        });

        let mut kept: Vec<TransitCandidate> = Vec::new();
        let mut remaining = prepared.clone();
        for (candidate, fit) in candidates {
            let harmonic = kept
                .iter()
                .any(|k| k.is_harmonic_of(candidate.period_days, cfg.harmonic_tolerance));
            if harmonic {
                continue;
            }
            if !kept.is_empty() && !self.survives_masking(&remaining, &fit, &candidate)? {
                debug!(
                    "transit search: {:.4} d vanishes once stronger transits are masked",
                    candidate.period_days
                );
                continue;
            }
            remaining = mask_transits(&remaining, &candidate)?;
            kept.push(candidate);
        }

        let threshold = cfg.snr_threshold();
        kept.retain(|c| c.signal_to_noise >= threshold);

        info!(
            "transit search: {} candidates above SNR {:.2}",
            kept.len(),
            threshold
        );
        Ok(TransitSearch {
            candidates: kept,
            periodogram,
            snr_threshold: threshold,
        })
    }

    /// Clip flares, normalize and detrend.
    fn prepare(&self, series: &TimeSeries) -> Result<TimeSeries> {
        let cfg = &self.config;
        let clipped = sigma_clip(series, cfg.clip_sigma, ClipDirection::Upper)?;
        if clipped.len() < series.len() {
            debug!(
                "transit search: clipped {} upward outliers",
                series.len() - clipped.len()
            );
        }
        clipped.require_len(cfg.min_points)?;

        let normalized = normalize_by_median(clipped.values())?.data;

        let Some(span) = cfg.detrend_window else {
            return clipped.with_values(normalized);
        };
        let window = window_in_samples(span, clipped.median_cadence());
        if window < 3 || window >= clipped.len() / 2 {
            debug!(
                "transit search: detrend skipped (window {window} samples for {} points)",
                clipped.len()
            );
            return clipped.with_values(normalized);
        }

        let baseline = rolling_median(&normalized, window);
        let flattened = normalized
            .iter()
            .zip(&baseline)
            .map(|(f, b)| f - b + 1.0)
            .collect();
        clipped.with_values(flattened)
    }

    /// Re-run the box search on a fine grid within one coarse step of a peak.
    ///
    /// Returns the best fine-grid fit and its absolute epoch.
    fn refine(
        &self,
        series: &TimeSeries,
        grid: &[f64],
        index: usize,
    ) -> Result<Option<(BoxFit, f64)>> {
        let period = grid[index];
        let lower = if index > 0 { grid[index - 1] } else { period };
        let upper = if index + 1 < grid.len() { grid[index + 1] } else { period };

        let fine: Vec<f64> = (0..REFINE_POINTS)
            .map(|k| lower + (upper - lower) * k as f64 / (REFINE_POINTS - 1) as f64)
            .collect();

        let result = periodogram_with(series, &fine, &self.search)?;
        Ok(result.best().map(|fit| (*fit, result.epoch_of(fit))))
    }

    /// Replace a half-period alias by the fit at twice its period.
    ///
    /// At half the true period only every other folded event holds a
    /// transit. The fit is kept unless one parity is consistent with zero
    /// depth while the other is significantly deeper, and the doubled period
    /// still fits the searched range.
    fn resolve_half_period(
        &self,
        series: &TimeSeries,
        fit: BoxFit,
        epoch: f64,
    ) -> Result<(BoxFit, f64)> {
        let cfg = &self.config;
        let doubled = 2.0 * fit.period;
        let upper = cfg
            .max_period
            .unwrap_or(f64::INFINITY)
            .min(series.baseline() / 2.0);
        if doubled > upper {
            return Ok((fit, epoch));
        }

        let Some(depths) =
            parity_depths(series, fit.period, epoch, fit.duration, cfg.min_points_in_transit)?
        else {
            return Ok((fit, epoch));
        };
        if !is_half_period_alias(&depths) {
            return Ok((fit, epoch));
        }

        let result = periodogram_with(series, &[doubled], &self.search)?;
        match result.best() {
            Some(refit) if refit.power > 0.0 => {
                debug!(
                    "transit search: {:.4} d is a half-period alias, using {:.4} d",
                    fit.period, doubled
                );
                Ok((*refit, result.epoch_of(refit)))
            }
            _ => Ok((fit, epoch)),
        }
    }

    /// Whether a candidate keeps its depth on data with the accepted
    /// candidates' transits removed.
    fn survives_masking(
        &self,
        remaining: &TimeSeries,
        fit: &BoxFit,
        candidate: &TransitCandidate,
    ) -> Result<bool> {
        Ok(self
            .characterize(remaining, fit, candidate.epoch)?
            .is_some_and(|c| c.depth_fraction >= MASKED_DEPTH_RATIO * candidate.depth_fraction))
    }

    /// Measure a refined fit on the folded light curve.
    fn characterize(
        &self,
        series: &TimeSeries,
        fit: &BoxFit,
        epoch: f64,
    ) -> Result<Option<TransitCandidate>> {
        if fit.power <= 0.0 || fit.duration <= 0.0 {
            return Ok(None);
        }
        let period = fit.period;

        // Signed time from the nearest mid-transit.
        let offsets: Vec<f64> = series
            .time()
            .iter()
            .map(|&t| (((t - epoch) / period + 0.5).rem_euclid(1.0) - 0.5) * period)
            .collect();
        let flux = series.values();

        let out_of_box: Vec<f64> = offsets
            .iter()
            .zip(flux)
            .filter(|(o, _)| o.abs() > fit.duration)
            .map(|(_, &f)| f)
            .collect();
        if out_of_box.is_empty() {
            return Ok(None);
        }
        let level = median(&out_of_box);

        let duration = half_depth_duration(&offsets, flux, fit.duration, fit.depth, level);

        let mut in_transit = Vec::new();
        let mut out_transit = Vec::new();
        let mut transit_numbers = BTreeSet::new();
        for ((&o, &f), &t) in offsets.iter().zip(flux).zip(series.time()) {
            if o.abs() < duration / 2.0 {
                in_transit.push(f);
                transit_numbers.insert(((t - epoch) / period).round() as i64);
            } else if o.abs() >= duration {
                out_transit.push(f);
            }
        }

        if in_transit.len() < self.config.min_points_in_transit || out_transit.is_empty() {
            return Ok(None);
        }

        let median_out = median(&out_transit);
        let depth = (median_out - median(&in_transit)) / median_out;
        if depth.is_nan() || depth <= 0.0 {
            return Ok(None);
        }

        let noise = robust_noise(&out_transit)?;
        let n_in = in_transit.len() as f64;
        let snr = depth / (noise / n_in.sqrt());

        Ok(Some(TransitCandidate {
            period_days: period,
            epoch,
            depth_fraction: depth,
            duration_hours: duration * 24.0,
            signal_to_noise: snr,
            estimated_radius_earth: depth.sqrt() * SOLAR_RADIUS_EARTH,
            power: fit.power,
            n_transits: transit_numbers.len(),
        }))
    }
}

/// Mean depth below the out-of-transit median and its standard error.
#[derive(Debug, Clone, Copy, PartialEq)]
struct EventDepth {
    depth: f64,
    error: f64,
}

/// Depths of the even- and odd-numbered events of a fold, counted from
/// `epoch`. `None` when either parity has fewer than `min_points` samples
/// in transit or nothing lies out of transit.
fn parity_depths(
    series: &TimeSeries,
    period: f64,
    epoch: f64,
    duration: f64,
    min_points: usize,
) -> Result<Option<[EventDepth; 2]>> {
    let mut inside: [Vec<f64>; 2] = [Vec::new(), Vec::new()];
    let mut outside = Vec::new();
    for (&t, &f) in series.time().iter().zip(series.values()) {
        let cycles = (t - epoch) / period;
        let number = cycles.round();
        let offset = (cycles - number) * period;
        if offset.abs() < duration / 2.0 {
            inside[(number as i64).rem_euclid(2) as usize].push(f);
        } else if offset.abs() >= duration {
            outside.push(f);
        }
    }
    if outside.is_empty() || inside.iter().any(|events| events.len() < min_points) {
        return Ok(None);
    }

    let level = median(&outside);
    let noise = robust_noise(&outside)?;
    Ok(Some(inside.map(|events| EventDepth {
        depth: level - mean(&events),
        error: noise / (events.len() as f64).sqrt(),
    })))
}

/// One parity is flat within `ALIAS_SIGMA` errors while the other is both
/// significant and significantly deeper.
fn is_half_period_alias(depths: &[EventDepth; 2]) -> bool {
    let [a, b] = *depths;
    let (deep, shallow) = if a.depth >= b.depth { (a, b) } else { (b, a) };
    let combined = deep.error.hypot(shallow.error);
    shallow.depth < ALIAS_SIGMA * shallow.error
        && deep.depth > ALIAS_SIGMA * deep.error
        && deep.depth - shallow.depth > ALIAS_SIGMA * combined
}

/// Drop samples within one transit duration of any of `candidate`'s
/// mid-transit times.
fn mask_transits(series: &TimeSeries, candidate: &TransitCandidate) -> Result<TimeSeries> {
    let period = candidate.period_days;
    let half_width = candidate.duration_days();
    let (time, values): (Vec<f64>, Vec<f64>) = series
        .time()
        .iter()
        .zip(series.values())
        .filter(|(&t, _)| {
            let cycles = (t - candidate.epoch) / period;
            ((cycles - cycles.round()) * period).abs() >= half_width
        })
        .map(|(&t, &v)| (t, v))
        .unzip();
    TimeSeries::new(time, values)
}

/// Width of the contiguous run of phase bins around mid-transit whose
/// median flux lies below half the box depth.
///
/// Falls back to the box duration when the central bin is not below the cut.
fn half_depth_duration(
    offsets: &[f64],
    flux: &[f64],
    box_duration: f64,
    box_depth: f64,
    level: f64,
) -> f64 {
    const BINS_PER_BOX: f64 = 8.0;
    const HALF_SPAN: i64 = 12;

    let bin_width = box_duration / BINS_PER_BOX;
    let mut bins: Vec<Vec<f64>> = vec![Vec::new(); (2 * HALF_SPAN + 1) as usize];
    for (&o, &f) in offsets.iter().zip(flux) {
        let j = (o / bin_width).round() as i64;
        if j.abs() <= HALF_SPAN {
            bins[(j + HALF_SPAN) as usize].push(f);
        }
    }

    let cut = level - box_depth / 2.0;
    let below = |j: i64| {
        let bin = &bins[(j + HALF_SPAN) as usize];
        !bin.is_empty() && median(bin) < cut
    };

    if !below(0) {
        return box_duration;
    }
    let mut width = 1;
    let mut j = 1;
    while j <= HALF_SPAN && below(j) {
        width += 1;
        j += 1;
    }
    let mut j = -1;
    while j >= -HALF_SPAN && below(j) {
        width += 1;
        j -= 1;
    }

    width as f64 * bin_width
}

/// Convenience wrapper over [`TransitDetector`].
///
/// `max_period = None` searches up to half the observing baseline.
pub fn detect_transiting_planets(
    time: &[f64],
    flux: &[f64],
    min_period: f64,
    max_period: Option<f64>,
    sensitivity: f64,
) -> Result<Vec<TransitCandidate>> {
    let config = TransitConfig::default()
        .with_period_range(min_period, max_period)
        .with_sensitivity(sensitivity);
    let series = TimeSeries::from_slices(time, flux)?;
    TransitDetector::new(config)?.detect(&series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{transit_light_curve, TransitInjection};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn injected(period: f64, depth: f64, seed: u64) -> TimeSeries {
        let mut rng = StdRng::seed_from_u64(seed);
        let injection = TransitInjection {
            period,
            epoch: 1.3,
            depth,
            duration: 0.12,
        };
        transit_light_curve(&mut rng, 0.0, 20.0, 3000, &[injection], 0.001).unwrap()
    }

    #[test]
    fn default_config_is_valid() {
        let config = TransitConfig::default();
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.snr_threshold(), 7.0);
    }

    #[test]
    fn config_rejects_inverted_period_range() {
        let config = TransitConfig::default().with_period_range(5.0, Some(2.0));
        assert!(matches!(
            TransitDetector::new(config),
            Err(AnalysisError::InvalidConfiguration(_))
        ));
        let config = TransitConfig::default().with_sensitivity(0.0);
        assert!(TransitDetector::new(config).is_err());
    }

    #[test]
    fn finds_injected_planet() {
        let series = injected(2.7, 0.005, 7);
        let candidates = TransitDetector::default().detect(&series).unwrap();

        assert!(!candidates.is_empty());
        let best = &candidates[0];
        assert!((best.period_days - 2.7).abs() < 0.02, "period {}", best.period_days);
        assert!((best.depth_fraction - 0.005).abs() < 0.001);
        assert!((best.duration_hours - 0.12 * 24.0).abs() < 1.0);
        assert!(best.n_transits >= 6);
        assert_relative_eq!(
            best.estimated_radius_earth,
            best.depth_fraction.sqrt() * SOLAR_RADIUS_EARTH
        );

        let offset = ((best.epoch - 1.3) / best.period_days + 0.5).rem_euclid(1.0) - 0.5;
        assert!((offset * best.period_days).abs() < 0.03);
    }

    #[test]
    fn candidates_are_sorted_by_snr() {
        let series = injected(2.7, 0.005, 11);
        let config = TransitConfig::default().with_sensitivity(1000.0);
        let candidates = TransitDetector::new(config).unwrap().detect(&series).unwrap();
        for pair in candidates.windows(2) {
            assert!(pair[0].signal_to_noise >= pair[1].signal_to_noise);
        }
    }

    #[test]
    fn harmonics_are_suppressed() {
        let series = injected(2.7, 0.005, 3);
        let config = TransitConfig::default().with_sensitivity(1000.0);
        let candidates = TransitDetector::new(config).unwrap().detect(&series).unwrap();
        let best = candidates[0];
        for other in &candidates[1..] {
            assert!(!best.is_harmonic_of(other.period_days, 0.02));
        }
    }

    #[test]
    fn odd_even_depths_expose_half_period_fold() {
        let series = injected(3.0, 0.005, 13);

        let half = parity_depths(&series, 1.5, 1.3, 0.12, 3).unwrap().unwrap();
        assert!(is_half_period_alias(&half));
        assert!((half[0].depth - 0.005).abs() < 0.001, "even depth {}", half[0].depth);
        assert!(half[1].depth.abs() < 0.001, "odd depth {}", half[1].depth);

        let full = parity_depths(&series, 3.0, 1.3, 0.12, 3).unwrap().unwrap();
        assert!(!is_half_period_alias(&full));
    }

    #[test]
    fn half_period_fit_is_doubled() {
        let series = injected(3.0, 0.005, 13);
        let detector = TransitDetector::default();

        let result = periodogram_with(&series, &[1.5], &detector.search).unwrap();
        let alias = *result.best().unwrap();
        let (fit, epoch) = detector
            .resolve_half_period(&series, alias, result.epoch_of(&alias))
            .unwrap();
        assert_relative_eq!(fit.period, 3.0);
        let offset = ((epoch - 1.3) / 3.0 + 0.5).rem_euclid(1.0) - 0.5;
        assert!((offset * 3.0).abs() < 0.05, "epoch {epoch}");

        // The true period is left alone.
        let result = periodogram_with(&series, &[3.0], &detector.search).unwrap();
        let true_fit = *result.best().unwrap();
        let (fit, _) = detector
            .resolve_half_period(&series, true_fit, result.epoch_of(&true_fit))
            .unwrap();
        assert_relative_eq!(fit.period, 3.0);
    }

    #[test]
    fn masking_removes_only_the_transits() {
        let series = injected(3.0, 0.005, 2);
        let candidate = TransitCandidate {
            period_days: 3.0,
            epoch: 1.3,
            depth_fraction: 0.005,
            duration_hours: 0.12 * 24.0,
            signal_to_noise: 50.0,
            estimated_radius_earth: 7.7,
            power: 0.5,
            n_transits: 7,
        };
        let masked = mask_transits(&series, &candidate).unwrap();
        assert!(masked.len() < series.len());
        // About 2 * 0.12 days out of every 3 are removed.
        let removed = (series.len() - masked.len()) as f64 / series.len() as f64;
        assert!((removed - 0.08).abs() < 0.02, "removed {removed}");
        for &t in masked.time() {
            let cycles = (t - 1.3) / 3.0;
            assert!(((cycles - cycles.round()) * 3.0).abs() > 0.1199, "kept t = {t}");
        }
    }

    #[test]
    fn short_baseline_yields_no_candidates() {
        // 1.5 days cannot hold two transits at periods >= 1 day.
        let time: Vec<f64> = (0..500).map(|i| i as f64 * 0.003).collect();
        let flux: Vec<f64> = time
            .iter()
            .map(|&t| if (t - 0.5).abs() < 0.05 { 0.99 } else { 1.0 })
            .collect();
        let candidates = detect_transiting_planets(&time, &flux, 1.0, None, 3.0).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn flat_light_curve_has_no_candidates() {
        let mut rng = StdRng::seed_from_u64(5);
        let series = transit_light_curve(&mut rng, 0.0, 20.0, 2000, &[], 0.001).unwrap();
        let candidates = TransitDetector::default().detect(&series).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn too_few_points_is_an_error() {
        let time: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let flux = vec![1.0; 10];
        assert!(matches!(
            detect_transiting_planets(&time, &flux, 0.5, None, 3.0),
            Err(AnalysisError::InsufficientData { .. })
        ));
    }

    #[test]
    fn harmonic_check_is_symmetric_in_ratio() {
        let candidate = TransitCandidate {
            period_days: 3.0,
            epoch: 0.0,
            depth_fraction: 0.01,
            duration_hours: 2.0,
            signal_to_noise: 10.0,
            estimated_radius_earth: 10.9,
            power: 0.5,
            n_transits: 5,
        };
        assert!(candidate.is_harmonic_of(6.03, 0.02));
        assert!(candidate.is_harmonic_of(1.5, 0.02));
        assert!(candidate.is_harmonic_of(3.0, 0.02));
        assert!(!candidate.is_harmonic_of(4.5, 0.02));
    }
}
