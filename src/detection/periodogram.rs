//! Box periodogram for transit searches.
//!
//! Each trial period folds the light curve, bins it in phase and slides a
//! box of every trial duration across the folded curve. The statistic is
//! the normalized signal residue of Kovács, Zucker & Mazeh (2002):
//!
//! ```text
//! power = S^2 / (r (1 - r)) / sum(x^2)
//! ```
//!
//! where `x` are the mean-subtracted fluxes, `S` is the sum of `x` inside
//! the box and `r` the fraction of samples inside it (uniform weights). The
//! power is the fraction of variance explained by a two-level box model and
//! lies in `[0, 1]`. Only boxes with `S < 0` (dips) are scored.
//!
//! Boxes wrap around phase 1 → 0, so a transit split by the fold is found.

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::TimeSeries;
use crate::error::{AnalysisError, Result};
use crate::utils::stats::mean;

const MIN_PHASE_BINS: usize = 32;
const MAX_PHASE_BINS: usize = 2048;

/// Box shapes tried at every period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSearch {
    /// Trial durations in time units, ascending.
    pub durations: Vec<f64>,
    /// A box must hold at least this many samples to be scored.
    pub min_points_in_transit: usize,
}

impl Default for BoxSearch {
    fn default() -> Self {
        // 0.04 .. 0.5 days in 6 geometric steps
        Self {
            durations: geometric_durations(0.04, 0.5, 6),
            min_points_in_transit: 3,
        }
    }
}

impl BoxSearch {
    /// Geometrically spaced durations between `min_duration` and `max_duration`.
    pub fn geometric(
        min_duration: f64,
        max_duration: f64,
        n_durations: usize,
        min_points_in_transit: usize,
    ) -> Result<Self> {
        if !(min_duration > 0.0 && min_duration.is_finite()) {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "min_duration must be positive, got {min_duration}"
            )));
        }
        if !(max_duration >= min_duration && max_duration.is_finite()) {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "max_duration ({max_duration}) must be >= min_duration ({min_duration})"
            )));
        }
        if n_durations == 0 {
            return Err(AnalysisError::InvalidConfiguration(
                "n_durations must be at least 1".into(),
            ));
        }
        Ok(Self {
            durations: geometric_durations(min_duration, max_duration, n_durations),
            min_points_in_transit: min_points_in_transit.max(1),
        })
    }

    /// Shortest trial duration.
    pub fn min_duration(&self) -> f64 {
        self.durations.iter().copied().fold(f64::INFINITY, f64::min)
    }

    fn phase_bins(&self, period: f64) -> usize {
        let bins = (period / (self.min_duration() / 3.0)).round();
        if bins.is_finite() {
            (bins as usize).clamp(MIN_PHASE_BINS, MAX_PHASE_BINS)
        } else {
            MAX_PHASE_BINS
        }
    }
}

fn geometric_durations(min_duration: f64, max_duration: f64, n: usize) -> Vec<f64> {
    if n <= 1 || max_duration <= min_duration {
        return vec![min_duration];
    }
    let ratio = (max_duration / min_duration).ln() / (n - 1) as f64;
    (0..n)
        .map(|k| min_duration * (ratio * k as f64).exp())
        .collect()
}

/// Best box fit at one trial period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxFit {
    /// Trial period.
    pub period: f64,
    /// Normalized signal residue in `[0, 1]`.
    pub power: f64,
    /// Phase of the box center in `[0, 1)`, measured from the first timestamp.
    pub phase: f64,
    /// Box duration in time units.
    pub duration: f64,
    /// Mean out-of-box level minus mean in-box level.
    pub depth: f64,
    /// Samples inside the box.
    pub n_in_transit: usize,
    /// False when the period exceeds the observing baseline.
    pub valid: bool,
}

impl BoxFit {
    fn empty(period: f64, valid: bool) -> Self {
        Self {
            period,
            power: 0.0,
            phase: 0.0,
            duration: 0.0,
            depth: 0.0,
            n_in_transit: 0,
            valid,
        }
    }

    /// Trial frequency (1 / period).
    pub fn frequency(&self) -> f64 {
        1.0 / self.period
    }
}

/// Box fits over a period grid, in grid order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodogramResult {
    /// One fit per trial period.
    pub fits: Vec<BoxFit>,
    /// Reference time that phases are measured from.
    pub reference_time: f64,
}

impl PeriodogramResult {
    /// Number of trial periods.
    pub fn len(&self) -> usize {
        self.fits.len()
    }

    /// Whether the grid was empty.
    pub fn is_empty(&self) -> bool {
        self.fits.is_empty()
    }

    /// Trial periods.
    pub fn periods(&self) -> Vec<f64> {
        self.fits.iter().map(|f| f.period).collect()
    }

    /// Power at each trial period (0 for invalid periods).
    pub fn powers(&self) -> Vec<f64> {
        self.fits.iter().map(|f| f.power).collect()
    }

    /// Highest-power valid fit; ties go to the shorter period.
    pub fn best(&self) -> Option<&BoxFit> {
        self.fits
            .iter()
            .filter(|f| f.valid)
            .max_by(|a, b| a.power.total_cmp(&b.power).then(b.period.total_cmp(&a.period)))
    }

    /// Epoch (time of mid-transit) of a fit from this periodogram.
    pub fn epoch_of(&self, fit: &BoxFit) -> f64 {
        self.reference_time + fit.phase * fit.period
    }
}

/// Build a log-spaced trial period grid.
///
/// The upper bound is capped at half the baseline so every trial period
/// repeats at least twice. Returns an empty grid when that cap falls below
/// `min_period`. The step in `ln P` is `min_duration / baseline / oversampling`,
/// and the grid is thinned to `max_points` if needed.
///
/// # Errors
/// `InvalidConfiguration` for non-positive bounds, `min_period >= max_period`,
/// or a non-positive baseline, duration or oversampling factor.
pub fn period_grid(
    min_period: f64,
    max_period: f64,
    baseline: f64,
    min_duration: f64,
    oversampling: f64,
    max_points: usize,
) -> Result<Vec<f64>> {
    if !(min_period > 0.0 && min_period.is_finite()) {
        return Err(AnalysisError::InvalidConfiguration(format!(
            "min_period must be positive, got {min_period}"
        )));
    }
    if max_period.is_nan() || min_period >= max_period {
        return Err(AnalysisError::InvalidConfiguration(format!(
            "min_period ({min_period}) >= max_period ({max_period})"
        )));
    }
    if !(baseline > 0.0 && min_duration > 0.0 && oversampling > 0.0) || max_points < 2 {
        return Err(AnalysisError::InvalidConfiguration(format!(
            "grid needs positive baseline ({baseline}), min_duration ({min_duration}), \
             oversampling ({oversampling}) and max_points >= 2 ({max_points})"
        )));
    }

    let upper = max_period.min(baseline / 2.0);
    if upper < min_period {
        debug!(
            "baseline {baseline} too short for periods >= {min_period}; empty period grid"
        );
        return Ok(Vec::new());
    }
    if upper == min_period {
        return Ok(vec![min_period]);
    }

    let span = (upper / min_period).ln();
    let step = (min_duration / baseline) / oversampling;
    let mut n = (span / step).ceil() as usize + 1;
    if n > max_points {
        n = max_points;
    }
    let step = span / (n - 1) as f64;

    let mut grid: Vec<f64> = (0..n)
        .map(|k| min_period * (step * k as f64).exp())
        .collect();
    if let Some(last) = grid.last_mut() {
        *last = upper;
    }

    debug!(
        "period grid: {} periods in [{min_period:.4}, {upper:.4}], ln-step {step:.3e}",
        grid.len()
    );
    Ok(grid)
}

/// Box periodogram with the default box shapes.
pub fn periodogram(series: &TimeSeries, period_grid: &[f64]) -> Result<PeriodogramResult> {
    periodogram_with(series, period_grid, &BoxSearch::default())
}

/// Box periodogram over `period_grid`, evaluated in parallel.
///
/// Periods longer than the baseline are reported with zero power and
/// `valid = false`.
///
/// # Errors
/// `InsufficientData` for fewer than two samples; `InvalidConfiguration`
/// for a non-positive trial period or an empty duration list.
pub fn periodogram_with(
    series: &TimeSeries,
    period_grid: &[f64],
    search: &BoxSearch,
) -> Result<PeriodogramResult> {
    series.require_len(2)?;
    if search.durations.is_empty() || search.durations.iter().any(|&d| d.is_nan() || d <= 0.0) {
        return Err(AnalysisError::InvalidConfiguration(
            "box durations must be positive and non-empty".into(),
        ));
    }
    if let Some(&bad) = period_grid.iter().find(|&&p| !(p > 0.0 && p.is_finite())) {
        return Err(AnalysisError::InvalidConfiguration(format!(
            "trial periods must be positive, got {bad}"
        )));
    }

    let reference_time = series.time()[0];
    let m = mean(series.values());
    let residuals: Vec<f64> = series.values().iter().map(|v| v - m).collect();
    let sum_sq: f64 = residuals.iter().map(|x| x * x).sum();
    let baseline = series.baseline();

    let fits = period_grid
        .par_iter()
        .map(|&period| {
            if period > baseline {
                BoxFit::empty(period, false)
            } else {
                fit_period(series.time(), &residuals, sum_sq, period, search)
            }
        })
        .collect();

    Ok(PeriodogramResult {
        fits,
        reference_time,
    })
}

/// Phase of each timestamp in `[0, 1)` relative to `reference`.
pub fn fold(time: &[f64], period: f64, reference: f64) -> Vec<f64> {
    time.iter()
        .map(|&t| ((t - reference) / period).rem_euclid(1.0))
        .collect()
}

fn fit_period(
    time: &[f64],
    residuals: &[f64],
    sum_sq: f64,
    period: f64,
    search: &BoxSearch,
) -> BoxFit {
    let mut best = BoxFit::empty(period, true);
    if sum_sq <= 0.0 {
        return best;
    }

    let n = residuals.len();
    let n_bins = search.phase_bins(period);
    let mut bin_sum = vec![0.0; n_bins];
    let mut bin_count = vec![0usize; n_bins];
    for (phase, &x) in fold(time, period, time[0]).iter().zip(residuals) {
        let bin = ((phase * n_bins as f64) as usize).min(n_bins - 1);
        bin_sum[bin] += x;
        bin_count[bin] += 1;
    }

    // Prefix sums over two laps so boxes can wrap.
    let mut cum_sum = vec![0.0; 2 * n_bins + 1];
    let mut cum_count = vec![0usize; 2 * n_bins + 1];
    for k in 0..2 * n_bins {
        cum_sum[k + 1] = cum_sum[k] + bin_sum[k % n_bins];
        cum_count[k + 1] = cum_count[k] + bin_count[k % n_bins];
    }

    let n_f = n as f64;
    for &duration in &search.durations {
        let width = ((duration / period) * n_bins as f64).round().max(1.0) as usize;
        if width > n_bins / 2 {
            continue;
        }
        for start in 0..n_bins {
            let n_in = cum_count[start + width] - cum_count[start];
            if n_in < search.min_points_in_transit || n_in >= n {
                continue;
            }
            let s = cum_sum[start + width] - cum_sum[start];
            if s >= 0.0 {
                continue;
            }
            let n_in_f = n_in as f64;
            let n_out_f = n_f - n_in_f;
            let power = s * s * n_f / (n_in_f * n_out_f * sum_sq);
            if power > best.power {
                best = BoxFit {
                    period,
                    power,
                    phase: ((start as f64 + width as f64 / 2.0) / n_bins as f64).rem_euclid(1.0),
                    duration: width as f64 * period / n_bins as f64,
                    depth: -s * n_f / (n_in_f * n_out_f),
                    n_in_transit: n_in,
                    valid: true,
                };
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn box_light_curve(period: f64, duration: f64, depth: f64, epoch: f64) -> TimeSeries {
        let n = 3000;
        let time: Vec<f64> = (0..n).map(|i| i as f64 * 0.01).collect();
        let flux = time
            .iter()
            .map(|&t| {
                let phase = ((t - epoch) / period + 0.5).rem_euclid(1.0) - 0.5;
                if (phase * period).abs() < duration / 2.0 {
                    1.0 - depth
                } else {
                    1.0
                }
            })
            .collect();
        TimeSeries::new(time, flux).unwrap()
    }

    #[test]
    fn grid_is_log_spaced_and_capped() {
        let grid = period_grid(0.5, 100.0, 30.0, 0.04, 3.0, 50_000).unwrap();
        assert_relative_eq!(grid[0], 0.5);
        assert_relative_eq!(*grid.last().unwrap(), 15.0, epsilon = 1e-12);
        let ratio1 = grid[1] / grid[0];
        let ratio2 = grid[101] / grid[100];
        assert_relative_eq!(ratio1, ratio2, epsilon = 1e-9);
    }

    #[test]
    fn grid_respects_max_points() {
        let grid = period_grid(0.5, 15.0, 30.0, 0.04, 3.0, 100).unwrap();
        assert_eq!(grid.len(), 100);
    }

    #[test]
    fn grid_empty_when_baseline_too_short() {
        let grid = period_grid(5.0, 20.0, 8.0, 0.04, 3.0, 1000).unwrap();
        assert!(grid.is_empty());
    }

    #[test]
    fn grid_rejects_inverted_bounds() {
        assert!(matches!(
            period_grid(5.0, 2.0, 30.0, 0.04, 3.0, 1000),
            Err(AnalysisError::InvalidConfiguration(_))
        ));
        assert!(period_grid(0.0, 2.0, 30.0, 0.04, 3.0, 1000).is_err());
    }

    #[test]
    fn recovers_injected_box() {
        let series = box_light_curve(2.5, 0.2, 0.01, 0.7);
        let grid = period_grid(1.0, 10.0, series.baseline(), 0.04, 3.0, 50_000).unwrap();
        let result = periodogram(&series, &grid).unwrap();
        let best = result.best().unwrap();

        assert!((best.period - 2.5).abs() < 0.02, "period {}", best.period);
        assert_relative_eq!(best.depth, 0.01, epsilon = 1e-3);
        assert!(best.power > 0.5);

        let epoch = result.epoch_of(best);
        let offset = ((epoch - 0.7) / 2.5 + 0.5).rem_euclid(1.0) - 0.5;
        assert!((offset * 2.5).abs() < 0.05, "epoch {epoch}");
    }

    #[test]
    fn power_is_a_variance_fraction() {
        let series = box_light_curve(2.0, 0.2, 0.01, 0.5);
        let search = BoxSearch {
            durations: vec![0.2],
            min_points_in_transit: 3,
        };
        let result = periodogram_with(&series, &[2.0, 3.1], &search).unwrap();
        assert!(result.fits[0].power > 0.5);
        assert!(result.fits[0].power <= 1.0 + 1e-12);
        assert!(result.fits[1].power < result.fits[0].power);
    }

    #[test]
    fn periods_beyond_baseline_are_invalid() {
        let series = box_light_curve(2.0, 0.2, 0.01, 0.5);
        let result = periodogram(&series, &[2.0, 45.0]).unwrap();
        assert!(result.fits[0].valid);
        assert!(!result.fits[1].valid);
        assert_eq!(result.fits[1].power, 0.0);
    }

    #[test]
    fn constant_series_has_zero_power() {
        let time: Vec<f64> = (0..500).map(|i| i as f64 * 0.02).collect();
        let series = TimeSeries::new(time, vec![1.0; 500]).unwrap();
        let result = periodogram(&series, &[1.0, 2.0]).unwrap();
        assert!(result.powers().iter().all(|&p| p == 0.0));
    }

    #[test]
    fn rejects_bad_periods() {
        let series = box_light_curve(2.0, 0.2, 0.01, 0.5);
        assert!(matches!(
            periodogram(&series, &[1.0, -1.0]),
            Err(AnalysisError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn fold_wraps_into_unit_interval() {
        let phases = fold(&[0.0, 1.5, 3.0, -0.5], 2.0, 0.0);
        assert_relative_eq!(phases[1], 0.75);
        assert_relative_eq!(phases[2], 0.5);
        assert_relative_eq!(phases[3], 0.75);
    }

    #[test]
    fn geometric_durations_span_range() {
        let search = BoxSearch::geometric(0.04, 0.5, 6, 3).unwrap();
        assert_eq!(search.durations.len(), 6);
        assert_relative_eq!(search.durations[0], 0.04);
        assert_relative_eq!(search.durations[5], 0.5, epsilon = 1e-12);
        assert!(BoxSearch::geometric(0.5, 0.04, 6, 3).is_err());
    }
}
