//! Peak-based measurements on an oscillation spectrum.
//!
//! `nu_max` is the power-weighted centroid of the significant peaks. The
//! large separation is the most common spacing between significant peaks,
//! i.e. the strongest non-zero lag of the autocorrelation of the peak comb,
//! searched inside a window around the scaling-relation prior.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::scaling::{delta_nu_prior, radial_epsilon};
use super::spectrum::{PowerSpectrum, SECONDS_PER_DAY};
use crate::detection::peaks::{find_peaks, prominence};
use crate::utils::stats::median;

/// Minimum prominence of a significant peak, as a fraction of its power.
const MIN_RELATIVE_PROMINENCE: f64 = 0.5;

/// Peaks considered when measuring spacings.
const MAX_SPACING_PEAKS: usize = 50;

/// Échelle phase of each degree relative to the radial ridge.
const DEGREE_PHASES: [(u8, f64); 4] = [(0, 0.0), (2, -0.12), (1, 0.5), (1, -0.5)];

/// How the large separation was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeltaNuSource {
    /// Measured from peak spacings.
    Measured,
    /// No spacing was measurable; taken from `0.263 nu_max^0.772`.
    ScalingRelation,
}

/// One identified oscillation mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillationMode {
    /// Frequency (μHz).
    pub frequency: f64,
    pub power: f64,
    /// Power over the median spectrum power.
    pub snr: f64,
    /// Radial order relative to the ridge nearest `nu_max`.
    pub order: i64,
    /// Angular degree l (0, 1 or 2).
    pub degree: u8,
}

impl OscillationMode {
    /// Conventional name of the mode's degree.
    pub fn mode_type(&self) -> &'static str {
        match self.degree {
            0 => "radial",
            1 => "dipole",
            _ => "quadrupole",
        }
    }
}

/// Rotational splitting read off closely spaced modes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    /// Median splitting (μHz).
    pub splitting: f64,
    /// Implied rotation period (days), taking the splitting as half the
    /// rotation frequency.
    pub period_days: f64,
    pub angular_velocity_rad_s: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityFlag {
    Good,
    Fair,
    Poor,
}

/// Overall detection quality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Highest power over the median power.
    pub signal_to_noise: f64,
    pub n_modes: usize,
    pub flag: QualityFlag,
}

/// Local maxima whose power exceeds `threshold` times the median power and
/// whose prominence is at least half their height, strongest first.
///
/// The prominence cut drops shoulders that leakage and smoothing leave on
/// the flanks of strong modes.
pub fn significant_peaks(spectrum: &PowerSpectrum, threshold: f64) -> Vec<usize> {
    let level = threshold * spectrum.median_power();
    find_peaks(&spectrum.power, 0.0, usize::MAX)
        .into_iter()
        .filter(|&i| spectrum.power[i] > level)
        .filter(|&i| prominence(&spectrum.power, i) >= MIN_RELATIVE_PROMINENCE * spectrum.power[i])
        .collect()
}

/// Power-weighted mean frequency of `peaks`.
pub fn power_weighted_centroid(spectrum: &PowerSpectrum, peaks: &[usize]) -> Option<f64> {
    let total: f64 = peaks.iter().map(|&i| spectrum.power[i]).sum();
    if peaks.is_empty() || total <= 0.0 {
        return None;
    }
    let weighted: f64 = peaks
        .iter()
        .map(|&i| spectrum.frequencies[i] * spectrum.power[i])
        .sum();
    Some(weighted / total)
}

/// Large separation from the spacings between peaks near `nu_max`.
///
/// Pairwise spacings inside `window` (multiples of the prior) are
/// collected and the spacing with the most neighbours within a tolerance
/// of `max(2 resolution, 2% of the prior)` wins; the result is the mean of
/// that cluster. Ties go to the smaller spacing. Falls back to the prior
/// when no spacing repeats.
pub fn large_separation(
    spectrum: &PowerSpectrum,
    peaks: &[usize],
    nu_max: f64,
    window: (f64, f64),
) -> (f64, DeltaNuSource) {
    let prior = delta_nu_prior(nu_max);
    let (lo, hi) = (window.0 * prior, window.1 * prior);
    let tolerance = (2.0 * spectrum.resolution()).max(0.02 * prior);
    let half_width = (0.5 * nu_max).min(1000.0);

    let nearby: Vec<f64> = peaks
        .iter()
        .map(|&i| spectrum.frequencies[i])
        .filter(|f| (f - nu_max).abs() <= half_width)
        .take(MAX_SPACING_PEAKS)
        .collect();

    let mut spacings: Vec<f64> = nearby
        .iter()
        .enumerate()
        .flat_map(|(i, a)| nearby[i + 1..].iter().map(move |b| (a - b).abs()))
        .filter(|&s| s >= lo && s <= hi)
        .collect();
    spacings.sort_by(|a, b| a.total_cmp(b));

    let support =
        |center: f64| spacings.iter().filter(move |&&s| (s - center).abs() <= tolerance);

    let mut best: Option<(f64, usize)> = None;
    for &s in &spacings {
        let count = support(s).count();
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((s, count));
        }
    }

    match best {
        Some((center, count)) if count >= 2 => {
            let cluster: Vec<f64> = support(center).copied().collect();
            let delta_nu = cluster.iter().sum::<f64>() / cluster.len() as f64;
            (delta_nu, DeltaNuSource::Measured)
        }
        _ => (prior, DeltaNuSource::ScalingRelation),
    }
}

/// Label the strongest peaks within `nu_max ± 5 delta_nu`.
///
/// Keeps at most `max_modes` by power and returns them by frequency. The
/// degree is the nearest échelle phase among l = 0 (0), l = 2 (-0.12) and
/// l = 1 (±0.5), measured from the radial mode expected nearest `nu_max`.
/// `peaks` must be ordered strongest first, as [`significant_peaks`]
/// returns them.
pub fn identify_modes(
    spectrum: &PowerSpectrum,
    peaks: &[usize],
    nu_max: f64,
    delta_nu: f64,
    max_modes: usize,
) -> Vec<OscillationMode> {
    let median_power = spectrum.median_power();
    let epsilon = radial_epsilon(delta_nu);
    let reference = delta_nu * ((nu_max / delta_nu - epsilon).round() + epsilon);

    let mut modes: Vec<OscillationMode> = peaks
        .iter()
        .filter(|&&i| (spectrum.frequencies[i] - nu_max).abs() < 5.0 * delta_nu)
        .take(max_modes)
        .map(|&i| {
            let frequency = spectrum.frequencies[i];
            let power = spectrum.power[i];
            let x = (frequency - reference) / delta_nu;
            let (degree, phase) = DEGREE_PHASES
                .iter()
                .copied()
                .min_by(|a, b| {
                    let da = (x - x.round() - a.1).abs();
                    let db = (x - x.round() - b.1).abs();
                    da.total_cmp(&db)
                })
                .unwrap_or((0, 0.0));
            OscillationMode {
                frequency,
                power,
                snr: if median_power > 0.0 { power / median_power } else { f64::INFINITY },
                order: (x - phase).round() as i64,
                degree,
            }
        })
        .collect();

    modes.sort_by(|a, b| a.frequency.total_cmp(&b.frequency));
    modes
}

/// Envelope FWHM: 2.355 times the power-weighted spread of `peaks`, or
/// `0.25 nu_max` when the spread cannot be measured.
pub fn envelope_fwhm(spectrum: &PowerSpectrum, peaks: &[usize], nu_max: f64) -> f64 {
    let fallback = 0.25 * nu_max;
    let Some(center) = power_weighted_centroid(spectrum, peaks) else {
        return fallback;
    };
    if peaks.len() < 2 {
        return fallback;
    }

    let total: f64 = peaks.iter().map(|&i| spectrum.power[i]).sum();
    let variance = peaks
        .iter()
        .map(|&i| spectrum.power[i] * (spectrum.frequencies[i] - center).powi(2))
        .sum::<f64>()
        / total;

    let fwhm = 2.355 * variance.sqrt();
    if fwhm > 0.0 && fwhm.is_finite() {
        fwhm
    } else {
        fallback
    }
}

/// Median spacing of mode pairs 0.1 to 2 μHz apart, read as rotational
/// splitting. Needs at least three modes.
pub fn rotational_splitting(modes: &[OscillationMode]) -> Option<Rotation> {
    if modes.len() < 3 {
        return None;
    }
    let splittings: Vec<f64> = modes
        .iter()
        .enumerate()
        .flat_map(|(i, a)| modes[i + 1..].iter().map(move |b| (a.frequency - b.frequency).abs()))
        .filter(|&d| d > 0.1 && d < 2.0)
        .collect();
    if splittings.is_empty() {
        return None;
    }

    let splitting = median(&splittings);
    let period_days = 1.0 / (2.0 * splitting * 1e-6) / SECONDS_PER_DAY;
    Some(Rotation {
        splitting,
        period_days,
        angular_velocity_rad_s: 2.0 * PI / (period_days * SECONDS_PER_DAY),
    })
}

pub fn quality_metrics(spectrum: &PowerSpectrum, modes: &[OscillationMode]) -> QualityMetrics {
    let median_power = spectrum.median_power();
    let signal_to_noise = match spectrum.max_power() {
        Some((_, max)) if median_power > 0.0 => max / median_power,
        _ => 0.0,
    };
    let n_modes = modes.len();
    let flag = if signal_to_noise > 3.0 && n_modes > 5 {
        QualityFlag::Good
    } else if signal_to_noise > 2.0 && n_modes > 2 {
        QualityFlag::Fair
    } else {
        QualityFlag::Poor
    };
    QualityMetrics { signal_to_noise, n_modes, flag }
}
