//! Seeded generators for synthetic light curves and signal streams.
//!
//! Every generator draws from a caller-supplied random number generator so
//! fixtures are reproducible:
//!
//! ```
//! use cosmic_signals::synthetic::{transit_light_curve, TransitInjection};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let planet = TransitInjection { period: 3.5, epoch: 0.5, depth: 0.01, duration: 0.1 };
//! let series = transit_light_curve(&mut rng, 0.0, 30.0, 5000, &[planet], 0.001).unwrap();
//! assert_eq!(series.len(), 5000);
//! ```

use std::f64::consts::PI;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::TimeSeries;
use crate::error::{AnalysisError, Result};
use crate::seismology::{radial_epsilon, PowerSpectrum, SECONDS_PER_DAY};

/// One draw from the standard normal distribution (Box-Muller).
pub fn standard_normal(rng: &mut impl Rng) -> f64 {
    // gen() is in [0, 1); shift to (0, 1] so ln() stays finite.
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// `n` samples of zero-mean Gaussian noise with standard deviation `sigma`.
pub fn white_noise(rng: &mut impl Rng, n: usize, sigma: f64) -> Vec<f64> {
    (0..n).map(|_| sigma * standard_normal(rng)).collect()
}

/// `n` evenly spaced points from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// A box-shaped periodic dip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitInjection {
    /// Orbital period (days).
    pub period: f64,
    /// Mid-transit time of one event (days).
    pub epoch: f64,
    /// Fractional flux deficit.
    pub depth: f64,
    /// Full transit duration (days).
    pub duration: f64,
}

impl TransitInjection {
    /// Whether `t` falls inside a transit.
    pub fn in_transit(&self, t: f64) -> bool {
        let offset = (t - self.epoch).rem_euclid(self.period);
        let offset = offset.min(self.period - offset);
        offset < self.duration / 2.0
    }
}

/// Flux normalized to 1.0 on a uniform grid, with box transits and Gaussian noise.
pub fn transit_light_curve(
    rng: &mut impl Rng,
    start: f64,
    end: f64,
    n: usize,
    injections: &[TransitInjection],
    noise_sigma: f64,
) -> Result<TimeSeries> {
    if end <= start || n < 2 {
        return Err(AnalysisError::InvalidConfiguration(format!(
            "need end > start and n >= 2, got [{start}, {end}] with n = {n}"
        )));
    }
    for injection in injections {
        if injection.period.is_nan() || injection.period <= 0.0 {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "transit period must be positive, got {}",
                injection.period
            )));
        }
    }

    let time = linspace(start, end, n);
    let flux = time
        .iter()
        .map(|&t| {
            let deficit: f64 = injections
                .iter()
                .filter(|inj| inj.in_transit(t))
                .map(|inj| inj.depth)
                .sum();
            1.0 - deficit + noise_sigma * standard_normal(rng)
        })
        .collect();

    TimeSeries::new(time, flux)
}

/// A solar-like oscillator: radial and dipole modes spaced by `delta_nu`
/// under a Gaussian envelope centred on `nu_max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarLikeStar {
    /// Frequency of maximum power (μHz).
    pub nu_max: f64,
    /// Large frequency separation (μHz).
    pub delta_nu: f64,
    /// Phase offset of the radial modes, in units of `delta_nu`.
    pub epsilon: f64,
    /// Radial orders injected on each side of `nu_max`.
    pub orders_each_side: usize,
    /// Peak mode amplitude (relative flux).
    pub amplitude: f64,
}

impl SolarLikeStar {
    /// A star with the given `nu_max` and `delta_nu`, five orders each side,
    /// and radial modes at the usual red-giant phase offset.
    pub fn new(nu_max: f64, delta_nu: f64) -> Self {
        Self {
            nu_max,
            delta_nu,
            epsilon: radial_epsilon(delta_nu),
            orders_each_side: 5,
            amplitude: 1e-3,
        }
    }

    /// Envelope width (μHz, Gaussian sigma).
    pub fn envelope_sigma(&self) -> f64 {
        0.25 * self.nu_max / 2.355
    }

    /// Injected modes as `(frequency μHz, amplitude)`, sorted by frequency.
    pub fn modes(&self) -> Vec<(f64, f64)> {
        let central = (self.nu_max / self.delta_nu - self.epsilon).round() as i64;
        let span = self.orders_each_side as i64;
        let sigma = self.envelope_sigma();

        let mut modes = Vec::new();
        for order in (central - span)..=(central + span) {
            let radial = self.delta_nu * (order as f64 + self.epsilon);
            // Dipole modes sit roughly half-way between radial orders.
            for (nu, visibility) in [(radial, 1.0), (radial + 0.5 * self.delta_nu, 0.7)] {
                if nu <= 0.0 {
                    continue;
                }
                let envelope = (-0.5 * ((nu - self.nu_max) / sigma).powi(2)).exp();
                modes.push((nu, self.amplitude * visibility * envelope.sqrt()));
            }
        }
        modes.sort_by(|a, b| a.0.total_cmp(&b.0));
        modes
    }
}

/// Relative flux of an oscillating star sampled every `cadence_days`,
/// with white noise of standard deviation `noise_sigma`.
pub fn oscillating_star(
    rng: &mut impl Rng,
    star: &SolarLikeStar,
    cadence_days: f64,
    n: usize,
    noise_sigma: f64,
) -> Result<TimeSeries> {
    if cadence_days.is_nan() || cadence_days <= 0.0 {
        return Err(AnalysisError::InvalidConfiguration(format!(
            "cadence must be positive, got {cadence_days}"
        )));
    }

    let modes = star.modes();
    let phases: Vec<f64> = modes.iter().map(|_| 2.0 * PI * rng.gen::<f64>()).collect();
    let time: Vec<f64> = (0..n).map(|i| i as f64 * cadence_days).collect();
    let flux = time
        .iter()
        .map(|&t| {
            let seconds = t * SECONDS_PER_DAY;
            let signal: f64 = modes
                .iter()
                .zip(&phases)
                .map(|(&(nu, amp), &phase)| amp * (2.0 * PI * nu * 1e-6 * seconds + phase).sin())
                .sum();
            1.0 + signal + noise_sigma * standard_normal(rng)
        })
        .collect();

    TimeSeries::new(time, flux)
}

/// A noiseless power spectrum on `frequencies` (μHz) with a Lorentzian of
/// half-width `linewidth` at each of `modes`, over a flat `background`.
pub fn mode_spectrum(
    frequencies: Vec<f64>,
    modes: &[(f64, f64)],
    linewidth: f64,
    background: f64,
) -> PowerSpectrum {
    let power = frequencies
        .iter()
        .map(|&f| {
            background
                + modes
                    .iter()
                    .map(|&(nu, height)| height / (1.0 + ((f - nu) / linewidth).powi(2)))
                    .sum::<f64>()
        })
        .collect();
    PowerSpectrum { frequencies, power }
}

/// Rectangular pulses of `height` and `width` samples every `period`
/// samples, on Gaussian noise.
pub fn pulse_train(
    rng: &mut impl Rng,
    n: usize,
    period: usize,
    width: usize,
    height: f64,
    noise_sigma: f64,
) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let pulse = if period > 0 && i % period < width { height } else { 0.0 };
            pulse + noise_sigma * standard_normal(rng)
        })
        .collect()
}

/// A pure tone at `frequency` Hz sampled at `sample_rate` Hz, plus noise.
pub fn carrier(
    rng: &mut impl Rng,
    n: usize,
    frequency: f64,
    sample_rate: f64,
    noise_sigma: f64,
) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (2.0 * PI * frequency * t).sin() + noise_sigma * standard_normal(rng)
        })
        .collect()
}
