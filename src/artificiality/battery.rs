//! The five statistical tests behind the artificiality score.
//!
//! Every test maps a signal to a sub-score in `[0, 100]`, where 0 is what
//! Gaussian noise typically produces and 100 is what an engineered signal
//! (a pulse train, a carrier) produces. A test that cannot be evaluated on
//! its input (a constant signal, a spectrum with no power) returns
//! [`NEUTRAL_SCORE`] instead of failing.
//!
//! Power spectra passed to these functions exclude the zero-frequency bin.

use std::f64::consts::LN_2;

use serde::{Deserialize, Serialize};

use crate::detection::fft::hilbert_envelope;
use crate::features::{acf_fft, binned_entropy, first_zero_crossing, gaussian_binned_entropy};
use crate::transform::center;
use crate::utils::stats::{mean, median, std_dev};

/// Sub-score reported by a test that cannot be evaluated.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Autocorrelation at which repetition counts as fully established.
const STRONG_CORRELATION: f64 = 0.6;

/// Euler-Mascheroni constant.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Distance (nats) from the Gaussian reference entropy that scores 100.
const ENTROPY_SCALE: f64 = 0.5;

/// Bins on each side of the peak counted as the line core and its surroundings.
const LINE_CORE_BINS: usize = 1;
const LINE_WINGS_BINS: usize = 10;

/// Decades above the noise expectation at which a line is fully significant.
const SIGNIFICANCE_DECADES: f64 = 0.5;

/// Amplitude modulation index below which the envelope is considered flat.
const MIN_AM_INDEX: f64 = 0.05;

/// The tests in the battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignalTest {
    Periodicity,
    Autocorrelation,
    Entropy,
    SpectralRegularity,
    Modulation,
}

impl SignalTest {
    pub const ALL: [SignalTest; 5] = [
        SignalTest::Periodicity,
        SignalTest::Autocorrelation,
        SignalTest::Entropy,
        SignalTest::SpectralRegularity,
        SignalTest::Modulation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SignalTest::Periodicity => "periodicity",
            SignalTest::Autocorrelation => "autocorrelation",
            SignalTest::Entropy => "entropy",
            SignalTest::SpectralRegularity => "spectral regularity",
            SignalTest::Modulation => "modulation structure",
        }
    }
}

fn unit_clamp(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Expected ratio of the highest to the median bin in the periodogram of
/// white noise with `m` bins: `(ln m + gamma) / ln 2`.
///
/// Periodogram bins of white noise are exponentially distributed, so the
/// median is `ln 2` times the mean and the maximum of `m` bins is about
/// `ln m + gamma` times the mean.
pub fn noise_peak_ratio(m: usize) -> f64 {
    ((m.max(1) as f64).ln() + EULER_GAMMA) / LN_2
}

/// Ratio of the highest bin to the median bin, with the index of the
/// highest bin (first on ties). `None` if the median is not positive.
pub fn peak_to_median(power: &[f64]) -> Option<(usize, f64)> {
    let med = median(power);
    if med.is_nan() || med <= 0.0 {
        return None;
    }
    let (index, peak) = power
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(bi, bp), (i, p)| if p > bp { (i, p) } else { (bi, bp) });
    Some((index, peak / med))
}

/// Strength of the dominant periodogram peak over the noise expectation.
///
/// Scores `100 * (log10 R - log10 R_noise) / 2`, clamped, where `R` is the
/// peak-to-median ratio: a peak 100 times stronger than noise would
/// produce scores 100.
pub fn periodicity_score(power: &[f64]) -> f64 {
    if power.len() < 2 {
        return NEUTRAL_SCORE;
    }
    let Some((_, ratio)) = peak_to_median(power) else {
        return NEUTRAL_SCORE;
    };
    let excess = ratio.log10() - noise_peak_ratio(power.len()).log10();
    100.0 * unit_clamp(excess / 2.0)
}

/// Maps the strongest autocorrelation after decorrelation onto `[0, 100]`.
///
/// The zero point is the largest value white noise reaches by chance over
/// the searched lags, `sqrt(2 ln L / n)`; [`STRONG_CORRELATION`] scores 100.
fn decorrelation_score(series: &[f64], max_lag: usize) -> f64 {
    let n = series.len();
    let max_lag = (n / 4).min(max_lag);
    let Some(acf) = acf_fft(series, max_lag) else {
        return NEUTRAL_SCORE;
    };
    let Some(start) = first_zero_crossing(&acf) else {
        return NEUTRAL_SCORE;
    };

    let tail = &acf[start..];
    let peak = tail.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let lags = tail.len().max(2) as f64;
    let noise_level = (2.0 * lags.ln()).sqrt() / (n as f64).sqrt();
    if noise_level >= STRONG_CORRELATION {
        return NEUTRAL_SCORE;
    }

    100.0 * unit_clamp((peak - noise_level) / (STRONG_CORRELATION - noise_level))
}

/// Repetition after the first zero crossing of the autocorrelation.
///
/// Lags up to `min(n / 4, max_lag)` are searched. A function that never
/// crosses zero (a trend) is not informative and scores neutral.
pub fn autocorrelation_score(signal: &[f64], max_lag: usize) -> f64 {
    decorrelation_score(signal, max_lag)
}

/// Histogram bins for the entropy test: `n / 10` clamped to `[10, 100]`.
pub fn entropy_bins(n: usize) -> usize {
    (n / 10).clamp(10, 100)
}

/// Distance of the amplitude entropy from that of Gaussian noise.
///
/// Gaussian noise with the signal's standard deviation, histogrammed on
/// the same bins, has entropy `ln(sigma sqrt(2 pi e) / width)`. Both lower
/// entropy (few discrete levels) and higher entropy (flat, bounded
/// amplitudes) count as departures.
pub fn entropy_score(signal: &[f64]) -> f64 {
    let Some(binned) = binned_entropy(signal, entropy_bins(signal.len())) else {
        return NEUTRAL_SCORE;
    };
    let sigma = std_dev(signal);
    if sigma.is_nan() || sigma <= 0.0 {
        return NEUTRAL_SCORE;
    }
    let reference = gaussian_binned_entropy(sigma, binned.bin_width);
    100.0 * unit_clamp((binned.entropy - reference).abs() / ENTROPY_SCALE)
}

/// Fraction of the power near the dominant peak that sits in its core
/// (±1 bin) rather than its wings (±10 bins).
pub fn line_concentration(power: &[f64], peak: usize) -> Option<f64> {
    let window = |half: usize| {
        let start = peak.saturating_sub(half);
        let end = (peak + half + 1).min(power.len());
        power[start..end].iter().sum::<f64>()
    };
    let wings = window(LINE_WINGS_BINS);
    if wings.is_nan() || wings <= 0.0 {
        return None;
    }
    Some(window(LINE_CORE_BINS) / wings)
}

/// Narrowness of the dominant spectral line.
///
/// A concentration of 0.3 scores 0 and 0.9 scores 100. The score is scaled
/// by the line's significance: zero at the expected highest noise peak,
/// full weight half a decade above it. A narrow but insignificant spike
/// does not count.
pub fn spectral_regularity_score(power: &[f64]) -> f64 {
    if power.len() < 2 {
        return NEUTRAL_SCORE;
    }
    let Some((peak, ratio)) = peak_to_median(power) else {
        return NEUTRAL_SCORE;
    };
    let Some(concentration) = line_concentration(power, peak) else {
        return NEUTRAL_SCORE;
    };

    let narrowness = unit_clamp((concentration - 0.3) / 0.6);
    let excess = ratio.log10() - noise_peak_ratio(power.len()).log10();
    let significance = unit_clamp(excess / SIGNIFICANCE_DECADES);
    100.0 * narrowness * significance
}

/// Modulation index of an envelope: its standard deviation over its mean.
pub fn am_index(envelope: &[f64]) -> Option<f64> {
    let m = mean(envelope);
    if m.is_nan() || m <= 0.0 {
        return None;
    }
    Some(std_dev(envelope) / m)
}

/// Structured amplitude modulation.
///
/// The Hilbert envelope of the mean-removed signal is tested for
/// repetition the same way as the autocorrelation test. A flat envelope
/// (modulation index below 0.05) carries no modulation and scores 0.
pub fn modulation_score(signal: &[f64], max_lag: usize) -> f64 {
    let envelope = hilbert_envelope(&center(signal));
    match am_index(&envelope) {
        None => NEUTRAL_SCORE,
        Some(index) if index < MIN_AM_INDEX => 0.0,
        Some(_) => decorrelation_score(&envelope, max_lag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::fft::power_spectrum;
    use crate::synthetic::{carrier, pulse_train, white_noise};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f64::consts::PI;

    fn spectrum(signal: &[f64]) -> Vec<f64> {
        power_spectrum(signal).into_iter().skip(1).collect()
    }

    fn pulses(seed: u64) -> Vec<f64> {
        pulse_train(&mut StdRng::seed_from_u64(seed), 4096, 100, 10, 5.0, 1.0)
    }

    fn noise(seed: u64) -> Vec<f64> {
        white_noise(&mut StdRng::seed_from_u64(seed), 4096, 1.0)
    }

    #[test]
    fn noise_peak_ratio_grows_slowly() {
        assert!((noise_peak_ratio(2048) - 11.83).abs() < 0.01);
        assert!(noise_peak_ratio(1_000_000) < 2.0 * noise_peak_ratio(1000));
    }

    #[test]
    fn periodicity_separates_pulses_from_noise() {
        assert!(periodicity_score(&spectrum(&pulses(1))) > 70.0);
        assert!(periodicity_score(&spectrum(&noise(1))) < 30.0);
    }

    #[test]
    fn autocorrelation_separates_pulses_from_noise() {
        assert!(autocorrelation_score(&pulses(2), 1000) > 70.0);
        assert!(autocorrelation_score(&noise(2), 1000) < 30.0);
    }

    #[test]
    fn entropy_flags_discrete_levels() {
        let levels: Vec<f64> = (0..2000).map(|i| (i % 3) as f64).collect();
        assert!(entropy_score(&levels) > 90.0);
        assert!(entropy_score(&noise(3)) < 20.0);
    }

    #[test]
    fn entropy_flags_uniform_amplitudes() {
        // A uniform distribution has less entropy than a Gaussian of equal
        // variance by ln(sqrt(2 pi e / 12)) = 0.18 nats.
        let ramp: Vec<f64> = (0..5000).map(|i| (i % 1000) as f64).collect();
        let score = entropy_score(&ramp);
        assert!(score > 25.0 && score < 50.0, "score {score}");
    }

    #[test]
    fn carrier_is_spectrally_regular() {
        let tone = carrier(&mut StdRng::seed_from_u64(4), 4096, 64.0, 1024.0, 0.5);
        assert!(spectral_regularity_score(&spectrum(&tone)) > 90.0);
        assert!(spectral_regularity_score(&spectrum(&noise(4))) < 30.0);
    }

    #[test]
    fn concentration_of_a_single_bin() {
        let mut power = vec![0.0; 50];
        power[20] = 1.0;
        assert_eq!(line_concentration(&power, 20), Some(1.0));
        assert_eq!(line_concentration(&[0.0; 5], 2), None);
    }

    #[test]
    fn modulated_tone_has_modulation_structure() {
        let signal: Vec<f64> = (0..4096)
            .map(|i| {
                let t = i as f64;
                (1.0 + 0.8 * (2.0 * PI * t / 256.0).sin()) * (2.0 * PI * t / 8.0).sin()
            })
            .collect();
        assert!(modulation_score(&signal, 1000) > 70.0);

        let pure: Vec<f64> = (0..4096).map(|i| (2.0 * PI * i as f64 / 8.0).sin()).collect();
        assert_eq!(modulation_score(&pure, 1000), 0.0);
        assert!(modulation_score(&noise(5), 1000) < 30.0);
    }

    #[test]
    fn degenerate_inputs_are_neutral() {
        let flat = vec![3.0; 256];
        let power = vec![0.0; 128];
        assert_eq!(periodicity_score(&power), NEUTRAL_SCORE);
        assert_eq!(autocorrelation_score(&flat, 1000), NEUTRAL_SCORE);
        assert_eq!(entropy_score(&flat), NEUTRAL_SCORE);
        assert_eq!(spectral_regularity_score(&power), NEUTRAL_SCORE);
        assert_eq!(modulation_score(&flat, 1000), NEUTRAL_SCORE);
    }

    #[test]
    fn trend_is_not_informative() {
        let ramp: Vec<f64> = (0..500).map(|i| i as f64).collect();
        assert_eq!(autocorrelation_score(&ramp, 1000), NEUTRAL_SCORE);
    }
}
