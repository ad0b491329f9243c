//! Supporting metrics reported alongside the artificiality score.
//!
//! None of these feed the score; they give a reviewer the numbers behind
//! it. A metric that cannot be computed on the input is `None`.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::battery::{am_index, entropy_bins, SignalTest};
use super::patterns::MathematicalPatterns;
use crate::detection::fft::{hilbert_envelope, instantaneous_phase};
use crate::detection::peaks::find_peaks;
use crate::features::{
    binned_entropy, gaussian_binned_entropy, moments, runs_test, sample_entropy_default, Moments,
    RunsTest,
};
use crate::utils::stats::{mean, std_dev, variance};

/// Sigma above the mean spectral power for a line to be listed.
const PERIODICITY_SIGMA: f64 = 5.0;
const MAX_PERIODICITIES: usize = 10;
/// Sample entropy is quadratic in length, so only a prefix is used.
const SAMPLE_ENTROPY_SAMPLES: usize = 2000;
const SAMPLE_ENTROPY_DIM: usize = 2;
const JUMP_SIGMA: f64 = 3.0;
const MIN_PULSES: usize = 3;
const ROLLOFF_FRACTION: f64 = 0.85;
/// Sub-score from which a test is cited as evidence.
pub const EVIDENCE_SCORE: f64 = 60.0;

/// A spectral line well above the mean power.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Periodicity {
    pub frequency_hz: f64,
    pub period_s: f64,
    pub power: f64,
    /// Standard deviations above the mean spectral power.
    pub significance: f64,
}

/// Spacing of sharp rising edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseRegularity {
    pub n_pulses: usize,
    pub mean_interval_s: f64,
    /// `1 - cv` of the intervals, clamped to `[0, 1]`.
    pub regularity: f64,
}

/// Numbers behind an artificiality score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportingMetrics {
    pub n_samples: usize,
    pub sample_rate: f64,
    pub duration_s: f64,
    /// Strongest first.
    pub periodicities: Vec<Periodicity>,
    pub runs_test: Option<RunsTest>,
    pub moments: Option<Moments>,
    /// Binned entropy over its maximum `ln(n_bins)`.
    pub normalized_entropy: Option<f64>,
    /// Binned entropy Gaussian noise of the same spread would have.
    pub reference_entropy: Option<f64>,
    pub sample_entropy: Option<f64>,
    pub pulse_regularity: Option<PulseRegularity>,
    pub spectral_centroid_hz: Option<f64>,
    pub spectral_rolloff_hz: Option<f64>,
    pub am_index: Option<f64>,
    /// Variance of the instantaneous frequency (Hz²).
    pub fm_variance: Option<f64>,
    /// Prime values, special step sizes and repeating windows.
    pub patterns: MathematicalPatterns,
    /// Tests scoring at least [`EVIDENCE_SCORE`], then striking patterns.
    pub evidence: Vec<String>,
}

impl SupportingMetrics {
    /// Compute every metric.
    ///
    /// `centered` is the mean-removed signal; `power` and `frequencies`
    /// its one-sided spectrum without the zero-frequency bin.
    pub(crate) fn compute(
        signal: &[f64],
        centered: &[f64],
        power: &[f64],
        frequencies: &[f64],
        sample_rate: f64,
        breakdown: &BTreeMap<SignalTest, f64>,
    ) -> Self {
        let n = signal.len();
        let sigma = std_dev(centered);
        let spread = sigma.is_finite() && sigma > 0.0;

        let entropy = binned_entropy(centered, entropy_bins(n));
        let (normalized_entropy, reference_entropy) = match entropy {
            Some(binned) if spread => (
                Some(binned.normalized()),
                Some(gaussian_binned_entropy(sigma, binned.bin_width)),
            ),
            _ => (None, None),
        };
        let prefix = &centered[..n.min(SAMPLE_ENTROPY_SAMPLES)];
        let sample_entropy = Some(sample_entropy_default(prefix, SAMPLE_ENTROPY_DIM))
            .filter(|s| s.is_finite());

        let (spectral_centroid_hz, spectral_rolloff_hz) = match spectral_shape(power, frequencies) {
            Some((centroid, rolloff)) => (Some(centroid), Some(rolloff)),
            None => (None, None),
        };

        let patterns = MathematicalPatterns::compute(signal);
        let mut evidence = evidence(breakdown);
        evidence.extend(patterns.evidence());

        Self {
            n_samples: n,
            sample_rate,
            duration_s: n as f64 / sample_rate,
            periodicities: significant_periodicities(power, frequencies),
            runs_test: runs_test(centered),
            moments: Some(moments(signal)).filter(|_| spread),
            normalized_entropy,
            reference_entropy,
            sample_entropy,
            pulse_regularity: pulse_regularity(centered, sample_rate),
            spectral_centroid_hz,
            spectral_rolloff_hz,
            am_index: am_index(&hilbert_envelope(centered)),
            fm_variance: fm_variance(centered, sample_rate),
            patterns,
            evidence,
        }
    }
}

/// Lines above `mean + 5 sigma` of the spectrum, strongest first, at most 10.
pub fn significant_periodicities(power: &[f64], frequencies: &[f64]) -> Vec<Periodicity> {
    let m = mean(power);
    let sigma = std_dev(power);
    if sigma.is_nan() || sigma <= 0.0 {
        return Vec::new();
    }
    let threshold = m + PERIODICITY_SIGMA * sigma;

    find_peaks(power, 0.0, power.len())
        .into_iter()
        .take_while(|&i| power[i] > threshold)
        .take(MAX_PERIODICITIES)
        .map(|i| Periodicity {
            frequency_hz: frequencies[i],
            period_s: 1.0 / frequencies[i],
            power: power[i],
            significance: (power[i] - m) / sigma,
        })
        .collect()
}

/// Regularity of sharp rising edges.
///
/// A jump is a first difference above `mean|d| + 3 std|d|`; runs of
/// consecutive jump samples count once. Needs at least three pulses.
pub fn pulse_regularity(signal: &[f64], sample_rate: f64) -> Option<PulseRegularity> {
    let diffs: Vec<f64> = signal.windows(2).map(|w| w[1] - w[0]).collect();
    let magnitudes: Vec<f64> = diffs.iter().map(|d| d.abs()).collect();
    let threshold = mean(&magnitudes) + JUMP_SIGMA * std_dev(&magnitudes);
    if threshold.is_nan() || threshold <= 0.0 {
        return None;
    }

    let mut onsets: Vec<usize> = Vec::new();
    let mut previous: Option<usize> = None;
    for (i, &d) in diffs.iter().enumerate() {
        if d > threshold {
            if previous.is_none_or(|p| i > p + 1) {
                onsets.push(i);
            }
            previous = Some(i);
        }
    }
    if onsets.len() < MIN_PULSES {
        return None;
    }

    let intervals: Vec<f64> = onsets
        .windows(2)
        .map(|w| (w[1] - w[0]) as f64 / sample_rate)
        .collect();
    let mean_interval = mean(&intervals);
    let cv = std_dev(&intervals) / mean_interval;
    Some(PulseRegularity {
        n_pulses: onsets.len(),
        mean_interval_s: mean_interval,
        regularity: (1.0 - cv).clamp(0.0, 1.0),
    })
}

/// Power-weighted mean frequency and the frequency below which 85% of the
/// power lies.
pub fn spectral_shape(power: &[f64], frequencies: &[f64]) -> Option<(f64, f64)> {
    let total: f64 = power.iter().sum();
    if total.is_nan() || total <= 0.0 {
        return None;
    }
    let centroid = power.iter().zip(frequencies).map(|(p, f)| p * f).sum::<f64>() / total;

    let mut cumulative = 0.0;
    let mut rolloff = *frequencies.last()?;
    for (p, &f) in power.iter().zip(frequencies) {
        cumulative += p;
        if cumulative >= ROLLOFF_FRACTION * total {
            rolloff = f;
            break;
        }
    }
    Some((centroid, rolloff))
}

/// Variance of the instantaneous frequency (Hz²) from the unwrapped
/// analytic phase.
pub fn fm_variance(signal: &[f64], sample_rate: f64) -> Option<f64> {
    if signal.len() < 3 {
        return None;
    }
    let phase = instantaneous_phase(signal);
    let frequency: Vec<f64> = phase
        .windows(2)
        .map(|w| (w[1] - w[0]) * sample_rate / (2.0 * PI))
        .collect();
    Some(variance(&frequency)).filter(|v| v.is_finite())
}

fn description(test: SignalTest) -> &'static str {
    match test {
        SignalTest::Periodicity => "dominant periodogram peak far above the noise expectation",
        SignalTest::Autocorrelation => "signal repeats after decorrelating",
        SignalTest::Entropy => "amplitude distribution departs from Gaussian noise",
        SignalTest::SpectralRegularity => "narrow dominant spectral line",
        SignalTest::Modulation => "structured amplitude modulation",
    }
}

/// One line per test scoring at least [`EVIDENCE_SCORE`], in test order.
pub fn evidence(breakdown: &BTreeMap<SignalTest, f64>) -> Vec<String> {
    breakdown
        .iter()
        .filter(|(_, score)| **score >= EVIDENCE_SCORE)
        .map(|(test, score)| format!("{} ({score:.0}/100): {}", test.name(), description(*test)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::fft::{power_spectrum, rfft_frequencies};
    use approx::assert_relative_eq;

    fn one_sided(signal: &[f64], sample_rate: f64) -> (Vec<f64>, Vec<f64>) {
        let power = power_spectrum(signal).into_iter().skip(1).collect();
        let freqs = rfft_frequencies(signal.len(), sample_rate).into_iter().skip(1).collect();
        (power, freqs)
    }

    #[test]
    fn tone_is_listed_with_its_period() {
        let signal: Vec<f64> = (0..1024).map(|i| (2.0 * PI * 50.0 * i as f64 / 1000.0).sin()).collect();
        let (power, freqs) = one_sided(&signal, 1000.0);
        let lines = significant_periodicities(&power, &freqs);
        assert!(!lines.is_empty());
        assert!((lines[0].frequency_hz - 50.0).abs() < 1.0);
        assert_relative_eq!(lines[0].period_s, 1.0 / lines[0].frequency_hz);
        assert!(lines.len() <= MAX_PERIODICITIES);
    }

    #[test]
    fn flat_spectrum_lists_nothing() {
        assert!(significant_periodicities(&[1.0; 64], &[1.0; 64]).is_empty());
    }

    #[test]
    fn regular_pulses() {
        let signal: Vec<f64> = (0..1000).map(|i| if i % 100 < 10 { 5.0 } else { 0.0 }).collect();
        let pulses = pulse_regularity(&signal, 10.0).unwrap();
        assert_eq!(pulses.n_pulses, 9);
        assert_relative_eq!(pulses.mean_interval_s, 10.0);
        assert_relative_eq!(pulses.regularity, 1.0);
    }

    #[test]
    fn too_few_pulses() {
        let mut signal = vec![0.0; 500];
        signal[100] = 5.0;
        signal[300] = 5.0;
        assert!(pulse_regularity(&signal, 1.0).is_none());
    }

    #[test]
    fn centroid_and_rolloff() {
        let (centroid, rolloff) =
            spectral_shape(&[1.0, 1.0, 0.0, 2.0], &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_relative_eq!(centroid, 11.0 / 4.0);
        assert_relative_eq!(rolloff, 4.0);
        assert!(spectral_shape(&[0.0; 4], &[1.0, 2.0, 3.0, 4.0]).is_none());
    }

    #[test]
    fn pure_tone_has_steady_frequency() {
        let signal: Vec<f64> = (0..2048).map(|i| (2.0 * PI * i as f64 / 16.0).sin()).collect();
        assert!(fm_variance(&signal, 1.0).unwrap() < 1e-6);
    }

    #[test]
    fn evidence_cites_high_scores_only() {
        let breakdown = BTreeMap::from([
            (SignalTest::Periodicity, 93.0),
            (SignalTest::Entropy, 59.9),
            (SignalTest::Modulation, 60.0),
        ]);
        let lines = evidence(&breakdown);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("periodicity (93/100)"));
        assert!(lines[1].starts_with("modulation structure"));
    }
}
