//! Number-theoretic and repetition patterns in the raw sample values.
//!
//! These are reported with the supporting metrics and cited as evidence
//! when striking, but do not feed the score.

use serde::{Deserialize, Serialize};

use crate::utils::stats::{mean, std_dev};

/// Largest magnitude tested for primality.
const PRIME_LIMIT: f64 = 1e9;
/// Distance from an integer still treated as integer-valued.
const INTEGER_TOLERANCE: f64 = 0.1;
const PRIME_EVIDENCE_FRACTION: f64 = 0.5;

const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;
const CONSTANT_TOLERANCE: f64 = 0.01;
const MIN_DIFFERENCES: usize = 11;
const SPECIAL_EVIDENCE_FRACTION: f64 = 0.05;

/// Repetition search runs on this prefix; it is quadratic in length.
const REPETITION_SAMPLES: usize = 1024;
const MIN_SEQUENCE_LEN: usize = 3;
const MAX_SEQUENCE_LEN: usize = 19;
/// Match tolerance in standard deviations.
const REPEAT_TOLERANCE: f64 = 0.1;
const MIN_REPEATS: usize = 2;
/// Chance recurrences of noise stay far below this length.
const EVIDENCE_SEQUENCE_LEN: usize = 8;

/// Share of prime values in integer-valued data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrimeFraction {
    pub observed: f64,
    /// Mean prime density `1 / ln|n|` at the observed magnitudes.
    pub expected: f64,
}

/// Share of successive absolute differences within 0.01 of each constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecialRatios {
    pub golden_ratio: f64,
    pub pi: f64,
    pub e: f64,
}

impl SpecialRatios {
    /// The constant the differences match most often, with its share.
    pub fn strongest(&self) -> (&'static str, f64) {
        [("golden ratio", self.golden_ratio), ("pi", self.pi), ("e", self.e)]
            .into_iter()
            .fold(("golden ratio", f64::NEG_INFINITY), |best, c| if c.1 > best.1 { c } else { best })
    }
}

/// Longest window that recurs later in the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepetitionMetrics {
    /// Samples in the repeating window.
    pub sequence_length: usize,
    /// Non-overlapping later occurrences of the best window.
    pub repetitions: usize,
}

/// All pattern checks on one signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MathematicalPatterns {
    /// `None` unless every sample is within 0.1 of an integer.
    pub prime_fraction: Option<PrimeFraction>,
    pub special_ratios: Option<SpecialRatios>,
    /// `None` when no window of three or more samples recurs twice.
    pub repetition: Option<RepetitionMetrics>,
}

impl MathematicalPatterns {
    pub fn compute(signal: &[f64]) -> Self {
        Self {
            prime_fraction: prime_fraction(signal),
            special_ratios: special_ratios(signal),
            repetition: repetition(signal),
        }
    }

    /// One line per striking pattern.
    pub fn evidence(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(rep) = self.repetition.filter(|r| r.sequence_length >= EVIDENCE_SEQUENCE_LEN) {
            lines.push(format!(
                "repeating sequences: a {}-sample pattern recurs {} times",
                rep.sequence_length, rep.repetitions
            ));
        }
        if let Some(primes) = self.prime_fraction {
            if primes.observed >= PRIME_EVIDENCE_FRACTION && primes.observed >= 2.0 * primes.expected {
                lines.push(format!(
                    "prime-valued samples: {:.0}% against {:.0}% expected",
                    100.0 * primes.observed,
                    100.0 * primes.expected
                ));
            }
        }
        if let Some(ratios) = self.special_ratios {
            let (name, share) = ratios.strongest();
            if share > SPECIAL_EVIDENCE_FRACTION {
                lines.push(format!(
                    "step sizes cluster at {name}: {:.0}% of differences",
                    100.0 * share
                ));
            }
        }
        lines
    }
}

fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Prime share of integer-valued data.
pub fn prime_fraction(signal: &[f64]) -> Option<PrimeFraction> {
    if signal.is_empty()
        || signal
            .iter()
            .any(|x| (x - x.round()).abs() > INTEGER_TOLERANCE || x.abs() > PRIME_LIMIT)
    {
        return None;
    }
    let magnitudes: Vec<u64> = signal.iter().map(|x| x.round().abs() as u64).collect();
    let n = magnitudes.len() as f64;
    let primes = magnitudes.iter().filter(|&&m| is_prime(m)).count();
    let expected = magnitudes
        .iter()
        .filter(|&&m| m >= 2)
        .map(|&m| 1.0 / (m as f64).ln().max(1.0))
        .sum::<f64>()
        / n;
    Some(PrimeFraction {
        observed: primes as f64 / n,
        expected,
    })
}

/// How often successive steps land on φ, π or e.
pub fn special_ratios(signal: &[f64]) -> Option<SpecialRatios> {
    let steps: Vec<f64> = signal
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .filter(|&d| d > 0.0)
        .collect();
    if steps.len() < MIN_DIFFERENCES {
        return None;
    }
    let share = |target: f64| {
        steps
            .iter()
            .filter(|&&d| (d - target).abs() < CONSTANT_TOLERANCE)
            .count() as f64
            / steps.len() as f64
    };
    Some(SpecialRatios {
        golden_ratio: share(GOLDEN_RATIO),
        pi: share(std::f64::consts::PI),
        e: share(std::f64::consts::E),
    })
}

/// Longest recurring window of the standardized signal prefix.
///
/// Lengths from 19 down to 3 (and below a quarter of the prefix) are tried
/// in turn; the first with a window that recurs at least twice wins.
pub fn repetition(signal: &[f64]) -> Option<RepetitionMetrics> {
    let prefix = &signal[..signal.len().min(REPETITION_SAMPLES)];
    let sigma = std_dev(prefix);
    if !(sigma.is_finite() && sigma > 0.0) {
        return None;
    }
    let m = mean(prefix);
    let z: Vec<f64> = prefix.iter().map(|x| (x - m) / sigma).collect();

    let longest = (z.len() / 4).min(MAX_SEQUENCE_LEN + 1);
    (MIN_SEQUENCE_LEN..longest).rev().find_map(|len| {
        let repetitions = (0..z.len() - len)
            .map(|start| recurrences(&z, start, len))
            .max()
            .unwrap_or(0);
        (repetitions >= MIN_REPEATS).then_some(RepetitionMetrics {
            sequence_length: len,
            repetitions,
        })
    })
}

/// Non-overlapping matches of `z[start..start + len]` after itself.
fn recurrences(z: &[f64], start: usize, len: usize) -> usize {
    let window = &z[start..start + len];
    let mut count = 0;
    let mut j = start + len;
    while j + len <= z.len() {
        let matches = z[j..j + len]
            .iter()
            .zip(window)
            .all(|(a, b)| (a - b).abs() <= REPEAT_TOLERANCE);
        if matches {
            count += 1;
            j += len;
        } else {
            j += 1;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::white_noise;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn primality() {
        let primes: Vec<u64> = (0..30).filter(|&n| is_prime(n)).collect();
        assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
        assert!(is_prime(7919));
        assert!(!is_prime(7917));
    }

    #[test]
    fn prime_sequence_is_cited() {
        let signal: Vec<f64> = (2..3000u64).filter(|&n| is_prime(n)).map(|n| n as f64).collect();
        let patterns = MathematicalPatterns::compute(&signal);
        let primes = patterns.prime_fraction.unwrap();
        assert_relative_eq!(primes.observed, 1.0);
        assert!(primes.expected < 0.2);
        assert!(patterns.evidence().iter().any(|l| l.starts_with("prime-valued")));
    }

    #[test]
    fn counts_at_natural_prime_density_are_not_cited() {
        let signal: Vec<f64> = (100..400).map(f64::from).collect();
        let primes = prime_fraction(&signal).unwrap();
        assert!(primes.observed < PRIME_EVIDENCE_FRACTION);
        assert!(MathematicalPatterns::compute(&signal).evidence().is_empty());
    }

    #[test]
    fn non_integer_data_has_no_prime_fraction() {
        assert!(prime_fraction(&[1.0, 2.5, 3.0]).is_none());
        assert!(prime_fraction(&[]).is_none());
    }

    #[test]
    fn pi_steps() {
        let signal: Vec<f64> = (0..50).map(|i| std::f64::consts::PI * i as f64).collect();
        let ratios = special_ratios(&signal).unwrap();
        assert_relative_eq!(ratios.pi, 1.0);
        assert_relative_eq!(ratios.e, 0.0);
        assert_eq!(ratios.strongest().0, "pi");
        assert!(special_ratios(&signal[..5]).is_none());
    }

    #[test]
    fn square_wave_repeats() {
        let signal: Vec<f64> = (0..600).map(|i| if i % 40 < 7 { 1.0 } else { 0.0 }).collect();
        let rep = repetition(&signal).unwrap();
        assert_eq!(rep.sequence_length, MAX_SEQUENCE_LEN);
        assert!(rep.repetitions >= 10);
        let evidence = MathematicalPatterns::compute(&signal).evidence();
        assert!(evidence[0].starts_with("repeating sequences: a 19-sample pattern"));
    }

    #[test]
    fn noise_has_only_short_chance_repeats() {
        for seed in 0..5 {
            let signal = white_noise(&mut StdRng::seed_from_u64(seed), 2048, 1.0);
            let patterns = MathematicalPatterns::compute(&signal);
            if let Some(rep) = patterns.repetition {
                assert!(rep.sequence_length < EVIDENCE_SEQUENCE_LEN, "seed {seed}");
            }
            assert!(patterns.prime_fraction.is_none());
            assert!(patterns.evidence().is_empty(), "seed {seed}");
        }
    }

    #[test]
    fn constant_signal_has_no_repetition() {
        assert!(repetition(&[3.0; 200]).is_none());
        assert!(repetition(&[1.0, 2.0]).is_none());
    }
}
