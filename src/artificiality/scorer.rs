//! Fusion of the test battery into a single artificiality score.

use std::collections::BTreeMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::battery::{
    autocorrelation_score, entropy_score, modulation_score, periodicity_score,
    spectral_regularity_score, SignalTest,
};
use super::metrics::SupportingMetrics;
use crate::detection::fft::{power_spectrum, rfft_frequencies};
use crate::error::{AnalysisError, Result};
use crate::transform::center;
use crate::utils::stats::{mean, std_dev, NOISE_EPSILON};

/// Relative weight of each test in the fused score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestWeights {
    pub periodicity: f64,
    pub autocorrelation: f64,
    pub entropy: f64,
    pub spectral_regularity: f64,
    pub modulation: f64,
}

impl Default for TestWeights {
    fn default() -> Self {
        Self {
            periodicity: 0.25,
            autocorrelation: 0.20,
            entropy: 0.15,
            spectral_regularity: 0.25,
            modulation: 0.15,
        }
    }
}

impl TestWeights {
    pub fn weight(&self, test: SignalTest) -> f64 {
        match test {
            SignalTest::Periodicity => self.periodicity,
            SignalTest::Autocorrelation => self.autocorrelation,
            SignalTest::Entropy => self.entropy,
            SignalTest::SpectralRegularity => self.spectral_regularity,
            SignalTest::Modulation => self.modulation,
        }
    }

    /// Weights must be finite and non-negative with a positive sum.
    pub fn validate(&self) -> Result<()> {
        for test in SignalTest::ALL {
            let w = self.weight(test);
            if !(w.is_finite() && w >= 0.0) {
                return Err(AnalysisError::InvalidConfiguration(format!(
                    "weight for {} must be finite and non-negative, got {w}",
                    test.name()
                )));
            }
        }
        let total: f64 = SignalTest::ALL.iter().map(|&t| self.weight(t)).sum();
        if total <= 0.0 {
            return Err(AnalysisError::InvalidConfiguration(
                "test weights must not all be zero".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration for [`ArtificialityScorer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerConfig {
    pub weights: TestWeights,
    /// Longest autocorrelation lag searched (samples); also capped at n/4.
    pub max_acf_lag: usize,
    /// Shortest signal accepted.
    pub min_samples: usize,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            weights: TestWeights::default(),
            max_acf_lag: 1000,
            min_samples: 32,
        }
    }
}

impl ScorerConfig {
    pub fn with_weights(mut self, weights: TestWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_max_acf_lag(mut self, lag: usize) -> Self {
        self.max_acf_lag = lag;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        if self.max_acf_lag < 2 {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "max_acf_lag must be >= 2, got {}",
                self.max_acf_lag
            )));
        }
        if self.min_samples < 8 {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "min_samples must be >= 8, got {}",
                self.min_samples
            )));
        }
        Ok(())
    }
}

/// Ordered label for a fused score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// Below 30.
    LikelyNatural,
    /// 30 to 55.
    Ambiguous,
    /// 55 to 75.
    LikelyArtificial,
    /// 75 and above.
    StrongCandidate,
}

impl Classification {
    pub fn from_score(score: f64) -> Self {
        if score < 30.0 {
            Classification::LikelyNatural
        } else if score < 55.0 {
            Classification::Ambiguous
        } else if score < 75.0 {
            Classification::LikelyArtificial
        } else {
            Classification::StrongCandidate
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Classification::LikelyNatural => "likely natural",
            Classification::Ambiguous => "ambiguous",
            Classification::LikelyArtificial => "likely artificial",
            Classification::StrongCandidate => "strong candidate",
        }
    }
}

/// Fused score with the sub-score of every test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtificialityScore {
    /// Weighted mean of the sub-scores, in `[0, 100]`.
    pub score: f64,
    pub classification: Classification,
    pub per_test_breakdown: BTreeMap<SignalTest, f64>,
}

/// Score plus the metrics behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalAnalysis {
    pub artificiality_score: ArtificialityScore,
    pub supporting_metrics: SupportingMetrics,
}

/// Runs the test battery on a sampled signal.
///
/// Each call is independent; the scorer holds only its configuration.
#[derive(Debug, Clone, Default)]
pub struct ArtificialityScorer {
    config: ScorerConfig,
}

impl ArtificialityScorer {
    pub fn new(config: ScorerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Score `signal` sampled at `sample_rate` Hz.
    ///
    /// A constant signal is valid input: every test reports the neutral
    /// sub-score.
    ///
    /// # Errors
    /// - `InvalidConfiguration` if `sample_rate` is not positive and finite.
    /// - `InsufficientData` below `min_samples`.
    /// - `NonFiniteValue` for NaN or infinite samples.
    pub fn analyze(&self, signal: &[f64], sample_rate: f64) -> Result<SignalAnalysis> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "sample_rate must be positive and finite, got {sample_rate}"
            )));
        }
        if signal.len() < self.config.min_samples {
            return Err(AnalysisError::InsufficientData {
                needed: self.config.min_samples,
                got: signal.len(),
            });
        }
        if let Some(index) = signal.iter().position(|v| !v.is_finite()) {
            return Err(AnalysisError::NonFiniteValue { index });
        }

        info!(
            "Scoring artificiality of {} samples at {} Hz",
            signal.len(),
            sample_rate
        );

        // Rounding residue of a constant signal would otherwise pass for structure.
        let level = mean(signal).abs().max(1.0);
        let centered = if std_dev(signal) <= NOISE_EPSILON * level {
            debug!("Signal is constant; all tests report neutral");
            vec![0.0; signal.len()]
        } else {
            center(signal)
        };

        let power: Vec<f64> = power_spectrum(&centered).into_iter().skip(1).collect();
        let frequencies: Vec<f64> = rfft_frequencies(signal.len(), sample_rate)
            .into_iter()
            .skip(1)
            .collect();

        let max_lag = self.config.max_acf_lag;
        let per_test_breakdown: BTreeMap<SignalTest, f64> = SignalTest::ALL
            .iter()
            .map(|&test| {
                let score = match test {
                    SignalTest::Periodicity => periodicity_score(&power),
                    SignalTest::Autocorrelation => autocorrelation_score(&centered, max_lag),
                    SignalTest::Entropy => entropy_score(&centered),
                    SignalTest::SpectralRegularity => spectral_regularity_score(&power),
                    SignalTest::Modulation => modulation_score(&centered, max_lag),
                };
                debug!("{} sub-score: {:.1}", test.name(), score);
                (test, score)
            })
            .collect();

        let weights = &self.config.weights;
        let total_weight: f64 = SignalTest::ALL.iter().map(|&t| weights.weight(t)).sum();
        let weighted: f64 = per_test_breakdown
            .iter()
            .map(|(&test, &score)| weights.weight(test) * score)
            .sum();
        let score = (weighted / total_weight).clamp(0.0, 100.0);
        let classification = Classification::from_score(score);

        info!(
            "Artificiality score {:.1} ({})",
            score,
            classification.label()
        );

        let supporting_metrics = SupportingMetrics::compute(
            signal,
            &centered,
            &power,
            &frequencies,
            sample_rate,
            &per_test_breakdown,
        );

        Ok(SignalAnalysis {
            artificiality_score: ArtificialityScore {
                score,
                classification,
                per_test_breakdown,
            },
            supporting_metrics,
        })
    }
}

/// Score a signal with the default configuration.
pub fn analyze_signal(signal: &[f64], sample_rate: f64) -> Result<SignalAnalysis> {
    ArtificialityScorer::default().analyze(signal, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artificiality::battery::NEUTRAL_SCORE;
    use crate::synthetic::{pulse_train, white_noise};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn default_weights_sum_to_one() {
        let w = TestWeights::default();
        let total: f64 = SignalTest::ALL.iter().map(|&t| w.weight(t)).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
        assert!(ScorerConfig::default().validate().is_ok());
    }

    #[test]
    fn bad_weights_are_rejected() {
        let negative = TestWeights { entropy: -0.1, ..TestWeights::default() };
        assert!(ArtificialityScorer::new(ScorerConfig::default().with_weights(negative)).is_err());

        let zero = TestWeights {
            periodicity: 0.0,
            autocorrelation: 0.0,
            entropy: 0.0,
            spectral_regularity: 0.0,
            modulation: 0.0,
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn classification_thresholds() {
        assert_eq!(Classification::from_score(0.0), Classification::LikelyNatural);
        assert_eq!(Classification::from_score(29.9), Classification::LikelyNatural);
        assert_eq!(Classification::from_score(30.0), Classification::Ambiguous);
        assert_eq!(Classification::from_score(55.0), Classification::LikelyArtificial);
        assert_eq!(Classification::from_score(75.0), Classification::StrongCandidate);
        assert!(Classification::StrongCandidate > Classification::LikelyNatural);
    }

    #[test]
    fn pulse_train_is_a_strong_candidate() {
        let signal = pulse_train(&mut StdRng::seed_from_u64(42), 4096, 100, 10, 5.0, 1.0);
        let analysis = analyze_signal(&signal, 1000.0).unwrap();
        let score = &analysis.artificiality_score;

        assert!(score.score >= 75.0, "score {}", score.score);
        assert_eq!(score.classification, Classification::StrongCandidate);
        assert!(score.per_test_breakdown[&SignalTest::Periodicity] >= 70.0);
        assert!(score.per_test_breakdown[&SignalTest::SpectralRegularity] >= 70.0);

        let metrics = &analysis.supporting_metrics;
        let strongest = metrics.periodicities[0];
        // 100-sample pulses at 1 kHz
        assert!((strongest.frequency_hz - 10.0).abs() < 0.5);
        assert!(!metrics.evidence.is_empty());
    }

    #[test]
    fn noise_is_likely_natural() {
        let signal = white_noise(&mut StdRng::seed_from_u64(9), 4096, 1.0);
        let analysis = analyze_signal(&signal, 1000.0).unwrap();
        assert!(analysis.artificiality_score.score < 30.0);
        assert_eq!(
            analysis.artificiality_score.classification,
            Classification::LikelyNatural
        );
        assert!(analysis.supporting_metrics.evidence.is_empty());
    }

    #[test]
    fn clean_square_wave_cites_repetition() {
        let signal: Vec<f64> = (0..4096).map(|i| if i % 100 < 10 { 1.0 } else { 0.0 }).collect();
        let analysis = analyze_signal(&signal, 1000.0).unwrap();
        let metrics = &analysis.supporting_metrics;

        let repetition = metrics.patterns.repetition.unwrap();
        assert_eq!(repetition.sequence_length, 19);
        assert!(metrics
            .evidence
            .iter()
            .any(|line| line.starts_with("repeating sequences")));
    }

    #[test]
    fn constant_signal_is_neutral() {
        let analysis = analyze_signal(&[0.1; 500], 10.0).unwrap();
        let score = &analysis.artificiality_score;
        assert_eq!(score.per_test_breakdown.len(), 5);
        for &sub in score.per_test_breakdown.values() {
            assert_eq!(sub, NEUTRAL_SCORE);
        }
        assert_relative_eq!(score.score, NEUTRAL_SCORE, epsilon = 1e-12);
        assert_eq!(score.classification, Classification::Ambiguous);
        assert!(analysis.supporting_metrics.moments.is_none());
    }

    #[test]
    fn weights_shift_the_score() {
        let signal = pulse_train(&mut StdRng::seed_from_u64(5), 2048, 64, 8, 4.0, 1.0);
        let only_entropy = TestWeights {
            periodicity: 0.0,
            autocorrelation: 0.0,
            entropy: 1.0,
            spectral_regularity: 0.0,
            modulation: 0.0,
        };
        let scorer =
            ArtificialityScorer::new(ScorerConfig::default().with_weights(only_entropy)).unwrap();
        let analysis = scorer.analyze(&signal, 1.0).unwrap();
        let score = &analysis.artificiality_score;
        assert_relative_eq!(
            score.score,
            score.per_test_breakdown[&SignalTest::Entropy],
            epsilon = 1e-12
        );
    }

    #[test]
    fn input_errors() {
        let signal = vec![1.0, 2.0, 3.0];
        assert!(matches!(
            analyze_signal(&signal, 1.0),
            Err(AnalysisError::InsufficientData { needed: 32, got: 3 })
        ));
        assert!(matches!(
            analyze_signal(&[1.0; 64], 0.0),
            Err(AnalysisError::InvalidConfiguration(_))
        ));
        assert!(analyze_signal(&[1.0; 64], f64::NAN).is_err());

        let mut bad = vec![0.5; 64];
        bad[17] = f64::INFINITY;
        assert_eq!(
            analyze_signal(&bad, 1.0).unwrap_err(),
            AnalysisError::NonFiniteValue { index: 17 }
        );
    }
}
