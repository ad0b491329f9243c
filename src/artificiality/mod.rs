//! Artificiality scoring for sampled radio or optical signals.
//!
//! Five independent tests each map the signal to a sub-score in `[0, 100]`
//! (0 is what Gaussian noise produces):
//!
//! | Test | Evidence it looks for |
//! |------|-----------------------|
//! | periodicity | a periodogram peak far above the noise expectation |
//! | autocorrelation | repetition after the first decorrelation |
//! | entropy | an amplitude distribution unlike Gaussian noise |
//! | spectral regularity | a narrow dominant line |
//! | modulation | repeating structure in the amplitude envelope |
//!
//! The fused score is the weighted mean of the sub-scores, and its
//! [`Classification`] is one of four ordered labels. Tests that cannot be
//! evaluated report [`NEUTRAL_SCORE`].
//!
//! The supporting metrics also look for arithmetic patterns (prime-valued
//! samples, steps of φ, π or e, repeating windows). They are cited as
//! evidence but never change the score.
//!
//! # Example
//!
//! ```
//! use cosmic_signals::artificiality::{analyze_signal, Classification, SignalTest};
//!
//! // A square wave: 10 samples high every 100 samples.
//! let signal: Vec<f64> = (0..4096).map(|i| if i % 100 < 10 { 1.0 } else { 0.0 }).collect();
//! let analysis = analyze_signal(&signal, 1000.0).unwrap();
//!
//! let score = &analysis.artificiality_score;
//! assert!(score.classification >= Classification::LikelyArtificial);
//! assert!(score.per_test_breakdown[&SignalTest::Periodicity] > 70.0);
//! ```

pub mod battery;
pub mod metrics;
pub mod patterns;
pub mod scorer;

pub use battery::{noise_peak_ratio, SignalTest, NEUTRAL_SCORE};
pub use metrics::{Periodicity, PulseRegularity, SupportingMetrics};
pub use patterns::{MathematicalPatterns, PrimeFraction, RepetitionMetrics, SpecialRatios};
pub use scorer::{
    analyze_signal, ArtificialityScore, ArtificialityScorer, Classification, ScorerConfig,
    SignalAnalysis, TestWeights,
};
