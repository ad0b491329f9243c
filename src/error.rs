//! Error types for the cosmic-signals library.

use thiserror::Error;

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors raised at a component boundary before any computation proceeds.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Too few points, or too short a baseline, for the requested parameters.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Gaps in the sampling preclude a valid spectral analysis.
    #[error(
        "irregular sampling: largest gap {max_gap} exceeds {allowed_factor} x median cadence {median_cadence}"
    )]
    IrregularSampling {
        max_gap: f64,
        median_cadence: f64,
        allowed_factor: f64,
    },

    /// A configuration value or call parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A noise or scale estimate could not be made safely positive and finite.
    #[error("numerical degeneracy: {0}")]
    NumericalDegeneracy(String),

    /// Time and value sequences differ in length.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamps must be strictly increasing.
    #[error("timestamps not strictly increasing at index {index}")]
    NonMonotonicTime { index: usize },

    /// NaN or infinite value in the input.
    #[error("non-finite value at index {index}")]
    NonFiniteValue { index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = AnalysisError::InsufficientData { needed: 10, got: 5 };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 10, got 5"
        );

        let err = AnalysisError::InvalidConfiguration("min_period (5) >= max_period (2)".into());
        assert_eq!(
            err.to_string(),
            "invalid configuration: min_period (5) >= max_period (2)"
        );

        let err = AnalysisError::DimensionMismatch {
            expected: 3,
            got: 2,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 3, got 2");

        let err = AnalysisError::NonMonotonicTime { index: 7 };
        assert_eq!(
            err.to_string(),
            "timestamps not strictly increasing at index 7"
        );
    }

    #[test]
    fn irregular_sampling_names_the_gap() {
        let err = AnalysisError::IrregularSampling {
            max_gap: 2.5,
            median_cadence: 0.5,
            allowed_factor: 3.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("2.5"));
        assert!(msg.contains("0.5"));
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = AnalysisError::NumericalDegeneracy("noise is NaN".into());
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
