//! Statistical features of signal streams.
//!
//! # Example
//!
//! ```
//! use cosmic_signals::features::{acf_fft, binned_entropy, runs_test};
//!
//! let series: Vec<f64> = (0..200).map(|i| (i as f64 * 0.3).sin()).collect();
//!
//! let acf = acf_fft(&series, 50).unwrap();
//! assert!((acf[0] - 1.0).abs() < 1e-12);
//!
//! let entropy = binned_entropy(&series, 20).unwrap();
//! assert!(entropy.normalized() > 0.5);
//!
//! let runs = runs_test(&series).unwrap();
//! assert!(runs.is_non_random(0.05));
//! ```

pub mod autocorrelation;
pub mod distribution;
pub mod entropy;

pub use autocorrelation::{
    acf_fft, autocorrelation, first_zero_crossing, max_after_decorrelation,
};
pub use distribution::{kurtosis, moments, runs_test, skewness, Moments, RunsTest};
pub use entropy::{
    binned_entropy, gaussian_binned_entropy, sample_entropy, sample_entropy_default,
    BinnedEntropy,
};
