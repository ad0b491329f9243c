//! Data transformations for light curves and signal streams.
//!
//! Provides rolling baselines, detrending and normalization.
//!
//! # Example
//!
//! ```
//! use cosmic_signals::transform::{detrend, rolling_median, standardize};
//!
//! let series = vec![1.0, 2.0, 3.0, 10.0, 5.0, 6.0, 7.0];
//!
//! // Centered rolling median with window 3
//! let baseline = rolling_median(&series, 3);
//! assert_eq!(baseline.len(), series.len());
//!
//! // Residuals around that baseline
//! let residuals = detrend(&series, 3).unwrap();
//!
//! // Zero mean, unit variance
//! let scaled = standardize(&residuals);
//! ```

pub mod scale;
pub mod window;

pub use scale::{center, normalize_by_median, standardize, ScaleResult};
pub use window::{
    detrend, detrend_series, rolling_mean, rolling_median, rolling_robust_noise,
    window_in_samples,
};
