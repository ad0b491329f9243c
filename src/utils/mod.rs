//! Shared numerical utilities.

pub mod stats;

pub use stats::{mad, mean, median, percentile, robust_noise, std_dev, variance, NOISE_EPSILON};
