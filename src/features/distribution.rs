//! Distribution-related features.
//!
//! Provides sample moments and the Wald–Wolfowitz runs test for randomness.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::utils::stats::{mean, median, std_dev};

/// Returns the skewness (third standardized moment).
///
/// Measures the asymmetry of the distribution.
pub fn skewness(series: &[f64]) -> f64 {
    if series.len() < 3 {
        return f64::NAN;
    }
    let n = series.len() as f64;
    let m = mean(series);
    let s = std_dev(series);

    if s < 1e-10 {
        return 0.0;
    }

    let sum_cubed: f64 = series.iter().map(|x| ((x - m) / s).powi(3)).sum();

    // Adjusted Fisher-Pearson standardized moment coefficient
    (n / ((n - 1.0) * (n - 2.0))) * sum_cubed
}

/// Returns the excess kurtosis (normal distribution = 0).
pub fn kurtosis(series: &[f64]) -> f64 {
    if series.len() < 4 {
        return f64::NAN;
    }
    let n = series.len() as f64;
    let m = mean(series);
    let s = std_dev(series);

    if s < 1e-10 {
        return f64::NAN;
    }

    let sum_fourth: f64 = series.iter().map(|x| ((x - m) / s).powi(4)).sum();

    let k = (n * (n + 1.0) / ((n - 1.0) * (n - 2.0) * (n - 3.0))) * sum_fourth;
    k - (3.0 * (n - 1.0).powi(2)) / ((n - 2.0) * (n - 3.0))
}

/// First four moments of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    pub mean: f64,
    pub std_dev: f64,
    pub skewness: f64,
    /// Excess kurtosis.
    pub kurtosis: f64,
}

/// Compute [`Moments`] for a series.
pub fn moments(series: &[f64]) -> Moments {
    Moments {
        mean: mean(series),
        std_dev: std_dev(series),
        skewness: skewness(series),
        kurtosis: kurtosis(series),
    }
}

/// Result of a Wald–Wolfowitz runs test about the median.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunsTest {
    /// Observed number of runs.
    pub n_runs: usize,
    /// Expected number of runs for a random sequence.
    pub expected_runs: f64,
    /// Standardized statistic.
    pub z_score: f64,
    /// Two-sided p-value under the normal approximation.
    pub p_value: f64,
}

impl RunsTest {
    /// Whether randomness is rejected at significance `alpha`.
    pub fn is_non_random(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Wald–Wolfowitz runs test on the signs of `x - median`.
///
/// Values equal to the median are skipped. Returns `None` when either side
/// of the median is empty.
pub fn runs_test(series: &[f64]) -> Option<RunsTest> {
    if series.is_empty() {
        return None;
    }
    let center = median(series);
    let signs: Vec<bool> = series
        .iter()
        .filter(|&&x| x != center)
        .map(|&x| x > center)
        .collect();

    let n1 = signs.iter().filter(|&&s| s).count() as f64;
    let n2 = signs.len() as f64 - n1;
    if n1 == 0.0 || n2 == 0.0 {
        return None;
    }

    let n_runs = 1 + signs.windows(2).filter(|w| w[0] != w[1]).count();
    let n = n1 + n2;
    let expected = 2.0 * n1 * n2 / n + 1.0;
    let variance = 2.0 * n1 * n2 * (2.0 * n1 * n2 - n) / (n * n * (n - 1.0));

    let z = if variance > 0.0 {
        (n_runs as f64 - expected) / variance.sqrt()
    } else {
        0.0
    };
    let p_value = 2.0 * (1.0 - Normal::standard().cdf(z.abs()));

    Some(RunsTest {
        n_runs,
        expected_runs: expected,
        z_score: z,
        p_value: p_value.clamp(0.0, 1.0),
    })
}
