//! Entropy-based features.
//!
//! Provides the binned Shannon entropy of an amplitude distribution, the
//! entropy a Gaussian of the same spread would have on the same bins, and
//! sample entropy for regularity.

use std::f64::consts::{E, PI};

use serde::{Deserialize, Serialize};

use crate::utils::stats::std_dev;

/// Shannon entropy (nats) of an amplitude histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinnedEntropy {
    /// Entropy in nats.
    pub entropy: f64,
    /// Number of histogram bins.
    pub n_bins: usize,
    /// Width of each bin.
    pub bin_width: f64,
}

impl BinnedEntropy {
    /// Entropy divided by its maximum `ln(n_bins)`, in `[0, 1]`.
    pub fn normalized(&self) -> f64 {
        if self.n_bins < 2 {
            return 0.0;
        }
        self.entropy / (self.n_bins as f64).ln()
    }
}

/// Returns the binned entropy of the series over `n_bins` equal-width bins.
///
/// Returns `None` for an empty or constant series.
pub fn binned_entropy(series: &[f64], n_bins: usize) -> Option<BinnedEntropy> {
    if series.is_empty() || n_bins == 0 {
        return None;
    }

    let min_val = series.iter().copied().fold(f64::INFINITY, f64::min);
    let max_val = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let range = max_val - min_val;
    if range.is_nan() || range <= 1e-10 {
        return None;
    }

    let bin_width = range / n_bins as f64;
    let mut counts = vec![0usize; n_bins];

    for &x in series {
        let bin = ((x - min_val) / bin_width).floor() as usize;
        counts[bin.min(n_bins - 1)] += 1;
    }

    let n = series.len() as f64;
    let entropy = counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            -p * p.ln()
        })
        .sum();

    Some(BinnedEntropy {
        entropy,
        n_bins,
        bin_width,
    })
}

/// Entropy (nats) of a Gaussian with standard deviation `sigma` observed
/// through bins of width `bin_width`: `ln(sigma * sqrt(2 pi e) / bin_width)`.
pub fn gaussian_binned_entropy(sigma: f64, bin_width: f64) -> f64 {
    (sigma * (2.0 * PI * E).sqrt() / bin_width).ln()
}

/// Returns the sample entropy of the time series.
///
/// Sample entropy measures the complexity/regularity of a time series.
/// Lower values indicate more regularity.
///
/// # Arguments
/// * `series` - Input time series
/// * `m` - Embedding dimension (typically 2)
/// * `r` - Tolerance (typically 0.2 * std)
pub fn sample_entropy(series: &[f64], m: usize, r: f64) -> f64 {
    if series.len() < m + 2 {
        return f64::NAN;
    }

    let count_m = count_matches(series, m, r);
    let count_m1 = count_matches(series, m + 1, r);

    if count_m == 0 || count_m1 == 0 {
        return f64::NAN;
    }

    // Sample entropy = -ln(A/B) where A = matches at m+1, B = matches at m
    -((count_m1 as f64) / (count_m as f64)).ln()
}

/// Sample entropy with the conventional tolerance `0.2 * std`.
pub fn sample_entropy_default(series: &[f64], m: usize) -> f64 {
    let sd = std_dev(series);
    if !sd.is_finite() || sd < 1e-10 {
        return f64::NAN;
    }
    sample_entropy(series, m, 0.2 * sd)
}

/// Count template matches (excluding self-matches)
fn count_matches(series: &[f64], m: usize, r: f64) -> usize {
    let n = series.len();
    if n < m {
        return 0;
    }

    let n_templates = n - m;
    let mut count = 0;

    for i in 0..n_templates {
        for j in (i + 1)..n_templates {
            if templates_match(series, i, j, m, r) {
                count += 2;
            }
        }
    }

    count
}

fn templates_match(series: &[f64], i: usize, j: usize, m: usize, r: f64) -> bool {
    (0..m).all(|k| (series[i + k] - series[j + k]).abs() <= r)
}
