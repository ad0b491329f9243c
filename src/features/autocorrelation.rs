//! Autocorrelation features.
//!
//! Provides the direct single-lag estimate and an FFT-based estimate of the
//! whole function, plus the "decorrelation" summaries used to tell quickly
//! decorrelating noise from repeating structure.

use rustfft::{num_complex::Complex64, FftPlanner};

use crate::utils::stats::mean;

/// Returns the autocorrelation at a specific lag.
///
/// # Arguments
/// * `series` - Input time series
/// * `lag` - Lag value
pub fn autocorrelation(series: &[f64], lag: usize) -> f64 {
    if series.len() <= lag {
        return f64::NAN;
    }

    let m = mean(series);

    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for (i, &x) in series.iter().enumerate() {
        denominator += (x - m).powi(2);
        if i >= lag {
            numerator += (x - m) * (series[i - lag] - m);
        }
    }

    if denominator < 1e-10 {
        return 0.0;
    }

    numerator / denominator
}

/// Autocorrelation function for lags `0..=max_lag`, computed via FFT.
///
/// Uses the biased estimator (normalized by the lag-0 sum) so values stay in
/// `[-1, 1]`. Returns `None` for a constant or empty series.
pub fn acf_fft(series: &[f64], max_lag: usize) -> Option<Vec<f64>> {
    let n = series.len();
    if n == 0 {
        return None;
    }
    let m = mean(series);

    // Zero padding to >= 2n avoids circular wrap-around.
    let size = (2 * n).next_power_of_two();
    let mut buffer: Vec<Complex64> = series
        .iter()
        .map(|&x| Complex64::new(x - m, 0.0))
        .chain(std::iter::repeat(Complex64::new(0.0, 0.0)))
        .take(size)
        .collect();

    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(size).process(&mut buffer);
    for c in buffer.iter_mut() {
        *c = Complex64::new(c.norm_sqr(), 0.0);
    }
    planner.plan_fft_inverse(size).process(&mut buffer);

    let zero_lag = buffer[0].re;
    if zero_lag.is_nan() || zero_lag <= 1e-10 * size as f64 {
        return None;
    }

    let max_lag = max_lag.min(n - 1);
    Some(buffer[..=max_lag].iter().map(|c| c.re / zero_lag).collect())
}

/// First lag at which the autocorrelation drops to zero or below.
pub fn first_zero_crossing(acf: &[f64]) -> Option<usize> {
    acf.iter().skip(1).position(|&r| r <= 0.0).map(|i| i + 1)
}

/// Largest autocorrelation beyond the first zero crossing, with its lag.
///
/// Returns `None` if the function never decorrelates within `acf`.
pub fn max_after_decorrelation(acf: &[f64]) -> Option<(usize, f64)> {
    let start = first_zero_crossing(acf)?;
    acf.iter()
        .enumerate()
        .skip(start)
        .max_by(|(ia, a), (ib, b)| a.total_cmp(b).then(ib.cmp(ia)))
        .map(|(lag, &r)| (lag, r))
}
