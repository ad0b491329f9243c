//! FFT utilities for spectral analysis.
//!
//! Provides the one-sided power spectrum used by the seismic and
//! artificiality pipelines, plus the analytic signal (Hilbert transform)
//! for envelope and phase extraction.

use rustfft::{num_complex::Complex64, FftPlanner};
use std::f64::consts::PI;

/// Compute the FFT of a real-valued signal.
///
/// Only the first half (frequencies 0 to N/2) is returned since the
/// spectrum of a real signal is symmetric.
pub fn fft_real(signal: &[f64]) -> Vec<Complex64> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }

    let mut buffer: Vec<Complex64> = signal.iter().map(|&x| Complex64::new(x, 0.0)).collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    buffer.truncate(n / 2 + 1);
    buffer
}

/// One-sided power spectrum `|X[k]|^2 / N` for `k = 0..=N/2`.
///
/// For white noise of unit variance the expected power of every non-DC
/// bin is 1.
pub fn power_spectrum(signal: &[f64]) -> Vec<f64> {
    let n = signal.len() as f64;
    fft_real(signal)
        .iter()
        .map(|c| (c.re * c.re + c.im * c.im) / n)
        .collect()
}

/// Frequencies (in units of `sample_rate`) of the bins returned by [`fft_real`].
pub fn rfft_frequencies(n: usize, sample_rate: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let df = sample_rate / n as f64;
    (0..=n / 2).map(|k| k as f64 * df).collect()
}

/// Analytic signal via FFT: the real part is the input, the imaginary part
/// its Hilbert transform.
pub fn analytic_signal(signal: &[f64]) -> Vec<Complex64> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }

    let mut planner = FftPlanner::<f64>::new();
    let fft_forward = planner.plan_fft_forward(n);
    let fft_inverse = planner.plan_fft_inverse(n);

    let mut buffer: Vec<Complex64> = signal.iter().map(|&x| Complex64::new(x, 0.0)).collect();
    fft_forward.process(&mut buffer);

    // H[0] = 1, H[1..n/2] = 2, H[n/2] = 1 (n even), H[n/2+1..] = 0
    let half = n / 2;
    let doubled_end = if n.is_multiple_of(2) { half } else { half + 1 };
    for c in buffer.iter_mut().take(doubled_end).skip(1) {
        *c *= 2.0;
    }
    for c in buffer.iter_mut().skip(half + 1) {
        *c = Complex64::new(0.0, 0.0);
    }

    fft_inverse.process(&mut buffer);
    for c in buffer.iter_mut() {
        *c /= n as f64;
    }

    buffer
}

/// Instantaneous amplitude of a signal (modulus of the analytic signal).
pub fn hilbert_envelope(signal: &[f64]) -> Vec<f64> {
    analytic_signal(signal).iter().map(|c| c.norm()).collect()
}

/// Instantaneous phase of a signal, unwrapped.
pub fn instantaneous_phase(signal: &[f64]) -> Vec<f64> {
    let wrapped: Vec<f64> = analytic_signal(signal).iter().map(|c| c.arg()).collect();
    unwrap_phase(&wrapped)
}

/// Unwrap phase to remove 2π discontinuities.
pub fn unwrap_phase(phase: &[f64]) -> Vec<f64> {
    if phase.is_empty() {
        return Vec::new();
    }

    let mut unwrapped = Vec::with_capacity(phase.len());
    unwrapped.push(phase[0]);
    let mut correction = 0.0;

    for i in 1..phase.len() {
        let diff = phase[i] - phase[i - 1];
        if diff > PI {
            correction -= 2.0 * PI;
        } else if diff < -PI {
            correction += 2.0 * PI;
        }
        unwrapped.push(phase[i] + correction);
    }

    unwrapped
}
