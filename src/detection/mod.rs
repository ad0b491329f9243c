//! Detection utilities for astronomical time series.
//!
//! This module provides:
//! - Spectral primitives (FFT power spectrum, Hilbert envelope)
//! - Prominence-based peak extraction
//! - The box least squares periodogram and period grids
//! - Outlier clipping
//! - Transit search ([`TransitDetector`])
//! - Transient flagging ([`TransientDetector`])

pub mod fft;
pub mod outlier;
pub mod peaks;
pub mod periodogram;
pub mod transient;
pub mod transit;

pub use fft::{hilbert_envelope, power_spectrum, rfft_frequencies};
pub use outlier::{
    detect_outliers, replace_outliers, sigma_clip, ClipDirection, OutlierResult,
};
pub use peaks::{find_peaks, prominence};
pub use periodogram::{
    fold, period_grid, periodogram, periodogram_with, BoxFit, BoxSearch, PeriodogramResult,
};
pub use transient::{
    detect_transient_events, Direction, TransientConfig, TransientDetector, TransientEvent,
    TransientKind, ValueScale,
};
pub use transit::{
    detect_transiting_planets, TransitCandidate, TransitConfig, TransitDetector, TransitSearch,
};
