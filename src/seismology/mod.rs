//! Asteroseismology of solar-like oscillators.
//!
//! The analysis chain:
//! 1. Validate the sampling, interpolate small gaps and flatten the light curve.
//! 2. Compute the power spectrum in μHz.
//! 3. Locate `nu_max` and the large separation `delta_nu` from significant peaks.
//! 4. Identify individual modes, the envelope width and rotational splitting.
//! 5. Convert `(nu_max, delta_nu)` to stellar properties via scaling relations.
//!
//! # Example
//!
//! ```
//! use cosmic_signals::seismology::StellarParameters;
//!
//! let star = StellarParameters::from_seismic(3090.0, 135.1).unwrap();
//! assert!((star.mass_solar - 1.0).abs() < 1e-12);
//! ```

mod analyzer;
mod modes;
mod scaling;
mod spectrum;

pub use analyzer::{
    analyze_stellar_vibrations, AsteroseismologyAnalyzer, SeismicAnalysis, SeismologyConfig,
};
pub use modes::{
    envelope_fwhm, identify_modes, large_separation, power_weighted_centroid, quality_metrics,
    rotational_splitting, significant_peaks, DeltaNuSource, OscillationMode, QualityFlag,
    QualityMetrics, Rotation,
};
pub use scaling::{
    delta_nu_prior, radial_epsilon, EvolutionaryStage, StellarParameters, DELTA_NU_SUN,
    LOG_G_SUN, NU_MAX_SUN, TEFF_SUN,
};
pub use spectrum::{
    compute_power_spectrum, nyquist_uhz, prepare_light_curve, PowerSpectrum, SECONDS_PER_DAY,
};
