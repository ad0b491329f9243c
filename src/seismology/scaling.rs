//! Asteroseismic scaling relations.
//!
//! Mass and radius follow Kjeldsen & Bedding (1995) with the effective
//! temperature fixed at the solar value:
//!
//! ```text
//! M / M_sun = (nu_max / nu_max_sun)^3 * (delta_nu / delta_nu_sun)^-4
//! R / R_sun = (nu_max / nu_max_sun)   * (delta_nu / delta_nu_sun)^-2
//! ```
//!
//! Everything else is derived from those two numbers: surface gravity and
//! mean density directly, age from a coarse mass-lifetime rule, and an
//! indicative temperature from `nu_max` alone. None of these are
//! independent measurements.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Solar frequency of maximum power (μHz).
pub const NU_MAX_SUN: f64 = 3090.0;
/// Solar large separation (μHz).
pub const DELTA_NU_SUN: f64 = 135.1;
/// Solar surface gravity, log10(cm s^-2).
pub const LOG_G_SUN: f64 = 4.438;
/// Solar effective temperature (K).
pub const TEFF_SUN: f64 = 5777.0;

/// Expected large separation for a given `nu_max` (Stello et al. 2009).
pub fn delta_nu_prior(nu_max: f64) -> f64 {
    0.263 * nu_max.powf(0.772)
}

/// Phase offset of the radial modes, `epsilon`, for a given large
/// separation (Mosser et al. 2011), reduced to `[0, 1)`.
pub fn radial_epsilon(delta_nu: f64) -> f64 {
    (0.601 + 0.632 * delta_nu.log10()).rem_euclid(1.0)
}

/// Evolutionary stage from surface gravity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvolutionaryStage {
    MainSequence,
    Subgiant,
    RedGiantBranch,
    /// Red clump or asymptotic giant branch.
    RedClump,
}

impl EvolutionaryStage {
    pub fn from_log_g(log_g: f64) -> Self {
        if log_g > 4.0 {
            EvolutionaryStage::MainSequence
        } else if log_g > 3.5 {
            EvolutionaryStage::Subgiant
        } else if log_g > 2.5 {
            EvolutionaryStage::RedGiantBranch
        } else {
            EvolutionaryStage::RedClump
        }
    }
}

/// Stellar properties implied by `nu_max` and `delta_nu`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StellarParameters {
    /// Frequency of maximum power (μHz).
    pub nu_max: f64,
    /// Large frequency separation (μHz).
    pub delta_nu: f64,
    pub mass_solar: f64,
    pub radius_solar: f64,
    /// Surface gravity, log10(cm s^-2).
    pub log_g: f64,
    /// Mean density relative to the Sun.
    pub density_solar: f64,
    /// Coarse age estimate from mass.
    pub age_gyr: f64,
    /// Indicative effective temperature.
    pub teff_k: f64,
    pub evolutionary_stage: EvolutionaryStage,
}

impl StellarParameters {
    /// Apply the scaling relations.
    ///
    /// # Errors
    /// `NumericalDegeneracy` unless both inputs are finite and positive.
    pub fn from_seismic(nu_max: f64, delta_nu: f64) -> Result<Self> {
        for (name, value) in [("nu_max", nu_max), ("delta_nu", delta_nu)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(AnalysisError::NumericalDegeneracy(format!(
                    "{name} must be positive and finite for scaling relations, got {value}"
                )));
            }
        }

        let nu = nu_max / NU_MAX_SUN;
        let dnu = delta_nu / DELTA_NU_SUN;

        let mass = nu.powi(3) * dnu.powi(-4);
        let radius = nu * dnu.powi(-2);
        let log_g = (mass / radius.powi(2)).log10() + LOG_G_SUN;

        let age_gyr = if mass > 1.2 {
            5.0 / mass
        } else {
            5.0 + 5.0 * (1.0 - mass)
        };

        // Dwarfs scatter around the solar value; giants are cooler.
        let teff_k = if nu_max > 2000.0 {
            TEFF_SUN + 0.5 * (nu_max - NU_MAX_SUN)
        } else {
            TEFF_SUN - (NU_MAX_SUN - nu_max)
        };

        Ok(Self {
            nu_max,
            delta_nu,
            mass_solar: mass,
            radius_solar: radius,
            log_g,
            density_solar: dnu.powi(2),
            age_gyr: age_gyr.max(0.0),
            teff_k,
            evolutionary_stage: EvolutionaryStage::from_log_g(log_g),
        })
    }
}
