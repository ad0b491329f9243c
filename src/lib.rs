//! # cosmic-signals
//!
//! Detection and inference on astronomical time series.
//!
//! | Component | Module | Entry point |
//! |-----------|--------|-------------|
//! | Signal statistics | [`utils`], [`transform`], [`detection`] | `robust_noise`, `detrend`, `periodogram`, `find_peaks` |
//! | Transit search | [`detection::transit`] | [`detection::detect_transiting_planets`] |
//! | Transient flagging | [`detection::transient`] | [`detection::detect_transient_events`] |
//! | Asteroseismology | [`seismology`] | [`seismology::analyze_stellar_vibrations`] |
//! | Artificiality scoring | [`artificiality`] | [`artificiality::analyze_signal`] |
//!
//! Every component is stateless apart from its configuration, validates its
//! input before doing any work, and returns plain serializable values. The
//! crate logs through the `log` facade and never installs a logger.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::needless_range_loop)]

pub mod artificiality;
pub mod core;
pub mod detection;
pub mod error;
pub mod features;
pub mod seismology;
pub mod synthetic;
pub mod transform;
pub mod utils;

pub use error::{AnalysisError, Result};

pub mod prelude {
    pub use crate::artificiality::{
        analyze_signal, ArtificialityScore, ArtificialityScorer, Classification, ScorerConfig,
        SignalAnalysis,
    };
    pub use crate::core::TimeSeries;
    pub use crate::detection::{
        detect_transient_events, detect_transiting_planets, TransientConfig, TransientDetector,
        TransientEvent, TransitCandidate, TransitConfig, TransitDetector,
    };
    pub use crate::error::{AnalysisError, Result};
    pub use crate::seismology::{
        analyze_stellar_vibrations, AsteroseismologyAnalyzer, SeismicAnalysis, SeismologyConfig,
        StellarParameters,
    };
}
