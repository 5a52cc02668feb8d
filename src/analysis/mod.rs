//! Feature Extraction Module
//!
//! Turns a normalized signal into a fixed-schema [`FeatureVector`]:
//! - Framing and windowing helpers
//! - Spectral descriptors (cepstral timbre coefficients, flatness)
//! - Fundamental-frequency tracking
//! - Zero-crossing rate and energy

pub mod features;
pub mod framing;
pub mod pitch;
pub mod spectral;

pub use features::{zero_crossing_rate, FeatureExtractor, FeatureVector, CLASSIFIER_INPUT_WIDTH};
pub use framing::Framer;
pub use pitch::{PitchEstimator, PitchStats};
pub use spectral::{spectral_flatness, SpectralAnalyzer};
