//! VoiceGuard - Synthetic Voice Detection
//!
//! Decides whether a short voice recording is machine-generated or human,
//! returning a classification, a confidence, a risk band and a
//! natural-language explanation.
//!
//! # Architecture
//!
//! Four stages run in sequence, each a plain component with no shared
//! mutable state:
//! - Normalizer: encoded bytes to a mono 16 kHz signal, capped and trimmed
//! - Feature Extractor: signal to a fixed-schema [`FeatureVector`]
//! - Signal Scorer: features to acoustic, temporal and imperfection signals
//! - Fusion: signals to a [`Verdict`], never failing
//!
//! ```no_run
//! let bytes = std::fs::read("sample.wav")?;
//! let verdict = voiceguard::analyze(&bytes, Some("wav"))?;
//! println!("{} ({:.2})", verdict.classification, verdict.confidence);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod scoring;
pub mod verdict;

pub use analysis::{FeatureExtractor, FeatureVector};
pub use config::DetectorConfig;
pub use engine::{NormalizedSignal, Normalizer};
pub use error::{ExtractionError, IngestionError, Result, ScoringFailure, VoiceGuardError};
pub use pipeline::{analyze, Detector};
pub use scoring::{AcousticModel, ClassifierHandle, SignalScorer, SignalScores};
pub use verdict::{Classification, Fusion, RiskLevel, Verdict, VoiceResponse};
