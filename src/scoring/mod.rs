//! Signal Scoring Module
//!
//! Feature vector to three independent anomaly signals. The acoustic signal
//! comes from an optional pretrained classifier, with a deterministic
//! heuristic when none is available.

pub mod classifier;
pub mod signals;

pub use classifier::{AcousticModel, ClassifierArtifact, ClassifierHandle, LogisticModel};
pub use signals::{
    heuristic_acoustic, imperfection_signal, inverse_linear, temporal_signal, SignalScorer,
    SignalScores,
};
