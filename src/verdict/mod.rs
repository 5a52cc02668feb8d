//! Fusion & Explanation Module
//!
//! Anomaly signals to a classification, confidence, risk band and
//! explanation, plus the response document handed to callers.

pub mod explain;
pub mod fusion;
pub mod response;

pub use explain::explain;
pub use fusion::{Classification, Fusion, RiskLevel, Verdict, VerdictDebug};
pub use response::{VoiceResponse, LANGUAGE_AGNOSTIC};
