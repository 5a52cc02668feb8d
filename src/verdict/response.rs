//! Caller-facing response document

use serde::{Deserialize, Serialize};

use crate::verdict::fusion::{Classification, RiskLevel, Verdict};

/// Language tag reported when the caller supplied none
pub const LANGUAGE_AGNOSTIC: &str = "language-agnostic";

/// Verdict as returned to API and CLI callers
///
/// Analysis does not depend on language; `language` is passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceResponse {
    pub classification: Classification,
    pub confidence: f64,
    pub risk_level: RiskLevel,
    pub language: String,
    pub explanation: String,
}

impl VoiceResponse {
    pub fn from_verdict(verdict: &Verdict, language: Option<&str>) -> Self {
        let language = language
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .unwrap_or(LANGUAGE_AGNOSTIC);

        Self {
            classification: verdict.classification,
            confidence: round_to_hundredths(verdict.confidence),
            risk_level: verdict.risk_level,
            language: language.to_string(),
            explanation: verdict.explanation.clone(),
        }
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
