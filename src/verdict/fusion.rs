//! Weighted fusion of anomaly signals into a verdict
//!
//! Fusion never fails. A [`ScoringFailure`] from the scorer, or one raised
//! while fusing, is logged and replaced by [`Verdict::fallback`].

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::config::FusionConfig;
use crate::error::ScoringFailure;
use crate::scoring::SignalScores;
use crate::verdict::explain::{explain, FALLBACK_PHRASE};

// ============================================================================
// Verdict types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "AI-generated")]
    Ai,
    #[serde(rename = "Human-generated")]
    Human,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Ai => "AI-generated",
            Classification::Human => "Human-generated",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        };
        f.write_str(s)
    }
}

/// Fused score and the signals it came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerdictDebug {
    pub score: f64,
    pub signals: SignalScores,
}

/// Final decision for one recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub classification: Classification,
    /// Certainty in `classification`, in [0, 1]
    pub confidence: f64,
    pub risk_level: RiskLevel,
    pub explanation: String,
    /// Absent on the fallback verdict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<VerdictDebug>,
}

impl Verdict {
    /// Safe baseline returned when scoring fails
    pub fn fallback() -> Self {
        Self {
            classification: Classification::Human,
            confidence: 0.5,
            risk_level: RiskLevel::Low,
            explanation: FALLBACK_PHRASE.to_string(),
            debug: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.debug.is_none() && self.explanation == FALLBACK_PHRASE
    }

    pub fn is_synthetic(&self) -> bool {
        self.classification == Classification::Ai
    }
}

// ============================================================================
// Fusion
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Fusion {
    config: FusionConfig,
}

impl Fusion {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Fuse three signals into a verdict
    pub fn fuse(&self, scores: SignalScores) -> Verdict {
        self.fuse_outcome(Ok(scores))
    }

    /// Fuse the scorer's outcome, absorbing any failure into the fallback
    pub fn fuse_outcome(&self, outcome: Result<SignalScores, ScoringFailure>) -> Verdict {
        match outcome.and_then(|scores| self.try_fuse(scores)) {
            Ok(verdict) => verdict,
            Err(failure) => {
                warn!(error = %failure, "Scoring failed; returning fallback verdict");
                Verdict::fallback()
            }
        }
    }

    /// Weighted sum of the signals, clamped to [0, 1]
    pub fn fused_score(&self, scores: &SignalScores) -> Result<f64, ScoringFailure> {
        let config = &self.config;
        let total_weight =
            config.acoustic_weight + config.temporal_weight + config.imperfection_weight;
        if !(total_weight.is_finite() && total_weight > 0.0) {
            return Err(ScoringFailure::DegenerateWeights);
        }
        let score = config.acoustic_weight * scores.acoustic
            + config.temporal_weight * scores.temporal
            + config.imperfection_weight * scores.imperfection;
        if !score.is_finite() {
            return Err(ScoringFailure::NonFinite { signal: "fused" });
        }
        Ok(score.clamp(0.0, 1.0))
    }

    pub fn classify(&self, score: f64) -> Classification {
        if score >= self.config.ai_threshold {
            Classification::Ai
        } else {
            Classification::Human
        }
    }

    pub fn risk_level(&self, score: f64) -> RiskLevel {
        if score < self.config.medium_threshold {
            RiskLevel::Low
        } else if score < self.config.ai_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    fn try_fuse(&self, scores: SignalScores) -> Result<Verdict, ScoringFailure> {
        if let Some(signal) = scores.first_non_finite() {
            return Err(ScoringFailure::NonFinite { signal });
        }

        let score = self.fused_score(&scores)?;
        let classification = self.classify(score);
        let confidence = match classification {
            Classification::Ai => score,
            Classification::Human => 1.0 - score,
        };
        let risk_level = self.risk_level(score);

        debug!(score, %classification, %risk_level, "Fused signals");

        Ok(Verdict {
            classification,
            confidence,
            risk_level,
            explanation: explain(classification, &scores, &self.config),
            debug: Some(VerdictDebug {
                score,
                signals: scores,
            }),
        })
    }
}
