//! Three anomaly signals in [0, 1]
//!
//! Each signal depends on one property of the feature vector:
//! - acoustic: classifier probability, or inverse spectral flatness
//! - temporal: pitch stability
//! - imperfection: absence of zero crossings from background noise

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::FeatureVector;
use crate::config::ScoringConfig;
use crate::error::ScoringFailure;
use crate::scoring::classifier::ClassifierHandle;

/// Temporal signal when no frame carried a pitch
pub const AMBIGUOUS_TEMPORAL: f64 = 0.5;

/// Anomaly signals for one recording; higher means more synthetic-looking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalScores {
    pub acoustic: f64,
    pub temporal: f64,
    pub imperfection: f64,
}

impl SignalScores {
    pub fn new(acoustic: f64, temporal: f64, imperfection: f64) -> Self {
        Self {
            acoustic,
            temporal,
            imperfection,
        }
    }

    /// Name of the first signal that is NaN or infinite
    pub fn first_non_finite(&self) -> Option<&'static str> {
        [
            ("acoustic", self.acoustic),
            ("temporal", self.temporal),
            ("imperfection", self.imperfection),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(name, _)| name)
    }
}

/// 1.0 at `value == 0`, 0.0 at `value >= threshold`, linear in between
pub fn inverse_linear(value: f64, threshold: f64) -> f64 {
    if threshold <= 0.0 {
        return if value <= 0.0 { 1.0 } else { 0.0 };
    }
    (1.0 - value / threshold).clamp(0.0, 1.0)
}

/// Acoustic signal without a classifier: clean, tonal spectra score high
pub fn heuristic_acoustic(flatness: f64, multiplier: f64) -> f64 {
    (1.0 - multiplier * flatness).clamp(0.0, 1.0)
}

pub fn temporal_signal(features: &FeatureVector, pitch_std_threshold: f64) -> f64 {
    if !features.has_pitch() {
        return AMBIGUOUS_TEMPORAL;
    }
    inverse_linear(features.pitch_std, pitch_std_threshold)
}

pub fn imperfection_signal(features: &FeatureVector, zcr_threshold: f64) -> f64 {
    inverse_linear(features.zcr_mean, zcr_threshold)
}

/// Computes [`SignalScores`] from a feature vector
#[derive(Debug, Clone, Default)]
pub struct SignalScorer {
    config: ScoringConfig,
    classifier: ClassifierHandle,
}

impl SignalScorer {
    /// Scorer whose classifier is loaded lazily from `config.classifier_path`
    pub fn new(config: ScoringConfig) -> Self {
        let classifier = ClassifierHandle::from_path(config.classifier_path.clone());
        Self { config, classifier }
    }

    pub fn with_classifier(config: ScoringConfig, classifier: ClassifierHandle) -> Self {
        Self { config, classifier }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn classifier(&self) -> &ClassifierHandle {
        &self.classifier
    }

    /// # Errors
    /// Returns `ScoringFailure` when the classifier rejects its input or any
    /// signal comes out non-finite.
    pub fn score(&self, features: &FeatureVector) -> Result<SignalScores, ScoringFailure> {
        let config = &self.config;

        let (acoustic, source) = match self.classifier.get() {
            Some(model) => {
                let p = model.predict_synthetic(&features.classifier_input())?;
                (p.clamp(0.0, 1.0), model.name())
            }
            None => (
                heuristic_acoustic(features.spectral_flatness, config.flatness_multiplier),
                "heuristic",
            ),
        };

        let scores = SignalScores {
            acoustic,
            temporal: temporal_signal(features, config.pitch_std_threshold),
            imperfection: imperfection_signal(features, config.zcr_threshold),
        };

        if let Some(signal) = scores.first_non_finite() {
            return Err(ScoringFailure::NonFinite { signal });
        }

        debug!(
            acoustic = scores.acoustic,
            temporal = scores.temporal,
            imperfection = scores.imperfection,
            acoustic_source = source,
            "Scored signals"
        );

        Ok(scores)
    }
}
