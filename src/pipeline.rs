//! End-to-end detection pipeline
//!
//! `bytes → Normalizer → FeatureExtractor → SignalScorer → Fusion → Verdict`
//!
//! Ingestion and extraction errors are returned to the caller. Scoring
//! failures are absorbed by fusion into the fallback verdict. A [`Detector`]
//! holds no per-request state and can be shared across threads.

use std::time::Instant;
use tracing::{debug, info};

use crate::analysis::{FeatureExtractor, FeatureVector};
use crate::config::DetectorConfig;
use crate::engine::{NormalizedSignal, Normalizer};
use crate::error::Result;
use crate::scoring::{ClassifierHandle, SignalScorer};
use crate::verdict::{Fusion, Verdict};

#[derive(Debug, Clone)]
pub struct Detector {
    config: DetectorConfig,
    normalizer: Normalizer,
    extractor: FeatureExtractor,
    scorer: SignalScorer,
    fusion: Fusion,
}

impl Default for Detector {
    /// Default constants, no classifier artifact
    fn default() -> Self {
        Self::assemble(DetectorConfig::default(), ClassifierHandle::absent())
    }
}

impl Detector {
    /// Build a detector, loading the classifier lazily from `scoring.classifier_path`
    ///
    /// # Errors
    /// Returns `Config` if any constant is out of range.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        let classifier = ClassifierHandle::from_path(config.scoring.classifier_path.clone());
        Ok(Self::assemble(config, classifier))
    }

    /// Build a detector around an explicit classifier handle
    pub fn with_classifier(config: DetectorConfig, classifier: ClassifierHandle) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, classifier))
    }

    fn assemble(config: DetectorConfig, classifier: ClassifierHandle) -> Self {
        Self {
            normalizer: Normalizer::new(config.normalizer.clone()),
            extractor: FeatureExtractor::new(config.features.clone()),
            scorer: SignalScorer::with_classifier(config.scoring.clone(), classifier),
            fusion: Fusion::new(config.fusion.clone()),
            config,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn scorer(&self) -> &SignalScorer {
        &self.scorer
    }

    /// Classify one recording
    ///
    /// # Arguments
    /// * `bytes` - Encoded audio
    /// * `format_hint` - Optional container hint such as `"mp3"`
    ///
    /// # Errors
    /// * `Ingestion` - The bytes are oversized, undecodable or too short
    /// * `Extraction` - Feature computation failed on accepted audio
    pub fn analyze(&self, bytes: &[u8], format_hint: Option<&str>) -> Result<Verdict> {
        let start = Instant::now();
        let signal = self.normalizer.normalize(bytes, format_hint)?;
        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Normalization complete"
        );

        let verdict = self.analyze_signal(&signal)?;

        info!(
            classification = %verdict.classification,
            confidence = verdict.confidence,
            risk_level = %verdict.risk_level,
            duration_secs = signal.duration_secs(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Analysis complete"
        );
        Ok(verdict)
    }

    /// Normalize and extract without scoring
    pub fn extract_features(
        &self,
        bytes: &[u8],
        format_hint: Option<&str>,
    ) -> Result<FeatureVector> {
        let signal = self.normalizer.normalize(bytes, format_hint)?;
        Ok(self.extractor.extract(&signal)?)
    }

    /// Score an already normalized signal
    pub fn analyze_signal(&self, signal: &NormalizedSignal) -> Result<Verdict> {
        let start = Instant::now();
        let features = self.extractor.extract(signal)?;
        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Feature extraction complete"
        );

        Ok(self.fusion.fuse_outcome(self.scorer.score(&features)))
    }
}

/// Classify one recording with default constants and no classifier artifact
pub fn analyze(bytes: &[u8], format_hint: Option<&str>) -> Result<Verdict> {
    Detector::default().analyze(bytes, format_hint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FusionConfig;
    use crate::verdict::Classification;

    #[test]
    fn test_new_validates() {
        let config = DetectorConfig {
            fusion: FusionConfig {
                ai_threshold: 0.2,
                medium_threshold: 0.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(Detector::new(config).is_err());
    }

    #[test]
    fn test_analyze_signal_tone() {
        let signal = NormalizedSignal::sine_wave(220.0, 2.0, 16_000);
        let verdict = Detector::default().analyze_signal(&signal).unwrap();
        assert_eq!(verdict.classification, Classification::Ai);
    }

    #[test]
    fn test_detector_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Detector>();
    }
}
