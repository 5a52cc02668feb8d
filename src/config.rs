//! Detector configuration
//!
//! Every hand-tuned constant used by the pipeline lives here so it can be
//! recalibrated without touching the algorithms. All sections deserialize
//! with defaults, so a JSON file only needs the fields it overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VoiceGuardError};

/// Number of timbre coefficients per frame. Part of the feature schema.
pub const NUM_TIMBRE_COEFFS: usize = 13;

// ============================================================================
// Sections
// ============================================================================

/// Limits and targets for turning raw bytes into a canonical signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Output sample rate in Hz
    pub target_sample_rate: u32,
    /// Decoding stops after this many seconds of source audio
    pub max_duration_secs: f64,
    /// Minimum duration remaining after silence trimming
    pub min_duration_secs: f64,
    /// Inputs larger than this are rejected before decoding
    pub max_input_bytes: usize,
    /// Frames quieter than this many dB below the peak are trimmed
    pub trim_top_db: f32,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16_000,
            max_duration_secs: 30.0,
            min_duration_secs: 0.5,
            max_input_bytes: 10 * 1024 * 1024,
            trim_top_db: 20.0,
        }
    }
}

/// Framing and estimator parameters for feature extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Analysis frame length in samples (power of two)
    pub frame_length: usize,
    /// Hop between frames in samples
    pub hop_length: usize,
    /// Mel bands feeding the cepstral transform
    pub num_mel_bands: usize,
    /// Lowest pitch considered voiced (C2)
    pub pitch_fmin: f32,
    /// Highest pitch considered voiced (C5)
    pub pitch_fmax: f32,
    /// YIN aperiodicity threshold
    pub yin_threshold: f32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            frame_length: 2048,
            hop_length: 512,
            num_mel_bands: 128,
            pitch_fmin: 65.41,
            pitch_fmax: 523.25,
            yin_threshold: 0.1,
        }
    }
}

/// Thresholds for the three anomaly signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Pitch standard deviation (Hz) at or above which the temporal signal is 0
    pub pitch_std_threshold: f64,
    /// Zero-crossing rate at or above which the imperfection signal is 0
    pub zcr_threshold: f64,
    /// Slope of the flatness heuristic used without a classifier
    pub flatness_multiplier: f64,
    /// Optional pretrained classifier artifact
    pub classifier_path: Option<PathBuf>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            pitch_std_threshold: 30.0,
            zcr_threshold: 0.1,
            flatness_multiplier: 10.0,
            classifier_path: None,
        }
    }
}

/// Weights, cutoffs and explanation triggers for the final verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub acoustic_weight: f64,
    pub temporal_weight: f64,
    pub imperfection_weight: f64,
    /// Fused scores at or above this are classified AI-generated (High risk)
    pub ai_threshold: f64,
    /// Fused scores at or above this (and below `ai_threshold`) are Medium risk
    pub medium_threshold: f64,
    pub temporal_trigger: f64,
    pub imperfection_trigger: f64,
    pub acoustic_trigger: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            acoustic_weight: 0.5,
            temporal_weight: 0.3,
            imperfection_weight: 0.2,
            ai_threshold: 0.65,
            medium_threshold: 0.4,
            temporal_trigger: 0.6,
            imperfection_trigger: 0.6,
            acoustic_trigger: 0.7,
        }
    }
}

// ============================================================================
// Detector configuration
// ============================================================================

/// Complete configuration for a [`crate::Detector`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub normalizer: NormalizerConfig,
    pub features: FeatureConfig,
    pub scoring: ScoringConfig,
    pub fusion: FusionConfig,
}

impl DetectorConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: DetectorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Override the classifier artifact path
    pub fn with_classifier_path(mut self, path: Option<PathBuf>) -> Self {
        self.scoring.classifier_path = path;
        self
    }

    /// Check that every constant is inside the range the algorithms support
    pub fn validate(&self) -> Result<()> {
        let n = &self.normalizer;
        if n.target_sample_rate == 0 {
            return Err(VoiceGuardError::config("target_sample_rate must be positive"));
        }
        if !(n.min_duration_secs >= 0.0 && n.min_duration_secs < n.max_duration_secs) {
            return Err(VoiceGuardError::config(format!(
                "min_duration_secs ({}) must be in [0, max_duration_secs ({}))",
                n.min_duration_secs, n.max_duration_secs
            )));
        }
        if n.max_input_bytes == 0 {
            return Err(VoiceGuardError::config("max_input_bytes must be positive"));
        }
        if !(n.trim_top_db > 0.0) {
            return Err(VoiceGuardError::config("trim_top_db must be positive"));
        }

        let f = &self.features;
        if f.frame_length < 64 || !f.frame_length.is_power_of_two() {
            return Err(VoiceGuardError::config(format!(
                "frame_length ({}) must be a power of two >= 64",
                f.frame_length
            )));
        }
        if f.hop_length == 0 || f.hop_length > f.frame_length {
            return Err(VoiceGuardError::config(format!(
                "hop_length ({}) must be in [1, frame_length]",
                f.hop_length
            )));
        }
        if f.num_mel_bands < NUM_TIMBRE_COEFFS {
            return Err(VoiceGuardError::config(format!(
                "num_mel_bands ({}) must be at least {}",
                f.num_mel_bands, NUM_TIMBRE_COEFFS
            )));
        }
        let nyquist = n.target_sample_rate as f32 / 2.0;
        if !(f.pitch_fmin > 0.0 && f.pitch_fmin < f.pitch_fmax && f.pitch_fmax < nyquist) {
            return Err(VoiceGuardError::config(format!(
                "pitch band {}..{} Hz must be increasing and below {} Hz",
                f.pitch_fmin, f.pitch_fmax, nyquist
            )));
        }
        // The YIN window is half a frame and must hold at least one fmin period
        let max_lag = (n.target_sample_rate as f32 / f.pitch_fmin).ceil() as usize;
        if max_lag >= f.frame_length / 2 {
            return Err(VoiceGuardError::config(format!(
                "pitch_fmin {} Hz needs a frame_length above {}",
                f.pitch_fmin,
                2 * max_lag
            )));
        }
        if !(f.yin_threshold > 0.0 && f.yin_threshold < 1.0) {
            return Err(VoiceGuardError::config("yin_threshold must be in (0, 1)"));
        }

        let s = &self.scoring;
        if !(s.pitch_std_threshold > 0.0 && s.zcr_threshold > 0.0) {
            return Err(VoiceGuardError::config(
                "pitch_std_threshold and zcr_threshold must be positive",
            ));
        }
        if !(s.flatness_multiplier >= 0.0) {
            return Err(VoiceGuardError::config("flatness_multiplier must be non-negative"));
        }

        let w = &self.fusion;
        let weights = [w.acoustic_weight, w.temporal_weight, w.imperfection_weight];
        if weights.iter().any(|x| !(*x >= 0.0)) || weights.iter().sum::<f64>() <= 0.0 {
            return Err(VoiceGuardError::config(
                "fusion weights must be non-negative with a positive sum",
            ));
        }
        if !(0.0 <= w.medium_threshold
            && w.medium_threshold <= w.ai_threshold
            && w.ai_threshold <= 1.0)
        {
            return Err(VoiceGuardError::config(format!(
                "cutoffs must satisfy 0 <= medium ({}) <= ai ({}) <= 1",
                w.medium_threshold, w.ai_threshold
            )));
        }

        Ok(())
    }
}
