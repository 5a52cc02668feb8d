//! Fixed-schema acoustic feature vector

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::framing::{mean_std, Framer};
use crate::analysis::pitch::{PitchEstimator, PitchStats};
use crate::analysis::spectral::{spectral_flatness, SpectralAnalyzer};
use crate::config::{FeatureConfig, NUM_TIMBRE_COEFFS};
use crate::engine::buffer::{calculate_rms, NormalizedSignal};
use crate::error::ExtractionError;

/// Width of [`FeatureVector::classifier_input`]
pub const CLASSIFIER_INPUT_WIDTH: usize = 2 * NUM_TIMBRE_COEFFS + 1;

/// Acoustic descriptors of one recording
///
/// The shape never depends on the input. When no frame is voiced the pitch
/// fields are 0.0 and `voiced_frames` is 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub timbre_mean: [f64; NUM_TIMBRE_COEFFS],
    pub timbre_std: [f64; NUM_TIMBRE_COEFFS],
    pub spectral_flatness: f64,
    pub pitch_mean: f64,
    pub pitch_std: f64,
    pub pitch_range: f64,
    pub voiced_frames: usize,
    pub zcr_mean: f64,
    pub zcr_std: f64,
    pub energy_mean: f64,
}

impl FeatureVector {
    /// True when at least one frame carried a voiced pitch
    pub fn has_pitch(&self) -> bool {
        self.voiced_frames > 0
    }

    /// `[timbre means, timbre stds, flatness]` in that order
    pub fn classifier_input(&self) -> Vec<f64> {
        let mut input = Vec::with_capacity(CLASSIFIER_INPUT_WIDTH);
        input.extend_from_slice(&self.timbre_mean);
        input.extend_from_slice(&self.timbre_std);
        input.push(self.spectral_flatness);
        input
    }

    fn check_finite(&self) -> Result<(), ExtractionError> {
        let scalars = [
            ("spectral_flatness", self.spectral_flatness),
            ("pitch_mean", self.pitch_mean),
            ("pitch_std", self.pitch_std),
            ("pitch_range", self.pitch_range),
            ("zcr_mean", self.zcr_mean),
            ("zcr_std", self.zcr_std),
            ("energy_mean", self.energy_mean),
        ];
        if let Some(&(feature, _)) = scalars.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ExtractionError::NonFinite { feature });
        }
        if self.timbre_mean.iter().any(|v| !v.is_finite()) {
            return Err(ExtractionError::NonFinite {
                feature: "timbre_mean",
            });
        }
        if self.timbre_std.iter().any(|v| !v.is_finite()) {
            return Err(ExtractionError::NonFinite {
                feature: "timbre_std",
            });
        }
        Ok(())
    }
}

/// Fraction of adjacent sample pairs whose sign differs (zero counts as positive)
pub fn zero_crossing_rate(frame: &[f32]) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
        .count();
    crossings as f64 / frame.len() as f64
}

/// Computes a [`FeatureVector`] from a normalized signal
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Extract every descriptor from `signal`
    ///
    /// # Errors
    /// * `NoFrames` - The signal is empty
    /// * `NonFinite` - A descriptor came out NaN or infinite
    pub fn extract(&self, signal: &NormalizedSignal) -> Result<FeatureVector, ExtractionError> {
        let config = &self.config;
        let samples = signal.samples();
        let framer = Framer::new(config.frame_length, config.hop_length, true);

        if framer.num_frames(samples.len()) == 0 {
            return Err(ExtractionError::NoFrames {
                num_samples: samples.len(),
                frame_length: config.frame_length,
            });
        }

        // Timbre and flatness
        let spectral = SpectralAnalyzer::new(
            signal.sample_rate(),
            config.frame_length,
            config.hop_length,
            config.num_mel_bands,
        );
        let power = spectral.power_spectrogram(samples);
        let coeffs = spectral.timbre_coefficients(&power);

        let mut timbre_mean = [0.0; NUM_TIMBRE_COEFFS];
        let mut timbre_std = [0.0; NUM_TIMBRE_COEFFS];
        for k in 0..NUM_TIMBRE_COEFFS {
            let column: Vec<f64> = coeffs.iter().map(|frame| frame[k]).collect();
            let (mean, std) = mean_std(&column);
            timbre_mean[k] = mean;
            timbre_std[k] = std;
        }

        let flatness: Vec<f64> = power.iter().map(|s| spectral_flatness(s)).collect();
        let (spectral_flatness, _) = mean_std(&flatness);

        // Pitch
        let estimator = PitchEstimator::new(
            signal.sample_rate(),
            config.frame_length,
            config.hop_length,
            config.pitch_fmin,
            config.pitch_fmax,
            config.yin_threshold,
        );
        let pitch_track = estimator.track(samples);
        let pitch = PitchStats::from_track(&pitch_track);

        // Zero crossings and energy
        let zcr = framer.map_frames(samples, zero_crossing_rate);
        let (zcr_mean, zcr_std) = mean_std(&zcr);
        let rms: Vec<f64> = framer.map_frames(samples, |frame| calculate_rms(frame) as f64);
        let (energy_mean, _) = mean_std(&rms);

        let features = FeatureVector {
            timbre_mean,
            timbre_std,
            spectral_flatness,
            pitch_mean: pitch.mean,
            pitch_std: pitch.std,
            pitch_range: pitch.range,
            voiced_frames: pitch.voiced_frames,
            zcr_mean,
            zcr_std,
            energy_mean,
        };
        features.check_finite()?;

        debug!(
            frames = power.len(),
            pitch_frames = pitch_track.len(),
            voiced_frames = pitch.voiced_frames,
            flatness = features.spectral_flatness,
            pitch_std = features.pitch_std,
            zcr_mean = features.zcr_mean,
            "Extracted features"
        );

        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_crossing_rate() {
        assert_eq!(zero_crossing_rate(&[1.0, -1.0, 1.0, -1.0]), 0.75);
        assert_eq!(zero_crossing_rate(&[0.5, 0.2, 0.0, 0.1]), 0.0);
        assert_eq!(zero_crossing_rate(&[]), 0.0);
    }

    #[test]
    fn test_tone_features() {
        let signal = NormalizedSignal::sine_wave(220.0, 2.0, 16_000);
        let features = FeatureExtractor::default().extract(&signal).unwrap();

        assert!(features.has_pitch());
        assert!((features.pitch_mean - 220.0).abs() < 2.0);
        assert!(features.pitch_std < 1.0);
        assert!(features.spectral_flatness < 0.01);
        // 220 Hz crosses zero 440 times per second: 0.0275 at 16 kHz
        assert!(features.zcr_mean < 0.035, "zcr {}", features.zcr_mean);
        assert!(features.energy_mean > 0.3);
    }

    #[test]
    fn test_silence_has_no_pitch() {
        let signal = NormalizedSignal::new(vec![0.0; 16_000], 16_000);
        let features = FeatureExtractor::default().extract(&signal).unwrap();

        assert!(!features.has_pitch());
        assert_eq!(features.pitch_mean, 0.0);
        assert_eq!(features.pitch_std, 0.0);
        assert_eq!(features.pitch_range, 0.0);
        assert_eq!(features.zcr_mean, 0.0);
        assert_eq!(features.energy_mean, 0.0);
    }

    #[test]
    fn test_empty_signal_has_no_frames() {
        let signal = NormalizedSignal::new(Vec::new(), 16_000);
        let result = FeatureExtractor::default().extract(&signal);
        assert!(matches!(result, Err(ExtractionError::NoFrames { .. })));
    }

    #[test]
    fn test_schema_is_stable() {
        let short = NormalizedSignal::new(vec![0.0; 8_000], 16_000);
        let tone = NormalizedSignal::sine_wave(150.0, 3.0, 16_000);
        let extractor = FeatureExtractor::default();

        for signal in [short, tone] {
            let features = extractor.extract(&signal).unwrap();
            assert_eq!(features.classifier_input().len(), CLASSIFIER_INPUT_WIDTH);
            let json = serde_json::to_value(&features).unwrap();
            assert_eq!(json.as_object().unwrap().len(), 10);
        }
    }
}
