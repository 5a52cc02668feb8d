//! Raw bytes to canonical signal
//!
//! The normalizer is the only stage that sees encoded audio. It bounds
//! memory and CPU before any expensive work: the byte ceiling is checked
//! before decoding and the duration ceiling is applied while decoding.

use tracing::debug;

use crate::analysis::framing::Framer;
use crate::config::NormalizerConfig;
use crate::engine::buffer::{linear_to_db, NormalizedSignal};
use crate::engine::io::{decode_audio, resample, AudioFormat};
use crate::error::IngestionError;

/// Frame geometry used to locate leading and trailing silence
const TRIM_FRAME_LENGTH: usize = 2048;
const TRIM_HOP_LENGTH: usize = 512;

/// Power floor for the dB conversion used while trimming
const TRIM_AMIN: f64 = 1e-10;

/// Converts raw audio bytes into a [`NormalizedSignal`]
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Decode, down-mix, resample, cap and trim
    ///
    /// # Arguments
    /// * `bytes` - Encoded audio
    /// * `format_hint` - Optional container hint such as `"mp3"` or `"wav"`
    ///
    /// # Errors
    /// * `TooLarge` - More than `max_input_bytes`; nothing is decoded
    /// * `Decode` / `UnsupportedFormat` - The bytes cannot be decoded or resampled
    /// * `Empty` - Decoding produced no samples
    /// * `InvalidSamples` - Decoded samples contain NaN or infinity
    /// * `TooShort` - Less than `min_duration_secs` remains after trimming
    pub fn normalize(
        &self,
        bytes: &[u8],
        format_hint: Option<&str>,
    ) -> Result<NormalizedSignal, IngestionError> {
        let config = &self.config;

        if bytes.len() > config.max_input_bytes {
            return Err(IngestionError::TooLarge {
                size: bytes.len(),
                limit: config.max_input_bytes,
            });
        }
        if bytes.is_empty() {
            return Err(IngestionError::Empty);
        }

        let format = format_hint.map(AudioFormat::from_hint);
        let decoded = decode_audio(bytes, format.as_ref(), config.max_duration_secs)?;

        if decoded.samples.is_empty() {
            return Err(IngestionError::Empty);
        }
        if decoded.samples.iter().any(|s| !s.is_finite()) {
            return Err(IngestionError::InvalidSamples);
        }

        let mut samples = resample(
            &decoded.samples,
            decoded.sample_rate,
            config.target_sample_rate,
        )?;
        let cap = (config.max_duration_secs * config.target_sample_rate as f64).ceil() as usize;
        samples.truncate(cap);

        let decoded_len = samples.len();
        let (start, end) = trim_bounds(&samples, config.trim_top_db);
        samples.truncate(end);
        samples.drain(..start);

        let signal = NormalizedSignal::new(samples, config.target_sample_rate);

        debug!(
            source_rate = decoded.sample_rate,
            source_channels = decoded.channels,
            truncated = decoded.truncated,
            decoded_samples = decoded_len,
            trimmed_samples = signal.len(),
            duration_secs = signal.duration_secs(),
            rms_dbfs = linear_to_db(signal.rms()),
            peak_dbfs = linear_to_db(signal.peak()),
            "Normalized audio"
        );

        if signal.duration_secs() < config.min_duration_secs {
            return Err(IngestionError::TooShort {
                duration_secs: signal.duration_secs(),
                min_secs: config.min_duration_secs,
            });
        }

        Ok(signal)
    }
}

/// Sample range left after removing leading/trailing low-energy frames
///
/// A frame is kept when its RMS power is within `top_db` of the loudest
/// frame. An all-zero signal has no reference level and is kept whole.
pub(crate) fn trim_bounds(samples: &[f32], top_db: f32) -> (usize, usize) {
    let framer = Framer::new(TRIM_FRAME_LENGTH, TRIM_HOP_LENGTH, true);
    let powers: Vec<f64> = framer.map_frames(samples, |frame| {
        frame.iter().map(|&s| (s as f64) * (s as f64)).sum::<f64>() / frame.len() as f64
    });

    let reference = powers.iter().copied().fold(0.0_f64, f64::max);
    let ref_db = 10.0 * reference.max(TRIM_AMIN).log10();
    let loud = |p: &f64| 10.0 * p.max(TRIM_AMIN).log10() - ref_db > -(top_db as f64);

    let first = powers.iter().position(loud);
    let last = powers.iter().rposition(loud);

    match (first, last) {
        (Some(first), Some(last)) => {
            let start = (first * TRIM_HOP_LENGTH).min(samples.len());
            let end = ((last + 1) * TRIM_HOP_LENGTH).min(samples.len());
            (start, end.max(start))
        }
        _ => (0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use std::io::Cursor;

    fn wav_bytes(samples: &[f32], sample_rate: u32) -> Vec<u8> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample((s * 32767.0) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn tone(frequency: f32, seconds: f32, sample_rate: u32) -> Vec<f32> {
        NormalizedSignal::sine_wave(frequency, seconds, sample_rate).into_samples()
    }

    #[test]
    fn test_rejects_oversized_before_decoding() {
        let normalizer = Normalizer::new(NormalizerConfig {
            max_input_bytes: 16,
            ..Default::default()
        });
        // Not valid audio: a decode attempt would yield a Decode error instead
        let result = normalizer.normalize(&[0u8; 17], Some("wav"));
        assert!(matches!(
            result,
            Err(IngestionError::TooLarge { size: 17, limit: 16 })
        ));
    }

    #[test]
    fn test_resamples_to_target_rate() {
        let bytes = wav_bytes(&tone(220.0, 1.0, 44_100), 44_100);
        let signal = Normalizer::default().normalize(&bytes, Some("wav")).unwrap();
        assert_eq!(signal.sample_rate(), 16_000);
        assert!((signal.duration_secs() - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_duration_is_capped() {
        let normalizer = Normalizer::new(NormalizerConfig {
            max_duration_secs: 2.0,
            ..Default::default()
        });
        let bytes = wav_bytes(&tone(220.0, 3.0, 16_000), 16_000);
        let signal = normalizer.normalize(&bytes, None).unwrap();
        assert!(signal.duration_secs() <= 2.0 + 1e-9);
    }

    #[test]
    fn test_trims_leading_and_trailing_silence() {
        let mut samples = vec![0.0f32; 16_000];
        samples.extend(tone(220.0, 1.0, 16_000));
        samples.extend(vec![0.0f32; 16_000]);
        let bytes = wav_bytes(&samples, 16_000);

        let signal = Normalizer::default().normalize(&bytes, Some("wav")).unwrap();
        // Trimming works at hop resolution around the one second of tone
        assert!(signal.duration_secs() > 0.9, "got {}", signal.duration_secs());
        assert!(signal.duration_secs() < 1.2, "got {}", signal.duration_secs());
    }

    #[test]
    fn test_too_short_after_trim() {
        let mut samples = vec![0.0f32; 16_000];
        samples.extend(tone(220.0, 0.2, 16_000));
        samples.extend(vec![0.0f32; 16_000]);
        let bytes = wav_bytes(&samples, 16_000);

        let result = Normalizer::default().normalize(&bytes, Some("wav"));
        assert!(matches!(result, Err(IngestionError::TooShort { .. })));
    }

    #[test]
    fn test_empty_wav() {
        let bytes = wav_bytes(&[], 16_000);
        let result = Normalizer::default().normalize(&bytes, Some("wav"));
        assert!(matches!(result, Err(IngestionError::Empty)));
    }

    #[test]
    fn test_all_silence_is_kept_whole() {
        let bytes = wav_bytes(&vec![0.0f32; 16_000], 16_000);
        let signal = Normalizer::default().normalize(&bytes, Some("wav")).unwrap();
        assert_eq!(signal.len(), 16_000);
    }

    #[test]
    fn test_trim_bounds_quiet_tail() {
        let mut samples = tone(220.0, 1.0, 16_000);
        // 40 dB down: below the 20 dB trim threshold
        samples.extend(tone(220.0, 1.0, 16_000).iter().map(|s| s * 0.01));
        let (start, end) = trim_bounds(&samples, 20.0);
        assert_eq!(start, 0);
        assert!(end < 16_000 + 2048, "end {}", end);
        assert!(end >= 16_000 - 512, "end {}", end);
    }
}
