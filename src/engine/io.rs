//! Audio decoding for VoiceGuard
//!
//! Turns an in-memory byte buffer into mono 32-bit float samples at the
//! source sample rate. WAV is read with `hound`; every other container
//! goes through `symphonia`'s probe. Channels are averaged while decoding
//! and decoding stops once the duration ceiling is reached, so oversized
//! recordings never get fully materialized.
//!
//! Sample rate conversion uses `rubato`'s windowed-sinc resampler, which
//! low-passes below the target Nyquist frequency before decimating.

use std::io::Cursor;

use hound::{SampleFormat, WavReader};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::error::IngestionError;

type DecodeResult<T> = std::result::Result<T, IngestionError>;

// ============================================================================
// Format hint
// ============================================================================

/// Container/codec hint supplied alongside the raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Ogg,
    Flac,
    Aac,
    M4a,
    /// Anything else; passed to the prober as a file extension
    Other(String),
}

impl AudioFormat {
    /// Parse a loose hint such as `"mp3"`, `".WAV"` or `"audio/mpeg"`
    pub fn from_hint(hint: &str) -> Self {
        let normalized = hint.trim().trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "wav" | "wave" | "audio/wav" | "audio/x-wav" | "audio/wave" => AudioFormat::Wav,
            "mp3" | "mpeg" | "audio/mpeg" | "audio/mp3" => AudioFormat::Mp3,
            "ogg" | "oga" | "vorbis" | "audio/ogg" => AudioFormat::Ogg,
            "flac" | "audio/flac" | "audio/x-flac" => AudioFormat::Flac,
            "aac" | "audio/aac" => AudioFormat::Aac,
            "m4a" | "mp4" | "audio/mp4" | "audio/x-m4a" => AudioFormat::M4a,
            _ => AudioFormat::Other(normalized),
        }
    }

    /// File extension handed to the container prober
    pub fn extension(&self) -> Option<&str> {
        match self {
            AudioFormat::Wav => Some("wav"),
            AudioFormat::Mp3 => Some("mp3"),
            AudioFormat::Ogg => Some("ogg"),
            AudioFormat::Flac => Some("flac"),
            AudioFormat::Aac => Some("aac"),
            AudioFormat::M4a => Some("m4a"),
            AudioFormat::Other(ext) if !ext.is_empty() => Some(ext.as_str()),
            AudioFormat::Other(_) => None,
        }
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Mono samples at the source rate
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Source channel count before down-mixing
    pub channels: usize,
    /// True when decoding stopped at the duration ceiling
    pub truncated: bool,
}

/// Decode a byte buffer to mono samples, stopping after `max_duration_secs`
///
/// # Arguments
/// * `bytes` - Encoded audio
/// * `format` - Optional container hint
/// * `max_duration_secs` - Decoding stops once this much audio is collected
///
/// # Errors
/// * `Decode` - Corrupt data or a container/codec that cannot be read
/// * `UnsupportedFormat` - A WAV sample layout hound cannot represent
pub fn decode_audio(
    bytes: &[u8],
    format: Option<&AudioFormat>,
    max_duration_secs: f64,
) -> DecodeResult<DecodedAudio> {
    if is_riff_wave(bytes) || matches!(format, Some(AudioFormat::Wav)) {
        decode_wav(bytes, max_duration_secs)
    } else {
        decode_compressed(bytes, format, max_duration_secs)
    }
}

fn is_riff_wave(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

fn max_frames(max_duration_secs: f64, sample_rate: u32) -> usize {
    (max_duration_secs * sample_rate as f64).ceil() as usize
}

/// Decode a RIFF/WAVE buffer with hound
fn decode_wav(bytes: &[u8], max_duration_secs: f64) -> DecodeResult<DecodedAudio> {
    let reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| IngestionError::decode_with(format!("Failed to open WAV data: {}", e), e))?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 || spec.sample_rate == 0 {
        return Err(IngestionError::decode("WAV header declares no channels or no sample rate"));
    }

    let limit_frames = max_frames(max_duration_secs, spec.sample_rate);
    let total_frames = reader.duration() as usize;
    let limit = limit_frames.saturating_mul(channels);

    let interleaved =
        read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format, limit)?;

    debug!(
        sample_rate = spec.sample_rate,
        channels,
        bits = spec.bits_per_sample,
        frames = interleaved.len() / channels,
        "Decoded WAV"
    );

    Ok(DecodedAudio {
        samples: downmix(&interleaved, channels),
        sample_rate: spec.sample_rate,
        channels,
        truncated: total_frames > limit_frames,
    })
}

/// Read up to `limit` interleaved samples from a WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
    limit: usize,
) -> DecodeResult<Vec<f32>> {
    fn collect<T, I>(iter: I, scale: f32, bits: u16) -> DecodeResult<Vec<f32>>
    where
        I: Iterator<Item = hound::Result<T>>,
        T: Into<f64>,
    {
        iter.map(|s| s.map(|v| Into::<f64>::into(v) as f32 * scale))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| {
                let reason = format!("Failed to read {}-bit samples: {}", bits, e);
                IngestionError::decode_with(reason, e)
            })
    }

    match (sample_format, bits_per_sample) {
        (SampleFormat::Float, 32) => collect(reader.samples::<f32>().take(limit), 1.0, 32),
        (SampleFormat::Int, 8) => collect(reader.samples::<i8>().take(limit), 1.0 / 128.0, 8),
        (SampleFormat::Int, 16) => {
            collect(reader.samples::<i16>().take(limit), 1.0 / 32768.0, 16)
        }
        // 24-bit stored as i32 in hound
        (SampleFormat::Int, 24) => {
            collect(reader.samples::<i32>().take(limit), 1.0 / 8388608.0, 24)
        }
        (SampleFormat::Int, 32) => {
            collect(reader.samples::<i32>().take(limit), 1.0 / 2147483648.0, 32)
        }
        (format, bits) => Err(IngestionError::UnsupportedFormat {
            format: format!("{}-bit {:?} WAV", bits, format),
        }),
    }
}

/// Decode any container/codec symphonia can probe
fn decode_compressed(
    bytes: &[u8],
    format: Option<&AudioFormat>,
    max_duration_secs: f64,
) -> DecodeResult<DecodedAudio> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = format.and_then(|f| f.extension()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| IngestionError::decode_with("Failed to probe audio format", e))?;

    let mut container = probed.format;

    let track = container
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| IngestionError::decode("No audio tracks found"))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| IngestionError::decode_with("Failed to create decoder", e))?;

    let mut sample_rate = codec_params.sample_rate;
    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(0);
    let mut samples = Vec::new();
    let mut truncated = false;

    loop {
        let packet = match container.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(IngestionError::decode_with("Failed to read packet", e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                debug!(reason, "Skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(IngestionError::decode_with("Failed to decode packet", e)),
        };

        let spec = *decoded.spec();
        let rate = *sample_rate.get_or_insert(spec.rate);
        channels = spec.channels.count();
        if channels == 0 {
            continue;
        }

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend(downmix(buffer.samples(), channels));

        let limit = max_frames(max_duration_secs, rate);
        if samples.len() >= limit {
            truncated = samples.len() > limit;
            samples.truncate(limit);
            break;
        }
    }

    let sample_rate =
        sample_rate.ok_or_else(|| IngestionError::decode("Sample rate not specified by stream"))?;

    debug!(
        sample_rate,
        channels,
        frames = samples.len(),
        truncated,
        "Decoded compressed audio"
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
        truncated,
    })
}

// ============================================================================
// Internal helper functions
// ============================================================================

/// Average interleaved channels into a single channel
pub(crate) fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Sinc filter length in input samples
const SINC_LEN: usize = 256;

/// Band-limited resampling from `source_rate` to `target_rate`
///
/// The whole signal is processed as one chunk. Trailing zeros flush the
/// filter and the filter delay is dropped from the front, so the output has
/// `ceil(len * target_rate / source_rate)` samples aligned with the input.
///
/// # Errors
/// * `Decode` - The rate pair cannot be handled by the resampler
pub(crate) fn resample(
    samples: &[f32],
    source_rate: u32,
    target_rate: u32,
) -> DecodeResult<Vec<f32>> {
    if samples.is_empty() || source_rate == target_rate {
        return Ok(samples.to_vec());
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let target_len = (samples.len() as f64 * ratio).ceil() as usize;

    let params = SincInterpolationParameters {
        sinc_len: SINC_LEN,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut padded = Vec::with_capacity(samples.len() + SINC_LEN);
    padded.extend_from_slice(samples);
    padded.resize(samples.len() + SINC_LEN, 0.0);

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, padded.len(), 1)
        .map_err(|e| {
            let reason = format!("Cannot resample {} Hz to {} Hz", source_rate, target_rate);
            IngestionError::decode_with(reason, e)
        })?;
    let delay = resampler.output_delay();

    let input_channels = vec![padded];
    let output = resampler
        .process(&input_channels, None)
        .map_err(|e| IngestionError::decode_with("Failed to resample audio", e))?;

    let mut resampled: Vec<f32> = output
        .into_iter()
        .next()
        .unwrap_or_default()
        .into_iter()
        .skip(delay)
        .take(target_len)
        .collect();
    resampled.resize(target_len, 0.0);

    debug!(
        source_rate,
        target_rate,
        input = samples.len(),
        output = resampled.len(),
        delay,
        "Resampled"
    );

    Ok(resampled)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn wav_bytes(samples: &[i16], channels: u16, sample_rate: u32) -> Vec<u8> {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_format_hint_parsing() {
        assert_eq!(AudioFormat::from_hint("WAV"), AudioFormat::Wav);
        assert_eq!(AudioFormat::from_hint(".mp3"), AudioFormat::Mp3);
        assert_eq!(AudioFormat::from_hint("audio/mpeg"), AudioFormat::Mp3);
        assert_eq!(AudioFormat::from_hint(" flac "), AudioFormat::Flac);
        assert_eq!(
            AudioFormat::from_hint("webm"),
            AudioFormat::Other("webm".to_string())
        );
        assert_eq!(AudioFormat::from_hint("").extension(), None);
    }

    #[test]
    fn test_decode_stereo_wav_downmixes() {
        // L = 0.5, R = -0.5 on every frame averages to silence
        let frames: Vec<i16> = (0..1000).flat_map(|_| [16384i16, -16384]).collect();
        let bytes = wav_bytes(&frames, 2, 8000);

        let decoded = decode_audio(&bytes, None, 30.0).unwrap();
        assert_eq!(decoded.sample_rate, 8000);
        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.samples.len(), 1000);
        assert!(decoded.samples.iter().all(|s| s.abs() < 1e-6));
        assert!(!decoded.truncated);
    }

    #[test]
    fn test_decode_wav_stops_at_duration_cap() {
        let samples = vec![1000i16; 8000 * 3];
        let bytes = wav_bytes(&samples, 1, 8000);

        let decoded = decode_audio(&bytes, Some(&AudioFormat::Wav), 1.0).unwrap();
        assert_eq!(decoded.samples.len(), 8000);
        assert!(decoded.truncated);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let garbage = vec![0x42u8; 4096];
        let result = decode_audio(&garbage, Some(&AudioFormat::Mp3), 30.0);
        assert!(matches!(result, Err(IngestionError::Decode { .. })));
    }

    #[test]
    fn test_wav_hint_on_non_wav_fails() {
        let result = decode_audio(b"not a wav file at all", Some(&AudioFormat::Wav), 30.0);
        assert!(matches!(result, Err(IngestionError::Decode { .. })));
    }

    #[test]
    fn test_downmix() {
        let interleaved = vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix(&interleaved, 2), vec![0.5, 0.5, 0.0]);
        assert_eq!(downmix(&interleaved, 1), interleaved);
    }

    fn tone(frequency: f32, amplitude: f32, len: usize, sample_rate: u32) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
            })
            .collect()
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        let samples = vec![0.1, -0.2, 0.3];
        assert_eq!(resample(&samples, 16000, 16000).unwrap(), samples);
        assert!(resample(&[], 44100, 16000).unwrap().is_empty());
    }

    #[test]
    fn test_resample_output_length() {
        let samples = vec![0.0; 44100];
        assert_eq!(resample(&samples, 44100, 16000).unwrap().len(), 16000);
        let samples = vec![0.0; 8001];
        assert_eq!(resample(&samples, 8000, 16000).unwrap().len(), 16002);
    }

    #[test]
    fn test_resample_keeps_in_band_tone() {
        // 1 kHz at 0.8 has RMS 0.566 at any rate
        let source = tone(1000.0, 0.8, 44100, 44100);
        let resampled = resample(&source, 44100, 16000).unwrap();
        let body = &resampled[1000..15000];
        assert!((rms(body) - 0.566).abs() < 0.01, "rms {}", rms(body));
    }

    #[test]
    fn test_resample_removes_content_above_target_nyquist() {
        // 12 kHz folds to 4 kHz if decimated without a low-pass
        let source = tone(12000.0, 0.8, 44100, 44100);
        let resampled = resample(&source, 44100, 16000).unwrap();
        let body = &resampled[1000..15000];
        assert!(rms(body) < 0.01, "rms {}", rms(body));
    }

    #[test]
    fn test_resample_upsample_keeps_tone() {
        let source = tone(440.0, 0.5, 8000, 8000);
        let resampled = resample(&source, 8000, 16000).unwrap();
        assert_eq!(resampled.len(), 16000);
        let body = &resampled[1000..15000];
        assert!((rms(body) - 0.354).abs() < 0.01, "rms {}", rms(body));
    }
}
