//! Spectral descriptors: power spectrogram, cepstral timbre coefficients
//! and spectral flatness.
//!
//! Timbre coefficients are computed the conventional way: Hann-windowed
//! STFT power spectrum, Slaney-style mel filterbank with area-normalized
//! triangles, log compression with an 80 dB dynamic-range floor, then an
//! orthonormal DCT-II keeping the first [`NUM_TIMBRE_COEFFS`] coefficients.
//! These are the usual MFCC defaults of Python audio tooling.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::analysis::framing::{hann_window, Framer};
use crate::config::NUM_TIMBRE_COEFFS;

/// Power floor before taking logarithms
const AMIN: f64 = 1e-10;

/// Dynamic range kept in the log-mel spectrogram
const TOP_DB: f64 = 80.0;

/// Slaney mel scale: linear below 1 kHz, logarithmic above
const MEL_HZ_PER_UNIT: f64 = 200.0 / 3.0;
const MEL_BREAK_HZ: f64 = 1000.0;
const MEL_BREAK: f64 = MEL_BREAK_HZ / MEL_HZ_PER_UNIT;

/// ln(6.4) / 27: log step per mel above the break
fn mel_log_step() -> f64 {
    6.4f64.ln() / 27.0
}

/// Converts frequency in Hz to mel scale.
fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MEL_BREAK_HZ {
        MEL_BREAK + (hz / MEL_BREAK_HZ).ln() / mel_log_step()
    } else {
        hz / MEL_HZ_PER_UNIT
    }
}

/// Converts mel scale frequency back to Hz.
fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MEL_BREAK {
        MEL_BREAK_HZ * (mel_log_step() * (mel - MEL_BREAK)).exp()
    } else {
        mel * MEL_HZ_PER_UNIT
    }
}

/// Creates a triangular mel filterbank.
///
/// Returns `[num_mels][fft_size / 2 + 1]`. Weights are evaluated at each
/// bin's center frequency and each triangle is scaled by `2 / width_hz`, so
/// every filter has unit area regardless of its bandwidth.
pub fn mel_filter_bank(
    num_mels: usize,
    fft_size: usize,
    sample_rate: u32,
    low_freq: f64,
    high_freq: f64,
) -> Vec<Vec<f64>> {
    let half_fft = fft_size / 2 + 1;
    let low_mel = hz_to_mel(low_freq);
    let high_mel = hz_to_mel(high_freq);

    // num_mels + 2 equally spaced mel points
    let step = (high_mel - low_mel) / (num_mels + 1) as f64;
    let edges_hz: Vec<f64> = (0..num_mels + 2)
        .map(|i| mel_to_hz(low_mel + i as f64 * step))
        .collect();

    let bin_hz = sample_rate as f64 / fft_size as f64;

    (0..num_mels)
        .map(|m| {
            let (left, center, right) = (edges_hz[m], edges_hz[m + 1], edges_hz[m + 2]);
            let norm = 2.0 / (right - left);
            (0..half_fft)
                .map(|k| {
                    let f = k as f64 * bin_hz;
                    let rising = (f - left) / (center - left);
                    let falling = (right - f) / (right - center);
                    norm * rising.min(falling).max(0.0)
                })
                .collect()
        })
        .collect()
}

/// Orthonormal DCT-II basis, `[num_coeffs][n]`
fn dct_basis(num_coeffs: usize, n: usize) -> Vec<Vec<f64>> {
    let n_f = n as f64;
    (0..num_coeffs)
        .map(|k| {
            let scale = if k == 0 {
                (1.0 / n_f).sqrt()
            } else {
                (2.0 / n_f).sqrt()
            };
            (0..n)
                .map(|i| {
                    scale
                        * (std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n_f))
                            .cos()
                })
                .collect()
        })
        .collect()
}

/// Frame-level spectral analysis at a fixed sample rate
pub struct SpectralAnalyzer {
    framer: Framer,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    mel_bank: Vec<Vec<f64>>,
    dct: Vec<Vec<f64>>,
}

impl std::fmt::Debug for SpectralAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralAnalyzer")
            .field("framer", &self.framer)
            .field("num_mel_bands", &self.mel_bank.len())
            .finish()
    }
}

impl SpectralAnalyzer {
    /// # Arguments
    /// * `sample_rate` - Rate of the signals that will be analyzed
    /// * `frame_length` - FFT size (power of two)
    /// * `hop_length` - Hop between centered frames
    /// * `num_mel_bands` - Filters spanning 0 Hz to Nyquist
    pub fn new(
        sample_rate: u32,
        frame_length: usize,
        hop_length: usize,
        num_mel_bands: usize,
    ) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        Self {
            framer: Framer::new(frame_length, hop_length, true),
            window: hann_window(frame_length),
            fft: planner.plan_fft_forward(frame_length),
            mel_bank: mel_filter_bank(
                num_mel_bands,
                frame_length,
                sample_rate,
                0.0,
                sample_rate as f64 / 2.0,
            ),
            dct: dct_basis(NUM_TIMBRE_COEFFS, num_mel_bands),
        }
    }

    /// Power spectrum `|X|^2` of each centered frame, `[frames][frame_length / 2 + 1]`
    pub fn power_spectrogram(&self, samples: &[f32]) -> Vec<Vec<f64>> {
        let half = self.framer.frame_length / 2 + 1;
        self.framer.map_frames(samples, |frame| {
            let mut buffer: Vec<Complex<f32>> = frame
                .iter()
                .zip(self.window.iter())
                .map(|(&s, &w)| Complex::new(s * w, 0.0))
                .collect();
            self.fft.process(&mut buffer);
            buffer
                .iter()
                .take(half)
                .map(|c| c.norm_sqr() as f64)
                .collect()
        })
    }

    /// Cepstral timbre coefficients per frame
    pub fn timbre_coefficients(&self, power: &[Vec<f64>]) -> Vec<[f64; NUM_TIMBRE_COEFFS]> {
        let log_mel: Vec<Vec<f64>> = power
            .iter()
            .map(|spectrum| {
                self.mel_bank
                    .iter()
                    .map(|filter| {
                        let energy: f64 = filter.iter().zip(spectrum).map(|(w, p)| w * p).sum();
                        10.0 * energy.max(AMIN).log10()
                    })
                    .collect()
            })
            .collect();

        let peak_db = log_mel
            .iter()
            .flat_map(|frame| frame.iter().copied())
            .fold(f64::NEG_INFINITY, f64::max);
        let floor_db = peak_db - TOP_DB;

        log_mel
            .iter()
            .map(|frame| {
                let mut coeffs = [0.0; NUM_TIMBRE_COEFFS];
                for (c, basis) in coeffs.iter_mut().zip(&self.dct) {
                    *c = basis
                        .iter()
                        .zip(frame)
                        .map(|(b, &db)| b * db.max(floor_db))
                        .sum();
                }
                coeffs
            })
            .collect()
    }
}

/// Ratio of geometric to arithmetic mean of one power spectrum
///
/// 1.0 for a perfectly flat (white) spectrum, near 0 for a pure tone.
pub fn spectral_flatness(spectrum: &[f64]) -> f64 {
    if spectrum.is_empty() {
        return 0.0;
    }
    let n = spectrum.len() as f64;
    let log_mean = spectrum.iter().map(|p| p.max(AMIN).ln()).sum::<f64>() / n;
    let arith_mean = spectrum.iter().map(|p| p.max(AMIN)).sum::<f64>() / n;
    log_mean.exp() / arith_mean
}
