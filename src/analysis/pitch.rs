//! Monophonic fundamental-frequency estimation (YIN)
//!
//! Frames are taken without padding. For each frame the cumulative mean
//! normalized difference function is searched inside the lag range that
//! corresponds to `[fmin, fmax]`; the first dip below the threshold is
//! refined to its local minimum and interpolated parabolically. Frames with
//! no dip, or with near-zero energy, are unvoiced.

use crate::analysis::framing::{mean_std, Framer};
use crate::engine::buffer::calculate_rms;

/// Frames quieter than this RMS (about -80 dBFS) are never voiced
const MIN_VOICED_RMS: f32 = 1e-4;

/// Summary of the voiced frames of a signal
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PitchStats {
    pub mean: f64,
    pub std: f64,
    pub range: f64,
    pub voiced_frames: usize,
}

impl PitchStats {
    /// Summarize per-frame estimates; all zeros when nothing is voiced
    pub fn from_track(track: &[Option<f32>]) -> Self {
        let voiced: Vec<f64> = track.iter().flatten().map(|&f| f as f64).collect();
        if voiced.is_empty() {
            return Self::default();
        }
        let (mean, std) = mean_std(&voiced);
        let max = voiced.iter().copied().fold(f64::MIN, f64::max);
        let min = voiced.iter().copied().fold(f64::MAX, f64::min);
        Self {
            mean,
            std,
            range: max - min,
            voiced_frames: voiced.len(),
        }
    }
}

/// YIN pitch tracker restricted to a frequency band
#[derive(Debug, Clone)]
pub struct PitchEstimator {
    sample_rate: u32,
    fmin: f32,
    fmax: f32,
    threshold: f32,
    framer: Framer,
}

impl PitchEstimator {
    pub fn new(
        sample_rate: u32,
        frame_length: usize,
        hop_length: usize,
        fmin: f32,
        fmax: f32,
        threshold: f32,
    ) -> Self {
        Self {
            sample_rate,
            fmin,
            fmax,
            threshold,
            framer: Framer::new(frame_length, hop_length, false),
        }
    }

    /// Per-frame F0 in Hz, `None` where the frame is unvoiced
    pub fn track(&self, samples: &[f32]) -> Vec<Option<f32>> {
        self.framer.map_frames(samples, |frame| self.frame_pitch(frame))
    }

    /// Estimate F0 for a single frame
    pub fn frame_pitch(&self, frame: &[f32]) -> Option<f32> {
        if calculate_rms(frame) < MIN_VOICED_RMS {
            return None;
        }

        let window = frame.len() / 2;
        let sr = self.sample_rate as f32;
        let tau_min = ((sr / self.fmax).floor() as usize).max(2);
        let tau_max = ((sr / self.fmin).ceil() as usize).min(window.saturating_sub(2));
        if tau_min >= tau_max {
            return None;
        }

        // Difference function up to tau_max + 1 for the interpolation neighbor
        let mut diff = vec![0.0f64; tau_max + 2];
        for (tau, d) in diff.iter_mut().enumerate().skip(1) {
            *d = (0..window)
                .map(|j| {
                    let delta = frame[j] as f64 - frame[j + tau] as f64;
                    delta * delta
                })
                .sum();
        }

        // Cumulative mean normalized difference
        let mut cmnd = vec![1.0f64; diff.len()];
        let mut running = 0.0;
        for tau in 1..diff.len() {
            running += diff[tau];
            cmnd[tau] = if running > 0.0 {
                diff[tau] * tau as f64 / running
            } else {
                1.0
            };
        }

        let threshold = self.threshold as f64;
        let mut tau = tau_min;
        let best = loop {
            if tau > tau_max {
                return None;
            }
            if cmnd[tau] < threshold {
                while tau < tau_max && cmnd[tau + 1] < cmnd[tau] {
                    tau += 1;
                }
                break tau;
            }
            tau += 1;
        };

        let refined = parabolic_offset(cmnd[best - 1], cmnd[best], cmnd[best + 1]) + best as f64;
        let f0 = (self.sample_rate as f64 / refined) as f32;

        if f0 >= self.fmin && f0 <= self.fmax {
            Some(f0)
        } else {
            None
        }
    }
}

/// Sub-sample offset of the extremum of a parabola through three points
fn parabolic_offset(left: f64, center: f64, right: f64) -> f64 {
    let denom = left - 2.0 * center + right;
    if denom.abs() < 1e-12 {
        return 0.0;
    }
    (0.5 * (left - right) / denom).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NormalizedSignal;

    fn estimator() -> PitchEstimator {
        PitchEstimator::new(16_000, 2048, 512, 65.41, 523.25, 0.1)
    }

    fn glide(start_hz: f64, end_hz: f64, seconds: f64, sample_rate: u32) -> Vec<f32> {
        let n = (seconds * sample_rate as f64) as usize;
        let mut phase = 0.0f64;
        (0..n)
            .map(|i| {
                let t = i as f64 / n as f64;
                let f = start_hz + (end_hz - start_hz) * t;
                phase += 2.0 * std::f64::consts::PI * f / sample_rate as f64;
                (0.7 * phase.sin()) as f32
            })
            .collect()
    }

    #[test]
    fn test_pure_tone_is_stable() {
        let signal = NormalizedSignal::sine_wave(220.0, 1.0, 16_000);
        let track = estimator().track(signal.samples());
        let stats = PitchStats::from_track(&track);

        assert_eq!(stats.voiced_frames, track.len());
        assert!((stats.mean - 220.0).abs() < 2.0, "mean {}", stats.mean);
        assert!(stats.std < 1.0, "std {}", stats.std);
    }

    #[test]
    fn test_glide_has_spread() {
        let samples = glide(120.0, 260.0, 2.0, 16_000);
        let stats = PitchStats::from_track(&estimator().track(&samples));

        assert!(stats.voiced_frames > 0);
        assert!(stats.std > 25.0, "std {}", stats.std);
        assert!(stats.range > 100.0, "range {}", stats.range);
    }

    #[test]
    fn test_silence_is_unvoiced() {
        let track = estimator().track(&vec![0.0f32; 16_000]);
        assert!(!track.is_empty());
        assert!(track.iter().all(|f| f.is_none()));
        assert_eq!(PitchStats::from_track(&track), PitchStats::default());
    }

    #[test]
    fn test_noise_is_mostly_unvoiced() {
        let mut seed: u64 = 12345;
        let noise: Vec<f32> = (0..16_000)
            .map(|_| {
                seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
                (((seed >> 16) & 0x7fff) as f32 / 16383.0 - 1.0) * 0.5
            })
            .collect();
        let track = estimator().track(&noise);
        let voiced = track.iter().flatten().count();
        assert!(voiced * 10 <= track.len(), "{} of {} frames voiced", voiced, track.len());
    }

    #[test]
    fn test_parabolic_offset() {
        assert_eq!(parabolic_offset(1.0, 0.0, 1.0), 0.0);
        assert!(parabolic_offset(0.5, 0.0, 1.0) < 0.0);
        assert!(parabolic_offset(1.0, 0.0, 0.5) > 0.0);
    }
}
