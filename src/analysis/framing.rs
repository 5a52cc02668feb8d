//! Frame slicing and windowing

use std::f64::consts::PI;

/// Splits a signal into fixed-length, evenly hopped frames
///
/// With `center` set the signal is padded with `frame_length / 2` zeros on
/// each side, so frame `i` is centered on sample `i * hop_length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Framer {
    pub frame_length: usize,
    pub hop_length: usize,
    pub center: bool,
}

impl Framer {
    pub fn new(frame_length: usize, hop_length: usize, center: bool) -> Self {
        Self {
            frame_length,
            hop_length: hop_length.max(1),
            center,
        }
    }

    /// Apply centering padding if configured
    pub fn pad(&self, samples: &[f32]) -> Vec<f32> {
        if !self.center {
            return samples.to_vec();
        }
        let half = self.frame_length / 2;
        let mut padded = Vec::with_capacity(samples.len() + 2 * half);
        padded.resize(half, 0.0);
        padded.extend_from_slice(samples);
        padded.resize(samples.len() + 2 * half, 0.0);
        padded
    }

    /// Number of frames for an input of `num_samples` samples
    pub fn num_frames(&self, num_samples: usize) -> usize {
        if num_samples == 0 {
            return 0;
        }
        let padded_len = if self.center {
            num_samples + 2 * (self.frame_length / 2)
        } else {
            num_samples
        };
        if padded_len < self.frame_length {
            0
        } else {
            1 + (padded_len - self.frame_length) / self.hop_length
        }
    }

    /// Iterate over frames of an already padded buffer
    pub fn frames<'a>(&self, padded: &'a [f32]) -> impl Iterator<Item = &'a [f32]> + 'a {
        let frame_length = self.frame_length;
        let hop_length = self.hop_length;
        let count = if padded.len() < frame_length {
            0
        } else {
            1 + (padded.len() - frame_length) / hop_length
        };
        (0..count).map(move |i| &padded[i * hop_length..i * hop_length + frame_length])
    }

    /// Apply `f` to every frame of `samples`, padding first if configured
    pub fn map_frames<T>(&self, samples: &[f32], f: impl FnMut(&[f32]) -> T) -> Vec<T> {
        let padded = self.pad(samples);
        self.frames(&padded).map(f).collect()
    }
}

/// Periodic Hann window, as used for spectral analysis
pub fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| (0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos()) as f32)
        .collect()
}

/// Mean and population standard deviation
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_frame_count() {
        let framer = Framer::new(2048, 512, true);
        // 1 + len / hop when centered
        assert_eq!(framer.num_frames(16_000), 1 + 16_000 / 512);
        let samples = vec![0.1f32; 16_000];
        let frames = framer.map_frames(&samples, |f| f.len());
        assert_eq!(frames.len(), framer.num_frames(16_000));
        assert!(frames.iter().all(|&len| len == 2048));
    }

    #[test]
    fn test_uncentered_frame_count() {
        let framer = Framer::new(2048, 512, false);
        assert_eq!(framer.num_frames(1000), 0);
        assert_eq!(framer.num_frames(2048), 1);
        assert_eq!(framer.num_frames(2048 + 1023), 2);
    }

    #[test]
    fn test_centered_padding_is_zero() {
        let framer = Framer::new(8, 4, true);
        let padded = framer.pad(&[1.0, 1.0]);
        assert_eq!(padded, vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_hann_window_shape() {
        let w = hann_window(16);
        assert_eq!(w.len(), 16);
        assert!(w[0].abs() < 1e-6);
        assert!((w[8] - 1.0).abs() < 1e-6);
        // Periodic window: w[i] == w[n - i]
        for i in 1..8 {
            assert!((w[i] - w[16 - i]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_mean_std() {
        let (mean, std) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((mean - 5.0).abs() < 1e-12);
        assert!((std - 2.0).abs() < 1e-12);
        assert_eq!(mean_std(&[]), (0.0, 0.0));
    }
}
