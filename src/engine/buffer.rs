//! Canonical signal type and level measurements
//!
//! Every stage after the normalizer works on a [`NormalizedSignal`]:
//! mono 32-bit float samples at the configured target rate.

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert linear amplitude to decibels
///
/// Returns `f32::NEG_INFINITY` for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Calculate RMS (Root Mean Square) of samples in linear scale
pub fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}

/// Calculate peak (maximum absolute value) of samples
pub fn calculate_peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
}

// ============================================================================
// Normalized Signal
// ============================================================================

/// Mono audio at a fixed sample rate, ready for feature extraction
///
/// Produced by [`crate::engine::Normalizer`], which guarantees the sample
/// rate equals the configured target and the duration lies between the
/// configured floor and ceiling.
///
/// # Example
/// ```
/// use voiceguard::engine::NormalizedSignal;
///
/// let signal = NormalizedSignal::sine_wave(220.0, 1.0, 16_000);
/// assert_eq!(signal.len(), 16_000);
/// assert!((signal.duration_secs() - 1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSignal {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl NormalizedSignal {
    /// Wrap mono samples at the given rate
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Generate a sine wave at amplitude 0.8
    pub fn sine_wave(frequency: f32, duration_secs: f32, sample_rate: u32) -> Self {
        let num_samples = (duration_secs * sample_rate as f32) as usize;
        let angular_freq = 2.0 * std::f64::consts::PI * frequency as f64 / sample_rate as f64;
        let samples = (0..num_samples)
            .map(|i| (0.8 * (angular_freq * i as f64).sin()) as f32)
            .collect();
        Self::new(samples, sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds derived from length and rate
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// RMS level in linear scale
    pub fn rms(&self) -> f32 {
        calculate_rms(&self.samples)
    }

    /// Peak level in linear scale
    pub fn peak(&self) -> f32 {
        calculate_peak(&self.samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_db_conversion() {
        assert_relative_eq!(linear_to_db(1.0), 0.0, epsilon = 1e-4);
        assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.1);
        assert_eq!(linear_to_db(0.0), f32::NEG_INFINITY);
    }

    #[test]
    fn test_rms_sine_wave() {
        // 0.8 amplitude sine: RMS = 0.8 / sqrt(2)
        let signal = NormalizedSignal::sine_wave(440.0, 1.0, 16_000);
        assert!((signal.rms() - 0.5657).abs() < 0.01);
        assert!((signal.peak() - 0.8).abs() < 0.01);
    }

    #[test]
    fn test_empty_signal() {
        let signal = NormalizedSignal::new(Vec::new(), 16_000);
        assert!(signal.is_empty());
        assert_eq!(signal.rms(), 0.0);
        assert_eq!(signal.peak(), 0.0);
        assert_eq!(signal.duration_secs(), 0.0);
    }
}
