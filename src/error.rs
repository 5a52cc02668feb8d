//! Error handling for VoiceGuard
//!
//! Each pipeline stage has its own error type. Ingestion and extraction
//! faults are surfaced to callers through [`VoiceGuardError`]; scoring
//! faults stay inside the crate and are absorbed by the fusion stage.

use thiserror::Error;

/// Result type alias for VoiceGuard operations
pub type Result<T> = std::result::Result<T, VoiceGuardError>;

// ============================================================================
// Stage errors
// ============================================================================

/// Bad, oversized, corrupt or too-short audio. A client-input fault.
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Input too large: {size} bytes (limit {limit} bytes)")]
    TooLarge { size: usize, limit: usize },

    #[error("Corrupted or unsupported audio: {reason}")]
    Decode {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Audio contains no samples")]
    Empty,

    #[error("Audio too short for analysis: {duration_secs:.3}s (minimum {min_secs:.2}s)")]
    TooShort { duration_secs: f64, min_secs: f64 },

    #[error("Audio contains invalid (NaN or infinite) samples")]
    InvalidSamples,
}

impl IngestionError {
    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        IngestionError::Decode {
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn decode_with<E>(reason: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        IngestionError::Decode {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            IngestionError::TooLarge { .. } => "INPUT_TOO_LARGE",
            IngestionError::Decode { .. } => "DECODE_FAILED",
            IngestionError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            IngestionError::Empty => "EMPTY_AUDIO",
            IngestionError::TooShort { .. } => "AUDIO_TOO_SHORT",
            IngestionError::InvalidSamples => "INVALID_SAMPLES",
        }
    }
}

/// Internal signal-processing failure on otherwise acceptable input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("No analysis frames: {num_samples} samples with frame length {frame_length}")]
    NoFrames {
        num_samples: usize,
        frame_length: usize,
    },

    #[error("Feature '{feature}' is not a finite number")]
    NonFinite { feature: &'static str },
}

impl ExtractionError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            ExtractionError::NoFrames { .. } => "NO_FRAMES",
            ExtractionError::NonFinite { .. } => "NON_FINITE_FEATURE",
        }
    }
}

/// Failure inside the decision layer. Never returned to callers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringFailure {
    #[error("Classifier input width mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Signal '{signal}' is not a finite number")]
    NonFinite { signal: &'static str },

    #[error("Fusion weights sum to zero")]
    DegenerateWeights,
}

// ============================================================================
// Crate error
// ============================================================================

/// Main error type for VoiceGuard operations
#[derive(Error, Debug)]
pub enum VoiceGuardError {
    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    #[error("Audio content analysis failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VoiceGuardError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        VoiceGuardError::Config {
            reason: reason.into(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            VoiceGuardError::Ingestion(e) => e.error_code(),
            VoiceGuardError::Extraction(e) => e.error_code(),
            VoiceGuardError::Config { .. } => "CONFIG_ERROR",
            VoiceGuardError::Io(_) => "IO_ERROR",
            VoiceGuardError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// True when the fault lies with the submitted audio rather than the analyzer
    pub fn is_client_fault(&self) -> bool {
        matches!(self, VoiceGuardError::Ingestion(_))
    }

    /// Suggested transport status for an outer serving layer
    pub fn status_code(&self) -> u16 {
        match self {
            VoiceGuardError::Ingestion(_) => 400,
            VoiceGuardError::Extraction(_) => 422,
            _ => 500,
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            VoiceGuardError::Ingestion(IngestionError::TooLarge { .. }) => vec![
                "Send a shorter clip (only the configured maximum duration is analyzed)",
                "Re-encode the recording with a compressed format such as MP3",
            ],
            VoiceGuardError::Ingestion(IngestionError::Decode { .. })
            | VoiceGuardError::Ingestion(IngestionError::UnsupportedFormat { .. }) => vec![
                "Check that the file plays in another application",
                "Supported formats: WAV, MP3, OGG, FLAC",
                "Make sure the format hint matches the actual encoding",
            ],
            VoiceGuardError::Ingestion(IngestionError::TooShort { .. })
            | VoiceGuardError::Ingestion(IngestionError::Empty) => vec![
                "Provide a longer clip of audible speech",
                "Leading and trailing silence is removed before analysis",
            ],
            VoiceGuardError::Config { .. } => vec![
                "Print the defaults with 'voiceguard-cli config' and compare",
            ],
            _ => vec![],
        }
    }

    /// Get a user-facing message without internal diagnostics
    pub fn friendly_message(&self) -> String {
        match self {
            VoiceGuardError::Ingestion(e) => e.to_string(),
            VoiceGuardError::Extraction(_) => "Audio content analysis failed.".to_string(),
            VoiceGuardError::Config { .. } => self.to_string(),
            _ => "Internal analysis failed.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err: VoiceGuardError = IngestionError::TooShort {
            duration_secs: 0.2,
            min_secs: 0.5,
        }
        .into();
        assert_eq!(err.error_code(), "AUDIO_TOO_SHORT");
        assert!(err.is_client_fault());
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_extraction_is_not_client_fault() {
        let err: VoiceGuardError = ExtractionError::NoFrames {
            num_samples: 10,
            frame_length: 2048,
        }
        .into();
        assert_eq!(err.error_code(), "NO_FRAMES");
        assert!(!err.is_client_fault());
        assert_eq!(err.status_code(), 422);
        // Internal detail must not leak into the user-facing message
        assert!(!err.friendly_message().contains("2048"));
    }

    #[test]
    fn test_recovery_suggestions() {
        let err: VoiceGuardError = IngestionError::TooLarge {
            size: 20,
            limit: 10,
        }
        .into();
        assert!(!err.recovery_suggestions().is_empty());
    }

    #[test]
    fn test_suggestions_do_not_quote_configurable_limits() {
        let errors: Vec<VoiceGuardError> = vec![
            IngestionError::TooLarge { size: 20, limit: 10 }.into(),
            IngestionError::TooShort {
                duration_secs: 0.1,
                min_secs: 0.5,
            }
            .into(),
            IngestionError::Empty.into(),
        ];
        for err in errors {
            for suggestion in err.recovery_suggestions() {
                assert!(
                    !suggestion.chars().any(|c| c.is_ascii_digit()),
                    "{}",
                    suggestion
                );
            }
        }
    }

    #[test]
    fn test_decode_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad header");
        let err = IngestionError::decode_with("Failed to read WAV header", io);
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.error_code(), "DECODE_FAILED");
    }
}
