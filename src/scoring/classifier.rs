//! Pretrained acoustic classifier
//!
//! The artifact is optional. [`ClassifierHandle`] loads it at most once, on
//! first use, and shares it read-only afterwards. When no artifact is
//! configured, or the configured one cannot be loaded, the handle resolves
//! to `None` and the scorer uses its flatness heuristic instead.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{Result, ScoringFailure, VoiceGuardError};

/// A model that maps a classifier input vector to P(synthetic)
pub trait AcousticModel: Send + Sync + fmt::Debug {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Number of inputs the model expects
    fn input_width(&self) -> usize;

    /// Probability in [0, 1] that the input comes from a synthetic voice
    ///
    /// # Errors
    /// * `DimensionMismatch` - `input.len() != input_width()`
    /// * `NonFinite` - The prediction is NaN or infinite
    fn predict_synthetic(&self, input: &[f64]) -> std::result::Result<f64, ScoringFailure>;
}

// ============================================================================
// Logistic model
// ============================================================================

fn default_version() -> u32 {
    1
}

/// Standardized logistic regression
///
/// `sigmoid(bias + Σ wᵢ·(xᵢ − meanᵢ)/scaleᵢ)`; `mean` and `scale` default to
/// 0 and 1 when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    #[serde(default = "default_version")]
    pub version: u32,
    pub weights: Vec<f64>,
    pub bias: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec<f64>>,
}

impl LogisticModel {
    pub fn new(weights: Vec<f64>, bias: f64) -> Self {
        Self {
            version: default_version(),
            weights,
            bias,
            mean: None,
            scale: None,
        }
    }

    pub fn with_standardization(mut self, mean: Vec<f64>, scale: Vec<f64>) -> Self {
        self.mean = Some(mean);
        self.scale = Some(scale);
        self
    }

    /// Check shapes and values
    pub fn validate(&self) -> Result<()> {
        let width = self.weights.len();
        if width == 0 {
            return Err(VoiceGuardError::config("classifier has no weights"));
        }
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(VoiceGuardError::config("classifier weights must be finite"));
        }
        if let Some(mean) = &self.mean {
            if mean.len() != width || mean.iter().any(|m| !m.is_finite()) {
                return Err(VoiceGuardError::config(format!(
                    "classifier mean must hold {} finite values",
                    width
                )));
            }
        }
        if let Some(scale) = &self.scale {
            if scale.len() != width || scale.iter().any(|s| !s.is_finite() || *s <= 0.0) {
                return Err(VoiceGuardError::config(format!(
                    "classifier scale must hold {} positive values",
                    width
                )));
            }
        }
        Ok(())
    }

    fn logit(&self, input: &[f64]) -> f64 {
        let mut z = self.bias;
        for (i, (&x, &w)) in input.iter().zip(&self.weights).enumerate() {
            let mean = self.mean.as_ref().map_or(0.0, |m| m[i]);
            let scale = self.scale.as_ref().map_or(1.0, |s| s[i]);
            z += w * (x - mean) / scale;
        }
        z
    }
}

impl AcousticModel for LogisticModel {
    fn name(&self) -> &str {
        "logistic"
    }

    fn input_width(&self) -> usize {
        self.weights.len()
    }

    fn predict_synthetic(&self, input: &[f64]) -> std::result::Result<f64, ScoringFailure> {
        if input.len() != self.input_width() {
            return Err(ScoringFailure::DimensionMismatch {
                expected: self.input_width(),
                actual: input.len(),
            });
        }
        let probability = 1.0 / (1.0 + (-self.logit(input)).exp());
        if !probability.is_finite() {
            return Err(ScoringFailure::NonFinite { signal: "acoustic" });
        }
        Ok(probability)
    }
}

// ============================================================================
// Artifact
// ============================================================================

/// On-disk classifier document, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ClassifierArtifact {
    Logistic(LogisticModel),
}

impl ClassifierArtifact {
    pub fn from_json(json: &str) -> Result<Self> {
        let artifact: Self = serde_json::from_str(json)?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            ClassifierArtifact::Logistic(model) => model.validate(),
        }
    }

    pub fn into_model(self) -> Arc<dyn AcousticModel> {
        match self {
            ClassifierArtifact::Logistic(model) => Arc::new(model),
        }
    }
}

// ============================================================================
// Handle
// ============================================================================

/// Lazily loaded, immutable classifier shared by every scoring call
///
/// Clones share one cell, so the artifact is read at most once no matter
/// which clone asks first.
#[derive(Clone)]
pub struct ClassifierHandle {
    path: Option<PathBuf>,
    cell: Arc<OnceCell<Option<Arc<dyn AcousticModel>>>>,
}

impl fmt::Debug for ClassifierHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.cell.get() {
            None => "pending",
            Some(None) => "absent",
            Some(Some(_)) => "loaded",
        };
        f.debug_struct("ClassifierHandle")
            .field("path", &self.path)
            .field("state", &state)
            .finish()
    }
}

impl Default for ClassifierHandle {
    fn default() -> Self {
        Self::absent()
    }
}

impl ClassifierHandle {
    /// A handle that never yields a model
    pub fn absent() -> Self {
        Self {
            path: None,
            cell: Arc::new(OnceCell::with_value(None)),
        }
    }

    /// A handle that loads `path` on first use; `None` behaves like [`absent`](Self::absent)
    pub fn from_path(path: Option<PathBuf>) -> Self {
        Self {
            path,
            cell: Arc::new(OnceCell::new()),
        }
    }

    /// A handle around an already constructed model
    pub fn from_model(model: Arc<dyn AcousticModel>) -> Self {
        Self {
            path: None,
            cell: Arc::new(OnceCell::with_value(Some(model))),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The model, loading it on the first call
    pub fn get(&self) -> Option<&Arc<dyn AcousticModel>> {
        self.cell.get_or_init(|| self.load()).as_ref()
    }

    /// True once a model has been resolved and is present
    pub fn is_loaded(&self) -> bool {
        matches!(self.cell.get(), Some(Some(_)))
    }

    fn load(&self) -> Option<Arc<dyn AcousticModel>> {
        let path = match &self.path {
            Some(path) => path,
            None => {
                info!("No classifier artifact configured; using flatness heuristic");
                return None;
            }
        };

        match ClassifierArtifact::from_file(path) {
            Ok(artifact) => {
                let model = artifact.into_model();
                info!(
                    path = %path.display(),
                    model = model.name(),
                    inputs = model.input_width(),
                    "Loaded classifier artifact"
                );
                Some(model)
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to load classifier artifact; using flatness heuristic"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_logistic_prediction() {
        let model = LogisticModel::new(vec![1.0, -1.0], 0.0);
        assert!((model.predict_synthetic(&[0.0, 0.0]).unwrap() - 0.5).abs() < 1e-12);
        assert!(model.predict_synthetic(&[5.0, 0.0]).unwrap() > 0.99);
        assert!(model.predict_synthetic(&[0.0, 5.0]).unwrap() < 0.01);
    }

    #[test]
    fn test_standardization() {
        let model =
            LogisticModel::new(vec![2.0], 0.0).with_standardization(vec![10.0], vec![4.0]);
        // (14 - 10) / 4 * 2 = 2
        let expected = 1.0 / (1.0 + (-2.0f64).exp());
        assert!((model.predict_synthetic(&[14.0]).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_width_mismatch() {
        let model = LogisticModel::new(vec![1.0; 3], 0.0);
        assert_eq!(
            model.predict_synthetic(&[1.0; 2]),
            Err(ScoringFailure::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_artifact_parsing() {
        let json = r#"{"kind": "logistic", "weights": [0.5, 0.5], "bias": -1.0}"#;
        let artifact = ClassifierArtifact::from_json(json).unwrap();
        let ClassifierArtifact::Logistic(model) = &artifact;
        assert_eq!(model.version, 1);
        assert_eq!(model.input_width(), 2);
    }

    #[test]
    fn test_artifact_rejects_bad_scale() {
        let json = r#"{"kind": "logistic", "weights": [1.0], "bias": 0.0, "scale": [0.0]}"#;
        assert!(ClassifierArtifact::from_json(json).is_err());
        let json = r#"{"kind": "forest", "trees": []}"#;
        assert!(ClassifierArtifact::from_json(json).is_err());
    }

    #[test]
    fn test_absent_handle() {
        let handle = ClassifierHandle::absent();
        assert!(handle.get().is_none());
        assert!(!handle.is_loaded());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let handle = ClassifierHandle::from_path(Some(PathBuf::from("/nonexistent/model.json")));
        assert!(handle.get().is_none());
    }

    #[test]
    fn test_loads_once_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"kind": "logistic", "weights": [1.0], "bias": 0.0}}"#).unwrap();

        let handle = ClassifierHandle::from_path(Some(file.path().to_path_buf()));
        assert!(!handle.is_loaded());
        let first = Arc::clone(handle.get().unwrap());
        assert!(handle.is_loaded());

        // Removing the file does not affect the cached model
        drop(file);
        let second = handle.get().unwrap();
        assert!(Arc::ptr_eq(&first, second));
    }

    #[test]
    fn test_clones_share_the_loaded_model() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"kind": "logistic", "weights": [1.0], "bias": 0.0}}"#).unwrap();

        let handle = ClassifierHandle::from_path(Some(file.path().to_path_buf()));
        let clone = handle.clone();
        assert!(!clone.is_loaded());

        let from_clone = Arc::clone(clone.get().unwrap());
        assert!(handle.is_loaded());

        drop(file);
        let from_original = handle.get().unwrap();
        assert!(Arc::ptr_eq(&from_clone, from_original));
    }
}
