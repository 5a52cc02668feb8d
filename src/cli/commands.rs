//! CLI Command Implementations
//!
//! File reading lives here; the detector only ever sees bytes and a hint.

use anyhow::Context;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::OutputStyle;
use crate::config::DetectorConfig;
use crate::pipeline::Detector;
use crate::verdict::VoiceResponse;

/// Load the configuration file if given, then apply the classifier override.
pub fn load_config(
    config: Option<&Path>,
    classifier: Option<PathBuf>,
) -> anyhow::Result<DetectorConfig> {
    let mut config = match config {
        Some(path) => DetectorConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => DetectorConfig::default(),
    };
    if classifier.is_some() {
        config = config.with_classifier_path(classifier);
    }
    Ok(config)
}

/// Format hint from the explicit flag or the file extension.
pub fn format_hint(path: &Path, format: Option<&str>) -> Option<String> {
    format
        .map(str::to_string)
        .or_else(|| path.extension().and_then(|e| e.to_str()).map(str::to_lowercase))
}

fn read_audio(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn render<T: Serialize>(value: &T, output: OutputStyle) -> anyhow::Result<String> {
    let text = match output {
        OutputStyle::Pretty => serde_json::to_string_pretty(value)?,
        OutputStyle::Compact => serde_json::to_string(value)?,
    };
    Ok(text)
}

/// Classify a file and print the response.
pub fn analyze(
    config: DetectorConfig,
    path: &Path,
    format: Option<&str>,
    language: Option<&str>,
    debug: bool,
    output: OutputStyle,
) -> anyhow::Result<()> {
    info!("Analyzing: {}", path.display());

    let detector = Detector::new(config)?;
    let bytes = read_audio(path)?;
    let hint = format_hint(path, format);
    let verdict = detector.analyze(&bytes, hint.as_deref())?;

    let text = if debug {
        render(&verdict, output)?
    } else {
        render(&VoiceResponse::from_verdict(&verdict, language), output)?
    };
    println!("{}", text);

    Ok(())
}

/// Print the feature vector of a file.
pub fn features(
    config: DetectorConfig,
    path: &Path,
    format: Option<&str>,
    output: OutputStyle,
) -> anyhow::Result<()> {
    info!("Extracting features: {}", path.display());

    let detector = Detector::new(config)?;
    let bytes = read_audio(path)?;
    let hint = format_hint(path, format);
    let features = detector.extract_features(&bytes, hint.as_deref())?;

    println!("{}", render(&features, output)?);
    Ok(())
}

/// Print the effective configuration.
pub fn show_config(config: &DetectorConfig) -> anyhow::Result<()> {
    config.validate()?;
    println!("{}", config.to_json()?);
    Ok(())
}
