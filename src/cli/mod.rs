//! CLI Module
//!
//! Command-line interface for the VoiceGuard detector.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// VoiceGuard - synthetic voice detection
#[derive(Parser, Debug)]
#[command(name = "voiceguard-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Classifier artifact (overrides scoring.classifier_path)
    #[arg(long, global = true)]
    pub classifier: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output layout for JSON documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputStyle {
    #[default]
    Pretty,
    Compact,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a recording as AI-generated or human
    #[command(name = "analyze")]
    Analyze {
        /// Audio file
        path: PathBuf,

        /// Container hint (defaults to the file extension)
        #[arg(short, long)]
        format: Option<String>,

        /// Language tag echoed in the response
        #[arg(short, long)]
        language: Option<String>,

        /// Print the full verdict including the fused score and signals
        #[arg(long)]
        debug: bool,

        #[arg(long, value_enum, default_value_t = OutputStyle::Pretty)]
        output: OutputStyle,
    },

    /// Print the extracted feature vector
    #[command(name = "features")]
    Features {
        /// Audio file
        path: PathBuf,

        /// Container hint (defaults to the file extension)
        #[arg(short, long)]
        format: Option<String>,

        #[arg(long, value_enum, default_value_t = OutputStyle::Pretty)]
        output: OutputStyle,
    },

    /// Print the effective configuration
    #[command(name = "config")]
    Config,
}
