//! VoiceGuard CLI - Synthetic Voice Detection
//!
//! Command-line interface for the VoiceGuard detector.

use clap::Parser;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use voiceguard::cli::{commands, Cli, Commands};
use voiceguard::VoiceGuardError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose; logs go to stderr so stdout stays JSON
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("VoiceGuard v{}", env!("CARGO_PKG_VERSION"));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = commands::load_config(cli.config.as_deref(), cli.classifier)?;

    match cli.command {
        Commands::Analyze {
            path,
            format,
            language,
            debug,
            output,
        } => commands::analyze(
            config,
            &path,
            format.as_deref(),
            language.as_deref(),
            debug,
            output,
        ),
        Commands::Features {
            path,
            format,
            output,
        } => commands::features(config, &path, format.as_deref(), output),
        Commands::Config => commands::show_config(&config),
    }
}

fn report(err: &anyhow::Error) {
    match err.downcast_ref::<VoiceGuardError>() {
        Some(e) => {
            eprintln!("Error [{}]: {}", e.error_code(), e.friendly_message());
            for suggestion in e.recovery_suggestions() {
                eprintln!("  - {}", suggestion);
            }
        }
        None => eprintln!("Error: {:#}", err),
    }
}
