//! Referat CLI entry point.

use anyhow::Result;
use clap::Parser;
use referat::cli::{commands, Cli, Commands};
use referat::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("referat={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.temp_dir())?;

    // Execute command
    match &cli.command {
        Commands::Init => {
            commands::run_init(&settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Process {
            file,
            topic,
            language,
            custom_language,
            output,
        } => {
            commands::run_process(
                file,
                topic,
                language,
                custom_language.as_deref(),
                output.clone(),
                settings,
            )
            .await?;
        }

        Commands::Transcribe {
            file,
            language,
            custom_language,
            output,
        } => {
            commands::run_transcribe(
                file,
                language,
                custom_language.as_deref(),
                output.clone(),
                settings,
            )
            .await?;
        }

        Commands::Summarize {
            file,
            topic,
            language,
            custom_language,
            output,
        } => {
            commands::run_summarize(
                file,
                topic.as_deref(),
                language,
                custom_language.as_deref(),
                output.clone(),
                settings,
            )
            .await?;
        }

        Commands::Clean { dry_run } => {
            commands::run_clean(*dry_run, settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
