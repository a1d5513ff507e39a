//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{ReferatError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Transcription needs at least one working backend.
    Transcribe,
    /// Summarization requires an API key.
    Summarize,
    /// Processing is transcription plus summarization.
    Process,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Transcribe => check_transcription_backend(settings),
        Operation::Summarize => check_api_key(settings),
        Operation::Process => {
            check_transcription_backend(settings)?;
            check_api_key(settings)
        }
    }
}

/// At least one of the remote endpoint or the local whisper CLI must be
/// usable, otherwise every transcription strategy is doomed from the start.
fn check_transcription_backend(settings: &Settings) -> Result<()> {
    if settings.api.resolve_api_key().is_some() {
        return Ok(());
    }
    if check_tool("whisper").is_ok() {
        return Ok(());
    }
    Err(ReferatError::Config(
        "No transcription backend available. Either set an API key \
         (export OPENAI_API_KEY='sk-...') or install the local whisper CLI \
         (pip install -U openai-whisper)."
            .to_string(),
    ))
}

/// Check if an API key is configured.
fn check_api_key(settings: &Settings) -> Result<()> {
    match settings.api.resolve_api_key() {
        Some(_) => Ok(()),
        None => Err(ReferatError::Config(
            "No API key configured. Set api.api_key in the config or: \
             export OPENAI_API_KEY='sk-...'"
                .to_string(),
        )),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    // ffmpeg/ffprobe use -version (single dash), others use --version
    let version_arg = match name {
        "ffmpeg" | "ffprobe" => "-version",
        "whisper" => "--help",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(ReferatError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ReferatError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(ReferatError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
