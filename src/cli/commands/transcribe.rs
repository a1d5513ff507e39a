//! Transcribe command - transcription without summarization.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub async fn run_transcribe(
    file: &Path,
    language: &str,
    custom_language: Option<&str>,
    output: Option<PathBuf>,
    settings: Settings,
) -> Result<()> {
    preflight::check(preflight::Operation::Transcribe, &settings)?;

    let pipeline = Pipeline::new(&settings);

    let spinner = Output::spinner("Transcribing...");
    let transcript = pipeline.transcribe(file, language, custom_language).await;
    spinner.finish_and_clear();

    let transcript = transcript?;

    match output {
        Some(path) => {
            std::fs::write(&path, &transcript)?;
            Output::success(&format!("Wrote transcript to {}", path.display()));
        }
        None => println!("{}", transcript),
    }

    Ok(())
}
