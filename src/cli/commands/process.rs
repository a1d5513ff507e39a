//! Process command - transcribe and summarize a recording.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::storage;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub async fn run_process(
    file: &Path,
    topic: &str,
    language: &str,
    custom_language: Option<&str>,
    output: Option<PathBuf>,
    settings: Settings,
) -> Result<()> {
    preflight::check(preflight::Operation::Process, &settings)?;

    let staged = storage::stage_recording(file, &settings.data_dir())?;
    Output::info(&format!("Processing {}", file.display()));

    let pipeline = Pipeline::new(&settings);

    let spinner = Output::spinner("Transcribing and summarizing...");
    let result = pipeline
        .process(&staged, language, custom_language, topic)
        .await;
    spinner.finish_and_clear();

    // The staged copy and any chunks are no longer needed.
    storage::cleanup_temp_files(&settings.temp_dir())?;
    if let Err(e) = std::fs::remove_file(&staged) {
        tracing::warn!("Failed to remove staged recording: {}", e);
    }

    let meeting = result?;

    match output {
        Some(path) => {
            // A .json extension gets structured output for other tools.
            let is_json = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("json"))
                .unwrap_or(false);
            let report = if is_json {
                serde_json::to_string_pretty(&meeting)?
            } else {
                format!(
                    "# Meeting Summary\n\n{}\n\n# Transcript\n\n{}\n",
                    meeting.summary, meeting.transcript
                )
            };
            std::fs::write(&path, report)?;
            Output::success(&format!("Wrote summary to {}", path.display()));
        }
        None => {
            Output::header("Summary");
            println!("{}\n", meeting.summary);
            Output::header("Transcript");
            println!("{}", meeting.transcript);
        }
    }

    Ok(())
}
