//! Summarize command - summarize an existing transcript file.

use crate::cli::{preflight, Output};
use crate::config::{LanguageSelection, Settings};
use crate::pipeline::Pipeline;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub async fn run_summarize(
    file: &Path,
    topic: Option<&str>,
    language: &str,
    custom_language: Option<&str>,
    output: Option<PathBuf>,
    settings: Settings,
) -> Result<()> {
    preflight::check(preflight::Operation::Summarize, &settings)?;

    let transcript = std::fs::read_to_string(file)?;
    let selection = LanguageSelection::parse(language, custom_language)?;

    let pipeline = Pipeline::new(&settings);

    let spinner = Output::spinner("Summarizing...");
    let summary = pipeline.summarize(&transcript, &selection, topic).await;
    spinner.finish_and_clear();

    let summary = summary?;

    match output {
        Some(path) => {
            std::fs::write(&path, &summary)?;
            Output::success(&format!("Wrote summary to {}", path.display()));
        }
        None => println!("{}", summary),
    }

    Ok(())
}
