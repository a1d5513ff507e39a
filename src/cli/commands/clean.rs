//! Clean command - enforce the retention window on staged files.

use crate::cli::Output;
use crate::config::Settings;
use crate::storage;
use anyhow::Result;

pub fn run_clean(dry_run: bool, settings: Settings) -> Result<()> {
    let retention = settings.cleanup.retention_days;

    let from_data = storage::cleanup_old_files(&settings.data_dir(), retention, dry_run)?;
    let from_temp = storage::cleanup_old_files(&settings.temp_dir(), retention, dry_run)?;
    let total = from_data + from_temp;

    if dry_run {
        Output::info(&format!(
            "Would remove {} file(s) older than {} day(s)",
            total, retention
        ));
    } else if total > 0 {
        Output::success(&format!(
            "Removed {} file(s) older than {} day(s)",
            total, retention
        ));
    } else {
        Output::info("Nothing to clean.");
    }

    Ok(())
}
