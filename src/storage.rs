//! Recording staging and retention cleanup.
//!
//! Incoming recordings are copied into the data directory under a
//! timestamped name so repeated uploads never collide. Staged recordings
//! and processing artifacts are short-lived; `cleanup_old_files` enforces
//! the retention window.

use crate::error::{ReferatError, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Copy a recording into `data_dir` under a timestamped name.
///
/// The original extension is preserved so format detection keeps working
/// downstream.
pub fn stage_recording(source: &Path, data_dir: &Path) -> Result<PathBuf> {
    if !source.is_file() {
        return Err(ReferatError::InvalidInput(format!(
            "Not a file: {}",
            source.display()
        )));
    }

    std::fs::create_dir_all(data_dir)?;

    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();
    let staged = data_dir.join(format!("recording_{}{}", chrono::Utc::now().timestamp(), ext));

    std::fs::copy(source, &staged)?;
    debug!("Staged {} as {}", source.display(), staged.display());
    Ok(staged)
}

/// Whether a file name is a processing artifact this crate created.
pub fn is_temp_artifact(name: &str) -> bool {
    name.starts_with("compressed_") || name.starts_with("recording_") || name.contains("_chunk_")
}

/// Remove files in `dir` older than `retention_days`. Returns how many were
/// (or, with `dry_run`, would be) removed.
pub fn cleanup_old_files(dir: &Path, retention_days: u32, dry_run: bool) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }

    let cutoff = SystemTime::now() - Duration::from_secs(u64::from(retention_days) * 24 * 3600);
    let mut removed = 0usize;

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) => {
                warn!("Cannot stat {}: {}", path.display(), e);
                continue;
            }
        };

        if modified < cutoff {
            if dry_run {
                info!("Would remove {}", path.display());
            } else {
                remove_quietly(&path);
            }
            removed += 1;
        }
    }

    Ok(removed)
}

/// Remove this crate's temporary artifacts from `dir`, regardless of age.
pub fn cleanup_temp_files(dir: &Path) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }

    let mut removed = 0usize;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_artifact = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(is_temp_artifact)
            .unwrap_or(false);

        if path.is_file() && is_artifact {
            remove_quietly(&path);
            removed += 1;
        }
    }
    Ok(removed)
}

fn remove_quietly(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        warn!("Failed to remove {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_recording_keeps_extension() {
        let src_dir = tempfile::tempdir().unwrap();
        let data_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("meeting.MP3");
        std::fs::write(&source, b"audio").unwrap();

        let staged = stage_recording(&source, data_dir.path()).unwrap();

        assert!(staged.exists());
        let name = staged.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("recording_"));
        assert!(name.ends_with(".mp3"));
        assert_eq!(std::fs::read(&staged).unwrap(), b"audio");
    }

    #[test]
    fn test_stage_missing_source() {
        let data_dir = tempfile::tempdir().unwrap();
        assert!(stage_recording(Path::new("/nonexistent.mp3"), data_dir.path()).is_err());
    }

    #[test]
    fn test_temp_artifact_names() {
        assert!(is_temp_artifact("compressed_meeting.mp3"));
        assert!(is_temp_artifact("recording_1700000000.mp3"));
        assert!(is_temp_artifact("meeting_chunk_003.mp3"));
        assert!(!is_temp_artifact("meeting.mp3"));
        assert!(!is_temp_artifact("summary.txt"));
    }

    #[test]
    fn test_cleanup_respects_retention() {
        let dir = tempfile::tempdir().unwrap();
        let fresh = dir.path().join("recording_1.mp3");
        std::fs::write(&fresh, b"x").unwrap();

        // Nothing is old enough to remove.
        let removed = cleanup_old_files(dir.path(), 1, false).unwrap();
        assert_eq!(removed, 0);
        assert!(fresh.exists());

        // Retention of zero days removes everything.
        let removed = cleanup_old_files(dir.path(), 0, false).unwrap();
        assert_eq!(removed, 1);
        assert!(!fresh.exists());
    }

    #[test]
    fn test_cleanup_dry_run_removes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("recording_1.mp3");
        std::fs::write(&file, b"x").unwrap();

        let removed = cleanup_old_files(dir.path(), 0, true).unwrap();
        assert_eq!(removed, 1);
        assert!(file.exists());
    }

    #[test]
    fn test_cleanup_temp_files_spares_user_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("compressed_a.mp3"), b"x").unwrap();
        std::fs::write(dir.path().join("b_chunk_000.mp3"), b"x").unwrap();
        std::fs::write(dir.path().join("keep.mp3"), b"x").unwrap();

        let removed = cleanup_temp_files(dir.path()).unwrap();
        assert_eq!(removed, 2);
        assert!(dir.path().join("keep.mp3").exists());
    }
}
