//! Audio asset handling and large-file processing.
//!
//! An [`AudioAsset`] is a file on disk plus its size and format metadata.
//! Files larger than the transcription backend's hard limit are handled by
//! the [`Compressor`] and, failing that, the [`Splitter`].

pub mod compressor;
pub mod ffmpeg;
pub mod splitter;

pub use compressor::{Compressor, CompressionOutcome};
pub use splitter::Splitter;

use crate::error::{ReferatError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Compression seam for the transcription pipeline.
#[async_trait]
pub trait Compress: Send + Sync {
    async fn compress(&self, asset: &AudioAsset, target_bytes: u64) -> CompressionOutcome;
}

/// Splitting seam for the transcription pipeline.
#[async_trait]
pub trait Split: Send + Sync {
    /// Whether the transcoding tool needed for splitting is present.
    async fn available(&self) -> bool;

    async fn split(&self, asset: &AudioAsset) -> Result<Vec<PathBuf>>;
}

/// Audio formats accepted by the transcription backend.
pub const SUPPORTED_FORMATS: &[&str] = &["mp3", "mp4", "mpeg", "mpga", "m4a", "wav", "webm"];

/// A single audio file on disk with its metadata.
#[derive(Debug, Clone)]
pub struct AudioAsset {
    /// Path to the file.
    pub path: PathBuf,
    /// File size in bytes.
    pub size_bytes: u64,
}

impl AudioAsset {
    /// Create an asset from a path, reading its size from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| {
            ReferatError::InvalidInput(format!("Cannot read audio file {}: {}", path.display(), e))
        })?;

        if !metadata.is_file() {
            return Err(ReferatError::InvalidInput(format!(
                "Not a file: {}",
                path.display()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            size_bytes: metadata.len(),
        })
    }

    /// Lowercased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }

    /// Whether the file format is on the backend whitelist.
    pub fn format_supported(&self) -> bool {
        self.extension()
            .map(|ext| SUPPORTED_FORMATS.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    /// Fail fast on unsupported formats.
    pub fn ensure_supported(&self) -> Result<()> {
        if self.format_supported() {
            Ok(())
        } else {
            Err(ReferatError::UnsupportedFormat(
                self.extension().unwrap_or_else(|| "(none)".to_string()),
            ))
        }
    }

    /// Size gate: does this file exceed the backend's hard size limit?
    pub fn needs_special_handling(&self, limit_bytes: u64) -> bool {
        self.size_bytes > limit_bytes
    }

    /// Probe the duration in seconds via ffprobe.
    pub async fn duration_seconds(&self) -> Result<f64> {
        ffmpeg::probe_duration(&self.path).await
    }

    /// File size in megabytes, for diagnostics.
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn asset_with(name: &str, bytes: usize) -> (tempfile::TempDir, AudioAsset) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&vec![0u8; bytes]).unwrap();
        (dir, AudioAsset::from_path(&path).unwrap())
    }

    #[test]
    fn test_size_gate() {
        let (_dir, asset) = asset_with("meeting.mp3", 100);
        assert!(!asset.needs_special_handling(100));
        assert!(asset.needs_special_handling(99));
    }

    #[test]
    fn test_format_whitelist() {
        let (_dir, asset) = asset_with("meeting.wav", 10);
        assert!(asset.format_supported());
        assert!(asset.ensure_supported().is_ok());

        let (_dir, asset) = asset_with("meeting.flac", 10);
        assert!(!asset.format_supported());
        assert!(matches!(
            asset.ensure_supported(),
            Err(ReferatError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(AudioAsset::from_path("/nonexistent/meeting.mp3").is_err());
    }
}
