//! Audio compression for files over the transcription size limit.
//!
//! Presets are tried high-compression-first; if none fits, one adaptive
//! attempt derives a bitrate from the target size. Compression never fails
//! hard: when it cannot help, the outcome carries an explanatory failure and
//! the caller moves on to the next strategy (splitting).

use super::{ffmpeg, AudioAsset, Compress};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Per-attempt ffmpeg timeout.
const COMPRESS_TIMEOUT: Duration = Duration::from_secs(600);

/// A fixed bitrate/sample-rate combination.
#[derive(Debug, Clone, Copy)]
pub struct CompressionPreset {
    pub name: &'static str,
    pub bitrate_kbps: u32,
    pub sample_rate: u32,
}

/// Presets ordered most aggressive first.
pub const COMPRESSION_PRESETS: [CompressionPreset; 3] = [
    CompressionPreset { name: "high", bitrate_kbps: 64, sample_rate: 22050 },
    CompressionPreset { name: "medium", bitrate_kbps: 128, sample_rate: 44100 },
    CompressionPreset { name: "low", bitrate_kbps: 192, sample_rate: 44100 },
];

/// Result of a compression attempt.
#[derive(Debug)]
pub struct CompressionOutcome {
    /// The asset to continue with: the compressed copy on success, the
    /// original otherwise.
    pub path: PathBuf,
    /// Whether `path` is a newly written compressed copy (caller owns cleanup).
    pub compressed: bool,
    /// Why compression did not produce a fitting file, if it didn't.
    pub failure: Option<String>,
}

/// Service for compressing oversized audio files.
pub struct Compressor {
    temp_dir: PathBuf,
}

impl Compressor {
    pub fn new(temp_dir: impl AsRef<Path>) -> Self {
        Self {
            temp_dir: temp_dir.as_ref().to_path_buf(),
        }
    }

    /// Try to compress `asset` to at most `target_bytes`.
    ///
    /// Never returns an output larger than the input: a preset that regresses
    /// is discarded. When the tool is unavailable or no attempt fits, the
    /// original path is returned with `compressed == false` and a failure
    /// message for the caller to act on.
    pub async fn compress(&self, asset: &AudioAsset, target_bytes: u64) -> CompressionOutcome {
        if asset.size_bytes <= target_bytes {
            return CompressionOutcome {
                path: asset.path.clone(),
                compressed: false,
                failure: None,
            };
        }

        if !ffmpeg::is_available().await {
            warn!("ffmpeg not available, compression skipped");
            return CompressionOutcome {
                path: asset.path.clone(),
                compressed: false,
                failure: Some(format!(
                    "FFmpeg is required to compress large audio files.\n\n{}\n\n\
                     Alternatively, compress your audio file manually before uploading.",
                    ffmpeg::installation_instructions()
                )),
            };
        }

        let output = self.output_path(&asset.path);
        if let Some(parent) = output.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        info!("Compressing audio file from {:.2}MB", asset.size_mb());

        for preset in COMPRESSION_PRESETS {
            info!(
                "Trying compression preset: {} ({}k)",
                preset.name, preset.bitrate_kbps
            );

            let result = ffmpeg::transcode(
                &asset.path,
                &output,
                None,
                None,
                preset.bitrate_kbps,
                preset.sample_rate,
                COMPRESS_TIMEOUT,
            )
            .await;

            if let Err(e) = result {
                warn!("Compression with preset '{}' failed: {}", preset.name, e);
                continue;
            }

            let Ok(compressed_size) = std::fs::metadata(&output).map(|m| m.len()) else {
                continue;
            };

            if compressed_size <= target_bytes {
                info!(
                    "Compressed to {:.2}MB using preset '{}'",
                    compressed_size as f64 / (1024.0 * 1024.0),
                    preset.name
                );
                return CompressionOutcome {
                    path: output,
                    compressed: true,
                    failure: None,
                };
            }

            if compressed_size >= asset.size_bytes {
                // Compression regressed, no preset will help from here.
                let _ = std::fs::remove_file(&output);
                break;
            }

            info!(
                "Still too large ({:.2}MB), trying more aggressive compression",
                compressed_size as f64 / (1024.0 * 1024.0)
            );
        }

        // Last resort: derive a bitrate from the target size.
        let bitrate = adaptive_bitrate(target_bytes);
        info!("Trying adaptive bitrate compression ({}k)", bitrate);

        let adaptive = ffmpeg::transcode(
            &asset.path,
            &output,
            None,
            None,
            bitrate,
            44100,
            COMPRESS_TIMEOUT,
        )
        .await;

        if adaptive.is_ok() {
            if let Ok(compressed_size) = std::fs::metadata(&output).map(|m| m.len()) {
                // Allow 10% tolerance on the adaptive attempt.
                if compressed_size as f64 <= target_bytes as f64 * 1.1
                    && compressed_size < asset.size_bytes
                {
                    info!(
                        "Compressed to {:.2}MB using adaptive bitrate",
                        compressed_size as f64 / (1024.0 * 1024.0)
                    );
                    return CompressionOutcome {
                        path: output,
                        compressed: true,
                        failure: None,
                    };
                }
            }
        } else if let Err(e) = adaptive {
            warn!("Adaptive compression failed: {}", e);
        }

        let _ = std::fs::remove_file(&output);

        CompressionOutcome {
            path: asset.path.clone(),
            compressed: false,
            failure: Some(format!(
                "Could not compress file to target size.\n\
                 Original size: {:.2}MB\n\
                 Target size: {:.2}MB\n\n\
                 Please manually compress your audio file before uploading, \
                 or split it into smaller segments.",
                asset.size_mb(),
                target_bytes as f64 / (1024.0 * 1024.0)
            )),
        }
    }

    /// Remove a temporary compressed file, best-effort.
    pub fn cleanup_temp_file(path: &Path) {
        let is_temp = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("compressed_"))
            .unwrap_or(false);

        if is_temp && path.exists() {
            if let Err(e) = std::fs::remove_file(path) {
                warn!("Failed to cleanup temp file {}: {}", path.display(), e);
            }
        }
    }

    fn output_path(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("audio");
        // Output is always MP3, regardless of input container.
        self.temp_dir.join(format!("compressed_{}.mp3", stem))
    }
}

#[async_trait]
impl Compress for Compressor {
    async fn compress(&self, asset: &AudioAsset, target_bytes: u64) -> CompressionOutcome {
        Compressor::compress(self, asset, target_bytes).await
    }
}

/// Bitrate for the adaptive attempt: `clamp(target_MB * 8 * 0.8, 32, 192)` kbps.
pub fn adaptive_bitrate(target_bytes: u64) -> u32 {
    let target_mb = target_bytes as f64 / (1024.0 * 1024.0);
    let estimated = (target_mb * 8.0 * 0.8) as u32;
    estimated.clamp(32, 192)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_adaptive_bitrate_clamped() {
        // 25MB target -> 25 * 8 * 0.8 = 160k
        assert_eq!(adaptive_bitrate(25 * 1024 * 1024), 160);
        // Tiny target clamps to the floor
        assert_eq!(adaptive_bitrate(1024), 32);
        // Huge target clamps to the cap
        assert_eq!(adaptive_bitrate(500 * 1024 * 1024), 192);
    }

    #[test]
    fn test_preset_order_most_aggressive_first() {
        assert_eq!(COMPRESSION_PRESETS[0].name, "high");
        assert!(COMPRESSION_PRESETS[0].bitrate_kbps < COMPRESSION_PRESETS[1].bitrate_kbps);
        assert!(COMPRESSION_PRESETS[1].bitrate_kbps < COMPRESSION_PRESETS[2].bitrate_kbps);
    }

    #[tokio::test]
    async fn test_small_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meeting.mp3");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0u8; 512]).unwrap();

        let asset = AudioAsset::from_path(&path).unwrap();
        let compressor = Compressor::new(dir.path());
        let outcome = compressor.compress(&asset, 1024).await;

        assert!(!outcome.compressed);
        assert!(outcome.failure.is_none());
        assert_eq!(outcome.path, path);
    }

    #[test]
    fn test_cleanup_only_removes_temp_names() {
        let dir = tempfile::tempdir().unwrap();
        let keep = dir.path().join("meeting.mp3");
        let temp = dir.path().join("compressed_meeting.mp3");
        std::fs::write(&keep, b"x").unwrap();
        std::fs::write(&temp, b"x").unwrap();

        Compressor::cleanup_temp_file(&keep);
        Compressor::cleanup_temp_file(&temp);

        assert!(keep.exists());
        assert!(!temp.exists());
    }
}
