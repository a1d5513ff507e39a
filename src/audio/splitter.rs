//! Time-based splitting of audio files that exceed the backend size limit.
//!
//! A file is cut into equal-duration windows sized from the byte budget.
//! Cutting is driven by an explicit work stack rather than recursion: a cut
//! that still exceeds the limit (variable bitrate makes this possible) is
//! pushed back as a new job at the position it would have occupied, so the
//! final segment list stays in playback order.

use super::{ffmpeg, AudioAsset, Split};
use crate::error::{ReferatError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound on produced segments, guards against runaway re-splitting.
const MAX_SEGMENTS: usize = 100;

/// A segment up to 10% over the limit is accepted as-is.
const SIZE_TOLERANCE: f64 = 1.1;

/// Per-cut ffmpeg timeout.
const CUT_TIMEOUT: Duration = Duration::from_secs(300);

/// Formats where a stream copy produces a valid standalone segment.
const STREAM_COPY_FORMATS: &[&str] = &["mp3", "mp4", "m4a"];

/// Service for splitting oversized audio files into transcribable chunks.
pub struct Splitter {
    temp_dir: PathBuf,
    max_chunk_bytes: u64,
}

/// One pending cut: the source to cut and where its segments belong in the
/// overall ordering.
struct SplitJob {
    insert_at: usize,
    path: PathBuf,
    is_temp: bool,
}

impl Splitter {
    pub fn new(temp_dir: impl AsRef<Path>, max_chunk_bytes: u64) -> Self {
        Self {
            temp_dir: temp_dir.as_ref().to_path_buf(),
            max_chunk_bytes,
        }
    }

    /// Split `asset` into segments no larger than the configured limit
    /// (within tolerance). Returns segment paths in playback order.
    ///
    /// Files already within the limit are returned unchanged. When no valid
    /// segment can be produced at all, the original path is returned so the
    /// caller's own size validation reports the failure.
    pub async fn split(&self, asset: &AudioAsset) -> Result<Vec<PathBuf>> {
        if asset.size_bytes <= self.max_chunk_bytes {
            return Ok(vec![asset.path.clone()]);
        }

        if !ffmpeg::is_available().await {
            return Err(ReferatError::ToolNotFound(format!(
                "ffmpeg\n\n{}",
                ffmpeg::installation_instructions()
            )));
        }

        std::fs::create_dir_all(&self.temp_dir)?;

        info!(
            "Splitting {:.2}MB file into chunks of at most {:.2}MB",
            asset.size_mb(),
            self.max_chunk_bytes as f64 / (1024.0 * 1024.0)
        );

        let mut segments: Vec<PathBuf> = Vec::new();
        let mut jobs = vec![SplitJob {
            insert_at: 0,
            path: asset.path.clone(),
            is_temp: false,
        }];
        let mut produced = 0usize;

        while let Some(job) = jobs.pop() {
            if produced >= MAX_SEGMENTS {
                warn!("Reached segment cap ({}), stopping split", MAX_SEGMENTS);
                for leftover in jobs.drain(..).chain(std::iter::once(job)) {
                    if leftover.is_temp {
                        let _ = std::fs::remove_file(&leftover.path);
                    }
                }
                break;
            }

            let cut = self.cut_source(&job.path, produced, &mut jobs, job.insert_at).await;

            if job.is_temp {
                let _ = std::fs::remove_file(&job.path);
            }

            let chunks = match cut {
                Ok(chunks) => chunks,
                Err(e) => {
                    for leftover in jobs.drain(..) {
                        if leftover.is_temp {
                            let _ = std::fs::remove_file(&leftover.path);
                        }
                    }
                    for segment in &segments {
                        let _ = std::fs::remove_file(segment);
                    }
                    return Err(e);
                }
            };
            produced += chunks.len();

            // insert_at keeps nested re-splits in playback order.
            let at = job.insert_at.min(segments.len());
            for (offset, chunk) in chunks.into_iter().enumerate() {
                segments.insert(at + offset, chunk);
            }
        }

        if segments.is_empty() {
            warn!("Split produced no usable segments, passing the file through");
            return Ok(vec![asset.path.clone()]);
        }

        info!("Split into {} segment(s)", segments.len());
        Ok(segments)
    }

    /// Cut one source file into windows. In-limit chunks are returned;
    /// oversized ones are queued for re-splitting at their ordinal position.
    async fn cut_source(
        &self,
        source: &Path,
        name_base: usize,
        jobs: &mut Vec<SplitJob>,
        insert_at: usize,
    ) -> Result<Vec<PathBuf>> {
        let source_size = std::fs::metadata(source)?.len();

        let duration = match ffmpeg::probe_duration(source).await {
            Ok(d) if d > 0.0 => d,
            _ => {
                // Rough estimate: one minute of audio per megabyte.
                let estimated = source_size as f64 / (1024.0 * 1024.0) * 60.0;
                debug!("Duration probe failed, estimating {:.0}s", estimated);
                estimated
            }
        };

        let plan = chunk_plan(source_size, self.max_chunk_bytes, duration);
        let stream_copyable = source
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| STREAM_COPY_FORMATS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false);

        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("audio");

        let mut chunks = Vec::new();

        for (i, (start, length)) in plan.iter().enumerate() {
            let chunk_path = self
                .temp_dir
                .join(format!("{}_chunk_{:03}.mp3", stem, name_base + i));

            let written = self
                .write_chunk(source, &chunk_path, *start, *length, stream_copyable)
                .await;

            let Some(chunk_size) = written else {
                warn!("Failed to cut segment {} of {}", i + 1, plan.len());
                continue;
            };

            if chunk_size as f64 > self.max_chunk_bytes as f64 * SIZE_TOLERANCE {
                debug!(
                    "Segment {} still too large ({:.2}MB), queueing re-split",
                    i + 1,
                    chunk_size as f64 / (1024.0 * 1024.0)
                );
                jobs.push(SplitJob {
                    insert_at: insert_at + chunks.len(),
                    path: chunk_path,
                    is_temp: true,
                });
                continue;
            }

            chunks.push(chunk_path);
        }

        Ok(chunks)
    }

    /// Write one window of `source` to `output`. Tries a fast stream copy for
    /// container formats that support it, falling back to a re-encode.
    /// Returns the written size, or None when both approaches fail.
    async fn write_chunk(
        &self,
        source: &Path,
        output: &Path,
        start: f64,
        length: f64,
        stream_copyable: bool,
    ) -> Option<u64> {
        if stream_copyable {
            let copied = ffmpeg::stream_copy(source, output, start, length, CUT_TIMEOUT).await;
            if copied.is_ok() {
                if let Ok(size) = std::fs::metadata(output).map(|m| m.len()) {
                    if size > 0 {
                        return Some(size);
                    }
                }
            }
            let _ = std::fs::remove_file(output);
            debug!("Stream copy failed, re-encoding segment");
        }

        let encoded =
            ffmpeg::transcode(source, output, Some(start), Some(length), 128, 44100, CUT_TIMEOUT)
                .await;

        match encoded {
            Ok(()) => std::fs::metadata(output).map(|m| m.len()).ok().filter(|s| *s > 0),
            Err(e) => {
                warn!("Re-encode failed: {}", e);
                let _ = std::fs::remove_file(output);
                None
            }
        }
    }
}

#[async_trait]
impl Split for Splitter {
    async fn available(&self) -> bool {
        ffmpeg::is_available().await
    }

    async fn split(&self, asset: &AudioAsset) -> Result<Vec<PathBuf>> {
        Splitter::split(self, asset).await
    }
}

/// Plan equal-duration windows covering `[0, duration)`.
///
/// The window count is `size / max + 1`, so every window's byte share sits
/// comfortably under the limit at roughly constant bitrate.
pub fn chunk_plan(size_bytes: u64, max_bytes: u64, duration: f64) -> Vec<(f64, f64)> {
    let count = (size_bytes / max_bytes + 1) as usize;
    let window = duration / count as f64;

    (0..count)
        .map(|i| {
            let start = i as f64 * window;
            // The last window absorbs rounding drift.
            let length = if i == count - 1 {
                duration - start
            } else {
                window
            };
            (start, length)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_plan_count() {
        // 60MB at a 25MB limit -> 60/25 + 1 = 3 windows
        let plan = chunk_plan(60 * 1024 * 1024, 25 * 1024 * 1024, 300.0);
        assert_eq!(plan.len(), 3);

        // Just over the limit still yields 2 windows
        let plan = chunk_plan(26 * 1024 * 1024, 25 * 1024 * 1024, 100.0);
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_chunk_plan_covers_duration_contiguously() {
        let plan = chunk_plan(70 * 1024 * 1024, 25 * 1024 * 1024, 333.0);

        let mut cursor = 0.0;
        for (start, length) in &plan {
            assert!((start - cursor).abs() < 1e-9);
            assert!(*length > 0.0);
            cursor = start + length;
        }
        assert!((cursor - 333.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_split_passthrough_for_small_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meeting.mp3");
        std::fs::write(&path, vec![0u8; 1024]).unwrap();

        let asset = AudioAsset::from_path(&path).unwrap();
        let splitter = Splitter::new(dir.path(), 25 * 1024 * 1024);
        let segments = splitter.split(&asset).await.unwrap();

        assert_eq!(segments, vec![path]);
    }
}
