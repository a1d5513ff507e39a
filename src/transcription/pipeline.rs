//! End-to-end transcription of a single recording, large files included.
//!
//! Files within the backend limit go straight through. Oversized files are
//! first compressed; if the compressed copy fits it is transcribed directly,
//! and only when that fails (or compression could not help) is the file
//! split into segments that are transcribed in order and joined.

use super::SpeechToText;
use crate::audio::{AudioAsset, Compress, Compressor, Split, Splitter};
use crate::error::{ReferatError, Result};
use crate::text::normalizer::TextNormalizer;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome counts for a multi-segment transcription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Orchestrates size gating, compression, splitting, and transcription.
pub struct TranscriptionPipeline {
    backend: Arc<dyn SpeechToText>,
    compressor: Arc<dyn Compress>,
    splitter: Arc<dyn Split>,
    max_file_bytes: u64,
    normalizer: TextNormalizer,
}

impl TranscriptionPipeline {
    pub fn new(
        backend: Arc<dyn SpeechToText>,
        temp_dir: impl AsRef<Path>,
        max_file_bytes: u64,
    ) -> Self {
        let temp_dir = temp_dir.as_ref();
        Self::with_tools(
            backend,
            Arc::new(Compressor::new(temp_dir)),
            Arc::new(Splitter::new(temp_dir, max_file_bytes)),
            max_file_bytes,
        )
    }

    /// Construct with explicit tooling, for callers that bring their own
    /// compression or splitting.
    pub fn with_tools(
        backend: Arc<dyn SpeechToText>,
        compressor: Arc<dyn Compress>,
        splitter: Arc<dyn Split>,
        max_file_bytes: u64,
    ) -> Self {
        Self {
            backend,
            compressor,
            splitter,
            max_file_bytes,
            normalizer: TextNormalizer::new(),
        }
    }

    /// Transcribe a recording of any size, returning normalized text.
    pub async fn transcribe(&self, path: &Path, language: Option<&str>) -> Result<String> {
        let asset = AudioAsset::from_path(path)?;
        asset.ensure_supported()?;

        let text = if asset.needs_special_handling(self.max_file_bytes) {
            self.transcribe_oversized(&asset, language).await?
        } else {
            self.backend.transcribe_file(&asset, language).await?
        };

        Ok(self.normalizer.normalize(&text))
    }

    async fn transcribe_oversized(
        &self,
        asset: &AudioAsset,
        language: Option<&str>,
    ) -> Result<String> {
        info!(
            "File is {:.2}MB, over the {:.0}MB limit",
            asset.size_mb(),
            self.max_file_bytes as f64 / (1024.0 * 1024.0)
        );

        let outcome = self.compressor.compress(asset, self.max_file_bytes).await;

        // The compressed copy, when one exists, becomes the split source:
        // it is smaller, so splitting it produces fewer segments.
        let mut source = asset.clone();

        if outcome.compressed {
            let compressed = AudioAsset::from_path(&outcome.path)?;

            if compressed.size_bytes <= self.max_file_bytes {
                match self.backend.transcribe_file(&compressed, language).await {
                    Ok(text) => {
                        Compressor::cleanup_temp_file(&outcome.path);
                        return Ok(text);
                    }
                    Err(e) => {
                        // The copy fit but the backend rejected it; split it
                        // instead of giving up.
                        warn!("Transcription of compressed file failed: {}", e);
                    }
                }
            } else {
                info!("Compressed copy is still oversized, splitting it");
            }

            source = compressed;
        } else if let Some(failure) = &outcome.failure {
            // If the transcoding tool is missing, splitting cannot help
            // either; fail before spending anything on a doomed attempt.
            if !self.splitter.available().await {
                return Err(ReferatError::ToolNotFound(failure.clone()));
            }
            info!("Compression did not help, splitting instead");
        }

        let split_result = self.splitter.split(&source).await;
        let segments = match split_result {
            Ok(segments) => segments,
            Err(e) => {
                Compressor::cleanup_temp_file(&source.path);
                return Err(e);
            }
        };

        let (fragments, report) = self.transcribe_segments(&segments, language).await;
        cleanup_segments(&segments, &asset.path);
        Compressor::cleanup_temp_file(&source.path);

        if report.succeeded == 0 {
            return Err(ReferatError::Transcription(format!(
                "All {} segment(s) failed to transcribe ({} attempted, {} failed). \
                 Likely causes: no transcription backend reachable, a corrupt or \
                 unsupported recording, or ffmpeg producing invalid segments.",
                report.total, report.total, report.failed
            )));
        }

        if report.failed > 0 {
            warn!(
                "Transcribed {}/{} segments; the transcript has gaps",
                report.succeeded, report.total
            );
        }

        Ok(fragments.join(" "))
    }

    /// Transcribe segments in order, skipping unusable ones and collecting
    /// the fragments that succeed.
    async fn transcribe_segments(
        &self,
        segments: &[PathBuf],
        language: Option<&str>,
    ) -> (Vec<String>, BatchReport) {
        let mut fragments = Vec::new();
        let mut report = BatchReport {
            total: segments.len(),
            succeeded: 0,
            failed: 0,
        };

        for (i, segment) in segments.iter().enumerate() {
            let asset = match AudioAsset::from_path(segment) {
                Ok(a) => a,
                Err(e) => {
                    warn!("Segment {} unreadable: {}", i + 1, e);
                    report.failed += 1;
                    continue;
                }
            };

            if asset.size_bytes == 0 {
                warn!("Segment {} is empty, skipping", i + 1);
                report.failed += 1;
                continue;
            }

            // A segment far over the limit would be rejected by the backend
            // anyway; skip it instead of burning an API call.
            if asset.size_bytes as f64 > self.max_file_bytes as f64 * 1.1 {
                warn!(
                    "Segment {} is {:.2}MB, over the limit, skipping",
                    i + 1,
                    asset.size_mb()
                );
                report.failed += 1;
                continue;
            }

            info!("Transcribing segment {}/{}", i + 1, report.total);
            match self.backend.transcribe_file(&asset, language).await {
                Ok(text) => {
                    let text = text.trim().to_string();
                    if !text.is_empty() {
                        fragments.push(text);
                    }
                    report.succeeded += 1;
                }
                Err(e) => {
                    warn!("Segment {} failed: {}", i + 1, e);
                    report.failed += 1;
                }
            }
        }

        (fragments, report)
    }
}

/// Remove split artifacts, never the caller's original file.
fn cleanup_segments(segments: &[PathBuf], original: &Path) {
    for segment in segments {
        if segment == original {
            continue;
        }
        let is_chunk = segment
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.contains("_chunk_"))
            .unwrap_or(false);
        if is_chunk {
            if let Err(e) = std::fs::remove_file(segment) {
                warn!("Failed to remove segment {}: {}", segment.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::CompressionOutcome;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Backend that answers from a filename -> response table.
    struct ScriptedBackend {
        responses: HashMap<String, Result<String>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(entries: Vec<(&str, Result<String>)>) -> Self {
            Self {
                responses: entries
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SpeechToText for ScriptedBackend {
        async fn transcribe_file(
            &self,
            asset: &AudioAsset,
            _language: Option<&str>,
        ) -> Result<String> {
            let name = asset
                .path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("")
                .to_string();
            self.calls.lock().unwrap().push(name.clone());
            match self.responses.get(&name) {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(_)) => Err(ReferatError::Transcription("scripted failure".to_string())),
                None => Err(ReferatError::Transcription(format!("unexpected file {name}"))),
            }
        }
    }

    fn write_file(dir: &Path, name: &str, bytes: usize) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, vec![0u8; bytes]).unwrap();
        path
    }

    /// Compressor stub that hands back a pre-built outcome.
    struct FixedCompressor {
        outcome: Mutex<Option<CompressionOutcome>>,
    }

    #[async_trait]
    impl Compress for FixedCompressor {
        async fn compress(&self, asset: &AudioAsset, _target_bytes: u64) -> CompressionOutcome {
            self.outcome
                .lock()
                .unwrap()
                .take()
                .unwrap_or(CompressionOutcome {
                    path: asset.path.clone(),
                    compressed: false,
                    failure: None,
                })
        }
    }

    /// Splitter stub with fixed segments and a call log.
    struct FixedSplitter {
        available: bool,
        segments: Vec<PathBuf>,
        calls: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl Split for FixedSplitter {
        async fn available(&self) -> bool {
            self.available
        }

        async fn split(&self, asset: &AudioAsset) -> Result<Vec<PathBuf>> {
            self.calls.lock().unwrap().push(asset.path.clone());
            Ok(self.segments.clone())
        }
    }

    #[tokio::test]
    async fn test_small_file_single_backend_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "meeting.mp3", 100);

        let backend = Arc::new(ScriptedBackend::new(vec![(
            "meeting.mp3",
            Ok("hello world".to_string()),
        )]));
        let pipeline = TranscriptionPipeline::new(backend.clone(), dir.path(), 1024);

        let text = pipeline.transcribe(&path, None).await.unwrap();
        assert_eq!(text, "Hello world");
        assert_eq!(backend.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_oversized_file_that_compresses_to_fit_is_not_split() {
        let dir = tempfile::tempdir().unwrap();
        let original = write_file(dir.path(), "meeting.wav", 2048);
        let compressed = write_file(dir.path(), "compressed_meeting.mp3", 100);

        let backend = Arc::new(ScriptedBackend::new(vec![(
            "compressed_meeting.mp3",
            Ok("the compressed copy fits.".to_string()),
        )]));
        let compressor = Arc::new(FixedCompressor {
            outcome: Mutex::new(Some(CompressionOutcome {
                path: compressed,
                compressed: true,
                failure: None,
            })),
        });
        let splitter = Arc::new(FixedSplitter {
            available: true,
            segments: Vec::new(),
            calls: Mutex::new(Vec::new()),
        });
        let pipeline = TranscriptionPipeline::with_tools(
            backend.clone(),
            compressor,
            splitter.clone(),
            1024,
        );

        let text = pipeline.transcribe(&original, None).await.unwrap();

        assert_eq!(text, "The compressed copy fits.");
        assert_eq!(
            *backend.calls.lock().unwrap(),
            vec!["compressed_meeting.mp3"]
        );
        assert!(splitter.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_compressed_copy_falls_through_to_splitting_it() {
        let dir = tempfile::tempdir().unwrap();
        let original = write_file(dir.path(), "meeting.wav", 2048);
        let compressed = write_file(dir.path(), "compressed_meeting.mp3", 100);
        let seg_a = write_file(dir.path(), "compressed_meeting_chunk_000.mp3", 50);
        let seg_b = write_file(dir.path(), "compressed_meeting_chunk_001.mp3", 50);

        let backend = Arc::new(ScriptedBackend::new(vec![
            (
                "compressed_meeting.mp3",
                Err(ReferatError::Transcription("rejected".to_string())),
            ),
            (
                "compressed_meeting_chunk_000.mp3",
                Ok("first half.".to_string()),
            ),
            (
                "compressed_meeting_chunk_001.mp3",
                Ok("second half.".to_string()),
            ),
        ]));
        let compressor = Arc::new(FixedCompressor {
            outcome: Mutex::new(Some(CompressionOutcome {
                path: compressed.clone(),
                compressed: true,
                failure: None,
            })),
        });
        let splitter = Arc::new(FixedSplitter {
            available: true,
            segments: vec![seg_a, seg_b],
            calls: Mutex::new(Vec::new()),
        });
        let pipeline = TranscriptionPipeline::with_tools(
            backend.clone(),
            compressor,
            splitter.clone(),
            1024,
        );

        let text = pipeline.transcribe(&original, None).await.unwrap();

        assert_eq!(text, "First half. Second half.");
        // The compressed copy, not the original, is the split source.
        assert_eq!(*splitter.calls.lock().unwrap(), vec![compressed]);
        assert_eq!(backend.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_tool_unavailable_fails_fast_without_backend_calls() {
        let dir = tempfile::tempdir().unwrap();
        let original = write_file(dir.path(), "meeting.wav", 4096);

        let backend = Arc::new(ScriptedBackend::new(Vec::new()));
        let compressor = Arc::new(FixedCompressor {
            outcome: Mutex::new(Some(CompressionOutcome {
                path: original.clone(),
                compressed: false,
                failure: Some(
                    "FFmpeg is required to compress large audio files.".to_string(),
                ),
            })),
        });
        let splitter = Arc::new(FixedSplitter {
            available: false,
            segments: Vec::new(),
            calls: Mutex::new(Vec::new()),
        });
        let pipeline = TranscriptionPipeline::with_tools(
            backend.clone(),
            compressor,
            splitter.clone(),
            1024,
        );

        let err = pipeline.transcribe(&original, None).await.unwrap_err();

        assert!(matches!(err, ReferatError::ToolNotFound(_)));
        assert!(err.to_string().contains("FFmpeg is required"));
        assert!(backend.calls.lock().unwrap().is_empty());
        assert!(splitter.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_segments_joined_in_order_with_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "part_chunk_000.mp3", 10);
        let b = write_file(dir.path(), "part_chunk_001.mp3", 10);
        let c = write_file(dir.path(), "part_chunk_002.mp3", 10);

        let backend = ScriptedBackend::new(vec![
            ("part_chunk_000.mp3", Ok("first part.".to_string())),
            (
                "part_chunk_001.mp3",
                Err(ReferatError::Transcription("boom".to_string())),
            ),
            ("part_chunk_002.mp3", Ok("third part.".to_string())),
        ]);
        let pipeline =
            TranscriptionPipeline::new(Arc::new(backend), dir.path(), 25 * 1024 * 1024);

        let (fragments, report) = pipeline
            .transcribe_segments(&[a, b, c], None)
            .await;

        assert_eq!(fragments, vec!["first part.", "third part."]);
        assert_eq!(
            report,
            BatchReport {
                total: 3,
                succeeded: 2,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn test_oversized_and_empty_segments_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let empty = write_file(dir.path(), "a_chunk_000.mp3", 0);
        let huge = write_file(dir.path(), "a_chunk_001.mp3", 2048);
        let ok = write_file(dir.path(), "a_chunk_002.mp3", 100);

        let backend = ScriptedBackend::new(vec![("a_chunk_002.mp3", Ok("text".to_string()))]);
        let pipeline = TranscriptionPipeline::new(Arc::new(backend), dir.path(), 1024);

        let (fragments, report) = pipeline
            .transcribe_segments(&[empty, huge, ok], None)
            .await;

        assert_eq!(fragments, vec!["text"]);
        assert_eq!(report.failed, 2);
        assert_eq!(report.succeeded, 1);
    }

    #[test]
    fn test_cleanup_spares_original_and_non_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let original = write_file(dir.path(), "meeting.mp3", 10);
        let chunk = write_file(dir.path(), "meeting_chunk_000.mp3", 10);
        let other = write_file(dir.path(), "notes.mp3", 10);

        cleanup_segments(
            &[original.clone(), chunk.clone(), other.clone()],
            &original,
        );

        assert!(original.exists());
        assert!(!chunk.exists());
        assert!(other.exists());
    }
}
