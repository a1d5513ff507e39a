//! Speech-to-text with a remote-first fallback cascade and large-file
//! handling.

pub mod backend;
pub mod cache;
pub mod local;
pub mod pipeline;

pub use backend::TranscriptionBackend;
pub use cache::ModelCache;
pub use pipeline::{BatchReport, TranscriptionPipeline};

use crate::audio::AudioAsset;
use crate::error::Result;
use async_trait::async_trait;

/// A service that turns an audio file into text.
///
/// `language` is a Whisper language code hint; `None` lets the backend
/// auto-detect.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe_file(&self, asset: &AudioAsset, language: Option<&str>) -> Result<String>;
}
