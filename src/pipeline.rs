//! Top-level processing pipeline: recording in, transcript and summary out.

use crate::config::{LanguageSelection, Settings};
use crate::error::{ReferatError, Result};
use crate::summarization::Summarizer;
use crate::transcription::{
    cache, local::WhisperCliLoader, ModelCache, TranscriptionBackend, TranscriptionPipeline,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// The result of processing one meeting recording.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MeetingSummary {
    pub transcript: String,
    pub summary: String,
}

/// Wires settings, transcription, and summarization together.
pub struct Pipeline {
    transcription: TranscriptionPipeline,
    summarizer: Option<Summarizer>,
}

impl Pipeline {
    /// Build a pipeline from settings. Starts warming the common local
    /// models in the background.
    pub fn new(settings: &Settings) -> Self {
        let models = Arc::new(ModelCache::new(Arc::new(WhisperCliLoader)));
        cache::preload_common(
            models.clone(),
            &[
                settings.transcription.local_model.clone(),
                settings.transcription.local_model_vietnamese.clone(),
            ],
        );

        let backend = Arc::new(TranscriptionBackend::new(settings, models));
        let transcription = TranscriptionPipeline::new(
            backend,
            settings.temp_dir(),
            settings.transcription.max_file_bytes(),
        );

        Self {
            transcription,
            summarizer: Summarizer::from_settings(settings),
        }
    }

    /// Transcribe and summarize one recording.
    ///
    /// `language` is a supported code or `other` (with `custom_language`
    /// naming the summary language). A topic is required so the summary has
    /// something to anchor on.
    pub async fn process(
        &self,
        path: &Path,
        language: &str,
        custom_language: Option<&str>,
        topic: &str,
    ) -> Result<MeetingSummary> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ReferatError::InvalidInput(
                "A meeting topic is required".to_string(),
            ));
        }

        let selection = LanguageSelection::parse(language, custom_language)?;

        let transcript = self.transcribe_with(&selection, path).await?;
        info!("Transcript is {} characters", transcript.chars().count());

        let summary = self
            .summarize(&transcript, &selection, Some(topic))
            .await?;

        Ok(MeetingSummary {
            transcript,
            summary,
        })
    }

    /// Transcription only, for callers that do their own summarization.
    pub async fn transcribe(
        &self,
        path: &Path,
        language: &str,
        custom_language: Option<&str>,
    ) -> Result<String> {
        let selection = LanguageSelection::parse(language, custom_language)?;
        self.transcribe_with(&selection, path).await
    }

    /// Summarize an existing transcript.
    pub async fn summarize(
        &self,
        transcript: &str,
        selection: &LanguageSelection,
        topic: Option<&str>,
    ) -> Result<String> {
        let Some(summarizer) = &self.summarizer else {
            return Err(ReferatError::Config(
                "Summarization requires an API key. Set api.api_key in the \
                 config or the OPENAI_API_KEY environment variable."
                    .to_string(),
            ));
        };

        summarizer
            .summarize(transcript, &selection.display_name(), topic)
            .await
    }

    async fn transcribe_with(
        &self,
        selection: &LanguageSelection,
        path: &Path,
    ) -> Result<String> {
        self.transcription
            .transcribe(path, selection.whisper_code())
            .await
    }
}
