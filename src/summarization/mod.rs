//! Transcript summarization with hierarchical merging.
//!
//! Short transcripts are summarized in a single call. Longer ones are cut
//! into overlapping chunks, each chunk summarized in order, and the partial
//! summaries merged with a final combine call. Unlike transcription, there
//! is no fallback here: a failed summarization call fails the operation.

pub mod chunker;
pub mod prompts;

pub use chunker::TextChunker;

use crate::config::Settings;
use crate::error::{ReferatError, Result};
use crate::openai::create_client;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use prompts::PromptPair;
use tracing::{debug, info};

/// Summarizes transcripts via an OpenAI-compatible chat endpoint.
pub struct Summarizer {
    client: Client<OpenAIConfig>,
    model: String,
    chunker: TextChunker,
    max_chars: usize,
}

impl Summarizer {
    /// Create a summarizer, or `None` when no API key is configured.
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        let client = create_client(&settings.api)?;
        Some(Self {
            client,
            model: settings.api.summary_model.clone(),
            chunker: TextChunker::new(
                settings.summarization.max_chars_per_chunk,
                settings.summarization.chunk_overlap,
            ),
            max_chars: settings.summarization.max_chars_per_chunk,
        })
    }

    /// Summarize a transcript in `language_name`, optionally focused on a
    /// meeting topic.
    pub async fn summarize(
        &self,
        transcript: &str,
        language_name: &str,
        topic: Option<&str>,
    ) -> Result<String> {
        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Err(ReferatError::Summarization(
                "Nothing to summarize: the transcript is empty".to_string(),
            ));
        }

        if transcript.chars().count() <= self.max_chars {
            let pair = prompts::build_summary_prompt(transcript, language_name, topic);
            return self.complete(pair).await;
        }

        let chunks = self.chunker.chunk(transcript);
        info!("Summarizing transcript in {} chunk(s)", chunks.len());

        let mut partials = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            debug!("Summarizing chunk {}/{}", i + 1, chunks.len());
            let pair = prompts::build_summary_prompt(chunk, language_name, topic);
            let summary = self.complete(pair).await.map_err(|e| {
                ReferatError::Summarization(format!(
                    "Chunk {}/{} failed: {}",
                    i + 1,
                    chunks.len(),
                    e
                ))
            })?;
            partials.push(summary);
        }

        // One chunk means the chunker degenerated; its summary is final.
        if partials.len() == 1 {
            return Ok(partials.remove(0));
        }

        info!("Merging {} partial summaries", partials.len());
        let pair = prompts::build_combine_prompt(&partials, language_name);
        self.complete(pair).await
    }

    async fn complete(&self, pair: PromptPair) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(pair.system)
                .build()
                .map_err(|e| ReferatError::Summarization(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(pair.user)
                .build()
                .map_err(|e| ReferatError::Summarization(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.3)
            .build()
            .map_err(|e| ReferatError::Summarization(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ReferatError::OpenAI(format!("Summarization API error: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                ReferatError::Summarization("Empty response from the model".to_string())
            })?;

        Ok(content)
    }
}
