//! Remote-first transcription with an explicit fallback cascade.
//!
//! The cascade is data, not control flow: [`fallback_plan`] produces the
//! ordered strategy list for the configured clients, and each strategy's
//! result is classified as success, retryable, or fatal. One special case:
//! a 404 from the primary endpoint means the route does not exist, so the
//! alternate `/v1` variant of the same endpoint is skipped and the cascade
//! goes straight to the local model.

use super::cache::ModelCache;
use super::SpeechToText;
use crate::audio::{ffmpeg, AudioAsset};
use crate::config::Settings;
use crate::error::{ReferatError, Result};
use crate::openai::{create_alternate_client, create_client};
use crate::text::vietnamese;
use async_openai::{config::OpenAIConfig, types::CreateTranscriptionRequestArgs, Client};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// One step of the fallback cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The configured OpenAI-compatible endpoint.
    RemotePrimary,
    /// The same endpoint with a `/v1` path suffix, tried once after a
    /// generic primary failure.
    RemoteAlternate,
    /// The local Whisper model.
    Local,
}

/// How a failed remote attempt affects the rest of the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteFailure {
    /// The endpoint route is missing; the alternate route will not help.
    NotFound,
    /// Anything else (auth, network, server error, empty response).
    Other,
}

/// Classify a remote error message for cascade purposes.
pub fn classify_remote_error(message: &str) -> RemoteFailure {
    let lower = message.to_lowercase();
    if lower.contains("404") || lower.contains("not found") {
        RemoteFailure::NotFound
    } else {
        RemoteFailure::Other
    }
}

/// The ordered strategies to attempt given the configured clients.
pub fn fallback_plan(has_primary: bool, has_alternate: bool) -> Vec<Strategy> {
    let mut plan = Vec::new();
    if has_primary {
        plan.push(Strategy::RemotePrimary);
    }
    if has_alternate {
        plan.push(Strategy::RemoteAlternate);
    }
    plan.push(Strategy::Local);
    plan
}

/// Transcription backend implementing the remote/alternate/local cascade.
pub struct TranscriptionBackend {
    client: Option<Client<OpenAIConfig>>,
    alternate: Option<Client<OpenAIConfig>>,
    model: String,
    models: Arc<ModelCache>,
    local_model: String,
    local_model_vietnamese: String,
}

impl TranscriptionBackend {
    pub fn new(settings: &Settings, models: Arc<ModelCache>) -> Self {
        Self {
            client: create_client(&settings.api),
            alternate: create_alternate_client(&settings.api),
            model: settings.api.transcription_model.clone(),
            models,
            local_model: settings.transcription.local_model.clone(),
            local_model_vietnamese: settings.transcription.local_model_vietnamese.clone(),
        }
    }

    async fn transcribe_remote(
        &self,
        client: &Client<OpenAIConfig>,
        asset: &AudioAsset,
        language: Option<&str>,
    ) -> Result<String> {
        let file_bytes = tokio::fs::read(&asset.path).await?;

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(async_openai::types::AudioInput::from_vec_u8(
                asset
                    .path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model);

        if let Some(lang) = language {
            request_builder.language(lang);
        }

        let request = request_builder
            .build()
            .map_err(|e| ReferatError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| ReferatError::OpenAI(format!("Transcription API error: {}", e)))?;

        let text = response.text.trim().to_string();
        if text.is_empty() {
            // An empty transcript from the API is indistinguishable from a
            // broken endpoint; treat it as a failure so the cascade proceeds.
            return Err(ReferatError::Transcription(
                "Remote endpoint returned an empty transcript".to_string(),
            ));
        }
        Ok(text)
    }

    async fn transcribe_local(
        &self,
        asset: &AudioAsset,
        language: Option<&str>,
    ) -> Result<String> {
        // The whisper CLI itself depends on ffmpeg for decoding.
        if !ffmpeg::is_available().await {
            return Err(ReferatError::ToolNotFound(format!(
                "ffmpeg\n\n{}",
                ffmpeg::installation_instructions()
            )));
        }

        let is_vietnamese = language == Some("vi");
        let model_name = if is_vietnamese {
            &self.local_model_vietnamese
        } else {
            &self.local_model
        };

        let model = self.models.get(model_name).await?;
        let text = model.transcribe(asset, language).await?;

        if text.trim().is_empty() {
            return Err(ReferatError::Transcription(
                "Local model produced an empty transcript".to_string(),
            ));
        }

        // Vietnamese output benefits from diacritic and phrase repair.
        if is_vietnamese {
            return Ok(vietnamese::post_process(&text));
        }
        Ok(text)
    }
}

#[async_trait]
impl SpeechToText for TranscriptionBackend {
    async fn transcribe_file(&self, asset: &AudioAsset, language: Option<&str>) -> Result<String> {
        if asset.size_bytes == 0 {
            return Err(ReferatError::InvalidInput(format!(
                "Audio file is empty: {}",
                asset.path.display()
            )));
        }
        asset.ensure_supported()?;

        let plan = fallback_plan(self.client.is_some(), self.alternate.is_some());
        let mut skip_alternate = false;
        let mut last_error: Option<ReferatError> = None;

        for strategy in plan {
            let attempt = match strategy {
                Strategy::RemotePrimary => {
                    let Some(client) = &self.client else { continue };
                    info!("Transcribing via remote endpoint");
                    self.transcribe_remote(client, asset, language).await
                }
                Strategy::RemoteAlternate => {
                    if skip_alternate {
                        continue;
                    }
                    let Some(client) = &self.alternate else { continue };
                    info!("Retrying via /v1 endpoint variant");
                    self.transcribe_remote(client, asset, language).await
                }
                Strategy::Local => {
                    info!("Falling back to local transcription");
                    self.transcribe_local(asset, language).await
                }
            };

            match attempt {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!("Strategy {:?} failed: {}", strategy, e);
                    if strategy == Strategy::RemotePrimary
                        && classify_remote_error(&e.to_string()) == RemoteFailure::NotFound
                    {
                        // The route is missing; its /v1 variant will 404 too.
                        skip_alternate = true;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ReferatError::Transcription("All transcription strategies failed".to_string())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_remote_error() {
        assert_eq!(
            classify_remote_error("HTTP 404 Not Found"),
            RemoteFailure::NotFound
        );
        assert_eq!(
            classify_remote_error("resource not found"),
            RemoteFailure::NotFound
        );
        assert_eq!(
            classify_remote_error("401 Unauthorized"),
            RemoteFailure::Other
        );
        assert_eq!(
            classify_remote_error("connection refused"),
            RemoteFailure::Other
        );
    }

    #[test]
    fn test_fallback_plan_always_ends_local() {
        assert_eq!(fallback_plan(false, false), vec![Strategy::Local]);
        assert_eq!(
            fallback_plan(true, false),
            vec![Strategy::RemotePrimary, Strategy::Local]
        );
        assert_eq!(
            fallback_plan(true, true),
            vec![
                Strategy::RemotePrimary,
                Strategy::RemoteAlternate,
                Strategy::Local
            ]
        );
    }
}
