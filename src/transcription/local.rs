//! Local Whisper transcription via the `whisper` command-line tool.
//!
//! Each model size ("base", "medium", ...) is wrapped as a [`SpeechModel`].
//! Loading a model means verifying the CLI is runnable; the actual weights
//! are downloaded by the tool itself on first use.

use crate::audio::AudioAsset;
use crate::error::{ReferatError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Timeout for checking the whisper binary.
const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for a single transcription run. Local transcription on CPU is
/// slow; an hour-long recording on the medium model can take a while.
const TRANSCRIBE_TIMEOUT: Duration = Duration::from_secs(3600);

/// A loaded local speech model.
#[async_trait]
pub trait SpeechModel: Send + Sync {
    /// The model size name, e.g. "base".
    fn name(&self) -> &str;

    /// Transcribe an audio file, optionally pinned to a language.
    async fn transcribe(&self, asset: &AudioAsset, language: Option<&str>) -> Result<String>;
}

/// Loads speech models by name.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, model_name: &str) -> Result<Arc<dyn SpeechModel>>;
}

/// A Whisper model invoked through the `whisper` CLI (openai-whisper).
pub struct WhisperCliModel {
    model_name: String,
}

#[async_trait]
impl SpeechModel for WhisperCliModel {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn transcribe(&self, asset: &AudioAsset, language: Option<&str>) -> Result<String> {
        let output_dir = tempfile::tempdir()?;

        info!(
            "Running local transcription with model '{}' on {}",
            self.model_name,
            asset.path.display()
        );

        let mut cmd = Command::new("whisper");
        cmd.arg(&asset.path)
            .arg("--model").arg(&self.model_name)
            .arg("--task").arg("transcribe")
            .arg("--output_format").arg("txt")
            .arg("--output_dir").arg(output_dir.path());
        if let Some(lang) = language {
            cmd.arg("--language").arg(lang);
        }

        debug!("Running: {:?}", cmd.as_std());

        let result = tokio::time::timeout(
            TRANSCRIBE_TIMEOUT,
            cmd.stdout(Stdio::null()).stderr(Stdio::piped()).output(),
        )
        .await
        .map_err(|_| ReferatError::Transcription("Local transcription timed out".to_string()))?;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ReferatError::ToolNotFound("whisper".to_string()));
            }
            Err(e) => {
                return Err(ReferatError::Transcription(format!(
                    "Failed to run whisper: {e}"
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReferatError::Transcription(format!(
                "whisper failed: {}",
                stderr.trim()
            )));
        }

        // The tool writes <input stem>.txt into the output directory.
        let stem = asset
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("audio");
        let transcript_path = output_dir.path().join(format!("{stem}.txt"));

        let text = std::fs::read_to_string(&transcript_path).map_err(|e| {
            ReferatError::Transcription(format!("whisper produced no transcript: {e}"))
        })?;

        Ok(text.trim().to_string())
    }
}

/// Loader that checks the `whisper` CLI is installed before handing out
/// models.
pub struct WhisperCliLoader;

#[async_trait]
impl ModelLoader for WhisperCliLoader {
    async fn load(&self, model_name: &str) -> Result<Arc<dyn SpeechModel>> {
        let probe = tokio::time::timeout(
            CHECK_TIMEOUT,
            Command::new("whisper")
                .arg("--help")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status(),
        )
        .await;

        match probe {
            Ok(Ok(status)) if status.success() => {
                info!("Local model '{}' ready", model_name);
                Ok(Arc::new(WhisperCliModel {
                    model_name: model_name.to_string(),
                }))
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ReferatError::ModelLoad(format!(
                    "The whisper CLI is not installed. Install it with:\n\n\
                     \tpip install -U openai-whisper\n\n\
                     (model requested: {model_name})"
                )))
            }
            Ok(result) => Err(ReferatError::ModelLoad(format!(
                "The whisper CLI is not working: {result:?}"
            ))),
            Err(_) => Err(ReferatError::ModelLoad(
                "Timed out checking the whisper CLI".to_string(),
            )),
        }
    }
}
