//! Configuration settings for Referat.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub api: ApiSettings,
    pub transcription: TranscriptionSettings,
    pub summarization: SummarizationSettings,
    pub cleanup: CleanupSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing staged recordings.
    pub data_dir: String,
    /// Directory for temporary files (compressed copies, audio chunks).
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.referat".to_string(),
            temp_dir: "/tmp/referat".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// OpenAI-compatible API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the OpenAI-compatible endpoint. None uses the SDK default.
    pub base_url: Option<String>,
    /// API key. Falls back to the OPENAI_API_KEY environment variable.
    pub api_key: Option<String>,
    /// Model used for remote transcription.
    pub transcription_model: String,
    /// Model used for summarization.
    pub summary_model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            transcription_model: "whisper-1".to_string(),
            summary_model: "gpt-4o-mini".to_string(),
            timeout_seconds: 300,
        }
    }
}

impl ApiSettings {
    /// Resolve the API key from config or environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()))
    }
}

/// Transcription pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Hard per-file size limit of the transcription backend, in megabytes.
    pub max_file_mb: u64,
    /// Local model used for most languages (speed over accuracy).
    pub local_model: String,
    /// Local model used for Vietnamese (accuracy over speed).
    pub local_model_vietnamese: String,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            max_file_mb: 25,
            local_model: "base".to_string(),
            local_model_vietnamese: "medium".to_string(),
        }
    }
}

impl TranscriptionSettings {
    /// The size limit in bytes.
    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_mb * 1024 * 1024
    }
}

/// Summarization pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizationSettings {
    /// Maximum characters per summarization chunk (~500 tokens).
    pub max_chars_per_chunk: usize,
    /// Characters of overlap between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for SummarizationSettings {
    fn default() -> Self {
        Self {
            max_chars_per_chunk: 2000,
            chunk_overlap: 200,
        }
    }
}

/// Retention settings for the cleanup command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupSettings {
    /// Files older than this many days are removed by `referat clean`.
    pub retention_days: u32,
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self { retention_days: 1 }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ReferatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("referat")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.transcription.max_file_mb, 25);
        assert_eq!(settings.transcription.max_file_bytes(), 25 * 1024 * 1024);
        assert_eq!(settings.summarization.max_chars_per_chunk, 2000);
        assert_eq!(settings.summarization.chunk_overlap, 200);
        assert_eq!(settings.cleanup.retention_days, 1);
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.api.summary_model = "gpt-4o".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.api.summary_model, "gpt-4o");
        assert_eq!(loaded.transcription.local_model_vietnamese, "medium");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[summarization]\nmax_chars_per_chunk = 4000\n").unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.summarization.max_chars_per_chunk, 4000);
        assert_eq!(loaded.summarization.chunk_overlap, 200);
        assert_eq!(loaded.transcription.max_file_mb, 25);
    }
}
