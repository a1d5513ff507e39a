//! Configuration management for Referat.

mod languages;
mod settings;

pub use languages::{display_name, whisper_code, LanguageSelection, LANGUAGE_NAMES};
pub use settings::{
    ApiSettings, CleanupSettings, GeneralSettings, Settings, SummarizationSettings,
    TranscriptionSettings,
};
