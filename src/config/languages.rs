//! Language tables and selection handling.
//!
//! The transcription backend accepts a small fixed set of ISO language codes.
//! Summaries can additionally be requested in any language via the `other`
//! sentinel plus a caller-supplied display name.

use crate::error::{ReferatError, Result};

/// Sentinel language code for a caller-supplied language name.
pub const OTHER: &str = "other";

/// Display names for the supported language codes.
pub const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("vi", "Vietnamese"),
    ("en", "English"),
    ("zh", "Chinese"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("fr", "French"),
    ("de", "German"),
    ("es", "Spanish"),
];

/// Map a language code to the code passed to the transcription backend.
///
/// Returns `None` for unknown codes and for `other` (the backend then
/// auto-detects the spoken language).
pub fn whisper_code(language: &str) -> Option<&'static str> {
    LANGUAGE_NAMES
        .iter()
        .find(|(code, _)| *code == language)
        .map(|(code, _)| *code)
}

/// Resolve the display name used in prompts.
///
/// `other` resolves to the custom name when given; unknown codes fall back
/// to a generic phrase so prompts stay well-formed.
pub fn display_name(language: &str, custom_language: Option<&str>) -> String {
    if language == OTHER {
        if let Some(custom) = custom_language {
            if !custom.trim().is_empty() {
                return custom.trim().to_string();
            }
        }
    }

    LANGUAGE_NAMES
        .iter()
        .find(|(code, _)| *code == language)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| "the language used".to_string())
}

/// A validated language selection for a single request.
#[derive(Debug, Clone, PartialEq)]
pub enum LanguageSelection {
    /// One of the fixed supported codes.
    Code(&'static str),
    /// `other` with a non-empty custom display name.
    Other(String),
}

impl LanguageSelection {
    /// Validate a raw (language, custom_language) pair from the caller.
    pub fn parse(language: &str, custom_language: Option<&str>) -> Result<Self> {
        let language = language.trim();
        if language.is_empty() {
            return Err(ReferatError::InvalidInput(
                "Conversation language is required".to_string(),
            ));
        }

        if language == OTHER {
            let custom = custom_language.map(str::trim).unwrap_or("");
            if custom.is_empty() {
                return Err(ReferatError::InvalidInput(
                    "Custom language is required when 'other' is selected".to_string(),
                ));
            }
            return Ok(LanguageSelection::Other(custom.to_string()));
        }

        whisper_code(language)
            .map(LanguageSelection::Code)
            .ok_or_else(|| {
                ReferatError::InvalidInput(format!(
                    "Unknown language code: '{}'. Use one of {} or 'other'",
                    language,
                    LANGUAGE_NAMES
                        .iter()
                        .map(|(code, _)| *code)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }

    /// The code handed to the transcription backend, if any.
    pub fn whisper_code(&self) -> Option<&str> {
        match self {
            LanguageSelection::Code(code) => Some(code),
            LanguageSelection::Other(_) => None,
        }
    }

    /// The display name used in summarization prompts.
    pub fn display_name(&self) -> String {
        match self {
            LanguageSelection::Code(code) => display_name(code, None),
            LanguageSelection::Other(name) => name.clone(),
        }
    }

    /// Whether this selection is Vietnamese (drives local model choice and
    /// post-processing).
    pub fn is_vietnamese(&self) -> bool {
        matches!(self, LanguageSelection::Code("vi"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_known_code() {
        assert_eq!(display_name("vi", None), "Vietnamese");
        assert_eq!(display_name("en", None), "English");
    }

    #[test]
    fn test_display_name_other_uses_custom() {
        assert_eq!(display_name("other", Some("Klingon")), "Klingon");
    }

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(display_name("xx", None), "the language used");
        assert_eq!(display_name("other", None), "the language used");
    }

    #[test]
    fn test_parse_other_requires_custom() {
        assert!(LanguageSelection::parse("other", None).is_err());
        assert!(LanguageSelection::parse("other", Some("  ")).is_err());

        let sel = LanguageSelection::parse("other", Some("Klingon")).unwrap();
        assert_eq!(sel.display_name(), "Klingon");
        assert_eq!(sel.whisper_code(), None);
    }

    #[test]
    fn test_parse_rejects_unknown_code() {
        assert!(LanguageSelection::parse("tlh", None).is_err());
        assert!(LanguageSelection::parse("", None).is_err());
    }

    #[test]
    fn test_parse_known_code() {
        let sel = LanguageSelection::parse("vi", None).unwrap();
        assert_eq!(sel.whisper_code(), Some("vi"));
        assert!(sel.is_vietnamese());

        let sel = LanguageSelection::parse("en", None).unwrap();
        assert!(!sel.is_vietnamese());
    }
}
