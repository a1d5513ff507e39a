//! Casing and spacing repair for raw transcripts.

use regex::Regex;
use std::collections::HashSet;

/// Share of uppercase letters above which a transcript is treated as
/// shouted (ALL CAPS) and re-cased from scratch.
const SHOUTING_THRESHOLD: f64 = 0.7;

/// Normalizes transcript casing and punctuation spacing.
///
/// Acronyms on the whitelist keep their casing when a shouted transcript is
/// re-cased.
pub struct TextNormalizer {
    acronyms: HashSet<String>,
    space_before_punct: Option<Regex>,
    missing_space_after: Option<Regex>,
    multi_space: Option<Regex>,
}

impl TextNormalizer {
    pub fn new() -> Self {
        let mut acronyms = HashSet::new();
        for a in ["OK", "AI", "API", "CEO", "CTO", "HR", "IT", "KPI", "PR", "Q&A", "ROI", "USD", "VND"] {
            acronyms.insert(a.to_string());
        }
        Self {
            acronyms,
            space_before_punct: Regex::new(r"\s+([,.!?;:])").ok(),
            missing_space_after: Regex::new(r"([,.!?;:])(\p{L})").ok(),
            multi_space: Regex::new(r"\s{2,}").ok(),
        }
    }

    /// Add a domain term whose casing must survive re-casing.
    pub fn add_acronym(&mut self, word: &str) {
        self.acronyms.insert(word.to_string());
    }

    /// Clean up a transcript: collapse whitespace, undo all-caps shouting,
    /// capitalize sentence starts, and fix spacing around punctuation.
    pub fn normalize(&self, text: &str) -> String {
        let mut text = text.trim().to_string();
        if text.is_empty() {
            return text;
        }

        if let Some(re) = &self.multi_space {
            text = re.replace_all(&text, " ").into_owned();
        }

        if is_shouting(&text) {
            text = self.lowercase_preserving_acronyms(&text);
        }

        if let Some(re) = &self.space_before_punct {
            text = re.replace_all(&text, "$1").into_owned();
        }
        if let Some(re) = &self.missing_space_after {
            text = re.replace_all(&text, "$1 $2").into_owned();
        }

        capitalize_sentences(&text)
    }

    fn lowercase_preserving_acronyms(&self, text: &str) -> String {
        text.split(' ')
            .map(|word| {
                // Compare without trailing punctuation so "API." matches.
                let core: String = word
                    .chars()
                    .filter(|c| c.is_alphanumeric() || *c == '&')
                    .collect();
                if self.acronyms.contains(&core) {
                    word.to_string()
                } else {
                    word.to_lowercase()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn is_shouting(text: &str) -> bool {
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() < 10 {
        return false;
    }
    let upper = letters.iter().filter(|c| c.is_uppercase()).count();
    upper as f64 / letters.len() as f64 > SHOUTING_THRESHOLD
}

/// Uppercase the first letter of the text and of every sentence.
fn capitalize_sentences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut capitalize_next = true;

    for c in text.chars() {
        if capitalize_next && c.is_alphabetic() {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
            if matches!(c, '.' | '!' | '?') {
                capitalize_next = true;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_capitalization() {
        let n = TextNormalizer::new();
        assert_eq!(
            n.normalize("hello world. this is a test! right"),
            "Hello world. This is a test! Right"
        );
    }

    #[test]
    fn test_shouting_repaired_with_acronyms_kept() {
        let n = TextNormalizer::new();
        assert_eq!(
            n.normalize("THE CEO APPROVED THE API BUDGET TODAY."),
            "The CEO approved the API budget today."
        );
    }

    #[test]
    fn test_mixed_case_left_alone() {
        let n = TextNormalizer::new();
        assert_eq!(
            n.normalize("We discussed the Hanoi office."),
            "We discussed the Hanoi office."
        );
    }

    #[test]
    fn test_punctuation_spacing() {
        let n = TextNormalizer::new();
        assert_eq!(
            n.normalize("first ,  second .third"),
            "First, second. Third"
        );
    }

    #[test]
    fn test_custom_acronym() {
        let mut n = TextNormalizer::new();
        n.add_acronym("GPU");
        assert_eq!(
            n.normalize("WE NEED MORE GPU CAPACITY FOR THE TEAM."),
            "We need more GPU capacity for the team."
        );
    }

    #[test]
    fn test_empty_and_whitespace() {
        let n = TextNormalizer::new();
        assert_eq!(n.normalize(""), "");
        assert_eq!(n.normalize("   "), "");
    }
}
