//! Prompt construction for meeting summarization.

/// System and user message pair for one chat completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Build the prompt for summarizing one transcript chunk.
///
/// `language_name` is the human-readable output language (for example
/// "Vietnamese" or a caller-supplied custom language). `topic` narrows the
/// summary focus when given.
pub fn build_summary_prompt(
    content: &str,
    language_name: &str,
    topic: Option<&str>,
) -> PromptPair {
    let system = format!(
        "You are an expert meeting assistant. Summarize the meeting transcript \
         you are given.\n\n\
         Requirements:\n\
         - Write the summary in {language_name}.\n\
         - Preserve names, product names, and technical terms exactly as they \
           appear in the transcript. Do not translate them.\n\
         - Capture all decisions that were made.\n\
         - List action items with their owners where mentioned.\n\
         - Note any deadlines or dates that were agreed.\n\
         - Be concise but do not omit substantive points."
    );

    let user = match topic {
        Some(topic) => format!(
            "The meeting was about: {topic}\n\n\
             Focus the summary on this topic.\n\n\
             Transcript:\n{content}"
        ),
        None => format!("Transcript:\n{content}"),
    };

    PromptPair { system, user }
}

/// Build the prompt that merges per-chunk summaries into one.
///
/// Sections are labeled so the model understands they are consecutive parts
/// of the same meeting, not separate meetings.
pub fn build_combine_prompt(summaries: &[String], language_name: &str) -> PromptPair {
    let system = format!(
        "You are an expert meeting assistant. You will receive several partial \
         summaries covering consecutive sections of one meeting. Merge them \
         into a single coherent summary.\n\n\
         Requirements:\n\
         - Write the final summary in {language_name}.\n\
         - Preserve names, product names, and technical terms exactly as they \
           appear. Do not translate them.\n\
         - Deduplicate points repeated across sections.\n\
         - Keep every decision, action item, and deadline."
    );

    let sections: Vec<String> = summaries
        .iter()
        .enumerate()
        .map(|(i, s)| format!("Section {} Summary:\n{}", i + 1, s))
        .collect();

    PromptPair {
        system,
        user: sections.join("\n\n---\n\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_prompt_names_language() {
        let pair = build_summary_prompt("we talked", "Vietnamese", None);
        assert!(pair.system.contains("in Vietnamese"));
        assert!(pair.user.contains("we talked"));
        assert!(!pair.user.contains("The meeting was about"));
    }

    #[test]
    fn test_summary_prompt_with_topic() {
        let pair = build_summary_prompt("we talked", "English", Some("Q3 budget"));
        assert!(pair.user.contains("The meeting was about: Q3 budget"));
        assert!(pair.user.contains("we talked"));
    }

    #[test]
    fn test_custom_language_flows_through() {
        // Any caller-supplied language name goes into the instruction as-is.
        let pair = build_summary_prompt("we talked", "Klingon", None);
        assert!(pair.system.contains("in Klingon"));
    }

    #[test]
    fn test_combine_prompt_labels_sections() {
        let summaries = vec!["first".to_string(), "second".to_string()];
        let pair = build_combine_prompt(&summaries, "English");
        assert!(pair.user.contains("Section 1 Summary:\nfirst"));
        assert!(pair.user.contains("Section 2 Summary:\nsecond"));
        assert!(pair.user.contains("\n\n---\n\n"));
    }
}
