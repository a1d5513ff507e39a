//! Repair of common Vietnamese transcription errors.
//!
//! Local models frequently drop diacritics or mangle frequent words. The
//! fix tables below cover the words and phrases that show up in nearly
//! every meeting recording; everything else is left untouched. All fixes
//! are best-effort and never fail.

use regex::Regex;

/// Frequent single words transcribed without diacritics.
const WORD_FIXES: &[(&str, &str)] = &[
    ("khong", "không"),
    ("duoc", "được"),
    ("nguoi", "người"),
    ("viec", "việc"),
    ("truoc", "trước"),
    ("nhung", "những"),
    ("cung", "cũng"),
    ("phai", "phải"),
    ("biet", "biết"),
    ("thoi", "thời"),
    ("gio", "giờ"),
    ("ngay", "ngày"),
    ("thang", "tháng"),
    ("nam", "năm"),
    ("tien", "tiền"),
    ("hop", "họp"),
];

/// Multi-word phrases fixed before single words so longer matches win.
const PHRASE_FIXES: &[(&str, &str)] = &[
    ("cong ty", "công ty"),
    ("du an", "dự án"),
    ("ke hoach", "kế hoạch"),
    ("bao cao", "báo cáo"),
    ("quyet dinh", "quyết định"),
    ("cuoc hop", "cuộc họp"),
    ("khach hang", "khách hàng"),
    ("tuan sau", "tuần sau"),
];

/// Apply phrase and word fixes plus punctuation tidying to a Vietnamese
/// transcript.
pub fn post_process(text: &str) -> String {
    let mut text = fix_common_errors(text);

    // Collapse repeated punctuation the models sometimes emit. The regex
    // crate has no backreferences, so each character gets its own pattern.
    for (pattern, replacement) in [
        (r",{2,}", ","),
        (r"\.{2,}", "."),
        (r"!{2,}", "!"),
        (r"\?{2,}", "?"),
    ] {
        if let Ok(re) = Regex::new(pattern) {
            text = re.replace_all(&text, replacement).into_owned();
        }
    }
    if let Ok(re) = Regex::new(r"\s{2,}") {
        text = re.replace_all(&text, " ").into_owned();
    }

    text.trim().to_string()
}

/// Replace known diacritic-less words and phrases, preserving the
/// capitalization of the matched text's first letter.
pub fn fix_common_errors(text: &str) -> String {
    let mut result = text.to_string();

    for (wrong, right) in PHRASE_FIXES.iter().chain(WORD_FIXES.iter()) {
        let Ok(re) = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(wrong))) else {
            continue;
        };
        result = re
            .replace_all(&result, |caps: &regex::Captures| {
                apply_case(&caps[0], right)
            })
            .into_owned();
    }

    result
}

/// Carry an uppercase first letter from the matched text onto the fix.
fn apply_case(matched: &str, replacement: &str) -> String {
    let starts_upper = matched
        .chars()
        .next()
        .map(|c| c.is_uppercase())
        .unwrap_or(false);

    if !starts_upper {
        return replacement.to_string();
    }

    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_fixes() {
        assert_eq!(fix_common_errors("toi khong biet"), "toi không biết");
    }

    #[test]
    fn test_phrase_fixes_win_over_words() {
        assert_eq!(fix_common_errors("cuoc hop cong ty"), "cuộc họp công ty");
    }

    #[test]
    fn test_capitalization_preserved() {
        assert_eq!(fix_common_errors("Khong ai den"), "Không ai den");
    }

    #[test]
    fn test_correct_text_untouched() {
        let text = "chúng ta cần hoàn thành báo cáo";
        assert_eq!(fix_common_errors(text), text);
    }

    #[test]
    fn test_post_process_tidies_punctuation() {
        assert_eq!(
            post_process("khong sao..  tot lam"),
            "không sao. tot lam"
        );
    }
}
