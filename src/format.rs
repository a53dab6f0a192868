//! Text formatting for Discord: markup stripping, truncation and bilingual layout.
//!
//! Everything here is pure. Absent input is treated as empty and yields empty output.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;

/// Plain message content limit.
pub const MESSAGE_LIMIT: usize = 2000;
pub const EMBED_TITLE_LIMIT: usize = 256;
pub const EMBED_DESCRIPTION_LIMIT: usize = 4096;
pub const EMBED_FIELD_LIMIT: usize = 1024;
pub const EMBED_FOOTER_LIMIT: usize = 2048;

/// Appended to anything cut short.
pub const TRUNCATION_MARKER: &str = "...";

static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^<>]*>").unwrap());
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Which side of a bilingual passage to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Language {
    Hebrew,
    English,
    #[default]
    Both,
}

impl Language {
    pub const CHOICES: [&'static str; 3] = ["hebrew", "english", "both"];

    /// Parse an optional user-supplied value; absent or blank means `Both`.
    pub fn parse(value: Option<&str>) -> Result<Self, ValidationError> {
        match value.map(str::trim) {
            None | Some("") => Ok(Self::Both),
            Some(v) => v.parse(),
        }
    }
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hebrew" => Ok(Self::Hebrew),
            "english" => Ok(Self::English),
            "both" => Ok(Self::Both),
            other => Err(ValidationError::new(format!(
                "Unknown language `{other}`. Choose one of: {}.",
                Self::CHOICES.join(", ")
            ))),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hebrew => "hebrew",
            Self::English => "english",
            Self::Both => "both",
        };
        f.write_str(name)
    }
}

/// Remove HTML markup, decode the handful of entities Sefaria emits, and
/// drop any stray angle brackets so no tag characters survive.
pub fn strip_markup(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }

    let text = LINE_BREAK.replace_all(s, "\n");
    let text = TAG.replace_all(&text, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&");
    let text: String = text.chars().filter(|c| *c != '<' && *c != '>').collect();
    BLANK_LINES.replace_all(text.trim(), "\n\n").into_owned()
}

/// Cut `s` to at most `max_len` characters, ending in [`TRUNCATION_MARKER`]
/// when anything was removed. Counts chars, not bytes.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }

    let marker_len = TRUNCATION_MARKER.chars().count();
    if max_len <= marker_len {
        // No room for content; a partial marker is all that fits.
        return TRUNCATION_MARKER.chars().take(max_len).collect();
    }

    let kept: String = s.chars().take(max_len - marker_len).collect();
    format!("{}{TRUNCATION_MARKER}", kept.trim_end())
}

/// Join Hebrew and English text, Hebrew first. Empty sides are skipped.
pub fn format_bilingual(hebrew: &str, english: &str) -> String {
    let hebrew = hebrew.trim();
    let english = english.trim();
    match (hebrew.is_empty(), english.is_empty()) {
        (true, true) => String::new(),
        (false, true) => hebrew.to_string(),
        (true, false) => english.to_string(),
        (false, false) => format!("{hebrew}\n\n{english}"),
    }
}

/// Build the display body of a passage for the requested language,
/// stripped of markup and truncated to `max_len`.
pub fn format_passage(
    hebrew: Option<&str>,
    english: Option<&str>,
    language: Language,
    max_len: usize,
) -> String {
    let hebrew = strip_markup(hebrew.unwrap_or_default());
    let english = strip_markup(english.unwrap_or_default());

    let body = match language {
        Language::Hebrew if hebrew.is_empty() => "_No Hebrew text available._".to_string(),
        Language::Hebrew => hebrew,
        Language::English if english.is_empty() => "_No English translation available._".to_string(),
        Language::English => english,
        Language::Both => {
            let joined = format_bilingual(&hebrew, &english);
            if joined.is_empty() {
                "_No text available._".to_string()
            } else {
                joined
            }
        }
    };

    truncate(&body, max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_simple_tags() {
        assert_eq!(strip_markup("<b>In the beginning</b>"), "In the beginning");
        assert_eq!(
            strip_markup("God <i>created</i> the heaven"),
            "God created the heaven"
        );
    }

    #[test]
    fn test_strip_line_breaks_become_newlines() {
        assert_eq!(strip_markup("one<br>two<br/>three"), "one\ntwo\nthree");
    }

    #[test]
    fn test_strip_entities() {
        assert_eq!(strip_markup("a&nbsp;b &amp; c"), "a b & c");
    }

    #[test]
    fn test_strip_leaves_no_tag_characters() {
        let inputs = [
            "<sup>1</sup>text",
            "unclosed <span class=\"x\"",
            "stray > and < signs",
            "<<nested>>",
            "<a href='x'>link</a><br/>",
            "&lt;escaped&gt;",
        ];
        for input in inputs {
            let out = strip_markup(input);
            assert!(!out.contains('<') && !out.contains('>'), "{input:?} -> {out:?}");
        }
    }

    #[test]
    fn test_strip_empty() {
        assert_eq!(strip_markup(""), "");
    }

    #[test]
    fn test_truncate_short_is_untouched() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_long_respects_limit_and_marker() {
        for limit in [4, 10, 50, 100, 1024] {
            let input = "word ".repeat(500);
            let out = truncate(&input, limit);
            assert!(out.chars().count() <= limit, "limit {limit}: {}", out.len());
            assert!(out.ends_with(TRUNCATION_MARKER));
        }
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let hebrew = "בראשית ברא אלהים את השמים ואת הארץ";
        let out = truncate(hebrew, 10);
        assert!(out.chars().count() <= 10);
        assert!(out.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncate_tiny_limit() {
        assert_eq!(truncate("abcdef", 2), "..");
        assert_eq!(truncate("abcdef", 0), "");
    }

    #[test]
    fn test_bilingual_orders_hebrew_first() {
        assert_eq!(format_bilingual("שלום", "peace"), "שלום\n\npeace");
        assert_eq!(format_bilingual("", "peace"), "peace");
        assert_eq!(format_bilingual("שלום", "  "), "שלום");
        assert_eq!(format_bilingual("", ""), "");
    }

    #[test]
    fn test_passage_hebrew_only() {
        let out = format_passage(
            Some("בְּרֵאשִׁית"),
            Some("In the beginning"),
            Language::Hebrew,
            EMBED_DESCRIPTION_LIMIT,
        );
        assert_eq!(out, "בְּרֵאשִׁית");
        assert!(!out.contains("beginning"));
    }

    #[test]
    fn test_passage_english_missing() {
        let out = format_passage(Some("שלום"), None, Language::English, 100);
        assert!(out.contains("No English"));
    }

    #[test]
    fn test_passage_strips_and_truncates() {
        let long = format!("<b>{}</b>", "x".repeat(5000));
        let out = format_passage(None, Some(&long), Language::Both, EMBED_DESCRIPTION_LIMIT);
        assert!(out.chars().count() <= EMBED_DESCRIPTION_LIMIT);
        assert!(!out.contains('<'));
    }

    #[test]
    fn test_language_parse() {
        assert_eq!(Language::parse(None).unwrap(), Language::Both);
        assert_eq!(Language::parse(Some("  ")).unwrap(), Language::Both);
        assert_eq!(Language::parse(Some("Hebrew")).unwrap(), Language::Hebrew);
        assert_eq!(Language::parse(Some("ENGLISH")).unwrap(), Language::English);
        let err = Language::parse(Some("aramaic")).unwrap_err();
        assert!(err.message.contains("aramaic"));
        assert!(err.message.contains("hebrew, english, both"));
    }
}
