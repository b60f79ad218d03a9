//! Prompt detection heuristics.
//!
//! Scans accumulated process output for substrings that look like requests
//! for one line of input ("Enter your name: ", "Continue? (y/n)", "sftp> ").
//! Line-oriented output is full of colon- and question-mark-terminated text
//! that is *not* a prompt (log lines, URLs, help text), so the classifier
//! favors precision over recall: a missed prompt costs a timeout or a wrong
//! auto-answer, while a false positive would spuriously suspend an
//! otherwise-automatable command.

use once_cell::sync::Lazy;
use regex::Regex;

/// How far back from the already-scanned offset a scan pass re-examines,
/// to catch prompts split across buffer-append boundaries.
const LOOK_BACK_CHARS: usize = 200;

/// Maximum length of a cleaned prompt label.
const MAX_LABEL_CHARS: usize = 40;

/// A label of 1-61 printable, non-quote-leading characters that does not end
/// in a quote or open-paren, immediately followed by `:`, `?` or `>`, with an
/// optional parenthesized default-value hint after the punctuation.
static PROMPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([^\s"'\n](?:[^\n]{0,59}?[^\s"'(\n])?)([:?>])[ \t]*(\([^()\n]{1,40}\))?"#)
        .expect("prompt pattern is valid")
});

static TEST_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^test \d+$").expect("test pattern is valid"));

static MULTI_SPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}").expect("space pattern is valid"));

/// One candidate prompt found in an output buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMatch {
    /// Raw captured label, before cleanup.
    pub raw_label: String,
    /// The terminating punctuation (`:`, `?` or `>`).
    pub punctuation: char,
    /// Parenthesized default-value hint, if present (e.g. `(y/n)`).
    pub default_hint: Option<String>,
    /// End offset of the whole match within the scanned buffer.
    pub match_end: usize,
}

impl PromptMatch {
    /// The full prompt text as shown to a caller: label, punctuation, and
    /// the default hint when one was printed.
    pub fn prompt_text(&self, label: &str) -> String {
        match &self.default_hint {
            Some(hint) => format!("{}{} {}", label, self.punctuation, hint),
            None => format!("{}{}", label, self.punctuation),
        }
    }
}

/// Scan `buffer` for prompt candidates, starting a small look-back window
/// before `from_offset`. Matches ending at or before `from_offset` were
/// already examined by a previous pass and are discarded, so re-scanning the
/// same buffer from the same offset yields nothing new.
pub fn scan(buffer: &str, from_offset: usize) -> Vec<PromptMatch> {
    let mut start = from_offset.saturating_sub(LOOK_BACK_CHARS).min(buffer.len());
    while !buffer.is_char_boundary(start) {
        start -= 1;
    }

    let mut matches = Vec::new();
    for caps in PROMPT_RE.captures_iter(&buffer[start..]) {
        let whole = caps.get(0).expect("group 0 always present");
        let match_end = start + whole.end();
        if match_end <= from_offset {
            continue;
        }
        let punctuation = caps
            .get(2)
            .and_then(|m| m.as_str().chars().next())
            .unwrap_or(':');
        matches.push(PromptMatch {
            raw_label: caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
            punctuation,
            default_hint: caps.get(3).map(|m| m.as_str().to_string()),
            match_end,
        });
    }
    matches
}

/// Decide whether a cleaned label plausibly names an input prompt.
pub fn is_prompt_label(label: &str) -> bool {
    let trimmed = label.trim();
    let len = trimmed.chars().count();
    if !(2..=MAX_LABEL_CHARS).contains(&len) {
        return false;
    }

    let lower = trimmed.to_lowercase();
    if TEST_LINE_RE.is_match(&lower) || lower.starts_with("test ") {
        return false;
    }

    // Log preambles that end in prompt punctuation but never await input.
    if lower.contains("about to write to")
        || lower.contains("press ^c")
        || lower.contains("see `")
        || lower.contains("use `")
    {
        return false;
    }

    // Paths are diagnostics, not questions.
    if trimmed.contains('/') || trimmed.contains('\\') {
        return false;
    }

    true
}

/// Clean a raw captured label: strip the echoed last response when it bled
/// into the same line, drop a trailing parenthesized section, keep only the
/// last segment after runs of two or more spaces (leading log-prefix text),
/// and cap the result at 40 characters.
pub fn clean_prompt_label(raw: &str, last_response: &str) -> String {
    let mut label = raw.trim().to_string();

    if !last_response.is_empty() {
        if let Some(pos) = label.rfind(last_response) {
            label = label[pos + last_response.len()..].trim().to_string();
        }
    }

    if let Some(pos) = label.find('(') {
        label.truncate(pos);
        label = label.trim_end().to_string();
    }

    if let Some(segment) = MULTI_SPACE_RE.split(&label).filter(|s| !s.is_empty()).last() {
        label = segment.to_string();
    }

    if label.chars().count() > MAX_LABEL_CHARS {
        label = label.chars().take(MAX_LABEL_CHARS).collect();
    }

    label.trim().to_string()
}

/// Normalize a label or prompt line for keyed lookup: collapse whitespace
/// runs to single spaces, trim, lower-case. Applied identically when building
/// a response map and when matching against prompt text.
pub fn normalize_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn last_valid_label(buffer: &str) -> Option<String> {
        scan(buffer, 0)
            .into_iter()
            .rev()
            .map(|m| clean_prompt_label(&m.raw_label, ""))
            .find(|label| is_prompt_label(label))
    }

    #[test]
    fn test_detects_question_prompt() {
        let matches = scan("What is your name? ", 0);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].raw_label, "What is your name");
        assert_eq!(matches[0].punctuation, '?');
    }

    #[test]
    fn test_detects_colon_prompt_with_hint() {
        let matches = scan("Continue? (y/n)", 0);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].punctuation, '?');
        assert_eq!(matches[0].default_hint.as_deref(), Some("(y/n)"));
        let label = clean_prompt_label(&matches[0].raw_label, "");
        assert_eq!(matches[0].prompt_text(&label), "Continue? (y/n)");
    }

    #[test]
    fn test_already_scanned_matches_are_discarded() {
        let buffer = "Enter your name: ";
        let matches = scan(buffer, buffer.len());
        assert!(matches.is_empty(), "re-scan from the end must find nothing");
    }

    #[test]
    fn test_rightmost_match_wins() {
        let buffer = "Step 1 done: ok\nEnter password: ";
        assert_eq!(last_valid_label(buffer).as_deref(), Some("Enter password"));
    }

    #[test]
    fn test_rejects_log_preamble() {
        assert_eq!(last_valid_label("About to write to disk:"), None);
    }

    #[test]
    fn test_rejects_test_lines() {
        assert!(!is_prompt_label("test 12"));
        assert!(!is_prompt_label("test harness starting"));
    }

    #[test]
    fn test_rejects_paths_and_short_labels() {
        assert!(!is_prompt_label("/usr/bin/env"));
        assert!(!is_prompt_label("C:\\Users"));
        assert!(!is_prompt_label(">"));
        assert!(!is_prompt_label(""));
    }

    #[test]
    fn test_rejects_overlong_labels() {
        let label = "x".repeat(41);
        assert!(!is_prompt_label(&label));
    }

    #[test]
    fn test_clean_strips_echoed_response() {
        let cleaned = clean_prompt_label("Alice Enter password", "Alice");
        assert_eq!(cleaned, "Enter password");
    }

    #[test]
    fn test_clean_truncates_at_paren() {
        assert_eq!(clean_prompt_label("Continue (y/n", ""), "Continue");
    }

    #[test]
    fn test_clean_keeps_last_segment_after_space_runs() {
        assert_eq!(
            clean_prompt_label("2024-01-01 12:00  INFO  Enter value", ""),
            "Enter value"
        );
    }

    #[test]
    fn test_look_back_catches_split_prompt() {
        // A prompt whose tail arrived in a later chunk: the scan offset sits
        // in the middle of the prompt, but the look-back window recovers it.
        let buffer = "building...\nEnter your name: ";
        let mid = buffer.len() - 6;
        let matches = scan(buffer, mid);
        assert!(matches.iter().any(|m| m.raw_label == "Enter your name"));
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  Enter   Your Name "), "enter your name");
    }
}
