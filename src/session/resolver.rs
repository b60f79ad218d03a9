//! Auto-response resolution.
//!
//! A caller supplies a plan for answering prompts: either an ordered queue
//! consumed front-to-back, or a keyed lookup table matched against the
//! normalized prompt line. The two algorithms are modeled as an explicit
//! tagged variant so each can be tested in isolation; no runtime type
//! inspection is involved. A `None` resolution is not an error - it forces
//! the session to suspend and wait for a human answer.

use std::collections::HashMap;

use super::scanner::normalize_key;

/// Caller-supplied plan for auto-answering prompts.
#[derive(Debug, Clone)]
pub enum ResponseSource {
    /// Ordered answers, consumed front-to-back.
    Queue { items: Vec<String>, next: usize },
    /// Normalized key → answer. `"*"` and `"default"` act as fallbacks.
    Keyed(HashMap<String, String>),
}

impl ResponseSource {
    pub fn queue(items: Vec<String>) -> Self {
        Self::Queue { items, next: 0 }
    }

    /// Build a keyed source. Keys are normalized (whitespace-collapsed,
    /// lower-cased) so lookups are case- and spacing-insensitive.
    pub fn keyed(map: HashMap<String, String>) -> Self {
        Self::Keyed(
            map.into_iter()
                .map(|(k, v)| (normalize_key(&k), v))
                .collect(),
        )
    }

    /// Resolve an answer for a detected prompt.
    ///
    /// `repeat_count` is the number of consecutive times this same prompt has
    /// reappeared; in queue mode a repeat (up to two) resends the previous
    /// response instead of consuming the next one, which handles prompts that
    /// redraw without a state change (a spinner tick before settling).
    pub fn resolve(
        &mut self,
        prompt_key: &str,
        prompt_text: &str,
        repeat_count: u32,
        last_response: Option<&str>,
    ) -> Option<String> {
        match self {
            Self::Keyed(map) => {
                if let Some(value) = map.get(prompt_key) {
                    return Some(value.clone());
                }

                let line = normalize_key(prompt_text);
                let mut best: Option<(&String, &String)> = None;
                for (key, value) in map.iter() {
                    if key == "*" || key == "default" {
                        continue;
                    }
                    if line.contains(key.as_str())
                        && best.is_none_or(|(b, _)| key.len() > b.len())
                    {
                        best = Some((key, value));
                    }
                }

                best.map(|(_, value)| value.clone())
                    .or_else(|| map.get("*").cloned())
                    .or_else(|| map.get("default").cloned())
            }
            Self::Queue { items, next } => {
                if (1..=2).contains(&repeat_count) {
                    if let Some(last) = last_response {
                        return Some(last.to_string());
                    }
                }
                if *next < items.len() {
                    let value = items[*next].clone();
                    *next += 1;
                    Some(value)
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed(pairs: &[(&str, &str)]) -> ResponseSource {
        ResponseSource::keyed(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_keyed_exact_match() {
        let mut source = keyed(&[("enter your name", "Alice")]);
        assert_eq!(
            source.resolve("enter your name", "Enter your name:", 0, None),
            Some("Alice".to_string())
        );
    }

    #[test]
    fn test_keyed_substring_match_ignores_case_and_spacing() {
        let mut source = keyed(&[("name", "Alice")]);
        assert_eq!(
            source.resolve("enter your name", "Enter  your Name: ", 0, None),
            Some("Alice".to_string())
        );
    }

    #[test]
    fn test_keyed_longest_substring_wins() {
        let mut source = keyed(&[("name", "short"), ("your name", "long")]);
        assert_eq!(
            source.resolve("enter your name", "Enter your name:", 0, None),
            Some("long".to_string())
        );
    }

    #[test]
    fn test_keyed_wildcard_then_default_fallback() {
        let mut source = keyed(&[("*", "anything")]);
        assert_eq!(
            source.resolve("password", "Password:", 0, None),
            Some("anything".to_string())
        );

        let mut source = keyed(&[("default", "fallback")]);
        assert_eq!(
            source.resolve("password", "Password:", 0, None),
            Some("fallback".to_string())
        );
    }

    #[test]
    fn test_keyed_no_match_is_none() {
        let mut source = keyed(&[("name", "Alice")]);
        assert_eq!(source.resolve("password", "Password:", 0, None), None);
    }

    #[test]
    fn test_queue_pops_in_order_then_exhausts() {
        let mut source = ResponseSource::queue(vec!["a".into(), "b".into()]);
        assert_eq!(source.resolve("k", "t", 0, None), Some("a".to_string()));
        assert_eq!(source.resolve("k2", "t2", 0, Some("a")), Some("b".to_string()));
        assert_eq!(source.resolve("k3", "t3", 0, Some("b")), None);
    }

    #[test]
    fn test_queue_repeat_resends_without_advancing() {
        let mut source = ResponseSource::queue(vec!["y".into()]);
        assert_eq!(source.resolve("continue", "Continue? (y/n)", 0, None), Some("y".to_string()));
        // The same prompt redrawn twice: resend, do not advance.
        assert_eq!(
            source.resolve("continue", "Continue? (y/n)", 1, Some("y")),
            Some("y".to_string())
        );
        assert_eq!(
            source.resolve("continue", "Continue? (y/n)", 2, Some("y")),
            Some("y".to_string())
        );
        // A third repeat exceeds the gate and the queue is exhausted.
        assert_eq!(source.resolve("continue", "Continue? (y/n)", 3, Some("y")), None);
    }

    #[test]
    fn test_queue_empty_string_is_a_valid_answer() {
        let mut source = ResponseSource::queue(vec!["".into()]);
        assert_eq!(source.resolve("city", "City:", 0, None), Some(String::new()));
        // An empty last response still counts for repeat resending.
        assert_eq!(source.resolve("city", "City:", 1, Some("")), Some(String::new()));
    }
}
