//! Wake-word detection and transcript cleanup.

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref GREETING_PREFIX: Regex = Regex::new(r"^(hey|okay|hello|hi)\s+").unwrap();
}

/// A compiled wake word.
#[derive(Debug, Clone)]
pub struct WakeWord {
    word: String,
    pattern: Regex,
}

impl WakeWord {
    /// Compile `word` as a case-insensitive whole-word pattern.
    ///
    /// Multi-word wake words match across any run of whitespace.
    pub fn new(word: &str) -> Result<Self> {
        let word = word.trim().to_lowercase();
        if word.is_empty() {
            anyhow::bail!("Wake word must not be empty");
        }

        let body = word
            .split_whitespace()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\s+");
        let pattern = Regex::new(&format!(r"(?i)\b{body}\b"))
            .with_context(|| format!("Invalid wake word: {word}"))?;

        Ok(Self { word, pattern })
    }

    pub fn as_str(&self) -> &str {
        &self.word
    }

    /// True when the wake word occurs as a whole word. This also covers the
    /// greeting variants ("hey computer", "okay computer").
    pub fn detect(&self, transcript: &str) -> bool {
        self.pattern.is_match(transcript)
    }

    /// Strip every wake word occurrence, then one leading greeting, then
    /// surrounding whitespace. The result may be empty.
    pub fn normalize(&self, transcript: &str) -> String {
        let lowered = transcript.to_lowercase();
        let without_wake = self.pattern.replace_all(&lowered, " ");
        let trimmed = without_wake.trim();
        let without_greeting = GREETING_PREFIX.replace(trimmed, "");

        without_greeting.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// One-shot helper around [`WakeWord::normalize`].
pub fn normalize(transcript: &str, wake_word: &str) -> Result<String> {
    Ok(WakeWord::new(wake_word)?.normalize(transcript))
}

/// One-shot helper around [`WakeWord::detect`].
pub fn contains_wake_word(transcript: &str, wake_word: &str) -> Result<bool> {
    Ok(WakeWord::new(wake_word)?.detect(transcript))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn computer() -> WakeWord {
        WakeWord::new("computer").unwrap()
    }

    #[test]
    fn test_strips_leading_wake_word() {
        assert_eq!(computer().normalize("computer play the one"), "play the one");
    }

    #[test]
    fn test_strips_greeting_after_wake_word_removed() {
        assert_eq!(computer().normalize("hey computer next song"), "next song");
        assert_eq!(computer().normalize("Okay Computer, pause"), ", pause");
        assert_eq!(computer().normalize("hi computer   volume up"), "volume up");
    }

    #[test]
    fn test_only_one_greeting_stripped() {
        assert_eq!(computer().normalize("hey hello there"), "hello there");
    }

    #[test]
    fn test_bare_greeting_is_kept() {
        assert_eq!(computer().normalize("hey computer"), "hey");
        assert_eq!(computer().normalize("hello"), "hello");
    }

    #[test]
    fn test_wake_word_only_gives_empty() {
        assert_eq!(computer().normalize("computer"), "");
        assert_eq!(computer().normalize("  COMPUTER  computer "), "");
    }

    #[test]
    fn test_wake_word_inside_other_word_is_kept() {
        assert_eq!(computer().normalize("play computerworld"), "play computerworld");
        assert!(!computer().detect("play computerworld"));
    }

    #[test]
    fn test_detect_variants() {
        let wake = computer();
        assert!(wake.detect("computer"));
        assert!(wake.detect("hey computer"));
        assert!(wake.detect("OK so Computer please"));
        assert!(!wake.detect("commuter"));
        assert!(!wake.detect(""));
    }

    #[test]
    fn test_multi_word_wake_word() {
        let wake = WakeWord::new("Hey Muse").unwrap();
        assert!(wake.detect("hey   muse play"));
        assert_eq!(wake.normalize("hey muse play jazz"), "play jazz");
    }

    #[test]
    fn test_wake_word_with_regex_chars() {
        let wake = WakeWord::new("c.3po").unwrap();
        assert!(wake.detect("c.3po next"));
        assert!(!wake.detect("cx3po next"));
    }

    #[test]
    fn test_empty_wake_word_rejected() {
        assert!(WakeWord::new("  ").is_err());
    }

    #[test]
    fn test_free_function() {
        assert_eq!(normalize("computer play the one", "computer").unwrap(), "play the one");
        assert!(contains_wake_word("okay computer", "computer").unwrap());
    }
}
