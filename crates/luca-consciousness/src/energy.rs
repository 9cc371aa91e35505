//! Energy classifier: lexical markers -> HIGH / LOW / BALANCED.

use crate::config::EnergyConfig;
use luca_core::{EnergyState, Error, Result};
use regex::Regex;
use serde::Serialize;

/// Marker counts for one message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnergyScore {
    pub high: u32,
    pub low: u32,
}

impl EnergyScore {
    /// Both sides at threshold resolves to BALANCED so ambiguous input never flips.
    pub fn classify(&self, threshold: u32) -> EnergyState {
        let high_hit = self.high >= threshold;
        let low_hit = self.low >= threshold;
        match (high_hit, low_hit) {
            (true, true) => EnergyState::Balanced,
            (true, false) if self.high > self.low => EnergyState::High,
            (false, true) if self.low > self.high => EnergyState::Low,
            _ => EnergyState::Balanced,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnergyClassifier {
    threshold: u32,
    long_message_chars: usize,
    short_message_chars: usize,
    exclaim_run: Regex,
    ellipsis: Regex,
    high_keywords: Vec<Regex>,
    low_keywords: Vec<Regex>,
    high_emoji: Vec<String>,
}

impl EnergyClassifier {
    pub fn new(config: &EnergyConfig) -> Result<Self> {
        Ok(Self {
            threshold: config.threshold,
            long_message_chars: config.long_message_chars,
            short_message_chars: config.short_message_chars,
            exclaim_run: compile(r"!{3,}")?,
            ellipsis: compile(r"\.{3}|…")?,
            high_keywords: keyword_patterns(&config.high_keywords)?,
            low_keywords: keyword_patterns(&config.low_keywords)?,
            high_emoji: config.high_emoji.iter().filter(|e| !e.is_empty()).cloned().collect(),
        })
    }

    pub fn detect(&self, text: &str) -> EnergyState {
        self.score(text).classify(self.threshold)
    }

    pub fn score(&self, text: &str) -> EnergyScore {
        if text.is_empty() {
            return EnergyScore::default();
        }
        let chars = text.chars().count();

        let mut high = 0;
        high += self.exclaim_run.is_match(text) as u32;
        high += self.high_emoji.iter().any(|e| text.contains(e.as_str())) as u32;
        high += (chars > self.long_message_chars) as u32;
        high += is_shouting(text) as u32;
        high += self.high_keywords.iter().filter(|re| re.is_match(text)).count() as u32;

        let mut low = 0;
        low += (chars < self.short_message_chars) as u32;
        low += self.ellipsis.is_match(text) as u32;
        low += self.low_keywords.iter().filter(|re| re.is_match(text)).count() as u32;

        EnergyScore { high, low }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::config(format!("bad energy marker {:?}: {}", pattern, e)))
}

fn keyword_patterns(keywords: &[String]) -> Result<Vec<Regex>> {
    keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(|k| compile(&keyword_pattern(k)))
        .collect()
}

/// Case-insensitive match with a word boundary on each side that starts or ends
/// with a word character, so punctuation keywords like `!!` still match.
fn keyword_pattern(keyword: &str) -> String {
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let lead = if is_word(keyword.chars().next()) { r"\b" } else { "" };
    let tail = if is_word(keyword.chars().last()) { r"\b" } else { "" };
    format!("(?i){}{}{}", lead, regex::escape(keyword), tail)
}

/// At least one cased letter and no lower-case letters.
fn is_shouting(text: &str) -> bool {
    let mut cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        cased |= c.is_uppercase();
    }
    cased
}
