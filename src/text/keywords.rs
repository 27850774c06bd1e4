// Keyword extraction by term frequency.
//
// Splits lower-cased text on word boundaries, keeps alphabetic tokens longer
// than two characters that aren't English stop words, and ranks them by how
// often they occur. Ties keep first-seen order so output is deterministic.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use stop_words::{get, LANGUAGE};

/// Default number of keywords kept per incident.
pub const DEFAULT_TOP_N: usize = 5;

pub struct KeywordExtractor {
    stop_words: HashSet<String>,
    word: Regex,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordExtractor {
    /// Build an extractor with the English stop word list.
    pub fn new() -> Self {
        let stop_words: HashSet<String> = get(LANGUAGE::English)
            .into_iter()
            .map(|w| w.to_lowercase())
            .collect();
        Self::with_stop_words(stop_words)
    }

    pub fn with_stop_words(stop_words: HashSet<String>) -> Self {
        Self {
            stop_words,
            // Unicode letters, digits and underscores; hyphens and punctuation split words.
            word: Regex::new(r"\w+").expect("static word pattern is valid"),
        }
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Extract at most `top_n` keywords, most frequent first.
    pub fn extract(&self, text: &str, top_n: usize) -> Vec<String> {
        if top_n == 0 {
            return Vec::new();
        }

        let lower = text.to_lowercase();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();

        for m in self.word.find_iter(&lower) {
            let token = m.as_str();
            if !self.keep(token) {
                continue;
            }
            let count = counts.entry(token).or_insert(0);
            if *count == 0 {
                order.push(token);
            }
            *count += 1;
        }

        // Stable sort: equal counts stay in first-seen order.
        let mut ranked: Vec<(&str, usize)> = order.into_iter().map(|t| (t, counts[t])).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        ranked
            .into_iter()
            .take(top_n)
            .map(|(t, _)| t.to_string())
            .collect()
    }

    fn keep(&self, token: &str) -> bool {
        token.chars().count() > 2
            && token.chars().all(char::is_alphabetic)
            && !self.stop_words.contains(token)
    }
}
