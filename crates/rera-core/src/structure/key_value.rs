//! Key-value extraction from a single line.

use lazy_static::lazy_static;
use regex::Regex;

use super::normalize::pair_key;

lazy_static! {
    /// `key : value`, split at the first colon.
    static ref COLON_PAIR: Regex = Regex::new(r"([^:\n]+?)\s*:\s*([^\n]+?)$").unwrap();

    /// `key - value`, hyphen surrounded by whitespace; the key has no hyphen.
    static ref DASH_PAIR: Regex = Regex::new(r"([^-\n]+?)\s+-\s+([^\n]+?)$").unwrap();
}

/// Splits lines into normalized key and trimmed value.
#[derive(Debug, Clone)]
pub struct KeyValueExtractor {
    max_key_length: usize,
}

impl KeyValueExtractor {
    pub fn new() -> Self {
        Self { max_key_length: 100 }
    }

    /// Discard keys of `len` or more characters before normalization.
    pub fn with_max_key_length(mut self, len: usize) -> Self {
        self.max_key_length = len;
        self
    }

    /// Pairs found on `line`, in discovery order, keys unique.
    pub fn extract(&self, line: &str) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = Vec::new();

        if let Some(caps) = COLON_PAIR.captures(line) {
            if let Some(pair) = self.accept(&caps[1], &caps[2]) {
                pairs.push(pair);
            }
        }

        for caps in DASH_PAIR.captures_iter(line) {
            if let Some((key, value)) = self.accept(&caps[1], &caps[2]) {
                if !pairs.iter().any(|(k, _)| *k == key) {
                    pairs.push((key, value));
                }
            }
        }

        pairs
    }

    fn accept(&self, raw_key: &str, raw_value: &str) -> Option<(String, String)> {
        let key = raw_key.trim();
        let value = raw_value.trim();
        if key.is_empty() || value.is_empty() || key.chars().count() >= self.max_key_length {
            return None;
        }
        pair_key(key).map(|k| (k, value.to_string()))
    }
}

impl Default for KeyValueExtractor {
    fn default() -> Self {
        Self::new()
    }
}
