//! Line classification: heading, key-value, list item or paragraph.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::config::StructureConfig;
use crate::models::layout::TextLine;

lazy_static! {
    static ref LIST_MARKER: Regex = Regex::new(r"^\s*(?:[•\-*]|\d+[.)])\s+").unwrap();
}

/// Role of one line within its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineTag {
    Heading,
    KeyValue,
    ListItem,
    Paragraph,
}

/// Tags lines using length, case and font cues.
///
/// Rules are tried in order and the first match wins:
/// heading, then key-value, then list item, then paragraph.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    max_heading_length: usize,
    min_uppercase_length: usize,
    heading_font_size: f32,
}

impl LineClassifier {
    pub fn new() -> Self {
        Self::from_config(&StructureConfig::default())
    }

    pub fn from_config(config: &StructureConfig) -> Self {
        Self {
            max_heading_length: config.max_heading_length,
            min_uppercase_length: config.min_uppercase_heading_length,
            heading_font_size: config.heading_font_size,
        }
    }

    /// Classify one line.
    pub fn classify(&self, line: &TextLine) -> LineTag {
        let text = line.text.trim();

        if self.is_heading(text, line.font_size, line.is_bold) {
            LineTag::Heading
        } else if is_key_value(text) {
            LineTag::KeyValue
        } else if is_list_item(text) {
            LineTag::ListItem
        } else {
            LineTag::Paragraph
        }
    }

    /// Heading test on already trimmed text.
    pub fn is_heading(&self, text: &str, font_size: Option<f32>, is_bold: bool) -> bool {
        let len = text.chars().count();
        if len == 0 || len >= self.max_heading_length {
            return false;
        }

        (is_upper(text) && len > self.min_uppercase_length)
            || is_bold
            || font_size.is_some_and(|size| size > self.heading_font_size)
    }
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// At least one cased character and no lower-case one.
fn is_upper(text: &str) -> bool {
    let mut has_cased = false;
    for ch in text.chars() {
        if ch.is_lowercase() {
            return false;
        }
        if ch.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

fn is_key_value(text: &str) -> bool {
    text.contains(':') || text.contains(" - ") || text.contains('→')
}

fn is_list_item(text: &str) -> bool {
    LIST_MARKER.is_match(text) || text.starts_with("- ") || text.starts_with('•')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn classify(line: TextLine) -> LineTag {
        LineClassifier::new().classify(&line)
    }

    #[test]
    fn test_uppercase_heading() {
        assert_eq!(classify(TextLine::plain("PROJECT DETAILS")), LineTag::Heading);
        // Too short to count on case alone.
        assert_eq!(classify(TextLine::plain("ABC")), LineTag::Paragraph);
        assert_eq!(classify(TextLine::plain("ABCD")), LineTag::Heading);
        assert_eq!(classify(TextLine::plain("1234 5678")), LineTag::Paragraph);
    }

    #[test]
    fn test_font_cues() {
        assert_eq!(classify(TextLine::plain("Overview").bold()), LineTag::Heading);
        assert_eq!(
            classify(TextLine::plain("Overview").with_font_size(14.0)),
            LineTag::Heading
        );
        assert_eq!(
            classify(TextLine::plain("Overview").with_font_size(12.0)),
            LineTag::Paragraph
        );
    }

    #[test]
    fn test_long_lines_are_never_headings() {
        let long = "A".repeat(80);
        assert_eq!(classify(TextLine::plain(long.clone()).bold()), LineTag::Paragraph);
        let almost = "A".repeat(79);
        assert_eq!(classify(TextLine::plain(almost)), LineTag::Heading);
    }

    #[test]
    fn test_heading_beats_key_value() {
        assert_eq!(classify(TextLine::plain("DISTRICT: MYSURU")), LineTag::Heading);
        assert_eq!(classify(TextLine::plain("District: Mysuru")), LineTag::KeyValue);
    }

    #[test]
    fn test_key_value_markers() {
        assert_eq!(classify(TextLine::plain("Taluk - Hunsur")), LineTag::KeyValue);
        assert_eq!(classify(TextLine::plain("Phase → 2")), LineTag::KeyValue);
        assert_eq!(classify(TextLine::plain("well-drained soil")), LineTag::Paragraph);
    }

    #[test]
    fn test_list_items() {
        assert_eq!(classify(TextLine::plain("• Drainage")), LineTag::ListItem);
        assert_eq!(classify(TextLine::plain("1. Water supply")), LineTag::ListItem);
        assert_eq!(classify(TextLine::plain("12. Roads")), LineTag::ListItem);
        assert_eq!(classify(TextLine::plain("3) Parks")), LineTag::ListItem);
        // A bare number is not a marker.
        assert_eq!(classify(TextLine::plain("1 Water supply")), LineTag::Paragraph);
        assert_eq!(classify(TextLine::plain("* Street lights")), LineTag::ListItem);
        assert_eq!(classify(TextLine::plain("•Parks")), LineTag::ListItem);
        // A dash list item with " - " elsewhere is a key-value line first.
        assert_eq!(classify(TextLine::plain("- Roads - paved")), LineTag::KeyValue);
    }

    #[test]
    fn test_thresholds_from_config() {
        let config = StructureConfig {
            heading_font_size: 16.0,
            ..Default::default()
        };
        let classifier = LineClassifier::from_config(&config);
        let line = TextLine::plain("Overview").with_font_size(14.0);
        assert_eq!(classifier.classify(&line), LineTag::Paragraph);
    }
}
