//! Text cleanup and number/date parsing.

use chrono::NaiveDate;

use super::patterns::{DATE_DMY, DECIMAL, INTEGER, WHITESPACE};
use super::{ExtractionMatch, FieldExtractor, FieldSource};

/// Collapse whitespace runs into single spaces and trim.
pub fn clean_text(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// First run of digits, ignoring thousands separators.
pub fn extract_number(text: &str) -> Option<u64> {
    let text = text.replace(',', "");
    INTEGER.captures(&text).and_then(|caps| caps[1].parse().ok())
}

/// First run of digits and dots, parsed as a float.
pub fn extract_float(text: &str) -> Option<f64> {
    DECIMAL.captures(text).and_then(|caps| caps[1].parse().ok())
}

/// First real calendar date written as DD-MM-YYYY.
pub fn extract_date(text: &str) -> Option<String> {
    DateExtractor::new().extract(text).map(|m| m.value)
}

/// Check a DD-MM-YYYY string against the calendar.
pub fn is_valid_date(date: &str) -> bool {
    NaiveDate::parse_from_str(date, "%d-%m-%Y").is_ok()
}

/// Extracts DD-MM-YYYY dates, skipping impossible ones such as `00-00-0000`.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        DATE_DMY
            .find_iter(text)
            .filter(|m| is_valid_date(m.as_str()))
            .map(|m| {
                ExtractionMatch::new(m.as_str().to_string(), FieldSource::Text)
                    .with_position(m.start(), m.end())
            })
            .collect()
    }
}
