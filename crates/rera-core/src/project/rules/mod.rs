//! Rule-based field resolution for RERA project documents.

pub mod coordinates;
pub mod numbers;
pub mod patterns;
pub mod plots;

pub use coordinates::{CoordinateResolver, ResolvedCoordinates};
pub use numbers::{clean_text, extract_date, extract_float, extract_number, DateExtractor};
pub use plots::{extract_plot_types, extract_plots, TableRole};

use std::fmt;

use crate::models::project::CoordinateSource;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSource {
    /// A key-value pair with this key.
    KeyValue(String),
    /// An anchored pattern over the document body.
    Text,
    /// Content of the section with this key.
    Section(String),
    /// Derived from the source file name.
    Filename,
    /// Rows of header-bearing tables.
    Table,
    /// The coordinate resolver.
    Coordinates(CoordinateSource),
}

impl fmt::Display for FieldSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSource::KeyValue(key) => write!(f, "key_value:{key}"),
            FieldSource::Text => f.write_str("text"),
            FieldSource::Section(key) => write!(f, "section:{key}"),
            FieldSource::Filename => f.write_str("filename"),
            FieldSource::Table => f.write_str("table"),
            FieldSource::Coordinates(source) => write!(f, "coordinates:{source}"),
        }
    }
}

/// A value together with the source that produced it.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Where the value came from.
    pub source: FieldSource,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: FieldSource) -> Self {
        Self {
            value,
            source,
            position: None,
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}
