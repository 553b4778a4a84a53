//! PDF text layer: positioned lines read from page content streams.

mod extractor;
mod text;

pub use extractor::PdfExtractor;

use crate::error::PdfError;
use crate::models::layout::{ExtractedLayout, PageLines};

/// Type of PDF content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfType {
    /// Contains extractable text.
    Text,
    /// Image-only pages with no usable text layer.
    Scanned,
    /// Neither text nor images.
    Empty,
}

impl PdfType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfType::Text => "text",
            PdfType::Scanned => "scanned",
            PdfType::Empty => "empty",
        }
    }
}

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Analyze the PDF to determine its type.
    fn analyze(&self) -> PdfType;

    /// Extract plain text from a specific page.
    fn extract_page_text(&self, page: u32) -> Result<String>;

    /// Extract positioned lines from a specific page.
    fn extract_page_lines(&self, page: u32) -> Result<PageLines>;

    /// Extract the layout of the whole document.
    fn extract_layout(&self, source_file: &str) -> Result<ExtractedLayout>;
}
