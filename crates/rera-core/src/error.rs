//! Error types for the rera-core library.

use thiserror::Error;

/// Main error type for the rera library.
#[derive(Error, Debug)]
pub enum ReraError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Structurally impossible input handed to the assembler.
    #[error("structure error: {0}")]
    Structure(#[from] StructureError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Input the assembler cannot interpret without losing section identity.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StructureError {
    /// Pages must arrive in strictly increasing page-number order.
    #[error("page {got} received after page {previous}")]
    PageOrder { previous: u32, got: u32 },

    /// Two tables claim the same (page, index) identity.
    #[error("duplicate table {table_index} on page {page_number}")]
    DuplicateTable { page_number: u32, table_index: usize },
}

/// Result type for the rera library.
pub type Result<T> = std::result::Result<T, ReraError>;
