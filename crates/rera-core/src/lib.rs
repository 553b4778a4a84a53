//! Core library for RERA Karnataka project document processing.
//!
//! This crate provides:
//! - PDF text-layer extraction into positioned lines
//! - Adaptive structuring of lines and tables into a hierarchical document
//! - Project field resolution (identifiers, dates, areas, costs, coordinates, plots)

pub mod error;
pub mod models;
pub mod pdf;
pub mod project;
pub mod structure;

pub use error::{ReraError, Result};
pub use models::config::ReraConfig;
pub use models::document::{DocumentRecord, Section, SectionMap, Table};
pub use models::layout::{ExtractedLayout, PageLines, RawTable, TextLine};
pub use models::project::{CoordinateSource, Plot, PlotType, ProjectRecord};
pub use pdf::{PdfExtractor, PdfProcessor, PdfType};
pub use project::{ExtractionResult, ProjectExtractor, ProjectParser};
pub use structure::{DocumentAssembler, assemble};
