//! Project field resolution over structured documents.

mod parser;
pub mod rules;

pub use parser::{ExtractionResult, ProjectParser};

use crate::models::document::DocumentRecord;
use crate::models::project::ProjectRecord;

/// Trait for project field extractors.
///
/// Extraction never fails: fields without a usable source take their
/// defaults and are reported as warnings.
pub trait ProjectExtractor {
    /// Resolve every field, with provenance and warnings.
    fn parse(&self, document: &DocumentRecord) -> ExtractionResult;

    /// Resolve every field.
    fn extract(&self, document: &DocumentRecord) -> ProjectRecord {
        self.parse(document).project
    }
}
