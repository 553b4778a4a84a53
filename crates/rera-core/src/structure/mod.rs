//! Adaptive structuring of positioned text into sections, pairs, lists and tables.

mod assembler;
mod classifier;
mod key_value;
pub mod normalize;
mod sections;
mod tables;

pub use assembler::{assemble, DocumentAssembler};
pub use classifier::{LineClassifier, LineTag};
pub use key_value::KeyValueExtractor;
pub use normalize::{normalize_identifier, section_key, UNNAMED_SECTION};
pub use sections::{AssembledSections, SectionAssembler};
pub use tables::TableClassifier;
