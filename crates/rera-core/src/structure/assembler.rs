//! Document assembly: pages and tables in, one [`DocumentRecord`] out.

use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::sections::SectionAssembler;
use super::tables::TableClassifier;
use crate::error::StructureError;
use crate::models::config::ReraConfig;
use crate::models::document::{DocumentMetadata, DocumentRecord, PageRecord, Table};
use crate::models::layout::{ExtractedLayout, PageLines, RawTable};

/// Accumulates one document.
///
/// Pages must be added in strictly increasing page-number order. Tables may
/// be added at any point before [`finish`](Self::finish).
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    source_file: String,
    is_scanned: bool,
    sections: SectionAssembler,
    tables: TableClassifier,
    pages: Vec<PageRecord>,
    raw_text_by_page: Vec<String>,
    methods: Vec<String>,
    classified: Vec<Table>,
    table_ids: HashSet<(u32, usize)>,
    last_page: Option<u32>,
}

impl DocumentAssembler {
    pub fn new(source_file: impl Into<String>) -> Self {
        Self::with_config(source_file, &ReraConfig::default())
    }

    pub fn with_config(source_file: impl Into<String>, config: &ReraConfig) -> Self {
        Self {
            source_file: source_file.into(),
            is_scanned: false,
            sections: SectionAssembler::from_config(&config.structure),
            tables: TableClassifier::from_config(&config.tables),
            pages: Vec::new(),
            raw_text_by_page: Vec::new(),
            methods: Vec::new(),
            classified: Vec::new(),
            table_ids: HashSet::new(),
            last_page: None,
        }
    }

    /// Mark the source as image-based.
    pub fn scanned(mut self, is_scanned: bool) -> Self {
        self.is_scanned = is_scanned;
        self
    }

    /// Structure one page.
    pub fn add_page(&mut self, page: &PageLines) -> Result<(), StructureError> {
        if let Some(previous) = self.last_page {
            if page.page_number <= previous {
                return Err(StructureError::PageOrder {
                    previous,
                    got: page.page_number,
                });
            }
        }
        self.last_page = Some(page.page_number);

        if page.is_empty() {
            warn!("Page {} has no text", page.page_number);
        }

        let record = self.sections.process_page(page);
        debug!(
            "Page {}: {} headings, {} pairs, {} paragraphs",
            record.page_number,
            record.headings.len(),
            record.key_value_pairs.len(),
            record.paragraphs.len()
        );

        self.pages.push(record);
        self.raw_text_by_page.push(page.text());
        if !self.methods.contains(&page.extraction_method) {
            self.methods.push(page.extraction_method.clone());
        }
        Ok(())
    }

    /// Classify one table and keep it for the document.
    pub fn add_table(&mut self, raw: &RawTable) -> Result<(), StructureError> {
        if !self.table_ids.insert((raw.page_number, raw.table_index)) {
            return Err(StructureError::DuplicateTable {
                page_number: raw.page_number,
                table_index: raw.table_index,
            });
        }

        let table = self.tables.classify(raw);
        debug!(
            "Table {} on page {}: header={}, rows={}",
            table.table_index, table.page_number, table.has_header, table.row_count
        );
        self.classified.push(table);
        Ok(())
    }

    /// Associate tables with sections and produce the record.
    pub fn finish(self) -> DocumentRecord {
        let mut assembled = self.sections.finish();

        // Sections claim tables one each, both in order.
        for (section, table) in assembled.sections.iter_mut().zip(self.classified.iter()) {
            section.tables.push(table.clone());
        }

        let extraction_method = match self.methods.as_slice() {
            [] => String::new(),
            [only] => only.clone(),
            _ => "mixed".to_string(),
        };

        let record = DocumentRecord {
            source_file: self.source_file,
            metadata: DocumentMetadata {
                total_pages: self.pages.len(),
                is_scanned: self.is_scanned,
                extraction_date: Utc::now(),
                extraction_method,
            },
            pages: self.pages,
            raw_text_by_page: self.raw_text_by_page,
            tables: self.classified,
            key_value_pairs: assembled.key_value_pairs,
            sections: assembled.sections,
            unstructured_text: assembled.unstructured_text,
        };

        info!(
            "Structured {}: {} pages, {} sections, {} tables, {} top-level pairs",
            record.source_file,
            record.metadata.total_pages,
            record.sections.len(),
            record.tables.len(),
            record.key_value_pairs.len()
        );

        record
    }
}

/// Structure a complete layout in one call.
pub fn assemble(layout: &ExtractedLayout, config: &ReraConfig) -> Result<DocumentRecord, StructureError> {
    let mut assembler =
        DocumentAssembler::with_config(layout.source_file.clone(), config).scanned(layout.is_scanned);

    for page in &layout.pages {
        assembler.add_page(page)?;
    }
    for table in &layout.tables {
        assembler.add_table(table)?;
    }

    Ok(assembler.finish())
}
