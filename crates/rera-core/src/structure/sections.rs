//! Section assembly: the per-page state machine over classified lines.
//!
//! The active section survives page boundaries; paragraph and list buffers
//! do not. A paragraph belongs to whichever section is active when it is
//! flushed, or to the document's unstructured text when none is.

use tracing::debug;

use super::classifier::{LineClassifier, LineTag};
use super::key_value::KeyValueExtractor;
use super::normalize::section_key;
use crate::models::config::StructureConfig;
use crate::models::document::{KeyValues, PageRecord, SectionMap, UnstructuredText};
use crate::models::layout::PageLines;

/// Document-level output of the section assembler.
#[derive(Debug, Clone, Default)]
pub struct AssembledSections {
    pub sections: SectionMap,
    /// Pairs seen before the first heading.
    pub key_value_pairs: KeyValues,
    pub unstructured_text: Vec<UnstructuredText>,
}

/// Builds sections across the pages of one document.
#[derive(Debug, Clone, Default)]
pub struct SectionAssembler {
    classifier: LineClassifier,
    pairs: KeyValueExtractor,
    current_section: Option<String>,
    output: AssembledSections,
}

/// Buffers that live for a single page.
struct PageState {
    record: PageRecord,
    paragraph: Vec<String>,
    list: Vec<String>,
    in_list: bool,
}

impl SectionAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &StructureConfig) -> Self {
        Self {
            classifier: LineClassifier::from_config(config),
            pairs: KeyValueExtractor::new().with_max_key_length(config.max_key_length),
            ..Default::default()
        }
    }

    /// Key of the section lines are currently attributed to.
    pub fn current_section(&self) -> Option<&str> {
        self.current_section.as_deref()
    }

    /// Process every line of one page and return what the page contributed.
    pub fn process_page(&mut self, page: &PageLines) -> PageRecord {
        let mut state = PageState {
            record: PageRecord::new(page.page_number),
            paragraph: Vec::new(),
            list: Vec::new(),
            in_list: false,
        };

        for line in &page.lines {
            let text = line.text.trim();
            if text.is_empty() {
                continue;
            }

            match self.classifier.classify(line) {
                LineTag::Heading => {
                    self.flush_paragraph(&mut state);
                    flush_list(&mut state);
                    state.in_list = false;
                    self.open_section(text);
                    state.record.headings.push(text.to_string());
                }
                LineTag::KeyValue => {
                    for (key, value) in self.pairs.extract(text) {
                        let target = match &self.current_section {
                            Some(current) => self
                                .output
                                .sections
                                .get_mut(current)
                                .map(|s| &mut s.key_value_pairs),
                            None => None,
                        };
                        match target {
                            Some(section_pairs) => {
                                section_pairs.insert(key.clone(), value.clone());
                            }
                            None => {
                                self.output.key_value_pairs.insert(key.clone(), value.clone());
                            }
                        }
                        state.record.key_value_pairs.insert(key, value);
                    }
                }
                LineTag::ListItem => {
                    self.flush_paragraph(&mut state);
                    state.list.push(text.to_string());
                    state.in_list = true;
                }
                LineTag::Paragraph => {
                    if state.in_list {
                        flush_list(&mut state);
                        state.in_list = false;
                    }
                    state.paragraph.push(text.to_string());
                }
            }
        }

        self.flush_paragraph(&mut state);
        flush_list(&mut state);

        state.record
    }

    /// Hand over the accumulated sections.
    pub fn finish(self) -> AssembledSections {
        self.output
    }

    fn open_section(&mut self, heading: &str) {
        let key = section_key(heading);
        if !self.output.sections.contains_key(&key) {
            debug!("Detected heading '{}' -> section '{}'", heading, key);
        }
        self.output.sections.get_or_create(&key, heading);
        self.current_section = Some(key);
    }

    fn flush_paragraph(&mut self, state: &mut PageState) {
        if state.paragraph.is_empty() {
            return;
        }
        let paragraph = state.paragraph.join(" ");
        state.paragraph.clear();

        let section = match &self.current_section {
            Some(key) => self.output.sections.get_mut(key),
            None => None,
        };
        match section {
            Some(section) => section.content.push(paragraph.clone()),
            None => self.output.unstructured_text.push(UnstructuredText {
                page: state.record.page_number,
                text: paragraph.clone(),
            }),
        }
        state.record.paragraphs.push(paragraph);
    }
}

fn flush_list(state: &mut PageState) {
    if !state.list.is_empty() {
        state.record.lists.push(std::mem::take(&mut state.list));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::layout::TextLine;
    use pretty_assertions::assert_eq;

    fn page(number: u32, lines: &[&str]) -> PageLines {
        PageLines::new(number, lines.iter().map(|l| TextLine::plain(*l)).collect())
    }

    #[test]
    fn test_preamble_goes_to_document() {
        let mut assembler = SectionAssembler::new();
        let record = assembler.process_page(&page(
            1,
            &["Registration under the Act", "District: Mysuru", "PROJECT DETAILS"],
        ));
        let out = assembler.finish();

        assert_eq!(out.key_value_pairs["district"], "Mysuru");
        assert_eq!(
            out.unstructured_text,
            vec![UnstructuredText {
                page: 1,
                text: "Registration under the Act".into()
            }]
        );
        assert_eq!(record.headings, vec!["PROJECT DETAILS".to_string()]);
        assert_eq!(record.key_value_pairs["district"], "Mysuru");
    }

    #[test]
    fn test_pairs_follow_active_section() {
        let mut assembler = SectionAssembler::new();
        assembler.process_page(&page(1, &["PROJECT DETAILS", "Taluk: Hunsur"]));
        let out = assembler.finish();

        assert!(out.key_value_pairs.is_empty());
        let section = out.sections.get("project_details").unwrap();
        assert_eq!(section.key_value_pairs["taluk"], "Hunsur");
    }

    #[test]
    fn test_paragraph_owned_by_section_active_at_flush() {
        let mut assembler = SectionAssembler::new();
        let record = assembler.process_page(&page(
            1,
            &["first part", "second part", "SITE AREA", "closing text"],
        ));
        let out = assembler.finish();

        assert_eq!(out.unstructured_text.len(), 1);
        assert_eq!(out.unstructured_text[0].text, "first part second part");
        assert_eq!(
            out.sections.get("site_area").unwrap().content,
            vec!["closing text".to_string()]
        );
        assert_eq!(record.paragraphs.len(), 2);
    }

    #[test]
    fn test_lists_and_paragraph_breaks() {
        let mut assembler = SectionAssembler::new();
        let record = assembler.process_page(&page(
            2,
            &["AMENITIES", "intro", "• Roads", "• Drains", "after list", "• Parks"],
        ));

        assert_eq!(
            record.lists,
            vec![
                vec!["• Roads".to_string(), "• Drains".to_string()],
                vec!["• Parks".to_string()],
            ]
        );
        assert_eq!(record.paragraphs, vec!["intro".to_string(), "after list".to_string()]);
    }

    #[test]
    fn test_section_persists_across_pages() {
        let mut assembler = SectionAssembler::new();
        assembler.process_page(&PageLines::new(
            1,
            vec![TextLine::plain("Project Description!!").bold()],
        ));
        assembler.process_page(&page(2, &["continues here", "PROJECT DESCRIPTION", "more"]));
        let out = assembler.finish();

        assert_eq!(out.sections.len(), 1);
        let section = out.sections.get("project_description").unwrap();
        assert_eq!(section.heading, "Project Description!!");
        assert_eq!(section.content, vec!["continues here".to_string(), "more".to_string()]);
        assert!(out.unstructured_text.is_empty());
    }

    #[test]
    fn test_blank_and_unparsable_lines_contribute_nothing() {
        let mut assembler = SectionAssembler::new();
        let record = assembler.process_page(&page(1, &["   ", "Phase → 2", ""]));
        let out = assembler.finish();

        assert_eq!(record, PageRecord::new(1));
        assert!(out.unstructured_text.is_empty());
        assert!(out.key_value_pairs.is_empty());
    }

    #[test]
    fn test_unnamed_headings_coalesce() {
        let mut assembler = SectionAssembler::new();
        assembler.process_page(&PageLines::new(
            1,
            vec![
                TextLine::plain("***").bold(),
                TextLine::plain("one"),
                TextLine::plain("---").bold(),
                TextLine::plain("two"),
            ],
        ));
        let out = assembler.finish();

        assert_eq!(out.sections.keys().collect::<Vec<_>>(), vec!["unnamed_section"]);
        assert_eq!(
            out.sections.get("unnamed_section").unwrap().content,
            vec!["one".to_string(), "two".to_string()]
        );
    }
}
