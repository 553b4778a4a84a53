//! PDF layout extraction using lopdf.

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::text::{self, FontStyles};
use super::{PdfProcessor, PdfType, Result};
use crate::error::PdfError;
use crate::models::config::{PdfConfig, ReraConfig};
use crate::models::layout::{ExtractedLayout, PageLines, TextLine};

const DEFAULT_PAGE_HEIGHT: f32 = 792.0;

/// PDF text-layer extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    config: PdfConfig,
    line_merge_tolerance: f32,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self::from_config(&ReraConfig::default())
    }

    pub fn from_config(config: &ReraConfig) -> Self {
        Self {
            document: None,
            config: config.pdf.clone(),
            line_merge_tolerance: config.structure.line_merge_tolerance,
        }
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("No document loaded".to_string()))
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.document()?
            .get_pages()
            .get(&page)
            .copied()
            .ok_or(PdfError::InvalidPage(page))
    }

    /// Pages to read, honouring `max_pages`.
    fn page_numbers(&self) -> Vec<u32> {
        let count = self.page_count();
        let last = match self.config.max_pages {
            0 => count,
            max => count.min(max),
        };
        (1..=last).collect()
    }

    /// Get resources dictionary for a page, handling inheritance.
    fn page_resources(&self, doc: &Document, node_id: ObjectId) -> Option<Dictionary> {
        let Ok(Object::Dictionary(dict)) = doc.get_object(node_id) else {
            return None;
        };

        if let Ok(resources) = dict.get(b"Resources") {
            if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
                return Some(res_dict.clone());
            }
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => self.page_resources(doc, *parent_id),
            _ => None,
        }
    }

    /// Page height from the MediaBox, following inheritance.
    fn page_height(&self, doc: &Document, node_id: ObjectId) -> f32 {
        let Ok(Object::Dictionary(dict)) = doc.get_object(node_id) else {
            return DEFAULT_PAGE_HEIGHT;
        };

        if let Ok(media_box) = dict.get(b"MediaBox") {
            if let Ok((_, Object::Array(bounds))) = doc.dereference(media_box) {
                let values: Vec<f32> = bounds
                    .iter()
                    .filter_map(|o| match o {
                        Object::Integer(i) => Some(*i as f32),
                        Object::Real(r) => Some(*r as f32),
                        _ => None,
                    })
                    .collect();
                if let [_, y0, _, y1] = values.as_slice() {
                    return (y1 - y0).abs();
                }
            }
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => self.page_height(doc, *parent_id),
            _ => DEFAULT_PAGE_HEIGHT,
        }
    }

    /// Resource names of the page's fonts, each with its bold flag.
    fn font_styles(&self, doc: &Document, resources: Option<&Dictionary>) -> FontStyles {
        let mut styles = FontStyles::new();
        let Some(fonts) = resources
            .and_then(|r| r.get(b"Font").ok())
            .and_then(|f| doc.dereference(f).ok())
            .and_then(|(_, f)| f.as_dict().ok())
        else {
            return styles;
        };

        for (name, font_ref) in fonts.iter() {
            let base_font = doc
                .dereference(font_ref)
                .ok()
                .and_then(|(_, font)| font.as_dict().ok())
                .and_then(|font| font.get(b"BaseFont").ok())
                .and_then(|base| base.as_name().ok())
                .map(|base| String::from_utf8_lossy(base).to_string())
                .unwrap_or_default();
            trace!("Font {} -> {}", String::from_utf8_lossy(name), base_font);
            styles.insert(name.clone(), text::is_bold_font(&base_font));
        }
        styles
    }

    fn has_images(&self, doc: &Document, resources: Option<&Dictionary>) -> bool {
        let Some(xobjects) = resources
            .and_then(|r| r.get(b"XObject").ok())
            .and_then(|x| doc.dereference(x).ok())
            .and_then(|(_, x)| x.as_dict().ok())
        else {
            return false;
        };

        xobjects.iter().any(|(_, obj_ref)| {
            matches!(
                doc.dereference(obj_ref),
                Ok((_, Object::Stream(stream)))
                    if stream.dict.get(b"Subtype").and_then(|s| s.as_name()).ok() == Some(b"Image".as_slice())
            )
        })
    }

    /// Lines drawn by the page's content stream.
    fn stream_lines(&self, doc: &Document, page_id: ObjectId) -> Result<Vec<TextLine>> {
        let data = doc
            .get_page_content(page_id)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
        let content = Content::decode(&data).map_err(|e| PdfError::TextExtraction(e.to_string()))?;

        let resources = self.page_resources(doc, page_id);
        let fonts = self.font_styles(doc, resources.as_ref());
        let height = self.page_height(doc, page_id);

        let spans = text::collect_spans(&content.operations, &fonts, height);
        Ok(text::group_lines(spans, self.line_merge_tolerance))
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn analyze(&self) -> PdfType {
        let Ok(doc) = self.document() else {
            return PdfType::Empty;
        };

        let probe: Vec<u32> = (1..=self.page_count().min(self.config.probe_pages.max(1))).collect();
        let text_len: usize = probe
            .iter()
            .map(|&page| {
                self.extract_page_text(page)
                    .map(|t| t.trim().chars().count())
                    .unwrap_or(0)
            })
            .sum();

        let pdf_type = if text_len > self.config.min_text_length {
            PdfType::Text
        } else if doc
            .get_pages()
            .values()
            .any(|&id| self.has_images(doc, self.page_resources(doc, id).as_ref()))
        {
            PdfType::Scanned
        } else {
            PdfType::Empty
        };

        debug!("PDF analysis: {} chars in {} probe pages -> {:?}", text_len, probe.len(), pdf_type);
        pdf_type
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        self.page_id(page)?;
        self.document()?
            .extract_text(&[page])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    fn extract_page_lines(&self, page: u32) -> Result<PageLines> {
        let doc = self.document()?;
        let page_id = self.page_id(page)?;

        let mut lines = match self.stream_lines(doc, page_id) {
            Ok(lines) => lines,
            Err(e) => {
                warn!("Page {}: unreadable content stream: {}", page, e);
                Vec::new()
            }
        };

        let raw_text = self.extract_page_text(page).ok();
        if lines.is_empty() {
            // Plain text has no positions or fonts; keep one line per row.
            lines = raw_text
                .iter()
                .flat_map(|t| t.lines())
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(TextLine::plain)
                .collect();
            if !lines.is_empty() {
                debug!("Page {}: using plain text fallback ({} lines)", page, lines.len());
            }
        }

        let mut page_lines = PageLines::new(page, lines);
        page_lines.raw_text = raw_text.filter(|t| !t.trim().is_empty());
        Ok(page_lines)
    }

    fn extract_layout(&self, source_file: &str) -> Result<ExtractedLayout> {
        let pdf_type = self.analyze();
        let is_scanned = pdf_type == PdfType::Scanned;

        let mut pages = Vec::new();
        for page in self.page_numbers() {
            if is_scanned {
                let mut empty = PageLines::new(page, Vec::new());
                empty.extraction_method = "scanned".to_string();
                pages.push(empty);
                continue;
            }
            match self.extract_page_lines(page) {
                Ok(lines) => pages.push(lines),
                Err(e) => {
                    warn!("Page {}: {}", page, e);
                    pages.push(PageLines::new(page, Vec::new()));
                }
            }
        }

        debug!("Extracted {} pages from {} ({})", pages.len(), source_file, pdf_type.as_str());
        Ok(ExtractedLayout {
            source_file: source_file.to_string(),
            is_scanned,
            pages,
            tables: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::{Stream, dictionary};
    use pretty_assertions::assert_eq;

    fn build_pdf(pages: &[Vec<Operation>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular,
                "F2" => bold,
            },
        });

        let mut kids = Vec::new();
        for operations in pages {
            let content = Content {
                operations: operations.clone(),
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(595), Object::Integer(842)],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn text_at(font: &str, size: i64, x: i64, y: i64, text: &str) -> Vec<Operation> {
        vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(size)]),
            Operation::new("Td", vec![Object::Integer(x), Object::Integer(y)]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]
    }

    fn details_page() -> Vec<Operation> {
        [
            text_at("F2", 14, 72, 780, "PROJECT DETAILS"),
            text_at("F1", 10, 72, 750, "Project Name :"),
            text_at("F1", 10, 160, 749, "Green Acres Layout"),
            text_at("F1", 10, 72, 730, "District : Mysuru, Taluk : Hunsur, Survey numbers and boundaries follow."),
        ]
        .concat()
    }

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
        assert_eq!(extractor.analyze(), PdfType::Empty);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut extractor = PdfExtractor::new();
        assert!(matches!(extractor.load(b"not a pdf"), Err(PdfError::Parse(_))));
    }

    #[test]
    fn test_extract_page_lines() {
        let mut extractor = PdfExtractor::new();
        extractor.load(&build_pdf(&[details_page()])).unwrap();

        assert_eq!(extractor.page_count(), 1);
        assert_eq!(extractor.analyze(), PdfType::Text);

        let page = extractor.extract_page_lines(1).unwrap();
        let texts: Vec<&str> = page.lines.iter().map(|l| l.text.as_str()).collect();

        assert_eq!(
            texts,
            vec![
                "PROJECT DETAILS",
                "Project Name : Green Acres Layout",
                "District : Mysuru, Taluk : Hunsur, Survey numbers and boundaries follow.",
            ]
        );
        assert!(page.lines[0].is_bold);
        assert_eq!(page.lines[0].font_size, Some(14.0));
        assert_eq!(page.lines[0].y_position, 62.0);
        assert!(!page.lines[1].is_bold);
    }

    #[test]
    fn test_invalid_page() {
        let mut extractor = PdfExtractor::new();
        extractor.load(&build_pdf(&[details_page()])).unwrap();
        assert!(matches!(extractor.extract_page_lines(3), Err(PdfError::InvalidPage(3))));
    }

    #[test]
    fn test_extract_layout_honours_max_pages() {
        let mut config = ReraConfig::default();
        config.pdf.max_pages = 1;
        let mut extractor = PdfExtractor::from_config(&config);
        extractor
            .load(&build_pdf(&[details_page(), text_at("F1", 10, 72, 700, "Second page")]))
            .unwrap();

        let layout = extractor.extract_layout("sample.pdf").unwrap();

        assert_eq!(layout.source_file, "sample.pdf");
        assert!(!layout.is_scanned);
        assert_eq!(layout.pages.len(), 1);
        assert_eq!(layout.pages[0].page_number, 1);
        assert!(layout.tables.is_empty());
    }

    #[test]
    fn test_blank_document_is_empty() {
        let mut extractor = PdfExtractor::new();
        extractor.load(&build_pdf(&[vec![]])).unwrap();

        assert_eq!(extractor.analyze(), PdfType::Empty);
        let layout = extractor.extract_layout("blank.pdf").unwrap();
        assert!(layout.pages[0].is_empty());
    }
}
