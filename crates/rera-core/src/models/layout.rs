//! Positioned text handed over by the upstream text/table extraction layer.

use serde::{Deserialize, Serialize};

/// One visually distinct row of text on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    /// Text content of the row.
    pub text: String,

    /// Vertical position, measured from the top of the page.
    #[serde(default)]
    pub y_position: f32,

    /// Font size of the first glyph, when the text layer reports it.
    #[serde(default)]
    pub font_size: Option<f32>,

    /// Whether the first glyph on the row uses a bold font.
    #[serde(default)]
    pub is_bold: bool,
}

impl TextLine {
    /// Create a plain line without font information (OCR or plain-text sources).
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            y_position: 0.0,
            font_size: None,
            is_bold: false,
        }
    }

    /// Set the font size.
    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = Some(size);
        self
    }

    /// Mark the line as bold.
    pub fn bold(mut self) -> Self {
        self.is_bold = true;
        self
    }

    /// Set the vertical position.
    pub fn at(mut self, y_position: f32) -> Self {
        self.y_position = y_position;
        self
    }
}

/// Ordered lines of one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageLines {
    /// Page number (1-indexed).
    pub page_number: u32,

    /// Lines in reading order.
    #[serde(default)]
    pub lines: Vec<TextLine>,

    /// Raw page text as produced by the text layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,

    /// How the text was obtained ("text_layer", "ocr", ...).
    #[serde(default = "default_method")]
    pub extraction_method: String,
}

fn default_method() -> String {
    "text_layer".to_string()
}

impl PageLines {
    /// Create a page from its lines.
    pub fn new(page_number: u32, lines: Vec<TextLine>) -> Self {
        Self {
            page_number,
            lines,
            raw_text: None,
            extraction_method: default_method(),
        }
    }

    /// Raw text of the page, falling back to the lines joined by newlines.
    pub fn text(&self) -> String {
        match &self.raw_text {
            Some(raw) => raw.clone(),
            None => self
                .lines
                .iter()
                .map(|l| l.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Check whether the page carries any text at all.
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.text.trim().is_empty())
    }
}

/// A table as segmented upstream: a grid of optional cell strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTable {
    /// Page the table was found on.
    pub page_number: u32,

    /// Position of the table on its page.
    pub table_index: usize,

    /// Rows of cells; `None` marks a cell the segmenter left empty.
    #[serde(default)]
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Build a table from plain strings.
    pub fn from_strings<R, C>(page_number: u32, table_index: usize, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| {
                        let cell = cell.into();
                        if cell.is_empty() { None } else { Some(cell) }
                    })
                    .collect()
            })
            .collect();

        Self {
            page_number,
            table_index,
            rows,
        }
    }
}

/// Everything the upstream collaborator produces for one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedLayout {
    /// Name of the source file.
    #[serde(default)]
    pub source_file: String,

    /// Whether the source is image-based (no usable text layer).
    #[serde(default)]
    pub is_scanned: bool,

    /// Pages in increasing page-number order.
    #[serde(default)]
    pub pages: Vec<PageLines>,

    /// Tables in document order.
    #[serde(default)]
    pub tables: Vec<RawTable>,
}

impl ExtractedLayout {
    /// Load a layout from its JSON representation.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
