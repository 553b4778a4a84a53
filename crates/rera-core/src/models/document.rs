//! Schema-free hierarchical record built from one document.
//!
//! Section order matters downstream (table association walks sections in
//! the order they were first seen), so sections live in [`SectionMap`], a
//! vector with a key index that serializes as an ordered JSON object.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Key-value pairs, ordered by key.
pub type KeyValues = BTreeMap<String, String>;

/// A titled region of the document, identified by its normalized key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Normalized key; carried by the enclosing map in JSON.
    #[serde(skip)]
    pub key: String,

    /// Heading text as first encountered.
    pub heading: String,

    /// Paragraphs flushed while this section was active.
    #[serde(default)]
    pub content: Vec<String>,

    /// Pairs found while this section was active.
    #[serde(default)]
    pub key_value_pairs: KeyValues,

    /// Tables associated with this section.
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl Section {
    pub fn new(key: impl Into<String>, heading: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            heading: heading.into(),
            ..Default::default()
        }
    }
}

/// Insertion-ordered registry of sections, unique by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionMap {
    sections: Vec<Section>,
    index: HashMap<String, usize>,
}

impl SectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the section for `key`, creating it with `heading` if absent.
    ///
    /// An existing section keeps its original heading.
    pub fn get_or_create(&mut self, key: &str, heading: &str) -> &mut Section {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                self.sections.push(Section::new(key, heading));
                let idx = self.sections.len() - 1;
                self.index.insert(key.to_string(), idx);
                idx
            }
        };
        &mut self.sections[idx]
    }

    pub fn get(&self, key: &str) -> Option<&Section> {
        self.index.get(key).map(|&idx| &self.sections[idx])
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Section> {
        match self.index.get(key) {
            Some(&idx) => Some(&mut self.sections[idx]),
            None => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Sections in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Section> {
        self.sections.iter_mut()
    }

    /// Section keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    fn insert(&mut self, section: Section) {
        match self.index.get(&section.key) {
            Some(&idx) => self.sections[idx] = section,
            None => {
                self.index.insert(section.key.clone(), self.sections.len());
                self.sections.push(section);
            }
        }
    }
}

impl Serialize for SectionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for section in &self.sections {
            map.serialize_entry(&section.key, section)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SectionMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SectionMapVisitor;

        impl<'de> Visitor<'de> for SectionMapVisitor {
            type Value = SectionMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of section key to section")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<SectionMap, A::Error> {
                let mut sections = SectionMap::new();
                while let Some((key, mut section)) = access.next_entry::<String, Section>()? {
                    section.key = key;
                    sections.insert(section);
                }
                Ok(sections)
            }
        }

        deserializer.deserialize_map(SectionMapVisitor)
    }
}

/// Cells of a classified table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableData {
    /// One map per data row, keyed by header label.
    Records(Vec<BTreeMap<String, String>>),
    /// Plain rows when no header was recognized.
    Rows(Vec<Vec<String>>),
}

impl Default for TableData {
    fn default() -> Self {
        TableData::Rows(Vec::new())
    }
}

impl TableData {
    pub fn len(&self) -> usize {
        match self {
            TableData::Records(r) => r.len(),
            TableData::Rows(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A classified table; identity is `(page_number, table_index)`.
///
/// Empty `data` reads back as records when `has_header` is set and as rows otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "TableRepr")]
pub struct Table {
    pub page_number: u32,
    pub table_index: usize,
    pub has_header: bool,

    /// Header labels in column order (empty without a header).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<String>,

    #[serde(default)]
    pub data: TableData,
    #[serde(default)]
    pub row_count: usize,
}

#[derive(Deserialize)]
struct TableRepr {
    page_number: u32,
    table_index: usize,
    has_header: bool,
    #[serde(default)]
    headers: Vec<String>,
    #[serde(default)]
    data: TableData,
    #[serde(default)]
    row_count: usize,
}

impl From<TableRepr> for Table {
    fn from(repr: TableRepr) -> Self {
        let data = match repr.data {
            data if !data.is_empty() => data,
            _ if repr.has_header => TableData::Records(Vec::new()),
            _ => TableData::Rows(Vec::new()),
        };
        Self {
            page_number: repr.page_number,
            table_index: repr.table_index,
            has_header: repr.has_header,
            headers: repr.headers,
            data,
            row_count: repr.row_count,
        }
    }
}

impl Table {
    /// Data rows as header maps, if the table has a header.
    pub fn records(&self) -> Option<&[BTreeMap<String, String>]> {
        match &self.data {
            TableData::Records(r) => Some(r),
            TableData::Rows(_) => None,
        }
    }
}

/// What one page contributed, written once after the page is processed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub page_number: u32,
    #[serde(default)]
    pub headings: Vec<String>,
    #[serde(default)]
    pub key_value_pairs: KeyValues,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub lists: Vec<Vec<String>>,
}

impl PageRecord {
    pub fn new(page_number: u32) -> Self {
        Self {
            page_number,
            ..Default::default()
        }
    }
}

/// A paragraph flushed while no section was active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnstructuredText {
    pub page: u32,
    pub text: String,
}

/// Document-level facts about the extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub total_pages: usize,
    pub is_scanned: bool,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub extraction_date: DateTime<Utc>,
    #[serde(default)]
    pub extraction_method: String,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            total_pages: 0,
            is_scanned: false,
            extraction_date: Utc::now(),
            extraction_method: String::new(),
        }
    }
}

/// Accept RFC 3339 as well as naive ISO timestamps (taken as UTC).
fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

/// The full structured record of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub source_file: String,

    #[serde(rename = "extracted_pages", default)]
    pub pages: Vec<PageRecord>,

    #[serde(default)]
    pub raw_text_by_page: Vec<String>,

    #[serde(rename = "detected_tables", default)]
    pub tables: Vec<Table>,

    /// Pairs found before any heading.
    #[serde(default)]
    pub key_value_pairs: KeyValues,

    #[serde(default)]
    pub sections: SectionMap,

    #[serde(default)]
    pub unstructured_text: Vec<UnstructuredText>,

    #[serde(default)]
    pub metadata: DocumentMetadata,
}

impl DocumentRecord {
    /// Load a record from its JSON representation.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// All pairs, top level first, then each page in order (later pages win).
    pub fn merged_key_values(&self) -> KeyValues {
        let mut merged = self.key_value_pairs.clone();
        for page in &self.pages {
            for (k, v) in &page.key_value_pairs {
                merged.insert(k.clone(), v.clone());
            }
        }
        merged
    }

    /// Raw page texts joined by newlines, followed by every page's paragraphs.
    pub fn body_text(&self) -> String {
        let mut parts: Vec<&str> = self.raw_text_by_page.iter().map(String::as_str).collect();
        for page in &self.pages {
            parts.extend(page.paragraphs.iter().map(String::as_str));
        }
        parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_section_map_keeps_insertion_order() {
        let mut map = SectionMap::new();
        map.get_or_create("zeta", "ZETA");
        map.get_or_create("alpha", "ALPHA");
        map.get_or_create("zeta", "Zeta again").content.push("x".into());

        assert_eq!(map.len(), 2);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert_eq!(map.get("zeta").unwrap().heading, "ZETA");
        assert_eq!(map.get("zeta").unwrap().content, vec!["x".to_string()]);
    }

    #[test]
    fn test_section_map_json_order_survives() {
        let mut map = SectionMap::new();
        map.get_or_create("zeta", "ZETA");
        map.get_or_create("alpha", "ALPHA");

        let json = serde_json::to_string(&map).unwrap();
        assert!(json.find("\"zeta\"").unwrap() < json.find("\"alpha\"").unwrap());
        assert!(!json.contains("\"key\""));

        let back: SectionMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_table_data_untagged() {
        let rows: TableData = serde_json::from_str(r#"[["1", "a"]]"#).unwrap();
        assert_eq!(rows, TableData::Rows(vec![vec!["1".into(), "a".into()]]));

        let records: TableData = serde_json::from_str(r#"[{"Plot No": "1"}]"#).unwrap();
        assert_eq!(records.len(), 1);
        assert!(matches!(records, TableData::Records(_)));
    }

    #[test]
    fn test_empty_table_data_follows_header_flag() {
        let headerless = Table {
            page_number: 3,
            table_index: 1,
            ..Default::default()
        };
        let back: Table = serde_json::from_str(&serde_json::to_string(&headerless).unwrap()).unwrap();
        assert_eq!(back, headerless);
        assert_eq!(back.data, TableData::Rows(Vec::new()));

        let headed: Table = serde_json::from_str(
            r#"{"page_number": 1, "table_index": 0, "has_header": true, "headers": ["Plot No"], "data": []}"#,
        )
        .unwrap();
        assert_eq!(headed.records(), Some(&[][..]));
    }

    #[test]
    fn test_merged_key_values_later_pages_win() {
        let mut doc = DocumentRecord::default();
        doc.key_value_pairs.insert("district".into(), "Mysuru".into());
        let mut p1 = PageRecord::new(1);
        p1.key_value_pairs.insert("taluk".into(), "A".into());
        let mut p2 = PageRecord::new(2);
        p2.key_value_pairs.insert("taluk".into(), "B".into());
        doc.pages = vec![p1, p2];

        let merged = doc.merged_key_values();
        assert_eq!(merged["district"], "Mysuru");
        assert_eq!(merged["taluk"], "B");
    }

    #[test]
    fn test_naive_extraction_date_accepted() {
        let json = r#"{
            "source_file": "old.pdf",
            "metadata": {"total_pages": 1, "is_scanned": false, "extraction_date": "2025-03-01T10:15:30.123456"}
        }"#;
        let doc = DocumentRecord::from_json(json).unwrap();
        assert_eq!(doc.metadata.extraction_date.to_rfc3339(), "2025-03-01T10:15:30.123456+00:00");
        assert!(doc.sections.is_empty());
    }

    #[test]
    fn test_document_json_names() {
        let doc = DocumentRecord {
            source_file: "a.pdf".into(),
            ..Default::default()
        };
        let value: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert!(value.get("extracted_pages").is_some());
        assert!(value.get("detected_tables").is_some());
        assert!(value["metadata"].get("extraction_date").is_some());
    }
}
