//! Configuration structures for structuring and field resolution.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ReraError;

/// Main configuration for the rera pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReraConfig {
    /// Line classification and section assembly.
    pub structure: StructureConfig,

    /// Table header detection.
    pub tables: TableConfig,

    /// Accepted geographic bounds.
    pub coordinates: CoordinateConfig,

    /// PDF text layer reading.
    pub pdf: PdfConfig,

    /// Batch processing defaults.
    pub batch: BatchConfig,
}

/// Heading detection thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    /// Lines at least this long are never headings.
    pub max_heading_length: usize,

    /// Upper-case lines must be longer than this to count as headings.
    pub min_uppercase_heading_length: usize,

    /// Font size above which a line is a heading.
    pub heading_font_size: f32,

    /// Keys this long (before normalization) are discarded.
    pub max_key_length: usize,

    /// Spans whose tops differ by at most this many units share a line.
    pub line_merge_tolerance: f32,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            max_heading_length: 80,
            min_uppercase_heading_length: 3,
            heading_font_size: 12.0,
            max_key_length: 100,
            line_merge_tolerance: 2.0,
        }
    }
}

/// Table header detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Number of leading first-row cells inspected.
    pub header_probe_cells: usize,

    /// Header cells must be shorter than this.
    pub max_header_cell_length: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            header_probe_cells: 5,
            max_header_cell_length: 50,
        }
    }
}

/// Open intervals a coordinate must fall in to be accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinateConfig {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl Default for CoordinateConfig {
    fn default() -> Self {
        // Karnataka, with margin
        Self {
            lat_min: 10.0,
            lat_max: 17.0,
            lon_min: 73.0,
            lon_max: 79.0,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Minimum text length to consider the PDF text-based.
    pub min_text_length: usize,

    /// Pages inspected when classifying a PDF.
    pub probe_pages: u32,

    /// Maximum pages to read (0 = unlimited).
    pub max_pages: u32,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            min_text_length: 50,
            probe_pages: 3,
            max_pages: 0,
        }
    }
}

/// Batch processing defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Reuse document JSON already present in the output directory.
    pub skip_existing: bool,

    /// Documents processed in parallel.
    pub jobs: usize,

    /// Log a progress line every this many documents (0 = never).
    pub progress_interval: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            skip_existing: true,
            jobs: 4,
            progress_interval: 10,
        }
    }
}

impl ReraConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings no document could satisfy.
    pub fn validate(&self) -> crate::Result<()> {
        let c = &self.coordinates;
        if c.lat_min >= c.lat_max || c.lon_min >= c.lon_max {
            return Err(ReraError::Config(format!(
                "empty coordinate bounds: lat ({}, {}), lon ({}, {})",
                c.lat_min, c.lat_max, c.lon_min, c.lon_max
            )));
        }
        if self.tables.header_probe_cells == 0 {
            return Err(ReraError::Config(
                "tables.header_probe_cells must be at least 1".to_string(),
            ));
        }
        if self.batch.jobs == 0 {
            return Err(ReraError::Config("batch.jobs must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ReraConfig::default();
        assert_eq!(config.structure.max_heading_length, 80);
        assert_eq!(config.tables.header_probe_cells, 5);
        assert_eq!(config.coordinates.lat_min, 10.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = ReraConfig::default();
        config.batch.jobs = 8;
        config.save(&path).unwrap();

        let loaded = ReraConfig::from_file(&path).unwrap();
        assert_eq!(loaded.batch.jobs, 8);
        assert_eq!(loaded.pdf.probe_pages, 3);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"coordinates": {"lat_min": 11.5}}"#).unwrap();

        let loaded = ReraConfig::from_file(&path).unwrap();
        assert_eq!(loaded.coordinates.lat_min, 11.5);
        assert_eq!(loaded.coordinates.lat_max, 17.0);
        assert_eq!(loaded.structure.heading_font_size, 12.0);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"coordinates": {"lat_min": 20.0}}"#).unwrap();

        assert!(matches!(
            ReraConfig::from_file(&path),
            Err(ReraError::Config(_))
        ));
    }
}
