//! Table classification: header detection and row shaping.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

use crate::models::config::TableConfig;
use crate::models::document::{Table, TableData};
use crate::models::layout::RawTable;

lazy_static! {
    static ref NUMERIC_CELL: Regex = Regex::new(r"^\d+[.,]?\d*$").unwrap();
}

/// Decides whether a table's first row is a header and shapes its rows.
#[derive(Debug, Clone)]
pub struct TableClassifier {
    probe_cells: usize,
    max_header_len: usize,
}

impl TableClassifier {
    pub fn new() -> Self {
        Self::from_config(&TableConfig::default())
    }

    pub fn from_config(config: &TableConfig) -> Self {
        Self {
            probe_cells: config.header_probe_cells,
            max_header_len: config.max_header_cell_length,
        }
    }

    /// Classify one table.
    pub fn classify(&self, raw: &RawTable) -> Table {
        let mut table = Table {
            page_number: raw.page_number,
            table_index: raw.table_index,
            ..Default::default()
        };

        // A lone row is neither header nor data.
        if raw.rows.len() < 2 {
            return table;
        }

        let first = &raw.rows[0];
        if self.looks_like_header(first) {
            let headers: Vec<String> = first
                .iter()
                .enumerate()
                .map(|(i, cell)| match non_empty(cell) {
                    Some(text) => text.to_string(),
                    None => format!("col_{i}"),
                })
                .collect();

            let records: Vec<BTreeMap<String, String>> = raw.rows[1..]
                .iter()
                .filter(|row| has_content(row))
                .map(|row| {
                    row.iter()
                        .enumerate()
                        .map(|(i, cell)| {
                            let label = headers.get(i).cloned().unwrap_or_else(|| format!("col_{i}"));
                            (label, cell_text(cell))
                        })
                        .collect()
                })
                .collect();

            table.has_header = true;
            table.headers = headers;
            table.data = TableData::Records(records);
        } else {
            let rows: Vec<Vec<String>> = raw
                .rows
                .iter()
                .filter(|row| has_content(row))
                .map(|row| row.iter().map(cell_text).collect())
                .collect();
            table.data = TableData::Rows(rows);
        }

        table.row_count = table.data.len();
        table
    }

    fn looks_like_header(&self, row: &[Option<String>]) -> bool {
        let probed: Vec<&str> = row
            .iter()
            .take(self.probe_cells)
            .filter_map(non_empty)
            .collect();

        !probed.is_empty()
            && probed.iter().all(|cell| {
                cell.chars().count() < self.max_header_len && !NUMERIC_CELL.is_match(cell)
            })
    }
}

impl Default for TableClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(cell: &Option<String>) -> Option<&str> {
    cell.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn has_content(row: &&Vec<Option<String>>) -> bool {
    row.iter().any(|cell| non_empty(cell).is_some())
}

fn cell_text(cell: &Option<String>) -> String {
    cell.as_deref().map(str::trim).unwrap_or_default().to_string()
}
