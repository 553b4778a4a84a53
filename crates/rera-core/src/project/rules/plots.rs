//! Plot tables: the plot-type aggregate and the individual plot schedule.

use std::collections::BTreeMap;

use super::numbers::{extract_float, extract_number};
use crate::models::document::Table;
use crate::models::project::{Plot, PlotType};

type Row = BTreeMap<String, String>;

// Ranked header aliases per column.
const SL_NO: &[&str] = &["Sl No.", "sl_no"];
const TYPE_NAME: &[&str] = &["Plot Type", "type", "Site Dimension"];
const TYPE_COUNT: &[&str] = &["Number of Sites", "number", "Number"];
const TYPE_AREA: &[&str] = &["Total Area", "area", "Area"];
const PLOT_NO: &[&str] = &["Plot No.", "plot_no", "Plot No"];
const PLOT_TYPE: &[&str] = &["Plot Type", "type"];
const PLOT_SIZE: &[&str] = &["Plot Size", "size"];
const PLOT_AREA: &[&str] = &["Plot Area", "area", "Area"];
const NORTH: &[&str] = &["North Schedule", "north", "North"];
const SOUTH: &[&str] = &["South Schedule", "south", "South"];
const EAST: &[&str] = &["East Schedule", "east", "East"];
const WEST: &[&str] = &["West Schedule", "west", "West"];

/// What a header-bearing table holds. A table may play both roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRole {
    /// Counts and areas per plot type or dimension.
    PlotTypes,
    /// One row per plot with its boundary schedule.
    PlotListing,
}

impl TableRole {
    /// Roles of a table, judged by its header labels.
    pub fn detect(table: &Table) -> Vec<TableRole> {
        if !table.has_header {
            return Vec::new();
        }
        let labels: Vec<String> = header_labels(table).iter().map(|h| h.to_lowercase()).collect();
        let any = |needle: &str| labels.iter().any(|l| l.contains(needle));

        let mut roles = Vec::new();
        if any("plot") || any("type") || any("dimension") {
            roles.push(TableRole::PlotTypes);
        }
        if any("plot no") && (any("north") || any("schedule")) {
            roles.push(TableRole::PlotListing);
        }
        roles
    }
}

/// Aggregate rows from every plot-type table, in table order.
pub fn extract_plot_types(tables: &[Table]) -> Vec<PlotType> {
    data_rows(tables, TableRole::PlotTypes)
        .filter_map(|row| {
            let plot_type = PlotType {
                sl_no: column(row, SL_NO).to_string(),
                plot_type: column(row, TYPE_NAME).to_string(),
                number: extract_number(column(row, TYPE_COUNT)).unwrap_or(0),
                area: extract_number(column(row, TYPE_AREA)).unwrap_or(0),
            };
            (!plot_type.plot_type.is_empty() && plot_type.number > 0).then_some(plot_type)
        })
        .collect()
}

/// Individual plots from every plot listing, in table order.
pub fn extract_plots(tables: &[Table]) -> Vec<Plot> {
    data_rows(tables, TableRole::PlotListing)
        .filter_map(|row| {
            let plot = Plot {
                sl_no: column(row, SL_NO).to_string(),
                plot_no: column(row, PLOT_NO).to_string(),
                plot_type: column(row, PLOT_TYPE).to_string(),
                size: column(row, PLOT_SIZE).to_string(),
                area: extract_float(column(row, PLOT_AREA)).unwrap_or(0.0),
                north: column(row, NORTH).to_string(),
                south: column(row, SOUTH).to_string(),
                east: column(row, EAST).to_string(),
                west: column(row, WEST).to_string(),
            };
            (!plot.plot_no.is_empty()).then_some(plot)
        })
        .collect()
}

/// Rows of tables with `role`, skipping repeated header rows.
fn data_rows(tables: &[Table], role: TableRole) -> impl Iterator<Item = &Row> {
    tables
        .iter()
        .filter(move |t| TableRole::detect(t).contains(&role))
        .filter_map(Table::records)
        .flatten()
        .filter(|row| !is_header_row(row))
}

fn header_labels(table: &Table) -> Vec<String> {
    if !table.headers.is_empty() {
        return table.headers.clone();
    }
    table
        .records()
        .and_then(|rows| rows.first())
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default()
}

fn is_header_row(row: &Row) -> bool {
    !row.is_empty()
        && row
            .iter()
            .all(|(label, value)| value.trim().eq_ignore_ascii_case(label.trim()))
}

/// Value of the first alias present as a column, or "".
fn column<'a>(row: &'a Row, aliases: &[&str]) -> &'a str {
    aliases
        .iter()
        .find_map(|alias| {
            row.iter()
                .find(|(label, _)| label.trim().eq_ignore_ascii_case(alias))
                .map(|(_, value)| value.trim())
        })
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::TableData;
    use pretty_assertions::assert_eq;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        let records: Vec<Row> = rows
            .iter()
            .map(|cells| {
                headers
                    .iter()
                    .zip(cells.iter())
                    .map(|(h, c)| (h.to_string(), c.to_string()))
                    .collect()
            })
            .collect();
        Table {
            page_number: 1,
            table_index: 0,
            has_header: true,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            row_count: records.len(),
            data: TableData::Records(records),
        }
    }

    #[test]
    fn test_role_detection() {
        let types = table(&["Sl No.", "Site Dimension", "Number of Sites"], &[]);
        assert_eq!(TableRole::detect(&types), vec![TableRole::PlotTypes]);

        let listing = table(&["Plot No", "North Schedule", "South Schedule"], &[]);
        assert_eq!(
            TableRole::detect(&listing),
            vec![TableRole::PlotTypes, TableRole::PlotListing]
        );

        let other = table(&["Name", "Designation"], &[]);
        assert!(TableRole::detect(&other).is_empty());

        let mut headerless = types.clone();
        headerless.has_header = false;
        assert!(TableRole::detect(&headerless).is_empty());
    }

    #[test]
    fn test_plot_types() {
        let t = table(
            &["Sl No.", "Plot Type", "Number of Sites", "Total Area"],
            &[
                &["1", "30x40", "12", "1,440"],
                &["2", "40x60", "0", "0"],
                &["3", "", "4", "100"],
            ],
        );
        let types = extract_plot_types(&[t]);

        assert_eq!(
            types,
            vec![PlotType {
                sl_no: "1".into(),
                plot_type: "30x40".into(),
                number: 12,
                area: 1440,
            }]
        );
    }

    #[test]
    fn test_first_data_row_is_kept() {
        let t = table(&["Site Dimension", "Number"], &[&["30x40", "5"], &["40x60", "3"]]);
        let types = extract_plot_types(&[t]);
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].plot_type, "30x40");
    }

    #[test]
    fn test_aliases_are_case_insensitive_and_ranked() {
        let t = table(&["PLOT TYPE", "Site Dimension", "number"], &[&["Corner", "30x40", "2"]]);
        let types = extract_plot_types(&[t]);
        assert_eq!(types[0].plot_type, "Corner");
        assert_eq!(types[0].number, 2);
    }

    #[test]
    fn test_plot_listing() {
        let t = table(
            &["Sl No.", "Plot No.", "Plot Area", "North Schedule", "South Schedule", "East Schedule", "West Schedule"],
            &[
                &["Sl No.", "Plot No.", "Plot Area", "North Schedule", "South Schedule", "East Schedule", "West Schedule"],
                &["1", "A-1", "111.5 sqm", "Road", "Plot A-2", "Park", "Plot B-1"],
                &["2", "", "90", "Road", "", "", ""],
            ],
        );
        let plots = extract_plots(&[t]);

        assert_eq!(plots.len(), 1);
        assert_eq!(plots[0].plot_no, "A-1");
        assert_eq!(plots[0].area, 111.5);
        assert_eq!(plots[0].north, "Road");
        assert_eq!(plots[0].west, "Plot B-1");
        assert_eq!(plots[0].size, "");
    }
}
