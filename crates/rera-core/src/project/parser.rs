//! Project parser: layered candidate sources per field.
//!
//! Each field has an ordered list of sources (key-value pairs, then an
//! anchored pattern over the body text, then for some fields a section or
//! file-name fallback). The first source yielding a usable value wins and
//! is recorded in [`ExtractionResult::field_sources`].

use std::collections::BTreeMap;
use std::time::Instant;

use regex::Regex;
use tracing::{debug, info};

use crate::models::config::ReraConfig;
use crate::models::document::{DocumentRecord, KeyValues};
use crate::models::project::ProjectRecord;

use super::rules::{
    clean_text, extract_date, extract_number, extract_plot_types, extract_plots,
    numbers::is_valid_date, patterns::*, CoordinateResolver, ExtractionMatch, FieldSource,
};
use super::ProjectExtractor;

/// Result of project extraction.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Resolved project fields.
    pub project: ProjectRecord,
    /// Source of every field that did not fall back to its default.
    pub field_sources: BTreeMap<&'static str, FieldSource>,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Rule-based project parser.
#[derive(Debug, Clone, Default)]
pub struct ProjectParser {
    resolver: CoordinateResolver,
}

impl ProjectParser {
    /// Create a parser with default coordinate bounds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser from configuration.
    pub fn from_config(config: &ReraConfig) -> Self {
        Self {
            resolver: CoordinateResolver::with_bounds(config.coordinates.clone()),
        }
    }

    /// Parse a document record serialized as JSON.
    pub fn parse_json(&self, json: &str) -> crate::Result<ExtractionResult> {
        let document = DocumentRecord::from_json(json)?;
        Ok(self.parse(&document))
    }
}

/// Inputs shared by all fields of one document.
struct Sources<'a> {
    document: &'a DocumentRecord,
    pairs: KeyValues,
    body: String,
}

impl<'a> Sources<'a> {
    fn new(document: &'a DocumentRecord) -> Self {
        Self {
            document,
            pairs: document.merged_key_values(),
            body: document.body_text(),
        }
    }

    /// First of `keys` whose value parses.
    fn pair<T>(&self, keys: &[&str], parse: impl Fn(&str) -> Option<T>) -> Option<ExtractionMatch<T>> {
        keys.iter().find_map(|key| {
            let value = self.pairs.get(*key)?;
            parse(value.as_str()).map(|v| ExtractionMatch::new(v, FieldSource::KeyValue(key.to_string())))
        })
    }

    /// First match of `re` over the body whose group 1 parses.
    fn text<T>(&self, re: &Regex, parse: impl Fn(&str) -> Option<T>) -> Option<ExtractionMatch<T>> {
        re.captures_iter(&self.body).find_map(|caps| {
            let m = caps.get(1)?;
            parse(m.as_str())
                .map(|v| ExtractionMatch::new(v, FieldSource::Text).with_position(m.start(), m.end()))
        })
    }

    /// First integer in the content of a section whose key contains `fragment`.
    fn section_number(&self, fragment: &str) -> Option<ExtractionMatch<u64>> {
        self.document
            .sections
            .iter()
            .filter(|s| s.key.contains(fragment))
            .find_map(|s| {
                extract_number(&s.content.join(" "))
                    .map(|n| ExtractionMatch::new(n, FieldSource::Section(s.key.clone())))
            })
    }

    /// File name without extension, underscores as spaces.
    fn filename_title(&self) -> Option<ExtractionMatch<String>> {
        let name = &self.document.source_file;
        let stem = name
            .strip_suffix(".pdf")
            .or_else(|| name.strip_suffix(".PDF"))
            .unwrap_or(name);
        text_value(&stem.replace('_', " ")).map(|v| ExtractionMatch::new(v, FieldSource::Filename))
    }
}

/// Collects winners and their sources.
#[derive(Default)]
struct Resolved {
    sources: BTreeMap<&'static str, FieldSource>,
}

impl Resolved {
    fn take<T: Default>(&mut self, field: &'static str, found: Option<ExtractionMatch<T>>) -> T {
        match found {
            Some(m) => {
                debug!("{} <- {}", field, m.source);
                self.sources.insert(field, m.source);
                m.value
            }
            None => T::default(),
        }
    }

    fn has(&self, field: &str) -> bool {
        self.sources.contains_key(field)
    }
}

fn text_value(raw: &str) -> Option<String> {
    let cleaned = clean_text(raw);
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Text before `marker`, cleaned.
fn text_before(raw: &str, marker: &str) -> Option<String> {
    text_value(raw.split(marker).next().unwrap_or_default())
}

fn water_value(raw: &str) -> Option<String> {
    text_value(clean_text(raw).trim_end_matches(',').trim())
}

fn date_value(raw: &str) -> Option<String> {
    is_valid_date(raw).then(|| raw.to_string())
}

fn plan_number(raw: &str) -> Option<String> {
    PLAN_NUMBER.captures(raw).map(|caps| caps[1].to_string())
}

impl ProjectExtractor for ProjectParser {
    fn parse(&self, document: &DocumentRecord) -> ExtractionResult {
        let start = Instant::now();
        let src = Sources::new(document);
        let mut r = Resolved::default();
        let mut warnings = Vec::new();

        info!("Extracting project fields from {}", document.source_file);

        let mut project = ProjectRecord {
            filename: document.source_file.clone(),
            ..Default::default()
        };

        // Identity and description
        project.project_name = r.take(
            "project_name",
            src.pair(&["project_name"], |v| text_before(v, "Project Description"))
                .or_else(|| src.filename_title()),
        );
        project.registration_number = r.take(
            "registration_number",
            src.pair(
                &["registration_number", "project_registration_number", "rera_registration_number"],
                text_value,
            )
            .or_else(|| src.text(&REGISTRATION_NUMBER, text_value)),
        );
        project.description = r.take(
            "description",
            src.pair(&["project_description", "description"], text_value)
                .or_else(|| src.text(&DESCRIPTION, text_value)),
        );
        project.project_type = r.take(
            "type",
            src.pair(&["project_type"], |v| text_before(v, "Project Status"))
                .or_else(|| src.text(&PROJECT_TYPE, text_value)),
        );
        project.status = r.take(
            "status",
            src.pair(&["project_status"], text_value)
                .or_else(|| src.text(&PROJECT_STATUS, text_value)),
        );

        // Dates
        project.start_date = r.take(
            "start_date",
            src.pair(&["project_start_date"], extract_date)
                .or_else(|| src.text(&START_DATE, date_value)),
        );
        project.completion_date = r.take(
            "completion_date",
            src.pair(&["proposed_completion_date"], extract_date)
                .or_else(|| {
                    src.pair(&["project_start_date"], |v| {
                        v.split_once("Proposed Completion Date")
                            .and_then(|(_, tail)| extract_date(tail))
                    })
                })
                .or_else(|| src.text(&COMPLETION_DATE, date_value)),
        );

        // Location
        project.address = r.take("address", src.pair(&["project_address"], text_value));
        project.district = r.take("district", src.pair(&["district"], text_value));
        project.taluk = r.take("taluk", src.pair(&["taluk"], text_value));
        project.pin_code = r.take("pin_code", src.pair(&["pin_code"], text_value));

        let coordinates = self.resolver.resolve(&src.pairs, &src.body);
        project.latitude = coordinates.latitude;
        project.longitude = coordinates.longitude;
        project.coordinate_source = coordinates.source();
        if let Some(source) = project.coordinate_source {
            if project.latitude.is_some() {
                r.sources.insert("latitude", FieldSource::Coordinates(source));
            }
            if project.longitude.is_some() {
                r.sources.insert("longitude", FieldSource::Coordinates(source));
            }
        }

        // Approval
        project.approving_authority =
            r.take("approving_authority", src.pair(&["approving_authority"], text_value));
        project.plan_number = r.take("plan_number", src.pair(&["approved_plan_number"], plan_number));
        project.approval_date = r.take(
            "approval_date",
            src.pair(&["plan_approval_date"], extract_date)
                .or_else(|| {
                    src.pair(&["approved_plan_number"], |v| {
                        APPROVAL_DATE
                            .captures(v)
                            .and_then(|caps| date_value(&caps[1]))
                    })
                })
                .or_else(|| src.text(&APPROVAL_DATE, date_value)),
        );
        project.water_source = r.take(
            "water_source",
            src.pair(&["source_of_water"], water_value)
                .or_else(|| src.text(&WATER_SOURCE, water_value)),
        );

        // Area statement
        project.total_plots = r.take(
            "total_plots",
            src.pair(&["number_of_plots", "total_number_of_sitesplots"], extract_number)
                .or_else(|| src.text(&TOTAL_PLOTS, extract_number)),
        );
        project.covered_area = r.take("covered_area", src.text(&COVERED_AREA, extract_number));
        project.parks_count = r.take(
            "parks_count",
            src.pair(&["total_number_of_parks"], extract_number)
                .or_else(|| src.text(&PARKS_COUNT, extract_number)),
        );
        project.parks_area = r.take("parks_area", src.text(&PARKS_AREA, extract_number));
        project.ca_sites_count = r.take(
            "ca_sites_count",
            src.pair(&["total_number_of_ca_sites"], extract_number)
                .or_else(|| src.text(&CA_SITES_COUNT, extract_number)),
        );
        project.ca_area = r.take("ca_area", src.text(&CA_AREA, extract_number));
        project.roads_area = r.take("roads_area", src.text(&ROADS_AREA, extract_number));
        project.open_area = r.take("open_area", src.text(&OPEN_AREA, extract_number));
        project.land_area = r.take("land_area", src.text(&LAND_AREA, extract_number));

        // Costs
        project.cost_land = r.take(
            "cost_land",
            src.text(&COST_LAND, extract_number)
                .or_else(|| src.section_number("cost_of_land")),
        );
        project.cost_development =
            r.take("cost_development", src.text(&COST_DEVELOPMENT, extract_number));
        project.total_cost = r.take("total_cost", src.text(&TOTAL_COST, extract_number));

        // Tables
        project.plot_types = extract_plot_types(&document.tables);
        if !project.plot_types.is_empty() {
            r.sources.insert("plot_types", FieldSource::Table);
        }
        project.plots = extract_plots(&document.tables);
        if !project.plots.is_empty() {
            r.sources.insert("plots", FieldSource::Table);
        }

        if !matches!(r.sources.get("project_name"), Some(FieldSource::KeyValue(_))) {
            warnings.push("Could not extract project name".to_string());
        }
        if !project.has_coordinates() {
            warnings.push("Could not resolve coordinates".to_string());
        }
        if !r.has("total_plots") {
            warnings.push("Could not extract total number of plots".to_string());
        }
        if !r.has("total_cost") {
            warnings.push("Could not extract total project cost".to_string());
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "Extracted '{}': {} fields resolved, {} warnings in {}ms",
            project.project_name,
            r.sources.len(),
            warnings.len(),
            processing_time_ms
        );

        ExtractionResult {
            project,
            field_sources: r.sources,
            warnings,
            processing_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::ReraConfig;
    use crate::models::layout::{ExtractedLayout, PageLines, RawTable, TextLine};
    use crate::models::project::CoordinateSource;
    use crate::structure::assemble;
    use pretty_assertions::assert_eq;

    fn lines(texts: &[&str]) -> Vec<TextLine> {
        texts.iter().map(|t| TextLine::plain(*t)).collect()
    }

    fn sample_document() -> DocumentRecord {
        let layout = ExtractedLayout {
            source_file: "Green_Acres.pdf".into(),
            is_scanned: false,
            pages: vec![
                PageLines::new(
                    1,
                    lines(&[
                        "PROJECT DETAILS",
                        "Project Name : Green Acres Layout",
                        "Registration Number : PRM/KA/RERA/1251/446/PR/171014/000212",
                        "Project Type : Plotted Development",
                        "Project Status : New",
                        "Project Start Date : 01-02-2020 Proposed Completion Date : 31-12-2023",
                        "District : Mysuru",
                        "Taluk : Hunsur",
                        "Pin Code : 571105",
                        "Source of Water : Borewell,",
                        "North Latitude : 12.31North Longitude:76.29",
                        "South Latitude : 12.29South Longitude:76.27",
                    ]),
                ),
                PageLines::new(
                    2,
                    lines(&[
                        "AREA STATEMENT",
                        "Total Number of Sites/Plots 120",
                        "Cost of Land (C1) 2500000",
                        "Cost of Layout Development (C2) 4000000",
                        "Total Project Cost (C1+C2) 6500000",
                    ]),
                ),
            ],
            tables: vec![RawTable::from_strings(
                2,
                0,
                vec![
                    vec!["Sl No.", "Plot Type", "Number of Sites", "Total Area"],
                    vec!["1", "30x40", "80", "8920"],
                    vec!["2", "40x60", "40", "8920"],
                ],
            )],
        };
        assemble(&layout, &ReraConfig::default()).unwrap()
    }

    #[test]
    fn test_full_document() {
        let result = ProjectParser::new().parse(&sample_document());
        let p = &result.project;

        assert_eq!(p.filename, "Green_Acres.pdf");
        assert_eq!(p.project_name, "Green Acres Layout");
        assert_eq!(p.registration_number, "PRM/KA/RERA/1251/446/PR/171014/000212");
        assert_eq!(p.project_type, "Plotted Development");
        assert_eq!(p.status, "New");
        assert_eq!(p.start_date, "01-02-2020");
        assert_eq!(p.completion_date, "31-12-2023");
        assert_eq!(p.district, "Mysuru");
        assert_eq!(p.taluk, "Hunsur");
        assert_eq!(p.pin_code, "571105");
        assert_eq!(p.water_source, "Borewell");
        assert_eq!(p.total_plots, 120);
        assert_eq!(p.cost_land, 2_500_000);
        assert_eq!(p.cost_development, 4_000_000);
        assert_eq!(p.total_cost, 6_500_000);
        assert_eq!(p.description, "");

        assert!((p.latitude.unwrap() - 12.30).abs() < 1e-9);
        assert!((p.longitude.unwrap() - 76.28).abs() < 1e-9);
        assert_eq!(p.coordinate_source, Some(CoordinateSource::BoundaryFields));

        assert_eq!(p.plot_types.len(), 2);
        assert_eq!(p.plot_types[0].number, 80);

        assert_eq!(
            result.field_sources["project_name"],
            FieldSource::KeyValue("project_name".into())
        );
        assert_eq!(result.field_sources["total_plots"], FieldSource::Text);
        assert_eq!(
            result.field_sources["completion_date"],
            FieldSource::KeyValue("project_start_date".into())
        );
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_empty_document_defaults() {
        let document = DocumentRecord {
            source_file: "sno_12_Sunrise_Enclave.pdf".into(),
            ..Default::default()
        };
        let result = ProjectParser::new().parse(&document);

        assert_eq!(result.project.project_name, "sno 12 Sunrise Enclave");
        assert_eq!(result.field_sources["project_name"], FieldSource::Filename);
        assert_eq!(result.project.total_plots, 0);
        assert_eq!(result.project.latitude, None);
        assert_eq!(result.warnings.len(), 4);
    }

    #[test]
    fn test_key_value_beats_text() {
        let mut document = DocumentRecord::default();
        document
            .key_value_pairs
            .insert("project_description".into(), "Residential  plots".into());
        document.raw_text_by_page = vec!["Project Description: Something else".into()];

        let project = ProjectParser::new().extract(&document);
        assert_eq!(project.description, "Residential plots");
    }

    #[test]
    fn test_description_from_text_stops_at_type() {
        let mut document = DocumentRecord::default();
        document.raw_text_by_page = vec![
            "Project Description: Residential layout\nwith parks Project Type: Plotted".into(),
        ];

        let project = ProjectParser::new().extract(&document);
        assert_eq!(project.description, "Residential layout with parks");
        assert_eq!(project.project_type, "Plotted");
    }

    #[test]
    fn test_cost_of_land_section_fallback() {
        let mut document = DocumentRecord::default();
        document
            .sections
            .get_or_create("cost_of_land_details", "COST OF LAND DETAILS")
            .content
            .push("Rs 1,500,000 towards land".into());

        let result = ProjectParser::new().parse(&document);
        assert_eq!(result.project.cost_land, 1_500_000);
        assert_eq!(
            result.field_sources["cost_land"],
            FieldSource::Section("cost_of_land_details".into())
        );
    }

    #[test]
    fn test_invalid_dates_fall_through() {
        let mut document = DocumentRecord::default();
        document
            .key_value_pairs
            .insert("project_start_date".into(), "00-00-0000".into());
        document.raw_text_by_page = vec!["Start Date: At the time of Registration 05-06-2021".into()];

        let project = ProjectParser::new().extract(&document);
        assert_eq!(project.start_date, "05-06-2021");
    }

    #[test]
    fn test_plan_number_and_approval_date() {
        let mut document = DocumentRecord::default();
        document.key_value_pairs.insert(
            "approved_plan_number".into(),
            "MUDA/LAO/123/2019-20 Plan Approval Date: 12-03-2020".into(),
        );

        let project = ProjectParser::new().extract(&document);
        assert_eq!(project.plan_number, "MUDA/LAO/123/2019-20");
        assert_eq!(project.approval_date, "12-03-2020");
    }

    #[test]
    fn test_parse_json() {
        let json = sample_document().to_json().unwrap();
        let result = ProjectParser::new().parse_json(&json).unwrap();
        assert_eq!(result.project.project_name, "Green Acres Layout");
        assert!(ProjectParser::new().parse_json("{not json").is_err());
    }
}
