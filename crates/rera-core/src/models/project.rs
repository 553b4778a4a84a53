//! Typed project record derived from a structured RERA document.

use serde::{Deserialize, Serialize};

/// Fields resolved for one layout project.
///
/// Numeric fields default to zero and text fields to the empty string when
/// no source yields a usable value. Coordinates stay absent instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectRecord {
    /// Source file name of the document.
    pub filename: String,

    pub project_name: String,

    /// RERA registration number (PRM/KA/RERA/...).
    pub registration_number: String,

    pub description: String,

    #[serde(rename = "type")]
    pub project_type: String,

    pub status: String,

    /// DD-MM-YYYY.
    pub start_date: String,

    /// DD-MM-YYYY.
    pub completion_date: String,

    pub address: String,
    pub district: String,
    pub taluk: String,
    pub pin_code: String,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Which resolution step produced the coordinates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate_source: Option<CoordinateSource>,

    pub approving_authority: String,
    pub plan_number: String,

    /// DD-MM-YYYY.
    pub approval_date: String,

    pub water_source: String,

    pub total_plots: u64,

    // Areas in square metres, as printed in the area statement.
    pub covered_area: u64,
    pub parks_count: u64,
    pub parks_area: u64,
    pub ca_sites_count: u64,
    pub ca_area: u64,
    pub roads_area: u64,
    pub open_area: u64,
    pub land_area: u64,

    // Costs in rupees.
    pub cost_land: u64,
    pub cost_development: u64,
    pub total_cost: u64,

    /// Aggregate rows of the plot-type table.
    pub plot_types: Vec<PlotType>,

    /// Rows of the individual plot schedule.
    pub plots: Vec<Plot>,
}

impl ProjectRecord {
    /// Check whether both coordinates were resolved.
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// One row of a plot-type aggregate table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotType {
    pub sl_no: String,
    #[serde(rename = "type")]
    pub plot_type: String,
    pub number: u64,
    pub area: u64,
}

/// One row of an individual plot schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Plot {
    pub sl_no: String,
    pub plot_no: String,
    #[serde(rename = "type")]
    pub plot_type: String,
    pub size: String,
    pub area: f64,
    pub north: String,
    pub south: String,
    pub east: String,
    pub west: String,
}

/// Resolution step that produced a coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSource {
    /// Plain `latitude` / `longitude` fields.
    Direct,
    /// Midpoint of boundary points found in key-value fields.
    BoundaryFields,
    /// Midpoint of boundary points found in the document body.
    BoundaryText,
    /// Labelled `Latitude:` / `Longitude:` text.
    LabelledText,
    /// Different steps produced the two coordinates.
    Mixed,
}

impl CoordinateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoordinateSource::Direct => "direct",
            CoordinateSource::BoundaryFields => "boundary_fields",
            CoordinateSource::BoundaryText => "boundary_text",
            CoordinateSource::LabelledText => "labelled_text",
            CoordinateSource::Mixed => "mixed",
        }
    }
}

impl std::fmt::Display for CoordinateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
