//! Coordinate reconciliation.
//!
//! Project documents state location in several ways: plain latitude and
//! longitude fields, four boundary points (north, east, west, south) as
//! separate fields or packed into one string such as
//! `"13.2North Longitude:77.5"`, or only in running text. Resolution runs
//! through these forms in a fixed order and never overwrites a value once
//! it has been set.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::numbers::extract_float;
use super::patterns::{COMBINED_BOUNDARY, LABELLED_LATITUDE, LABELLED_LONGITUDE};
use crate::models::config::CoordinateConfig;
use crate::models::document::KeyValues;
use crate::models::project::CoordinateSource;

/// Boundary directions, in the order keys are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    East,
    West,
    South,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::West,
        Direction::South,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::West => "west",
            Direction::South => "south",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

lazy_static! {
    /// `<Direction> Latitude <n>` and `<Direction> Longitude <n>` per direction.
    static ref BOUNDARY_TEXT: Vec<(Direction, Regex, Regex)> = Direction::ALL
        .iter()
        .map(|&dir| {
            let lat = Regex::new(&format!(r"(?i){}\s+Latitude[:\s]+([\d.]+)", dir.name())).unwrap();
            let lon = Regex::new(&format!(r"(?i){}\s+Longitude[:\s]+([\d.]+)", dir.name())).unwrap();
            (dir, lat, lon)
        })
        .collect();
}

/// Boundary points collected so far, indexed by [`Direction`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Boundary {
    pub latitudes: [Option<f64>; 4],
    pub longitudes: [Option<f64>; 4],
}

impl Boundary {
    pub fn latitude(&self, dir: Direction) -> Option<f64> {
        self.latitudes[dir.index()]
    }

    pub fn longitude(&self, dir: Direction) -> Option<f64> {
        self.longitudes[dir.index()]
    }

    fn set_latitude(&mut self, dir: Direction, value: f64) {
        let slot = &mut self.latitudes[dir.index()];
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    fn set_longitude(&mut self, dir: Direction, value: f64) {
        let slot = &mut self.longitudes[dir.index()];
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    /// Midpoint of the extremes on each axis, when both axes have a point.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        let lat = midpoint(&self.latitudes)?;
        let lon = midpoint(&self.longitudes)?;
        Some((lat, lon))
    }
}

fn midpoint(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    let min = present.iter().copied().fold(f64::INFINITY, f64::min);
    let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((min + max) / 2.0)
}

/// Outcome of coordinate resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedCoordinates {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    latitude_source: Option<CoordinateSource>,
    longitude_source: Option<CoordinateSource>,
}

impl ResolvedCoordinates {
    /// Step that produced the result; `Mixed` when the two coordinates differ.
    pub fn source(&self) -> Option<CoordinateSource> {
        match (self.latitude_source, self.longitude_source) {
            (Some(a), Some(b)) if a == b => Some(a),
            (Some(_), Some(_)) => Some(CoordinateSource::Mixed),
            (a, b) => a.or(b),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    fn fill_latitude(&mut self, value: f64, source: CoordinateSource) {
        if self.latitude.is_none() {
            self.latitude = Some(value);
            self.latitude_source = Some(source);
        }
    }

    fn fill_longitude(&mut self, value: f64, source: CoordinateSource) {
        if self.longitude.is_none() {
            self.longitude = Some(value);
            self.longitude_source = Some(source);
        }
    }
}

/// Resolves one latitude/longitude pair from key-value fields and body text.
#[derive(Debug, Clone)]
pub struct CoordinateResolver {
    bounds: CoordinateConfig,
}

impl CoordinateResolver {
    pub fn new() -> Self {
        Self::with_bounds(CoordinateConfig::default())
    }

    pub fn with_bounds(bounds: CoordinateConfig) -> Self {
        Self { bounds }
    }

    /// Latitude strictly inside the configured interval and not exactly zero.
    pub fn is_valid_latitude(&self, value: f64) -> bool {
        value != 0.0 && self.bounds.lat_min < value && value < self.bounds.lat_max
    }

    /// Longitude strictly inside the configured interval and not exactly zero.
    pub fn is_valid_longitude(&self, value: f64) -> bool {
        value != 0.0 && self.bounds.lon_min < value && value < self.bounds.lon_max
    }

    /// Split a combined boundary string into its two numbers.
    ///
    /// The value must start with the latitude: `"13.2North Longitude:77.5"`.
    pub fn parse_combined(value: &str) -> Option<(Option<f64>, Option<f64>)> {
        COMBINED_BOUNDARY
            .captures(value)
            .map(|caps| (extract_float(&caps[1]), extract_float(&caps[2])))
    }

    /// Run every resolution step against the pairs and body text.
    pub fn resolve(&self, pairs: &KeyValues, body: &str) -> ResolvedCoordinates {
        let mut result = ResolvedCoordinates::default();

        // Direct fields.
        if let Some(lat) = pairs.get("latitude").and_then(|v| extract_float(v)) {
            if self.is_valid_latitude(lat) {
                result.fill_latitude(lat, CoordinateSource::Direct);
            }
        }
        if let Some(lon) = pairs.get("longitude").and_then(|v| extract_float(v)) {
            if self.is_valid_longitude(lon) {
                result.fill_longitude(lon, CoordinateSource::Direct);
            }
        }

        let mut boundary = Boundary::default();
        self.collect_combined(pairs, &mut boundary);
        self.collect_separate(pairs, &mut boundary);
        self.apply_centroid(&boundary, &mut result, CoordinateSource::BoundaryFields);

        if !result.is_complete() {
            self.collect_text(body, &mut boundary);
            self.apply_centroid(&boundary, &mut result, CoordinateSource::BoundaryText);
        }

        if result.latitude.is_none() {
            if let Some(lat) = self.labelled(&LABELLED_LATITUDE, body, |v| self.is_valid_latitude(v)) {
                result.fill_latitude(lat, CoordinateSource::LabelledText);
            }
        }
        if result.longitude.is_none() {
            if let Some(lon) = self.labelled(&LABELLED_LONGITUDE, body, |v| self.is_valid_longitude(v)) {
                result.fill_longitude(lon, CoordinateSource::LabelledText);
            }
        }

        debug!(
            "Coordinates resolved: lat={:?} lon={:?} via {:?}",
            result.latitude,
            result.longitude,
            result.source()
        );
        result
    }

    /// Combined strings under `<direction>...latitude` keys.
    fn collect_combined(&self, pairs: &KeyValues, boundary: &mut Boundary) {
        for (key, value) in pairs {
            if !value.to_lowercase().contains("longitude") || !key.contains("latitude") {
                continue;
            }
            let Some(dir) = Direction::ALL.into_iter().find(|d| key.contains(d.name())) else {
                continue;
            };
            let Some((lat, lon)) = Self::parse_combined(value) else {
                continue;
            };

            if let Some(lat) = lat.filter(|&v| self.is_valid_latitude(v)) {
                boundary.set_latitude(dir, lat);
            }
            if let Some(lon) = lon.filter(|&v| self.is_valid_longitude(v)) {
                boundary.set_longitude(dir, lon);
            }
        }
    }

    /// Separate `<direction>_latitude` / `<direction>_longitude` fields.
    fn collect_separate(&self, pairs: &KeyValues, boundary: &mut Boundary) {
        for (key, value) in pairs {
            for dir in Direction::ALL {
                if key.contains(&format!("{}_latitude", dir.name())) {
                    if let Some(lat) = extract_float(value).filter(|&v| self.is_valid_latitude(v)) {
                        boundary.set_latitude(dir, lat);
                    }
                    break;
                }
                if key.contains(&format!("{}_longitude", dir.name())) {
                    if let Some(lon) = extract_float(value).filter(|&v| self.is_valid_longitude(v)) {
                        boundary.set_longitude(dir, lon);
                    }
                    break;
                }
            }
        }
    }

    /// Boundary labels in running text.
    fn collect_text(&self, body: &str, boundary: &mut Boundary) {
        for (dir, lat_re, lon_re) in BOUNDARY_TEXT.iter() {
            if let Some(lat) = first_number(lat_re, body).filter(|&v| self.is_valid_latitude(v)) {
                boundary.set_latitude(*dir, lat);
            }
            if let Some(lon) = first_number(lon_re, body).filter(|&v| self.is_valid_longitude(v)) {
                boundary.set_longitude(*dir, lon);
            }
        }
    }

    fn apply_centroid(&self, boundary: &Boundary, result: &mut ResolvedCoordinates, source: CoordinateSource) {
        let Some((lat, lon)) = boundary.centroid() else {
            return;
        };
        if self.is_valid_latitude(lat) && self.is_valid_longitude(lon) {
            result.fill_latitude(lat, source);
            result.fill_longitude(lon, source);
        }
    }

    /// First undirected `Latitude:` / `Longitude:` label that holds a valid value.
    fn labelled(&self, re: &Regex, body: &str, valid: impl Fn(f64) -> bool) -> Option<f64> {
        re.captures_iter(body)
            .filter(|caps| caps.get(1).is_none())
            .filter_map(|caps| caps[2].parse::<f64>().ok())
            .find(|&v| valid(v))
    }
}

impl Default for CoordinateResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn first_number(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text).and_then(|caps| extract_float(&caps[1]))
}
