//! Anchored regex patterns for RERA Karnataka project documents.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Identifiers
    pub static ref REGISTRATION_NUMBER: Regex = Regex::new(
        r"(?i)\b(PRM/KA/RERA/[A-Z0-9/]+)"
    ).unwrap();

    pub static ref PLAN_NUMBER: Regex = Regex::new(
        r"([A-Z0-9/_-]+)"
    ).unwrap();

    // Descriptive text. Description may span lines; type and status end with the line.
    pub static ref DESCRIPTION: Regex = Regex::new(
        r"(?is)Project Description[:\s]+(.*?)(?:Project Type|Project Status|\z)"
    ).unwrap();

    pub static ref PROJECT_TYPE: Regex = Regex::new(
        r"(?im)Project Type[:\s]+(.*?)(?:Project Status|$)"
    ).unwrap();

    pub static ref PROJECT_STATUS: Regex = Regex::new(
        r"(?im)Project Status[:\s]+(.*?)(?:Start Date|Proposed|$)"
    ).unwrap();

    pub static ref WATER_SOURCE: Regex = Regex::new(
        r"(?im)Source of Water[:\s]+(.*?)(?:,|$)"
    ).unwrap();

    // Dates (DD-MM-YYYY)
    pub static ref DATE_DMY: Regex = Regex::new(
        r"(\d{2})-(\d{2})-(\d{4})"
    ).unwrap();

    pub static ref START_DATE: Regex = Regex::new(
        r"(?i)Start Date[:\s]+(?:At the time of Registration[:\s]+)?(\d{2}-\d{2}-\d{4})"
    ).unwrap();

    pub static ref COMPLETION_DATE: Regex = Regex::new(
        r"(?i)Proposed Completion Date[:\s]+(\d{2}-\d{2}-\d{4})"
    ).unwrap();

    pub static ref APPROVAL_DATE: Regex = Regex::new(
        r"(?i)Plan Approval Date[:\s]+(\d{2}-\d{2}-\d{4})"
    ).unwrap();

    // Area statement
    pub static ref TOTAL_PLOTS: Regex = Regex::new(
        r"(?i)Total Number of Sites/Plots[:\s]*(\d+)"
    ).unwrap();

    pub static ref COVERED_AREA: Regex = Regex::new(
        r"(?i)Total Covered Area[^A]*A[:\s]*(\d+)"
    ).unwrap();

    pub static ref PARKS_COUNT: Regex = Regex::new(
        r"(?i)Total Number of Parks[^0-9]*(\d+)"
    ).unwrap();

    pub static ref PARKS_AREA: Regex = Regex::new(
        r"(?i)Total Area of Parks[^B]*B1[:\s]*(\d+)"
    ).unwrap();

    pub static ref CA_SITES_COUNT: Regex = Regex::new(
        r"(?i)Total Number of CA Sites[:\s]*(\d+)"
    ).unwrap();

    pub static ref CA_AREA: Regex = Regex::new(
        r"(?i)Total Area of CA Sites[^B]*B2[:\s]*(\d+)"
    ).unwrap();

    pub static ref ROADS_AREA: Regex = Regex::new(
        r"(?i)Total Area of Roads[^B]*B3[:\s]*(\d+)"
    ).unwrap();

    pub static ref OPEN_AREA: Regex = Regex::new(
        r"(?i)Total Open Area[^=]*=[:\s]*(\d+)"
    ).unwrap();

    pub static ref LAND_AREA: Regex = Regex::new(
        r"(?i)Total Area Land[^+]*\+[:\s]*(\d+)"
    ).unwrap();

    // Costs
    pub static ref COST_LAND: Regex = Regex::new(
        r"(?i)Cost of Land[^0-9]*\(C1\)[:\s]*(\d+)"
    ).unwrap();

    pub static ref COST_DEVELOPMENT: Regex = Regex::new(
        r"(?i)Cost of Layout Development[^0-9]*\(C2\)[:\s]*(\d+)"
    ).unwrap();

    pub static ref TOTAL_COST: Regex = Regex::new(
        r"(?i)Total Project Cost[^:]*\(C1\+C2\)[:\s]*(\d+)"
    ).unwrap();

    // Coordinates
    pub static ref COMBINED_BOUNDARY: Regex = Regex::new(
        r"(?i)^([\d.]+)\s*(?:North|East|West|South)\s*Longitude[:\s]*([\d.]+)"
    ).unwrap();

    pub static ref LABELLED_LATITUDE: Regex = Regex::new(
        r"(?im)(?:^|\s)((?:north|east|west|south)\s+)?latitude[:\s]+([\d.]+)"
    ).unwrap();

    pub static ref LABELLED_LONGITUDE: Regex = Regex::new(
        r"(?im)(?:^|\s)((?:north|east|west|south)\s+)?longitude[:\s]+([\d.]+)"
    ).unwrap();

    // Numbers
    pub static ref INTEGER: Regex = Regex::new(r"(\d+)").unwrap();

    pub static ref DECIMAL: Regex = Regex::new(r"([\d.]+)").unwrap();

    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}
