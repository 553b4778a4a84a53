//! Extract command - resolve project fields from a structured document.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::{debug, info};

use rera_core::models::project::ProjectRecord;
use rera_core::project::{ExtractionResult, ProjectParser};

use super::{load_config, write_output};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Structured document JSON produced by `convert`
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Show which source produced each field, and any warnings
    #[arg(long)]
    show_sources: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Extracting project from {}", args.input.display());
    let parser = ProjectParser::from_config(&config);
    let result = parser.parse_json(&fs::read_to_string(&args.input)?)?;

    write_output(args.output.as_deref(), &format_project(&result.project, args.format)?)?;
    if args.show_sources {
        print_sources(&result);
    }

    debug!("Extraction took {}ms", result.processing_time_ms);
    Ok(())
}

/// Print field provenance and warnings to stderr.
pub fn print_sources(result: &ExtractionResult) {
    eprintln!();
    for (field, source) in &result.field_sources {
        eprintln!("{} {:<20} {}", style("ℹ").blue(), field, source);
    }
    for warning in &result.warnings {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }
}

pub fn format_project(project: &ProjectRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(project)?),
        OutputFormat::Csv => format_csv(project),
        OutputFormat::Text => Ok(format_text(project)),
    }
}

fn coordinate(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn format_csv(project: &ProjectRecord) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "filename",
        "project_name",
        "registration_number",
        "type",
        "status",
        "start_date",
        "completion_date",
        "district",
        "taluk",
        "pin_code",
        "latitude",
        "longitude",
        "approving_authority",
        "plan_number",
        "approval_date",
        "total_plots",
        "land_area",
        "total_cost",
    ])?;

    wtr.write_record([
        project.filename.as_str(),
        &project.project_name,
        &project.registration_number,
        &project.project_type,
        &project.status,
        &project.start_date,
        &project.completion_date,
        &project.district,
        &project.taluk,
        &project.pin_code,
        &coordinate(project.latitude),
        &coordinate(project.longitude),
        &project.approving_authority,
        &project.plan_number,
        &project.approval_date,
        &project.total_plots.to_string(),
        &project.land_area.to_string(),
        &project.total_cost.to_string(),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(project: &ProjectRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("Project: {}\n", project.project_name));
    if !project.registration_number.is_empty() {
        output.push_str(&format!("Registration: {}\n", project.registration_number));
    }
    output.push_str(&format!("Type: {}\n", project.project_type));
    output.push_str(&format!("Status: {}\n", project.status));
    output.push_str(&format!("Dates: {} - {}\n", project.start_date, project.completion_date));
    output.push('\n');

    output.push_str("Location:\n");
    output.push_str(&format!("  {}\n", project.address));
    output.push_str(&format!("  {}, {} {}\n", project.taluk, project.district, project.pin_code));
    match (project.latitude, project.longitude) {
        (Some(lat), Some(lon)) => output.push_str(&format!("  {:.6}, {:.6}\n", lat, lon)),
        _ => output.push_str("  coordinates not found\n"),
    }
    output.push('\n');

    output.push_str("Approval:\n");
    output.push_str(&format!("  {}\n", project.approving_authority));
    output.push_str(&format!("  Plan {} ({})\n", project.plan_number, project.approval_date));
    output.push('\n');

    output.push_str("Area statement:\n");
    output.push_str(&format!("  Plots: {}\n", project.total_plots));
    output.push_str(&format!("  Parks: {} ({} sqm)\n", project.parks_count, project.parks_area));
    output.push_str(&format!("  CA sites: {} ({} sqm)\n", project.ca_sites_count, project.ca_area));
    output.push_str(&format!("  Roads: {} sqm\n", project.roads_area));
    output.push_str(&format!("  Land: {} sqm\n", project.land_area));
    output.push('\n');

    output.push_str("Cost:\n");
    output.push_str(&format!("  Land:        {}\n", project.cost_land));
    output.push_str(&format!("  Development: {}\n", project.cost_development));
    output.push_str(&format!("  Total:       {}\n", project.total_cost));

    if !project.plot_types.is_empty() {
        output.push_str("\nPlot types:\n");
        for plot_type in &project.plot_types {
            output.push_str(&format!(
                "  {:<12} {:>5} sites {:>8} sqm\n",
                plot_type.plot_type, plot_type.number, plot_type.area
            ));
        }
    }
    if !project.plots.is_empty() {
        output.push_str(&format!("\nPlots listed: {}\n", project.plots.len()));
    }

    output
}
