//! Process command - convert and extract a single file in one step.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use rera_core::project::{ProjectExtractor, ProjectParser};

use super::extract::{OutputFormat, format_project, print_sources};
use super::{convert_file, load_config, write_output};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or extracted layout JSON)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also save the intermediate structured document here
    #[arg(long)]
    document: Option<PathBuf>,

    /// Show which source produced each field, and any warnings
    #[arg(long)]
    show_sources: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")?
            .progress_chars("##-"),
    );

    pb.set_message("Structuring document...");
    pb.set_position(10);
    let document = convert_file(&args.input, &config)?;

    if let Some(path) = &args.document {
        fs::write(path, document.to_json()?)?;
        debug!("Wrote structured document to {}", path.display());
    }

    pb.set_message("Extracting project fields...");
    pb.set_position(60);
    let result = ProjectParser::from_config(&config).parse(&document);

    pb.finish_and_clear();

    write_output(args.output.as_deref(), &format_project(&result.project, args.format)?)?;
    if args.show_sources {
        print_sources(&result);
    }

    debug!("Total processing time: {:?}", start.elapsed());
    Ok(())
}
