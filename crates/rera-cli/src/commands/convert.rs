//! Convert command - structure a single PDF or layout file.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use tracing::{debug, info};

use super::{convert_file, load_config, write_output};

/// Arguments for the convert command.
#[derive(Args)]
pub struct ConvertArgs {
    /// Input file (PDF or extracted layout JSON)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

pub async fn run(args: ConvertArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Converting file: {}", args.input.display());
    let document = convert_file(&args.input, &config)?;

    let json = if args.compact {
        serde_json::to_string(&document)?
    } else {
        document.to_json()?
    };
    write_output(args.output.as_deref(), &json)?;

    debug!("Total conversion time: {:?}", start.elapsed());
    Ok(())
}
