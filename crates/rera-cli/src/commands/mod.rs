//! CLI command implementations.

pub mod batch;
pub mod config;
pub mod convert;
pub mod extract;
pub mod process;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use rera_core::models::config::ReraConfig;
use rera_core::models::document::DocumentRecord;
use rera_core::models::layout::ExtractedLayout;
use rera_core::pdf::{PdfExtractor, PdfProcessor};

/// Location of the user configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rera")
        .join("config.json")
}

/// Load configuration from `--config`, the user config file, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ReraConfig> {
    if let Some(path) = config_path {
        return Ok(ReraConfig::from_file(Path::new(path))?);
    }

    let user_config = default_config_path();
    if user_config.exists() {
        debug!("Using config from {}", user_config.display());
        return Ok(ReraConfig::from_file(&user_config)?);
    }

    Ok(ReraConfig::default())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Convert a PDF or a layout JSON file into a structured document.
pub fn convert_file(path: &Path, config: &ReraConfig) -> anyhow::Result<DocumentRecord> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let layout = match extension.as_str() {
        "pdf" => {
            let data = fs::read(path)?;
            let mut extractor = PdfExtractor::from_config(config);
            extractor.load(&data)?;
            extractor.extract_layout(&file_name(path))?
        }
        "json" => {
            let mut layout = ExtractedLayout::from_json(&fs::read_to_string(path)?)?;
            if layout.source_file.is_empty() {
                layout.source_file = file_name(path);
            }
            layout
        }
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    };

    Ok(rera_core::assemble(&layout, config)?)
}

/// Write `content` to `output`, or print it when no path is given.
pub fn write_output(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, content)?;
            eprintln!(
                "{} Output written to {}",
                console::style("✓").green(),
                path.display()
            );
        }
        None => println!("{}", content),
    }
    Ok(())
}
