//! Batch processing command for directories of project documents.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use lazy_static::lazy_static;
use regex::Regex;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use rera_core::models::config::ReraConfig;
use rera_core::models::document::DocumentRecord;
use rera_core::models::project::ProjectRecord;
use rera_core::project::{ProjectExtractor, ProjectParser};

use super::{convert_file, load_config};

lazy_static! {
    static ref SERIAL_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)sno[_\s]*(\d+)").unwrap(),
        Regex::new(r"^(\d+)").unwrap(),
        Regex::new(r"_(\d{3,})").unwrap(),
    ];
}

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern for input files (PDF or layout JSON)
    #[arg(required = true)]
    input: String,

    /// Directory for structured documents and reports
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Directory for project files (default: <output-dir>/projects)
    #[arg(long)]
    projects_dir: Option<PathBuf>,

    /// Regenerate documents even when they already exist
    #[arg(long)]
    no_skip: bool,

    /// Re-extract only documents that have no project file yet
    #[arg(long)]
    reprocess_failed: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Also write a summary CSV
    #[arg(long)]
    summary: bool,

    /// Also write all projects into one JSON file
    #[arg(long)]
    consolidated: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Only files whose serial number lies in this inclusive range
    #[arg(long, num_args = 2, value_names = ["FROM", "TO"])]
    serial_range: Option<Vec<u64>>,

    /// Only files modified on or after this date (YYYY-MM-DD)
    #[arg(long)]
    updated_after: Option<String>,

    /// Only files modified within the last N hours
    #[arg(long)]
    last_hours: Option<i64>,

    /// Only the N most recently modified files
    #[arg(long)]
    last_n: Option<usize>,

    /// Only files whose name matches this regex
    #[arg(long)]
    filename_pattern: Option<String>,
}

/// Selection criteria applied to the matched files.
#[derive(Debug, Default)]
struct Filters {
    serial_range: Option<(u64, u64)>,
    modified_since: Option<DateTime<Utc>>,
    last_n: Option<usize>,
    name_pattern: Option<Regex>,
}

impl Filters {
    fn from_args(args: &BatchArgs, now: DateTime<Utc>) -> anyhow::Result<Self> {
        let serial_range = match args.serial_range.as_deref() {
            Some([from, to]) => Some((*from, *to)),
            Some(_) => anyhow::bail!("--serial-range takes exactly two numbers"),
            None => None,
        };

        let after = args
            .updated_after
            .as_deref()
            .map(|d| {
                NaiveDate::parse_from_str(d, "%Y-%m-%d")
                    .map_err(|e| anyhow::anyhow!("Invalid --updated-after date {}: {}", d, e))
            })
            .transpose()?
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|d| d.and_utc());
        let recent = args.last_hours.map(|h| now - Duration::hours(h));

        Ok(Self {
            serial_range,
            modified_since: after.max(recent),
            last_n: args.last_n,
            name_pattern: args.filename_pattern.as_deref().map(Regex::new).transpose()?,
        })
    }

    fn apply(&self, mut files: Vec<FileEntry>) -> Vec<FileEntry> {
        files.retain(|f| {
            let name = f.name();
            let in_range = self.serial_range.is_none_or(|(from, to)| {
                serial_number(&name).is_some_and(|n| (from..=to).contains(&n))
            });
            let recent = self.modified_since.is_none_or(|since| f.modified >= since);
            let named = self.name_pattern.as_ref().is_none_or(|re| re.is_match(&name));
            in_range && recent && named
        });

        if let Some(n) = self.last_n {
            files.sort_by(|a, b| b.modified.cmp(&a.modified));
            files.truncate(n);
            files.sort_by(|a, b| a.path.cmp(&b.path));
        }
        files
    }
}

#[derive(Debug, Clone)]
struct FileEntry {
    path: PathBuf,
    modified: DateTime<Utc>,
}

impl FileEntry {
    fn read(path: PathBuf) -> anyhow::Result<Self> {
        let modified = fs::metadata(&path)?.modified()?.into();
        Ok(Self { path, modified })
    }

    fn name(&self) -> String {
        self.path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string()
    }
}

/// Serial number embedded in a file name (`sno_12`, leading digits, or `_123`).
fn serial_number(name: &str) -> Option<u64> {
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    SERIAL_PATTERNS
        .iter()
        .find_map(|re| re.captures(stem))
        .and_then(|caps| caps[1].parse().ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Processed,
    Skipped,
    Failed,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Processed => "success",
            Status::Skipped => "skipped",
            Status::Failed => "error",
        }
    }
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    status: Status,
    project: Option<ProjectRecord>,
    error: Option<String>,
    processing_time_ms: u64,
}

/// Where one job reads and writes.
#[derive(Clone)]
struct Job {
    documents_dir: PathBuf,
    projects_dir: PathBuf,
    skip_existing: bool,
    config: Arc<ReraConfig>,
}

impl Job {
    fn document_path(&self, path: &Path) -> anyhow::Result<PathBuf> {
        let stem = file_stem(path)?;
        Ok(self.documents_dir.join(format!("{}.json", stem)))
    }

    /// True when writing the document for `path` would replace `path` itself.
    fn overwrites_input(&self, path: &Path) -> bool {
        let Ok(document_path) = self.document_path(path) else {
            return false;
        };
        match (fs::canonicalize(&document_path), fs::canonicalize(path)) {
            (Ok(a), Ok(b)) => a == b,
            _ => document_path == path,
        }
    }

    fn run(&self, path: &Path) -> ProcessResult {
        let start = Instant::now();
        let outcome = self.process(path);
        let processing_time_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok((status, project)) => ProcessResult {
                path: path.to_path_buf(),
                status,
                project: Some(project),
                error: None,
                processing_time_ms,
            },
            Err(e) => ProcessResult {
                path: path.to_path_buf(),
                status: Status::Failed,
                project: None,
                error: Some(format!("{:#}", e)),
                processing_time_ms,
            },
        }
    }

    fn process(&self, path: &Path) -> anyhow::Result<(Status, ProjectRecord)> {
        let stem = file_stem(path)?;
        let document_path = self.document_path(path)?;
        let project_path = self.projects_dir.join(format!("{}.json", stem));

        if self.skip_existing && document_path.exists() && project_path.exists() {
            debug!("Skipping {}, outputs exist", path.display());
            let project = serde_json::from_str(&fs::read_to_string(&project_path)?)?;
            return Ok((Status::Skipped, project));
        }

        let document = if self.skip_existing && document_path.exists() {
            debug!("Reusing {}", document_path.display());
            DocumentRecord::from_json(&fs::read_to_string(&document_path)?)?
        } else {
            let document = convert_file(path, &self.config)?;
            fs::write(&document_path, document.to_json()?)?;
            document
        };

        let result = ProjectParser::from_config(&self.config).parse(&document);
        for warning in &result.warnings {
            debug!("{}: {}", stem, warning);
        }
        fs::write(&project_path, serde_json::to_string_pretty(&result.project)?)?;
        Ok((Status::Processed, result.project))
    }
}

fn file_stem(path: &Path) -> anyhow::Result<&str> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", path.display()))
}

/// Whether a progress line is due after `done` files; an interval of 0 never reports.
fn report_due(done: usize, interval: usize) -> bool {
    interval > 0 && done % interval == 0
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let projects_dir = args
        .projects_dir
        .clone()
        .unwrap_or_else(|| args.output_dir.join("projects"));
    fs::create_dir_all(&args.output_dir)?;
    fs::create_dir_all(&projects_dir)?;

    let candidates: Vec<PathBuf> = if args.reprocess_failed {
        unprocessed_documents(&args.output_dir, &projects_dir)?
    } else {
        glob(&args.input)?
            .filter_map(|r| r.ok())
            .filter(|p| {
                let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
                matches!(ext.to_lowercase().as_str(), "pdf" | "json")
            })
            .collect()
    };
    let found = candidates.len();

    let entries = candidates
        .into_iter()
        .map(FileEntry::read)
        .collect::<anyhow::Result<Vec<_>>>()?;
    let mut files: Vec<PathBuf> = Filters::from_args(&args, Utc::now())?
        .apply(entries)
        .into_iter()
        .map(|f| f.path)
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files, {} selected for processing",
        style("ℹ").blue(),
        found,
        files.len()
    );

    let jobs = args.jobs.unwrap_or(config.batch.jobs).max(1);
    let progress_interval = config.batch.progress_interval;
    let job = Job {
        documents_dir: args.output_dir.clone(),
        projects_dir: projects_dir.clone(),
        // Reprocessing reads documents from the output directory itself.
        skip_existing: (config.batch.skip_existing && !args.no_skip) || args.reprocess_failed,
        config: Arc::new(config),
    };

    // Reprocessing reads its documents in place.
    if !args.reprocess_failed {
        if let Some(path) = files.iter().find(|p| job.overwrites_input(p)) {
            anyhow::bail!(
                "Output would overwrite input {}; choose a different --output-dir",
                path.display()
            );
        }
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let semaphore = Arc::new(Semaphore::new(jobs));
    let mut handles = Vec::with_capacity(files.len());
    for path in files {
        let sem = Arc::clone(&semaphore);
        let job = job.clone();
        handles.push(tokio::spawn(async move {
            let _permit = sem.acquire_owned().await?;
            let result = tokio::task::spawn_blocking(move || job.run(&path)).await?;
            anyhow::Ok(result)
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        let result = handle.await??;
        pb.inc(1);

        if let Some(error_msg) = &result.error {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), error_msg);
            } else {
                error!("Failed to process {}: {}", result.path.display(), error_msg);
                pb.abandon();
                anyhow::bail!("Processing failed for {}: {}", result.path.display(), error_msg);
            }
        }

        results.push(result);
        if report_due(results.len(), progress_interval) {
            info!("Processed {}/{} files", results.len(), pb.length().unwrap_or(0));
        }
    }

    pb.finish_with_message("Complete");

    if args.consolidated {
        let consolidated_path = args.output_dir.join("all_projects.json");
        let projects: Vec<&ProjectRecord> = results.iter().filter_map(|r| r.project.as_ref()).collect();
        fs::write(&consolidated_path, serde_json::to_string_pretty(&projects)?)?;
        println!(
            "{} Consolidated projects written to {}",
            style("✓").green(),
            consolidated_path.display()
        );
    }

    if args.summary {
        let summary_path = args.output_dir.join("summary.csv");
        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    print_statistics(&results, found, start);
    Ok(())
}

/// Documents in `documents_dir` without a matching project file.
fn unprocessed_documents(documents_dir: &Path, projects_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut documents = Vec::new();
    for entry in fs::read_dir(documents_dir)? {
        let path = entry?.path();
        let is_document = path.is_file()
            && path.extension().is_some_and(|e| e == "json")
            && path.file_name().is_some_and(|n| n != "all_projects.json");
        if !is_document {
            continue;
        }
        if let Some(name) = path.file_name() {
            if !projects_dir.join(name).exists() {
                documents.push(path);
            }
        }
    }
    Ok(documents)
}

fn print_statistics(results: &[ProcessResult], found: usize, start: Instant) {
    let count = |status: Status| results.iter().filter(|r| r.status == status).count();
    let with_coordinates = results
        .iter()
        .filter_map(|r| r.project.as_ref())
        .filter(|p| p.has_coordinates())
        .count();
    let without_coordinates = results.iter().filter(|r| r.project.is_some()).count() - with_coordinates;

    println!();
    println!(
        "{} Handled {} of {} files in {:?}",
        style("✓").green(),
        results.len(),
        found,
        start.elapsed()
    );
    println!(
        "   {} processed, {} skipped, {} failed",
        style(count(Status::Processed)).green(),
        style(count(Status::Skipped)).cyan(),
        style(count(Status::Failed)).red()
    );
    println!(
        "   {} with coordinates, {} without",
        with_coordinates, without_coordinates
    );

    let failed: Vec<_> = results.iter().filter(|r| r.status == Status::Failed).collect();
    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "project_name",
        "latitude",
        "longitude",
        "total_plots",
        "total_cost",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result.path.file_name().and_then(|s| s.to_str()).unwrap_or("");

        match &result.project {
            Some(project) => wtr.write_record([
                filename,
                result.status.as_str(),
                &project.project_name,
                &project.latitude.map(|v| v.to_string()).unwrap_or_default(),
                &project.longitude.map(|v| v.to_string()).unwrap_or_default(),
                &project.total_plots.to_string(),
                &project.total_cost.to_string(),
                &result.processing_time_ms.to_string(),
                "",
            ])?,
            None => wtr.write_record([
                filename,
                result.status.as_str(),
                "",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?,
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, hours_ago: i64, now: DateTime<Utc>) -> FileEntry {
        FileEntry {
            path: PathBuf::from(name),
            modified: now - Duration::hours(hours_ago),
        }
    }

    fn names(files: &[FileEntry]) -> Vec<String> {
        files.iter().map(|f| f.name()).collect()
    }

    #[test]
    fn test_progress_interval() {
        assert!(report_due(10, 10));
        assert!(!report_due(7, 10));
        assert!(report_due(3, 1));
        assert!(!report_due(1, 0));
        assert!(!report_due(10, 0));
    }

    #[test]
    fn test_overwrite_detection() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("sno_1.json");
        fs::write(&input, "{}").unwrap();

        let job = |documents_dir: PathBuf| Job {
            documents_dir,
            projects_dir: dir.path().join("projects"),
            skip_existing: true,
            config: Arc::new(ReraConfig::default()),
        };
        assert!(job(dir.path().to_path_buf()).overwrites_input(&input));
        assert!(!job(dir.path().join("out")).overwrites_input(&input));
        assert!(!job(dir.path().to_path_buf()).overwrites_input(&dir.path().join("sno_1.pdf")));
    }

    #[test]
    fn test_serial_number() {
        assert_eq!(serial_number("sno_42_green_acres.pdf"), Some(42));
        assert_eq!(serial_number("SNO 7.pdf"), Some(7));
        assert_eq!(serial_number("105_layout.pdf"), Some(105));
        assert_eq!(serial_number("layout_2031.pdf"), Some(2031));
        assert_eq!(serial_number("layout_12.pdf"), None);
        assert_eq!(serial_number("green_acres.pdf"), None);
    }

    #[test]
    fn test_serial_range_filter() {
        let now = Utc::now();
        let filters = Filters {
            serial_range: Some((10, 20)),
            ..Default::default()
        };
        let files = vec![
            entry("sno_5.pdf", 1, now),
            entry("sno_10.pdf", 1, now),
            entry("15_x.pdf", 1, now),
            entry("plain.pdf", 1, now),
        ];
        assert_eq!(names(&filters.apply(files)), vec!["sno_10.pdf", "15_x.pdf"]);
    }

    #[test]
    fn test_time_and_name_filters() {
        let now = Utc::now();
        let filters = Filters {
            modified_since: Some(now - Duration::hours(24)),
            name_pattern: Some(Regex::new("(?i)mysuru").unwrap()),
            ..Default::default()
        };
        let files = vec![
            entry("mysuru_a.pdf", 2, now),
            entry("mysuru_b.pdf", 48, now),
            entry("hassan_a.pdf", 2, now),
        ];
        assert_eq!(names(&filters.apply(files)), vec!["mysuru_a.pdf"]);
    }

    #[test]
    fn test_last_n_keeps_most_recent() {
        let now = Utc::now();
        let filters = Filters {
            last_n: Some(2),
            ..Default::default()
        };
        let files = vec![
            entry("a.pdf", 5, now),
            entry("b.pdf", 1, now),
            entry("c.pdf", 3, now),
        ];
        assert_eq!(names(&filters.apply(files)), vec!["b.pdf", "c.pdf"]);
    }
}
