//! Batch command - read expiry dates from many label photos.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use shelflife_core::{ExtractionResult, RecognizerError};

use super::scan::{OutputFormat, ScanReport};
use super::{load_config, read_label};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "tiff", "tif", "bmp"];

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern for label images
    #[arg(required = true)]
    input: String,

    /// Output directory for per-label results
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each label
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of labels read in parallel
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

/// Outcome for one label.
#[derive(Debug)]
struct LabelOutcome {
    path: PathBuf,
    result: Option<ExtractionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(model_dir) = &args.model_dir {
        config.ocr.model_dir = model_dir.clone();
    }

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_image(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching images found for pattern: {}", args.input);
    }

    println!("{} Found {} labels to scan", style("ℹ").blue(), files.len());

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} labels")?
            .progress_chars("=>-"),
    );

    let config = Arc::new(config);
    let outcomes = read_labels(files, args.jobs, args.continue_on_error, &pb, |path| {
        let config = Arc::clone(&config);
        async move { read_label(&path, &config).await }
    })
    .await?;

    pb.finish_with_message("Complete");

    if let Some(output_dir) = &args.output_dir {
        write_reports(output_dir, &outcomes, args.format)?;
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &outcomes)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    print_totals(&outcomes, start);
    Ok(())
}

/// Read every label with at most `jobs` in flight; outcomes keep input order.
///
/// Without `continue_on_error` the first failure cancels the labels still
/// queued and is returned.
async fn read_labels<F, Fut>(
    files: Vec<PathBuf>,
    jobs: usize,
    continue_on_error: bool,
    pb: &ProgressBar,
    read: F,
) -> anyhow::Result<Vec<LabelOutcome>>
where
    F: Fn(PathBuf) -> Fut,
    Fut: Future<Output = Result<ExtractionResult, RecognizerError>> + Send + 'static,
{
    let limiter = Arc::new(Semaphore::new(jobs.max(1)));
    let mut tasks = JoinSet::new();

    for (index, path) in files.into_iter().enumerate() {
        let job = read(path.clone());
        let limiter = Arc::clone(&limiter);
        tasks.spawn(async move {
            let _permit = limiter.acquire_owned().await;
            let file_start = Instant::now();
            let result = job.await;
            (index, path, result, file_start.elapsed().as_millis() as u64)
        });
    }

    let mut outcomes = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let (index, path, result, processing_time_ms) = joined?;

        match result {
            Ok(result) => outcomes.push((
                index,
                LabelOutcome {
                    path,
                    result: Some(result),
                    error: None,
                    processing_time_ms,
                },
            )),
            Err(e) => {
                let message = e.to_string();
                if continue_on_error {
                    warn!("Failed to read {}: {}", path.display(), message);
                    outcomes.push((
                        index,
                        LabelOutcome {
                            path,
                            result: None,
                            error: Some(message),
                            processing_time_ms,
                        },
                    ));
                } else {
                    pb.abandon();
                    tasks.abort_all();
                    error!("Failed to read {}: {}", path.display(), message);
                    anyhow::bail!("Text recognition failed for {}: {}", path.display(), message);
                }
            }
        }

        pb.inc(1);
    }

    outcomes.sort_by_key(|(index, _)| *index);
    Ok(outcomes.into_iter().map(|(_, outcome)| outcome).collect())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn write_reports(
    output_dir: &Path,
    outcomes: &[LabelOutcome],
    format: OutputFormat,
) -> anyhow::Result<()> {
    let extension = match format {
        OutputFormat::Json => "json",
        OutputFormat::Text => "txt",
    };

    for outcome in outcomes {
        let Some(result) = &outcome.result else {
            continue;
        };
        let stem = outcome
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("label");
        let output_path = output_dir.join(format!("{}.{}", stem, extension));

        let report = ScanReport::new(result.clone(), None)
            .with_source(outcome.path.display().to_string());
        fs::write(&output_path, report.render(format)?)?;
        debug!("Wrote output to {}", output_path.display());
    }
    Ok(())
}

fn write_summary(path: &Path, outcomes: &[LabelOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "expiry_date",
        "method",
        "processing_time_ms",
        "error",
    ])?;

    for outcome in outcomes {
        let filename = outcome
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let time = outcome.processing_time_ms.to_string();

        match &outcome.result {
            Some(result) => {
                let (status, method) = match result.method {
                    Some(method) => ("found", serde_json::to_value(method)?),
                    None => ("not_found", serde_json::Value::Null),
                };
                wtr.write_record([
                    filename,
                    status,
                    &result.iso_date().unwrap_or_default(),
                    method.as_str().unwrap_or(""),
                    &time,
                    "",
                ])?;
            }
            None => {
                wtr.write_record([
                    filename,
                    "error",
                    "",
                    "",
                    &time,
                    outcome.error.as_deref().unwrap_or(""),
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

fn print_totals(outcomes: &[LabelOutcome], start: Instant) {
    let found = outcomes
        .iter()
        .filter(|o| o.result.as_ref().is_some_and(|r| r.is_found()))
        .count();
    let failed: Vec<&LabelOutcome> = outcomes.iter().filter(|o| o.error.is_some()).collect();
    let missing = outcomes.len() - found - failed.len();

    println!();
    println!(
        "{} Scanned {} labels in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    println!(
        "   {} dated, {} without a date, {} failed",
        style(found).green(),
        style(missing).yellow(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed labels:").red());
        for outcome in failed {
            println!(
                "  - {}: {}",
                outcome.path.display(),
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelflife_core::ExpiryParser;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn labels(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[tokio::test]
    async fn test_read_labels_bounds_parallelism() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let files = labels(&["a.png", "b.png", "c.png", "d.png", "e.png", "f.png"]);

        let outcomes = read_labels(files, 2, false, &ProgressBar::hidden(), |_path| {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(ExpiryParser::new().parse_str("EXP 2026-07-12"))
            }
        })
        .await
        .unwrap();

        assert_eq!(peak.load(Ordering::SeqCst), 2);
        let names: Vec<_> = outcomes.iter().map(|o| o.path.display().to_string()).collect();
        assert_eq!(names, ["a.png", "b.png", "c.png", "d.png", "e.png", "f.png"]);
        assert!(outcomes.iter().all(|o| o.result.as_ref().is_some_and(|r| r.is_found())));
    }

    #[tokio::test]
    async fn test_read_labels_error_handling() {
        let read = |path: PathBuf| async move {
            if path.ends_with("broken.png") {
                Err(RecognizerError::Recognition("engine crashed".to_string()))
            } else {
                Ok(ExpiryParser::new().parse_str("MAR 2026"))
            }
        };

        let outcomes = read_labels(labels(&["milk.png", "broken.png", "eggs.png"]), 3, true, &ProgressBar::hidden(), read)
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[1].error.as_deref(), Some("text recognition failed: engine crashed"));
        assert!(outcomes[2].result.is_some());

        let stopped = read_labels(labels(&["milk.png", "broken.png"]), 1, false, &ProgressBar::hidden(), read).await;
        assert!(stopped.unwrap_err().to_string().contains("broken.png"));
    }

    #[test]
    fn test_is_image() {
        assert!(is_image(Path::new("labels/milk.JPG")));
        assert!(is_image(Path::new("a.png")));
        assert!(!is_image(Path::new("notes.txt")));
        assert!(!is_image(Path::new("no_extension")));
    }

    #[test]
    fn test_summary_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        let parser = ExpiryParser::new();

        let outcomes = vec![
            LabelOutcome {
                path: PathBuf::from("milk.png"),
                result: Some(parser.parse_str("EXP 2026-07-12")),
                error: None,
                processing_time_ms: 12,
            },
            LabelOutcome {
                path: PathBuf::from("blank.png"),
                result: Some(parser.parse_str("NET WT 500G")),
                error: None,
                processing_time_ms: 8,
            },
            LabelOutcome {
                path: PathBuf::from("broken.png"),
                result: None,
                error: Some("could not read image".to_string()),
                processing_time_ms: 1,
            },
        ];

        write_summary(&path, &outcomes).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines[0], "filename,status,expiry_date,method,processing_time_ms,error");
        assert_eq!(lines[1], "milk.png,found,2026-07-12,scored,12,");
        assert_eq!(lines[2], "blank.png,not_found,,,8,");
        assert_eq!(lines[3], "broken.png,error,,,1,could not read image");
    }
}
