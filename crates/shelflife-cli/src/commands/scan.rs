//! Scan command - read the expiry date from a single label photo.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use shelflife_core::{
    DateCandidate, ExpiryParser, ExtractionMethod, ExtractionResult, RecognizedText, ShelfConfig,
};

use super::{load_config, read_label};

/// Arguments for the scan command.
#[derive(Args)]
pub struct ScanArgs {
    /// Label image (PNG, JPEG, ...)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Also list every scored date candidate
    #[arg(long)]
    show_candidates: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

/// What gets printed for one label.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub expiry_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<ExtractionMethod>,
    pub raw_text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<DateCandidate>,
}

impl ScanReport {
    pub fn new(result: ExtractionResult, parser: Option<&ExpiryParser>) -> Self {
        let candidates = parser
            .map(|p| p.rank_candidates(&RecognizedText::from(result.raw_text.as_str())))
            .unwrap_or_default();
        Self {
            source: None,
            expiry_date: result.iso_date(),
            method: result.method,
            raw_text: result.raw_text,
            candidates,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn render(&self, format: OutputFormat) -> anyhow::Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Text => Ok(self.render_text()),
        }
    }

    fn render_text(&self) -> String {
        let mut output = String::new();

        if let Some(source) = &self.source {
            output.push_str(&format!("Label: {}\n", source));
        }
        match (&self.expiry_date, self.method) {
            (Some(date), Some(method)) => {
                output.push_str(&format!("Expiry date: {} ({})\n", date, method_name(method)))
            }
            (Some(date), None) => output.push_str(&format!("Expiry date: {}\n", date)),
            (None, _) => output.push_str("Expiry date: not found\n"),
        }

        if !self.candidates.is_empty() {
            output.push_str("\nCandidates:\n");
            for c in &self.candidates {
                output.push_str(&format!(
                    "  line {:<3} {:<20} -> {}  score {:.2}\n",
                    c.line_index + 1,
                    c.matched,
                    c.iso_date(),
                    c.score
                ));
            }
        }

        output.push_str("\nRecognized text:\n");
        for line in self.raw_text.lines() {
            output.push_str(&format!("  {}\n", line));
        }

        output
    }
}

fn method_name(method: ExtractionMethod) -> &'static str {
    match method {
        ExtractionMethod::Scored => "scored",
        ExtractionMethod::Fallback => "fallback",
    }
}

pub async fn run(args: ScanArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(model_dir) = &args.model_dir {
        config.ocr.model_dir = model_dir.clone();
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Scanning label: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.set_message("Running OCR...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = read_label(&args.input, &config).await;
    pb.finish_and_clear();

    let result = result.map_err(|e| {
        anyhow::anyhow!(
            "Could not read text from {}: {}",
            args.input.display(),
            e
        )
    })?;

    report(result, &args, &config)?;

    debug!("Total scan time: {:?}", start.elapsed());
    Ok(())
}

fn report(result: ExtractionResult, args: &ScanArgs, config: &ShelfConfig) -> anyhow::Result<()> {
    let found = result.is_found();
    let parser = ExpiryParser::with_config(&config.extraction);
    let report = ScanReport::new(result, args.show_candidates.then_some(&parser))
        .with_source(args.input.display().to_string());

    write_output(&report.render(args.format)?, args.output.as_ref())?;

    if !found {
        eprintln!(
            "{} No expiry date found on the label. Enter it manually.",
            style("!").yellow()
        );
    }
    Ok(())
}

/// Print to stdout or write to `output`.
pub fn write_output(content: &str, output: Option<&PathBuf>) -> anyhow::Result<()> {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} Output written to {}", style("✓").green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}
