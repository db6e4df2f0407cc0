//! Subcommands and the helpers they share.

pub mod alerts;
pub mod batch;
pub mod config;
pub mod inventory;
pub mod scan;
pub mod text;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use tracing::debug;

use shelflife_core::{
    normalize_date, ExpiryExtractor, ExpiryParser, ExtractionResult, JsonFileStore,
    PureOcrEngine, RecognizerError, ShelfConfig,
};

/// Config file used when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shelflife")
        .join("config.json")
}

/// The `--config` path, or the default location.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load configuration; a missing default file means defaults, a missing
/// explicit file is an error.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ShelfConfig> {
    if let Some(path) = config_path {
        return Ok(ShelfConfig::from_file(Path::new(path))?);
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Using config {}", path.display());
        Ok(ShelfConfig::from_file(&path)?)
    } else {
        Ok(ShelfConfig::default())
    }
}

pub fn open_store(config: &ShelfConfig) -> anyhow::Result<JsonFileStore> {
    Ok(JsonFileStore::open(&config.inventory.store_path)?)
}

/// Run recognition and extraction for one label on a blocking thread,
/// giving up after `ocr.timeout_secs` (0 means no limit).
pub async fn read_label(
    path: &Path,
    config: &ShelfConfig,
) -> Result<ExtractionResult, RecognizerError> {
    let ocr_config = config.ocr.clone();
    let parser = ExpiryParser::with_config(&config.extraction);
    let path = path.to_path_buf();

    run_blocking(label_timeout(config.ocr.timeout_secs), move || {
        let engine = PureOcrEngine::from_config(ocr_config)?;
        ExpiryExtractor::new(engine)
            .with_parser(parser)
            .extract_path(&path)
    })
    .await
}

fn label_timeout(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Run `job` on the blocking pool, bounded by `limit` when one is given.
///
/// On timeout the job is left to finish on its own.
async fn run_blocking<T, F>(limit: Option<Duration>, job: F) -> Result<T, RecognizerError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, RecognizerError> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(job);
    let joined = match limit {
        Some(limit) => tokio::time::timeout(limit, task)
            .await
            .map_err(|_| RecognizerError::Timeout(limit))?,
        None => task.await,
    };

    joined.map_err(|e| RecognizerError::Recognition(format!("recognizer task failed: {}", e)))?
}

/// Parse a date typed by the user: ISO first, then any label format.
pub fn parse_user_date(value: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .ok()
        .or_else(|| normalize_date(value))
        .ok_or_else(|| anyhow::anyhow!("Unrecognized date: {}", value))
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
