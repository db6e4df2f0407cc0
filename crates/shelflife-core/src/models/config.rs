//! Configuration structures for the shelflife pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for shelflife.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Expiry extraction configuration.
    pub extraction: ExtractionConfig,

    /// Inventory store configuration.
    pub inventory: InventoryConfig,

    /// Alerting configuration.
    pub alerts: AlertConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Run grayscale, denoise and thresholding before recognition.
    pub preprocess: bool,

    /// Gaussian blur sigma used for denoising (0 disables).
    pub denoise_sigma: f32,

    /// Neighbourhood size for adaptive thresholding (odd, pixels).
    pub threshold_block: u32,

    /// Constant subtracted from the local mean when thresholding.
    pub threshold_offset: i32,

    /// Vertical distance (pixels) within which text boxes share a line.
    pub row_tolerance: f32,

    /// Keep `[UNK]` tokens emitted by the recognizer.
    pub keep_unk: bool,

    /// Abort recognition after this many seconds (0 = no limit).
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            preprocess: true,
            denoise_sigma: 1.0,
            threshold_block: 31,
            threshold_offset: 10,
            row_tolerance: 20.0,
            keep_unk: false,
            timeout_secs: 30,
        }
    }
}

/// Direction used to break score ties between candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Prefer the later date.
    #[default]
    Later,
    /// Prefer the earlier date.
    Earlier,
}

/// Expiry extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Words that mark a nearby date as an expiry date.
    pub expiry_keywords: Vec<String>,

    /// Words that mark a nearby date as a manufacture or packing date.
    pub manufacture_keywords: Vec<String>,

    /// Score added when an expiry keyword is in the context window.
    pub expiry_bonus: f64,

    /// Score subtracted when a manufacture keyword is in the context window.
    pub manufacture_penalty: f64,

    /// Score added when the match spells out a month.
    pub month_name_bonus: f64,

    /// Score added per year past `min_year`.
    pub year_weight: f64,

    /// Earliest plausible year.
    pub min_year: i32,

    /// Latest plausible year.
    pub max_year: i32,

    /// Lines above and below a match included in its context window.
    pub context_radius: usize,

    /// Tie-break direction for equal scores.
    pub tie_break: TieBreak,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            expiry_keywords: to_strings(&[
                "exp",
                "expiry",
                "expires",
                "expdate",
                "use by",
                "use before",
                "best before",
                "bestbefore",
                "bb",
                "bbd",
                "bb date",
                "expiry date",
            ]),
            manufacture_keywords: to_strings(&[
                "mfg",
                "mfd",
                "pkd",
                "packed on",
                "packed",
                "manufacture",
                "manufactured",
                "prod",
                "production",
            ]),
            expiry_bonus: 5.0,
            manufacture_penalty: 4.0,
            month_name_bonus: 1.0,
            year_weight: 0.01,
            min_year: 2000,
            max_year: 2050,
            context_radius: 1,
            tie_break: TieBreak::Later,
        }
    }
}

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Inventory store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// JSON file holding inventory items.
    pub store_path: PathBuf,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("data").join("inventory.json"),
        }
    }
}

/// Alerting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Alert on active items expiring within this many days.
    pub alert_days: i64,

    /// Spool directory picked up by the local mail transport.
    pub outbox_dir: Option<PathBuf>,

    /// Sender address.
    pub from: Option<String>,

    /// Recipient address.
    pub to: Option<String>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            alert_days: 3,
            outbox_dir: None,
            from: None,
            to: None,
        }
    }
}

impl ShelfConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Get full path to an OCR model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.ocr.model_dir.join(model_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: ShelfConfig =
            serde_json::from_str(r#"{"alerts": {"alert_days": 7}}"#).unwrap();

        assert_eq!(config.alerts.alert_days, 7);
        assert_eq!(config.extraction.expiry_bonus, 5.0);
        assert_eq!(config.extraction.tie_break, TieBreak::Later);
        assert_eq!(config.ocr.detection_model, "det.onnx");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = ShelfConfig::default();
        config.extraction.tie_break = TieBreak::Earlier;
        config.save(&path).unwrap();

        let loaded = ShelfConfig::from_file(&path).unwrap();
        assert_eq!(loaded.extraction.tie_break, TieBreak::Earlier);
    }
}
