//! Expiry extraction: recognizer, scored pass, then fallback pass.

use std::path::Path;

use chrono::NaiveDate;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::RecognizerError;
use crate::models::config::ExtractionConfig;
use crate::ocr::{RecognizedText, TextRecognizer};

use super::rules::{scan_dates, CandidateScorer, DateCandidate, ScanMode};

/// Which pass produced the expiry date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Highest scoring candidate from the per-line pass.
    Scored,
    /// First normalizable match in the flattened text.
    Fallback,
}

/// Result of expiry extraction for one label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Detected expiry date, `None` when the label shows no usable date.
    pub expiry_date: Option<NaiveDate>,
    /// Text produced by the recognizer.
    pub raw_text: String,
    /// Pass that found the date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<ExtractionMethod>,
}

impl ExtractionResult {
    /// Expiry date as `YYYY-MM-DD`.
    pub fn iso_date(&self) -> Option<String> {
        self.expiry_date.map(|d| d.format("%Y-%m-%d").to_string())
    }

    /// Whether a date was found.
    pub fn is_found(&self) -> bool {
        self.expiry_date.is_some()
    }
}

/// Picks the expiry date out of recognized label text.
#[derive(Debug, Clone, Default)]
pub struct ExpiryParser {
    scorer: CandidateScorer,
}

impl ExpiryParser {
    /// Create a parser with default weights and keywords.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser from extraction settings.
    pub fn with_config(config: &ExtractionConfig) -> Self {
        Self {
            scorer: CandidateScorer::new(config),
        }
    }

    /// All plausible candidates with their scores, in discovery order.
    pub fn rank_candidates(&self, text: &RecognizedText) -> Vec<DateCandidate> {
        self.scorer.rank(text)
    }

    /// Extract the expiry date from recognized text.
    pub fn parse(&self, text: &RecognizedText) -> ExtractionResult {
        let candidates = self.scorer.rank(text);
        let candidate_count = candidates.len();

        if let Some(best) = self.scorer.select(candidates) {
            debug!(
                "Scored pass chose {} from {:?} (score {:.2}, {} candidates)",
                best.date, best.matched, best.score, candidate_count
            );
            return ExtractionResult {
                expiry_date: Some(best.date),
                raw_text: text.raw().to_string(),
                method: Some(ExtractionMethod::Scored),
            };
        }

        if let Some(date) = self.fallback(text) {
            debug!("Fallback pass chose {}", date);
            return ExtractionResult {
                expiry_date: Some(date),
                raw_text: text.raw().to_string(),
                method: Some(ExtractionMethod::Fallback),
            };
        }

        debug!("No expiry date found in {} lines", text.lines().len());
        ExtractionResult {
            expiry_date: None,
            raw_text: text.raw().to_string(),
            method: None,
        }
    }

    /// Extract the expiry date from a raw text block.
    pub fn parse_str(&self, text: &str) -> ExtractionResult {
        self.parse(&RecognizedText::from(text))
    }

    /// First match per shape over the flattened text, in shape order; the
    /// first one that normalizes to a plausible date wins.
    fn fallback(&self, text: &RecognizedText) -> Option<NaiveDate> {
        let flat = text.flattened();
        scan_dates(&flat, ScanMode::FirstPerShape)
            .into_iter()
            .filter_map(|m| m.normalize())
            .find(|date| self.scorer.is_plausible(date))
    }
}

/// Runs a text recognizer on label images and extracts the expiry date.
pub struct ExpiryExtractor<R: TextRecognizer> {
    recognizer: R,
    parser: ExpiryParser,
}

impl<R: TextRecognizer> ExpiryExtractor<R> {
    /// Create an extractor with default extraction settings.
    pub fn new(recognizer: R) -> Self {
        Self {
            recognizer,
            parser: ExpiryParser::new(),
        }
    }

    /// Replace the text parser.
    pub fn with_parser(mut self, parser: ExpiryParser) -> Self {
        self.parser = parser;
        self
    }

    /// The underlying recognizer.
    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    /// The underlying text parser.
    pub fn parser(&self) -> &ExpiryParser {
        &self.parser
    }

    /// Recognize a decoded label image and extract its expiry date.
    ///
    /// Fails only when recognition fails. A label without a readable date
    /// yields a result with `expiry_date: None`.
    pub fn extract(&self, image: &DynamicImage) -> Result<ExtractionResult, RecognizerError> {
        let text = self.recognizer.recognize(image)?;
        let recognized = RecognizedText::from(text);
        info!(
            "{} recognized {} lines",
            self.recognizer.name(),
            recognized.lines().len()
        );
        Ok(self.parser.parse(&recognized))
    }

    /// Decode an image file and extract its expiry date.
    pub fn extract_path(&self, path: &Path) -> Result<ExtractionResult, RecognizerError> {
        let image = image::open(path).map_err(|e| {
            RecognizerError::ImageDecode(format!("{}: {}", path.display(), e))
        })?;
        self.extract(&image)
    }

    /// Extract from already recognized text, bypassing the recognizer.
    pub fn extract_from_text(&self, text: &str) -> ExtractionResult {
        self.parser.parse_str(text)
    }
}
