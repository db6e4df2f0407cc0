//! WASM bindings for label expiry date extraction.
//!
//! Text recognition runs in the browser; these bindings take the recognized
//! text (or text boxes) and pick out the expiry date.

use wasm_bindgen::prelude::*;

use shelflife_core::expiry::ExpiryParser;
use shelflife_core::models::config::{ExtractionConfig, TieBreak};
use shelflife_core::ocr::{lines_from_boxes, TextBox};
use shelflife_core::RecognizedText;

/// Row tolerance used when grouping browser-side boxes into lines.
const DEFAULT_ROW_TOLERANCE: f32 = 20.0;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Extract the expiry date from recognized label text.
///
/// Returns `{ expiry_date, raw_text, method }`; `expiry_date` is `null`
/// when no date was found.
#[wasm_bindgen]
pub fn extract_expiry_from_text(text: &str) -> Result<JsValue, JsValue> {
    to_js(&ExpiryParser::new().parse_str(text))
}

/// Normalize a single date string to `YYYY-MM-DD`.
#[wasm_bindgen]
pub fn normalize_date(value: &str) -> Option<String> {
    shelflife_core::normalize_date(value).map(|d| d.format("%Y-%m-%d").to_string())
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Configurable expiry extractor for browser use.
#[wasm_bindgen]
pub struct ExpiryReader {
    config: ExtractionConfig,
    parser: ExpiryParser,
}

#[wasm_bindgen]
impl ExpiryReader {
    /// Create a reader with default settings.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::with_config(ExtractionConfig::default())
    }

    /// Create a reader from a JSON extraction config; missing fields take defaults.
    #[wasm_bindgen(js_name = fromConfig)]
    pub fn from_config(config: JsValue) -> Result<ExpiryReader, JsValue> {
        let config: ExtractionConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self::with_config(config))
    }

    /// Prefer the earlier date when two candidates score the same.
    #[wasm_bindgen]
    pub fn set_prefer_earlier(&mut self, earlier: bool) {
        self.config.tie_break = if earlier {
            TieBreak::Earlier
        } else {
            TieBreak::Later
        };
        self.parser = ExpiryParser::with_config(&self.config);
    }

    /// Extract the expiry date from text.
    #[wasm_bindgen]
    pub fn extract(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&self.parser.parse_str(text))
    }

    /// Every plausible candidate with its score.
    #[wasm_bindgen]
    pub fn candidates(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&self.parser.rank_candidates(&RecognizedText::from(text)))
    }
}

impl ExpiryReader {
    fn with_config(config: ExtractionConfig) -> Self {
        let parser = ExpiryParser::with_config(&config);
        Self { config, parser }
    }
}

impl Default for ExpiryReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Text boxes from browser-side OCR, grouped into lines before extraction.
#[wasm_bindgen]
pub struct LabelText {
    boxes: Vec<TextBox>,
    row_tolerance: f32,
}

#[wasm_bindgen]
impl LabelText {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            boxes: Vec::new(),
            row_tolerance: DEFAULT_ROW_TOLERANCE,
        }
    }

    /// Set how far apart (in pixels) box centres may be to share a line.
    #[wasm_bindgen]
    pub fn set_row_tolerance(&mut self, tolerance: f32) {
        self.row_tolerance = tolerance;
    }

    /// Add a detected text box.
    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn add_box(
        &mut self,
        text: &str,
        x1: f32, y1: f32,
        x2: f32, y2: f32,
        x3: f32, y3: f32,
        x4: f32, y4: f32,
        confidence: f32,
    ) {
        self.boxes.push(TextBox {
            bbox: [x1, y1, x2, y2, x3, y3, x4, y4],
            text: text.to_string(),
            confidence,
        });
    }

    /// Boxes joined into reading-order lines.
    #[wasm_bindgen]
    pub fn get_text(&self) -> String {
        lines_from_boxes(&self.boxes, self.row_tolerance).join("\n")
    }

    /// Extract the expiry date from the grouped text.
    #[wasm_bindgen]
    pub fn extract_expiry(&self) -> Result<JsValue, JsValue> {
        extract_expiry_from_text(&self.get_text())
    }
}

impl Default for LabelText {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_normalize_date() {
        assert_eq!(normalize_date("MAR 2026").as_deref(), Some("2026-03-01"));
        assert_eq!(normalize_date("12 July 2025").as_deref(), Some("2025-07-12"));
        assert_eq!(normalize_date("notadate"), None);
    }

    #[wasm_bindgen_test]
    fn test_label_text_groups_rows() {
        let mut label = LabelText::new();
        label.add_box("2026", 120.0, 52.0, 160.0, 52.0, 160.0, 64.0, 120.0, 64.0, 0.9);
        label.add_box("BEST", 10.0, 10.0, 50.0, 10.0, 50.0, 22.0, 10.0, 22.0, 0.9);
        label.add_box("12 JUL", 10.0, 50.0, 100.0, 50.0, 100.0, 62.0, 10.0, 62.0, 0.9);
        label.add_box("BEFORE", 60.0, 12.0, 110.0, 12.0, 110.0, 24.0, 60.0, 24.0, 0.9);

        assert_eq!(label.get_text(), "BEST BEFORE\n12 JUL 2026");
    }

    #[wasm_bindgen_test]
    fn test_reader_tie_break() {
        let mut reader = ExpiryReader::new();
        reader.set_prefer_earlier(true);
        assert!(reader.extract("01/02/2026 01/03/2026").is_ok());
    }
}
