//! Text recognition boundary for label photos.

mod preprocessing;
#[cfg(feature = "native")]
mod pure_engine;

pub use preprocessing::LabelPreprocessor;
#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::RecognizerError;

/// Turns a label image into multi-line text.
pub trait TextRecognizer {
    /// Recognize all text in the image, one visual line per text line.
    fn recognize(&self, image: &DynamicImage) -> Result<String, RecognizerError>;

    /// Engine identifier used in logs.
    fn name(&self) -> &'static str {
        "recognizer"
    }
}

impl<R: TextRecognizer + ?Sized> TextRecognizer for &R {
    fn recognize(&self, image: &DynamicImage) -> Result<String, RecognizerError> {
        (**self).recognize(image)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<R: TextRecognizer + ?Sized> TextRecognizer for Box<R> {
    fn recognize(&self, image: &DynamicImage) -> Result<String, RecognizerError> {
        (**self).recognize(image)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<R: TextRecognizer + ?Sized> TextRecognizer for Arc<R> {
    fn recognize(&self, image: &DynamicImage) -> Result<String, RecognizerError> {
        (**self).recognize(image)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Text recognized from one image, split into trimmed lines.
///
/// Blank lines are kept so that neighbouring-line context follows the
/// physical layout of the label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedText {
    raw: String,
    lines: Vec<String>,
}

impl RecognizedText {
    /// The text exactly as the recognizer produced it.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Trimmed lines in reading order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// All lines joined with single spaces.
    pub fn flattened(&self) -> String {
        self.lines.join(" ")
    }

    /// Whether the recognizer produced no visible text.
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.is_empty())
    }
}

impl From<String> for RecognizedText {
    fn from(raw: String) -> Self {
        let lines = split_lines(&raw).map(|l| l.trim().to_string()).collect();
        Self { raw, lines }
    }
}

/// Characters that end a line of recognized text. `\r\n` counts as one break.
const LINE_BREAKS: &[char] = &[
    '\n', '\r', '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Split on every line break OCR engines emit; a trailing break adds no line.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = Some(text);
    std::iter::from_fn(move || {
        let current = rest.filter(|r| !r.is_empty())?;
        match current.find(LINE_BREAKS) {
            Some(i) => {
                let tail = &current[i..];
                let width = if tail.starts_with("\r\n") {
                    2
                } else {
                    tail.chars().next().map_or(1, char::len_utf8)
                };
                rest = Some(&tail[width..]);
                Some(&current[..i])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}

impl From<&str> for RecognizedText {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

/// A detected text box with its coordinates and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle (min_x, min_y, max_x, max_y).
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }

    /// Vertical centre of the box.
    pub fn center_y(&self) -> f32 {
        let (_, min_y, _, max_y) = self.rect();
        (min_y + max_y) / 2.0
    }
}

/// Group text boxes into reading-order lines.
///
/// Boxes whose vertical centres lie within `row_tolerance` of a row's first
/// box share that row; rows are read top to bottom, boxes left to right.
pub fn lines_from_boxes(boxes: &[TextBox], row_tolerance: f32) -> Vec<String> {
    let mut sorted: Vec<&TextBox> = boxes.iter().filter(|b| !b.text.trim().is_empty()).collect();
    sorted.sort_by(|a, b| a.center_y().total_cmp(&b.center_y()));

    let mut rows: Vec<Vec<&TextBox>> = Vec::new();
    for text_box in sorted {
        match rows.last_mut() {
            Some(row) if (text_box.center_y() - row[0].center_y()).abs() <= row_tolerance => {
                row.push(text_box)
            }
            _ => rows.push(vec![text_box]),
        }
    }

    rows.into_iter()
        .map(|mut row| {
            row.sort_by(|a, b| a.rect().0.total_cmp(&b.rect().0));
            row.iter()
                .map(|b| b.text.trim())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_box(text: &str, x: f32, y: f32) -> TextBox {
        TextBox {
            bbox: [x, y, x + 40.0, y, x + 40.0, y + 12.0, x, y + 12.0],
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_recognized_text_keeps_blank_lines() {
        let text = RecognizedText::from("  EXP  \n\r\n12/07/2025\r\n");

        assert_eq!(text.lines(), &["EXP", "", "12/07/2025"]);
        assert_eq!(text.flattened(), "EXP  12/07/2025");
        assert_eq!(text.raw(), "  EXP  \n\r\n12/07/2025\r\n");
        assert!(!text.is_blank());
        assert!(RecognizedText::from(" \n ").is_blank());
    }

    #[test]
    fn test_recognized_text_splits_on_all_line_breaks() {
        let text = RecognizedText::from("BEST BEFORE\r12 July 2025\u{2028}MFG\u{0c}01 Jan 2025\r\n");

        assert_eq!(text.lines(), &["BEST BEFORE", "12 July 2025", "MFG", "01 Jan 2025"]);
        assert_eq!(split_lines("").count(), 0);
        assert_eq!(split_lines("\n").collect::<Vec<_>>(), vec![""]);
    }

    #[test]
    fn test_lines_from_boxes_groups_rows() {
        let boxes = vec![
            text_box("12/07/2025", 80.0, 52.0),
            text_box("MILK", 10.0, 10.0),
            text_box("EXP", 10.0, 50.0),
            text_box("MFG 01/01/2025", 10.0, 100.0),
        ];

        assert_eq!(
            lines_from_boxes(&boxes, 20.0),
            vec!["MILK", "EXP 12/07/2025", "MFG 01/01/2025"]
        );
    }

    #[test]
    fn test_lines_from_boxes_skips_empty_text() {
        let boxes = vec![text_box("  ", 0.0, 0.0), text_box("BB", 0.0, 40.0)];

        assert_eq!(lines_from_boxes(&boxes, 20.0), vec!["BB"]);
    }

    #[test]
    fn test_recognizer_through_references() {
        struct Echo;
        impl TextRecognizer for Echo {
            fn recognize(&self, _image: &DynamicImage) -> Result<String, RecognizerError> {
                Ok("EXP".to_string())
            }
            fn name(&self) -> &'static str {
                "echo"
            }
        }

        let image = DynamicImage::new_luma8(1, 1);
        let shared: Arc<dyn TextRecognizer> = Arc::new(Echo);
        assert_eq!(shared.recognize(&image).unwrap(), "EXP");
        assert_eq!((&Echo).name(), "echo");
    }
}
