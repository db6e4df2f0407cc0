//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::RecognizerError;
use crate::models::config::OcrConfig;

use super::{lines_from_boxes, LabelPreprocessor, TextBox, TextRecognizer};

/// Label recognizer backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    preprocessor: Option<LabelPreprocessor>,
    config: OcrConfig,
}

impl PureOcrEngine {
    /// Create an engine from the model files named in `config`, inside `config.model_dir`.
    pub fn from_config(config: OcrConfig) -> Result<Self, RecognizerError> {
        let model_dir = config.model_dir.clone();
        Self::from_dir(&model_dir, config)
    }

    /// Create an engine from the model files named in `config`, inside `model_dir`.
    pub fn from_dir(model_dir: &Path, config: OcrConfig) -> Result<Self, RecognizerError> {
        let det_path = model_dir.join(&config.detection_model);
        let rec_path = model_dir.join(&config.recognition_model);
        let dict_path = model_dir.join(&config.dictionary);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(RecognizerError::ModelLoad(format!(
                    "missing model file {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| RecognizerError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", model_dir.display());

        let preprocessor = config
            .preprocess
            .then(|| LabelPreprocessor::from_config(&config));

        Ok(Self {
            engine,
            preprocessor,
            config,
        })
    }

    /// Detect and recognize text boxes.
    pub fn process(&self, image: &DynamicImage) -> Result<Vec<TextBox>, RecognizerError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        info!("Processing label image: {}x{}", width, height);

        let prepared;
        let input = match &self.preprocessor {
            Some(preprocessor) => {
                prepared = preprocessor.prepare(image)?;
                &prepared
            }
            None => image,
        };

        let results = self
            .engine
            .run_from_image(input)
            .map_err(|e| RecognizerError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        let boxes: Vec<TextBox> = results
            .iter()
            .map(|r| TextBox {
                bbox: polygon_to_bbox(&r.bounding_box),
                text: if self.config.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                },
                confidence: r.confidence,
            })
            .collect();

        debug!(
            "OCR complete: {} text boxes in {}ms",
            boxes.len(),
            start.elapsed().as_millis()
        );

        Ok(boxes)
    }
}

impl TextRecognizer for PureOcrEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<String, RecognizerError> {
        let boxes = self.process(image)?;
        Ok(lines_from_boxes(&boxes, self.config.row_tolerance).join("\n"))
    }

    fn name(&self) -> &'static str {
        "pure-onnx-ocr"
    }
}

/// Convert a `Polygon<f64>` to our `[f32; 8]` bbox format.
///
/// Extracts the first 4 exterior points (quadrilateral) as
/// `[x1, y1, x2, y2, x3, y3, x4, y4]`.
fn polygon_to_bbox(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 8] {
    let mut bbox = [0.0f32; 8];
    for (i, coord) in polygon.exterior().coords().take(4).enumerate() {
        bbox[i * 2] = coord.x as f32;
        bbox[i * 2 + 1] = coord.y as f32;
    }
    bbox
}
