//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::{ScoredText, TextExtractor};

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    keep_unk: bool,
}

impl PureOcrEngine {
    /// Create an engine from the model files named in `config`.
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        Self::from_files(
            &config.model_dir.join(&config.detection_model),
            &config.model_dir.join(&config.recognition_model),
            &config.model_dir.join(&config.dictionary),
            config.keep_unk,
        )
    }

    /// Create an engine from model files in a directory, using the default file names.
    pub fn from_dir(model_dir: &Path) -> Result<Self, OcrError> {
        let config = OcrConfig {
            model_dir: model_dir.to_path_buf(),
            ..OcrConfig::default()
        };
        Self::from_config(&config)
    }

    fn from_files(
        det_path: &Path,
        rec_path: &Path,
        dict_path: &Path,
        keep_unk: bool,
    ) -> Result<Self, OcrError> {
        for path in [det_path, rec_path, dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(det_path)
            .rec_model_path(rec_path)
            .dictionary_path(dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!(
            "Loaded pure-onnx-ocr engine ({}, {})",
            det_path.display(),
            rec_path.display()
        );

        Ok(Self { engine, keep_unk })
    }
}

impl TextExtractor for PureOcrEngine {
    fn extract(&self, image: &DynamicImage) -> Result<Vec<ScoredText>, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        debug!("Running OCR on {}x{} image", width, height);

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        let tokens: Vec<ScoredText> = results
            .iter()
            .map(|r| {
                let text = if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                ScoredText::new(text, r.confidence).with_bbox(polygon_to_bbox(&r.bounding_box))
            })
            .collect();

        info!(
            "OCR complete: {} tokens in {}ms",
            tokens.len(),
            start.elapsed().as_millis()
        );

        Ok(tokens)
    }
}

/// Convert a `Polygon<f64>` to our `[f32; 8]` bbox format.
fn polygon_to_bbox(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 8] {
    let mut bbox = [0.0f32; 8];
    for (i, coord) in polygon.exterior().coords().take(4).enumerate() {
        bbox[i * 2] = coord.x as f32;
        bbox[i * 2 + 1] = coord.y as f32;
    }
    bbox
}
