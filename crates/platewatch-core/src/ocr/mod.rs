//! OCR engine seam.
//!
//! The recognition pipeline only needs scored text tokens from an image.
//! Any engine implementing [`TextExtractor`] can be plugged into
//! [`crate::recognition::PlateRecognizer`]; the `native` feature provides
//! [`PureOcrEngine`] backed by `pure-onnx-ocr`.

#[cfg(feature = "native")]
mod pure_engine;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// A recognized text token with its confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredText {
    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub score: f32,

    /// Quadrilateral (x1, y1, x2, y2, x3, y3, x4, y4), when the engine reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f32; 8]>,
}

impl ScoredText {
    pub fn new(text: impl Into<String>, score: f32) -> Self {
        Self {
            text: text.into(),
            score,
            bbox: None,
        }
    }

    pub fn with_bbox(mut self, bbox: [f32; 8]) -> Self {
        self.bbox = Some(bbox);
        self
    }
}

/// Trait for OCR engines.
///
/// Implementations are initialized once and shared immutably across
/// requests, so `extract` takes `&self` and must be thread-safe.
pub trait TextExtractor: Send + Sync {
    /// Extract every text token the engine can find, in engine order.
    fn extract(&self, image: &DynamicImage) -> Result<Vec<ScoredText>, OcrError>;
}
