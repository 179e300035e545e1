//! Image to registry record: OCR, candidate selection, plate resolution.

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{OcrError, RecognitionError};
use crate::models::config::PlatewatchConfig;
use crate::models::registry::MatchedRecord;
use crate::ocr::{ScoredText, TextExtractor};
use crate::plate::{CandidateFilter, PlateCandidate};
use crate::registry::Registry;

/// Outcome of recognizing one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// The token chosen as the plate, with its normalized key and score.
    #[serde(flatten)]
    pub candidate: PlateCandidate,

    /// Registered vehicle and owner for the plate, if any.
    pub matched: Option<MatchedRecord>,

    /// Every token the OCR engine returned, in engine order.
    pub tokens: Vec<ScoredText>,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl RecognitionResult {
    pub fn plate(&self) -> &str {
        &self.candidate.plate
    }

    /// The plate came from the fallback path and should not be trusted blindly.
    pub fn is_degraded(&self) -> bool {
        self.candidate.degraded
    }
}

/// Recognizes plates in images and resolves them against a registry.
///
/// The OCR engine is created once and shared; recognition never writes to
/// the registry and holds no registry lock while the engine runs.
pub struct PlateRecognizer {
    engine: Arc<dyn TextExtractor>,
    registry: Arc<Registry>,
    filter: CandidateFilter,
    timeout: Duration,
}

impl PlateRecognizer {
    /// Create a recognizer with default plate rules and OCR timeout.
    pub fn new(engine: Arc<dyn TextExtractor>, registry: Arc<Registry>) -> Self {
        Self::from_config(engine, registry, &PlatewatchConfig::default())
    }

    pub fn from_config(
        engine: Arc<dyn TextExtractor>,
        registry: Arc<Registry>,
        config: &PlatewatchConfig,
    ) -> Self {
        Self {
            engine,
            registry,
            filter: CandidateFilter::from_config(&config.plate),
            timeout: config.ocr.timeout(),
        }
    }

    /// Set the default OCR timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Recognize an encoded image using the default OCR timeout.
    pub async fn recognize(&self, image_bytes: &[u8]) -> Result<RecognitionResult, RecognitionError> {
        self.recognize_with_timeout(image_bytes, self.timeout).await
    }

    /// Recognize an encoded image, bounding the OCR call by `timeout`.
    pub async fn recognize_with_timeout(
        &self,
        image_bytes: &[u8],
        timeout: Duration,
    ) -> Result<RecognitionResult, RecognitionError> {
        if image_bytes.is_empty() {
            return Err(RecognitionError::EmptyImage);
        }

        let image = image::load_from_memory(image_bytes)
            .map_err(|e| RecognitionError::DecodeFailed(e.to_string()))?;

        self.recognize_image(image, timeout).await
    }

    /// Recognize an already decoded image.
    pub async fn recognize_image(
        &self,
        image: DynamicImage,
        timeout: Duration,
    ) -> Result<RecognitionResult, RecognitionError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();
        info!("Recognizing plate in {}x{} image", width, height);

        let tokens = self.extract_tokens(image, timeout).await?;
        debug!("OCR returned {} tokens", tokens.len());

        let candidate = self.filter.select(&tokens)?;
        let matched = self.registry.resolve(&candidate.plate);

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Plate {:?} (score {:.3}{}) {} in {}ms",
            candidate.plate,
            candidate.score,
            if candidate.degraded { ", degraded" } else { "" },
            if matched.is_some() { "matched" } else { "not registered" },
            processing_time_ms
        );

        Ok(RecognitionResult {
            candidate,
            matched,
            tokens,
            processing_time_ms,
        })
    }

    async fn extract_tokens(
        &self,
        image: DynamicImage,
        timeout: Duration,
    ) -> Result<Vec<ScoredText>, RecognitionError> {
        let engine = Arc::clone(&self.engine);
        let task = tokio::task::spawn_blocking(move || engine.extract(&image));

        match tokio::time::timeout(timeout, task).await {
            Err(_) => Err(RecognitionError::OcrTimeout(timeout)),
            Ok(Err(e)) => Err(OcrError::Recognition(format!("OCR task failed: {}", e)).into()),
            Ok(Ok(result)) => Ok(result?),
        }
    }
}
