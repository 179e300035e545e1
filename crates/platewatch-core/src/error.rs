//! Error types for the platewatch-core library.

use std::time::Duration;

use thiserror::Error;

use crate::models::registry::{IncidentId, PersonId, VehicleId};

/// Main error type for the platewatch library.
#[derive(Error, Debug)]
pub enum PlatewatchError {
    /// Plate recognition error.
    #[error("recognition error: {0}")]
    Recognition(#[from] RecognitionError),

    /// Registry or escalation error.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Notification delivery error.
    #[error("notification error: {0}")]
    Notify(#[from] NotifyError),

    /// OCR engine error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while turning an image into a plate.
#[derive(Error, Debug)]
pub enum RecognitionError {
    /// The uploaded image had no bytes.
    #[error("image is empty")]
    EmptyImage,

    /// The bytes could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    DecodeFailed(String),

    /// The OCR engine did not answer in time.
    #[error("OCR engine timed out after {0:?}")]
    OcrTimeout(Duration),

    /// The OCR engine found no text at all.
    #[error("no text extracted from image")]
    NoTextExtracted,

    /// The OCR engine itself failed.
    #[error(transparent)]
    Ocr(#[from] OcrError),
}

/// Errors from the OCR engine adapter.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),
}

/// Errors related to the registry and incident workflow.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("person {0} not found")]
    PersonNotFound(PersonId),

    #[error("vehicle {0} not found")]
    VehicleNotFound(VehicleId),

    #[error("incident {0} not found")]
    IncidentNotFound(IncidentId),

    /// A uniqueness constraint (plate, control number, email) was breached.
    #[error("{field} '{value}' is already registered")]
    ConstraintViolation { field: &'static str, value: String },

    /// A field failed validation.
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// The incident was already approved or rejected.
    #[error("incident {0} has already been decided")]
    AlreadyDecided(IncidentId),

    /// Failed to read or write the registry snapshot.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

/// Errors raised by notifiers.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("failed to write notification: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize notification: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for the platewatch library.
pub type Result<T> = std::result::Result<T, PlatewatchError>;
