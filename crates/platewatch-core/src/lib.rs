//! Core library for license plate recognition and incident escalation.
//!
//! This crate provides:
//! - Plate text normalization and best-candidate selection from OCR tokens
//! - A registry of people, vehicles and incidents with exact plate lookup
//! - Incident escalation that blocks access after repeated approved incidents
//! - A recognition pipeline tying an OCR engine to the registry
//! - Best-effort notification of escalation outcomes

pub mod error;
pub mod escalation;
pub mod models;
pub mod notify;
pub mod ocr;
pub mod plate;
pub mod recognition;
pub mod registry;

pub use error::{NotifyError, OcrError, PlatewatchError, RecognitionError, RegistryError, Result};
pub use escalation::{Directive, EscalationEngine, NotificationKind};
pub use models::config::PlatewatchConfig;
pub use models::registry::{
    AccessStatus, Decision, Incident, IncidentFields, IncidentId, MatchedRecord, NewPerson,
    NewVehicle, Person, PersonId, Vehicle, VehicleId,
};
pub use notify::{dispatch, LogNotifier, Notifier, OutboxNotifier};
pub use ocr::{ScoredText, TextExtractor};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use plate::{normalize, select_candidate, CandidateFilter, PlateCandidate};
pub use recognition::{PlateRecognizer, RecognitionResult};
pub use registry::Registry;
