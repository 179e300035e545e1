//! Plate text normalization and candidate selection.

mod candidate;
mod normalize;

pub use candidate::{select_candidate, CandidateFilter, PlateCandidate};
pub use normalize::{is_plate_shaped, normalize};
