//! Best-guess plate selection from scored OCR tokens.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::RecognitionError;
use crate::models::config::PlateConfig;
use crate::ocr::ScoredText;

use super::normalize::{is_plate_shaped, normalize};

/// The token chosen as the plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateCandidate {
    /// Token text exactly as the OCR engine emitted it.
    pub raw_text: String,

    /// Normalized plate key.
    pub plate: String,

    /// OCR confidence of the chosen token (0.0 - 1.0).
    pub score: f32,

    /// No token was plate-shaped; this is the highest-scoring token overall
    /// and should be treated as low-confidence.
    pub degraded: bool,
}

/// Selects the most plausible plate among OCR tokens.
///
/// OCR output is full of stickers, logos and dealer frames. Tokens whose
/// normalized form is plate-shaped win; if none are, the highest-scoring
/// token is returned as a degraded result rather than failing.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    min_len: usize,
    max_len: usize,
}

impl CandidateFilter {
    /// Create a filter with the default 5..=10 length window.
    pub fn new() -> Self {
        Self::from_config(&PlateConfig::default())
    }

    pub fn from_config(config: &PlateConfig) -> Self {
        Self {
            min_len: config.min_len,
            max_len: config.max_len,
        }
    }

    /// Set the accepted normalized length window (inclusive).
    pub fn with_length(mut self, min_len: usize, max_len: usize) -> Self {
        self.min_len = min_len;
        self.max_len = max_len;
        self
    }

    /// Pick the plate from `tokens`.
    ///
    /// Ties on score go to the earliest token.
    pub fn select(&self, tokens: &[ScoredText]) -> Result<PlateCandidate, RecognitionError> {
        if tokens.is_empty() {
            return Err(RecognitionError::NoTextExtracted);
        }

        let normalized: Vec<String> = tokens.iter().map(|t| normalize(&t.text)).collect();

        let shaped = best_by_score(
            tokens
                .iter()
                .zip(&normalized)
                .filter(|(_, plate)| is_plate_shaped(plate, self.min_len, self.max_len)),
        );

        if let Some((token, plate)) = shaped {
            debug!("Selected plate-shaped candidate {:?} ({:.3})", plate, token.score);
            return Ok(PlateCandidate {
                raw_text: token.text.clone(),
                plate: plate.clone(),
                score: token.score,
                degraded: false,
            });
        }

        // Non-empty input always yields a best token.
        let (token, plate) =
            best_by_score(tokens.iter().zip(&normalized)).ok_or(RecognitionError::NoTextExtracted)?;

        warn!(
            "No plate-shaped token among {} candidates, falling back to {:?} ({:.3})",
            tokens.len(),
            token.text,
            token.score
        );

        Ok(PlateCandidate {
            raw_text: token.text.clone(),
            plate: plate.clone(),
            score: token.score,
            degraded: true,
        })
    }
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Select a plate with the default rules.
pub fn select_candidate(tokens: &[ScoredText]) -> Result<PlateCandidate, RecognitionError> {
    CandidateFilter::new().select(tokens)
}

/// Highest score wins; only a strictly greater score displaces an earlier token.
fn best_by_score<'a>(
    pairs: impl Iterator<Item = (&'a ScoredText, &'a String)>,
) -> Option<(&'a ScoredText, &'a String)> {
    pairs.fold(None, |best, current| match best {
        Some(best) if current.0.score <= best.0.score => Some(best),
        Some(best) if current.0.score.is_nan() => Some(best),
        _ => Some(current),
    })
}
