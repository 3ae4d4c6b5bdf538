//! Map pipeline error types.
//!
//! Every variant is recoverable: the renderer answers each one with the
//! fallback map instead of propagating it.

use thiserror::Error;

use crate::coord::CoordError;
use crate::provider::FetchError;

/// Why a real map could not be produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    /// The position lies outside the Web Mercator band.
    #[error("position cannot be projected: {0}")]
    ProjectionOutOfRange(#[from] CoordError),

    /// Every configured provider failed for this request.
    #[error("all {} map providers failed", .failures.len())]
    AllProvidersExhausted { failures: Vec<FetchError> },

    /// The caller abandoned the render.
    #[error("render cancelled")]
    Cancelled,
}

impl MapError {
    /// Short label used in logs and the fallback source tag.
    pub fn kind(&self) -> &'static str {
        match self {
            MapError::ProjectionOutOfRange(_) => "projection_out_of_range",
            MapError::AllProvidersExhausted { .. } => "all_providers_exhausted",
            MapError::Cancelled => "cancelled",
        }
    }
}
