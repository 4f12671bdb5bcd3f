//! Bake errors
//!
//! Every error is fatal to the current bake; nothing is retried because
//! animation evaluation is deterministic.

use vat_shared::{BoundsError, LayoutError};

/// Error reported by an animation evaluator
pub type EvalError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for the baking pipeline.
#[derive(Debug, thiserror::Error)]
pub enum BakeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no bounding box assigned: compute or set bounds before baking the texture")]
    MissingBoundingBox,

    #[error("UV channel {0} out of range (must be 0-3)")]
    InvalidChannel(u32),

    #[error("failed to evaluate clip '{clip}' at frame {frame}: {source}")]
    EvaluationFailure {
        clip: String,
        frame: u32,
        #[source]
        source: EvalError,
    },
}

impl BakeError {
    pub(crate) fn evaluation(clip: &str, frame: u32, source: impl Into<EvalError>) -> Self {
        Self::EvaluationFailure {
            clip: clip.to_string(),
            frame,
            source: source.into(),
        }
    }
}

impl From<LayoutError> for BakeError {
    fn from(err: LayoutError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<BoundsError> for BakeError {
    fn from(err: BoundsError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

pub type BakeResult<T> = Result<T, BakeError>;
