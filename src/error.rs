use thiserror::Error;

use crate::audio::decode::DecodeError;

/// Errors raised by the analysis pipeline.
///
/// Numeric degeneracies (silent frames, too few onsets) are not errors; they
/// resolve to fallback values inside the stage that meets them.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Malformed sizes, rates or channel layouts. Raised before any work is done.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("resampling failed: {0}")]
    Resample(String),
}

impl AnalysisError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
