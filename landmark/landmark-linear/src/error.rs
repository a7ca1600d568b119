//! Error types for linear landmark fitting.

use landmark_types::LengthMismatch;
use thiserror::Error;

/// Errors that can occur while fitting a linear transform.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AlignError {
    /// Source and target landmark counts differ.
    #[error("landmark count mismatch: {source_len} source points vs {target_len} target points")]
    DimensionMismatch {
        /// Number of source landmarks.
        source_len: usize,
        /// Number of target landmarks.
        target_len: usize,
    },

    /// No landmark pairs were provided.
    #[error("no landmark pairs provided")]
    EmptyLandmarks,

    /// A landmark has a NaN or infinite coordinate.
    #[error("landmark {index} has a non-finite coordinate")]
    NonFiniteLandmark {
        /// Index of the offending pair.
        index: usize,
    },

    /// SVD computation failed during transform estimation.
    #[error("SVD computation failed during transform estimation")]
    SvdFailed,

    /// The least-squares system has no usable solution.
    #[error("landmarks are degenerate: {0}")]
    DegenerateLandmarks(String),

    /// A mode name could not be parsed.
    #[error("unknown linear mode '{0}' (expected Rigid, Similarity or Affine)")]
    UnknownMode(String),
}

impl From<LengthMismatch> for AlignError {
    fn from(mismatch: LengthMismatch) -> Self {
        Self::DimensionMismatch {
            source_len: mismatch.source_len,
            target_len: mismatch.target_len,
        }
    }
}

/// Result type for linear fitting operations.
pub type AlignResult<T> = Result<T, AlignError>;
