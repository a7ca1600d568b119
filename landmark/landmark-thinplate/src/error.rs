//! Error types for thin-plate spline fitting and evaluation.

use landmark_types::LengthMismatch;
use thiserror::Error;

/// Errors that can occur while fitting or inverting a thin-plate warp.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WarpError {
    /// Source and target landmark counts differ.
    #[error("landmark count mismatch: {source_len} source points vs {target_len} target points")]
    DimensionMismatch {
        /// Number of source landmarks.
        source_len: usize,
        /// Number of target landmarks.
        target_len: usize,
    },

    /// No control points were provided.
    #[error("no control points provided")]
    EmptyLandmarks,

    /// A landmark has a NaN or infinite coordinate.
    #[error("landmark {index} has a non-finite coordinate")]
    NonFiniteLandmark {
        /// Index of the offending pair.
        index: usize,
    },

    /// The spline system is singular for these control points.
    #[error("landmarks are degenerate: {0}")]
    DegenerateLandmarks(String),

    /// Newton iteration for the inverse did not reach the tolerance.
    #[error("inverse did not converge after {iterations} iterations (residual: {residual:.3e})")]
    InverseDidNotConverge {
        /// Number of iterations performed.
        iterations: usize,
        /// Final distance between the forward image and the query point.
        residual: f64,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl From<LengthMismatch> for WarpError {
    fn from(mismatch: LengthMismatch) -> Self {
        Self::DimensionMismatch {
            source_len: mismatch.source_len,
            target_len: mismatch.target_len,
        }
    }
}

/// Result type for thin-plate operations.
pub type WarpResult<T> = Result<T, WarpError>;
