//! Error types for transform composition and grid sampling.

use landmark_thinplate::WarpError;
use thiserror::Error;

/// Errors that can occur while inverting or sampling a composed transform.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ComposeError {
    /// A linear stage has a singular matrix and cannot be inverted.
    #[error("linear stage {stage} is not invertible")]
    NotInvertible {
        /// Index of the stage in forward order.
        stage: usize,
    },

    /// Inverting a thin-plate stage failed.
    #[error("thin-plate stage {stage} could not be inverted")]
    Warp {
        /// Index of the stage in forward order.
        stage: usize,
        /// The underlying warp error.
        #[source]
        source: WarpError,
    },

    /// Grid spacing must be positive and finite on every axis.
    #[error("invalid grid spacing: {0}")]
    InvalidSpacing(String),

    /// The lattice would hold more samples than can be stored.
    #[error("grid of {requested:.3e} samples exceeds the limit of {limit}")]
    GridTooLarge {
        /// Number of lattice points asked for.
        requested: f64,
        /// Largest number of lattice points accepted.
        limit: usize,
    },

    /// The bounds to cover are empty or not finite.
    #[error("cannot cover empty or non-finite bounds")]
    EmptyBounds,
}

/// Result type for composition operations.
pub type ComposeResult<T> = Result<T, ComposeError>;
