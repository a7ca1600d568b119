//! Error types for the registration pipeline.

use landmark_compose::ComposeError;
use landmark_linear::AlignError;
use landmark_thinplate::WarpError;
use thiserror::Error;

/// Errors that can occur while recomputing a registration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistrationError {
    /// The linear stage could not be fitted.
    #[error("linear alignment failed: {0}")]
    Align(#[from] AlignError),

    /// The thin-plate stage could not be fitted.
    #[error("thin-plate warp failed: {0}")]
    Warp(#[from] WarpError),

    /// The installed transform could not be inverted or sampled.
    #[error("transform composition failed: {0}")]
    Compose(#[from] ComposeError),
}

impl RegistrationError {
    /// Returns true if the failure was a moving/fixed landmark count mismatch.
    #[must_use]
    pub const fn is_dimension_mismatch(&self) -> bool {
        matches!(
            self,
            Self::Align(AlignError::DimensionMismatch { .. })
                | Self::Warp(WarpError::DimensionMismatch { .. })
        )
    }

    /// Returns true if the landmarks were too degenerate to fit.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        matches!(
            self,
            Self::Align(AlignError::DegenerateLandmarks(_))
                | Self::Warp(WarpError::DegenerateLandmarks(_))
        )
    }

    /// Returns true if a landmark coordinate was NaN or infinite.
    #[must_use]
    pub const fn is_non_finite(&self) -> bool {
        matches!(
            self,
            Self::Align(AlignError::NonFiniteLandmark { .. })
                | Self::Warp(WarpError::NonFiniteLandmark { .. })
        )
    }
}

/// Result type for registration operations.
pub type RegistrationResult<T> = Result<T, RegistrationError>;
