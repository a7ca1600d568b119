//! Constraint families for the linear fit.

use crate::AlignError;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Minimum number of landmark pairs for a fit that recovers scale.
///
/// Below this count only rotation and translation are well posed, so
/// [`LinearMode::effective_for`] falls back to [`LinearMode::Rigid`].
pub const MIN_LANDMARKS_FOR_SCALING: usize = 3;

/// The constraint family of the least-squares linear fit.
///
/// # Example
///
/// ```
/// use landmark_linear::LinearMode;
///
/// let mode: LinearMode = "Similarity".parse().unwrap();
/// assert_eq!(mode, LinearMode::Similarity);
///
/// // Two landmarks cannot determine scale
/// assert_eq!(mode.effective_for(2), LinearMode::Rigid);
/// assert_eq!(mode.effective_for(3), LinearMode::Similarity);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LinearMode {
    /// Rotation and translation.
    #[default]
    Rigid,
    /// Rotation, uniform scale and translation.
    Similarity,
    /// Full 3x3 linear part plus translation.
    Affine,
}

impl LinearMode {
    /// All modes in the order they are usually offered to users.
    pub const ALL: [Self; 3] = [Self::Rigid, Self::Similarity, Self::Affine];

    /// Display name of the mode.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rigid => "Rigid",
            Self::Similarity => "Similarity",
            Self::Affine => "Affine",
        }
    }

    /// The mode that is actually fitted for `landmark_count` pairs.
    ///
    /// Scaling modes need at least [`MIN_LANDMARKS_FOR_SCALING`] pairs;
    /// with fewer, the fit is silently downgraded to [`LinearMode::Rigid`].
    #[must_use]
    pub const fn effective_for(self, landmark_count: usize) -> Self {
        if landmark_count < MIN_LANDMARKS_FOR_SCALING {
            Self::Rigid
        } else {
            self
        }
    }
}

impl fmt::Display for LinearMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LinearMode {
    type Err = AlignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AlignError::UnknownMode(s.to_string()))
    }
}
