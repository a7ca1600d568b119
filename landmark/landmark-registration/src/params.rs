//! Pipeline configuration.

use landmark_linear::LinearMode;
use landmark_thinplate::{InverseParams, WarpParams};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters for [`LandmarkRegistration`](crate::LandmarkRegistration).
///
/// # Example
///
/// ```
/// use landmark_registration::{LinearMode, RegistrationParams};
///
/// let params = RegistrationParams::default()
///     .with_linear_mode(LinearMode::Affine)
///     .with_hot_update(true);
///
/// assert_eq!(params.linear_mode, LinearMode::Affine);
/// assert!(params.hot_update);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegistrationParams {
    /// Linear stage mode. Defaults to rigid.
    pub linear_mode: LinearMode,
    /// Recompute on every landmark move instead of only when a drag ends.
    /// Off by default.
    pub hot_update: bool,
    /// Thin-plate fitting tolerances.
    pub warp: WarpParams,
    /// Newton settings used when the installed transform is inverted.
    pub inverse: InverseParams,
}

impl RegistrationParams {
    /// Sets the linear stage mode.
    #[must_use]
    pub const fn with_linear_mode(mut self, mode: LinearMode) -> Self {
        self.linear_mode = mode;
        self
    }

    /// Enables or disables hot update.
    #[must_use]
    pub const fn with_hot_update(mut self, hot_update: bool) -> Self {
        self.hot_update = hot_update;
        self
    }

    /// Sets the thin-plate fitting parameters.
    #[must_use]
    pub const fn with_warp(mut self, warp: WarpParams) -> Self {
        self.warp = warp;
        self
    }

    /// Sets the inversion parameters.
    #[must_use]
    pub const fn with_inverse(mut self, inverse: InverseParams) -> Self {
        self.inverse = inverse;
        self
    }
}
