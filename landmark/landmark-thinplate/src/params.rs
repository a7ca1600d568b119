//! Fitting and inversion parameters.

use crate::{WarpError, WarpResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters for fitting a thin-plate warp.
///
/// # Example
///
/// ```
/// use landmark_thinplate::WarpParams;
///
/// let params = WarpParams::default().with_coincidence_tolerance(1e-6);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WarpParams {
    /// Control points closer than this (relative to the RMS spread of the
    /// control points) are treated as coincident.
    pub coincidence_tolerance: f64,
    /// Largest accepted interpolation error at a control point after the
    /// solve, relative to the RMS spread of the control points.
    pub interpolation_tolerance: f64,
}

impl Default for WarpParams {
    fn default() -> Self {
        Self {
            coincidence_tolerance: 1e-9,
            interpolation_tolerance: 1e-6,
        }
    }
}

impl WarpParams {
    /// Sets the coincidence tolerance.
    #[must_use]
    pub const fn with_coincidence_tolerance(mut self, tolerance: f64) -> Self {
        self.coincidence_tolerance = tolerance;
        self
    }

    /// Sets the interpolation tolerance.
    #[must_use]
    pub const fn with_interpolation_tolerance(mut self, tolerance: f64) -> Self {
        self.interpolation_tolerance = tolerance;
        self
    }

    /// Checks that both tolerances are positive and finite.
    ///
    /// # Errors
    ///
    /// Returns [`WarpError::InvalidParameter`] naming the offending field.
    pub fn validate(&self) -> WarpResult<()> {
        check_tolerance("coincidence_tolerance", self.coincidence_tolerance)?;
        check_tolerance("interpolation_tolerance", self.interpolation_tolerance)
    }
}

/// Parameters for inverting a thin-plate warp by Newton iteration.
///
/// # Example
///
/// ```
/// use landmark_thinplate::InverseParams;
///
/// let params = InverseParams::default()
///     .with_max_iterations(50)
///     .with_tolerance(1e-6);
/// assert_eq!(params.max_iterations, 50);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InverseParams {
    /// Maximum number of Newton steps per point.
    pub max_iterations: usize,
    /// Accepted distance (world units) between the forward image of the
    /// estimate and the query point.
    pub tolerance: f64,
}

impl Default for InverseParams {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            tolerance: 1e-8,
        }
    }
}

impl InverseParams {
    /// Sets the iteration limit.
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the convergence tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Checks the iteration limit and tolerance.
    ///
    /// # Errors
    ///
    /// Returns [`WarpError::InvalidParameter`] naming the offending field.
    pub fn validate(&self) -> WarpResult<()> {
        if self.max_iterations == 0 {
            return Err(WarpError::InvalidParameter(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        check_tolerance("tolerance", self.tolerance)
    }
}

fn check_tolerance(name: &str, value: f64) -> WarpResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(WarpError::InvalidParameter(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(WarpParams::default().validate().is_ok());
        assert!(InverseParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_tolerances() {
        assert!(
            WarpParams::default()
                .with_coincidence_tolerance(0.0)
                .validate()
                .is_err()
        );
        assert!(
            WarpParams::default()
                .with_interpolation_tolerance(f64::NAN)
                .validate()
                .is_err()
        );
        assert!(InverseParams::default().with_tolerance(-1.0).validate().is_err());
    }

    #[test]
    fn rejects_zero_iterations() {
        let err = InverseParams::default()
            .with_max_iterations(0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, WarpError::InvalidParameter(msg) if msg.contains("max_iterations")));
    }
}
