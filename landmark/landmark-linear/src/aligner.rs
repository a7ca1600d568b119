//! Landmark-based linear alignment.
//!
//! [`fit_linear`] is the pure entry point. [`LinearAligner`] keeps the most
//! recent successful fit so callers can re-fit as landmarks move.

use crate::affine::compute_affine_transform;
use crate::kabsch::compute_similarity_transform;
use crate::{AlignError, AlignResult, LinearMode, LinearTransform};
use landmark_types::{PointSet, PointTransform};
use tracing::{debug, warn};

/// A fitted linear transform with the mode that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    /// The fitted source-to-target transform.
    pub transform: LinearTransform,
    /// The mode the caller asked for.
    pub requested_mode: LinearMode,
    /// The mode that was fitted after the landmark-count policy.
    pub effective_mode: LinearMode,
    /// RMS distance between transformed source and target landmarks.
    pub rms_error: f64,
    /// Largest distance between a transformed source and its target.
    pub max_error: f64,
}

impl LinearFit {
    /// Returns true if the landmark count forced a simpler mode.
    #[must_use]
    pub fn was_downgraded(&self) -> bool {
        self.requested_mode != self.effective_mode
    }
}

/// Fits a linear transform mapping `source` landmarks onto `target`
/// landmarks.
///
/// With fewer than three pairs, [`LinearMode::Similarity`] and
/// [`LinearMode::Affine`] requests are fitted as [`LinearMode::Rigid`]. This
/// is a policy substitution, not an error: it is logged and reported through
/// [`LinearFit::effective_mode`].
///
/// # Errors
///
/// Returns an error if:
/// - The point sets have different lengths ([`AlignError::DimensionMismatch`])
/// - The point sets are empty
/// - A coordinate is NaN or infinite ([`AlignError::NonFiniteLandmark`])
/// - The SVD fails or the affine solution is not finite
///
/// # Example
///
/// ```
/// use landmark_linear::{fit_linear, LinearMode};
/// use landmark_types::{PointSet, PointTransform};
///
/// let source = PointSet::from_coords(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
/// let target = PointSet::from_coords(&[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]]);
///
/// let fit = fit_linear(&source, &target, LinearMode::Similarity).unwrap();
///
/// assert!((fit.transform.uniform_scale(1e-9).unwrap() - 2.0).abs() < 1e-9);
/// assert!(fit.rms_error < 1e-9);
/// ```
pub fn fit_linear(
    source: &PointSet,
    target: &PointSet,
    mode: LinearMode,
) -> AlignResult<LinearFit> {
    let count = source.check_correspondence(target)?;
    if count == 0 {
        return Err(AlignError::EmptyLandmarks);
    }
    if let Some(index) = source.first_non_finite().or_else(|| target.first_non_finite()) {
        return Err(AlignError::NonFiniteLandmark { index });
    }

    let effective_mode = mode.effective_for(count);
    if effective_mode != mode {
        warn!(
            requested = %mode,
            effective = %effective_mode,
            landmarks = count,
            "Too few landmarks for requested mode, fitting rigid transform"
        );
    }

    let transform = match effective_mode {
        LinearMode::Rigid => {
            compute_similarity_transform(source.as_slice(), target.as_slice(), false)?
        }
        LinearMode::Similarity => {
            compute_similarity_transform(source.as_slice(), target.as_slice(), true)?
        }
        LinearMode::Affine => compute_affine_transform(source.as_slice(), target.as_slice())?,
    };

    let (rms_error, max_error) = compute_alignment_error(source, target, &transform)?;

    debug!(
        mode = %effective_mode,
        landmarks = count,
        rms_error,
        max_error,
        "Fitted linear transform"
    );

    Ok(LinearFit {
        transform,
        requested_mode: mode,
        effective_mode,
        rms_error,
        max_error,
    })
}

/// Computes the alignment error between paired landmarks after applying a
/// transform.
///
/// Returns (RMS error, max error), both zero for empty sets.
///
/// # Errors
///
/// Returns [`AlignError::DimensionMismatch`] if the sets differ in length.
pub fn compute_alignment_error(
    source: &PointSet,
    target: &PointSet,
    transform: &impl PointTransform,
) -> AlignResult<(f64, f64)> {
    let count = source.check_correspondence(target)?;
    if count == 0 {
        return Ok((0.0, 0.0));
    }

    let mut sum_sq = 0.0;
    let mut max_sq: f64 = 0.0;
    for (s, t) in source.iter().zip(target.iter()) {
        let dist_sq = (transform.transform_point(s) - t).norm_squared();
        sum_sq += dist_sq;
        max_sq = max_sq.max(dist_sq);
    }

    #[allow(clippy::cast_precision_loss)]
    let rms = (sum_sq / count as f64).sqrt();
    Ok((rms, max_sq.sqrt()))
}

/// Stateful linear aligner.
///
/// Holds the requested mode and the latest successful fit. A re-fit
/// replaces the stored fit only when it succeeds.
///
/// # Example
///
/// ```
/// use landmark_linear::{LinearAligner, LinearMode};
/// use landmark_types::PointSet;
///
/// let source = PointSet::from_coords(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
/// let target = PointSet::from_coords(&[[1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
///
/// let mut aligner = LinearAligner::new(LinearMode::Affine);
/// let fit = aligner.fit(&source, &target).unwrap();
///
/// assert!(fit.was_downgraded());
/// assert!(aligner.transform().is_rigid(1e-9));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LinearAligner {
    mode: LinearMode,
    current: Option<LinearFit>,
}

impl LinearAligner {
    /// Creates an aligner for the given mode with no fit yet.
    #[must_use]
    pub const fn new(mode: LinearMode) -> Self {
        Self {
            mode,
            current: None,
        }
    }

    /// The requested mode.
    #[must_use]
    pub const fn mode(&self) -> LinearMode {
        self.mode
    }

    /// Changes the requested mode. The stored fit is kept until the next
    /// successful fit.
    pub fn set_mode(&mut self, mode: LinearMode) {
        self.mode = mode;
    }

    /// Fits without touching the stored fit.
    ///
    /// # Errors
    ///
    /// See [`fit_linear`].
    pub fn estimate(&self, source: &PointSet, target: &PointSet) -> AlignResult<LinearFit> {
        fit_linear(source, target, self.mode)
    }

    /// Stores a fit as the current one.
    pub fn commit(&mut self, fit: LinearFit) -> &LinearFit {
        self.current.insert(fit)
    }

    /// Fits and stores the result.
    ///
    /// On error the previous fit is kept.
    ///
    /// # Errors
    ///
    /// See [`fit_linear`].
    pub fn fit(&mut self, source: &PointSet, target: &PointSet) -> AlignResult<&LinearFit> {
        let fit = self.estimate(source, target)?;
        Ok(self.commit(fit))
    }

    /// The latest successful fit, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&LinearFit> {
        self.current.as_ref()
    }

    /// The latest fitted transform, or identity before the first fit.
    #[must_use]
    pub fn transform(&self) -> LinearTransform {
        self.current
            .as_ref()
            .map_or_else(LinearTransform::identity, |fit| fit.transform)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector3};
    use std::f64::consts::PI;

    fn tetrahedron() -> PointSet {
        PointSet::from_coords(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ])
    }

    #[test]
    fn mismatched_lengths_fail() {
        let source = tetrahedron();
        let target = PointSet::from_coords(&[[0.0, 0.0, 0.0]]);
        let err = fit_linear(&source, &target, LinearMode::Rigid).unwrap_err();
        assert!(matches!(
            err,
            AlignError::DimensionMismatch {
                source_len: 4,
                target_len: 1
            }
        ));
    }

    #[test]
    fn empty_sets_fail() {
        let err = fit_linear(&PointSet::new(), &PointSet::new(), LinearMode::Rigid).unwrap_err();
        assert!(matches!(err, AlignError::EmptyLandmarks));
    }

    #[test]
    fn similarity_scale_by_two() {
        let source = PointSet::from_coords(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let target = PointSet::from_coords(&[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]]);

        let fit = fit_linear(&source, &target, LinearMode::Similarity).unwrap();

        assert!(!fit.was_downgraded());
        assert_relative_eq!(
            fit.transform.linear_part(),
            Matrix3::identity() * 2.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(fit.transform.translation(), Vector3::zeros(), epsilon = 1e-9);
        assert!(fit.max_error < 1e-9);
    }

    #[test]
    fn affine_fit_reproduces_targets() {
        let linear = Matrix3::new(2.0, 0.5, 0.0, 0.0, 1.0, -0.3, 0.1, 0.0, 0.7);
        let truth = LinearTransform::from_parts(&linear, &Vector3::new(1.0, -2.0, 0.5));
        let source = tetrahedron();
        let target = truth.apply(&source);

        let fit = fit_linear(&source, &target, LinearMode::Affine).unwrap();

        assert!(fit.max_error < 1e-8);
        assert_relative_eq!(fit.transform.linear_part(), linear, epsilon = 1e-8);
    }

    #[test]
    fn rigid_mode_ignores_scale() {
        let source = tetrahedron();
        let target = source.map(|p| Point3::from(p.coords * 3.0));

        let fit = fit_linear(&source, &target, LinearMode::Rigid).unwrap();

        assert!(fit.transform.is_rigid(1e-9));
        assert!(fit.rms_error > 0.1);
    }

    #[test]
    fn two_landmarks_downgrade_to_rigid() {
        let source = PointSet::from_coords(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let target = PointSet::from_coords(&[[0.0, 0.0, 0.0], [0.0, 3.0, 0.0]]);

        for mode in [LinearMode::Similarity, LinearMode::Affine] {
            let fit = fit_linear(&source, &target, mode).unwrap();
            assert!(fit.was_downgraded());
            assert_eq!(fit.effective_mode, LinearMode::Rigid);
            assert!(fit.transform.is_rigid(1e-9));
        }
    }

    #[test]
    fn rotation_is_recovered() {
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), PI / 6.0);
        let truth = LinearTransform::from_similarity(&rotation, &Vector3::new(0.0, 0.0, 4.0), 1.0);
        let source = tetrahedron();
        let target = truth.apply(&source);

        let fit = fit_linear(&source, &target, LinearMode::Rigid).unwrap();

        assert_relative_eq!(fit.transform.matrix(), truth.matrix(), epsilon = 1e-9);
    }

    #[test]
    fn aligner_keeps_previous_fit_on_error() {
        let source = tetrahedron();
        let target = source.map(|p| p + Vector3::new(1.0, 0.0, 0.0));

        let mut aligner = LinearAligner::new(LinearMode::Rigid);
        assert!(aligner.transform().is_identity(0.0));
        aligner.fit(&source, &target).unwrap();
        let first = aligner.transform();

        let short = PointSet::from_coords(&[[0.0, 0.0, 0.0]]);
        assert!(aligner.fit(&source, &short).is_err());
        assert_eq!(aligner.transform(), first);
    }

    #[test]
    fn aligner_refit_replaces_transform() {
        let source = tetrahedron();
        let mut aligner = LinearAligner::new(LinearMode::Rigid);

        aligner
            .fit(&source, &source.map(|p| p + Vector3::new(1.0, 0.0, 0.0)))
            .unwrap();
        aligner
            .fit(&source, &source.map(|p| p + Vector3::new(0.0, 5.0, 0.0)))
            .unwrap();

        assert_relative_eq!(
            aligner.transform().translation(),
            Vector3::new(0.0, 5.0, 0.0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn alignment_error_of_identity() {
        let a = PointSet::from_coords(&[[0.0, 0.0, 0.0]]);
        let b = PointSet::from_coords(&[[1.0, 0.0, 0.0]]);
        let (rms, max) = compute_alignment_error(&a, &b, &LinearTransform::identity()).unwrap();
        assert_relative_eq!(rms, 1.0, epsilon = 1e-12);
        assert_relative_eq!(max, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn alignment_error_needs_paired_sets() {
        let identity = LinearTransform::identity();
        let err = compute_alignment_error(&tetrahedron(), &PointSet::new(), &identity).unwrap_err();
        assert!(matches!(
            err,
            AlignError::DimensionMismatch {
                source_len: 4,
                target_len: 0
            }
        ));
    }

    #[test]
    fn non_finite_landmarks_are_rejected() {
        let source = PointSet::from_coords(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [f64::NAN, 0.0, 1.0],
        ]);

        for mode in LinearMode::ALL {
            let err = fit_linear(&source, &tetrahedron(), mode).unwrap_err();
            assert!(matches!(err, AlignError::NonFiniteLandmark { index: 3 }));
        }

        let target = PointSet::from_coords(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, f64::INFINITY, 0.0],
            [0.0, 0.0, 1.0],
        ]);
        let err = fit_linear(&tetrahedron(), &target, LinearMode::Affine).unwrap_err();
        assert!(matches!(err, AlignError::NonFiniteLandmark { index: 2 }));
    }

    #[test]
    fn overflowing_coordinates_are_degenerate() {
        let source = PointSet::from_coords(&[
            [1e308, 0.0, 0.0],
            [1e308, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ]);

        let err = fit_linear(&source, &tetrahedron(), LinearMode::Affine).unwrap_err();

        assert!(matches!(err, AlignError::DegenerateLandmarks(_)));
    }
}
