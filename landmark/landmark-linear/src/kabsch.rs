//! Kabsch fit for the rigid and similarity modes.
//!
//! Both point sets are moved to their centroids, the rotation comes from the
//! SVD of their cross-covariance, and the similarity mode additionally takes
//! the least-squares uniform scale for that rotation.

use crate::{AlignError, AlignResult, LinearTransform};
use nalgebra::{Matrix3, Point3, Rotation3, UnitQuaternion, Vector3};

/// Below this Frobenius norm the cross-covariance carries no rotational
/// information (single landmark, or all landmarks at their centroid).
const MIN_COVARIANCE_NORM: f64 = 1e-12;

/// Below this the source spread is too small to estimate a scale.
const MIN_SOURCE_SPREAD: f64 = 1e-10;

/// Paired landmarks expressed relative to their own centroids.
struct CenteredPairs {
    source_centroid: Vector3<f64>,
    target_centroid: Vector3<f64>,
    pairs: Vec<(Vector3<f64>, Vector3<f64>)>,
}

impl CenteredPairs {
    fn new(source: &[Point3<f64>], target: &[Point3<f64>]) -> Self {
        let source_centroid = compute_centroid(source);
        let target_centroid = compute_centroid(target);
        let pairs = source
            .iter()
            .zip(target)
            .map(|(s, t)| (s.coords - source_centroid, t.coords - target_centroid))
            .collect();
        Self {
            source_centroid,
            target_centroid,
            pairs,
        }
    }

    /// `H = sum(s_i * t_i^T)`
    fn cross_covariance(&self) -> Matrix3<f64> {
        self.pairs
            .iter()
            .fold(Matrix3::zeros(), |h, (s, t)| h + s * t.transpose())
    }

    /// `sum(t_i . R s_i) / sum(|s_i|^2)`, or 1 when the source has no spread.
    fn scale_for(&self, rotation: &UnitQuaternion<f64>) -> f64 {
        let (spread, agreement) = self
            .pairs
            .iter()
            .fold((0.0, 0.0), |(spread, agreement), (s, t)| {
                (spread + s.norm_squared(), agreement + (rotation * s).dot(t))
            });
        if spread > MIN_SOURCE_SPREAD {
            agreement / spread
        } else {
            1.0
        }
    }
}

/// Fits rotation + translation, plus a uniform scale when `with_scale` is
/// set, mapping `source` onto `target`.
///
/// Callers have already checked that the slices are non-empty and paired.
///
/// # Errors
///
/// Returns [`AlignError::SvdFailed`] if the SVD does not produce its factors
/// and [`AlignError::DegenerateLandmarks`] if the coordinates overflow.
pub(crate) fn compute_similarity_transform(
    source: &[Point3<f64>],
    target: &[Point3<f64>],
    with_scale: bool,
) -> AlignResult<LinearTransform> {
    let centered = CenteredPairs::new(source, target);
    let rotation = optimal_rotation(&centered.cross_covariance())?;
    let scale = if with_scale {
        centered.scale_for(&rotation)
    } else {
        1.0
    };

    let translation = centered.target_centroid - (rotation * centered.source_centroid) * scale;
    Ok(LinearTransform::from_similarity(&rotation, &translation, scale))
}

/// `R = V * U^T` from the SVD of `h`, with the axis of the smallest singular
/// value flipped when that product is a reflection.
fn optimal_rotation(h: &Matrix3<f64>) -> AlignResult<UnitQuaternion<f64>> {
    // The SVD never terminates on NaN or infinite entries.
    if h.iter().any(|v| !v.is_finite()) {
        return Err(AlignError::DegenerateLandmarks(
            "cross-covariance is not finite".to_string(),
        ));
    }
    if h.norm() < MIN_COVARIANCE_NORM {
        return Ok(UnitQuaternion::identity());
    }

    let svd = h.svd(true, true);
    let u_t = svd.u.ok_or(AlignError::SvdFailed)?.transpose();
    let mut v = svd.v_t.ok_or(AlignError::SvdFailed)?.transpose();

    if (v * u_t).determinant() < 0.0 {
        let weakest = svd.singular_values.imin();
        v.column_mut(weakest).neg_mut();
    }

    let rotation = Rotation3::from_matrix_unchecked(v * u_t);
    Ok(UnitQuaternion::from_rotation_matrix(&rotation))
}

/// Mean of the point coordinates. The slice must be non-empty.
pub(crate) fn compute_centroid(points: &[Point3<f64>]) -> Vector3<f64> {
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    points.iter().map(|p| p.coords).sum::<Vector3<f64>>() / n
}
