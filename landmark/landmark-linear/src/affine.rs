//! Least-squares affine fit.
//!
//! The centered system `S * A^T = T` is solved with an SVD pseudo-inverse,
//! anchored on the similarity fit: the affine linear part is the similarity
//! linear part plus the minimum-norm correction that best explains the
//! residual. Directions the landmarks do not span (three coplanar pairs, for
//! instance) therefore keep the similarity behaviour instead of collapsing.

use crate::kabsch::{compute_centroid, compute_similarity_transform};
use crate::{AlignError, AlignResult, LinearTransform};
use nalgebra::{DMatrix, Matrix3, Point3};

/// Singular values below this fraction of the largest one are treated as zero.
const RANK_TOLERANCE: f64 = 1e-10;

/// Computes the least-squares affine transform mapping `source_points` onto
/// `target_points`.
///
/// # Errors
///
/// Returns an error if the SVD fails or the solution is not finite.
pub(crate) fn compute_affine_transform(
    source_points: &[Point3<f64>],
    target_points: &[Point3<f64>],
) -> AlignResult<LinearTransform> {
    let anchor = compute_similarity_transform(source_points, target_points, true)?;
    let anchor_linear = anchor.linear_part();

    let source_centroid = compute_centroid(source_points);
    let target_centroid = compute_centroid(target_points);

    let n = source_points.len();
    let mut design = DMatrix::<f64>::zeros(n, 3);
    let mut residual = DMatrix::<f64>::zeros(n, 3);

    for (i, (s, t)) in source_points.iter().zip(target_points.iter()).enumerate() {
        let s_centered = s.coords - source_centroid;
        let t_centered = t.coords - target_centroid;
        let r = t_centered - anchor_linear * s_centered;
        for axis in 0..3 {
            design[(i, axis)] = s_centered[axis];
            residual[(i, axis)] = r[axis];
        }
    }

    if design.iter().chain(residual.iter()).any(|v| !v.is_finite()) {
        return Err(AlignError::DegenerateLandmarks(
            "affine system is not finite".to_string(),
        ));
    }

    let svd = design.svd(true, true);
    let largest = svd.singular_values.max();
    if largest <= f64::EPSILON {
        // Every source point sits on the centroid; nothing to correct.
        return Ok(anchor);
    }

    // Rows of the solution are the rows of the correction's transpose
    let correction_t = svd
        .solve(&residual, largest * RANK_TOLERANCE)
        .map_err(|reason| AlignError::DegenerateLandmarks(reason.to_string()))?;

    let linear = anchor_linear + Matrix3::from_fn(|row, col| correction_t[(col, row)]);
    if linear.iter().any(|v| !v.is_finite()) {
        return Err(AlignError::DegenerateLandmarks(
            "affine least-squares solution is not finite".to_string(),
        ));
    }

    let translation = target_centroid - linear * source_centroid;
    Ok(LinearTransform::from_parts(&linear, &translation))
}
