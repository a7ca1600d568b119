//! Solved thin-plate spline model.
//!
//! The warp is `f(p) = p + d(p)` where the displacement field is
//!
//! ```text
//! d(p) = sum_i w_i * U(|q - q_i|) + a_0 + a_x * q.x + a_y * q.y + a_z * q.z
//! ```
//!
//! with the 3D kernel `U(r) = r` and `q = (p - c) / s` the control-point
//! frame (centroid `c`, RMS radius `s`). Working in the normalized frame keeps
//! the system conditioning independent of the physical units of the
//! landmarks.

use crate::{InverseParams, WarpError, WarpParams, WarpResult};
use landmark_types::{PointSet, PointTransform};
use nalgebra::{DMatrix, Matrix3, Point3, Vector3};
use tracing::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of affine terms appended to the kernel block: `[1, x, y, z]`.
const AFFINE_TERMS: usize = 4;

/// Singular values below this fraction of the largest one are treated as zero.
const RANK_TOLERANCE: f64 = 1e-12;

/// Distance below which the kernel gradient is taken as zero.
const GRADIENT_CUTOFF: f64 = 1e-12;

/// Smallest step fraction tried before a Newton step is accepted anyway.
const MIN_STEP_FRACTION: f64 = 1.0 / 1024.0;

/// A fitted thin-plate spline mapping source landmarks onto target landmarks.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThinPlateModel {
    /// Control points in world coordinates.
    control_points: PointSet,
    /// Control points in the normalized frame.
    normalized: Vec<Vector3<f64>>,
    /// Centroid of the control points.
    centroid: Point3<f64>,
    /// RMS distance of the control points from the centroid.
    scale: f64,
    /// Kernel weights followed by the affine block, one column per axis.
    coefficients: DMatrix<f64>,
}

impl ThinPlateModel {
    /// Fits a thin-plate spline through the given landmark pairs.
    ///
    /// # Errors
    ///
    /// - [`WarpError::DimensionMismatch`] if the sets differ in length
    /// - [`WarpError::EmptyLandmarks`] if no pairs are given
    /// - [`WarpError::InvalidParameter`] if `params` fails validation
    /// - [`WarpError::NonFiniteLandmark`] if a coordinate is NaN or infinite
    /// - [`WarpError::DegenerateLandmarks`] if two source points coincide or
    ///   the solved spline does not reproduce the targets
    pub fn fit(source: &PointSet, target: &PointSet, params: &WarpParams) -> WarpResult<Self> {
        let n = source.check_correspondence(target)?;
        if n == 0 {
            return Err(WarpError::EmptyLandmarks);
        }
        params.validate()?;
        if let Some(index) = source.first_non_finite().or_else(|| target.first_non_finite()) {
            return Err(WarpError::NonFiniteLandmark { index });
        }

        let centroid = source.centroid().ok_or(WarpError::EmptyLandmarks)?;
        let scale = rms_radius(source, &centroid);
        let normalized: Vec<Vector3<f64>> =
            source.iter().map(|p| (p - centroid) / scale).collect();

        check_coincident(&normalized, params.coincidence_tolerance)?;

        let size = n + AFFINE_TERMS;
        let mut system = DMatrix::<f64>::zeros(size, size);
        let mut rhs = DMatrix::<f64>::zeros(size, 3);

        for i in 0..n {
            for j in (i + 1)..n {
                let r = (normalized[i] - normalized[j]).norm();
                system[(i, j)] = r;
                system[(j, i)] = r;
            }

            let q = &normalized[i];
            let row = [1.0, q.x, q.y, q.z];
            for (k, value) in row.iter().enumerate() {
                system[(i, n + k)] = *value;
                system[(n + k, i)] = *value;
            }

            let displacement = target[i] - source[i];
            for axis in 0..3 {
                rhs[(i, axis)] = displacement[axis];
            }
        }

        // Overflowing coordinates would stall the SVD.
        if system.iter().chain(rhs.iter()).any(|v| !v.is_finite()) {
            return Err(WarpError::DegenerateLandmarks(
                "spline system is not finite".to_string(),
            ));
        }

        let svd = system.svd(true, true);
        let largest = svd.singular_values.max();
        let coefficients = svd
            .solve(&rhs, largest * RANK_TOLERANCE)
            .map_err(|reason| WarpError::DegenerateLandmarks(reason.to_string()))?;

        if coefficients.iter().any(|v| !v.is_finite()) {
            return Err(WarpError::DegenerateLandmarks(
                "spline coefficients are not finite".to_string(),
            ));
        }

        let model = Self {
            control_points: source.clone(),
            normalized,
            centroid,
            scale,
            coefficients,
        };

        // A rank-deficient system may have dropped a constraint; the fit must
        // still pass through every target.
        let residual = model.apply(source).max_distance_to(target)?;
        if residual > params.interpolation_tolerance * scale.max(1.0) {
            return Err(WarpError::DegenerateLandmarks(format!(
                "spline misses its targets by {residual:.3e}"
            )));
        }

        debug!(landmarks = n, scale, residual, "Fitted thin-plate spline");
        Ok(model)
    }

    /// Returns the control points (source landmarks) of the spline.
    #[must_use]
    pub const fn control_points(&self) -> &PointSet {
        &self.control_points
    }

    /// Returns the number of control points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.control_points.len()
    }

    /// Returns true if the model has no control points.
    ///
    /// A fitted model always has at least one.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.control_points.is_empty()
    }

    /// Evaluates the displacement `d(p)` at a world-space point.
    #[must_use]
    pub fn displacement(&self, point: &Point3<f64>) -> Vector3<f64> {
        let q = self.normalize(point);
        let n = self.normalized.len();

        let mut d = Vector3::zeros();
        for (i, control) in self.normalized.iter().enumerate() {
            let r = (q - control).norm();
            d += self.coefficient_row(i) * r;
        }

        d += self.coefficient_row(n);
        for axis in 0..3 {
            d += self.coefficient_row(n + 1 + axis) * q[axis];
        }
        d
    }

    /// Returns the Jacobian of the warp `f(p) = p + d(p)` at `point`.
    ///
    /// Column `b` holds the partial derivatives with respect to world axis `b`.
    /// At a control point the kernel gradient is taken as zero.
    #[must_use]
    pub fn jacobian(&self, point: &Point3<f64>) -> Matrix3<f64> {
        let q = self.normalize(point);
        let n = self.normalized.len();

        let mut dd = Matrix3::<f64>::zeros();
        for (i, control) in self.normalized.iter().enumerate() {
            let offset = q - control;
            let r = offset.norm();
            if r > GRADIENT_CUTOFF {
                dd += self.coefficient_row(i) * (offset / r).transpose();
            }
        }
        dd += Matrix3::from_columns(&[
            self.coefficient_row(n + 1),
            self.coefficient_row(n + 2),
            self.coefficient_row(n + 3),
        ]);

        Matrix3::identity() + dd / self.scale
    }

    /// Maps a point through the inverse warp by damped Newton iteration.
    ///
    /// The initial estimate is `y - d(y)`. A step that increases the residual
    /// is halved until it does not.
    ///
    /// # Errors
    ///
    /// - [`WarpError::InvalidParameter`] if `params` fails validation
    /// - [`WarpError::NonFiniteLandmark`] if a coordinate is NaN or infinite
    /// - [`WarpError::InverseDidNotConverge`] if the residual is still above
    ///   the tolerance after `params.max_iterations` steps
    pub fn inverse_transform_point(
        &self,
        point: &Point3<f64>,
        params: &InverseParams,
    ) -> WarpResult<Point3<f64>> {
        params.validate()?;

        let mut estimate = point - self.displacement(point);
        let mut residual_vec = self.transform_point(&estimate) - point;
        let mut residual = residual_vec.norm();

        for iteration in 0..params.max_iterations {
            if residual <= params.tolerance {
                trace!(iterations = iteration, residual, "Inverse converged");
                return Ok(estimate);
            }

            let step = self
                .jacobian(&estimate)
                .lu()
                .solve(&residual_vec)
                .unwrap_or(residual_vec);

            let mut fraction = 1.0;
            loop {
                let candidate = estimate - step * fraction;
                let candidate_vec = self.transform_point(&candidate) - point;
                let candidate_residual = candidate_vec.norm();
                if candidate_residual < residual || fraction <= MIN_STEP_FRACTION {
                    estimate = candidate;
                    residual_vec = candidate_vec;
                    residual = candidate_residual;
                    break;
                }
                fraction *= 0.5;
            }
        }

        if residual <= params.tolerance {
            return Ok(estimate);
        }

        Err(WarpError::InverseDidNotConverge {
            iterations: params.max_iterations,
            residual,
        })
    }

    fn normalize(&self, point: &Point3<f64>) -> Vector3<f64> {
        (point - self.centroid) / self.scale
    }

    fn coefficient_row(&self, row: usize) -> Vector3<f64> {
        Vector3::new(
            self.coefficients[(row, 0)],
            self.coefficients[(row, 1)],
            self.coefficients[(row, 2)],
        )
    }
}

impl PointTransform for ThinPlateModel {
    fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        point + self.displacement(point)
    }
}

/// RMS distance from the centroid, or 1 when every point sits on it.
fn rms_radius(points: &PointSet, centroid: &Point3<f64>) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let mean_sq = points
        .iter()
        .map(|p| (p - centroid).norm_squared())
        .sum::<f64>()
        / points.len() as f64;
    let radius = mean_sq.sqrt();
    if radius > f64::EPSILON { radius } else { 1.0 }
}

fn check_coincident(normalized: &[Vector3<f64>], tolerance: f64) -> WarpResult<()> {
    for (i, a) in normalized.iter().enumerate() {
        for (j, b) in normalized.iter().enumerate().skip(i + 1) {
            if (a - b).norm() < tolerance {
                return Err(WarpError::DegenerateLandmarks(format!(
                    "control points {i} and {j} coincide"
                )));
            }
        }
    }
    Ok(())
}
