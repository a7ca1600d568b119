//! Homogeneous linear transform produced by the aligner.

use landmark_types::PointTransform;
use nalgebra::{Matrix3, Matrix4, Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 3D linear (affine) transformation stored as a 4x4 homogeneous matrix.
///
/// The last row is always `[0, 0, 0, 1]`; the upper-left 3x3 block is the
/// linear part and the last column the translation.
///
/// # Example
///
/// ```
/// use landmark_linear::LinearTransform;
/// use landmark_types::PointTransform;
/// use nalgebra::{Point3, UnitQuaternion, Vector3};
///
/// let transform = LinearTransform::from_similarity(
///     &UnitQuaternion::identity(),
///     &Vector3::new(1.0, 0.0, 0.0),
///     2.0,
/// );
///
/// let p = transform.transform_point(&Point3::new(1.0, 1.0, 1.0));
/// assert_eq!(p, Point3::new(3.0, 2.0, 2.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinearTransform {
    matrix: Matrix4<f64>,
}

impl Default for LinearTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl LinearTransform {
    /// The identity transformation.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Build from a linear part and a translation.
    #[must_use]
    pub fn from_parts(linear: &Matrix3<f64>, translation: &Vector3<f64>) -> Self {
        let mut matrix = linear.to_homogeneous();
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
        Self { matrix }
    }

    /// Build from a homogeneous matrix.
    ///
    /// The projective row is reset to `[0, 0, 0, 1]`.
    #[must_use]
    pub fn from_matrix(mut matrix: Matrix4<f64>) -> Self {
        matrix.set_row(3, &nalgebra::RowVector4::new(0.0, 0.0, 0.0, 1.0));
        Self { matrix }
    }

    /// A pure translation.
    #[must_use]
    pub fn from_translation(translation: &Vector3<f64>) -> Self {
        Self {
            matrix: Matrix4::new_translation(translation),
        }
    }

    /// Build a similarity transform.
    ///
    /// Applied in the order: scale -> rotate -> translate.
    #[must_use]
    pub fn from_similarity(
        rotation: &UnitQuaternion<f64>,
        translation: &Vector3<f64>,
        scale: f64,
    ) -> Self {
        let linear = rotation.to_rotation_matrix().into_inner() * scale;
        Self::from_parts(&linear, translation)
    }

    /// The underlying 4x4 matrix.
    #[must_use]
    pub const fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    /// The upper-left 3x3 block.
    #[must_use]
    pub fn linear_part(&self) -> Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// The translation column.
    #[must_use]
    pub fn translation(&self) -> Vector3<f64> {
        self.matrix.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Applies only the linear part, for directions and offsets.
    #[must_use]
    pub fn transform_vector(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.linear_part() * vector
    }

    /// Chains two transforms into one matrix.
    ///
    /// `a.then(&b)` maps `p` to `b(a(p))`.
    #[must_use]
    pub fn then(&self, other: &Self) -> Self {
        Self {
            matrix: other.matrix * self.matrix,
        }
    }

    /// Inverse map, or `None` when the linear part is singular.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(Self::from_matrix)
    }

    /// Returns true if the linear part is a proper rotation (no scale,
    /// shear or reflection).
    #[must_use]
    pub fn is_rigid(&self, epsilon: f64) -> bool {
        self.uniform_scale(epsilon)
            .is_some_and(|scale| (scale - 1.0).abs() < epsilon)
    }

    /// The uniform scale factor if the linear part is a scaled rotation.
    ///
    /// Returns `None` for transforms with shear, anisotropic scale, or a
    /// reflection.
    #[must_use]
    pub fn uniform_scale(&self, epsilon: f64) -> Option<f64> {
        let linear = self.linear_part();
        if linear.determinant() <= 0.0 {
            return None;
        }
        let gram = linear.transpose() * linear;
        let scale_sq = gram.trace() / 3.0;
        let deviation = (gram - Matrix3::identity() * scale_sq).abs().max();
        (deviation < epsilon * scale_sq.max(1.0)).then(|| scale_sq.sqrt())
    }

    /// Every matrix entry within `epsilon` of the identity.
    #[must_use]
    pub fn is_identity(&self, epsilon: f64) -> bool {
        (self.matrix - Matrix4::identity()).abs().max() < epsilon
    }
}

impl PointTransform for LinearTransform {
    fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.matrix.transform_point(point)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use landmark_types::PointSet;
    use std::f64::consts::PI;

    #[test]
    fn identity_transformation() {
        let t = LinearTransform::identity();
        let p = Point3::new(1.0, 2.0, 3.0);
        assert_eq!(t.transform_point(&p), p);
        assert!(t.is_identity(1e-12));
        assert!(t.is_rigid(1e-12));
    }

    #[test]
    fn translation_does_not_affect_vectors() {
        let t = LinearTransform::from_translation(&Vector3::new(10.0, 20.0, 30.0));
        let v = Vector3::new(1.0, 0.0, 0.0);
        assert_eq!(t.transform_vector(&v), v);
        assert_eq!(t.translation(), Vector3::new(10.0, 20.0, 30.0));
    }

    #[test]
    fn similarity_rotates_then_translates() {
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), PI / 2.0);
        let t = LinearTransform::from_similarity(&rotation, &Vector3::new(1.0, 0.0, 0.0), 2.0);
        let p = t.transform_point(&Point3::new(1.0, 0.0, 0.0));

        assert_relative_eq!(p.x, 1.0, epsilon = 1e-10);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-10);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-10);
        assert_relative_eq!(t.uniform_scale(1e-9).unwrap(), 2.0, epsilon = 1e-10);
        assert!(!t.is_rigid(1e-9));
    }

    #[test]
    fn shear_has_no_uniform_scale() {
        let mut linear = Matrix3::identity();
        linear[(0, 1)] = 0.5;
        let t = LinearTransform::from_parts(&linear, &Vector3::zeros());
        assert!(t.uniform_scale(1e-9).is_none());
        assert!(!t.is_rigid(1e-9));
    }

    #[test]
    fn reflection_is_not_rigid() {
        let linear = Matrix3::from_diagonal(&Vector3::new(-1.0, 1.0, 1.0));
        let t = LinearTransform::from_parts(&linear, &Vector3::zeros());
        assert!(!t.is_rigid(1e-9));
    }

    #[test]
    fn then_applies_self_first() {
        let scale = LinearTransform::from_similarity(&UnitQuaternion::identity(), &Vector3::zeros(), 2.0);
        let shift = LinearTransform::from_translation(&Vector3::new(1.0, 0.0, 0.0));

        let p = Point3::new(1.0, 0.0, 0.0);
        assert_relative_eq!(scale.then(&shift).transform_point(&p).x, 3.0, epsilon = 1e-12);
        assert_relative_eq!(shift.then(&scale).transform_point(&p).x, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn inverse_round_trip() {
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI / 3.0);
        let t = LinearTransform::from_similarity(&rotation, &Vector3::new(1.0, 2.0, 3.0), 1.5);
        let inv = t.inverse().unwrap();

        let p = Point3::new(-4.0, 0.5, 2.0);
        let back = inv.transform_point(&t.transform_point(&p));
        assert_relative_eq!(back.coords, p.coords, epsilon = 1e-10);
    }

    #[test]
    fn singular_has_no_inverse() {
        let t = LinearTransform::from_parts(&Matrix3::zeros(), &Vector3::zeros());
        assert!(t.inverse().is_none());
    }

    #[test]
    fn from_matrix_resets_projective_row() {
        let mut m = Matrix4::identity();
        m[(3, 0)] = 5.0;
        let t = LinearTransform::from_matrix(m);
        assert_eq!(t.matrix()[(3, 0)], 0.0);
    }

    #[test]
    fn apply_produces_new_set() {
        let t = LinearTransform::from_translation(&Vector3::new(0.0, 0.0, 1.0));
        let points = PointSet::from_coords(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
        let moved = t.apply(&points);

        assert_eq!(points[1].z, 1.0);
        assert_eq!(moved[1].z, 2.0);
        assert_eq!(moved.len(), 2);
    }
}
