//! Traits shared by the transform types.

use crate::PointSet;
use nalgebra::Point3;

/// A total mapping from points to points.
///
/// Implemented by the linear and thin-plate stages and by composed
/// transforms. Implementations must be defined for every finite input,
/// including points far from the landmarks.
pub trait PointTransform {
    /// Map a single point.
    fn transform_point(&self, point: &Point3<f64>) -> Point3<f64>;

    /// Map every point of a set, returning a new set in the same order.
    fn apply(&self, points: &PointSet) -> PointSet {
        points.map(|p| self.transform_point(p))
    }
}

impl<T: PointTransform + ?Sized> PointTransform for &T {
    fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        (**self).transform_point(point)
    }
}
