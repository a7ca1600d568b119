//! Axis-aligned bounds of a reference volume.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned box in world coordinates (mm).
///
/// Displacement grids are laid out over one of these, typically the physical
/// extent of the fixed volume.
///
/// ```
/// use landmark_types::{Aabb, Point3};
///
/// let volume = Aabb::new(Point3::new(10.0, 0.0, 4.0), Point3::new(0.0, 8.0, 0.0));
/// assert_eq!(volume.min, Point3::new(0.0, 0.0, 0.0));
/// assert!(volume.contains(&Point3::new(10.0, 8.0, 4.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Lowest coordinate on each axis.
    pub min: Point3<f64>,
    /// Highest coordinate on each axis.
    pub max: Point3<f64>,
}

impl Aabb {
    /// Box spanned by two opposite corners given in any order.
    #[must_use]
    pub fn new(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// Box containing nothing. Growing it by a point yields that point.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point3::from(Vector3::repeat(f64::INFINITY)),
            max: Point3::from(Vector3::repeat(f64::NEG_INFINITY)),
        }
    }

    /// Tightest box around `points`; empty when there are none.
    #[must_use]
    pub fn from_points<'a>(points: impl Iterator<Item = &'a Point3<f64>>) -> Self {
        points.fold(Self::empty(), |mut bounds, p| {
            bounds.expand_to_include(p);
            bounds
        })
    }

    /// True when some axis has `min > max`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.iter().zip(self.max.iter()).any(|(lo, hi)| lo > hi)
    }

    /// Extent along each axis.
    #[must_use]
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Midpoint of the box.
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Closed containment test.
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|axis| (self.min[axis]..=self.max[axis]).contains(&point[axis]))
    }

    /// Grows the box to cover `point`.
    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Rounds `min` down and `max` up to whole coordinates, so the result
    /// always covers `self`.
    ///
    /// ```
    /// use landmark_types::{Aabb, Point3};
    ///
    /// let snapped = Aabb::new(Point3::new(-0.5, 0.2, 1.0), Point3::new(3.1, 4.0, 7.9))
    ///     .snapped_outward();
    /// assert_eq!(snapped.min, Point3::new(-1.0, 0.0, 1.0));
    /// assert_eq!(snapped.max, Point3::new(4.0, 4.0, 8.0));
    /// ```
    #[must_use]
    pub fn snapped_outward(&self) -> Self {
        Self {
            min: self.min.map(f64::floor),
            max: self.max.map(f64::ceil),
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}
