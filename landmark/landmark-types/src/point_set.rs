//! Ordered landmark point sets.

use crate::Aabb;
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lengths of two point sets that were expected to correspond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthMismatch {
    /// Number of points in the source set.
    pub source_len: usize,
    /// Number of points in the target set.
    pub target_len: usize,
}

/// An ordered sequence of landmark positions.
///
/// Order establishes correspondence: point `i` of one set is paired with
/// point `i` of the other. Point sets are never mutated by the registration
/// crates; transforms produce new sets.
///
/// # Example
///
/// ```
/// use landmark_types::{PointSet, Point3};
///
/// let points: PointSet = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(2.0, 0.0, 0.0),
/// ]
/// .into_iter()
/// .collect();
///
/// assert_eq!(points.len(), 2);
/// assert_eq!(points.centroid(), Some(Point3::new(1.0, 0.0, 0.0)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PointSet {
    points: Vec<Point3<f64>>,
}

impl PointSet {
    /// Creates an empty point set.
    #[must_use]
    pub const fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Creates a point set from raw coordinate triples.
    ///
    /// # Example
    ///
    /// ```
    /// use landmark_types::PointSet;
    ///
    /// let points = PointSet::from_coords(&[[0.0, 0.0, 0.0], [1.0, 2.0, 3.0]]);
    /// assert_eq!(points[1].z, 3.0);
    /// ```
    #[must_use]
    pub fn from_coords(coords: &[[f64; 3]]) -> Self {
        coords
            .iter()
            .map(|&[x, y, z]| Point3::new(x, y, z))
            .collect()
    }

    /// Number of landmarks.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the set holds no landmarks.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Appends a landmark.
    pub fn push(&mut self, point: Point3<f64>) {
        self.points.push(point);
    }

    /// Iterates over the landmarks in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Point3<f64>> {
        self.points.iter()
    }

    /// Borrows the landmarks as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Consumes the set, returning the underlying vector.
    #[must_use]
    pub fn into_inner(self) -> Vec<Point3<f64>> {
        self.points
    }

    /// Checks that `other` can be paired index-by-index with `self`.
    ///
    /// Returns the shared length on success.
    ///
    /// # Errors
    ///
    /// Returns the two lengths when they differ. Mismatched sets are never
    /// truncated to the shorter length.
    pub fn check_correspondence(&self, other: &Self) -> Result<usize, LengthMismatch> {
        if self.len() == other.len() {
            Ok(self.len())
        } else {
            Err(LengthMismatch {
                source_len: self.len(),
                target_len: other.len(),
            })
        }
    }

    /// Mean position of the landmarks, or `None` for an empty set.
    #[must_use]
    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.points.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = self.points.len() as f64;
        let sum: Vector3<f64> = self.points.iter().map(|p| p.coords).sum();
        Some(Point3::from(sum / n))
    }

    /// Axis-aligned bounds of the landmarks.
    ///
    /// Returns an empty AABB for an empty set.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.points.iter())
    }

    /// Builds a new set by mapping every landmark.
    #[must_use]
    pub fn map<F>(&self, f: F) -> Self
    where
        F: FnMut(&Point3<f64>) -> Point3<f64>,
    {
        Self {
            points: self.points.iter().map(f).collect(),
        }
    }

    /// Index of the first landmark with a NaN or infinite coordinate.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<usize> {
        self.points
            .iter()
            .position(|p| p.coords.iter().any(|v| !v.is_finite()))
    }

    /// Largest distance between paired landmarks of `self` and `other`.
    ///
    /// # Errors
    ///
    /// Returns the two lengths when the sets cannot be paired.
    pub fn max_distance_to(&self, other: &Self) -> Result<f64, LengthMismatch> {
        self.check_correspondence(other)?;
        Ok(self
            .points
            .iter()
            .zip(other.points.iter())
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max))
    }
}

impl From<Vec<Point3<f64>>> for PointSet {
    fn from(points: Vec<Point3<f64>>) -> Self {
        Self { points }
    }
}

impl FromIterator<Point3<f64>> for PointSet {
    fn from_iter<I: IntoIterator<Item = Point3<f64>>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PointSet {
    type Item = &'a Point3<f64>;
    type IntoIter = std::slice::Iter<'a, Point3<f64>>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl std::ops::Index<usize> for PointSet {
    type Output = Point3<f64>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}
