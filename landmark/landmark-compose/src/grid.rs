//! Dense displacement-field sampling on a regular lattice.

use crate::{ComposeError, ComposeResult, ComposedTransform, InverseChain};
use landmark_types::Aabb;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lattices with more samples than this are evaluated in parallel.
const PARALLEL_THRESHOLD: usize = 4096;

/// Largest lattice accepted, a 512-point cube.
pub const MAX_GRID_SAMPLES: usize = 1 << 27;

/// A transform that can be sampled at arbitrary points.
///
/// Sampling is fallible because inverse chains may fail to converge.
pub trait SampleTransform: Sync {
    /// Maps one point.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying transform.
    fn sample(&self, point: &Point3<f64>) -> ComposeResult<Point3<f64>>;
}

impl SampleTransform for ComposedTransform {
    fn sample(&self, point: &Point3<f64>) -> ComposeResult<Point3<f64>> {
        Ok(self.evaluate(point))
    }
}

impl SampleTransform for InverseChain {
    fn sample(&self, point: &Point3<f64>) -> ComposeResult<Point3<f64>> {
        self.evaluate(point)
    }
}

/// Placement and resolution of a sampling lattice.
///
/// Lattice point `(i, j, k)` sits at `origin + (i, j, k) * spacing`
/// (component-wise). Samples are stored with x varying fastest.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridGeometry {
    /// World position of lattice point `(0, 0, 0)`.
    pub origin: Point3<f64>,
    /// Distance between lattice points along each axis.
    pub spacing: Vector3<f64>,
    /// Number of lattice points along each axis.
    pub dimensions: [usize; 3],
}

impl GridGeometry {
    /// Creates a lattice from explicit placement.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::InvalidSpacing`] if any spacing component is
    /// not positive and finite, [`ComposeError::EmptyBounds`] if any
    /// dimension is zero or the origin is not finite, and
    /// [`ComposeError::GridTooLarge`] above [`MAX_GRID_SAMPLES`] points.
    pub fn new(
        origin: Point3<f64>,
        spacing: Vector3<f64>,
        dimensions: [usize; 3],
    ) -> ComposeResult<Self> {
        let geometry = Self {
            origin,
            spacing,
            dimensions,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Checks the invariants [`new`](Self::new) enforces. The fields are
    /// public, so sampling re-checks them.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn validate(&self) -> ComposeResult<()> {
        validate_spacing(&self.spacing)?;
        if self.dimensions.contains(&0) || self.origin.coords.iter().any(|v| !v.is_finite()) {
            return Err(ComposeError::EmptyBounds);
        }
        let total = self
            .dimensions
            .iter()
            .try_fold(1_usize, |total, &n| total.checked_mul(n))
            .filter(|&total| total <= MAX_GRID_SAMPLES);
        if total.is_none() {
            #[allow(clippy::cast_precision_loss)]
            let requested: f64 = self.dimensions.iter().map(|&n| n as f64).product();
            return Err(ComposeError::GridTooLarge {
                requested,
                limit: MAX_GRID_SAMPLES,
            });
        }
        Ok(())
    }

    /// Creates the lattice covering `bounds` at the given spacing.
    ///
    /// The origin is the bounds minimum rounded down to whole units per
    /// axis and the far corner is the maximum rounded up. Each axis gets
    /// `ceil(extent / spacing)` intervals, so the lattice reaches or passes
    /// the rounded maximum.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::InvalidSpacing`],
    /// [`ComposeError::EmptyBounds`] or [`ComposeError::GridTooLarge`].
    ///
    /// # Example
    ///
    /// ```
    /// use landmark_compose::GridGeometry;
    /// use landmark_types::Aabb;
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let bounds = Aabb::new(Point3::new(0.4, -1.2, 2.0), Point3::new(3.6, 1.1, 2.0));
    /// let grid = GridGeometry::covering(&bounds, &Vector3::new(1.0, 0.5, 1.0)).unwrap();
    ///
    /// assert_eq!(grid.origin, Point3::new(0.0, -2.0, 2.0));
    /// assert_eq!(grid.dimensions, [5, 9, 1]);
    /// ```
    pub fn covering(bounds: &Aabb, spacing: &Vector3<f64>) -> ComposeResult<Self> {
        validate_spacing(spacing)?;
        if bounds.is_empty()
            || bounds
                .min
                .coords
                .iter()
                .chain(bounds.max.coords.iter())
                .any(|v| !v.is_finite())
        {
            return Err(ComposeError::EmptyBounds);
        }

        let snapped = bounds.snapped_outward();
        let extent = snapped.size();

        // Counted in f64 so oversized requests are rejected before any cast.
        let samples = Vector3::from_fn(|axis, _| (extent[axis] / spacing[axis]).ceil() + 1.0);
        #[allow(clippy::cast_precision_loss)]
        let limit = MAX_GRID_SAMPLES as f64;
        let requested = samples.product();
        if requested > limit {
            return Err(ComposeError::GridTooLarge {
                requested,
                limit: MAX_GRID_SAMPLES,
            });
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let dimensions = [samples.x as usize, samples.y as usize, samples.z as usize];
        Self::new(snapped.min, *spacing, dimensions)
    }

    /// Total number of lattice points.
    ///
    /// Saturates for geometries built by hand past [`MAX_GRID_SAMPLES`].
    #[must_use]
    pub const fn len(&self) -> usize {
        self.dimensions[0]
            .saturating_mul(self.dimensions[1])
            .saturating_mul(self.dimensions[2])
    }

    /// Always false for a validated geometry.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// World position of lattice point `(i, j, k)`.
    #[must_use]
    pub fn point(&self, i: usize, j: usize, k: usize) -> Point3<f64> {
        #[allow(clippy::cast_precision_loss)]
        let offset = Vector3::new(i as f64, j as f64, k as f64);
        self.origin + offset.component_mul(&self.spacing)
    }

    /// Linear storage index of `(i, j, k)`, or `None` outside the lattice.
    #[must_use]
    pub const fn index(&self, i: usize, j: usize, k: usize) -> Option<usize> {
        let [nx, ny, nz] = self.dimensions;
        if i < nx && j < ny && k < nz {
            Some(i + nx * (j + ny * k))
        } else {
            None
        }
    }

    fn point_at(&self, index: usize) -> Point3<f64> {
        let [nx, ny, _] = self.dimensions;
        self.point(index % nx, (index / nx) % ny, index / (nx * ny))
    }
}

fn validate_spacing(spacing: &Vector3<f64>) -> ComposeResult<()> {
    if spacing.iter().all(|v| v.is_finite() && *v > 0.0) {
        Ok(())
    } else {
        Err(ComposeError::InvalidSpacing(format!(
            "({}, {}, {})",
            spacing.x, spacing.y, spacing.z
        )))
    }
}

/// Displacements `T(p) - p` sampled on a lattice.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisplacementGrid {
    geometry: GridGeometry,
    displacements: Vec<Vector3<f64>>,
}

impl DisplacementGrid {
    /// The lattice the field was sampled on.
    #[must_use]
    pub const fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// All displacements, x fastest.
    #[must_use]
    pub fn displacements(&self) -> &[Vector3<f64>] {
        &self.displacements
    }

    /// Displacement at lattice point `(i, j, k)`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize, k: usize) -> Option<Vector3<f64>> {
        self.geometry
            .index(i, j, k)
            .and_then(|index| self.displacements.get(index).copied())
    }

    /// World position of lattice point `(i, j, k)`.
    #[must_use]
    pub fn point(&self, i: usize, j: usize, k: usize) -> Point3<f64> {
        self.geometry.point(i, j, k)
    }

    /// Length of the largest displacement.
    #[must_use]
    pub fn max_magnitude(&self) -> f64 {
        self.displacements
            .iter()
            .map(Vector3::norm)
            .fold(0.0, f64::max)
    }
}

/// Samples `transform(p) - p` at every point of `geometry`.
///
/// # Errors
///
/// Returns the first sampling error; no partial grid is produced. A
/// geometry that fails [`GridGeometry::validate`] is rejected up front.
pub fn sample_displacement_grid(
    transform: &impl SampleTransform,
    geometry: GridGeometry,
) -> ComposeResult<DisplacementGrid> {
    geometry.validate()?;

    let displacement = |index: usize| {
        let p = geometry.point_at(index);
        transform.sample(&p).map(|mapped| mapped - p)
    };

    let count = geometry.len();
    let displacements = if count > PARALLEL_THRESHOLD {
        (0..count)
            .into_par_iter()
            .map(displacement)
            .collect::<ComposeResult<Vec<_>>>()?
    } else {
        (0..count)
            .map(displacement)
            .collect::<ComposeResult<Vec<_>>>()?
    };

    debug!(
        nx = geometry.dimensions[0],
        ny = geometry.dimensions[1],
        nz = geometry.dimensions[2],
        "Sampled displacement grid"
    );

    Ok(DisplacementGrid {
        geometry,
        displacements,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use landmark_linear::LinearTransform;
    use landmark_thinplate::InverseParams;

    fn shift() -> ComposedTransform {
        ComposedTransform::new(vec![
            LinearTransform::from_translation(&Vector3::new(1.0, -2.0, 0.5)).into(),
        ])
    }

    #[test]
    fn covering_snaps_outward() {
        let bounds = Aabb::new(Point3::new(-0.5, 0.2, 1.0), Point3::new(2.1, 3.0, 1.9));
        let grid = GridGeometry::covering(&bounds, &Vector3::new(1.0, 1.0, 1.0)).unwrap();

        assert_eq!(grid.origin, Point3::new(-1.0, 0.0, 1.0));
        // x: [-1, 3] -> 4 intervals, y: [0, 3] -> 3, z: [1, 2] -> 1
        assert_eq!(grid.dimensions, [5, 4, 2]);
    }

    #[test]
    fn covering_rounds_interval_count_up() {
        let bounds = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 10.0, 10.0));
        let grid = GridGeometry::covering(&bounds, &Vector3::new(3.0, 5.0, 4.0)).unwrap();

        assert_eq!(grid.dimensions, [5, 3, 4]);
        let far = grid.point(4, 2, 3);
        assert!(far.x >= 10.0 && far.y >= 10.0 && far.z >= 10.0);
    }

    #[test]
    fn rejects_bad_spacing_and_bounds() {
        let bounds = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        assert!(matches!(
            GridGeometry::covering(&bounds, &Vector3::new(1.0, 0.0, 1.0)),
            Err(ComposeError::InvalidSpacing(_))
        ));
        assert!(matches!(
            GridGeometry::covering(&Aabb::empty(), &Vector3::new(1.0, 1.0, 1.0)),
            Err(ComposeError::EmptyBounds)
        ));
    }

    #[test]
    fn oversized_covering_is_rejected() {
        let bounds = Aabb::new(Point3::origin(), Point3::new(1e7, 1e7, 1e7));

        let err = GridGeometry::covering(&bounds, &Vector3::new(1e-4, 1e-4, 1e-4)).unwrap_err();

        assert!(matches!(
            err,
            ComposeError::GridTooLarge { requested, limit: MAX_GRID_SAMPLES } if requested > 1e30
        ));
    }

    #[test]
    fn dimension_product_overflow_is_rejected() {
        let unit = Vector3::new(1.0, 1.0, 1.0);

        let err = GridGeometry::new(Point3::origin(), unit, [usize::MAX, 2, 1]).unwrap_err();
        assert!(matches!(err, ComposeError::GridTooLarge { .. }));

        // Within usize but past the cap
        assert!(matches!(
            GridGeometry::new(Point3::origin(), unit, [1024, 1024, 1024]),
            Err(ComposeError::GridTooLarge { .. })
        ));
        assert!(GridGeometry::new(Point3::origin(), unit, [512, 512, 512]).is_ok());
    }

    #[test]
    fn sampling_rechecks_hand_built_geometry() {
        let geometry = GridGeometry {
            origin: Point3::origin(),
            spacing: Vector3::new(1.0, 1.0, 1.0),
            dimensions: [usize::MAX, usize::MAX, 2],
        };
        assert_eq!(geometry.len(), usize::MAX);

        let err = sample_displacement_grid(&shift(), geometry).unwrap_err();

        assert!(matches!(err, ComposeError::GridTooLarge { .. }));
    }

    #[test]
    fn storage_is_x_fastest() {
        let grid =
            GridGeometry::new(Point3::origin(), Vector3::new(1.0, 1.0, 1.0), [3, 2, 2]).unwrap();

        assert_eq!(grid.index(0, 0, 0), Some(0));
        assert_eq!(grid.index(1, 0, 0), Some(1));
        assert_eq!(grid.index(0, 1, 0), Some(3));
        assert_eq!(grid.index(0, 0, 1), Some(6));
        assert_eq!(grid.index(3, 0, 0), None);
        assert_eq!(grid.point_at(7), grid.point(1, 0, 1));
    }

    #[test]
    fn translation_gives_constant_field() {
        let geometry =
            GridGeometry::new(Point3::origin(), Vector3::new(0.5, 0.5, 0.5), [4, 3, 2]).unwrap();
        let grid = sample_displacement_grid(&shift(), geometry).unwrap();

        assert_eq!(grid.displacements().len(), 24);
        for d in grid.displacements() {
            assert_relative_eq!(*d, Vector3::new(1.0, -2.0, 0.5), epsilon = 1e-12);
        }
        assert_relative_eq!(grid.max_magnitude(), 5.25_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn inverse_chain_field_negates_forward_field() {
        let geometry =
            GridGeometry::new(Point3::origin(), Vector3::new(1.0, 1.0, 1.0), [2, 2, 2]).unwrap();
        let inverse = shift().as_inverse_chain(&InverseParams::default()).unwrap();
        let grid = sample_displacement_grid(&inverse, geometry).unwrap();

        assert_relative_eq!(
            grid.get(1, 1, 1).unwrap(),
            Vector3::new(-1.0, 2.0, -0.5),
            epsilon = 1e-12
        );
        assert!(grid.get(2, 0, 0).is_none());
    }

    #[test]
    fn large_grids_match_sequential_sampling() {
        let geometry =
            GridGeometry::new(Point3::new(-4.0, -4.0, -4.0), Vector3::new(0.5, 0.5, 0.5), [20, 20, 20])
                .unwrap();
        let grid = sample_displacement_grid(&shift(), geometry).unwrap();

        assert!(geometry.len() > PARALLEL_THRESHOLD);
        let p = grid.point(13, 2, 19);
        let expected = shift().evaluate(&p) - p;
        assert_relative_eq!(grid.get(13, 2, 19).unwrap(), expected, epsilon = 1e-12);
    }
}
