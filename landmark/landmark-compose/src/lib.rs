//! Ordered composition of landmark registration stages.
//!
//! A [`ComposedTransform`] applies its stages in list order. The registration
//! pipeline installs `[Linear, ThinPlate]`: the linear fit runs first and the
//! warp corrects what remains. Evaluating the stages in the other order gives
//! a different mapping.
//!
//! Resampling a moving image on the fixed image's lattice needs the opposite
//! direction, so [`ComposedTransform::as_inverse_chain`] builds an
//! [`InverseChain`] that reverses the stages and inverts each one. Either
//! direction can be sampled into a [`DisplacementGrid`].
//!
//! # Example
//!
//! ```
//! use landmark_compose::{sample_displacement_grid, ComposedTransform, GridGeometry};
//! use landmark_linear::LinearTransform;
//! use landmark_types::Aabb;
//! use nalgebra::{Point3, Vector3};
//!
//! let chain = ComposedTransform::new(vec![
//!     LinearTransform::from_translation(&Vector3::new(0.0, 0.0, 2.0)).into(),
//! ]);
//! let bounds = Aabb::new(Point3::origin(), Point3::new(4.0, 4.0, 4.0));
//! let geometry = GridGeometry::covering(&bounds, &Vector3::new(2.0, 2.0, 2.0)).unwrap();
//!
//! let grid = sample_displacement_grid(&chain, geometry).unwrap();
//!
//! assert_eq!(grid.displacements().len(), 27);
//! assert_eq!(grid.get(2, 2, 2), Some(Vector3::new(0.0, 0.0, 2.0)));
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod composed;
mod error;
mod grid;
mod inverse;
mod stage;

pub use composed::ComposedTransform;
pub use error::{ComposeError, ComposeResult};
pub use grid::{
    DisplacementGrid, GridGeometry, MAX_GRID_SAMPLES, SampleTransform, sample_displacement_grid,
};
pub use inverse::InverseChain;
pub use stage::TransformStage;
