//! 3D thin-plate spline warps interpolating paired landmarks.
//!
//! The spline uses the 3D biharmonic kernel `U(r) = r` plus an affine term,
//! and passes exactly through every control point. Control points that are
//! collinear or coplanar are allowed; the affine term is then resolved to its
//! minimum-norm solution. Coincident control points are rejected with
//! [`WarpError::DegenerateLandmarks`] rather than producing NaN.
//!
//! # Quick Start
//!
//! ```
//! use landmark_thinplate::{InverseParams, ThinPlateWarp, WarpParams};
//! use landmark_types::{PointSet, PointTransform};
//! use nalgebra::Point3;
//!
//! let moving = PointSet::from_coords(&[
//!     [0.0, 0.0, 0.0],
//!     [4.0, 0.0, 0.0],
//!     [0.0, 4.0, 0.0],
//!     [0.0, 0.0, 4.0],
//!     [1.0, 1.0, 1.0],
//! ]);
//! let fixed = PointSet::from_coords(&[
//!     [0.0, 0.0, 0.0],
//!     [4.0, 0.0, 0.0],
//!     [0.0, 4.0, 0.0],
//!     [0.0, 0.0, 4.0],
//!     [1.2, 1.0, 0.9],
//! ]);
//!
//! let mut warp = ThinPlateWarp::new(WarpParams::default());
//! let model = warp.fit(&moving, &fixed).unwrap();
//!
//! let p = Point3::new(2.0, 1.0, 0.5);
//! let back = model
//!     .inverse_transform_point(&model.transform_point(&p), &InverseParams::default())
//!     .unwrap();
//! assert!((back - p).norm() < 1e-6);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod model;
mod params;
mod warp;

pub use error::{WarpError, WarpResult};
pub use model::ThinPlateModel;
pub use params::{InverseParams, WarpParams};
pub use warp::{ThinPlateWarp, fit_thin_plate};
