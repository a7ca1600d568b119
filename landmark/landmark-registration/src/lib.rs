//! Landmark registration: a linear fit followed by a thin-plate warp.
//!
//! This crate drives the stage crates and re-exports them:
//!
//! - [`types`] - `PointSet`, `Aabb` and the `PointTransform` trait
//! - [`linear`] - rigid, similarity and affine alignment
//! - [`thinplate`] - 3D thin-plate spline warps
//! - [`compose`] - stage chains, inverse chains and displacement grids
//!
//! [`LandmarkRegistration`] owns one aligner and one warp. Each recompute
//! fits the linear stage from moving to fixed landmarks, fits the warp from
//! the linearly aligned moving landmarks to the fixed ones, and installs the
//! chain `[Linear, ThinPlate]`. A failed recompute leaves the installed
//! transform untouched.
//!
//! Interactive edits go through [`LandmarkRegistration::handle`], which asks
//! a [`RecomputePolicy`] whether the [`Trigger`] should recompute.
//!
//! # Example
//!
//! ```
//! use landmark_registration::prelude::*;
//!
//! let moving = PointSet::from_coords(&[
//!     [0.0, 0.0, 0.0],
//!     [20.0, 0.0, 0.0],
//!     [0.0, 20.0, 0.0],
//!     [0.0, 0.0, 20.0],
//!     [5.0, 5.0, 5.0],
//! ]);
//! let fixed = PointSet::from_coords(&[
//!     [0.0, 0.0, 0.0],
//!     [40.0, 0.0, 0.0],
//!     [0.0, 40.0, 0.0],
//!     [0.0, 0.0, 40.0],
//!     [11.0, 10.0, 10.0],
//! ]);
//!
//! let params = RegistrationParams::default().with_linear_mode(LinearMode::Similarity);
//! let mut registration = LandmarkRegistration::new(params);
//!
//! let outcome = registration
//!     .handle(Trigger::LandmarkDragEnded, &moving, &fixed)
//!     .unwrap();
//! assert_eq!(outcome, RecomputeOutcome::Recomputed { downgraded: false });
//!
//! let mapped = registration.transform().apply(&moving);
//! assert!(mapped.max_distance_to(&fixed).unwrap() < 1e-9);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod params;
mod policy;
mod registration;

pub use error::{RegistrationError, RegistrationResult};
pub use params::RegistrationParams;
pub use policy::{RecomputePolicy, RecomputeState, Trigger};
pub use registration::{LandmarkRegistration, RecomputeOutcome};

pub use landmark_linear::LinearMode;

/// Point sets, bounds and the point-mapping trait.
pub use landmark_types as types;

/// Rigid, similarity and affine alignment.
pub use landmark_linear as linear;

/// 3D thin-plate spline warps.
pub use landmark_thinplate as thinplate;

/// Stage chains, inverse chains and displacement grids.
pub use landmark_compose as compose;

/// Common imports for registration.
///
/// ```
/// use landmark_registration::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        LandmarkRegistration, RecomputeOutcome, RecomputePolicy, RecomputeState,
        RegistrationError, RegistrationParams, RegistrationResult, Trigger,
    };

    pub use landmark_types::{Aabb, Point3, PointSet, PointTransform, Vector3};

    pub use landmark_linear::{LinearFit, LinearMode, LinearTransform, fit_linear};

    pub use landmark_thinplate::{InverseParams, ThinPlateModel, WarpParams, fit_thin_plate};

    pub use landmark_compose::{
        ComposedTransform, DisplacementGrid, GridGeometry, InverseChain, TransformStage,
        sample_displacement_grid,
    };
}
