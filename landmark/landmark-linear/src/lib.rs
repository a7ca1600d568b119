//! Closed-form linear alignment from paired landmarks.
//!
//! This crate fits the linear stage of a landmark registration:
//! - **Rigid** - rotation + translation (Kabsch)
//! - **Similarity** - rotation + uniform scale + translation
//! - **Affine** - full 3x3 linear part + translation (least squares)
//!
//! # Landmark Count Policy
//!
//! Scale is not recoverable from fewer than three pairs. Requests for
//! [`LinearMode::Similarity`] or [`LinearMode::Affine`] with one or two
//! pairs are fitted as [`LinearMode::Rigid`] instead of failing. The
//! substitution is logged at `warn` level and visible through
//! [`LinearFit::was_downgraded`].
//!
//! # Quick Start
//!
//! ```
//! use landmark_linear::{fit_linear, LinearMode};
//! use landmark_types::{PointSet, PointTransform};
//!
//! let moving = PointSet::from_coords(&[
//!     [0.0, 0.0, 0.0],
//!     [1.0, 0.0, 0.0],
//!     [0.0, 1.0, 0.0],
//!     [0.0, 0.0, 1.0],
//! ]);
//! let fixed = PointSet::from_coords(&[
//!     [5.0, 5.0, 5.0],
//!     [6.0, 5.0, 5.0],
//!     [5.0, 6.0, 5.0],
//!     [5.0, 5.0, 6.0],
//! ]);
//!
//! let fit = fit_linear(&moving, &fixed, LinearMode::Affine).unwrap();
//! let aligned = fit.transform.apply(&moving);
//!
//! assert!(aligned.max_distance_to(&fixed).unwrap() < 1e-9);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod affine;
mod aligner;
mod error;
mod kabsch;
mod mode;
mod transform;

pub use aligner::{LinearAligner, LinearFit, compute_alignment_error, fit_linear};
pub use error::{AlignError, AlignResult};
pub use mode::{LinearMode, MIN_LANDMARKS_FOR_SCALING};
pub use transform::LinearTransform;
