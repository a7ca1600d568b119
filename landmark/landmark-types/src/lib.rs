//! Core types for landmark-driven registration.
//!
//! This crate provides the foundational types shared by the registration
//! crates:
//!
//! - [`PointSet`] - An ordered set of landmark positions
//! - [`Aabb`] - Axis-aligned bounding box
//! - [`PointTransform`] - Anything that maps a point to a point
//!
//! # Correspondence
//!
//! Two point sets used together are paired by index: the i-th point of the
//! moving set corresponds to the i-th point of the fixed set. Use
//! [`PointSet::check_correspondence`] before pairing them.
//!
//! # Coordinate System
//!
//! All coordinates are `f64` in a shared physical (world / RAS) space.
//! The crates are unit-agnostic.
//!
//! # Example
//!
//! ```
//! use landmark_types::{PointSet, Point3};
//!
//! let moving = PointSet::from(vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//! ]);
//! let fixed = PointSet::from(vec![
//!     Point3::new(5.0, 0.0, 0.0),
//!     Point3::new(6.0, 0.0, 0.0),
//! ]);
//!
//! assert_eq!(moving.check_correspondence(&fixed), Ok(2));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod bounds;
mod point_set;
mod traits;

pub use bounds::Aabb;
pub use point_set::{LengthMismatch, PointSet};
pub use traits::PointTransform;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
