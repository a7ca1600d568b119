//! Property-based tests for the registration stages.
//!
//! Run with: cargo test -p landmark-registration -- proptest

#![allow(clippy::unwrap_used)]
#![allow(clippy::cast_precision_loss)]

use landmark_registration::prelude::*;
use nalgebra::Matrix3;
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// Corners of a 20 mm cube, each jittered by up to 3 mm per axis. Any two
/// landmarks stay at least 14 mm apart.
fn arb_landmarks() -> impl Strategy<Value = PointSet> {
    prop::collection::vec(prop::array::uniform3(-3.0..3.0f64), 8).prop_map(|jitter| {
        let mut points = PointSet::new();
        for (index, offset) in jitter.into_iter().enumerate() {
            let corner = Vector3::new(
                if index & 1 == 0 { -10.0 } else { 10.0 },
                if index & 2 == 0 { -10.0 } else { 10.0 },
                if index & 4 == 0 { -10.0 } else { 10.0 },
            );
            points.push(Point3::from(corner + Vector3::from(offset)));
        }
        points
    })
}

/// A well-conditioned affine map: identity plus a bounded perturbation.
fn arb_affine() -> impl Strategy<Value = LinearTransform> {
    (
        prop::array::uniform9(-0.3..0.3f64),
        prop::array::uniform3(-50.0..50.0f64),
    )
        .prop_map(|(perturbation, translation)| {
            let linear = Matrix3::identity() + Matrix3::from_row_slice(&perturbation);
            LinearTransform::from_parts(&linear, &Vector3::from(translation))
        })
}

/// Displacements of up to `limit` per axis for every landmark of
/// `arb_landmarks`.
fn arb_displacements(limit: f64) -> impl Strategy<Value = Vec<[f64; 3]>> {
    prop::collection::vec(prop::array::uniform3(-limit..limit), 8)
}

fn displaced(points: &PointSet, displacements: &[[f64; 3]]) -> PointSet {
    points
        .iter()
        .zip(displacements)
        .map(|(p, d)| p + Vector3::from(*d))
        .collect()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_affine_fit_reproduces_affine_targets(
        moving in arb_landmarks(),
        truth in arb_affine(),
    ) {
        let fixed = truth.apply(&moving);

        let fit = fit_linear(&moving, &fixed, LinearMode::Affine).unwrap();

        prop_assert!(fit.max_error < 1e-6, "max error {}", fit.max_error);
    }

    #[test]
    fn proptest_thin_plate_interpolates_landmarks(
        moving in arb_landmarks(),
        displacements in arb_displacements(2.0),
    ) {
        let fixed = displaced(&moving, &displacements);

        let model = fit_thin_plate(&moving, &fixed, &WarpParams::default()).unwrap();

        let residual = model.apply(&moving).max_distance_to(&fixed).unwrap();
        prop_assert!(residual < 1e-6, "residual {}", residual);
    }

    #[test]
    fn proptest_registration_maps_moving_onto_fixed(
        moving in arb_landmarks(),
        truth in arb_affine(),
        displacements in arb_displacements(2.0),
    ) {
        let fixed = displaced(&truth.apply(&moving), &displacements);
        let mut registration = LandmarkRegistration::new(
            RegistrationParams::default().with_linear_mode(LinearMode::Affine),
        );

        let transform = registration.recompute(&moving, &fixed).unwrap();

        let residual = transform.apply(&moving).max_distance_to(&fixed).unwrap();
        prop_assert!(residual < 1e-6, "residual {}", residual);
    }

    #[test]
    fn proptest_length_mismatch_is_always_reported(
        moving_len in 0usize..12,
        fixed_len in 0usize..12,
    ) {
        prop_assume!(moving_len != fixed_len);
        let moving: PointSet = (0..moving_len)
            .map(|i| Point3::new(i as f64, 0.0, 0.0))
            .collect();
        let fixed: PointSet = (0..fixed_len)
            .map(|i| Point3::new(0.0, i as f64, 0.0))
            .collect();
        let mut registration = LandmarkRegistration::default();

        let err = registration.recompute(&moving, &fixed).unwrap_err();

        prop_assert!(err.is_dimension_mismatch());
        prop_assert!(registration.transform().is_empty());
    }

    #[test]
    fn proptest_inverse_chain_round_trips(
        moving in arb_landmarks(),
        displacements in arb_displacements(0.5),
        query in prop::array::uniform3(-12.0..12.0f64),
    ) {
        let fixed = displaced(&moving, &displacements);
        let mut registration = LandmarkRegistration::default();
        registration.recompute(&moving, &fixed).unwrap();
        let inverse = registration.inverse_chain().unwrap();

        let p = Point3::from(query);
        let back = inverse.evaluate(&registration.transform().evaluate(&p)).unwrap();

        prop_assert!((back - p).norm() < 1e-5, "round trip error {}", (back - p).norm());
    }
}
