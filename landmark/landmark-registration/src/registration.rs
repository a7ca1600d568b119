//! The registration driver.

use crate::{
    RecomputePolicy, RecomputeState, RegistrationParams, RegistrationResult, Trigger,
};
use landmark_compose::{ComposedTransform, InverseChain};
use landmark_linear::{LinearAligner, LinearFit, LinearMode};
use landmark_thinplate::{ThinPlateModel, ThinPlateWarp};
use landmark_types::{PointSet, PointTransform};
use tracing::{info, warn};

/// What [`LandmarkRegistration::handle`] did with a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeOutcome {
    /// The policy did not start a recompute.
    Skipped,
    /// A new transform was installed.
    Recomputed {
        /// True if the landmark count forced a simpler linear mode.
        downgraded: bool,
    },
}

/// Fits `moving -> fixed` as a linear stage followed by a thin-plate warp.
///
/// The moving landmarks are first aligned linearly; the warp is then fitted
/// from the aligned moving landmarks to the fixed ones. The installed
/// transform is `[Linear, ThinPlate]` and is replaced only by a recompute
/// in which both stages succeed.
///
/// # Example
///
/// ```
/// use landmark_registration::prelude::*;
///
/// let moving = PointSet::from_coords(&[
///     [0.0, 0.0, 0.0],
///     [10.0, 0.0, 0.0],
///     [0.0, 10.0, 0.0],
///     [0.0, 0.0, 10.0],
/// ]);
/// let fixed = PointSet::from_coords(&[
///     [1.0, 1.0, 1.0],
///     [11.0, 1.0, 1.0],
///     [1.0, 11.0, 1.0],
///     [1.0, 1.0, 11.5],
/// ]);
///
/// let mut registration = LandmarkRegistration::new(RegistrationParams::default());
/// let transform = registration.recompute(&moving, &fixed).unwrap();
///
/// assert!(transform.apply(&moving).max_distance_to(&fixed).unwrap() < 1e-9);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LandmarkRegistration {
    params: RegistrationParams,
    aligner: LinearAligner,
    warp: ThinPlateWarp,
    policy: RecomputePolicy,
    installed: ComposedTransform,
}

impl LandmarkRegistration {
    /// Creates a pipeline with the identity transform installed.
    #[must_use]
    pub fn new(params: RegistrationParams) -> Self {
        Self {
            params,
            aligner: LinearAligner::new(params.linear_mode),
            warp: ThinPlateWarp::new(params.warp),
            policy: RecomputePolicy::new(params.hot_update),
            installed: ComposedTransform::default(),
        }
    }

    /// Current parameters.
    #[must_use]
    pub const fn params(&self) -> &RegistrationParams {
        &self.params
    }

    /// Fits both stages and installs the result.
    ///
    /// Nothing is committed unless both stages succeed: on error the
    /// previously installed transform, linear fit and warp model are kept.
    ///
    /// # Errors
    ///
    /// Returns the error of the failing stage, including
    /// `DimensionMismatch` when the sets differ in length.
    pub fn recompute(
        &mut self,
        moving: &PointSet,
        fixed: &PointSet,
    ) -> RegistrationResult<&ComposedTransform> {
        let (fit, model) = match self.estimate(moving, fixed) {
            Ok(stages) => stages,
            Err(err) => {
                warn!(error = %err, "Registration failed, keeping previous transform");
                return Err(err);
            }
        };

        info!(
            mode = %fit.effective_mode,
            landmarks = moving.len(),
            linear_rms = fit.rms_error,
            "Registration recomputed"
        );

        let linear = fit.transform;
        self.aligner.commit(fit);
        let model = self.warp.commit(model).clone();
        self.installed = ComposedTransform::affine_then_warp(linear, model);
        Ok(&self.installed)
    }

    /// Offers a trigger to the recompute policy and recomputes if it starts
    /// one.
    ///
    /// `ModeChanged` updates the linear mode before the policy is consulted.
    ///
    /// # Errors
    ///
    /// See [`recompute`](Self::recompute). The policy returns to idle either
    /// way.
    pub fn handle(
        &mut self,
        trigger: Trigger,
        moving: &PointSet,
        fixed: &PointSet,
    ) -> RegistrationResult<RecomputeOutcome> {
        if let Trigger::ModeChanged(mode) = trigger {
            self.set_mode(mode);
        }

        if !self.policy.accept(trigger) {
            return Ok(RecomputeOutcome::Skipped);
        }

        // Synchronous caller: a pending hot-update move runs immediately.
        self.policy.start();
        let result = self.recompute(moving, fixed).map(|_| ());
        self.policy.finish();
        result?;

        Ok(RecomputeOutcome::Recomputed {
            downgraded: self.aligner.current().is_some_and(LinearFit::was_downgraded),
        })
    }

    /// The installed transform. Identity before the first successful
    /// recompute.
    #[must_use]
    pub const fn transform(&self) -> &ComposedTransform {
        &self.installed
    }

    /// The inverse of the installed transform, for callers that resample
    /// the moving volume onto the fixed one.
    ///
    /// # Errors
    ///
    /// Returns a compose error if the linear stage is singular.
    pub fn inverse_chain(&self) -> RegistrationResult<InverseChain> {
        Ok(self.installed.as_inverse_chain(&self.params.inverse)?)
    }

    /// The latest linear fit, if any.
    #[must_use]
    pub const fn linear_fit(&self) -> Option<&LinearFit> {
        self.aligner.current()
    }

    /// The latest thin-plate model, if any.
    #[must_use]
    pub const fn warp_model(&self) -> Option<&ThinPlateModel> {
        self.warp.model()
    }

    /// Enables or disables hot update.
    pub fn set_hot_update(&mut self, hot_update: bool) {
        self.params.hot_update = hot_update;
        self.policy.set_hot_update(hot_update);
    }

    /// Changes the linear mode. Takes effect at the next recompute.
    pub fn set_mode(&mut self, mode: LinearMode) {
        self.params.linear_mode = mode;
        self.aligner.set_mode(mode);
    }

    /// Recompute policy state.
    #[must_use]
    pub const fn state(&self) -> RecomputeState {
        self.policy.state()
    }

    fn estimate(
        &self,
        moving: &PointSet,
        fixed: &PointSet,
    ) -> RegistrationResult<(LinearFit, ThinPlateModel)> {
        let fit = self.aligner.estimate(moving, fixed)?;
        let aligned = fit.transform.apply(moving);
        let model = self.warp.estimate(&aligned, fixed)?;
        Ok((fit, model))
    }
}
