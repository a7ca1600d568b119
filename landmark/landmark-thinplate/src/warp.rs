//! Stateful thin-plate warp.

use crate::{ThinPlateModel, WarpParams, WarpResult};
use landmark_types::PointSet;

/// Fits a thin-plate spline mapping `source` landmarks onto `target`
/// landmarks.
///
/// # Errors
///
/// See [`ThinPlateModel::fit`].
///
/// # Example
///
/// ```
/// use landmark_thinplate::{fit_thin_plate, WarpParams};
/// use landmark_types::{PointSet, PointTransform};
///
/// let source = PointSet::from_coords(&[
///     [0.0, 0.0, 0.0],
///     [1.0, 0.0, 0.0],
///     [0.0, 1.0, 0.0],
///     [0.0, 0.0, 1.0],
///     [0.3, 0.3, 0.3],
/// ]);
/// let target = PointSet::from_coords(&[
///     [0.0, 0.0, 0.0],
///     [1.0, 0.0, 0.0],
///     [0.0, 1.0, 0.0],
///     [0.0, 0.0, 1.0],
///     [0.4, 0.3, 0.3],
/// ]);
///
/// let model = fit_thin_plate(&source, &target, &WarpParams::default()).unwrap();
///
/// assert!(model.apply(&source).max_distance_to(&target).unwrap() < 1e-9);
/// ```
pub fn fit_thin_plate(
    source: &PointSet,
    target: &PointSet,
    params: &WarpParams,
) -> WarpResult<ThinPlateModel> {
    ThinPlateModel::fit(source, target, params)
}

/// Holds warp parameters and the latest successful spline.
///
/// A re-fit replaces the stored model only when it succeeds.
#[derive(Debug, Clone, Default)]
pub struct ThinPlateWarp {
    params: WarpParams,
    model: Option<ThinPlateModel>,
}

impl ThinPlateWarp {
    /// Creates a warp with no model yet.
    #[must_use]
    pub const fn new(params: WarpParams) -> Self {
        Self {
            params,
            model: None,
        }
    }

    /// The fitting parameters.
    #[must_use]
    pub const fn params(&self) -> &WarpParams {
        &self.params
    }

    /// Replaces the fitting parameters. The stored model is kept.
    pub fn set_params(&mut self, params: WarpParams) {
        self.params = params;
    }

    /// Fits without touching the stored model.
    ///
    /// # Errors
    ///
    /// See [`ThinPlateModel::fit`].
    pub fn estimate(&self, source: &PointSet, target: &PointSet) -> WarpResult<ThinPlateModel> {
        fit_thin_plate(source, target, &self.params)
    }

    /// Stores a model as the current one.
    pub fn commit(&mut self, model: ThinPlateModel) -> &ThinPlateModel {
        self.model.insert(model)
    }

    /// Fits and stores the result. On error the previous model is kept.
    ///
    /// # Errors
    ///
    /// See [`ThinPlateModel::fit`].
    pub fn fit(&mut self, source: &PointSet, target: &PointSet) -> WarpResult<&ThinPlateModel> {
        let model = self.estimate(source, target)?;
        Ok(self.commit(model))
    }

    /// The latest successful model, if any.
    #[must_use]
    pub const fn model(&self) -> Option<&ThinPlateModel> {
        self.model.as_ref()
    }
}
