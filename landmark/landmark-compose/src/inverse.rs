//! Inverse of a composed transform.

use crate::{ComposeError, ComposeResult};
use landmark_linear::LinearTransform;
use landmark_thinplate::{InverseParams, ThinPlateModel};
use landmark_types::{PointSet, PointTransform};
use nalgebra::Point3;

/// One inverted stage, tagged with its index in the forward chain.
#[derive(Debug, Clone)]
pub(crate) enum InverseStage {
    Linear {
        index: usize,
        inverse: LinearTransform,
    },
    ThinPlate {
        index: usize,
        model: ThinPlateModel,
    },
}

/// Evaluates the inverse of a [`ComposedTransform`](crate::ComposedTransform).
///
/// Stages run in reverse order, each inverted. Thin-plate stages are
/// inverted per point by Newton iteration, so evaluation can fail.
#[derive(Debug, Clone)]
pub struct InverseChain {
    stages: Vec<InverseStage>,
    params: InverseParams,
}

impl InverseChain {
    pub(crate) const fn new(stages: Vec<InverseStage>, params: InverseParams) -> Self {
        Self { stages, params }
    }

    /// The Newton parameters used for thin-plate stages.
    #[must_use]
    pub const fn params(&self) -> &InverseParams {
        &self.params
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// True for the identity chain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Maps a point from the target space back to the source space.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::Warp`] if a thin-plate stage does not
    /// converge for this point.
    pub fn evaluate(&self, point: &Point3<f64>) -> ComposeResult<Point3<f64>> {
        self.stages.iter().try_fold(*point, |p, stage| match stage {
            InverseStage::Linear { inverse, .. } => Ok(inverse.transform_point(&p)),
            InverseStage::ThinPlate { index, model } => model
                .inverse_transform_point(&p, &self.params)
                .map_err(|source| ComposeError::Warp {
                    stage: *index,
                    source,
                }),
        })
    }

    /// Maps every point of a set back to the source space.
    ///
    /// # Errors
    ///
    /// Fails on the first point that cannot be inverted.
    pub fn apply(&self, points: &PointSet) -> ComposeResult<PointSet> {
        points.iter().map(|p| self.evaluate(p)).collect()
    }
}
