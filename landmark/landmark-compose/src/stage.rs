//! A single stage of a composed transform.

use landmark_linear::LinearTransform;
use landmark_thinplate::ThinPlateModel;
use landmark_types::PointTransform;
use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One step of a [`ComposedTransform`](crate::ComposedTransform).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TransformStage {
    /// A homogeneous linear map.
    Linear(LinearTransform),
    /// A thin-plate spline warp.
    ThinPlate(ThinPlateModel),
}

impl TransformStage {
    /// Short name for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Linear(_) => "linear",
            Self::ThinPlate(_) => "thin-plate",
        }
    }
}

impl PointTransform for TransformStage {
    fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        match self {
            Self::Linear(linear) => linear.transform_point(point),
            Self::ThinPlate(model) => model.transform_point(point),
        }
    }
}

impl From<LinearTransform> for TransformStage {
    fn from(transform: LinearTransform) -> Self {
        Self::Linear(transform)
    }
}

impl From<ThinPlateModel> for TransformStage {
    fn from(model: ThinPlateModel) -> Self {
        Self::ThinPlate(model)
    }
}
