//! Ordered chain of transform stages.

use crate::inverse::{InverseChain, InverseStage};
use crate::{ComposeError, ComposeResult, TransformStage};
use landmark_linear::LinearTransform;
use landmark_thinplate::{InverseParams, ThinPlateModel};
use landmark_types::PointTransform;
use nalgebra::Point3;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A transform built from stages applied in list order.
///
/// An empty chain is the identity.
///
/// # Example
///
/// ```
/// use landmark_compose::ComposedTransform;
/// use landmark_linear::LinearTransform;
/// use landmark_types::PointTransform;
/// use nalgebra::{Point3, Vector3};
///
/// let mut chain = ComposedTransform::default();
/// chain.push(LinearTransform::from_translation(&Vector3::new(1.0, 0.0, 0.0)));
/// chain.push(LinearTransform::from_translation(&Vector3::new(0.0, 2.0, 0.0)));
///
/// let p = chain.transform_point(&Point3::origin());
/// assert_eq!(p, Point3::new(1.0, 2.0, 0.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ComposedTransform {
    stages: Vec<TransformStage>,
}

impl ComposedTransform {
    /// Creates a chain from stages in forward order.
    #[must_use]
    pub const fn new(stages: Vec<TransformStage>) -> Self {
        Self { stages }
    }

    /// The registration chain: the linear fit, then the warp.
    #[must_use]
    pub fn affine_then_warp(linear: LinearTransform, warp: ThinPlateModel) -> Self {
        Self::new(vec![
            TransformStage::Linear(linear),
            TransformStage::ThinPlate(warp),
        ])
    }

    /// Appends a stage, applied after every existing one.
    pub fn push(&mut self, stage: impl Into<TransformStage>) {
        self.stages.push(stage.into());
    }

    /// Stages in forward order.
    #[must_use]
    pub fn stages(&self) -> &[TransformStage] {
        &self.stages
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

    /// Maps a point through every stage in order.
    #[must_use]
    pub fn evaluate(&self, point: &Point3<f64>) -> Point3<f64> {
        self.stages
            .iter()
            .fold(*point, |p, stage| stage.transform_point(&p))
    }

    /// Builds the inverse of this chain.
    ///
    /// Linear inverses are computed up front; thin-plate stages are inverted
    /// per point when the chain is evaluated.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::NotInvertible`] if a linear stage is singular.
    pub fn as_inverse_chain(&self, params: &InverseParams) -> ComposeResult<InverseChain> {
        let stages = self
            .stages
            .iter()
            .enumerate()
            .rev()
            .map(|(index, stage)| match stage {
                TransformStage::Linear(linear) => linear
                    .inverse()
                    .map(|inverse| InverseStage::Linear { index, inverse })
                    .ok_or(ComposeError::NotInvertible { stage: index }),
                TransformStage::ThinPlate(model) => Ok(InverseStage::ThinPlate {
                    index,
                    model: model.clone(),
                }),
            })
            .collect::<ComposeResult<Vec<_>>>()?;

        debug!(stages = stages.len(), "Built inverse transform chain");
        Ok(InverseChain::new(stages, *params))
    }
}

impl PointTransform for ComposedTransform {
    fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.evaluate(point)
    }
}

impl FromIterator<TransformStage> for ComposedTransform {
    fn from_iter<I: IntoIterator<Item = TransformStage>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use landmark_thinplate::{WarpParams, fit_thin_plate};
    use landmark_types::PointSet;
    use nalgebra::{Matrix3, Vector3};

    fn bulge() -> ThinPlateModel {
        let source = PointSet::from_coords(&[
            [0.0, 0.0, 0.0],
            [10.0, 0.0, 0.0],
            [0.0, 10.0, 0.0],
            [0.0, 0.0, 10.0],
            [10.0, 10.0, 10.0],
            [4.0, 4.0, 4.0],
        ]);
        let target = PointSet::from_coords(&[
            [0.0, 0.0, 0.0],
            [10.0, 0.0, 0.0],
            [0.0, 10.0, 0.0],
            [0.0, 0.0, 10.0],
            [10.0, 10.0, 10.0],
            [5.0, 4.5, 3.5],
        ]);
        fit_thin_plate(&source, &target, &WarpParams::default()).unwrap()
    }

    fn scale_and_shift() -> LinearTransform {
        LinearTransform::from_parts(
            &Matrix3::from_diagonal(&Vector3::new(2.0, 1.5, 0.5)),
            &Vector3::new(3.0, -1.0, 2.0),
        )
    }

    #[test]
    fn empty_chain_is_identity() {
        let chain = ComposedTransform::default();
        let p = Point3::new(1.0, -2.0, 3.0);
        assert!(chain.is_empty());
        assert_eq!(chain.evaluate(&p), p);
    }

    #[test]
    fn affine_then_warp_orders_linear_first() {
        let chain = ComposedTransform::affine_then_warp(scale_and_shift(), bulge());

        assert_eq!(chain.len(), 2);
        assert_eq!(chain.stages()[0].kind(), "linear");
        assert_eq!(chain.stages()[1].kind(), "thin-plate");

        let p = Point3::new(2.0, 3.0, 4.0);
        let expected = bulge().transform_point(&scale_and_shift().transform_point(&p));
        assert_relative_eq!(chain.evaluate(&p).coords, expected.coords, epsilon = 1e-12);
    }

    #[test]
    fn stage_order_changes_the_result() {
        let forward = ComposedTransform::affine_then_warp(scale_and_shift(), bulge());
        let reversed: ComposedTransform = vec![
            TransformStage::ThinPlate(bulge()),
            TransformStage::Linear(scale_and_shift()),
        ]
        .into_iter()
        .collect();

        let p = Point3::new(4.0, 4.0, 4.0);
        let difference = (forward.evaluate(&p) - reversed.evaluate(&p)).norm();
        assert!(difference > 1e-3, "difference was {difference}");
    }

    #[test]
    fn inverse_chain_undoes_forward_chain() {
        let chain = ComposedTransform::affine_then_warp(scale_and_shift(), bulge());
        let inverse = chain.as_inverse_chain(&InverseParams::default()).unwrap();

        for p in [
            Point3::new(1.0, 2.0, 3.0),
            Point3::new(-4.0, 0.5, 7.0),
            Point3::new(0.0, 0.0, 0.0),
        ] {
            let back = inverse.evaluate(&chain.evaluate(&p)).unwrap();
            assert_relative_eq!(back.coords, p.coords, epsilon = 1e-6);
        }
    }

    #[test]
    fn singular_linear_stage_is_not_invertible() {
        let flatten = LinearTransform::from_parts(
            &Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, 0.0)),
            &Vector3::zeros(),
        );
        let chain = ComposedTransform::new(vec![
            TransformStage::ThinPlate(bulge()),
            TransformStage::Linear(flatten),
        ]);

        let err = chain.as_inverse_chain(&InverseParams::default()).unwrap_err();

        assert!(matches!(err, ComposeError::NotInvertible { stage: 1 }));
    }
}
