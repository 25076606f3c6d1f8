//! How a caller may specify per-family variable bounds: a single
//! scalar applied to every member, a dense unlabeled array matching the
//! family's shape positionally, or a fully labeled array that is aligned
//! by coordinate.

use crate::error::Result;
use crate::labeled_array::{CoordIndex, LabeledArray};
use ndarray::ArrayD;

/// A lower or upper bound, in one of three shapes.
#[derive(Debug, Clone)]
pub enum BoundSpec {
    Scalar(f64),
    Unlabeled(ArrayD<f64>),
    Labeled(LabeledArray<f64>),
}

impl From<f64> for BoundSpec {
    fn from(v: f64) -> Self {
        BoundSpec::Scalar(v)
    }
}

impl From<ArrayD<f64>> for BoundSpec {
    fn from(v: ArrayD<f64>) -> Self {
        BoundSpec::Unlabeled(v)
    }
}

impl From<LabeledArray<f64>> for BoundSpec {
    fn from(v: LabeledArray<f64>) -> Self {
        BoundSpec::Labeled(v)
    }
}

impl BoundSpec {
    /// Broadcast this bound to the family's full `(dims, coords)` shape.
    pub fn normalize(&self, dims: &[String], coords: &[CoordIndex]) -> Result<LabeledArray<f64>> {
        match self {
            BoundSpec::Scalar(v) => {
                let full = LabeledArray::scalar(*v);
                Ok(full.broadcast_to(dims, coords))
            }
            BoundSpec::Unlabeled(data) => {
                let named = dims
                    .iter()
                    .zip(coords)
                    .map(|(name, idx)| (Some(name.clone()), idx.iter().cloned().collect()))
                    .collect();
                LabeledArray::dense(data.clone(), named)
            }
            BoundSpec::Labeled(arr) => {
                let (plan_dims, plan_coords) = LabeledArray::<f64>::broadcast_plan(arr.dim_names(), arr.coords(), dims, coords)?;
                Ok(arr.broadcast_to(&plan_dims, &plan_coords))
            }
        }
    }
}
