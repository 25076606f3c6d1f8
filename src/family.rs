//! A named group of scalar decision variables sharing a shape.

use crate::atol::ATol;
use crate::bound_spec::BoundSpec;
use crate::error::{Error, Result};
use crate::id::FamilyId;
use crate::labeled_array::{CoordIndex, LabeledArray};
use getset::Getters;

/// The domain of a variable family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Continuous,
    Integer,
    Binary,
}

/// One `add_variables` call's worth of scalar decision variables: a labeled
/// array of variable-labels plus the per-member bounds and domain that were
/// declared for it.
#[derive(Debug, Clone, Getters)]
pub struct VariableFamily {
    #[getset(get = "pub")]
    id: FamilyId,
    #[getset(get = "pub")]
    name: Option<String>,
    #[getset(get = "pub")]
    labels: LabeledArray<i64>,
    #[getset(get = "pub")]
    lower: LabeledArray<f64>,
    #[getset(get = "pub")]
    upper: LabeledArray<f64>,
    #[getset(get = "pub")]
    kind: Kind,
}

impl VariableFamily {
    /// `Kind::Binary` always overrides the normalized bounds to `[0, 1]`,
    /// regardless of what `lower`/`upper` the caller passed — binary implies
    /// integer and a `[0, 1]` domain, not just "integer within my bounds".
    ///
    /// `atol` tolerates the sliver of floating-point slack broadcasting a
    /// `lower`/`upper` pair can introduce; a bound pair that is only
    /// inverted by less than `atol` is accepted rather than rejected as
    /// `BoundsInvalid`.
    pub(crate) fn new(
        id: FamilyId,
        name: Option<String>,
        labels: LabeledArray<i64>,
        lower: BoundSpec,
        upper: BoundSpec,
        kind: Kind,
        atol: ATol,
    ) -> Result<Self> {
        let dims = labels.dim_names().to_vec();
        let coords = labels.coords().to_vec();
        let mut lower = lower.normalize(&dims, &coords)?;
        let mut upper = upper.normalize(&dims, &coords)?;
        if kind == Kind::Binary {
            lower = lower.map(|_| 0.0);
            upper = upper.map(|_| 1.0);
        }
        let atol = atol.into_inner();
        for (&lo, &hi) in lower.data().iter().zip(upper.data().iter()) {
            if lo - hi > atol {
                return Err(Error::BoundsInvalid { lower: lo, upper: hi });
            }
        }
        Ok(VariableFamily { id, name, labels, lower, upper, kind })
    }

    pub fn dims(&self) -> &[String] {
        self.labels.dim_names()
    }

    pub fn coords(&self) -> &[CoordIndex] {
        self.labels.coords()
    }

    pub fn shape(&self) -> &[usize] {
        self.labels.shape()
    }

    pub fn len(&self) -> usize {
        self.labels.data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
