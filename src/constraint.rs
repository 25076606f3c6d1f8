//! Constraints built from linear expressions.

use crate::error::{Error, Result};
use crate::id::{ConstraintLabel, FamilyId};
use crate::labeled_array::LabeledArray;
use crate::linear::LinearExpression;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Le,
    Ge,
    Eq,
}

impl std::fmt::Display for Sign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Sign::Le => "<=",
            Sign::Ge => ">=",
            Sign::Eq => "==",
        })
    }
}

/// An immutable `lhs sign rhs` relation produced by comparing two
/// [`LinearExpression`]s. It carries no constraint-labels and is not bound
/// to any `Model` until passed to `Model::add_constraints`.
#[derive(Debug, Clone)]
pub struct AnonymousConstraint {
    lhs: LinearExpression,
    sign: Sign,
    rhs: LinearExpression,
}

impl AnonymousConstraint {
    pub(crate) fn new(lhs: LinearExpression, sign: Sign, rhs: LinearExpression) -> Self {
        AnonymousConstraint { lhs, sign, rhs }
    }

    pub fn lhs(&self) -> &LinearExpression {
        &self.lhs
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    pub fn rhs(&self) -> &LinearExpression {
        &self.rhs
    }

    /// `lhs - rhs`, with the comparison unchanged: every attached label's
    /// row is `(lhs - rhs) sign 0`.
    pub fn residual(&self) -> Result<LinearExpression> {
        self.lhs.checked_sub(&self.rhs)
    }

    /// `AnonymousConstraint` has no settable fields post-construction; this
    /// exists only so attempts to mutate it surface the intended error
    /// rather than a compile error a caller might work around by hand.
    pub fn set_lhs(&mut self, _lhs: LinearExpression) -> Result<()> {
        Err(Error::Immutable { field: "lhs" })
    }
}

/// A named, model-bound constraint family: an [`AnonymousConstraint`] plus
/// the constraint-labels allocated for it.
#[derive(Debug, Clone)]
pub struct Constraint {
    name: Option<String>,
    family: FamilyId,
    body: AnonymousConstraint,
    labels: LabeledArray<i64>,
}

impl Constraint {
    pub(crate) fn new(name: Option<String>, family: FamilyId, body: AnonymousConstraint, labels: LabeledArray<i64>) -> Self {
        Constraint { name, family, body, labels }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn family(&self) -> FamilyId {
        self.family
    }

    pub fn sign(&self) -> Sign {
        self.body.sign
    }

    pub fn body(&self) -> &AnonymousConstraint {
        &self.body
    }

    pub fn labels(&self) -> &LabeledArray<i64> {
        &self.labels
    }

    pub fn constraint_labels(&self) -> Vec<ConstraintLabel> {
        self.labels.data().iter().copied().filter(|&l| l != crate::id::SENTINEL).map(ConstraintLabel::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linear::LinearExpression;

    #[test]
    fn anonymous_constraint_cannot_be_mutated() {
        let mut c = AnonymousConstraint::new(LinearExpression::scalar_constant(1.0), Sign::Le, LinearExpression::scalar_constant(2.0));
        let err = c.set_lhs(LinearExpression::scalar_constant(0.0)).unwrap_err();
        assert!(matches!(err, Error::Immutable { .. }));
    }

    #[test]
    fn residual_subtracts_rhs_from_lhs() {
        let c = AnonymousConstraint::new(LinearExpression::scalar_constant(5.0), Sign::Eq, LinearExpression::scalar_constant(2.0));
        let residual = c.residual().unwrap();
        assert_eq!(residual.constant().data().iter().copied().next(), Some(3.0));
    }
}
