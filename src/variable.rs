//! A handle to one `add_variables` family's labels.
//!
//! `Variable` deliberately holds no reference back to the `Model` that
//! created it — only a [`FamilyId`] and the labeled array of labels. Every
//! arithmetic operation converts it into a [`LinearExpression`] and proceeds
//! purely through the labeled-array collaborator contract.

use crate::id::FamilyId;
use crate::labeled_array::LabeledArray;
use crate::linear::LinearExpression;
use std::ops::{Add, Mul, Neg, Sub};

#[derive(Debug, Clone)]
pub struct Variable {
    family: FamilyId,
    labels: LabeledArray<i64>,
}

impl Variable {
    pub(crate) fn new(family: FamilyId, labels: LabeledArray<i64>) -> Self {
        Variable { family, labels }
    }

    pub fn family(&self) -> FamilyId {
        self.family
    }

    pub fn labels(&self) -> &LabeledArray<i64> {
        &self.labels
    }

    pub fn dims(&self) -> &[String] {
        self.labels.dim_names()
    }

    pub fn shape(&self) -> &[usize] {
        self.labels.shape()
    }
}

macro_rules! forward_binop_via_linear_expression {
    ($trait_:ident, $method:ident) => {
        impl $trait_<Variable> for Variable {
            type Output = LinearExpression;
            fn $method(self, rhs: Variable) -> LinearExpression {
                LinearExpression::from_variable(&self).$method(LinearExpression::from_variable(&rhs))
            }
        }

        impl $trait_<&Variable> for &Variable {
            type Output = LinearExpression;
            fn $method(self, rhs: &Variable) -> LinearExpression {
                LinearExpression::from_variable(self).$method(LinearExpression::from_variable(rhs))
            }
        }
    };
}

forward_binop_via_linear_expression!(Add, add);
forward_binop_via_linear_expression!(Sub, sub);

impl Mul<f64> for &Variable {
    type Output = LinearExpression;
    fn mul(self, rhs: f64) -> LinearExpression {
        LinearExpression::from_variable(self) * rhs
    }
}

impl Neg for &Variable {
    type Output = LinearExpression;
    fn neg(self) -> LinearExpression {
        -LinearExpression::from_variable(self)
    }
}
