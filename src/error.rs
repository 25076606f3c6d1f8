//! The crate's single error type.
//!
//! Every fallible public operation returns `Result<T, Error>`. Variants carry
//! the concrete offending value (a dimension name, a label, a family name)
//! so `Display` messages are actionable without a debugger.

use thiserror::Error;

/// Errors raised by the labeled algebraic engine.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("bound array requires explicit `coords`: no coordinates were given for an unlabeled array of shape {shape:?}")]
    MissingCoordinates { shape: Vec<usize> },

    #[error("dimension `{dim}` has no name and `force_dim_names` is set")]
    UnnamedDimension { dim: String },

    #[error("dimension `{dim}` has conflicting coordinates between the two operands being aligned")]
    DimensionMismatch { dim: String },

    #[error("name `{name}` is already registered in the {kind} registry")]
    DuplicateName { kind: &'static str, name: String },

    #[error("AnonymousConstraint is immutable: cannot set `{field}` after construction")]
    Immutable { field: &'static str },

    #[error("rule function returned the wrong kind of value at coordinate {at:?}: expected {expected}")]
    RuleArityError { at: Vec<String>, expected: &'static str },

    #[error("variable-label {label} does not belong to this model")]
    UnknownVariable { label: i64 },

    #[error("add_objective was already called; pass overwrite=true to replace it")]
    ObjectiveExists,

    #[error("lower bound {lower} is greater than upper bound {upper}")]
    BoundsInvalid { lower: f64, upper: f64 },

    #[error("solver adapter reported a failure: {message}")]
    SolverError { message: String },

    #[error("cannot reduce over dimension `{dim}` directly; use `.sum()` with no argument to fold every non-term dimension into `term`")]
    InvalidReduction { dim: String },

    #[error("rule builder was given an empty coordinate product on dimension `{dim}`")]
    EmptyCoordinateProduct { dim: String },

    #[error("no constraint family named `{name}` is registered in this model")]
    UnknownConstraintFamily { name: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_mismatch_message_is_stable() {
        let err = Error::DimensionMismatch { dim: "plant".to_string() };
        insta::assert_snapshot!(err.to_string(), @"dimension `plant` has conflicting coordinates between the two operands being aligned");
    }

    #[test]
    fn bounds_invalid_message_is_stable() {
        let err = Error::BoundsInvalid { lower: 5.0, upper: -5.0 };
        insta::assert_snapshot!(err.to_string(), @"lower bound 5 is greater than upper bound -5");
    }
}
