//! A labeled-array algebraic engine for building large-scale linear and
//! mixed-integer linear optimization models.
//!
//! The core idea: variables, constraints, and coefficients are organized as
//! labeled multi-dimensional arrays — each axis has a name and a coordinate
//! index, and arithmetic between arrays of different shapes broadcasts by
//! matching axis *names*, not positions. A thousand-constraint "capacity at
//! every `(plant, week)`" family is one call, not a loop that builds a
//! thousand scalar rows by hand.
//!
//! ```
//! use laxis::{Kind, Model, Sense};
//!
//! let mut model = Model::new();
//! let x = model
//!     .add_variables("x", vec![Some("t".into())], vec![(0..3i64).map(Into::into).collect()], 0.0, 10.0, Kind::Continuous, None)
//!     .unwrap();
//! let total = laxis::LinearExpression::from_variable(&x).sum(None).unwrap();
//! model.add_objective(total, Sense::Maximize, false).unwrap();
//! let view = model.to_matrix_view();
//! assert_eq!(view.n_variables, 3);
//! ```
//!
//! # Module map
//!
//! - [`labeled_array`] is the generic N-dimensional, named-axis collaborator
//!   everything else is built from.
//! - [`allocator`], [`id`] handle monotonic variable/constraint-label issuance.
//! - [`bound_spec`], [`family`], [`variable`] cover declaring variables.
//! - [`linear`] is the arithmetic core: `LinearExpression` and its algebra.
//! - [`constraint`], [`rule`] build and assemble constraints.
//! - [`model`] ties it all together; [`solver`] is the export boundary to a
//!   solver back-end, which this crate does not itself provide.
//!
//! # Non-goals
//!
//! Nonlinear expressions, symbolic simplification beyond combining like
//! terms, sparse-expression-graph optimization, automatic dual recovery,
//! solver back-ends, and file-format export all live outside this crate.

pub mod allocator;
pub mod arbitrary;
pub mod atol;
pub mod bound_spec;
pub mod constraint;
pub mod error;
pub mod family;
pub mod id;
pub mod labeled_array;
pub mod linear;
pub mod model;
pub mod rule;
pub mod solver;
pub mod variable;

pub use atol::ATol;
pub use bound_spec::BoundSpec;
pub use constraint::{AnonymousConstraint, Constraint, Sign};
pub use error::{Error, Result};
pub use family::{Kind, VariableFamily};
pub use id::{ConstraintLabel, FamilyId, VariableLabel};
pub use labeled_array::{CoordKey, LabeledArray};
pub use linear::LinearExpression;
pub use model::{Model, Sense};
pub use solver::{MatrixView, SolverAdapter, SolverResult, SolverStatus};
pub use variable::Variable;
