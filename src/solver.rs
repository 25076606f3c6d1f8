//! The sparse matrix view exported for solver back-ends and the
//! trait a back-end implements to consume it. No concrete adapter ships in
//! this crate — wiring an actual solver is explicitly out of scope.

use crate::constraint::Sign;
use crate::error::{Error, Result};
use fnv::FnvHashMap;

/// A deterministic, duplicate-free sparse representation of a model's
/// constraint matrix and objective row, keyed by the ascending
/// variable/constraint labels a [`crate::model::Model`] allocated.
///
/// Built by [`crate::model::Model::to_matrix_view`]: entries that land on
/// the same `(row, col)` after broadcasting are summed, and any entry that
/// sums to exactly zero is dropped.
#[derive(Debug, Clone, Default)]
pub struct MatrixView {
    pub n_variables: usize,
    pub n_constraints: usize,
    /// Live (non-sentinel) variable-labels, ascending — the family
    /// allocation order, since labels are handed out monotonically.
    pub vars: Vec<i64>,
    /// `(constraint_label, variable_label, coefficient)`, sorted ascending
    /// by `(constraint_label, variable_label)`.
    pub coefficients: Vec<(i64, i64, f64)>,
    /// `(constraint_label, sign, rhs)`, sorted ascending by `constraint_label`.
    pub rows: Vec<(i64, Sign, f64)>,
    /// `(variable_label, coefficient)` for the objective's linear part,
    /// sorted ascending by `variable_label`.
    pub objective: Vec<(i64, f64)>,
    pub objective_constant: f64,
    pub lower_bounds: FnvHashMap<i64, f64>,
    pub upper_bounds: FnvHashMap<i64, f64>,
    /// Whether each live variable-label is integer-constrained (`true` for
    /// [`crate::family::Kind::Integer`] and [`crate::family::Kind::Binary`],
    /// `false` for [`crate::family::Kind::Continuous`]) — required for a
    /// solver adapter to branch correctly on a mixed-integer model.
    pub integer: FnvHashMap<i64, bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    Optimal,
    Infeasible,
    Unbounded,
    Interrupted,
}

#[derive(Debug, Clone)]
pub struct SolverResult {
    pub status: SolverStatus,
    pub objective_value: f64,
    /// `(variable_label, value)`, sorted ascending by `variable_label`.
    pub values: Vec<(i64, f64)>,
}

/// A back-end that can solve the linear/mixed-integer program described by
/// a [`MatrixView`]. Implemented outside this crate.
pub trait SolverAdapter {
    fn solve(&mut self, matrix: &MatrixView) -> Result<SolverResult>;
}

/// An adapter used only in tests: reports every model as infeasible without
/// touching the matrix. Exercises the `Model::solve` wiring without
/// depending on a real back-end.
#[derive(Debug, Default)]
pub struct UnimplementedAdapter;

impl SolverAdapter for UnimplementedAdapter {
    fn solve(&mut self, _matrix: &MatrixView) -> Result<SolverResult> {
        Err(Error::SolverError { message: "no solver adapter is wired up".to_string() })
    }
}
