//! The model container: the single explicit owner of label
//! allocation, family registries, and the objective. `Variable` and
//! `Constraint` hold no back-pointer into `Model` — every read-back goes
//! through the registries here.

use crate::allocator::LabelAllocator;
use crate::atol::ATol;
use crate::bound_spec::BoundSpec;
use crate::constraint::{AnonymousConstraint, Constraint, Sign};
use crate::error::{Error, Result};
use crate::family::{Kind, VariableFamily};
use crate::id::{FamilyId, SENTINEL};
use crate::labeled_array::{CoordIndex, CoordKey, LabeledArray};
use crate::linear::LinearExpression;
use crate::rule;
use crate::solver::{MatrixView, SolverAdapter, SolverResult};
use crate::variable::Variable;
use fnv::FnvHashMap;
use ndarray::IxDyn;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// The container that owns label allocation, every variable and constraint
/// family, and at most one objective.
#[derive(Debug)]
pub struct Model {
    allocator: LabelAllocator,
    families: Vec<VariableFamily>,
    family_names: BTreeMap<String, FamilyId>,
    constraints: Vec<Constraint>,
    constraint_names: BTreeMap<String, usize>,
    objective: Option<(LinearExpression, Sense)>,
    force_dim_names: bool,
    atol: ATol,
}

impl Default for Model {
    fn default() -> Self {
        Model::new()
    }
}

impl Model {
    pub fn new() -> Self {
        Model {
            allocator: LabelAllocator::new(),
            families: Vec::new(),
            family_names: BTreeMap::new(),
            constraints: Vec::new(),
            constraint_names: BTreeMap::new(),
            objective: None,
            force_dim_names: false,
            atol: ATol::default(),
        }
    }

    pub fn with_force_dim_names(mut self, force: bool) -> Self {
        self.force_dim_names = force;
        self
    }

    pub fn with_atol(mut self, atol: ATol) -> Self {
        self.atol = atol;
        self
    }

    pub fn atol(&self) -> ATol {
        self.atol
    }

    fn check_dim_names(&self, dims: &[Option<String>]) -> Result<()> {
        if self.force_dim_names {
            if let Some(missing) = dims.iter().position(|d| d.is_none()) {
                return Err(Error::UnnamedDimension { dim: format!("dim_{missing}") });
            }
        }
        Ok(())
    }

    /// Declare a new family of scalar decision variables shaped by `dims`
    /// and `coords` (`coords[i]` names the coordinates along `dims[i]`).
    /// `mask`, if given, marks positions that should not participate in the
    /// model: those positions still consume allocated labels, but the label
    /// stored for them is the sentinel, so `to_matrix_view` skips them.
    pub fn add_variables(
        &mut self,
        name: impl Into<String>,
        dims: Vec<Option<String>>,
        coords: Vec<Vec<CoordKey>>,
        lower: impl Into<BoundSpec>,
        upper: impl Into<BoundSpec>,
        kind: Kind,
        mask: Option<&LabeledArray<bool>>,
    ) -> Result<Variable> {
        self.check_dim_names(&dims)?;
        let name = name.into();
        if self.family_names.contains_key(&name) {
            return Err(Error::DuplicateName { kind: "variable family", name });
        }
        let shape: Vec<usize> = coords.iter().map(Vec::len).collect();
        let total: usize = shape.iter().product();
        let range = self.allocator.allocate_variables(total);
        let mut data = ndarray::Array::from_shape_vec(IxDyn(&shape), range.clone().collect()).expect("shape matches allocated count");
        let named_coords: Vec<(Option<String>, Vec<CoordKey>)> = dims.into_iter().zip(coords).collect();
        let dim_names: Vec<String> = named_coords.iter().enumerate().map(|(i, (name, _))| name.clone().unwrap_or_else(|| crate::labeled_array::default_dim_name(i))).collect();
        let coord_indexes: Vec<CoordIndex> = named_coords.iter().map(|(_, keys)| keys.iter().cloned().collect()).collect();
        if let Some(mask) = mask {
            let mask_bc = mask.broadcast_to(&dim_names, &coord_indexes);
            ndarray::Zip::from(&mut data).and(mask_bc.data()).for_each(|label, &keep| {
                if !keep {
                    *label = SENTINEL;
                }
            });
        }
        let labels = LabeledArray::dense(data, named_coords)?;

        let id = FamilyId::from(self.families.len());
        let family = VariableFamily::new(id, Some(name.clone()), labels, lower.into(), upper.into(), kind, self.atol)?;
        let result_labels = family.labels().clone();
        log::debug!("add_variables: family `{name}` ({id:?}) allocated labels {}..{}", range.start, range.end);
        self.families.push(family);
        self.family_names.insert(name, id);
        Ok(Variable::new(id, result_labels))
    }

    pub fn variable_family(&self, name: &str) -> Option<&VariableFamily> {
        self.family_names.get(name).map(|id| &self.families[id.into_inner()])
    }

    /// Bind an [`AnonymousConstraint`] to this model, allocating one
    /// constraint-label per coordinate of its (broadcast) outer shape.
    /// `mask`, if given, marks positions that should not participate in the
    /// model: those positions still consume allocated labels, but the label
    /// stored for them is the sentinel, so `to_matrix_view` skips them.
    ///
    /// Every non-sentinel variable-label the constraint's residual refers to
    /// must have been issued by this model's allocator; a label from another
    /// (or a dropped) model is rejected with [`Error::UnknownVariable`]
    /// rather than silently producing a matrix view with dangling columns.
    pub fn add_constraints(&mut self, name: impl Into<String>, constraint: AnonymousConstraint, mask: Option<&LabeledArray<bool>>) -> Result<Constraint> {
        let name = name.into();
        if self.constraint_names.contains_key(&name) {
            return Err(Error::DuplicateName { kind: "constraint family", name });
        }
        let residual = constraint.residual()?;
        let valid_range = 1..self.allocator.next_variable_label();
        for &label in residual.vars().data() {
            if label != SENTINEL && !valid_range.contains(&label) {
                return Err(Error::UnknownVariable { label });
            }
        }
        let dims = residual.outer_dims().to_vec();
        let coords: Vec<CoordIndex> = residual.constant().coords().to_vec();
        let shape: Vec<usize> = coords.iter().map(CoordIndex::len).collect();
        let total: usize = shape.iter().product();
        let range = self.allocator.allocate_constraints(total);
        let mut data = ndarray::Array::from_shape_vec(IxDyn(&shape), range.clone().collect()).expect("shape matches allocated count");
        if let Some(mask) = mask {
            let mask_bc = mask.broadcast_to(&dims, &coords);
            ndarray::Zip::from(&mut data).and(mask_bc.data()).for_each(|label, &keep| {
                if !keep {
                    *label = SENTINEL;
                }
            });
        }
        let labels = LabeledArray::new_unchecked(dims, coords, data);

        let family_index = self.constraints.len();
        log::debug!("add_constraints: family `{name}` allocated labels {}..{}", range.start, range.end);
        let row = Constraint::new(Some(name.clone()), FamilyId::from(family_index), constraint, labels);
        self.constraints.push(row);
        self.constraint_names.insert(name, family_index);
        Ok(self.constraints[family_index].clone())
    }

    /// Build an [`AnonymousConstraint`] via the rule evaluator and bind it,
    /// equivalent to `add_constraints(name, rule::build_constraint(...), None)`.
    pub fn add_constraints_rule(
        &mut self,
        name: impl Into<String>,
        dims: Vec<String>,
        coords: Vec<CoordIndex>,
        f: impl FnMut(&[CoordKey]) -> Result<AnonymousConstraint>,
    ) -> Result<Constraint> {
        let constraint = rule::build_constraint(dims, coords, f)?;
        self.add_constraints(name, constraint, None)
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraint_names.get(name).map(|&i| &self.constraints[i])
    }

    /// Remove a previously added constraint family. Its labels are retired
    /// permanently, never reissued.
    pub fn remove_constraints(&mut self, name: &str) -> Result<()> {
        let index = self.constraint_names.remove(name).ok_or_else(|| Error::UnknownConstraintFamily { name: name.to_string() })?;
        self.constraints.remove(index);
        for value in self.constraint_names.values_mut() {
            if *value > index {
                *value -= 1;
            }
        }
        Ok(())
    }

    /// Build a single-term-per-pair [`LinearExpression`], e.g. for a dot
    /// product `sum_i coeff_i * x_i` expressed as one `k`-term expression.
    pub fn linexpr(&self, pairs: &[(f64, &Variable)]) -> Result<LinearExpression> {
        let mut acc = LinearExpression::scalar_constant(0.0);
        for (coeff, var) in pairs {
            let term = LinearExpression::from_variable(var) * *coeff;
            acc = acc.checked_add(&term)?;
        }
        Ok(acc)
    }

    /// Build a [`LinearExpression`] over named axes via the rule evaluator.
    pub fn linexpr_rule(&self, dims: Vec<String>, coords: Vec<CoordIndex>, f: impl FnMut(&[CoordKey]) -> Result<LinearExpression>) -> Result<LinearExpression> {
        rule::build_expression(dims, coords, f)
    }

    /// Set the model's objective. The expression must have no remaining
    /// outer dimensions (sum over everything first).
    pub fn add_objective(&mut self, expr: LinearExpression, sense: Sense, overwrite: bool) -> Result<()> {
        if let Some(dim) = expr.outer_dims().first() {
            return Err(Error::DimensionMismatch { dim: dim.clone() });
        }
        if self.objective.is_some() && !overwrite {
            return Err(Error::ObjectiveExists);
        }
        log::debug!("add_objective: sense={sense:?} terms={}", expr.term_len());
        self.objective = Some((expr, sense));
        Ok(())
    }

    pub fn objective(&self) -> Option<&(LinearExpression, Sense)> {
        self.objective.as_ref()
    }

    /// Flatten the model into a deterministic sparse matrix view, summing
    /// duplicate `(row, col)` coefficients and dropping exact zeros.
    pub fn to_matrix_view(&self) -> MatrixView {
        let mut coefficient_sums: FnvHashMap<(i64, i64), (f64, u32)> = FnvHashMap::default();
        let mut rows = Vec::with_capacity(self.constraints.len());

        for constraint in &self.constraints {
            let residual = constraint.body().residual().expect("residual was already validated in add_constraints");
            let labels = constraint.labels().data();
            let coeffs = residual.coeffs().data();
            let vars = residual.vars().data();
            let constant = residual.constant().data();
            let term_len = residual.term_len();

            for (flat, &row_label) in labels.iter().enumerate() {
                if row_label == SENTINEL {
                    continue;
                }
                let rhs = -constant.iter().nth(flat).copied().unwrap_or(0.0);
                rows.push((row_label, constraint.sign(), rhs));
                for t in 0..term_len {
                    let coeff = *coeffs.iter().nth(flat * term_len + t).unwrap_or(&0.0);
                    let var_label = *vars.iter().nth(flat * term_len + t).unwrap_or(&SENTINEL);
                    if var_label == SENTINEL || coeff == 0.0 {
                        continue;
                    }
                    let entry = coefficient_sums.entry((row_label, var_label)).or_insert((0.0, 0));
                    entry.0 += coeff;
                    entry.1 += 1;
                }
            }
        }

        let mut coefficients = Vec::with_capacity(coefficient_sums.len());
        for ((row, col), (value, contributions)) in coefficient_sums {
            if value == 0.0 {
                if contributions > 1 {
                    log::warn!("to_matrix_view: dropping explicit zero at (row={row}, col={col}) after summing {contributions} contributions");
                }
                continue;
            }
            coefficients.push((row, col, value));
        }
        coefficients.sort_by_key(|&(r, c, _)| (r, c));
        rows.sort_by_key(|&(r, _, _)| r);

        let mut objective = Vec::new();
        let mut objective_constant = 0.0;
        if let Some((expr, _)) = &self.objective {
            let mut objective_sums: FnvHashMap<i64, (f64, u32)> = FnvHashMap::default();
            objective_constant = expr.constant().data().iter().next().copied().unwrap_or(0.0);
            for t in 0..expr.term_len() {
                let coeff = *expr.coeffs().data().iter().nth(t).unwrap_or(&0.0);
                let var_label = *expr.vars().data().iter().nth(t).unwrap_or(&SENTINEL);
                if var_label == SENTINEL {
                    continue;
                }
                let entry = objective_sums.entry(var_label).or_insert((0.0, 0));
                entry.0 += coeff;
                entry.1 += 1;
            }
            for (var, (value, contributions)) in objective_sums {
                if value == 0.0 {
                    if contributions > 1 {
                        log::warn!("to_matrix_view: dropping explicit zero objective coefficient for variable {var} after summing {contributions} contributions");
                    }
                    continue;
                }
                objective.push((var, value));
            }
            objective.sort_by_key(|&(v, _)| v);
        }

        let mut vars = Vec::new();
        let mut lower_bounds = FnvHashMap::default();
        let mut upper_bounds = FnvHashMap::default();
        let mut integer = FnvHashMap::default();
        for family in &self.families {
            let is_integer = matches!(family.kind(), Kind::Integer | Kind::Binary);
            for ((&label, &lo), &hi) in family.labels().data().iter().zip(family.lower().data()).zip(family.upper().data()) {
                if label == SENTINEL {
                    continue;
                }
                vars.push(label);
                lower_bounds.insert(label, lo);
                upper_bounds.insert(label, hi);
                integer.insert(label, is_integer);
            }
        }
        vars.sort_unstable();

        MatrixView {
            n_variables: (self.allocator.next_variable_label() - 1).max(0) as usize,
            n_constraints: (self.allocator.next_constraint_label() - 1).max(0) as usize,
            vars,
            coefficients,
            rows,
            objective,
            objective_constant,
            lower_bounds,
            upper_bounds,
            integer,
        }
    }

    pub fn solve(&self, adapter: &mut impl SolverAdapter) -> Result<SolverResult> {
        let matrix = self.to_matrix_view();
        adapter.solve(&matrix)
    }
}
