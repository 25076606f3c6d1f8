//! Linear expressions over labeled arrays of variables.
//!
//! A `LinearExpression` is a pair of aligned arrays over `outer-dims ∪
//! {term}` — `coeffs: f64` and `vars: i64` (variable-labels, `SENTINEL` for
//! padding) — plus a `constant: f64` array over the outer dims alone. All
//! arithmetic is expressed through [`LabeledArray`]'s broadcast/align
//! primitives; nothing here reaches past that contract into raw indices.

use crate::atol::ATol;
use crate::error::{Error, Result};
use crate::id::{VariableLabel, SENTINEL};
use crate::labeled_array::{range_index, CoordKey, LabeledArray};
use crate::variable::Variable;
use approx::AbsDiffEq;
use std::ops::{Add, Mul, Neg, Sub};

pub(crate) const TERM: &str = "term";

/// A linear combination of variables, broadcast over zero or more named
/// outer dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearExpression {
    coeffs: LabeledArray<f64>,
    vars: LabeledArray<i64>,
    constant: LabeledArray<f64>,
}

impl LinearExpression {
    fn new(coeffs: LabeledArray<f64>, vars: LabeledArray<i64>, constant: LabeledArray<f64>) -> Self {
        debug_assert_eq!(coeffs.dim_names(), vars.dim_names());
        debug_assert_eq!(coeffs.dim_names().last().map(String::as_str), Some(TERM));
        debug_assert_eq!(constant.dim_names(), &coeffs.dim_names()[..coeffs.ndim() - 1]);
        LinearExpression { coeffs, vars, constant }
    }

    /// Assemble a `LinearExpression` from already-aligned parts. Used by the
    /// rule evaluator, which builds each array directly rather than through
    /// the usual arithmetic operators.
    pub(crate) fn from_parts(coeffs: LabeledArray<f64>, vars: LabeledArray<i64>, constant: LabeledArray<f64>) -> Self {
        LinearExpression::new(coeffs, vars, constant)
    }

    /// A constant-only expression (no variable terms).
    pub fn from_constant(constant: LabeledArray<f64>) -> Self {
        let mut dims = constant.dim_names().to_vec();
        let mut coords = constant.coords().to_vec();
        dims.push(TERM.to_string());
        coords.push(range_index(0));
        let mut shape: Vec<usize> = constant.shape().to_vec();
        shape.push(0);
        let coeffs = LabeledArray::new_unchecked(dims.clone(), coords.clone(), ndarray::ArrayD::from_elem(shape.clone(), 0.0));
        let vars = LabeledArray::new_unchecked(dims, coords, ndarray::ArrayD::from_elem(shape, SENTINEL));
        LinearExpression { coeffs, vars, constant }
    }

    pub fn scalar_constant(value: f64) -> Self {
        Self::from_constant(LabeledArray::scalar(value))
    }

    /// A single-term expression referring directly to every member of `var`.
    pub fn from_variable(var: &Variable) -> Self {
        let labels = var.labels();
        let dims = labels.dim_names().to_vec();
        let coords = labels.coords().to_vec();
        let ones = labels.map(|_| 1.0);
        let coeffs = ones.insert_axis_at_end(TERM, CoordKey::Int(0));
        let vars = labels.insert_axis_at_end(TERM, CoordKey::Int(0));
        let constant = LabeledArray::new_unchecked(dims, coords.clone(), ndarray::ArrayD::zeros(labels.shape()));
        LinearExpression::new(coeffs, vars, constant)
    }

    pub fn outer_dims(&self) -> &[String] {
        self.constant.dim_names()
    }

    pub fn term_len(&self) -> usize {
        *self.coeffs.shape().last().unwrap_or(&0)
    }

    pub fn coeffs(&self) -> &LabeledArray<f64> {
        &self.coeffs
    }

    pub fn vars(&self) -> &LabeledArray<i64> {
        &self.vars
    }

    pub fn constant(&self) -> &LabeledArray<f64> {
        &self.constant
    }

    fn concat_term(a: &LinearExpression, b: &LinearExpression) -> Result<(LabeledArray<f64>, LabeledArray<i64>)> {
        let a_outer = &a.coeffs.dim_names()[..a.coeffs.ndim() - 1];
        let b_outer = &b.coeffs.dim_names()[..b.coeffs.ndim() - 1];
        let (dims, coords) = LabeledArray::<f64>::broadcast_plan(a_outer, &a.coeffs.coords()[..a_outer.len()], b_outer, &b.coeffs.coords()[..b_outer.len()])?;
        let a_coeffs = a.coeffs.broadcast_prefix(&dims, &coords, 1);
        let b_coeffs = b.coeffs.broadcast_prefix(&dims, &coords, 1);
        let a_vars = a.vars.broadcast_prefix(&dims, &coords, 1);
        let b_vars = b.vars.broadcast_prefix(&dims, &coords, 1);
        let axis = ndarray::Axis(dims.len());
        let coeffs_data = ndarray::concatenate(axis, &[a_coeffs.view(), b_coeffs.view()]).expect("aligned shapes");
        let vars_data = ndarray::concatenate(axis, &[a_vars.view(), b_vars.view()]).expect("aligned shapes");
        let mut full_dims = dims.clone();
        full_dims.push(TERM.to_string());
        let mut full_coords = coords.clone();
        full_coords.push(range_index(a.term_len() + b.term_len()));
        Ok((
            LabeledArray::new_unchecked(full_dims.clone(), full_coords.clone(), coeffs_data),
            LabeledArray::new_unchecked(full_dims, full_coords, vars_data),
        ))
    }

    pub fn checked_add(&self, other: &LinearExpression) -> Result<LinearExpression> {
        let (coeffs, vars) = Self::concat_term(self, other)?;
        let constant = self.constant.zip_with(&other.constant, |a, b| a + b)?;
        Ok(LinearExpression::new(coeffs, vars, constant))
    }

    pub fn checked_sub(&self, other: &LinearExpression) -> Result<LinearExpression> {
        self.checked_add(&(-other.clone()))
    }

    /// Scale every coefficient by a labeled array of per-outer-coordinate
    /// factors (broadcasting against the outer dims; every term shares the
    /// same factor at a given outer coordinate).
    pub fn scale(&self, factor: &LabeledArray<f64>) -> Result<LinearExpression> {
        let outer_dims = self.outer_dims();
        let outer_coords = &self.coeffs.coords()[..outer_dims.len()];
        let (dims, coords) = LabeledArray::<f64>::broadcast_plan(outer_dims, outer_coords, factor.dim_names(), factor.coords())?;
        let factor_bc = factor.broadcast_to(&dims, &coords);
        let factor_with_term = factor_bc.insert_axis_at_end(TERM, CoordKey::Int(0));
        let self_coeffs = self.coeffs.broadcast_prefix(&dims, &coords, 1);
        let self_vars = self.vars.broadcast_prefix(&dims, &coords, 1);
        let coeffs_data = ndarray::Zip::from(&self_coeffs).and_broadcast(factor_with_term.data()).map_collect(|c, f| c * f);
        let mut term_dims = dims.clone();
        term_dims.push(TERM.to_string());
        let mut term_coords = coords.clone();
        term_coords.push(range_index(self.term_len()));
        let coeffs = LabeledArray::new_unchecked(term_dims.clone(), term_coords.clone(), coeffs_data);
        let vars = LabeledArray::new_unchecked(term_dims, term_coords, self_vars);
        let constant = self.constant.zip_with(&factor_bc, |c, f| c * f)?;
        Ok(LinearExpression::new(coeffs, vars, constant))
    }

    /// Fold one named outer dimension into `term`, or (with `dim = None`)
    /// fold every outer dimension into `term`, collapsing to a single
    /// scalar-outer expression.
    pub fn sum(&self, dim: Option<&str>) -> Result<LinearExpression> {
        match dim {
            Some(TERM) => Err(Error::InvalidReduction { dim: TERM.to_string() }),
            Some(d) => self.sum_one(d),
            None => {
                let mut acc = self.clone();
                for d in self.outer_dims().to_vec() {
                    acc = acc.sum_one(&d)?;
                }
                Ok(acc)
            }
        }
    }

    fn sum_one(&self, dim: &str) -> Result<LinearExpression> {
        if self.coeffs.axis_of(dim).is_none() {
            return Err(Error::DimensionMismatch { dim: dim.to_string() });
        }
        let coeffs = self.coeffs.move_axis_to_end(dim).merge_last_two_axes(TERM);
        let vars = self.vars.move_axis_to_end(dim).merge_last_two_axes(TERM);
        let constant = self.constant.sum_dim(dim);
        Ok(LinearExpression::new(coeffs, vars, constant))
    }

    pub fn shift(&self, dim: &str, k: i64) -> Result<LinearExpression> {
        let coeffs = self.coeffs.shift(dim, k, 0.0)?;
        let vars = self.vars.shift(dim, k, SENTINEL)?;
        let constant = self.constant.shift(dim, k, 0.0)?;
        Ok(LinearExpression::new(coeffs, vars, constant))
    }

    pub fn sel(&self, dim: &str, keys: &[CoordKey]) -> Result<LinearExpression> {
        let coeffs = self.coeffs.select(dim, keys)?;
        let vars = self.vars.select(dim, keys)?;
        let constant = if dim == TERM { self.constant.clone() } else { self.constant.select(dim, keys)? };
        Ok(LinearExpression::new(coeffs, vars, constant))
    }

    pub fn isel(&self, dim: &str, idx: &[usize]) -> Result<LinearExpression> {
        let coeffs = self.coeffs.iselect(dim, idx)?;
        let vars = self.vars.iselect(dim, idx)?;
        let constant = if dim == TERM { self.constant.clone() } else { self.constant.iselect(dim, idx)? };
        Ok(LinearExpression::new(coeffs, vars, constant))
    }

    pub fn le(&self, rhs: impl Into<LinearExpression>) -> crate::constraint::AnonymousConstraint {
        crate::constraint::AnonymousConstraint::new(self.clone(), crate::constraint::Sign::Le, rhs.into())
    }

    pub fn ge(&self, rhs: impl Into<LinearExpression>) -> crate::constraint::AnonymousConstraint {
        crate::constraint::AnonymousConstraint::new(self.clone(), crate::constraint::Sign::Ge, rhs.into())
    }

    pub fn eq(&self, rhs: impl Into<LinearExpression>) -> crate::constraint::AnonymousConstraint {
        crate::constraint::AnonymousConstraint::new(self.clone(), crate::constraint::Sign::Eq, rhs.into())
    }

    /// The distinct, non-sentinel variable-labels this expression refers to.
    pub fn variable_labels(&self) -> Vec<VariableLabel> {
        let mut labels: Vec<i64> = self.vars.data().iter().copied().filter(|&v| v != SENTINEL).collect();
        labels.sort_unstable();
        labels.dedup();
        labels.into_iter().map(VariableLabel::from).collect()
    }
}

/// Compares two expressions in sup-norm over their residual (`self - other`),
/// requiring identical outer shape. Two expressions that assign the same
/// coefficient to a variable via differently-ordered terms compare equal.
impl AbsDiffEq for LinearExpression {
    type Epsilon = ATol;

    fn default_epsilon() -> Self::Epsilon {
        ATol::default()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        if self.outer_dims() != other.outer_dims() {
            return false;
        }
        let Ok(residual) = self.checked_sub(other) else { return false };
        let eps = epsilon.into_inner();
        residual.coeffs.data().iter().all(|&c| c.abs() <= eps) && residual.constant.data().iter().all(|&c| c.abs() <= eps)
    }
}

impl From<f64> for LinearExpression {
    fn from(v: f64) -> Self {
        LinearExpression::scalar_constant(v)
    }
}

impl From<&Variable> for LinearExpression {
    fn from(v: &Variable) -> Self {
        LinearExpression::from_variable(v)
    }
}

impl Add for LinearExpression {
    type Output = LinearExpression;
    fn add(self, rhs: LinearExpression) -> LinearExpression {
        self.checked_add(&rhs).expect("dimension mismatch in +: use checked_add to handle explicitly")
    }
}

impl Sub for LinearExpression {
    type Output = LinearExpression;
    fn sub(self, rhs: LinearExpression) -> LinearExpression {
        self.checked_sub(&rhs).expect("dimension mismatch in -: use checked_sub to handle explicitly")
    }
}

impl Neg for LinearExpression {
    type Output = LinearExpression;
    fn neg(self) -> LinearExpression {
        LinearExpression::new(self.coeffs.map(|c| -c), self.vars, self.constant.map(|c| -c))
    }
}

impl Mul<f64> for LinearExpression {
    type Output = LinearExpression;
    fn mul(self, rhs: f64) -> LinearExpression {
        LinearExpression::new(self.coeffs.map(|c| c * rhs), self.vars, self.constant.map(|c| c * rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::LabelAllocator;
    use crate::bound_spec::BoundSpec;
    use crate::family::Kind;
    use crate::id::FamilyId;

    fn variable(n: usize) -> Variable {
        let mut alloc = LabelAllocator::new();
        let range = alloc.allocate_variables(n);
        let data = ndarray::Array::from_shape_fn(n, |i| range.start + i as i64).into_dyn();
        let labels = LabeledArray::dense(data, vec![(Some("t".into()), (0..n as i64).map(Into::into).collect())]).unwrap();
        let fam = crate::family::VariableFamily::new(FamilyId::from(0), Some("x".into()), labels, BoundSpec::Scalar(0.0), BoundSpec::Scalar(10.0), Kind::Continuous, ATol::default()).unwrap();
        Variable::new(FamilyId::from(0), fam.labels().clone())
    }

    #[test]
    fn adding_expressions_concatenates_terms() {
        let x = variable(3);
        let e1 = LinearExpression::from_variable(&x);
        let e2 = e1.clone() * 2.0;
        let sum = e1.checked_add(&e2).unwrap();
        assert_eq!(sum.term_len(), 2);
    }

    #[test]
    fn sum_over_outer_dim_folds_into_term() {
        let x = variable(4);
        let expr = LinearExpression::from_variable(&x);
        let summed = expr.sum(Some("t")).unwrap();
        assert!(summed.outer_dims().is_empty());
        assert_eq!(summed.term_len(), 4);
    }

    #[test]
    fn sum_over_term_is_rejected() {
        let x = variable(2);
        let expr = LinearExpression::from_variable(&x);
        let err = expr.sum(Some(TERM)).unwrap_err();
        assert!(matches!(err, Error::InvalidReduction { .. }));
    }

    #[test]
    fn negation_flips_coeffs_and_constant() {
        let expr = LinearExpression::scalar_constant(5.0) + LinearExpression::from_variable(&variable(1));
        let neg = -expr.clone();
        assert_eq!(neg.constant().data().iter().copied().next(), Some(-5.0));
        assert_eq!(neg.coeffs().data().iter().copied().next(), Some(-1.0));
    }

    #[test]
    fn abs_diff_eq_ignores_sub_epsilon_drift() {
        use approx::assert_abs_diff_eq;
        let x = variable(1);
        let exact = LinearExpression::from_variable(&x);
        let drifted = exact.clone() * (1.0 + 1e-9);
        assert_abs_diff_eq!(exact, drifted, epsilon = ATol::new(1e-6));
    }

    /// Sums an expression's coefficients by variable label, so two
    /// expressions that assign the same per-variable weight via
    /// differently-ordered terms compare equal.
    fn term_map(expr: &LinearExpression) -> std::collections::HashMap<i64, f64> {
        let mut map = std::collections::HashMap::new();
        for (&var, &coeff) in expr.vars().data().iter().zip(expr.coeffs().data().iter()) {
            if var != SENTINEL {
                *map.entry(var).or_insert(0.0) += coeff;
            }
        }
        map
    }

    fn assert_term_maps_close(a: &LinearExpression, b: &LinearExpression) {
        let (a, b) = (term_map(a), term_map(b));
        assert_eq!(a.len(), b.len(), "different variable sets: {a:?} vs {b:?}");
        for (label, coeff) in &a {
            let other = b.get(label).unwrap_or(&0.0);
            assert!((coeff - other).abs() < 1e-9, "label {label}: {coeff} vs {other}");
        }
    }

    #[test]
    fn sum_distributes_over_add() {
        let e1 = LinearExpression::from_variable(&variable(3)) * 2.0;
        let e2 = LinearExpression::from_variable(&variable(3)) * -1.5;
        let lhs = e1.checked_add(&e2).unwrap().sum(None).unwrap();
        let rhs = e1.sum(None).unwrap().checked_add(&e2.sum(None).unwrap()).unwrap();
        assert_term_maps_close(&lhs, &rhs);
        assert!((lhs.constant().data().iter().next().copied().unwrap_or(0.0) - rhs.constant().data().iter().next().copied().unwrap_or(0.0)).abs() < 1e-9);
    }

    #[test]
    fn scalar_multiplication_is_associative() {
        let e = LinearExpression::from_variable(&variable(2)) + LinearExpression::scalar_constant(4.0);
        let (a, b) = (3.0, -2.0);
        let left = (e.clone() * a) * b;
        let right = e * (a * b);
        assert_term_maps_close(&left, &right);
        assert!((left.constant().data().iter().next().copied().unwrap() - right.constant().data().iter().next().copied().unwrap()).abs() < 1e-9);
    }

    #[test]
    fn shift_then_inverse_shift_restores_expression() {
        let x = variable(5);
        let expr = LinearExpression::from_variable(&x);
        let round_trip = expr.shift("t", 2).unwrap().shift("t", -2).unwrap();
        let original_vars = expr.vars().data();
        let round_trip_vars = round_trip.vars().data();
        for i in 0..3 {
            assert_eq!(round_trip_vars[[i, 0]], original_vars[[i, 0]], "interior position {i} should roundtrip");
        }
        for i in 3..5 {
            assert_eq!(round_trip_vars[[i, 0]], SENTINEL, "position {i} fell outside both shifts and must stay sentinel");
        }
    }
}
