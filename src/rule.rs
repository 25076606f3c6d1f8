//! The rule evaluator: a plain row-major cartesian-product walk
//! over a set of named coordinate axes, calling a user closure once per
//! point and assembling the per-point results back into a single labeled
//! expression or constraint. No reflection, no parallelism — just nested
//! loops with the innermost loop over the last-listed dimension.

use crate::constraint::{AnonymousConstraint, Sign};
use crate::error::{Error, Result};
use crate::id::SENTINEL;
use crate::labeled_array::{range_index, CoordIndex, CoordKey, LabeledArray};
use crate::linear::LinearExpression;
use itertools::Itertools;
use ndarray::{Dimension, IxDyn};

/// Row-major cartesian product of `dim_coords`, one entry per dimension.
/// The last dimension varies fastest.
pub fn cartesian_product(dim_names: &[String], dim_coords: &[Vec<CoordKey>]) -> Result<Vec<Vec<CoordKey>>> {
    for (name, coords) in dim_names.iter().zip(dim_coords) {
        if coords.is_empty() {
            return Err(Error::EmptyCoordinateProduct { dim: name.clone() });
        }
    }
    Ok(dim_coords.iter().map(|c| c.iter().cloned()).multi_cartesian_product().collect())
}

fn stack_expressions(dim_names: Vec<String>, dim_coords: Vec<CoordIndex>, points: Vec<LinearExpression>) -> LinearExpression {
    let shape: Vec<usize> = dim_coords.iter().map(|c| c.len()).collect();
    let max_t = points.iter().map(LinearExpression::term_len).max().unwrap_or(0);

    let mut coeffs_shape = shape.clone();
    coeffs_shape.push(max_t);
    let mut coeffs = ndarray::ArrayD::from_elem(IxDyn(&coeffs_shape), 0.0);
    let mut vars = ndarray::ArrayD::from_elem(IxDyn(&coeffs_shape), SENTINEL);
    let mut constant = ndarray::ArrayD::from_elem(IxDyn(&shape), 0.0);

    for (multi_idx, point) in ndarray::indices(IxDyn(&shape)).into_iter().zip(points.iter()) {
        let base: Vec<usize> = multi_idx.slice().to_vec();
        let c = point.constant().data().iter().next().copied().unwrap_or(0.0);
        constant[IxDyn(&base)] = c;
        for t in 0..point.term_len() {
            let mut full = base.clone();
            full.push(t);
            coeffs[IxDyn(&full)] = point.coeffs().data().iter().nth(t).copied().unwrap_or(0.0);
            vars[IxDyn(&full)] = point.vars().data().iter().nth(t).copied().unwrap_or(SENTINEL);
        }
    }

    let mut term_dims = dim_names.clone();
    term_dims.push(crate::linear::TERM.to_string());
    let mut term_coords = dim_coords.clone();
    term_coords.push(range_index(max_t));
    let coeffs = LabeledArray::new_unchecked(term_dims.clone(), term_coords.clone(), coeffs);
    let vars = LabeledArray::new_unchecked(term_dims, term_coords, vars);
    let constant = LabeledArray::new_unchecked(dim_names, dim_coords, constant);
    LinearExpression::from_parts(coeffs, vars, constant)
}

/// Build a [`LinearExpression`] over the given named axes by calling `f`
/// once per coordinate point of their cartesian product.
pub fn build_expression(
    dim_names: Vec<String>,
    dim_coords: Vec<CoordIndex>,
    mut f: impl FnMut(&[CoordKey]) -> Result<LinearExpression>,
) -> Result<LinearExpression> {
    let raw_coords: Vec<Vec<CoordKey>> = dim_coords.iter().map(|c| c.iter().cloned().collect()).collect();
    let points_coords = cartesian_product(&dim_names, &raw_coords)?;
    let mut points = Vec::with_capacity(points_coords.len());
    for at in &points_coords {
        log::trace!("build_expression: evaluating rule at {at:?}");
        let expr = f(at)?;
        if !expr.outer_dims().is_empty() {
            return Err(Error::RuleArityError { at: at.iter().map(ToString::to_string).collect(), expected: "a scalar-outer LinearExpression" });
        }
        points.push(expr);
    }
    Ok(stack_expressions(dim_names, dim_coords, points))
}

/// Build an [`AnonymousConstraint`] over the given named axes, requiring
/// every point's relation to share the same [`Sign`].
pub fn build_constraint(
    dim_names: Vec<String>,
    dim_coords: Vec<CoordIndex>,
    mut f: impl FnMut(&[CoordKey]) -> Result<AnonymousConstraint>,
) -> Result<AnonymousConstraint> {
    let raw_coords: Vec<Vec<CoordKey>> = dim_coords.iter().map(|c| c.iter().cloned().collect()).collect();
    let points_coords = cartesian_product(&dim_names, &raw_coords)?;
    let mut lhs_points = Vec::with_capacity(points_coords.len());
    let mut rhs_points = Vec::with_capacity(points_coords.len());
    let mut sign: Option<Sign> = None;
    for at in &points_coords {
        log::trace!("build_constraint: evaluating rule at {at:?}");
        let c = f(at)?;
        match sign {
            None => sign = Some(c.sign()),
            Some(s) if s == c.sign() => {}
            Some(_) => {
                return Err(Error::RuleArityError { at: at.iter().map(ToString::to_string).collect(), expected: "a constraint with the same sign as the other points" })
            }
        }
        if !c.lhs().outer_dims().is_empty() || !c.rhs().outer_dims().is_empty() {
            return Err(Error::RuleArityError { at: at.iter().map(ToString::to_string).collect(), expected: "a scalar-outer constraint" });
        }
        lhs_points.push(c.lhs().clone());
        rhs_points.push(c.rhs().clone());
    }
    let sign = sign.unwrap_or(Sign::Eq);
    let lhs = stack_expressions(dim_names.clone(), dim_coords.clone(), lhs_points);
    let rhs = stack_expressions(dim_names, dim_coords, rhs_points);
    Ok(AnonymousConstraint::new(lhs, sign, rhs))
}
