//! End-to-end scenarios exercising the engine the way a modeler actually
//! would: declare variables, build expressions with broadcasting, attach
//! constraints and an objective, and read back a solver-ready matrix.

use laxis::labeled_array::range_index;
use laxis::{CoordKey, Error, Kind, LinearExpression, Model, Sense, Sign};

fn axis(n: i64) -> Vec<CoordKey> {
    (0..n).map(CoordKey::Int).collect()
}

/// A two-variable, two-constraint LP: matrix view must carry exactly the
/// coefficients, right-hand sides, and signs the model was built from.
#[test]
fn basic_two_constraint_lp_matrix_view() {
    let mut model = Model::new();
    let x = model.add_variables("x", vec![], vec![], 0.0, f64::INFINITY, Kind::Continuous, None).unwrap();
    let y = model.add_variables("y", vec![], vec![], 0.0, f64::INFINITY, Kind::Continuous, None).unwrap();

    let first = model.linexpr(&[(3.0, &x), (7.0, &y)]).unwrap().ge(10.0);
    let first = model.add_constraints("first", first, None).unwrap();
    let second = model.linexpr(&[(5.0, &x), (2.0, &y)]).unwrap().ge(3.0);
    let second = model.add_constraints("second", second, None).unwrap();

    let objective = model.linexpr(&[(1.0, &x), (2.0, &y)]).unwrap();
    model.add_objective(objective, Sense::Minimize, false).unwrap();

    let x_label = x.labels().data().as_slice().unwrap()[0];
    let y_label = y.labels().data().as_slice().unwrap()[0];
    let first_row = first.labels().data().as_slice().unwrap()[0];
    let second_row = second.labels().data().as_slice().unwrap()[0];

    let view = model.to_matrix_view();
    assert_eq!(view.n_variables, 2);
    assert_eq!(view.n_constraints, 2);
    assert_eq!(view.coefficients, vec![(first_row, x_label, 3.0), (first_row, y_label, 7.0), (second_row, x_label, 5.0), (second_row, y_label, 2.0)]);
    assert_eq!(view.rows, vec![(first_row, Sign::Ge, 10.0), (second_row, Sign::Ge, 3.0)]);
    assert_eq!(view.objective, vec![(x_label, 1.0), (y_label, 2.0)]);
}

/// The same two-family LP broadcast over a 10-point axis: row `i` of the
/// first constraint family keeps coefficients `3, 7` on `x[i], y[i]` with a
/// right-hand side that scales with `i`.
#[test]
fn dimensioned_lp_with_per_row_rhs() {
    let mut model = Model::new();
    let time = axis(10);
    let x = model.add_variables("x", vec![Some("time".into())], vec![time.clone()], 0.0, f64::INFINITY, Kind::Continuous, None).unwrap();
    let y = model.add_variables("y", vec![Some("time".into())], vec![time.clone()], 0.0, f64::INFINITY, Kind::Continuous, None).unwrap();

    let factor = laxis::LabeledArray::dense(ndarray::Array::from_shape_fn(10, |i| i as f64).into_dyn(), vec![(Some("time".into()), time.clone())]).unwrap();

    let first_lhs = model.linexpr_rule(vec!["time".to_string()], vec![range_index(10)], |at| {
        let CoordKey::Int(i) = at[0] else { unreachable!() };
        let term = LinearExpression::from_variable(&x).sel("time", &[CoordKey::Int(i)])?.sum(None)? * 3.0;
        let y_term = LinearExpression::from_variable(&y).sel("time", &[CoordKey::Int(i)])?.sum(None)? * 7.0;
        term.checked_add(&y_term)
    }).unwrap();
    let first_rhs = LinearExpression::from_constant(factor.map(|&v| v * 10.0));
    let first = model.add_constraints("first", first_lhs.ge(first_rhs), None).unwrap();

    let second_lhs = model.linexpr_rule(vec!["time".to_string()], vec![range_index(10)], |at| {
        let CoordKey::Int(i) = at[0] else { unreachable!() };
        let term = LinearExpression::from_variable(&x).sel("time", &[CoordKey::Int(i)])?.sum(None)? * 5.0;
        let y_term = LinearExpression::from_variable(&y).sel("time", &[CoordKey::Int(i)])?.sum(None)? * 2.0;
        term.checked_add(&y_term)
    }).unwrap();
    let second_rhs = LinearExpression::from_constant(factor.map(|&v| v * 3.0));
    model.add_constraints("second", second_lhs.ge(second_rhs), None).unwrap();

    let objective = (LinearExpression::from_variable(&x).checked_add(&(LinearExpression::from_variable(&y) * 2.0)).unwrap()).sum(None).unwrap();
    model.add_objective(objective, Sense::Minimize, false).unwrap();

    let view = model.to_matrix_view();
    assert_eq!(view.n_variables, 20);
    assert_eq!(view.n_constraints, 20);

    let i = 3usize;
    let x_label = x.labels().data().as_slice().unwrap()[i];
    let y_label = y.labels().data().as_slice().unwrap()[i];
    let row_label = first.labels().data().as_slice().unwrap()[i];
    let mut row_coefficients: Vec<(i64, f64)> = view.coefficients.iter().filter(|&&(r, _, _)| r == row_label).map(|&(_, c, v)| (c, v)).collect();
    row_coefficients.sort_by_key(|&(c, _)| c);
    let mut expected = vec![(x_label, 3.0), (y_label, 7.0)];
    expected.sort_by_key(|&(c, _)| c);
    assert_eq!(row_coefficients, expected);
    let rhs = view.rows.iter().find(|&&(r, _, _)| r == row_label).unwrap();
    assert_eq!(rhs.2, 10.0 * i as f64);
}

/// Bounds broadcast from two different axes: `lower` varies along `a`,
/// `upper` varies along `b`, and the family takes the union shape `(a, b)`.
#[test]
fn broadcast_bounds_from_different_axes() {
    let mut model = Model::new();
    let lower = laxis::LabeledArray::dense(ndarray::arr1(&[1.0, 1.0]).into_dyn(), vec![(Some("a".into()), axis(2))]).unwrap();
    let upper = laxis::LabeledArray::dense(ndarray::arr1(&[10.0, 12.0]).into_dyn(), vec![(Some("b".into()), axis(2))]).unwrap();

    let v = model.add_variables("v", vec![Some("a".into()), Some("b".into())], vec![axis(2), axis(2)], lower, upper, Kind::Continuous, None).unwrap();

    assert_eq!(v.shape(), &[2, 2]);
    assert_eq!(v.labels().data().len(), 4);

    let family = model.variable_family("v").unwrap();
    assert_eq!(family.lower().data().as_slice().unwrap(), &[1.0, 1.0, 1.0, 1.0]);
    assert_eq!(family.upper().data().as_slice().unwrap(), &[10.0, 12.0, 10.0, 12.0]);
}

/// Time-lag accounting via `.shift`: the boundary term at `t=0` is sentinel,
/// so selecting `time=1..10` out of a 10-point axis keeps exactly 9 live
/// rows.
#[test]
fn shift_diff_constraint_drops_boundary_term() {
    let mut model = Model::new();
    let time = axis(10);
    let y = model.add_variables("y", vec![Some("time".into())], vec![time], 0.0, f64::INFINITY, Kind::Continuous, None).unwrap();

    let previous = LinearExpression::from_variable(&y).shift("time", 1).unwrap();
    let diff = LinearExpression::from_variable(&y).checked_sub(&previous).unwrap();
    let interior: Vec<CoordKey> = (1..10).map(CoordKey::Int).collect();
    let selected = diff.sel("time", &interior).unwrap();

    let constraint = model.add_constraints("lag", selected.le(0.5), None).unwrap();
    assert_eq!(constraint.labels().shape(), &[9]);

    let view = model.to_matrix_view();
    assert_eq!(view.n_constraints, 9);
    assert_eq!(view.rows.len(), 9);
}

/// `force_dim_names` rejects a family declared with an anonymous dimension,
/// even when the bounds are given as a plain positional array.
#[test]
fn force_dim_names_rejects_anonymous_dimension() {
    let mut model = Model::new().with_force_dim_names(true);
    let lower = ndarray::arr1(&[1.0, 2.0]).into_dyn();
    let err = model.add_variables("x", vec![None], vec![axis(2)], lower, 100.0, Kind::Continuous, None).unwrap_err();
    assert!(matches!(err, Error::UnnamedDimension { .. }));
}

/// A rule-built expression over `(i, j)`: odd `i` references the previous
/// row's variable at the same `j`, scaled by `i - 1`; even `i` references
/// its own row scaled by `i`.
#[test]
fn rule_builder_references_shifted_neighbor_label() {
    let mut model = Model::new();
    let j_coords = vec![CoordKey::Str("a".to_string()), CoordKey::Str("b".to_string())];
    let b = model.add_variables("b", vec![Some("i".into()), Some("j".into())], vec![axis(10), j_coords.clone()], 0.0, f64::INFINITY, Kind::Continuous, None).unwrap();

    let expr = model
        .linexpr_rule(vec!["i".to_string(), "j".to_string()], vec![range_index(10), j_coords.into_iter().collect()], |at| {
            let CoordKey::Int(i) = at[0] else { unreachable!() };
            let j = at[1].clone();
            let (source_i, coeff) = if i % 2 == 1 { (i - 1, (i - 1) as f64) } else { (i, i as f64) };
            let point = LinearExpression::from_variable(&b).sel("i", &[CoordKey::Int(source_i)])?.sel("j", &[j])?.sum(None)?;
            Ok(point * coeff)
        })
        .unwrap();

    assert_eq!(expr.outer_dims(), &["i", "j"]);
    assert_eq!(expr.term_len(), 1);

    let b_label_at_2_a = b.labels().data()[[2, 0]];
    let row = expr.vars().data();
    let coeff = expr.coeffs().data();
    // Row-major over (i, j) with j fastest: i=3, j="a" is flat index 3*2+0=6.
    assert_eq!(row[[3, 0, 0]], b_label_at_2_a);
    assert_eq!(coeff[[3, 0, 0]], 2.0);
}

/// A masked constraint family: only the diagonal-ish positions the mask
/// marks `true` get a live row; the rest retire their allocated label as a
/// sentinel and are absent from the matrix view.
#[test]
fn masked_constraint_positions_are_absent_from_matrix_view() {
    let mut model = Model::new();
    let x = model.add_variables("x", vec![Some("i".into())], vec![axis(4)], 0.0, 1.0, Kind::Binary, None).unwrap();
    let mask_data = ndarray::arr1(&[true, false, true, false]).into_dyn();
    let mask = laxis::LabeledArray::dense(mask_data, vec![(Some("i".into()), axis(4))]).unwrap();

    let constraint = LinearExpression::from_variable(&x).le(LinearExpression::scalar_constant(1.0));
    let bound = model.add_constraints("masked", constraint, Some(&mask)).unwrap();

    assert_eq!(bound.constraint_labels().len(), 2);
    let view = model.to_matrix_view();
    assert_eq!(view.rows.len(), 2);
}

/// Removing a constraint family drops it from the matrix view without
/// disturbing other families' labels.
#[test]
fn removed_constraints_disappear_from_matrix_view() {
    let mut model = Model::new();
    let x = model.add_variables("x", vec![Some("i".into())], vec![axis(2)], 0.0, 1.0, Kind::Binary, None).unwrap();
    model.add_constraints("a", LinearExpression::from_variable(&x).le(LinearExpression::scalar_constant(1.0)), None).unwrap();
    model.add_constraints("b", LinearExpression::from_variable(&x).ge(LinearExpression::scalar_constant(0.0)), None).unwrap();

    model.remove_constraints("a").unwrap();

    let view = model.to_matrix_view();
    assert_eq!(view.n_constraints, 4, "retired labels are never reissued");
    assert_eq!(view.rows.len(), 2, "only family `b`'s rows remain live");
}
