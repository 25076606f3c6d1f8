//! `proptest` generators and property tests for the invariants that are
//! easiest to get subtly wrong by hand: monotonic, disjoint label
//! allocation, broadcasting commutativity, and the algebraic laws
//! `LinearExpression` arithmetic is supposed to honor (sum distributes over
//! addition, scalar multiplication associates, shift-then-inverse-shift
//! round-trips).

use crate::allocator::LabelAllocator;
use crate::id::SENTINEL;
use crate::labeled_array::{range_index, LabeledArray};
use crate::linear::LinearExpression;
use crate::model::Model;
use crate::variable::Variable;
use proptest::prelude::*;

/// A fresh variable family of length `n` over dimension `t`, via a
/// throwaway [`Model`] — the only public way to mint variable labels.
fn small_variable(n: usize) -> Variable {
    let mut model = Model::new();
    model.add_variables("x", vec![Some("t".into())], vec![range_index(n).into_iter().collect()], 0.0, 100.0, crate::family::Kind::Continuous, None).expect("valid family")
}

/// Sums an expression's coefficients by variable label, so two expressions
/// that assign the same per-variable weight via differently-ordered terms
/// compare equal.
fn term_map(expr: &LinearExpression) -> std::collections::HashMap<i64, f64> {
    let mut map = std::collections::HashMap::new();
    for (&var, &coeff) in expr.vars().data().iter().zip(expr.coeffs().data().iter()) {
        if var != SENTINEL {
            *map.entry(var).or_insert(0.0) += coeff;
        }
    }
    map
}

/// A small vector of family sizes, used to drive repeated
/// `allocate_variables`/`allocate_constraints` calls.
pub fn family_sizes() -> impl Strategy<Value = Vec<usize>> {
    proptest::collection::vec(1usize..8, 1..6)
}

/// A dense 1-D `f64` array over `dim`, with values in a tame range so sums
/// stay comparable with `ATol::default()`.
pub fn small_vector(dim: &'static str, len: impl Into<proptest::collection::SizeRange>) -> impl Strategy<Value = LabeledArray<f64>> {
    proptest::collection::vec(-100.0f64..100.0, len).prop_map(move |values| {
        let n = values.len();
        LabeledArray::dense(ndarray::Array::from_vec(values).into_dyn(), vec![(Some(dim.to_string()), range_index(n).into_iter().collect())])
            .expect("constructed from matching lengths")
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Invariant: labels issued by one allocator are strictly increasing
    /// and never repeat, across interleaved variable- and constraint-label
    /// requests.
    #[test]
    fn allocator_never_reuses_a_label(sizes in family_sizes()) {
        let mut alloc = LabelAllocator::new();
        let mut seen_variables = std::collections::HashSet::new();
        let mut seen_constraints = std::collections::HashSet::new();
        for &n in &sizes {
            for label in alloc.allocate_variables(n) {
                prop_assert!(seen_variables.insert(label), "variable label {label} reused");
            }
            for label in alloc.allocate_constraints(n) {
                prop_assert!(seen_constraints.insert(label), "constraint label {label} reused");
            }
        }
    }

    /// Invariant: numerically reducing a dimension away (`sum_dim`) matches
    /// a plain fold over the same values regardless of how many elements
    /// the axis has.
    #[test]
    fn sum_dim_matches_plain_fold(values in small_vector("t", 0..8)) {
        let expected: f64 = values.data().iter().sum();
        let reduced = values.sum_dim("t");
        let actual = reduced.data().iter().next().copied().unwrap_or(0.0);
        prop_assert!((actual - expected).abs() < 1e-9);
    }

    /// Invariant: broadcasting two single-axis arrays and summing them
    /// elementwise is commutative regardless of which operand is named
    /// `a` vs `b` in the union-of-dims computation.
    #[test]
    fn broadcast_plan_is_symmetric_up_to_dim_order(
        a_len in 1usize..5,
        b_len in 1usize..5,
    ) {
        let a = LabeledArray::dense(ndarray::Array::from_elem(a_len, 1.0f64).into_dyn(), vec![(Some("a".into()), range_index(a_len).into_iter().collect())]).unwrap();
        let b = LabeledArray::dense(ndarray::Array::from_elem(b_len, 2.0f64).into_dyn(), vec![(Some("b".into()), range_index(b_len).into_iter().collect())]).unwrap();
        let forward = a.zip_with(&b, |x, y| x + y).unwrap();
        let backward = b.zip_with(&a, |x, y| y + x).unwrap();
        prop_assert_eq!(forward.shape().iter().product::<usize>(), backward.shape().iter().product::<usize>());
        prop_assert!(forward.data().iter().all(|&v| (v - 3.0).abs() < 1e-9));
        prop_assert!(backward.data().iter().all(|&v| (v - 3.0).abs() < 1e-9));
    }

    /// Invariant: `(e1 + e2).sum() == e1.sum() + e2.sum()`, up to term order.
    #[test]
    fn sum_distributes_over_add(n in 1usize..6, a in -10.0f64..10.0, b in -10.0f64..10.0) {
        let e1 = LinearExpression::from_variable(&small_variable(n)) * a;
        let e2 = LinearExpression::from_variable(&small_variable(n)) * b;
        let lhs = e1.checked_add(&e2).unwrap().sum(None).unwrap();
        let rhs = e1.sum(None).unwrap().checked_add(&e2.sum(None).unwrap()).unwrap();
        prop_assert_eq!(term_map(&lhs).len(), term_map(&rhs).len());
        for (label, coeff) in term_map(&lhs) {
            let other = *term_map(&rhs).get(&label).unwrap_or(&0.0);
            prop_assert!((coeff - other).abs() < 1e-6);
        }
    }

    /// Invariant: `a*(b*e) == (a*b)*e` structurally after combining.
    #[test]
    fn scalar_multiplication_is_associative(n in 1usize..6, a in -10.0f64..10.0, b in -10.0f64..10.0) {
        let e = LinearExpression::from_variable(&small_variable(n));
        let left = (e.clone() * a) * b;
        let right = e * (a * b);
        for (label, coeff) in term_map(&left) {
            let other = *term_map(&right).get(&label).unwrap_or(&0.0);
            prop_assert!((coeff - other).abs() < 1e-6);
        }
    }

    /// Invariant: shift-by-`k` then shift-by-`(-k)` restores interior
    /// positions pointwise and leaves the rest sentinel.
    #[test]
    fn shift_then_inverse_shift_restores_interior(n in 2usize..8, k in 1i64..4) {
        let k = k.min(n as i64 - 1);
        let expr = LinearExpression::from_variable(&small_variable(n));
        let round_trip = expr.shift("t", k).unwrap().shift("t", -k).unwrap();
        let original = expr.vars().data();
        let restored = round_trip.vars().data();
        let k = k.unsigned_abs() as usize;
        for i in 0..n {
            if i < n - k {
                prop_assert_eq!(restored[[i, 0]], original[[i, 0]]);
            } else {
                prop_assert_eq!(restored[[i, 0]], SENTINEL);
            }
        }
    }
}
