use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use laxis::{CoordKey, Kind, LinearExpression, Model};

fn axis(n: i64) -> Vec<CoordKey> {
    (0..n).map(CoordKey::Int).collect()
}

fn build_variable(n: usize) -> (Model, laxis::Variable) {
    let mut model = Model::new();
    let x = model.add_variables("x", vec![Some("t".into())], vec![axis(n as i64)], 0.0, 1.0, Kind::Continuous, None).unwrap();
    (model, x)
}

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("linear_expression_add");
    for &n in &[8usize, 64, 512, 4096] {
        let (_model, x) = build_variable(n);
        let e1 = LinearExpression::from_variable(&x);
        let e2 = e1.clone() * 2.0;
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| e1.checked_add(&e2).unwrap());
        });
    }
    group.finish();
}

fn bench_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("linear_expression_sum");
    for &n in &[8usize, 64, 512, 4096] {
        let (_model, x) = build_variable(n);
        let expr = LinearExpression::from_variable(&x);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| expr.sum(None).unwrap());
        });
    }
    group.finish();
}

fn bench_to_matrix_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_matrix_view");
    for &n in &[8usize, 64, 512] {
        let (mut model, x) = build_variable(n);
        let expr = LinearExpression::from_variable(&x);
        model.add_constraints("c", expr.le(LinearExpression::scalar_constant(1.0)), None).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| model.to_matrix_view());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_add, bench_sum, bench_to_matrix_view);
criterion_main!(benches);
