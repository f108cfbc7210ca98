use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pivc_ir::expression::Expression;
use pivc_ir::predicate::Predicate;
use pivc_ir::types::Variable;
use pivc_smt::encoder::encode_formula;
use pivc_smt::predicates::PredicateRegistry;
use pivc_smt::simplify::simplify;

/// `P(x0) && P(x1) && ... && P(x{n-1})` with `P(a) = a >= 0 ==> a + 1 > 0`.
fn predicate_chain(n: usize) -> (PredicateRegistry, Expression) {
    let a = Variable::int("a");
    let body = Expression::var(a.clone())
        .ge(Expression::int(0))
        .implies(Expression::var(a.clone()).add(Expression::int(1)).gt(Expression::int(0)));
    let mut registry = PredicateRegistry::new();
    registry.register(&Predicate::new("P", vec![a], body)).unwrap();

    let goal = (0..n)
        .map(|i| Expression::call("P", vec![Expression::var(Variable::int(format!("x{i}")))]))
        .reduce(Expression::and)
        .unwrap_or(Expression::bool(true));
    (registry, goal)
}

fn bench_encode_predicate_chain_16(c: &mut Criterion) {
    let (registry, goal) = predicate_chain(16);
    c.bench_function("encode_predicate_chain_16", |b| {
        b.iter(|| encode_formula(black_box(&goal), black_box(&registry)))
    });
}

fn bench_encode_predicate_chain_256(c: &mut Criterion) {
    let (registry, goal) = predicate_chain(256);
    c.bench_function("encode_predicate_chain_256", |b| {
        b.iter(|| encode_formula(black_box(&goal), black_box(&registry)))
    });
}

fn bench_simplify_predicate_chain_256(c: &mut Criterion) {
    let (registry, goal) = predicate_chain(256);
    let term = encode_formula(&goal, &registry).unwrap();
    c.bench_function("simplify_predicate_chain_256", |b| {
        b.iter(|| simplify(black_box(&term)))
    });
}

criterion_group!(
    benches,
    bench_encode_predicate_chain_16,
    bench_encode_predicate_chain_256,
    bench_simplify_predicate_chain_256
);
criterion_main!(benches);
