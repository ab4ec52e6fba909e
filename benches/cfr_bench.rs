//! Benchmarks for the CFR algorithms.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cfr_core::cfr::{Algorithm, Solver, SolverConfig};
use cfr_core::games::kuhn::KuhnPoker;

fn kuhn_iteration_benchmark(c: &mut Criterion) {
    for algorithm in [Algorithm::Vanilla, Algorithm::Probing, Algorithm::AverageStrategySampling] {
        let config = SolverConfig::default().with_seed(42);
        let mut solver = Solver::new(KuhnPoker::new(), config).expect("valid config");

        c.bench_function(&format!("kuhn_single_iteration_{}", algorithm.name()), |b| {
            b.iter(|| {
                solver.run_iteration(algorithm).expect("iteration");
                black_box(solver.iteration())
            })
        });
    }
}

fn kuhn_1000_iterations_benchmark(c: &mut Criterion) {
    c.bench_function("kuhn_1000_iterations", |b| {
        b.iter(|| {
            let config = SolverConfig::default()
                .with_iterations(Algorithm::Vanilla, black_box(1000))
                .with_exploitability(false)
                .with_report_playouts(0)
                .with_seed(42);
            let mut solver = Solver::new(KuhnPoker::new(), config).expect("valid config");
            solver.develop_strategies(Algorithm::Vanilla).expect("solve").iterations
        })
    });
}

fn kuhn_best_response_benchmark(c: &mut Criterion) {
    let config = SolverConfig::default().with_seed(42).with_eager_tree(true);
    let solver = Solver::new(KuhnPoker::new(), config).expect("valid config");

    c.bench_function("kuhn_best_response", |b| {
        b.iter(|| black_box(solver.exploitability(0).expect("best response").value()))
    });
}

criterion_group!(
    benches,
    kuhn_iteration_benchmark,
    kuhn_1000_iterations_benchmark,
    kuhn_best_response_benchmark
);
criterion_main!(benches);
