use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use wfp_core::{
    CostMode, CostModel, CpuWavefrontDispatch, FrontierEngine, MazeAlgorithm, MazeSource,
    StepOutcome,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use wfp_maze::BuiltinGenerator;

fn cost_model(size: usize) -> CostModel {
    let raw = BuiltinGenerator::with_seed(42)
        .generate(size, MazeAlgorithm::Kruskal)
        .expect("maze generation");
    let mut rng = StdRng::seed_from_u64(42);
    CostModel::build(&raw, CostMode::Uniform, &mut rng).expect("cost model")
}

// Full searches from (1, 1) to the opposite corner.
fn bench_cpu_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("CPU wavefront search");

    for (size, threshold) in [(63, usize::MAX), (255, usize::MAX), (255, 64)] {
        let model = cost_model(size);
        let grid = model.grid();
        let start = grid.index(1, 1).expect("start in bounds");
        let target = grid.index(size - 2, size - 2).expect("target in bounds");
        group.throughput(Throughput::Elements(grid.open_cells() as u64));

        let label = if threshold == usize::MAX {
            "sequential"
        } else {
            "rayon"
        };
        group.bench_with_input(
            BenchmarkId::new(label, format!("{size}x{size}")),
            &size,
            |b, _| {
                let mut engine = FrontierEngine::new(Box::new(
                    CpuWavefrontDispatch::with_parallel_threshold(threshold),
                ));
                b.iter(|| {
                    engine.init(grid.clone(), start).expect("init");
                    while engine.step(target).expect("step") == StepOutcome::Continue {}
                    black_box(engine.step_count())
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_cpu_search);
criterion_main!(benches);
