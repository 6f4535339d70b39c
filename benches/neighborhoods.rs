//! Benchmarks for the hot incremental-update paths: drawing and applying a
//! random move from each neighborhood explorer.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cflp2si::builders;
use cflp2si::instance::{Instance, PreferenceParams};
use cflp2si::neighborhoods::{change, clopen, swap};
use cflp2si::state::SolutionState;

fn random_instance(num_warehouses: usize, num_stores: usize, seed: u64) -> Instance {
    let mut rng = StdRng::seed_from_u64(seed);
    let capacity = (0..num_warehouses)
        .map(|_| rng.gen_range(50..200))
        .collect();
    let fixed_cost = (0..num_warehouses)
        .map(|_| rng.gen_range(10..500))
        .collect();
    let demand = (0..num_stores).map(|_| rng.gen_range(2..20)).collect();
    let supply_cost = (0..num_stores)
        .map(|_| (0..num_warehouses).map(|_| rng.gen_range(1..50)).collect())
        .collect();
    Instance::new(
        capacity,
        fixed_cost,
        demand,
        supply_cost,
        Vec::new(),
        PreferenceParams::default(),
    )
    .expect("random instance is always valid")
}

fn seeded_state(inst: &Instance, seed: u64) -> SolutionState {
    let mut rng = StdRng::seed_from_u64(seed);
    builders::random_state(inst, &mut rng)
}

fn bench_change_random_move(c: &mut Criterion) {
    let mut group = c.benchmark_group("change_random_move");
    for size in [20usize, 50, 100].iter() {
        let inst = random_instance(*size / 2, *size, 1);
        let st = seeded_state(&inst, 2);
        let mut rng = StdRng::seed_from_u64(3);
        group.bench_with_input(BenchmarkId::from_parameter(size), &(&inst, &st), |b, (inst, st)| {
            b.iter(|| black_box(change::random_move(inst, st, &mut rng)))
        });
    }
    group.finish();
}

fn bench_swap_random_move(c: &mut Criterion) {
    let mut group = c.benchmark_group("swap_random_move");
    for size in [20usize, 50, 100].iter() {
        let inst = random_instance(*size / 2, *size, 1);
        let st = seeded_state(&inst, 2);
        let mut rng = StdRng::seed_from_u64(3);
        group.bench_with_input(BenchmarkId::from_parameter(size), &(&inst, &st), |b, (inst, st)| {
            b.iter(|| black_box(swap::random_move(inst, st, 0.44, &mut rng)))
        });
    }
    group.finish();
}

fn bench_clopen_random_move(c: &mut Criterion) {
    let mut group = c.benchmark_group("clopen_random_move");
    for size in [20usize, 50, 100].iter() {
        let inst = random_instance(*size / 2, *size, 1);
        let st = seeded_state(&inst, 2);
        let mut rng = StdRng::seed_from_u64(3);
        group.bench_with_input(BenchmarkId::from_parameter(size), &(&inst, &st), |b, (inst, st)| {
            b.iter(|| black_box(clopen::random_move(inst, st, 0.33, 0.33, &mut rng)))
        });
    }
    group.finish();
}

fn bench_change_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("change_apply");
    for size in [20usize, 50, 100].iter() {
        let inst = random_instance(*size / 2, *size, 1);
        let mut rng = StdRng::seed_from_u64(3);
        group.bench_with_input(BenchmarkId::from_parameter(size), &inst, |b, inst| {
            b.iter_batched(
                || {
                    let st = seeded_state(inst, 2);
                    let mv = change::random_move(inst, &st, &mut rng);
                    (st, mv)
                },
                |(mut st, mv)| change::apply(black_box(inst), &mut st, &mv),
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_change_random_move,
    bench_swap_random_move,
    bench_clopen_random_move,
    bench_change_apply
);
criterion_main!(benches);
