//! Criterion benchmarks for the simulation engine.
//!
//! Run with:
//!   cargo bench
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use neurosim::prelude::*;

fn make_hopfield(n: usize) -> Hopfield {
    let mut h = Hopfield::new(n).expect("nonzero size");
    let pattern: Vec<f64> = (0..n).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
    h.set_pattern(&pattern).expect("pattern length");
    h
}

/// One asynchronous recall sweep at varying network sizes.
fn bench_sweep_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep_size");

    for size in [16, 64, 256, 1024].iter() {
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("seeded_draws", size), size, |b, &size| {
            let mut hopfield = make_hopfield(size);
            b.iter(|| {
                hopfield.update();
                black_box(hopfield.network().neuron_count())
            });
        });

        group.bench_with_input(BenchmarkId::new("permutation", size), size, |b, &size| {
            let mut hopfield = make_hopfield(size);
            hopfield
                .network_mut()
                .set_sweep_order(SweepOrder::Permutation);
            b.iter(|| {
                hopfield.update();
                black_box(hopfield.network().neuron_count())
            });
        });
    }

    group.finish();
}

/// Hebbian outer-product training; quadratic in neuron count.
fn bench_hebbian_train(c: &mut Criterion) {
    let mut group = c.benchmark_group("hebbian_train");

    for size in [16, 64, 256].iter() {
        group.throughput(Throughput::Elements((size * (size - 1)) as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut hopfield = make_hopfield(size);
            b.iter(|| {
                hopfield.train().expect("shared bounds");
                black_box(hopfield.network().synapse_count())
            });
        });
    }

    group.finish();
}

/// One winner-take-all step on a 64-input layer.
fn bench_competitive_train(c: &mut Criterion) {
    let mut group = c.benchmark_group("competitive_train");

    for outputs in [4, 16, 64].iter() {
        group.throughput(Throughput::Elements((64 * outputs) as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(outputs),
            outputs,
            |b, &outputs| {
                let params = CompetitiveParams::default()
                    .with_learning_rate(0.1)
                    .with_normalize_inputs(true);
                let mut net = Competitive::new(64, outputs, params).expect("nonzero layers");
                let pattern: Vec<f64> =
                    (0..64).map(|i| if i % 3 == 0 { 1.0 } else { 0.0 }).collect();
                b.iter(|| black_box(net.train(&pattern).expect("pattern length")));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_sweep_sizes,
    bench_hebbian_train,
    bench_competitive_train
);
criterion_main!(benches);
