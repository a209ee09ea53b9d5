// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use qgate_simulator::{
    GateApplication, GateMatrix, TargetBit,
    transform::{DEFAULT_HOST_GROUP_SIZE, apply_parallel, apply_sequential},
};
use std::hint::black_box;

const NUM_QUBITS: u32 = 20;

#[allow(clippy::cast_precision_loss)]
fn state() -> Vec<f32> {
    (0..1usize << NUM_QUBITS)
        .map(|i| ((i * 7919) % 1000) as f32 / 1000.0)
        .collect()
}

fn host_kernels(c: &mut Criterion) {
    let input = state();
    let mut output = vec![0.0; input.len()];
    let mut group = c.benchmark_group("apply_gate 2^20");
    group.sample_size(20);
    // Lowest, middle and highest bits give very different block shapes
    for target in [0, NUM_QUBITS / 2, NUM_QUBITS - 1] {
        let application = GateApplication::new(
            GateMatrix::HADAMARD,
            TargetBit::new(target).expect("target is below 31"),
        );
        group.bench_with_input(
            BenchmarkId::new("sequential", target),
            &application,
            |b, application| {
                b.iter(|| apply_sequential(application, black_box(&input), &mut output));
            },
        );
        group.bench_with_input(
            BenchmarkId::new("parallel", target),
            &application,
            |b, application| {
                b.iter(|| {
                    apply_parallel(
                        application,
                        black_box(&input),
                        &mut output,
                        DEFAULT_HOST_GROUP_SIZE,
                    );
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, host_kernels);
criterion_main!(benches);
