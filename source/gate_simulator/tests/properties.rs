// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use proptest::prelude::*;
use qgate_simulator::{
    Backend, CpuAccelerator, GateApplication, GateMatrix, Orchestrator, ProblemError, RunConfig,
    StateVector, TargetBit,
    pairing::pairs,
    transform::{apply_parallel, apply_sequential},
};

/// A state of 1 to 8 qubits together with a target bit inside it.
fn state_and_target() -> impl Strategy<Value = (Vec<f32>, u32)> {
    (1..=8u32).prop_flat_map(|n| {
        (
            prop::collection::vec(-10.0f32..10.0, 1usize << n),
            0..n,
        )
    })
}

fn gate() -> impl Strategy<Value = GateMatrix> {
    (-2.0f32..2.0, -2.0f32..2.0, -2.0f32..2.0, -2.0f32..2.0)
        .prop_map(|(a, b, c, d)| GateMatrix::new(a, b, c, d))
}

fn application(gate: GateMatrix, target: u32) -> GateApplication {
    GateApplication::new(gate, TargetBit::new(target).expect("strategy keeps targets small"))
}

fn sequential(app: &GateApplication, input: &[f32]) -> Vec<f32> {
    let mut output = vec![0.0; input.len()];
    apply_sequential(app, input, &mut output);
    output
}

proptest! {
    #[test]
    fn identity_is_exact((input, target) in state_and_target()) {
        let app = application(GateMatrix::IDENTITY, target);
        prop_assert_eq!(sequential(&app, &input), input);
    }

    #[test]
    fn pairs_cover_every_index_once((input, target) in state_and_target()) {
        let mut seen = vec![0u8; input.len()];
        let target = TargetBit::new(target).expect("small target");
        for (low, high) in pairs(input.len(), target) {
            prop_assert!(low < high);
            prop_assert_eq!(high - low, target.mask());
            seen[low] += 1;
            seen[high] += 1;
        }
        prop_assert!(seen.iter().all(|&count| count == 1));
    }

    #[test]
    fn transform_is_linear(
        (x, target) in state_and_target(),
        gate in gate(),
        scale in -3.0f32..3.0,
        seed in any::<u64>(),
    ) {
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
        let y: Vec<f32> = (0..x.len())
            .map(|i| ((seed.rotate_left(i as u32 % 64) % 2000) as f32) / 100.0 - 10.0)
            .collect();
        let app = application(gate, target);
        let combined: Vec<f32> = x.iter().zip(&y).map(|(x, y)| scale * x + y).collect();

        let expected: Vec<f32> = sequential(&app, &x)
            .iter()
            .zip(sequential(&app, &y))
            .map(|(tx, ty)| scale * tx + ty)
            .collect();
        for (actual, expected) in sequential(&app, &combined).iter().zip(expected) {
            prop_assert!((actual - expected).abs() <= 1e-3, "{} != {}", actual, expected);
        }
    }

    #[test]
    fn parallel_agrees_with_sequential(
        (input, target) in state_and_target(),
        gate in gate(),
        group_size in 1usize..300,
    ) {
        let app = application(gate, target);
        let mut output = vec![f32::NAN; input.len()];
        apply_parallel(&app, &input, &mut output, group_size);
        prop_assert_eq!(output, sequential(&app, &input));
    }

    #[test]
    fn host_orchestration_agrees_with_reference(
        (input, target) in state_and_target(),
        gate in gate(),
        group_size in 1u32..64,
    ) {
        let app = application(gate, target);
        let config = RunConfig {
            backend: Backend::Cpu,
            workgroup_size: Some(group_size),
            debug_capture: false,
        };
        let device = CpuAccelerator::new();
        let state = StateVector::new(input.clone()).expect("power-of-two length");
        let result = Orchestrator::new(&device, &config)
            .apply(&app, &state)
            .expect("host run should succeed");
        let expected = sequential(&app, &input);
        prop_assert_eq!(result.amplitudes(), expected.as_slice());
        prop_assert_eq!(device.live_buffers(), 0);
    }
}

proptest! {
    #[test]
    fn lengths_other_than_powers_of_two_are_rejected(len in 3usize..512) {
        prop_assume!(!len.is_power_of_two());
        prop_assert_eq!(
            StateVector::new(vec![0.0; len]),
            Err(ProblemError::LengthNotPowerOfTwo { len })
        );
    }
}
