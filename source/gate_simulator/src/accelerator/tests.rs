// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use expect_test::expect;

use super::{DeviceBuffer, Error, Launch, TransferDirection};
use crate::{
    cpu_accelerator::CpuAccelerator,
    gate::{GateApplication, GateMatrix, TargetBit},
};

fn identity() -> GateApplication {
    GateApplication::new(GateMatrix::IDENTITY, TargetBit::new(0).expect("valid bit"))
}

#[test]
fn launch_rounds_group_count_up() {
    let launch = Launch::new(identity(), 1000, 64).expect("valid launch");
    assert_eq!(launch.group_count, 16);
    assert_eq!(launch.scheduled_units(), 1024);
}

#[test]
fn launch_with_exact_fit_has_no_tail() {
    let launch = Launch::new(identity(), 256, 64).expect("valid launch");
    assert_eq!(launch.group_count, 4);
    assert_eq!(launch.scheduled_units(), 256);
}

#[test]
fn empty_groups_are_rejected() {
    let err = Launch::new(identity(), 4, 0).expect_err("group size 0");
    assert!(matches!(err, Error::DispatchFailure { .. }));
}

#[test]
fn dropped_guard_releases_buffer() {
    let device = CpuAccelerator::new();
    {
        let _input = DeviceBuffer::allocate(&device, "input", 8).expect("allocation");
        let _output = DeviceBuffer::allocate(&device, "output", 8).expect("allocation");
        assert_eq!(device.live_buffers(), 2);
    }
    assert_eq!(device.live_buffers(), 0);
}

#[test]
fn explicit_release_consumes_guard() {
    let device = CpuAccelerator::new();
    let buffer = DeviceBuffer::allocate(&device, "input", 2).expect("allocation");
    assert_eq!(buffer.handle().len(), 2);
    buffer.release().expect("release should succeed");
    assert_eq!(device.live_buffers(), 0);
}

#[test]
fn error_messages_name_the_failing_step() {
    let errors = [
        Error::ResourceExhaustion {
            label: "output",
            bytes: 64,
            device: "host (4 threads)".to_string(),
            message: "out of memory".to_string(),
        },
        Error::TransferFailure {
            label: "input",
            direction: TransferDirection::HostToDevice,
            message: "lost device".to_string(),
        },
        Error::TransferFailure {
            label: "output",
            direction: TransferDirection::DeviceToHost,
            message: "mapping failed".to_string(),
        },
        Error::ReleaseFailure {
            label: "input",
            message: "unknown buffer".to_string(),
        },
    ];
    let rendered: Vec<String> = errors.iter().map(ToString::to_string).collect();
    expect![[r#"
        [
            "failed to allocate output (64 bytes) on host (4 threads): out of memory",
            "failed to transfer input from host to device: lost device",
            "failed to transfer output from device to host: mapping failed",
            "failed to release input: unknown buffer",
        ]
    "#]]
    .assert_debug_eq(&rendered);
}
