// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use bytemuck::{Pod, Zeroable};

use crate::accelerator::Launch;

/// 64 invocations keeps every lane busy on both 32- and 64-wide hardware.
pub const DEFAULT_THREADS_PER_WORKGROUP: u32 = 64;

/// WebGPU default for `max_compute_workgroups_per_dimension`.
pub const MAX_WORKGROUPS_PER_DIMENSION: u32 = 65535;

/// Size of the WGSL `f32` the amplitudes are stored as.
pub const SIZEOF_AMPLITUDE: u64 = 4;

// Keep in sync with `GateParams` in apply_gate.wgsl
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GateParams {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub target_mask: u32,
    pub len: u32,
    pub _padding: [u32; 2],
}

impl GateParams {
    /// Packs a launch into the uniform layout, or `None` if an index would
    /// not fit in the shader's `u32`.
    #[must_use]
    pub fn from_launch(launch: &Launch) -> Option<Self> {
        let gate = launch.application.gate;
        Some(Self {
            a: gate.a,
            b: gate.b,
            c: gate.c,
            d: gate.d,
            target_mask: u32::try_from(launch.application.target.mask()).ok()?,
            len: u32::try_from(launch.len).ok()?,
            _padding: [0; 2],
        })
    }
}

/// Shape of the dispatch grid for `group_count` workgroups.
///
/// Counts above the per-dimension limit fold into rows; the kernel recovers the
/// linear group index as `y * groups_per_row + x` and bounds-checks the result.
#[must_use]
pub fn workgroup_grid(group_count: u32, max_per_dimension: u32) -> Option<(u32, u32)> {
    if group_count == 0 || max_per_dimension == 0 {
        return None;
    }
    let x = group_count.min(max_per_dimension);
    let y = group_count.div_ceil(x);
    (y <= max_per_dimension).then_some((x, y))
}
