// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Host implementations of the sparse single-qubit transform.
//!
//! The dense 2^n x 2^n operator of a single-qubit gate only couples indices that
//! differ in the target bit, so the product decomposes into N/2 independent 2x2
//! products. Every kernel here reads from `input` and writes to a separate
//! `output`, and each pair is written by exactly one unit of work, which is what
//! lets the units run without any synchronization.


use rayon::prelude::*;

use crate::{
    gate::{GateApplication, GateMatrix, TargetBit},
    pairing::partner,
    state_vector::Amplitude,
};

/// Default group size of the host kernel, in units of work.
pub const DEFAULT_HOST_GROUP_SIZE: usize = 4096;

/// The unit of work for amplitude `index`.
///
/// Writes both members of the pair when `index` is the low member and nothing
/// otherwise. This is the same body the WGSL kernel runs per invocation.
#[inline]
pub fn apply_unit(
    index: usize,
    gate: &GateMatrix,
    target: TargetBit,
    input: &[Amplitude],
    output: &mut [Amplitude],
) {
    let other = partner(index, target);
    if other > index {
        let (low, high) = gate.apply_pair(input[index], input[other]);
        output[index] = low;
        output[other] = high;
    }
}

/// Runs every unit of work in index order on the calling thread.
///
/// # Panics
///
/// Panics if the slices differ in length or the target bit does not address a
/// qubit of a power-of-two length state.
pub fn apply_sequential(
    application: &GateApplication,
    input: &[Amplitude],
    output: &mut [Amplitude],
) {
    check_shapes(application.target, input, output);
    for index in 0..input.len() {
        apply_unit(index, &application.gate, application.target, input, output);
    }
}

/// Data-parallel host kernel.
///
/// The vector is split into blocks of `2 << t` amplitudes; the low half of a
/// block pairs element-wise with its high half, so blocks never share a pair.
/// Inside a block the halves are cut into groups, which keeps the work spread
/// over threads even when `t` is the highest bit and there is only one block.
/// `group_size` counts units of work as in [`Launch`](crate::accelerator::Launch);
/// half of them are low members, so a group updates `group_size / 2` pairs.
///
/// # Panics
///
/// Same preconditions as [`apply_sequential`].
pub fn apply_parallel(
    application: &GateApplication,
    input: &[Amplitude],
    output: &mut [Amplitude],
    group_size: usize,
) {
    check_shapes(application.target, input, output);
    let gate = application.gate;
    let stride = application.target.mask();
    let pairs_per_group = pairs_per_group(group_size);

    output
        .par_chunks_mut(stride * 2)
        .zip(input.par_chunks(stride * 2))
        .for_each(|(out_block, in_block)| {
            let (out_low, out_high) = out_block.split_at_mut(stride);
            let (in_low, in_high) = in_block.split_at(stride);
            out_low
                .par_chunks_mut(pairs_per_group)
                .zip(out_high.par_chunks_mut(pairs_per_group))
                .zip(
                    in_low
                        .par_chunks(pairs_per_group)
                        .zip(in_high.par_chunks(pairs_per_group)),
                )
                .for_each(|((out_low, out_high), (in_low, in_high))| {
                    for (((out_low, out_high), &low), &high) in out_low
                        .iter_mut()
                        .zip(out_high.iter_mut())
                        .zip(in_low)
                        .zip(in_high)
                    {
                        (*out_low, *out_high) = gate.apply_pair(low, high);
                    }
                });
        });
}

/// Pairs updated by one host task for a group of `group_size` units of work.
fn pairs_per_group(group_size: usize) -> usize {
    (group_size / 2).max(1)
}

fn check_shapes(target: TargetBit, input: &[Amplitude], output: &[Amplitude]) {
    assert_eq!(
        input.len(),
        output.len(),
        "input and output buffers must have the same length"
    );
    assert!(
        input.len().is_power_of_two() && target.mask() < input.len(),
        "target bit {target} does not address a qubit of a {} amplitude state",
        input.len()
    );
}
