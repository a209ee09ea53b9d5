// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Index pairing for single-qubit gates.
//!
//! For a target bit `t`, the indices `i` and `i ^ (1 << t)` hold the two
//! amplitudes the gate mixes. The pairing is computed as `i | (1 << t)`, which
//! only yields the real partner for the low member of a pair (bit `t` clear).
//! For a high member it returns the index itself, so a unit of work that only
//! acts when `partner(i) > i` visits each pair exactly once.

use crate::gate::TargetBit;

#[inline]
#[must_use]
pub fn partner(index: usize, target: TargetBit) -> usize {
    index | target.mask()
}

/// True if `index` is the member of its pair with the target bit clear.
#[inline]
#[must_use]
pub fn is_low(index: usize, target: TargetBit) -> bool {
    partner(index, target) > index
}

/// All `(low, high)` pairs of `[0, len)` in increasing order of `low`.
pub fn pairs(len: usize, target: TargetBit) -> impl Iterator<Item = (usize, usize)> {
    (0..len).filter_map(move |index| {
        let other = partner(index, target);
        (other > index).then_some((index, other))
    })
}
