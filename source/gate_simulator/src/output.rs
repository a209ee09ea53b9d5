// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[cfg(test)]
mod tests;

use std::{fmt::Write as _, io};

use crate::state_vector::StateVector;

/// Writes one amplitude per line, in index order, to three decimal places.
pub fn write_amplitudes<W: io::Write>(writer: &mut W, state: &StateVector) -> io::Result<()> {
    for amplitude in state.amplitudes() {
        writeln!(writer, "{amplitude:.3}")?;
    }
    writer.flush()
}

#[must_use]
pub fn format_amplitudes(state: &StateVector) -> String {
    let mut out = String::with_capacity(state.len() * 8);
    for amplitude in state.amplitudes() {
        let _ = writeln!(out, "{amplitude:.3}");
    }
    out
}
