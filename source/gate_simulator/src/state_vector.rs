// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::{error::ProblemError, gate::TargetBit};

/// One real coefficient of the state, indexed by basis-state number.
///
/// Single precision so the host kernel and the WGSL kernel compute the same bits.
pub type Amplitude = f32;

/// Host-resident amplitudes of an n-qubit register, `len() == 2^n`, n >= 1.
///
/// This copy is always the source of truth. Accelerator copies are created from
/// it and results come back as a new `StateVector`; the input is never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct StateVector {
    amplitudes: Vec<Amplitude>,
}

#[allow(clippy::len_without_is_empty)]
impl StateVector {
    /// Largest supported length: shader indices are `u32`.
    pub const MAX_LEN: usize = 1 << 31;

    pub fn new(amplitudes: Vec<Amplitude>) -> Result<Self, ProblemError> {
        let len = amplitudes.len();
        if len < 2 {
            return Err(ProblemError::TooFewAmplitudes { len });
        }
        if !len.is_power_of_two() {
            return Err(ProblemError::LengthNotPowerOfTwo { len });
        }
        if len > Self::MAX_LEN {
            return Err(ProblemError::TooManyAmplitudes { len });
        }
        Ok(Self { amplitudes })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.amplitudes.len()
    }

    /// n, where `len() == 2^n`.
    #[must_use]
    pub fn qubit_count(&self) -> u32 {
        self.amplitudes.len().trailing_zeros()
    }

    /// Size of the amplitude storage in bytes, as allocated on an accelerator.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.amplitudes.len() * size_of::<Amplitude>()
    }

    #[must_use]
    pub fn amplitudes(&self) -> &[Amplitude] {
        &self.amplitudes
    }

    #[must_use]
    pub fn into_amplitudes(self) -> Vec<Amplitude> {
        self.amplitudes
    }

    /// Checks that `target` addresses one of this register's qubits.
    pub fn check_target(&self, target: TargetBit) -> Result<(), ProblemError> {
        if target.fits(self.qubit_count()) {
            Ok(())
        } else {
            Err(ProblemError::TargetOutOfRange {
                target: u64::from(target.bit()),
                qubit_count: self.qubit_count(),
            })
        }
    }
}
