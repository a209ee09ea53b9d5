// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::{self, Display, Formatter};

use crate::state_vector::Amplitude;

/// A real 2x2 linear operator
///
/// ```text
/// | a  b |
/// | c  d |
/// ```
///
/// The first row produces the amplitude whose target bit is 0, the second row
/// the amplitude whose target bit is 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GateMatrix {
    pub a: Amplitude,
    pub b: Amplitude,
    pub c: Amplitude,
    pub d: Amplitude,
}

impl GateMatrix {
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 1.0);
    pub const PAULI_X: Self = Self::new(0.0, 1.0, 1.0, 0.0);
    pub const PAULI_Z: Self = Self::new(1.0, 0.0, 0.0, -1.0);
    pub const HADAMARD: Self = Self::new(
        std::f32::consts::FRAC_1_SQRT_2,
        std::f32::consts::FRAC_1_SQRT_2,
        std::f32::consts::FRAC_1_SQRT_2,
        -std::f32::consts::FRAC_1_SQRT_2,
    );

    #[must_use]
    pub const fn new(a: Amplitude, b: Amplitude, c: Amplitude, d: Amplitude) -> Self {
        Self { a, b, c, d }
    }

    #[must_use]
    pub fn determinant(&self) -> Amplitude {
        self.a * self.d - self.b * self.c
    }

    /// Returns the inverse operator, or `None` if the matrix is singular.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some(Self::new(
            self.d / det,
            -self.b / det,
            -self.c / det,
            self.a / det,
        ))
    }

    /// Applies the operator to one (low, high) amplitude pair.
    #[inline]
    #[must_use]
    pub fn apply_pair(&self, low: Amplitude, high: Amplitude) -> (Amplitude, Amplitude) {
        (
            self.a * low + self.b * high,
            self.c * low + self.d * high,
        )
    }
}

impl Display for GateMatrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[[{}, {}], [{}, {}]]", self.a, self.b, self.c, self.d)
    }
}

/// The bit of a basis-state index that selects which amplitudes the gate mixes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetBit(u32);

impl TargetBit {
    /// Largest bit position that still fits in a `u32` shader index.
    pub const MAX: u32 = 31;

    #[must_use]
    pub fn new(bit: u32) -> Option<Self> {
        (bit <= Self::MAX).then_some(Self(bit))
    }

    #[must_use]
    pub fn bit(self) -> u32 {
        self.0
    }

    /// `1 << t`, the distance between the two members of a pair.
    #[must_use]
    pub fn mask(self) -> usize {
        1usize << self.0
    }

    /// True if the bit addresses a qubit of a register with `qubit_count` qubits.
    #[must_use]
    pub fn fits(self, qubit_count: u32) -> bool {
        self.0 < qubit_count
    }
}

impl Display for TargetBit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the transform needs besides the amplitudes themselves.
///
/// Built once per run and never mutated; the orchestrator borrows it for the
/// duration of a single gate application.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GateApplication {
    pub gate: GateMatrix,
    pub target: TargetBit,
}

impl GateApplication {
    #[must_use]
    pub fn new(gate: GateMatrix, target: TargetBit) -> Self {
        Self { gate, target }
    }
}

#[cfg(test)]
mod tests {
    use super::{GateMatrix, TargetBit};

    #[test]
    fn inverse_of_singular_matrix_is_none() {
        assert_eq!(GateMatrix::new(1.0, 2.0, 2.0, 4.0).inverse(), None);
    }

    #[test]
    fn inverse_composes_to_identity() {
        let gate = GateMatrix::new(2.0, 1.0, 1.0, 1.0);
        let inv = gate.inverse().expect("matrix should be invertible");
        let (low, high) = gate.apply_pair(3.0, -5.0);
        let (low, high) = inv.apply_pair(low, high);
        assert!((low - 3.0).abs() < 1e-6);
        assert!((high + 5.0).abs() < 1e-6);
    }

    #[test]
    fn target_bit_rejects_positions_past_u32_index() {
        assert!(TargetBit::new(31).is_some());
        assert!(TargetBit::new(32).is_none());
    }

    #[test]
    fn target_bit_fits_only_below_qubit_count() {
        let t = TargetBit::new(2).expect("valid bit");
        assert!(t.fits(3));
        assert!(!t.fits(2));
        assert_eq!(t.mask(), 4);
    }
}
