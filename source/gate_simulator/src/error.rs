// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use miette::Diagnostic;
use thiserror::Error;

use crate::{accelerator, input};

#[derive(Clone, Debug, Diagnostic, Error, PartialEq)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Input(#[from] input::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Problem(#[from] ProblemError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Accelerator(#[from] accelerator::Error),
    #[error("failed to write the result: {0}")]
    #[diagnostic(code("QGate.Output.WriteFailure"))]
    Output(String),
}

/// A gate application the transform cannot be run on.
#[derive(Clone, Debug, Diagnostic, Error, PartialEq, Eq)]
pub enum ProblemError {
    #[error("state vector has {len} amplitudes, which is not a power of two")]
    #[diagnostic(code("QGate.Problem.LengthNotPowerOfTwo"))]
    LengthNotPowerOfTwo { len: usize },
    #[error("state vector has {len} amplitudes, at least 2 are required")]
    #[diagnostic(code("QGate.Problem.TooFewAmplitudes"))]
    TooFewAmplitudes { len: usize },
    #[error("state vector has {len} amplitudes, more than a u32 index can address")]
    #[diagnostic(code("QGate.Problem.TooManyAmplitudes"))]
    TooManyAmplitudes { len: usize },
    #[error("target bit {target} is out of range for a {qubit_count}-qubit state")]
    #[diagnostic(code("QGate.Problem.TargetOutOfRange"))]
    #[diagnostic(help("the target bit must be less than log2 of the amplitude count"))]
    TargetOutOfRange { target: u64, qubit_count: u32 },
}
