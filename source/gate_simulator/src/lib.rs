// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

pub mod accelerator;
pub mod cpu_accelerator;
mod error;
pub mod gate;
pub mod gpu_accelerator;
pub mod input;
pub mod orchestrator;
pub mod output;
pub mod pairing;
pub mod state_vector;
pub mod transform;

use std::io;

pub use accelerator::Accelerator;
pub use cpu_accelerator::CpuAccelerator;
pub use error::{Error, ProblemError};
pub use gate::{GateApplication, GateMatrix, TargetBit};
pub use gpu_accelerator::GpuAccelerator;
pub use input::Problem;
pub use orchestrator::{Backend, Orchestrator, RunConfig};
pub use state_vector::{Amplitude, StateVector};

/// Solves `problem` on the backend selected by `config` and writes the
/// resulting amplitudes to `out`.
///
/// This is the single entry point used by the `qgate` binary: it creates the
/// accelerator, runs one orchestration pass and tears everything down again.
pub fn run<W: io::Write>(config: &RunConfig, problem: &Problem, out: &mut W) -> Result<(), Error> {
    match config.backend {
        Backend::Gpu => {
            let accelerator = GpuAccelerator::new(config.debug_capture)?;
            apply_and_write(&accelerator, config, problem, out)
        }
        Backend::Cpu => apply_and_write(&CpuAccelerator::new(), config, problem, out),
    }
}

/// Runs `problem` on `accelerator` and writes the result to `out`.
///
/// Every accelerator buffer is released before the first byte is written, so
/// `out` receives either the whole vector or nothing.
pub fn apply_and_write<A: Accelerator + ?Sized, W: io::Write>(
    accelerator: &A,
    config: &RunConfig,
    problem: &Problem,
    out: &mut W,
) -> Result<(), Error> {
    let result = Orchestrator::new(accelerator, config).apply(&problem.application, &problem.state)?;
    output::write_amplitudes(out, &result).map_err(|e| Error::Output(e.to_string()))
}
