// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.


use std::time::Instant;

use log::{debug, info, warn};

use crate::{
    accelerator::{Accelerator, DeviceBuffer, Launch},
    error::Error,
    gate::GateApplication,
    gpu_accelerator::shader_types::DEFAULT_THREADS_PER_WORKGROUP,
    state_vector::StateVector,
    transform::DEFAULT_HOST_GROUP_SIZE,
};

/// Overrides the dispatch group size when no explicit size is configured.
pub const WORKGROUP_SIZE_ENV: &str = "QGATE_WORKGROUP_SIZE";

/// When set, the wgpu device records a graphics-debugger capture of the run.
pub const GPU_CAPTURE_ENV: &str = "QGATE_GPU_CAPTURE";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    #[default]
    Gpu,
    Cpu,
}

impl Backend {
    #[must_use]
    pub fn default_group_size(self) -> u32 {
        match self {
            Backend::Gpu => DEFAULT_THREADS_PER_WORKGROUP,
            Backend::Cpu => u32::try_from(DEFAULT_HOST_GROUP_SIZE).unwrap_or(u32::MAX),
        }
    }
}

/// Settings for one run, fixed before the accelerator is created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunConfig {
    pub backend: Backend,
    /// Units of work per group; the backend's default when `None`.
    pub workgroup_size: Option<u32>,
    pub debug_capture: bool,
}

impl RunConfig {
    /// Builds a config for `backend`, filling anything not given explicitly
    /// from the environment.
    #[must_use]
    pub fn from_env(backend: Backend, workgroup_size: Option<u32>) -> Self {
        let workgroup_size = workgroup_size.or_else(|| {
            let value = std::env::var(WORKGROUP_SIZE_ENV).ok()?;
            match value.parse() {
                Ok(size) => Some(size),
                Err(e) => {
                    warn!("ignoring {WORKGROUP_SIZE_ENV}={value}: {e}");
                    None
                }
            }
        });
        Self {
            backend,
            workgroup_size,
            debug_capture: std::env::var(GPU_CAPTURE_ENV).is_ok(),
        }
    }

    #[must_use]
    pub fn group_size(&self) -> u32 {
        self.workgroup_size
            .unwrap_or_else(|| self.backend.default_group_size())
    }
}

/// Drives one gate application through an accelerator.
///
/// The host state is never modified. Every buffer acquired during
/// [`Orchestrator::apply`] is released before it returns, whether it succeeds
/// or not, and a failed run produces no amplitudes at all.
pub struct Orchestrator<'a, A: Accelerator + ?Sized> {
    accelerator: &'a A,
    config: RunConfig,
}

impl<'a, A: Accelerator + ?Sized> Orchestrator<'a, A> {
    pub fn new(accelerator: &'a A, config: &RunConfig) -> Self {
        Self {
            accelerator,
            config: *config,
        }
    }

    pub fn apply(
        &self,
        application: &GateApplication,
        state: &StateVector,
    ) -> Result<StateVector, Error> {
        state.check_target(application.target)?;
        let len = state.len();
        let start = Instant::now();
        debug!(
            "applying {} to qubit {} of {len} amplitudes on {}",
            application.gate,
            application.target,
            self.accelerator.description()
        );

        let input = DeviceBuffer::allocate(self.accelerator, "input", len)?;
        let output = DeviceBuffer::allocate(self.accelerator, "output", len)?;

        self.accelerator.upload(input.handle(), state.amplitudes())?;
        debug!("uploaded {} bytes", state.byte_len());

        let launch = Launch::new(*application, len, self.config.group_size())?;
        debug!(
            "dispatching {} groups of {} units",
            launch.group_count, launch.group_size
        );
        self.accelerator
            .dispatch(&launch, input.handle(), output.handle())?;

        let amplitudes = self.accelerator.download(output.handle(), len)?;
        debug!("downloaded {len} amplitudes");

        // Release explicitly so a failure here is reported rather than only logged
        input.release()?;
        output.release()?;

        let result = StateVector::new(amplitudes)?;
        info!(
            "applied gate to {len} amplitudes on {} in {:?}",
            self.accelerator.description(),
            start.elapsed()
        );
        Ok(result)
    }
}
