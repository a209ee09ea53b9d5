// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The device-side half of a gate application.
//!
//! An [`Accelerator`] owns memory the host cannot address directly. The
//! orchestrator drives it through allocate, upload, dispatch, download and
//! release; every one of those steps can fail and every failure is fatal for
//! the run.

#[cfg(test)]
mod tests;

use std::fmt::{self, Display, Formatter};

use log::{debug, error};
use miette::Diagnostic;
use thiserror::Error;

use crate::{gate::GateApplication, state_vector::Amplitude};

#[derive(Clone, Debug, Diagnostic, Error, PartialEq, Eq)]
pub enum Error {
    #[error("no usable accelerator: {message}")]
    #[diagnostic(code("QGate.Accelerator.DeviceUnavailable"))]
    #[diagnostic(help("run with `--backend cpu` to use the host accelerator"))]
    DeviceUnavailable { message: String },
    #[error("failed to allocate {label} ({bytes} bytes) on {device}: {message}")]
    #[diagnostic(code("QGate.Accelerator.ResourceExhaustion"))]
    ResourceExhaustion {
        label: &'static str,
        bytes: usize,
        device: String,
        message: String,
    },
    #[error("failed to transfer {label} {direction}: {message}")]
    #[diagnostic(code("QGate.Accelerator.TransferFailure"))]
    TransferFailure {
        label: &'static str,
        direction: TransferDirection,
        message: String,
    },
    #[error("failed to dispatch the gate kernel: {message}")]
    #[diagnostic(code("QGate.Accelerator.DispatchFailure"))]
    DispatchFailure { message: String },
    #[error("failed to release {label}: {message}")]
    #[diagnostic(code("QGate.Accelerator.ReleaseFailure"))]
    #[diagnostic(help("device memory may have leaked"))]
    ReleaseFailure {
        label: &'static str,
        message: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferDirection {
    HostToDevice,
    DeviceToHost,
}

impl Display for TransferDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TransferDirection::HostToDevice => write!(f, "from host to device"),
            TransferDirection::DeviceToHost => write!(f, "from device to host"),
        }
    }
}

/// Dispatch sizing for one run of the transform.
///
/// Group sizes are always counted in units of work, one per amplitude index,
/// on every backend and in every setting that configures them.
/// `group_count * group_size` may exceed `len`; the trailing units of the last
/// group fall outside the vector and must do nothing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Launch {
    pub application: GateApplication,
    pub len: usize,
    pub group_size: u32,
    pub group_count: u32,
}

impl Launch {
    pub fn new(application: GateApplication, len: usize, group_size: u32) -> Result<Self, Error> {
        if group_size == 0 {
            return Err(Error::DispatchFailure {
                message: "group size must be at least 1".to_string(),
            });
        }
        let group_count = u32::try_from(len.div_ceil(group_size as usize)).map_err(|_| {
            Error::DispatchFailure {
                message: format!("{len} units do not fit in groups of {group_size}"),
            }
        })?;
        Ok(Self {
            application,
            len,
            group_size,
            group_count,
        })
    }

    /// Number of units scheduled, including the out-of-range tail.
    #[must_use]
    pub fn scheduled_units(&self) -> usize {
        self.group_count as usize * self.group_size as usize
    }
}

pub trait Accelerator {
    /// Handle to a device-resident array of amplitudes.
    type Buffer;

    /// Human readable name of the device, used in diagnostics.
    fn description(&self) -> String;

    /// Allocates room for `len` amplitudes.
    fn allocate(&self, label: &'static str, len: usize) -> Result<Self::Buffer, Error>;

    /// Copies `data` into `buffer`, blocking until the copy has landed.
    fn upload(&self, buffer: &Self::Buffer, data: &[Amplitude]) -> Result<(), Error>;

    /// Runs the transform from `input` into `output`, blocking until every unit
    /// of work has finished.
    fn dispatch(
        &self,
        launch: &Launch,
        input: &Self::Buffer,
        output: &Self::Buffer,
    ) -> Result<(), Error>;

    /// Copies the first `len` amplitudes of `buffer` back to the host.
    fn download(&self, buffer: &Self::Buffer, len: usize) -> Result<Vec<Amplitude>, Error>;

    fn release(&self, buffer: Self::Buffer) -> Result<(), Error>;
}

/// Scoped ownership of one accelerator allocation.
///
/// Dropping the guard releases the buffer, so early returns and `?` never leak
/// device memory. Errors from that implicit release can only be logged; call
/// [`DeviceBuffer::release`] on the success path so they propagate instead.
pub struct DeviceBuffer<'a, A: Accelerator + ?Sized> {
    accelerator: &'a A,
    label: &'static str,
    buffer: Option<A::Buffer>,
}

impl<'a, A: Accelerator + ?Sized> DeviceBuffer<'a, A> {
    pub fn allocate(accelerator: &'a A, label: &'static str, len: usize) -> Result<Self, Error> {
        let buffer = accelerator.allocate(label, len)?;
        debug!("allocated {label} ({len} amplitudes)");
        Ok(Self {
            accelerator,
            label,
            buffer: Some(buffer),
        })
    }

    #[must_use]
    pub fn handle(&self) -> &A::Buffer {
        self.buffer
            .as_ref()
            .expect("buffer is only taken when the guard is consumed")
    }

    pub fn release(mut self) -> Result<(), Error> {
        match self.buffer.take() {
            Some(buffer) => {
                self.accelerator.release(buffer)?;
                debug!("released {}", self.label);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl<A: Accelerator + ?Sized> Drop for DeviceBuffer<'_, A> {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            match self.accelerator.release(buffer) {
                Ok(()) => debug!("released {} while unwinding", self.label),
                Err(e) => error!("{e}"),
            }
        }
    }
}
