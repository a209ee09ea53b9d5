// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.


mod gpu_resources;

pub mod shader_types;

use bytemuck::cast_slice;
use futures::executor::block_on;
use log::debug;
use wgpu::BufferUsages;

use crate::{
    accelerator::{Accelerator, Error, Launch, TransferDirection},
    state_vector::Amplitude,
};
use gpu_resources::GpuResources;
use shader_types::{GateParams, SIZEOF_AMPLITUDE, workgroup_grid};

/// See if we can get a GPU adapter on this machine (useful before trying to run tests)
/// Note: This does NOT allocate a device.
pub fn try_create_adapter() -> Result<String, String> {
    Ok(format!("{:?}", GpuResources::try_get_adapter()?.get_info()))
}

/// Runs the transform on a wgpu device.
#[derive(Debug)]
pub struct GpuAccelerator {
    resources: GpuResources,
}

#[derive(Debug)]
pub struct GpuBuffer {
    buffer: wgpu::Buffer,
    label: &'static str,
    len: usize,
}

impl GpuAccelerator {
    pub fn new(dbg_capture: bool) -> Result<Self, Error> {
        let resources = block_on(GpuResources::create(dbg_capture))
            .map_err(|message| Error::DeviceUnavailable { message })?;
        Ok(Self { resources })
    }

    /// Largest amplitude buffer the device can bind, in bytes.
    #[must_use]
    pub fn max_buffer_bytes(&self) -> u64 {
        let limits = self.resources.limits();
        u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size)
    }
}

impl Accelerator for GpuAccelerator {
    type Buffer = GpuBuffer;

    fn description(&self) -> String {
        self.resources.adapter_name()
    }

    fn allocate(&self, label: &'static str, len: usize) -> Result<GpuBuffer, Error> {
        let bytes = len as u64 * SIZEOF_AMPLITUDE;
        let exhausted = |message: String| Error::ResourceExhaustion {
            label,
            bytes: len * size_of::<Amplitude>(),
            device: self.description(),
            message,
        };

        let max_bytes = self.max_buffer_bytes();
        if bytes > max_bytes {
            return Err(exhausted(format!(
                "device buffers are limited to {max_bytes} bytes"
            )));
        }

        // The output buffer is read back, the input buffer is uploaded; give both buffers
        // both copy usages so either can play either role.
        let buffer = self
            .resources
            .scoped(|| {
                self.resources.create_buffer(
                    label,
                    bytes,
                    BufferUsages::STORAGE | BufferUsages::COPY_DST | BufferUsages::COPY_SRC,
                )
            })
            .map_err(exhausted)?;

        Ok(GpuBuffer { buffer, label, len })
    }

    fn upload(&self, buffer: &GpuBuffer, data: &[Amplitude]) -> Result<(), Error> {
        let failure = |message: String| Error::TransferFailure {
            label: buffer.label,
            direction: TransferDirection::HostToDevice,
            message,
        };
        if data.len() != buffer.len {
            return Err(failure(format!(
                "buffer holds {} amplitudes but {} were supplied",
                buffer.len,
                data.len()
            )));
        }

        self.resources
            .scoped(|| self.resources.copy_data_to_gpu(cast_slice(data), &buffer.buffer))
            .map_err(failure)?;
        self.resources.wait_idle().map_err(failure)
    }

    fn dispatch(&self, launch: &Launch, input: &GpuBuffer, output: &GpuBuffer) -> Result<(), Error> {
        let failure = |message: String| Error::DispatchFailure { message };
        let limits = self.resources.limits();

        if launch.group_size > limits.max_compute_invocations_per_workgroup
            || launch.group_size > limits.max_compute_workgroup_size_x
        {
            return Err(failure(format!(
                "workgroup size {} exceeds the device limit of {}",
                launch.group_size,
                limits
                    .max_compute_invocations_per_workgroup
                    .min(limits.max_compute_workgroup_size_x)
            )));
        }
        if input.len != launch.len || output.len != launch.len {
            return Err(failure(format!(
                "launch covers {} amplitudes but buffers hold {} and {}",
                launch.len, input.len, output.len
            )));
        }
        let params = GateParams::from_launch(launch)
            .ok_or_else(|| failure(format!("{} amplitudes exceed u32 indexing", launch.len)))?;
        let (groups_x, groups_y) = workgroup_grid(
            launch.group_count,
            limits.max_compute_workgroups_per_dimension,
        )
        .ok_or_else(|| {
            failure(format!(
                "{} workgroups do not fit in the dispatch grid",
                launch.group_count
            ))
        })?;
        debug!(
            "GPU dispatch: {groups_x}x{groups_y} workgroups of {} invocations",
            launch.group_size
        );

        self.resources
            .scoped(|| {
                let kernel = self.resources.get_kernel(launch.group_size);
                let params_buffer = self.resources.create_params_buffer(&params);
                let bind_group = self.resources.create_bind_group(
                    &input.buffer,
                    &output.buffer,
                    &params_buffer,
                );

                let mut encoder = self.resources.get_encoder("Apply Gate Command Encoder");
                let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("Apply Gate Compute Pass"),
                    timestamp_writes: None,
                });
                compute_pass.set_pipeline(&kernel);
                compute_pass.set_bind_group(0, &bind_group, &[]);
                compute_pass.dispatch_workgroups(groups_x, groups_y, 1);
                drop(compute_pass);

                self.resources.submit_command_buffer(encoder.finish());
            })
            .map_err(failure)?;
        self.resources.wait_idle().map_err(failure)
    }

    fn download(&self, buffer: &GpuBuffer, len: usize) -> Result<Vec<Amplitude>, Error> {
        let failure = |message: String| Error::TransferFailure {
            label: buffer.label,
            direction: TransferDirection::DeviceToHost,
            message,
        };
        if len > buffer.len {
            return Err(failure(format!("buffer holds only {} amplitudes", buffer.len)));
        }

        let size = len as u64 * SIZEOF_AMPLITUDE;
        let amplitudes = self
            .resources
            .scoped(|| block_on(self.resources.download(&buffer.buffer, size)))
            .map_err(failure)?;
        amplitudes.map_err(failure)
    }

    fn release(&self, buffer: GpuBuffer) -> Result<(), Error> {
        let GpuBuffer { buffer, label, .. } = buffer;
        self.resources
            .scoped(|| buffer.destroy())
            .map_err(|message| Error::ReleaseFailure { label, message })
    }
}
