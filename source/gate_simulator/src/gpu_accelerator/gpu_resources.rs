// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::{Mutex, PoisonError};

use bytemuck::{bytes_of, cast_slice};
use futures::executor::block_on;
use log::{debug, info};
use rustc_hash::FxHashMap;
use wgpu::{
    Adapter, BindGroupLayout, Buffer, BufferDescriptor, BufferUsages, CommandBuffer,
    ComputePipeline, ComputePipelineDescriptor, Device, ErrorFilter, PollType, Queue,
    ShaderModule,
};

use super::shader_types::GateParams;

#[derive(Debug)]
pub struct GpuResources {
    adapter: Adapter,
    device: Device,
    queue: Queue,
    bind_group_layout: BindGroupLayout,
    dbg_capture: bool,
    // Pipelines are specialised on the workgroup size, which is baked into the shader source
    kernels: Mutex<FxHashMap<u32, ComputePipeline>>,
}

// Keep the below in sync with the shader bindings in apply_gate.wgsl
const INPUT_BUF_IDX: u32 = 0;
const OUTPUT_BUF_IDX: u32 = 1;
const PARAMS_BUF_IDX: u32 = 2;

impl Drop for GpuResources {
    fn drop(&mut self) {
        if self.dbg_capture {
            unsafe {
                self.device.stop_graphics_debugger_capture();
            }
        }
    }
}

impl GpuResources {
    #[cfg(target_arch = "wasm32")]
    pub fn try_get_adapter() -> Result<Adapter, String> {
        Err("wasm32 is not supported currently".to_string())
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn try_get_adapter() -> Result<Adapter, String> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapters = instance.enumerate_adapters(wgpu::Backends::PRIMARY);

        let score_adapter = |adapter: &Adapter| -> (u32, u32, u32) {
            let info = adapter.get_info();
            let device_score = match info.device_type {
                wgpu::DeviceType::DiscreteGpu => 8,
                wgpu::DeviceType::IntegratedGpu => 4,
                wgpu::DeviceType::VirtualGpu => 2,
                wgpu::DeviceType::Cpu => 1,
                wgpu::DeviceType::Other => 0,
            };
            let backend_score = match info.backend {
                wgpu::Backend::Vulkan | wgpu::Backend::Metal => 2,
                wgpu::Backend::Dx12 => 1,
                _ => 0,
            };
            (
                device_score,
                backend_score,
                adapter.limits().max_storage_buffer_binding_size,
            )
        };

        // Prefer discrete over integrated over software adapters, then Vulkan/Metal over DX12,
        // then the largest storage buffers. Software adapters (e.g. lavapipe) are kept so the
        // GPU path still runs on machines without real hardware.
        adapters
            .into_iter()
            .filter(|a| {
                a.get_downlevel_capabilities()
                    .flags
                    .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS)
            })
            .max_by_key(score_adapter)
            .ok_or_else(|| "No suitable GPU adapter found".to_string())
    }

    pub async fn create(dbg_capture: bool) -> Result<Self, String> {
        let adapter = Self::try_get_adapter()?;
        info!("using GPU adapter {:?}", adapter.get_info());

        let (device, queue): (Device, Queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("qgate GPU simulator"),
                required_features: wgpu::Features::empty(),
                required_limits: adapter.limits(),
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            })
            .await
            .map_err(|e| e.to_string())?;

        if dbg_capture {
            unsafe {
                device.start_graphics_debugger_capture();
            }
        }

        let bind_group_layout = create_bind_group_layout(&device);

        Ok(Self {
            adapter,
            device,
            queue,
            bind_group_layout,
            dbg_capture,
            kernels: Mutex::new(FxHashMap::default()),
        })
    }

    #[must_use]
    pub fn adapter_name(&self) -> String {
        let info = self.adapter.get_info();
        format!("{} ({:?})", info.name, info.backend)
    }

    #[must_use]
    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }

    /// Runs `op` inside validation and out-of-memory error scopes and reports
    /// whatever either of them captured.
    pub fn scoped<T>(&self, op: impl FnOnce() -> T) -> Result<T, String> {
        self.device.push_error_scope(ErrorFilter::OutOfMemory);
        self.device.push_error_scope(ErrorFilter::Validation);
        let value = op();
        let validation = block_on(self.device.pop_error_scope());
        let out_of_memory = block_on(self.device.pop_error_scope());
        match validation.or(out_of_memory) {
            Some(e) => Err(e.to_string()),
            None => Ok(value),
        }
    }

    /// Blocks until all submitted work has completed.
    pub fn wait_idle(&self) -> Result<(), String> {
        self.device
            .poll(PollType::wait_indefinitely())
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    pub fn create_buffer(&self, label: &str, size: u64, usage: BufferUsages) -> Buffer {
        self.device.create_buffer(&BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        })
    }

    pub fn get_kernel(&self, workgroup_size: u32) -> ComputePipeline {
        let mut kernels = self.kernels.lock().unwrap_or_else(PoisonError::into_inner);
        kernels
            .entry(workgroup_size)
            .or_insert_with(|| {
                debug!("compiling apply_gate kernel for workgroup size {workgroup_size}");
                create_kernel(&self.device, &self.bind_group_layout, workgroup_size)
            })
            .clone()
    }

    pub fn create_params_buffer(&self, params: &GateParams) -> Buffer {
        let buffer = self.create_buffer(
            "Gate Params Buffer",
            size_of::<GateParams>() as u64,
            BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        );
        // Lands before the next submit's work, which is the dispatch that reads it
        self.queue.write_buffer(&buffer, 0, bytes_of(params));
        buffer
    }

    pub fn create_bind_group(
        &self,
        input: &Buffer,
        output: &Buffer,
        params: &Buffer,
    ) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Apply Gate Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: INPUT_BUF_IDX,
                    resource: input.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: OUTPUT_BUF_IDX,
                    resource: output.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: PARAMS_BUF_IDX,
                    resource: params.as_entire_binding(),
                },
            ],
        })
    }

    pub fn get_encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }

    pub fn submit_command_buffer(&self, buffer: CommandBuffer) {
        self.queue.submit([buffer]);
    }

    pub fn copy_data_to_gpu(&self, data: &[u8], target: &Buffer) {
        let upload_buffer = self.device.create_buffer(&BufferDescriptor {
            label: Some("Tmp Upload Buffer"),
            size: data.len() as u64,
            usage: BufferUsages::COPY_SRC | BufferUsages::MAP_WRITE,
            mapped_at_creation: true,
        });

        upload_buffer
            .slice(..)
            .get_mapped_range_mut()
            .copy_from_slice(data);
        upload_buffer.unmap();

        // Copy from the upload buffer to the GPU buffer
        let mut encoder = self.get_encoder("Buffer Upload Copy Encoder");
        encoder.copy_buffer_to_buffer(&upload_buffer, 0, target, 0, data.len() as u64);
        self.submit_command_buffer(encoder.finish());
    }

    pub async fn download(&self, source: &Buffer, size: u64) -> Result<Vec<f32>, String> {
        let download = self.device.create_buffer(&BufferDescriptor {
            label: Some("Download buffer"),
            size,
            usage: BufferUsages::COPY_DST | BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self.get_encoder("Download Command Encoder");
        encoder.copy_buffer_to_buffer(source, 0, &download, 0, size);
        self.submit_command_buffer(encoder.finish());

        // Fetching the actual results is a real pain. For details, see:
        // https://github.com/gfx-rs/wgpu/blob/v26/examples/features/src/repeated_compute/mod.rs#L74

        // Cross-platform readback: async map + native poll
        let buffer_slice = download.slice(..);

        let (sender, receiver) = futures::channel::oneshot::channel();

        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        self.wait_idle()?;

        receiver
            .await
            .map_err(|_| "Mapping callback was dropped".to_string())?
            .map_err(|e| format!("Buffer mapping failed: {e}"))?;

        let data = buffer_slice.get_mapped_range();
        let amplitudes: Vec<f32> = cast_slice(&data).to_vec();
        drop(data);
        download.unmap();

        Ok(amplitudes)
    }
}

fn create_bind_group_layout(device: &Device) -> BindGroupLayout {
    let entries = [
        (INPUT_BUF_IDX, wgpu::BufferBindingType::Storage { read_only: true }),
        (OUTPUT_BUF_IDX, wgpu::BufferBindingType::Storage { read_only: false }),
        (PARAMS_BUF_IDX, wgpu::BufferBindingType::Uniform),
    ]
    .into_iter()
    .map(|(binding, ty)| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    })
    .collect::<Vec<_>>();

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Apply gate bind group layout"),
        entries: &entries,
    })
}

fn create_shader_module(device: &Device, workgroup_size: u32) -> ShaderModule {
    let shader_src = include_str!("apply_gate.wgsl")
        .replace("{{WORKGROUP_SIZE}}", &workgroup_size.to_string());

    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Apply Gate Shader Module"),
        source: wgpu::ShaderSource::Wgsl(shader_src.into()),
    })
}

fn create_kernel(
    device: &Device,
    bind_group_layout: &BindGroupLayout,
    workgroup_size: u32,
) -> ComputePipeline {
    let shader_module = create_shader_module(device, workgroup_size);

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Apply gate pipeline layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    device.create_compute_pipeline(&ComputePipelineDescriptor {
        label: Some(&format!("GPU kernel - apply_gate x{workgroup_size}")),
        layout: Some(&pipeline_layout),
        module: &shader_module,
        entry_point: Some("apply_gate"),
        compilation_options: Default::default(),
        cache: None,
    })
}
