// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.


use std::sync::{
    Mutex, MutexGuard, PoisonError,
    atomic::{AtomicU64, Ordering},
};

use log::debug;
use rustc_hash::FxHashMap;

use crate::{
    accelerator::{Accelerator, Error, Launch, TransferDirection},
    state_vector::Amplitude,
    transform::apply_parallel,
};

/// An accelerator whose "device memory" is ordinary host memory and whose
/// kernel is the rayon host transform.
///
/// It keeps the same allocate / transfer / dispatch / release discipline as a
/// GPU so the orchestrator runs unchanged on machines without one.
#[derive(Debug, Default)]
pub struct CpuAccelerator {
    buffers: Mutex<FxHashMap<u64, Vec<Amplitude>>>,
    next_id: AtomicU64,
    memory_limit: Option<usize>,
}

#[derive(Debug)]
pub struct HostBuffer {
    id: u64,
    label: &'static str,
    len: usize,
}

impl HostBuffer {
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl CpuAccelerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the total bytes that may be allocated at once.
    #[must_use]
    pub fn with_memory_limit(bytes: usize) -> Self {
        Self {
            memory_limit: Some(bytes),
            ..Self::default()
        }
    }

    /// Bytes currently held by live buffers.
    #[must_use]
    pub fn bytes_in_use(&self) -> usize {
        self.buffers()
            .values()
            .map(|b| b.len() * size_of::<Amplitude>())
            .sum()
    }

    #[must_use]
    pub fn live_buffers(&self) -> usize {
        self.buffers().len()
    }

    fn buffers(&self) -> MutexGuard<'_, FxHashMap<u64, Vec<Amplitude>>> {
        self.buffers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Accelerator for CpuAccelerator {
    type Buffer = HostBuffer;

    fn description(&self) -> String {
        format!("host ({} threads)", rayon::current_num_threads())
    }

    fn allocate(&self, label: &'static str, len: usize) -> Result<HostBuffer, Error> {
        let exhausted = |bytes: usize, message: String| Error::ResourceExhaustion {
            label,
            bytes,
            device: self.description(),
            message,
        };
        let bytes = len.checked_mul(size_of::<Amplitude>()).ok_or_else(|| {
            exhausted(usize::MAX, format!("{len} amplitudes overflow the address space"))
        })?;

        if let Some(limit) = self.memory_limit {
            let in_use = self.bytes_in_use();
            if in_use.checked_add(bytes).is_none_or(|total| total > limit) {
                return Err(exhausted(
                    bytes,
                    format!("{in_use} of {limit} bytes already in use"),
                ));
            }
        }

        let mut storage = Vec::new();
        storage
            .try_reserve_exact(len)
            .map_err(|e| exhausted(bytes, e.to_string()))?;
        storage.resize(len, 0.0);

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.buffers().insert(id, storage);
        Ok(HostBuffer { id, label, len })
    }

    fn upload(&self, buffer: &HostBuffer, data: &[Amplitude]) -> Result<(), Error> {
        let failure = |message: String| Error::TransferFailure {
            label: buffer.label,
            direction: TransferDirection::HostToDevice,
            message,
        };
        let mut buffers = self.buffers();
        let storage = buffers
            .get_mut(&buffer.id)
            .ok_or_else(|| failure("buffer is not allocated".to_string()))?;
        if storage.len() != data.len() {
            return Err(failure(format!(
                "buffer holds {} amplitudes but {} were supplied",
                storage.len(),
                data.len()
            )));
        }
        storage.copy_from_slice(data);
        Ok(())
    }

    fn dispatch(&self, launch: &Launch, input: &HostBuffer, output: &HostBuffer) -> Result<(), Error> {
        let failure = |message: String| Error::DispatchFailure { message };
        if input.id == output.id {
            return Err(failure("input and output must be distinct buffers".to_string()));
        }
        if input.len != launch.len || output.len != launch.len {
            return Err(failure(format!(
                "launch covers {} amplitudes but buffers hold {} and {}",
                launch.len, input.len, output.len
            )));
        }
        if !launch.len.is_power_of_two() || launch.application.target.mask() >= launch.len {
            return Err(failure(format!(
                "target bit {} does not address a qubit of a {} amplitude state",
                launch.application.target, launch.len
            )));
        }

        let mut buffers = self.buffers();
        let mut out = buffers
            .remove(&output.id)
            .ok_or_else(|| failure(format!("{} is not allocated", output.label)))?;
        let result = match buffers.get(&input.id) {
            Some(src) => {
                debug!(
                    "host dispatch: {} groups of {} units",
                    launch.group_count, launch.group_size
                );
                apply_parallel(&launch.application, src, &mut out, launch.group_size as usize);
                Ok(())
            }
            None => Err(failure(format!("{} is not allocated", input.label))),
        };
        buffers.insert(output.id, out);
        result
    }

    fn download(&self, buffer: &HostBuffer, len: usize) -> Result<Vec<Amplitude>, Error> {
        let failure = |message: String| Error::TransferFailure {
            label: buffer.label,
            direction: TransferDirection::DeviceToHost,
            message,
        };
        let buffers = self.buffers();
        let storage = buffers
            .get(&buffer.id)
            .ok_or_else(|| failure("buffer is not allocated".to_string()))?;
        storage
            .get(..len)
            .map(<[Amplitude]>::to_vec)
            .ok_or_else(|| failure(format!("buffer holds only {} amplitudes", storage.len())))
    }

    fn release(&self, buffer: HostBuffer) -> Result<(), Error> {
        self.buffers()
            .remove(&buffer.id)
            .map(drop)
            .ok_or(Error::ReleaseFailure {
                label: buffer.label,
                message: "buffer was already released".to_string(),
            })
    }
}
