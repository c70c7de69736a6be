use std::ptr::NonNull;

use parking_lot::Mutex;

use crate::memory::MemoryGateway;
use crate::{DeviceError, MapError};

/// Memory gateway backed by plain host allocations, for headless rendering and tests.
#[derive(Debug, Default)]
pub struct HostMemory {
    stats: Mutex<HostMemoryStats>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostMemoryStats {
    pub allocations: usize,
    pub frees: usize,
    pub maps: usize,
    pub unmaps: usize,
    next_id: u64,
}

impl HostMemoryStats {
    pub fn live_allocations(&self) -> usize {
        self.allocations - self.frees
    }
}

#[derive(Debug)]
pub struct HostAllocation {
    id: u64,
    label: String,
    bytes: Box<[u8]>,
    mapped: bool,
}

impl HostAllocation {
    /// Unique per gateway, never reused.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped
    }
}

impl HostMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> HostMemoryStats {
        *self.stats.lock()
    }
}

unsafe impl MemoryGateway for HostMemory {
    type Allocation = HostAllocation;

    fn allocate(&self, label: &str, size: u64) -> Result<HostAllocation, DeviceError> {
        let size = usize::try_from(size).map_err(|_| DeviceError::OutOfMemory)?;
        let mut stats = self.stats.lock();
        let id = stats.next_id;
        stats.next_id += 1;
        stats.allocations += 1;
        Ok(HostAllocation {
            id,
            label: label.to_owned(),
            bytes: vec![0u8; size].into_boxed_slice(),
            mapped: false,
        })
    }

    fn free(&self, allocation: HostAllocation) -> Result<(), DeviceError> {
        if allocation.mapped {
            log::warn!("freeing {} while it is still mapped", allocation.label);
        }
        self.stats.lock().frees += 1;
        Ok(())
    }

    fn map(&self, allocation: &mut HostAllocation, _coherent: bool) -> Result<NonNull<u8>, MapError> {
        if allocation.mapped {
            return Err(MapError::AlreadyMapped);
        }
        let ptr = NonNull::new(allocation.bytes.as_mut_ptr()).ok_or(MapError::NotHostVisible)?;
        allocation.mapped = true;
        self.stats.lock().maps += 1;
        Ok(ptr)
    }

    fn unmap(&self, allocation: &mut HostAllocation) -> Result<(), MapError> {
        if !allocation.mapped {
            return Err(MapError::NotMapped);
        }
        allocation.mapped = false;
        self.stats.lock().unmaps += 1;
        Ok(())
    }
}
