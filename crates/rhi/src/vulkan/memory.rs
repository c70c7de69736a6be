use std::ptr::NonNull;
use std::rc::Rc;

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator};
use gpu_allocator::MemoryLocation;
use parking_lot::Mutex;
use typed_builder::TypedBuilder;

use crate::memory::MemoryGateway;
use crate::uniform_buffer::UboFrame;
use crate::vulkan::device::Device;
use crate::{DeviceError, MapError};

// Upper bound of `nonCoherentAtomSize` on every implementation, any flush offset
// aligned to it is aligned to the device's atom size as well.
const NON_COHERENT_ATOM_SIZE_MAX: u64 = 256;

/// Start of the flushed range for an allocation at `offset` inside its memory block.
fn flush_offset(offset: u64) -> u64 {
    offset & !(NON_COHERENT_ATOM_SIZE_MAX - 1)
}

#[derive(Clone, TypedBuilder)]
pub struct VulkanMemoryDescriptor<'a> {
    pub device: &'a Rc<Device>,
    pub allocator: Rc<Mutex<Allocator>>,
    #[builder(default = vk::BufferUsageFlags::UNIFORM_BUFFER)]
    pub buffer_usage: vk::BufferUsageFlags,
}

/// Uniform buffer memory allocated through gpu-allocator.
///
/// Host visible blocks stay persistently mapped by the allocator, so mapping an
/// allocation hands out its slice of the block and unmapping flushes it when the
/// caller did not ask for coherent memory.
pub struct VulkanMemory {
    device: Rc<Device>,
    allocator: Rc<Mutex<Allocator>>,
    buffer_usage: vk::BufferUsageFlags,
}

#[derive(Debug)]
pub struct VulkanAllocation {
    raw: vk::Buffer,
    allocation: Option<Allocation>,
    size: u64,
    /// `Some(coherent)` while mapped.
    mapping: Option<bool>,
}

impl VulkanAllocation {
    pub fn raw(&self) -> vk::Buffer {
        self.raw
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

impl UboFrame<VulkanAllocation> {
    pub fn descriptor_buffer_info(&self) -> vk::DescriptorBufferInfo {
        vk::DescriptorBufferInfo::builder()
            .buffer(self.allocation().raw())
            .offset(0)
            .range(self.size())
            .build()
    }
}

impl VulkanMemory {
    pub fn new(desc: VulkanMemoryDescriptor) -> Self {
        Self {
            device: desc.device.clone(),
            allocator: desc.allocator,
            buffer_usage: desc.buffer_usage,
        }
    }

    fn flush(&self, allocation: &Allocation) -> Result<(), DeviceError> {
        let offset = flush_offset(allocation.offset());
        let range = vk::MappedMemoryRange::builder()
            .memory(unsafe { allocation.memory() })
            .offset(offset)
            .size(vk::WHOLE_SIZE)
            .build();
        unsafe { self.device.flush_mapped_memory_ranges(&[range]) }
    }
}

unsafe impl MemoryGateway for VulkanMemory {
    type Allocation = VulkanAllocation;

    fn allocate(&self, label: &str, size: u64) -> Result<VulkanAllocation, DeviceError> {
        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(self.buffer_usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let raw = self.device.create_buffer(&buffer_info)?;
        let requirements = self.device.get_buffer_memory_requirements(raw);

        let allocation = self.allocator.lock().allocate(&AllocationCreateDesc {
            name: label,
            requirements,
            location: MemoryLocation::CpuToGpu,
            linear: true,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        });
        let allocation = match allocation {
            Ok(allocation) => allocation,
            Err(e) => {
                log::error!("gpu-allocator failed to allocate {label}: {e}");
                self.device.destroy_buffer(raw);
                return Err(DeviceError::Allocation(e.to_string()));
            }
        };

        let bound = unsafe {
            self.device
                .bind_buffer_memory(raw, allocation.memory(), allocation.offset())
        };
        if let Err(e) = bound {
            if let Err(free_error) = self.allocator.lock().free(allocation) {
                log::error!("failed to free {label}: {free_error}");
            }
            self.device.destroy_buffer(raw);
            return Err(e);
        }
        unsafe { self.device.set_object_name(vk::ObjectType::BUFFER, raw, label) };

        Ok(VulkanAllocation {
            raw,
            allocation: Some(allocation),
            size,
            mapping: None,
        })
    }

    fn free(&self, mut allocation: VulkanAllocation) -> Result<(), DeviceError> {
        let result = match allocation.allocation.take() {
            Some(memory) => self
                .allocator
                .lock()
                .free(memory)
                .map_err(|e| DeviceError::Allocation(e.to_string())),
            None => Ok(()),
        };
        self.device.destroy_buffer(allocation.raw);
        result
    }

    fn map(&self, allocation: &mut VulkanAllocation, coherent: bool) -> Result<NonNull<u8>, MapError> {
        if allocation.mapping.is_some() {
            return Err(MapError::AlreadyMapped);
        }
        let memory = allocation.allocation.as_ref().ok_or(MapError::NotHostVisible)?;
        if memory.size() < allocation.size {
            return Err(MapError::Device(DeviceError::OutOfMemory));
        }
        let ptr = memory.mapped_ptr().ok_or(MapError::NotHostVisible)?;
        allocation.mapping = Some(coherent);
        Ok(ptr.cast())
    }

    fn unmap(&self, allocation: &mut VulkanAllocation) -> Result<(), MapError> {
        let coherent = allocation.mapping.take().ok_or(MapError::NotMapped)?;
        if coherent {
            return Ok(());
        }
        match &allocation.allocation {
            Some(memory) => Ok(self.flush(memory)?),
            None => Err(MapError::NotHostVisible),
        }
    }
}
