pub mod device;
pub mod memory;

pub use device::Device;
pub use memory::{VulkanAllocation, VulkanMemory, VulkanMemoryDescriptor};
