pub use error::*;

mod error;
pub mod host;
pub mod memory;
pub mod render_state;
pub mod uniform_buffer;
#[cfg(feature = "vulkan")]
pub mod vulkan;

#[cfg(feature = "vulkan")]
pub use ash;
#[cfg(feature = "vulkan")]
pub use gpu_allocator;

pub use host::HostMemory;
pub use memory::MemoryGateway;
pub use render_state::{RenderStateSource, RenderSystemState};
pub use uniform_buffer::{
    MatrixUbo, PayloadLayout, UboFrame, UboFrameSet, UniformBufferDescriptor,
    UniformBufferManager,
};
