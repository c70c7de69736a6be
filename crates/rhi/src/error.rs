use thiserror::Error;

// VkResult codes: https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/VkResult.html

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum DeviceError {
    #[error("out of memory")]
    OutOfMemory,
    #[error("The logical or physical device has been lost")]
    Lost,
    #[error("allocation failed: {0}")]
    Allocation(String),
    #[error("other reason: {0}")]
    Other(&'static str),
    #[error(transparent)]
    #[cfg(feature = "vulkan")]
    VulkanError(#[from] ash::vk::Result),
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum MapError {
    #[error("memory is not host visible")]
    NotHostVisible,
    #[error("allocation is already mapped")]
    AlreadyMapped,
    #[error("allocation is not mapped")]
    NotMapped,
    #[error(transparent)]
    Device(#[from] DeviceError),
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum UniformBufferError {
    #[error("frame index {index} is out of range, the frame set holds {len} frames")]
    OutOfRange { index: usize, len: usize },
    #[error("failed to map uniform buffer frame {index}: {source}")]
    Mapping {
        index: usize,
        #[source]
        source: MapError,
    },
    #[error("failed to allocate uniform buffer frames: {0}")]
    Allocation(#[from] DeviceError),
    #[error("frame set was created for {created} images but {requested} were requested, tear it down first")]
    FrameCountMismatch { created: usize, requested: usize },
    #[error("image count must be greater than zero")]
    ZeroImageCount,
    #[error("uniform payload layout has no fields")]
    EmptyPayload,
    #[error("payload mismatch: {0}")]
    PayloadMismatch(String),
}
