use std::rc::Rc;

use typed_builder::TypedBuilder;

use crate::memory::{MappedFrame, MemoryGateway};
use crate::uniform_buffer::frame::{UboFrame, UboFrameSet};
use crate::uniform_buffer::layout::PayloadLayout;
use crate::{MapError, UniformBufferError};

#[derive(TypedBuilder)]
pub struct UniformBufferDescriptor<'a, G> {
    #[builder(default = "Uniform Buffer")]
    pub label: &'a str,
    pub gateway: Rc<G>,
    pub layout: PayloadLayout,
    /// Whether host writes are visible to the device without an explicit flush.
    #[builder(default = false)]
    pub coherent: bool,
}

/// A uniform buffer with one backing allocation per swapchain image.
///
/// The frame set is created explicitly with [`ensure_created`](Self::ensure_created)
/// and destroyed with [`teardown`](Self::teardown) whenever the swapchain is recreated.
/// [`update`](Self::update) creates it on first use when it is still empty.
pub struct UniformBufferManager<G: MemoryGateway> {
    label: String,
    gateway: Rc<G>,
    layout: PayloadLayout,
    frames: UboFrameSet<G::Allocation>,
    coherent: bool,
}

impl<G: MemoryGateway> UniformBufferManager<G> {
    pub fn new(desc: UniformBufferDescriptor<G>) -> Result<Self, UniformBufferError> {
        if desc.layout.is_empty() || desc.layout.size() == 0 {
            return Err(UniformBufferError::EmptyPayload);
        }
        Ok(Self {
            label: desc.label.to_owned(),
            gateway: desc.gateway,
            layout: desc.layout,
            frames: UboFrameSet::default(),
            coherent: desc.coherent,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn layout(&self) -> &PayloadLayout {
        &self.layout
    }

    /// Payload size in bytes, fixed for the life of the manager.
    pub fn size(&self) -> u64 {
        self.layout.size()
    }

    pub fn gateway(&self) -> &Rc<G> {
        &self.gateway
    }

    pub fn is_created(&self) -> bool {
        !self.frames.is_empty()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[UboFrame<G::Allocation>] {
        self.frames.as_slice()
    }

    /// Allocates one frame per swapchain image if the frame set is empty.
    ///
    /// Calling it again with the same `image_count` keeps the existing frames. A
    /// different count is rejected, [`teardown`](Self::teardown) has to run first.
    pub fn ensure_created(&mut self, image_count: usize) -> Result<(), UniformBufferError> {
        if image_count == 0 {
            return Err(UniformBufferError::ZeroImageCount);
        }
        if self.is_created() {
            let created = self.frames.len();
            if created != image_count {
                return Err(UniformBufferError::FrameCountMismatch {
                    created,
                    requested: image_count,
                });
            }
            return Ok(());
        }

        self.frames =
            UboFrameSet::allocate(&*self.gateway, &self.label, image_count, self.layout.size())?;
        Ok(())
    }

    /// Frees every frame. The next [`ensure_created`](Self::ensure_created) or
    /// [`update`](Self::update) allocates a fresh set.
    pub fn teardown(&mut self) -> Result<(), UniformBufferError> {
        if !self.is_created() {
            return Ok(());
        }
        let count = self.frames.len();
        self.frames.release(&*self.gateway)?;
        log::debug!("{}: {count} frames destroyed.", self.label);
        Ok(())
    }

    /// Writes one frame's payload.
    ///
    /// `values` holds the raw bytes of every layout field, in layout order. They are
    /// checked before anything is mapped, so a rejected payload leaves the frame
    /// untouched. An empty frame set is created with `image_count` frames; a set
    /// created for a different count is rejected with
    /// [`FrameCountMismatch`](UniformBufferError::FrameCountMismatch) until it is torn down.
    ///
    /// The caller must only pass an `image_index` whose previous submission the device
    /// has finished reading.
    pub fn update(
        &mut self,
        image_index: usize,
        image_count: usize,
        values: &[&[u8]],
    ) -> Result<(), UniformBufferError> {
        profiling::scope!("UniformBufferManager::update");

        self.check_values(values)?;
        self.ensure_created(image_count)?;

        let len = self.frames.len();
        let frame = self
            .frames
            .get_mut(image_index)
            .ok_or(UniformBufferError::OutOfRange {
                index: image_index,
                len,
            })?;
        let size = frame.size() as usize;

        let gateway = &*self.gateway;
        let mapping_error = |source: MapError| {
            log::error!("{}: mapping frame {image_index} failed: {source}", self.label);
            UniformBufferError::Mapping {
                index: image_index,
                source,
            }
        };

        let mut mapped = MappedFrame::map(gateway, frame.allocation_mut(), size, self.coherent)
            .map_err(mapping_error)?;
        for (field, bytes) in self.layout.fields().iter().zip(values) {
            mapped.write(field.offset as usize, bytes);
        }
        mapped.unmap().map_err(mapping_error)
    }

    fn check_values(&self, values: &[&[u8]]) -> Result<(), UniformBufferError> {
        let fields = self.layout.fields();
        if values.len() != fields.len() {
            return Err(UniformBufferError::PayloadMismatch(format!(
                "expected {} field values, got {}",
                fields.len(),
                values.len()
            )));
        }
        for (field, bytes) in fields.iter().zip(values) {
            if bytes.len() as u64 != field.size {
                return Err(UniformBufferError::PayloadMismatch(format!(
                    "field `{}` takes {} bytes, got {}",
                    field.name,
                    field.size,
                    bytes.len()
                )));
            }
        }
        Ok(())
    }
}

impl<G: MemoryGateway> Drop for UniformBufferManager<G> {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            log::error!("{}: failed to free frames: {e}", self.label);
        }
    }
}
