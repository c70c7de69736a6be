use std::rc::Rc;

use math::prelude::*;

use crate::memory::MemoryGateway;
use crate::render_state::RenderStateSource;
use crate::uniform_buffer::layout::PayloadLayout;
use crate::uniform_buffer::manager::{UniformBufferDescriptor, UniformBufferManager};
use crate::UniformBufferError;

pub const MODEL: &str = "model";
pub const VIEW: &str = "view";
pub const PROJECTION: &str = "projection";

/// Model, view and projection matrices, as consumed by the vertex shaders.
pub struct MatrixUbo<G: MemoryGateway> {
    manager: UniformBufferManager<G>,
}

impl<G: MemoryGateway> MatrixUbo<G> {
    pub fn layout() -> PayloadLayout {
        PayloadLayout::builder()
            .std140::<Mat4>(MODEL)
            .std140::<Mat4>(VIEW)
            .std140::<Mat4>(PROJECTION)
            .build()
    }

    pub fn new(label: &str, gateway: Rc<G>, coherent: bool) -> Result<Self, UniformBufferError> {
        let desc = UniformBufferDescriptor::builder()
            .label(label)
            .gateway(gateway)
            .layout(Self::layout())
            .coherent(coherent)
            .build();
        Ok(Self {
            manager: UniformBufferManager::new(desc)?,
        })
    }

    pub fn manager(&self) -> &UniformBufferManager<G> {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut UniformBufferManager<G> {
        &mut self.manager
    }

    /// Writes `model` and the current camera of `state` into the frame of `image_index`.
    ///
    /// The camera is read once, before the frame is mapped.
    pub fn update(
        &mut self,
        image_index: usize,
        image_count: usize,
        model: &Mat4,
        state: &impl RenderStateSource,
    ) -> Result<(), UniformBufferError> {
        let view = state.view_matrix();
        let projection = state.projection_matrix();

        // column-major, native endian f32
        let values: [&[u8]; 3] = [
            bytemuck::cast_slice(model.as_slice()),
            bytemuck::cast_slice(view.as_slice()),
            bytemuck::cast_slice(projection.as_slice()),
        ];
        self.manager.update(image_index, image_count, &values)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::host::HostMemory;
    use crate::render_state::RenderSystemState;

    struct CountingState {
        inner: RenderSystemState,
        reads: Cell<usize>,
    }

    impl RenderStateSource for CountingState {
        fn view_matrix(&self) -> Mat4 {
            self.reads.set(self.reads.get() + 1);
            self.inner.view_matrix()
        }

        fn projection_matrix(&self) -> Mat4 {
            self.reads.set(self.reads.get() + 1);
            self.inner.projection_matrix()
        }
    }

    fn read_matrix(bytes: &[u8], offset: u64) -> Vec<f32> {
        let offset = offset as usize;
        bytes[offset..offset + 64]
            .chunks_exact(4)
            .map(|chunk| f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn numbered(start: f32) -> Mat4 {
        // column-major fill: element k of the slice holds start + k
        let mut m = Mat4::zeros();
        for (k, value) in m.as_mut_slice().iter_mut().enumerate() {
            *value = start + k as f32;
        }
        m
    }

    #[test]
    fn matrices_land_at_std140_offsets() {
        let layout = MatrixUbo::<HostMemory>::layout();
        assert_eq!(layout.offset_of(MODEL), Some(0));
        assert_eq!(layout.offset_of(VIEW), Some(64));
        assert_eq!(layout.offset_of(PROJECTION), Some(128));
        assert_eq!(layout.size(), 192);
    }

    #[test]
    fn written_matrices_read_back_column_major() {
        let memory = Rc::new(HostMemory::new());
        let mut ubo = MatrixUbo::new("Matrices", memory.clone(), false).unwrap();
        ubo.manager_mut().ensure_created(2).unwrap();

        let model = numbered(0.0);
        let state = RenderSystemState {
            view: numbered(100.0),
            projection: numbered(200.0),
            ..Default::default()
        };
        ubo.update(1, 2, &model, &state).unwrap();

        let layout = ubo.manager().layout().clone();
        let bytes = ubo.manager().frames()[1].allocation().bytes();
        let expected_model: Vec<f32> = (0..16).map(|k| k as f32).collect();
        assert_eq!(read_matrix(bytes, layout.offset_of(MODEL).unwrap()), expected_model);
        assert_eq!(
            read_matrix(bytes, layout.offset_of(VIEW).unwrap()),
            state.view.as_slice().to_vec()
        );
        assert_eq!(
            read_matrix(bytes, layout.offset_of(PROJECTION).unwrap()),
            state.projection.as_slice().to_vec()
        );

        // translation sits in the last column
        let translated = math::translate(&Mat4::identity(), &vec3(1.0, 2.0, 3.0));
        ubo.update(0, 2, &translated, &state).unwrap();
        let bytes = ubo.manager().frames()[0].allocation().bytes();
        assert_eq!(&read_matrix(bytes, 0)[12..16], &[1.0f32, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn identity_update_leaves_other_frames_alone() {
        let memory = Rc::new(HostMemory::new());
        let mut ubo = MatrixUbo::new("Matrices", memory.clone(), true).unwrap();
        ubo.manager_mut().ensure_created(3).unwrap();
        let before: Vec<Vec<u8>> = ubo
            .manager()
            .frames()
            .iter()
            .map(|f| f.allocation().bytes().to_vec())
            .collect();

        ubo.update(1, 3, &Mat4::identity(), &RenderSystemState::default())
            .unwrap();

        let frames = ubo.manager().frames();
        assert_eq!(frames[0].allocation().bytes(), &before[0][..]);
        assert_eq!(frames[2].allocation().bytes(), &before[2][..]);
        let identity = Mat4::identity();
        for offset in [0, 64, 128] {
            assert_eq!(
                read_matrix(frames[1].allocation().bytes(), offset),
                identity.as_slice().to_vec()
            );
        }
    }

    #[test]
    fn camera_is_read_once_per_update() {
        let memory = Rc::new(HostMemory::new());
        let mut ubo = MatrixUbo::new("Matrices", memory, false).unwrap();
        let state = CountingState {
            inner: RenderSystemState::default(),
            reads: Cell::new(0),
        };
        ubo.update(0, 2, &Mat4::identity(), &state).unwrap();
        assert_eq!(state.reads.get(), 2);
        assert_eq!(ubo.manager().frame_count(), 2);
    }

    #[test]
    fn out_of_range_image_is_rejected() {
        let memory = Rc::new(HostMemory::new());
        let mut ubo = MatrixUbo::new("Matrices", memory, false).unwrap();
        ubo.manager_mut().ensure_created(2).unwrap();
        let result = ubo.update(2, 2, &Mat4::identity(), &RenderSystemState::default());
        assert_eq!(
            result,
            Err(UniformBufferError::OutOfRange { index: 2, len: 2 })
        );
    }
}
