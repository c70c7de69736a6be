use std::rc::Rc;

use math::prelude::*;
use strata_rhi::{HostMemory, MatrixUbo, RenderSystemState, UniformBufferError};

// Drives the matrix uniform buffer the way a renderer does: one update per acquired
// swapchain image, with a swapchain recreation half way through.
fn main() -> Result<(), UniformBufferError> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .init();

    let memory = Rc::new(HostMemory::new());
    let mut ubo = MatrixUbo::new("Camera Matrices", memory.clone(), true)?;
    let mut state = RenderSystemState::perspective(16.0 / 9.0, math::QUARTER_PI, 0.1, 100.0);

    let mut image_count = 3;
    ubo.manager_mut().ensure_created(image_count)?;

    for frame in 0..12usize {
        if frame == 6 {
            // window resized, the new swapchain has two images
            image_count = 2;
            ubo.manager_mut().teardown()?;
            ubo.manager_mut().ensure_created(image_count)?;
            state.resize(4.0 / 3.0, math::QUARTER_PI);
        }

        let image_index = frame % image_count;
        let angle = frame as f32 * 0.1;
        state.look_at(
            &vec3(5.0 * angle.cos(), 2.0, 5.0 * angle.sin()),
            &vec3(0.0, 0.0, 0.0),
            &vec3(0.0, 1.0, 0.0),
        );
        let model = math::rotate(&Mat4::identity(), angle, &vec3(0.0, 1.0, 0.0));
        ubo.update(image_index, image_count, &model, &state)?;
    }

    let stats = memory.stats();
    log::info!(
        "maps: {}, unmaps: {}, live frames: {}",
        stats.maps,
        stats.unmaps,
        stats.live_allocations()
    );
    Ok(())
}
