use math::prelude::*;

/// Supplies the camera matrices a frame is rendered with.
pub trait RenderStateSource {
    fn view_matrix(&self) -> Mat4;
    fn projection_matrix(&self) -> Mat4;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSystemState {
    pub projection: Mat4,
    pub view: Mat4,
    pub near_clip: f32,
    pub far_clip: f32,
}

impl Default for RenderSystemState {
    fn default() -> Self {
        Self {
            projection: Mat4::identity(),
            view: Mat4::identity(),
            near_clip: 0.1,
            far_clip: 1000.0,
        }
    }
}

impl RenderSystemState {
    /// Right handed perspective with a `[0, 1]` depth range.
    pub fn perspective(aspect: f32, fov_y: f32, near_clip: f32, far_clip: f32) -> Self {
        Self {
            projection: math::perspective_rh_zo(aspect, fov_y, near_clip, far_clip),
            view: Mat4::identity(),
            near_clip,
            far_clip,
        }
    }

    pub fn set_view(&mut self, view: Mat4) {
        self.view = view;
    }

    pub fn look_at(&mut self, eye: &Vec3, center: &Vec3, up: &Vec3) {
        self.view = math::look_at_rh(eye, center, up);
    }

    // the swapchain extent changed, the view stays
    pub fn resize(&mut self, aspect: f32, fov_y: f32) {
        self.projection = math::perspective_rh_zo(aspect, fov_y, self.near_clip, self.far_clip);
    }
}

impl RenderStateSource for RenderSystemState {
    fn view_matrix(&self) -> Mat4 {
        self.view
    }

    fn projection_matrix(&self) -> Mat4 {
        self.projection
    }
}
