pub use nalgebra_glm::*;

pub use alignment::*;
pub use std140::*;

mod alignment;
mod std140;

pub const PI: f32 = std::f32::consts::PI;
pub const HALF_PI: f32 = 0.5f32 * PI;
pub const QUARTER_PI: f32 = 0.25f32 * PI;
pub const DEG2RAD_MULTIPLIER: f32 = PI / 180.0f32;
pub const RAD2DEG_MULTIPLIER: f32 = 180.0f32 / PI;

pub fn is_power_of_2(value: u64) -> bool {
    (value != 0) && ((value & (value - 1)) == 0)
}

pub mod prelude {
    #[doc(hidden)]
    pub use crate::{
        aligned_offset, mat4, vec2, vec3, vec4, Mat4, Std140, Vec2, Vec3, Vec4,
    };
}
