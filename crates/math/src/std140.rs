use std::mem::size_of;

use nalgebra_glm::{Mat4, Vec2, Vec3, Vec4};

/// Size and base alignment of a type inside a std140 uniform block.
///
/// Alignments are derived from the scalar component: vectors of two components
/// align to twice the scalar, three and four component vectors to four times the
/// scalar, and a column-major matrix aligns like its column vector.
pub trait Std140 {
    const SIZE: u64;
    const ALIGNMENT: u64;
}

impl Std140 for f32 {
    const SIZE: u64 = size_of::<f32>() as u64;
    const ALIGNMENT: u64 = size_of::<f32>() as u64;
}

impl Std140 for i32 {
    const SIZE: u64 = size_of::<i32>() as u64;
    const ALIGNMENT: u64 = size_of::<i32>() as u64;
}

impl Std140 for u32 {
    const SIZE: u64 = size_of::<u32>() as u64;
    const ALIGNMENT: u64 = size_of::<u32>() as u64;
}

impl Std140 for Vec2 {
    const SIZE: u64 = 2 * <f32 as Std140>::SIZE;
    const ALIGNMENT: u64 = 2 * <f32 as Std140>::ALIGNMENT;
}

impl Std140 for Vec3 {
    const SIZE: u64 = 3 * <f32 as Std140>::SIZE;
    const ALIGNMENT: u64 = 4 * <f32 as Std140>::ALIGNMENT;
}

impl Std140 for Vec4 {
    const SIZE: u64 = 4 * <f32 as Std140>::SIZE;
    const ALIGNMENT: u64 = 4 * <f32 as Std140>::ALIGNMENT;
}

// four vec4 columns, each padded to the column alignment
impl Std140 for Mat4 {
    const SIZE: u64 = 4 * <Vec4 as Std140>::ALIGNMENT;
    const ALIGNMENT: u64 = <Vec4 as Std140>::ALIGNMENT;
}
