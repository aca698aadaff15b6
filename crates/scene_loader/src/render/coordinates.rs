//! Coordinate system conversion utilities
//!
//! The kernel works in millimetres with Z up; the renderer works in metres
//! with Y up. Everything crossing that boundary goes through the functions
//! here exactly once. The conversion is a change of basis, so converting an
//! already converted value is an error the type system cannot catch.

use crate::foundation::math::{Mat4, Vec3};

/// Millimetres per renderer unit
pub const MILLIMETERS_PER_METER: f32 = 1000.0;

/// Axis swap taking kernel axes to renderer axes: `(x, y, z) -> (x, z, -y)`
///
/// Written out literally so that positions and normals pass through it
/// without rounding.
#[rustfmt::skip]
pub fn kernel_axis_swap() -> Mat4 {
    Mat4::new(
        1.0, 0.0,  0.0, 0.0,
        0.0, 0.0,  1.0, 0.0,
        0.0, -1.0, 0.0, 0.0,
        0.0, 0.0,  0.0, 1.0,
    )
}

/// Inverse of [`kernel_axis_swap`]: `(x, y, z) -> (x, -z, y)`
#[rustfmt::skip]
pub fn renderer_axis_swap() -> Mat4 {
    Mat4::new(
        1.0, 0.0, 0.0,  0.0,
        0.0, 0.0, -1.0, 0.0,
        0.0, 1.0, 0.0,  0.0,
        0.0, 0.0, 0.0,  1.0,
    )
}

/// Convert a row-major kernel transform into a renderer transform
///
/// The buffer is read column-major and transposed, then wrapped as
/// `A · M · B` with `A = swap · S(1/1000)` and `B = swap⁻¹ · S(1000)`.
pub fn matrix_from_kernel(transform: &[f32; 16]) -> Mat4 {
    let kernel = Mat4::from_column_slice(transform).transpose();
    let to_renderer =
        kernel_axis_swap() * Mat4::new_scaling(1.0 / MILLIMETERS_PER_METER);
    let to_kernel = renderer_axis_swap() * Mat4::new_scaling(MILLIMETERS_PER_METER);
    to_renderer * kernel * to_kernel
}

/// Convert a kernel position or direction to renderer space: `(x, z, -y) / 1000`
pub fn vector_from_kernel(vector: [f32; 3]) -> Vec3 {
    Vec3::new(
        vector[0] / MILLIMETERS_PER_METER,
        vector[2] / MILLIMETERS_PER_METER,
        vector[1] / -MILLIMETERS_PER_METER,
    )
}

/// Embed a packed 2×3 UV affine transform into a 4×4 matrix acting on (u, v)
#[rustfmt::skip]
pub fn uv_matrix_from_kernel(transform: &[f32; 6]) -> Mat4 {
    Mat4::new(
        transform[0], transform[2], 0.0, transform[4],
        transform[1], transform[3], 0.0, transform[5],
        0.0,          0.0,          1.0, 0.0,
        0.0,          0.0,          0.0, 1.0,
    )
}

/// Whether a packed UV transform is exactly the identity affine map
pub fn is_uv_identity(transform: &[f32; 6]) -> bool {
    *transform == [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]
}
