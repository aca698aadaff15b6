//! Kernel geometry to renderer geometry
//!
//! Copies the kernel's buffers, scales millimetres to metres, rotates Z-up to
//! Y-up and applies the UV transform when it is not the identity.

use crate::kernel::GeometrySpecification;
use crate::render::coordinates::{
    is_uv_identity, kernel_axis_swap, uv_matrix_from_kernel, MILLIMETERS_PER_METER,
};
use crate::render::Geometry;

/// Builds renderer geometry from kernel mesh buffers
#[derive(Debug, Default, Clone, Copy)]
pub struct GeometryBuilder;

impl GeometryBuilder {
    /// Create a builder
    pub fn new() -> Self {
        Self
    }

    /// Convert one kernel mesh
    ///
    /// No buffer-length validation happens here; inconsistent kernel buffers
    /// produce inconsistent geometry.
    pub fn build(&self, specification: &GeometrySpecification) -> Geometry {
        let mut geometry = Geometry {
            indices: specification.indices.clone(),
            positions: specification.vertices.clone(),
            normals: specification.normals.clone(),
            uvs: specification.uv_coords.clone(),
        };

        geometry.scale(1.0 / MILLIMETERS_PER_METER);
        // -90° about X
        geometry.apply_matrix(&kernel_axis_swap());

        if let Some(uv_transform) = &specification.uv_transform {
            if !geometry.uvs.is_empty() && !is_uv_identity(uv_transform) {
                geometry.apply_uv_matrix(&uv_matrix_from_kernel(uv_transform));
            }
        }

        log::debug!(
            "Built geometry: {} vertices, {} triangles",
            geometry.vertex_count(),
            geometry.triangle_count()
        );
        geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangle() -> GeometrySpecification {
        GeometrySpecification {
            indices: vec![0, 1, 2],
            vertices: vec![0.0, 0.0, 0.0, 1000.0, 0.0, 0.0, 0.0, 0.0, 2000.0],
            normals: vec![0.0, -1.0, 0.0, 0.0, -1.0, 0.0, 0.0, -1.0, 0.0],
            uv_coords: vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
            uv_transform: None,
        }
    }

    #[test]
    fn test_positions_are_scaled_and_turned_to_y_up() {
        let geometry = GeometryBuilder::new().build(&triangle());
        assert_eq!(geometry.indices, vec![0, 1, 2]);
        assert_relative_eq!(geometry.positions[3], 1.0, epsilon = 1e-6);
        // kernel +Z is renderer +Y
        assert_relative_eq!(geometry.positions[7], 2.0, epsilon = 1e-6);
        assert_relative_eq!(geometry.positions[8], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_normals_rotate_without_scaling() {
        let geometry = GeometryBuilder::new().build(&triangle());
        // kernel -Y is renderer +Z
        assert_eq!(&geometry.normals[0..3], &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_identity_uv_transform_leaves_uvs_bit_identical() {
        let mut spec = triangle();
        spec.uv_transform = Some([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        let geometry = GeometryBuilder::new().build(&spec);
        let expected: Vec<u32> = spec.uv_coords.iter().map(|v| v.to_bits()).collect();
        let actual: Vec<u32> = geometry.uvs.iter().map(|v| v.to_bits()).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_uv_transform_is_applied() {
        let mut spec = triangle();
        spec.uv_transform = Some([2.0, 0.0, 0.0, 2.0, 1.0, 0.0]);
        let geometry = GeometryBuilder::new().build(&spec);
        assert_relative_eq!(geometry.uvs[0], 1.2, epsilon = 1e-6);
        assert_relative_eq!(geometry.uvs[1], 0.4, epsilon = 1e-6);
    }
}
