//! Triangle geometry buffers
//!
//! Flat attribute buffers the way renderers upload them: `u32` triangle
//! indices, xyz positions, xyz normals and uv pairs.

use crate::foundation::math::{Mat4, Point3, Vec3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, `None` for an empty iterator
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |mut aabb, p| {
            aabb.expand_to_point(p);
            aabb
        }))
    }

    /// Grow the box to include `point`
    pub fn expand_to_point(&mut self, point: Vec3) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &AABB) -> AABB {
        AABB::new(self.min.inf(&other.min), self.max.sup(&other.max))
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Full edge lengths
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Box around the eight transformed corners
    pub fn transformed(&self, matrix: &Mat4) -> AABB {
        let corners = (0..8).map(|i| {
            let corner = Point3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            matrix.transform_point(&corner).coords
        });
        // eight corners, never empty
        AABB::from_points(corners).unwrap_or(*self)
    }
}

/// Indexed triangle geometry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    /// Triangle indices, three per face
    pub indices: Vec<u32>,
    /// Vertex positions, xyz
    pub positions: Vec<f32>,
    /// Vertex normals, xyz
    pub normals: Vec<f32>,
    /// Texture coordinates, uv
    pub uvs: Vec<f32>,
}

impl Geometry {
    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate positions as vectors
    pub fn position_iter(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.positions
            .chunks_exact(3)
            .map(|p| Vec3::new(p[0], p[1], p[2]))
    }

    /// Local bounding box of the positions
    pub fn bounding_box(&self) -> Option<AABB> {
        AABB::from_points(self.position_iter())
    }

    /// Uniformly scale positions
    pub fn scale(&mut self, factor: f32) {
        for value in &mut self.positions {
            *value *= factor;
        }
    }

    /// Transform positions as points and normals as directions
    ///
    /// Normals are renormalized afterwards.
    pub fn apply_matrix(&mut self, matrix: &Mat4) {
        for p in self.positions.chunks_exact_mut(3) {
            let moved = matrix.transform_point(&Point3::new(p[0], p[1], p[2]));
            p.copy_from_slice(moved.coords.as_slice());
        }

        let normal_matrix = matrix
            .fixed_view::<3, 3>(0, 0)
            .clone_owned()
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or_else(|| matrix.fixed_view::<3, 3>(0, 0).clone_owned());
        for n in self.normals.chunks_exact_mut(3) {
            let turned = normal_matrix * Vec3::new(n[0], n[1], n[2]);
            let turned = turned.try_normalize(f32::EPSILON).unwrap_or(turned);
            n.copy_from_slice(turned.as_slice());
        }
    }

    /// Map each uv pair through a 4×4 matrix acting on (u, v, 0, 1)
    pub fn apply_uv_matrix(&mut self, matrix: &Mat4) {
        for uv in self.uvs.chunks_exact_mut(2) {
            let moved = matrix.transform_point(&Point3::new(uv[0], uv[1], 0.0));
            uv[0] = moved.x;
            uv[1] = moved.y;
        }
    }

    /// Index buffer as raw bytes for upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Position buffer as raw bytes for upload
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Normal buffer as raw bytes for upload
    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    /// UV buffer as raw bytes for upload
    pub fn uv_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.uvs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad() -> Geometry {
        Geometry {
            indices: vec![0, 1, 2, 0, 2, 3],
            positions: vec![0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 2.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            normals: [0.0, 0.0, 1.0].repeat(4),
            uvs: vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
        }
    }

    #[test]
    fn test_bounding_box() {
        let aabb = quad().bounding_box().unwrap();
        assert_eq!(aabb.min, Vec3::zeros());
        assert_eq!(aabb.max, Vec3::new(2.0, 1.0, 0.0));
        assert_eq!(aabb.center(), Vec3::new(1.0, 0.5, 0.0));
        assert!(Geometry::default().bounding_box().is_none());
    }

    #[test]
    fn test_apply_matrix_moves_points_and_turns_normals() {
        let mut geometry = quad();
        let matrix = Mat4::new_translation(&Vec3::new(0.0, 0.0, 5.0))
            * Mat4::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2);
        geometry.apply_matrix(&matrix);
        assert_relative_eq!(geometry.positions[2], 5.0, epsilon = 1e-6);
        assert_relative_eq!(geometry.normals[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(geometry.normals[2], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_uv_matrix_scales_and_offsets() {
        let mut geometry = quad();
        let matrix = Mat4::new_translation(&Vec3::new(0.5, 0.0, 0.0))
            * Mat4::new_nonuniform_scaling(&Vec3::new(2.0, 3.0, 1.0));
        geometry.apply_uv_matrix(&matrix);
        assert_eq!(&geometry.uvs[4..6], &[2.5, 3.0]);
    }

    #[test]
    fn test_transformed_box_contains_rotated_corners() {
        let aabb = AABB::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 2.0, 3.0));
        let rotated = aabb.transformed(&Mat4::from_axis_angle(
            &Vec3::y_axis(),
            std::f32::consts::PI,
        ));
        assert_relative_eq!(rotated.min, Vec3::new(-1.0, 0.0, -3.0), epsilon = 1e-6);
        assert_relative_eq!(rotated.max, Vec3::new(0.0, 2.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_byte_views_cover_whole_buffers() {
        let geometry = quad();
        assert_eq!(geometry.index_bytes().len(), 6 * 4);
        assert_eq!(geometry.position_bytes().len(), 12 * 4);
        assert_eq!(geometry.uv_bytes().len(), 8 * 4);
        assert_eq!(geometry.normal_bytes().len(), 12 * 4);
    }
}
