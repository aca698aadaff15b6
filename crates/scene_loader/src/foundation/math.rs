//! Math utilities and types
//!
//! Renderer-space math types shared by every stage of scene construction.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector2, Vector3};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale of a scene node
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in renderer space (meters)
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with a position and a rotation about the Y axis
    pub fn from_position_yaw(position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_axis_angle(&Vec3::y_axis(), yaw),
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Point3) -> Point3 {
        self.to_matrix().transform_point(&point)
    }

    /// Decompose an affine transformation matrix
    ///
    /// Mirrored matrices (negative determinant) carry the reflection in the
    /// X scale so that the rotation part stays a proper rotation.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let position = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

        let mut scale_x = Vec3::new(matrix.m11, matrix.m21, matrix.m31).magnitude();
        let scale_y = Vec3::new(matrix.m12, matrix.m22, matrix.m32).magnitude();
        let scale_z = Vec3::new(matrix.m13, matrix.m23, matrix.m33).magnitude();
        if matrix.fixed_view::<3, 3>(0, 0).clone_owned().determinant() < 0.0 {
            scale_x = -scale_x;
        }
        let scale = Vec3::new(scale_x, scale_y, scale_z);

        let safe = |s: f32| if s == 0.0 { 1.0 } else { s };
        let rotation_matrix = Mat3::new(
            matrix.m11 / safe(scale_x), matrix.m12 / safe(scale_y), matrix.m13 / safe(scale_z),
            matrix.m21 / safe(scale_x), matrix.m22 / safe(scale_y), matrix.m23 / safe(scale_z),
            matrix.m31 / safe(scale_x), matrix.m32 / safe(scale_y), matrix.m33 / safe(scale_z),
        );
        let rotation = Quat::from_matrix(&rotation_matrix);

        Self {
            position,
            rotation,
            scale,
        }
    }
}
