//! Camera-dependent wall visibility
//!
//! Outer walls are hidden when the camera looks at their outside face so the
//! room interior stays visible from above.

use crate::foundation::math::{Point3, Vec3};
use crate::kernel::{PlanWall, WallType};
use crate::render::coordinates::vector_from_kernel;
use crate::render::Camera;

/// Visibility data of one plan wall, in renderer space
#[derive(Debug, Clone, PartialEq)]
pub struct WallModel {
    /// Wall classification
    pub wall_type: WallType,
    /// Normal of the left face
    pub left_normal: Vec3,
    /// Normal of the right face
    pub right_normal: Vec3,
    /// Wall center
    pub center: Vec3,
}

impl WallModel {
    /// Convert a kernel wall element
    pub fn from_kernel(wall: &PlanWall) -> Self {
        Self {
            wall_type: wall.wall_type,
            left_normal: vector_from_kernel(wall.left_normal.into()),
            right_normal: vector_from_kernel(wall.right_normal.into()),
            center: vector_from_kernel(wall.center.into()),
        }
    }

    /// Normal tested against the camera, `None` for walls that always show
    fn facing_normal(&self) -> Option<Vec3> {
        match self.wall_type {
            WallType::OuterRight => Some(self.right_normal),
            WallType::OuterLeft => Some(self.left_normal),
            WallType::Inner => None,
        }
    }
}

/// Whether `wall` should render for `camera`
///
/// The wall center (as a point) and the facing normal (as a direction) are
/// taken into camera space; the wall shows when the vector from the camera to
/// the center does not oppose the normal.
pub fn is_wall_visible(camera: &Camera, wall: &WallModel) -> bool {
    let Some(normal) = wall.facing_normal() else {
        return true;
    };
    let view = camera.get_view_matrix();
    let center = view.transform_point(&Point3::from(wall.center)).coords;
    let normal = view.transform_vector(&normal);
    let normal = normal.try_normalize(f32::EPSILON).unwrap_or(normal);
    center.dot(&normal) >= 0.0
}
