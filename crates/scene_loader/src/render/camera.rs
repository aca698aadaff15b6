//! # Viewing Camera
//!
//! Minimal camera pose used to evaluate view-dependent scene metadata such as
//! wall visibility. Projection and camera controls belong to the renderer.
//!
//! Uses the renderer's right-handed Y-up space; the camera looks down its
//! local -Z axis.

use crate::foundation::math::{Mat4, Point3, Vec3};

/// Camera pose in renderer space
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,
}

impl Camera {
    /// Create a camera at `position` looking at `target` with Y up
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            up: Vec3::y(),
        }
    }

    /// Point the camera at a new target
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.target = target;
        self.up = up;
        log::trace!("Camera look_at updated - target: {:?}, up: {:?}", target, up);
    }

    /// World-to-camera transform
    pub fn get_view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(
            &Point3::from(self.position),
            &Point3::from(self.target),
            &self.up,
        )
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::zeros(), -Vec3::z())
    }
}
