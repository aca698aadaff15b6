//! Renderer-side primitive types
//!
//! Plain data a rendering backend consumes: colors, geometry buffers,
//! textures, materials and the camera pose, plus the kernel-to-renderer
//! coordinate conversion.

pub mod camera;
pub mod color;
pub mod coordinates;
pub mod geometry;
pub mod material;
pub mod texture;

pub use camera::Camera;
pub use color::{Color, ParseColorError};
pub use geometry::{Geometry, AABB};
pub use material::{
    MaterialMetadata, MaterialTextures, PhysicalMaterial, ShadingModel, Side, TextureChannels,
};
pub use texture::{
    Texture, TextureBinding, TextureHandle, TextureLoads, TextureSampling, TextureStatus, WrapMode,
};
