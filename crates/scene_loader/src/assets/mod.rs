//! Asset loading
//!
//! Turns kernel geometry and material descriptions into renderer primitives
//! and defines the injected loaders for textures and packed 3D assets.

pub mod asset_loader;
pub mod geometry_builder;
pub mod image_loader;
pub mod materials;
pub mod texture_loader;

pub use asset_loader::{catalog_asset_url, AnimationClip, AssetLoader, LoadedAsset};
pub use geometry_builder::GeometryBuilder;
pub use image_loader::ImageData;
pub use materials::{
    apply_overrides, MaterialAttribute, MaterialCache, MaterialResolver, ResolvedMaterial,
    ShadingScheme,
};
pub use texture_loader::{FileTextureLoader, TextureLoader};

use thiserror::Error;

/// Errors raised while fetching or decoding an external resource
///
/// `Clone` so a shared in-flight load can hand the same error to every waiter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The resource could not be retrieved
    #[error("Failed to fetch {url}: {reason}")]
    Fetch {
        /// Requested resource
        url: String,
        /// Transport message
        reason: String,
    },

    /// The resource was retrieved but is not a valid image or asset
    #[error("Failed to decode {url}: {reason}")]
    Decode {
        /// Requested resource
        url: String,
        /// Decoder message
        reason: String,
    },

    /// No loader handles this kind of resource
    #[error("Unsupported resource: {0}")]
    Unsupported(String),
}
