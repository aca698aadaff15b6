//! Material resolution
//!
//! Kernel material descriptions become shared renderer materials; meshes
//! that carry attribute overrides get private copies.

pub mod material_cache;
pub mod material_overrides;
pub mod material_resolver;
pub mod shading;

pub use material_cache::MaterialCache;
pub use material_overrides::{apply_overrides, AttributeError, MaterialAttribute};
pub use material_resolver::{MaterialResolver, ResolvedMaterial};
pub use shading::{apply_legacy_shading, apply_modern_shading, ShadingScheme};
