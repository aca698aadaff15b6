//! # Scene Loader
//!
//! Builds renderer-ready scene graphs from the answers of a product
//! configurator kernel, and caches them.
//!
//! ## Features
//!
//! - **Materials**: kernel material descriptions resolved to physically based
//!   materials under the legacy or modern shading scheme, with per-mesh overrides
//! - **Geometry**: kernel vertex buffers converted to the renderer's Y-up metre space
//! - **Plans**: floors, walls, catalog objects and configurable objects
//!   assembled into one scene, with per-wall visibility data
//! - **Caching**: scenes and environment maps cached by id with deduplicated
//!   in-flight loads
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use scene_loader::prelude::*;
//! use scene_loader::kernel::fixture::RonKernel;
//!
//! # struct NoAssets;
//! # impl AssetLoader for NoAssets {
//! #     fn load<'a>(&'a self, url: &'a str)
//! #         -> futures::future::LocalBoxFuture<'a, Result<LoadedAsset, LoadError>> {
//! #         Box::pin(async move { Err(LoadError::Unsupported(url.to_string())) })
//! #     }
//! # }
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     scene_loader::foundation::logging::init();
//!     let config = LoaderConfig::default();
//!     let loaders = SceneLoaders::new(
//!         &config,
//!         Rc::new(RonKernel::new("fixtures")),
//!         Rc::new(FileTextureLoader::new()),
//!         Rc::new(NoAssets),
//!     );
//!     let cache = SceneCache::with_config(loaders, &config.scene_cache);
//!     let entry = pollster::block_on(cache.get_or_load(&SceneSourceModel::from_id("ps_room")))?;
//!     println!("{} meshes", entry.scene_object.mesh_count());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;

pub mod assets;
pub mod config;
pub mod environment;
pub mod foundation;
pub mod kernel;
pub mod render;
pub mod scene;

/// Common imports for loader users
pub mod prelude {
    pub use crate::{
        assets::{
            AssetLoader, FileTextureLoader, LoadError, LoadedAsset, MaterialResolver,
            ShadingScheme, TextureLoader,
        },
        config::Config,
        core::config::LoaderConfig,
        environment::{EnvironmentLoaders, EnvironmentMapCache, SetEnvironmentParams},
        foundation::math::{Mat4, Transform, Vec3},
        kernel::{Kernel, KernelError},
        render::{Camera, PhysicalMaterial, TextureLoads},
        scene::{
            is_wall_visible, SceneCache, SceneError, SceneKind, SceneLoaders, SceneNode,
            SceneSourceContainer, SceneSourceModel,
        },
    };
}
