//! Scene assembly and caching
//!
//! Kernel configurations, kernel plans and packed GLB assets all end up as a
//! [`SceneNode`] tree held by the [`SceneCache`].

pub mod loaders;
pub mod mesh_factory;
pub mod plan_assembler;
pub mod scene_cache;
pub mod scene_graph;
pub mod scene_source;
pub mod wall_model;

pub use loaders::{prepare_glb_scene, LoadedScene, SceneLoaders};
pub use mesh_factory::{instantiate, GeometryAndMaterial, MaterialData, MeshFactory, SceneData};
pub use plan_assembler::{AssembledPlan, PlanAssembler, RefreshCallback};
pub use scene_cache::{SceneCache, SceneCacheEntry, SceneError, SceneResult};
pub use scene_graph::{MeshNode, NodeUserData, SceneNode};
pub use scene_source::{display_name, SceneKind, SceneSourceContainer, SceneSourceModel};
pub use wall_model::{is_wall_visible, WallModel};
