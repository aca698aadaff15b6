//! Per-kind scene loaders
//!
//! Configurations and plans are queried from the kernel; GLB scenes come from
//! the asset loader and get a light post-processing pass.

use std::rc::Rc;

use crate::assets::{AssetLoader, MaterialResolver, TextureLoader};
use crate::core::config::LoaderConfig;
use crate::kernel::Kernel;
use crate::render::{PhysicalMaterial, TextureLoads};
use crate::scene::mesh_factory::{instantiate, MeshFactory};
use crate::scene::plan_assembler::{PlanAssembler, RefreshCallback};
use crate::scene::scene_cache::{SceneCacheEntry, SceneError};
use crate::scene::scene_source::SceneKind;
use crate::scene::SceneNode;

/// A loaded scene plus the texture loads it spawned
#[derive(Debug)]
pub struct LoadedScene {
    /// Scene ready for caching
    pub entry: SceneCacheEntry,
    /// Texture loads the scene's materials are waiting on
    pub textures: TextureLoads,
}

/// Loads scenes of every kind
pub struct SceneLoaders {
    kernel: Rc<dyn Kernel>,
    factory: Rc<MeshFactory>,
    plans: PlanAssembler,
    assets: Rc<dyn AssetLoader>,
}

impl SceneLoaders {
    /// Create loaders sharing one material resolver
    pub fn new(
        config: &LoaderConfig,
        kernel: Rc<dyn Kernel>,
        textures: Rc<dyn TextureLoader>,
        assets: Rc<dyn AssetLoader>,
    ) -> Self {
        let resolver = Rc::new(MaterialResolver::new(config, textures));
        let factory = Rc::new(MeshFactory::new(resolver));
        let plans = PlanAssembler::new(Rc::clone(&factory), Rc::clone(&assets));
        Self {
            kernel,
            factory,
            plans,
            assets,
        }
    }

    /// Ask the host to redraw after the static objects of a plan arrive
    pub fn with_refresh(self, refresh: RefreshCallback) -> Self {
        let Self {
            kernel,
            factory,
            plans,
            assets,
        } = self;
        Self {
            kernel,
            factory,
            plans: plans.with_refresh(refresh),
            assets,
        }
    }

    /// Load `target` as a scene of `kind`
    pub async fn load(&self, kind: SceneKind, target: &str) -> Result<LoadedScene, SceneError> {
        log::info!("Loading {kind:?} scene {target}");
        match kind {
            SceneKind::Configuration => self.load_configuration(target).await,
            SceneKind::Plan => self.load_plan(target).await,
            SceneKind::Glb => self.load_glb(target).await,
        }
    }

    /// Query and build a kernel configuration
    pub async fn load_configuration(&self, configuration_id: &str) -> Result<LoadedScene, SceneError> {
        let data = self.kernel.construct_mesh(configuration_id).await?;
        let scene_data = self.factory.assemble(&data);
        let mut scene = instantiate(&scene_data.meshes);
        scene.name = configuration_id.to_string();
        Ok(LoadedScene {
            entry: SceneCacheEntry::new(SceneKind::Configuration, scene),
            textures: scene_data.textures,
        })
    }

    /// Query and assemble a kernel plan
    pub async fn load_plan(&self, plan_id: &str) -> Result<LoadedScene, SceneError> {
        let plan = self.kernel.load_plan(plan_id).await?;
        let mut assembled = self.plans.assemble(&plan).await;
        assembled.scene.name = plan_id.to_string();
        Ok(LoadedScene {
            entry: SceneCacheEntry::new(SceneKind::Plan, assembled.scene),
            textures: assembled.textures,
        })
    }

    /// Fetch a packed asset as a whole scene
    pub async fn load_glb(&self, url: &str) -> Result<LoadedScene, SceneError> {
        let asset = self.assets.load(url).await?;
        let mut scene = asset.scene;
        prepare_glb_scene(&mut scene);
        Ok(LoadedScene {
            entry: SceneCacheEntry {
                kind: SceneKind::Glb,
                scene_object: scene,
                animations: asset.animations,
            },
            textures: TextureLoads::new(),
        })
    }
}

/// Opaque physical meshes cast and receive shadows; physical materials use
/// unit environment intensity
pub fn prepare_glb_scene(scene: &mut SceneNode) {
    scene.traverse_mut(&mut |node| {
        if let Some(mesh) = node.mesh.as_mut() {
            if mesh.material.is_physical() && !mesh.material.transparent {
                mesh.cast_shadow = true;
                mesh.receive_shadow = true;
            }
        }
    });
    scene.map_materials(&mut |material| {
        (material.is_physical() && material.env_map_intensity != 1.0).then(|| PhysicalMaterial {
            env_map_intensity: 1.0,
            ..material.clone()
        })
    });
}
