//! Scene cache
//!
//! Loaded scenes are kept by id and handed out as shared entries. Concurrent
//! first requests for one id join a single in-flight load. Which entries
//! survive is up to the configured [`EvictionPolicy`].

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::assets::{AnimationClip, LoadError};
use crate::core::config::SceneCacheConfig;
use crate::foundation::collections::{EvictionPolicy, InFlightLoads, KeyedCache};
use crate::kernel::KernelError;
use crate::render::TextureLoads;
use crate::scene::loaders::SceneLoaders;
use crate::scene::scene_source::{SceneKind, SceneSourceModel};
use crate::scene::SceneNode;

/// Errors from scene cache operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    /// The kernel query failed
    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),

    /// A resource could not be loaded
    #[error("Load error: {0}")]
    Load(#[from] LoadError),
}

/// A cached scene
#[derive(Debug, Clone, PartialEq)]
pub struct SceneCacheEntry {
    /// What was loaded
    pub kind: SceneKind,
    /// Root of the scene
    pub scene_object: SceneNode,
    /// Animations shipped with the scene
    pub animations: Vec<AnimationClip>,
}

impl SceneCacheEntry {
    /// Entry without animations
    pub fn new(kind: SceneKind, scene_object: SceneNode) -> Self {
        Self {
            kind,
            scene_object,
            animations: Vec::new(),
        }
    }
}

/// Outcome of a cached scene load
pub type SceneResult = Result<Rc<SceneCacheEntry>, SceneError>;

/// Cache of loaded scenes keyed by scene id
pub struct SceneCache {
    loaders: Rc<SceneLoaders>,
    entries: RefCell<KeyedCache<Rc<SceneCacheEntry>>>,
    in_flight: RefCell<InFlightLoads<SceneResult>>,
    pending_textures: Rc<RefCell<TextureLoads>>,
}

impl SceneCache {
    /// Create a cache keeping every scene
    pub fn new(loaders: SceneLoaders) -> Self {
        Self::with_config(loaders, &SceneCacheConfig::default())
    }

    /// Create a cache whose eviction follows `config`
    pub fn with_config(loaders: SceneLoaders, config: &SceneCacheConfig) -> Self {
        Self::with_policy(loaders, config.eviction_policy())
    }

    /// Create a cache with a custom eviction policy
    pub fn with_policy(loaders: SceneLoaders, policy: Box<dyn EvictionPolicy>) -> Self {
        Self {
            loaders: Rc::new(loaders),
            entries: RefCell::new(KeyedCache::with_policy(policy)),
            in_flight: RefCell::new(InFlightLoads::new()),
            pending_textures: Rc::new(RefCell::new(TextureLoads::new())),
        }
    }

    /// Cached scene for `id`
    pub fn get(&self, id: &str) -> Option<Rc<SceneCacheEntry>> {
        self.entries.borrow_mut().get(id).cloned()
    }

    /// Number of cached scenes
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Drop the cached scene for `id`
    pub fn remove(&self, id: &str) -> Option<Rc<SceneCacheEntry>> {
        self.entries.borrow_mut().remove(id)
    }

    /// Cached scene for `source`, loading and caching it on a miss
    ///
    /// GLB sources load `resource` when set; the entry is always cached under
    /// `source.id`. Failed loads are not cached.
    pub async fn get_or_load(&self, source: &SceneSourceModel) -> SceneResult {
        if let Some(entry) = self.get(&source.id) {
            return Ok(entry);
        }

        let target = match (source.kind, &source.resource) {
            (SceneKind::Glb, Some(resource)) => resource.clone(),
            _ => source.id.clone(),
        };
        let kind = source.kind;
        let loaders = Rc::clone(&self.loaders);
        let sink = Rc::clone(&self.pending_textures);
        let (load, started) = self.in_flight.borrow_mut().join_or_start(&source.id, move || async move {
            let loaded = loaders.load(kind, &target).await?;
            sink.borrow_mut().append(loaded.textures);
            SceneResult::Ok(Rc::new(loaded.entry))
        });
        if !started {
            log::debug!("Joining in-flight load of {}", source.id);
        }

        let result = load.clone().await;
        self.in_flight.borrow_mut().finish(&source.id, &load);
        match &result {
            Ok(entry) => {
                let mut entries = self.entries.borrow_mut();
                if !entries.contains(&source.id) {
                    for (evicted, _) in entries.insert(source.id.clone(), Rc::clone(entry)) {
                        log::debug!("Evicted scene {evicted}");
                    }
                }
            }
            Err(err) => log::warn!("Failed to load scene {}: {err}", source.id),
        }
        result
    }

    /// Classify `id` and load it without touching the cache
    pub async fn load_from_id(&self, id: &str) -> Result<SceneCacheEntry, SceneError> {
        let loaded = self.loaders.load(SceneKind::classify(id), id).await?;
        self.pending_textures.borrow_mut().append(loaded.textures);
        Ok(loaded.entry)
    }

    /// Hand out every texture load queued by scene builds so far
    pub fn take_pending_textures(&self) -> TextureLoads {
        std::mem::take(&mut *self.pending_textures.borrow_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetLoader, FileTextureLoader, LoadedAsset};
    use crate::core::config::LoaderConfig;
    use crate::kernel::{Kernel, KernelPlan, MeshConstructionData};
    use futures::future::{join, FutureExt, LocalBoxFuture};
    use std::cell::Cell;

    #[derive(Default)]
    struct CountingKernel {
        meshes: Cell<usize>,
        plans: Cell<usize>,
    }

    impl Kernel for CountingKernel {
        fn construct_mesh<'a>(
            &'a self,
            configuration_id: &'a str,
        ) -> LocalBoxFuture<'a, Result<MeshConstructionData, KernelError>> {
            async move {
                self.meshes.set(self.meshes.get() + 1);
                if configuration_id.starts_with("bad:") {
                    return Err(KernelError::NotFound(configuration_id.to_string()));
                }
                Ok(MeshConstructionData::default())
            }
            .boxed_local()
        }

        fn load_plan<'a>(&'a self, _plan_id: &'a str) -> LocalBoxFuture<'a, Result<KernelPlan, KernelError>> {
            async move {
                self.plans.set(self.plans.get() + 1);
                Ok(KernelPlan::default())
            }
            .boxed_local()
        }
    }

    #[derive(Default)]
    struct RecordingAssets {
        urls: RefCell<Vec<String>>,
    }

    impl AssetLoader for RecordingAssets {
        fn load<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<LoadedAsset, LoadError>> {
            self.urls.borrow_mut().push(url.to_string());
            async move {
                Ok(LoadedAsset {
                    scene: SceneNode::group(url),
                    animations: vec![AnimationClip {
                        name: "open".to_string(),
                        duration: 1.5,
                    }],
                })
            }
            .boxed_local()
        }
    }

    fn cache_with(policy: Option<usize>) -> (SceneCache, Rc<CountingKernel>, Rc<RecordingAssets>) {
        let kernel = Rc::new(CountingKernel::default());
        let assets = Rc::new(RecordingAssets::default());
        let loaders = SceneLoaders::new(
            &LoaderConfig::default(),
            kernel.clone(),
            Rc::new(FileTextureLoader::new()),
            assets.clone(),
        );
        let config = SceneCacheConfig {
            max_entries: policy,
        };
        (SceneCache::with_config(loaders, &config), kernel, assets)
    }

    #[test]
    fn test_hit_returns_same_entry_without_reloading() {
        let (cache, kernel, _) = cache_with(None);
        let source = SceneSourceModel::from_id("usm:frame");

        let first = pollster::block_on(cache.get_or_load(&source)).unwrap();
        let second = pollster::block_on(cache.get_or_load(&source)).unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(kernel.meshes.get(), 1);
        assert_eq!(first.kind, SceneKind::Configuration);
        assert!(Rc::ptr_eq(&cache.get("usm:frame").unwrap(), &first));
    }

    #[test]
    fn test_concurrent_first_loads_share_one_query() {
        let (cache, kernel, _) = cache_with(None);
        let source = SceneSourceModel::from_id("ps_room");

        let (a, b) = pollster::block_on(join(cache.get_or_load(&source), cache.get_or_load(&source)));

        assert!(Rc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(kernel.plans.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_glb_loads_resource_but_caches_under_id() {
        let (cache, _, assets) = cache_with(None);
        let source = SceneSourceModel::from_id("chair.glb").with_resource("https://cdn.example/chair-v2.glb");

        let entry = pollster::block_on(cache.get_or_load(&source)).unwrap();

        assert_eq!(*assets.urls.borrow(), vec!["https://cdn.example/chair-v2.glb".to_string()]);
        assert_eq!(entry.kind, SceneKind::Glb);
        assert_eq!(entry.animations.len(), 1);
        assert!(cache.get("chair.glb").is_some());
    }

    #[test]
    fn test_failures_are_not_cached() {
        let (cache, kernel, _) = cache_with(None);
        let source = SceneSourceModel::from_id("bad:config");

        let result = pollster::block_on(cache.get_or_load(&source));
        assert!(matches!(result, Err(SceneError::Kernel(KernelError::NotFound(_)))));
        assert!(cache.is_empty());

        let _ = pollster::block_on(cache.get_or_load(&source));
        assert_eq!(kernel.meshes.get(), 2);
    }

    #[test]
    fn test_load_from_id_classifies_and_skips_cache() {
        let (cache, kernel, assets) = cache_with(None);

        let glb = pollster::block_on(cache.load_from_id("Models/Lamp.GLTF")).unwrap();
        let plan = pollster::block_on(cache.load_from_id("room42")).unwrap();
        let configuration = pollster::block_on(cache.load_from_id("usm:frame")).unwrap();

        assert_eq!(glb.kind, SceneKind::Glb);
        assert_eq!(plan.kind, SceneKind::Plan);
        assert_eq!(configuration.kind, SceneKind::Configuration);
        assert_eq!(assets.urls.borrow().len(), 1);
        assert_eq!((kernel.plans.get(), kernel.meshes.get()), (1, 1));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lru_policy_evicts_oldest_scene() {
        let (cache, _, _) = cache_with(Some(2));
        for id in ["ps_a", "ps_b"] {
            pollster::block_on(cache.get_or_load(&SceneSourceModel::from_id(id))).unwrap();
        }
        // touch a so b becomes the oldest
        assert!(cache.get("ps_a").is_some());
        pollster::block_on(cache.get_or_load(&SceneSourceModel::from_id("ps_c"))).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.get("ps_b").is_none());
        assert!(cache.get("ps_a").is_some());
    }

    #[test]
    fn test_pending_textures_are_drained() {
        let (cache, _, _) = cache_with(None);
        assert!(cache.take_pending_textures().is_empty());
        pollster::block_on(cache.get_or_load(&SceneSourceModel::from_id("ps_a"))).unwrap();
        assert!(cache.take_pending_textures().is_empty());
    }
}
