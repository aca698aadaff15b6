//! End-to-end scene loading through recorded kernel fixtures
//!
//! Kernel answers are written as RON records into a temporary directory and
//! served back by `RonKernel`; textures are real PNG files decoded from disk.

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;

use approx::assert_relative_eq;
use futures::future::{FutureExt, LocalBoxFuture};

use scene_loader::assets::{
    AnimationClip, AssetLoader, FileTextureLoader, LoadError, LoadedAsset, TextureLoader,
};
use scene_loader::core::config::LoaderConfig;
use scene_loader::environment::{
    EnvironmentLoaders, EnvironmentMapCache, EnvironmentSceneFactory, EnvironmentTexture,
    SetEnvironmentParams,
};
use scene_loader::foundation::math::Vec3;
use scene_loader::kernel::fixture::{KernelRecord, RonKernel};
use scene_loader::kernel::{
    AssetReference, CatalogAssets, CatalogItem, GeometrySpecification, KernelPlan,
    MaterialSpecification, MeshConstructionData, MeshSpecification, PlanElement, PlanElementType,
    PlanMaterialSource, PlanMesh, PlanObjectMesh, PlanWall, ShadingProperties, TextureProperties,
    TextureSlots, Vector3f, WallType,
};
use scene_loader::render::{Camera, Geometry, PhysicalMaterial, TextureStatus};
use scene_loader::scene::{
    is_wall_visible, MeshNode, SceneCache, SceneKind, SceneLoaders, SceneNode,
    SceneSourceContainer,
};

struct CrateAssets {
    requests: Cell<usize>,
}

impl AssetLoader for CrateAssets {
    fn load<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<LoadedAsset, LoadError>> {
        self.requests.set(self.requests.get() + 1);
        async move {
            // unit cube spanning 0..1 on every axis
            let geometry = Geometry {
                positions: vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
                ..Default::default()
            };
            let mut scene = SceneNode::group(url);
            scene.add_child(SceneNode::with_mesh(
                "crate",
                MeshNode::new(Rc::new(geometry), Rc::new(PhysicalMaterial::new())),
            ));
            Ok(LoadedAsset {
                scene,
                animations: vec![AnimationClip {
                    name: "lid".to_string(),
                    duration: 2.0,
                }],
            })
        }
        .boxed_local()
    }
}

fn write_png(dir: &Path, name: &str) {
    image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 120, 40, 255]))
        .save(dir.join(name))
        .unwrap();
}

fn triangle() -> GeometrySpecification {
    GeometrySpecification {
        indices: vec![0, 1, 2],
        vertices: vec![0.0, 0.0, 0.0, 1000.0, 0.0, 0.0, 0.0, 0.0, 1000.0],
        normals: vec![0.0, -1.0, 0.0, 0.0, -1.0, 0.0, 0.0, -1.0, 0.0],
        uv_coords: vec![0.0, 0.0, 1000.0, 0.0, 0.0, 1000.0],
        uv_transform: None,
    }
}

fn oak() -> MaterialSpecification {
    MaterialSpecification {
        id: "oak".to_string(),
        shading: ShadingProperties {
            version: Some("2".to_string()),
            roughness: Some(0.3),
            ..Default::default()
        },
        diffuse_map_has_alpha: false,
        textures: TextureSlots {
            diffuse: Some(TextureProperties {
                url: "oak.png".to_string(),
                mm_width: 500.0,
                mm_height: 500.0,
            }),
            ..Default::default()
        },
    }
}

fn configuration() -> MeshConstructionData {
    MeshConstructionData {
        material_properties: vec![oak()],
        meshes: vec![
            MeshSpecification {
                geometry: triangle(),
                material_id: "oak".to_string(),
                ..Default::default()
            },
            MeshSpecification {
                geometry: triangle(),
                material_id: "unknown".to_string(),
                environment_geometry: true,
                ..Default::default()
            },
        ],
        plan_components: Vec::new(),
    }
}

fn plan() -> KernelPlan {
    KernelPlan {
        materials: vec![oak()],
        elements: vec![PlanElement::Wall(PlanWall {
            id: 2,
            wall_type: WallType::OuterRight,
            left_normal: Vector3f { x: 0.0, y: -1.0, z: 0.0 },
            right_normal: Vector3f { x: 0.0, y: 1.0, z: 0.0 },
            center: Vector3f { x: 0.0, y: 2000.0, z: 1000.0 },
        })],
        meshes: vec![
            PlanMesh {
                id: 1,
                element_type: PlanElementType::Floor,
                material: PlanMaterialSource::Material("oak".to_string()),
                geometry: triangle(),
                position: [0.0, 0.0, 0.0],
            },
            PlanMesh {
                id: 2,
                element_type: PlanElementType::Wall,
                material: PlanMaterialSource::Rgb(0xff_00_00),
                geometry: triangle(),
                position: [0.0, 2000.0, 0.0],
            },
            PlanMesh {
                id: 3,
                element_type: PlanElementType::Ceiling,
                material: PlanMaterialSource::Unassigned,
                geometry: triangle(),
                position: [0.0, 0.0, 2500.0],
            },
        ],
        objects: vec![
            PlanObjectMesh {
                position: [1000.0, 0.0, 0.0],
                mesh: Some(configuration()),
                ..Default::default()
            },
            PlanObjectMesh {
                position: [0.0, -3000.0, 0.0],
                size: [2000.0, 1000.0, 500.0],
                catalog_item_id: Some("crate".to_string()),
                ..Default::default()
            },
        ],
        catalog_items: vec![CatalogItem {
            id: "crate".to_string(),
            scaleable: true,
            assets: CatalogAssets {
                glb: Some(AssetReference {
                    url: Some("https://cdn.example/crate.glb".to_string()),
                }),
            },
            ..Default::default()
        }],
    }
}

fn pipeline(dir: &Path) -> (SceneCache, Rc<CrateAssets>, Rc<Cell<usize>>) {
    scene_loader::foundation::logging::init_for_tests();
    let kernel = RonKernel::new(dir);
    kernel
        .save_record("brand:desk@cfg1", &KernelRecord::Configuration(configuration()))
        .unwrap();
    kernel.save_record("ps_office", &KernelRecord::Plan(plan())).unwrap();
    write_png(dir, "oak.png");

    let assets = Rc::new(CrateAssets {
        requests: Cell::new(0),
    });
    let refreshes = Rc::new(Cell::new(0));
    let counter = Rc::clone(&refreshes);
    let loaders = SceneLoaders::new(
        &LoaderConfig::default(),
        Rc::new(kernel),
        Rc::new(FileTextureLoader::with_root(dir)),
        assets.clone(),
    )
    .with_refresh(Rc::new(move || counter.set(counter.get() + 1)));
    (SceneCache::new(loaders), assets, refreshes)
}

#[test]
fn test_configuration_scene_and_textures() {
    let dir = tempfile::tempdir().unwrap();
    let (cache, _, _) = pipeline(dir.path());
    let mut sources = SceneSourceContainer::new();
    sources.add_ids(["brand:desk@cfg1"]);
    let source = &sources.scenes()[0];
    assert_eq!(source.kind, SceneKind::Configuration);

    let entry = pollster::block_on(cache.get_or_load(source)).unwrap();
    let scene = &entry.scene_object;
    assert_eq!(scene.name, "brand:desk@cfg1");
    assert_eq!(scene.mesh_count(), 2);

    let oak = scene.children[0].mesh.as_ref().unwrap();
    assert!(oak.cast_shadow);
    assert_relative_eq!(oak.material.roughness, 0.3);
    let backdrop = scene.children[1].mesh.as_ref().unwrap();
    assert!(!backdrop.cast_shadow && backdrop.receive_shadow);

    let handle = oak.material.textures.map.clone().unwrap();
    assert_eq!(handle.status(), TextureStatus::Placeholder);
    pollster::block_on(cache.take_pending_textures().run());
    assert_eq!(handle.status(), TextureStatus::Loaded);
    let texture = handle.current().unwrap();
    assert_eq!((texture.image.width, texture.image.height), (4, 4));
    assert_relative_eq!(texture.sampling.repeat.x, 1.0 / 500.0);
}

#[test]
fn test_plan_scene_assembly() {
    let dir = tempfile::tempdir().unwrap();
    let (cache, assets, refreshes) = pipeline(dir.path());
    let mut sources = SceneSourceContainer::new();
    sources.add_ids(["ps_office"]);

    let entry = pollster::block_on(cache.get_or_load(&sources.scenes()[0])).unwrap();
    assert_eq!(entry.kind, SceneKind::Plan);
    let scene = &entry.scene_object;

    // floor, wall, configurable object, static object; the ceiling is skipped
    assert_eq!(scene.children.len(), 4);
    assert!(scene.children[0].user_data.plan_floor);
    let wall = &scene.children[1];
    assert!(wall.user_data.plan_wall);
    assert_relative_eq!(wall.transform.position, Vec3::new(0.0, 0.0, -2.0));

    let wall_model = wall.user_data.wall_model.as_ref().unwrap();
    let inside = Camera::new(Vec3::zeros(), Vec3::new(0.0, 0.0, -5.0));
    let outside = Camera::new(Vec3::new(0.0, 0.0, -10.0), Vec3::zeros());
    assert!(is_wall_visible(&inside, wall_model));
    assert!(!is_wall_visible(&outside, wall_model));

    let configurable = &scene.children[2];
    assert_relative_eq!(configurable.transform.position, Vec3::new(1.0, 0.0, 0.0));
    assert_eq!(configurable.mesh_count(), 2);

    let crate_node = &scene.children[3];
    assert_relative_eq!(crate_node.transform.position, Vec3::new(0.0, 0.0, 3.0));
    let scaled = &crate_node.children[0];
    assert_relative_eq!(scaled.transform.scale, Vec3::new(2.0, 0.5, 1.0), epsilon = 1e-6);
    let bounds = crate_node.bounding_box().unwrap();
    assert_relative_eq!(bounds.min.y, 0.0, epsilon = 1e-6);

    assert_eq!(assets.requests.get(), 1);
    assert_eq!(refreshes.get(), 1);

    let again = pollster::block_on(cache.get_or_load(&sources.scenes()[0])).unwrap();
    assert!(Rc::ptr_eq(&entry, &again));
    assert_eq!(refreshes.get(), 1);
}

#[test]
fn test_missing_fixture_is_reported_and_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let (cache, _, _) = pipeline(dir.path());
    let mut sources = SceneSourceContainer::new();
    sources.add_ids(["ps_unknown"]);

    assert!(pollster::block_on(cache.get_or_load(&sources.scenes()[0])).is_err());
    assert!(cache.is_empty());
}

struct Studio;

impl EnvironmentSceneFactory for Studio {
    fn build_scene(&self) -> SceneNode {
        SceneNode::group("studio")
    }
}

struct RecordingPanoramas {
    textures: FileTextureLoader,
    urls: RefCell<Vec<String>>,
}

impl scene_loader::environment::EnvironmentLoader for RecordingPanoramas {
    fn load<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<EnvironmentTexture, LoadError>> {
        self.urls.borrow_mut().push(url.to_string());
        async move {
            let texture = self.textures.load(url).await?;
            Ok(EnvironmentTexture::Equirectangular(Rc::new(texture)))
        }
        .boxed_local()
    }
}

#[test]
fn test_environment_selection() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "lobby.png");
    let panoramas = Rc::new(RecordingPanoramas {
        textures: FileTextureLoader::with_root(dir.path()),
        urls: RefCell::new(Vec::new()),
    });
    let loaders = EnvironmentLoaders {
        exr: panoramas.clone(),
        hdr: panoramas.clone(),
        envmap: panoramas.clone(),
    };
    let mut config = LoaderConfig::default();
    config.environment.resources = vec!["lobby.png".to_string()];
    let environments = EnvironmentMapCache::new(&config.environment, loaders);
    environments.load_default_environment(true, Rc::new(Studio), None);

    let params = SetEnvironmentParams {
        show_environment: true,
        rotation: None,
        intensity: Some(0.8),
    };
    assert!(pollster::block_on(environments.set_environment(params)).unwrap());
    assert_relative_eq!(environments.current_environment().unwrap().intensity(), 0.8);
    assert!(environments.show_background());

    // registered, but not an environment format
    environments.select("lobby.png");
    assert!(pollster::block_on(environments.set_environment(params)).is_ok());
    assert!(environments.current_environment().is_none());
    assert!(panoramas.urls.borrow().is_empty());

    // a panorama registered under an .hdr name is routed to the panorama loader
    std::fs::copy(dir.path().join("lobby.png"), dir.path().join("lobby_hdr.png")).unwrap();
    let loaded = pollster::block_on(environments.load_from_resource("lobby.hdr", "lobby_hdr.png", true));
    assert!(loaded.unwrap());
    assert!(pollster::block_on(environments.set_environment(params)).unwrap());
    let current = environments.current_environment().unwrap();
    assert_eq!(current.equirectangular_texture().unwrap().image.width, 4);
    assert_eq!(
        environments.environment_names(),
        vec!["room environment", "lobby.hdr", "lobby.png"]
    );
}
