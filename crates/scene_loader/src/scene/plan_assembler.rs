//! Plan scene assembly
//!
//! A kernel plan becomes one scene group holding:
//!
//! - **Plan meshes**: walls and floors with their materials and wall models
//! - **Configurable objects**: kernel meshes built by the [`MeshFactory`]
//! - **Static objects**: catalog assets fetched through the [`AssetLoader`]
//!
//! Objects are recentered on their bottom center and placed by a positioning
//! node carrying the kernel position and yaw. Ceilings are not rendered.

use std::collections::HashMap;
use std::rc::Rc;

use futures::future::join_all;

use crate::assets::{catalog_asset_url, AssetLoader, LoadError, MaterialCache};
use crate::foundation::math::{Transform, Vec2, Vec3};
use crate::kernel::{
    CatalogItem, KernelPlan, PlanElement, PlanElementType, PlanMaterialSource, PlanMesh,
    PlanObjectMesh,
};
use crate::render::coordinates::vector_from_kernel;
use crate::render::{
    Color, PhysicalMaterial, Side, TextureBinding, TextureChannels, TextureHandle, TextureLoads,
    TextureSampling, WrapMode,
};
use crate::scene::mesh_factory::{instantiate, MeshFactory};
use crate::scene::wall_model::WallModel;
use crate::scene::{MeshNode, SceneNode};

/// Callback asking the host to redraw
pub type RefreshCallback = Rc<dyn Fn()>;

/// Assembled plan scene
#[derive(Debug)]
pub struct AssembledPlan {
    /// Root group of the plan
    pub scene: SceneNode,
    /// Texture loads the plan's materials are waiting on
    pub textures: TextureLoads,
}

/// Builds plan scenes
pub struct PlanAssembler {
    factory: Rc<MeshFactory>,
    assets: Rc<dyn AssetLoader>,
    refresh: Option<RefreshCallback>,
}

impl PlanAssembler {
    /// Create an assembler building objects with `factory` and `assets`
    pub fn new(factory: Rc<MeshFactory>, assets: Rc<dyn AssetLoader>) -> Self {
        Self {
            factory,
            assets,
            refresh: None,
        }
    }

    /// Fire `refresh` once after the static objects of a plan have landed
    pub fn with_refresh(mut self, refresh: RefreshCallback) -> Self {
        self.refresh = Some(refresh);
        self
    }

    /// Build the scene of `plan`
    pub async fn assemble(&self, plan: &KernelPlan) -> AssembledPlan {
        log_plan(plan);

        let mut textures = TextureLoads::new();
        let mut materials = MaterialCache::new();
        for specification in &plan.materials {
            materials.resolve_or_get(self.factory.resolver(), specification, &mut textures);
        }

        let mut scene = SceneNode::group("plan");
        self.add_plan_meshes(plan, &materials, &mut scene, &mut textures);
        self.add_configurable_objects(plan, &mut scene, &mut textures);
        self.add_static_objects(plan, &mut scene).await;

        log::info!(
            "Assembled plan: {} nodes with meshes, {} texture loads",
            scene.mesh_count(),
            textures.len()
        );
        AssembledPlan { scene, textures }
    }

    fn add_plan_meshes(
        &self,
        plan: &KernelPlan,
        materials: &MaterialCache,
        scene: &mut SceneNode,
        textures: &mut TextureLoads,
    ) {
        let walls: HashMap<u32, WallModel> = plan
            .elements
            .iter()
            .filter_map(|element| match element {
                PlanElement::Wall(wall) => Some((wall.id, WallModel::from_kernel(wall))),
                _ => None,
            })
            .collect();
        let default = Rc::new(PhysicalMaterial::new().with_color(Color::WHITE).with_side(Side::Double));
        let floor_default = Rc::new(PhysicalMaterial::new());

        for mesh in &plan.meshes {
            if mesh.element_type == PlanElementType::Ceiling {
                continue;
            }
            let fallback = if mesh.element_type == PlanElementType::Floor {
                &floor_default
            } else {
                &default
            };
            let material = self
                .plan_mesh_material(plan, mesh, materials, textures)
                .unwrap_or_else(|| Rc::clone(fallback));

            let geometry = Rc::new(self.factory.geometry_builder().build(&mesh.geometry));
            let mut mesh_node = MeshNode::new(geometry, material);
            mesh_node.cast_shadow = true;
            mesh_node.receive_shadow = true;

            let mut node = SceneNode::with_mesh(format!("plan mesh {}", mesh.id), mesh_node);
            node.transform = Transform::from_position(vector_from_kernel(mesh.position));
            match mesh.element_type {
                PlanElementType::Floor => node.user_data.plan_floor = true,
                PlanElementType::Wall => {
                    node.user_data.plan_wall = true;
                    node.user_data.wall_model = walls.get(&mesh.id).cloned();
                }
                _ => {}
            }
            scene.add_child(node);
        }
    }

    fn plan_mesh_material(
        &self,
        plan: &KernelPlan,
        mesh: &PlanMesh,
        materials: &MaterialCache,
        textures: &mut TextureLoads,
    ) -> Option<Rc<PhysicalMaterial>> {
        match &mesh.material {
            PlanMaterialSource::Material(id) => materials.get(id),
            PlanMaterialSource::Rgb(hex) => Some(Rc::new(
                PhysicalMaterial::new().with_color(Color::from_srgb_hex(*hex)),
            )),
            PlanMaterialSource::CatalogItem(id) => {
                let item = plan.catalog_item(id)?;
                self.catalog_item_material(item, textures)
            }
            PlanMaterialSource::Unassigned => None,
        }
    }

    /// Material tiling a catalog item's top image once per item footprint
    fn catalog_item_material(
        &self,
        item: &CatalogItem,
        textures: &mut TextureLoads,
    ) -> Option<Rc<PhysicalMaterial>> {
        let url = item.top_image.as_ref().filter(|url| !url.is_empty())?;
        // UVs are in millimetres, like the item size
        let per_mm = |mm: Option<f32>| mm.filter(|v| *v > 0.0).map_or(1.0, |v| 1.0 / v);
        let handle = TextureHandle::new(TextureBinding {
            url: Some(url.clone()),
            sampling: TextureSampling {
                wrap: WrapMode::Repeat,
                repeat: Vec2::new(per_mm(item.width), per_mm(item.depth)),
                ..TextureSampling::default()
            },
        });
        if let Some(task) = handle.load_task(Rc::clone(self.factory.resolver().loader())) {
            textures.push(task);
        }

        let mut material = PhysicalMaterial::new().with_name(item.id.as_str());
        material.roughness = 0.5;
        material.metalness = 0.1;
        material.textures.bind(TextureChannels::MAP, &handle);
        Some(Rc::new(material))
    }

    fn add_configurable_objects(
        &self,
        plan: &KernelPlan,
        scene: &mut SceneNode,
        textures: &mut TextureLoads,
    ) {
        for object in &plan.objects {
            let Some(data) = &object.mesh else {
                continue;
            };
            let scene_data = self.factory.assemble(data);
            textures.append(scene_data.textures);

            let mut node = instantiate(&scene_data.meshes);
            let offset = match &object.box_of_geometry {
                Some(hint) => vector_from_kernel([
                    hint.origin.x + hint.size.x / 2.0,
                    hint.origin.y + hint.size.y / 2.0,
                    hint.origin.z,
                ]),
                None => bottom_center(&node),
            };
            node.transform.position -= offset;
            scene.add_child(positioned(object, node));
        }
    }

    async fn add_static_objects(&self, plan: &KernelPlan, scene: &mut SceneNode) {
        let loads = plan
            .objects
            .iter()
            .filter(|object| object.mesh.is_none())
            .filter_map(|object| {
                let item = plan.catalog_item(object.catalog_item_id.as_deref()?)?;
                Some(self.load_static_object(object, item))
            });

        for (item_id, result) in join_all(loads).await {
            match result {
                Ok(Some(node)) => scene.add_child(node),
                Ok(None) => log::debug!("Catalog item {item_id} has nothing to show"),
                Err(err) => log::warn!("Skipping catalog item {item_id}: {err}"),
            }
        }

        if let Some(refresh) = &self.refresh {
            refresh();
        }
    }

    async fn load_static_object(
        &self,
        object: &PlanObjectMesh,
        item: &CatalogItem,
    ) -> (String, Result<Option<SceneNode>, LoadError>) {
        let result = self.build_static_object(object, item).await;
        (item.id.clone(), result)
    }

    async fn build_static_object(
        &self,
        object: &PlanObjectMesh,
        item: &CatalogItem,
    ) -> Result<Option<SceneNode>, LoadError> {
        let Some(url) = catalog_asset_url(item) else {
            return Ok(None);
        };
        let mut root = self.assets.load(&url).await?.scene;
        if root.children.is_empty() && root.mesh.is_none() {
            return Ok(None);
        }

        let mut scale = root.transform.scale;
        if item.scaleable {
            if let Some(bounds) = root.bounding_box() {
                let target = vector_from_kernel(object.size).abs();
                let size = bounds.size();
                let ratio = |t: f32, s: f32| if s > 0.0 { t / s } else { 1.0 };
                scale = Vec3::new(
                    ratio(target.x, size.x),
                    ratio(target.y, size.y),
                    ratio(target.z, size.z),
                );
            }
        }
        if object.flip_x {
            scale.x *= -1.0;
        }
        if object.flip_y {
            scale.z *= -1.0;
        }
        root.transform.scale = scale;

        if item.colorable && object.custom_color > 0 {
            let color = Color::from_srgb_hex(object.custom_color);
            root.map_materials(&mut |material| {
                material.is_physical().then(|| PhysicalMaterial {
                    color,
                    roughness: 0.5,
                    metalness: 0.1,
                    ..material.clone()
                })
            });
        }
        root.traverse_mut(&mut |node| {
            if let Some(mesh) = node.mesh.as_mut() {
                mesh.cast_shadow = true;
                mesh.receive_shadow = true;
            }
        });

        let offset = bottom_center(&root);
        root.transform.position -= offset;
        Ok(Some(positioned(object, root)))
    }
}

/// Bottom center of a subtree's bounding box, origin when it has none
fn bottom_center(node: &SceneNode) -> Vec3 {
    node.bounding_box().map_or_else(Vec3::zeros, |bounds| {
        let center = bounds.center();
        Vec3::new(center.x, bounds.min.y, center.z)
    })
}

/// Wrap `node` in a group at the object's position and yaw
fn positioned(object: &PlanObjectMesh, node: SceneNode) -> SceneNode {
    let mut group = SceneNode::group(node.name.clone());
    group.transform = Transform::from_position_yaw(vector_from_kernel(object.position), object.rotation);
    group.add_child(node);
    group
}

fn log_plan(plan: &KernelPlan) {
    for item in &plan.catalog_items {
        log::debug!("Loaded catalog item {}", item.id);
    }
    log::info!(
        "Plan: {} elements, {} meshes, {} objects, {} materials",
        plan.elements.len(),
        plan.meshes.len(),
        plan.objects.len(),
        plan.materials.len()
    );
}
