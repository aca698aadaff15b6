//! Kernel mesh payloads to scene nodes
//!
//! [`MeshFactory::assemble`] resolves materials and builds geometry for one
//! kernel query; [`instantiate`] turns the result into a scene subtree.

use std::rc::Rc;

use crate::assets::{apply_overrides, GeometryBuilder, MaterialCache, MaterialResolver};
use crate::foundation::math::{Mat4, Transform};
use crate::kernel::{MeshConstructionData, MeshSpecification, PlanComponent};
use crate::render::coordinates::matrix_from_kernel;
use crate::render::{Color, Geometry, PhysicalMaterial, Side, TextureLoads};
use crate::scene::{MeshNode, SceneNode};

/// Flat stand-in for meshes whose material id resolves to nothing
const FALLBACK_GRAY: u32 = 0x80_80_80;

/// One renderable mesh ready to be placed
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryAndMaterial {
    /// Renderer-space geometry
    pub geometry: Rc<Geometry>,
    /// Material after per-mesh overrides
    pub material: Rc<PhysicalMaterial>,
    /// Placement, `global(component) * local(mesh)`
    pub transform: Mat4,
    /// Kernel material id the mesh asked for
    pub material_id: String,
    /// Environment geometry does not cast shadows
    pub environment: bool,
}

/// A resolved kernel material
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialData {
    /// Kernel material id
    pub material_id: String,
    /// Shared material
    pub material: Rc<PhysicalMaterial>,
}

/// Output of one kernel query
#[derive(Debug, Default)]
pub struct SceneData {
    /// Meshes in kernel order
    pub meshes: Vec<GeometryAndMaterial>,
    /// Every distinct resolved material
    pub materials: Vec<MaterialData>,
    /// Texture loads the materials are waiting on
    pub textures: TextureLoads,
}

/// Builds renderer meshes from kernel mesh construction data
pub struct MeshFactory {
    resolver: Rc<MaterialResolver>,
    geometry: GeometryBuilder,
}

impl MeshFactory {
    /// Create a factory resolving materials with `resolver`
    pub fn new(resolver: Rc<MaterialResolver>) -> Self {
        Self {
            resolver,
            geometry: GeometryBuilder::new(),
        }
    }

    /// Material resolver in use
    pub fn resolver(&self) -> &Rc<MaterialResolver> {
        &self.resolver
    }

    /// Geometry builder in use
    pub fn geometry_builder(&self) -> &GeometryBuilder {
        &self.geometry
    }

    /// Resolve materials and build every mesh of `data`
    pub fn assemble(&self, data: &MeshConstructionData) -> SceneData {
        let mut cache = MaterialCache::new();
        let mut textures = TextureLoads::new();
        let mut materials = Vec::new();

        for specification in &data.material_properties {
            if cache.get(&specification.id).is_some() {
                continue;
            }
            let material = cache.resolve_or_get(&self.resolver, specification, &mut textures);
            materials.push(MaterialData {
                material_id: specification.id.clone(),
                material,
            });
        }

        let gray = Rc::new(
            PhysicalMaterial::lambert(Color::from_srgb_hex(FALLBACK_GRAY)).with_side(Side::Double),
        );

        let meshes = data
            .meshes
            .iter()
            .map(|mesh| {
                let base = cache.get(&mesh.material_id).unwrap_or_else(|| {
                    log::debug!("No material '{}', using gray fallback", mesh.material_id);
                    Rc::clone(&gray)
                });
                GeometryAndMaterial {
                    geometry: Rc::new(self.geometry.build(&mesh.geometry)),
                    material: apply_overrides(&base, mesh.material_attributes.as_ref()),
                    transform: mesh_transform(&data.plan_components, mesh),
                    material_id: mesh.material_id.clone(),
                    environment: mesh.environment_geometry,
                }
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Assembled {} meshes with {} materials",
            meshes.len(),
            materials.len()
        );

        SceneData {
            meshes,
            materials,
            textures,
        }
    }
}

/// Placement of a mesh: its plan component's global transform, then its own
fn mesh_transform(components: &[PlanComponent], mesh: &MeshSpecification) -> Mat4 {
    let global = mesh
        .runtime_component_id
        .and_then(|id| components.iter().find(|component| component.id == id))
        .map_or_else(Mat4::identity, |component| {
            matrix_from_kernel(&component.global_transform)
        });
    match &mesh.transform {
        Some(local) => global * matrix_from_kernel(local),
        None => global,
    }
}

/// Scene subtree with one mesh node per package
pub fn instantiate(meshes: &[GeometryAndMaterial]) -> SceneNode {
    let mut group = SceneNode::group("configuration");
    for item in meshes {
        let mut mesh = MeshNode::new(Rc::clone(&item.geometry), Rc::clone(&item.material));
        mesh.cast_shadow = !item.environment;
        mesh.receive_shadow = true;

        let mut node = SceneNode::with_mesh(item.material_id.as_str(), mesh);
        node.transform = Transform::from_matrix(&item.transform);
        group.add_child(node);
    }
    group
}
