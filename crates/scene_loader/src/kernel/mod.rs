//! Kernel data model
//!
//! Records emitted by the external geometry kernel, in kernel space
//! (millimetres, Z up), plus the [`Kernel`] trait the loaders query. Records
//! use the kernel's own field names so its output can be replayed verbatim.

pub mod fixture;

use std::collections::BTreeMap;

use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::render::Color;

pub use fixture::{KernelRecord, RonKernel};

/// Errors raised by a kernel query
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    /// No configuration or plan with this id
    #[error("Kernel has no data for '{0}'")]
    NotFound(String),

    /// Data exists but could not be decoded
    #[error("Malformed kernel data for '{id}': {reason}")]
    Malformed {
        /// Queried id
        id: String,
        /// Decoder message
        reason: String,
    },

    /// The kernel itself failed
    #[error("Kernel query failed: {0}")]
    QueryFailed(String),
}

/// Geometry/configuration kernel
pub trait Kernel {
    /// Build mesh construction data for a configuration id
    fn construct_mesh<'a>(
        &'a self,
        configuration_id: &'a str,
    ) -> LocalBoxFuture<'a, Result<MeshConstructionData, KernelError>>;

    /// Load a floor plan and build its element geometry
    fn load_plan<'a>(&'a self, plan_id: &'a str)
        -> LocalBoxFuture<'a, Result<KernelPlan, KernelError>>;
}

/// Per-instance material attribute overrides, string to string
pub type MaterialAttributes = BTreeMap<String, String>;

/// sRGB color in 0..1 as the kernel reports it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RgbColor {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
}

impl RgbColor {
    /// Linear renderer color
    pub fn to_linear(self) -> Color {
        Color::from_srgb(self.r, self.g, self.b)
    }
}

/// Kernel-space vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3f {
    /// X
    pub x: f32,
    /// Y
    pub y: f32,
    /// Z
    pub z: f32,
}

impl From<Vector3f> for [f32; 3] {
    fn from(v: Vector3f) -> Self {
        [v.x, v.y, v.z]
    }
}

/// Raw triangle buffers of one mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeometrySpecification {
    /// Triangle indices
    pub indices: Vec<u32>,
    /// Positions, xyz in millimetres
    pub vertices: Vec<f32>,
    /// Normals, xyz
    pub normals: Vec<f32>,
    /// UV pairs
    pub uv_coords: Vec<f32>,
    /// Packed 2×3 UV affine transform
    pub uv_transform: Option<[f32; 6]>,
}

/// One mesh of a configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeshSpecification {
    /// Triangle buffers
    pub geometry: GeometrySpecification,
    /// Local placement, 16 floats row-major in kernel space
    pub transform: Option<[f32; 16]>,
    /// Referenced material
    pub material_id: String,
    /// Owning plan component, if the mesh belongs to one
    pub runtime_component_id: Option<u32>,
    /// Backdrop geometry that never casts shadows
    pub environment_geometry: bool,
    /// Per-instance material overrides
    pub material_attributes: Option<MaterialAttributes>,
}

/// Placement of a plan component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanComponent {
    /// Runtime component id referenced by meshes
    pub id: u32,
    /// Global placement, 16 floats row-major in kernel space
    pub global_transform: [f32; 16],
}

/// Everything the kernel emits for one configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeshConstructionData {
    /// Materials referenced by the meshes
    pub material_properties: Vec<MaterialSpecification>,
    /// Meshes
    pub meshes: Vec<MeshSpecification>,
    /// Plan components the meshes are placed by
    pub plan_components: Vec<PlanComponent>,
}

/// Shading parameters of a kernel material
///
/// A missing or `"1"` version is the legacy schema; versions `"2"` and
/// `"2.x"` are the modern one.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShadingProperties {
    pub version: Option<String>,
    #[serde(rename = "basecolor")]
    pub base_color: Option<RgbColor>,
    pub alpha: Option<f32>,
    pub alpha_cutoff: Option<f32>,
    pub metallic: Option<f32>,
    pub roughness: Option<f32>,
    pub occlusion: Option<f32>,
    pub transmission: Option<f32>,
    #[serde(rename = "transmissionIOR")]
    pub transmission_ior: Option<f32>,
    pub double_sided: Option<bool>,
    pub specular_color: Option<RgbColor>,
    #[serde(rename = "specularity")]
    pub specular_intensity: Option<f32>,
    pub emissive_color: Option<RgbColor>,
    pub emissive_intensity: Option<f32>,
    pub clearcoat_intensity: Option<f32>,
    pub clearcoat_roughness: Option<f32>,
    pub clearcoat_normal_scale: Option<f32>,
    pub sheen_color: Option<RgbColor>,
    pub sheen_intensity: Option<f32>,
    pub sheen_roughness: Option<f32>,
    #[serde(rename = "thicknessFactor")]
    pub thickness: Option<f32>,
    pub attenuation_color: Option<RgbColor>,
    pub attenuation_distance: Option<f32>,
}

/// One texture slot: image URL plus physical tile size
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextureProperties {
    /// Image URL
    pub url: String,
    /// Tile width in millimetres, 0 when unknown
    pub mm_width: f32,
    /// Tile height in millimetres, 0 when unknown
    pub mm_height: f32,
}

/// Texture slots of a kernel material
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureSlots {
    /// Base color
    pub diffuse: Option<TextureProperties>,
    /// Tangent-space normals
    pub normal: Option<TextureProperties>,
    /// Occlusion, roughness and metalness packed in r, g, b
    pub orm: Option<TextureProperties>,
    /// Emissive color
    pub emissive: Option<TextureProperties>,
    /// Clearcoat roughness
    pub clearcoat_roughness: Option<TextureProperties>,
    /// Clearcoat normals
    pub clearcoat_normal: Option<TextureProperties>,
    /// Sheen roughness
    pub sheen_roughness: Option<TextureProperties>,
    /// Sheen color
    pub sheen_color: Option<TextureProperties>,
    /// Thickness and transmission packed
    pub thickness_transmission: Option<TextureProperties>,
}

/// Kernel material description
///
/// On the wire the texture slots sit next to `shading` as `diffuseMap`,
/// `normalMap`, `ormMap`, `emrgbMap`, `ccrgMap`, `ccxyzMap`, `shrgbaMap`,
/// `sprgbaMap` and `ttrgMap`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "MaterialRecord", into = "MaterialRecord")]
pub struct MaterialSpecification {
    /// Material id, unique within one kernel query
    pub id: String,
    /// Shading parameters
    pub shading: ShadingProperties,
    /// Whether the diffuse image carries alpha
    pub diffuse_map_has_alpha: bool,
    /// Texture slots
    pub textures: TextureSlots,
}

#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MaterialRecord {
    id: String,
    shading: ShadingProperties,
    diffuse_map_has_alpha: bool,
    diffuse_map: Option<TextureProperties>,
    normal_map: Option<TextureProperties>,
    orm_map: Option<TextureProperties>,
    emrgb_map: Option<TextureProperties>,
    ccrg_map: Option<TextureProperties>,
    ccxyz_map: Option<TextureProperties>,
    shrgba_map: Option<TextureProperties>,
    sprgba_map: Option<TextureProperties>,
    ttrg_map: Option<TextureProperties>,
}

impl From<MaterialRecord> for MaterialSpecification {
    fn from(record: MaterialRecord) -> Self {
        Self {
            id: record.id,
            shading: record.shading,
            diffuse_map_has_alpha: record.diffuse_map_has_alpha,
            textures: TextureSlots {
                diffuse: record.diffuse_map,
                normal: record.normal_map,
                orm: record.orm_map,
                emissive: record.emrgb_map,
                clearcoat_roughness: record.ccrg_map,
                clearcoat_normal: record.ccxyz_map,
                sheen_roughness: record.shrgba_map,
                sheen_color: record.sprgba_map,
                thickness_transmission: record.ttrg_map,
            },
        }
    }
}

impl From<MaterialSpecification> for MaterialRecord {
    fn from(spec: MaterialSpecification) -> Self {
        let slots = spec.textures;
        Self {
            id: spec.id,
            shading: spec.shading,
            diffuse_map_has_alpha: spec.diffuse_map_has_alpha,
            diffuse_map: slots.diffuse,
            normal_map: slots.normal,
            orm_map: slots.orm,
            emrgb_map: slots.emissive,
            ccrg_map: slots.clearcoat_roughness,
            ccxyz_map: slots.clearcoat_normal,
            shrgba_map: slots.sheen_roughness,
            sprgba_map: slots.sheen_color,
            ttrg_map: slots.thickness_transmission,
        }
    }
}

/// Kind of a plan element or plan mesh
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanElementType {
    Wall,
    Floor,
    Ceiling,
    Other,
}

/// Wall classification used for visibility culling
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallType {
    Inner,
    OuterLeft,
    OuterRight,
}

/// Wall placement data
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanWall {
    pub id: u32,
    pub wall_type: WallType,
    pub left_normal: Vector3f,
    pub right_normal: Vector3f,
    pub center: Vector3f,
}

/// Structural element of a plan
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanElement {
    Wall(PlanWall),
    Floor { id: u32 },
    Ceiling { id: u32 },
}

impl PlanElement {
    /// Element id
    pub fn id(&self) -> u32 {
        match self {
            PlanElement::Wall(wall) => wall.id,
            PlanElement::Floor { id } | PlanElement::Ceiling { id } => *id,
        }
    }
}

/// Where a plan mesh takes its material from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum PlanMaterialSource {
    /// No material assigned
    #[default]
    Unassigned,
    /// Reference into the plan's material list
    Material(String),
    /// Packed sRGB `0xRRGGBB`
    Rgb(u32),
    /// Catalog item whose top image is tiled over the mesh
    CatalogItem(String),
}

/// Renderable surface of a plan element
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanMesh {
    /// Id of the plan element this mesh belongs to
    pub id: u32,
    pub element_type: PlanElementType,
    #[serde(default)]
    pub material: PlanMaterialSource,
    pub geometry: GeometrySpecification,
    /// Kernel-space position
    pub position: [f32; 3],
}

/// Kernel bounding box of configuration geometry
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxOfGeometry {
    pub origin: Vector3f,
    pub size: Vector3f,
}

/// Object placed in a plan
///
/// Objects with `mesh` are configurable and built from kernel geometry;
/// objects with only a `catalog_item_id` are static catalog assets.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanObjectMesh {
    /// Kernel-space position
    pub position: [f32; 3],
    /// Yaw in radians
    pub rotation: f32,
    /// Kernel-space nominal size
    pub size: [f32; 3],
    pub mesh: Option<MeshConstructionData>,
    pub box_of_geometry: Option<BoxOfGeometry>,
    pub catalog_item_id: Option<String>,
    pub flip_x: bool,
    pub flip_y: bool,
    /// Packed sRGB color, 0 when unset
    pub custom_color: u32,
}

/// Packed asset reference of a catalog item
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetReference {
    pub url: Option<String>,
}

/// Downloadable assets of a catalog item
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogAssets {
    pub glb: Option<AssetReference>,
}

/// Catalog item referenced by plan objects and plan materials
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogItem {
    pub id: String,
    pub top_image: Option<String>,
    /// Millimetres
    pub width: Option<f32>,
    /// Millimetres
    pub depth: Option<f32>,
    /// Millimetres
    pub height: Option<f32>,
    pub scaleable: bool,
    pub colorable: bool,
    pub assets: CatalogAssets,
    pub three_dimensional_asset: Option<String>,
    pub three_dimensional_asset_web: Option<String>,
}

/// Everything the kernel emits for one plan
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KernelPlan {
    pub materials: Vec<MaterialSpecification>,
    pub elements: Vec<PlanElement>,
    pub meshes: Vec<PlanMesh>,
    pub objects: Vec<PlanObjectMesh>,
    pub catalog_items: Vec<CatalogItem>,
}

impl KernelPlan {
    /// Look up a catalog item by id
    pub fn catalog_item(&self, id: &str) -> Option<&CatalogItem> {
        self.catalog_items.iter().find(|item| item.id == id)
    }
}
