//! Renderer material
//!
//! A physically based material in the metal/rough model with the clearcoat,
//! sheen, transmission and attenuation extensions, plus a flat Lambert
//! variant for fallbacks. Materials are immutable once shared behind an
//! `Rc`; texture slots change through their [`TextureHandle`]s instead.

use std::rc::Rc;

use bitflags::bitflags;

use super::{Color, TextureHandle};
use crate::kernel::{MaterialAttributes, MaterialSpecification};

/// Lighting model a material is shaded with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadingModel {
    /// Full physically based shading
    #[default]
    Physical,
    /// Diffuse-only shading
    Lambert,
}

/// Faces a material renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    /// Front faces only
    #[default]
    Front,
    /// Both faces
    Double,
}

bitflags! {
    /// Material texture channels
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextureChannels: u16 {
        /// Base color
        const MAP = 1 << 0;
        /// Normal map
        const NORMAL = 1 << 1;
        /// Ambient occlusion
        const AO = 1 << 2;
        /// Roughness
        const ROUGHNESS = 1 << 3;
        /// Metalness
        const METALNESS = 1 << 4;
        /// Emissive color
        const EMISSIVE = 1 << 5;
        /// Clearcoat roughness
        const CLEARCOAT_ROUGHNESS = 1 << 6;
        /// Clearcoat normals
        const CLEARCOAT_NORMAL = 1 << 7;
        /// Sheen roughness
        const SHEEN_ROUGHNESS = 1 << 8;
        /// Sheen color
        const SHEEN_COLOR = 1 << 9;
        /// Thickness
        const THICKNESS = 1 << 10;
        /// Transmission
        const TRANSMISSION = 1 << 11;

        /// Packed occlusion/roughness/metalness
        const ORM = Self::AO.bits() | Self::ROUGHNESS.bits() | Self::METALNESS.bits();
        /// Packed thickness/transmission
        const THICKNESS_TRANSMISSION = Self::THICKNESS.bits() | Self::TRANSMISSION.bits();
    }
}

/// Texture bindings for this material
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialTextures {
    /// Base color texture
    pub map: Option<TextureHandle>,
    /// Normal map texture
    pub normal_map: Option<TextureHandle>,
    /// Ambient occlusion texture
    pub ao_map: Option<TextureHandle>,
    /// Roughness texture
    pub roughness_map: Option<TextureHandle>,
    /// Metalness texture
    pub metalness_map: Option<TextureHandle>,
    /// Emissive texture
    pub emissive_map: Option<TextureHandle>,
    /// Clearcoat roughness texture
    pub clearcoat_roughness_map: Option<TextureHandle>,
    /// Clearcoat normal texture
    pub clearcoat_normal_map: Option<TextureHandle>,
    /// Sheen roughness texture
    pub sheen_roughness_map: Option<TextureHandle>,
    /// Sheen color texture
    pub sheen_color_map: Option<TextureHandle>,
    /// Thickness texture
    pub thickness_map: Option<TextureHandle>,
    /// Transmission texture
    pub transmission_map: Option<TextureHandle>,
}

impl MaterialTextures {
    /// Create empty texture bindings
    pub fn new() -> Self {
        Self::default()
    }

    fn slots_mut(&mut self) -> [(TextureChannels, &mut Option<TextureHandle>); 12] {
        [
            (TextureChannels::MAP, &mut self.map),
            (TextureChannels::NORMAL, &mut self.normal_map),
            (TextureChannels::AO, &mut self.ao_map),
            (TextureChannels::ROUGHNESS, &mut self.roughness_map),
            (TextureChannels::METALNESS, &mut self.metalness_map),
            (TextureChannels::EMISSIVE, &mut self.emissive_map),
            (TextureChannels::CLEARCOAT_ROUGHNESS, &mut self.clearcoat_roughness_map),
            (TextureChannels::CLEARCOAT_NORMAL, &mut self.clearcoat_normal_map),
            (TextureChannels::SHEEN_ROUGHNESS, &mut self.sheen_roughness_map),
            (TextureChannels::SHEEN_COLOR, &mut self.sheen_color_map),
            (TextureChannels::THICKNESS, &mut self.thickness_map),
            (TextureChannels::TRANSMISSION, &mut self.transmission_map),
        ]
    }

    /// Bind `handle` to every channel in `channels`
    pub fn bind(&mut self, channels: TextureChannels, handle: &TextureHandle) {
        for (channel, slot) in self.slots_mut() {
            if channels.contains(channel) {
                *slot = Some(handle.clone());
            }
        }
    }

    /// Channels that currently have a texture bound
    pub fn bound_channels(&self) -> TextureChannels {
        [
            (TextureChannels::MAP, &self.map),
            (TextureChannels::NORMAL, &self.normal_map),
            (TextureChannels::AO, &self.ao_map),
            (TextureChannels::ROUGHNESS, &self.roughness_map),
            (TextureChannels::METALNESS, &self.metalness_map),
            (TextureChannels::EMISSIVE, &self.emissive_map),
            (TextureChannels::CLEARCOAT_ROUGHNESS, &self.clearcoat_roughness_map),
            (TextureChannels::CLEARCOAT_NORMAL, &self.clearcoat_normal_map),
            (TextureChannels::SHEEN_ROUGHNESS, &self.sheen_roughness_map),
            (TextureChannels::SHEEN_COLOR, &self.sheen_color_map),
            (TextureChannels::THICKNESS, &self.thickness_map),
            (TextureChannels::TRANSMISSION, &self.transmission_map),
        ]
        .into_iter()
        .filter(|(_, slot)| slot.is_some())
        .fold(TextureChannels::empty(), |acc, (channel, _)| acc | channel)
    }
}

/// Inspection data carried by a material
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialMetadata {
    /// Kernel description the material was resolved from
    pub specification: Option<Rc<MaterialSpecification>>,
    /// Per-instance overrides applied to this copy
    pub attributes: Option<MaterialAttributes>,
}

/// Renderer material
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalMaterial {
    /// Name for debugging, the kernel material id when resolved
    pub name: String,
    /// Lighting model
    pub shading_model: ShadingModel,
    /// Base color, linear
    pub color: Color,
    /// Metalness factor
    pub metalness: f32,
    /// Roughness factor
    pub roughness: f32,
    /// Dielectric reflectivity
    pub reflectivity: f32,
    /// Opacity
    pub opacity: f32,
    /// Alpha blending enabled
    pub transparent: bool,
    /// Depth buffer writes enabled
    pub depth_write: bool,
    /// Alpha cutoff
    pub alpha_test: f32,
    /// Rendered faces
    pub side: Side,
    /// Ambient occlusion strength
    pub ao_map_intensity: f32,
    /// Emissive color, linear
    pub emissive: Color,
    /// Emission strength
    pub emissive_intensity: f32,
    /// Transmission factor
    pub transmission: f32,
    /// Index of refraction
    pub ior: f32,
    /// Specular tint, linear
    pub specular_color: Color,
    /// Specular strength
    pub specular_intensity: f32,
    /// Clearcoat layer strength
    pub clearcoat: f32,
    /// Clearcoat roughness
    pub clearcoat_roughness: f32,
    /// Clearcoat normal map scale
    pub clearcoat_normal_scale: f32,
    /// Sheen strength
    pub sheen: f32,
    /// Sheen tint, linear
    pub sheen_color: Color,
    /// Sheen roughness
    pub sheen_roughness: f32,
    /// Volume thickness
    pub thickness: f32,
    /// Volume attenuation tint, linear
    pub attenuation_color: Color,
    /// Volume attenuation distance
    pub attenuation_distance: f32,
    /// Normal map scale
    pub normal_scale: f32,
    /// Environment lighting multiplier
    pub env_map_intensity: f32,
    /// Texture bindings
    pub textures: MaterialTextures,
    /// Inspection data
    pub user_data: MaterialMetadata,
}

impl Default for PhysicalMaterial {
    fn default() -> Self {
        Self {
            name: String::new(),
            shading_model: ShadingModel::Physical,
            color: Color::WHITE,
            metalness: 0.0,
            roughness: 1.0,
            reflectivity: 0.5,
            opacity: 1.0,
            transparent: false,
            depth_write: true,
            alpha_test: 0.0,
            side: Side::Front,
            ao_map_intensity: 1.0,
            emissive: Color::BLACK,
            emissive_intensity: 1.0,
            transmission: 0.0,
            ior: 1.5,
            specular_color: Color::WHITE,
            specular_intensity: 1.0,
            clearcoat: 0.0,
            clearcoat_roughness: 0.0,
            clearcoat_normal_scale: 1.0,
            sheen: 0.0,
            sheen_color: Color::BLACK,
            sheen_roughness: 1.0,
            thickness: 0.0,
            attenuation_color: Color::WHITE,
            attenuation_distance: f32::INFINITY,
            normal_scale: 1.0,
            env_map_intensity: 1.0,
            textures: MaterialTextures::new(),
            user_data: MaterialMetadata::default(),
        }
    }
}

impl PhysicalMaterial {
    /// Create a physical material with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a flat diffuse-only material
    pub fn lambert(color: Color) -> Self {
        Self {
            shading_model: ShadingModel::Lambert,
            color,
            ..Self::default()
        }
    }

    /// Set the material name for debugging
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the base color
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Set the rendered faces
    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    /// Whether this material uses the physical lighting model
    pub fn is_physical(&self) -> bool {
        self.shading_model == ShadingModel::Physical
    }

    /// Whether this material renders both faces
    pub fn is_double_sided(&self) -> bool {
        self.side == Side::Double
    }
}
