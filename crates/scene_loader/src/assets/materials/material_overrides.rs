//! Per-instance material overrides
//!
//! A mesh may carry a string map of attributes that tweak the material it
//! shares with other meshes. Overriding always works on a copy; the shared
//! material is never touched.

use std::rc::Rc;
use std::str::FromStr;

use thiserror::Error;

use crate::kernel::MaterialAttributes;
use crate::render::{Color, PhysicalMaterial, Side};

/// Why an attribute could not be applied
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttributeError {
    /// The key names no known material property
    #[error("Unknown material attribute '{0}'")]
    UnknownKey(String),

    /// The value does not parse for the key's type
    #[error("Invalid value '{value}' for material attribute '{key}'")]
    InvalidValue {
        /// Attribute key
        key: String,
        /// Raw value
        value: String,
    },
}

/// One parsed override
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialAttribute {
    /// `color`
    Color(Color),
    /// `alpha`
    Alpha(f32),
    /// `roughness`
    Roughness(f32),
    /// `metallic`
    Metallic(f32),
    /// `normalScale`
    NormalScale(f32),
    /// `alphaCutoff`
    AlphaCutoff(f32),
    /// `doubleSided`
    DoubleSided(bool),
    /// `occlusion`
    Occlusion(f32),
    /// `emissiveColor`
    EmissiveColor(Color),
    /// `emissiveIntensity`
    EmissiveIntensity(f32),
    /// `transmission`
    Transmission(f32),
    /// `specularColor`
    SpecularColor(Color),
    /// `specularity`
    Specularity(f32),
    /// `clearcoatIntensity`
    ClearcoatIntensity(f32),
    /// `clearcoatRoughness`
    ClearcoatRoughness(f32),
    /// `clearcoatNormalScale`
    ClearcoatNormalScale(f32),
    /// `sheenColor`
    SheenColor(Color),
    /// `sheenIntensity`
    SheenIntensity(f32),
    /// `sheenRoughness`
    SheenRoughness(f32),
    /// `thicknessFactor`
    ThicknessFactor(f32),
    /// `attenuationColor`
    AttenuationColor(Color),
    /// `attenuationDistance`
    AttenuationDistance(f32),
}

impl MaterialAttribute {
    /// Parse one `key = value` pair
    pub fn parse(key: &str, value: &str) -> Result<Self, AttributeError> {
        let invalid = || AttributeError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let number = || f32::from_str(value.trim()).map_err(|_| invalid());
        let color = || Color::from_str(value).map_err(|_| invalid());

        Ok(match key {
            "color" => Self::Color(color()?),
            "alpha" => Self::Alpha(number()?),
            "roughness" => Self::Roughness(number()?),
            "metallic" => Self::Metallic(number()?),
            "normalScale" => Self::NormalScale(number()?),
            "alphaCutoff" => Self::AlphaCutoff(number()?),
            "doubleSided" => Self::DoubleSided(parse_flag(value).ok_or_else(invalid)?),
            "occlusion" => Self::Occlusion(number()?),
            "emissiveColor" => Self::EmissiveColor(color()?),
            "emissiveIntensity" => Self::EmissiveIntensity(number()?),
            "transmission" => Self::Transmission(number()?),
            "specularColor" => Self::SpecularColor(color()?),
            "specularity" => Self::Specularity(number()?),
            "clearcoatIntensity" => Self::ClearcoatIntensity(number()?),
            "clearcoatRoughness" => Self::ClearcoatRoughness(number()?),
            "clearcoatNormalScale" => Self::ClearcoatNormalScale(number()?),
            "sheenColor" => Self::SheenColor(color()?),
            "sheenIntensity" => Self::SheenIntensity(number()?),
            "sheenRoughness" => Self::SheenRoughness(number()?),
            "thicknessFactor" => Self::ThicknessFactor(number()?),
            "attenuationColor" => Self::AttenuationColor(color()?),
            "attenuationDistance" => Self::AttenuationDistance(number()?),
            _ => return Err(AttributeError::UnknownKey(key.to_string())),
        })
    }

    /// Write this override into `material`
    pub fn apply(self, material: &mut PhysicalMaterial) {
        match self {
            Self::Color(c) => material.color = c,
            Self::Alpha(v) => material.opacity = v,
            Self::Roughness(v) => material.roughness = v,
            Self::Metallic(v) => material.metalness = v,
            Self::NormalScale(v) => material.normal_scale = v,
            Self::AlphaCutoff(v) => material.alpha_test = v,
            Self::DoubleSided(double) => {
                material.side = if double { Side::Double } else { Side::Front };
            }
            Self::Occlusion(v) => material.ao_map_intensity = v,
            Self::EmissiveColor(c) => material.emissive = c,
            Self::EmissiveIntensity(v) => material.emissive_intensity = v,
            Self::Transmission(v) => material.transmission = v,
            Self::SpecularColor(c) => material.specular_color = c,
            Self::Specularity(v) => material.specular_intensity = v,
            Self::ClearcoatIntensity(v) => material.clearcoat = v,
            Self::ClearcoatRoughness(v) => material.clearcoat_roughness = v,
            Self::ClearcoatNormalScale(v) => material.clearcoat_normal_scale = v,
            Self::SheenColor(c) => material.sheen_color = c,
            Self::SheenIntensity(v) => material.sheen = v,
            Self::SheenRoughness(v) => material.sheen_roughness = v,
            Self::ThicknessFactor(v) => material.thickness = v,
            Self::AttenuationColor(c) => material.attenuation_color = c,
            Self::AttenuationDistance(v) => material.attenuation_distance = v,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" | "" => Some(false),
        _ => None,
    }
}

/// Material with `attributes` applied
///
/// Returns `base` itself when there is nothing to apply or the material is
/// not physical. Otherwise returns a fresh copy carrying the attribute map in
/// its metadata, with transparency derived from the final opacity. Texture
/// slots stay shared with `base`.
pub fn apply_overrides(
    base: &Rc<PhysicalMaterial>,
    attributes: Option<&MaterialAttributes>,
) -> Rc<PhysicalMaterial> {
    let Some(attributes) = attributes.filter(|a| !a.is_empty()) else {
        return Rc::clone(base);
    };
    if !base.is_physical() {
        return Rc::clone(base);
    }

    let mut material = PhysicalMaterial::clone(base);
    material.user_data.attributes = Some(attributes.clone());
    for (key, value) in attributes {
        match MaterialAttribute::parse(key, value) {
            Ok(attribute) => attribute.apply(&mut material),
            Err(err @ AttributeError::UnknownKey(_)) => log::debug!("{err}"),
            Err(err) => log::warn!("{err} on material {}", material.name),
        }
    }
    material.transparent = material.opacity < 1.0;
    Rc::new(material)
}
