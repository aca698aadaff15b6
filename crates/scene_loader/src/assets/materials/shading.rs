//! Kernel shading schemes
//!
//! The kernel describes materials in one of two incompatible schemas. The
//! version tag selects exactly one of the two mappings below; a material is
//! never run through both.

use crate::kernel::ShadingProperties;
use crate::render::{PhysicalMaterial, Side};

/// Which mapping a kernel material is interpreted with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingScheme {
    /// Version absent or `1.x`
    Legacy,
    /// Version `2` or `2.x`
    Modern,
}

impl ShadingScheme {
    /// Classify a shading version tag
    pub fn from_version(version: Option<&str>) -> Self {
        match version {
            Some(v) if v == "2" || v.starts_with("2.") => ShadingScheme::Modern,
            _ => ShadingScheme::Legacy,
        }
    }

    /// Classify the version of a shading record
    pub fn of(shading: &ShadingProperties) -> Self {
        Self::from_version(shading.version.as_deref())
    }

    /// Run this scheme's mapping
    pub fn apply(self, material: &mut PhysicalMaterial, shading: &ShadingProperties) {
        match self {
            ShadingScheme::Legacy => apply_legacy_shading(material, shading),
            ShadingScheme::Modern => apply_modern_shading(material, shading),
        }
    }
}

/// Map a legacy shading record
///
/// Metalness collapses to 1 or 0.5 for compatibility with older content.
/// Transmission is approximated with opacity rather than rendered.
pub fn apply_legacy_shading(material: &mut PhysicalMaterial, shading: &ShadingProperties) {
    if let Some(metallic) = shading.metallic {
        material.metalness = if metallic == 1.0 { 1.0 } else { 0.5 };
        material.reflectivity = metallic;
    }

    let mut force_double_sided = false;
    match (shading.transmission, shading.alpha) {
        (Some(transmission), _) if transmission > 0.0 => {
            material.opacity = 1.0 - transmission;
            material.transparent = true;
            material.depth_write = false;
            material.metalness = 0.0;
            force_double_sided = true;
        }
        (_, Some(alpha)) if alpha < 1.0 => {
            material.transparent = true;
            material.opacity = alpha;
            material.depth_write = false;
            material.metalness = 0.5 * alpha.max(0.0);
            force_double_sided = true;
        }
        _ => {}
    }

    material.ao_map_intensity = shading.occlusion.unwrap_or(1.0);
    material.roughness = shading.roughness.unwrap_or(0.5);
    material.alpha_test = shading.alpha_cutoff.unwrap_or(0.0);

    if let Some(color) = shading.base_color {
        material.color = color.to_linear();
    }
    material.side = side(force_double_sided || shading.double_sided.unwrap_or(false));
}

/// Map a modern shading record, field for field
pub fn apply_modern_shading(material: &mut PhysicalMaterial, shading: &ShadingProperties) {
    let mut force_double_sided = false;
    match shading.alpha {
        Some(alpha) if alpha < 1.0 => {
            material.transparent = true;
            material.opacity = alpha;
            material.depth_write = false;
            force_double_sided = true;
        }
        _ => {
            material.transparent = false;
            material.opacity = 1.0;
            material.depth_write = true;
        }
    }

    material.alpha_test = shading.alpha_cutoff.unwrap_or(0.0);
    if let Some(color) = shading.base_color {
        material.color = color.to_linear();
    }
    material.transmission = shading.transmission.unwrap_or(0.0);
    material.metalness = shading.metallic.unwrap_or(0.0);
    if let Some(color) = shading.specular_color {
        material.specular_color = color.to_linear();
    }
    material.specular_intensity = shading.specular_intensity.unwrap_or(0.0);
    material.roughness = shading.roughness.unwrap_or(0.0);
    material.ao_map_intensity = shading.occlusion.unwrap_or(1.0);
    if let Some(color) = shading.emissive_color {
        material.emissive = color.to_linear();
    }
    material.emissive_intensity = shading.emissive_intensity.unwrap_or(1.0);
    material.clearcoat = shading.clearcoat_intensity.unwrap_or(0.0);
    material.clearcoat_roughness = shading.clearcoat_roughness.unwrap_or(0.0);
    material.clearcoat_normal_scale = shading.clearcoat_normal_scale.unwrap_or(1.0);
    if let Some(color) = shading.sheen_color {
        material.sheen_color = color.to_linear();
    }
    material.sheen = shading.sheen_intensity.unwrap_or(1.0);
    material.sheen_roughness = shading.sheen_roughness.unwrap_or(1.0);
    material.thickness = shading.thickness.unwrap_or(0.0);
    if let Some(color) = shading.attenuation_color {
        material.attenuation_color = color.to_linear();
    }
    // zero means unset
    if let Some(distance) = shading.attenuation_distance.filter(|d| *d != 0.0) {
        material.attenuation_distance = distance;
    }

    material.side = side(force_double_sided || shading.double_sided.unwrap_or(false));
}

fn side(double_sided: bool) -> Side {
    if double_sided {
        Side::Double
    } else {
        Side::Front
    }
}
