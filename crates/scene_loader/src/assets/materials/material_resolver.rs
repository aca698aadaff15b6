//! Kernel material resolution
//!
//! Turns a [`MaterialSpecification`] into a [`PhysicalMaterial`]: the shading
//! record goes through the scheme its version selects, then every texture
//! slot gets a [`TextureHandle`] bound to the channels it feeds. Texture
//! downloads are returned as a [`TextureLoads`] batch and never started here.

use std::rc::Rc;

use super::shading::ShadingScheme;
use crate::assets::{ImageData, TextureLoader};
use crate::core::config::{LoaderConfig, MaterialConfig, TextureConfig};
use crate::foundation::math::Vec2;
use crate::kernel::{MaterialSpecification, TextureProperties};
use crate::render::{
    Color, PhysicalMaterial, Texture, TextureBinding, TextureChannels, TextureHandle,
    TextureLoads, TextureSampling, WrapMode,
};

/// Material plus the texture loads it is waiting on
#[derive(Debug)]
pub struct ResolvedMaterial {
    /// Kernel material id
    pub material_id: String,
    /// Resolved material, shared by every mesh that references it
    pub material: Rc<PhysicalMaterial>,
    /// Pending texture downloads for the material's slots
    pub textures: TextureLoads,
}

/// Resolves kernel materials with a shared texture loader
pub struct MaterialResolver {
    textures: TextureConfig,
    materials: MaterialConfig,
    loader: Rc<dyn TextureLoader>,
}

impl MaterialResolver {
    /// Create a resolver using the texture and material sections of `config`
    pub fn new(config: &LoaderConfig, loader: Rc<dyn TextureLoader>) -> Self {
        Self {
            textures: config.textures.clone(),
            materials: config.materials.clone(),
            loader,
        }
    }

    /// Loader textures are fetched with
    pub fn loader(&self) -> &Rc<dyn TextureLoader> {
        &self.loader
    }

    /// Resolve one kernel material
    pub fn resolve(&self, specification: &MaterialSpecification) -> ResolvedMaterial {
        let scheme = ShadingScheme::of(&specification.shading);
        let mut material = PhysicalMaterial::new().with_name(specification.id.as_str());
        scheme.apply(&mut material, &specification.shading);

        let mut loads = TextureLoads::new();
        let slots = &specification.textures;

        if let Some(diffuse) = &slots.diffuse {
            let handle = self.texture_handle(diffuse, &mut loads);
            // show the flat material color until the image arrives
            handle.install_placeholder(Texture::new(ImageData::uniform(material.color), None));
            material.textures.bind(TextureChannels::MAP, &handle);
            material.transparent |= specification.diffuse_map_has_alpha;

            if is_glow_material(scheme, specification) {
                material.emissive = Color::WHITE;
                material.emissive_intensity = 1.0;
                material.textures.bind(TextureChannels::EMISSIVE, &handle);
            }
        }

        let channel_slots = [
            (&slots.normal, TextureChannels::NORMAL),
            (&slots.orm, TextureChannels::ORM),
            (&slots.emissive, TextureChannels::EMISSIVE),
            (&slots.clearcoat_roughness, TextureChannels::CLEARCOAT_ROUGHNESS),
            (&slots.clearcoat_normal, TextureChannels::CLEARCOAT_NORMAL),
            (&slots.sheen_roughness, TextureChannels::SHEEN_ROUGHNESS),
            (&slots.sheen_color, TextureChannels::SHEEN_COLOR),
            (&slots.thickness_transmission, TextureChannels::THICKNESS_TRANSMISSION),
        ];
        for (slot, channels) in channel_slots {
            if let Some(properties) = slot {
                let handle = self.texture_handle(properties, &mut loads);
                material.textures.bind(channels, &handle);
            }
        }

        if let Some(ior) = specification.shading.transmission_ior {
            material.ior = 1.0 + ior;
        }
        material.env_map_intensity = self.materials.env_map_intensity;
        material.user_data.specification = Some(Rc::new(specification.clone()));

        log::debug!(
            "Resolved material {} ({:?}, {} texture loads)",
            specification.id,
            scheme,
            loads.len()
        );

        ResolvedMaterial {
            material_id: specification.id.clone(),
            material: Rc::new(material),
            textures: loads,
        }
    }

    /// Sampling for a kernel texture: repeat wrap, one tile per physical size
    pub fn sampling(&self, properties: &TextureProperties) -> TextureSampling {
        let tile = |mm: f32| {
            if mm == 0.0 {
                self.textures.default_tile_size_mm
            } else {
                mm
            }
        };
        TextureSampling {
            wrap: WrapMode::Repeat,
            repeat: Vec2::new(
                1.0 / tile(properties.mm_width),
                1.0 / tile(properties.mm_height),
            ),
            anisotropy: self.textures.anisotropy,
        }
    }

    fn texture_handle(&self, properties: &TextureProperties, loads: &mut TextureLoads) -> TextureHandle {
        let handle = TextureHandle::new(TextureBinding {
            url: Some(properties.url.clone()),
            sampling: self.sampling(properties),
        });
        if let Some(task) = handle.load_task(Rc::clone(&self.loader)) {
            loads.push(task);
        }
        handle
    }
}

/// Legacy glow materials light themselves with their own diffuse image
fn is_glow_material(scheme: ShadingScheme, specification: &MaterialSpecification) -> bool {
    scheme == ShadingScheme::Legacy
        && specification.id.contains("glow")
        && specification.diffuse_map_has_alpha
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::LoadError;
    use crate::kernel::{ShadingProperties, TextureSlots};
    use crate::render::TextureStatus;
    use approx::assert_relative_eq;
    use futures::future::{FutureExt, LocalBoxFuture};
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingLoader {
        requested: RefCell<Vec<String>>,
    }

    impl TextureLoader for RecordingLoader {
        fn load<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<Texture, LoadError>> {
            self.requested.borrow_mut().push(url.to_string());
            async move {
                Ok(Texture::new(
                    ImageData::solid_color(1, 1, [10, 20, 30, 255]),
                    Some(url.to_string()),
                ))
            }
            .boxed_local()
        }
    }

    fn texture(url: &str, width: f32, height: f32) -> TextureProperties {
        TextureProperties {
            url: url.to_string(),
            mm_width: width,
            mm_height: height,
        }
    }

    fn resolver() -> (MaterialResolver, Rc<RecordingLoader>) {
        let loader = Rc::new(RecordingLoader::default());
        let resolver = MaterialResolver::new(&LoaderConfig::default(), loader.clone());
        (resolver, loader)
    }

    #[test]
    fn test_diffuse_slot_gets_color_placeholder_and_tiling() {
        let (resolver, loader) = resolver();
        let spec = MaterialSpecification {
            id: "oak".to_string(),
            shading: ShadingProperties {
                base_color: Some(crate::kernel::RgbColor { r: 1.0, g: 0.0, b: 0.0 }),
                ..Default::default()
            },
            textures: TextureSlots {
                diffuse: Some(texture("oak.png", 500.0, 0.0)),
                ..Default::default()
            },
            ..Default::default()
        };

        let resolved = resolver.resolve(&spec);
        let map = resolved.material.textures.map.clone().unwrap();
        assert_eq!(map.status(), TextureStatus::Placeholder);
        let placeholder = map.current().unwrap();
        assert_eq!(placeholder.image.data, vec![255, 0, 0, 255]);
        assert_eq!(placeholder.sampling.wrap, WrapMode::Repeat);
        assert_relative_eq!(placeholder.sampling.repeat.x, 1.0 / 500.0);
        assert_relative_eq!(placeholder.sampling.repeat.y, 1.0 / 1000.0);
        assert_eq!(placeholder.sampling.anisotropy, 16);

        // nothing is fetched until the loads are driven
        assert!(loader.requested.borrow().is_empty());
        assert_eq!(resolved.textures.len(), 1);
        pollster::block_on(resolved.textures.run());
        assert_eq!(map.status(), TextureStatus::Loaded);
        assert_eq!(*loader.requested.borrow(), vec!["oak.png".to_string()]);
    }

    #[test]
    fn test_orm_slot_feeds_three_channels_with_one_handle() {
        let (resolver, _) = resolver();
        let spec = MaterialSpecification {
            id: "steel".to_string(),
            textures: TextureSlots {
                orm: Some(texture("orm.png", 100.0, 100.0)),
                thickness_transmission: Some(texture("tt.png", 100.0, 100.0)),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolver.resolve(&spec);
        let textures = &resolved.material.textures;
        assert_eq!(
            textures.bound_channels(),
            TextureChannels::ORM | TextureChannels::THICKNESS_TRANSMISSION
        );
        let ao = textures.ao_map.as_ref().unwrap();
        assert!(TextureHandle::ptr_eq(ao, textures.roughness_map.as_ref().unwrap()));
        assert!(TextureHandle::ptr_eq(ao, textures.metalness_map.as_ref().unwrap()));
        assert_eq!(resolved.textures.len(), 2);
    }

    #[test]
    fn test_legacy_glow_material_emits_its_diffuse_image() {
        let (resolver, _) = resolver();
        let spec = MaterialSpecification {
            id: "lamp_glow".to_string(),
            diffuse_map_has_alpha: true,
            textures: TextureSlots {
                diffuse: Some(texture("glow.png", 0.0, 0.0)),
                ..Default::default()
            },
            ..Default::default()
        };
        let material = resolver.resolve(&spec).material;
        assert!(material.transparent);
        assert_eq!(material.emissive, Color::WHITE);
        assert!(TextureHandle::ptr_eq(
            material.textures.emissive_map.as_ref().unwrap(),
            material.textures.map.as_ref().unwrap()
        ));

        let mut modern = spec.clone();
        modern.shading.version = Some("2".to_string());
        let material = resolver.resolve(&modern).material;
        assert!(material.textures.emissive_map.is_none());
    }

    #[test]
    fn test_ior_env_intensity_and_metadata() {
        let (resolver, _) = resolver();
        let spec = MaterialSpecification {
            id: "glass".to_string(),
            shading: ShadingProperties {
                version: Some("2".to_string()),
                transmission_ior: Some(0.5),
                ..Default::default()
            },
            ..Default::default()
        };
        let material = resolver.resolve(&spec).material;
        assert_eq!(material.name, "glass");
        assert_eq!(material.ior, 1.5);
        assert_eq!(material.env_map_intensity, 2.0);
        assert_eq!(material.user_data.specification.as_deref(), Some(&spec));
    }
}
