//! Environment maps
//!
//! Background and lighting environments are either generated from a
//! procedural scene or loaded from `.exr`, `.hdr` or `.envmap` resources.
//! [`EnvironmentMapCache`] keeps them by display name and tracks which one is
//! active.

pub mod environment_cache;

pub use environment_cache::{EnvironmentMapCache, SetEnvironmentParams};

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use thiserror::Error;

use crate::assets::{LoadError, TextureLoader};
use crate::render::Texture;
use crate::scene::SceneNode;

/// Errors from environment loads
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvironmentError {
    /// The resource could not be fetched or decoded
    #[error("Environment load failed: {0}")]
    Load(#[from] LoadError),
}

/// Resource format, picked from the lowercase extension of the environment name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvironmentFormat {
    /// OpenEXR equirectangular image
    Exr,
    /// Radiance HDR equirectangular image
    Hdr,
    /// Prefiltered packed cube map
    EnvMap,
}

impl EnvironmentFormat {
    /// Format of `name`, `None` for unrecognised extensions
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.ends_with(".exr") {
            Some(Self::Exr)
        } else if lower.ends_with(".hdr") {
            Some(Self::Hdr)
        } else if lower.ends_with(".envmap") {
            Some(Self::EnvMap)
        } else {
            None
        }
    }
}

/// Pixels backing a loaded environment
#[derive(Debug, Clone, PartialEq)]
pub enum EnvironmentTexture {
    /// Latitude/longitude panorama
    Equirectangular(Rc<Texture>),
    /// Six cube faces in +X, -X, +Y, -Y, +Z, -Z order
    Cube(Rc<[Texture; 6]>),
}

/// Builds the scene a procedural environment is rendered from
pub trait EnvironmentSceneFactory {
    /// Scene to capture into the environment map
    fn build_scene(&self) -> SceneNode;
}

/// Where an environment map gets its lighting from
#[derive(Clone)]
pub enum EnvironmentSource {
    /// Captured from a generated scene
    Procedural(Rc<dyn EnvironmentSceneFactory>),
    /// Loaded from a resource
    Texture(EnvironmentTexture),
}

impl fmt::Debug for EnvironmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Procedural(_) => f.write_str("Procedural"),
            Self::Texture(texture) => f.debug_tuple("Texture").field(texture).finish(),
        }
    }
}

/// A background and lighting environment
///
/// Rotation and intensity are adjustable on a shared map.
#[derive(Debug)]
pub struct EnvironmentMap {
    source: EnvironmentSource,
    rotation: Cell<f32>,
    intensity: Cell<f32>,
}

impl EnvironmentMap {
    /// Unrotated map at unit intensity
    pub fn new(source: EnvironmentSource) -> Self {
        Self {
            source,
            rotation: Cell::new(0.0),
            intensity: Cell::new(1.0),
        }
    }

    /// Lighting source
    pub fn source(&self) -> &EnvironmentSource {
        &self.source
    }

    /// Panorama texture, when the map was loaded from one
    pub fn equirectangular_texture(&self) -> Option<Rc<Texture>> {
        match &self.source {
            EnvironmentSource::Texture(EnvironmentTexture::Equirectangular(texture)) => {
                Some(Rc::clone(texture))
            }
            _ => None,
        }
    }

    /// Rotation about the up axis in radians
    pub fn rotation(&self) -> f32 {
        self.rotation.get()
    }

    /// Set the rotation about the up axis
    pub fn set_rotation(&self, rotation: f32) {
        self.rotation.set(rotation);
    }

    /// Lighting intensity multiplier
    pub fn intensity(&self) -> f32 {
        self.intensity.get()
    }

    /// Set the lighting intensity multiplier
    pub fn set_intensity(&self, intensity: f32) {
        self.intensity.set(intensity);
    }
}

/// Turns an environment source into a map; injected so hosts can prefilter
pub type EnvironmentMapFactory = Box<dyn Fn(EnvironmentSource) -> EnvironmentMap>;

/// Fetches and decodes one environment resource format
pub trait EnvironmentLoader {
    /// Load the environment at `url`
    fn load<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<EnvironmentTexture, LoadError>>;
}

/// Loads panoramas through a [`TextureLoader`]
pub struct PanoramaLoader {
    textures: Rc<dyn TextureLoader>,
}

impl PanoramaLoader {
    /// Decode panoramas with `textures`
    pub fn new(textures: Rc<dyn TextureLoader>) -> Self {
        Self { textures }
    }
}

impl EnvironmentLoader for PanoramaLoader {
    fn load<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<EnvironmentTexture, LoadError>> {
        async move {
            let texture = self.textures.load(url).await?;
            Ok(EnvironmentTexture::Equirectangular(Rc::new(texture)))
        }
        .boxed_local()
    }
}

/// One loader per environment format
#[derive(Clone)]
pub struct EnvironmentLoaders {
    /// `.exr` resources
    pub exr: Rc<dyn EnvironmentLoader>,
    /// `.hdr` resources
    pub hdr: Rc<dyn EnvironmentLoader>,
    /// `.envmap` resources
    pub envmap: Rc<dyn EnvironmentLoader>,
}

impl EnvironmentLoaders {
    /// Panorama loaders for `.exr` and `.hdr` plus a dedicated cube map loader
    pub fn with_panoramas(textures: Rc<dyn TextureLoader>, envmap: Rc<dyn EnvironmentLoader>) -> Self {
        let panorama: Rc<dyn EnvironmentLoader> = Rc::new(PanoramaLoader::new(textures));
        Self {
            exr: Rc::clone(&panorama),
            hdr: panorama,
            envmap,
        }
    }

    /// Loader responsible for `format`
    pub fn for_format(&self, format: EnvironmentFormat) -> &Rc<dyn EnvironmentLoader> {
        match format {
            EnvironmentFormat::Exr => &self.exr,
            EnvironmentFormat::Hdr => &self.hdr,
            EnvironmentFormat::EnvMap => &self.envmap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{FileTextureLoader, ImageData};

    struct Unsupported;

    impl EnvironmentLoader for Unsupported {
        fn load<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<EnvironmentTexture, LoadError>> {
            async move { Err(LoadError::Unsupported(url.to_string())) }.boxed_local()
        }
    }

    #[test]
    fn test_format_from_name() {
        assert_eq!(EnvironmentFormat::from_name("studio.EXR"), Some(EnvironmentFormat::Exr));
        assert_eq!(EnvironmentFormat::from_name("sky.hdr"), Some(EnvironmentFormat::Hdr));
        assert_eq!(EnvironmentFormat::from_name("lobby.envmap"), Some(EnvironmentFormat::EnvMap));
        assert_eq!(EnvironmentFormat::from_name("room environment"), None);
        assert_eq!(EnvironmentFormat::from_name("sky.png"), None);
    }

    #[test]
    fn test_map_adjustments_are_shared() {
        let texture = Rc::new(Texture::new(ImageData::solid_color(2, 1, [1, 2, 3, 255]), None));
        let map = Rc::new(EnvironmentMap::new(EnvironmentSource::Texture(
            EnvironmentTexture::Equirectangular(Rc::clone(&texture)),
        )));
        let other = Rc::clone(&map);
        other.set_rotation(1.5);
        other.set_intensity(0.5);
        assert_eq!((map.rotation(), map.intensity()), (1.5, 0.5));
        assert!(Rc::ptr_eq(&map.equirectangular_texture().unwrap(), &texture));
    }

    #[test]
    fn test_loaders_route_by_format() {
        let loaders = EnvironmentLoaders::with_panoramas(Rc::new(FileTextureLoader::new()), Rc::new(Unsupported));
        assert!(Rc::ptr_eq(
            loaders.for_format(EnvironmentFormat::Exr),
            loaders.for_format(EnvironmentFormat::Hdr)
        ));
        let result = pollster::block_on(loaders.for_format(EnvironmentFormat::EnvMap).load("a.envmap"));
        assert_eq!(result, Err(LoadError::Unsupported("a.envmap".to_string())));
    }

    #[test]
    fn test_panorama_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loader = PanoramaLoader::new(Rc::new(FileTextureLoader::with_root(dir.path())));
        let result = pollster::block_on(loader.load("absent.hdr"));
        assert!(matches!(result, Err(LoadError::Decode { .. })));
    }
}
