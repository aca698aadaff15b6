//! # Loader Configuration
//!
//! Tunables for scene construction, grouped per subsystem the same way the
//! loader itself is split:
//!
//! - **Texture Config**: sampling and physical tiling defaults
//! - **Material Config**: lighting multipliers shared by every resolved material
//! - **Scene Cache Config**: eviction behaviour of the scene cache
//! - **Environment Config**: default environment name and registered resources
//!
//! All records are serializable so they can be loaded from TOML or RON files
//! through the [`Config`] trait.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::foundation::collections::{EvictionPolicy, LeastRecentlyUsed, Unbounded};

/// Texture sampling defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    /// Anisotropic filtering level applied to every kernel texture
    pub anisotropy: u16,
    /// Physical tile size used when the kernel reports a zero width or height
    pub default_tile_size_mm: f32,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            anisotropy: 16,
            default_tile_size_mm: 1000.0,
        }
    }
}

/// Material defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialConfig {
    /// Environment map intensity assigned to every resolved kernel material
    pub env_map_intensity: f32,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            env_map_intensity: 2.0,
        }
    }
}

/// Scene cache behaviour
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneCacheConfig {
    /// Maximum number of cached scenes; `None` keeps every scene
    pub max_entries: Option<usize>,
}

impl SceneCacheConfig {
    /// Build the eviction policy described by this configuration
    pub fn eviction_policy(&self) -> Box<dyn EvictionPolicy> {
        match self.max_entries {
            Some(capacity) => Box::new(LeastRecentlyUsed::new(capacity)),
            None => Box::new(Unbounded),
        }
    }
}

/// Environment map defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Name used when no environment has been selected yet
    pub default_name: String,
    /// Environment resource URLs registered at startup
    pub resources: Vec<String>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            default_name: "room environment".to_string(),
            resources: Vec::new(),
        }
    }
}

/// Top-level loader configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Texture defaults
    pub textures: TextureConfig,
    /// Material defaults
    pub materials: MaterialConfig,
    /// Scene cache behaviour
    pub scene_cache: SceneCacheConfig,
    /// Environment defaults
    pub environment: EnvironmentConfig,
}

impl Config for LoaderConfig {}
