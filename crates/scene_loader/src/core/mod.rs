//! Core loader configuration

pub mod config;

pub use config::{EnvironmentConfig, LoaderConfig, MaterialConfig, SceneCacheConfig, TextureConfig};
