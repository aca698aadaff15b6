//! Configuration files
//!
//! Loader settings live in TOML or RON files; the extension picks the format.

use std::path::{Path, PathBuf};

pub use serde::{Deserialize, Serialize};

/// On-disk configuration formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.ron`
    Ron,
}

impl ConfigFormat {
    /// Format of `path`, by extension (any case)
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Settings that can be read from and written to configuration files
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Read settings from `path`
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Self::from_str_with_format(&contents, path)
    }

    /// Read settings from `path`, falling back to defaults when the file is absent
    fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load_from_file(path)
        } else {
            log::info!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Parse settings in the format `path` names
    fn from_str_with_format(contents: &str, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let parse_error = |reason: String| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        };
        match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => toml::from_str(contents).map_err(|e| parse_error(e.to_string())),
            ConfigFormat::Ron => ron::from_str(contents).map_err(|e| parse_error(e.to_string())),
        }
    }

    /// Write settings to `path`
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };
        std::fs::write(path, contents)?;
        log::debug!("Wrote configuration to {}", path.display());
        Ok(())
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not hold valid settings
    #[error("Parse error in {}: {reason}", .path.display())]
    Parse {
        /// Offending file
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Neither a `.toml` nor a `.ron` file
    #[error("Unsupported configuration format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}
