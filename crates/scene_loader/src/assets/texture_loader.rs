//! Texture loading
//!
//! [`TextureLoader`] is the injected capability that turns a URL into pixels.
//! [`FileTextureLoader`] serves local files through the `image` crate.

use std::path::{Path, PathBuf};

use futures::future::{FutureExt, LocalBoxFuture};

use super::{ImageData, LoadError};
use crate::render::Texture;

/// Fetches and decodes an image URL
pub trait TextureLoader {
    /// Load the texture at `url`
    fn load<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<Texture, LoadError>>;
}

/// Loads textures from the local file system
///
/// Accepts plain paths and `file://` URLs. Relative paths resolve against the
/// configured root directory.
#[derive(Debug, Clone, Default)]
pub struct FileTextureLoader {
    root: Option<PathBuf>,
}

impl FileTextureLoader {
    /// Resolve relative paths against the working directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// File a URL refers to, `None` for non-file schemes
    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        let path = match url.split_once("://") {
            Some(("file", rest)) => rest,
            Some(_) => return None,
            None => url,
        };
        let path = Path::new(path);
        Some(match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        })
    }
}

impl TextureLoader for FileTextureLoader {
    fn load<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<Texture, LoadError>> {
        async move {
            let path = self
                .resolve(url)
                .ok_or_else(|| LoadError::Unsupported(url.to_string()))?;
            let image = ImageData::from_file(&path)?;
            Ok(Texture::new(image, Some(url.to_string())))
        }
        .boxed_local()
    }
}
