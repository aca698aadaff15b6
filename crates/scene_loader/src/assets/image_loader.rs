//! Image loading utilities for texture data
//!
//! Provides PNG and other image format decoding for the texture system.

use std::path::Path;

use super::LoadError;
use crate::render::Color;

/// Decoded image data ready for GPU upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Raw RGBA pixel data
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageData {
    /// Load an image from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path_ref = path.as_ref();
        log::debug!("Loading image from: {:?}", path_ref);

        let img = image::open(path_ref).map_err(|e| LoadError::Decode {
            url: path_ref.display().to_string(),
            reason: e.to_string(),
        })?;

        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();
        log::debug!("Loaded image {}x{} from {:?}", width, height, path_ref);

        Ok(Self {
            data: rgba_img.into_raw(),
            width,
            height,
        })
    }

    /// Decode an image already fetched into memory
    pub fn from_bytes(bytes: &[u8], source: &str) -> Result<Self, LoadError> {
        let img = image::load_from_memory(bytes).map_err(|e| LoadError::Decode {
            url: source.to_string(),
            reason: e.to_string(),
        })?;

        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        Ok(Self {
            data: rgba_img.into_raw(),
            width,
            height,
        })
    }

    /// Create a solid color image
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba(color));
        Self {
            data: img.into_raw(),
            width,
            height,
        }
    }

    /// 1×1 image of a linear color, used as a stand-in while real textures stream in
    pub fn uniform(color: Color) -> Self {
        Self::solid_color(1, 1, color.to_rgba8())
    }

    /// Get the size of the image data in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_color_image() {
        let img = ImageData::solid_color(4, 4, [255, 0, 0, 255]);
        assert_eq!(img.width, 4);
        assert_eq!(img.height, 4);
        assert_eq!(img.size_bytes(), 4 * 4 * 4);
        assert_eq!(&img.data[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_uniform_is_single_pixel() {
        let img = ImageData::uniform(Color::new(0.0, 1.0, 0.0));
        assert_eq!((img.width, img.height), (1, 1));
        assert_eq!(img.data, vec![0, 255, 0, 255]);
    }

    #[test]
    fn test_png_round_trip_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swatch.png");
        image::RgbaImage::from_pixel(2, 3, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let img = ImageData::from_file(&path).unwrap();
        assert_eq!((img.width, img.height), (2, 3));
        assert_eq!(&img.data[0..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let result = ImageData::from_bytes(b"not an image", "mem://garbage");
        assert!(matches!(result, Err(LoadError::Decode { .. })));
    }
}
