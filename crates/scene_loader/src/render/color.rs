//! Linear RGB colors
//!
//! Every color stored on a renderer material is linear. Kernel and catalog
//! colors arrive sRGB-encoded and are converted on the way in.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Linear RGB color with components in 0..1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
}

impl Color {
    /// White
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);
    /// Black
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a color from linear components
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Convert sRGB-encoded components to a linear color
    pub fn from_srgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b))
    }

    /// Convert a packed sRGB `0xRRGGBB` value to a linear color
    pub fn from_srgb_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::from_srgb(channel(16), channel(8), channel(0))
    }

    /// Quantize to 8-bit RGBA the way solid-color textures are filled
    pub fn to_rgba8(self) -> [u8; 4] {
        let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0).floor() as u8;
        [quantize(self.r), quantize(self.g), quantize(self.b), 255]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.077_399_38
    } else {
        (c * 0.947_867_3 + 0.052_132_7).powf(2.4)
    }
}

/// Error returned when a color attribute cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised color value '{0}'")]
pub struct ParseColorError(pub String);

impl FromStr for Color {
    type Err = ParseColorError;

    /// Parse an sRGB color written as `#rrggbb`, `#rgb`, `0xrrggbb` or a
    /// decimal packed integer
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let err = || ParseColorError(value.to_string());
        let hex = if let Some(digits) = trimmed.strip_prefix('#') {
            match digits.len() {
                6 => u32::from_str_radix(digits, 16).map_err(|_| err())?,
                3 => {
                    let expanded: String = digits.chars().flat_map(|c| [c, c]).collect();
                    u32::from_str_radix(&expanded, 16).map_err(|_| err())?
                }
                _ => return Err(err()),
            }
        } else if let Some(digits) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            u32::from_str_radix(digits, 16).map_err(|_| err())?
        } else {
            trimmed.parse::<u32>().map_err(|_| err())?
        };
        if hex > 0x00ff_ffff {
            return Err(err());
        }
        Ok(Self::from_srgb_hex(hex))
    }
}
