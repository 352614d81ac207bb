/// Texture trait - sampled and storage images

use std::any::Any;
use crate::error::Result;

/// Pixel formats used across the engine
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    R8_UNORM,
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    D32_SFLOAT,
    D32_SFLOAT_S8_UINT,
    D24_UNORM_S8_UINT,
}

impl TextureFormat {
    /// Whether this is a depth (as opposed to color) format
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            TextureFormat::D32_SFLOAT
                | TextureFormat::D32_SFLOAT_S8_UINT
                | TextureFormat::D24_UNORM_S8_UINT
        )
    }
}

/// Usage class of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureUsage {
    /// Sampled in shaders, host-uploadable (glyph atlas)
    Sampled,
    /// Written by compute, sampled in shaders (overlay image)
    Storage,
}

/// Descriptor for creating a texture
#[derive(Debug, Clone)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
    /// Debug label (also used by mock resource tracking in tests)
    pub label: &'static str,
}

/// Device-resident image
pub trait Texture: Send + Sync {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn format(&self) -> TextureFormat;

    /// Clear every texel to the given color
    fn fill(&self, color: [f32; 4]) -> Result<()>;

    /// Upload tightly packed host pixels covering the whole image
    fn upload(&self, pixels: &[u8]) -> Result<()>;

    /// Downcast hook for backends
    fn as_any(&self) -> &dyn Any;
}
