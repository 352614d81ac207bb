/// Font atlas data - produced by an external rasterizer, consumed by the
/// text pipeline.

use std::path::Path;
use crate::error::Result;

/// Side length of the square single-channel glyph atlas, in pixels.
pub const ATLAS_SIZE: u32 = 512;

/// First character covered by the atlas (ASCII space).
pub const FIRST_GLYPH: u32 = 32;

/// Number of characters covered (ASCII 32..128).
pub const GLYPH_COUNT: usize = 96;

/// Placement metadata for one baked glyph.
///
/// `x0..x1 / y0..y1` is the glyph's rectangle inside the atlas;
/// `xoff`/`yoff` offset the bitmap from the pen position and `xadvance`
/// moves the pen to the next glyph.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlyphMetrics {
    pub x0: u16,
    pub y0: u16,
    pub x1: u16,
    pub y1: u16,
    pub xoff: f32,
    pub yoff: f32,
    pub xadvance: f32,
}

/// A pre-baked glyph atlas: one R8 coverage bitmap plus per-character
/// rectangle metadata for ASCII 32..128.
pub struct FontAtlas {
    /// Atlas width in pixels (normally [`ATLAS_SIZE`]).
    pub width: u32,
    /// Atlas height in pixels (normally [`ATLAS_SIZE`]).
    pub height: u32,
    /// Tightly packed single-channel coverage values, `width * height` bytes.
    pub pixels: Vec<u8>,
    /// Metadata for characters [`FIRST_GLYPH`]`..`[`FIRST_GLYPH`]` + `[`GLYPH_COUNT`].
    pub glyphs: [GlyphMetrics; GLYPH_COUNT],
    /// Rasterized pixel size; also the layout line height.
    pub font_size: f32,
}

/// External collaborator that bakes a TrueType font into a [`FontAtlas`].
///
/// The renderer checks the configured font path for existence once at
/// construction and calls `bake` only when the file is present; a bake
/// failure is an initialization error, not a disabled layer.
pub trait FontRasterizer {
    fn bake(&self, path: &Path, font_size: f32) -> Result<FontAtlas>;
}
