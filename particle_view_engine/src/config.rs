//! Renderer configuration
//!
//! All tunables are explicit constructor inputs: there is no process-global
//! configuration. Layer enablement (wireframe, text) is decided once from
//! these values at construction time and never revisited.

use std::path::PathBuf;

/// Font configuration for the text overlay layer
#[derive(Debug, Clone)]
pub struct FontConfig {
    /// Path to a TrueType font file. Checked for existence once at renderer
    /// construction; a missing file disables the text layer.
    pub path: PathBuf,
    /// Rasterized glyph size in pixels. Also the line height used by layout.
    pub size: f32,
}

/// Renderer configuration
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Half-extent of the wireframe bounding cube. `0.0` disables the
    /// wireframe layer entirely.
    pub wireframe_cube_size: f32,

    /// Pixel size of the text overlay image.
    pub overlay_size: [u32; 2],

    /// Font for the text overlay. `None` disables the text layer.
    pub font: Option<FontConfig>,

    /// How long to wait for the previous frame's fence before declaring the
    /// device lost. Expiry is fatal: it means the GPU hung.
    pub fence_timeout_ns: u64,

    /// Upper bound on acquire attempts within one frame while the surface
    /// keeps reporting out-of-date (resizes can race with resizes).
    pub max_acquire_retries: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            wireframe_cube_size: 1.0,
            overlay_size: [512, 128],
            font: None,
            fence_timeout_ns: 60_000_000_000,
            max_acquire_retries: 8,
        }
    }
}

/// SPIR-V byte code for every pipeline the renderer builds.
///
/// Shader compilation and loading are the embedding application's concern;
/// the engine consumes the byte code as opaque data. The GLSL sources these
/// blobs are expected to be compiled from live in the vulkan backend crate's
/// `shaders/` directory.
#[derive(Clone)]
pub struct ShaderSet {
    pub particles_vert: Vec<u8>,
    pub particles_frag: Vec<u8>,
    pub wireframe_vert: Vec<u8>,
    pub wireframe_frag: Vec<u8>,
    pub overlay_vert: Vec<u8>,
    pub overlay_frag: Vec<u8>,
    /// Compute kernel compositing glyph bitmaps into the overlay image.
    pub glyph_blit: Vec<u8>,
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
