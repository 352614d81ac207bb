/// Text pipeline - the 2D textured-quad overlay layer.
///
/// Renders one alpha-blended quad sampling the overlay image. The overlay
/// content itself is produced device-side: `update_text` lays out the
/// string, uploads the per-glyph placement records, and dispatches the
/// glyph-blit kernel that composites atlas rectangles into the overlay.

use std::sync::Arc;
use glam::Vec2;

use crate::config::ShaderSet;
use crate::device::{
    BlendMode, Buffer, BufferDesc, BufferUsage, CommandList, ComputePipelineDesc, DepthState,
    GraphicsDevice, IndexType, Pipeline, PipelineDesc, PrimitiveTopology, RenderPass, ShaderDesc,
    ShaderStage, Texture, TextureDesc, TextureFormat, TextureUsage, VertexFormat, VertexStream,
};
use crate::error::Result;
use crate::text::{layout_glyphs, FontAtlas, GlyphPlacement};
use crate::{camera, engine_warn};

/// Capacity of the glyph placement buffer; longer strings are truncated.
pub const MAX_GLYPHS: usize = 256;

/// Overlay background (semi-transparent black) and text color.
const BG_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 0.5];
const TEXT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

const SOURCE: &str = "particle_view::TextPipeline";

pub struct TextPipeline {
    pipeline: Arc<dyn Pipeline>,
    blit_pipeline: Arc<dyn Pipeline>,
    overlay: Arc<dyn Texture>,
    atlas_texture: Arc<dyn Texture>,
    atlas: FontAtlas,
    vertex_buffer: Arc<dyn Buffer>,
    texcoord_buffer: Arc<dyn Buffer>,
    index_buffer: Arc<dyn Buffer>,
    placement_buffer: Arc<dyn Buffer>,
}

impl TextPipeline {
    pub fn new(
        device: &dyn GraphicsDevice,
        render_pass: &Arc<dyn RenderPass>,
        shaders: &ShaderSet,
        atlas: FontAtlas,
        overlay_size: [u32; 2],
    ) -> Result<Self> {
        let vertex_shader = device.create_shader(ShaderDesc {
            code: shaders.overlay_vert.clone(),
            stage: ShaderStage::Vertex,
            entry_point: "main".to_string(),
        })?;
        let fragment_shader = device.create_shader(ShaderDesc {
            code: shaders.overlay_frag.clone(),
            stage: ShaderStage::Fragment,
            entry_point: "main".to_string(),
        })?;

        let pipeline = device.create_pipeline(PipelineDesc {
            label: "text",
            render_pass: render_pass.clone(),
            topology: PrimitiveTopology::TriangleList,
            vertex_shader,
            fragment_shader,
            vertex_streams: vec![
                VertexStream { binding: 0, format: VertexFormat::Float32x2 },
                VertexStream { binding: 1, format: VertexFormat::Float32x2 },
            ],
            depth: DepthState::disabled(),
            blend: BlendMode::Alpha,
            texture_binding: true,
        })?;

        let blit_shader = device.create_shader(ShaderDesc {
            code: shaders.glyph_blit.clone(),
            stage: ShaderStage::Compute,
            entry_point: "main".to_string(),
        })?;
        let blit_pipeline = device.create_compute_pipeline(ComputePipelineDesc {
            label: "glyph_blit",
            shader: blit_shader,
        })?;

        // The compositor writes the overlay as a storage image, so a UNORM
        // format is required (sRGB formats are not storage-writable).
        let overlay = device.create_texture(TextureDesc {
            width: overlay_size[0],
            height: overlay_size[1],
            format: TextureFormat::R8G8B8A8_UNORM,
            usage: TextureUsage::Storage,
            label: "text_overlay",
        })?;
        overlay.fill([0.0, 0.0, 0.0, 0.0])?;

        let atlas_texture = device.create_texture(TextureDesc {
            width: atlas.width,
            height: atlas.height,
            format: TextureFormat::R8_UNORM,
            usage: TextureUsage::Sampled,
            label: "glyph_atlas",
        })?;
        atlas_texture.upload(&atlas.pixels)?;

        let quad = overlay_quad(Vec2::ZERO, overlay_size);
        let vertex_buffer = device.create_buffer(BufferDesc {
            size: std::mem::size_of_val(&quad) as u64,
            usage: BufferUsage::Vertex,
            label: "overlay_vertices",
        })?;
        vertex_buffer.update(0, bytemuck::cast_slice(&quad))?;

        let texcoords: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let texcoord_buffer = device.create_buffer(BufferDesc {
            size: std::mem::size_of_val(&texcoords) as u64,
            usage: BufferUsage::Vertex,
            label: "overlay_texcoords",
        })?;
        texcoord_buffer.update(0, bytemuck::cast_slice(&texcoords))?;

        let index_buffer = device.create_buffer(BufferDesc {
            size: std::mem::size_of_val(&QUAD_INDICES) as u64,
            usage: BufferUsage::Index,
            label: "overlay_indices",
        })?;
        index_buffer.update(0, bytemuck::cast_slice(&QUAD_INDICES))?;

        let placement_buffer = device.create_buffer(BufferDesc {
            size: (MAX_GLYPHS * std::mem::size_of::<GlyphPlacement>()) as u64,
            usage: BufferUsage::Storage,
            label: "glyph_placements",
        })?;

        Ok(Self {
            pipeline,
            blit_pipeline,
            overlay,
            atlas_texture,
            atlas,
            vertex_buffer,
            texcoord_buffer,
            index_buffer,
            placement_buffer,
        })
    }

    /// Re-lay-out the overlay for a new string and composite it device-side.
    ///
    /// `top_left` positions the overlay quad on screen in surface pixels.
    pub fn update_text(
        &self,
        device: &dyn GraphicsDevice,
        text: &str,
        top_left: Vec2,
    ) -> Result<()> {
        self.overlay.fill(BG_COLOR)?;

        let mut placements = layout_glyphs(text, &self.atlas);
        if placements.len() > MAX_GLYPHS {
            engine_warn!(
                SOURCE,
                "text truncated: {} glyphs exceed the {}-glyph placement buffer",
                placements.len(),
                MAX_GLYPHS
            );
            placements.truncate(MAX_GLYPHS);
        }

        if !placements.is_empty() {
            self.placement_buffer
                .update(0, bytemuck::cast_slice(&placements))?;
            device.composite_glyphs(
                &self.blit_pipeline,
                &self.atlas_texture,
                &self.overlay,
                &self.placement_buffer,
                placements.len() as u32,
                BG_COLOR,
                TEXT_COLOR,
            )?;
        }

        let quad = overlay_quad(top_left, [self.overlay.width(), self.overlay.height()]);
        self.vertex_buffer.update(0, bytemuck::cast_slice(&quad))
    }

    /// Record this layer's draw: one alpha-blended quad in overlay space.
    pub fn draw(&self, cmd: &mut dyn CommandList, extent: [u32; 2]) -> Result<()> {
        cmd.bind_pipeline(&self.pipeline)?;
        cmd.bind_texture(&self.pipeline, &self.overlay)?;
        cmd.bind_vertex_buffer(0, &self.vertex_buffer, 0)?;
        cmd.bind_vertex_buffer(1, &self.texcoord_buffer, 0)?;
        cmd.bind_index_buffer(&self.index_buffer, 0, IndexType::U32)?;

        let ortho = camera::overlay_projection(extent);
        cmd.push_constants(ShaderStage::Vertex, 0, bytemuck::bytes_of(&ortho))?;

        cmd.draw_indexed(QUAD_INDICES.len() as u32, 0, 0)
    }
}

/// Screen-space quad corners for the overlay rectangle
fn overlay_quad(top_left: Vec2, size: [u32; 2]) -> [[f32; 2]; 4] {
    let (w, h) = (size[0] as f32, size[1] as f32);
    [
        [top_left.x, top_left.y],
        [top_left.x + w, top_left.y],
        [top_left.x + w, top_left.y + h],
        [top_left.x, top_left.y + h],
    ]
}

#[cfg(test)]
#[path = "text_overlay_tests.rs"]
mod text_overlay_tests;
