/// CommandList trait - for recording rendering commands
///
/// One command list belongs to each swap-surface resource; it is reset and
/// re-recorded every frame that lands on its image, then handed to
/// `GraphicsDevice::submit`.

use std::any::Any;
use std::sync::Arc;
use crate::error::Result;
use crate::device::{
    Buffer, Framebuffer, Pipeline, RenderPass, ShaderStage, Texture,
};

/// Command list for recording rendering commands
pub trait CommandList: Send + Sync {
    /// Reset the list and begin recording
    fn begin(&mut self) -> Result<()>;

    /// End recording
    fn end(&mut self) -> Result<()>;

    /// Begin the render pass instance for this frame
    ///
    /// # Arguments
    ///
    /// * `render_pass` - The shared render pass
    /// * `framebuffer` - The framebuffer of the acquired swap image
    /// * `clear_values` - Clear values for the color and depth attachments
    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn RenderPass>,
        framebuffer: &Arc<dyn Framebuffer>,
        clear_values: &[ClearValue],
    ) -> Result<()>;

    /// End the current render pass
    fn end_render_pass(&mut self) -> Result<()>;

    /// Set the dynamic viewport
    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    /// Set the dynamic scissor rectangle
    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()>;

    /// Bind a graphics pipeline
    fn bind_pipeline(&mut self, pipeline: &Arc<dyn Pipeline>) -> Result<()>;

    /// Bind a vertex buffer to the given binding slot
    fn bind_vertex_buffer(
        &mut self,
        binding: u32,
        buffer: &Arc<dyn Buffer>,
        offset: u64,
    ) -> Result<()>;

    /// Bind an index buffer
    fn bind_index_buffer(
        &mut self,
        buffer: &Arc<dyn Buffer>,
        offset: u64,
        index_type: IndexType,
    ) -> Result<()>;

    /// Bind a texture to the pipeline's combined image+sampler slot
    /// (set 0, binding 0). Only valid for pipelines created with
    /// `texture_binding: true`.
    fn bind_texture(
        &mut self,
        pipeline: &Arc<dyn Pipeline>,
        texture: &Arc<dyn Texture>,
    ) -> Result<()>;

    /// Push constants to the bound pipeline
    ///
    /// # Arguments
    ///
    /// * `stage` - Shader stage that reads the constants
    /// * `offset` - Byte offset into the push-constant range
    /// * `data` - Data to push (a 4x4 transform in this engine)
    fn push_constants(&mut self, stage: ShaderStage, offset: u32, data: &[u8]) -> Result<()>;

    /// Draw vertices (non-indexed)
    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()>;

    /// Draw indexed vertices
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()>;

    /// Downcast hook for backends (used by `GraphicsDevice::submit`)
    fn as_any(&self) -> &dyn Any;
}

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

/// 2D rectangle
#[derive(Debug, Clone, Copy)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Clear value for an attachment
#[derive(Debug, Clone, Copy)]
pub enum ClearValue {
    /// Color clear value (RGBA)
    Color([f32; 4]),
    /// Depth/stencil clear value
    DepthStencil { depth: f32, stencil: u32 },
}

/// Index element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U16,
    U32,
}
