/// GraphicsDevice trait - resource factory and queue operations
///
/// The single entry point a backend implements. Resource lifetimes are
/// RAII: dropping the returned `Arc` releases the GPU object (backends hook
/// `Drop` on their concrete types), except that nothing referenced by
/// in-flight GPU work may be dropped before `wait_idle`: the swap-surface
/// pool enforces that ordering explicitly.

use std::sync::Arc;
use crate::error::Result;
use crate::device::{
    Buffer, BufferDesc, CommandList, ComputePipelineDesc, Fence, Framebuffer, FramebufferDesc,
    Pipeline, PipelineDesc, RenderPass, RenderPassDesc, RenderTarget, Semaphore, Shader,
    ShaderDesc, Texture, TextureDesc, TextureFormat,
};

/// Graphics device: resource factory plus the queue-level operations the
/// frame state machine needs (fence wait/reset, submit, idle drain).
pub trait GraphicsDevice: Send + Sync {
    // ===== FACTORIES =====

    fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn Buffer>>;

    fn create_texture(&self, desc: TextureDesc) -> Result<Arc<dyn Texture>>;

    fn create_shader(&self, desc: ShaderDesc) -> Result<Arc<dyn Shader>>;

    fn create_render_pass(&self, desc: RenderPassDesc) -> Result<Arc<dyn RenderPass>>;

    fn create_pipeline(&self, desc: PipelineDesc) -> Result<Arc<dyn Pipeline>>;

    fn create_compute_pipeline(&self, desc: ComputePipelineDesc) -> Result<Arc<dyn Pipeline>>;

    /// Create a depth render target sized to the current surface extent
    fn create_depth_target(&self, width: u32, height: u32) -> Result<Arc<dyn RenderTarget>>;

    fn create_framebuffer(&self, desc: FramebufferDesc) -> Result<Arc<dyn Framebuffer>>;

    fn create_command_list(&self) -> Result<Box<dyn CommandList>>;

    fn create_fence(&self, signaled: bool) -> Result<Arc<dyn Fence>>;

    fn create_semaphore(&self) -> Result<Arc<dyn Semaphore>>;

    // ===== QUEUE OPERATIONS =====

    /// Block until the fence signals.
    ///
    /// A timeout means the GPU stopped responding and maps to
    /// `Error::DeviceLost`: callers treat it as fatal.
    fn wait_for_fence(&self, fence: &Arc<dyn Fence>, timeout_ns: u64) -> Result<()>;

    /// Reset a signaled fence back to unsignaled
    fn reset_fence(&self, fence: &Arc<dyn Fence>) -> Result<()>;

    /// Submit a recorded command list.
    ///
    /// Waits on `wait` at the color-attachment-output stage, signals
    /// `signal` on completion, and signals `fence` for the CPU.
    fn submit(
        &self,
        cmd: &dyn CommandList,
        wait: &Arc<dyn Semaphore>,
        signal: &Arc<dyn Semaphore>,
        fence: &Arc<dyn Fence>,
    ) -> Result<()>;

    /// Composite glyph bitmaps from the atlas into the overlay image.
    ///
    /// Dispatches `pipeline` (a compute pipeline) with one workgroup per
    /// glyph. The kernel reads each placement record, samples the atlas
    /// rectangle with bilinear filtering (offset by the fractional part of
    /// the destination position) and writes
    /// `bg + coverage * (text_color - bg)` into the overlay.
    #[allow(clippy::too_many_arguments)]
    fn composite_glyphs(
        &self,
        pipeline: &Arc<dyn Pipeline>,
        atlas: &Arc<dyn Texture>,
        overlay: &Arc<dyn Texture>,
        placements: &Arc<dyn Buffer>,
        glyph_count: u32,
        bg_color: [f32; 4],
        text_color: [f32; 4],
    ) -> Result<()>;

    /// Depth format this device selected for depth attachments
    fn depth_format(&self) -> TextureFormat;

    /// Drain the device: block until all submitted work has completed.
    /// Required before destroying resources referenced by pending frames.
    fn wait_idle(&self) -> Result<()>;
}
