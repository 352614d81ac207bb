/// RenderPass trait - the single shared render pass
///
/// One pass, one subpass: a color attachment (load = clear, store = store,
/// final layout presentable) and a depth attachment (load = clear,
/// store = discard). Every drawable pipeline is created against this pass
/// and every frame records exactly one instance of it.

use std::any::Any;
use crate::device::texture::TextureFormat;

/// Descriptor for creating the shared render pass
#[derive(Debug, Clone, Copy)]
pub struct RenderPassDesc {
    /// Format of the swapchain color images
    pub color_format: TextureFormat,
    /// Depth format chosen by the device (see `GraphicsDevice::depth_format`)
    pub depth_format: TextureFormat,
}

/// Render pass object
pub trait RenderPass: Send + Sync {
    /// Downcast hook for backends
    fn as_any(&self) -> &dyn Any;
}
