/// Framebuffer - Vulkan implementation of the engine Framebuffer trait
///
/// Wraps a VkFramebuffer binding one swapchain color view and one depth view
/// against the shared render pass. Destroyed (after the pool's idle drain)
/// whenever the surface changes size.

use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use particle_view_engine::device::{Framebuffer as EngineFramebuffer, RenderTarget};

/// Vulkan framebuffer implementation
pub struct Framebuffer {
    ctx: Arc<GpuContext>,
    pub(crate) framebuffer: vk::Framebuffer,
    width: u32,
    height: u32,
    /// Keep the attachments alive as long as the framebuffer references them
    _attachments: [Arc<dyn RenderTarget>; 2],
}

impl Framebuffer {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        framebuffer: vk::Framebuffer,
        width: u32,
        height: u32,
        attachments: [Arc<dyn RenderTarget>; 2],
    ) -> Self {
        Self {
            ctx,
            framebuffer,
            width,
            height,
            _attachments: attachments,
        }
    }
}

impl EngineFramebuffer for Framebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}
