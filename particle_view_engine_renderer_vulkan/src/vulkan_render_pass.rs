/// RenderPass - Vulkan implementation of the engine RenderPass trait

use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use particle_view_engine::device::RenderPass as EngineRenderPass;

/// Vulkan render pass implementation
pub struct RenderPass {
    ctx: Arc<GpuContext>,
    pub(crate) render_pass: vk::RenderPass,
}

impl RenderPass {
    pub(crate) fn new(ctx: Arc<GpuContext>, render_pass: vk::RenderPass) -> Self {
        Self { ctx, render_pass }
    }
}

impl EngineRenderPass for RenderPass {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_render_pass(self.render_pass, None);
        }
    }
}
