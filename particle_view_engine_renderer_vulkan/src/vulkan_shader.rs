/// Shader - Vulkan implementation of the engine Shader trait

use ash::vk;
use particle_view_engine::device::{Shader as EngineShader, ShaderStage};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan shader module implementation
pub struct Shader {
    ctx: Arc<GpuContext>,
    pub(crate) module: vk::ShaderModule,
    pub(crate) stage: ShaderStage,
    pub(crate) entry_point: String,
}

impl Shader {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        module: vk::ShaderModule,
        stage: ShaderStage,
        entry_point: String,
    ) -> Self {
        Self {
            ctx,
            module,
            stage,
            entry_point,
        }
    }
}

impl EngineShader for Shader {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_shader_module(self.module, None);
        }
    }
}
