/// Synchronization primitives - Vulkan fence and semaphore wrappers

use ash::vk;
use particle_view_engine::device::{Fence as EngineFence, Semaphore as EngineSemaphore};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan fence implementation
pub struct Fence {
    ctx: Arc<GpuContext>,
    pub(crate) fence: vk::Fence,
}

impl Fence {
    pub(crate) fn new(ctx: Arc<GpuContext>, fence: vk::Fence) -> Self {
        Self { ctx, fence }
    }
}

impl EngineFence for Fence {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_fence(self.fence, None);
        }
    }
}

/// Vulkan binary semaphore implementation
pub struct Semaphore {
    ctx: Arc<GpuContext>,
    pub(crate) semaphore: vk::Semaphore,
}

impl Semaphore {
    pub(crate) fn new(ctx: Arc<GpuContext>, semaphore: vk::Semaphore) -> Self {
        Self { ctx, semaphore }
    }
}

impl EngineSemaphore for Semaphore {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_semaphore(self.semaphore, None);
        }
    }
}
