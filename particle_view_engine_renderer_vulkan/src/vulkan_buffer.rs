/// Buffer - Vulkan implementation of the engine Buffer trait

use ash::vk;
use gpu_allocator::vulkan::Allocation;
use particle_view_engine::device::Buffer as EngineBuffer;
use particle_view_engine::{engine_error, Error, Result};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

const SOURCE: &str = "particle_view::vulkan";

/// Vulkan buffer implementation
///
/// Host-visible (CpuToGpu) so `update` is a plain memcpy into the mapping.
pub struct Buffer {
    ctx: Arc<GpuContext>,
    pub(crate) buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: u64,
}

impl Buffer {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        buffer: vk::Buffer,
        allocation: Allocation,
        size: u64,
    ) -> Self {
        Self {
            ctx,
            buffer,
            allocation: Some(allocation),
            size,
        }
    }
}

impl EngineBuffer for Buffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let Some(allocation) = &self.allocation else {
            engine_error!(SOURCE, "Buffer update failed: no GPU allocation");
            return Err(Error::BackendError("Buffer has no allocation".to_string()));
        };

        if offset + data.len() as u64 > self.size {
            return Err(Error::InvalidResource(format!(
                "buffer update out of bounds: {} + {} > {}",
                offset,
                data.len(),
                self.size
            )));
        }

        let mapped_ptr = allocation
            .mapped_ptr()
            .ok_or_else(|| Error::BackendError("Buffer is not CPU-accessible".to_string()))?
            .as_ptr() as *mut u8;

        unsafe {
            std::ptr::copy_nonoverlapping(
                data.as_ptr(),
                mapped_ptr.offset(offset as isize),
                data.len(),
            );
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
