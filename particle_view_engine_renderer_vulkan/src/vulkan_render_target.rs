/// RenderTarget - Vulkan implementation of the engine RenderTarget trait
///
/// Two flavors share this type: depth targets, which own their image and
/// memory, and swapchain color targets, which own only the view (the
/// swapchain owns the image).

use ash::vk;
use gpu_allocator::vulkan::Allocation;
use particle_view_engine::device::{RenderTarget as EngineRenderTarget, TextureFormat};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan render target implementation
pub struct RenderTarget {
    ctx: Arc<GpuContext>,
    /// Owned image + memory (depth targets); None for swapchain views
    owned_image: Option<(vk::Image, Allocation)>,
    pub(crate) view: vk::ImageView,
    width: u32,
    height: u32,
    format: TextureFormat,
}

impl RenderTarget {
    /// A target owning its image (depth attachment)
    pub(crate) fn owned(
        ctx: Arc<GpuContext>,
        image: vk::Image,
        allocation: Allocation,
        view: vk::ImageView,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Self {
        Self {
            ctx,
            owned_image: Some((image, allocation)),
            view,
            width,
            height,
            format,
        }
    }

    /// A non-owning view over a swapchain image
    pub(crate) fn swapchain_view(
        ctx: Arc<GpuContext>,
        view: vk::ImageView,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Self {
        Self {
            ctx,
            owned_image: None,
            view,
            width,
            height,
            format,
        }
    }
}

impl EngineRenderTarget for RenderTarget {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for RenderTarget {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_image_view(self.view, None);
            if let Some((image, allocation)) = self.owned_image.take() {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
                self.ctx.device.destroy_image(image, None);
            }
        }
    }
}
