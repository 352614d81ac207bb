/*!
# Particle View Engine - Vulkan Renderer Backend

Vulkan implementation of the Particle View engine's device traits, using the
Ash bindings and gpu-allocator for memory management.

`GpuContext::new(window)` brings up the instance, surface, device, queue and
allocator; `VulkanGraphicsDevice` and `VulkanSwapchain` built on top of it
plug straight into `particle_view_engine::Renderer`:

```no_run
use std::sync::Arc;
use particle_view_engine::{Renderer, RendererConfig};
use particle_view_engine_renderer_vulkan::{GpuContext, VulkanGraphicsDevice, VulkanSwapchain};

# fn run(window: &winit::window::Window, shaders: &particle_view_engine::ShaderSet,
#        rasterizer: &dyn particle_view_engine::text::FontRasterizer)
#        -> particle_view_engine::Result<()> {
let ctx = Arc::new(GpuContext::new(window)?);
let device = Arc::new(VulkanGraphicsDevice::new(ctx.clone())?);
let swapchain = VulkanSwapchain::new(ctx.clone())?;
let renderer = Renderer::new(device, Box::new(swapchain), shaders,
                             RendererConfig::default(), rasterizer)?;
# Ok(()) }
```

The `vulkan-validation` cargo feature compiles in the Khronos validation
layer and a debug-utils messenger; without it none of that code exists in
the binary.
*/

// Vulkan implementation modules
mod vulkan_context;
mod vulkan_device;
mod vulkan_buffer;
mod vulkan_texture;
mod vulkan_shader;
mod vulkan_pipeline;
mod vulkan_render_target;
mod vulkan_render_pass;
mod vulkan_frame_buffer;
mod vulkan_command_list;
mod vulkan_swapchain;
mod vulkan_sync;
#[cfg(feature = "vulkan-validation")]
mod debug;

pub use vulkan_context::GpuContext;
pub use vulkan_device::VulkanGraphicsDevice;
pub use vulkan_swapchain::VulkanSwapchain;

#[cfg(feature = "vulkan-validation")]
pub use debug::{validation_stats, ValidationStats};

#[cfg(test)]
mod vulkan_format_tests;
