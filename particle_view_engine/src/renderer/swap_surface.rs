/// Swap-surface resource pool - the per-swapchain-image resource bundles.
///
/// One `SwapSurface` per presentable image: a pool-owned depth target, a
/// non-owning color view over the swapchain's image, a framebuffer binding
/// both to the shared render pass, and the command buffer recorded for
/// frames that land on that image.
///
/// The pool is never partially valid: `create_all` installs the full set or
/// nothing, and `destroy_all` drains the device before releasing anything,
/// because framebuffers and command buffers must not be destroyed while
/// referenced by pending GPU work. Resize is always
/// `destroy_all` → swapchain recreation → `create_all`, never incremental.

use std::sync::Arc;
use crate::device::{
    CommandList, Framebuffer, FramebufferDesc, GraphicsDevice, RenderPass, RenderTarget, Swapchain,
};
use crate::error::Result;

/// Per-swap-image resource bundle
pub struct SwapSurface {
    /// Non-owning view over the swapchain's color image
    pub color: Arc<dyn RenderTarget>,
    /// Pool-owned depth image + view
    pub depth: Arc<dyn RenderTarget>,
    /// Framebuffer binding color + depth against the shared render pass
    pub framebuffer: Arc<dyn Framebuffer>,
    /// Command buffer recorded for frames landing on this image
    pub command_list: Box<dyn CommandList>,
}

/// All-or-nothing pool of `SwapSurface` bundles
pub struct SwapSurfacePool {
    surfaces: Vec<SwapSurface>,
}

impl SwapSurfacePool {
    pub fn new() -> Self {
        Self { surfaces: Vec::new() }
    }

    /// Build one bundle per image the surface currently provides.
    ///
    /// On any failure nothing is installed; already-created bundles are
    /// released (the device is idle at that point, so immediate release is
    /// safe).
    pub fn create_all(
        &mut self,
        device: &dyn GraphicsDevice,
        swapchain: &dyn Swapchain,
        render_pass: &Arc<dyn RenderPass>,
    ) -> Result<()> {
        debug_assert!(self.surfaces.is_empty(), "pool recreated without destroy_all");

        let [width, height] = swapchain.extent();
        let mut surfaces = Vec::with_capacity(swapchain.image_count());

        for index in 0..swapchain.image_count() {
            let color = swapchain.color_target(index as u32)?;
            let depth = device.create_depth_target(width, height)?;
            let framebuffer = device.create_framebuffer(FramebufferDesc {
                render_pass,
                color: color.clone(),
                depth: depth.clone(),
                width,
                height,
            })?;
            let command_list = device.create_command_list()?;

            surfaces.push(SwapSurface {
                color,
                depth,
                framebuffer,
                command_list,
            });
        }

        self.surfaces = surfaces;
        Ok(())
    }

    /// Drain the device, then release every bundle.
    pub fn destroy_all(&mut self, device: &dyn GraphicsDevice) -> Result<()> {
        device.wait_idle()?;
        self.surfaces.clear();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn surface(&self, index: usize) -> &SwapSurface {
        &self.surfaces[index]
    }

    pub fn surface_mut(&mut self, index: usize) -> &mut SwapSurface {
        &mut self.surfaces[index]
    }
}

impl Default for SwapSurfacePool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "swap_surface_tests.rs"]
mod swap_surface_tests;
