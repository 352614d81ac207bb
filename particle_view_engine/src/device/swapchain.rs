/// Swapchain trait - the presentation surface
///
/// The swapchain owns the presentable color images and reports surface
/// staleness through the two soft outcomes below instead of errors. The
/// renderer reacts to `OutOfDate` by tearing down and rebuilding its
/// swap-surface resources around a `recreate` call.

use std::sync::Arc;
use crate::error::Result;
use crate::device::render_target::RenderTarget;
use crate::device::sync::Semaphore;
use crate::device::texture::TextureFormat;

/// Outcome of an image acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    /// Image acquired and fully usable
    Ready(u32),
    /// Image acquired but the surface no longer matches it exactly; usable,
    /// logged, no rebuild required
    Suboptimal(u32),
    /// The surface changed (resize); the swapchain must be recreated before
    /// an image can be acquired
    OutOfDate,
}

/// Outcome of a presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Present {
    Presented,
    /// Presented, but the surface no longer matches; rebuild immediately
    Suboptimal,
    /// Not presented; the next acquire will report the resize
    OutOfDate,
}

/// Presentation surface
pub trait Swapchain: Send + Sync {
    /// Number of presentable images currently provided by the surface
    fn image_count(&self) -> usize;

    /// Current surface extent in pixels
    fn extent(&self) -> [u32; 2];

    /// Pixel format of the presentable images
    fn format(&self) -> TextureFormat;

    /// Acquire the next presentable image, signaling `image_available` when
    /// it is ready to be rendered to
    fn acquire(&mut self, image_available: &Arc<dyn Semaphore>) -> Result<Acquire>;

    /// Present the image at `image_index`, waiting on `render_finished`
    fn present(
        &mut self,
        image_index: u32,
        render_finished: &Arc<dyn Semaphore>,
    ) -> Result<Present>;

    /// Recreate the swapchain at the surface's current size. The caller must
    /// have destroyed every resource referencing the old images first.
    fn recreate(&mut self) -> Result<()>;

    /// A non-owning render-target view over the image at `image_index`.
    /// Views become invalid after `recreate`; the pool re-requests them.
    fn color_target(&self, image_index: u32) -> Result<Arc<dyn RenderTarget>>;
}
