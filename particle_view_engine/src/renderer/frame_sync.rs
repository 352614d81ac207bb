/// Frame synchronization state - the semaphore/fence set gating CPU/GPU
/// overlap.
///
/// Exactly one fence is outstanding per logical frame: `render` never starts
/// recording until the previous submission's fence has signaled. The
/// image-available semaphore orders acquisition against rendering; one
/// render-finished semaphore per swap image orders rendering against
/// presentation.

use std::sync::Arc;
use crate::device::{Fence, GraphicsDevice, Semaphore};
use crate::error::Result;

pub struct FrameSync {
    /// Signaled by the surface when the acquired image is ready to render to
    pub image_available: Arc<dyn Semaphore>,
    /// One per swap image; signaled when rendering to that image completes
    pub render_finished: Vec<Arc<dyn Semaphore>>,
    /// Signaled when the previously submitted frame's GPU work completes.
    /// Created signaled so the first frame does not block.
    pub in_flight: Arc<dyn Fence>,
}

impl FrameSync {
    pub fn new(device: &dyn GraphicsDevice, image_count: usize) -> Result<Self> {
        let render_finished = (0..image_count)
            .map(|_| device.create_semaphore())
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            image_available: device.create_semaphore()?,
            render_finished,
            in_flight: device.create_fence(true)?,
        })
    }

    /// Re-provision the per-image semaphores after a swapchain rebuild
    /// changed the image count. Safe to call while no frame is in flight
    /// (the pool rebuild's idle drain guarantees that).
    pub fn match_image_count(
        &mut self,
        device: &dyn GraphicsDevice,
        image_count: usize,
    ) -> Result<()> {
        if self.render_finished.len() != image_count {
            self.render_finished = (0..image_count)
                .map(|_| device.create_semaphore())
                .collect::<Result<Vec<_>>>()?;
        }
        Ok(())
    }
}
