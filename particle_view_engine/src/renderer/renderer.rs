/// Renderer - the per-frame orchestration state machine.
///
/// One `render` call drives a full frame: wait on the in-flight fence,
/// acquire a swap image (rebuilding the swap-surface pool in a bounded loop
/// while the surface reports out-of-date), record every enabled layer into
/// the image's command buffer inside one render pass instance, submit with
/// the semaphore pair, present.
///
/// Error contract: the two soft surface conditions are handled inline and
/// never escape. Every `Err` returned from this type is fatal: callers are
/// expected to tear down, not retry. A fence timeout (`Error::DeviceLost`)
/// means the GPU hung.

use std::sync::Arc;
use glam::Vec2;

use crate::camera::CameraParams;
use crate::config::{RendererConfig, ShaderSet};
use crate::device::{
    Acquire, Buffer, BufferDesc, BufferUsage, ClearValue, GraphicsDevice, Present, Rect2D,
    RenderPass, RenderPassDesc, Swapchain, Viewport,
};
use crate::error::{Error, Result};
use crate::renderer::frame_sync::FrameSync;
use crate::renderer::particles::{ParticlesPipeline, POSITION_STRIDE};
use crate::renderer::swap_surface::SwapSurfacePool;
use crate::renderer::text_overlay::TextPipeline;
use crate::renderer::wireframe::WireframePipeline;
use crate::text::FontRasterizer;
use crate::{engine_debug, engine_info, engine_warn};

/// Value the dummy potential buffer is filled with when the caller supplies
/// no potential field.
const DUMMY_POTENTIAL: f32 = 0.9;

const SOURCE: &str = "particle_view::Renderer";

pub struct Renderer {
    device: Arc<dyn GraphicsDevice>,
    swapchain: Box<dyn Swapchain>,
    render_pass: Arc<dyn RenderPass>,
    surfaces: SwapSurfacePool,
    sync: FrameSync,

    // Drawable layers, drawn in this fixed back-to-front order.
    particles: ParticlesPipeline,
    wireframe: Option<WireframePipeline>,
    text: Option<TextPipeline>,

    /// Constant-filled stand-in tracking the position buffer's length,
    /// used when the caller supplies no potential buffer.
    dummy_potential: Option<Arc<dyn Buffer>>,

    config: RendererConfig,
}

impl Renderer {
    /// Build the renderer against an already-created device and surface.
    ///
    /// Layer enablement is decided here, once: `wireframe_cube_size == 0`
    /// disables the wireframe layer; an absent or nonexistent font disables
    /// the text layer (logged, never an error).
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        swapchain: Box<dyn Swapchain>,
        shaders: &ShaderSet,
        config: RendererConfig,
        rasterizer: &dyn FontRasterizer,
    ) -> Result<Self> {
        let render_pass = device.create_render_pass(RenderPassDesc {
            color_format: swapchain.format(),
            depth_format: device.depth_format(),
        })?;

        let particles = ParticlesPipeline::new(device.as_ref(), &render_pass, shaders)?;

        let wireframe = if config.wireframe_cube_size > 0.0 {
            Some(WireframePipeline::new(
                device.as_ref(),
                &render_pass,
                shaders,
                config.wireframe_cube_size,
            )?)
        } else {
            engine_debug!(SOURCE, "wireframe layer disabled (cube size 0)");
            None
        };

        let text = match &config.font {
            Some(font) if font.path.exists() => {
                let atlas = rasterizer.bake(&font.path, font.size)?;
                Some(TextPipeline::new(
                    device.as_ref(),
                    &render_pass,
                    shaders,
                    atlas,
                    config.overlay_size,
                )?)
            }
            Some(font) => {
                engine_warn!(
                    SOURCE,
                    "text layer disabled: font file {} not found",
                    font.path.display()
                );
                None
            }
            None => {
                engine_warn!(SOURCE, "text layer disabled: no font configured");
                None
            }
        };

        let mut surfaces = SwapSurfacePool::new();
        surfaces.create_all(device.as_ref(), swapchain.as_ref(), &render_pass)?;
        let sync = FrameSync::new(device.as_ref(), swapchain.image_count())?;

        engine_info!(
            SOURCE,
            "renderer ready: {} swap images, wireframe {}, text {}",
            surfaces.len(),
            if wireframe.is_some() { "on" } else { "off" },
            if text.is_some() { "on" } else { "off" },
        );

        Ok(Self {
            device,
            swapchain,
            render_pass,
            surfaces,
            sync,
            particles,
            wireframe,
            text,
            dummy_potential: None,
            config,
        })
    }

    /// Render one frame.
    ///
    /// Blocks until the previous frame's fence signals; at most one frame is
    /// ever in flight from this renderer. `potential` may be omitted, in
    /// which case a dummy buffer filled with a constant is substituted and
    /// resized to track the position buffer's length.
    pub fn render(
        &mut self,
        positions: &Arc<dyn Buffer>,
        potential: Option<&Arc<dyn Buffer>>,
        camera: CameraParams,
    ) -> Result<()> {
        self.device
            .wait_for_fence(&self.sync.in_flight, self.config.fence_timeout_ns)?;
        self.device.reset_fence(&self.sync.in_flight)?;

        let potential = match potential {
            Some(buffer) => buffer.clone(),
            None => self.dummy_potential(positions)?,
        };

        let image_index = self.acquire_image()?;
        let extent = self.swapchain.extent();
        let view_projection = camera.view_projection(extent);

        {
            let surface = self.surfaces.surface_mut(image_index as usize);
            let framebuffer = surface.framebuffer.clone();
            let cmd = surface.command_list.as_mut();

            cmd.begin()?;
            cmd.begin_render_pass(
                &self.render_pass,
                &framebuffer,
                &[
                    ClearValue::Color([0.0, 0.0, 0.0, 1.0]),
                    // Reversed-Z: farthest depth is 0.0
                    ClearValue::DepthStencil { depth: 0.0, stencil: 0 },
                ],
            )?;
            cmd.set_viewport(Viewport {
                x: 0.0,
                y: 0.0,
                width: extent[0] as f32,
                height: extent[1] as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            })?;
            cmd.set_scissor(Rect2D {
                x: 0,
                y: 0,
                width: extent[0],
                height: extent[1],
            })?;

            // Fixed back-to-front layer order: 3D particles, wireframe cube,
            // 2D text overlay. The overlay's transparent background blends
            // over everything beneath it.
            self.particles
                .draw(cmd, view_projection, positions, &potential)?;
            if let Some(wireframe) = &self.wireframe {
                wireframe.draw(cmd, view_projection)?;
            }
            if let Some(text) = &self.text {
                text.draw(cmd, extent)?;
            }

            cmd.end_render_pass()?;
            cmd.end()?;
        }

        let render_finished = &self.sync.render_finished[image_index as usize];
        self.device.submit(
            self.surfaces.surface(image_index as usize).command_list.as_ref(),
            &self.sync.image_available,
            render_finished,
            &self.sync.in_flight,
        )?;

        match self
            .swapchain
            .present(image_index, &self.sync.render_finished[image_index as usize])?
        {
            Present::Presented => {}
            Present::OutOfDate => {
                // The next acquire will report the resize and rebuild.
                engine_info!(SOURCE, "present: surface out of date");
            }
            Present::Suboptimal => {
                engine_info!(SOURCE, "present: surface suboptimal, rebuilding swap resources");
                self.rebuild_swap_surfaces()?;
            }
        }

        Ok(())
    }

    /// Update the text overlay. No-op when the text layer is disabled.
    pub fn update_text(&mut self, text: &str, top_left: Vec2) -> Result<()> {
        match &self.text {
            Some(pipeline) => pipeline.update_text(self.device.as_ref(), text, top_left),
            None => Ok(()),
        }
    }

    /// Acquire the next swap image, rebuilding the swap-surface resources
    /// while the surface reports out-of-date. A resize can race with another
    /// resize, so this is a bounded loop rather than a one-shot fallback; a
    /// surface that stays stale across many rebuilds is a fatal condition.
    fn acquire_image(&mut self) -> Result<u32> {
        for attempt in 0..=self.config.max_acquire_retries {
            match self.swapchain.acquire(&self.sync.image_available)? {
                Acquire::Ready(index) => return Ok(index),
                Acquire::Suboptimal(index) => {
                    engine_warn!(SOURCE, "acquire: surface suboptimal, continuing");
                    return Ok(index);
                }
                Acquire::OutOfDate => {
                    engine_info!(
                        SOURCE,
                        "acquire: surface out of date, rebuilding swap resources (attempt {})",
                        attempt + 1
                    );
                    self.rebuild_swap_surfaces()?;
                }
            }
        }

        Err(Error::BackendError(format!(
            "surface still out of date after {} rebuilds",
            self.config.max_acquire_retries
        )))
    }

    /// Tear down and rebuild everything sized to the surface: drain the
    /// device, drop the pool, recreate the swapchain, rebuild the pool, and
    /// re-provision the per-image semaphores if the image count changed.
    fn rebuild_swap_surfaces(&mut self) -> Result<()> {
        self.surfaces.destroy_all(self.device.as_ref())?;
        self.swapchain.recreate()?;
        self.surfaces
            .create_all(self.device.as_ref(), self.swapchain.as_ref(), &self.render_pass)?;
        self.sync
            .match_image_count(self.device.as_ref(), self.swapchain.image_count())
    }

    /// The constant-filled potential stand-in, reallocated whenever the
    /// position buffer's element count changes.
    fn dummy_potential(&mut self, positions: &Arc<dyn Buffer>) -> Result<Arc<dyn Buffer>> {
        let count = (positions.size() / POSITION_STRIDE) as usize;
        let byte_size = (count.max(1) * std::mem::size_of::<f32>()) as u64;

        let stale = match &self.dummy_potential {
            Some(buffer) => buffer.size() != byte_size,
            None => true,
        };
        if stale {
            let buffer = self.device.create_buffer(BufferDesc {
                size: byte_size,
                usage: BufferUsage::Vertex,
                label: "potential_dummy",
            })?;
            buffer.update(0, bytemuck::cast_slice(&vec![DUMMY_POTENTIAL; count.max(1)]))?;
            self.dummy_potential = Some(buffer);
        }

        Ok(self.dummy_potential.as_ref().unwrap().clone())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // The pool's bundles reference in-flight work; drain before release.
        if self.surfaces.destroy_all(self.device.as_ref()).is_err() {
            engine_warn!(SOURCE, "device drain failed during renderer teardown");
        }
    }
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod renderer_tests;
