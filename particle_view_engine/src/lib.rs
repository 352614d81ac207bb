/*!
# Particle View Engine

Frame-lifecycle and render orchestration core for live particle-simulation
visualization.

The engine renders point-cloud simulation state (positions plus an optional
scalar potential field), a wireframe bounding cube, and a 2D text overlay
into one render pass per frame, synchronizing CPU and GPU with a
fence/semaphore pair and recreating its swap-surface resources whenever the
presentation surface changes size.

## Architecture

- **Renderer**: the per-frame state machine (`render`, `update_text`)
- **Device traits**: the closed seam a graphics backend implements
  (`GraphicsDevice`, `Swapchain`, `CommandList`, resource traits)
- **Drawable layers**: particles, wireframe, text: a closed set drawn in a
  fixed back-to-front order
- **SwapSurfacePool / FrameSync**: per-swap-image resources and the
  synchronization primitives gating frame overlap

The Vulkan backend lives in the `particle_view_engine_renderer_vulkan`
crate. Everything in this crate is testable without a GPU through mock trait
implementations.
*/

// Internal modules
mod error;
pub mod log;
pub mod config;
pub mod camera;
pub mod device;
pub mod renderer;
pub mod text;

// Top-level re-exports
pub use error::{Error, Result};
pub use config::{FontConfig, RendererConfig, ShaderSet};
pub use camera::CameraParams;
pub use renderer::Renderer;

// Re-export math library at crate root
pub use glam;
