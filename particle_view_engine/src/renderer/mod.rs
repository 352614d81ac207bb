/// Renderer module - the frame-lifecycle and render orchestration engine.
///
/// `Renderer` owns the shared render pass, the swap-surface resource pool,
/// the frame synchronization primitives, and the drawable pipeline layers,
/// and exposes the single per-frame `render` entry point.

// Module declarations
pub mod frame_sync;
pub mod swap_surface;
pub mod particles;
pub mod wireframe;
pub mod text_overlay;
pub mod renderer;

// Re-exports
pub use frame_sync::*;
pub use swap_surface::*;
pub use particles::*;
pub use wireframe::*;
pub use text_overlay::*;
pub use renderer::*;
