/// Device module - the closed trait seam between the orchestration core and
/// a graphics backend.
///
/// The renderer talks to the GPU exclusively through these traits. A backend
/// (the vulkan crate) implements them with real API objects; tests implement
/// them with mocks. Backends recover their concrete types from trait objects
/// via the `as_any` hooks.

// Module declarations
pub mod graphics_device;
pub mod buffer;
pub mod texture;
pub mod shader;
pub mod pipeline;
pub mod command_list;
pub mod render_target;
pub mod render_pass;
pub mod frame_buffer;
pub mod swapchain;
pub mod sync;

// Re-export everything
pub use graphics_device::*;
pub use buffer::*;
pub use texture::*;
pub use shader::*;
pub use pipeline::*;
pub use command_list::*;
pub use render_target::*;
pub use render_pass::*;
pub use frame_buffer::*;
pub use swapchain::*;
pub use sync::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_device;
