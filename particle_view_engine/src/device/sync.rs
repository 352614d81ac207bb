/// Synchronization primitives - fences and binary semaphores
///
/// These are opaque handles; the operations on them (wait, reset, submit
/// wiring) live on `GraphicsDevice` because the backend needs its device
/// handle to perform them.

use std::any::Any;

/// CPU-observable completion signal for a submitted frame
pub trait Fence: Send + Sync {
    /// Downcast hook for backends
    fn as_any(&self) -> &dyn Any;
}

/// GPU-to-GPU ordering primitive (binary semaphore)
pub trait Semaphore: Send + Sync {
    /// Downcast hook for backends
    fn as_any(&self) -> &dyn Any;
}
