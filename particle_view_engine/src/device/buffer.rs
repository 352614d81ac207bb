/// Buffer trait - device-resident typed data

use std::any::Any;
use crate::error::Result;

/// Usage class of a device buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    Vertex,
    Index,
    Storage,
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone)]
pub struct BufferDesc {
    /// Size in bytes
    pub size: u64,
    /// Usage class
    pub usage: BufferUsage,
    /// Debug label (also used by mock resource tracking in tests)
    pub label: &'static str,
}

/// Device-resident buffer
///
/// Simulation-owned position/potential buffers and all renderer-owned
/// geometry flow through this trait. Buffers are host-writable via `update`
/// and never read back.
pub trait Buffer: Send + Sync {
    /// Size in bytes
    fn size(&self) -> u64;

    /// Upload host data at the given byte offset
    fn update(&self, offset: u64, data: &[u8]) -> Result<()>;

    /// Downcast hook for backends
    fn as_any(&self) -> &dyn Any;
}
