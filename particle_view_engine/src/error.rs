//! Error types for the Particle View engine
//!
//! One error enum is shared by the orchestration core and the graphics
//! backends. Soft surface conditions (out-of-date / suboptimal swapchains)
//! are *not* errors: they are ordinary `Swapchain` outcomes handled inside
//! the renderer. Anything that does surface here is fatal to the frame loop:
//! callers are expected to tear down rather than retry.

use std::fmt;

/// Result type for Particle View engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Particle View engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Vulkan, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (texture, buffer, shader, etc.)
    InvalidResource(String),

    /// Initialization failed (renderer, device, subsystems)
    InitializationFailed(String),

    /// The device stopped responding (e.g. a fence wait timed out)
    DeviceLost(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::DeviceLost(msg) => write!(f, "Device lost: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
