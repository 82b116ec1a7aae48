//! Error types for the Lumen graphics core
//!
//! Every fallible operation of the render context, the caches and the
//! device backends reports one of these variants.

use std::fmt;

/// Result type for Lumen graphics operations
pub type Result<T> = std::result::Result<T, Error>;

/// Lumen graphics errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backend-specific error (driver call failed, missing driver string, ...)
    BackendError(String),

    /// Out of memory (staging block, readback buffers, device allocations)
    OutOfMemory,

    /// Invalid resource (stale id, null writable resource, ...)
    InvalidResource(String),

    /// Initialization failed (context, standard programs, default buffers)
    InitializationFailed(String),

    /// Framebuffer failed its completeness check; carries the driver status
    FramebufferIncomplete(String),

    /// Operation not valid in the current state
    InvalidOperation(String),

    /// Capability missing on this device
    Unsupported(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::FramebufferIncomplete(status) => {
                write!(f, "Could not create Framebuffer Object! {}", status)
            }
            Error::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
            Error::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
