/*!
# Lumen Graphics

Render state and GPU resource management for an OpenGL-class device.

This crate holds everything between a 2D drawing API and the driver:
display state, render target switches, the framebuffer cache, batched
draws, volatile resources and frame presentation. The driver itself is
reached through the `GraphicsDevice` trait; the `lumen_graphics_renderer_gl`
crate implements it on top of `glow`.

## Architecture

- **RenderContext**: owns the device and every cache built on it
- **GraphicsDevice**: thin trait over the driver calls the context needs
- **CapabilitySet**: features, limits and driver paths probed at mode set
- **TargetCache**: framebuffer objects keyed by render target set
- **BatchedDrawState**: streaming vertex/index buffers shared by small draws
- **VolatileRegistry**: resources recreated after a context loss

All types live in the `lumen` namespace module.
*/

// Modules
pub mod error;
pub mod log;
pub mod config;
pub mod capabilities;
pub mod graphics_device;
pub mod resource;
pub mod target;
pub mod draw;
pub mod context;

// Main lumen namespace module
pub mod lumen {
    // Error types
    pub use crate::error::{Error, Result};

    // Render context and its public surface
    pub use crate::context::{
        DrawCommand, DrawIndexedCommand, FrameStats, ImageData, ImageDataFactory, RenderContext,
        RendererInfo, ScreenshotCallback, ScreenshotInfo, StateGuard, Surface, SurfaceInfo,
        VolatileResource, DEFAULT_STORAGE_BUFFER_SIZE,
    };

    // Configuration
    pub use crate::config::{
        DebugConfig, DebugMessageFilter, DebugOutput, DebugSeverity, RenderConfig, ValidationStats,
        DEBUG_ENV_VAR,
    };

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
        pub use crate::log::{log, log_detailed, reset_logger, set_logger};
        // Note: engine_* macros are exported at the crate root for backends
    }

    // Device trait and every type crossing it
    pub mod device {
        pub use crate::graphics_device::*;
    }

    // Capability probing
    pub mod capabilities {
        pub use crate::capabilities::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Render targets
    pub mod target {
        pub use crate::target::*;
    }

    // Display state, batching, quads and dispatch barriers
    pub mod draw {
        pub use crate::draw::*;
    }
}

// Re-export math library at crate root
pub use glam;
