//! Render context: the owner of every cache and the driver of the device
//!
//! `RenderContext` ties the capability set, resources, framebuffer cache,
//! display state stack and batched draws together, and implements passes,
//! draws, compute dispatch and presentation on top of them.

mod render_context;
mod state;
mod render_pass;
mod draw_commands;
mod presentation;

pub use render_context::{
    FrameStats, RenderContext, RendererInfo, SurfaceInfo, VolatileResource,
    DEFAULT_STORAGE_BUFFER_SIZE,
};
pub use state::StateGuard;
pub use draw_commands::{DrawCommand, DrawIndexedCommand};
pub use presentation::{ImageData, ImageDataFactory, ScreenshotCallback, ScreenshotInfo, Surface};

#[cfg(test)]
pub(crate) mod test_support;
