/// Graphics device module - the device trait and every type crossing it

pub mod graphics_device;
pub mod texture;
pub mod buffer;
pub mod shader;
pub mod pipeline;
pub mod barrier;

pub use graphics_device::*;
pub use texture::*;
pub use buffer::*;
pub use shader::*;
pub use pipeline::*;
pub use barrier::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
