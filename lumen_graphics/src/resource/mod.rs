//! GPU resources owned by the render context
//!
//! Textures and buffers are stored in a `ResourceManager` and addressed by
//! slot-map ids. Streaming buffers, the staging block, the temporary
//! texture pool and the volatile registry complete the per-frame recycling
//! and context-reset machinery.

mod resource_manager;
pub mod buffer;
pub mod staging;
pub mod stream_buffer;
pub mod temporary_textures;
pub mod texture;
pub mod volatile;

slotmap::new_key_type! {
    /// Stable id of a texture in the `ResourceManager`
    pub struct TextureId;
    /// Stable id of a buffer in the `ResourceManager`
    pub struct BufferId;
}

pub use resource_manager::ResourceManager;
pub use buffer::Buffer;
pub use staging::{Scratch, StagingMemory};
pub use stream_buffer::{StreamBuffer, FRAME_COUNT};
pub use temporary_textures::{TemporaryTexture, TemporaryTexturePool};
pub use texture::{RenderAttachment, Texture};
pub use volatile::VolatileRegistry;
