/// Central storage for textures and buffers
///
/// Resources live in slot maps so ids stay stable and stale ids are
/// detected instead of aliasing a newer resource. The manager does not
/// touch the device; load/unload is driven by the render context.

use slotmap::SlotMap;
use super::buffer::Buffer;
use super::texture::Texture;
use super::{BufferId, TextureId};

#[derive(Debug, Default)]
pub struct ResourceManager {
    textures: SlotMap<TextureId, Texture>,
    buffers: SlotMap<BufferId, Buffer>,
}

impl ResourceManager {
    pub fn new() -> Self {
        Self {
            textures: SlotMap::with_key(),
            buffers: SlotMap::with_key(),
        }
    }

    // ===== TEXTURES =====

    pub fn insert_texture(&mut self, texture: Texture) -> TextureId {
        self.textures.insert(texture)
    }

    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id)
    }

    pub fn texture_mut(&mut self, id: TextureId) -> Option<&mut Texture> {
        self.textures.get_mut(id)
    }

    pub fn remove_texture(&mut self, id: TextureId) -> Option<Texture> {
        self.textures.remove(id)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Sum of `Texture::memory_size` over every loaded texture
    pub fn texture_memory(&self) -> usize {
        self.textures
            .values()
            .filter(|t| t.is_loaded())
            .map(|t| t.memory_size())
            .sum()
    }

    // ===== BUFFERS =====

    pub fn insert_buffer(&mut self, buffer: Buffer) -> BufferId {
        self.buffers.insert(buffer)
    }

    pub fn buffer(&self, id: BufferId) -> Option<&Buffer> {
        self.buffers.get(id)
    }

    pub fn buffer_mut(&mut self, id: BufferId) -> Option<&mut Buffer> {
        self.buffers.get_mut(id)
    }

    pub fn remove_buffer(&mut self, id: BufferId) -> Option<Buffer> {
        self.buffers.remove(id)
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }
}

#[cfg(test)]
#[path = "resource_manager_tests.rs"]
mod tests;
