/// Pool of engine-allocated textures (forced depth/stencil targets, ...)
///
/// The pool only tracks ids and idle counters; creating and destroying the
/// textures is left to the owner so cached framebuffers get invalidated.

use super::TextureId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporaryTexture {
    pub texture: TextureId,
    pub frames_since_use: u32,
}

#[derive(Debug)]
pub struct TemporaryTexturePool {
    entries: Vec<TemporaryTexture>,
    max_unused_frames: u32,
}

impl TemporaryTexturePool {
    pub fn new(max_unused_frames: u32) -> Self {
        Self {
            entries: Vec::new(),
            max_unused_frames,
        }
    }

    /// First pooled texture accepted by `matches`; its idle counter is reset
    pub fn acquire(&mut self, mut matches: impl FnMut(TextureId) -> bool) -> Option<TextureId> {
        let entry = self.entries.iter_mut().find(|e| matches(e.texture))?;
        entry.frames_since_use = 0;
        Some(entry.texture)
    }

    pub fn insert(&mut self, texture: TextureId) {
        self.entries.push(TemporaryTexture { texture, frames_since_use: 0 });
    }

    /// Called once per presented frame. Returns the textures idle for too
    /// long; every other entry gets one frame older.
    pub fn age(&mut self) -> Vec<TextureId> {
        let mut evicted = Vec::new();
        let max = self.max_unused_frames;
        self.entries.retain_mut(|entry| {
            if entry.frames_since_use >= max {
                evicted.push(entry.texture);
                false
            } else {
                entry.frames_since_use += 1;
                true
            }
        });
        evicted
    }

    /// Remove every entry, returning the ids to destroy
    pub fn drain(&mut self) -> Vec<TextureId> {
        self.entries.drain(..).map(|e| e.texture).collect()
    }

    pub fn contains(&self, texture: TextureId) -> bool {
        self.entries.iter().any(|e| e.texture == texture)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "temporary_textures_tests.rs"]
mod tests;
