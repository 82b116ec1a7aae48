/// Streaming buffer for transient per-frame draw data
///
/// The device buffer is split into `FRAME_COUNT` equal regions. Each frame
/// appends into its own region, so data written this frame never lands
/// where a draw of the previous frames may still be reading. `next_frame`
/// rotates to the next region and is the only place a region gets reused.
///
/// Writes go through a CPU-side map region: `map` exposes the unwritten
/// tail of the current region, `unmap` uploads what was used and returns
/// its byte offset in the device buffer, `mark_used` commits it.

use crate::error::Result;
use crate::graphics_device::{
    BufferDesc, BufferHandle, BufferUsage, DataUsage, GraphicsDevice,
};
use super::staging::try_alloc_zeroed;

/// Frames that may be in flight at once
pub const FRAME_COUNT: usize = 3;

#[derive(Debug)]
pub struct StreamBuffer {
    usage: BufferUsage,
    frame_size: usize,
    frame_index: usize,
    frame_offset: usize,
    map_memory: Vec<u8>,
    handle: Option<BufferHandle>,
}

impl StreamBuffer {
    /// Unloaded stream buffer with `size` usable bytes per frame
    pub fn new(usage: BufferUsage, size: usize) -> Result<Self> {
        Ok(Self {
            usage,
            frame_size: size,
            frame_index: 0,
            frame_offset: 0,
            map_memory: try_alloc_zeroed(size)?,
            handle: None,
        })
    }

    fn device_desc(&self) -> BufferDesc {
        BufferDesc {
            size: self.frame_size * FRAME_COUNT,
            usage: self.usage.flag(),
            data_usage: DataUsage::Stream,
            debug_name: Some(format!("{:?} stream", self.usage)),
        }
    }

    pub fn load<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D) -> Result<()> {
        if self.handle.is_none() {
            self.handle = Some(device.create_buffer(&self.device_desc(), None)?);
            self.frame_index = 0;
            self.frame_offset = 0;
        }
        Ok(())
    }

    pub fn unload<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D) {
        if let Some(handle) = self.handle.take() {
            device.delete_buffer(handle);
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<BufferHandle> {
        self.handle
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Bytes per frame region
    pub fn size(&self) -> usize {
        self.frame_size
    }

    /// Bytes still free in the current frame region
    pub fn usable_size(&self) -> usize {
        self.frame_size - self.frame_offset
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Writable view of the free tail of the current region
    ///
    /// When fewer than `min_size` bytes are left the device buffer is
    /// orphaned: a fresh buffer replaces it, so nothing pending can read the
    /// bytes written next.
    pub fn map<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, min_size: usize) -> Result<&mut [u8]> {
        if min_size > self.usable_size() && min_size <= self.frame_size {
            self.unload(device);
            self.load(device)?;
        }
        let usable = self.usable_size();
        Ok(&mut self.map_memory[..usable])
    }

    /// Mapped memory without device interaction (already mapped region)
    pub fn mapped(&mut self) -> &mut [u8] {
        let usable = self.usable_size();
        &mut self.map_memory[..usable]
    }

    /// Upload the first `used` mapped bytes; returns their device offset
    pub fn unmap<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, used: usize) -> Result<usize> {
        let offset = self.frame_index * self.frame_size + self.frame_offset;
        let used = used.min(self.usable_size());
        if used > 0 {
            if let Some(handle) = self.handle {
                device.write_buffer(handle, offset, &self.map_memory[..used])?;
            }
        }
        Ok(offset)
    }

    /// Commit `used` bytes of the current region
    pub fn mark_used(&mut self, used: usize) {
        self.frame_offset = (self.frame_offset + used).min(self.frame_size);
    }

    /// Rotate to the next frame region
    pub fn next_frame(&mut self) {
        self.frame_index = (self.frame_index + 1) % FRAME_COUNT;
        self.frame_offset = 0;
    }

    /// Replace the buffer by a larger one; nothing may be pending
    pub fn resize<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, size: usize) -> Result<()> {
        let map_memory = try_alloc_zeroed(size)?;
        let was_loaded = self.is_loaded();
        self.unload(device);
        self.frame_size = size;
        self.map_memory = map_memory;
        self.frame_index = 0;
        self.frame_offset = 0;
        if was_loaded {
            self.load(device)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "stream_buffer_tests.rs"]
mod tests;
