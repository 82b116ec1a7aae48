/// Buffer resource with a CPU shadow copy
///
/// The shadow copy is what gets re-uploaded when the context is recreated,
/// so every write goes through `write` and lands in both places.

use crate::error::Result;
use crate::engine_bail;
use crate::graphics_device::{BufferDesc, BufferHandle, BufferUsageFlags, GraphicsDevice};
use super::staging::StagingMemory;

#[derive(Debug)]
pub struct Buffer {
    desc: BufferDesc,
    data: Vec<u8>,
    handle: Option<BufferHandle>,
}

impl Buffer {
    /// Create an unloaded buffer; `initial` is truncated or zero-padded to `desc.size`
    pub fn new(desc: BufferDesc, initial: Option<&[u8]>) -> Self {
        let mut data = vec![0u8; desc.size];
        if let Some(initial) = initial {
            let n = initial.len().min(desc.size);
            data[..n].copy_from_slice(&initial[..n]);
        }
        Self { desc, data, handle: None }
    }

    pub fn load<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D) -> Result<()> {
        if self.handle.is_none() {
            self.handle = Some(device.create_buffer(&self.desc, Some(&self.data))?);
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

    pub fn size(&self) -> usize {
        self.desc.size
    }

    pub fn usage(&self) -> BufferUsageFlags {
        self.desc.usage
    }

    pub fn desc(&self) -> &BufferDesc {
        &self.desc
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Map `len` bytes at `offset`, let `fill` write them, then upload
    ///
    /// The mapped bytes are staging memory, not the previous contents.
    pub fn map_write<D, F>(
        &mut self,
        device: &mut D,
        staging: &mut StagingMemory,
        offset: usize,
        len: usize,
        fill: F,
    ) -> Result<()>
    where
        D: GraphicsDevice + ?Sized,
        F: FnOnce(&mut [u8]),
    {
        let end = match offset.checked_add(len) {
            Some(end) if end <= self.desc.size => end,
            _ => engine_bail!(@InvalidOperation, "lumen::Buffer",
                "Write of {} bytes at offset {} exceeds buffer size {}", len, offset, self.desc.size),
        };

        let mut scratch = staging.scratch(len)?;
        fill(&mut scratch[..]);

        if let Some(handle) = self.handle {
            device.write_buffer(handle, offset, &scratch)?;
        }
        self.data[offset..end].copy_from_slice(&scratch);
        Ok(())
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
