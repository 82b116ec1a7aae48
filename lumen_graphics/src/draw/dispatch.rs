/// Memory barrier selection around compute dispatches
///
/// The policy is conservative: a barrier is placed before the dispatch
/// whenever anything is written (earlier reads or writes of those
/// resources must complete), and after it for every way the written
/// resources may be consumed next. Back-to-back dispatches therefore get
/// redundant barriers.

use crate::graphics_device::{BufferUsageFlags, MemoryBarriers};

/// Writable texture bound to the dispatched program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WritableTexture {
    pub render_target: bool,
}

/// Barriers to issue before and after a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchBarriers {
    pub pre: MemoryBarriers,
    pub post: MemoryBarriers,
}

/// Barriers for a program writing `buffers` and `textures`
///
/// Returns `None` when any writable slot has nothing bound; the dispatch
/// must not be issued in that case.
pub fn compute_dispatch_barriers(
    buffers: &[Option<BufferUsageFlags>],
    textures: &[Option<WritableTexture>],
) -> Option<DispatchBarriers> {
    let mut barriers = DispatchBarriers::default();

    for usage in buffers {
        let usage = (*usage)?;

        barriers.pre |= MemoryBarriers::SHADER_STORAGE;
        // Later buffer writes from the CPU side must wait for the shader's
        barriers.post |= MemoryBarriers::SHADER_STORAGE | MemoryBarriers::BUFFER_UPDATE;

        let mut reads = MemoryBarriers::empty();
        if usage.contains(BufferUsageFlags::VERTEX) {
            reads |= MemoryBarriers::VERTEX_ATTRIB_ARRAY;
        }
        if usage.contains(BufferUsageFlags::INDEX) {
            reads |= MemoryBarriers::ELEMENT_ARRAY;
        }
        if usage.contains(BufferUsageFlags::TEXEL) {
            reads |= MemoryBarriers::TEXTURE_FETCH;
        }
        if usage.intersects(BufferUsageFlags::COPY_SOURCE | BufferUsageFlags::COPY_DEST) {
            reads |= MemoryBarriers::BUFFER_UPDATE | MemoryBarriers::PIXEL_BUFFER;
        }

        barriers.pre |= reads;
        barriers.post |= reads;
    }

    for texture in textures {
        let texture = (*texture)?;

        barriers.pre |= MemoryBarriers::SHADER_IMAGE_ACCESS;
        barriers.post |= MemoryBarriers::SHADER_IMAGE_ACCESS
            | MemoryBarriers::TEXTURE_FETCH
            | MemoryBarriers::TEXTURE_UPDATE
            | MemoryBarriers::PIXEL_BUFFER;

        if texture.render_target {
            barriers.pre |= MemoryBarriers::FRAMEBUFFER;
            barriers.post |= MemoryBarriers::FRAMEBUFFER;
        }
    }

    Some(barriers)
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
