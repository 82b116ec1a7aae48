/// Shared quad index buffer layout and chunking of quad draws
///
/// Every quad uses the same 6 indices relative to its first vertex, so a
/// single 16-bit index buffer covering `MAX_QUADS_PER_DRAW` quads serves
/// any number of quads: either through a base vertex per chunk, or by
/// moving the vertex stream offsets forward between chunks.

use crate::graphics_device::{BufferBindings, VertexAttributes, MAX_VERTEX_BUFFERS};

/// Quads per physical draw; 16384 vertices keep every index in u16 range
pub const MAX_QUADS_PER_DRAW: usize = 4096;

pub const MAX_VERTICES_PER_DRAW: usize = MAX_QUADS_PER_DRAW * 4;

/// Index pattern of one quad (two triangles sharing the 1-2 edge)
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

/// Indices for `quad_count` consecutive quads
pub fn quad_indices(quad_count: usize) -> Vec<u16> {
    let mut indices = Vec::with_capacity(quad_count * 6);
    for quad in 0..quad_count {
        let base = (quad * 4) as u16;
        indices.extend(QUAD_INDICES.iter().map(|i| base + i));
    }
    indices
}

/// One physical draw of a chunked quad draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadChunk {
    /// First vertex of the chunk, relative to the draw's vertex 0
    pub first_vertex: usize,
    pub quad_count: usize,
}

impl QuadChunk {
    pub fn index_count(&self) -> u32 {
        (self.quad_count * 6) as u32
    }

    pub fn vertex_count(&self) -> usize {
        self.quad_count * 4
    }
}

/// Split quads `start..start + count` into chunks of at most `MAX_QUADS_PER_DRAW`
pub fn quad_chunks(start: usize, count: usize) -> impl Iterator<Item = QuadChunk> {
    (0..count).step_by(MAX_QUADS_PER_DRAW).map(move |offset| QuadChunk {
        first_vertex: (start + offset) * 4,
        quad_count: MAX_QUADS_PER_DRAW.min(count - offset),
    })
}

/// Move every vertex stream used by `attributes` forward by `vertex_count` vertices
///
/// Each buffer slot is advanced once, even when several attributes read it.
pub fn advance_vertex_offsets(attributes: &VertexAttributes, buffers: &mut BufferBindings, vertex_count: usize) {
    let mut touched = [false; MAX_VERTEX_BUFFERS];
    for attribute in &attributes.attributes {
        let slot = attribute.buffer_index;
        if slot >= MAX_VERTEX_BUFFERS || touched[slot] {
            continue;
        }
        touched[slot] = true;
        if let Some(binding) = buffers.slots[slot].as_mut() {
            binding.offset += attributes.strides[slot] as usize * vertex_count;
        }
    }
}

#[cfg(test)]
#[path = "quads_tests.rs"]
mod tests;
