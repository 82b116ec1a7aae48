/// Draw-side state: display state stack, batching, quads and dispatch barriers

pub mod display_state;
pub mod batched_draw;
pub mod quads;
pub mod dispatch;

pub use display_state::{DisplayState, StateStack, StencilWrite};
pub use batched_draw::{
    fill_indices, BatchPlan, BatchedDrawCommand, BatchedDrawState, BatchedVertexData, IndexClass,
    TriangleIndexMode,
};
pub use quads::{advance_vertex_offsets, quad_chunks, quad_indices, QuadChunk, MAX_QUADS_PER_DRAW, MAX_VERTICES_PER_DRAW, QUAD_INDICES};
pub use dispatch::{compute_dispatch_barriers, DispatchBarriers, WritableTexture};
