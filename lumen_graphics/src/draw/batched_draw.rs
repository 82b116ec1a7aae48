/// Batched draw accumulation
///
/// Many logical draws sharing primitive, vertex formats, index class,
/// texture and standard shader are appended to the same streaming buffers
/// and later drawn with one physical call. `BatchedDrawState::plan` decides
/// whether a request can join the pending batch; the render context
/// flushes when it cannot.

use crate::error::Result;
use crate::graphics_device::{
    BufferUsage, CommonFormat, GraphicsDevice, PrimitiveType, StandardShader, ATTRIB_COLOR,
};
use crate::resource::{StreamBuffer, TextureId};

/// How triangle indices are generated for a batched command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TriangleIndexMode {
    #[default]
    None,
    Strip,
    Fan,
    /// Four vertices per quad, drawn through the shared quad index buffer
    Quads,
}

impl TriangleIndexMode {
    /// Triangle-list indices needed for `vertex_count` vertices
    pub fn index_count(self, vertex_count: usize) -> usize {
        match self {
            TriangleIndexMode::None => 0,
            TriangleIndexMode::Strip | TriangleIndexMode::Fan => vertex_count.saturating_sub(2) * 3,
            TriangleIndexMode::Quads => vertex_count / 4 * 6,
        }
    }
}

/// Fill `out` with triangle-list indices for vertices `start..start + vertex_count`
///
/// `out` must hold `mode.index_count(vertex_count)` entries.
pub fn fill_indices(mode: TriangleIndexMode, start: u16, vertex_count: usize, out: &mut [u16]) {
    match mode {
        TriangleIndexMode::None => {}
        TriangleIndexMode::Strip => {
            for i in 0..vertex_count.saturating_sub(2) {
                let v = start + i as u16;
                let odd = (i & 1) as u16;
                out[i * 3] = v;
                out[i * 3 + 1] = v + 1 + odd;
                out[i * 3 + 2] = v + 2 - odd;
            }
        }
        TriangleIndexMode::Fan => {
            for i in 2..vertex_count {
                let t = (i - 2) * 3;
                out[t] = start;
                out[t + 1] = start + i as u16 - 1;
                out[t + 2] = start + i as u16;
            }
        }
        TriangleIndexMode::Quads => {
            for quad in 0..vertex_count / 4 {
                let v = start + (quad * 4) as u16;
                let t = quad * 6;
                out[t..t + 6].copy_from_slice(&[v, v + 1, v + 2, v + 2, v + 1, v + 3]);
            }
        }
    }
}

/// Index addressing of a batch; requests of different classes never share one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexClass {
    #[default]
    Unindexed,
    /// Indices generated into the index stream
    Generated,
    /// Quads drawn with the shared quad index buffer
    SharedQuads,
}

impl IndexClass {
    pub fn of(mode: TriangleIndexMode) -> Self {
        match mode {
            TriangleIndexMode::None => IndexClass::Unindexed,
            TriangleIndexMode::Strip | TriangleIndexMode::Fan => IndexClass::Generated,
            TriangleIndexMode::Quads => IndexClass::SharedQuads,
        }
    }
}

/// One logical batched draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchedDrawCommand {
    pub primitive: PrimitiveType,
    /// Vertex format of each of the two vertex streams
    pub formats: [CommonFormat; 2],
    pub index_mode: TriangleIndexMode,
    pub vertex_count: usize,
    pub texture: Option<TextureId>,
    pub standard_shader: StandardShader,
}

impl BatchedDrawCommand {
    pub fn new(primitive: PrimitiveType, format: CommonFormat, vertex_count: usize) -> Self {
        Self {
            primitive,
            formats: [format, CommonFormat::None],
            index_mode: TriangleIndexMode::None,
            vertex_count,
            texture: None,
            standard_shader: StandardShader::Default,
        }
    }

    /// `vertex_count / 4` quads drawn as triangles
    pub fn quads(format: CommonFormat, quad_count: usize) -> Self {
        Self::new(PrimitiveType::Triangles, format, quad_count * 4).with_index_mode(TriangleIndexMode::Quads)
    }

    pub fn with_index_mode(mut self, mode: TriangleIndexMode) -> Self {
        self.index_mode = mode;
        self
    }

    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_second_format(mut self, format: CommonFormat) -> Self {
        self.formats[1] = format;
        self
    }

    pub fn with_standard_shader(mut self, shader: StandardShader) -> Self {
        self.standard_shader = shader;
        self
    }
}

/// What joining a request to the pending batch requires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchPlan {
    pub flush: bool,
    /// New per-frame size of vertex stream 0, 1 and the index stream
    pub resize: [Option<usize>; 3],
    /// Vertex bytes appended to each vertex stream
    pub vertex_bytes: [usize; 2],
    pub index_count: usize,
}

impl BatchPlan {
    pub fn needs_resize(&self) -> bool {
        self.resize.iter().any(Option::is_some)
    }
}

/// Vertex memory handed to the caller of a batched draw request
pub struct BatchedVertexData<'a> {
    pub streams: [Option<&'a mut [u8]>; 2],
}

/// Pending batch and the streaming buffers it lives in
#[derive(Debug)]
pub struct BatchedDrawState {
    pub(crate) vertex_streams: [StreamBuffer; 2],
    pub(crate) index_stream: StreamBuffer,

    pub(crate) primitive: PrimitiveType,
    pub(crate) formats: [CommonFormat; 2],
    pub(crate) index_class: IndexClass,
    pub(crate) texture: Option<TextureId>,
    pub(crate) standard_shader: StandardShader,

    pub(crate) vertex_count: usize,
    pub(crate) index_count: usize,
    vertex_mapped: [bool; 2],
    index_mapped: bool,
    pub(crate) flushing: bool,
}

impl BatchedDrawState {
    /// Unloaded streams of the given per-frame sizes
    pub fn new(vertex_sizes: [usize; 2], index_size: usize) -> Result<Self> {
        Ok(Self {
            vertex_streams: [
                StreamBuffer::new(BufferUsage::Vertex, vertex_sizes[0])?,
                StreamBuffer::new(BufferUsage::Vertex, vertex_sizes[1])?,
            ],
            index_stream: StreamBuffer::new(BufferUsage::Index, index_size)?,
            primitive: PrimitiveType::Triangles,
            formats: [CommonFormat::None; 2],
            index_class: IndexClass::Unindexed,
            texture: None,
            standard_shader: StandardShader::Default,
            vertex_count: 0,
            index_count: 0,
            vertex_mapped: [false; 2],
            index_mapped: false,
            flushing: false,
        })
    }

    pub fn load<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D) -> Result<()> {
        for stream in &mut self.vertex_streams {
            stream.load(device)?;
        }
        self.index_stream.load(device)
    }

    pub fn unload<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D) {
        for stream in &mut self.vertex_streams {
            stream.unload(device);
        }
        self.index_stream.unload(device);
        self.reset();
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0 && self.index_count == 0
    }

    /// Whether the pending batch carries per-vertex colors
    pub fn has_vertex_colors(&self) -> bool {
        self.formats
            .iter()
            .any(|format| format.components().iter().any(|(location, _)| *location == ATTRIB_COLOR))
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn index_count(&self) -> usize {
        self.index_count
    }

    pub fn vertex_stream(&self, index: usize) -> &StreamBuffer {
        &self.vertex_streams[index]
    }

    pub fn index_stream(&self) -> &StreamBuffer {
        &self.index_stream
    }

    /// Rotate every stream to its next frame region
    pub fn next_frame(&mut self) {
        for stream in &mut self.vertex_streams {
            stream.next_frame();
        }
        self.index_stream.next_frame();
    }

    /// Decide whether `cmd` can join the pending batch
    pub fn plan(&self, cmd: &BatchedDrawCommand) -> BatchPlan {
        let class = IndexClass::of(cmd.index_mode);
        let mut plan = BatchPlan {
            flush: cmd.primitive != self.primitive
                || cmd.formats != self.formats
                || class != self.index_class
                || cmd.texture != self.texture
                || cmd.standard_shader != self.standard_shader,
            ..BatchPlan::default()
        };

        let total_vertices = self.vertex_count + cmd.vertex_count;

        // Generated indices are 16-bit
        if class == IndexClass::Generated && total_vertices > u16::MAX as usize {
            plan.flush = true;
        }

        for (i, format) in cmd.formats.iter().enumerate() {
            if *format == CommonFormat::None {
                continue;
            }
            let stride = format.stride();
            let stream = &self.vertex_streams[i];
            let data_size = stride * total_vertices;

            if self.vertex_mapped[i] && data_size > stream.usable_size() {
                plan.flush = true;
            }
            if data_size > stream.usable_size() {
                plan.resize[i] = Some(data_size.max(stream.size() * 2));
            }
            plan.vertex_bytes[i] = stride * cmd.vertex_count;
        }

        if class == IndexClass::Generated {
            plan.index_count = cmd.index_mode.index_count(cmd.vertex_count);
            let data_size = (self.index_count + plan.index_count) * std::mem::size_of::<u16>();
            if self.index_mapped && data_size > self.index_stream.usable_size() {
                plan.flush = true;
            }
            if data_size > self.index_stream.usable_size() {
                plan.resize[2] = Some(data_size.max(self.index_stream.size() * 2));
            }
        }

        plan
    }

    /// Adopt the state of `cmd` for a new, empty batch
    pub fn begin(&mut self, cmd: &BatchedDrawCommand) {
        self.primitive = cmd.primitive;
        self.formats = cmd.formats;
        self.index_class = IndexClass::of(cmd.index_mode);
        self.texture = cmd.texture;
        self.standard_shader = cmd.standard_shader;
    }

    /// Grow streams that are too small for the plan; the batch must be empty
    pub fn apply_resize<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, plan: &BatchPlan) -> Result<()> {
        for (i, stream) in self.vertex_streams.iter_mut().enumerate() {
            if let Some(size) = plan.resize[i] {
                if stream.size() < size {
                    stream.resize(device, size)?;
                }
            }
        }
        if let Some(size) = plan.resize[2] {
            if self.index_stream.size() < size {
                self.index_stream.resize(device, size)?;
            }
        }
        Ok(())
    }

    /// Append `cmd` to the batch: generate its indices and hand out its vertex memory
    pub fn append<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        cmd: &BatchedDrawCommand,
        plan: &BatchPlan,
    ) -> Result<BatchedVertexData<'_>> {
        if plan.index_count > 0 {
            let index_bytes = plan.index_count * std::mem::size_of::<u16>();
            if !self.index_mapped {
                self.index_stream.map(device, index_bytes)?;
                self.index_mapped = true;
            }
            let mut indices = vec![0u16; plan.index_count];
            fill_indices(cmd.index_mode, self.vertex_count as u16, cmd.vertex_count, &mut indices);

            let start = self.index_count * std::mem::size_of::<u16>();
            let mapped = self.index_stream.mapped();
            mapped[start..start + index_bytes].copy_from_slice(bytemuck::cast_slice(&indices));
            self.index_count += plan.index_count;
        }

        let first_vertex = self.vertex_count;
        self.vertex_count += cmd.vertex_count;

        let mut streams: [Option<&mut [u8]>; 2] = [None, None];
        let [stream0, stream1] = &mut self.vertex_streams;
        for (i, stream) in [stream0, stream1].into_iter().enumerate() {
            let bytes = plan.vertex_bytes[i];
            if bytes == 0 {
                continue;
            }
            if !self.vertex_mapped[i] {
                stream.map(device, bytes)?;
                self.vertex_mapped[i] = true;
            }
            let start = first_vertex * cmd.formats[i].stride();
            streams[i] = Some(&mut stream.mapped()[start..start + bytes]);
        }

        Ok(BatchedVertexData { streams })
    }

    /// Forget the pending batch after it was drawn
    pub(crate) fn finish_flush(&mut self) {
        self.vertex_count = 0;
        self.index_count = 0;
        self.vertex_mapped = [false; 2];
        self.index_mapped = false;
        self.flushing = false;
    }

    fn reset(&mut self) {
        self.finish_flush();
        self.formats = [CommonFormat::None; 2];
        self.index_class = IndexClass::Unindexed;
        self.texture = None;
    }
}

#[cfg(test)]
#[path = "batched_draw_tests.rs"]
mod tests;
