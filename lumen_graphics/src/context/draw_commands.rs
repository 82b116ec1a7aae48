/// Draw submission: explicit draws, chunked quads, batching and compute

use glam::Vec4;

use crate::capabilities::Limit;
use crate::draw::{
    advance_vertex_offsets, compute_dispatch_barriers, quad_chunks, BatchedDrawCommand,
    BatchedVertexData, IndexClass, WritableTexture,
};
use crate::error::Result;
use crate::engine_bail;
use crate::graphics_device::{
    BufferBindings, BufferHandle, BufferUsage, BufferUsageFlags, BuiltinUniforms, Colorf,
    CommonFormat, CullMode, GraphicsDevice, IndexType, PrimitiveType, ProgramHandle,
    ShaderProgram, StandardShader, TextureType, VertexAttributes, ATTRIB_COLOR,
};
use crate::resource::TextureId;
use super::render_context::{RenderContext, SOURCE};

/// Non-indexed draw of vertices from bound vertex buffers
#[derive(Debug, Clone, Copy)]
pub struct DrawCommand<'a> {
    pub primitive: PrimitiveType,
    pub attributes: &'a VertexAttributes,
    pub buffers: &'a BufferBindings,
    pub vertex_start: u32,
    pub vertex_count: u32,
    /// Values above 1 draw instanced
    pub instance_count: u32,
    pub texture: Option<TextureId>,
    pub cull_mode: CullMode,
}

/// Indexed draw; `index_offset` is in bytes
#[derive(Debug, Clone, Copy)]
pub struct DrawIndexedCommand<'a> {
    pub primitive: PrimitiveType,
    pub attributes: &'a VertexAttributes,
    pub buffers: &'a BufferBindings,
    pub index_buffer: BufferHandle,
    pub index_type: IndexType,
    pub index_offset: usize,
    pub index_count: u32,
    pub instance_count: u32,
    pub texture: Option<TextureId>,
    pub cull_mode: CullMode,
}

impl<D: GraphicsDevice> RenderContext<D> {
    // ===== PROGRAMS =====

    /// Draw with `program` until `reset_program`
    pub fn use_program(&mut self, program: &dyn ShaderProgram) -> Result<()> {
        let handle = program.handle();
        if self.user_program != Some(handle) {
            self.flush_batched_draws()?;
            self.user_program = Some(handle);
        }
        self.bind_program(handle);
        Ok(())
    }

    /// Go back to the standard programs
    pub fn reset_program(&mut self) -> Result<()> {
        if self.user_program.is_some() {
            self.flush_batched_draws()?;
            self.user_program = None;
        }
        Ok(())
    }

    pub fn current_program(&self) -> Option<ProgramHandle> {
        self.user_program
    }

    fn bind_program(&mut self, program: ProgramHandle) {
        if self.bound_program != Some(program) {
            self.device.use_program(program);
            self.bound_program = Some(program);
            self.counters.shader_switches += 1;
        }
    }

    /// Bind the active program and upload the built-in uniforms
    ///
    /// `constant_color` overrides the current color (white for geometry
    /// that carries its own vertex colors).
    fn prepare_draw(&mut self, constant_color: Option<Colorf>, standard: StandardShader) -> Result<()> {
        let program = self
            .user_program
            .or(self.standard_programs[standard.index()])
            .or(self.standard_programs[StandardShader::Default.index()]);
        let program = match program {
            Some(program) => program,
            None => engine_bail!(@InvalidOperation, SOURCE, "No shader program is available; set the graphics mode first."),
        };
        self.bind_program(program);

        let state = self.states.top();
        let pixel_size = match state.render_targets.first_target().and_then(|rt| {
            self.resources.texture(rt.texture).map(|t| (t.pixel_width(rt.mipmap), t.pixel_height(rt.mipmap)))
        }) {
            Some((w, h)) => Vec4::new(w as f32, h as f32, 1.0, 0.0),
            // Window coordinates grow downwards
            None => {
                let (w, h) = (self.surface.pixel_width as f32, self.surface.pixel_height as f32);
                Vec4::new(w, h, -1.0, h)
            }
        };

        let color = self.gamma_corrected(constant_color.unwrap_or(state.color));
        let uniforms = BuiltinUniforms {
            projection: self.projection,
            screen_size: pixel_size,
            point_size: state.point_size,
            constant_color: Vec4::new(color.r, color.g, color.b, color.a),
        };
        self.device.update_builtin_uniforms(program, &uniforms);
        Ok(())
    }

    fn bind_texture_unit0(&mut self, texture: Option<TextureId>) -> Result<()> {
        let (texture_type, handle) = match texture {
            None => (TextureType::Tex2D, None),
            Some(id) => match self.resources.texture(id) {
                Some(texture) => (texture.texture_type(), texture.handle()),
                None => engine_bail!(@InvalidResource, SOURCE, "Texture {:?} does not exist", id),
            },
        };
        self.device.bind_texture(0, texture_type, handle);
        Ok(())
    }

    fn standard_shader_for(&self, texture: Option<TextureId>) -> StandardShader {
        match texture.and_then(|id| self.resources.texture(id)) {
            Some(texture) if texture.texture_type() == TextureType::Array2D => StandardShader::Array,
            _ => StandardShader::Default,
        }
    }

    // ===== DRAWS =====

    pub fn draw(&mut self, cmd: &DrawCommand) -> Result<()> {
        self.flush_batched_draws()?;
        let standard = self.standard_shader_for(cmd.texture);
        self.submit_draw(cmd, None, standard)
    }

    pub fn draw_indexed(&mut self, cmd: &DrawIndexedCommand) -> Result<()> {
        self.flush_batched_draws()?;
        let standard = self.standard_shader_for(cmd.texture);
        self.submit_draw_indexed(cmd, None, standard)
    }

    /// Draw quads `start..start + count` of four vertices each with the shared index buffer
    pub fn draw_quads(
        &mut self,
        start: usize,
        count: usize,
        attributes: &VertexAttributes,
        buffers: &BufferBindings,
        texture: Option<TextureId>,
    ) -> Result<()> {
        self.flush_batched_draws()?;
        let standard = self.standard_shader_for(texture);
        self.submit_quads(start, count, attributes, buffers, texture, None, standard)
    }

    fn submit_draw(&mut self, cmd: &DrawCommand, color: Option<Colorf>, standard: StandardShader) -> Result<()> {
        self.prepare_draw(color, standard)?;
        self.device.set_vertex_attributes(cmd.attributes, cmd.buffers);
        self.bind_texture_unit0(cmd.texture)?;
        self.device.set_cull_mode(cmd.cull_mode);

        self.device.draw_arrays(cmd.primitive, cmd.vertex_start, cmd.vertex_count, cmd.instance_count.max(1));
        self.counters.draw_calls += 1;
        Ok(())
    }

    fn submit_draw_indexed(&mut self, cmd: &DrawIndexedCommand, color: Option<Colorf>, standard: StandardShader) -> Result<()> {
        self.prepare_draw(color, standard)?;
        self.device.set_vertex_attributes(cmd.attributes, cmd.buffers);
        self.bind_texture_unit0(cmd.texture)?;
        self.device.set_cull_mode(cmd.cull_mode);
        self.device.bind_buffer(BufferUsage::Index, Some(cmd.index_buffer));

        self.device.draw_indexed(
            cmd.primitive,
            cmd.index_count,
            cmd.index_type,
            cmd.index_offset,
            cmd.instance_count.max(1),
            None,
        );
        self.counters.draw_calls += 1;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn submit_quads(
        &mut self,
        start: usize,
        count: usize,
        attributes: &VertexAttributes,
        buffers: &BufferBindings,
        texture: Option<TextureId>,
        color: Option<Colorf>,
        standard: StandardShader,
    ) -> Result<()> {
        let index_buffer = match self.quad_index_buffer.and_then(|id| self.buffer_handle(id)) {
            Some(handle) => handle,
            None => engine_bail!(@InvalidOperation, SOURCE, "The quad index buffer is not loaded."),
        };

        self.prepare_draw(color, standard)?;
        self.bind_texture_unit0(texture)?;
        self.device.set_cull_mode(CullMode::None);
        self.device.bind_buffer(BufferUsage::Index, Some(index_buffer));

        if self.capabilities.paths.base_vertex {
            self.device.set_vertex_attributes(attributes, buffers);
            for chunk in quad_chunks(start, count) {
                self.device.draw_indexed(
                    PrimitiveType::Triangles,
                    chunk.index_count(),
                    IndexType::U16,
                    0,
                    1,
                    Some(chunk.first_vertex as i32),
                );
                self.counters.draw_calls += 1;
            }
        } else {
            // Without base vertex the streams themselves move to each chunk
            let mut bindings = *buffers;
            advance_vertex_offsets(attributes, &mut bindings, start * 4);
            for chunk in quad_chunks(start, count) {
                self.device.set_vertex_attributes(attributes, &bindings);
                self.device.draw_indexed(PrimitiveType::Triangles, chunk.index_count(), IndexType::U16, 0, 1, None);
                self.counters.draw_calls += 1;
                advance_vertex_offsets(attributes, &mut bindings, chunk.vertex_count());
            }
        }
        Ok(())
    }

    // ===== BATCHING =====

    /// Reserve vertex memory for `cmd` in the pending batch
    ///
    /// The batch is flushed first when `cmd` cannot join it; streams that
    /// are too small grow before the memory is handed out.
    pub fn request_batched_draw(&mut self, cmd: &BatchedDrawCommand) -> Result<BatchedVertexData<'_>> {
        if !self.created {
            engine_bail!(@InvalidOperation, SOURCE, "Batched draws require the graphics mode to be set.");
        }
        // Generated indices are 16-bit, so one request must fit in a batch of its own
        if IndexClass::of(cmd.index_mode) == IndexClass::Generated && cmd.vertex_count > u16::MAX as usize {
            engine_bail!(@InvalidOperation, SOURCE,
                "Too many vertices for an indexed batched draw ({} > {}).", cmd.vertex_count, u16::MAX);
        }

        let mut plan = self.batched.plan(cmd);
        if plan.flush {
            self.flush_batched_draws()?;
            self.batched.begin(cmd);
            plan = self.batched.plan(cmd);
        } else if !self.batched.is_empty() {
            self.counters.batched_draw_calls += 1;
        }

        if plan.needs_resize() {
            self.batched.apply_resize(&mut self.device, &plan)?;
        }
        self.batched.append(&mut self.device, cmd, &plan)
    }

    /// Draw the pending batch; does nothing when it is empty
    pub fn flush_batched_draws(&mut self) -> Result<()> {
        if self.batched.flushing || self.batched.is_empty() {
            return Ok(());
        }

        self.batched.flushing = true;
        let result = self.draw_pending_batch();
        self.batched.finish_flush();
        result
    }

    fn draw_pending_batch(&mut self) -> Result<()> {
        let vertex_count = self.batched.vertex_count;
        let mut attributes = VertexAttributes::new();
        let mut bindings = BufferBindings::default();

        for i in 0..2 {
            let format = self.batched.formats[i];
            if format == CommonFormat::None {
                continue;
            }
            let used = vertex_count * format.stride();
            let stream = &mut self.batched.vertex_streams[i];
            let offset = stream.unmap(&mut self.device, used)?;
            let handle = match stream.handle() {
                Some(handle) => handle,
                None => engine_bail!(@InvalidResource, SOURCE, "Vertex stream {} is not loaded", i),
            };
            stream.mark_used(used);

            attributes.set_common_format(format, i);
            bindings.set(i, handle, offset);
        }

        // Vertex colors already carry the constant color
        let color = attributes.is_enabled(ATTRIB_COLOR).then_some(Colorf::WHITE);
        let texture = self.batched.texture;
        let standard = self.batched.standard_shader;
        let primitive = self.batched.primitive;

        match self.batched.index_class {
            IndexClass::Generated => {
                let index_count = self.batched.index_count;
                let bytes = index_count * IndexType::U16.size();
                let stream = &mut self.batched.index_stream;
                let index_offset = stream.unmap(&mut self.device, bytes)?;
                let index_buffer = match stream.handle() {
                    Some(handle) => handle,
                    None => engine_bail!(@InvalidResource, SOURCE, "Index stream is not loaded"),
                };
                stream.mark_used(bytes);

                let cmd = DrawIndexedCommand {
                    primitive,
                    attributes: &attributes,
                    buffers: &bindings,
                    index_buffer,
                    index_type: IndexType::U16,
                    index_offset,
                    index_count: index_count as u32,
                    instance_count: 1,
                    texture,
                    cull_mode: CullMode::None,
                };
                self.submit_draw_indexed(&cmd, color, standard)
            }
            IndexClass::SharedQuads => {
                self.submit_quads(0, vertex_count / 4, &attributes, &bindings, texture, color, standard)
            }
            IndexClass::Unindexed => {
                let cmd = DrawCommand {
                    primitive,
                    attributes: &attributes,
                    buffers: &bindings,
                    vertex_start: 0,
                    vertex_count: vertex_count as u32,
                    instance_count: 1,
                    texture,
                    cull_mode: CullMode::None,
                };
                self.submit_draw(&cmd, color, standard)
            }
        }
    }

    // ===== COMPUTE =====

    /// Run `program` over an x*y*z grid of threadgroups
    ///
    /// Fails without touching the device when a writable slot of the
    /// program has nothing bound. Memory barriers are placed around the
    /// dispatch for every resource it writes.
    pub fn dispatch(&mut self, program: &dyn ShaderProgram, x: u32, y: u32, z: u32) -> Result<()> {
        let groups = [(x, Limit::ThreadgroupsX, "X"), (y, Limit::ThreadgroupsY, "Y"), (z, Limit::ThreadgroupsZ, "Z")];
        for (count, limit, axis) in groups {
            let max = self.capabilities.limit(limit);
            if count as f64 > max {
                engine_bail!(@InvalidOperation, SOURCE,
                    "Too many threadgroups in the {} dimension ({} > {}).", axis, count, max);
            }
        }

        let buffers: Vec<Option<BufferUsageFlags>> = program
            .active_writable_storage_buffers()
            .iter()
            .map(|id| id.and_then(|id| self.resources.buffer(id)).map(|b| b.usage()))
            .collect();
        let textures: Vec<Option<WritableTexture>> = program
            .active_writable_textures()
            .iter()
            .map(|id| {
                id.and_then(|id| self.resources.texture(id))
                    .map(|t| WritableTexture { render_target: t.is_render_target() })
            })
            .collect();

        let barriers = match compute_dispatch_barriers(&buffers, &textures) {
            Some(barriers) => barriers,
            None => engine_bail!(@InvalidResource, SOURCE,
                "Cannot dispatch: a writable buffer or texture of the program has nothing bound."),
        };

        self.flush_batched_draws()?;
        self.use_program(program)?;

        if !barriers.pre.is_empty() {
            self.device.memory_barrier(barriers.pre);
        }
        self.device.dispatch_compute(x, y, z);
        if !barriers.post.is_empty() {
            self.device.memory_barrier(barriers.post);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "draw_commands_tests.rs"]
mod tests;
