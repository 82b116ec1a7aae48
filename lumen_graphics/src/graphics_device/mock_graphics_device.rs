/// Mock GraphicsDevice for unit tests (no GPU required)
///
/// Every call is recorded as a short command string. Object lifetimes are
/// tracked so tests can assert that nothing leaks, and framebuffer
/// completeness is simulated from the attached formats.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::capabilities::Limit;
use crate::error::{Error, Result};
use super::barrier::MemoryBarriers;
use super::buffer::{BufferBindings, BufferDesc, BufferUsage, IndexType, VertexAttributes};
use super::graphics_device::{
    Attachment, AttachmentLayer, BufferHandle, BufferMask, DriverInfo, FramebufferHandle,
    FramebufferStatus, FramebufferTarget, GraphicsApi, GraphicsDevice, ProgramHandle,
    RenderbufferHandle, TextureHandle,
};
use super::pipeline::{
    BlendState, ColorChannelMask, Colorf, CompareMode, CullMode, PrimitiveType, Rect,
    StencilState, Winding,
};
use super::shader::{BuiltinUniforms, StandardShader};
use super::texture::{PixelFormat, PixelFormatUsage, TextureDesc, TextureType};

/// Recorded indexed draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedDraw {
    pub count: u32,
    pub index_offset: usize,
    pub base_vertex: Option<i32>,
}

pub struct MockGraphicsDevice {
    pub commands: Vec<String>,
    pub driver: DriverInfo,
    pub limits: FxHashMap<Limit, f64>,
    pub unsupported_texture_types: FxHashSet<TextureType>,
    /// Formats whose usage flags are not advertised at all
    pub unadvertised_formats: FxHashSet<PixelFormat>,
    /// Formats advertised but rejected when attached to a framebuffer
    pub unsupported_render_formats: FxHashSet<PixelFormat>,
    pub failing_standard_programs: FxHashSet<StandardShader>,
    pub fail_texture_creation: bool,
    /// Value written to the red channel of every read-back pixel of row y is y
    pub readback_alpha: u8,

    next_id: u32,
    textures: FxHashMap<u32, PixelFormat>,
    renderbuffers: FxHashMap<u32, PixelFormat>,
    framebuffers: FxHashMap<u32, Vec<(Attachment, PixelFormat)>>,
    buffers: FxHashMap<u32, Vec<u8>>,
    programs: FxHashSet<u32>,
    read_framebuffer: FramebufferHandle,
    draw_framebuffer: FramebufferHandle,
    pub indexed_draws: Vec<IndexedDraw>,
    pub attribute_bindings: Vec<BufferBindings>,
    pub uniform_uploads: Vec<BuiltinUniforms>,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        let mut limits = FxHashMap::default();
        for limit in Limit::ALL {
            let value = match limit {
                Limit::PointSize => 64.0,
                Limit::TextureSize | Limit::CubeTextureSize => 16384.0,
                Limit::TextureLayers | Limit::VolumeTextureSize => 2048.0,
                Limit::TexelBufferSize => 134_217_728.0,
                Limit::ShaderStorageBufferSize => 134_217_728.0,
                Limit::ThreadgroupsX | Limit::ThreadgroupsY | Limit::ThreadgroupsZ => 65535.0,
                Limit::RenderTargets => 8.0,
                Limit::TextureMsaa => 8.0,
                Limit::Anisotropy => 16.0,
            };
            limits.insert(limit, value);
        }

        Self {
            commands: Vec::new(),
            driver: Self::desktop_driver(),
            limits,
            unsupported_texture_types: FxHashSet::default(),
            unadvertised_formats: FxHashSet::default(),
            unsupported_render_formats: FxHashSet::default(),
            failing_standard_programs: FxHashSet::default(),
            fail_texture_creation: false,
            readback_alpha: 7,
            next_id: 1,
            textures: FxHashMap::default(),
            renderbuffers: FxHashMap::default(),
            framebuffers: FxHashMap::default(),
            buffers: FxHashMap::default(),
            programs: FxHashSet::default(),
            read_framebuffer: FramebufferHandle::DEFAULT,
            draw_framebuffer: FramebufferHandle::DEFAULT,
            indexed_draws: Vec::new(),
            attribute_bindings: Vec::new(),
            uniform_uploads: Vec::new(),
        }
    }

    /// Desktop 4.6 core context with base vertex and invalidate support
    pub fn desktop_driver() -> DriverInfo {
        DriverInfo {
            api: GraphicsApi::OpenGL,
            version: (4, 6),
            core_profile: true,
            extensions: Some(vec!["GL_KHR_debug".to_string()]),
            version_string: Some("4.6.0 Mock".to_string()),
            vendor: Some("Lumen".to_string()),
            renderer: Some("MockGraphicsDevice".to_string()),
        }
    }

    /// ES 2.0 context without base vertex or blits
    pub fn es2_driver() -> DriverInfo {
        DriverInfo {
            api: GraphicsApi::OpenGLES,
            version: (2, 0),
            core_profile: false,
            extensions: Some(Vec::new()),
            version_string: Some("OpenGL ES 2.0 Mock".to_string()),
            vendor: Some("Lumen".to_string()),
            renderer: Some("MockGraphicsDevice".to_string()),
        }
    }

    pub fn with_driver(driver: DriverInfo) -> Self {
        let mut device = Self::new();
        device.driver = driver;
        device
    }

    fn alloc_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn record(&mut self, command: String) {
        self.commands.push(command);
    }

    /// Number of recorded commands starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.commands.iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn has(&self, prefix: &str) -> bool {
        self.count(prefix) > 0
    }

    /// Position of the first command starting with `prefix`
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.commands.iter().position(|c| c.starts_with(prefix))
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
        self.indexed_draws.clear();
        self.attribute_bindings.clear();
    }

    /// Physical draw calls recorded so far
    pub fn draw_calls(&self) -> usize {
        self.count("draw_arrays") + self.count("draw_indexed")
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_renderbuffers(&self) -> usize {
        self.renderbuffers.len()
    }

    pub fn live_framebuffers(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer.0).map(|b| b.as_slice())
    }

    pub fn framebuffer_attachments(&self, framebuffer: FramebufferHandle) -> Vec<Attachment> {
        self.framebuffers
            .get(&framebuffer.0)
            .map(|list| list.iter().map(|(a, _)| *a).collect())
            .unwrap_or_default()
    }

    fn attach(&mut self, attachment: Attachment, format: PixelFormat) {
        if let Some(list) = self.framebuffers.get_mut(&self.draw_framebuffer.0) {
            list.retain(|(a, _)| *a != attachment);
            list.push((attachment, format));
        }
    }
}

impl Default for MockGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn driver_info(&self) -> DriverInfo {
        self.driver.clone()
    }

    fn query_limit(&self, limit: Limit) -> f64 {
        self.limits.get(&limit).copied().unwrap_or(0.0)
    }

    fn is_texture_type_supported(&self, texture_type: TextureType) -> bool {
        !self.unsupported_texture_types.contains(&texture_type)
    }

    fn pixel_format_usage(&self, format: PixelFormat) -> PixelFormatUsage {
        if self.unadvertised_formats.contains(&format) {
            PixelFormatUsage::empty()
        } else {
            PixelFormatUsage::all()
        }
    }

    fn create_texture(&mut self, desc: &TextureDesc, _data: Option<&[u8]>) -> Result<TextureHandle> {
        if self.fail_texture_creation {
            self.record("create_texture failed".to_string());
            return Err(Error::OutOfMemory);
        }
        let id = self.alloc_id();
        self.textures.insert(id, desc.format);
        self.record(format!("create_texture {} {:?} {}x{}", id, desc.format, desc.width, desc.height));
        Ok(TextureHandle(id))
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture.0);
        self.record(format!("delete_texture {}", texture.0));
    }

    fn create_renderbuffer(
        &mut self,
        format: PixelFormat,
        width: u32,
        height: u32,
        samples: u32,
    ) -> Result<RenderbufferHandle> {
        let id = self.alloc_id();
        self.renderbuffers.insert(id, format);
        self.record(format!("create_renderbuffer {} {:?} {}x{} samples={}", id, format, width, height, samples));
        Ok(RenderbufferHandle(id))
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle) {
        self.renderbuffers.remove(&renderbuffer.0);
        self.record(format!("delete_renderbuffer {}", renderbuffer.0));
    }

    fn generate_mipmaps(&mut self, texture: TextureHandle, _texture_type: TextureType) {
        self.record(format!("generate_mipmaps {}", texture.0));
    }

    fn create_buffer(&mut self, desc: &BufferDesc, data: Option<&[u8]>) -> Result<BufferHandle> {
        let id = self.alloc_id();
        let mut contents = vec![0u8; desc.size];
        if let Some(data) = data {
            let n = data.len().min(desc.size);
            contents[..n].copy_from_slice(&data[..n]);
        }
        self.buffers.insert(id, contents);
        self.record(format!("create_buffer {} size={}", id, desc.size));
        Ok(BufferHandle(id))
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: usize, data: &[u8]) -> Result<()> {
        let contents = self
            .buffers
            .get_mut(&buffer.0)
            .ok_or_else(|| Error::InvalidResource(format!("buffer {}", buffer.0)))?;
        if offset + data.len() > contents.len() {
            return Err(Error::BackendError("write out of range".to_string()));
        }
        contents[offset..offset + data.len()].copy_from_slice(data);
        self.record(format!("write_buffer {} offset={} len={}", buffer.0, offset, data.len()));
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer.0);
        self.record(format!("delete_buffer {}", buffer.0));
    }

    fn bind_buffer(&mut self, usage: BufferUsage, buffer: Option<BufferHandle>) {
        self.record(format!("bind_buffer {:?} {:?}", usage, buffer.map(|b| b.0)));
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferHandle> {
        let id = self.alloc_id();
        self.framebuffers.insert(id, Vec::new());
        self.record(format!("create_framebuffer {}", id));
        Ok(FramebufferHandle(id))
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        self.framebuffers.remove(&framebuffer.0);
        if self.draw_framebuffer == framebuffer {
            self.draw_framebuffer = FramebufferHandle::DEFAULT;
        }
        if self.read_framebuffer == framebuffer {
            self.read_framebuffer = FramebufferHandle::DEFAULT;
        }
        self.record(format!("delete_framebuffer {}", framebuffer.0));
    }

    fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: FramebufferHandle) {
        match target {
            FramebufferTarget::Read => self.read_framebuffer = framebuffer,
            FramebufferTarget::Draw => self.draw_framebuffer = framebuffer,
            FramebufferTarget::All => {
                self.read_framebuffer = framebuffer;
                self.draw_framebuffer = framebuffer;
            }
        }
        self.record(format!("bind_framebuffer {:?} {}", target, framebuffer.0));
    }

    fn bound_framebuffer(&self) -> FramebufferHandle {
        self.draw_framebuffer
    }

    fn attach_texture(
        &mut self,
        attachment: Attachment,
        _texture_type: TextureType,
        texture: TextureHandle,
        level: u32,
        layer: AttachmentLayer,
    ) {
        let format = self.textures.get(&texture.0).copied().unwrap_or(PixelFormat::Rgba8Unorm);
        self.attach(attachment, format);
        self.record(format!("attach_texture {:?} {} level={} {:?}", attachment, texture.0, level, layer));
    }

    fn attach_renderbuffer(&mut self, attachment: Attachment, renderbuffer: RenderbufferHandle) {
        let format = self.renderbuffers.get(&renderbuffer.0).copied().unwrap_or(PixelFormat::Rgba8Unorm);
        self.attach(attachment, format);
        self.record(format!("attach_renderbuffer {:?} {}", attachment, renderbuffer.0));
    }

    fn set_draw_buffers(&mut self, attachments: &[Attachment]) {
        self.record(format!("set_draw_buffers {:?}", attachments));
    }

    fn set_read_buffer(&mut self, attachment: Option<Attachment>) {
        self.record(format!("set_read_buffer {:?}", attachment));
    }

    fn check_framebuffer_status(&mut self) -> FramebufferStatus {
        self.record("check_framebuffer_status".to_string());
        if self.draw_framebuffer.is_default() {
            return FramebufferStatus::Complete;
        }
        match self.framebuffers.get(&self.draw_framebuffer.0) {
            None => FramebufferStatus::Incomplete("GL_FRAMEBUFFER_UNDEFINED".to_string()),
            Some(list) if list.is_empty() => {
                FramebufferStatus::Incomplete("GL_FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT".to_string())
            }
            Some(list) if list.iter().any(|(_, f)| self.unsupported_render_formats.contains(f)) => {
                FramebufferStatus::Incomplete("GL_FRAMEBUFFER_UNSUPPORTED".to_string())
            }
            Some(_) => FramebufferStatus::Complete,
        }
    }

    fn blit_framebuffer(&mut self, src: Rect, dst: Rect, mask: BufferMask) {
        self.record(format!(
            "blit_framebuffer {}->{} {}x{} {:?}",
            self.read_framebuffer.0, self.draw_framebuffer.0, src.w.min(dst.w), src.h.min(dst.h), mask
        ));
    }

    fn resolve_multisample_framebuffer(&mut self, width: u32, height: u32) {
        self.record(format!(
            "resolve_multisample_framebuffer {}->{} {}x{}",
            self.read_framebuffer.0, self.draw_framebuffer.0, width, height
        ));
    }

    fn invalidate_framebuffer(&mut self, target: FramebufferTarget, attachments: &[Attachment]) {
        self.record(format!("invalidate_framebuffer {:?} {:?}", target, attachments));
    }

    fn read_pixels_rgba8(&mut self, rect: Rect, out: &mut [u8]) -> Result<()> {
        let row = rect.w as usize * 4;
        for (y, line) in out.chunks_mut(row).enumerate() {
            for pixel in line.chunks_mut(4) {
                pixel[0] = y as u8;
                pixel[1] = 0;
                pixel[2] = 0;
                pixel[3] = self.readback_alpha;
            }
        }
        self.record(format!("read_pixels {}x{}", rect.w, rect.h));
        Ok(())
    }

    fn set_viewport(&mut self, rect: Rect) {
        self.record(format!("set_viewport {} {} {} {}", rect.x, rect.y, rect.w, rect.h));
    }

    fn set_scissor(&mut self, rect: Option<Rect>) {
        match rect {
            Some(r) => self.record(format!("set_scissor {} {} {} {}", r.x, r.y, r.w, r.h)),
            None => self.record("set_scissor off".to_string()),
        }
    }

    fn set_blend_state(&mut self, state: &BlendState) {
        self.record(format!("set_blend_state enable={} {:?}/{:?}", state.enable, state.operation_rgb, state.operation_a));
    }

    fn set_depth_state(&mut self, compare: Option<CompareMode>, write: bool) {
        self.record(format!("set_depth_state {:?} write={}", compare, write));
    }

    fn set_stencil_state(&mut self, state: Option<StencilState>) {
        match state {
            Some(s) => self.record(format!(
                "set_stencil_state {:?} ref={} action={:?}",
                s.compare, s.reference, s.pass_action
            )),
            None => self.record("set_stencil_state off".to_string()),
        }
    }

    fn set_color_mask(&mut self, mask: ColorChannelMask) {
        self.record(format!("set_color_mask {} {} {} {}", mask.r, mask.g, mask.b, mask.a));
    }

    fn set_front_face(&mut self, winding: Winding) {
        self.record(format!("set_front_face {:?}", winding));
    }

    fn set_cull_mode(&mut self, mode: CullMode) {
        self.record(format!("set_cull_mode {:?}", mode));
    }

    fn set_wireframe(&mut self, enable: bool) {
        self.record(format!("set_wireframe {}", enable));
    }

    fn set_framebuffer_srgb(&mut self, enable: bool) {
        self.record(format!("set_framebuffer_srgb {}", enable));
    }

    fn clear(&mut self, color: Option<Colorf>, stencil: Option<i32>, depth: Option<f64>) {
        self.record(format!(
            "clear color={} stencil={:?} depth={:?}",
            color.is_some(), stencil, depth
        ));
    }

    fn clear_color_attachment(&mut self, index: u32, _color: Colorf) {
        self.record(format!("clear_color_attachment {}", index));
    }

    fn set_vertex_attributes(&mut self, _attributes: &VertexAttributes, buffers: &BufferBindings) {
        self.attribute_bindings.push(*buffers);
        self.record("set_vertex_attributes".to_string());
    }

    fn bind_texture(&mut self, unit: u32, _texture_type: TextureType, texture: Option<TextureHandle>) {
        self.record(format!("bind_texture {} {:?}", unit, texture.map(|t| t.0)));
    }

    fn draw_arrays(&mut self, primitive: PrimitiveType, first: u32, count: u32, instances: u32) {
        self.record(format!("draw_arrays {:?} {} {} instances={}", primitive, first, count, instances));
    }

    fn draw_indexed(
        &mut self,
        primitive: PrimitiveType,
        count: u32,
        index_type: IndexType,
        index_offset: usize,
        instances: u32,
        base_vertex: Option<i32>,
    ) {
        self.indexed_draws.push(IndexedDraw { count, index_offset, base_vertex });
        self.record(format!(
            "draw_indexed {:?} {} {:?} offset={} instances={} base_vertex={:?}",
            primitive, count, index_type, index_offset, instances, base_vertex
        ));
    }

    fn create_standard_program(&mut self, kind: StandardShader) -> Result<ProgramHandle> {
        if self.failing_standard_programs.contains(&kind) {
            self.record(format!("create_standard_program {:?} failed", kind));
            return Err(Error::InitializationFailed(format!("{:?} shader failed to compile", kind)));
        }
        let id = self.alloc_id();
        self.programs.insert(id);
        self.record(format!("create_standard_program {:?} {}", kind, id));
        Ok(ProgramHandle(id))
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program.0);
        self.record(format!("delete_program {}", program.0));
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.record(format!("use_program {}", program.0));
    }

    fn update_builtin_uniforms(&mut self, program: ProgramHandle, uniforms: &BuiltinUniforms) {
        self.record(format!("update_builtin_uniforms {}", program.0));
        self.uniform_uploads.push(*uniforms);
    }

    fn memory_barrier(&mut self, barriers: MemoryBarriers) {
        self.record(format!("memory_barrier {:?}", barriers));
    }

    fn dispatch_compute(&mut self, x: u32, y: u32, z: u32) {
        self.record(format!("dispatch_compute {} {} {}", x, y, z));
    }

    fn finish(&mut self) {
        self.record("finish".to_string());
    }
}
