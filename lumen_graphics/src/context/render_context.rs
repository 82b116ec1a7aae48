/// RenderContext - owner of the device and of every cache built on it
///
/// All state that the rest of the crate treats as "current" lives here:
/// the display state stack, the framebuffer cache, the batched draw
/// streams, the temporary texture pool and the volatile registry. One
/// context drives one device from one thread.
///
/// The implementation is split by concern:
/// - this file: lifecycle, resources, viewport and internal backbuffer
/// - `state.rs`: display state setters and the push/pop stack
/// - `render_pass.rs`: render target switches, pass end, clear, discard
/// - `draw_commands.rs`: draws, batching, quads and compute dispatch
/// - `presentation.rs`: present and screenshots

use glam::Mat4;

use crate::capabilities::{CapabilityProber, CapabilitySet, Feature, FormatSupportCache};
use crate::config::RenderConfig;
use crate::draw::{quad_indices, BatchedDrawState, StateStack, MAX_QUADS_PER_DRAW};
use crate::error::Result;
use crate::graphics_device::{
    BufferDesc, BufferHandle, BufferUsage, BufferUsageFlags, DataUsage, FramebufferHandle,
    FramebufferTarget, GraphicsApi, GraphicsDevice, PixelFormat, ProgramHandle, Rect,
    StandardShader, TextureDesc, TextureType,
};
use crate::resource::{
    Buffer, BufferId, ResourceManager, StagingMemory, StreamBuffer, TemporaryTexturePool, Texture,
    TextureId, VolatileRegistry,
};
use crate::target::{RenderTarget, RenderTargetSet, TargetCache};
use crate::{engine_bail, engine_err, engine_info, engine_warn};
use super::presentation::{ImageData, ImageDataFactory, ScreenshotRequest};

pub(super) const SOURCE: &str = "lumen::RenderContext";

/// Bytes of the zero-filled default shader storage buffer
pub const DEFAULT_STORAGE_BUFFER_SIZE: usize = 2048;

// ============================================================================
// Public types
// ============================================================================

/// Window surface dimensions
///
/// `width`/`height` are in DPI-scaled units, `pixel_*` in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceInfo {
    pub width: u32,
    pub height: u32,
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// Framebuffer the window system presents from (0 on most platforms)
    pub system_framebuffer: FramebufferHandle,
}

impl SurfaceInfo {
    pub fn new(width: u32, height: u32, pixel_width: u32, pixel_height: u32) -> Self {
        Self {
            width,
            height,
            pixel_width,
            pixel_height,
            system_framebuffer: FramebufferHandle::DEFAULT,
        }
    }

    pub fn dpi_scale(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.pixel_height as f32 / self.height as f32
        }
    }
}

/// Driver identification strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererInfo {
    pub name: String,
    pub version: String,
    pub vendor: String,
    pub device: String,
}

/// Per-frame counters plus resource totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub batched_draw_calls: u32,
    pub shader_switches: u32,
    pub render_target_switches: u32,
    pub textures: usize,
    pub texture_memory: usize,
}

/// Counters reset at every present
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct FrameCounters {
    pub draw_calls: u32,
    pub batched_draw_calls: u32,
    pub shader_switches: u32,
    pub render_target_switches: u32,
}

/// Entry of the volatile registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolatileResource {
    Texture(TextureId),
    Buffer(BufferId),
}

/// Multisampled color and depth/stencil targets standing in for the window
#[derive(Debug, Clone, Copy)]
pub(super) struct InternalBackbuffer {
    pub color: TextureId,
    pub depth_stencil: TextureId,
    pub framebuffer: FramebufferHandle,
    pub msaa: u32,
}

#[derive(Debug, Default, Clone, Copy)]
pub(super) struct DefaultBuffers {
    pub texel: Option<BufferId>,
    pub storage: Option<BufferId>,
}

// ============================================================================
// RenderContext
// ============================================================================

pub struct RenderContext<D: GraphicsDevice> {
    pub(super) device: D,
    pub(super) config: RenderConfig,
    pub(super) capabilities: CapabilitySet,
    pub(super) format_support: FormatSupportCache,

    pub(super) resources: ResourceManager,
    pub(super) volatile: VolatileRegistry<VolatileResource>,
    pub(super) staging: StagingMemory,
    pub(super) target_cache: TargetCache,
    pub(super) temporary_textures: TemporaryTexturePool,
    pub(super) batched: BatchedDrawState,

    pub(super) states: StateStack,
    pub(super) surface: SurfaceInfo,
    pub(super) projection: Mat4,
    pub(super) internal_backbuffer: Option<InternalBackbuffer>,
    pub(super) requested_msaa: u32,

    pub(super) default_buffers: DefaultBuffers,
    pub(super) quad_index_buffer: Option<BufferId>,
    pub(super) standard_programs: [Option<ProgramHandle>; 2],
    /// Program set by the user; standard programs are used when None
    pub(super) user_program: Option<ProgramHandle>,
    pub(super) bound_program: Option<ProgramHandle>,

    pub(super) writing_to_stencil: bool,
    pub(super) framebuffer_srgb: bool,
    /// A pass is open until `end_pass` consumes its attachments
    pub(super) pass_open: bool,
    pub(super) created: bool,
    pub(super) active: bool,

    pub(super) counters: FrameCounters,
    pub(super) pending_screenshots: Vec<ScreenshotRequest>,
    pub(super) next_screenshot_id: u64,
    pub(super) image_data_factory: ImageDataFactory,
}

impl<D: GraphicsDevice> RenderContext<D> {
    /// Context for `device`; nothing touches the device until `set_mode`
    pub fn new(device: D, config: RenderConfig, surface: SurfaceInfo) -> Result<Self> {
        let staging = StagingMemory::new(config.buffer_map_memory_size)?;
        let batched = BatchedDrawState::new(config.stream_vertex_sizes, config.stream_index_size)?;

        Ok(Self {
            device,
            capabilities: CapabilitySet::default(),
            format_support: FormatSupportCache::new(),
            resources: ResourceManager::new(),
            volatile: VolatileRegistry::new(),
            staging,
            target_cache: TargetCache::new(),
            temporary_textures: TemporaryTexturePool::new(config.max_temporary_texture_unused_frames),
            batched,
            states: StateStack::new(config.max_state_stack_depth),
            projection: window_projection(surface.width, surface.height),
            surface,
            internal_backbuffer: None,
            requested_msaa: config.backbuffer_msaa,
            default_buffers: DefaultBuffers::default(),
            quad_index_buffer: None,
            standard_programs: [None; 2],
            user_program: None,
            bound_program: None,
            writing_to_stencil: false,
            framebuffer_srgb: false,
            pass_open: false,
            created: false,
            active: true,
            counters: FrameCounters::default(),
            pending_screenshots: Vec::new(),
            next_screenshot_id: 0,
            image_data_factory: Box::new(ImageData::from_pixels),
            config,
        })
    }

    // ===== ACCESSORS =====

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn target_cache(&self) -> &TargetCache {
        &self.target_cache
    }

    pub fn temporary_textures(&self) -> &TemporaryTexturePool {
        &self.temporary_textures
    }

    pub fn batched_draws(&self) -> &BatchedDrawState {
        &self.batched
    }

    pub fn volatile_resources(&self) -> &[VolatileResource] {
        self.volatile.keys()
    }

    pub fn surface(&self) -> &SurfaceInfo {
        &self.surface
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_gamma_correct(&self) -> bool {
        self.config.gamma_correct
    }

    /// MSAA sample count of the internal backbuffer, 0 without one
    pub fn backbuffer_msaa(&self) -> u32 {
        self.internal_backbuffer.map(|bb| bb.msaa).unwrap_or(0)
    }

    pub fn requested_backbuffer_msaa(&self) -> u32 {
        self.requested_msaa
    }

    pub fn default_buffer(&self, usage: BufferUsage) -> Option<BufferId> {
        match usage {
            BufferUsage::Texel => self.default_buffers.texel,
            BufferUsage::ShaderStorage => self.default_buffers.storage,
            _ => None,
        }
    }

    pub fn quad_index_buffer(&self) -> Option<BufferId> {
        self.quad_index_buffer
    }

    pub fn standard_program(&self, kind: StandardShader) -> Option<ProgramHandle> {
        self.standard_programs[kind.index()]
    }

    // ===== MODE / LIFECYCLE =====

    /// Bring the device up, or back up after `unset_mode`
    ///
    /// Probes capabilities, creates the per-context resources, reloads
    /// every volatile resource and restores the current display state.
    /// On failure everything built so far is released again and the
    /// context stays unset.
    pub fn set_mode(&mut self) -> Result<()> {
        self.capabilities = CapabilityProber::probe(&self.device);
        self.format_support.clear();

        // Resources created while bringing the mode up load immediately
        self.created = true;
        if let Err(e) = self.bring_up() {
            if let Err(release) = self.unset_mode() {
                engine_warn!(SOURCE, "Failed to release a partially set graphics mode: {}", release);
            }
            self.created = false;
            return Err(e);
        }

        let info = self.device.driver_info();
        engine_info!(SOURCE, "Graphics mode set: {:?} {}.{}, {}x{} pixels, backbuffer MSAA {}",
            info.api, info.version.0, info.version.1,
            self.surface.pixel_width, self.surface.pixel_height, self.backbuffer_msaa());
        Ok(())
    }

    fn bring_up(&mut self) -> Result<()> {
        if self.capabilities.paths.framebuffer_srgb {
            self.device.set_framebuffer_srgb(self.config.gamma_correct);
            self.framebuffer_srgb = self.config.gamma_correct;
        } else if self.config.gamma_correct {
            engine_warn!(SOURCE, "sRGB framebuffers are not supported, disabling gamma-correct rendering");
            self.config.gamma_correct = false;
        }

        let surface = self.surface;
        self.set_viewport_size(surface.width, surface.height, surface.pixel_width, surface.pixel_height)?;

        self.batched.load(&mut self.device)?;
        self.create_default_buffers()?;

        // Default buffers go first so everything else can rely on them
        for id in [self.default_buffers.texel, self.default_buffers.storage].into_iter().flatten() {
            if let Some(buffer) = self.resources.buffer_mut(id) {
                buffer.load(&mut self.device)?;
            }
        }
        if let Some(handle) = self.default_buffers.texel.and_then(|id| self.buffer_handle(id)) {
            self.device.bind_buffer(BufferUsage::Texel, Some(handle));
        }
        if let Some(handle) = self.default_buffers.storage.and_then(|id| self.buffer_handle(id)) {
            self.device.bind_buffer(BufferUsage::ShaderStorage, Some(handle));
        }

        if !self.reload_volatile() {
            engine_warn!(SOURCE, "Could not reload all volatile objects.");
        }

        self.create_quad_index_buffer()?;

        let state = self.states.top().clone();
        self.restore_state(&state)?;

        self.create_standard_programs()
    }

    /// Release every device object; resources stay described and are
    /// recreated by the next `set_mode`
    pub fn unset_mode(&mut self) -> Result<()> {
        if !self.created {
            return Ok(());
        }

        self.flush_batched_draws()?;
        self.release_internal_backbuffer();

        let resources = &mut self.resources;
        let device = &mut self.device;
        self.volatile.unload_all(|key| match key {
            VolatileResource::Texture(id) => {
                if let Some(texture) = resources.texture_mut(id) {
                    texture.unload(device);
                }
            }
            VolatileResource::Buffer(id) => {
                if let Some(buffer) = resources.buffer_mut(id) {
                    buffer.unload(device);
                }
            }
        });
        self.batched.unload(&mut self.device);

        for slot in &mut self.standard_programs {
            if let Some(program) = slot.take() {
                self.device.delete_program(program);
            }
        }
        self.user_program = None;
        self.bound_program = None;

        self.target_cache.clear(&mut self.device);
        for texture in self.temporary_textures.drain() {
            self.remove_texture(texture);
        }

        self.writing_to_stencil = false;
        self.pass_open = false;
        self.created = false;
        engine_info!(SOURCE, "Graphics mode unset");
        Ok(())
    }

    /// Flush; going inactive also waits for the device to finish
    pub fn set_active(&mut self, enable: bool) -> Result<()> {
        self.flush_batched_draws()?;

        if self.created && self.active && !enable {
            self.device.finish();
        }

        self.active = enable;
        Ok(())
    }

    fn reload_volatile(&mut self) -> bool {
        let resources = &mut self.resources;
        let device = &mut self.device;
        self.volatile.load_all(|key| match key {
            VolatileResource::Texture(id) => match resources.texture_mut(id) {
                Some(texture) => texture.load(device),
                None => Ok(()),
            },
            VolatileResource::Buffer(id) => match resources.buffer_mut(id) {
                Some(buffer) => buffer.load(device),
                None => Ok(()),
            },
        })
    }

    fn create_default_buffers(&mut self) -> Result<()> {
        if self.capabilities.feature(Feature::TexelBuffer) && self.default_buffers.texel.is_none() {
            let texel: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
            let desc = static_buffer_desc(BufferUsageFlags::TEXEL, std::mem::size_of_val(&texel), "default texel");
            self.default_buffers.texel = Some(self.create_buffer(desc, Some(bytemuck::cast_slice(&texel)))?);
        }

        if self.capabilities.feature(Feature::Glsl4) && self.default_buffers.storage.is_none() {
            let desc = static_buffer_desc(BufferUsageFlags::SHADER_STORAGE, DEFAULT_STORAGE_BUFFER_SIZE, "default storage");
            self.default_buffers.storage = Some(self.create_buffer(desc, None)?);
        }

        Ok(())
    }

    fn create_quad_index_buffer(&mut self) -> Result<()> {
        if self.quad_index_buffer.is_some() {
            return Ok(());
        }
        let indices = quad_indices(MAX_QUADS_PER_DRAW);
        let bytes: &[u8] = bytemuck::cast_slice(&indices);
        let desc = static_buffer_desc(BufferUsageFlags::INDEX, bytes.len(), "quad indices");
        self.quad_index_buffer = Some(self.create_buffer(desc, Some(bytes))?);
        Ok(())
    }

    fn create_standard_programs(&mut self) -> Result<()> {
        for kind in StandardShader::ALL {
            if self.standard_programs[kind.index()].is_some() {
                continue;
            }
            if kind == StandardShader::Array && !self.capabilities.is_texture_type_supported(TextureType::Array2D) {
                continue;
            }

            match self.device.create_standard_program(kind) {
                Ok(program) => self.standard_programs[kind.index()] = Some(program),
                // Some drivers claim array texture support but fail to compile shaders using it
                Err(e) if kind == StandardShader::Array => {
                    engine_warn!(SOURCE, "Array texture shader failed ({}), disabling 2D array textures", e);
                    self.capabilities.set_texture_type_supported(TextureType::Array2D, false);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    // ===== VIEWPORT / BACKBUFFER =====

    /// Window size changed
    ///
    /// Re-derives viewport, projection and scissor when drawing to the
    /// window, and recreates the internal backbuffer.
    pub fn set_viewport_size(&mut self, width: u32, height: u32, pixel_width: u32, pixel_height: u32) -> Result<()> {
        let system_framebuffer = self.surface.system_framebuffer;
        self.surface = SurfaceInfo { width, height, pixel_width, pixel_height, system_framebuffer };

        if !self.is_render_target_active() {
            self.device.set_viewport(Rect::new(0, 0, pixel_width as i32, pixel_height as i32));
            self.reapply_scissor()?;
            self.projection = window_projection(width, height);
        }

        if self.created {
            self.update_backbuffer(self.requested_msaa)?;
        }
        Ok(())
    }

    /// Recreate the internal MSAA backbuffer for `msaa` samples
    pub fn update_backbuffer(&mut self, msaa: u32) -> Result<()> {
        let paths = self.capabilities.paths;
        let mut use_internal = msaa > 1;

        // Resolving the internal backbuffer needs a blit or the APPLE resolve
        if !paths.framebuffer_blit && !(msaa > 1 && paths.multisample_resolve_apple) {
            use_internal = false;
        }

        let previous = self.device.bound_framebuffer();
        let restore = previous != self.internal_backbuffer_framebuffer();

        self.release_internal_backbuffer();

        if use_internal {
            let format = if self.config.gamma_correct {
                PixelFormat::Srgba8Unorm
            } else {
                PixelFormat::Rgba8Unorm
            };
            let desc = TextureDesc {
                width: self.surface.pixel_width,
                height: self.surface.pixel_height,
                dpi_scale: self.surface.dpi_scale(),
                msaa,
                render_target: true,
                readable: Some(false),
                format,
                debug_name: Some("internal backbuffer".to_string()),
                ..TextureDesc::default()
            };
            let color = self.create_texture(desc.clone(), None)?;
            let depth_stencil = match self.create_texture(
                TextureDesc { format: PixelFormat::Depth24UnormStencil8, ..desc },
                None,
            ) {
                Ok(id) => id,
                Err(e) => {
                    self.remove_texture(color);
                    return Err(e);
                }
            };

            let key = RenderTargetSet::new()
                .with_color(RenderTarget::new(color))
                .with_depth_stencil(RenderTarget::new(depth_stencil))
                .cache_key();
            let framebuffer = match self.target_cache.bind(&mut self.device, &self.resources, &key) {
                Ok(fb) => fb,
                Err(e) => {
                    self.remove_texture(depth_stencil);
                    self.remove_texture(color);
                    return Err(e);
                }
            };

            self.internal_backbuffer = Some(InternalBackbuffer { color, depth_stencil, framebuffer, msaa });
        }

        self.requested_msaa = msaa;

        if restore {
            self.device.bind_framebuffer(FramebufferTarget::All, previous);
        }
        Ok(())
    }

    fn release_internal_backbuffer(&mut self) {
        if let Some(backbuffer) = self.internal_backbuffer.take() {
            self.remove_texture(backbuffer.color);
            self.remove_texture(backbuffer.depth_stencil);
        }
    }

    /// Framebuffer standing for the window: internal backbuffer or system one
    pub fn internal_backbuffer_framebuffer(&self) -> FramebufferHandle {
        match self.internal_backbuffer {
            Some(backbuffer) => backbuffer.framebuffer,
            None => self.surface.system_framebuffer,
        }
    }

    pub fn system_backbuffer_framebuffer(&self) -> FramebufferHandle {
        self.surface.system_framebuffer
    }

    // ===== RESOURCES =====

    /// Resolve logical formats (`Normal`, `Hdr`) to a sized format
    pub fn sized_format(&self, format: PixelFormat, render_target: bool, readable: bool) -> PixelFormat {
        CapabilityProber::sized_format(&self.device, format, render_target, readable, self.config.gamma_correct)
    }

    /// Whether `format` works for the requested usage, verified on the device
    pub fn is_pixel_format_supported(&mut self, format: PixelFormat, render_target: bool, readable: bool, srgb: bool) -> bool {
        self.format_support.is_supported(
            &mut self.device,
            format,
            render_target,
            readable,
            srgb,
            self.config.gamma_correct,
        )
    }

    /// Create a texture and, when the mode is set, its device objects
    ///
    /// Unsupported settings are rejected before any device object exists.
    pub fn create_texture(&mut self, mut desc: TextureDesc, data: Option<Vec<u8>>) -> Result<TextureId> {
        let readable = desc.is_readable();
        desc.format = self.sized_format(desc.format, desc.render_target, readable);
        self.validate_texture(&desc)?;

        let mut texture = Texture::new(desc, data);
        if self.created {
            texture.load(&mut self.device)?;
        }

        let id = self.resources.insert_texture(texture);
        self.volatile.register(VolatileResource::Texture(id));
        Ok(id)
    }

    fn validate_texture(&mut self, desc: &TextureDesc) -> Result<()> {
        if self.created && !self.capabilities.is_texture_type_supported(desc.texture_type) {
            engine_bail!(@Unsupported, SOURCE, "{:?} textures are not supported on this system.", desc.texture_type);
        }

        if desc.msaa > 1 {
            if !desc.render_target {
                engine_bail!(@InvalidOperation, SOURCE, "MSAA is only supported for textures with the render target flag.");
            }
            if desc.texture_type != TextureType::Tex2D {
                engine_bail!(@InvalidOperation, SOURCE, "MSAA is only supported for 2D texture types.");
            }
        }

        if desc.width == 0 || desc.height == 0 {
            engine_bail!(@InvalidOperation, SOURCE, "Texture dimensions must be greater than 0.");
        }

        if self.created {
            let srgb = desc.format.is_srgb();
            if !self.is_pixel_format_supported(desc.format, desc.render_target, desc.is_readable(), srgb) {
                let usage = if desc.render_target { "as a render target" } else { "as a texture" };
                engine_bail!(@Unsupported, SOURCE,
                    "The pixel format '{:?}' is not supported {} on this system.", desc.format, usage);
            }
        }
        Ok(())
    }

    /// Destroy a texture; cached framebuffers using it go first
    pub fn destroy_texture(&mut self, id: TextureId) -> Result<()> {
        if self.resources.texture(id).is_none() {
            engine_bail!(@InvalidResource, SOURCE, "Texture {:?} does not exist", id);
        }
        if self.states.top().render_targets.references(id) {
            engine_bail!(@InvalidOperation, SOURCE, "Cannot destroy a texture while it is an active render target.");
        }
        // Popping back to a saved state would bind it again
        if self.states.iter().any(|state| state.render_targets.references(id)) {
            engine_bail!(@InvalidOperation, SOURCE,
                "Cannot destroy a texture used as a render target by a pushed display state.");
        }

        self.flush_batched_draws()?;
        self.remove_texture(id);
        Ok(())
    }

    /// Invalidate, unload, unregister and forget a texture
    pub(super) fn remove_texture(&mut self, id: TextureId) {
        self.target_cache.invalidate(&mut self.device, id);
        if let Some(mut texture) = self.resources.remove_texture(id) {
            texture.unload(&mut self.device);
        }
        self.volatile.unregister(VolatileResource::Texture(id));
    }

    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.resources.texture(id)
    }

    pub fn create_buffer(&mut self, desc: BufferDesc, data: Option<&[u8]>) -> Result<BufferId> {
        let mut buffer = Buffer::new(desc, data);
        if self.created {
            buffer.load(&mut self.device)?;
        }
        let id = self.resources.insert_buffer(buffer);
        self.volatile.register(VolatileResource::Buffer(id));
        Ok(id)
    }

    pub fn destroy_buffer(&mut self, id: BufferId) -> Result<()> {
        match self.resources.remove_buffer(id) {
            Some(mut buffer) => {
                buffer.unload(&mut self.device);
                self.volatile.unregister(VolatileResource::Buffer(id));
                Ok(())
            }
            None => engine_bail!(@InvalidResource, SOURCE, "Buffer {:?} does not exist", id),
        }
    }

    pub fn buffer(&self, id: BufferId) -> Option<&Buffer> {
        self.resources.buffer(id)
    }

    pub fn buffer_handle(&self, id: BufferId) -> Option<BufferHandle> {
        self.resources.buffer(id).and_then(|b| b.handle())
    }

    /// Write `data` at `offset` through the shared staging block
    pub fn write_buffer(&mut self, id: BufferId, offset: usize, data: &[u8]) -> Result<()> {
        let buffer = match self.resources.buffer_mut(id) {
            Some(buffer) => buffer,
            None => engine_bail!(@InvalidResource, SOURCE, "Buffer {:?} does not exist", id),
        };
        buffer.map_write(&mut self.device, &mut self.staging, offset, data.len(), |dst| {
            dst.copy_from_slice(data)
        })
    }

    /// Loaded stream buffer with `size` bytes per frame
    pub fn create_stream_buffer(&mut self, usage: BufferUsage, size: usize) -> Result<StreamBuffer> {
        let mut stream = StreamBuffer::new(usage, size)?;
        stream.load(&mut self.device)?;
        Ok(stream)
    }

    // ===== INFO / STATS =====

    pub fn renderer_info(&self) -> Result<RendererInfo> {
        let info = self.device.driver_info();
        let name = match info.api {
            GraphicsApi::OpenGLES => "OpenGL ES",
            GraphicsApi::OpenGL => "OpenGL",
        };

        let version = info.version_string
            .ok_or_else(|| engine_err!(SOURCE, "Cannot retrieve renderer version information."))?;
        let vendor = info.vendor
            .ok_or_else(|| engine_err!(SOURCE, "Cannot retrieve renderer vendor information."))?;
        let device = info.renderer
            .ok_or_else(|| engine_err!(SOURCE, "Cannot retrieve renderer device information."))?;

        Ok(RendererInfo { name: name.to_string(), version, vendor, device })
    }

    pub fn stats(&self) -> FrameStats {
        FrameStats {
            draw_calls: self.counters.draw_calls,
            batched_draw_calls: self.counters.batched_draw_calls,
            shader_switches: self.counters.shader_switches,
            render_target_switches: self.counters.render_target_switches,
            textures: self.resources.texture_count(),
            texture_memory: self.resources.texture_memory(),
        }
    }
}

/// Projection for drawing to the window (y down)
pub(super) fn window_projection(width: u32, height: u32) -> Mat4 {
    Mat4::orthographic_rh_gl(0.0, width as f32, height as f32, 0.0, -10.0, 10.0)
}

/// Projection for drawing to a texture (y up)
pub(super) fn texture_projection(width: f32, height: f32) -> Mat4 {
    Mat4::orthographic_rh_gl(0.0, width, 0.0, height, -10.0, 10.0)
}

fn static_buffer_desc(usage: BufferUsageFlags, size: usize, name: &str) -> BufferDesc {
    BufferDesc {
        size,
        usage,
        data_usage: DataUsage::Static,
        debug_name: Some(name.to_string()),
    }
}

#[cfg(test)]
#[path = "render_context_tests.rs"]
mod tests;
