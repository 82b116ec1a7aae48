/// GlGraphicsDevice - OpenGL / OpenGL ES implementation of GraphicsDevice
///
/// A thin translation layer: every trait call becomes the matching `glow`
/// call. The only state kept here is what GL cannot be asked for cheaply
/// (texture targets, buffer sizes, uniform locations and the buffer,
/// texture and framebuffer bindings).

use std::ffi::c_void;
use std::num::NonZeroU32;

use glow::HasContext;
use rustc_hash::FxHashMap;

use lumen_graphics::lumen::capabilities::{CapabilityProber, Feature, Limit};
use lumen_graphics::lumen::device::{
    Attachment, AttachmentLayer, BlendState, BufferBindings, BufferDesc, BufferHandle, BufferMask,
    BufferUsage, BuiltinUniforms, ColorChannelMask, Colorf, CompareMode, CullMode, DriverInfo,
    FramebufferHandle, FramebufferStatus, FramebufferTarget, GraphicsApi, GraphicsDevice, IndexType,
    MemoryBarriers, PixelFormat, PixelFormatUsage, PrimitiveType, ProgramHandle, Rect,
    RenderbufferHandle, StandardShader, StencilAction, StencilState, TextureDesc, TextureHandle,
    TextureType, VertexAttributes, Winding, ATTRIB_COLOR, MAX_VERTEX_BUFFERS,
};
use lumen_graphics::lumen::{DebugConfig, Error, Result};
use lumen_graphics::{engine_debug, engine_err, engine_error, engine_info, engine_warn};

use crate::gl_conversions::*;
use crate::gl_format::{compute_supported, gl_format, pixel_format_usage, texture_type_supported};
use crate::gl_shaders::{
    standard_program_source, GlslVersion, ATTRIBUTE_BINDINGS, UNIFORM_CONSTANT_COLOR,
    UNIFORM_POINT_SIZE, UNIFORM_PROJECTION, UNIFORM_SCREEN_SIZE, UNIFORM_TEXTURE,
};

const SOURCE: &str = "lumen::gl";
/// `GL_ALIASED_POINT_SIZE_RANGE` (not exported by glow 0.13).
const ALIASED_POINT_SIZE_RANGE: u32 = 0x846D;

// ============================================================================
// Extension entry points glow does not expose
// ============================================================================

type DiscardFramebufferFn = unsafe extern "system" fn(target: u32, count: i32, attachments: *const u32);
type ResolveMultisampleFn = unsafe extern "system" fn();

#[derive(Debug, Clone, Copy, Default)]
struct ExtensionFunctions {
    /// GL_EXT_discard_framebuffer
    discard_framebuffer: Option<DiscardFramebufferFn>,
    /// GL_APPLE_framebuffer_multisample
    resolve_multisample_apple: Option<ResolveMultisampleFn>,
}

impl ExtensionFunctions {
    unsafe fn load<F: FnMut(&str) -> *const c_void>(mut loader: F) -> Self {
        let discard = loader("glDiscardFramebufferEXT");
        let resolve = loader("glResolveMultisampleFramebufferAPPLE");
        Self {
            discard_framebuffer: (!discard.is_null())
                .then(|| std::mem::transmute::<*const c_void, DiscardFramebufferFn>(discard)),
            resolve_multisample_apple: (!resolve.is_null())
                .then(|| std::mem::transmute::<*const c_void, ResolveMultisampleFn>(resolve)),
        }
    }
}

// ============================================================================
// Handle conversions
// ============================================================================

fn native_texture(handle: TextureHandle) -> Option<glow::NativeTexture> {
    NonZeroU32::new(handle.0).map(glow::NativeTexture)
}

fn native_renderbuffer(handle: RenderbufferHandle) -> Option<glow::NativeRenderbuffer> {
    NonZeroU32::new(handle.0).map(glow::NativeRenderbuffer)
}

fn native_framebuffer(handle: FramebufferHandle) -> Option<glow::NativeFramebuffer> {
    NonZeroU32::new(handle.0).map(glow::NativeFramebuffer)
}

fn native_buffer(handle: BufferHandle) -> Option<glow::NativeBuffer> {
    NonZeroU32::new(handle.0).map(glow::NativeBuffer)
}

fn native_program(handle: ProgramHandle) -> Option<glow::NativeProgram> {
    NonZeroU32::new(handle.0).map(glow::NativeProgram)
}

/// Uniform locations of the built-in block, looked up once per program
#[derive(Debug, Default)]
struct BuiltinLocations {
    projection: Option<glow::NativeUniformLocation>,
    screen_size: Option<glow::NativeUniformLocation>,
    point_size: Option<glow::NativeUniformLocation>,
    constant_color: Option<glow::NativeUniformLocation>,
}

impl BuiltinLocations {
    unsafe fn query(gl: &glow::Context, program: glow::NativeProgram) -> Self {
        Self {
            projection: gl.get_uniform_location(program, UNIFORM_PROJECTION),
            screen_size: gl.get_uniform_location(program, UNIFORM_SCREEN_SIZE),
            point_size: gl.get_uniform_location(program, UNIFORM_POINT_SIZE),
            constant_color: gl.get_uniform_location(program, UNIFORM_CONSTANT_COLOR),
        }
    }
}

/// Texture bound to each (unit, GL target) pair, plus the active unit
///
/// Internal uploads bind on the active unit; they put back what this
/// reports afterwards.
#[derive(Debug, Default)]
struct TextureBindings {
    active_unit: u32,
    bound: FxHashMap<(u32, u32), glow::NativeTexture>,
}

impl TextureBindings {
    fn bind(&mut self, unit: u32, target: u32, texture: Option<glow::NativeTexture>) {
        self.active_unit = unit;
        match texture {
            Some(texture) => {
                self.bound.insert((unit, target), texture);
            }
            None => {
                self.bound.remove(&(unit, target));
            }
        }
    }

    /// Texture bound to `target` on the active unit
    fn active(&self, target: u32) -> Option<glow::NativeTexture> {
        self.bound.get(&(self.active_unit, target)).copied()
    }

    /// GL unbinds a deleted texture from every unit
    fn forget(&mut self, texture: glow::NativeTexture) {
        self.bound.retain(|_, bound| *bound != texture);
    }
}

// ============================================================================
// GlGraphicsDevice
// ============================================================================

/// OpenGL device
///
/// Owns the `glow` context. Every method assumes that context is current
/// on the calling thread.
pub struct GlGraphicsDevice {
    gl: glow::Context,
    driver: DriverInfo,
    glsl: GlslVersion,
    extension_fns: ExtensionFunctions,

    /// Read and draw framebuffers can be bound separately
    separate_framebuffer_targets: bool,
    invalidate_core: bool,
    object_labels: bool,
    debug_output: bool,

    vertex_array: Option<glow::NativeVertexArray>,
    /// Bit per enabled vertex attribute location
    enabled_attributes: u32,

    /// GL target of every live texture
    texture_targets: FxHashMap<u32, u32>,
    /// Size in bytes of every live buffer
    buffer_sizes: FxHashMap<u32, usize>,
    /// Last buffer bound per GL target
    buffer_bindings: FxHashMap<u32, Option<glow::NativeBuffer>>,
    texture_bindings: TextureBindings,
    uniform_locations: FxHashMap<u32, BuiltinLocations>,

    draw_framebuffer: FramebufferHandle,
    read_framebuffer: FramebufferHandle,
    current_program: Option<ProgramHandle>,
}

impl GlGraphicsDevice {
    /// Wrap an existing `glow` context
    ///
    /// Extension entry points that `glow` does not load are unavailable;
    /// framebuffer discards and APPLE resolves then fall back to their
    /// core equivalents where those exist.
    ///
    /// # Safety
    ///
    /// `gl` must be current on this thread for the whole device lifetime.
    pub unsafe fn new(gl: glow::Context, debug: DebugConfig) -> Self {
        Self::with_extension_functions(gl, ExtensionFunctions::default(), &debug)
    }

    /// Create the `glow` context and the extension entry points from one loader
    ///
    /// # Safety
    ///
    /// The loader must return valid function pointers (or null) for the
    /// context that is current on this thread, and that context must stay
    /// current for the whole device lifetime.
    pub unsafe fn from_loader_function<F>(mut loader: F, debug: DebugConfig) -> Self
    where
        F: FnMut(&str) -> *const c_void,
    {
        let gl = glow::Context::from_loader_function(&mut loader);
        let extension_fns = ExtensionFunctions::load(&mut loader);
        Self::with_extension_functions(gl, extension_fns, &debug)
    }

    unsafe fn with_extension_functions(
        mut gl: glow::Context,
        extension_fns: ExtensionFunctions,
        debug: &DebugConfig,
    ) -> Self {
        let driver = read_driver_info(&gl);
        let glsl = GlslVersion::for_driver(&driver);
        let es3 = driver.es_at_least(3, 0);
        let gl3 = driver.desktop_at_least(3, 0);

        let separate_framebuffer_targets = gl3
            || es3
            || driver.has_extension("GL_ARB_framebuffer_object")
            || driver.has_extension("GL_EXT_framebuffer_blit")
            || driver.has_extension("GL_APPLE_framebuffer_multisample");
        let invalidate_core =
            driver.desktop_at_least(4, 3) || es3 || driver.has_extension("GL_ARB_invalidate_subdata");
        let khr_debug = driver.desktop_at_least(4, 3)
            || driver.es_at_least(3, 2)
            || driver.has_extension("GL_KHR_debug");

        // Core profiles and ES3 draw nothing without a vertex array object
        let vertex_array = if gl3 || es3 {
            match gl.create_vertex_array() {
                Ok(vao) => {
                    gl.bind_vertex_array(Some(vao));
                    Some(vao)
                }
                Err(e) => {
                    engine_warn!(SOURCE, "Failed to create vertex array object: {}", e);
                    None
                }
            }
        } else {
            None
        };

        if !driver.is_embedded() {
            gl.enable(glow::PROGRAM_POINT_SIZE);
        }

        let debug_output = debug.enabled && install_debug_output(&mut gl, khr_debug, debug);

        engine_info!(SOURCE, "{} {}.{} ({}, {})",
            match driver.api {
                GraphicsApi::OpenGL => "OpenGL",
                GraphicsApi::OpenGLES => "OpenGL ES",
            },
            driver.version.0, driver.version.1,
            driver.vendor.as_deref().unwrap_or("unknown vendor"),
            driver.renderer.as_deref().unwrap_or("unknown renderer"));

        Self {
            gl,
            driver,
            glsl,
            extension_fns,
            separate_framebuffer_targets,
            invalidate_core,
            object_labels: khr_debug,
            debug_output,
            vertex_array,
            enabled_attributes: 0,
            texture_targets: FxHashMap::default(),
            buffer_sizes: FxHashMap::default(),
            buffer_bindings: FxHashMap::default(),
            texture_bindings: TextureBindings::default(),
            uniform_locations: FxHashMap::default(),
            draw_framebuffer: FramebufferHandle::DEFAULT,
            read_framebuffer: FramebufferHandle::DEFAULT,
            current_program: None,
        }
    }

    /// The wrapped context, for compiling user programs against the same driver
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    pub fn glsl_version(&self) -> GlslVersion {
        self.glsl
    }

    // ===== Internal helpers =====

    /// Clear stale errors so the next check reports only the call under test
    unsafe fn drain_errors(&self) {
        for _ in 0..16 {
            if self.gl.get_error() == glow::NO_ERROR {
                break;
            }
        }
    }

    unsafe fn check_allocation(&self, what: &str) -> Result<()> {
        match self.gl.get_error() {
            glow::NO_ERROR => Ok(()),
            glow::OUT_OF_MEMORY => {
                engine_error!(SOURCE, "Out of GPU memory allocating {}", what);
                Err(Error::OutOfMemory)
            }
            code => Err(engine_err!(SOURCE, "GL error 0x{:04X} while allocating {}", code, what)),
        }
    }

    unsafe fn label(&self, identifier: u32, name: u32, label: Option<&str>) {
        if let (true, Some(label)) = (self.object_labels, label) {
            self.gl.object_label(identifier, name, Some(label));
        }
    }

    /// Binding point used by attach calls
    fn attach_target(&self) -> u32 {
        if self.separate_framebuffer_targets {
            glow::DRAW_FRAMEBUFFER
        } else {
            glow::FRAMEBUFFER
        }
    }

    /// ES2 has no combined depth-stencil attachment point
    fn attachment_points(&self, attachment: Attachment) -> Vec<u32> {
        let es2 = self.driver.is_embedded() && !self.driver.es_at_least(3, 0);
        if es2 && attachment == Attachment::DepthStencil {
            vec![glow::DEPTH_ATTACHMENT, glow::STENCIL_ATTACHMENT]
        } else {
            vec![attachment_to_gl(attachment)]
        }
    }

    fn upload_target(&self) -> u32 {
        if CapabilityProber::derive_features(&self.driver)[Feature::CopyBuffer.index()] {
            glow::COPY_WRITE_BUFFER
        } else {
            glow::ARRAY_BUFFER
        }
    }

    /// Bind `buffer` to `target`, run `upload`, then restore the previous binding
    unsafe fn with_buffer_bound<T>(
        &self,
        target: u32,
        buffer: glow::NativeBuffer,
        upload: impl FnOnce(&glow::Context) -> T,
    ) -> T {
        self.gl.bind_buffer(target, Some(buffer));
        let result = upload(&self.gl);
        let previous = self.buffer_bindings.get(&target).copied().flatten();
        self.gl.bind_buffer(target, previous);
        result
    }

    unsafe fn compile_shader(&self, stage: u32, source: &str) -> std::result::Result<glow::NativeShader, String> {
        let shader = self.gl.create_shader(stage)?;
        self.gl.shader_source(shader, source);
        self.gl.compile_shader(shader);
        if self.gl.get_shader_compile_status(shader) {
            Ok(shader)
        } else {
            let log = self.gl.get_shader_info_log(shader);
            self.gl.delete_shader(shader);
            Err(log)
        }
    }

    unsafe fn link_program(&self, vertex: &str, fragment: &str) -> std::result::Result<glow::NativeProgram, String> {
        let vs = self.compile_shader(glow::VERTEX_SHADER, vertex)?;
        let fs = match self.compile_shader(glow::FRAGMENT_SHADER, fragment) {
            Ok(fs) => fs,
            Err(log) => {
                self.gl.delete_shader(vs);
                return Err(log);
            }
        };

        let program = match self.gl.create_program() {
            Ok(program) => program,
            Err(e) => {
                self.gl.delete_shader(vs);
                self.gl.delete_shader(fs);
                return Err(e);
            }
        };

        self.gl.attach_shader(program, vs);
        self.gl.attach_shader(program, fs);
        for (location, name) in ATTRIBUTE_BINDINGS {
            self.gl.bind_attrib_location(program, location, name);
        }
        self.gl.link_program(program);

        self.gl.detach_shader(program, vs);
        self.gl.detach_shader(program, fs);
        self.gl.delete_shader(vs);
        self.gl.delete_shader(fs);

        if self.gl.get_program_link_status(program) {
            Ok(program)
        } else {
            let log = self.gl.get_program_info_log(program);
            self.gl.delete_program(program);
            Err(log)
        }
    }

    unsafe fn upload_texture_level(
        &self,
        desc: &TextureDesc,
        level: u32,
        internal: i32,
        external: u32,
        data_type: u32,
        data: Option<&[u8]>,
    ) {
        let width = (desc.width >> level).max(1) as i32;
        let height = (desc.height >> level).max(1) as i32;
        let level = level as i32;

        match desc.texture_type {
            TextureType::Tex2D => {
                self.gl.tex_image_2d(glow::TEXTURE_2D, level, internal, width, height, 0, external, data_type, data);
            }
            TextureType::Cube => {
                let face_size = data.map(|d| d.len() / 6).unwrap_or(0);
                for face in 0..6u32 {
                    let face_data = data.map(|d| &d[face as usize * face_size..(face as usize + 1) * face_size]);
                    self.gl.tex_image_2d(
                        glow::TEXTURE_CUBE_MAP_POSITIVE_X + face,
                        level, internal, width, height, 0, external, data_type, face_data,
                    );
                }
            }
            TextureType::Volume => {
                let depth = (desc.layers >> level as u32).max(1) as i32;
                self.gl.tex_image_3d(glow::TEXTURE_3D, level, internal, width, height, depth, 0, external, data_type, data);
            }
            TextureType::Array2D => {
                let layers = desc.layers.max(1) as i32;
                self.gl.tex_image_3d(glow::TEXTURE_2D_ARRAY, level, internal, width, height, layers, 0, external, data_type, data);
            }
        }
    }
}

impl Drop for GlGraphicsDevice {
    fn drop(&mut self) {
        unsafe {
            // Stop callbacks before the context goes away
            if self.debug_output {
                crate::debug::cleanup_debug_config();
                self.gl.disable(glow::DEBUG_OUTPUT);
            }
            if let Some(vao) = self.vertex_array.take() {
                self.gl.bind_vertex_array(None);
                self.gl.delete_vertex_array(vao);
            }
        }
    }
}

/// Describe the driver behind a context
unsafe fn read_driver_info(gl: &glow::Context) -> DriverInfo {
    let version = gl.version();
    let api = if version.is_embedded { GraphicsApi::OpenGLES } else { GraphicsApi::OpenGL };
    let version_pair = (version.major, version.minor);

    let core_profile = !version.is_embedded
        && version_pair >= (3, 2)
        && (gl.get_parameter_i32(glow::CONTEXT_PROFILE_MASK) as u32 & glow::CONTEXT_CORE_PROFILE_BIT) != 0;

    let mut extensions: Vec<String> = gl.supported_extensions().iter().cloned().collect();
    extensions.sort();

    let query = |name: u32| {
        let value = gl.get_parameter_string(name);
        (!value.is_empty()).then_some(value)
    };

    DriverInfo {
        api,
        version: version_pair,
        core_profile,
        extensions: Some(extensions),
        version_string: query(glow::VERSION),
        vendor: query(glow::VENDOR),
        renderer: query(glow::RENDERER),
    }
}

#[cfg(feature = "gl-debug")]
unsafe fn install_debug_output(gl: &mut glow::Context, khr_debug: bool, config: &DebugConfig) -> bool {
    if !khr_debug {
        engine_warn!(SOURCE, "Debug output requested but GL_KHR_debug is not available");
        return false;
    }

    crate::debug::init_debug_config(crate::debug::Config::from(config));
    gl.enable(glow::DEBUG_OUTPUT);
    gl.enable(glow::DEBUG_OUTPUT_SYNCHRONOUS);
    gl.debug_message_control(glow::DONT_CARE, glow::DONT_CARE, glow::DONT_CARE, &[], true);
    gl.debug_message_callback(crate::debug::gl_debug_callback);
    engine_debug!(SOURCE, "KHR_debug message callback installed");
    true
}

#[cfg(not(feature = "gl-debug"))]
unsafe fn install_debug_output(_gl: &mut glow::Context, _khr_debug: bool, _config: &DebugConfig) -> bool {
    engine_warn!(SOURCE, "Debug output requested but the gl-debug feature is disabled");
    false
}

impl GraphicsDevice for GlGraphicsDevice {
    // ===== DRIVER / CAPABILITIES =====

    fn driver_info(&self) -> DriverInfo {
        self.driver.clone()
    }

    fn query_limit(&self, limit: Limit) -> f64 {
        let features = CapabilityProber::derive_features(&self.driver);
        let compute = compute_supported(&self.driver);
        let msaa = self.driver.desktop_at_least(3, 0)
            || self.driver.es_at_least(3, 0)
            || self.driver.has_extension("GL_EXT_framebuffer_multisample")
            || self.driver.has_extension("GL_APPLE_framebuffer_multisample");
        let anisotropy = self.driver.desktop_at_least(4, 6)
            || self.driver.has_extension("GL_EXT_texture_filter_anisotropic")
            || self.driver.has_extension("GL_ARB_texture_filter_anisotropic");

        unsafe {
            let int = |pname: u32| self.gl.get_parameter_i32(pname) as f64;
            let threadgroups = |index: u32| {
                self.gl.get_parameter_indexed_i32(glow::MAX_COMPUTE_WORK_GROUP_COUNT, index) as f64
            };

            match limit {
                Limit::PointSize => {
                    let mut range = [1.0f32; 2];
                    self.gl.get_parameter_f32_slice(ALIASED_POINT_SIZE_RANGE, &mut range);
                    range[1] as f64
                }
                Limit::TextureSize => int(glow::MAX_TEXTURE_SIZE),
                Limit::CubeTextureSize => int(glow::MAX_CUBE_MAP_TEXTURE_SIZE),
                Limit::TextureLayers if self.is_texture_type_supported(TextureType::Array2D) => {
                    int(glow::MAX_ARRAY_TEXTURE_LAYERS)
                }
                Limit::VolumeTextureSize if self.is_texture_type_supported(TextureType::Volume) => {
                    int(glow::MAX_3D_TEXTURE_SIZE)
                }
                Limit::TexelBufferSize if features[Feature::TexelBuffer.index()] => {
                    int(glow::MAX_TEXTURE_BUFFER_SIZE)
                }
                Limit::ShaderStorageBufferSize if compute => int(glow::MAX_SHADER_STORAGE_BLOCK_SIZE),
                Limit::ThreadgroupsX if compute => threadgroups(0),
                Limit::ThreadgroupsY if compute => threadgroups(1),
                Limit::ThreadgroupsZ if compute => threadgroups(2),
                Limit::RenderTargets => {
                    if features[Feature::MultiRenderTargetFormats.index()] {
                        int(glow::MAX_DRAW_BUFFERS).min(int(glow::MAX_COLOR_ATTACHMENTS))
                    } else {
                        1.0
                    }
                }
                Limit::TextureMsaa => if msaa { int(glow::MAX_SAMPLES) } else { 1.0 },
                Limit::Anisotropy => {
                    if anisotropy {
                        self.gl.get_parameter_f32(glow::MAX_TEXTURE_MAX_ANISOTROPY) as f64
                    } else {
                        1.0
                    }
                }
                _ => 0.0,
            }
        }
    }

    fn is_texture_type_supported(&self, texture_type: TextureType) -> bool {
        texture_type_supported(&self.driver, texture_type)
    }

    fn pixel_format_usage(&self, format: PixelFormat) -> PixelFormatUsage {
        pixel_format_usage(&self.driver, format)
    }

    // ===== TEXTURES / RENDERBUFFERS =====

    fn create_texture(&mut self, desc: &TextureDesc, data: Option<&[u8]>) -> Result<TextureHandle> {
        let format = gl_format(&self.driver, desc.format, false).ok_or_else(|| {
            engine_err!(@Unsupported, SOURCE, "Pixel format {:?} has no OpenGL equivalent", desc.format)
        })?;

        if let Some(data) = data {
            let expected = desc.width as usize
                * desc.height as usize
                * desc.slice_count() as usize
                * desc.format.bytes_per_pixel();
            if data.len() < expected {
                return Err(engine_err!(@InvalidOperation, SOURCE,
                    "Texture data is {} bytes, {}x{}x{} {:?} needs {}",
                    data.len(), desc.width, desc.height, desc.slice_count(), desc.format, expected));
            }
        }

        let target = texture_target_to_gl(desc.texture_type);
        let usage = pixel_format_usage(&self.driver, desc.format);
        let filter = if usage.contains(PixelFormatUsage::LINEAR) { glow::LINEAR } else { glow::NEAREST };
        let min_filter = match (desc.mipmap_count > 1, filter) {
            (true, glow::LINEAR) => glow::LINEAR_MIPMAP_LINEAR,
            (true, _) => glow::NEAREST_MIPMAP_NEAREST,
            (false, f) => f,
        };

        unsafe {
            self.drain_errors();
            let texture = self.gl.create_texture()
                .map_err(|e| engine_err!(SOURCE, "Failed to create texture: {}", e))?;

            self.gl.bind_texture(target, Some(texture));
            self.gl.tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, min_filter as i32);
            self.gl.tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, filter as i32);
            self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
            // ES2 has no TEXTURE_MAX_LEVEL
            if !self.driver.is_embedded() || self.driver.es_at_least(3, 0) {
                self.gl.tex_parameter_i32(target, glow::TEXTURE_MAX_LEVEL, desc.mipmap_count as i32 - 1);
            }

            for level in 0..desc.mipmap_count {
                let level_data = if level == 0 { data } else { None };
                self.upload_texture_level(desc, level, format.internal as i32, format.external, format.data_type, level_data);
            }

            self.gl.bind_texture(target, self.texture_bindings.active(target));
            self.label(glow::TEXTURE, texture.0.get(), desc.debug_name.as_deref());

            if let Err(e) = self.check_allocation("texture") {
                self.gl.delete_texture(texture);
                return Err(e);
            }

            self.texture_targets.insert(texture.0.get(), target);
            Ok(TextureHandle(texture.0.get()))
        }
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        self.texture_targets.remove(&texture.0);
        if let Some(native) = native_texture(texture) {
            self.texture_bindings.forget(native);
            unsafe { self.gl.delete_texture(native) };
        }
    }

    fn create_renderbuffer(
        &mut self,
        format: PixelFormat,
        width: u32,
        height: u32,
        samples: u32,
    ) -> Result<RenderbufferHandle> {
        let gl_fmt = gl_format(&self.driver, format, true).ok_or_else(|| {
            engine_err!(@Unsupported, SOURCE, "Pixel format {:?} has no OpenGL equivalent", format)
        })?;

        unsafe {
            self.drain_errors();
            let renderbuffer = self.gl.create_renderbuffer()
                .map_err(|e| engine_err!(SOURCE, "Failed to create renderbuffer: {}", e))?;

            self.gl.bind_renderbuffer(glow::RENDERBUFFER, Some(renderbuffer));
            if samples > 1 {
                self.gl.renderbuffer_storage_multisample(
                    glow::RENDERBUFFER, samples as i32, gl_fmt.internal, width as i32, height as i32,
                );
            } else {
                self.gl.renderbuffer_storage(glow::RENDERBUFFER, gl_fmt.internal, width as i32, height as i32);
            }
            self.gl.bind_renderbuffer(glow::RENDERBUFFER, None);

            if let Err(e) = self.check_allocation("renderbuffer") {
                self.gl.delete_renderbuffer(renderbuffer);
                return Err(e);
            }

            Ok(RenderbufferHandle(renderbuffer.0.get()))
        }
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle) {
        if let Some(native) = native_renderbuffer(renderbuffer) {
            unsafe { self.gl.delete_renderbuffer(native) };
        }
    }

    fn generate_mipmaps(&mut self, texture: TextureHandle, texture_type: TextureType) {
        let target = texture_target_to_gl(texture_type);
        unsafe {
            self.gl.bind_texture(target, native_texture(texture));
            self.gl.generate_mipmap(target);
            self.gl.bind_texture(target, self.texture_bindings.active(target));
        }
    }

    // ===== BUFFERS =====

    fn create_buffer(&mut self, desc: &BufferDesc, data: Option<&[u8]>) -> Result<BufferHandle> {
        let target = self.upload_target();
        let usage = data_usage_to_gl(desc.data_usage);

        unsafe {
            self.drain_errors();
            let buffer = self.gl.create_buffer()
                .map_err(|e| engine_err!(SOURCE, "Failed to create buffer: {}", e))?;

            self.with_buffer_bound(target, buffer, |gl| match data {
                Some(data) if data.len() == desc.size => gl.buffer_data_u8_slice(target, data, usage),
                Some(data) => {
                    gl.buffer_data_size(target, desc.size as i32, usage);
                    gl.buffer_sub_data_u8_slice(target, 0, &data[..data.len().min(desc.size)]);
                }
                None => gl.buffer_data_size(target, desc.size as i32, usage),
            });

            self.label(glow::BUFFER, buffer.0.get(), desc.debug_name.as_deref());

            if let Err(e) = self.check_allocation("buffer") {
                self.gl.delete_buffer(buffer);
                return Err(e);
            }

            self.buffer_sizes.insert(buffer.0.get(), desc.size);
            Ok(BufferHandle(buffer.0.get()))
        }
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: usize, data: &[u8]) -> Result<()> {
        let size = *self.buffer_sizes.get(&buffer.0).ok_or_else(|| {
            engine_err!(@InvalidResource, SOURCE, "Buffer {} does not exist", buffer.0)
        })?;
        if offset + data.len() > size {
            return Err(engine_err!(SOURCE,
                "Write of {} bytes at offset {} overflows buffer {} ({} bytes)",
                data.len(), offset, buffer.0, size));
        }

        let native = native_buffer(buffer)
            .ok_or_else(|| engine_err!(@InvalidResource, SOURCE, "Buffer 0 is not a buffer object"))?;
        let target = self.upload_target();
        unsafe {
            self.with_buffer_bound(target, native, |gl| {
                gl.buffer_sub_data_u8_slice(target, offset as i32, data);
            });
        }
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.buffer_sizes.remove(&buffer.0);
        if let Some(native) = native_buffer(buffer) {
            for bound in self.buffer_bindings.values_mut() {
                if *bound == Some(native) {
                    *bound = None;
                }
            }
            unsafe { self.gl.delete_buffer(native) };
        }
    }

    fn bind_buffer(&mut self, usage: BufferUsage, buffer: Option<BufferHandle>) {
        let target = buffer_target_to_gl(usage);
        let native = buffer.and_then(native_buffer);
        self.buffer_bindings.insert(target, native);
        unsafe { self.gl.bind_buffer(target, native) };
    }

    // ===== FRAMEBUFFERS =====

    fn create_framebuffer(&mut self) -> Result<FramebufferHandle> {
        unsafe {
            let framebuffer = self.gl.create_framebuffer()
                .map_err(|e| engine_err!(SOURCE, "Failed to create framebuffer: {}", e))?;
            Ok(FramebufferHandle(framebuffer.0.get()))
        }
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        // Deleting a bound framebuffer reverts the binding to 0
        if self.draw_framebuffer == framebuffer {
            self.draw_framebuffer = FramebufferHandle::DEFAULT;
        }
        if self.read_framebuffer == framebuffer {
            self.read_framebuffer = FramebufferHandle::DEFAULT;
        }
        if let Some(native) = native_framebuffer(framebuffer) {
            unsafe { self.gl.delete_framebuffer(native) };
        }
    }

    fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: FramebufferHandle) {
        let target = if self.separate_framebuffer_targets { target } else { FramebufferTarget::All };
        match target {
            FramebufferTarget::Read => self.read_framebuffer = framebuffer,
            FramebufferTarget::Draw => self.draw_framebuffer = framebuffer,
            FramebufferTarget::All => {
                self.read_framebuffer = framebuffer;
                self.draw_framebuffer = framebuffer;
            }
        }
        unsafe {
            self.gl.bind_framebuffer(framebuffer_target_to_gl(target), native_framebuffer(framebuffer));
        }
    }

    fn bound_framebuffer(&self) -> FramebufferHandle {
        self.draw_framebuffer
    }

    fn attach_texture(
        &mut self,
        attachment: Attachment,
        texture_type: TextureType,
        texture: TextureHandle,
        level: u32,
        layer: AttachmentLayer,
    ) {
        let target = self.attach_target();
        let native = native_texture(texture);
        let level = level as i32;

        for point in self.attachment_points(attachment) {
            unsafe {
                match (texture_type, layer) {
                    (TextureType::Cube, AttachmentLayer::Face(face)) => self.gl.framebuffer_texture_2d(
                        target, point, glow::TEXTURE_CUBE_MAP_POSITIVE_X + face, native, level,
                    ),
                    (TextureType::Array2D | TextureType::Volume, AttachmentLayer::Layer(index)) => {
                        self.gl.framebuffer_texture_layer(target, point, native, level, index as i32)
                    }
                    _ => self.gl.framebuffer_texture_2d(target, point, glow::TEXTURE_2D, native, level),
                }
            }
        }
    }

    fn attach_renderbuffer(&mut self, attachment: Attachment, renderbuffer: RenderbufferHandle) {
        let target = self.attach_target();
        let native = native_renderbuffer(renderbuffer);
        for point in self.attachment_points(attachment) {
            unsafe { self.gl.framebuffer_renderbuffer(target, point, glow::RENDERBUFFER, native) };
        }
    }

    fn set_draw_buffers(&mut self, attachments: &[Attachment]) {
        let multiple = self.driver.desktop_at_least(2, 0)
            || self.driver.es_at_least(3, 0)
            || self.driver.has_extension("GL_EXT_draw_buffers");
        if !multiple {
            return;
        }

        let buffers: Vec<u32> = if attachments.is_empty() {
            vec![glow::NONE]
        } else {
            attachments.iter().map(|a| attachment_to_gl(*a)).collect()
        };
        unsafe { self.gl.draw_buffers(&buffers) };
    }

    fn set_read_buffer(&mut self, attachment: Option<Attachment>) {
        if self.driver.is_embedded() && !self.driver.es_at_least(3, 0) {
            return;
        }
        let buffer = attachment.map(attachment_to_gl).unwrap_or(glow::NONE);
        unsafe { self.gl.read_buffer(buffer) };
    }

    fn check_framebuffer_status(&mut self) -> FramebufferStatus {
        let status = unsafe { self.gl.check_framebuffer_status(self.attach_target()) };
        if status == glow::FRAMEBUFFER_COMPLETE {
            FramebufferStatus::Complete
        } else {
            FramebufferStatus::Incomplete(framebuffer_status_string(status).to_string())
        }
    }

    fn blit_framebuffer(&mut self, src: Rect, dst: Rect, mask: BufferMask) {
        unsafe {
            self.gl.blit_framebuffer(
                src.x, src.y, src.x + src.w, src.y + src.h,
                dst.x, dst.y, dst.x + dst.w, dst.y + dst.h,
                buffer_mask_to_gl(mask),
                glow::NEAREST,
            );
        }
    }

    fn resolve_multisample_framebuffer(&mut self, width: u32, height: u32) {
        match self.extension_fns.resolve_multisample_apple {
            Some(resolve) => unsafe { resolve() },
            None => {
                engine_debug!(SOURCE, "APPLE resolve entry point not loaded, resolving with a blit");
                let rect = Rect::new(0, 0, width as i32, height as i32);
                self.blit_framebuffer(rect, rect, BufferMask::COLOR);
            }
        }
    }

    fn invalidate_framebuffer(&mut self, target: FramebufferTarget, attachments: &[Attachment]) {
        if attachments.is_empty() {
            return;
        }
        let names: Vec<u32> = attachments.iter().map(|a| invalidate_attachment_to_gl(*a)).collect();

        unsafe {
            if self.invalidate_core {
                let target = if self.separate_framebuffer_targets { target } else { FramebufferTarget::All };
                self.gl.invalidate_framebuffer(framebuffer_target_to_gl(target), &names);
            } else if let Some(discard) = self.extension_fns.discard_framebuffer {
                // EXT_discard_framebuffer only knows the combined binding
                discard(glow::FRAMEBUFFER, names.len() as i32, names.as_ptr());
            }
        }
    }

    fn read_pixels_rgba8(&mut self, rect: Rect, out: &mut [u8]) -> Result<()> {
        let needed = rect.w.max(0) as usize * rect.h.max(0) as usize * 4;
        if out.len() < needed {
            return Err(engine_err!(@InvalidOperation, SOURCE,
                "Readback buffer is {} bytes, {}x{} RGBA8 needs {}", out.len(), rect.w, rect.h, needed));
        }

        unsafe {
            self.drain_errors();
            self.gl.pixel_store_i32(glow::PACK_ALIGNMENT, 1);
            self.gl.read_pixels(
                rect.x, rect.y, rect.w, rect.h,
                glow::RGBA, glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(&mut out[..needed]),
            );
            match self.gl.get_error() {
                glow::NO_ERROR => Ok(()),
                code => Err(engine_err!(SOURCE, "glReadPixels failed with GL error 0x{:04X}", code)),
            }
        }
    }

    // ===== FIXED-FUNCTION STATE =====

    fn set_viewport(&mut self, rect: Rect) {
        unsafe { self.gl.viewport(rect.x, rect.y, rect.w, rect.h) };
    }

    fn set_scissor(&mut self, rect: Option<Rect>) {
        unsafe {
            match rect {
                Some(rect) => {
                    self.gl.enable(glow::SCISSOR_TEST);
                    self.gl.scissor(rect.x, rect.y, rect.w, rect.h);
                }
                None => self.gl.disable(glow::SCISSOR_TEST),
            }
        }
    }

    fn set_blend_state(&mut self, state: &BlendState) {
        unsafe {
            if !state.enable {
                self.gl.disable(glow::BLEND);
                return;
            }
            self.gl.enable(glow::BLEND);
            self.gl.blend_equation_separate(
                blend_operation_to_gl(state.operation_rgb),
                blend_operation_to_gl(state.operation_a),
            );
            self.gl.blend_func_separate(
                blend_factor_to_gl(state.src_factor_rgb),
                blend_factor_to_gl(state.dst_factor_rgb),
                blend_factor_to_gl(state.src_factor_a),
                blend_factor_to_gl(state.dst_factor_a),
            );
        }
    }

    fn set_depth_state(&mut self, compare: Option<CompareMode>, write: bool) {
        unsafe {
            match compare {
                Some(mode) => {
                    self.gl.enable(glow::DEPTH_TEST);
                    self.gl.depth_func(compare_mode_to_gl(mode));
                }
                None => self.gl.disable(glow::DEPTH_TEST),
            }
            self.gl.depth_mask(write);
        }
    }

    fn set_stencil_state(&mut self, state: Option<StencilState>) {
        unsafe {
            match state {
                Some(state) => {
                    self.gl.enable(glow::STENCIL_TEST);
                    self.gl.stencil_func(compare_mode_to_gl(state.compare), state.reference, state.read_mask);
                    let keep = stencil_action_to_gl(StencilAction::Keep);
                    self.gl.stencil_op(keep, keep, stencil_action_to_gl(state.pass_action));
                    self.gl.stencil_mask(state.write_mask);
                }
                None => self.gl.disable(glow::STENCIL_TEST),
            }
        }
    }

    fn set_color_mask(&mut self, mask: ColorChannelMask) {
        unsafe { self.gl.color_mask(mask.r, mask.g, mask.b, mask.a) };
    }

    fn set_front_face(&mut self, winding: Winding) {
        unsafe { self.gl.front_face(winding_to_gl(winding)) };
    }

    fn set_cull_mode(&mut self, mode: CullMode) {
        unsafe {
            match cull_mode_to_gl(mode) {
                Some(face) => {
                    self.gl.enable(glow::CULL_FACE);
                    self.gl.cull_face(face);
                }
                None => self.gl.disable(glow::CULL_FACE),
            }
        }
    }

    fn set_wireframe(&mut self, enable: bool) {
        if self.driver.is_embedded() {
            return;
        }
        let mode = if enable { glow::LINE } else { glow::FILL };
        unsafe { self.gl.polygon_mode(glow::FRONT_AND_BACK, mode) };
    }

    fn set_framebuffer_srgb(&mut self, enable: bool) {
        unsafe {
            if enable {
                self.gl.enable(glow::FRAMEBUFFER_SRGB);
            } else {
                self.gl.disable(glow::FRAMEBUFFER_SRGB);
            }
        }
    }

    // ===== CLEARS =====

    fn clear(&mut self, color: Option<Colorf>, stencil: Option<i32>, depth: Option<f64>) {
        let mut mask = 0;
        unsafe {
            if let Some(c) = color {
                self.gl.clear_color(c.r, c.g, c.b, c.a);
                mask |= glow::COLOR_BUFFER_BIT;
            }
            if let Some(s) = stencil {
                self.gl.clear_stencil(s);
                mask |= glow::STENCIL_BUFFER_BIT;
            }
            if let Some(d) = depth {
                if self.driver.is_embedded() {
                    self.gl.clear_depth_f32(d as f32);
                } else {
                    self.gl.clear_depth_f64(d);
                }
                mask |= glow::DEPTH_BUFFER_BIT;
            }
            if mask != 0 {
                self.gl.clear(mask);
            }
        }
    }

    fn clear_color_attachment(&mut self, index: u32, color: Colorf) {
        let mut rgba = [color.r, color.g, color.b, color.a];
        unsafe { self.gl.clear_buffer_f32_slice(glow::COLOR, index, &mut rgba) };
    }

    // ===== DRAWING =====

    fn set_vertex_attributes(&mut self, attributes: &VertexAttributes, buffers: &BufferBindings) {
        let mut enabled = 0u32;

        unsafe {
            for attribute in &attributes.attributes {
                let binding = match buffers.slots.get(attribute.buffer_index).copied().flatten() {
                    Some(binding) => binding,
                    None => {
                        engine_warn!(SOURCE, "Vertex attribute {} reads unbound stream {}",
                            attribute.location, attribute.buffer_index);
                        continue;
                    }
                };

                let (data_type, normalized) = data_format_to_gl(attribute.format);
                let stride = attributes.strides[attribute.buffer_index.min(MAX_VERTEX_BUFFERS - 1)];
                self.gl.bind_buffer(glow::ARRAY_BUFFER, native_buffer(binding.buffer));
                self.gl.vertex_attrib_pointer_f32(
                    attribute.location,
                    attribute.format.components(),
                    data_type,
                    normalized,
                    stride as i32,
                    (binding.offset + attribute.offset as usize) as i32,
                );
                enabled |= 1 << attribute.location;
            }

            let changed = enabled ^ self.enabled_attributes;
            for location in 0..32u32 {
                if changed & (1 << location) == 0 {
                    continue;
                }
                if enabled & (1 << location) != 0 {
                    self.gl.enable_vertex_attrib_array(location);
                } else {
                    self.gl.disable_vertex_attrib_array(location);
                }
            }

            // Without per-vertex colors the attribute reads as opaque white
            if enabled & (1 << ATTRIB_COLOR) == 0 {
                self.gl.vertex_attrib_4_f32(ATTRIB_COLOR, 1.0, 1.0, 1.0, 1.0);
            }

            let previous = self.buffer_bindings.get(&glow::ARRAY_BUFFER).copied().flatten();
            self.gl.bind_buffer(glow::ARRAY_BUFFER, previous);
        }

        self.enabled_attributes = enabled;
    }

    fn bind_texture(&mut self, unit: u32, texture_type: TextureType, texture: Option<TextureHandle>) {
        let target = texture
            .and_then(|t| self.texture_targets.get(&t.0).copied())
            .unwrap_or_else(|| texture_target_to_gl(texture_type));
        let native = texture.and_then(native_texture);
        self.texture_bindings.bind(unit, target, native);
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(target, native);
        }
    }

    fn draw_arrays(&mut self, primitive: PrimitiveType, first: u32, count: u32, instances: u32) {
        let mode = primitive_to_gl(primitive);
        unsafe {
            if instances > 1 {
                self.gl.draw_arrays_instanced(mode, first as i32, count as i32, instances as i32);
            } else {
                self.gl.draw_arrays(mode, first as i32, count as i32);
            }
        }
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
        let mode = primitive_to_gl(primitive);
        let element_type = index_type_to_gl(index_type);
        let (count, offset) = (count as i32, index_offset as i32);

        unsafe {
            match (instances > 1, base_vertex) {
                (false, None) => self.gl.draw_elements(mode, count, element_type, offset),
                (true, None) => {
                    self.gl.draw_elements_instanced(mode, count, element_type, offset, instances as i32)
                }
                (false, Some(base)) => {
                    self.gl.draw_elements_base_vertex(mode, count, element_type, offset, base)
                }
                (true, Some(base)) => self.gl.draw_elements_instanced_base_vertex(
                    mode, count, element_type, offset, instances as i32, base,
                ),
            }
        }
    }

    // ===== PROGRAMS / COMPUTE =====

    fn create_standard_program(&mut self, kind: StandardShader) -> Result<ProgramHandle> {
        let (vertex, fragment) = standard_program_source(kind, self.glsl).ok_or_else(|| {
            engine_err!(@InitializationFailed, SOURCE, "{:?} program is not expressible in {:?}", kind, self.glsl)
        })?;

        unsafe {
            let program = self.link_program(&vertex, &fragment).map_err(|log| {
                engine_err!(@InitializationFailed, SOURCE, "Failed to build the {:?} program:\n{}", kind, log)
            })?;

            // Sampler binds to unit 0, where the context puts the draw texture
            self.gl.use_program(Some(program));
            let sampler = self.gl.get_uniform_location(program, UNIFORM_TEXTURE);
            self.gl.uniform_1_i32(sampler.as_ref(), 0);
            self.gl.use_program(self.current_program.and_then(native_program));

            self.label(glow::PROGRAM, program.0.get(), Some(format!("{:?}", kind).as_str()));
            Ok(ProgramHandle(program.0.get()))
        }
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.uniform_locations.remove(&program.0);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
        if let Some(native) = native_program(program) {
            unsafe { self.gl.delete_program(native) };
        }
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.current_program = Some(program);
        unsafe { self.gl.use_program(native_program(program)) };
    }

    fn update_builtin_uniforms(&mut self, program: ProgramHandle, uniforms: &BuiltinUniforms) {
        let native = match native_program(program) {
            Some(native) => native,
            None => return,
        };
        if self.current_program != Some(program) {
            self.use_program(program);
        }

        let gl = &self.gl;
        let locations = self
            .uniform_locations
            .entry(program.0)
            .or_insert_with(|| unsafe { BuiltinLocations::query(gl, native) });

        unsafe {
            gl.uniform_matrix_4_f32_slice(
                locations.projection.as_ref(),
                false,
                &uniforms.projection.to_cols_array(),
            );
            let s = uniforms.screen_size;
            gl.uniform_4_f32(locations.screen_size.as_ref(), s.x, s.y, s.z, s.w);
            gl.uniform_1_f32(locations.point_size.as_ref(), uniforms.point_size);
            let c = uniforms.constant_color;
            gl.uniform_4_f32(locations.constant_color.as_ref(), c.x, c.y, c.z, c.w);
        }
    }

    fn memory_barrier(&mut self, barriers: MemoryBarriers) {
        let bits = memory_barriers_to_gl(barriers);
        if bits != 0 {
            unsafe { self.gl.memory_barrier(bits) };
        }
    }

    fn dispatch_compute(&mut self, x: u32, y: u32, z: u32) {
        unsafe { self.gl.dispatch_compute(x, y, z) };
    }

    // ===== SYNCHRONIZATION =====

    fn finish(&mut self) {
        unsafe { self.gl.finish() };
    }
}

#[cfg(test)]
#[path = "gl_device_tests.rs"]
mod tests;
