/// GraphicsDevice trait - the command surface the render context drives
///
/// The trait mirrors the OpenGL object model: textures, renderbuffers,
/// framebuffer objects with numbered color attachments, separate read and
/// draw framebuffer bindings, blits and memory barriers. Backends translate
/// each call into API commands; the core never talks to a driver directly.

use crate::capabilities::Limit;
use crate::error::Result;
use super::barrier::MemoryBarriers;
use super::buffer::{BufferBindings, BufferDesc, BufferUsage, IndexType, VertexAttributes};
use super::pipeline::{
    BlendState, ColorChannelMask, Colorf, CompareMode, CullMode, PrimitiveType, Rect,
    StencilState, Winding,
};
use super::shader::{BuiltinUniforms, StandardShader};
use super::texture::{PixelFormat, PixelFormatUsage, TextureDesc, TextureType};

// ============================================================================
// Device object handles
// ============================================================================

macro_rules! device_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);
    };
}

device_handle!(
    /// Device texture object
    TextureHandle
);
device_handle!(
    /// Device renderbuffer object (multisampled or non-readable storage)
    RenderbufferHandle
);
device_handle!(
    /// Device framebuffer object; 0 is the window-system framebuffer
    FramebufferHandle
);
device_handle!(BufferHandle);
device_handle!(ProgramHandle);

impl FramebufferHandle {
    pub const DEFAULT: FramebufferHandle = FramebufferHandle(0);

    pub fn is_default(self) -> bool {
        self.0 == 0
    }
}

// ============================================================================
// Driver description
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphicsApi {
    OpenGL,
    OpenGLES,
}

/// What the driver reports about itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverInfo {
    pub api: GraphicsApi,
    /// (major, minor) context version
    pub version: (u32, u32),
    pub core_profile: bool,
    /// None when the extension string query is unavailable
    pub extensions: Option<Vec<String>>,
    pub version_string: Option<String>,
    pub vendor: Option<String>,
    pub renderer: Option<String>,
}

impl DriverInfo {
    pub fn is_embedded(&self) -> bool {
        self.api == GraphicsApi::OpenGLES
    }

    /// Desktop context of at least the given version
    pub fn desktop_at_least(&self, major: u32, minor: u32) -> bool {
        !self.is_embedded() && self.version >= (major, minor)
    }

    /// ES context of at least the given version
    pub fn es_at_least(&self, major: u32, minor: u32) -> bool {
        self.is_embedded() && self.version >= (major, minor)
    }

    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions
            .as_ref()
            .map(|exts| exts.iter().any(|e| e == name))
            .unwrap_or(false)
    }
}

// ============================================================================
// Framebuffer addressing
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferTarget {
    Read,
    Draw,
    /// Both read and draw bindings
    All,
}

/// Attachment point of a framebuffer object
///
/// `Color`, `Depth` and `Stencil` without index address the window-system
/// framebuffer, whose attachments use different names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    Color(u32),
    Depth,
    Stencil,
    DepthStencil,
    DefaultColor,
    DefaultDepth,
    DefaultStencil,
}

/// Which part of a layered texture is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentLayer {
    /// Plain 2D texture
    None,
    /// Cube map face index (0..6)
    Face(u32),
    /// Array layer or volume slice
    Layer(u32),
}

/// Result of a framebuffer completeness check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramebufferStatus {
    Complete,
    /// Carries the driver status string
    Incomplete(String),
}

bitflags::bitflags! {
    /// Buffers affected by a blit or clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferMask: u32 {
        const COLOR   = 1 << 0;
        const DEPTH   = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

// ============================================================================
// GraphicsDevice trait
// ============================================================================

/// Command surface of a graphics backend
///
/// Implementations are not required to be thread safe: the render context
/// owns its device and issues every command from one thread.
pub trait GraphicsDevice {
    // ===== DRIVER / CAPABILITIES =====

    fn driver_info(&self) -> DriverInfo;

    /// Numeric limit as reported by the driver
    fn query_limit(&self, limit: Limit) -> f64;

    fn is_texture_type_supported(&self, texture_type: TextureType) -> bool;

    /// Usage flags the driver advertises for a sized pixel format
    fn pixel_format_usage(&self, format: PixelFormat) -> PixelFormatUsage;

    // ===== TEXTURES / RENDERBUFFERS =====

    /// Create a texture; `data` fills mip 0 of every slice when present
    ///
    /// Texture bindings are left as they were.
    fn create_texture(&mut self, desc: &TextureDesc, data: Option<&[u8]>) -> Result<TextureHandle>;

    fn delete_texture(&mut self, texture: TextureHandle);

    fn create_renderbuffer(
        &mut self,
        format: PixelFormat,
        width: u32,
        height: u32,
        samples: u32,
    ) -> Result<RenderbufferHandle>;

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle);

    fn generate_mipmaps(&mut self, texture: TextureHandle, texture_type: TextureType);

    // ===== BUFFERS =====

    fn create_buffer(&mut self, desc: &BufferDesc, data: Option<&[u8]>) -> Result<BufferHandle>;

    fn write_buffer(&mut self, buffer: BufferHandle, offset: usize, data: &[u8]) -> Result<()>;

    fn delete_buffer(&mut self, buffer: BufferHandle);

    fn bind_buffer(&mut self, usage: BufferUsage, buffer: Option<BufferHandle>);

    // ===== FRAMEBUFFERS =====

    fn create_framebuffer(&mut self) -> Result<FramebufferHandle>;

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle);

    fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: FramebufferHandle);

    /// Framebuffer currently bound for drawing
    fn bound_framebuffer(&self) -> FramebufferHandle;

    /// Attach a texture level/slice to the framebuffer bound for drawing
    fn attach_texture(
        &mut self,
        attachment: Attachment,
        texture_type: TextureType,
        texture: TextureHandle,
        level: u32,
        layer: AttachmentLayer,
    );

    fn attach_renderbuffer(&mut self, attachment: Attachment, renderbuffer: RenderbufferHandle);

    /// Empty slice selects no draw buffer at all
    fn set_draw_buffers(&mut self, attachments: &[Attachment]);

    fn set_read_buffer(&mut self, attachment: Option<Attachment>);

    fn check_framebuffer_status(&mut self) -> FramebufferStatus;

    /// Copy from the read framebuffer to the draw framebuffer
    fn blit_framebuffer(&mut self, src: Rect, dst: Rect, mask: BufferMask);

    /// Single-call multisample resolve of the read framebuffer into the draw framebuffer
    fn resolve_multisample_framebuffer(&mut self, width: u32, height: u32);

    /// Hint that attachment contents need not be preserved
    fn invalidate_framebuffer(&mut self, target: FramebufferTarget, attachments: &[Attachment]);

    /// Read RGBA8 pixels of the read framebuffer, bottom row first
    fn read_pixels_rgba8(&mut self, rect: Rect, out: &mut [u8]) -> Result<()>;

    // ===== FIXED-FUNCTION STATE =====

    fn set_viewport(&mut self, rect: Rect);

    /// `rect` is in framebuffer pixels with y already converted to device origin
    fn set_scissor(&mut self, rect: Option<Rect>);

    fn set_blend_state(&mut self, state: &BlendState);

    /// `None` disables the depth test
    fn set_depth_state(&mut self, compare: Option<CompareMode>, write: bool);

    /// `None` disables the stencil test
    fn set_stencil_state(&mut self, state: Option<StencilState>);

    fn set_color_mask(&mut self, mask: ColorChannelMask);

    fn set_front_face(&mut self, winding: Winding);

    fn set_cull_mode(&mut self, mode: CullMode);

    fn set_wireframe(&mut self, enable: bool);

    fn set_framebuffer_srgb(&mut self, enable: bool);

    // ===== CLEARS =====

    fn clear(&mut self, color: Option<Colorf>, stencil: Option<i32>, depth: Option<f64>);

    fn clear_color_attachment(&mut self, index: u32, color: Colorf);

    // ===== DRAWING =====

    fn set_vertex_attributes(&mut self, attributes: &VertexAttributes, buffers: &BufferBindings);

    fn bind_texture(&mut self, unit: u32, texture_type: TextureType, texture: Option<TextureHandle>);

    fn draw_arrays(&mut self, primitive: PrimitiveType, first: u32, count: u32, instances: u32);

    /// `base_vertex` is only passed when the capability set reports support
    fn draw_indexed(
        &mut self,
        primitive: PrimitiveType,
        count: u32,
        index_type: IndexType,
        index_offset: usize,
        instances: u32,
        base_vertex: Option<i32>,
    );

    // ===== PROGRAMS / COMPUTE =====

    fn create_standard_program(&mut self, kind: StandardShader) -> Result<ProgramHandle>;

    fn delete_program(&mut self, program: ProgramHandle);

    fn use_program(&mut self, program: ProgramHandle);

    fn update_builtin_uniforms(&mut self, program: ProgramHandle, uniforms: &BuiltinUniforms);

    fn memory_barrier(&mut self, barriers: MemoryBarriers);

    fn dispatch_compute(&mut self, x: u32, y: u32, z: u32);

    // ===== SYNCHRONIZATION =====

    /// Block until every submitted command has executed
    fn finish(&mut self);
}
