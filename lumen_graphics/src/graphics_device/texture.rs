/// Texture-related device types (pixel formats, texture types, usage flags)

use bitflags::bitflags;

/// Pixel formats understood by the core
///
/// `Normal` and `Hdr` are logical formats resolved to a sized format by
/// `CapabilityProber::sized_format` before anything reaches the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Normal,
    Hdr,
    R8Unorm,
    Rg8Unorm,
    Rgba8Unorm,
    Srgba8Unorm,
    Rgba4Unorm,
    Rgb5a1Unorm,
    Rgb10a2Unorm,
    R16Float,
    Rgba16Float,
    R32Float,
    Rgba32Float,
    Rg11b10Float,
    Stencil8,
    Depth16Unorm,
    Depth24Unorm,
    Depth32Float,
    Depth24UnormStencil8,
    Depth32FloatStencil8,
}

impl PixelFormat {
    pub const ALL: [PixelFormat; 20] = [
        PixelFormat::Normal,
        PixelFormat::Hdr,
        PixelFormat::R8Unorm,
        PixelFormat::Rg8Unorm,
        PixelFormat::Rgba8Unorm,
        PixelFormat::Srgba8Unorm,
        PixelFormat::Rgba4Unorm,
        PixelFormat::Rgb5a1Unorm,
        PixelFormat::Rgb10a2Unorm,
        PixelFormat::R16Float,
        PixelFormat::Rgba16Float,
        PixelFormat::R32Float,
        PixelFormat::Rgba32Float,
        PixelFormat::Rg11b10Float,
        PixelFormat::Stencil8,
        PixelFormat::Depth16Unorm,
        PixelFormat::Depth24Unorm,
        PixelFormat::Depth32Float,
        PixelFormat::Depth24UnormStencil8,
        PixelFormat::Depth32FloatStencil8,
    ];

    pub fn is_depth(self) -> bool {
        matches!(
            self,
            PixelFormat::Depth16Unorm
                | PixelFormat::Depth24Unorm
                | PixelFormat::Depth32Float
                | PixelFormat::Depth24UnormStencil8
                | PixelFormat::Depth32FloatStencil8
        )
    }

    pub fn is_stencil(self) -> bool {
        matches!(
            self,
            PixelFormat::Stencil8
                | PixelFormat::Depth24UnormStencil8
                | PixelFormat::Depth32FloatStencil8
        )
    }

    /// True for any format carrying depth and/or stencil bits
    pub fn is_depth_stencil(self) -> bool {
        self.is_depth() || self.is_stencil()
    }

    pub fn is_srgb(self) -> bool {
        self == PixelFormat::Srgba8Unorm
    }

    /// sRGB variant of a linear format, if one exists
    pub fn srgb_equivalent(self) -> PixelFormat {
        match self {
            PixelFormat::Rgba8Unorm => PixelFormat::Srgba8Unorm,
            other => other,
        }
    }

    pub fn is_logical(self) -> bool {
        matches!(self, PixelFormat::Normal | PixelFormat::Hdr)
    }

    /// Bytes per pixel (logical formats report 0)
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Normal | PixelFormat::Hdr => 0,
            PixelFormat::R8Unorm | PixelFormat::Stencil8 => 1,
            PixelFormat::Rg8Unorm
            | PixelFormat::Rgba4Unorm
            | PixelFormat::Rgb5a1Unorm
            | PixelFormat::R16Float
            | PixelFormat::Depth16Unorm => 2,
            PixelFormat::Rgba8Unorm
            | PixelFormat::Srgba8Unorm
            | PixelFormat::Rgb10a2Unorm
            | PixelFormat::R32Float
            | PixelFormat::Rg11b10Float
            | PixelFormat::Depth24Unorm
            | PixelFormat::Depth32Float
            | PixelFormat::Depth24UnormStencil8 => 4,
            PixelFormat::Rgba16Float | PixelFormat::Depth32FloatStencil8 => 8,
            PixelFormat::Rgba32Float => 16,
        }
    }

    /// Framebuffer attachment points a texture of this format occupies
    pub fn attachment_kind(self) -> AttachmentKind {
        match (self.is_depth(), self.is_stencil()) {
            (true, true) => AttachmentKind::DepthStencil,
            (true, false) => AttachmentKind::Depth,
            (false, true) => AttachmentKind::Stencil,
            (false, false) => AttachmentKind::Color,
        }
    }
}

/// Which attachment slot class a format binds to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Color,
    Depth,
    Stencil,
    DepthStencil,
}

/// Texture dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    Tex2D,
    Volume,
    Array2D,
    Cube,
}

impl TextureType {
    pub const ALL: [TextureType; 4] = [
        TextureType::Tex2D,
        TextureType::Volume,
        TextureType::Array2D,
        TextureType::Cube,
    ];
}

/// Mipmap generation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MipmapsMode {
    #[default]
    None,
    Manual,
    /// Regenerated after every pass that rendered into mip level 0
    Auto,
}

bitflags! {
    /// What a pixel format can be used for on the current device
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PixelFormatUsage: u32 {
        const SAMPLE        = 1 << 0;
        const LINEAR        = 1 << 1;
        const RENDERTARGET  = 1 << 2;
        const BLEND         = 1 << 3;
        const MSAA          = 1 << 4;
        const COMPUTEWRITE  = 1 << 5;
    }
}

/// Texture creation settings
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub texture_type: TextureType,
    pub format: PixelFormat,
    /// Width in pixels at mip level 0
    pub width: u32,
    /// Height in pixels at mip level 0
    pub height: u32,
    /// Array layers or volume depth (6 faces are implied for cubes)
    pub layers: u32,
    pub mipmap_count: u32,
    pub msaa: u32,
    pub render_target: bool,
    /// None picks the default: readable unless the format is depth/stencil
    pub readable: Option<bool>,
    pub compute_write: bool,
    pub mipmaps_mode: MipmapsMode,
    pub dpi_scale: f32,
    pub debug_name: Option<String>,
}

impl Default for TextureDesc {
    fn default() -> Self {
        Self {
            texture_type: TextureType::Tex2D,
            format: PixelFormat::Normal,
            width: 1,
            height: 1,
            layers: 1,
            mipmap_count: 1,
            msaa: 1,
            render_target: false,
            readable: None,
            compute_write: false,
            mipmaps_mode: MipmapsMode::None,
            dpi_scale: 1.0,
            debug_name: None,
        }
    }
}

impl TextureDesc {
    pub fn is_readable(&self) -> bool {
        self.readable.unwrap_or(!self.format.is_depth_stencil())
    }

    /// Number of 2D slices addressable as render targets
    pub fn slice_count(&self) -> u32 {
        match self.texture_type {
            TextureType::Cube => 6,
            TextureType::Tex2D => 1,
            TextureType::Array2D | TextureType::Volume => self.layers.max(1),
        }
    }
}
