/// Pixel format tables and usage flags derived from the driver description
///
/// Everything here is a pure function of `DriverInfo`, so the rules can be
/// tested against described drivers without a context.

use lumen_graphics::lumen::device::{DriverInfo, PixelFormat, PixelFormatUsage, TextureType};

/// Format triple passed to texture and renderbuffer allocation calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlFormat {
    pub internal: u32,
    pub external: u32,
    pub data_type: u32,
}

/// GL formats of a sized pixel format
///
/// ES2 textures take an unsized internal format equal to the external one;
/// renderbuffers always take the sized format. Logical formats have no GL
/// equivalent.
pub fn gl_format(info: &DriverInfo, format: PixelFormat, renderbuffer: bool) -> Option<GlFormat> {
    let (internal, external, data_type) = match format {
        PixelFormat::Normal | PixelFormat::Hdr => return None,
        PixelFormat::R8Unorm => (glow::R8, glow::RED, glow::UNSIGNED_BYTE),
        PixelFormat::Rg8Unorm => (glow::RG8, glow::RG, glow::UNSIGNED_BYTE),
        PixelFormat::Rgba8Unorm => (glow::RGBA8, glow::RGBA, glow::UNSIGNED_BYTE),
        PixelFormat::Srgba8Unorm => (glow::SRGB8_ALPHA8, glow::RGBA, glow::UNSIGNED_BYTE),
        PixelFormat::Rgba4Unorm => (glow::RGBA4, glow::RGBA, glow::UNSIGNED_SHORT_4_4_4_4),
        PixelFormat::Rgb5a1Unorm => (glow::RGB5_A1, glow::RGBA, glow::UNSIGNED_SHORT_5_5_5_1),
        PixelFormat::Rgb10a2Unorm => (glow::RGB10_A2, glow::RGBA, glow::UNSIGNED_INT_2_10_10_10_REV),
        PixelFormat::R16Float => (glow::R16F, glow::RED, glow::HALF_FLOAT),
        PixelFormat::Rgba16Float => (glow::RGBA16F, glow::RGBA, glow::HALF_FLOAT),
        PixelFormat::R32Float => (glow::R32F, glow::RED, glow::FLOAT),
        PixelFormat::Rgba32Float => (glow::RGBA32F, glow::RGBA, glow::FLOAT),
        PixelFormat::Rg11b10Float => {
            (glow::R11F_G11F_B10F, glow::RGB, glow::UNSIGNED_INT_10F_11F_11F_REV)
        }
        PixelFormat::Stencil8 => (glow::STENCIL_INDEX8, glow::STENCIL_INDEX, glow::UNSIGNED_BYTE),
        PixelFormat::Depth16Unorm => {
            (glow::DEPTH_COMPONENT16, glow::DEPTH_COMPONENT, glow::UNSIGNED_SHORT)
        }
        PixelFormat::Depth24Unorm => {
            (glow::DEPTH_COMPONENT24, glow::DEPTH_COMPONENT, glow::UNSIGNED_INT)
        }
        PixelFormat::Depth32Float => (glow::DEPTH_COMPONENT32F, glow::DEPTH_COMPONENT, glow::FLOAT),
        PixelFormat::Depth24UnormStencil8 => {
            (glow::DEPTH24_STENCIL8, glow::DEPTH_STENCIL, glow::UNSIGNED_INT_24_8)
        }
        PixelFormat::Depth32FloatStencil8 => (
            glow::DEPTH32F_STENCIL8,
            glow::DEPTH_STENCIL,
            glow::FLOAT_32_UNSIGNED_INT_24_8_REV,
        ),
    };

    let es2 = info.is_embedded() && !info.es_at_least(3, 0);
    let internal = if es2 && !renderbuffer { external } else { internal };

    Some(GlFormat { internal, external, data_type })
}

/// Texture types the driver can create
pub fn texture_type_supported(info: &DriverInfo, texture_type: TextureType) -> bool {
    match texture_type {
        TextureType::Tex2D | TextureType::Cube => true,
        TextureType::Volume => {
            !info.is_embedded() || info.es_at_least(3, 0) || info.has_extension("GL_OES_texture_3D")
        }
        TextureType::Array2D => {
            info.desktop_at_least(3, 0)
                || info.es_at_least(3, 0)
                || info.has_extension("GL_EXT_texture_array")
        }
    }
}

/// Whether compute shaders (and with them image stores) are available
pub fn compute_supported(info: &DriverInfo) -> bool {
    info.desktop_at_least(4, 3)
        || info.es_at_least(3, 1)
        || info.has_extension("GL_ARB_compute_shader")
}

/// Usage flags the driver guarantees for a sized format
pub fn pixel_format_usage(info: &DriverInfo, format: PixelFormat) -> PixelFormatUsage {
    let desktop = !info.is_embedded();
    let gl3 = info.desktop_at_least(3, 0);
    let es3 = info.es_at_least(3, 0);
    let ext = |name: &str| info.has_extension(name);

    let msaa = gl3 || es3 || ext("GL_EXT_framebuffer_multisample") || ext("GL_APPLE_framebuffer_multisample");
    let compute = compute_supported(info);
    let texture_rg = gl3 || es3 || ext("GL_ARB_texture_rg") || ext("GL_EXT_texture_rg");

    let sample = PixelFormatUsage::SAMPLE | PixelFormatUsage::LINEAR;
    let target = PixelFormatUsage::RENDERTARGET | PixelFormatUsage::BLEND;
    let with_msaa = |flags: PixelFormatUsage| {
        if msaa && flags.contains(PixelFormatUsage::RENDERTARGET) {
            flags | PixelFormatUsage::MSAA
        } else {
            flags
        }
    };

    let mut usage = match format {
        PixelFormat::Normal | PixelFormat::Hdr => PixelFormatUsage::empty(),

        PixelFormat::R8Unorm | PixelFormat::Rg8Unorm => {
            if texture_rg { with_msaa(sample | target) } else { PixelFormatUsage::empty() }
        }

        PixelFormat::Rgba8Unorm => {
            let renderable = desktop || es3 || ext("GL_OES_rgb8_rgba8") || ext("GL_ARM_rgba8");
            with_msaa(if renderable { sample | target } else { sample })
        }

        PixelFormat::Srgba8Unorm => {
            let sampled = info.desktop_at_least(2, 1)
                || es3
                || ext("GL_EXT_texture_sRGB")
                || ext("GL_EXT_sRGB");
            let renderable = gl3 || es3 || ext("GL_ARB_framebuffer_sRGB") || ext("GL_EXT_sRGB");
            match (sampled, renderable) {
                (false, _) => PixelFormatUsage::empty(),
                (true, false) => sample,
                (true, true) => with_msaa(sample | target),
            }
        }

        PixelFormat::Rgba4Unorm | PixelFormat::Rgb5a1Unorm => with_msaa(sample | target),

        PixelFormat::Rgb10a2Unorm => {
            if desktop || es3 { with_msaa(sample | target) } else { PixelFormatUsage::empty() }
        }

        PixelFormat::R16Float | PixelFormat::Rgba16Float => {
            let channels_ok = format == PixelFormat::Rgba16Float || texture_rg;
            let sampled = gl3 || es3 || ext("GL_ARB_texture_float") || ext("GL_OES_texture_half_float");
            let linear = gl3 || es3 || ext("GL_ARB_texture_float") || ext("GL_OES_texture_half_float_linear");
            let renderable = gl3
                || ext("GL_ARB_texture_float")
                || ext("GL_EXT_color_buffer_half_float")
                || ext("GL_EXT_color_buffer_float");
            float_usage(channels_ok && sampled, linear, renderable, renderable, msaa)
        }

        PixelFormat::R32Float | PixelFormat::Rgba32Float => {
            let channels_ok = format == PixelFormat::Rgba32Float || texture_rg;
            let sampled = gl3 || es3 || ext("GL_ARB_texture_float") || ext("GL_OES_texture_float");
            let linear = desktop || ext("GL_OES_texture_float_linear");
            let renderable = gl3 || ext("GL_ARB_texture_float") || ext("GL_EXT_color_buffer_float");
            let blend = desktop || ext("GL_EXT_float_blend");
            float_usage(channels_ok && sampled, linear, renderable, blend, msaa)
        }

        PixelFormat::Rg11b10Float => {
            let sampled = gl3 || es3 || ext("GL_EXT_packed_float");
            let renderable = gl3 || ext("GL_EXT_packed_float") || ext("GL_EXT_color_buffer_float");
            float_usage(sampled, sampled, renderable, renderable, msaa)
        }

        PixelFormat::Stencil8 => {
            let mut flags = PixelFormatUsage::RENDERTARGET;
            if info.desktop_at_least(4, 4)
                || info.es_at_least(3, 2)
                || ext("GL_ARB_texture_stencil8")
                || ext("GL_OES_texture_stencil8")
            {
                flags |= PixelFormatUsage::SAMPLE;
            }
            with_msaa(flags)
        }

        PixelFormat::Depth16Unorm => {
            let sampled = desktop || es3 || ext("GL_OES_depth_texture") || ext("GL_ANGLE_depth_texture");
            depth_usage(true, sampled, msaa)
        }

        PixelFormat::Depth24Unorm => {
            let renderable = desktop || es3 || ext("GL_OES_depth24");
            let sampled = desktop || es3 || (ext("GL_OES_depth_texture") && ext("GL_OES_depth24"));
            depth_usage(renderable, sampled, msaa)
        }

        PixelFormat::Depth32Float | PixelFormat::Depth32FloatStencil8 => {
            let supported = gl3 || es3 || ext("GL_ARB_depth_buffer_float");
            depth_usage(supported, supported, msaa)
        }

        PixelFormat::Depth24UnormStencil8 => {
            let renderable = gl3
                || es3
                || ext("GL_EXT_packed_depth_stencil")
                || ext("GL_OES_packed_depth_stencil");
            let sampled = gl3
                || es3
                || (ext("GL_OES_packed_depth_stencil") && ext("GL_OES_depth_texture"));
            depth_usage(renderable, sampled, msaa)
        }
    };

    if compute && compute_writable(format, desktop) && usage.contains(PixelFormatUsage::SAMPLE) {
        usage |= PixelFormatUsage::COMPUTEWRITE;
    }

    usage
}

fn float_usage(sampled: bool, linear: bool, renderable: bool, blend: bool, msaa: bool) -> PixelFormatUsage {
    if !sampled {
        return PixelFormatUsage::empty();
    }
    let mut flags = PixelFormatUsage::SAMPLE;
    if linear {
        flags |= PixelFormatUsage::LINEAR;
    }
    if renderable {
        flags |= PixelFormatUsage::RENDERTARGET;
        if blend {
            flags |= PixelFormatUsage::BLEND;
        }
        if msaa {
            flags |= PixelFormatUsage::MSAA;
        }
    }
    flags
}

/// Depth formats filter linearly only through comparison samplers; LINEAR is not reported
fn depth_usage(renderable: bool, sampled: bool, msaa: bool) -> PixelFormatUsage {
    let mut flags = PixelFormatUsage::empty();
    if renderable {
        flags |= PixelFormatUsage::RENDERTARGET;
        if msaa {
            flags |= PixelFormatUsage::MSAA;
        }
        if sampled {
            flags |= PixelFormatUsage::SAMPLE;
        }
    }
    flags
}

/// Formats with an image load/store layout qualifier
fn compute_writable(format: PixelFormat, desktop: bool) -> bool {
    match format {
        PixelFormat::Rgba8Unorm
        | PixelFormat::Rgba16Float
        | PixelFormat::Rgba32Float
        | PixelFormat::R32Float => true,
        PixelFormat::R8Unorm
        | PixelFormat::Rg8Unorm
        | PixelFormat::R16Float
        | PixelFormat::Rgb10a2Unorm
        | PixelFormat::Rg11b10Float => desktop,
        _ => false,
    }
}

#[cfg(test)]
#[path = "gl_format_tests.rs"]
mod tests;
