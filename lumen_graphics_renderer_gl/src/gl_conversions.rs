/// Conversions from core device enums to OpenGL constants
///
/// Every table is an exhaustive match so a new core variant fails to compile
/// here instead of silently reaching the driver as 0.

use lumen_graphics::lumen::device::{
    Attachment, BlendFactor, BlendOperation, BufferMask, BufferUsage, CompareMode, CullMode,
    DataFormat, DataUsage, FramebufferTarget, IndexType, MemoryBarriers, PrimitiveType,
    StencilAction, TextureType, Winding,
};

/// ES2 only; not part of the GL 4.6 / ES 3.2 registry glow is generated from
pub(crate) const FRAMEBUFFER_INCOMPLETE_DIMENSIONS: u32 = 0x8CD9;

// ===== Blending =====

pub(crate) fn blend_operation_to_gl(op: BlendOperation) -> u32 {
    match op {
        BlendOperation::Add => glow::FUNC_ADD,
        BlendOperation::Subtract => glow::FUNC_SUBTRACT,
        BlendOperation::ReverseSubtract => glow::FUNC_REVERSE_SUBTRACT,
        BlendOperation::Min => glow::MIN,
        BlendOperation::Max => glow::MAX,
    }
}

pub(crate) fn blend_factor_to_gl(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcColor => glow::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => glow::ONE_MINUS_SRC_COLOR,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstColor => glow::DST_COLOR,
        BlendFactor::OneMinusDstColor => glow::ONE_MINUS_DST_COLOR,
        BlendFactor::DstAlpha => glow::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => glow::ONE_MINUS_DST_ALPHA,
        BlendFactor::SrcAlphaSaturated => glow::SRC_ALPHA_SATURATE,
    }
}

// ===== Depth / stencil =====

pub(crate) fn compare_mode_to_gl(mode: CompareMode) -> u32 {
    match mode {
        CompareMode::Less => glow::LESS,
        CompareMode::LessEqual => glow::LEQUAL,
        CompareMode::Equal => glow::EQUAL,
        CompareMode::GreaterEqual => glow::GEQUAL,
        CompareMode::Greater => glow::GREATER,
        CompareMode::NotEqual => glow::NOTEQUAL,
        CompareMode::Always => glow::ALWAYS,
        CompareMode::Never => glow::NEVER,
    }
}

pub(crate) fn stencil_action_to_gl(action: StencilAction) -> u32 {
    match action {
        StencilAction::Keep => glow::KEEP,
        StencilAction::Replace => glow::REPLACE,
        StencilAction::Increment => glow::INCR,
        StencilAction::Decrement => glow::DECR,
        StencilAction::IncrementWrap => glow::INCR_WRAP,
        StencilAction::DecrementWrap => glow::DECR_WRAP,
        StencilAction::Invert => glow::INVERT,
    }
}

// ===== Rasterizer =====

pub(crate) fn winding_to_gl(winding: Winding) -> u32 {
    match winding {
        Winding::Cw => glow::CW,
        Winding::Ccw => glow::CCW,
    }
}

/// None means face culling is disabled
pub(crate) fn cull_mode_to_gl(mode: CullMode) -> Option<u32> {
    match mode {
        CullMode::None => None,
        CullMode::Back => Some(glow::BACK),
        CullMode::Front => Some(glow::FRONT),
    }
}

pub(crate) fn primitive_to_gl(primitive: PrimitiveType) -> u32 {
    match primitive {
        PrimitiveType::Triangles => glow::TRIANGLES,
        PrimitiveType::TriangleStrip => glow::TRIANGLE_STRIP,
        PrimitiveType::TriangleFan => glow::TRIANGLE_FAN,
        PrimitiveType::Points => glow::POINTS,
    }
}

// ===== Buffers / vertex input =====

pub(crate) fn index_type_to_gl(index_type: IndexType) -> u32 {
    match index_type {
        IndexType::U16 => glow::UNSIGNED_SHORT,
        IndexType::U32 => glow::UNSIGNED_INT,
    }
}

pub(crate) fn buffer_target_to_gl(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::Vertex => glow::ARRAY_BUFFER,
        BufferUsage::Index => glow::ELEMENT_ARRAY_BUFFER,
        BufferUsage::Texel => glow::TEXTURE_BUFFER,
        BufferUsage::ShaderStorage => glow::SHADER_STORAGE_BUFFER,
        BufferUsage::CopySource => glow::COPY_READ_BUFFER,
        BufferUsage::CopyDest => glow::COPY_WRITE_BUFFER,
    }
}

pub(crate) fn data_usage_to_gl(usage: DataUsage) -> u32 {
    match usage {
        DataUsage::Static => glow::STATIC_DRAW,
        DataUsage::Dynamic => glow::DYNAMIC_DRAW,
        DataUsage::Stream => glow::STREAM_DRAW,
    }
}

/// (component type, normalized)
pub(crate) fn data_format_to_gl(format: DataFormat) -> (u32, bool) {
    match format {
        DataFormat::FloatVec2 | DataFormat::FloatVec3 | DataFormat::FloatVec4 => (glow::FLOAT, false),
        DataFormat::UNorm8Vec4 => (glow::UNSIGNED_BYTE, true),
    }
}

// ===== Textures =====

pub(crate) fn texture_target_to_gl(texture_type: TextureType) -> u32 {
    match texture_type {
        TextureType::Tex2D => glow::TEXTURE_2D,
        TextureType::Volume => glow::TEXTURE_3D,
        TextureType::Array2D => glow::TEXTURE_2D_ARRAY,
        TextureType::Cube => glow::TEXTURE_CUBE_MAP,
    }
}

// ===== Framebuffers =====

pub(crate) fn framebuffer_target_to_gl(target: FramebufferTarget) -> u32 {
    match target {
        FramebufferTarget::Read => glow::READ_FRAMEBUFFER,
        FramebufferTarget::Draw => glow::DRAW_FRAMEBUFFER,
        FramebufferTarget::All => glow::FRAMEBUFFER,
    }
}

/// Attachment point as used by attach, draw buffer and read buffer calls
pub(crate) fn attachment_to_gl(attachment: Attachment) -> u32 {
    match attachment {
        Attachment::Color(index) => glow::COLOR_ATTACHMENT0 + index,
        Attachment::Depth => glow::DEPTH_ATTACHMENT,
        Attachment::Stencil => glow::STENCIL_ATTACHMENT,
        Attachment::DepthStencil => glow::DEPTH_STENCIL_ATTACHMENT,
        Attachment::DefaultColor => glow::BACK,
        Attachment::DefaultDepth => glow::DEPTH,
        Attachment::DefaultStencil => glow::STENCIL,
    }
}

/// Attachment name accepted by invalidate and discard calls
///
/// The window-system framebuffer is addressed by buffer name there, not by
/// attachment point.
pub(crate) fn invalidate_attachment_to_gl(attachment: Attachment) -> u32 {
    match attachment {
        Attachment::DefaultColor => glow::COLOR,
        other => attachment_to_gl(other),
    }
}

pub(crate) fn buffer_mask_to_gl(mask: BufferMask) -> u32 {
    let mut bits = 0;
    if mask.contains(BufferMask::COLOR) {
        bits |= glow::COLOR_BUFFER_BIT;
    }
    if mask.contains(BufferMask::DEPTH) {
        bits |= glow::DEPTH_BUFFER_BIT;
    }
    if mask.contains(BufferMask::STENCIL) {
        bits |= glow::STENCIL_BUFFER_BIT;
    }
    bits
}

/// Human-readable completeness status
pub(crate) fn framebuffer_status_string(status: u32) -> &'static str {
    match status {
        glow::FRAMEBUFFER_COMPLETE => "complete (success)",
        glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => {
            "Texture format cannot be rendered to on this system."
        }
        glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => {
            "Error in graphics driver (missing render texture attachment)"
        }
        FRAMEBUFFER_INCOMPLETE_DIMENSIONS => "Error in graphics driver (incomplete dimensions)",
        glow::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => "Error in graphics driver (incomplete draw buffer)",
        glow::FRAMEBUFFER_INCOMPLETE_READ_BUFFER => "Error in graphics driver (incomplete read buffer)",
        glow::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => {
            "Texture with the specified MSAA count cannot be rendered to on this system."
        }
        glow::FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS => {
            "Error in graphics driver (mismatched layered attachments)"
        }
        glow::FRAMEBUFFER_UNDEFINED => "Error in graphics driver (undefined default framebuffer)",
        glow::FRAMEBUFFER_UNSUPPORTED => "Renderable textures are unsupported",
        _ => "Unknown error",
    }
}

// ===== Compute =====

pub(crate) fn memory_barriers_to_gl(barriers: MemoryBarriers) -> u32 {
    const TABLE: [(MemoryBarriers, u32); 9] = [
        (MemoryBarriers::VERTEX_ATTRIB_ARRAY, glow::VERTEX_ATTRIB_ARRAY_BARRIER_BIT),
        (MemoryBarriers::ELEMENT_ARRAY, glow::ELEMENT_ARRAY_BARRIER_BIT),
        (MemoryBarriers::TEXTURE_FETCH, glow::TEXTURE_FETCH_BARRIER_BIT),
        (MemoryBarriers::SHADER_IMAGE_ACCESS, glow::SHADER_IMAGE_ACCESS_BARRIER_BIT),
        (MemoryBarriers::PIXEL_BUFFER, glow::PIXEL_BUFFER_BARRIER_BIT),
        (MemoryBarriers::TEXTURE_UPDATE, glow::TEXTURE_UPDATE_BARRIER_BIT),
        (MemoryBarriers::BUFFER_UPDATE, glow::BUFFER_UPDATE_BARRIER_BIT),
        (MemoryBarriers::FRAMEBUFFER, glow::FRAMEBUFFER_BARRIER_BIT),
        (MemoryBarriers::SHADER_STORAGE, glow::SHADER_STORAGE_BARRIER_BIT),
    ];

    TABLE
        .iter()
        .filter(|(flag, _)| barriers.contains(*flag))
        .fold(0, |bits, (_, gl)| bits | gl)
}

#[cfg(test)]
#[path = "gl_conversions_tests.rs"]
mod tests;
