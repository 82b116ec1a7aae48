//! Unit tests for pixel format tables and usage flags
//!
//! Drivers are described with `DriverInfo` fixtures; no GL context required.

use super::*;
use lumen_graphics::lumen::device::GraphicsApi;

fn driver(api: GraphicsApi, version: (u32, u32), extensions: &[&str]) -> DriverInfo {
    DriverInfo {
        api,
        version,
        core_profile: api == GraphicsApi::OpenGL && version >= (3, 2),
        extensions: Some(extensions.iter().map(|e| e.to_string()).collect()),
        version_string: None,
        vendor: None,
        renderer: None,
    }
}

fn desktop46() -> DriverInfo {
    driver(GraphicsApi::OpenGL, (4, 6), &[])
}

fn es2() -> DriverInfo {
    driver(GraphicsApi::OpenGLES, (2, 0), &[])
}

fn es3() -> DriverInfo {
    driver(GraphicsApi::OpenGLES, (3, 0), &[])
}

// ============================================================================
// GL FORMAT TABLE
// ============================================================================

#[test]
fn test_logical_formats_have_no_gl_format() {
    assert_eq!(gl_format(&desktop46(), PixelFormat::Normal, false), None);
    assert_eq!(gl_format(&desktop46(), PixelFormat::Hdr, true), None);
}

#[test]
fn test_every_sized_format_has_gl_format() {
    for format in PixelFormat::ALL.iter().filter(|f| !f.is_logical()) {
        assert!(gl_format(&desktop46(), *format, false).is_some(), "{:?}", format);
    }
}

#[test]
fn test_desktop_texture_uses_sized_internal_format() {
    let format = gl_format(&desktop46(), PixelFormat::Rgba8Unorm, false).unwrap();
    assert_eq!(format, GlFormat { internal: glow::RGBA8, external: glow::RGBA, data_type: glow::UNSIGNED_BYTE });
}

#[test]
fn test_es2_texture_uses_unsized_internal_format() {
    let format = gl_format(&es2(), PixelFormat::Rgba4Unorm, false).unwrap();
    assert_eq!(format.internal, glow::RGBA);
    assert_eq!(format.data_type, glow::UNSIGNED_SHORT_4_4_4_4);
}

#[test]
fn test_es2_renderbuffer_keeps_sized_format() {
    let format = gl_format(&es2(), PixelFormat::Depth16Unorm, true).unwrap();
    assert_eq!(format.internal, glow::DEPTH_COMPONENT16);
}

// ============================================================================
// TEXTURE TYPES
// ============================================================================

#[test]
fn test_texture_types_on_es2() {
    let info = es2();
    assert!(texture_type_supported(&info, TextureType::Tex2D));
    assert!(texture_type_supported(&info, TextureType::Cube));
    assert!(!texture_type_supported(&info, TextureType::Volume));
    assert!(!texture_type_supported(&info, TextureType::Array2D));
}

#[test]
fn test_texture_types_from_extensions() {
    let info = driver(GraphicsApi::OpenGLES, (2, 0), &["GL_OES_texture_3D"]);
    assert!(texture_type_supported(&info, TextureType::Volume));
    assert!(!texture_type_supported(&info, TextureType::Array2D));
}

#[test]
fn test_every_texture_type_on_desktop() {
    for texture_type in TextureType::ALL {
        assert!(texture_type_supported(&desktop46(), texture_type));
    }
}

// ============================================================================
// USAGE FLAGS
// ============================================================================

#[test]
fn test_logical_formats_have_no_usage() {
    assert!(pixel_format_usage(&desktop46(), PixelFormat::Normal).is_empty());
}

#[test]
fn test_rgba8_render_target_needs_extension_on_es2() {
    let usage = pixel_format_usage(&es2(), PixelFormat::Rgba8Unorm);
    assert!(usage.contains(PixelFormatUsage::SAMPLE));
    assert!(!usage.contains(PixelFormatUsage::RENDERTARGET));

    let with_ext = driver(GraphicsApi::OpenGLES, (2, 0), &["GL_OES_rgb8_rgba8"]);
    assert!(pixel_format_usage(&with_ext, PixelFormat::Rgba8Unorm).contains(PixelFormatUsage::RENDERTARGET));
}

#[test]
fn test_rgba4_always_renderable() {
    let usage = pixel_format_usage(&es2(), PixelFormat::Rgba4Unorm);
    assert!(usage.contains(PixelFormatUsage::RENDERTARGET | PixelFormatUsage::SAMPLE));
    assert!(!usage.contains(PixelFormatUsage::MSAA));
}

#[test]
fn test_desktop_rgba8_full_usage() {
    let usage = pixel_format_usage(&desktop46(), PixelFormat::Rgba8Unorm);
    assert_eq!(
        usage,
        PixelFormatUsage::SAMPLE
            | PixelFormatUsage::LINEAR
            | PixelFormatUsage::RENDERTARGET
            | PixelFormatUsage::BLEND
            | PixelFormatUsage::MSAA
            | PixelFormatUsage::COMPUTEWRITE
    );
}

#[test]
fn test_float_render_targets_on_es3_need_color_buffer_float() {
    let usage = pixel_format_usage(&es3(), PixelFormat::Rgba32Float);
    assert!(usage.contains(PixelFormatUsage::SAMPLE));
    assert!(!usage.contains(PixelFormatUsage::LINEAR));
    assert!(!usage.contains(PixelFormatUsage::RENDERTARGET));

    let with_ext = driver(GraphicsApi::OpenGLES, (3, 0), &["GL_EXT_color_buffer_float"]);
    let usage = pixel_format_usage(&with_ext, PixelFormat::Rgba32Float);
    assert!(usage.contains(PixelFormatUsage::RENDERTARGET));
    assert!(!usage.contains(PixelFormatUsage::BLEND));
}

#[test]
fn test_single_channel_float_needs_texture_rg() {
    let info = driver(GraphicsApi::OpenGLES, (2, 0), &["GL_OES_texture_float"]);
    assert!(pixel_format_usage(&info, PixelFormat::R32Float).is_empty());
    assert!(pixel_format_usage(&info, PixelFormat::Rgba32Float).contains(PixelFormatUsage::SAMPLE));
}

#[test]
fn test_depth_formats_on_es2() {
    let info = es2();
    let depth16 = pixel_format_usage(&info, PixelFormat::Depth16Unorm);
    assert_eq!(depth16, PixelFormatUsage::RENDERTARGET);
    assert!(pixel_format_usage(&info, PixelFormat::Depth24UnormStencil8).is_empty());

    let packed = driver(GraphicsApi::OpenGLES, (2, 0), &["GL_OES_packed_depth_stencil"]);
    assert!(pixel_format_usage(&packed, PixelFormat::Depth24UnormStencil8).contains(PixelFormatUsage::RENDERTARGET));
}

#[test]
fn test_depth_formats_never_report_linear() {
    for format in PixelFormat::ALL.iter().filter(|f| f.is_depth()) {
        assert!(!pixel_format_usage(&desktop46(), *format).contains(PixelFormatUsage::LINEAR));
    }
}

#[test]
fn test_compute_write_requires_compute_support() {
    let gl33 = driver(GraphicsApi::OpenGL, (3, 3), &[]);
    assert!(!compute_supported(&gl33));
    assert!(!pixel_format_usage(&gl33, PixelFormat::Rgba8Unorm).contains(PixelFormatUsage::COMPUTEWRITE));

    let es31 = driver(GraphicsApi::OpenGLES, (3, 1), &[]);
    assert!(pixel_format_usage(&es31, PixelFormat::Rgba8Unorm).contains(PixelFormatUsage::COMPUTEWRITE));
    // ES has no r8 image format
    assert!(!pixel_format_usage(&es31, PixelFormat::R8Unorm).contains(PixelFormatUsage::COMPUTEWRITE));
}

#[test]
fn test_srgb_on_es2() {
    assert!(pixel_format_usage(&es2(), PixelFormat::Srgba8Unorm).is_empty());
    let with_ext = driver(GraphicsApi::OpenGLES, (2, 0), &["GL_EXT_sRGB"]);
    assert!(pixel_format_usage(&with_ext, PixelFormat::Srgba8Unorm).contains(PixelFormatUsage::RENDERTARGET));
}
