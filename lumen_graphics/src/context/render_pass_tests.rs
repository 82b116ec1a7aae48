/// Tests for render target switches, pass end, clears and discards

use super::*;
use crate::capabilities::Limit;
use crate::config::RenderConfig;
use crate::context::test_support::{color_target, context, context_with, queue_triangle, render_target};
use crate::error::Error;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::FramebufferHandle;

type Ctx = RenderContext<MockGraphicsDevice>;

fn target_set(texture: TextureId) -> RenderTargetSet {
    RenderTargetSet::new().with_color(RenderTarget::new(texture))
}

fn create(ctx: &mut Ctx, desc: TextureDesc) -> TextureId {
    ctx.create_texture(desc, None).unwrap()
}

fn rt_desc(format: PixelFormat) -> TextureDesc {
    TextureDesc {
        format,
        width: 64,
        height: 32,
        render_target: true,
        ..TextureDesc::default()
    }
}

// ============================================================================
// Tests: set_render_targets
// ============================================================================

#[test]
fn test_framebuffer_reused_across_switches() {
    let mut ctx = context();
    let target = color_target(&mut ctx);

    ctx.set_render_targets(target_set(target)).unwrap();
    let framebuffer = ctx.device().bound_framebuffer();
    ctx.set_render_targets_to_backbuffer().unwrap();
    ctx.set_render_targets(target_set(target)).unwrap();

    assert_eq!(ctx.device().bound_framebuffer(), framebuffer);
    assert_eq!(ctx.target_cache().creation_count(), 1);
    assert_eq!(ctx.stats().render_target_switches, 4);
}

#[test]
fn test_same_targets_twice_is_a_no_op() {
    let mut ctx = context();
    let target = color_target(&mut ctx);
    ctx.set_render_targets(target_set(target)).unwrap();
    ctx.device_mut().clear_commands();

    ctx.set_render_targets(target_set(target)).unwrap();

    assert!(ctx.device().commands.is_empty());
}

#[test]
fn test_render_target_sets_viewport_and_projection() {
    let mut ctx = context();
    let target = color_target(&mut ctx);

    ctx.set_render_targets(target_set(target)).unwrap();

    assert!(ctx.device().has("set_viewport 0 0 64 32"));
    assert_eq!(ctx.projection(), texture_projection(64.0, 32.0));
    assert!(ctx.is_render_target_active());

    ctx.set_render_targets(RenderTargetSet::new()).unwrap();

    assert!(!ctx.is_render_target_active());
    assert_eq!(ctx.projection(), window_projection(800, 600));
    assert_eq!(ctx.device().bound_framebuffer(), FramebufferHandle::DEFAULT);
}

#[test]
fn test_backbuffer_when_already_on_backbuffer() {
    let mut ctx = context();
    ctx.set_render_targets_to_backbuffer().unwrap();
    assert!(ctx.device().commands.is_empty());
}

#[test]
fn test_srgb_toggled_for_srgb_targets() {
    let mut ctx = context();
    let target = create(&mut ctx, rt_desc(PixelFormat::Srgba8Unorm));

    ctx.set_render_targets(target_set(target)).unwrap();
    assert!(ctx.device().has("set_framebuffer_srgb true"));

    ctx.set_render_targets_to_backbuffer().unwrap();
    assert!(ctx.device().has("set_framebuffer_srgb false"));
}

// ============================================================================
// Tests: validation
// ============================================================================

#[test]
fn test_non_render_target_texture_rejected() {
    let mut ctx = context();
    let texture = create(&mut ctx, TextureDesc { render_target: false, ..rt_desc(PixelFormat::Rgba8Unorm) });

    let err = ctx.set_render_targets(target_set(texture)).unwrap_err();

    assert_eq!(err, Error::InvalidOperation("Texture must be created as a render target to be drawn to.".to_string()));
}

#[test]
fn test_rejected_set_leaves_pass_untouched() {
    let mut ctx = context();
    let small = render_target(&mut ctx, PixelFormat::Rgba8Unorm, 16, 16);
    let large = color_target(&mut ctx);
    queue_triangle(&mut ctx);
    ctx.device_mut().clear_commands();

    let targets = target_set(small).with_color(RenderTarget::new(large));
    let err = ctx.set_render_targets(targets).unwrap_err();

    assert_eq!(err, Error::InvalidOperation("All textures must have the same pixel dimensions.".to_string()));
    assert!(!ctx.batched_draws().is_empty());
    assert!(ctx.device().commands.iter().all(|c| !c.starts_with("bind_framebuffer")));
    assert!(!ctx.is_render_target_active());
}

#[test]
fn test_depth_format_as_color_rejected() {
    let mut ctx = context();
    let depth = render_target(&mut ctx, PixelFormat::Depth24Unorm, 64, 32);

    let err = ctx.set_render_targets(target_set(depth)).unwrap_err();

    assert_eq!(
        err,
        Error::InvalidOperation(
            "Depth/stencil format textures must be used as the depth/stencil target, not as a color target.".to_string()
        )
    );
}

#[test]
fn test_color_format_as_depth_stencil_rejected() {
    let mut ctx = context();
    let color = color_target(&mut ctx);
    let other = color_target(&mut ctx);

    let targets = target_set(color).with_depth_stencil(RenderTarget::new(other));
    let err = ctx.set_render_targets(targets).unwrap_err();

    assert_eq!(
        err,
        Error::InvalidOperation("Only depth/stencil format textures can be used as the depth/stencil target.".to_string())
    );
}

#[test]
fn test_mismatched_msaa_rejected() {
    let mut ctx = context();
    let single = color_target(&mut ctx);
    let multi = create(&mut ctx, TextureDesc { msaa: 4, ..rt_desc(PixelFormat::Rgba8Unorm) });

    let err = ctx.set_render_targets(target_set(single).with_color(RenderTarget::new(multi))).unwrap_err();
    assert_eq!(err, Error::InvalidOperation("All textures must have the same MSAA value.".to_string()));

    let depth = render_target(&mut ctx, PixelFormat::Depth24UnormStencil8, 64, 32);
    let err = ctx
        .set_render_targets(target_set(multi).with_depth_stencil(RenderTarget::new(depth)))
        .unwrap_err();
    assert_eq!(
        err,
        Error::InvalidOperation("All textures (including the depth/stencil texture) must have the same MSAA value.".to_string())
    );
}

#[test]
fn test_too_many_targets_unsupported() {
    let mut device = MockGraphicsDevice::new();
    device.limits.insert(Limit::RenderTargets, 1.0);
    let mut ctx = context_with(device, RenderConfig::default());
    let a = color_target(&mut ctx);
    let b = color_target(&mut ctx);

    let err = ctx.set_render_targets(target_set(a).with_color(RenderTarget::new(b))).unwrap_err();

    assert_eq!(err, Error::Unsupported("This system can't simultaneously render to 2 textures.".to_string()));
}

#[test]
fn test_invalid_mipmap_rejected() {
    let mut ctx = context();
    let target = color_target(&mut ctx);

    let err = ctx
        .set_render_targets(RenderTargetSet::new().with_color(RenderTarget::new(target).with_mipmap(1)))
        .unwrap_err();

    assert_eq!(err, Error::InvalidOperation("Invalid mipmap level 1.".to_string()));
}

#[test]
fn test_destroyed_texture_rejected() {
    let mut ctx = context();
    let target = color_target(&mut ctx);
    ctx.destroy_texture(target).unwrap();

    assert!(matches!(ctx.set_render_targets(target_set(target)), Err(Error::InvalidResource(_))));
}

// ============================================================================
// Tests: temporary depth/stencil
// ============================================================================

#[test]
fn test_temporary_depth_stencil_is_pooled() {
    let mut ctx = context();
    let target = color_target(&mut ctx);
    let targets = target_set(target).with_temporary(TemporaryTargetFlags::DEPTH | TemporaryTargetFlags::STENCIL);

    ctx.set_render_targets(targets.clone()).unwrap();
    assert_eq!(ctx.device().count("create_renderbuffer"), 1);
    assert!(ctx.device().commands.iter().any(|c| c.starts_with("create_renderbuffer") && c.contains("Depth24UnormStencil8")));

    ctx.set_render_targets_to_backbuffer().unwrap();
    ctx.set_render_targets(targets).unwrap();

    assert_eq!(ctx.device().count("create_renderbuffer"), 1);
    assert_eq!(ctx.temporary_textures().len(), 1);
}

#[test]
fn test_temporary_depth_only_format() {
    let mut ctx = context();
    let target = color_target(&mut ctx);

    ctx.set_render_targets(target_set(target).with_temporary(TemporaryTargetFlags::DEPTH)).unwrap();

    assert!(ctx.device().commands.iter().any(|c| c.starts_with("create_renderbuffer") && c.contains("Depth24Unorm ")));
}

#[test]
fn test_temporary_stencil_only_format() {
    let mut ctx = context();
    let target = color_target(&mut ctx);

    ctx.set_render_targets(target_set(target).with_temporary(TemporaryTargetFlags::STENCIL)).unwrap();

    assert!(ctx.device().commands.iter().any(|c| c.starts_with("create_renderbuffer") && c.contains("Stencil8")));
}

#[test]
fn test_temporary_depth_stencil_discarded_at_pass_end() {
    let mut ctx = context();
    let target = color_target(&mut ctx);
    ctx.set_render_targets(target_set(target).with_temporary(TemporaryTargetFlags::STENCIL)).unwrap();
    ctx.device_mut().clear_commands();

    ctx.end_pass().unwrap();

    assert!(ctx.device().has("invalidate_framebuffer All [Stencil, Depth]"));
}

#[test]
fn test_window_depth_stencil_discarded_at_pass_end() {
    let mut ctx = context();
    let target = color_target(&mut ctx);
    ctx.set_render_targets(target_set(target)).unwrap();
    ctx.set_render_targets_to_backbuffer().unwrap();
    ctx.device_mut().clear_commands();

    ctx.end_pass().unwrap();

    assert_eq!(
        &ctx.device().commands[..],
        &["invalidate_framebuffer All [DefaultStencil, DefaultDepth]".to_string()]
    );
}

#[test]
fn test_internal_backbuffer_depth_stencil_discarded_at_pass_end() {
    let config = RenderConfig {
        backbuffer_msaa: 4,
        ..RenderConfig::default()
    };
    let mut ctx = context_with(MockGraphicsDevice::new(), config);
    let target = color_target(&mut ctx);
    ctx.set_render_targets(target_set(target)).unwrap();
    ctx.device_mut().clear_commands();

    // Leaving the render target ends its pass; the next end ends the backbuffer's
    ctx.set_render_targets_to_backbuffer().unwrap();
    ctx.device_mut().clear_commands();
    ctx.end_pass().unwrap();

    assert!(ctx.device().has("invalidate_framebuffer All [Stencil, Depth]"));
    assert!(ctx.device().commands.iter().all(|c| !c.contains("DefaultDepth")));
}

// ============================================================================
// Tests: end_pass
// ============================================================================

#[test]
fn test_end_pass_runs_once() {
    let mut ctx = context();
    let target = create(&mut ctx, TextureDesc {
        mipmap_count: 3,
        mipmaps_mode: MipmapsMode::Auto,
        ..rt_desc(PixelFormat::Rgba8Unorm)
    });
    ctx.set_render_targets(target_set(target)).unwrap();

    ctx.end_pass().unwrap();
    ctx.end_pass().unwrap();

    assert_eq!(ctx.device().count("generate_mipmaps"), 1);
}

#[test]
fn test_no_auto_mipmaps_when_drawing_to_lower_level() {
    let mut ctx = context();
    let target = create(&mut ctx, TextureDesc {
        mipmap_count: 3,
        mipmaps_mode: MipmapsMode::Auto,
        ..rt_desc(PixelFormat::Rgba8Unorm)
    });
    ctx.set_render_targets(RenderTargetSet::new().with_color(RenderTarget::new(target).with_mipmap(1))).unwrap();

    ctx.end_pass().unwrap();

    assert!(!ctx.device().has("generate_mipmaps"));
}

#[test]
fn test_msaa_target_resolved_at_pass_end() {
    let mut ctx = context();
    let target = create(&mut ctx, TextureDesc { msaa: 4, ..rt_desc(PixelFormat::Rgba8Unorm) });
    let resolve = ctx.texture(target).unwrap().resolve_framebuffer().unwrap();
    ctx.set_render_targets(target_set(target)).unwrap();
    ctx.device_mut().clear_commands();

    ctx.set_render_targets_to_backbuffer().unwrap();

    assert!(ctx.device().has(&format!("bind_framebuffer Draw {}", resolve.0)));
    let blit = ctx.device().commands.iter().find(|c| c.starts_with("blit_framebuffer")).unwrap();
    assert!(blit.contains("64x32") && blit.contains("COLOR"));
}

#[test]
fn test_non_readable_msaa_target_not_resolved() {
    let mut ctx = context();
    let target = create(&mut ctx, TextureDesc {
        msaa: 4,
        readable: Some(false),
        ..rt_desc(PixelFormat::Rgba8Unorm)
    });
    ctx.set_render_targets(target_set(target)).unwrap();

    ctx.end_pass().unwrap();

    assert!(!ctx.device().has("blit_framebuffer"));
}

// ============================================================================
// Tests: clear
// ============================================================================

#[test]
fn test_depth_clear_forces_depth_write() {
    let mut ctx = context();

    ctx.clear(None, None, Some(1.0)).unwrap();

    assert_eq!(
        &ctx.device().commands[..],
        &[
            "set_depth_state Some(Always) write=true".to_string(),
            "clear color=false stencil=None depth=Some(1.0)".to_string(),
            "set_depth_state None write=false".to_string(),
        ]
    );
}

#[test]
fn test_clear_with_depth_write_enabled() {
    let mut ctx = context();
    ctx.set_depth_mode(CompareMode::Less, true).unwrap();
    ctx.device_mut().clear_commands();

    ctx.clear(Some(Colorf::WHITE), Some(0), Some(1.0)).unwrap();

    assert_eq!(&ctx.device().commands[..], &["clear color=true stencil=Some(0) depth=Some(1.0)".to_string()]);
}

#[test]
fn test_clear_nothing() {
    let mut ctx = context();
    queue_triangle(&mut ctx);

    ctx.clear(None, None, None).unwrap();

    assert!(ctx.device().commands.is_empty());
    assert!(!ctx.batched_draws().is_empty());
}

#[test]
fn test_clear_flushes_first() {
    let mut ctx = context();
    queue_triangle(&mut ctx);

    ctx.clear(Some(Colorf::TRANSPARENT_BLACK), None, None).unwrap();

    assert!(ctx.device().position("draw_arrays").unwrap() < ctx.device().position("clear").unwrap());
}

#[test]
fn test_clear_targets_per_attachment() {
    let mut ctx = context();
    let a = color_target(&mut ctx);
    let b = color_target(&mut ctx);
    ctx.set_render_targets(target_set(a).with_color(RenderTarget::new(b))).unwrap();
    ctx.device_mut().clear_commands();

    ctx.clear_targets(&[None, Some(Colorf::WHITE)], None, None).unwrap();

    assert_eq!(&ctx.device().commands[..], &["clear_color_attachment 1".to_string()]);
}

#[test]
fn test_clear_targets_without_clear_buffer() {
    let mut ctx = context_with(MockGraphicsDevice::with_driver(MockGraphicsDevice::es2_driver()), RenderConfig::default());
    let a = color_target(&mut ctx);
    let b = color_target(&mut ctx);
    ctx.set_render_targets(target_set(a).with_color(RenderTarget::new(b))).unwrap();
    ctx.device_mut().clear_commands();

    ctx.clear_targets(&[Some(Colorf::WHITE), Some(Colorf::WHITE)], None, Some(1.0)).unwrap();

    let commands = &ctx.device().commands;
    assert_eq!(commands[0], "set_draw_buffers [Color(0)]");
    assert_eq!(commands[1], "clear color=true stencil=None depth=None");
    assert_eq!(commands[2], "set_draw_buffers [Color(1)]");
    assert_eq!(commands[4], "set_draw_buffers [Color(0), Color(1)]");
    assert!(commands[5..].iter().any(|c| c == "clear color=false stencil=None depth=Some(1.0)"));
}

#[test]
fn test_clear_targets_single_target_uses_plain_clear() {
    let mut ctx = context();

    ctx.clear_targets(&[Some(Colorf::WHITE)], None, None).unwrap();

    assert_eq!(&ctx.device().commands[..], &["clear color=true stencil=None depth=None".to_string()]);
}

// ============================================================================
// Tests: discard
// ============================================================================

#[test]
fn test_discard_on_window_uses_default_names() {
    let mut ctx = context();

    ctx.discard(&[true], true).unwrap();

    assert_eq!(
        &ctx.device().commands[..],
        &["invalidate_framebuffer All [DefaultColor, DefaultStencil, DefaultDepth]".to_string()]
    );
}

#[test]
fn test_discard_on_render_target() {
    let mut ctx = context();
    let a = color_target(&mut ctx);
    let b = color_target(&mut ctx);
    ctx.set_render_targets(target_set(a).with_color(RenderTarget::new(b))).unwrap();
    ctx.device_mut().clear_commands();

    ctx.discard(&[false, true, true], false).unwrap();

    assert_eq!(&ctx.device().commands[..], &["invalidate_framebuffer All [Color(1)]".to_string()]);
}

#[test]
fn test_discard_without_invalidate_support() {
    let mut ctx = context_with(MockGraphicsDevice::with_driver(MockGraphicsDevice::es2_driver()), RenderConfig::default());

    ctx.discard(&[true], true).unwrap();

    assert!(ctx.device().commands.is_empty());
}
