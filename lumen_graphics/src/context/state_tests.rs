/// Tests for display state setters and the state stack

use super::*;
use crate::config::RenderConfig;
use crate::context::test_support::{color_target, context, context_with, queue_triangle};
use crate::error::Error;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::draw::BatchedDrawCommand;
use crate::graphics_device::{BlendOperation, CommonFormat, FramebufferHandle, PixelFormat, PrimitiveType};
use crate::target::{RenderTarget, RenderTargetSet};

fn es2_context() -> RenderContext<MockGraphicsDevice> {
    context_with(MockGraphicsDevice::with_driver(MockGraphicsDevice::es2_driver()), RenderConfig::default())
}

fn min_blend() -> BlendState {
    BlendState {
        operation_rgb: BlendOperation::Min,
        ..BlendState::alpha()
    }
}

// ============================================================================
// Tests: color and blending
// ============================================================================

#[test]
fn test_set_color_clamps() {
    let mut ctx = context();
    ctx.set_color(Colorf::new(2.0, -1.0, 0.5, 1.0)).unwrap();

    assert_eq!(ctx.color(), Colorf::new(1.0, 0.0, 0.5, 1.0));
}

#[test]
fn test_set_color_draws_queued_geometry_with_previous_color() {
    let mut ctx = context();
    ctx.set_color(Colorf::new(1.0, 0.0, 0.0, 1.0)).unwrap();
    queue_triangle(&mut ctx);

    ctx.set_color(Colorf::new(0.0, 0.0, 1.0, 1.0)).unwrap();
    ctx.flush_batched_draws().unwrap();

    assert_eq!(ctx.device().draw_calls(), 1);
    let uniforms = ctx.device().uniform_uploads.last().unwrap();
    assert_eq!(uniforms.constant_color, glam::Vec4::new(1.0, 0.0, 0.0, 1.0));
}

#[test]
fn test_set_same_color_keeps_batch() {
    let mut ctx = context();
    queue_triangle(&mut ctx);

    ctx.set_color(Colorf::WHITE).unwrap();

    assert!(!ctx.batched_draws().is_empty());
    assert_eq!(ctx.device().draw_calls(), 0);
}

#[test]
fn test_set_color_keeps_batch_with_vertex_colors() {
    let mut ctx = context();
    let cmd = BatchedDrawCommand::new(PrimitiveType::Triangles, CommonFormat::XYf_STf_RGBAub, 3);
    ctx.request_batched_draw(&cmd).unwrap();

    ctx.set_color(Colorf::new(0.0, 1.0, 0.0, 1.0)).unwrap();

    assert_eq!(ctx.batched_draws().vertex_count(), 3);
    assert_eq!(ctx.device().draw_calls(), 0);
}

#[test]
fn test_set_blend_state_flushes_pending_batch_first() {
    let mut ctx = context();
    queue_triangle(&mut ctx);

    ctx.set_blend_state(BlendState::replace()).unwrap();

    let draw = ctx.device().position("draw_arrays").unwrap();
    let blend = ctx.device().position("set_blend_state").unwrap();
    assert!(draw < blend);
    assert_eq!(ctx.display_state().blend, BlendState::replace());
}

#[test]
fn test_set_same_blend_state_does_nothing() {
    let mut ctx = context();
    queue_triangle(&mut ctx);

    ctx.set_blend_state(BlendState::alpha()).unwrap();

    assert!(!ctx.batched_draws().is_empty());
    assert!(!ctx.device().has("set_blend_state"));
}

#[test]
fn test_min_max_blending_unsupported_on_es2() {
    let mut ctx = es2_context();

    let err = ctx.set_blend_state(min_blend()).unwrap_err();

    assert_eq!(
        err,
        Error::Unsupported("The 'min' and 'max' blend operations are not supported on this system.".to_string())
    );
    assert_eq!(ctx.display_state().blend, BlendState::alpha());
}

#[test]
fn test_min_max_blending_on_desktop() {
    let mut ctx = context();
    ctx.set_blend_state(min_blend()).unwrap();
    assert_eq!(ctx.display_state().blend, min_blend());
}

#[test]
fn test_color_mask_applied_and_stored() {
    let mut ctx = context();
    let mask = ColorChannelMask { r: true, g: false, b: true, a: false };

    ctx.set_color_mask(mask).unwrap();

    assert!(ctx.device().has("set_color_mask true false true false"));
    assert_eq!(ctx.display_state().color_mask, mask);
}

// ============================================================================
// Tests: depth and stencil
// ============================================================================

#[test]
fn test_depth_always_without_write_disables_test() {
    let mut ctx = context();

    ctx.set_depth_mode(CompareMode::Always, false).unwrap();
    ctx.set_depth_mode(CompareMode::Less, false).unwrap();
    ctx.set_depth_mode(CompareMode::Always, true).unwrap();

    assert_eq!(
        &ctx.device().commands[..],
        &[
            "set_depth_state None write=false".to_string(),
            "set_depth_state Some(Less) write=false".to_string(),
            "set_depth_state Some(Always) write=true".to_string(),
        ]
    );
}

#[test]
fn test_stencil_compare_is_reversed() {
    let mut ctx = context();

    ctx.set_stencil_test(CompareMode::Greater, 3).unwrap();
    assert!(ctx.device().has("set_stencil_state Less ref=3 action=Keep"));

    ctx.set_stencil_test(CompareMode::Always, 0).unwrap();
    assert_eq!(ctx.device().commands.last().unwrap(), "set_stencil_state off");
}

#[test]
fn test_draw_to_stencil_requires_window_stencil() {
    let config = RenderConfig {
        window_has_stencil: false,
        ..RenderConfig::default()
    };
    let mut ctx = context_with(MockGraphicsDevice::new(), config);

    let err = ctx.draw_to_stencil_buffer(StencilAction::Replace, 1).unwrap_err();

    assert!(matches!(err, Error::InvalidOperation(_)));
    assert!(!ctx.is_writing_to_stencil());
}

#[test]
fn test_draw_to_stencil_requires_stencil_on_render_target() {
    let mut ctx = context();
    let target = color_target(&mut ctx);
    ctx.set_render_targets(RenderTargetSet::new().with_color(RenderTarget::new(target))).unwrap();

    let err = ctx.draw_to_stencil_buffer(StencilAction::Replace, 1).unwrap_err();

    assert_eq!(
        err,
        Error::InvalidOperation(
            "Drawing to the stencil buffer with a render target active requires either stencil=true or a custom stencil-type texture to be used, in setRenderTarget.".to_string()
        )
    );
}

#[test]
fn test_draw_to_stencil_with_temporary_stencil() {
    let mut ctx = context();
    let target = color_target(&mut ctx);
    let targets = RenderTargetSet::new()
        .with_color(RenderTarget::new(target))
        .with_temporary(TemporaryTargetFlags::STENCIL);
    ctx.set_render_targets(targets).unwrap();

    ctx.draw_to_stencil_buffer(StencilAction::Increment, 2).unwrap();

    assert!(ctx.is_writing_to_stencil());
    assert!(ctx.device().has("set_color_mask false false false false"));
    assert!(ctx.device().has("set_stencil_state Always ref=2 action=Increment"));
}

#[test]
fn test_stencil_state_deferred_while_writing() {
    let mut ctx = context();
    ctx.draw_to_stencil_buffer(StencilAction::Replace, 1).unwrap();
    ctx.device_mut().clear_commands();

    let mask = ColorChannelMask { r: false, g: true, b: true, a: true };
    ctx.set_color_mask(mask).unwrap();
    ctx.set_stencil_test(CompareMode::Equal, 1).unwrap();
    assert!(!ctx.device().has("set_color_mask"));
    assert!(!ctx.device().has("set_stencil_state"));

    ctx.stop_draw_to_stencil_buffer().unwrap();

    assert!(!ctx.is_writing_to_stencil());
    assert!(ctx.device().has("set_color_mask false true true true"));
    assert!(ctx.device().has("set_stencil_state Equal ref=1 action=Keep"));
}

#[test]
fn test_stop_draw_to_stencil_when_not_writing() {
    let mut ctx = context();
    ctx.stop_draw_to_stencil_buffer().unwrap();
    assert!(ctx.device().commands.is_empty());
}

// ============================================================================
// Tests: scissor
// ============================================================================

#[test]
fn test_scissor_flipped_on_window() {
    let mut ctx = context();

    ctx.set_scissor(Some(Rect::new(10, 20, 100, 50))).unwrap();

    assert!(ctx.device().has("set_scissor 10 530 100 50"));
}

#[test]
fn test_scissor_scaled_by_window_dpi() {
    let mut ctx = context();
    ctx.set_viewport_size(400, 300, 800, 600).unwrap();
    ctx.device_mut().clear_commands();

    ctx.set_scissor(Some(Rect::new(10, 20, 100, 50))).unwrap();

    assert!(ctx.device().has("set_scissor 20 460 200 100"));
}

#[test]
fn test_scissor_not_flipped_on_render_target() {
    let mut ctx = context();
    let target = color_target(&mut ctx);
    ctx.set_render_targets(RenderTargetSet::new().with_color(RenderTarget::new(target))).unwrap();
    ctx.device_mut().clear_commands();

    ctx.set_scissor(Some(Rect::new(10, 20, 100, 50))).unwrap();

    assert!(ctx.device().has("set_scissor 10 20 100 50"));
}

#[test]
fn test_scissor_reapplied_on_target_switch() {
    let mut ctx = context();
    ctx.set_scissor(Some(Rect::new(0, 0, 10, 10))).unwrap();
    let target = color_target(&mut ctx);
    ctx.device_mut().clear_commands();

    ctx.set_render_targets(RenderTargetSet::new().with_color(RenderTarget::new(target))).unwrap();
    assert!(ctx.device().has("set_scissor 0 0 10 10"));

    ctx.set_render_targets_to_backbuffer().unwrap();
    assert!(ctx.device().has("set_scissor 0 590 10 10"));
}

#[test]
fn test_clearing_scissor() {
    let mut ctx = context();
    ctx.set_scissor(Some(Rect::new(0, 0, 10, 10))).unwrap();
    ctx.set_scissor(None).unwrap();

    assert_eq!(ctx.device().commands.last().unwrap(), "set_scissor off");
    assert_eq!(ctx.display_state().scissor, None);
}

// ============================================================================
// Tests: rasterizer
// ============================================================================

#[test]
fn test_front_face_flipped_for_render_targets() {
    let mut ctx = context();
    ctx.set_front_face_winding(Winding::Ccw).unwrap();
    assert_eq!(ctx.device().commands.last().unwrap(), "set_front_face Ccw");

    let target = color_target(&mut ctx);
    ctx.set_render_targets(RenderTargetSet::new().with_color(RenderTarget::new(target))).unwrap();
    ctx.device_mut().clear_commands();

    ctx.set_front_face_winding(Winding::Ccw).unwrap();
    assert_eq!(ctx.device().commands.last().unwrap(), "set_front_face Cw");
}

#[test]
fn test_cull_mode_is_stored_only() {
    let mut ctx = context();
    ctx.set_cull_mode(CullMode::Back);

    assert_eq!(ctx.display_state().cull_mode, CullMode::Back);
    assert!(ctx.device().commands.is_empty());
}

#[test]
fn test_point_size_change_flushes() {
    let mut ctx = context();
    queue_triangle(&mut ctx);

    ctx.set_point_size(4.0).unwrap();

    assert_eq!(ctx.device().draw_calls(), 1);
    assert_eq!(ctx.display_state().point_size, 4.0);
}

#[test]
fn test_wireframe_ignored_without_polygon_mode() {
    let mut ctx = es2_context();
    ctx.set_wireframe(true).unwrap();

    assert!(!ctx.device().has("set_wireframe"));
    assert!(!ctx.display_state().wireframe);
}

#[test]
fn test_wireframe_on_desktop() {
    let mut ctx = context();
    ctx.set_wireframe(true).unwrap();

    assert!(ctx.device().has("set_wireframe true"));
    assert!(ctx.display_state().wireframe);
}

// ============================================================================
// Tests: push / pop
// ============================================================================

#[test]
fn test_state_guard_restores_on_drop() {
    let mut ctx = context();
    {
        let mut guard = ctx.push_state().unwrap();
        guard.set_blend_state(BlendState::replace()).unwrap();
        guard.set_color(Colorf::new(1.0, 0.0, 0.0, 1.0)).unwrap();
        assert_eq!(guard.state_depth(), 1);
    }

    assert_eq!(ctx.state_depth(), 0);
    assert_eq!(ctx.display_state().blend, BlendState::alpha());
    assert_eq!(ctx.color(), Colorf::WHITE);
}

#[test]
fn test_pop_only_reapplies_changed_fields() {
    let mut ctx = context();
    ctx.push().unwrap();
    ctx.set_color(Colorf::new(0.5, 0.5, 0.5, 1.0)).unwrap();

    ctx.pop().unwrap();

    assert!(!ctx.device().has("set_blend_state"));
    assert!(!ctx.device().has("bind_framebuffer"));
    assert!(!ctx.device().has("set_scissor"));
}

/// Push over a render target, go to the backbuffer, then make the saved
/// target's framebuffer impossible to rebuild
fn push_over_unrestorable_target(ctx: &mut RenderContext<MockGraphicsDevice>) {
    let target = color_target(ctx);
    ctx.set_render_targets(RenderTargetSet::new().with_color(RenderTarget::new(target))).unwrap();
    ctx.push().unwrap();
    ctx.set_render_targets_to_backbuffer().unwrap();

    ctx.target_cache.clear(&mut ctx.device);
    ctx.device.unsupported_render_formats.insert(PixelFormat::Rgba8Unorm);
}

#[test]
fn test_pop_unwinds_when_restore_fails() {
    let mut ctx = context();
    push_over_unrestorable_target(&mut ctx);

    let result = ctx.pop();

    assert!(result.is_err());
    assert_eq!(ctx.state_depth(), 0);
}

#[test]
fn test_state_guard_unwinds_when_restore_fails() {
    let mut ctx = context();
    let target = color_target(&mut ctx);
    ctx.set_render_targets(RenderTargetSet::new().with_color(RenderTarget::new(target))).unwrap();
    {
        let mut guard = ctx.push_state().unwrap();
        guard.set_render_targets_to_backbuffer().unwrap();
        let inner: &mut RenderContext<MockGraphicsDevice> = &mut guard;
        inner.target_cache.clear(&mut inner.device);
        inner.device.unsupported_render_formats.insert(PixelFormat::Rgba8Unorm);
        assert_eq!(inner.state_depth(), 1);
    }

    assert_eq!(ctx.state_depth(), 0);
    // The stack stays usable
    ctx.push().unwrap();
    assert_eq!(ctx.state_depth(), 1);
}

#[test]
fn test_pop_without_push_fails() {
    let mut ctx = context();
    let err = ctx.pop().unwrap_err();

    assert_eq!(err, Error::InvalidOperation("Minimum stack depth reached (more pops than pushes?)".to_string()));
}

#[test]
fn test_push_beyond_max_depth_fails() {
    let config = RenderConfig {
        max_state_stack_depth: 2,
        ..RenderConfig::default()
    };
    let mut ctx = context_with(MockGraphicsDevice::new(), config);

    ctx.push().unwrap();
    ctx.push().unwrap();

    assert!(matches!(ctx.push(), Err(Error::InvalidOperation(_))));
    assert_eq!(ctx.state_depth(), 2);
}

#[test]
fn test_pop_restores_render_targets() {
    let mut ctx = context();
    let target = color_target(&mut ctx);

    ctx.push().unwrap();
    ctx.set_render_targets(RenderTargetSet::new().with_color(RenderTarget::new(target))).unwrap();
    ctx.set_scissor(Some(Rect::new(0, 0, 4, 4))).unwrap();
    assert!(ctx.is_render_target_active());

    ctx.pop().unwrap();

    assert!(!ctx.is_render_target_active());
    assert_eq!(ctx.device().bound_framebuffer(), FramebufferHandle::DEFAULT);
    assert_eq!(ctx.device().commands.last().unwrap(), "set_scissor off");
}
