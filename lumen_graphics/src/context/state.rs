/// Display state setters and the push/pop stack
///
/// Every setter that changes rendered output flushes pending batched draws
/// before the stored value changes, so queued geometry is drawn with the
/// state it was submitted under.

use std::ops::{Deref, DerefMut};

use crate::capabilities::Feature;
use crate::draw::DisplayState;
use crate::error::Result;
use crate::graphics_device::{
    BlendState, ColorChannelMask, Colorf, CompareMode, CullMode, GraphicsDevice, Rect,
    StencilAction, StencilState, Winding,
};
use crate::target::TemporaryTargetFlags;
use crate::{engine_bail, engine_error};
use super::render_context::{RenderContext, SOURCE};

impl<D: GraphicsDevice> RenderContext<D> {
    pub fn display_state(&self) -> &DisplayState {
        self.states.top()
    }

    pub fn is_render_target_active(&self) -> bool {
        !self.states.top().render_targets.is_backbuffer()
    }

    /// DPI scale of whatever is being drawn to
    pub fn current_dpi_scale(&self) -> f32 {
        self.states
            .top()
            .render_targets
            .first_target()
            .and_then(|rt| self.resources.texture(rt.texture))
            .map(|texture| texture.dpi_scale())
            .unwrap_or_else(|| self.surface.dpi_scale())
    }

    // ===== COLOR =====

    /// Constant color of subsequent draws
    ///
    /// A pending batch without vertex colors takes the color current when it
    /// is flushed, so it is drawn before the color changes.
    pub fn set_color(&mut self, color: Colorf) -> Result<()> {
        let color = color.clamped();
        if color != self.states.top().color && !self.batched.has_vertex_colors() {
            self.flush_batched_draws()?;
        }
        self.states.top_mut().color = color;
        Ok(())
    }

    pub fn color(&self) -> Colorf {
        self.states.top().color
    }

    pub fn set_color_mask(&mut self, mask: ColorChannelMask) -> Result<()> {
        self.flush_batched_draws()?;
        self.states.top_mut().color_mask = mask;

        // Colors stay masked off while the stencil buffer is written
        if !self.writing_to_stencil {
            self.device.set_color_mask(mask);
        }
        Ok(())
    }

    // ===== BLENDING =====

    pub fn set_blend_state(&mut self, blend: BlendState) -> Result<()> {
        if blend == self.states.top().blend {
            return Ok(());
        }

        if blend.uses_min_max() && !self.capabilities.feature(Feature::BlendMinMax) {
            engine_bail!(@Unsupported, SOURCE,
                "The 'min' and 'max' blend operations are not supported on this system.");
        }

        self.flush_batched_draws()?;
        self.device.set_blend_state(&blend);
        self.states.top_mut().blend = blend;
        Ok(())
    }

    // ===== DEPTH / STENCIL =====

    /// The depth test is enabled when it can reject fragments or depth is written
    pub fn set_depth_mode(&mut self, compare: CompareMode, write: bool) -> Result<()> {
        let top = self.states.top();
        if top.depth_compare != compare || top.depth_write != write {
            self.flush_batched_draws()?;
        }

        let state = self.states.top_mut();
        state.depth_compare = compare;
        state.depth_write = write;
        self.apply_depth_mode(compare, write);
        Ok(())
    }

    fn apply_depth_mode(&mut self, compare: CompareMode, write: bool) {
        let enable = compare != CompareMode::Always || write;
        self.device.set_depth_state(enable.then_some(compare), write);
    }

    /// Compare the stencil buffer against `value`; `Always` disables the test
    ///
    /// While the stencil buffer is being written the test is only recorded.
    pub fn set_stencil_test(&mut self, compare: CompareMode, value: i32) -> Result<()> {
        let top = self.states.top();
        if top.stencil_compare != compare || top.stencil_test_value != value {
            self.flush_batched_draws()?;
        }

        let state = self.states.top_mut();
        state.stencil_compare = compare;
        state.stencil_test_value = value;

        if self.writing_to_stencil {
            return Ok(());
        }
        self.apply_stencil_test(compare, value);
        Ok(())
    }

    fn apply_stencil_test(&mut self, compare: CompareMode, value: i32) {
        if compare == CompareMode::Always {
            self.device.set_stencil_state(None);
            return;
        }

        // The stencil value is the reference, so the user's comparison is mirrored
        self.device.set_stencil_state(Some(StencilState {
            compare: compare.reversed(),
            reference: value,
            read_mask: u32::MAX,
            write_mask: u32::MAX,
            pass_action: StencilAction::Keep,
        }));
    }

    pub fn is_writing_to_stencil(&self) -> bool {
        self.writing_to_stencil
    }

    /// Write `action` with `value` into the stencil buffer for subsequent draws
    pub fn draw_to_stencil_buffer(&mut self, action: StencilAction, value: i32) -> Result<()> {
        let targets = &self.states.top().render_targets;

        if targets.is_backbuffer() {
            if !self.config.window_has_stencil {
                engine_bail!(@InvalidOperation, SOURCE,
                    "The window must have stenciling enabled to draw to the main screen's stencil buffer.");
            }
        } else {
            let has_stencil = targets.temporary_flags.contains(TemporaryTargetFlags::STENCIL)
                || targets
                    .depth_stencil
                    .and_then(|rt| self.resources.texture(rt.texture))
                    .map(|texture| texture.format().is_stencil())
                    .unwrap_or(false);
            if !has_stencil {
                engine_bail!(@InvalidOperation, SOURCE,
                    "Drawing to the stencil buffer with a render target active requires either stencil=true or a custom stencil-type texture to be used, in setRenderTarget.");
            }
        }

        self.flush_batched_draws()?;
        self.writing_to_stencil = true;

        self.device.set_color_mask(ColorChannelMask::NONE);
        self.device.set_stencil_state(Some(StencilState {
            compare: CompareMode::Always,
            reference: value,
            read_mask: u32::MAX,
            write_mask: u32::MAX,
            pass_action: action,
        }));
        Ok(())
    }

    pub fn stop_draw_to_stencil_buffer(&mut self) -> Result<()> {
        if !self.writing_to_stencil {
            return Ok(());
        }

        self.flush_batched_draws()?;
        self.writing_to_stencil = false;

        let state = self.states.top();
        let (mask, compare, value) = (state.color_mask, state.stencil_compare, state.stencil_test_value);
        self.device.set_color_mask(mask);
        self.apply_stencil_test(compare, value);
        Ok(())
    }

    // ===== SCISSOR =====

    /// Clip drawing to `rect` (DPI-scaled units, top-left origin), or stop clipping
    pub fn set_scissor(&mut self, rect: Option<Rect>) -> Result<()> {
        match rect {
            Some(rect) => {
                self.flush_batched_draws()?;
                self.states.top_mut().scissor = Some(rect);
            }
            None => {
                if self.states.top().scissor.is_some() {
                    self.flush_batched_draws()?;
                }
                self.states.top_mut().scissor = None;
            }
        }
        self.reapply_scissor()
    }

    /// Push the stored scissor to the device for the current target
    pub(super) fn reapply_scissor(&mut self) -> Result<()> {
        let rect = match self.states.top().scissor {
            Some(rect) => rect,
            None => {
                self.device.set_scissor(None);
                return Ok(());
            }
        };

        let dpi = self.current_dpi_scale();
        let scale = |v: i32| (v as f32 * dpi).round() as i32;
        let mut device_rect = Rect::new(scale(rect.x), scale(rect.y), scale(rect.w), scale(rect.h));

        // The window's origin is bottom-left, textures are drawn y-up already
        if !self.is_render_target_active() {
            device_rect.y = self.surface.pixel_height as i32 - (device_rect.y + device_rect.h);
        }

        self.device.set_scissor(Some(device_rect));
        Ok(())
    }

    // ===== RASTERIZER =====

    pub fn set_point_size(&mut self, size: f32) -> Result<()> {
        if size != self.states.top().point_size {
            self.flush_batched_draws()?;
        }
        self.states.top_mut().point_size = size;
        Ok(())
    }

    pub fn set_front_face_winding(&mut self, winding: Winding) -> Result<()> {
        if winding != self.states.top().winding {
            self.flush_batched_draws()?;
        }
        self.states.top_mut().winding = winding;
        self.apply_front_face();
        Ok(())
    }

    /// Texture targets are drawn with a flipped projection, so the winding flips too
    pub(super) fn apply_front_face(&mut self) {
        let winding = self.states.top().winding;
        let winding = if self.is_render_target_active() { winding.flipped() } else { winding };
        self.device.set_front_face(winding);
    }

    /// Culling used by mesh draws; batched draws never cull
    pub fn set_cull_mode(&mut self, mode: CullMode) {
        self.states.top_mut().cull_mode = mode;
    }

    /// Ignored on embedded profiles, which have no polygon mode
    pub fn set_wireframe(&mut self, enable: bool) -> Result<()> {
        if !self.capabilities.paths.wireframe {
            return Ok(());
        }

        self.flush_batched_draws()?;
        self.states.top_mut().wireframe = enable;
        self.device.set_wireframe(enable);
        Ok(())
    }

    // ===== STACK =====

    /// Save the display state; the guard restores it when dropped
    pub fn push_state(&mut self) -> Result<StateGuard<'_, D>> {
        self.push()?;
        Ok(StateGuard { context: self })
    }

    pub fn push(&mut self) -> Result<()> {
        self.states.push()
    }

    /// Restore the state saved by the matching `push`
    ///
    /// The entry is popped even when re-applying the saved state fails.
    pub fn pop(&mut self) -> Result<()> {
        let target = match self.states.below_top() {
            Some(state) => state.clone(),
            None => engine_bail!(@InvalidOperation, SOURCE,
                "Minimum stack depth reached (more pops than pushes?)"),
        };

        let restored = self.restore_state_checked(&target);
        self.states.pop()?;
        restored
    }

    pub fn state_depth(&self) -> usize {
        self.states.depth()
    }

    /// Apply every field of `state` to the device, changed or not
    pub(super) fn restore_state(&mut self, state: &DisplayState) -> Result<()> {
        self.flush_batched_draws()?;
        self.end_pass()?;

        *self.states.top_mut() = state.clone();
        self.bind_render_targets(state.render_targets.clone())?;

        self.device.set_blend_state(&state.blend);
        self.apply_depth_mode(state.depth_compare, state.depth_write);
        self.writing_to_stencil = false;
        self.device.set_color_mask(state.color_mask);
        self.apply_stencil_test(state.stencil_compare, state.stencil_test_value);
        if self.capabilities.paths.wireframe {
            self.device.set_wireframe(state.wireframe);
        }
        Ok(())
    }

    /// Apply only the fields of `state` that differ from the current state
    fn restore_state_checked(&mut self, state: &DisplayState) -> Result<()> {
        let current = self.states.top().clone();

        self.set_color(state.color)?;

        if state.blend != current.blend {
            self.set_blend_state(state.blend)?;
        }
        self.set_depth_mode(state.depth_compare, state.depth_write)?;
        if (state.stencil_compare, state.stencil_test_value) != (current.stencil_compare, current.stencil_test_value) {
            self.set_stencil_test(state.stencil_compare, state.stencil_test_value)?;
        }
        if state.color_mask != current.color_mask {
            self.set_color_mask(state.color_mask)?;
        }
        self.set_point_size(state.point_size)?;
        self.set_cull_mode(state.cull_mode);
        if state.wireframe != current.wireframe {
            self.set_wireframe(state.wireframe)?;
        }

        if state.render_targets != current.render_targets {
            self.set_render_targets(state.render_targets.clone())?;
        }

        // Both depend on the render target being restored first
        if state.winding != current.winding {
            self.set_front_face_winding(state.winding)?;
        }
        if state.scissor != self.states.top().scissor {
            self.set_scissor(state.scissor)?;
        }
        Ok(())
    }
}

// ============================================================================
// StateGuard
// ============================================================================

/// Scope of a pushed display state
///
/// Dereferences to the context. Dropping the guard pops the state and
/// re-applies whatever it changed, on every exit path.
pub struct StateGuard<'a, D: GraphicsDevice> {
    context: &'a mut RenderContext<D>,
}

impl<D: GraphicsDevice> Deref for StateGuard<'_, D> {
    type Target = RenderContext<D>;

    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl<D: GraphicsDevice> DerefMut for StateGuard<'_, D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context
    }
}

impl<D: GraphicsDevice> Drop for StateGuard<'_, D> {
    fn drop(&mut self) {
        if let Err(e) = self.context.pop() {
            engine_error!(SOURCE, "Failed to restore display state: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
