/// Logical render state seen by the API consumer, and its save/restore stack

use crate::error::Result;
use crate::engine_bail;
use crate::graphics_device::{
    BlendState, ColorChannelMask, Colorf, CompareMode, CullMode, Rect, StencilAction, Winding,
};
use crate::target::RenderTargetSet;

/// Stencil write in progress (between `draw_to_stencil_buffer` and `stop_draw_to_stencil_buffer`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilWrite {
    pub action: StencilAction,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    /// Constant color multiplied into batched geometry
    pub color: Colorf,
    pub blend: BlendState,

    pub depth_compare: CompareMode,
    pub depth_write: bool,

    /// User-facing stencil test (not yet reversed)
    pub stencil_compare: CompareMode,
    pub stencil_test_value: i32,

    /// Scissor in DPI-scaled units, top-left origin
    pub scissor: Option<Rect>,
    pub color_mask: ColorChannelMask,
    pub point_size: f32,
    pub winding: Winding,
    pub cull_mode: CullMode,
    pub wireframe: bool,

    pub render_targets: RenderTargetSet,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            color: Colorf::WHITE,
            blend: BlendState::alpha(),
            depth_compare: CompareMode::Always,
            depth_write: false,
            stencil_compare: CompareMode::Always,
            stencil_test_value: 0,
            scissor: None,
            color_mask: ColorChannelMask::ALL,
            point_size: 1.0,
            winding: Winding::Ccw,
            cull_mode: CullMode::None,
            wireframe: false,
            render_targets: RenderTargetSet::default(),
        }
    }
}

/// Stack of display states; the top is authoritative
///
/// The bottom entry can never be popped.
#[derive(Debug)]
pub struct StateStack {
    states: Vec<DisplayState>,
    max_depth: usize,
}

impl StateStack {
    /// `max_depth` counts pushes on top of the bottom entry
    pub fn new(max_depth: usize) -> Self {
        Self {
            states: vec![DisplayState::default()],
            max_depth,
        }
    }

    pub fn top(&self) -> &DisplayState {
        // never empty: the bottom entry cannot be popped
        &self.states[self.states.len() - 1]
    }

    pub fn top_mut(&mut self) -> &mut DisplayState {
        let last = self.states.len() - 1;
        &mut self.states[last]
    }

    /// Entry that becomes the top after the next `pop`
    pub fn below_top(&self) -> Option<&DisplayState> {
        self.states.len().checked_sub(2).map(|i| &self.states[i])
    }

    /// Duplicate the top entry
    pub fn push(&mut self) -> Result<()> {
        if self.depth() >= self.max_depth {
            engine_bail!(@InvalidOperation, "lumen::StateStack",
                "Maximum stack depth reached (more pushes than pops?)");
        }
        let top = self.top().clone();
        self.states.push(top);
        Ok(())
    }

    /// Remove the top entry and return it
    pub fn pop(&mut self) -> Result<DisplayState> {
        if self.states.len() <= 1 {
            engine_bail!(@InvalidOperation, "lumen::StateStack",
                "Minimum stack depth reached (more pops than pushes?)");
        }
        match self.states.pop() {
            Some(state) => Ok(state),
            None => engine_bail!(@InvalidOperation, "lumen::StateStack", "State stack is empty"),
        }
    }

    /// Number of pushed entries above the bottom one
    /// Every entry, bottom first
    pub fn iter(&self) -> impl Iterator<Item = &DisplayState> {
        self.states.iter()
    }

    pub fn depth(&self) -> usize {
        self.states.len() - 1
    }

    /// Drop every pushed entry and reset the bottom one
    pub fn reset(&mut self) {
        self.states.clear();
        self.states.push(DisplayState::default());
    }
}

#[cfg(test)]
#[path = "display_state_tests.rs"]
mod tests;
