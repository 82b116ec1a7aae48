//! Render targets and the framebuffer object cache
//!
//! A `RenderTargetSet` describes where a pass draws. The `TargetCache`
//! turns its structural key into a validated device framebuffer and is the
//! only owner of cached framebuffer handles.

mod render_target;
mod target_cache;

pub use render_target::{FramebufferKey, RenderTarget, RenderTargetSet, TemporaryTargetFlags};
pub use target_cache::TargetCache;
