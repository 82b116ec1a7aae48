/// Render target descriptions and the structural framebuffer cache key

use bitflags::bitflags;
use crate::resource::TextureId;

/// One attachment: a texture, the mip level drawn to, and the slice
/// (cube face, array layer or volume depth)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTarget {
    pub texture: TextureId,
    pub mipmap: u32,
    pub slice: u32,
}

impl RenderTarget {
    pub fn new(texture: TextureId) -> Self {
        Self { texture, mipmap: 0, slice: 0 }
    }

    pub fn with_mipmap(mut self, mipmap: u32) -> Self {
        self.mipmap = mipmap;
        self
    }

    pub fn with_slice(mut self, slice: u32) -> Self {
        self.slice = slice;
        self
    }
}

bitflags! {
    /// Attachments the engine should allocate itself for a pass
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TemporaryTargetFlags: u32 {
        const DEPTH   = 1 << 0;
        const STENCIL = 1 << 1;
    }
}

/// Color attachments plus optional depth/stencil, as requested by the caller
///
/// An empty set (no colors, no depth/stencil) means the backbuffer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderTargetSet {
    pub colors: Vec<RenderTarget>,
    pub depth_stencil: Option<RenderTarget>,
    pub temporary_flags: TemporaryTargetFlags,
}

impl RenderTargetSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color(mut self, target: RenderTarget) -> Self {
        self.colors.push(target);
        self
    }

    pub fn with_depth_stencil(mut self, target: RenderTarget) -> Self {
        self.depth_stencil = Some(target);
        self
    }

    pub fn with_temporary(mut self, flags: TemporaryTargetFlags) -> Self {
        self.temporary_flags |= flags;
        self
    }

    pub fn is_backbuffer(&self) -> bool {
        self.colors.is_empty() && self.depth_stencil.is_none()
    }

    /// Whether any attachment of the set is `texture`
    pub fn references(&self, texture: TextureId) -> bool {
        self.colors.iter().chain(self.depth_stencil.iter()).any(|rt| rt.texture == texture)
    }

    /// First color target, or the depth/stencil target for depth-only passes
    pub fn first_target(&self) -> Option<RenderTarget> {
        self.colors.first().copied().or(self.depth_stencil)
    }

    /// Cache key; temporary flags are not part of it because the temporary
    /// depth/stencil is resolved into `depth_stencil` before binding
    pub fn cache_key(&self) -> FramebufferKey {
        FramebufferKey {
            colors: self.colors.clone(),
            depth_stencil: self.depth_stencil,
        }
    }
}

/// Structural identity of a framebuffer's attachment set
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FramebufferKey {
    pub colors: Vec<RenderTarget>,
    pub depth_stencil: Option<RenderTarget>,
}

impl FramebufferKey {
    /// Every texture referenced by the key (duplicates possible)
    pub fn textures(&self) -> impl Iterator<Item = TextureId> + '_ {
        self.colors
            .iter()
            .chain(self.depth_stencil.iter())
            .map(|rt| rt.texture)
    }
}
