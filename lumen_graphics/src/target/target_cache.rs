/// Framebuffer object cache keyed by attachment sets
///
/// Entries only exist for framebuffers that were complete when created.
/// A secondary index maps each texture to the keys that reference it, so
/// destroying a texture evicts exactly the framebuffers it is attached to.

use rustc_hash::{FxHashMap, FxHashSet};
use crate::error::Result;
use crate::{engine_bail, engine_debug};
use crate::graphics_device::{
    Attachment, AttachmentLayer, FramebufferHandle, FramebufferStatus, FramebufferTarget,
    GraphicsDevice, TextureType,
};
use crate::resource::texture::attachment_for;
use crate::resource::{RenderAttachment, ResourceManager, TextureId};
use super::render_target::{FramebufferKey, RenderTarget};

#[derive(Debug, Default)]
pub struct TargetCache {
    framebuffers: FxHashMap<FramebufferKey, FramebufferHandle>,
    by_texture: FxHashMap<TextureId, FxHashSet<FramebufferKey>>,
    created: u64,
}

impl TargetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the framebuffer for `key`, creating and validating it on a miss
    ///
    /// # Errors
    ///
    /// `InvalidResource` if a texture id is stale or unloaded,
    /// `FramebufferIncomplete` with the driver status if validation fails.
    /// Nothing is cached on error and the half-built framebuffer is deleted.
    pub fn bind<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        textures: &ResourceManager,
        key: &FramebufferKey,
    ) -> Result<FramebufferHandle> {
        if let Some(&framebuffer) = self.framebuffers.get(key) {
            device.bind_framebuffer(FramebufferTarget::All, framebuffer);
            return Ok(framebuffer);
        }

        let framebuffer = self.create(device, textures, key)?;

        self.framebuffers.insert(key.clone(), framebuffer);
        for texture in key.textures() {
            self.by_texture.entry(texture).or_default().insert(key.clone());
        }
        self.created += 1;

        Ok(framebuffer)
    }

    fn create<D: GraphicsDevice + ?Sized>(
        &self,
        device: &mut D,
        textures: &ResourceManager,
        key: &FramebufferKey,
    ) -> Result<FramebufferHandle> {
        // Resolve everything before touching the device
        let mut colors = Vec::with_capacity(key.colors.len());
        for (i, target) in key.colors.iter().enumerate() {
            colors.push(resolve(textures, target, i as u32)?);
        }
        let depth_stencil = match &key.depth_stencil {
            Some(target) => Some(resolve(textures, target, 0)?),
            None => None,
        };

        let framebuffer = device.create_framebuffer()?;
        device.bind_framebuffer(FramebufferTarget::All, framebuffer);

        for resolved in colors.iter().chain(depth_stencil.iter()) {
            resolved.attach(device);
        }

        if colors.len() > 1 {
            let buffers: Vec<Attachment> = (0..colors.len() as u32).map(Attachment::Color).collect();
            device.set_draw_buffers(&buffers);
        } else if colors.is_empty() && depth_stencil.is_some() {
            device.set_draw_buffers(&[]);
            device.set_read_buffer(None);
        }

        if let FramebufferStatus::Incomplete(reason) = device.check_framebuffer_status() {
            device.delete_framebuffer(framebuffer);
            engine_bail!(@FramebufferIncomplete, "lumen::TargetCache", "{}", reason);
        }

        engine_debug!("lumen::TargetCache",
            "Created framebuffer {} ({} color, depth/stencil: {})",
            framebuffer.0, colors.len(), depth_stencil.is_some());

        Ok(framebuffer)
    }

    /// Cached framebuffer for `key` without binding it
    pub fn get(&self, key: &FramebufferKey) -> Option<FramebufferHandle> {
        self.framebuffers.get(key).copied()
    }

    /// Delete every framebuffer that references `texture`; returns how many
    pub fn invalidate<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, texture: TextureId) -> usize {
        let keys = match self.by_texture.remove(&texture) {
            Some(keys) => keys,
            None => return 0,
        };

        let mut removed = 0;
        for key in keys {
            if let Some(framebuffer) = self.framebuffers.remove(&key) {
                device.delete_framebuffer(framebuffer);
                removed += 1;
            }
            for other in key.textures() {
                if other == texture {
                    continue;
                }
                if let Some(set) = self.by_texture.get_mut(&other) {
                    set.remove(&key);
                    if set.is_empty() {
                        self.by_texture.remove(&other);
                    }
                }
            }
        }
        removed
    }

    /// Delete every cached framebuffer
    pub fn clear<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D) {
        for (_, framebuffer) in self.framebuffers.drain() {
            device.delete_framebuffer(framebuffer);
        }
        self.by_texture.clear();
    }

    pub fn len(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.framebuffers.is_empty()
    }

    /// Framebuffers created since the cache was made
    pub fn creation_count(&self) -> u64 {
        self.created
    }
}

struct ResolvedAttachment {
    attachment: Attachment,
    texture_type: TextureType,
    target: RenderAttachment,
    mipmap: u32,
    layer: AttachmentLayer,
}

impl ResolvedAttachment {
    fn attach<D: GraphicsDevice + ?Sized>(&self, device: &mut D) {
        match self.target {
            RenderAttachment::Renderbuffer(renderbuffer) => {
                device.attach_renderbuffer(self.attachment, renderbuffer)
            }
            RenderAttachment::Texture(texture) => device.attach_texture(
                self.attachment,
                self.texture_type,
                texture,
                self.mipmap,
                self.layer,
            ),
        }
    }
}

fn resolve(textures: &ResourceManager, target: &RenderTarget, color_index: u32) -> Result<ResolvedAttachment> {
    let texture = match textures.texture(target.texture) {
        Some(texture) => texture,
        None => engine_bail!(@InvalidResource, "lumen::TargetCache",
            "Render target texture {:?} does not exist", target.texture),
    };
    let render_attachment = match texture.render_attachment() {
        Some(render_attachment) => render_attachment,
        None => engine_bail!(@InvalidResource, "lumen::TargetCache",
            "Render target texture {:?} is not loaded", target.texture),
    };

    let texture_type = texture.texture_type();
    let layer = match texture_type {
        TextureType::Tex2D => AttachmentLayer::None,
        TextureType::Cube => AttachmentLayer::Face(target.slice),
        TextureType::Array2D | TextureType::Volume => AttachmentLayer::Layer(target.slice),
    };

    Ok(ResolvedAttachment {
        attachment: attachment_for(texture.format(), color_index),
        texture_type,
        target: render_attachment,
        mipmap: target.mipmap,
        layer,
    })
}

#[cfg(test)]
#[path = "target_cache_tests.rs"]
mod tests;
