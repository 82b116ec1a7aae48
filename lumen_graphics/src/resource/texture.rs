/// Texture resource: device storage plus everything needed to rebuild it.
///
/// A texture owns up to three device objects:
/// - a sampleable texture when it is readable
/// - a renderbuffer when it is a render target that is multisampled or not readable
/// - a resolve framebuffer (texture attached) when it is both multisampled and readable
///
/// Initial pixel data is retained so the texture survives a context reset
/// through the volatile registry.

use crate::error::{Error, Result};
use crate::graphics_device::{
    Attachment, AttachmentKind, AttachmentLayer, FramebufferHandle, FramebufferStatus,
    FramebufferTarget, GraphicsDevice, MipmapsMode, PixelFormat, RenderbufferHandle,
    TextureDesc, TextureHandle, TextureType,
};

#[derive(Debug)]
pub struct Texture {
    desc: TextureDesc,
    initial_data: Option<Vec<u8>>,
    handle: Option<TextureHandle>,
    renderbuffer: Option<RenderbufferHandle>,
    resolve_framebuffer: Option<FramebufferHandle>,
}

impl Texture {
    /// Create an unloaded texture. `desc.format` must be a sized format.
    pub fn new(mut desc: TextureDesc, initial_data: Option<Vec<u8>>) -> Self {
        desc.readable = Some(desc.is_readable());
        desc.msaa = desc.msaa.max(1);
        desc.mipmap_count = desc.mipmap_count.max(1);
        Self {
            desc,
            initial_data,
            handle: None,
            renderbuffer: None,
            resolve_framebuffer: None,
        }
    }

    // ===== DEVICE LIFETIME =====

    /// Create the device objects. Loading an already loaded texture is a no-op.
    ///
    /// On failure every object created so far is deleted again.
    pub fn load<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D) -> Result<()> {
        if self.is_loaded() {
            return Ok(());
        }

        let readable = self.is_readable();
        let renderbuffer = if self.desc.render_target && (self.desc.msaa > 1 || !readable) {
            Some(device.create_renderbuffer(
                self.desc.format,
                self.desc.width,
                self.desc.height,
                self.desc.msaa,
            )?)
        } else {
            None
        };

        let release = |device: &mut D, texture: Option<TextureHandle>| {
            if let Some(texture) = texture {
                device.delete_texture(texture);
            }
            if let Some(renderbuffer) = renderbuffer {
                device.delete_renderbuffer(renderbuffer);
            }
        };

        let mut handle = None;
        if readable {
            match device.create_texture(&self.desc, self.initial_data.as_deref()) {
                Ok(texture) => handle = Some(texture),
                Err(e) => {
                    release(device, None);
                    return Err(e);
                }
            }
        }

        if let (Some(texture), Some(_)) = (handle, renderbuffer) {
            match create_resolve_framebuffer(device, &self.desc, texture) {
                Ok(fb) => self.resolve_framebuffer = Some(fb),
                Err(e) => {
                    release(device, handle);
                    return Err(e);
                }
            }
        }

        if let Some(texture) = handle {
            if self.desc.mipmaps_mode == MipmapsMode::Auto && self.initial_data.is_some() {
                device.generate_mipmaps(texture, self.desc.texture_type);
            }
        }

        self.handle = handle;
        self.renderbuffer = renderbuffer;
        Ok(())
    }

    /// Delete every device object; the description and initial data stay
    pub fn unload<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D) {
        if let Some(fb) = self.resolve_framebuffer.take() {
            device.delete_framebuffer(fb);
        }
        if let Some(texture) = self.handle.take() {
            device.delete_texture(texture);
        }
        if let Some(renderbuffer) = self.renderbuffer.take() {
            device.delete_renderbuffer(renderbuffer);
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.handle.is_some() || self.renderbuffer.is_some()
    }

    // ===== ACCESSORS =====

    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    pub fn handle(&self) -> Option<TextureHandle> {
        self.handle
    }

    pub fn renderbuffer(&self) -> Option<RenderbufferHandle> {
        self.renderbuffer
    }

    /// Destination framebuffer of a multisample resolve
    pub fn resolve_framebuffer(&self) -> Option<FramebufferHandle> {
        self.resolve_framebuffer
    }

    pub fn format(&self) -> PixelFormat {
        self.desc.format
    }

    pub fn texture_type(&self) -> TextureType {
        self.desc.texture_type
    }

    pub fn msaa(&self) -> u32 {
        self.desc.msaa
    }

    pub fn is_render_target(&self) -> bool {
        self.desc.render_target
    }

    pub fn is_readable(&self) -> bool {
        self.desc.is_readable()
    }

    pub fn mipmaps_mode(&self) -> MipmapsMode {
        self.desc.mipmaps_mode
    }

    pub fn mipmap_count(&self) -> u32 {
        self.desc.mipmap_count
    }

    pub fn slice_count(&self) -> u32 {
        self.desc.slice_count()
    }

    pub fn dpi_scale(&self) -> f32 {
        self.desc.dpi_scale
    }

    pub fn pixel_width(&self, mipmap: u32) -> u32 {
        (self.desc.width >> mipmap).max(1)
    }

    pub fn pixel_height(&self, mipmap: u32) -> u32 {
        (self.desc.height >> mipmap).max(1)
    }

    /// Approximate device memory used by every mip level and sample
    pub fn memory_size(&self) -> usize {
        let bpp = self.desc.format.bytes_per_pixel();
        let slices = self.slice_count() as usize;
        let samples = self.desc.msaa as usize;
        (0..self.desc.mipmap_count)
            .map(|mip| self.pixel_width(mip) as usize * self.pixel_height(mip) as usize)
            .sum::<usize>()
            * bpp
            * slices
            * samples
    }

    /// Which texture is sampled/attached: the renderbuffer, when present, is
    /// what gets drawn to
    pub fn render_attachment(&self) -> Option<RenderAttachment> {
        match (self.renderbuffer, self.handle) {
            (Some(renderbuffer), _) => Some(RenderAttachment::Renderbuffer(renderbuffer)),
            (None, Some(texture)) => Some(RenderAttachment::Texture(texture)),
            (None, None) => None,
        }
    }
}

/// Device object a render target draws into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderAttachment {
    Texture(TextureHandle),
    Renderbuffer(RenderbufferHandle),
}

/// Attachment point of the first attachment of a format class
pub fn attachment_for(format: PixelFormat, color_index: u32) -> Attachment {
    match format.attachment_kind() {
        AttachmentKind::Color => Attachment::Color(color_index),
        AttachmentKind::Depth => Attachment::Depth,
        AttachmentKind::Stencil => Attachment::Stencil,
        AttachmentKind::DepthStencil => Attachment::DepthStencil,
    }
}

fn create_resolve_framebuffer<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    desc: &TextureDesc,
    texture: TextureHandle,
) -> Result<FramebufferHandle> {
    let previous = device.bound_framebuffer();
    let framebuffer = device.create_framebuffer()?;
    device.bind_framebuffer(FramebufferTarget::All, framebuffer);
    device.attach_texture(
        attachment_for(desc.format, 0),
        desc.texture_type,
        texture,
        0,
        AttachmentLayer::None,
    );
    let status = device.check_framebuffer_status();
    device.bind_framebuffer(FramebufferTarget::All, previous);

    match status {
        FramebufferStatus::Complete => Ok(framebuffer),
        FramebufferStatus::Incomplete(reason) => {
            device.delete_framebuffer(framebuffer);
            Err(Error::FramebufferIncomplete(reason))
        }
    }
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
