/// Render target switches, pass end, clears and discards
///
/// A pass starts when a render target set (or the window) is bound and
/// ends at the next switch or at present. Ending a pass discards engine
/// allocated depth/stencil, resolves multisampled readable targets and
/// regenerates automatic mipmaps, exactly once.

use crate::capabilities::{Feature, Limit};
use crate::error::Result;
use crate::engine_bail;
use crate::graphics_device::{
    Attachment, BufferMask, Colorf, CompareMode, FramebufferTarget, GraphicsDevice, MipmapsMode, PixelFormat,
    Rect, TextureDesc,
};
use crate::resource::{Texture, TextureId};
use crate::target::{RenderTarget, RenderTargetSet, TemporaryTargetFlags};
use super::render_context::{texture_projection, window_projection, RenderContext, SOURCE};

impl<D: GraphicsDevice> RenderContext<D> {
    // ===== RENDER TARGETS =====

    /// Draw into `targets` from now on; an empty set means the window
    ///
    /// The set is validated before anything is flushed, so a rejected set
    /// leaves the current pass untouched.
    pub fn set_render_targets(&mut self, targets: RenderTargetSet) -> Result<()> {
        if targets.is_backbuffer() {
            return self.set_render_targets_to_backbuffer();
        }

        self.validate_render_targets(&targets)?;

        if targets == self.states.top().render_targets {
            return Ok(());
        }

        self.bind_render_targets(targets)
    }

    pub fn set_render_targets_to_backbuffer(&mut self) -> Result<()> {
        if !self.is_render_target_active() {
            return Ok(());
        }
        self.bind_render_targets(RenderTargetSet::new())
    }

    pub fn render_targets(&self) -> &RenderTargetSet {
        &self.states.top().render_targets
    }

    fn validate_render_targets(&self, targets: &RenderTargetSet) -> Result<()> {
        let max_targets = self.capabilities.limit(Limit::RenderTargets) as usize;
        if targets.colors.len() > max_targets {
            engine_bail!(@Unsupported, SOURCE,
                "This system can't simultaneously render to {} textures.", targets.colors.len());
        }

        let first = match targets.first_target() {
            Some(first) => first,
            None => return Ok(()),
        };
        let reference = self.render_target_texture(first)?;
        let size = (reference.pixel_width(first.mipmap), reference.pixel_height(first.mipmap));
        let msaa = reference.msaa();
        let first_format = reference.format();

        for target in &targets.colors {
            let texture = self.render_target_texture(*target)?;

            if texture.format().is_depth_stencil() {
                engine_bail!(@InvalidOperation, SOURCE,
                    "Depth/stencil format textures must be used as the depth/stencil target, not as a color target.");
            }
            if (texture.pixel_width(target.mipmap), texture.pixel_height(target.mipmap)) != size {
                engine_bail!(@InvalidOperation, SOURCE, "All textures must have the same pixel dimensions.");
            }
            if texture.msaa() != msaa {
                engine_bail!(@InvalidOperation, SOURCE, "All textures must have the same MSAA value.");
            }
            if texture.format() != first_format && !self.capabilities.feature(Feature::MultiRenderTargetFormats) {
                engine_bail!(@Unsupported, SOURCE,
                    "This system doesn't support using different pixel formats for multiple simultaneous render targets.");
            }
        }

        if let Some(target) = targets.depth_stencil {
            let texture = self.render_target_texture(target)?;

            if !texture.format().is_depth_stencil() {
                engine_bail!(@InvalidOperation, SOURCE,
                    "Only depth/stencil format textures can be used as the depth/stencil target.");
            }
            if (texture.pixel_width(target.mipmap), texture.pixel_height(target.mipmap)) != size {
                engine_bail!(@InvalidOperation, SOURCE, "All textures must have the same pixel dimensions.");
            }
            if texture.msaa() != msaa {
                engine_bail!(@InvalidOperation, SOURCE,
                    "All textures (including the depth/stencil texture) must have the same MSAA value.");
            }
        }

        Ok(())
    }

    fn render_target_texture(&self, target: RenderTarget) -> Result<&Texture> {
        let texture = match self.resources.texture(target.texture) {
            Some(texture) => texture,
            None => engine_bail!(@InvalidResource, SOURCE, "Render target texture {:?} does not exist", target.texture),
        };
        if !texture.is_render_target() {
            engine_bail!(@InvalidOperation, SOURCE,
                "Texture must be created as a render target to be drawn to.");
        }
        if target.mipmap >= texture.mipmap_count() {
            engine_bail!(@InvalidOperation, SOURCE, "Invalid mipmap level {}.", target.mipmap);
        }
        if target.slice >= texture.slice_count() {
            engine_bail!(@InvalidOperation, SOURCE, "Invalid slice index {}.", target.slice);
        }
        Ok(texture)
    }

    /// End the current pass and bind `targets`, which must be valid
    pub(super) fn bind_render_targets(&mut self, targets: RenderTargetSet) -> Result<()> {
        self.flush_batched_draws()?;
        self.end_pass()?;

        let (pixel_width, pixel_height, srgb) = match targets.first_target() {
            None => {
                let framebuffer = self.internal_backbuffer_framebuffer();
                self.device.bind_framebuffer(FramebufferTarget::All, framebuffer);
                self.projection = window_projection(self.surface.width, self.surface.height);
                (self.surface.pixel_width, self.surface.pixel_height, self.config.gamma_correct)
            }
            Some(first) => {
                let bound = self.with_temporary_depth_stencil(&targets)?;
                self.target_cache.bind(&mut self.device, &self.resources, &bound.cache_key())?;

                let (pixel_width, pixel_height, dpi) = match self.resources.texture(first.texture) {
                    Some(texture) => (texture.pixel_width(first.mipmap), texture.pixel_height(first.mipmap), texture.dpi_scale()),
                    None => engine_bail!(@InvalidResource, SOURCE, "Render target texture {:?} does not exist", first.texture),
                };
                self.projection = texture_projection(pixel_width as f32 / dpi, pixel_height as f32 / dpi);

                let srgb = targets
                    .colors
                    .iter()
                    .filter_map(|rt| self.resources.texture(rt.texture))
                    .any(|texture| texture.format().is_srgb());
                (pixel_width, pixel_height, srgb)
            }
        };

        self.states.top_mut().render_targets = targets;

        self.apply_front_face();
        self.device.set_viewport(Rect::new(0, 0, pixel_width as i32, pixel_height as i32));
        self.reapply_scissor()?;

        if self.capabilities.paths.framebuffer_srgb && srgb != self.framebuffer_srgb {
            self.device.set_framebuffer_srgb(srgb);
            self.framebuffer_srgb = srgb;
        }

        self.counters.render_target_switches += 1;
        self.pass_open = true;
        Ok(())
    }

    /// `targets` with an engine-owned depth/stencil texture filled in when requested
    fn with_temporary_depth_stencil(&mut self, targets: &RenderTargetSet) -> Result<RenderTargetSet> {
        let flags = targets.temporary_flags;
        if targets.depth_stencil.is_some() || flags.is_empty() {
            return Ok(targets.clone());
        }

        let format = if flags.contains(TemporaryTargetFlags::DEPTH | TemporaryTargetFlags::STENCIL) {
            PixelFormat::Depth24UnormStencil8
        } else if flags.contains(TemporaryTargetFlags::DEPTH) {
            PixelFormat::Depth24Unorm
        } else {
            PixelFormat::Stencil8
        };

        let (width, height, msaa, dpi) = match targets.first_target().and_then(|rt| {
            self.resources.texture(rt.texture).map(|t| (t.pixel_width(rt.mipmap), t.pixel_height(rt.mipmap), t.msaa(), t.dpi_scale()))
        }) {
            Some(dimensions) => dimensions,
            None => engine_bail!(@InvalidResource, SOURCE, "Render target texture does not exist"),
        };

        let texture = self.acquire_temporary_texture(format, width, height, msaa, dpi)?;
        Ok(targets.clone().with_depth_stencil(RenderTarget::new(texture)))
    }

    fn acquire_temporary_texture(&mut self, format: PixelFormat, width: u32, height: u32, msaa: u32, dpi_scale: f32) -> Result<TextureId> {
        let resources = &self.resources;
        let pooled = self.temporary_textures.acquire(|id| {
            resources.texture(id).is_some_and(|t| {
                t.format() == format && t.pixel_width(0) == width && t.pixel_height(0) == height && t.msaa() == msaa
            })
        });
        if let Some(texture) = pooled {
            return Ok(texture);
        }

        let desc = TextureDesc {
            width,
            height,
            format,
            msaa,
            dpi_scale,
            render_target: true,
            readable: Some(false),
            debug_name: Some("temporary depth/stencil".to_string()),
            ..TextureDesc::default()
        };
        let texture = self.create_texture(desc, None)?;
        self.temporary_textures.insert(texture);
        Ok(texture)
    }

    // ===== PASS END =====

    /// Finish the current pass; a second call without a switch does nothing
    pub fn end_pass(&mut self) -> Result<()> {
        self.flush_batched_draws()?;

        if !self.pass_open {
            return Ok(());
        }
        self.pass_open = false;

        let targets = self.states.top().render_targets.clone();
        let paths = self.capabilities.paths;

        // Engine-allocated depth/stencil never outlives its pass, nor does the backbuffer's
        let temporary_depth_stencil = targets.depth_stencil.is_none() && !targets.temporary_flags.is_empty();
        if temporary_depth_stencil || targets.is_backbuffer() {
            let window = targets.is_backbuffer() && self.internal_backbuffer.is_none();
            self.discard_attachments(FramebufferTarget::All, &[], true, window);
        }

        let resolve_size = targets.colors.first().and_then(|rt| {
            self.resources
                .texture(rt.texture)
                .filter(|t| t.msaa() > 1)
                .map(|t| (t.pixel_width(rt.mipmap), t.pixel_height(rt.mipmap)))
        });

        if let Some((width, height)) = resolve_size {
            let rect = Rect::new(0, 0, width as i32, height as i32);
            for (i, target) in targets.colors.iter().enumerate() {
                let resolve = self.resources
                    .texture(target.texture)
                    .filter(|t| t.is_readable())
                    .and_then(|t| t.resolve_framebuffer());
                let framebuffer = match resolve {
                    Some(framebuffer) => framebuffer,
                    None => continue,
                };

                self.device.set_read_buffer(Some(Attachment::Color(i as u32)));
                self.device.bind_framebuffer(FramebufferTarget::Draw, framebuffer);
                if paths.multisample_resolve_apple {
                    self.device.resolve_multisample_framebuffer(width, height);
                } else {
                    self.device.blit_framebuffer(rect, rect, BufferMask::COLOR);
                }
            }
        }

        if let Some(target) = targets.depth_stencil {
            let resolve = self.resources
                .texture(target.texture)
                .filter(|t| t.msaa() > 1 && t.is_readable())
                .and_then(|t| {
                    let framebuffer = t.resolve_framebuffer()?;
                    Some((framebuffer, t.format(), t.pixel_width(target.mipmap), t.pixel_height(target.mipmap)))
                });

            if let Some((framebuffer, format, width, height)) = resolve {
                self.device.bind_framebuffer(FramebufferTarget::Draw, framebuffer);
                if paths.multisample_resolve_apple {
                    self.device.resolve_multisample_framebuffer(width, height);
                } else {
                    let mut mask = BufferMask::empty();
                    if format.is_depth() {
                        mask |= BufferMask::DEPTH;
                    }
                    if format.is_stencil() {
                        mask |= BufferMask::STENCIL;
                    }
                    if !mask.is_empty() {
                        let rect = Rect::new(0, 0, width as i32, height as i32);
                        self.device.blit_framebuffer(rect, rect, mask);
                    }
                }
            }
        }

        for target in &targets.colors {
            if target.mipmap != 0 {
                continue;
            }
            let mipmapped = self.resources
                .texture(target.texture)
                .filter(|t| t.mipmaps_mode() == MipmapsMode::Auto)
                .and_then(|t| Some((t.handle()?, t.texture_type())));
            if let Some((handle, texture_type)) = mipmapped {
                self.device.generate_mipmaps(handle, texture_type);
            }
        }

        Ok(())
    }

    // ===== CLEAR =====

    /// Clear the bound targets; `None` leaves that buffer untouched
    pub fn clear(&mut self, color: Option<Colorf>, stencil: Option<i32>, depth: Option<f64>) -> Result<()> {
        if color.is_none() && stencil.is_none() && depth.is_none() {
            return Ok(());
        }

        self.flush_batched_draws()?;

        let color = color.map(|c| self.gamma_corrected(c));
        let (compare, write) = {
            let state = self.states.top();
            (state.depth_compare, state.depth_write)
        };

        // A depth clear is masked by the depth write flag
        let force_depth_write = depth.is_some() && !write;
        if force_depth_write {
            self.device.set_depth_state(Some(compare), true);
        }

        self.device.clear(color, stencil, depth);

        if force_depth_write {
            let enable = compare != CompareMode::Always || write;
            self.device.set_depth_state(enable.then_some(compare), write);
        }
        Ok(())
    }

    /// Clear each color target with its own value
    pub fn clear_targets(&mut self, colors: &[Option<Colorf>], stencil: Option<i32>, depth: Option<f64>) -> Result<()> {
        if colors.iter().all(Option::is_none) && stencil.is_none() && depth.is_none() {
            return Ok(());
        }

        let target_count = self.states.top().render_targets.colors.len();
        if colors.len() <= 1 && target_count <= 1 {
            return self.clear(colors.first().copied().flatten(), stencil, depth);
        }

        self.flush_batched_draws()?;

        let mut draw_buffers_modified = false;
        for (i, color) in colors.iter().enumerate().take(target_count) {
            let color = match color {
                Some(color) => self.gamma_corrected(*color),
                None => continue,
            };

            if self.capabilities.paths.clear_buffer {
                self.device.clear_color_attachment(i as u32, color);
            } else {
                self.device.set_draw_buffers(&[Attachment::Color(i as u32)]);
                self.device.clear(Some(color), None, None);
                draw_buffers_modified = true;
            }
        }

        if draw_buffers_modified {
            let buffers: Vec<Attachment> = (0..target_count as u32).map(Attachment::Color).collect();
            self.device.set_draw_buffers(&buffers);
        }

        self.clear(None, stencil, depth)
    }

    pub(super) fn gamma_corrected(&self, color: Colorf) -> Colorf {
        if self.config.gamma_correct {
            color.gamma_to_linear()
        } else {
            color
        }
    }

    // ===== DISCARD =====

    /// Hint that the contents of the chosen attachments need not be kept
    ///
    /// `colors[i]` selects color target i.
    pub fn discard(&mut self, colors: &[bool], depth_stencil: bool) -> Result<()> {
        self.flush_batched_draws()?;
        let system = !self.is_render_target_active() && self.internal_backbuffer.is_none();
        self.discard_attachments(FramebufferTarget::All, colors, depth_stencil, system);
        Ok(())
    }

    /// `default_names` selects the window-system attachment names
    pub(super) fn discard_attachments(&mut self, target: FramebufferTarget, colors: &[bool], depth_stencil: bool, default_names: bool) {
        if !self.capabilities.paths.invalidate_framebuffer {
            return;
        }

        let mut attachments = Vec::with_capacity(colors.len() + 2);
        if default_names {
            if colors.first() == Some(&true) {
                attachments.push(Attachment::DefaultColor);
            }
            if depth_stencil {
                attachments.push(Attachment::DefaultStencil);
                attachments.push(Attachment::DefaultDepth);
            }
        } else {
            let target_count = self.states.top().render_targets.colors.len().max(1);
            for (i, &discard) in colors.iter().enumerate().take(target_count) {
                if discard {
                    attachments.push(Attachment::Color(i as u32));
                }
            }
            if depth_stencil {
                attachments.push(Attachment::Stencil);
                attachments.push(Attachment::Depth);
            }
        }

        if !attachments.is_empty() {
            self.device.invalidate_framebuffer(target, &attachments);
        }
    }
}

#[cfg(test)]
#[path = "render_pass_tests.rs"]
mod tests;
