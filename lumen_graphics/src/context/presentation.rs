/// Frame presentation and screenshot capture

use crate::error::Result;
use crate::graphics_device::{BufferMask, FramebufferTarget, GraphicsDevice, PixelFormat, Rect};
use crate::resource::staging::try_alloc_zeroed;
use crate::{engine_bail, engine_error};
use super::render_context::{FrameCounters, RenderContext, SOURCE};

/// Window surface that can show the finished frame
pub trait Surface {
    fn swap_buffers(&mut self);
}

/// CPU copy of captured pixels, RGBA8 with the top row first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl ImageData {
    /// Copy `pixels` into a new image; fails on allocation failure
    pub fn from_pixels(width: u32, height: u32, pixels: &[u8]) -> Result<ImageData> {
        let mut data = try_alloc_zeroed(pixels.len())?;
        data.copy_from_slice(pixels);
        Ok(ImageData {
            width,
            height,
            format: PixelFormat::Rgba8Unorm,
            data,
        })
    }
}

/// Identifies a screenshot request to its callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenshotInfo {
    pub id: u64,
}

/// Called once per request; `None` when the capture failed
pub type ScreenshotCallback = Box<dyn FnOnce(&ScreenshotInfo, Option<ImageData>)>;

/// Builds the image handed to screenshot callbacks
pub type ImageDataFactory = Box<dyn FnMut(u32, u32, &[u8]) -> Result<ImageData>>;

pub(super) struct ScreenshotRequest {
    info: ScreenshotInfo,
    callback: ScreenshotCallback,
}

impl ScreenshotRequest {
    fn complete(self, image: Option<ImageData>) {
        (self.callback)(&self.info, image);
    }
}

impl<D: GraphicsDevice> RenderContext<D> {
    /// Capture the next presented frame
    ///
    /// Callbacks run during `present`, in request order.
    pub fn request_screenshot<F>(&mut self, callback: F) -> ScreenshotInfo
    where
        F: FnOnce(&ScreenshotInfo, Option<ImageData>) + 'static,
    {
        let info = ScreenshotInfo { id: self.next_screenshot_id };
        self.next_screenshot_id += 1;
        self.pending_screenshots.push(ScreenshotRequest {
            info,
            callback: Box::new(callback),
        });
        info
    }

    pub fn pending_screenshot_count(&self) -> usize {
        self.pending_screenshots.len()
    }

    pub fn set_image_data_factory(&mut self, factory: ImageDataFactory) {
        self.image_data_factory = factory;
    }

    /// Show the frame drawn to the window
    ///
    /// Resolves the internal backbuffer into the system one, serves pending
    /// screenshots, swaps, then starts the next frame: streams rotate,
    /// counters reset and idle temporary textures are released.
    pub fn present(&mut self, surface: &mut dyn Surface) -> Result<()> {
        if !self.active {
            return Ok(());
        }

        if self.is_render_target_active() {
            engine_bail!(@InvalidOperation, SOURCE, "present cannot be called while a render target is active.");
        }

        self.flush_batched_draws()?;
        self.end_pass()?;

        let internal = self.internal_backbuffer_framebuffer();
        let system = self.surface.system_framebuffer;
        self.device.bind_framebuffer(FramebufferTarget::All, internal);

        if let Some(backbuffer) = self.internal_backbuffer {
            self.device.bind_framebuffer(FramebufferTarget::Draw, system);
            self.discard_attachments(FramebufferTarget::Draw, &[true], true, true);

            let (width, height) = (self.surface.pixel_width, self.surface.pixel_height);
            if backbuffer.msaa > 1 && self.capabilities.paths.multisample_resolve_apple {
                self.device.resolve_multisample_framebuffer(width, height);
            } else {
                let rect = Rect::new(0, 0, width as i32, height as i32);
                self.device.blit_framebuffer(rect, rect, BufferMask::COLOR);
            }

            self.discard_attachments(FramebufferTarget::Read, &[true], false, false);
        }

        if !self.pending_screenshots.is_empty() {
            self.capture_screenshots()?;
        }

        self.batched.next_frame();
        surface.swap_buffers();

        self.device.bind_framebuffer(FramebufferTarget::All, internal);
        self.pass_open = true;

        self.counters = FrameCounters::default();

        for texture in self.temporary_textures.age() {
            self.remove_texture(texture);
        }
        Ok(())
    }

    /// Read the system framebuffer once and serve every pending request
    ///
    /// Every callback runs exactly once; after a failure the remaining ones
    /// get `None` before the error is returned.
    fn capture_screenshots(&mut self) -> Result<()> {
        let requests = std::mem::take(&mut self.pending_screenshots);
        let (width, height) = (self.surface.pixel_width, self.surface.pixel_height);
        let row = width as usize * 4;

        let mut pixels = match try_alloc_zeroed(row * height as usize) {
            Ok(pixels) => pixels,
            Err(e) => {
                engine_error!(SOURCE, "Out of memory while capturing a screenshot");
                requests.into_iter().for_each(|r| r.complete(None));
                return Err(e);
            }
        };

        self.device.bind_framebuffer(FramebufferTarget::All, self.surface.system_framebuffer);
        if let Err(e) = self.device.read_pixels_rgba8(Rect::new(0, 0, width as i32, height as i32), &mut pixels) {
            requests.into_iter().for_each(|r| r.complete(None));
            return Err(e);
        }

        for pixel in pixels.chunks_exact_mut(4) {
            pixel[3] = 255;
        }
        flip_rows(&mut pixels, row);

        let mut requests = requests.into_iter();
        while let Some(request) = requests.next() {
            match (self.image_data_factory)(width, height, &pixels) {
                Ok(image) => request.complete(Some(image)),
                Err(e) => {
                    engine_error!(SOURCE, "Could not create screenshot image data: {}", e);
                    request.complete(None);
                    requests.for_each(|r| r.complete(None));
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}

/// Reverse the row order of a tightly packed image in place
fn flip_rows(pixels: &mut [u8], row: usize) {
    if row == 0 {
        return;
    }
    let rows = pixels.len() / row;
    for y in 0..rows / 2 {
        let (top, bottom) = pixels.split_at_mut((rows - 1 - y) * row);
        top[y * row..(y + 1) * row].swap_with_slice(&mut bottom[..row]);
    }
}

#[cfg(test)]
#[path = "presentation_tests.rs"]
mod tests;
