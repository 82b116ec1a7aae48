/// Shared fixtures for render context tests

use crate::config::RenderConfig;
use crate::draw::BatchedDrawCommand;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::{
    CommonFormat, PixelFormat, PrimitiveType, ProgramHandle, ShaderProgram, TextureDesc,
};
use crate::resource::{BufferId, TextureId};
use super::{RenderContext, Surface, SurfaceInfo};

pub(crate) const WIDTH: u32 = 800;
pub(crate) const HEIGHT: u32 = 600;

/// Context over a desktop mock device with the mode already set
pub(crate) fn context() -> RenderContext<MockGraphicsDevice> {
    context_with(MockGraphicsDevice::new(), RenderConfig::default())
}

pub(crate) fn context_with(device: MockGraphicsDevice, config: RenderConfig) -> RenderContext<MockGraphicsDevice> {
    let mut context = unset_context_with(device, config);
    context.set_mode().unwrap();
    context.device_mut().clear_commands();
    context
}

pub(crate) fn unset_context_with(device: MockGraphicsDevice, config: RenderConfig) -> RenderContext<MockGraphicsDevice> {
    RenderContext::new(device, config, SurfaceInfo::new(WIDTH, HEIGHT, WIDTH, HEIGHT)).unwrap()
}

pub(crate) fn render_target(context: &mut RenderContext<MockGraphicsDevice>, format: PixelFormat, width: u32, height: u32) -> TextureId {
    let desc = TextureDesc {
        format,
        width,
        height,
        render_target: true,
        ..TextureDesc::default()
    };
    context.create_texture(desc, None).unwrap()
}

pub(crate) fn color_target(context: &mut RenderContext<MockGraphicsDevice>) -> TextureId {
    render_target(context, PixelFormat::Rgba8Unorm, 64, 32)
}

#[derive(Default)]
pub(crate) struct CountingSurface {
    pub swaps: u32,
}

impl Surface for CountingSurface {
    fn swap_buffers(&mut self) {
        self.swaps += 1;
    }
}

/// Program with fixed writable resource slots
pub(crate) struct TestProgram {
    pub handle: ProgramHandle,
    pub buffers: Vec<Option<BufferId>>,
    pub textures: Vec<Option<TextureId>>,
}

impl TestProgram {
    pub fn new(handle: u32) -> Self {
        Self {
            handle: ProgramHandle(handle),
            buffers: Vec::new(),
            textures: Vec::new(),
        }
    }
}

impl ShaderProgram for TestProgram {
    fn handle(&self) -> ProgramHandle {
        self.handle
    }

    fn active_writable_storage_buffers(&self) -> &[Option<BufferId>] {
        &self.buffers
    }

    fn active_writable_textures(&self) -> &[Option<TextureId>] {
        &self.textures
    }
}

/// Queue three XY vertices as one batched triangle draw
pub(crate) fn queue_triangle(context: &mut RenderContext<MockGraphicsDevice>) {
    let cmd = BatchedDrawCommand::new(PrimitiveType::Triangles, CommonFormat::XYf, 3);
    context.request_batched_draw(&cmd).unwrap();
}
