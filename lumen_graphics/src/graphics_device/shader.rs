/// Shader program boundary consumed by the render context

use glam::{Mat4, Vec4};
use super::graphics_device::ProgramHandle;
use crate::resource::{BufferId, TextureId};

/// Opaque bindable program
///
/// The core never compiles user shaders. It only binds them and inspects
/// which storage buffers and textures the active program writes to, so it
/// can place memory barriers around compute dispatches. A `None` entry is a
/// writable slot with nothing bound to it.
pub trait ShaderProgram {
    fn handle(&self) -> ProgramHandle;

    fn active_writable_storage_buffers(&self) -> &[Option<BufferId>];

    fn active_writable_textures(&self) -> &[Option<TextureId>];
}

/// Built-in programs compiled by `set_mode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StandardShader {
    #[default]
    Default,
    /// Samples a 2D array texture; dropped when the driver cannot compile it
    Array,
}

impl StandardShader {
    pub const ALL: [StandardShader; 2] = [StandardShader::Default, StandardShader::Array];

    pub fn index(self) -> usize {
        match self {
            StandardShader::Default => 0,
            StandardShader::Array => 1,
        }
    }
}

/// Per-draw values uploaded to the built-in uniform block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuiltinUniforms {
    pub projection: Mat4,
    /// (width, height, y flip sign, y flip offset)
    pub screen_size: Vec4,
    pub point_size: f32,
    pub constant_color: Vec4,
}
