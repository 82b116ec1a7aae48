/*!
# Lumen Graphics - OpenGL Backend

OpenGL 2.1+ / OpenGL ES 2.0+ implementation of the `lumen_graphics`
`GraphicsDevice` trait, built on the `glow` bindings.

The backend owns no window and no swap chain. Create the context with your
windowing library, make it current, then hand the `glow` context (or its
loader function) to `GlGraphicsDevice`.

```no_run
use lumen_graphics::lumen::DebugConfig;
use lumen_graphics_renderer_gl::GlGraphicsDevice;

# fn load(name: &str) -> *const std::ffi::c_void { std::ptr::null() }
let device = unsafe { GlGraphicsDevice::from_loader_function(load, DebugConfig::default()) };
```

## Safety

Every `GlGraphicsDevice` method issues GL calls. The context passed at
construction must stay current on the calling thread for as long as the
device lives.
*/

mod gl_device;
mod gl_conversions;
mod gl_format;
mod gl_shaders;
mod debug;

pub use gl_device::GlGraphicsDevice;
pub use gl_shaders::GlslVersion;

// Re-export debug utilities
pub use debug::{get_validation_stats, print_validation_stats_report};
