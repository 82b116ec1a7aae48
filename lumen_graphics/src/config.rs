//! Render context configuration
//!
//! `RenderConfig::default()` matches the behavior of a freshly created
//! window; `RenderConfig::from_env()` additionally honors
//! `LUMEN_GRAPHICS_DEBUG=1` to turn on driver debug output.

/// Environment variable enabling driver debug output
pub const DEBUG_ENV_VAR: &str = "LUMEN_GRAPHICS_DEBUG";

/// Which driver debug messages are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugSeverity {
    ErrorsOnly,
    #[default]
    ErrorsAndWarnings,
    All,
}

/// Where driver debug messages go
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DebugOutput {
    #[default]
    Console,
    File(String),
    Both(String),
}

/// Message categories to display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugMessageFilter {
    pub show_general: bool,
    pub show_validation: bool,
    pub show_performance: bool,
}

impl Default for DebugMessageFilter {
    fn default() -> Self {
        Self {
            show_general: true,
            show_validation: true,
            show_performance: false,
        }
    }
}

/// Counters kept by the driver debug callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }
}

/// Driver debug output settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugConfig {
    pub enabled: bool,
    pub severity: DebugSeverity,
    pub output: DebugOutput,
    pub message_filter: DebugMessageFilter,
    /// Abort the process on the first error message
    pub break_on_error: bool,
    /// Panic on the first error message
    pub panic_on_error: bool,
    pub enable_stats: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            severity: DebugSeverity::default(),
            output: DebugOutput::default(),
            message_filter: DebugMessageFilter::default(),
            break_on_error: false,
            panic_on_error: false,
            enable_stats: true,
        }
    }
}

/// Render context configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Linear-space rendering with sRGB framebuffers
    pub gamma_correct: bool,
    /// MSAA sample count requested for the backbuffer (0 or 1 disables it)
    pub backbuffer_msaa: u32,
    /// Whether the window-system framebuffer has a stencil buffer
    pub window_has_stencil: bool,
    pub debug: DebugConfig,
    /// Size of the staging block reused for buffer writes
    pub buffer_map_memory_size: usize,
    /// Initial per-frame sizes of the two batched vertex streams
    pub stream_vertex_sizes: [usize; 2],
    /// Initial per-frame size of the batched index stream
    pub stream_index_size: usize,
    /// Presented frames a temporary texture may stay unused before release
    pub max_temporary_texture_unused_frames: u32,
    /// Maximum depth of the user state stack
    pub max_state_stack_depth: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            gamma_correct: false,
            backbuffer_msaa: 0,
            window_has_stencil: true,
            debug: DebugConfig::default(),
            buffer_map_memory_size: 2 * 1024 * 1024,
            stream_vertex_sizes: [1024 * 1024, 256 * 1024],
            stream_index_size: std::mem::size_of::<u16>() * u16::MAX as usize,
            max_temporary_texture_unused_frames: 3,
            max_state_stack_depth: 128,
        }
    }
}

impl RenderConfig {
    /// Defaults plus environment overrides
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(std::env::var(DEBUG_ENV_VAR).ok().as_deref());
        config
    }

    fn apply_env(&mut self, debug_var: Option<&str>) {
        if let Some(value) = debug_var {
            self.debug.enabled = value.trim() == "1";
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
