/// Feature flags, numeric limits and supported texture types of a device

use crate::graphics_device::TextureType;

/// Optional features of the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    MultiRenderTargetFormats,
    ClampZero,
    BlendMinMax,
    Lighten,
    FullNpot,
    PixelShaderHighp,
    ShaderDerivatives,
    Glsl3,
    Glsl4,
    Instancing,
    TexelBuffer,
    CopyBuffer,
}

impl Feature {
    pub const COUNT: usize = 12;

    pub const ALL: [Feature; Feature::COUNT] = [
        Feature::MultiRenderTargetFormats,
        Feature::ClampZero,
        Feature::BlendMinMax,
        Feature::Lighten,
        Feature::FullNpot,
        Feature::PixelShaderHighp,
        Feature::ShaderDerivatives,
        Feature::Glsl3,
        Feature::Glsl4,
        Feature::Instancing,
        Feature::TexelBuffer,
        Feature::CopyBuffer,
    ];

    pub fn index(self) -> usize {
        match self {
            Feature::MultiRenderTargetFormats => 0,
            Feature::ClampZero => 1,
            Feature::BlendMinMax => 2,
            Feature::Lighten => 3,
            Feature::FullNpot => 4,
            Feature::PixelShaderHighp => 5,
            Feature::ShaderDerivatives => 6,
            Feature::Glsl3 => 7,
            Feature::Glsl4 => 8,
            Feature::Instancing => 9,
            Feature::TexelBuffer => 10,
            Feature::CopyBuffer => 11,
        }
    }
}

/// Numeric device limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Limit {
    PointSize,
    TextureSize,
    TextureLayers,
    VolumeTextureSize,
    CubeTextureSize,
    TexelBufferSize,
    ShaderStorageBufferSize,
    ThreadgroupsX,
    ThreadgroupsY,
    ThreadgroupsZ,
    RenderTargets,
    TextureMsaa,
    Anisotropy,
}

impl Limit {
    pub const COUNT: usize = 13;

    pub const ALL: [Limit; Limit::COUNT] = [
        Limit::PointSize,
        Limit::TextureSize,
        Limit::TextureLayers,
        Limit::VolumeTextureSize,
        Limit::CubeTextureSize,
        Limit::TexelBufferSize,
        Limit::ShaderStorageBufferSize,
        Limit::ThreadgroupsX,
        Limit::ThreadgroupsY,
        Limit::ThreadgroupsZ,
        Limit::RenderTargets,
        Limit::TextureMsaa,
        Limit::Anisotropy,
    ];

    pub fn index(self) -> usize {
        match self {
            Limit::PointSize => 0,
            Limit::TextureSize => 1,
            Limit::TextureLayers => 2,
            Limit::VolumeTextureSize => 3,
            Limit::CubeTextureSize => 4,
            Limit::TexelBufferSize => 5,
            Limit::ShaderStorageBufferSize => 6,
            Limit::ThreadgroupsX => 7,
            Limit::ThreadgroupsY => 8,
            Limit::ThreadgroupsZ => 9,
            Limit::RenderTargets => 10,
            Limit::TextureMsaa => 11,
            Limit::Anisotropy => 12,
        }
    }
}

/// Driver code paths the core picks between (not user-visible features)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriverPaths {
    /// Indexed draws accept a base vertex
    pub base_vertex: bool,
    /// Framebuffer blits are available
    pub framebuffer_blit: bool,
    /// APPLE single-call multisample resolve
    pub multisample_resolve_apple: bool,
    /// Framebuffer invalidate/discard hints are available
    pub invalidate_framebuffer: bool,
    /// sRGB write control can be toggled
    pub framebuffer_srgb: bool,
    /// Per-attachment clears are available
    pub clear_buffer: bool,
    /// Polygon fill mode can be changed
    pub wireframe: bool,
}

/// Everything the prober learned about the device
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilitySet {
    features: [bool; Feature::COUNT],
    limits: [f64; Limit::COUNT],
    texture_types: [bool; 4],
    pub paths: DriverPaths,
}

fn texture_type_index(texture_type: TextureType) -> usize {
    match texture_type {
        TextureType::Tex2D => 0,
        TextureType::Volume => 1,
        TextureType::Array2D => 2,
        TextureType::Cube => 3,
    }
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self {
            features: [false; Feature::COUNT],
            limits: [0.0; Limit::COUNT],
            texture_types: [false; 4],
            paths: DriverPaths::default(),
        }
    }
}

impl CapabilitySet {
    pub fn new(
        features: [bool; Feature::COUNT],
        limits: [f64; Limit::COUNT],
        paths: DriverPaths,
    ) -> Self {
        Self {
            features,
            limits,
            texture_types: [false; 4],
            paths,
        }
    }

    pub fn feature(&self, feature: Feature) -> bool {
        self.features[feature.index()]
    }

    pub fn limit(&self, limit: Limit) -> f64 {
        self.limits[limit.index()]
    }

    pub fn is_texture_type_supported(&self, texture_type: TextureType) -> bool {
        self.texture_types[texture_type_index(texture_type)]
    }

    pub fn set_texture_type_supported(&mut self, texture_type: TextureType, supported: bool) {
        self.texture_types[texture_type_index(texture_type)] = supported;
    }

    /// Downgrade a feature discovered broken at first use
    pub fn disable_feature(&mut self, feature: Feature) {
        self.features[feature.index()] = false;
    }
}
