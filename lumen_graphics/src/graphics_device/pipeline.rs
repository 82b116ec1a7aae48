/// Fixed-function pipeline state types (blend, depth, stencil, rasterizer)

/// Blend equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOperation {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

impl BlendOperation {
    pub const ALL: [BlendOperation; 5] = [
        BlendOperation::Add,
        BlendOperation::Subtract,
        BlendOperation::ReverseSubtract,
        BlendOperation::Min,
        BlendOperation::Max,
    ];
}

/// Blend source/destination factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    OneMinusDstColor,
    DstAlpha,
    OneMinusDstAlpha,
    SrcAlphaSaturated,
}

impl BlendFactor {
    pub const ALL: [BlendFactor; 11] = [
        BlendFactor::Zero,
        BlendFactor::One,
        BlendFactor::SrcColor,
        BlendFactor::OneMinusSrcColor,
        BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha,
        BlendFactor::DstColor,
        BlendFactor::OneMinusDstColor,
        BlendFactor::DstAlpha,
        BlendFactor::OneMinusDstAlpha,
        BlendFactor::SrcAlphaSaturated,
    ];
}

/// Complete blend configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    pub enable: bool,
    pub operation_rgb: BlendOperation,
    pub operation_a: BlendOperation,
    pub src_factor_rgb: BlendFactor,
    pub src_factor_a: BlendFactor,
    pub dst_factor_rgb: BlendFactor,
    pub dst_factor_a: BlendFactor,
}

impl BlendState {
    /// Standard "alpha" blending with straight alpha input
    pub fn alpha() -> Self {
        Self {
            enable: true,
            operation_rgb: BlendOperation::Add,
            operation_a: BlendOperation::Add,
            src_factor_rgb: BlendFactor::SrcAlpha,
            src_factor_a: BlendFactor::One,
            dst_factor_rgb: BlendFactor::OneMinusSrcAlpha,
            dst_factor_a: BlendFactor::OneMinusSrcAlpha,
        }
    }

    /// Blending off, source replaces destination
    pub fn replace() -> Self {
        Self {
            enable: false,
            operation_rgb: BlendOperation::Add,
            operation_a: BlendOperation::Add,
            src_factor_rgb: BlendFactor::One,
            src_factor_a: BlendFactor::One,
            dst_factor_rgb: BlendFactor::Zero,
            dst_factor_a: BlendFactor::Zero,
        }
    }

    pub fn uses_min_max(&self) -> bool {
        [self.operation_rgb, self.operation_a]
            .iter()
            .any(|op| matches!(op, BlendOperation::Min | BlendOperation::Max))
    }
}

impl Default for BlendState {
    fn default() -> Self {
        Self::alpha()
    }
}

/// Depth/stencil comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareMode {
    Less,
    LessEqual,
    Equal,
    GreaterEqual,
    Greater,
    NotEqual,
    Always,
    Never,
}

impl CompareMode {
    pub const ALL: [CompareMode; 8] = [
        CompareMode::Less,
        CompareMode::LessEqual,
        CompareMode::Equal,
        CompareMode::GreaterEqual,
        CompareMode::Greater,
        CompareMode::NotEqual,
        CompareMode::Always,
        CompareMode::Never,
    ];

    /// Swap the operand order of the comparison
    ///
    /// Stencil hardware compares `reference OP stored`; the public API reads
    /// as `stored OP reference`.
    pub fn reversed(self) -> CompareMode {
        match self {
            CompareMode::Less => CompareMode::Greater,
            CompareMode::LessEqual => CompareMode::GreaterEqual,
            CompareMode::Greater => CompareMode::Less,
            CompareMode::GreaterEqual => CompareMode::LessEqual,
            CompareMode::Equal
            | CompareMode::NotEqual
            | CompareMode::Always
            | CompareMode::Never => self,
        }
    }
}

/// Operation applied to the stencil buffer when a fragment passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilAction {
    Keep,
    Replace,
    Increment,
    Decrement,
    IncrementWrap,
    DecrementWrap,
    Invert,
}

impl StencilAction {
    pub const ALL: [StencilAction; 7] = [
        StencilAction::Keep,
        StencilAction::Replace,
        StencilAction::Increment,
        StencilAction::Decrement,
        StencilAction::IncrementWrap,
        StencilAction::DecrementWrap,
        StencilAction::Invert,
    ];
}

/// Device-level stencil configuration (comparison already in hardware order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilState {
    pub compare: CompareMode,
    pub reference: i32,
    pub read_mask: u32,
    pub write_mask: u32,
    pub pass_action: StencilAction,
}

/// Front face vertex order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Winding {
    Cw,
    #[default]
    Ccw,
}

impl Winding {
    pub fn flipped(self) -> Winding {
        match self {
            Winding::Cw => Winding::Ccw,
            Winding::Ccw => Winding::Cw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    #[default]
    None,
    Back,
    Front,
}

/// Per-channel color write mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorChannelMask {
    pub r: bool,
    pub g: bool,
    pub b: bool,
    pub a: bool,
}

impl ColorChannelMask {
    pub const ALL: ColorChannelMask = ColorChannelMask { r: true, g: true, b: true, a: true };
    pub const NONE: ColorChannelMask = ColorChannelMask { r: false, g: false, b: false, a: false };
}

impl Default for ColorChannelMask {
    fn default() -> Self {
        Self::ALL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Triangles,
    TriangleStrip,
    TriangleFan,
    Points,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 4] = [
        PrimitiveType::Triangles,
        PrimitiveType::TriangleStrip,
        PrimitiveType::TriangleFan,
        PrimitiveType::Points,
    ];
}

/// RGBA color with float channels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Colorf {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Colorf {
    pub const WHITE: Colorf = Colorf { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
    pub const TRANSPARENT_BLACK: Colorf = Colorf { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Every channel clamped to [0, 1]
    pub fn clamped(self) -> Self {
        Self {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
            a: self.a.clamp(0.0, 1.0),
        }
    }

    /// Convert the color channels from sRGB to linear space; alpha is untouched
    pub fn gamma_to_linear(self) -> Self {
        fn channel(c: f32) -> f32 {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        Self {
            r: channel(self.r),
            g: channel(self.g),
            b: channel(self.b),
            a: self.a,
        }
    }
}

/// Integer rectangle (pixels or DPI-scaled units depending on context)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }
}
