/// Buffer descriptors, vertex layouts and vertex stream bindings

use bitflags::bitflags;
use super::graphics_device::BufferHandle;

bitflags! {
    /// Every role a buffer may be bound in; drives dispatch barrier selection
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsageFlags: u32 {
        const VERTEX         = 1 << 0;
        const INDEX          = 1 << 1;
        const TEXEL          = 1 << 2;
        const SHADER_STORAGE = 1 << 3;
        const COPY_SOURCE    = 1 << 4;
        const COPY_DEST      = 1 << 5;
    }
}

/// Single binding target used when a buffer is bound for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Vertex,
    Index,
    Texel,
    ShaderStorage,
    CopySource,
    CopyDest,
}

impl BufferUsage {
    pub fn flag(self) -> BufferUsageFlags {
        match self {
            BufferUsage::Vertex => BufferUsageFlags::VERTEX,
            BufferUsage::Index => BufferUsageFlags::INDEX,
            BufferUsage::Texel => BufferUsageFlags::TEXEL,
            BufferUsage::ShaderStorage => BufferUsageFlags::SHADER_STORAGE,
            BufferUsage::CopySource => BufferUsageFlags::COPY_SOURCE,
            BufferUsage::CopyDest => BufferUsageFlags::COPY_DEST,
        }
    }
}

/// Update frequency hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataUsage {
    #[default]
    Static,
    Dynamic,
    Stream,
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone, PartialEq)]
pub struct BufferDesc {
    /// Size in bytes
    pub size: usize,
    pub usage: BufferUsageFlags,
    pub data_usage: DataUsage,
    pub debug_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    U16,
    U32,
}

impl IndexType {
    pub fn size(self) -> usize {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Vertex attribute component layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFormat {
    FloatVec2,
    FloatVec3,
    FloatVec4,
    UNorm8Vec4,
}

impl DataFormat {
    pub fn size(self) -> u32 {
        match self {
            DataFormat::FloatVec2 => 8,
            DataFormat::FloatVec3 => 12,
            DataFormat::FloatVec4 => 16,
            DataFormat::UNorm8Vec4 => 4,
        }
    }

    pub fn components(self) -> i32 {
        match self {
            DataFormat::FloatVec2 => 2,
            DataFormat::FloatVec3 => 3,
            DataFormat::FloatVec4 | DataFormat::UNorm8Vec4 => 4,
        }
    }
}

/// Built-in attribute locations
pub const ATTRIB_POS: u32 = 0;
pub const ATTRIB_TEXCOORD: u32 = 1;
pub const ATTRIB_COLOR: u32 = 2;

/// Maximum number of simultaneously bound vertex streams
pub const MAX_VERTEX_BUFFERS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub location: u32,
    pub buffer_index: usize,
    pub format: DataFormat,
    /// Byte offset inside one vertex
    pub offset: u32,
}

/// Attribute layout of up to `MAX_VERTEX_BUFFERS` vertex streams
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VertexAttributes {
    pub attributes: Vec<VertexAttribute>,
    pub strides: [u32; MAX_VERTEX_BUFFERS],
}

impl VertexAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self, location: u32) -> bool {
        self.attributes.iter().any(|a| a.location == location)
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Append the attributes of a batched vertex format read from `buffer_index`
    pub fn set_common_format(&mut self, format: CommonFormat, buffer_index: usize) {
        let mut offset = 0;
        for &(location, data_format) in format.components() {
            self.attributes.push(VertexAttribute {
                location,
                buffer_index,
                format: data_format,
                offset,
            });
            offset += data_format.size();
        }
        self.strides[buffer_index] = format.stride() as u32;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferBinding {
    pub buffer: BufferHandle,
    /// Byte offset of vertex 0 in the buffer
    pub offset: usize,
}

/// Buffer bound to each vertex stream slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferBindings {
    pub slots: [Option<BufferBinding>; MAX_VERTEX_BUFFERS],
}

impl BufferBindings {
    pub fn set(&mut self, index: usize, buffer: BufferHandle, offset: usize) {
        self.slots[index] = Some(BufferBinding { buffer, offset });
    }
}

/// Vertex formats accepted by the batched draw path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(non_camel_case_types)]
pub enum CommonFormat {
    #[default]
    None,
    XYf,
    XYZf,
    RGBAub,
    STf_RGBAub,
    XYf_STf,
    XYf_STf_RGBAub,
    XYf_STPf_RGBAub,
}

impl CommonFormat {
    /// (attribute location, data format) pairs in memory order
    pub fn components(self) -> &'static [(u32, DataFormat)] {
        match self {
            CommonFormat::None => &[],
            CommonFormat::XYf => &[(ATTRIB_POS, DataFormat::FloatVec2)],
            CommonFormat::XYZf => &[(ATTRIB_POS, DataFormat::FloatVec3)],
            CommonFormat::RGBAub => &[(ATTRIB_COLOR, DataFormat::UNorm8Vec4)],
            CommonFormat::STf_RGBAub => &[
                (ATTRIB_TEXCOORD, DataFormat::FloatVec2),
                (ATTRIB_COLOR, DataFormat::UNorm8Vec4),
            ],
            CommonFormat::XYf_STf => &[
                (ATTRIB_POS, DataFormat::FloatVec2),
                (ATTRIB_TEXCOORD, DataFormat::FloatVec2),
            ],
            CommonFormat::XYf_STf_RGBAub => &[
                (ATTRIB_POS, DataFormat::FloatVec2),
                (ATTRIB_TEXCOORD, DataFormat::FloatVec2),
                (ATTRIB_COLOR, DataFormat::UNorm8Vec4),
            ],
            CommonFormat::XYf_STPf_RGBAub => &[
                (ATTRIB_POS, DataFormat::FloatVec2),
                (ATTRIB_TEXCOORD, DataFormat::FloatVec3),
                (ATTRIB_COLOR, DataFormat::UNorm8Vec4),
            ],
        }
    }

    /// Bytes per vertex
    pub fn stride(self) -> usize {
        self.components().iter().map(|(_, f)| f.size() as usize).sum()
    }
}
