/// Memory barrier bits issued around compute dispatches

use bitflags::bitflags;

bitflags! {
    /// Classes of memory access that must observe prior shader writes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemoryBarriers: u32 {
        const VERTEX_ATTRIB_ARRAY = 1 << 0;
        const ELEMENT_ARRAY       = 1 << 1;
        const TEXTURE_FETCH       = 1 << 2;
        const SHADER_IMAGE_ACCESS = 1 << 3;
        const PIXEL_BUFFER        = 1 << 4;
        const TEXTURE_UPDATE      = 1 << 5;
        const BUFFER_UPDATE       = 1 << 6;
        const FRAMEBUFFER         = 1 << 7;
        const SHADER_STORAGE      = 1 << 8;
    }
}
