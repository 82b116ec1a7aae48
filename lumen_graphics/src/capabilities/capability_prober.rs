/// Capability prober and memoized render-target format support
///
/// `probe` is read-only with respect to device state. `FormatSupportCache`
/// creates scratch objects to test formats but restores the previously
/// bound framebuffer and deletes everything it created.

use rustc_hash::FxHashMap;
use crate::engine_debug;
use crate::resource::texture::attachment_for;
use crate::graphics_device::{
    AttachmentLayer, DriverInfo, FramebufferStatus,
    FramebufferTarget, GraphicsDevice, PixelFormat, PixelFormatUsage, TextureDesc, TextureType,
};
use super::capability_set::{CapabilitySet, DriverPaths, Feature, Limit};

/// Derives a `CapabilitySet` from the driver
pub struct CapabilityProber;

impl CapabilityProber {
    /// Query features, limits and texture types
    pub fn probe<D: GraphicsDevice + ?Sized>(device: &D) -> CapabilitySet {
        let info = device.driver_info();

        let mut limits = [0.0; Limit::COUNT];
        for limit in Limit::ALL {
            limits[limit.index()] = device.query_limit(limit);
        }

        let mut caps = CapabilitySet::new(
            Self::derive_features(&info),
            limits,
            Self::derive_paths(&info),
        );

        for texture_type in TextureType::ALL {
            caps.set_texture_type_supported(texture_type, device.is_texture_type_supported(texture_type));
        }

        engine_debug!("lumen::CapabilityProber",
            "Probed {:?} {}.{} ({} features enabled)",
            info.api, info.version.0, info.version.1,
            Feature::ALL.iter().filter(|f| caps.feature(**f)).count());

        caps
    }

    /// Feature flags implied by a driver description
    ///
    /// Without an extension string every flag is false.
    pub fn derive_features(info: &DriverInfo) -> [bool; Feature::COUNT] {
        let mut features = [false; Feature::COUNT];
        if info.extensions.is_none() {
            return features;
        }

        let desktop = !info.is_embedded();
        let es3 = info.es_at_least(3, 0);

        for feature in Feature::ALL {
            let supported = match feature {
                Feature::MultiRenderTargetFormats => {
                    info.desktop_at_least(3, 0)
                        || info.has_extension("GL_ARB_framebuffer_object")
                        || es3
                }
                Feature::ClampZero => {
                    desktop
                        || info.has_extension("GL_EXT_texture_border_clamp")
                        || info.has_extension("GL_NV_texture_border_clamp")
                }
                Feature::BlendMinMax | Feature::Lighten => {
                    info.desktop_at_least(1, 4) || es3 || info.has_extension("GL_EXT_blend_minmax")
                }
                Feature::FullNpot => {
                    info.desktop_at_least(2, 0) || es3 || info.has_extension("GL_OES_texture_npot")
                }
                Feature::PixelShaderHighp => {
                    desktop || es3 || info.has_extension("GL_OES_fragment_precision_high")
                }
                Feature::ShaderDerivatives => {
                    info.desktop_at_least(2, 0)
                        || es3
                        || info.has_extension("GL_OES_standard_derivatives")
                }
                Feature::Glsl3 => es3 || info.core_profile,
                Feature::Glsl4 => {
                    info.es_at_least(3, 1) || (info.core_profile && info.desktop_at_least(4, 3))
                }
                Feature::Instancing => {
                    info.desktop_at_least(3, 3)
                        || es3
                        || info.has_extension("GL_ARB_instanced_arrays")
                        || info.has_extension("GL_EXT_instanced_arrays")
                }
                Feature::TexelBuffer => {
                    info.desktop_at_least(3, 1)
                        || info.es_at_least(3, 2)
                        || info.has_extension("GL_ARB_texture_buffer_object")
                }
                Feature::CopyBuffer => {
                    info.desktop_at_least(3, 1) || es3 || info.has_extension("GL_ARB_copy_buffer")
                }
            };
            features[feature.index()] = supported;
        }

        features
    }

    /// Driver code paths implied by a driver description
    pub fn derive_paths(info: &DriverInfo) -> DriverPaths {
        if info.extensions.is_none() {
            return DriverPaths::default();
        }

        let es3 = info.es_at_least(3, 0);
        let framebuffer_blit = info.desktop_at_least(3, 0)
            || info.has_extension("GL_ARB_framebuffer_object")
            || es3
            || info.has_extension("GL_EXT_framebuffer_blit");

        DriverPaths {
            base_vertex: info.desktop_at_least(3, 2)
                || info.es_at_least(3, 2)
                || info.has_extension("GL_ARB_draw_elements_base_vertex")
                || info.has_extension("GL_OES_draw_elements_base_vertex")
                || info.has_extension("GL_EXT_draw_elements_base_vertex"),
            framebuffer_blit,
            multisample_resolve_apple: info.has_extension("GL_APPLE_framebuffer_multisample"),
            invalidate_framebuffer: info.desktop_at_least(4, 3)
                || info.has_extension("GL_ARB_invalidate_subdata")
                || es3
                || info.has_extension("GL_EXT_discard_framebuffer"),
            framebuffer_srgb: info.desktop_at_least(3, 0)
                || info.has_extension("GL_ARB_framebuffer_sRGB")
                || info.has_extension("GL_EXT_sRGB_write_control"),
            clear_buffer: info.desktop_at_least(3, 0) || es3,
            wireframe: !info.is_embedded(),
        }
    }

    /// Resolve the logical `Normal`/`Hdr` formats to sized ones
    ///
    /// Sized formats are returned unchanged.
    pub fn sized_format<D: GraphicsDevice + ?Sized>(
        device: &D,
        format: PixelFormat,
        render_target: bool,
        readable: bool,
        gamma_correct: bool,
    ) -> PixelFormat {
        match format {
            PixelFormat::Normal => {
                if gamma_correct {
                    PixelFormat::Srgba8Unorm
                } else if !device
                    .pixel_format_usage(PixelFormat::Rgba8Unorm)
                    .contains(required_usage(render_target, readable))
                {
                    // 32-bit render targets are not guaranteed on older ES drivers
                    PixelFormat::Rgba4Unorm
                } else {
                    PixelFormat::Rgba8Unorm
                }
            }
            PixelFormat::Hdr => PixelFormat::Rgba16Float,
            other => other,
        }
    }
}

fn required_usage(render_target: bool, readable: bool) -> PixelFormatUsage {
    let mut flags = PixelFormatUsage::empty();
    if render_target {
        flags |= PixelFormatUsage::RENDERTARGET;
    }
    if readable {
        flags |= PixelFormatUsage::SAMPLE;
    }
    flags
}

/// Memoization key of a format support query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatQuery {
    pub format: PixelFormat,
    pub render_target: bool,
    pub readable: bool,
    pub srgb: bool,
}

/// Per-context table of verified pixel format support
#[derive(Debug, Default)]
pub struct FormatSupportCache {
    entries: FxHashMap<FormatQuery, bool>,
    attach_tests: u32,
}

impl FormatSupportCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `format` can be used with the requested render-target/readable/sRGB usage
    ///
    /// Advertised usage flags are checked first. Color render-target formats
    /// are then verified with a 1x1 attach-and-check on a scratch framebuffer.
    pub fn is_supported<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        format: PixelFormat,
        render_target: bool,
        readable: bool,
        srgb: bool,
        gamma_correct: bool,
    ) -> bool {
        let (mut format, mut srgb) = (format, srgb);
        if srgb && format == PixelFormat::Rgba8Unorm {
            format = format.srgb_equivalent();
            srgb = false;
        }

        let format = CapabilityProber::sized_format(&*device, format, render_target, readable, gamma_correct);
        let query = FormatQuery { format, render_target, readable, srgb };

        if let Some(&supported) = self.entries.get(&query) {
            return supported;
        }

        let supported = self.evaluate(device, query);
        self.entries.insert(query, supported);
        supported
    }

    fn evaluate<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, query: FormatQuery) -> bool {
        let required = required_usage(query.render_target, query.readable);
        if !device.pixel_format_usage(query.format).contains(required) {
            return false;
        }

        if !query.render_target {
            return true;
        }

        // Depth/stencil-only attach tests are not reliable across drivers
        if query.format.is_depth_stencil() {
            return true;
        }

        self.attach_tests += 1;
        let supported = attach_test(device, query.format, query.readable);

        if !supported {
            engine_debug!("lumen::CapabilityProber",
                "Render target format {:?} (readable: {}) failed the attach test",
                query.format, query.readable);
        }

        supported
    }

    /// Number of attach tests actually run against the device
    pub fn attach_test_count(&self) -> u32 {
        self.attach_tests
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every result (after a context reset)
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn attach_test<D: GraphicsDevice + ?Sized>(device: &mut D, format: PixelFormat, readable: bool) -> bool {
    let previous = device.bound_framebuffer();

    let framebuffer = match device.create_framebuffer() {
        Ok(fb) => fb,
        Err(_) => return false,
    };
    device.bind_framebuffer(FramebufferTarget::All, framebuffer);

    let attachment = attachment_for(format, 0);
    let status = if readable {
        let desc = TextureDesc {
            format,
            render_target: true,
            readable: Some(true),
            ..TextureDesc::default()
        };
        device.create_texture(&desc, None).map(|texture| {
            device.attach_texture(attachment, TextureType::Tex2D, texture, 0, AttachmentLayer::None);
            let status = device.check_framebuffer_status();
            device.delete_texture(texture);
            status
        })
    } else {
        device.create_renderbuffer(format, 1, 1, 1).map(|renderbuffer| {
            device.attach_renderbuffer(attachment, renderbuffer);
            let status = device.check_framebuffer_status();
            device.delete_renderbuffer(renderbuffer);
            status
        })
    };

    device.bind_framebuffer(FramebufferTarget::All, previous);
    device.delete_framebuffer(framebuffer);

    matches!(status, Ok(FramebufferStatus::Complete))
}

#[cfg(test)]
#[path = "capability_prober_tests.rs"]
mod tests;
