use std::cell::OnceCell;

use image::RgbaImage;

use super::RenderCtx;

pub(crate) struct TextureGpu {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// An RGBA texture with a paired sampler.
///
/// Pixels stay on the CPU until the first draw that samples the texture.
pub struct Texture {
    name: String,
    width: u32,
    height: u32,
    filter: wgpu::FilterMode,
    /// Data textures (distance fields) must not be sRGB-decoded.
    linear: bool,
    pixels: RgbaImage,
    gpu: OnceCell<TextureGpu>,
}

impl Texture {
    pub fn from_image(name: &str, image: RgbaImage) -> Self {
        Self {
            name: name.to_owned(),
            width: image.width().max(1),
            height: image.height().max(1),
            filter: wgpu::FilterMode::Linear,
            linear: false,
            pixels: image,
            gpu: OnceCell::new(),
        }
    }

    /// 1x1 opaque red, used while nothing better is available.
    pub fn placeholder(name: &str) -> Self {
        Self::from_image(name, RgbaImage::from_pixel(1, 1, image::Rgba([255, 0, 0, 255])))
    }

    pub fn with_filter(mut self, filter: wgpu::FilterMode) -> Self {
        self.filter = filter;
        self
    }

    /// Stores texel values as-is instead of treating them as sRGB colour.
    pub fn linear(mut self) -> Self {
        self.linear = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn filter(&self) -> wgpu::FilterMode {
        self.filter
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    fn format(&self) -> wgpu::TextureFormat {
        if self.linear {
            wgpu::TextureFormat::Rgba8Unorm
        } else {
            wgpu::TextureFormat::Rgba8UnormSrgb
        }
    }

    /// Creates and fills the GPU texture once.
    pub(crate) fn upload(&self, ctx: &RenderCtx<'_>) -> &TextureGpu {
        self.gpu.get_or_init(|| {
            let size = wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            };
            let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(&self.name),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: self.format(),
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });

            let pixels = &self.pixels;
            if pixels.width() == self.width && pixels.height() == self.height {
                ctx.queue.write_texture(
                    wgpu::TexelCopyTextureInfo {
                        texture: &texture,
                        mip_level: 0,
                        origin: wgpu::Origin3d::ZERO,
                        aspect: wgpu::TextureAspect::All,
                    },
                    pixels.as_raw(),
                    wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(4 * self.width),
                        rows_per_image: Some(self.height),
                    },
                    size,
                );
            } else {
                log::warn!("texture `{}` is empty, left uninitialized", self.name);
            }

            log::debug!("uploaded texture `{}` ({}x{})", self.name, self.width, self.height);
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            let sampler = create_sampler(ctx.device, &self.name, self.filter);
            TextureGpu { _texture: texture, view, sampler }
        })
    }
}

fn create_sampler(device: &wgpu::Device, name: &str, filter: wgpu::FilterMode) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(name),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_single_red_pixel() {
        let tex = Texture::placeholder("missing");
        assert_eq!((tex.width(), tex.height()), (1, 1));
        assert_eq!(tex.pixels().get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn builders_set_sampling() {
        let tex = Texture::from_image("font", RgbaImage::new(8, 8))
            .with_filter(wgpu::FilterMode::Nearest)
            .linear();
        assert_eq!(tex.filter(), wgpu::FilterMode::Nearest);
        assert_eq!(tex.format(), wgpu::TextureFormat::Rgba8Unorm);
    }

    #[test]
    fn color_textures_default_to_srgb() {
        let tex = Texture::from_image("planets", RgbaImage::new(2, 2));
        assert_eq!(tex.format(), wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(tex.filter(), wgpu::FilterMode::Linear);
    }
}
