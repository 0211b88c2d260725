use crate::coords::Viewport;

/// Renderer-facing context: device/queue plus the current target size.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    /// Target size in physical pixels.
    pub viewport: Viewport,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue, viewport: Viewport) -> Self {
        Self { device, queue, viewport }
    }
}

/// Target for drawing: the encoder, the color view and its format.
///
/// The format selects which cached pipeline variant a shader uses, so the
/// same renderables can draw to the window surface and to offscreen textures.
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
    pub format: wgpu::TextureFormat,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(
        encoder: &'a mut wgpu::CommandEncoder,
        color_view: &'a wgpu::TextureView,
        format: wgpu::TextureFormat,
    ) -> Self {
        Self { encoder, color_view, format }
    }
}
