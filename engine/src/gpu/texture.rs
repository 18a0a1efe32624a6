use super::GpuContext;
use common::BYTES_PER_PIXEL;
use std::sync::Arc;
use wgpu;

/// YUY2 frame texture on the GPU
///
/// Each texel is one Rg8 pair: luma in `r`, the shared chroma sample in `g`
/// (U on even columns, V on odd ones). Host shaders rebuild RGB from that.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
    context: Arc<GpuContext>,
}

impl GpuTexture {
    /// Create an empty YUY2 texture of the given size
    pub fn yuy2(context: Arc<GpuContext>, width: u32, height: u32) -> Self {
        let texture = context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("GPU Video Texture (YUY2)"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rg8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        log::debug!("Created {}x{} YUY2 GPU texture", width, height);

        Self {
            texture,
            view,
            width,
            height,
            context,
        }
    }

    /// Upload a tightly packed frame; size is checked by the caller
    pub(crate) fn write(&self, data: &[u8]) {
        self.context.queue.write_texture(
            self.texture.as_image_copy(),
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.width * BYTES_PER_PIXEL as u32),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

impl std::fmt::Debug for GpuTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuTexture")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}
