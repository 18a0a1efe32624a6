//! Render targets that receive decoded YUY2 frames
//!
//! The engine owns exactly one [`VideoTexture`] at a time and hands it to the
//! host by reference. Which kind it creates is decided by the
//! [`TextureTarget`] the engine was built with.

use common::{BYTES_PER_PIXEL, VideoError, frame_size};

#[cfg(feature = "gpu")]
use crate::gpu::{GpuContext, GpuTexture};
#[cfg(feature = "gpu")]
use std::sync::Arc;

/// Where textures are allocated
#[derive(Debug, Clone, Default)]
pub enum TextureTarget {
    /// Streaming texture in system memory
    #[default]
    Cpu,
    /// Texture on a wgpu device
    #[cfg(feature = "gpu")]
    Gpu(Arc<GpuContext>),
}

impl TextureTarget {
    /// Allocate a YUY2 texture of the given size
    pub fn create(&self, width: u32, height: u32) -> Result<VideoTexture, VideoError> {
        if width == 0 || height == 0 {
            return Err(VideoError::Texture(format!(
                "Invalid texture size {}x{}",
                width, height
            )));
        }

        match self {
            TextureTarget::Cpu => Ok(VideoTexture::Cpu(CpuTexture::new(width, height))),
            #[cfg(feature = "gpu")]
            TextureTarget::Gpu(context) => Ok(VideoTexture::Gpu(GpuTexture::yuy2(
                Arc::clone(context),
                width,
                height,
            ))),
        }
    }
}

/// Texture handed to the host renderer
#[derive(Debug)]
pub enum VideoTexture {
    Cpu(CpuTexture),
    #[cfg(feature = "gpu")]
    Gpu(GpuTexture),
}

impl VideoTexture {
    pub fn width(&self) -> u32 {
        match self {
            VideoTexture::Cpu(texture) => texture.width,
            #[cfg(feature = "gpu")]
            VideoTexture::Gpu(texture) => texture.width,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            VideoTexture::Cpu(texture) => texture.height,
            #[cfg(feature = "gpu")]
            VideoTexture::Gpu(texture) => texture.height,
        }
    }

    /// Bytes expected by [`VideoTexture::upload`]
    pub fn byte_size(&self) -> usize {
        frame_size(self.width(), self.height())
    }

    /// Replace the texture contents with a tightly packed YUY2 frame
    pub fn upload(&mut self, data: &[u8]) -> Result<(), VideoError> {
        if data.len() != self.byte_size() {
            return Err(VideoError::Texture(format!(
                "Invalid texture data size: expected {} bytes ({}x{} YUY2), got {} bytes",
                self.byte_size(),
                self.width(),
                self.height(),
                data.len()
            )));
        }

        match self {
            VideoTexture::Cpu(texture) => {
                texture.pixels.copy_from_slice(data);
                texture.uploads += 1;
            }
            #[cfg(feature = "gpu")]
            VideoTexture::Gpu(texture) => texture.write(data),
        }
        Ok(())
    }
}

/// YUY2 texture kept in system memory
#[derive(Debug, Clone)]
pub struct CpuTexture {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    uploads: u64,
}

impl CpuTexture {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; frame_size(width, height)],
            uploads: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw YUY2 bytes
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Number of frames written into this texture
    pub fn uploads(&self) -> u64 {
        self.uploads
    }

    /// Convert to RGBA8 using BT.601 limited-range coefficients
    pub fn to_rgba(&self) -> Vec<u8> {
        let row = self.width as usize * BYTES_PER_PIXEL;
        let mut rgba = Vec::with_capacity(self.width as usize * self.height as usize * 4);

        if row == 0 {
            return rgba;
        }

        // Macropixels never straddle rows; odd widths end each row on a half one
        for line in self.pixels.chunks_exact(row) {
            for macropixel in line.chunks(2 * BYTES_PER_PIXEL) {
                match *macropixel {
                    [y0, u, y1, v] => {
                        rgba.extend_from_slice(&yuv_to_rgba(y0, u, v));
                        rgba.extend_from_slice(&yuv_to_rgba(y1, u, v));
                    }
                    [y, u] => rgba.extend_from_slice(&yuv_to_rgba(y, u, 128)),
                    _ => {}
                }
            }
        }

        rgba
    }
}

fn yuv_to_rgba(y: u8, u: u8, v: u8) -> [u8; 4] {
    let c = (y as i32 - 16) * 298;
    let d = u as i32 - 128;
    let e = v as i32 - 128;

    let clamp = |value: i32| ((value + 128) >> 8).clamp(0, 255) as u8;

    [
        clamp(c + 409 * e),
        clamp(c - 100 * d - 208 * e),
        clamp(c + 516 * d),
        255,
    ]
}

/// Pack `height` rows of `width * 2` bytes out of a buffer with the given stride
pub(crate) fn pack_rows(src: &[u8], width: u32, height: u32, stride: usize, dst: &mut Vec<u8>) {
    let row = width as usize * BYTES_PER_PIXEL;
    dst.clear();
    for line in src.chunks(stride).take(height as usize) {
        dst.extend_from_slice(&line[..row.min(line.len())]);
    }
}
