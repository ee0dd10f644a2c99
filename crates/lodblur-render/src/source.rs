//! Decoded source image, uploaded once as the level-0 texture.

use std::path::Path;

use anyhow::{Context, Result};

use crate::texture::{Texture, COLOR_FORMAT};

/// 32-bit BGRA pixels, row-major, tightly packed.
#[derive(Debug, Clone)]
pub struct SourceImage {
    width: u32,
    height: u32,
    bgra: Vec<u8>,
}

impl SourceImage {
    /// Decodes a bundled image file (PNG, JPEG, BMP).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path)
            .with_context(|| format!("failed to decode source image {}", path.display()))?
            .to_rgba8();
        Ok(Self::from_rgba(&img))
    }

    pub fn from_rgba(img: &image::RgbaImage) -> Self {
        let mut bgra = img.as_raw().clone();
        for px in bgra.chunks_exact_mut(4) {
            px.swap(0, 2);
        }
        Self {
            width: img.width(),
            height: img.height(),
            bgra,
        }
    }

    /// Procedural stand-in used when no image file is configured: a
    /// checkerboard over a diagonal color ramp, so blur strength and level
    /// changes are visible.
    pub fn test_pattern(width: u32, height: u32) -> Self {
        let cell = (width.max(height) / 16).max(1);
        let img = image::RgbaImage::from_fn(width, height, |x, y| {
            let on = ((x / cell) + (y / cell)) % 2 == 0;
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            if on {
                image::Rgba([r, g, 200, 255])
            } else {
                image::Rgba([r / 4, g / 4, 40, 255])
            }
        });
        Self::from_rgba(&img)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.bgra
    }

    /// Uploads the pixels into a single-level BGRA texture that can be
    /// copied from (mip generation) and sampled.
    pub fn upload(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Texture> {
        let max = device.limits().max_texture_dimension_2d;
        anyhow::ensure!(
            self.width > 0 && self.height > 0,
            "source image has zero size"
        );
        anyhow::ensure!(
            self.width <= max && self.height <= max,
            "source image {}x{} exceeds the device limit of {max}",
            self.width,
            self.height
        );

        let texture = Texture::new(
            device,
            "lodblur source",
            (self.width, self.height),
            COLOR_FORMAT,
            1,
            wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
        );

        queue.write_texture(
            texture.copy_info(0),
            &self.bgra,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * self.width),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );

        Ok(texture)
    }
}
