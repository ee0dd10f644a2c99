//! GPU texture handle shared between the ladder, the passes, and the
//! mipmap generator.

/// Format of the source image, the ladder, and every intermediate target.
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8Unorm;

/// Number of levels in a full mip chain for a `width` x `height` image:
/// `floor(log2(max(width, height))) + 1`.
pub fn full_mip_count(width: u32, height: u32) -> u32 {
    let largest = width.max(height).max(1);
    u32::BITS - largest.leading_zeros()
}

/// Extent of mip `level` of a `width` x `height` image; never below 1x1.
pub fn mip_extent(width: u32, height: u32, level: u32) -> (u32, u32) {
    let w = width.checked_shr(level).unwrap_or(0).max(1);
    let h = height.checked_shr(level).unwrap_or(0).max(1);
    (w, h)
}

/// A 2D texture and its default (all mips) view.
#[derive(Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl Texture {
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        (width, height): (u32, u32),
        format: wgpu::TextureFormat,
        mip_level_count: u32,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    pub fn width(&self) -> u32 {
        self.texture.width()
    }

    pub fn height(&self) -> u32 {
        self.texture.height()
    }

    pub fn extent(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.texture.format()
    }

    pub fn mip_count(&self) -> u32 {
        self.texture.mip_level_count()
    }

    /// View restricted to a single mip level.
    pub fn level_view(&self, level: u32, usage: wgpu::TextureUsages) -> wgpu::TextureView {
        self.texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("lodblur level view"),
            dimension: Some(wgpu::TextureViewDimension::D2),
            base_mip_level: level,
            mip_level_count: Some(1),
            usage: Some(usage),
            ..Default::default()
        })
    }

    /// Copy source/destination for `level`.
    pub fn copy_info(&self, level: u32) -> wgpu::TexelCopyTextureInfo<'_> {
        wgpu::TexelCopyTextureInfo {
            texture: &self.texture,
            mip_level: level,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_mip_count_uses_larger_dimension() {
        assert_eq!(full_mip_count(1, 1), 1);
        assert_eq!(full_mip_count(2, 1), 2);
        assert_eq!(full_mip_count(16, 4), 5);
        assert_eq!(full_mip_count(17, 4), 5);
        assert_eq!(full_mip_count(720, 1280), 11);
    }

    #[test]
    fn full_mip_count_treats_zero_as_one() {
        assert_eq!(full_mip_count(0, 0), 1);
    }

    #[test]
    fn mip_extent_halves_and_saturates_at_one() {
        assert_eq!(mip_extent(720, 1280, 0), (720, 1280));
        assert_eq!(mip_extent(720, 1280, 1), (360, 640));
        assert_eq!(mip_extent(720, 1280, 10), (1, 1));
        assert_eq!(mip_extent(8, 2, 2), (2, 1));
        assert_eq!(mip_extent(8, 2, 40), (1, 1));
    }
}
