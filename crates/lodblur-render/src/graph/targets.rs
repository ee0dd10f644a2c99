use std::sync::Arc;

use crate::texture::{Texture, COLOR_FORMAT};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Depth attachment for the composite pass, sized to the drawable.
#[derive(Default)]
pub struct DepthBuffer {
    texture: Option<Texture>,
}

impl DepthBuffer {
    /// Rebuilds the buffer when the drawable size changed. Returns whether a
    /// rebuild happened.
    pub fn ensure(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        let size = (width.max(1), height.max(1));
        if self.texture.as_ref().is_some_and(|t| t.extent() == size) {
            return false;
        }
        self.texture = Some(Texture::new(
            device,
            "lodblur depth",
            size,
            DEPTH_FORMAT,
            1,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        ));
        log::debug!("depth buffer rebuilt at {}x{}", size.0, size.1);
        true
    }

    pub fn extent(&self) -> Option<(u32, u32)> {
        self.texture.as_ref().map(Texture::extent)
    }

    pub fn view(&self) -> Option<&wgpu::TextureView> {
        self.texture.as_ref().map(|t| &t.view)
    }
}

/// The fixed-size outputs of the horizontal blur, vertical blur, and
/// upsample passes.
pub struct Intermediates {
    pub horizontal: Texture,
    pub vertical: Texture,
    /// Shared with the mip generator, which copies out of it.
    pub upsample: Arc<Texture>,
}

impl Intermediates {
    pub fn new(device: &wgpu::Device, size: (u32, u32)) -> Self {
        let size = (size.0.max(1), size.1.max(1));
        let usage = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        Self {
            horizontal: Texture::new(device, "lodblur horizontal blur target", size, COLOR_FORMAT, 1, usage),
            vertical: Texture::new(device, "lodblur vertical blur target", size, COLOR_FORMAT, 1, usage),
            upsample: Arc::new(Texture::new(
                device,
                "lodblur upsample target",
                size,
                COLOR_FORMAT,
                1,
                usage | wgpu::TextureUsages::COPY_SRC,
            )),
        }
    }
}
