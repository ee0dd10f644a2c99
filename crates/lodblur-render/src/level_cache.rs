//! The level-of-detail ladder.
//!
//! Each rung is a standalone texture holding one mip level of the source, so
//! a pass can bind "level N" without a view into a shared chain. The ladder
//! is built once and never mutated afterwards.

use std::sync::Arc;

use anyhow::{ensure, Result};

use crate::texture::{mip_extent, Texture};

/// Default cap on the number of rungs.
pub const DEFAULT_MAX_LEVELS: u32 = 5;

/// Number of rungs for a source with `mip_count` levels, capped at `max_levels`.
pub fn ladder_length(mip_count: u32, max_levels: u32) -> u32 {
    mip_count.min(max_levels).max(1)
}

/// Maps a scale in `[0, 1]` to a rung index in `[0, len - 1]`.
///
/// Linear across the ladder with round-to-nearest. Out-of-range scales
/// saturate and NaN maps to level 0.
pub fn level_for_scale(scale: f32, len: u32) -> u32 {
    if len <= 1 || scale.is_nan() {
        return 0;
    }
    let top = (len - 1) as f32;
    let level = (scale.clamp(0.0, 1.0) * top).round();
    (level as u32).min(len - 1)
}

pub struct TextureLevelCache {
    levels: Vec<Arc<Texture>>,
}

impl TextureLevelCache {
    /// Copies the first `min(mip_count, max_levels)` levels of `source` into
    /// standalone textures and submits the copies.
    ///
    /// `source` must carry `COPY_SRC`. When it has a single level the ladder
    /// has a single rung.
    pub fn build_ladder(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        source: &Texture,
        max_levels: u32,
    ) -> Result<Self> {
        ensure!(
            source.texture.usage().contains(wgpu::TextureUsages::COPY_SRC),
            "ladder source must be copyable"
        );

        let len = ladder_length(source.mip_count(), max_levels);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("lodblur ladder encoder"),
        });

        let mut levels = Vec::with_capacity(len as usize);
        for level in 0..len {
            let (width, height) = mip_extent(source.width(), source.height(), level);
            let rung = Texture::new(
                device,
                &format!("lodblur ladder level {level}"),
                (width, height),
                source.format(),
                1,
                wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            );
            encoder.copy_texture_to_texture(
                source.copy_info(level),
                rung.copy_info(0),
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
            log::debug!("ladder level {level}: {width}x{height}");
            levels.push(Arc::new(rung));
        }

        queue.submit(Some(encoder.finish()));
        Ok(Self { levels })
    }

    pub fn len(&self) -> u32 {
        self.levels.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Rung at `level`, clamped to the ladder.
    pub fn texture_at_level(&self, level: u32) -> &Arc<Texture> {
        let index = (level as usize).min(self.levels.len() - 1);
        &self.levels[index]
    }

    pub fn level_for_normalized_scale(&self, scale: f32) -> u32 {
        level_for_scale(scale, self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn five_level_ladder_spans_zero_to_four() {
        assert_eq!(level_for_scale(0.0, 5), 0);
        assert_eq!(level_for_scale(1.0, 5), 4);
        assert_eq!(level_for_scale(0.5, 5), 2);
    }

    #[test]
    fn out_of_range_scales_saturate() {
        assert_eq!(level_for_scale(-3.0, 5), 0);
        assert_eq!(level_for_scale(7.5, 5), 4);
        assert_eq!(level_for_scale(f32::INFINITY, 5), 4);
        assert_eq!(level_for_scale(f32::NEG_INFINITY, 5), 0);
        assert_eq!(level_for_scale(f32::NAN, 5), 0);
    }

    #[test]
    fn single_rung_always_level_zero() {
        assert_eq!(level_for_scale(0.0, 1), 0);
        assert_eq!(level_for_scale(1.0, 1), 0);
        assert_eq!(level_for_scale(0.3, 0), 0);
    }

    #[test]
    fn ladder_length_is_capped() {
        assert_eq!(ladder_length(11, DEFAULT_MAX_LEVELS), 5);
        assert_eq!(ladder_length(3, DEFAULT_MAX_LEVELS), 3);
        assert_eq!(ladder_length(1, DEFAULT_MAX_LEVELS), 1);
        assert_eq!(ladder_length(0, DEFAULT_MAX_LEVELS), 1);
    }

    proptest! {
        #[test]
        fn level_is_monotonic(a in 0.0f32..=1.0, b in 0.0f32..=1.0, len in 1u32..16) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(level_for_scale(lo, len) <= level_for_scale(hi, len));
        }

        #[test]
        fn level_stays_on_ladder(scale in -10.0f32..10.0, len in 1u32..16) {
            prop_assert!(level_for_scale(scale, len) < len);
        }
    }
}
