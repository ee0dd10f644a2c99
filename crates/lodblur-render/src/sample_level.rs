//! The GPU-visible sample level read by the blur passes.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// Remembers the last level handed to the GPU.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LevelTracker {
    current: u32,
}

impl LevelTracker {
    pub fn current(&self) -> u32 {
        self.current
    }

    /// Stores `level`; returns whether it differed from the stored one.
    pub fn update(&mut self, level: u32) -> bool {
        if level == self.current {
            return false;
        }
        self.current = level;
        true
    }
}

/// Uniform layout of the level scalar; padded to 16 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SampleLevelUniform {
    pub level: u32,
    pub _pad: [u32; 3],
}

impl SampleLevelUniform {
    pub fn new(level: u32) -> Self {
        Self {
            level,
            _pad: [0; 3],
        }
    }
}

pub struct SampleLevelScalar {
    tracker: LevelTracker,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    writes: u64,
}

impl SampleLevelScalar {
    /// Creates the buffer holding level 0.
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lodblur sample level"),
            contents: bytemuck::bytes_of(&SampleLevelUniform::new(0)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lodblur sample level bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self {
            tracker: LevelTracker::default(),
            buffer,
            bind_group,
            writes: 0,
        }
    }

    pub fn current(&self) -> u32 {
        self.tracker.current()
    }

    /// Writes `level` to the GPU buffer only when it changed.
    pub fn set(&mut self, queue: &wgpu::Queue, level: u32) -> bool {
        if !self.tracker.update(level) {
            return false;
        }
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&SampleLevelUniform::new(level)));
        self.writes += 1;
        log::info!("new sample level: {level}");
        true
    }

    /// Buffer writes issued since creation.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_reports_only_changes() {
        let mut tracker = LevelTracker::default();
        assert!(!tracker.update(0));
        assert!(tracker.update(3));
        assert!(!tracker.update(3));
        assert!(tracker.update(1));
        assert_eq!(tracker.current(), 1);
    }

    #[test]
    fn uniform_is_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<SampleLevelUniform>(), 16);
        let uniform = SampleLevelUniform::new(7);
        let bytes = bytemuck::bytes_of(&uniform);
        assert_eq!(&bytes[..4], &7u32.to_ne_bytes());
    }
}
