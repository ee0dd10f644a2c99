//! The textured quad every frame is composited onto.
//!
//! Owns the vertex and index buffers, one uniform buffer per in-flight frame,
//! and the [`FrameGate`] that keeps the CPU from rewriting a uniform buffer
//! the GPU may still be reading.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::frame_gate::FrameGate;
use crate::texture::Texture;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PlaneVertex {
    pub position: [f32; 4],
    pub normal: [f32; 4],
    pub tex_coord: [f32; 2],
}

impl PlaneVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x4, 1 => Float32x4, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PlaneVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

const NORMAL: [f32; 4] = [0.0, 0.0, 1.0, 0.0];

pub const PLANE_VERTICES: [PlaneVertex; 4] = [
    PlaneVertex {
        position: [-1.0, -1.0, 0.0, 1.0],
        normal: NORMAL,
        tex_coord: [0.0, 1.0],
    },
    PlaneVertex {
        position: [1.0, -1.0, 0.0, 1.0],
        normal: NORMAL,
        tex_coord: [1.0, 1.0],
    },
    PlaneVertex {
        position: [1.0, 1.0, 0.0, 1.0],
        normal: NORMAL,
        tex_coord: [1.0, 0.0],
    },
    PlaneVertex {
        position: [-1.0, 1.0, 0.0, 1.0],
        normal: NORMAL,
        tex_coord: [0.0, 0.0],
    },
];

pub const PLANE_INDICES: [u16; 6] = [3, 1, 2, 0, 1, 3];

/// World and projection matrices, column-major.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SceneUniforms {
    pub world: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl SceneUniforms {
    pub fn new(world: Mat4, projection: Mat4) -> Self {
        Self {
            world: world.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
        }
    }
}

struct UniformSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

pub struct GeometryPlane {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    slots: Vec<UniformSlot>,
    next_slot: usize,
    texture: Arc<Texture>,
    scale: Vec3,
    gate: FrameGate,
}

impl GeometryPlane {
    /// `uniforms_layout` must describe a single uniform buffer at binding 0.
    pub fn new(
        device: &wgpu::Device,
        uniforms_layout: &wgpu::BindGroupLayout,
        texture: Arc<Texture>,
        max_frames_in_flight: usize,
    ) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lodblur plane vertices"),
            contents: bytemuck::cast_slice(&PLANE_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lodblur plane indices"),
            contents: bytemuck::cast_slice(&PLANE_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        let gate = FrameGate::new(max_frames_in_flight);
        let slots = (0..gate.capacity())
            .map(|i| {
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("lodblur plane uniforms {i}")),
                    size: std::mem::size_of::<SceneUniforms>() as wgpu::BufferAddress,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("lodblur plane uniforms bind group {i}")),
                    layout: uniforms_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                });
                UniformSlot { buffer, bind_group }
            })
            .collect();

        let scale = aspect_scale(&texture);
        Self {
            vertices,
            indices,
            slots,
            next_slot: 0,
            texture,
            scale,
            gate,
        }
    }

    pub fn texture(&self) -> &Arc<Texture> {
        &self.texture
    }

    /// Scales the unit quad so the texture keeps its aspect ratio.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale(self.scale)
    }

    pub fn index_count(&self) -> u32 {
        PLANE_INDICES.len() as u32
    }

    pub fn gate(&self) -> &FrameGate {
        &self.gate
    }

    /// Writes this frame's matrices into the next uniform slot and returns
    /// the slot index.
    ///
    /// Only call while holding a permit from [`Self::gate`]: the slot being
    /// written belongs to the oldest frame, which the permit proves has
    /// retired.
    pub fn write_uniforms(&mut self, queue: &wgpu::Queue, world: Mat4, projection: Mat4) -> usize {
        let slot = self.next_slot;
        self.next_slot = (self.next_slot + 1) % self.slots.len();
        queue.write_buffer(
            &self.slots[slot].buffer,
            0,
            bytemuck::bytes_of(&SceneUniforms::new(world, projection)),
        );
        slot
    }

    pub fn uniforms(&self, slot: usize) -> &wgpu::BindGroup {
        &self.slots[slot % self.slots.len()].bind_group
    }

    pub fn bind_geometry(&self, rpass: &mut wgpu::RenderPass<'_>) {
        rpass.set_vertex_buffer(0, self.vertices.slice(..));
        rpass.set_index_buffer(self.indices.slice(..), wgpu::IndexFormat::Uint16);
    }
}

fn aspect_scale(texture: &Texture) -> Vec3 {
    let aspect = texture.height() as f32 / texture.width().max(1) as f32;
    Vec3::new(1.0, aspect, 1.0)
}
