//! Bind group layouts, the shared sampler, and one pipeline per pass.
//!
//! Group 0 carries textures and the sampler, group 1 the scene uniforms, and
//! group 2 the sample level scalar read by the blur passes.

use std::num::NonZeroU64;

use anyhow::Result;

use crate::plane::{PlaneVertex, SceneUniforms};
use crate::sample_level::SampleLevelUniform;
use crate::shaders::{self, entry};
use crate::texture::COLOR_FORMAT;

use super::targets::DEPTH_FORMAT;

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn uniform_entry(visibility: wgpu::ShaderStages, size: usize) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(size as u64),
        },
        count: None,
    }
}

pub struct Layouts {
    /// Source texture, sampler, level reference texture.
    pub blur: wgpu::BindGroupLayout,
    /// Source texture and sampler.
    pub sampled: wgpu::BindGroupLayout,
    pub uniforms: wgpu::BindGroupLayout,
    pub level: wgpu::BindGroupLayout,
}

impl Layouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let blur = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lodblur blur layout"),
            entries: &[texture_entry(0), sampler_entry(1), texture_entry(2)],
        });
        let sampled = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lodblur sampled layout"),
            entries: &[texture_entry(0), sampler_entry(1)],
        });
        let uniforms = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lodblur scene uniforms layout"),
            entries: &[uniform_entry(
                wgpu::ShaderStages::VERTEX,
                std::mem::size_of::<SceneUniforms>(),
            )],
        });
        let level = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lodblur sample level layout"),
            entries: &[uniform_entry(
                wgpu::ShaderStages::FRAGMENT,
                std::mem::size_of::<SampleLevelUniform>(),
            )],
        });
        Self {
            blur,
            sampled,
            uniforms,
            level,
        }
    }
}

/// The sampler every pass shares: nearest within a level, linear between
/// levels, clamped at the edges.
pub fn create_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("lodblur sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        lod_min_clamp: 0.0,
        lod_max_clamp: 32.0,
        ..Default::default()
    })
}

pub struct PassPipelines {
    pub horizontal_blur: wgpu::RenderPipeline,
    pub vertical_blur: wgpu::RenderPipeline,
    pub upsample: wgpu::RenderPipeline,
    pub composite: wgpu::RenderPipeline,
}

struct PipelineDesc<'a> {
    label: &'a str,
    layout: &'a wgpu::PipelineLayout,
    vertex: &'a str,
    fragment: &'a str,
    format: wgpu::TextureFormat,
    depth: bool,
}

impl PassPipelines {
    /// Validates the pass programs and builds every pipeline. Intermediate
    /// passes render [`COLOR_FORMAT`]; the composite renders `surface_format`.
    pub fn new(device: &wgpu::Device, layouts: &Layouts, surface_format: wgpu::TextureFormat) -> Result<Self> {
        let shader = shaders::create_module(device, "lodblur passes", shaders::PASSES_WGSL, &entry::ALL)?;

        let blur_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lodblur blur pipeline layout"),
            bind_group_layouts: &[&layouts.blur, &layouts.uniforms, &layouts.level],
            immediate_size: 0,
        });
        let upsample_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lodblur upsample pipeline layout"),
            bind_group_layouts: &[&layouts.sampled],
            immediate_size: 0,
        });
        let composite_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lodblur composite pipeline layout"),
            bind_group_layouts: &[&layouts.sampled, &layouts.uniforms],
            immediate_size: 0,
        });

        let build = |desc: PipelineDesc<'_>| create_pipeline(device, &shader, desc);

        Ok(Self {
            horizontal_blur: build(PipelineDesc {
                label: "lodblur horizontal blur pipeline",
                layout: &blur_layout,
                vertex: entry::BASIC_VERTEX,
                fragment: entry::HORIZONTAL_BOX_BLUR_FRAGMENT,
                format: COLOR_FORMAT,
                depth: false,
            }),
            vertical_blur: build(PipelineDesc {
                label: "lodblur vertical blur pipeline",
                layout: &blur_layout,
                vertex: entry::BASIC_VERTEX,
                fragment: entry::VERTICAL_BOX_BLUR_FRAGMENT,
                format: COLOR_FORMAT,
                depth: false,
            }),
            upsample: build(PipelineDesc {
                label: "lodblur upsample pipeline",
                layout: &upsample_layout,
                vertex: entry::BASIC_VERTEX,
                fragment: entry::BASIC_FRAGMENT,
                format: COLOR_FORMAT,
                depth: false,
            }),
            composite: build(PipelineDesc {
                label: "lodblur composite pipeline",
                layout: &composite_layout,
                vertex: entry::COMPOSITE_VERTEX,
                fragment: entry::COMPOSITE_FRAGMENT,
                format: surface_format,
                depth: true,
            }),
        })
    }
}

fn create_pipeline(device: &wgpu::Device, shader: &wgpu::ShaderModule, desc: PipelineDesc<'_>) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(desc.layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(desc.vertex),
            compilation_options: Default::default(),
            buffers: &[PlaneVertex::layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(desc.fragment),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: desc.format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: desc.depth.then(|| wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}
