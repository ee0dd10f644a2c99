//! Asynchronous GPU mip chain generation.
//!
//! [`TextureUtility::generate_mipmaps`] records the work into the caller's
//! encoder and hands back a [`PendingMipmaps`]. Once the caller has submitted
//! that encoder, [`PendingMipmaps::on_complete`] arranges for the finished
//! texture to be delivered from the queue's completion callback. Nothing is
//! delivered synchronously, and nothing at all is delivered when the format
//! cannot be mipmapped on this device.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Result;

use crate::shaders;
use crate::texture::{full_mip_count, mip_extent, Texture};

/// Usage every generated mip chain carries.
const CHAIN_USAGE: wgpu::TextureUsages = wgpu::TextureUsages::TEXTURE_BINDING
    .union(wgpu::TextureUsages::RENDER_ATTACHMENT)
    .union(wgpu::TextureUsages::COPY_SRC)
    .union(wgpu::TextureUsages::COPY_DST);

/// Spare chains kept around for reuse.
const MAX_SPARE: usize = 2;

pub struct TextureUtility {
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    shader: wgpu::ShaderModule,
    pipelines: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
    spare: Vec<Arc<Texture>>,
    unsupported_logged: HashSet<wgpu::TextureFormat>,
}

impl TextureUtility {
    pub fn new(device: &wgpu::Device) -> Result<Self> {
        let shader = shaders::create_module(
            device,
            "lodblur mipmap blit",
            shaders::MIPMAP_WGSL,
            &["vs_main", "fs_main"],
        )?;

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lodblur mipmap layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lodblur mipmap sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        Ok(Self {
            layout,
            sampler,
            shader,
            pipelines: HashMap::new(),
            spare: Vec::new(),
            unsupported_logged: HashSet::new(),
        })
    }

    /// Builds the blit pipeline for `format` ahead of the first generation.
    pub fn prepare(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) {
        if !self.pipelines.contains_key(&format) {
            let pipeline = self.create_pipeline(device, format);
            self.pipelines.insert(format, pipeline);
        }
    }

    /// Whether a full chain can be generated from `texture` on this device.
    ///
    /// The format must be renderable and filterable, and level 0 must be
    /// copyable out of the source.
    pub fn mipmaps_supported(device: &wgpu::Device, texture: &Texture) -> bool {
        let features = texture.format().guaranteed_format_features(device.features());
        let usages = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;

        features.allowed_usages.contains(usages)
            && features
                .flags
                .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE)
            && texture.texture.usage().contains(wgpu::TextureUsages::COPY_SRC)
    }

    /// Records generation of a full mip chain for `source`.
    ///
    /// The result is a separate texture: level 0 is copied from `source` and
    /// every further level is blitted from the one above. `source` itself is
    /// never modified. Returns `None` when the format is unsupported, in which
    /// case nothing is recorded and the caller keeps `source`.
    pub fn generate_mipmaps(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        source: &Texture,
    ) -> Option<PendingMipmaps> {
        if !Self::mipmaps_supported(device, source) {
            if self.unsupported_logged.insert(source.format()) {
                log::debug!(
                    "mipmap generation unsupported for {:?}; keeping the source texture",
                    source.format()
                );
            }
            return None;
        }

        self.prepare(device, source.format());

        let target = self.take_spare(source.extent(), source.format()).unwrap_or_else(|| {
            Arc::new(Texture::new(
                device,
                "lodblur mip chain",
                source.extent(),
                source.format(),
                full_mip_count(source.width(), source.height()),
                CHAIN_USAGE,
            ))
        });

        encoder.copy_texture_to_texture(
            source.copy_info(0),
            target.copy_info(0),
            wgpu::Extent3d {
                width: source.width(),
                height: source.height(),
                depth_or_array_layers: 1,
            },
        );
        self.encode_chain(device, encoder, &target);

        Some(PendingMipmaps { texture: target })
    }

    /// Returns a chain that is no longer displayed so a later generation can
    /// write into it instead of allocating.
    pub fn recycle(&mut self, texture: Arc<Texture>) {
        if self.spare.len() < MAX_SPARE {
            self.spare.push(texture);
        }
    }

    pub fn spare_count(&self) -> usize {
        self.spare.len()
    }

    fn take_spare(&mut self, extent: (u32, u32), format: wgpu::TextureFormat) -> Option<Arc<Texture>> {
        let index = self
            .spare
            .iter()
            .position(|t| t.extent() == extent && t.format() == format)?;
        Some(self.spare.swap_remove(index))
    }

    fn encode_chain(&self, device: &wgpu::Device, encoder: &mut wgpu::CommandEncoder, texture: &Texture) {
        let Some(pipeline) = self.pipelines.get(&texture.format()) else {
            return;
        };

        for level in 1..texture.mip_count() {
            let src_view = texture.level_view(level - 1, wgpu::TextureUsages::TEXTURE_BINDING);
            let dst_view = texture.level_view(level, wgpu::TextureUsages::RENDER_ATTACHMENT);

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("lodblur mipmap bind group"),
                layout: &self.layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&src_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            });

            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("lodblur mipmap pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &dst_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, &bind_group, &[]);
            rpass.draw(0..3, 0..1);
        }

        let (w, h) = mip_extent(texture.width(), texture.height(), texture.mip_count() - 1);
        log::trace!(
            "encoded {} mip levels down to {w}x{h}",
            texture.mip_count()
        );
    }

    fn create_pipeline(&self, device: &wgpu::Device, format: wgpu::TextureFormat) -> wgpu::RenderPipeline {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lodblur mipmap pipeline layout"),
            bind_group_layouts: &[&self.layout],
            immediate_size: 0,
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("lodblur mipmap pipeline {format:?}")),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }
}

/// A mip chain whose generation has been recorded but not yet observed
/// complete.
#[must_use = "call `on_complete` after submitting the encoder, or the chain is never delivered"]
pub struct PendingMipmaps {
    texture: Arc<Texture>,
}

impl PendingMipmaps {
    /// The texture being generated. Its contents are undefined until the
    /// completion fires.
    pub fn texture(&self) -> &Arc<Texture> {
        &self.texture
    }

    /// Delivers the finished chain to `completion` once all work submitted
    /// to `queue` so far has finished on the GPU.
    ///
    /// Call after the encoder that recorded the generation was submitted.
    /// The callback runs from wgpu's completion processing, which happens
    /// during a later `queue.submit` or `device.poll`.
    pub fn on_complete<F>(self, queue: &wgpu::Queue, completion: F)
    where
        F: FnOnce(Arc<Texture>) + Send + 'static,
    {
        let texture = self.texture;
        queue.on_submitted_work_done(move || completion(texture));
    }
}
