//! The four-pass frame orchestrator.
//!
//! Every frame runs, in one command buffer:
//!
//! 1. horizontal blur: ladder texture at the current level -> `horizontal`
//! 2. vertical blur: `horizontal` -> `vertical`, sized against the ladder
//!    texture at the level read again for this pass
//! 3. upsample: `vertical` -> `upsample`, then a mip chain is scheduled for it
//! 4. composite: newest landed chain (or `upsample`) -> drawable, depth tested
//!
//! The intermediates are a fixed size regardless of source or drawable.
//! Mip chains land asynchronously through a channel, so the composite can
//! lag the upsample by a frame or more.

mod passes;
mod pipelines;
mod targets;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::camera::Camera;
use crate::frame_gate::FramePermit;
use crate::level_cache::{TextureLevelCache, DEFAULT_MAX_LEVELS};
use crate::mipmap::{PendingMipmaps, TextureUtility};
use crate::plane::GeometryPlane;
use crate::sample_level::SampleLevelScalar;
use crate::source::SourceImage;
use crate::texture::{Texture, COLOR_FORMAT};

pub use passes::{
    composite_depth_ops, FrameReport, LoadAction, PassDescriptor, PassKind, PassRecord,
};
pub use targets::{DepthBuffer, DEPTH_FORMAT};

use pipelines::{Layouts, PassPipelines};
use targets::Intermediates;

/// How long setup waits for the source image's mip chain.
const STARTUP_MIPMAP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphConfig {
    /// Size of the blur and upsample targets.
    pub intermediate_size: (u32, u32),
    pub max_frames_in_flight: usize,
    pub clear_color: wgpu::Color,
    pub max_ladder_levels: u32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            intermediate_size: (720, 1280),
            max_frames_in_flight: 1,
            clear_color: wgpu::Color {
                r: 0.5,
                g: 0.5,
                b: 0.5,
                a: 1.0,
            },
            max_ladder_levels: DEFAULT_MAX_LEVELS,
        }
    }
}

/// The drawable a frame composites into.
pub struct FrameTarget<'a> {
    pub view: &'a wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

pub struct RenderGraph {
    config: GraphConfig,
    layouts: Layouts,
    sampler: wgpu::Sampler,
    pipelines: PassPipelines,
    descriptors: [PassDescriptor; 3],

    cache: TextureLevelCache,
    plane: GeometryPlane,
    sample_level: SampleLevelScalar,
    mipmaps: TextureUtility,

    intermediates: Intermediates,
    depth: DepthBuffer,
    composite_source: Arc<Texture>,
    completions_tx: Sender<Arc<Texture>>,
    completions_rx: Receiver<Arc<Texture>>,
}

impl RenderGraph {
    /// Uploads `source`, mipmaps it, builds the ladder, and creates every
    /// pipeline and target.
    ///
    /// Blocks until the source's mip chain has landed so the ladder is built
    /// from it. Any failure here is a startup failure.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        source: &SourceImage,
        surface_format: wgpu::TextureFormat,
        config: GraphConfig,
    ) -> Result<Self> {
        let layouts = Layouts::new(device);
        let sampler = pipelines::create_sampler(device);
        let pipelines =
            PassPipelines::new(device, &layouts, surface_format).context("building pass pipelines")?;

        let mut mipmaps = TextureUtility::new(device).context("building mipmap generator")?;
        mipmaps.prepare(device, COLOR_FORMAT);

        let uploaded = Arc::new(source.upload(device, queue).context("uploading source image")?);
        let mipmapped = mipmap_source(device, queue, &mut mipmaps, &uploaded)?;

        let plane = GeometryPlane::new(
            device,
            &layouts.uniforms,
            mipmapped,
            config.max_frames_in_flight,
        );
        let cache = TextureLevelCache::build_ladder(device, queue, plane.texture(), config.max_ladder_levels)
            .context("building level ladder")?;
        log::info!(
            "ladder ready: {} levels from {}x{} source",
            cache.len(),
            source.width(),
            source.height()
        );

        let sample_level = SampleLevelScalar::new(device, &layouts.level);
        let intermediates = Intermediates::new(device, config.intermediate_size);
        let composite_source = intermediates.upsample.clone();
        let (completions_tx, completions_rx) = unbounded();

        Ok(Self {
            config,
            layouts,
            sampler,
            pipelines,
            descriptors: [PassDescriptor::intermediate(); 3],
            cache,
            plane,
            sample_level,
            mipmaps,
            intermediates,
            depth: DepthBuffer::default(),
            composite_source,
            completions_tx,
            completions_rx,
        })
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn cache(&self) -> &TextureLevelCache {
        &self.cache
    }

    pub fn plane(&self) -> &GeometryPlane {
        &self.plane
    }

    pub fn sample_level(&self) -> u32 {
        self.sample_level.current()
    }

    pub fn sample_level_writes(&self) -> u64 {
        self.sample_level.writes()
    }

    pub fn depth_extent(&self) -> Option<(u32, u32)> {
        self.depth.extent()
    }

    /// Descriptor of an intermediate pass; the composite's is built per frame.
    pub fn descriptor(&self, kind: PassKind) -> PassDescriptor {
        match kind {
            PassKind::HorizontalBlur => self.descriptors[0],
            PassKind::VerticalBlur => self.descriptors[1],
            PassKind::Upsample => self.descriptors[2],
            PassKind::Composite => PassDescriptor::composite(self.config.clear_color),
        }
    }

    /// Looks up the level for `normalized` and writes it to the GPU only when
    /// it changed. Returns whether a write happened.
    pub fn set_approximate_detail_level(&mut self, queue: &wgpu::Queue, normalized: f32) -> bool {
        let level = self.cache.level_for_normalized_scale(normalized);
        self.sample_level.set(queue, level)
    }

    /// Records one frame into `encoder`.
    ///
    /// Blocks first until an in-flight frame slot is free. Call
    /// [`FrameSubmission::finish`] once `encoder` has been submitted.
    pub fn encode_frame(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: FrameTarget<'_>,
        camera: &Camera,
    ) -> FrameSubmission {
        let permit = self.plane.gate().acquire(device);

        self.take_landed_mipmaps();
        let depth_rebuilt = self.depth.ensure(device, target.width, target.height);

        let aspect = target.width.max(1) as f32 / target.height.max(1) as f32;
        let world = camera.view_matrix() * self.plane.model_matrix();
        let uniform_slot = self.plane.write_uniforms(queue, world, camera.projection(aspect));

        let mut passes = Vec::with_capacity(PassKind::ORDER.len());
        passes.push(self.horizontal_blur(device, encoder, uniform_slot));
        passes.push(self.vertical_blur(device, encoder, uniform_slot));
        passes.push(self.upsample(device, encoder));
        let pending = self
            .mipmaps
            .generate_mipmaps(device, encoder, &self.intermediates.upsample);
        passes.push(self.composite(device, encoder, &target, uniform_slot));

        FrameSubmission {
            permit,
            report: FrameReport {
                passes,
                depth_rebuilt,
                uniform_slot,
                mipmaps_scheduled: pending.is_some(),
            },
            pending,
            completions: self.completions_tx.clone(),
        }
    }

    /// Makes the newest landed chain the composite source and recycles the
    /// rest.
    fn take_landed_mipmaps(&mut self) {
        while let Ok(texture) = self.completions_rx.try_recv() {
            let previous = std::mem::replace(&mut self.composite_source, texture);
            if !Arc::ptr_eq(&previous, &self.intermediates.upsample) {
                self.mipmaps.recycle(previous);
                log::trace!("mip chain landed; {} spare", self.mipmaps.spare_count());
            }
        }
    }

    /// Level read for a blur pass. Each blur pass reads it separately.
    fn current_level(&self) -> u32 {
        self.sample_level.current()
    }

    fn blur_bind_group(
        &self,
        device: &wgpu::Device,
        source: &wgpu::TextureView,
        level_reference: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lodblur blur bind group"),
            layout: &self.layouts.blur,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(level_reference),
                },
            ],
        })
    }

    fn sampled_bind_group(&self, device: &wgpu::Device, source: &wgpu::TextureView) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lodblur sampled bind group"),
            layout: &self.layouts.sampled,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    fn horizontal_blur(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        uniform_slot: usize,
    ) -> PassRecord {
        let level = self.current_level();
        let source = self.cache.texture_at_level(level);
        let output = &self.intermediates.horizontal;
        let bind_group = self.blur_bind_group(device, &source.view, &source.view);

        let mut rpass = self.begin_intermediate(encoder, PassKind::HorizontalBlur, &output.view);
        rpass.set_pipeline(&self.pipelines.horizontal_blur);
        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.set_bind_group(1, self.plane.uniforms(uniform_slot), &[]);
        rpass.set_bind_group(2, self.sample_level.bind_group(), &[]);
        self.draw_plane(&mut rpass);

        PassRecord {
            kind: PassKind::HorizontalBlur,
            source_extent: source.extent(),
            target_extent: output.extent(),
            sample_level: Some(level),
            source_mip_count: source.mip_count(),
        }
    }

    fn vertical_blur(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        uniform_slot: usize,
    ) -> PassRecord {
        // Not carried over from the horizontal pass; may differ if the level
        // moved in between.
        let level = self.current_level();
        let reference = self.cache.texture_at_level(level);
        let source = &self.intermediates.horizontal;
        let output = &self.intermediates.vertical;
        let bind_group = self.blur_bind_group(device, &source.view, &reference.view);

        let mut rpass = self.begin_intermediate(encoder, PassKind::VerticalBlur, &output.view);
        rpass.set_pipeline(&self.pipelines.vertical_blur);
        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.set_bind_group(1, self.plane.uniforms(uniform_slot), &[]);
        rpass.set_bind_group(2, self.sample_level.bind_group(), &[]);
        self.draw_plane(&mut rpass);

        PassRecord {
            kind: PassKind::VerticalBlur,
            source_extent: source.extent(),
            target_extent: output.extent(),
            sample_level: Some(level),
            source_mip_count: source.mip_count(),
        }
    }

    fn upsample(&self, device: &wgpu::Device, encoder: &mut wgpu::CommandEncoder) -> PassRecord {
        let source = &self.intermediates.vertical;
        let output = &self.intermediates.upsample;
        let bind_group = self.sampled_bind_group(device, &source.view);

        let mut rpass = self.begin_intermediate(encoder, PassKind::Upsample, &output.view);
        rpass.set_pipeline(&self.pipelines.upsample);
        rpass.set_bind_group(0, &bind_group, &[]);
        self.draw_plane(&mut rpass);

        PassRecord {
            kind: PassKind::Upsample,
            source_extent: source.extent(),
            target_extent: output.extent(),
            sample_level: None,
            source_mip_count: source.mip_count(),
        }
    }

    fn composite(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        target: &FrameTarget<'_>,
        uniform_slot: usize,
    ) -> PassRecord {
        let source = &self.composite_source;
        let bind_group = self.sampled_bind_group(device, &source.view);
        let descriptor = self.descriptor(PassKind::Composite);

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(PassKind::Composite.label()),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.view,
                resolve_target: None,
                ops: descriptor.color_ops(),
                depth_slice: None,
            })],
            depth_stencil_attachment: self.depth.view().map(|view| {
                wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(composite_depth_ops()),
                    stencil_ops: None,
                }
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        rpass.set_pipeline(&self.pipelines.composite);
        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.set_bind_group(1, self.plane.uniforms(uniform_slot), &[]);
        self.draw_plane(&mut rpass);

        PassRecord {
            kind: PassKind::Composite,
            source_extent: source.extent(),
            target_extent: (target.width, target.height),
            sample_level: None,
            source_mip_count: source.mip_count(),
        }
    }

    fn begin_intermediate<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
        kind: PassKind,
        view: &wgpu::TextureView,
    ) -> wgpu::RenderPass<'e> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(kind.label()),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: self.descriptor(kind).color_ops(),
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }

    fn draw_plane(&self, rpass: &mut wgpu::RenderPass<'_>) {
        self.plane.bind_geometry(rpass);
        rpass.draw_indexed(0..self.plane.index_count(), 0, 0..1);
    }
}

/// Generates the source's mip chain and waits for it to land.
///
/// Falls back to the uploaded texture when the format cannot be mipmapped.
fn mipmap_source(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    mipmaps: &mut TextureUtility,
    uploaded: &Arc<Texture>,
) -> Result<Arc<Texture>> {
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("lodblur source mipmap encoder"),
    });
    let Some(pending) = mipmaps.generate_mipmaps(device, &mut encoder, uploaded) else {
        return Ok(uploaded.clone());
    };
    queue.submit(Some(encoder.finish()));

    let (tx, rx) = crossbeam_channel::bounded(1);
    pending.on_complete(queue, move |texture| {
        let _ = tx.send(texture);
    });
    device
        .poll(wgpu::PollType::wait_indefinitely())
        .context("waiting for source mip chain")?;
    let texture = rx
        .recv_timeout(STARTUP_MIPMAP_TIMEOUT)
        .context("source mip chain never completed")?;
    log::debug!(
        "source mip chain ready: {} levels",
        texture.mip_count()
    );
    Ok(texture)
}

/// An encoded frame waiting for its command buffer to be submitted.
#[must_use = "call `finish` after submitting the frame"]
pub struct FrameSubmission {
    permit: FramePermit,
    pending: Option<PendingMipmaps>,
    completions: Sender<Arc<Texture>>,
    report: FrameReport,
}

impl FrameSubmission {
    pub fn report(&self) -> &FrameReport {
        &self.report
    }

    /// Registers the frame's completion work. The mip chain, if one was
    /// scheduled, is delivered to the graph and the in-flight slot returns
    /// once the GPU finishes the frame.
    pub fn finish(self, queue: &wgpu::Queue) -> FrameReport {
        if let Some(pending) = self.pending {
            let completions = self.completions;
            pending.on_complete(queue, move |texture| {
                let _ = completions.send(texture);
            });
        }
        self.permit.release_on_completion(queue);
        self.report
    }
}
