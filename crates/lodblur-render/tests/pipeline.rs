//! Headless end-to-end runs of the four-pass pipeline.
//!
//! Each test needs a GPU adapter and returns early when none is available.

use lodblur_render::camera::Camera;
use lodblur_render::texture::{full_mip_count, mip_extent, Texture, COLOR_FORMAT};
use lodblur_render::{
    FrameReport, FrameTarget, GraphConfig, PassKind, RenderGraph, SourceImage, TextureUtility,
};

const SOURCE: (u32, u32) = (64, 32);

fn gpu() -> Option<(wgpu::Device, wgpu::Queue)> {
    pollster::block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok()?;
        adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("lodblur test device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .ok()
    })
}

macro_rules! require_gpu {
    () => {
        match gpu() {
            Some(gpu) => gpu,
            None => {
                eprintln!("no GPU adapter available; skipping");
                return;
            }
        }
    };
}

fn graph(device: &wgpu::Device, queue: &wgpu::Queue) -> RenderGraph {
    let source = SourceImage::test_pattern(SOURCE.0, SOURCE.1);
    RenderGraph::new(device, queue, &source, COLOR_FORMAT, GraphConfig::default()).unwrap()
}

fn drawable(device: &wgpu::Device, size: (u32, u32)) -> Texture {
    Texture::new(
        device,
        "test drawable",
        size,
        COLOR_FORMAT,
        1,
        wgpu::TextureUsages::RENDER_ATTACHMENT,
    )
}

/// Encodes, submits, and finishes one frame, then waits for the GPU.
fn run_frame(
    graph: &mut RenderGraph,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    target: &Texture,
) -> FrameReport {
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("test frame"),
    });
    let submission = graph.encode_frame(
        device,
        queue,
        &mut encoder,
        FrameTarget {
            view: &target.view,
            width: target.width(),
            height: target.height(),
        },
        &Camera::at_distance(2.0),
    );
    queue.submit(Some(encoder.finish()));
    let report = submission.finish(queue);
    device.poll(wgpu::PollType::wait_indefinitely()).unwrap();
    report
}

#[test]
fn ladder_spans_five_levels() {
    let (device, queue) = require_gpu!();
    let graph = graph(&device, &queue);

    let cache = graph.cache();
    assert_eq!(full_mip_count(SOURCE.0, SOURCE.1), 7);
    assert_eq!(cache.len(), 5);
    assert_eq!(cache.level_for_normalized_scale(0.0), 0);
    assert_eq!(cache.level_for_normalized_scale(1.0), 4);

    for level in 0..5 {
        assert_eq!(
            cache.texture_at_level(level).extent(),
            mip_extent(SOURCE.0, SOURCE.1, level)
        );
    }
}

#[test]
fn level_lookup_is_idempotent_and_saturates() {
    let (device, queue) = require_gpu!();
    let graph = graph(&device, &queue);
    let cache = graph.cache();

    let first = cache.texture_at_level(2).extent();
    assert_eq!(cache.texture_at_level(2).extent(), first);
    assert_eq!(cache.texture_at_level(99).extent(), cache.texture_at_level(4).extent());
}

#[test]
fn composite_matches_drawable_not_intermediates() {
    let (device, queue) = require_gpu!();
    let mut graph = graph(&device, &queue);
    let target = drawable(&device, (300, 200));

    let report = run_frame(&mut graph, &device, &queue, &target);

    assert_eq!(report.order(), PassKind::ORDER.to_vec());
    assert_eq!(report.composite_extent(), Some((300, 200)));
    for kind in [PassKind::HorizontalBlur, PassKind::VerticalBlur, PassKind::Upsample] {
        assert_eq!(report.pass(kind).unwrap().target_extent, (720, 1280));
    }
    assert_eq!(graph.plane().index_count(), 6);
}

#[test]
fn depth_buffer_follows_drawable_size() {
    let (device, queue) = require_gpu!();
    let mut graph = graph(&device, &queue);
    let small = drawable(&device, (300, 200));
    let wide = drawable(&device, (400, 200));

    assert!(run_frame(&mut graph, &device, &queue, &small).depth_rebuilt);
    assert!(!run_frame(&mut graph, &device, &queue, &small).depth_rebuilt);
    assert!(run_frame(&mut graph, &device, &queue, &wide).depth_rebuilt);
    assert_eq!(graph.depth_extent(), Some((400, 200)));
}

#[test]
fn landed_mip_chain_feeds_next_composite() {
    let (device, queue) = require_gpu!();
    let mut graph = graph(&device, &queue);
    let target = drawable(&device, (300, 200));

    let first = run_frame(&mut graph, &device, &queue, &target);
    assert!(first.mipmaps_scheduled);
    assert_eq!(first.pass(PassKind::Composite).unwrap().source_mip_count, 1);

    let second = run_frame(&mut graph, &device, &queue, &target);
    assert_eq!(
        second.pass(PassKind::Composite).unwrap().source_mip_count,
        full_mip_count(720, 1280)
    );
}

#[test]
fn sample_level_writes_only_on_change() {
    let (device, queue) = require_gpu!();
    let mut graph = graph(&device, &queue);

    assert!(!graph.set_approximate_detail_level(&queue, 0.0));
    assert_eq!(graph.sample_level_writes(), 0);

    assert!(graph.set_approximate_detail_level(&queue, 1.0));
    assert!(!graph.set_approximate_detail_level(&queue, 1.0));
    assert!(!graph.set_approximate_detail_level(&queue, 0.99));
    assert_eq!(graph.sample_level(), 4);
    assert_eq!(graph.sample_level_writes(), 1);
}

#[test]
fn blur_passes_each_read_the_current_level() {
    let (device, queue) = require_gpu!();
    let mut graph = graph(&device, &queue);
    let target = drawable(&device, (300, 200));

    graph.set_approximate_detail_level(&queue, 1.0);
    let report = run_frame(&mut graph, &device, &queue, &target);

    let horizontal = report.pass(PassKind::HorizontalBlur).unwrap();
    let vertical = report.pass(PassKind::VerticalBlur).unwrap();
    assert_eq!(horizontal.sample_level, Some(4));
    assert_eq!(horizontal.source_extent, mip_extent(SOURCE.0, SOURCE.1, 4));
    // No level change between the passes here, so both reads agree.
    assert_eq!(vertical.sample_level, horizontal.sample_level);
    assert_eq!(vertical.source_extent, (720, 1280));
    assert_eq!(report.pass(PassKind::Upsample).unwrap().sample_level, None);
}

#[test]
fn in_flight_slot_is_returned_after_completion() {
    let (device, queue) = require_gpu!();
    let mut graph = graph(&device, &queue);
    let target = drawable(&device, (300, 200));

    run_frame(&mut graph, &device, &queue, &target);
    assert_eq!(graph.plane().gate().available(), 1);
}

#[test]
fn unsupported_textures_are_left_alone() {
    let (device, queue) = require_gpu!();
    let mut mipmaps = TextureUtility::new(&device).unwrap();

    // Level 0 cannot be copied out without COPY_SRC.
    let no_copy = Texture::new(
        &device,
        "no copy",
        (64, 64),
        COLOR_FORMAT,
        1,
        wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::RENDER_ATTACHMENT,
    );
    // 32-bit float formats are not filterable without an extra feature.
    let float = Texture::new(
        &device,
        "float",
        (64, 64),
        wgpu::TextureFormat::Rgba32Float,
        1,
        wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_SRC,
    );

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("unsupported mipmaps"),
    });
    for texture in [&no_copy, &float] {
        assert!(!TextureUtility::mipmaps_supported(&device, texture));
        assert!(mipmaps.generate_mipmaps(&device, &mut encoder, texture).is_none());
        assert_eq!(mipmaps.spare_count(), 0);
        assert_eq!(texture.mip_count(), 1);
    }
    queue.submit(Some(encoder.finish()));
    device.poll(wgpu::PollType::wait_indefinitely()).unwrap();
}
