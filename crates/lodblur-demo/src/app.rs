use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use lodblur_engine::core::{App, AppControl, FrameCtx, FrameOutcome};
use lodblur_engine::device::Gpu;
use lodblur_engine::input::{Key, PinchPhase};
use lodblur_render::camera::Camera;
use lodblur_render::{FrameTarget, GestureState, RenderGraph, SourceImage, ZoomController};

use crate::config::{SceneConfig, TEST_PATTERN_SIZE};
use crate::gesture::WheelPinch;

const STATS_INTERVAL: Duration = Duration::from_secs(2);

/// Pinch scale applied per `=` / `-` key press.
const KEY_ZOOM_STEP: f32 = 1.25;

pub struct DemoApp {
    scene: SceneConfig,
    graph: Option<RenderGraph>,
    zoom: ZoomController,
    wheel: WheelPinch,
    last_stats: Option<Instant>,
}

impl DemoApp {
    pub fn new(scene: SceneConfig) -> Self {
        Self {
            zoom: ZoomController::new(scene.zoom),
            scene,
            graph: None,
            wheel: WheelPinch::default(),
            last_stats: None,
        }
    }

    fn load_source(&self) -> Result<SourceImage> {
        match &self.scene.image {
            Some(path) => SourceImage::open(path),
            None => Ok(SourceImage::test_pattern(TEST_PATTERN_SIZE.0, TEST_PATTERN_SIZE.1)),
        }
    }

    fn apply_input(&mut self, ctx: &FrameCtx<'_, '_>) {
        if ctx.input_frame.keys_pressed.contains(&Key::R) {
            self.zoom.reset();
            log::debug!("zoom reset to {:.2}", self.zoom.zoom());
        }

        for (key, scale) in [(Key::Equal, KEY_ZOOM_STEP), (Key::Minus, KEY_ZOOM_STEP.recip())] {
            if ctx.input_frame.keys_pressed.contains(&key) {
                self.zoom.apply_pinch(GestureState::Began, 1.0);
                self.zoom.apply_pinch(GestureState::Changed, scale);
                self.zoom.apply_pinch(GestureState::Ended, scale);
            }
        }

        for pinch in ctx.input_frame.pinches() {
            self.zoom.apply_pinch(gesture_state(pinch.phase), pinch.scale);
        }
        for (state, scale) in self.wheel.feed(ctx.input_frame.wheel_lines(), ctx.time.now) {
            self.zoom.apply_pinch(state, scale);
        }
    }

    fn log_stats(&mut self, ctx: &FrameCtx<'_, '_>) {
        let due = self
            .last_stats
            .is_none_or(|t| ctx.time.now.saturating_duration_since(t) >= STATS_INTERVAL);
        if !due {
            return;
        }
        self.last_stats = Some(ctx.time.now);
        if let Some(graph) = &self.graph {
            log::debug!(
                "{:.1} fps, zoom {:.2}, sample level {}",
                ctx.time.fps(),
                self.zoom.zoom(),
                graph.sample_level()
            );
        }
    }
}

fn gesture_state(phase: PinchPhase) -> GestureState {
    match phase {
        PinchPhase::Began => GestureState::Began,
        PinchPhase::Changed => GestureState::Changed,
        PinchPhase::Ended => GestureState::Ended,
    }
}

impl App for DemoApp {
    fn on_gpu_ready(&mut self, gpu: &Gpu<'_>) -> Result<()> {
        let source = self.load_source()?;
        let graph = RenderGraph::new(
            gpu.device(),
            gpu.queue(),
            &source,
            gpu.surface_format(),
            self.scene.graph,
        )
        .context("building render graph")?;
        self.graph = Some(graph);
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.input_frame.keys_pressed.contains(&Key::Escape) {
            return AppControl::Exit;
        }

        self.apply_input(ctx);
        self.log_stats(ctx);

        let Some(graph) = self.graph.as_mut() else {
            return AppControl::Continue;
        };

        let camera = Camera::at_distance(self.zoom.zoom());
        graph.set_approximate_detail_level(ctx.gpu.queue(), self.zoom.normalized_detail());

        let outcome = ctx.render(|target| {
            graph.encode_frame(
                target.device,
                target.queue,
                target.encoder,
                FrameTarget {
                    view: target.view,
                    width: target.width,
                    height: target.height,
                },
                &camera,
            )
        });

        match outcome {
            FrameOutcome::Presented(submission) => {
                submission.finish(ctx.gpu.queue());
                AppControl::Continue
            }
            FrameOutcome::Skipped => AppControl::Continue,
            FrameOutcome::Fatal => AppControl::Exit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinch_phases_map_one_to_one() {
        assert_eq!(gesture_state(PinchPhase::Began), GestureState::Began);
        assert_eq!(gesture_state(PinchPhase::Changed), GestureState::Changed);
        assert_eq!(gesture_state(PinchPhase::Ended), GestureState::Ended);
    }
}
