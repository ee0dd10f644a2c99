use winit::window::{Window, WindowId};

use crate::device::{DrawTarget, Gpu};
use crate::input::{InputFrame, InputState};
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

/// Result of [`FrameCtx::render`].
#[derive(Debug)]
pub enum FrameOutcome<R> {
    /// The callback ran and the frame was submitted and presented.
    Presented(R),
    /// No drawable was available; nothing was encoded.
    Skipped,
    /// The surface is unusable; the application should exit.
    Fatal,
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub input: &'a InputState,
    pub input_frame: &'a InputFrame,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Acquires the next drawable, lets `draw` record one command buffer into
    /// it, then submits and presents.
    ///
    /// The value returned by `draw` is handed back after submission so the
    /// caller can register completion work against the queue.
    pub fn render<F, R>(&mut self, draw: F) -> FrameOutcome<R>
    where
        F: FnOnce(&mut DrawTarget<'_>) -> R,
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                log::warn!("failed to acquire drawable: {err}");
                let action = self.gpu.handle_surface_error(err);
                return if action.is_fatal() {
                    FrameOutcome::Fatal
                } else {
                    FrameOutcome::Skipped
                };
            }
        };

        // DrawTarget borrows frame.encoder; dropped before submit() takes frame.
        let out = {
            let mut target = self.gpu.draw_target(&mut frame);
            draw(&mut target)
        };

        self.window.window.pre_present_notify();
        self.gpu.submit(frame);

        FrameOutcome::Presented(out)
    }
}
