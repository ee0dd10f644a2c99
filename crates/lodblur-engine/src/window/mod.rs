//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, and wires them to the GPU layer.
//! Redraws are requested continuously, so `App::on_frame` acts as the
//! per-refresh frame clock callback.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
