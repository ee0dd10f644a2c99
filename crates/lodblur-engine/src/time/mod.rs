//! Time subsystem.
//!
//! Provides frame timing utilities without coupling to the runtime.
//! One `FrameClock` per window; `tick()` once per display refresh.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
