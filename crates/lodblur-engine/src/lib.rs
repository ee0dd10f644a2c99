//! lodblur engine crate.
//!
//! This crate owns the platform + GPU runtime pieces the downsampling demo is
//! hosted on: window and event loop, device and surface, frame timing, input.
//! Rendering policy lives in `lodblur-render`.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
