//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (the drawable chain)
//! - acquiring drawables and providing an encoder + view for rendering

mod error;
mod frame;
mod gpu;
mod init;
mod surface;

pub use error::SurfaceErrorAction;
pub use frame::{DrawTarget, GpuFrame};
pub use gpu::Gpu;
pub use init::GpuInit;
