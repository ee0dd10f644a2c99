//! Progressive downsampling pipeline for a single textured plane.
//!
//! A source image is mipmapped into a ladder of standalone level textures.
//! Each frame the level picked from the current zoom is blurred
//! horizontally then vertically into fixed-size intermediates, upsampled,
//! mip-regenerated asynchronously, and composited onto the plane.
//!
//! Module map:
//! - [`level_cache`]: the level ladder and zoom-to-level mapping
//! - [`mipmap`]: asynchronous GPU mip chain generation
//! - [`plane`]: quad geometry, per-frame uniforms, in-flight gate
//! - [`zoom`]: pinch gesture to zoom factor
//! - [`graph`]: the four-pass frame orchestrator

pub mod camera;
pub mod frame_gate;
pub mod graph;
pub mod level_cache;
pub mod mipmap;
pub mod plane;
pub mod sample_level;
pub mod shaders;
pub mod source;
pub mod texture;
pub mod zoom;

pub use graph::{FrameReport, FrameSubmission, FrameTarget, GraphConfig, PassKind, RenderGraph};
pub use level_cache::TextureLevelCache;
pub use mipmap::TextureUtility;
pub use source::SourceImage;
pub use texture::Texture;
pub use zoom::{GestureState, ZoomConfig, ZoomController};
