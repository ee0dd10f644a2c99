use std::ffi::OsString;
use std::path::PathBuf;

use lodblur_engine::device::GpuInit;
use lodblur_engine::logging::LoggingConfig;
use lodblur_engine::window::RuntimeConfig;
use lodblur_render::texture::COLOR_FORMAT;
use lodblur_render::{GraphConfig, ZoomConfig};

/// Environment variable naming the source image when no argument is given.
pub const IMAGE_ENV: &str = "LODBLUR_IMAGE";

/// Size of the generated image used when no source image is configured.
pub const TEST_PATTERN_SIZE: (u32, u32) = (1024, 1536);

/// Everything the demo needs once the GPU exists.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub image: Option<PathBuf>,
    pub graph: GraphConfig,
    pub zoom: ZoomConfig,
}

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub runtime: RuntimeConfig,
    pub gpu: GpuInit,
    pub logging: LoggingConfig,
    pub scene: SceneConfig,
}

impl DemoConfig {
    pub fn from_env() -> Self {
        let image = image_path(std::env::args_os().skip(1), std::env::var_os(IMAGE_ENV));
        Self {
            runtime: RuntimeConfig::default(),
            gpu: GpuInit {
                // The pass pipelines render BGRA8 unorm end to end.
                preferred_format: Some(COLOR_FORMAT),
                prefer_srgb: false,
                ..GpuInit::default()
            },
            logging: LoggingConfig::default(),
            scene: SceneConfig {
                image,
                graph: GraphConfig::default(),
                zoom: ZoomConfig::default(),
            },
        }
    }
}

/// First argument wins over the environment variable; empty values are unset.
fn image_path(
    mut args: impl Iterator<Item = OsString>,
    env: Option<OsString>,
) -> Option<PathBuf> {
    args.next()
        .or(env)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = OsString> {
        list.iter().map(OsString::from).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn argument_beats_environment() {
        let path = image_path(args(&["a.png"]), Some("b.png".into()));
        assert_eq!(path, Some(PathBuf::from("a.png")));
    }

    #[test]
    fn environment_used_without_argument() {
        let path = image_path(args(&[]), Some("b.png".into()));
        assert_eq!(path, Some(PathBuf::from("b.png")));
    }

    #[test]
    fn empty_values_mean_no_image() {
        assert_eq!(image_path(args(&[]), Some("".into())), None);
        assert_eq!(image_path(args(&[]), None), None);
    }

    #[test]
    fn defaults_match_the_pipeline() {
        let graph = GraphConfig::default();
        assert_eq!(graph.intermediate_size, (720, 1280));
        assert_eq!(graph.max_frames_in_flight, 1);
        let zoom = ZoomConfig::default();
        assert_eq!((zoom.min, zoom.max), (1.0, 100.0));
    }
}
