mod app;
mod config;
mod gesture;

use lodblur_engine::logging::init_logging;
use lodblur_engine::window::Runtime;

use crate::app::DemoApp;
use crate::config::DemoConfig;

fn main() -> anyhow::Result<()> {
    let DemoConfig {
        runtime,
        gpu,
        logging,
        scene,
    } = DemoConfig::from_env();

    init_logging(logging);
    match &scene.image {
        Some(path) => log::info!("source image: {}", path.display()),
        None => log::info!("no image given; using the built-in test pattern"),
    }

    Runtime::run(runtime, gpu, DemoApp::new(scene))
}
