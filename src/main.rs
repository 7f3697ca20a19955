// Room Decor: arrange and retexture furniture in a small 3D room

// Module declarations
mod app;
mod appearance;
mod camera;
mod config;
mod error;
mod focus;
mod inventory;
mod loader;
mod math;
mod picking;
mod registry;
mod renderer;
mod room;
mod scene;
mod ui;

use tokio::runtime::Handle;
use winit::event_loop::EventLoop;

use crate::app::App;
use crate::config::Config;
use crate::error::AppError;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize logging
    env_logger::init();

    let config = Config::from_env();
    log::info!("Assets from {}", config.asset_root.display());

    // Create event loop
    let event_loop = EventLoop::new()?;

    let app = App::new(&event_loop, config, Handle::current()).await?;
    app.run(event_loop)
}
