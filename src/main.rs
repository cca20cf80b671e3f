mod app;
mod catalog;
mod config;
mod error;
mod loader;
mod metadata;
mod render;
mod session;
mod slideshow;
mod state;
mod transform;
mod wallpaper;

use app::LanternApp;
use config::AppConfig;

const DEFAULT_WINDOW_SIZE: [f32; 2] = [1000.0, 700.0];

fn window_size(config: &AppConfig) -> [f32; 2] {
    [
        config.window_width.unwrap_or(DEFAULT_WINDOW_SIZE[0]),
        config.window_height.unwrap_or(DEFAULT_WINDOW_SIZE[1]),
    ]
}

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load();
    tracing::info!(
        interval = config.interval(),
        transition = config.resolve_transition().label(),
        "starting lantern"
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Lantern")
            .with_app_id("lantern")
            .with_inner_size(window_size(&config))
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "lantern",
        native_options,
        Box::new(|cc| Ok(Box::new(LanternApp::new(cc, config)))),
    )
}
