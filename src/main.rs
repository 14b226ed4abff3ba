use tokio::runtime::Runtime;

mod app;
mod config;
mod constants;
mod conversion;
mod download;
mod engine;
mod events;
mod security;
mod selection;
mod state;
mod ui;
mod workflow;

use app::MediaConverterApp;
use config::AppConfig;
use constants::{APP_NAME, APP_VERSION};
use conversion::ConversionController;
use engine::FfmpegProcessEngine;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    tracing::info!("Starting {} v{}", APP_NAME, APP_VERSION);

    // Engine work and saving run here; the UI thread only polls for events
    let rt = Runtime::new()?;

    let config = AppConfig::load();
    let controller = ConversionController::shared(FfmpegProcessEngine::from_config(&config));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_min_inner_size([420.0, 360.0])
            .with_title(APP_NAME)
            .with_resizable(true),
        ..Default::default()
    };

    let app_controller = controller.clone();
    let handle = rt.handle().clone();
    let app_creator = move |_cc: &eframe::CreationContext| -> Box<dyn eframe::App> {
        Box::new(MediaConverterApp::new(config, app_controller, handle))
    };

    let result = eframe::run_native(APP_NAME, options, Box::new(app_creator));

    rt.block_on(async {
        if let Err(e) = controller.lock().await.shutdown().await {
            tracing::warn!("Engine shutdown failed: {}", e);
        }
    });

    tracing::info!("Application shutting down");
    result.map_err(|e| anyhow::anyhow!("UI error: {}", e))
}
