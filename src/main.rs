mod app;
mod color;
mod gallery;
mod state;
mod ui;

use anyhow::Context;
use app::ExplorerApp;
use compound_explorer::config::ExplorerConfig;
use compound_explorer::data::loader::{load_image_table, load_video_table};
use compound_explorer::fetch::AssetFetcher;
use eframe::egui;
use state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = ExplorerConfig::load().context("loading configuration")?;
    let images = load_image_table(&config.image_table)
        .with_context(|| format!("loading image table {}", config.image_table.display()))?;
    let videos = load_video_table(&config.video_table)
        .with_context(|| format!("loading video table {}", config.video_table.display()))?;
    let fetcher = AssetFetcher::new(&config.fetch).context("building HTTP client")?;
    log::info!(
        "Starting with {} images and {} videos",
        images.len(),
        videos.len()
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    let state = AppState::new(config, images, videos, fetcher);
    eframe::run_native(
        "Abbottabad Compound Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(ExplorerApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe: {e}"))
}
