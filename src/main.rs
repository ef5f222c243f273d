mod app;
mod color;
mod config;
mod data;
mod error;
mod state;
mod ui;

use std::path::PathBuf;

use app::DegLensApp;
use config::Settings;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let settings = Settings::from_env();
    let mut state = AppState::new(settings);

    // Optional table to open at start-up.
    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        state.open_path(&path);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([700.0, 450.0]),
        ..Default::default()
    };

    eframe::run_native(
        "deg-lens – Differential Expression Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(DegLensApp::new(state)))),
    )
}
