mod app;
mod data;
mod state;
mod ui;

use std::path::PathBuf;

use app::PollviewApp;
use eframe::egui;
use state::AppState;

/// Loaded when no path is given on the command line.
const DEFAULT_DATA_PATH: &str = "data/SV.csv";

fn main() -> eframe::Result {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

    let dataset = match data::loader::load_file(&path) {
        Ok(ds) => ds,
        Err(e) => {
            log::error!("Failed to load {}: {e:#}", path.display());
            std::process::exit(1);
        }
    };
    if dataset.is_empty() {
        log::warn!("{} contains no rows; the table will be empty", path.display());
    }
    log::info!(
        "Loaded {} records ({} filterable) from {}",
        dataset.len(),
        dataset.baseline.len(),
        path.display()
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    let app = PollviewApp::new(AppState::new(dataset, path));
    eframe::run_native(
        "Pollview – Institution Favorability",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}
