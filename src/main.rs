mod app;
mod ui;

use app::ScorecardApp;
use eframe::egui;
use scorecard_explorer::config::AppConfig;
use scorecard_explorer::state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let config = AppConfig::from_env().with_args(std::env::args().skip(1));
    let normalizer = config.normalizer().unwrap_or_else(|e| {
        log::error!("{e:#}; using the {} preset", config.variant);
        config.variant.config()
    });

    let mut state = AppState::new(normalizer, config.variant);
    if let Some(sources) = config.sources() {
        state.load(sources);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1500.0, 800.0])
            .with_min_inner_size([800.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Scorecard Explorer – College Outcomes",
        options,
        Box::new(move |_cc| Ok(Box::new(ScorecardApp::new(state)))),
    )
}
