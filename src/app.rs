use eframe::egui;

use scorecard_explorer::color::ThresholdScale;
use scorecard_explorer::state::AppState;

use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ScorecardApp {
    pub state: AppState,
    scale: ThresholdScale,
}

impl ScorecardApp {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            scale: ThresholdScale::default(),
        }
    }
}

impl eframe::App for ScorecardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: range sliders and legend ----
        egui::SidePanel::left("filter_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state, &self.scale);
            });

        // ---- Central panel: map and scatter side by side ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(2, |columns| {
                plot::map_plot(&mut columns[0], &mut self.state, &self.scale);
                plot::scatter_plot(&mut columns[1], &self.state);
            });
        });
    }
}
