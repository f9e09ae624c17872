use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use scorecard_explorer::color::ThresholdScale;
use scorecard_explorer::data::filter::RangeBound;
use scorecard_explorer::data::loader::DataSources;
use scorecard_explorer::data::normalize::DatasetVariant;
use scorecard_explorer::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – range sliders
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState, scale: &ThresholdScale) {
    ui.heading("Filters");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for bound in RangeBound::ALL {
                let (lo, hi) = state.bounds.extent(bound);
                let mut value = state.ranges.get(bound);

                let mut slider = egui::Slider::new(&mut value, lo..=hi);
                slider = match bound {
                    RangeBound::UgMin | RangeBound::UgMax => slider.integer(),
                    _ => slider.prefix("$"),
                };

                ui.label(RichText::new(bound.label()).strong());
                if ui.add(slider).changed() {
                    state.set_range(bound, value);
                }
                ui.add_space(4.0);
            }

            if ui.button("Reset filters").clicked() {
                state.reset_ranges();
            }

            ui.separator();
            ui.strong("Undergrad population");
            for (label, color) in scale.legend_entries() {
                ui.horizontal(|ui: &mut Ui| {
                    ui.label(RichText::new("⏺").color(color));
                    ui.label(label);
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data…").clicked() {
                open_data_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.sources.is_some(), egui::Button::new("Open boundaries…"))
                .clicked()
            {
                open_boundaries_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.sources.is_some(), egui::Button::new("Reload"))
                .clicked()
            {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        let mut variant = state.variant;
        egui::ComboBox::from_id_salt("variant")
            .selected_text(format!("Variant: {variant}"))
            .show_ui(ui, |ui: &mut Ui| {
                for option in DatasetVariant::ALL {
                    ui.selectable_value(&mut variant, option, option.to_string());
                }
            });
        if variant != state.variant {
            state.set_variant(variant);
        }

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} institutions loaded ({} dropped), {} on map, {} on scatter",
                ds.len(),
                ds.dropped,
                state.visible.len(),
                state.scatter.len()
            ));
        }

        if let Some(label) = state.selected_state_label() {
            ui.separator();
            ui.label(format!("Zoomed to {label}"));
            if ui.small_button("Show all").clicked() {
                state.reset_selection();
            }
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_data_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open scorecard data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(table) = file {
        let boundaries = state.sources.as_ref().and_then(|s| s.boundaries.clone());
        state.load(DataSources { table, boundaries });
    }
}

pub fn open_boundaries_dialog(state: &mut AppState) {
    let Some(current) = state.sources.clone() else {
        return;
    };
    let file = rfd::FileDialog::new()
        .set_title("Open state boundaries")
        .add_filter("TopoJSON", &["json", "topojson"])
        .pick_file();

    if let Some(path) = file {
        state.load(DataSources {
            boundaries: Some(path),
            ..current
        });
    }
}
