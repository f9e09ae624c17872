use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Line, MarkerShape, Plot, PlotBounds, PlotPoint, PlotPoints, Points};

use scorecard_explorer::color::{highlight, ThresholdScale};
use scorecard_explorer::data::model::{College, ScatterPoint};
use scorecard_explorer::state::AppState;

/// Longitude is stretched relative to latitude at U.S. mid-latitudes.
const MAP_ASPECT: f32 = 1.3;

const BORDER_COLOR: Color32 = Color32::from_gray(150);

// ---------------------------------------------------------------------------
// Map view (left column)
// ---------------------------------------------------------------------------

/// Render institutions as coloured markers over the state outlines.
pub fn map_plot(ui: &mut Ui, state: &mut AppState, scale: &ThresholdScale) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a scorecard file to begin  (File → Open data…)");
        });
        return;
    }

    let pending_view = state.pending_view.take();
    let visible = &state.visible;
    let boundaries = state.boundaries.as_ref();
    let selected = state.selected_state;

    // One series per colour bucket so the legend doubles as the colour key.
    let mut buckets: Vec<Vec<[f64; 2]>> = vec![Vec::new(); scale.bucket_count()];
    for college in visible {
        buckets[scale.bucket(college.undergrad_population)].push([college.longitude, college.latitude]);
    }

    let clicked = Plot::new("map_plot")
        .legend(Legend::default())
        .data_aspect(MAP_ASPECT)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .label_formatter(|name, value| {
            if name.is_empty() {
                return format!("{:.2}, {:.2}", value.x, value.y);
            }
            nearest_college(visible, value)
                .map(map_tooltip)
                .unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            if let Some(view) = pending_view {
                plot_ui.set_plot_bounds(PlotBounds::from_min_max(view.min, view.max));
            }

            if let Some(b) = boundaries {
                for arc in &b.borders {
                    plot_ui.line(Line::new(PlotPoints::from(arc.clone())).color(BORDER_COLOR).width(1.0));
                }

                if let Some(shape) = selected.and_then(|i| b.states.get(i)) {
                    for polygon in shape.outline.0.iter() {
                        let ring: Vec<[f64; 2]> =
                            polygon.exterior().coords().map(|c| [c.x, c.y]).collect();
                        plot_ui.line(
                            Line::new(PlotPoints::from(ring))
                                .color(highlight(BORDER_COLOR))
                                .width(2.5),
                        );
                    }
                }
            }

            for (i, points) in buckets.into_iter().enumerate() {
                if points.is_empty() {
                    continue;
                }
                plot_ui.points(
                    Points::new(PlotPoints::from(points))
                        .name(scale.label(i))
                        .color(scale.color(i))
                        .shape(MarkerShape::Circle)
                        .filled(true)
                        .radius(3.0),
                );
            }

            if plot_ui.response().clicked() {
                plot_ui.pointer_coordinate()
            } else {
                None
            }
        })
        .inner;

    if let Some(point) = clicked {
        state.select_state_at(point.x, point.y);
    }
}

// ---------------------------------------------------------------------------
// Scatter view (right column)
// ---------------------------------------------------------------------------

/// Render earnings against unemployment for the visible institutions.
///
/// Axes stay fixed to the extent of the full dataset so filtering never rescales.
pub fn scatter_plot(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        return;
    }

    let scatter = &state.scatter;
    let (x_max, y_max) = state.scatter_extent;

    let points: PlotPoints = scatter
        .iter()
        .map(|p| [p.earnings, p.unemployment])
        .collect();

    Plot::new("scatter_plot")
        .x_axis_label("Mean Earnings When Not Enrolled For 10 Years ($ / year)")
        .y_axis_label("Unemployment Rate (%)")
        .include_x(0.0)
        .include_x(x_max)
        .include_y(0.0)
        .include_y(y_max)
        .allow_boxed_zoom(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .label_formatter(|name, value| {
            if name.is_empty() {
                return String::new();
            }
            nearest_scatter_point(scatter, value)
                .map(scatter_tooltip)
                .unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.points(
                Points::new(points)
                    .name("Institutions")
                    .color(Color32::from_rgba_unmultiplied(70, 130, 180, 77))
                    .shape(MarkerShape::Circle)
                    .filled(true)
                    .radius(5.0),
            );
        });
}

// ---------------------------------------------------------------------------
// Tooltips
// ---------------------------------------------------------------------------

fn nearest_college<'a>(colleges: &'a [College], at: &PlotPoint) -> Option<&'a College> {
    colleges.iter().min_by(|a, b| {
        let da = (a.longitude - at.x).powi(2) + (a.latitude - at.y).powi(2);
        let db = (b.longitude - at.x).powi(2) + (b.latitude - at.y).powi(2);
        da.total_cmp(&db)
    })
}

fn nearest_scatter_point<'a>(points: &'a [ScatterPoint], at: &PlotPoint) -> Option<&'a ScatterPoint> {
    points.iter().min_by(|a, b| {
        let da = (a.earnings - at.x).powi(2) + (a.unemployment - at.y).powi(2);
        let db = (b.earnings - at.x).powi(2) + (b.unemployment - at.y).powi(2);
        da.total_cmp(&db)
    })
}

/// Map tooltip: zero-valued (unknown) metrics are left out.
fn map_tooltip(college: &College) -> String {
    let mut lines = vec![college.name.clone()];
    if college.undergrad_population != 0 {
        lines.push(format!("Undergrad Population: {}", college.undergrad_population));
    }
    if college.cost_of_attendance != 0.0 {
        lines.push(format!("Cost for Attendance: ${}", college.cost_of_attendance));
    }
    if college.mean_earnings_10yr != 0.0 {
        lines.push(format!("Mean Earnings After 10 Years: ${}", college.mean_earnings_10yr));
    }
    lines.join("\n")
}

fn scatter_tooltip(point: &ScatterPoint) -> String {
    format!(
        "{}\nMean Earnings After 10 Years: ${}\nUnemployment Rate: {}%",
        point.name, point.earnings, point.unemployment
    )
}
