use crate::data::filter::{
    apply_filter, derive_bounds, scatter_extent, scatter_points, FilterRanges, RangeBound,
};
use crate::data::loader::{load_sources, DataSources, LoadedData};
use crate::data::model::{College, Dataset, ScatterPoint};
use crate::data::normalize::{DatasetVariant, NormalizerConfig};
use crate::data::topology::{StateBoundaries, ViewBounds};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full session state, independent of rendering.
///
/// Only the UI thread writes to it. The dataset is replaced wholesale on load and
/// never mutated; every filter change recomputes `visible` and `scatter`.
pub struct AppState {
    /// Normalized dataset (None until a load succeeds).
    pub dataset: Option<Dataset>,

    /// State outlines for the map, when a boundary file was loaded.
    pub boundaries: Option<StateBoundaries>,

    /// Slider extents, derived once per load.
    pub bounds: FilterRanges,

    /// Current slider values.
    pub ranges: FilterRanges,

    /// Records passing the current ranges (map view).
    pub visible: Vec<College>,

    /// Scatter projection of `visible`.
    pub scatter: Vec<ScatterPoint>,

    /// Scatter axis maxima, fixed from the full dataset at load time.
    pub scatter_extent: (f64, f64),

    /// Index into `boundaries.states` of the zoomed-in state.
    pub selected_state: Option<usize>,

    /// Map window the plot should jump to on its next frame.
    pub pending_view: Option<ViewBounds>,

    /// Where the current dataset came from.
    pub sources: Option<DataSources>,

    /// Normalizer settings used for the next load.
    pub config: NormalizerConfig,

    /// Loading path the config was derived from.
    pub variant: DatasetVariant,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DatasetVariant::default().config(), DatasetVariant::default())
    }
}

impl AppState {
    pub fn new(config: NormalizerConfig, variant: DatasetVariant) -> Self {
        Self {
            dataset: None,
            boundaries: None,
            bounds: FilterRanges::default(),
            ranges: FilterRanges::default(),
            visible: Vec::new(),
            scatter: Vec::new(),
            scatter_extent: (0.0, 0.0),
            selected_state: None,
            pending_view: None,
            sources: None,
            config,
            variant,
            status_message: None,
        }
    }

    /// Load both resources and install the result.
    ///
    /// A failure is fatal for the session: it is logged, shown, and leaves no
    /// dataset until another load succeeds.
    pub fn load(&mut self, sources: DataSources) -> bool {
        let result = load_sources(&sources, &self.config);
        self.sources = Some(sources);
        match result {
            Ok(loaded) => {
                self.set_dataset(loaded);
                true
            }
            Err(e) => {
                log::error!("Failed to load data: {e:#}");
                self.clear();
                self.status_message = Some(format!("Error: {e:#}"));
                false
            }
        }
    }

    /// Load the current sources again, e.g. after a config change.
    pub fn reload(&mut self) -> bool {
        match self.sources.clone() {
            Some(sources) => self.load(sources),
            None => false,
        }
    }

    /// Switch between the two loading paths and reload.
    pub fn set_variant(&mut self, variant: DatasetVariant) {
        if variant == self.variant {
            return;
        }
        log::info!("Switching to the {variant} dataset variant");
        self.variant = variant;
        self.config.enforce_state_allow_list = variant.config().enforce_state_allow_list;
        self.reload();
    }

    /// Ingest a newly loaded dataset, seed the sliders and both views.
    pub fn set_dataset(&mut self, loaded: LoadedData) {
        let LoadedData { dataset, boundaries } = loaded;

        self.bounds = derive_bounds(&dataset).unwrap_or_default();
        self.ranges = self.bounds;
        self.visible = dataset.colleges.clone();
        self.scatter = scatter_points(&self.visible);
        self.scatter_extent = scatter_extent(&self.scatter);

        self.dataset = Some(dataset);
        self.boundaries = boundaries;
        self.selected_state = None;
        self.pending_view = None;
        self.status_message = None;
    }

    fn clear(&mut self) {
        self.dataset = None;
        self.boundaries = None;
        self.bounds = FilterRanges::default();
        self.ranges = FilterRanges::default();
        self.visible.clear();
        self.scatter.clear();
        self.scatter_extent = (0.0, 0.0);
        self.selected_state = None;
        self.pending_view = None;
    }

    /// Store one slider value and recompute both views from all six.
    pub fn set_range(&mut self, bound: RangeBound, value: f64) {
        self.ranges.set(bound, value);
        self.refilter();
    }

    /// Put every slider back at its extent.
    pub fn reset_ranges(&mut self) {
        self.ranges = self.bounds;
        self.refilter();
    }

    /// Recompute `visible` and `scatter` after a filter change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible = apply_filter(&ds.colleges, &self.ranges);
            self.scatter = scatter_points(&self.visible);
            log::debug!(
                "Filter: {} of {} on map, {} on scatter",
                self.visible.len(),
                ds.len(),
                self.scatter.len()
            );
        }
    }

    /// Handle a click on the map at `(lon, lat)`.
    ///
    /// Clicking a state zooms onto it; clicking it again, or clicking outside
    /// every state, zooms back out.
    pub fn select_state_at(&mut self, lon: f64, lat: f64) {
        let Some(boundaries) = &self.boundaries else {
            return;
        };
        match boundaries.state_at(lon, lat) {
            Some(index) if self.selected_state != Some(index) => {
                self.selected_state = Some(index);
                self.pending_view = boundaries.zoom_to(index);
            }
            _ => self.reset_selection(),
        }
    }

    /// Display name of the selected state, falling back to its topology id.
    pub fn selected_state_label(&self) -> Option<String> {
        let shape = self.boundaries.as_ref()?.states.get(self.selected_state?)?;
        Some(shape.name.clone().unwrap_or_else(|| shape.id.clone()))
    }

    /// Clear the state selection and zoom back to the full map.
    pub fn reset_selection(&mut self) {
        self.selected_state = None;
        self.pending_view = self.boundaries.as_ref().and_then(|b| b.extent());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::topology::parse_topology;
    use std::io::Write;
    use std::path::PathBuf;

    fn college(name: &str, ug: u64, earnings: f64, cost: f64) -> College {
        College {
            name: name.to_string(),
            state_abbr: "WA".to_string(),
            longitude: -120.0,
            latitude: 47.0,
            undergrad_population: ug,
            cost_of_attendance: cost,
            mean_earnings_10yr: earnings,
            unemployment_rate: 4.0,
        }
    }

    fn loaded() -> LoadedData {
        LoadedData {
            dataset: Dataset {
                colleges: vec![
                    college("small", 100, 0.0, 8000.0),
                    college("medium", 500, 42000.0, 15000.0),
                    college("large", 9000, 61000.0, 52000.0),
                ],
                dropped: 0,
            },
            boundaries: None,
        }
    }

    #[test]
    fn test_set_dataset_seeds_ranges_and_views() {
        let mut state = AppState::default();
        state.set_dataset(loaded());

        assert_eq!(state.bounds.ug_min, 100.0);
        assert_eq!(state.bounds.ug_max, 9000.0);
        assert_eq!(state.ranges, state.bounds);
        assert_eq!(state.visible.len(), 3);
        assert_eq!(state.scatter.len(), 2);
        assert_eq!(state.scatter_extent, (61000.0, 4.0));
    }

    #[test]
    fn test_set_range_refilters_both_views() {
        let mut state = AppState::default();
        state.set_dataset(loaded());

        state.set_range(RangeBound::UgMax, 500.0);
        let names: Vec<&str> = state.visible.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["small", "medium"]);
        assert_eq!(state.scatter.len(), 1);
        assert_eq!(state.scatter[0].name, "medium");
        // Axes stay fixed to the full dataset.
        assert_eq!(state.scatter_extent, (61000.0, 4.0));

        state.set_range(RangeBound::CostMin, 10000.0);
        assert_eq!(state.visible.len(), 1);

        state.reset_ranges();
        assert_eq!(state.visible.len(), 3);
        assert_eq!(state.dataset.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn test_empty_dataset_gets_zero_ranges() {
        let mut state = AppState::default();
        state.set_dataset(LoadedData {
            dataset: Dataset::default(),
            boundaries: None,
        });
        assert_eq!(state.bounds, FilterRanges::default());
        assert!(state.visible.is_empty());
    }

    #[test]
    fn test_failed_load_clears_session() {
        let mut state = AppState::default();
        state.set_dataset(loaded());

        let ok = state.load(DataSources {
            table: PathBuf::from("/definitely/missing/scorecard.csv"),
            boundaries: None,
        });
        assert!(!ok);
        assert!(state.dataset.is_none());
        assert!(state.visible.is_empty());
        assert!(state.status_message.as_deref().unwrap().starts_with("Error"));
    }

    #[test]
    fn test_variant_switch_reloads() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "INSTNM,STABBR,LONGITUDE,LATITUDE").unwrap();
        writeln!(file, "Mainland College,WA,-122.3,47.6").unwrap();
        writeln!(file, "Island College,PR,-66.1,18.4").unwrap();

        let mut state = AppState::default();
        assert!(state.load(DataSources {
            table: file.path().to_path_buf(),
            boundaries: None,
        }));
        assert_eq!(state.visible.len(), 1);

        state.set_variant(DatasetVariant::Structured);
        assert_eq!(state.visible.len(), 2);
        assert!(!state.config.enforce_state_allow_list);
    }

    #[test]
    fn test_state_selection_toggles_zoom() {
        let boundaries = parse_topology(
            r#"{
                "objects": { "states": { "type": "GeometryCollection", "geometries": [
                    { "type": "Polygon", "id": "A", "arcs": [[0]], "properties": { "name": "Alpha" } },
                    { "type": "Polygon", "id": "B", "arcs": [[1]] }
                ] } },
                "arcs": [
                    [[0, 0], [1, 0], [1, 1], [0, 1], [0, 0]],
                    [[9, 9], [10, 9], [10, 10], [9, 10], [9, 9]]
                ]
            }"#,
        )
        .unwrap();

        let mut state = AppState::default();
        state.set_dataset(LoadedData {
            boundaries: Some(boundaries),
            ..loaded()
        });

        assert_eq!(state.selected_state_label(), None);
        state.select_state_at(0.5, 0.5);
        assert_eq!(state.selected_state, Some(0));
        assert_eq!(state.selected_state_label().as_deref(), Some("Alpha"));
        let zoomed = state.pending_view.take().unwrap();
        assert!(zoomed.width() < 10.0);

        state.select_state_at(0.5, 0.5);
        assert_eq!(state.selected_state, None);
        let full = state.pending_view.take().unwrap();
        assert_eq!(full, ViewBounds { min: [0.0, 0.0], max: [10.0, 10.0] });

        state.select_state_at(9.5, 9.5);
        assert_eq!(state.selected_state, Some(1));
        assert_eq!(state.selected_state_label().as_deref(), Some("B"));
        state.select_state_at(5.0, 5.0);
        assert_eq!(state.selected_state, None);
        assert_eq!(state.selected_state_label(), None);
    }
}
