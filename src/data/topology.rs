use geo::{BoundingRect, Contains, LineString, MultiPolygon, Point, Polygon, Rect};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Name of the topology object holding the state geometries.
pub const STATES_OBJECT: &str = "states";

#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("Invalid topology JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Topology has no '{0}' object")]
    MissingObject(String),
    #[error("Topology is missing the 'arcs' array")]
    MissingArcs,
    #[error("Arc {0}: position is not a pair of numbers")]
    BadPosition(usize),
    #[error("Geometry {geometry}: arc index {index} out of range")]
    ArcOutOfRange { geometry: usize, index: i64 },
    #[error("Geometry {0}: malformed 'arcs' nesting")]
    BadArcs(usize),
}

// ---------------------------------------------------------------------------
// Decoded shapes
// ---------------------------------------------------------------------------

/// One state outline in longitude/latitude.
#[derive(Debug, Clone)]
pub struct StateShape {
    pub id: String,
    pub name: Option<String>,
    pub outline: MultiPolygon<f64>,
}

/// Axis-aligned view window in map coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBounds {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl ViewBounds {
    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    fn from_rect(rect: Rect<f64>) -> Self {
        Self {
            min: [rect.min().x, rect.min().y],
            max: [rect.max().x, rect.max().y],
        }
    }
}

/// Decoded state boundaries: shapes for hit-testing, arcs for drawing borders.
#[derive(Debug, Clone, Default)]
pub struct StateBoundaries {
    pub states: Vec<StateShape>,
    /// Every arc once, so shared borders are drawn a single time.
    pub borders: Vec<Vec<[f64; 2]>>,
}

impl StateBoundaries {
    /// Index of the state containing the point, if any.
    pub fn state_at(&self, lon: f64, lat: f64) -> Option<usize> {
        let point = Point::new(lon, lat);
        self.states.iter().position(|s| s.outline.contains(&point))
    }

    /// Extent covering every state.
    pub fn extent(&self) -> Option<ViewBounds> {
        self.states
            .iter()
            .filter_map(|s| s.outline.bounding_rect())
            .reduce(|a, b| {
                Rect::new(
                    (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                    (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
                )
            })
            .map(ViewBounds::from_rect)
    }

    /// View window zoomed onto one state, relative to the full extent.
    pub fn zoom_to(&self, index: usize) -> Option<ViewBounds> {
        let full = self.extent()?;
        let target = self.states.get(index)?.outline.bounding_rect()?;
        Some(zoom_bounds(full, ViewBounds::from_rect(target)))
    }
}

/// Zoom `full` so that `target` fills 90% of the view, clamped to 1x..8x.
pub fn zoom_bounds(full: ViewBounds, target: ViewBounds) -> ViewBounds {
    let fill = (target.width() / full.width()).max(target.height() / full.height());
    let scale = if fill > 0.0 { (0.9 / fill).clamp(1.0, 8.0) } else { 8.0 };

    let cx = (target.min[0] + target.max[0]) / 2.0;
    let cy = (target.min[1] + target.max[1]) / 2.0;
    let half_w = full.width() / scale / 2.0;
    let half_h = full.height() / scale / 2.0;

    ViewBounds {
        min: [cx - half_w, cy - half_h],
        max: [cx + half_w, cy + half_h],
    }
}

// ---------------------------------------------------------------------------
// TopoJSON decoding
// ---------------------------------------------------------------------------

/// Decode the `states` object of a TopoJSON topology.
///
/// Quantized topologies (with a `transform`) have delta-encoded arcs; without a
/// transform, arc positions are absolute.
pub fn parse_topology(text: &str) -> Result<StateBoundaries, TopologyError> {
    let root: JsonValue = serde_json::from_str(text)?;

    let arcs = decode_arcs(&root)?;

    let object = root
        .get("objects")
        .and_then(|o| o.get(STATES_OBJECT))
        .ok_or_else(|| TopologyError::MissingObject(STATES_OBJECT.to_string()))?;

    let geometries: Vec<&JsonValue> = match object.get("geometries").and_then(|g| g.as_array()) {
        Some(list) => list.iter().collect(),
        None => vec![object],
    };

    let mut states = Vec::new();
    for (i, geometry) in geometries.iter().enumerate() {
        let polygons = match geometry.get("type").and_then(|t| t.as_str()) {
            Some("Polygon") => vec![polygon(&arcs, i, geometry.get("arcs"))?],
            Some("MultiPolygon") => geometry
                .get("arcs")
                .and_then(|a| a.as_array())
                .ok_or(TopologyError::BadArcs(i))?
                .iter()
                .map(|rings| polygon(&arcs, i, Some(rings)))
                .collect::<Result<Vec<_>, _>>()?,
            _ => continue,
        };

        states.push(StateShape {
            id: geometry.get("id").map(id_string).unwrap_or_else(|| i.to_string()),
            name: geometry
                .get("properties")
                .and_then(|p| p.get("name"))
                .and_then(|n| n.as_str())
                .map(str::to_string),
            outline: MultiPolygon::new(polygons),
        });
    }

    Ok(StateBoundaries {
        states,
        borders: arcs,
    })
}

fn id_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn decode_arcs(root: &JsonValue) -> Result<Vec<Vec<[f64; 2]>>, TopologyError> {
    let raw_arcs = root
        .get("arcs")
        .and_then(|a| a.as_array())
        .ok_or(TopologyError::MissingArcs)?;

    let transform = root.get("transform").and_then(|t| {
        let scale = pair(t.get("scale")?)?;
        let translate = pair(t.get("translate")?)?;
        Some((scale, translate))
    });

    raw_arcs
        .iter()
        .enumerate()
        .map(|(i, arc)| {
            let positions = arc.as_array().ok_or(TopologyError::BadPosition(i))?;
            let mut x = 0.0;
            let mut y = 0.0;
            positions
                .iter()
                .map(|p| {
                    let [px, py] = pair(p).ok_or(TopologyError::BadPosition(i))?;
                    Ok(match transform {
                        Some((scale, translate)) => {
                            x += px;
                            y += py;
                            [x * scale[0] + translate[0], y * scale[1] + translate[1]]
                        }
                        None => [px, py],
                    })
                })
                .collect::<Result<Vec<_>, TopologyError>>()
        })
        .collect()
}

fn pair(value: &JsonValue) -> Option<[f64; 2]> {
    let arr = value.as_array()?;
    Some([arr.first()?.as_f64()?, arr.get(1)?.as_f64()?])
}

fn polygon(
    arcs: &[Vec<[f64; 2]>],
    geometry: usize,
    rings: Option<&JsonValue>,
) -> Result<Polygon<f64>, TopologyError> {
    let rings = rings
        .and_then(|r| r.as_array())
        .ok_or(TopologyError::BadArcs(geometry))?;

    let mut lines = rings
        .iter()
        .map(|ring| {
            let indices = ring.as_array().ok_or(TopologyError::BadArcs(geometry))?;
            let mut coords: Vec<[f64; 2]> = Vec::new();
            for index in indices {
                let index = index.as_i64().ok_or(TopologyError::BadArcs(geometry))?;
                let arc = arc_points(arcs, index)
                    .ok_or(TopologyError::ArcOutOfRange { geometry, index })?;
                // Consecutive arcs share an endpoint.
                let skip = usize::from(!coords.is_empty());
                coords.extend(arc.into_iter().skip(skip));
            }
            Ok(LineString::from(coords))
        })
        .collect::<Result<Vec<_>, TopologyError>>()?
        .into_iter();

    let exterior = lines.next().ok_or(TopologyError::BadArcs(geometry))?;
    Ok(Polygon::new(exterior, lines.collect()))
}

/// Arc points for a topology arc index; negative indices (`!i`) are reversed.
fn arc_points(arcs: &[Vec<[f64; 2]>], index: i64) -> Option<Vec<[f64; 2]>> {
    if index >= 0 {
        arcs.get(usize::try_from(index).ok()?).cloned()
    } else {
        let mut points = arcs.get(usize::try_from(!index).ok()?)?.clone();
        points.reverse();
        Some(points)
    }
}
