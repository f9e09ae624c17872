use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// RawValue – a single untyped cell as delivered by the data source
// ---------------------------------------------------------------------------

/// A raw field value before normalization.
///
/// CSV cells always arrive as `Text` (an empty cell is `Text("")`), JSON numbers
/// as `Number`, and JSON `null` / Parquet nulls / absent keys as `Missing`.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Number(f64),
    Missing,
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Text(s) => write!(f, "{s}"),
            RawValue::Number(v) => write!(f, "{v}"),
            RawValue::Missing => write!(f, "<missing>"),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

// ---------------------------------------------------------------------------
// RawRecord – one row of the source table
// ---------------------------------------------------------------------------

/// One untyped source row: field name → value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub fields: BTreeMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a field; absent fields read as [`RawValue::Missing`].
    pub fn get(&self, field: &str) -> &RawValue {
        self.fields.get(field).unwrap_or(&RawValue::Missing)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<RawValue>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Builder-style insert, handy for fixtures.
    pub fn with(mut self, field: &str, value: impl Into<RawValue>) -> Self {
        self.insert(field, value);
        self
    }
}

// ---------------------------------------------------------------------------
// College – one normalized record in the working dataset
// ---------------------------------------------------------------------------

/// A normalized institution record.
///
/// Coordinates are always finite. Numeric outcome fields are never NaN and never
/// negative: unknown values hold the sentinel `0.0` (`1.0` for the unemployment rate).
#[derive(Debug, Clone, PartialEq)]
pub struct College {
    pub name: String,
    pub state_abbr: String,
    pub longitude: f64,
    pub latitude: f64,
    pub undergrad_population: u64,
    pub cost_of_attendance: f64,
    pub mean_earnings_10yr: f64,
    pub unemployment_rate: f64,
}

// ---------------------------------------------------------------------------
// ScatterPoint – projection consumed by the scatter view
// ---------------------------------------------------------------------------

/// `(earnings, unemployment, name)` triple drawn by the scatter view.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub earnings: f64,
    pub unemployment: f64,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Dataset – the complete normalized dataset
// ---------------------------------------------------------------------------

/// The working dataset, built once per load and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Accepted records in source order.
    pub colleges: Vec<College>,
    /// Number of raw rows rejected during normalization.
    pub dropped: usize,
}

impl Dataset {
    /// Number of records.
    pub fn len(&self) -> usize {
        self.colleges.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.colleges.is_empty()
    }
}
