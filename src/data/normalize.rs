use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::model::{College, Dataset, RawRecord, RawValue};

// ---------------------------------------------------------------------------
// State allow-list
// ---------------------------------------------------------------------------

/// The 50 states plus DC. Territories and freely associated states are excluded.
pub const US_STATES: [&str; 51] = [
    "AK", "AL", "AR", "AZ", "CA", "CO", "CT", "DC", "DE", "FL", "GA", "HI", "IA", "ID", "IL",
    "IN", "KS", "KY", "LA", "MA", "MD", "ME", "MI", "MN", "MO", "MS", "MT", "NC", "ND", "NE",
    "NH", "NJ", "NM", "NV", "NY", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT",
    "VA", "VT", "WA", "WI", "WV", "WY",
];

pub fn is_us_state(abbr: &str) -> bool {
    US_STATES.contains(&abbr)
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Source column names for each normalized field, tried in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldAliases {
    pub longitude: Vec<String>,
    pub latitude: Vec<String>,
    pub state: Vec<String>,
    pub name: Vec<String>,
    pub undergrad_population: Vec<String>,
    pub cost_of_attendance: Vec<String>,
    pub mean_earnings_10yr: Vec<String>,
    pub unemployment_rate: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for FieldAliases {
    fn default() -> Self {
        Self {
            longitude: names(&["LONGITUDE"]),
            latitude: names(&["LATITUDE"]),
            state: names(&["STABBR"]),
            name: names(&["INSTNM"]),
            undergrad_population: names(&["UG", "UGDS"]),
            cost_of_attendance: names(&["COSTT4_A", "COSTT4_P"]),
            mean_earnings_10yr: names(&["MN_EARN_WNE_P10"]),
            unemployment_rate: names(&["UNEMP_RATE"]),
        }
    }
}

/// Behaviour switches for [`normalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Drop records whose state is not one of [`US_STATES`].
    pub enforce_state_allow_list: bool,
    pub aliases: FieldAliases,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        DatasetVariant::default().config()
    }
}

impl NormalizerConfig {
    /// Read a JSON override file on top of `base`. Keys the file leaves out keep
    /// their value from `base`; alias lists it leaves out keep their defaults.
    pub fn from_json_file(path: &Path, base: NormalizerConfig) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading normalizer config {}", path.display()))?;
        Self::from_json_over(&text, base)
    }

    fn from_json_over(text: &str, base: NormalizerConfig) -> Result<Self> {
        let overrides: NormalizerOverrides =
            serde_json::from_str(text).context("parsing normalizer config")?;
        Ok(Self {
            enforce_state_allow_list: overrides
                .enforce_state_allow_list
                .unwrap_or(base.enforce_state_allow_list),
            aliases: overrides.aliases.unwrap_or(base.aliases),
        })
    }
}

/// Shape of an override file: only the keys that are present apply.
#[derive(Debug, Deserialize)]
struct NormalizerOverrides {
    enforce_state_allow_list: Option<bool>,
    aliases: Option<FieldAliases>,
}

/// The two data-loading paths. They differ only in allow-list enforcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetVariant {
    /// Cleaned scorecard CSV; territories are filtered out.
    #[default]
    Cleaned,
    /// Structured extract; any record with valid coordinates is kept.
    Structured,
}

impl DatasetVariant {
    pub const ALL: [DatasetVariant; 2] = [DatasetVariant::Cleaned, DatasetVariant::Structured];

    pub fn config(self) -> NormalizerConfig {
        NormalizerConfig {
            enforce_state_allow_list: matches!(self, DatasetVariant::Cleaned),
            aliases: FieldAliases::default(),
        }
    }
}

impl fmt::Display for DatasetVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetVariant::Cleaned => write!(f, "cleaned"),
            DatasetVariant::Structured => write!(f, "structured"),
        }
    }
}

impl FromStr for DatasetVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cleaned" | "csv" => Ok(Self::Cleaned),
            "structured" | "json" => Ok(Self::Structured),
            _ => Err(format!("Unknown dataset variant: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Turn raw rows into the working dataset.
///
/// Rows whose coordinates do not parse to finite numbers are dropped, as are rows
/// outside [`US_STATES`] when the allow-list is enforced. Order is preserved and no
/// deduplication happens. Numeric fields resolve through their alias chain; a value
/// that fails to parse, or parses to zero or less, counts as absent.
pub fn normalize(raw: &[RawRecord], config: &NormalizerConfig) -> Dataset {
    let colleges: Vec<College> = raw
        .iter()
        .filter_map(|record| normalize_record(record, config))
        .collect();

    let dropped = raw.len() - colleges.len();
    if dropped > 0 {
        log::debug!("Normalizer dropped {dropped} of {} rows", raw.len());
    }

    Dataset { colleges, dropped }
}

/// Normalize a single row, or `None` if it cannot be placed on the map.
pub fn normalize_record(record: &RawRecord, config: &NormalizerConfig) -> Option<College> {
    let aliases = &config.aliases;

    let longitude = first_coordinate(record, &aliases.longitude)?;
    let latitude = first_coordinate(record, &aliases.latitude)?;

    let state_abbr = first_text(record, &aliases.state);
    if config.enforce_state_allow_list && !is_us_state(&state_abbr) {
        return None;
    }

    Some(College {
        name: first_text(record, &aliases.name),
        state_abbr,
        longitude,
        latitude,
        undergrad_population: aliases
            .undergrad_population
            .iter()
            .find_map(|f| int_value(record.get(f)).filter(|v| *v > 0))
            .map(|v| v as u64)
            .unwrap_or(0),
        cost_of_attendance: first_positive(record, &aliases.cost_of_attendance).unwrap_or(0.0),
        mean_earnings_10yr: first_positive(record, &aliases.mean_earnings_10yr).unwrap_or(0.0),
        unemployment_rate: first_positive(record, &aliases.unemployment_rate).unwrap_or(1.0),
    })
}

fn first_coordinate(record: &RawRecord, fields: &[String]) -> Option<f64> {
    fields
        .iter()
        .find_map(|f| float_value(record.get(f)).filter(|v| v.is_finite()))
}

fn first_positive(record: &RawRecord, fields: &[String]) -> Option<f64> {
    fields
        .iter()
        .find_map(|f| float_value(record.get(f)).filter(|v| v.is_finite() && *v > 0.0))
}

fn first_text(record: &RawRecord, fields: &[String]) -> String {
    fields
        .iter()
        .find_map(|f| match record.get(f) {
            RawValue::Text(s) => Some(s.clone()),
            RawValue::Number(v) => Some(v.to_string()),
            RawValue::Missing => None,
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Lenient numeric parsing
// ---------------------------------------------------------------------------

/// Float view of a raw value: numbers pass through, text uses its numeric prefix.
pub fn float_value(value: &RawValue) -> Option<f64> {
    match value {
        RawValue::Number(v) if !v.is_nan() => Some(*v),
        RawValue::Text(s) => float_prefix(s),
        _ => None,
    }
}

/// Integer view of a raw value: numbers are truncated, text uses its integer prefix.
pub fn int_value(value: &RawValue) -> Option<i64> {
    match value {
        RawValue::Number(v) if v.is_finite() => Some(v.trunc() as i64),
        RawValue::Text(s) => int_prefix(s),
        _ => None,
    }
}

/// Parse the longest leading decimal number in `s`, after leading whitespace.
///
/// `"12.5abc"` → 12.5, `" -3e2x"` → -300, `"abc"` / `""` / `"."` → None.
pub fn float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_start = end;
    end = skip_digits(bytes, end);
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = skip_digits(bytes, end + 1);
        digits += frac_end - (end + 1);
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = skip_digits(bytes, exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// Parse the leading (optionally signed) integer in `s`, after leading whitespace.
///
/// `"500.7"` → 500, `"1e3"` → 1, `"x1"` → None. Digit runs too long for `i64`
/// saturate rather than failing.
pub fn int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let start = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let end = skip_digits(bytes, start);
    if end == start {
        return None;
    }
    match s[..end].parse::<i64>() {
        Ok(v) => Some(v),
        Err(_) if bytes[0] == b'-' => Some(i64::MIN),
        Err(_) => Some(i64::MAX),
    }
}

fn skip_digits(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row(lon: &str, lat: &str, state: &str) -> RawRecord {
        RawRecord::new()
            .with("INSTNM", "Test College")
            .with("STABBR", state)
            .with("LONGITUDE", lon)
            .with("LATITUDE", lat)
    }

    #[test]
    fn test_float_prefix() {
        assert_eq!(float_prefix("12000.5"), Some(12000.5));
        assert_eq!(float_prefix("  -100.3"), Some(-100.3));
        assert_eq!(float_prefix("45000abc"), Some(45000.0));
        assert_eq!(float_prefix(".5"), Some(0.5));
        assert_eq!(float_prefix("5."), Some(5.0));
        assert_eq!(float_prefix("1.5e3"), Some(1500.0));
        assert_eq!(float_prefix("2e"), Some(2.0));
        assert_eq!(float_prefix("abc"), None);
        assert_eq!(float_prefix(""), None);
        assert_eq!(float_prefix("."), None);
        assert_eq!(float_prefix("-"), None);
        assert_eq!(float_prefix("PrivacySuppressed"), None);
        assert_eq!(float_prefix("NULL"), None);
    }

    #[test]
    fn test_int_prefix() {
        assert_eq!(int_prefix("500"), Some(500));
        assert_eq!(int_prefix("500.7"), Some(500));
        assert_eq!(int_prefix("1e3"), Some(1));
        assert_eq!(int_prefix(" -4"), Some(-4));
        assert_eq!(int_prefix("x1"), None);
        assert_eq!(int_prefix(""), None);
        assert_eq!(int_prefix("99999999999999999999"), Some(i64::MAX));
        assert_eq!(int_prefix("-99999999999999999999"), Some(i64::MIN));
        assert_eq!(int_prefix("9007199254740993"), Some(9_007_199_254_740_993));
    }

    #[test]
    fn test_oversized_primary_does_not_fall_through() {
        let record = row("-71.1", "42.4", "MA")
            .with("UG", "99999999999999999999")
            .with("UGDS", "5");
        let college = normalize_record(&record, &NormalizerConfig::default()).unwrap();
        assert_eq!(college.undergrad_population, i64::MAX as u64);
    }

    #[test]
    fn test_override_json_keeps_base_flag() {
        let overrides = r#"{ "aliases": { "undergrad_population": ["UGDS"] } }"#;
        let structured =
            NormalizerConfig::from_json_over(overrides, DatasetVariant::Structured.config()).unwrap();
        assert!(!structured.enforce_state_allow_list);
        assert_eq!(structured.aliases.undergrad_population, names(&["UGDS"]));
        assert_eq!(structured.aliases.cost_of_attendance, names(&["COSTT4_A", "COSTT4_P"]));

        let forced = NormalizerConfig::from_json_over(
            r#"{ "enforce_state_allow_list": true }"#,
            DatasetVariant::Structured.config(),
        )
        .unwrap();
        assert!(forced.enforce_state_allow_list);
        assert_eq!(forced.aliases, FieldAliases::default());
    }

    #[test]
    fn test_non_numeric_latitude_is_excluded() {
        let config = DatasetVariant::Structured.config();
        let raw = vec![row("-100.3", "abc", "TX"), row("-100.3", "31.2", "TX")];
        let ds = normalize(&raw, &config);
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.dropped, 1);
        assert_eq!(ds.colleges[0].latitude, 31.2);
    }

    #[test]
    fn test_alternate_fields_and_sentinels() {
        let record = row("-97.1", "32.7", "TX")
            .with("UG", "")
            .with("UGDS", "500")
            .with("COSTT4_A", "")
            .with("COSTT4_P", "12000.5")
            .with("MN_EARN_WNE_P10", "45000")
            .with("UNEMP_RATE", "");
        let college = normalize_record(&record, &NormalizerConfig::default()).unwrap();
        assert_eq!(college.undergrad_population, 500);
        assert_eq!(college.cost_of_attendance, 12000.5);
        assert_eq!(college.mean_earnings_10yr, 45000.0);
        assert_eq!(college.unemployment_rate, 1.0);
        assert_eq!(college.name, "Test College");
        assert_eq!(college.state_abbr, "TX");
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let college =
            normalize_record(&row("-71.1", "42.4", "MA"), &NormalizerConfig::default()).unwrap();
        assert_eq!(college.undergrad_population, 0);
        assert_eq!(college.cost_of_attendance, 0.0);
        assert_eq!(college.mean_earnings_10yr, 0.0);
        assert_eq!(college.unemployment_rate, 1.0);
    }

    #[test]
    fn test_zero_primary_falls_through_to_alternate() {
        let record = row("-71.1", "42.4", "MA")
            .with("UG", "0")
            .with("UGDS", "750")
            .with("UNEMP_RATE", "0");
        let college = normalize_record(&record, &NormalizerConfig::default()).unwrap();
        assert_eq!(college.undergrad_population, 750);
        assert_eq!(college.unemployment_rate, 1.0);
    }

    #[test]
    fn test_primary_field_wins_when_present() {
        let record = row("-71.1", "42.4", "MA")
            .with("UG", "120")
            .with("UGDS", "750")
            .with("COSTT4_A", "30000")
            .with("COSTT4_P", "9000");
        let college = normalize_record(&record, &NormalizerConfig::default()).unwrap();
        assert_eq!(college.undergrad_population, 120);
        assert_eq!(college.cost_of_attendance, 30000.0);
    }

    #[test]
    fn test_numeric_raw_values() {
        let record = RawRecord::new()
            .with("LONGITUDE", -122.4)
            .with("LATITUDE", 37.8)
            .with("STABBR", "CA")
            .with("UGDS", 1234.9)
            .with("UNEMP_RATE", 3.2);
        let college = normalize_record(&record, &NormalizerConfig::default()).unwrap();
        assert_eq!(college.undergrad_population, 1234);
        assert_eq!(college.unemployment_rate, 3.2);
    }

    #[test]
    fn test_negative_values_are_treated_as_absent() {
        let record = row("-71.1", "42.4", "MA")
            .with("UG", "-5")
            .with("COSTT4_A", "-100")
            .with("UNEMP_RATE", "-2");
        let college = normalize_record(&record, &NormalizerConfig::default()).unwrap();
        assert_eq!(college.undergrad_population, 0);
        assert_eq!(college.cost_of_attendance, 0.0);
        assert_eq!(college.unemployment_rate, 1.0);
    }

    #[test]
    fn test_allow_list_toggle() {
        let raw = vec![
            row("144.8", "13.4", "GU"),
            row("-77.0", "38.9", "DC"),
            row("-66.1", "18.4", "PR"),
            row("-87.6", "41.9", "il"),
        ];

        let cleaned = normalize(&raw, &DatasetVariant::Cleaned.config());
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned.colleges[0].state_abbr, "DC");

        let structured = normalize(&raw, &DatasetVariant::Structured.config());
        assert_eq!(structured.len(), 4);
    }

    #[test]
    fn test_output_preserves_order_without_dedup() {
        let raw = vec![
            row("-1", "1", "NY").with("INSTNM", "B"),
            row("-2", "2", "NY").with("INSTNM", "A"),
            row("-1", "1", "NY").with("INSTNM", "B"),
        ];
        let ds = normalize(&raw, &NormalizerConfig::default());
        let names: Vec<&str> = ds.colleges.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "B"]);
    }

    #[test]
    fn test_custom_aliases() {
        let config = NormalizerConfig {
            enforce_state_allow_list: false,
            aliases: FieldAliases {
                longitude: names(&["lon"]),
                latitude: names(&["lat"]),
                undergrad_population: names(&["enrollment"]),
                ..FieldAliases::default()
            },
        };
        let record = RawRecord::new()
            .with("lon", "-80.0")
            .with("lat", "35.0")
            .with("enrollment", "42");
        let college = normalize_record(&record, &config).unwrap();
        assert_eq!(college.undergrad_population, 42);
    }

    #[test]
    fn test_config_json_defaults() {
        let config: NormalizerConfig =
            serde_json::from_str(r#"{ "enforce_state_allow_list": false }"#).unwrap();
        assert!(!config.enforce_state_allow_list);
        assert_eq!(config.aliases, FieldAliases::default());
    }

    #[test]
    fn test_variant_from_str() {
        assert_eq!("Cleaned".parse::<DatasetVariant>(), Ok(DatasetVariant::Cleaned));
        assert_eq!("json".parse::<DatasetVariant>(), Ok(DatasetVariant::Structured));
        assert!("territories".parse::<DatasetVariant>().is_err());
    }

    fn cell() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            Just("NULL".to_string()),
            Just("PrivacySuppressed".to_string()),
            (-1.0e6f64..1.0e6).prop_map(|v| v.to_string()),
            "[a-z0-9.\\-]{0,6}",
        ]
    }

    proptest! {
        #[test]
        fn prop_numeric_fields_are_non_negative(
            ug in cell(), ugds in cell(), cost in cell(), cost_p in cell(),
            earn in cell(), unemp in cell()
        ) {
            let record = row("-90.0", "40.0", "IL")
                .with("UG", ug.as_str())
                .with("UGDS", ugds.as_str())
                .with("COSTT4_A", cost.as_str())
                .with("COSTT4_P", cost_p.as_str())
                .with("MN_EARN_WNE_P10", earn.as_str())
                .with("UNEMP_RATE", unemp.as_str());
            let c = normalize_record(&record, &NormalizerConfig::default()).unwrap();
            prop_assert!(c.cost_of_attendance >= 0.0 && !c.cost_of_attendance.is_nan());
            prop_assert!(c.mean_earnings_10yr >= 0.0 && !c.mean_earnings_10yr.is_nan());
            prop_assert!(c.unemployment_rate >= 0.0 && !c.unemployment_rate.is_nan());
        }

        #[test]
        fn prop_bad_coordinates_are_excluded(good in 0usize..8, bad in 0usize..8) {
            let mut raw = Vec::new();
            for i in 0..good {
                raw.push(row(&format!("-{}.5", 70 + i), "40.0", "NY"));
            }
            for i in 0..bad {
                let lat = if i % 2 == 0 { "abc" } else { "" };
                raw.push(row("-75.0", lat, "NY"));
            }
            let ds = normalize(&raw, &NormalizerConfig::default());
            prop_assert_eq!(ds.len(), good);
            prop_assert_eq!(ds.dropped, bad);
            prop_assert!(ds.colleges.iter().all(|c| c.longitude.is_finite() && c.latitude.is_finite()));
        }
    }
}
