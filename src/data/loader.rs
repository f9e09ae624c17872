use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{anyhow, bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Dataset, RawRecord, RawValue};
use super::normalize::{normalize, NormalizerConfig};
use super::topology::{parse_topology, StateBoundaries};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Where a session's two resources live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSources {
    /// Tabular scorecard data (`.csv`, `.json`, `.parquet`).
    pub table: PathBuf,
    /// Optional TopoJSON state boundaries.
    pub boundaries: Option<PathBuf>,
}

/// Everything a completed load hands to the session.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub dataset: Dataset,
    pub boundaries: Option<StateBoundaries>,
}

/// Load both resources, wait for both, then normalize the table.
///
/// The boundary file is read on a second thread while the table loads. Either
/// failure fails the whole load; nothing is retried.
pub fn load_sources(sources: &DataSources, config: &NormalizerConfig) -> Result<LoadedData> {
    let (records, boundaries) = thread::scope(|scope| {
        let pending = sources
            .boundaries
            .as_deref()
            .map(|path| scope.spawn(move || load_boundaries(path)));

        let records = load_records(&sources.table);

        let boundaries = pending
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(_) => Err(anyhow!("boundary loader thread panicked")),
            })
            .transpose();

        (records, boundaries)
    });

    let records = records?;
    let boundaries = boundaries?;

    let dataset = normalize(&records, config);
    log::info!(
        "Loaded {} of {} rows from {} ({} dropped)",
        dataset.len(),
        records.len(),
        sources.table.display(),
        dataset.dropped
    );
    if let Some(b) = &boundaries {
        log::info!("Loaded {} state outlines, {} border arcs", b.states.len(), b.borders.len());
    }

    Ok(LoadedData { dataset, boundaries })
}

/// Load raw scorecard rows from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, every cell read as text
/// * `.json`    – `[{ "INSTNM": "...", ... }, ...]` or `{ "records": [...] }`
/// * `.parquet` – flat scalar columns (strings, ints, floats, bools)
pub fn load_records(path: &Path) -> Result<Vec<RawRecord>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let records = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    };
    records.with_context(|| format!("loading {}", path.display()))
}

/// Load TopoJSON state boundaries.
pub fn load_boundaries(path: &Path) -> Result<StateBoundaries> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading boundaries {}", path.display()))?;
    parse_topology(&text).with_context(|| format!("decoding boundaries {}", path.display()))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Every cell becomes [`RawValue::Text`]; an empty cell stays an empty string so
/// the normalizer decides what it means.
fn load_csv(path: &Path) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;

        let mut record = RawRecord::new();
        for (name, value) in headers.iter().zip(row.iter()) {
            record.insert(name.clone(), value);
        }
        records.push(record);
    }

    Ok(records)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   { "INSTNM": "Example College", "LONGITUDE": -86.5, "LATITUDE": "34.7", "UGDS": 4051 },
///   ...
/// ]
/// ```
///
/// A `{ "records": [...] }` wrapper is also accepted.
fn load_json(path: &Path) -> Result<Vec<RawRecord>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json_records(&text)
}

fn parse_json_records(text: &str) -> Result<Vec<RawRecord>> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let rows = root
        .as_array()
        .or_else(|| root.get("records").and_then(|r| r.as_array()))
        .context("Expected top-level JSON array or a 'records' array")?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let obj = row
                .as_object()
                .with_context(|| format!("Row {i} is not a JSON object"))?;
            let mut record = RawRecord::new();
            for (key, val) in obj {
                record.insert(key.clone(), json_to_raw(val));
            }
            Ok(record)
        })
        .collect()
}

fn json_to_raw(val: &JsonValue) -> RawValue {
    match val {
        JsonValue::String(s) => RawValue::Text(s.clone()),
        JsonValue::Number(n) => n.as_f64().map(RawValue::Number).unwrap_or(RawValue::Missing),
        JsonValue::Null => RawValue::Missing,
        JsonValue::Bool(b) => RawValue::Text(b.to_string()),
        other => RawValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet extract with one scalar column per source field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Vec<RawRecord>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        for row in 0..batch.num_rows() {
            let mut record = RawRecord::new();
            for (field, column) in schema.fields().iter().zip(batch.columns()) {
                record.insert(field.name().clone(), extract_raw_value(column, row));
            }
            records.push(record);
        }
    }

    Ok(records)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_raw_value(col: &ArrayRef, row: usize) -> RawValue {
    if col.is_null(row) {
        return RawValue::Missing;
    }
    let number = |v: Option<f64>| v.map(RawValue::Number).unwrap_or(RawValue::Missing);
    match col.data_type() {
        DataType::Utf8 => RawValue::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => RawValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => number(
            col.as_any()
                .downcast_ref::<Int32Array>()
                .map(|a| a.value(row) as f64),
        ),
        DataType::Int64 => number(
            col.as_any()
                .downcast_ref::<Int64Array>()
                .map(|a| a.value(row) as f64),
        ),
        DataType::Float32 => number(
            col.as_any()
                .downcast_ref::<Float32Array>()
                .map(|a| a.value(row) as f64),
        ),
        DataType::Float64 => number(
            col.as_any()
                .downcast_ref::<Float64Array>()
                .map(|a| a.value(row)),
        ),
        DataType::Boolean => col
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map(|a| RawValue::Text(a.value(row).to_string()))
            .unwrap_or(RawValue::Missing),
        other => {
            log::warn!("Unsupported parquet column type {other:?}; reading as missing");
            RawValue::Missing
        }
    }
}
