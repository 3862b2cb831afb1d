//! Local input files.
//!
//! Two formats stand in for the HTTP source:
//!
//! - `.json`: a saved protocol document, parsed exactly like the API body
//! - `.csv`: one observation per row (`date`, `tvl`, optional `chain`)
//!
//! CSV rows are validated one by one: bad rows are skipped and reported with
//! their line number, and the ingest fails only if nothing usable remains.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::data::{parse_protocol_document, unix_to_utc_date};
use crate::domain::{Observation, ProtocolData, Series};
use crate::error::TvlError;

const VALUE_COLUMNS: [&str; 3] = ["tvl", "value", "totalliquidityusd"];

/// A row-level error encountered during CSV ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// CSV ingest output: parsed protocol data + row bookkeeping.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub data: ProtocolData,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load a protocol document or observation CSV, picked by file extension.
pub fn load_protocol_file(path: &Path, protocol: &str) -> Result<ProtocolData, TvlError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("json") => {
            let body = std::fs::read_to_string(path).map_err(|e| {
                TvlError::Ingest(format!("Failed to read '{}': {e}", path.display()))
            })?;
            parse_protocol_document(protocol, &body)
        }
        Some("csv") => {
            let ingested = load_observation_csv(path, protocol)?;
            for err in &ingested.row_errors {
                tracing::warn!(line = err.line, "skipping CSV row: {}", err.message);
            }
            tracing::info!(
                rows_read = ingested.rows_read,
                rows_used = ingested.rows_used,
                "loaded observation CSV"
            );
            Ok(ingested.data)
        }
        _ => Err(TvlError::Ingest(format!(
            "Unsupported input file '{}': expected .json or .csv",
            path.display()
        ))),
    }
}

/// Load observations from CSV.
///
/// Rows without a `chain` value feed the aggregate series; rows with one feed
/// that chain.
pub fn load_observation_csv(path: &Path, protocol: &str) -> Result<IngestedData, TvlError> {
    let file = File::open(path)
        .map_err(|e| TvlError::Ingest(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| TvlError::Ingest(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    if !header_map.contains_key("date") {
        return Err(TvlError::Ingest("Missing required column: `date`".to_string()));
    }
    let value_column = VALUE_COLUMNS
        .iter()
        .copied()
        .find(|c| header_map.contains_key(*c))
        .ok_or_else(|| TvlError::Ingest("Missing required column: `tvl` (or `value`)".to_string()))?;

    let mut aggregate = Vec::new();
    let mut chains: BTreeMap<String, Vec<Observation>> = BTreeMap::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map, value_column) {
            Ok((None, obs)) => aggregate.push(obs),
            Ok((Some(chain), obs)) => chains.entry(chain).or_default().push(obs),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let rows_used = aggregate.len() + chains.values().map(Vec::len).sum::<usize>();
    if rows_used == 0 {
        return Err(TvlError::Ingest(format!(
            "No valid rows in '{}' ({} rows read).",
            path.display(),
            rows_read
        )));
    }
    if aggregate.is_empty() {
        return Err(TvlError::NoProtocolData {
            protocol: protocol.to_string(),
        });
    }

    let data = ProtocolData {
        protocol: protocol.to_string(),
        tvl: Series::anonymous(aggregate),
        chains: chains
            .into_iter()
            .map(|(name, obs)| {
                let series = Series::named(name.clone(), obs);
                (name, series)
            })
            .collect(),
    };

    Ok(IngestedData {
        data,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    value_column: &str,
) -> Result<(Option<String>, Observation), String> {
    let date = parse_date(get_required(record, header_map, "date")?)?;
    let raw_value = get_required(record, header_map, value_column)?;
    let value = raw_value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| format!("Invalid `{value_column}` value '{raw_value}'."))?;
    let chain = get_optional(record, header_map, "chain").map(str::to_string);
    Ok((chain, Observation::new(date, value)))
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

/// `YYYY-MM-DD`, or unix seconds (converted to the UTC day).
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    s.parse::<i64>()
        .ok()
        .and_then(unix_to_utc_date)
        .ok_or_else(|| format!("Invalid date '{s}'. Expected YYYY-MM-DD or unix seconds."))
}
