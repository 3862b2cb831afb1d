//! Render reconstructed datasets as CSV or JSON.
//!
//! CSV values use 2 decimals and empty cells for nulls; JSON keeps full precision
//! and uses `null`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::{ChainDataset, Dataset, OutputFormat, OutputShape, ReconstructedRow};
use crate::error::TvlError;

#[derive(Debug, Serialize)]
struct RawRecord {
    date: NaiveDate,
    tvl_raw: Option<f64>,
    tvl_interpolated: Option<f64>,
}

#[derive(Debug, Serialize)]
struct LegacyRecord {
    date: NaiveDate,
    tvl: Option<f64>,
    is_interpolated: bool,
}

/// Render a dataset in the requested format.
///
/// `shape` only applies to single-series datasets.
pub fn render_dataset(dataset: &Dataset, format: OutputFormat, shape: OutputShape) -> Result<String, TvlError> {
    match (dataset, format) {
        (Dataset::Single(rows), OutputFormat::Csv) => render_single_csv(rows, shape),
        (Dataset::Single(rows), OutputFormat::Json) => render_single_json(rows, shape),
        (Dataset::ByChain(ds), OutputFormat::Csv) => render_chain_csv(ds),
        (Dataset::ByChain(ds), OutputFormat::Json) => render_chain_json(ds),
    }
}

fn render_single_csv(rows: &[ReconstructedRow], shape: OutputShape) -> Result<String, TvlError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    match shape {
        OutputShape::Raw => {
            write_record(&mut writer, ["date", "tvl_raw", "tvl_interpolated"])?;
            for row in rows {
                write_record(
                    &mut writer,
                    [row.date.to_string(), fmt_cell(row.raw), fmt_cell(row.reconstructed)],
                )?;
            }
        }
        OutputShape::Legacy => {
            write_record(&mut writer, ["date", "tvl", "is_interpolated"])?;
            for row in rows {
                write_record(
                    &mut writer,
                    [
                        row.date.to_string(),
                        fmt_cell(row.reconstructed),
                        row.is_interpolated().to_string(),
                    ],
                )?;
            }
        }
    }
    finish(writer)
}

fn render_single_json(rows: &[ReconstructedRow], shape: OutputShape) -> Result<String, TvlError> {
    let out = match shape {
        OutputShape::Raw => {
            let records: Vec<RawRecord> = rows
                .iter()
                .map(|row| RawRecord {
                    date: row.date,
                    tvl_raw: row.raw,
                    tvl_interpolated: row.reconstructed,
                })
                .collect();
            serde_json::to_string_pretty(&records)
        }
        OutputShape::Legacy => {
            let records: Vec<LegacyRecord> = rows
                .iter()
                .map(|row| LegacyRecord {
                    date: row.date,
                    tvl: row.reconstructed,
                    is_interpolated: row.is_interpolated(),
                })
                .collect();
            serde_json::to_string_pretty(&records)
        }
    };
    out.map_err(|e| TvlError::Io(format!("Failed to encode JSON: {e}")))
}

fn chain_header(ds: &ChainDataset) -> Vec<String> {
    let mut header = vec!["date".to_string()];
    for chain in &ds.chains {
        header.push(format!("{chain}_raw"));
        header.push(format!("{chain}_interpolated"));
    }
    header.push("total_raw".to_string());
    header.push("total_interpolated".to_string());
    header
}

fn render_chain_csv(ds: &ChainDataset) -> Result<String, TvlError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    write_record(&mut writer, chain_header(ds))?;
    for row in &ds.rows {
        let mut record = vec![row.date.to_string()];
        for cell in &row.per_chain {
            record.push(fmt_cell(cell.raw));
            record.push(fmt_cell(cell.reconstructed));
        }
        record.push(fmt_cell(row.total_raw));
        record.push(fmt_cell(row.total_reconstructed));
        write_record(&mut writer, record)?;
    }
    finish(writer)
}

fn render_chain_json(ds: &ChainDataset) -> Result<String, TvlError> {
    let records: Vec<Value> = ds
        .rows
        .iter()
        .map(|row| {
            let mut obj = Map::new();
            obj.insert("date".to_string(), Value::String(row.date.to_string()));
            for (chain, cell) in ds.chains.iter().zip(&row.per_chain) {
                obj.insert(format!("{chain}_raw"), json_number(cell.raw));
                obj.insert(format!("{chain}_interpolated"), json_number(cell.reconstructed));
            }
            obj.insert("total_raw".to_string(), json_number(row.total_raw));
            obj.insert("total_interpolated".to_string(), json_number(row.total_reconstructed));
            Value::Object(obj)
        })
        .collect();
    serde_json::to_string_pretty(&records).map_err(|e| TvlError::Io(format!("Failed to encode JSON: {e}")))
}

fn json_number(v: Option<f64>) -> Value {
    v.and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn fmt_cell(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.2}")).unwrap_or_default()
}

fn write_record<I, T>(writer: &mut csv::Writer<Vec<u8>>, record: I) -> Result<(), TvlError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    writer
        .write_record(record)
        .map_err(|e| TvlError::Io(format!("Failed to write CSV row: {e}")))
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, TvlError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| TvlError::Io(format!("Failed to flush CSV: {e}")))?;
    String::from_utf8(bytes).map_err(|e| TvlError::Io(format!("CSV output is not UTF-8: {e}")))
}

/// Write rendered output to `path`, or stdout when `None`.
pub fn write_output(path: Option<&Path>, text: &str) -> Result<(), TvlError> {
    match path {
        Some(path) => {
            let mut file = File::create(path).map_err(|e| {
                TvlError::Io(format!("Failed to create output '{}': {e}", path.display()))
            })?;
            file.write_all(text.as_bytes())
                .and_then(|_| if text.ends_with('\n') { Ok(()) } else { file.write_all(b"\n") })
                .map_err(|e| TvlError::Io(format!("Failed to write output '{}': {e}", path.display())))?;
            tracing::info!(path = %path.display(), bytes = text.len(), "wrote dataset");
            Ok(())
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(text.as_bytes())
                .and_then(|_| if text.ends_with('\n') { Ok(()) } else { lock.write_all(b"\n") })
                .map_err(|e| TvlError::Io(format!("Failed to write to stdout: {e}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChainRow, Fill};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn sample_rows() -> Vec<ReconstructedRow> {
        vec![
            ReconstructedRow::missing(day(1)),
            ReconstructedRow::observed(day(2), 1_000_000.0),
            ReconstructedRow::filled(day(3), 1_050_000.5, Fill::Interpolated),
        ]
    }

    #[test]
    fn raw_csv_renders_nulls_as_empty() {
        let out = render_dataset(&Dataset::Single(sample_rows()), OutputFormat::Csv, OutputShape::Raw).unwrap();
        assert_eq!(
            out,
            "date,tvl_raw,tvl_interpolated\n\
             2025-01-01,,\n\
             2025-01-02,1000000.00,1000000.00\n\
             2025-01-03,,1050000.50\n"
        );
    }

    #[test]
    fn legacy_csv_keeps_one_row_per_day() {
        let out = render_dataset(&Dataset::Single(sample_rows()), OutputFormat::Csv, OutputShape::Legacy).unwrap();
        assert_eq!(
            out,
            "date,tvl,is_interpolated\n\
             2025-01-01,,true\n\
             2025-01-02,1000000.00,false\n\
             2025-01-03,1050000.50,true\n"
        );
    }

    #[test]
    fn raw_json_keeps_nulls() {
        let out = render_dataset(&Dataset::Single(sample_rows()), OutputFormat::Json, OutputShape::Raw).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0]["date"], "2025-01-01");
        assert!(parsed[0]["tvl_raw"].is_null());
        assert!(parsed[0]["tvl_interpolated"].is_null());
        assert_eq!(parsed[2]["tvl_interpolated"], 1_050_000.5);
    }

    #[test]
    fn legacy_json_has_interpolation_flag() {
        let out = render_dataset(&Dataset::Single(sample_rows()), OutputFormat::Json, OutputShape::Legacy).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.len(), 3);
        assert!(parsed[0]["tvl"].is_null());
        assert_eq!(parsed[0]["is_interpolated"], true);
        assert_eq!(parsed[1]["is_interpolated"], false);
        assert_eq!(parsed[2]["is_interpolated"], true);
        assert_eq!(parsed[2]["tvl"], 1_050_000.5);
    }

    #[test]
    fn legacy_shape_covers_every_day_of_sparse_reconstruction() {
        let series = crate::domain::Series::anonymous([crate::domain::Observation::new(day(2), 100.0)]);
        let rows = crate::recon::reconstruct(&series, day(1), day(3), false).unwrap();
        let out = render_dataset(&Dataset::Single(rows), OutputFormat::Csv, OutputShape::Legacy).unwrap();
        let data_rows: Vec<&str> = out.lines().skip(1).collect();
        assert_eq!(data_rows, vec!["2025-01-01,,true", "2025-01-02,100.00,false", "2025-01-03,,true"]);
    }

    fn sample_chains() -> ChainDataset {
        ChainDataset {
            chains: vec!["Arbitrum".to_string(), "Ethereum".to_string()],
            rows: vec![ChainRow {
                date: day(1),
                per_chain: vec![
                    ReconstructedRow::missing(day(1)),
                    ReconstructedRow::observed(day(1), 10.0),
                ],
                total_raw: Some(10.0),
                total_reconstructed: Some(10.0),
            }],
        }
    }

    #[test]
    fn chain_csv_has_column_pair_per_chain() {
        let out = render_dataset(&Dataset::ByChain(sample_chains()), OutputFormat::Csv, OutputShape::Raw).unwrap();
        assert_eq!(
            out,
            "date,Arbitrum_raw,Arbitrum_interpolated,Ethereum_raw,Ethereum_interpolated,total_raw,total_interpolated\n\
             2025-01-01,,,10.00,10.00,10.00,10.00\n"
        );
    }

    #[test]
    fn chain_json_is_flat_objects() {
        let out = render_dataset(&Dataset::ByChain(sample_chains()), OutputFormat::Json, OutputShape::Raw).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&out).unwrap();
        assert!(parsed[0]["Arbitrum_raw"].is_null());
        assert_eq!(parsed[0]["Ethereum_interpolated"], 10.0);
        assert_eq!(parsed[0]["total_interpolated"], 10.0);
    }

    #[test]
    fn write_output_to_file_appends_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_output(Some(&path), "[]").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]\n");
    }
}
