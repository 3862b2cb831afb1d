//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - produced by the reconstructor one day at a time
//! - rendered to CSV/JSON without extra copies
//! - asserted on directly in tests

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::Series;

/// How a reconstructed value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// An observation exists for exactly this day.
    Observed,
    /// Linear blend between the bracketing observations.
    Interpolated,
    /// Projected past the first/last observation (or held flat).
    Extrapolated,
    /// No value under the current policy.
    Missing,
}

/// One calendar day of one series.
///
/// `raw.is_some()` implies `reconstructed == raw`; `reconstructed.is_none()`
/// implies `raw.is_none()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconstructedRow {
    pub date: NaiveDate,
    pub raw: Option<f64>,
    pub reconstructed: Option<f64>,
    pub fill: Fill,
}

impl ReconstructedRow {
    pub fn observed(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            raw: Some(value),
            reconstructed: Some(value),
            fill: Fill::Observed,
        }
    }

    pub fn filled(date: NaiveDate, value: f64, fill: Fill) -> Self {
        Self {
            date,
            raw: None,
            reconstructed: Some(value),
            fill,
        }
    }

    pub fn missing(date: NaiveDate) -> Self {
        Self {
            date,
            raw: None,
            reconstructed: None,
            fill: Fill::Missing,
        }
    }

    /// Legacy flag: anything not observed on this exact day.
    pub fn is_interpolated(&self) -> bool {
        self.raw.is_none()
    }
}

/// One calendar day across every included chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainRow {
    pub date: NaiveDate,
    /// Aligned with `ChainDataset::chains`.
    pub per_chain: Vec<ReconstructedRow>,
    pub total_raw: Option<f64>,
    pub total_reconstructed: Option<f64>,
}

/// By-chain reconstruction output.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainDataset {
    /// Included chain names, sorted alphabetically.
    pub chains: Vec<String>,
    pub rows: Vec<ChainRow>,
}

/// Reconstruction output handed to rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    Single(Vec<ReconstructedRow>),
    ByChain(ChainDataset),
}

/// Parsed protocol document from the data source (HTTP or local file).
#[derive(Debug, Clone, Default)]
pub struct ProtocolData {
    pub protocol: String,
    /// Aggregate TVL across chains.
    pub tvl: Series,
    /// Per-chain breakdown keyed by the source's chain name (unfiltered).
    pub chains: BTreeMap<String, Series>,
}

/// Output encoding for datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Json,
}

/// Column layout for single-series datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputShape {
    /// `date,tvl_raw,tvl_interpolated` with nulls for unfilled days.
    Raw,
    /// `date,tvl,is_interpolated`; unfilled days keep an empty `tvl`.
    Legacy,
}

/// What the run prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Full per-day dataset.
    Dataset,
    /// A single average line.
    Mean,
    /// ASCII chart of the aggregate series.
    Plot,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub protocol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub mode: RunMode,
    pub format: OutputFormat,
    pub shape: OutputShape,
    pub extrapolate: bool,
    pub by_chain: bool,
    /// Extra excluded chain tags on top of the defaults.
    pub exclude_tags: Vec<String>,
    /// Read a saved document/CSV instead of calling the API.
    pub input: Option<PathBuf>,
    /// Write the rendered dataset here instead of stdout.
    pub output: Option<PathBuf>,
    pub plot_width: usize,
    pub plot_height: usize,
}
