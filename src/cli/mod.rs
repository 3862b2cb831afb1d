//! Command-line parsing for the TVL reconstruction tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fetch and reconstruction code. Dates stay strings here and are validated when
//! the run configuration is built, so bad dates surface as ordinary run errors.

use std::path::PathBuf;

use clap::Parser;

use crate::data::DEFAULT_BASE_URL;
use crate::domain::{OutputFormat, OutputShape};

/// Top-level CLI.
#[derive(Debug, Parser, Clone)]
#[command(name = "tvl", version, about = "Daily TVL datasets for DeFi protocols (DefiLlama-based)")]
pub struct Cli {
    /// Protocol slug as listed on DefiLlama (e.g. `aave`).
    pub protocol: String,

    /// Start date, inclusive (YYYY-MM-DD, UTC).
    pub start_date: String,

    /// End date, inclusive (YYYY-MM-DD, UTC).
    pub end_date: String,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Column layout for single-series output.
    #[arg(long, value_enum, default_value_t = OutputShape::Raw)]
    pub shape: OutputShape,

    /// Print only the average TVL over the range.
    #[arg(long, conflicts_with = "plot")]
    pub mean: bool,

    /// Print an ASCII chart of the aggregate series instead of the dataset.
    #[arg(long)]
    pub plot: bool,

    /// Project values past the first/last observation (off by default).
    #[arg(long, overrides_with = "no_extrapolate")]
    pub extrapolate: bool,

    /// Leave days outside the observed span empty.
    #[arg(long, overrides_with = "extrapolate")]
    pub no_extrapolate: bool,

    /// Use the aggregate series even when a per-chain breakdown is available.
    #[arg(long)]
    pub no_by_chain: bool,

    /// Extra chain tag to exclude (on top of borrowed, staking, pool2). Repeatable.
    #[arg(long = "exclude-tag", value_name = "TAG")]
    pub exclude_tags: Vec<String>,

    /// Read a saved protocol document (.json) or observation CSV (.csv) instead of the API.
    #[arg(long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Write output to a file instead of stdout.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// DefiLlama API base URL.
    #[arg(long, env = "TVL_API_BASE", default_value = DEFAULT_BASE_URL)]
    pub api_base: String,

    /// HTTP timeout per request (seconds).
    #[arg(long, env = "TVL_HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Retries on transport errors, 429 and 5xx.
    #[arg(long, env = "TVL_HTTP_RETRIES", default_value_t = 3)]
    pub retries: u32,

    /// First retry delay (milliseconds); doubles per retry.
    #[arg(long, env = "TVL_HTTP_BACKOFF_MS", default_value_t = 500)]
    pub backoff_ms: u64,

    /// Log level or filter directives (logs go to stderr).
    #[arg(long, env = "TVL_LOG", default_value = "warn")]
    pub log_level: String,

    /// Emit logs as JSON.
    #[arg(long)]
    pub log_json: bool,
}
