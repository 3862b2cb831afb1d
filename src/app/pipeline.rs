//! Shared run pipeline: load the protocol document, then reconstruct what the
//! selected mode needs.
//!
//! Loading and reconstruction are split so tests (and callers holding a saved
//! document) can skip the network entirely.

use crate::data::{ClientConfig, LlamaClient};
use crate::domain::{Dataset, OutputShape, ProtocolData, ReconstructedRow, RunConfig, RunMode};
use crate::error::TvlError;
use crate::io::load_protocol_file;
use crate::recon::{ChainFilter, Coverage, average, reconstruct, reconstruct_by_chain};

/// Computed result of one run, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutput {
    Dataset(Dataset),
    Mean(f64),
    Plot(Vec<ReconstructedRow>),
}

/// Fetch (or read) the protocol document and run the configured mode.
pub fn run(config: &RunConfig, client_config: &ClientConfig) -> Result<RunOutput, TvlError> {
    let data = load_protocol(config, client_config)?;
    run_with_data(config, &data)
}

/// Local `--input` file when given, otherwise the DefiLlama API.
pub fn load_protocol(config: &RunConfig, client_config: &ClientConfig) -> Result<ProtocolData, TvlError> {
    match &config.input {
        Some(path) => {
            tracing::info!(path = %path.display(), "reading protocol data from file");
            load_protocol_file(path, &config.protocol)
        }
        None => {
            tracing::info!(protocol = %config.protocol, base = %client_config.base_url, "fetching protocol");
            LlamaClient::new(client_config.clone())?.fetch_protocol(&config.protocol)
        }
    }
}

/// Run the configured mode against an already loaded document.
pub fn run_with_data(config: &RunConfig, data: &ProtocolData) -> Result<RunOutput, TvlError> {
    match config.mode {
        RunMode::Mean => {
            average(&data.tvl, config.start, config.end, config.extrapolate).map(RunOutput::Mean)
        }
        RunMode::Plot => {
            let rows = reconstruct(&data.tvl, config.start, config.end, config.extrapolate)?;
            log_coverage(&rows);
            Ok(RunOutput::Plot(rows))
        }
        RunMode::Dataset => build_dataset(data, config).map(RunOutput::Dataset),
    }
}

/// Per-chain dataset when requested and available, else the aggregate series.
///
/// The legacy shape has no per-chain layout, so it always uses the aggregate.
pub fn build_dataset(data: &ProtocolData, config: &RunConfig) -> Result<Dataset, TvlError> {
    let by_chain = config.by_chain && config.shape == OutputShape::Raw && !data.chains.is_empty();
    if by_chain {
        let filter = ChainFilter::default().with_extra(&config.exclude_tags);
        let dataset = reconstruct_by_chain(&data.chains, &filter, config.start, config.end, config.extrapolate)?;
        tracing::info!(
            chains = dataset.chains.len(),
            days = dataset.rows.len(),
            "reconstructed by chain"
        );
        return Ok(Dataset::ByChain(dataset));
    }

    if config.by_chain && config.shape == OutputShape::Raw {
        tracing::debug!(protocol = %data.protocol, "no per-chain breakdown, using aggregate series");
    }
    let rows = reconstruct(&data.tvl, config.start, config.end, config.extrapolate)?;
    log_coverage(&rows);
    Ok(Dataset::Single(rows))
}

fn log_coverage(rows: &[ReconstructedRow]) {
    tracing::info!("{}", crate::report::format_coverage(&Coverage::of(rows)));
}
