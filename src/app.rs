//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - runs the pipeline (fetch or read, then reconstruct)
//! - prints or writes the rendered result

use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;

use crate::cli::Cli;
use crate::data::ClientConfig;
use crate::domain::{RunConfig, RunMode};
use crate::error::{AppError, TvlError};

pub mod logging;
pub mod pipeline;

use pipeline::RunOutput;

/// Entry point for the `tvl` binary.
pub fn run() -> Result<(), AppError> {
    // Environment defaults must be in place before clap reads `env = ...` args.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::setup_logging(&cli.log_level, cli.log_json);

    let config = run_config_from_args(&cli)?;
    let client_config = client_config_from_args(&cli);
    let output = pipeline::run(&config, &client_config)?;
    let text = render_output(&output, &config)?;
    crate::io::write_output(config.output.as_deref(), &text)?;
    Ok(())
}

pub fn run_config_from_args(args: &Cli) -> Result<RunConfig, TvlError> {
    let start = parse_date(&args.start_date)?;
    let end = parse_date(&args.end_date)?;
    crate::recon::validate_range(start, end)?;

    let mode = if args.mean {
        RunMode::Mean
    } else if args.plot {
        RunMode::Plot
    } else {
        RunMode::Dataset
    };

    Ok(RunConfig {
        protocol: args.protocol.trim().to_string(),
        start,
        end,
        mode,
        format: args.format,
        shape: args.shape,
        extrapolate: args.extrapolate && !args.no_extrapolate,
        by_chain: !args.no_by_chain,
        exclude_tags: args.exclude_tags.clone(),
        input: args.input.clone(),
        output: args.output.clone(),
        plot_width: args.width,
        plot_height: args.height,
    })
}

pub fn client_config_from_args(args: &Cli) -> ClientConfig {
    ClientConfig {
        base_url: args.api_base.trim_end_matches('/').to_string(),
        timeout: Duration::from_secs(args.timeout_secs),
        retries: args.retries,
        backoff: Duration::from_millis(args.backoff_ms),
    }
}

/// Render the computed output as the text printed (or written) by the binary.
pub fn render_output(output: &RunOutput, config: &RunConfig) -> Result<String, TvlError> {
    match output {
        RunOutput::Dataset(dataset) => crate::io::render_dataset(dataset, config.format, config.shape),
        RunOutput::Mean(mean) => Ok(crate::report::format_mean_line(
            "TVL",
            &config.protocol,
            config.start,
            config.end,
            *mean,
        )),
        RunOutput::Plot(rows) => Ok(crate::plot::render_series_plot(
            rows,
            config.plot_width,
            config.plot_height,
        )),
    }
}

/// Strict `YYYY-MM-DD`.
fn parse_date(raw: &str) -> Result<NaiveDate, TvlError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| TvlError::InvalidDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OutputFormat, OutputShape};

    fn cli(extra: &[&str]) -> Cli {
        let mut argv = vec!["tvl", "aave", "2025-01-01", "2025-01-31"];
        argv.extend_from_slice(extra);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn config_from_defaults() {
        let config = run_config_from_args(&cli(&[])).unwrap();
        assert_eq!(config.protocol, "aave");
        assert_eq!(config.start, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(config.end, NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());
        assert_eq!(config.mode, RunMode::Dataset);
        assert_eq!(config.format, OutputFormat::Csv);
        assert_eq!(config.shape, OutputShape::Raw);
        assert!(!config.extrapolate);
        assert!(config.by_chain);
    }

    #[test]
    fn config_modes_and_flags() {
        let config = run_config_from_args(&cli(&["--mean", "--extrapolate", "--no-by-chain"])).unwrap();
        assert_eq!(config.mode, RunMode::Mean);
        assert!(config.extrapolate);
        assert!(!config.by_chain);

        let config = run_config_from_args(&cli(&["--plot", "--extrapolate", "--no-extrapolate"])).unwrap();
        assert_eq!(config.mode, RunMode::Plot);
        assert!(!config.extrapolate);
    }

    #[test]
    fn bad_dates_are_run_errors() {
        let args = Cli::try_parse_from(["tvl", "aave", "2025-13-01", "2025-01-31"]).unwrap();
        let err = run_config_from_args(&args).unwrap_err();
        assert_eq!(err, TvlError::InvalidDate("2025-13-01".to_string()));
        assert_eq!(AppError::from(err).exit_code(), 1);

        let args = Cli::try_parse_from(["tvl", "aave", "2025-02-01", "2025-01-31"]).unwrap();
        assert!(matches!(
            run_config_from_args(&args).unwrap_err(),
            TvlError::InvalidRange { .. }
        ));
    }

    #[test]
    fn client_config_strips_trailing_slash() {
        let args = cli(&["--api-base", "http://localhost:8080/", "--retries", "0", "--backoff-ms", "10"]);
        let config = client_config_from_args(&args);
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.retries, 0);
        assert_eq!(config.backoff, Duration::from_millis(10));
    }

    #[test]
    fn mean_output_line() {
        let config = run_config_from_args(&cli(&["--mean"])).unwrap();
        let text = render_output(&RunOutput::Mean(1_100_000.0), &config).unwrap();
        assert_eq!(text, "Average TVL for aave from 2025-01-01 to 2025-01-31: $1,100,000.00");
    }
}
