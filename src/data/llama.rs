//! DefiLlama protocol API integration.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::domain::{Observation, ProtocolData, Series};
use crate::error::TvlError;

pub const DEFAULT_BASE_URL: &str = "https://api.llama.fi";

/// HTTP settings for the protocol client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Extra attempts after the first one.
    pub retries: u32,
    /// First retry delay; doubles on each further retry.
    pub backoff: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            retries: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

pub struct LlamaClient {
    client: Client,
    config: ClientConfig,
}

impl LlamaClient {
    pub fn new(config: ClientConfig) -> Result<Self, TvlError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TvlError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Fetch and parse `GET {base}/protocol/{protocol}`.
    pub fn fetch_protocol(&self, protocol: &str) -> Result<ProtocolData, TvlError> {
        let body = self.fetch_body(protocol)?;
        parse_protocol_document(protocol, &body)
    }

    fn fetch_body(&self, protocol: &str) -> Result<String, TvlError> {
        let url = format!(
            "{}/protocol/{}",
            self.config.base_url.trim_end_matches('/'),
            protocol
        );

        let mut attempt = 0u32;
        loop {
            tracing::debug!(%url, attempt, "fetching protocol document");
            let err = match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return resp
                            .text()
                            .map_err(|e| TvlError::Transport(format!("failed to read response body: {e}")));
                    }
                    let err = TvlError::Fetch {
                        status: status.as_u16(),
                    };
                    if !is_retryable(status) {
                        return Err(err);
                    }
                    err
                }
                Err(e) => TvlError::Transport(e.to_string()),
            };

            if attempt >= self.config.retries {
                return Err(err);
            }
            attempt += 1;
            let delay = self.config.backoff.saturating_mul(1 << (attempt - 1).min(16));
            tracing::warn!(protocol, attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying TVL fetch");
            std::thread::sleep(delay);
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProtocolDocument {
    #[serde(default)]
    tvl: Vec<TvlPoint>,
    #[serde(default)]
    chain_tvls: Option<BTreeMap<String, ChainDocument>>,
}

#[derive(Debug, Deserialize)]
struct ChainDocument {
    #[serde(default)]
    tvl: Vec<TvlPoint>,
}

#[derive(Debug, Deserialize)]
struct TvlPoint {
    #[serde(alias = "timestamp")]
    date: f64,
    #[serde(rename = "totalLiquidityUSD", alias = "value")]
    total_liquidity_usd: Option<f64>,
}

/// Parse a protocol document (HTTP body or saved file).
///
/// The aggregate `tvl` list must be non-empty; `chainTvls` is optional and kept
/// unfiltered here.
pub fn parse_protocol_document(protocol: &str, body: &str) -> Result<ProtocolData, TvlError> {
    let doc: ProtocolDocument =
        serde_json::from_str(body).map_err(|e| TvlError::Parse(e.to_string()))?;

    if doc.tvl.is_empty() {
        return Err(TvlError::NoProtocolData {
            protocol: protocol.to_string(),
        });
    }

    let tvl = Series::anonymous(to_observations(&doc.tvl));
    let chains: BTreeMap<String, Series> = doc
        .chain_tvls
        .unwrap_or_default()
        .into_iter()
        .map(|(name, chain)| {
            let series = Series::named(name.clone(), to_observations(&chain.tvl));
            (name, series)
        })
        .collect();

    tracing::info!(
        protocol,
        observations = tvl.len(),
        first = ?tvl.first_date(),
        last = ?tvl.last_date(),
        chains = chains.len(),
        "parsed protocol document"
    );

    Ok(ProtocolData {
        protocol: protocol.to_string(),
        tvl,
        chains,
    })
}

fn to_observations(points: &[TvlPoint]) -> Vec<Observation> {
    points
        .iter()
        .filter_map(|p| {
            let value = p.total_liquidity_usd?;
            let date = unix_to_utc_date(p.date as i64)?;
            Some(Observation::new(date, value))
        })
        .collect()
}

/// Convert unix seconds to the UTC calendar day.
pub fn unix_to_utc_date(secs: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "name": "Test",
        "tvl": [
            {"date": 1735689600, "totalLiquidityUSD": 1000000.0},
            {"date": 1735862400, "totalLiquidityUSD": 1200000.0}
        ],
        "chainTvls": {
            "Ethereum": {"tvl": [{"date": 1735689600, "totalLiquidityUSD": 600000.0}], "tokens": null},
            "Ethereum-borrowed": {"tvl": [{"date": 1735689600, "totalLiquidityUSD": 5.0}]},
            "Arbitrum": {"tvl": [{"date": 1735689600, "totalLiquidityUSD": 400000.0}]}
        }
    }"#;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn test_config(base_url: String, retries: u32) -> ClientConfig {
        ClientConfig {
            base_url,
            timeout: Duration::from_secs(5),
            retries,
            backoff: Duration::ZERO,
        }
    }

    #[test]
    fn unix_seconds_map_to_utc_day() {
        assert_eq!(unix_to_utc_date(1_735_689_600), Some(day(1)));
        // 23:59:59 UTC is still the same day.
        assert_eq!(unix_to_utc_date(1_735_775_999), Some(day(1)));
    }

    #[test]
    fn parses_aggregate_and_chains() {
        let data = parse_protocol_document("test", DOC).unwrap();
        assert_eq!(data.tvl.len(), 2);
        assert_eq!(data.tvl.get(day(3)), Some(1_200_000.0));
        assert_eq!(data.chains.len(), 3);
        assert_eq!(data.chains["Arbitrum"].get(day(1)), Some(400_000.0));
        assert_eq!(data.chains["Ethereum"].name(), Some("Ethereum"));
    }

    #[test]
    fn accepts_timestamp_alias_and_skips_null_values() {
        let body = r#"{"tvl": [
            {"timestamp": 1735689600, "value": 10.0},
            {"date": 1735776000, "totalLiquidityUSD": null}
        ]}"#;
        let data = parse_protocol_document("p", body).unwrap();
        assert_eq!(data.tvl.len(), 1);
        assert_eq!(data.tvl.get(day(1)), Some(10.0));
        assert!(data.chains.is_empty());
    }

    #[test]
    fn empty_tvl_is_no_protocol_data() {
        let err = parse_protocol_document("ghost", r#"{"tvl": []}"#).unwrap_err();
        assert_eq!(err.to_string(), "No TVL data found for protocol ghost");
        let err = parse_protocol_document("ghost", "{}").unwrap_err();
        assert!(matches!(err, TvlError::NoProtocolData { .. }));
    }

    #[test]
    fn null_chain_breakdown_is_no_breakdown() {
        let body = r#"{"tvl": [{"date": 1735689600, "totalLiquidityUSD": 10.0}], "chainTvls": null}"#;
        let data = parse_protocol_document("p", body).unwrap();
        assert_eq!(data.tvl.get(day(1)), Some(10.0));
        assert!(data.chains.is_empty());
    }

    #[test]
    fn malformed_body_is_parse_error() {
        let err = parse_protocol_document("p", "not json").unwrap_err();
        assert!(matches!(err, TvlError::Parse(_)));
    }

    #[test]
    fn fetches_protocol_document() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/protocol/test-protocol")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(DOC)
            .create();

        let client = LlamaClient::new(test_config(server.url(), 0)).unwrap();
        let data = client.fetch_protocol("test-protocol").unwrap();
        mock.assert();
        assert_eq!(data.protocol, "test-protocol");
        assert_eq!(data.tvl.len(), 2);
    }

    #[test]
    fn client_error_is_not_retried() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/protocol/missing")
            .with_status(404)
            .expect(1)
            .create();

        let client = LlamaClient::new(test_config(server.url(), 3)).unwrap();
        let err = client.fetch_protocol("missing").unwrap_err();
        mock.assert();
        assert_eq!(err, TvlError::Fetch { status: 404 });
        assert_eq!(err.to_string(), "Error fetching data: 404");
    }

    #[test]
    fn server_errors_are_retried_then_surface() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/protocol/flaky")
            .with_status(503)
            .expect(3)
            .create();

        let client = LlamaClient::new(test_config(server.url(), 2)).unwrap();
        let err = client.fetch_protocol("flaky").unwrap_err();
        mock.assert();
        assert_eq!(err, TvlError::Fetch { status: 503 });
    }

    #[test]
    fn rate_limit_is_retried_then_surfaces() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/protocol/busy")
            .with_status(429)
            .expect(2)
            .create();

        let client = LlamaClient::new(test_config(server.url(), 1)).unwrap();
        let err = client.fetch_protocol("busy").unwrap_err();
        mock.assert();
        assert_eq!(err, TvlError::Fetch { status: 429 });
    }

    #[test]
    fn unreachable_host_is_retried_then_transport_error() {
        // Nothing listens on the discard port locally.
        let client = LlamaClient::new(test_config("http://127.0.0.1:9".to_string(), 2)).unwrap();
        let err = client.fetch_protocol("any").unwrap_err();
        assert!(matches!(err, TvlError::Transport(_)), "unexpected error: {err:?}");
        assert!(err.to_string().starts_with("Error fetching data: "));
    }
}
