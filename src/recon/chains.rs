//! By-chain reconstruction.
//!
//! Each included chain is reconstructed independently over the full range, then
//! per-day totals are summed over whichever chains have a value that day.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{ChainDataset, ChainRow, ReconstructedRow, Series};
use crate::error::TvlError;
use crate::recon::reconstruct::{estimate, validate_range};

/// Breakdown tags that double-count TVL and are never treated as chains.
pub const DEFAULT_EXCLUDED_TAGS: [&str; 3] = ["borrowed", "staking", "pool2"];

/// Decides which chain names are real chains.
///
/// A name is excluded when, ignoring case, it equals a tag or contains `-<tag>`
/// (e.g. `Ethereum-borrowed`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainFilter {
    tags: Vec<String>,
}

impl Default for ChainFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_TAGS)
    }
}

impl ChainFilter {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self { tags: Vec::new() };
        filter.extend(tags);
        filter
    }

    /// Add tags on top of the current set.
    pub fn with_extra<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extend(tags);
        self
    }

    fn extend<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            let tag = tag.as_ref().trim().trim_start_matches('-').to_lowercase();
            if !tag.is_empty() && !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn is_excluded(&self, chain: &str) -> bool {
        let name = chain.to_lowercase();
        self.tags
            .iter()
            .any(|tag| name == *tag || name.contains(&format!("-{tag}")))
    }
}

/// Reconstruct every included chain over `[start, end]` and sum daily totals.
///
/// A chain with no data near the range is still reported (filled per policy) as
/// long as at least one chain covers the range.
pub fn reconstruct_by_chain(
    chains: &BTreeMap<String, Series>,
    filter: &ChainFilter,
    start: NaiveDate,
    end: NaiveDate,
    extrapolate: bool,
) -> Result<ChainDataset, TvlError> {
    validate_range(start, end)?;

    let mut included: Vec<(&str, &Series)> = Vec::new();
    for (name, series) in chains {
        if filter.is_excluded(name) {
            tracing::debug!(chain = %name, "excluding non-plain chain");
            continue;
        }
        included.push((name.as_str(), series));
    }
    if included.is_empty() {
        return Err(TvlError::NoValidChains);
    }
    included.sort_by(|(a, _), (b, _)| a.to_lowercase().cmp(&b.to_lowercase()).then(a.cmp(b)));

    if !included.iter().any(|(_, series)| series.covers(start, end)) {
        return Err(TvlError::NoDataInRange { start, end });
    }
    for (name, series) in &included {
        if !series.covers(start, end) {
            tracing::info!(chain = %name, "chain has no observations near the range");
        }
    }

    let rows = start
        .iter_days()
        .take_while(|date| *date <= end)
        .map(|date| {
            let per_chain: Vec<ReconstructedRow> = included
                .iter()
                .map(|(_, series)| estimate(series, date, extrapolate))
                .collect();
            ChainRow {
                date,
                total_raw: sum_present(per_chain.iter().map(|row| row.raw)),
                total_reconstructed: sum_present(per_chain.iter().map(|row| row.reconstructed)),
                per_chain,
            }
        })
        .collect();

    Ok(ChainDataset {
        chains: included.iter().map(|(name, _)| name.to_string()).collect(),
        rows,
    })
}

/// Sum of the present values; `None` when nothing is present.
pub fn sum_present(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    values
        .into_iter()
        .flatten()
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}
