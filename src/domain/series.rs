//! Observations and the per-series date index.
//!
//! A `Series` is conceptually a `date -> value` map. Internally the dates are kept
//! sorted and unique in a `Vec` so bracket lookups are a binary search.

use std::collections::BTreeMap;

use chrono::NaiveDate;

/// One observed value for one UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Sparse, read-only time series.
///
/// Built once per invocation; later observations for the same day replace
/// earlier ones. Non-finite and negative values are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    name: Option<String>,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl Series {
    /// Build an unnamed series (the aggregate protocol TVL).
    pub fn anonymous(observations: impl IntoIterator<Item = Observation>) -> Self {
        Self::build(None, observations)
    }

    /// Build a named series (one chain of a by-chain breakdown).
    pub fn named(name: impl Into<String>, observations: impl IntoIterator<Item = Observation>) -> Self {
        Self::build(Some(name.into()), observations)
    }

    fn build(name: Option<String>, observations: impl IntoIterator<Item = Observation>) -> Self {
        let mut map = BTreeMap::new();
        let mut dropped = 0usize;
        for obs in observations {
            if !(obs.value.is_finite() && obs.value >= 0.0) {
                dropped += 1;
                continue;
            }
            map.insert(obs.date, obs.value);
        }
        if dropped > 0 {
            tracing::warn!(
                series = name.as_deref().unwrap_or("tvl"),
                dropped,
                "dropped non-finite or negative observations"
            );
        }

        let (dates, values) = map.into_iter().unzip();
        Self { name, dates, values }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Value observed on exactly `date`, if any.
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|idx| self.values[idx])
    }

    /// The observation at sorted position `idx`.
    pub fn point(&self, idx: usize) -> Option<Observation> {
        Some(Observation::new(*self.dates.get(idx)?, *self.values.get(idx)?))
    }

    /// Positions of the latest observation `<= date` and the earliest `> date`.
    pub fn bracket(&self, date: NaiveDate) -> (Option<usize>, Option<usize>) {
        let split = self.dates.partition_point(|d| *d <= date);
        let prev = split.checked_sub(1);
        let next = (split < self.dates.len()).then_some(split);
        (prev, next)
    }

    /// True when the observed span `[first, last]` intersects `[start, end]`.
    pub fn covers(&self, start: NaiveDate, end: NaiveDate) -> bool {
        match (self.first_date(), self.last_date()) {
            (Some(first), Some(last)) => first <= end && last >= start,
            _ => false,
        }
    }

    #[cfg(test)]
    pub fn observations(&self) -> impl Iterator<Item = Observation> + '_ {
        self.dates
            .iter()
            .zip(self.values.iter())
            .map(|(&date, &value)| Observation::new(date, value))
    }
}

impl FromIterator<Observation> for Series {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        Series::anonymous(iter)
    }
}
