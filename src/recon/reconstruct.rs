//! Single-series reconstruction.
//!
//! For each day in `[start, end]`:
//!
//! 1. an observation on that exact day is used as-is
//! 2. otherwise the nearest observations on either side (searched across the whole
//!    series, not only inside the range) are blended linearly
//! 3. past the first/last observation the value is projected along the slope of the
//!    two outermost points when extrapolation is enabled, and left empty otherwise

use chrono::NaiveDate;

use crate::domain::{Fill, Observation, ReconstructedRow, Series};
use crate::error::TvlError;

/// Lazy per-day row producer over `[start, end]`.
///
/// Performs no validation; an empty or reversed range yields nothing.
#[derive(Debug, Clone)]
pub struct Reconstruction<'a> {
    series: &'a Series,
    next_day: Option<NaiveDate>,
    end: NaiveDate,
    extrapolate: bool,
}

impl<'a> Reconstruction<'a> {
    pub fn new(series: &'a Series, start: NaiveDate, end: NaiveDate, extrapolate: bool) -> Self {
        Self {
            series,
            next_day: (start <= end).then_some(start),
            end,
            extrapolate,
        }
    }
}

impl Iterator for Reconstruction<'_> {
    type Item = ReconstructedRow;

    fn next(&mut self) -> Option<Self::Item> {
        let day = self.next_day?;
        let end = self.end;
        self.next_day = day.succ_opt().filter(|d| *d <= end);
        Some(estimate(self.series, day, self.extrapolate))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .next_day
            .map(|day| (self.end - day).num_days() as usize + 1)
            .unwrap_or(0);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Reconstruction<'_> {}

/// Reconstruct one row per day of `[start, end]`.
///
/// Fails when the range is reversed or when the series' observed span does not
/// touch the range at all.
pub fn reconstruct(
    series: &Series,
    start: NaiveDate,
    end: NaiveDate,
    extrapolate: bool,
) -> Result<Vec<ReconstructedRow>, TvlError> {
    validate_range(start, end)?;
    if !series.covers(start, end) {
        return Err(TvlError::NoDataInRange { start, end });
    }

    let rows: Vec<ReconstructedRow> = Reconstruction::new(series, start, end, extrapolate).collect();
    let coverage = Coverage::of(&rows);
    tracing::debug!(
        series = series.name().unwrap_or("tvl"),
        days = rows.len(),
        observed = coverage.observed,
        interpolated = coverage.interpolated,
        extrapolated = coverage.extrapolated,
        missing = coverage.missing,
        "reconstructed series"
    );
    Ok(rows)
}

pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), TvlError> {
    if start > end {
        return Err(TvlError::InvalidRange { start, end });
    }
    Ok(())
}

/// Best-effort value for a single day.
pub fn estimate(series: &Series, date: NaiveDate, extrapolate: bool) -> ReconstructedRow {
    if let Some(value) = series.get(date) {
        return ReconstructedRow::observed(date, value);
    }
    match fill_gap(series, date, extrapolate) {
        Some((value, fill)) => ReconstructedRow::filled(date, value, fill),
        None => ReconstructedRow::missing(date),
    }
}

fn fill_gap(series: &Series, date: NaiveDate, extrapolate: bool) -> Option<(f64, Fill)> {
    match series.bracket(date) {
        (Some(prev), Some(next)) => {
            let prev = series.point(prev)?;
            let next = series.point(next)?;
            Some((interpolate(prev, next, date), Fill::Interpolated))
        }
        (Some(last), None) if extrapolate => {
            let anchor = series.point(last)?;
            let inner = last.checked_sub(1).and_then(|idx| series.point(idx));
            Some((project(anchor, inner, date), Fill::Extrapolated))
        }
        (None, Some(first)) if extrapolate => {
            let anchor = series.point(first)?;
            let inner = series.point(first + 1);
            Some((project(anchor, inner, date), Fill::Extrapolated))
        }
        (None, None) if extrapolate => Some((0.0, Fill::Extrapolated)),
        _ => None,
    }
}

/// Linear blend between two observations.
pub fn interpolate(prev: Observation, next: Observation, date: NaiveDate) -> f64 {
    let span = (next.date - prev.date).num_days();
    if span == 0 {
        return prev.value;
    }
    let offset = (date - prev.date).num_days();
    prev.value + (next.value - prev.value) * offset as f64 / span as f64
}

/// Per-day slope from `p1` to `p2`; zero when both fall on the same day.
pub fn slope(p1: Observation, p2: Observation) -> f64 {
    let days = (p2.date - p1.date).num_days();
    if days == 0 {
        return 0.0;
    }
    (p2.value - p1.value) / days as f64
}

/// Extend the line through `anchor` and its inner neighbour out to `date`.
///
/// Without a neighbour the anchor value is held flat.
fn project(anchor: Observation, inner: Option<Observation>, date: NaiveDate) -> f64 {
    let Some(inner) = inner else {
        return anchor.value;
    };
    let (p1, p2) = if inner.date < anchor.date {
        (inner, anchor)
    } else {
        (anchor, inner)
    };
    anchor.value + slope(p1, p2) * (date - anchor.date).num_days() as f64
}

/// How many rows of a reconstruction came from each fill kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Coverage {
    pub observed: usize,
    pub interpolated: usize,
    pub extrapolated: usize,
    pub missing: usize,
}

impl Coverage {
    pub fn of(rows: &[ReconstructedRow]) -> Self {
        rows.iter().fold(Self::default(), |mut acc, row| {
            match row.fill {
                Fill::Observed => acc.observed += 1,
                Fill::Interpolated => acc.interpolated += 1,
                Fill::Extrapolated => acc.extrapolated += 1,
                Fill::Missing => acc.missing += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.observed + self.interpolated + self.extrapolated + self.missing
    }
}
