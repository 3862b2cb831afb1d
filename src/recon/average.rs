//! Mean of a reconstruction.

use chrono::NaiveDate;

use crate::domain::{ReconstructedRow, Series};
use crate::error::TvlError;
use crate::recon::reconstruct::reconstruct;

/// Arithmetic mean of the non-null reconstructed values of the aggregate series.
pub fn average(
    series: &Series,
    start: NaiveDate,
    end: NaiveDate,
    extrapolate: bool,
) -> Result<f64, TvlError> {
    let rows = reconstruct(series, start, end, extrapolate)?;
    mean_reconstructed(&rows).ok_or(TvlError::NoDataForAverage)
}

/// Mean over rows that have a value; `None` when none do.
pub fn mean_reconstructed(rows: &[ReconstructedRow]) -> Option<f64> {
    let (sum, n) = rows
        .iter()
        .filter_map(|row| row.reconstructed)
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
