//! Daily TVL reconstruction.
//!
//! Responsibilities:
//!
//! - fill every calendar day of a range from a sparse series (exact, interpolated, extrapolated)
//! - reconstruct each chain of a by-chain breakdown and sum per-day totals
//! - reduce a reconstruction to its mean

pub mod average;
pub mod chains;
pub mod reconstruct;

pub use average::*;
pub use chains::*;
pub use reconstruct::*;
