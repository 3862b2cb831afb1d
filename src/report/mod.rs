//! Reporting utilities: the mean line and reconstruction summaries.

pub mod format;

pub use format::*;
