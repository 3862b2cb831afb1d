//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw observations and the sorted per-series index (`Observation`, `Series`)
//! - reconstruction outputs (`ReconstructedRow`, `ChainRow`, `ChainDataset`)
//! - output configuration enums (`OutputFormat`, `OutputShape`, `RunMode`)
//! - the resolved run configuration (`RunConfig`)

pub mod series;
pub mod types;

pub use series::*;
pub use types::*;
