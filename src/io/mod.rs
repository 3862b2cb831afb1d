//! Input/output helpers.
//!
//! - local document/CSV ingest (`ingest`)
//! - dataset rendering and output (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
