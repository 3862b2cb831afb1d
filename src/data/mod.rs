//! Data sources.
//!
//! - DefiLlama protocol documents over HTTP (`llama`)

pub mod llama;

pub use llama::*;
