//! `tvl-recon` library crate.
//!
//! The binary (`tvl`) is a thin wrapper around this library so that:
//!
//! - reconstruction logic is testable without spawning processes or hitting the network
//! - the data source (API or saved file) is swappable behind one pipeline

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod recon;
pub mod report;
