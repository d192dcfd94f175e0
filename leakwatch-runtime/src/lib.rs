//! Leakwatch Runtime
//!
//! Wires harvesting, extraction, watchlist matching and scoring into one
//! pipeline run.

pub mod pipeline;

pub use pipeline::*;
